//! Services and their operations.
//!
//! A [`Service`] is built from a registry definition and carries the per-run
//! state the orchestrator fills in. Its operations are split by concern:
//!
//! - **Location** (`location`): path resolution, existence check, clone, branch
//! - **Setup** (`setup`): clearing, installing and linking dependencies
//! - **Sessions** (`session`): detached `screen` sessions named after services
//! - **Supervision** ([`Supervisor`]): keeping the start command running
//!
//! # Example
//!
//! ```ignore
//! use devrun::service::Service;
//!
//! async fn bootstrap(service: &Service, ctx: &devrun::Context) -> devrun::Result<()> {
//!     service.run_setup(ctx, &[]).await?;
//!     let report = service.supervisor(ctx)?.run(Default::default()).await;
//!     println!("{} ended: {}", report.name, report.ended);
//!     Ok(())
//! }
//! ```

mod location;
mod session;
mod setup;
mod supervisor;
mod types;

pub use session::{listing_mentions, session_command};
pub use supervisor::*;
pub use types::*;
