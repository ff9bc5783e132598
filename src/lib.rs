//! # devrun
//!
//! A development-stack orchestrator for a family of Node services: it finds or
//! clones each requested service, prepares its dependencies, links shared
//! libraries into the primary application, and keeps every service running.
//!
//! ## Features
//!
//! - **Selection**: Requested services are deduplicated and ordered so shared
//!   libraries are set up before the primary application that links them
//! - **Path Resolution**: Unknown service paths are asked for once and remembered
//! - **Cloning**: Missing services can be cloned from their repository on the spot
//! - **Dependency Setup**: Optional clean rebuild, install and link steps run
//!   one service at a time
//! - **Supervision**: Every service is respawned when it exits, with an
//!   optional restart limit and backoff
//! - **Sessions**: Services can run inside detached `screen` sessions and be
//!   stopped by name later
//!
//! ## Quick Start
//!
//! ```no_run
//! use devrun::config::{ConfigStore, RegistryFile, Settings};
//! use devrun::output::TerminalConsole;
//! use devrun::process::ShellRunner;
//! use devrun::prompt::TerminalGateway;
//! use devrun::{Context, Orchestrator, ServiceRegistry};
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> Result<(), devrun::Error> {
//! let store = ConfigStore::open_or_create(&ConfigStore::default_path(), &TerminalGateway, &TerminalConsole::new()).await?;
//! let settings = Settings::resolve(store.file(), &[])?.settings;
//! let registry = ServiceRegistry::from_file(&RegistryFile::find(&std::env::current_dir()?)?, store)?;
//!
//! let ctx = Context::new(
//!     settings,
//!     Arc::new(ShellRunner::new()),
//!     Arc::new(TerminalGateway::new()),
//!     Arc::new(TerminalConsole::new()),
//! );
//! let mut orchestrator = Orchestrator::new(registry, ctx);
//! let supervisors = orchestrator
//!     .start(&["ion-core".to_string(), "member-app".to_string()], CancellationToken::new())
//!     .await?;
//! supervisors.wait().await;
//! # Ok(())
//! # }
//! ```
//!
//! ## Concurrency Model
//!
//! - Path resolution and dependency setup are sequential
//! - Branch lookups, bulk session kills and supervisors run concurrently
//! - Shutdown goes through one shared `CancellationToken`; children are killed
//!   when their supervisor drops them

#![allow(unused_assignments)]

pub mod config;
pub mod context;
pub mod error;
pub mod orchestrator;
pub mod output;
pub mod process;
pub mod prompt;
pub mod registry;
pub mod selection;
pub mod service;
pub mod testing;

// Re-export commonly used types
pub use config::{ConfigStore, RestartPolicy, Settings};
pub use context::Context;
pub use error::{Error, Result};
pub use orchestrator::{Orchestrator, Supervisors};
pub use registry::ServiceRegistry;
pub use selection::Selection;
pub use service::{Service, SupervisorReport};
