//! Configuration.
//!
//! - `definitions` - the static service registry file (`devrun.yaml`)
//! - `store` - the persisted JSON config, first-run creation, atomic writes
//! - `settings` - effective immutable [`Settings`] for one run
//! - `overrides` - `key=value` command-line arguments and value coercion
//! - `restart` - restart policy for supervised services
//! - `duration` - human-readable durations

mod definitions;
mod duration;
mod overrides;
mod restart;
mod settings;
mod store;

pub use definitions::*;
pub use duration::parse_duration_string;
pub use overrides::*;
pub use restart::*;
pub use settings::*;
pub use store::*;
