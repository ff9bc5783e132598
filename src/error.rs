// Allow unused_assignments at module level because thiserror's generated code
// for struct variants triggers false positive warnings - the fields ARE used
// in the Display impl but rustc's lint pass doesn't see this.
#![allow(unused_assignments)]

use miette::Diagnostic;
use std::io;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Diagnostic, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    #[diagnostic(code(devrun::config::error))]
    Config(String),

    #[error("Registry error: {0}")]
    #[diagnostic(
        code(devrun::registry::error),
        help("Check the services list in your devrun.yaml")
    )]
    Registry(String),

    #[error("Invalid value for '{key}': {reason}")]
    #[diagnostic(
        code(devrun::config::invalid_override),
        help("Overrides are passed as key=value, e.g. `devrun start app clean=yes env=staging`")
    )]
    InvalidOverride { key: String, reason: String },

    #[error("Process error: {0}")]
    #[diagnostic(
        code(devrun::process::error),
        help("Check that the command exists and is executable")
    )]
    Process(String),

    #[error("Command `{command}` did not finish within {after:?}")]
    #[diagnostic(
        code(devrun::process::timeout),
        help("Raise or remove `commandTimeout` in your config")
    )]
    Timeout { command: String, after: Duration },

    #[error("Cannot run both '{first}' and '{second}'")]
    #[diagnostic(
        code(devrun::selection::conflict),
        help("Primary applications are mutually exclusive, pick one of them")
    )]
    SelectionConflict { first: String, second: String },

    #[error("Service '{0}' has no repository to clone from")]
    NoRepository(String),

    #[error("Prompt error: {0}")]
    Prompt(String),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Returns a helpful suggestion for resolving this error, if available.
    pub fn suggestion(&self) -> Option<String> {
        match self {
            Error::Config(msg) if msg.contains("Could not find") => Some(
                "Create a devrun.yaml with a `services:` list, or pass --registry <path>"
                    .to_string(),
            ),
            Error::Config(_) => Some(
                "Fix or delete the config file; it is recreated interactively on the next run"
                    .to_string(),
            ),
            Error::InvalidOverride { .. } => Some(
                "Boolean keys accept true/yes/y/1 and false/no/n/0".to_string(),
            ),
            Error::Process(_) => {
                Some("Check that the command exists and is executable".to_string())
            }
            Error::Timeout { .. } => Some(
                "Raise the limit with `timeout=20m`, or remove `commandTimeout` from the config"
                    .to_string(),
            ),
            _ => None,
        }
    }

    /// Formats the error with its suggestion (if any) for user-friendly display.
    pub fn with_suggestion(&self) -> String {
        match self.suggestion() {
            Some(suggestion) => format!("{}\n\nHint: {}", self, suggestion),
            None => self.to_string(),
        }
    }
}
