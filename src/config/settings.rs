//! Effective settings for one run.
//!
//! [`Settings`] is built once, in precedence order, from built-in defaults,
//! the persisted [`ConfigFile`] and command-line overrides. It is never
//! mutated afterwards; components receive it behind an `Arc`.

use super::duration::parse_setting;
use super::{Override, OverrideValue, RestartConfig, RestartPolicy};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

const DEFAULT_ENVIRONMENT: &str = "development";
const DEFAULT_PACKAGE_MANAGER: &str = "npm";
const DEFAULT_START_DELAY: Duration = Duration::from_secs(3);

/// Directory holding the default config file, registry and logs.
pub fn devrun_home() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".devrun")
}

/// Console verbosity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    #[default]
    Info,
    Debug,
    Verbose,
}

impl LogLevel {
    pub const ALL: [LogLevel; 3] = [LogLevel::Info, LogLevel::Debug, LogLevel::Verbose];

    /// Debug-level detail (command lines, session handling) is shown.
    pub fn is_debug(self) -> bool {
        matches!(self, LogLevel::Debug | LogLevel::Verbose)
    }

    /// Package-manager output is shown in full.
    pub fn is_verbose(self) -> bool {
        matches!(self, LogLevel::Verbose)
    }

    /// Default `tracing` filter when `RUST_LOG` is unset.
    pub fn tracing_filter(self) -> &'static str {
        match self {
            LogLevel::Info => "warn",
            LogLevel::Debug => "debug",
            LogLevel::Verbose => "trace",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Info => write!(f, "info"),
            LogLevel::Debug => write!(f, "debug"),
            LogLevel::Verbose => write!(f, "verbose"),
        }
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "info" => Ok(LogLevel::Info),
            "debug" => Ok(LogLevel::Debug),
            "verbose" => Ok(LogLevel::Verbose),
            other => Err(format!(
                "unknown log level '{}' (expected info, debug or verbose)",
                other
            )),
        }
    }
}

/// Where supervised services write their output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    /// Services share the orchestrator's terminal.
    #[default]
    Inherit,
    /// Each service appends to `<logDir>/<name>.log`.
    File,
}

impl FromStr for OutputMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "inherit" | "terminal" => Ok(OutputMode::Inherit),
            "file" | "log" => Ok(OutputMode::File),
            other => Err(format!(
                "unknown output mode '{}' (expected inherit or file)",
                other
            )),
        }
    }
}

/// The persisted configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigFile {
    #[serde(default = "default_environment")]
    pub environment: String,
    #[serde(default)]
    pub log_level: LogLevel,
    #[serde(default)]
    pub clean_rebuild: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repo_root: Option<PathBuf>,
    #[serde(default)]
    pub path_overrides: BTreeMap<String, PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package_manager: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<OutputMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_dir: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sessions: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command_timeout: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_delay: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restart: Option<RestartConfig>,
}

fn default_environment() -> String {
    DEFAULT_ENVIRONMENT.to_string()
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            environment: default_environment(),
            log_level: LogLevel::default(),
            clean_rebuild: false,
            repo_root: None,
            path_overrides: BTreeMap::new(),
            package_manager: None,
            output: None,
            log_dir: None,
            sessions: None,
            command_timeout: None,
            start_delay: None,
            restart: None,
        }
    }
}

/// Effective, immutable settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub environment: String,
    pub log_level: LogLevel,
    pub clean_rebuild: bool,
    pub repo_root: Option<PathBuf>,
    pub package_manager: String,
    pub output: OutputMode,
    pub log_dir: PathBuf,
    /// Run services inside detached `screen` sessions named after them.
    pub sessions: bool,
    /// Limit for setup and inspection commands; never applied to services.
    pub command_timeout: Option<Duration>,
    /// Pause between the pre-flight summary and setup.
    pub start_delay: Duration,
    pub restart: RestartPolicy,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            environment: DEFAULT_ENVIRONMENT.to_string(),
            log_level: LogLevel::default(),
            clean_rebuild: false,
            repo_root: None,
            package_manager: DEFAULT_PACKAGE_MANAGER.to_string(),
            output: OutputMode::default(),
            log_dir: devrun_home().join("logs"),
            sessions: false,
            command_timeout: None,
            start_delay: DEFAULT_START_DELAY,
            restart: RestartPolicy::default(),
        }
    }
}

/// A zero limit means no limit.
fn parse_timeout(key: &str, value: Option<&str>) -> Result<Option<Duration>> {
    Ok(parse_setting(key, value)?.filter(|d| !d.is_zero()))
}

/// Settings plus the override keys that were not recognized.
#[derive(Debug, Clone)]
pub struct Resolved {
    pub settings: Settings,
    pub ignored: Vec<String>,
}

impl Settings {
    /// Build settings from defaults, then `file`, then `overrides`.
    pub fn resolve(file: &ConfigFile, overrides: &[Override]) -> Result<Resolved> {
        let mut settings = Self::from_file(file)?;
        let mut ignored = Vec::new();
        for o in overrides {
            if !settings.apply(o)? {
                ignored.push(o.key.clone());
            }
        }
        Ok(Resolved { settings, ignored })
    }

    fn from_file(file: &ConfigFile) -> Result<Self> {
        let defaults = Self::default();
        let restart = match &file.restart {
            Some(r) => RestartPolicy {
                max_restarts: r.max_restarts,
                delay: parse_setting("restart.delay", r.delay.as_deref())?,
                exponential: r.exponential,
            },
            None => defaults.restart.clone(),
        };

        Ok(Self {
            environment: file.environment.clone(),
            log_level: file.log_level,
            clean_rebuild: file.clean_rebuild,
            repo_root: file.repo_root.clone(),
            package_manager: file
                .package_manager
                .clone()
                .unwrap_or(defaults.package_manager),
            output: file.output.unwrap_or(defaults.output),
            log_dir: file.log_dir.clone().unwrap_or(defaults.log_dir),
            sessions: file.sessions.unwrap_or(defaults.sessions),
            command_timeout: parse_timeout("commandTimeout", file.command_timeout.as_deref())?,
            start_delay: parse_setting("startDelay", file.start_delay.as_deref())?
                .unwrap_or(defaults.start_delay),
            restart,
        })
    }

    /// Apply one override. Returns `false` when the key is unknown.
    fn apply(&mut self, o: &Override) -> Result<bool> {
        match o.key.as_str() {
            "env" | "environment" => self.environment = o.raw.clone(),
            "log" | "logLevel" => {
                self.log_level = o.raw.parse().map_err(|reason| invalid(o, reason))?
            }
            "clean" | "cleanRebuild" => self.clean_rebuild = expect_bool(o)?,
            "repos" | "repoRoot" => {
                self.repo_root = Some(PathBuf::from(super::trim_trailing_separator(&o.raw)))
            }
            "pm" | "packageManager" => self.package_manager = o.raw.clone(),
            "output" => self.output = o.raw.parse().map_err(|reason| invalid(o, reason))?,
            "sessions" => self.sessions = expect_bool(o)?,
            "timeout" | "commandTimeout" => {
                self.command_timeout = parse_timeout(&o.key, Some(&o.raw))?
            }
            "delay" | "startDelay" => {
                self.start_delay = parse_setting(&o.key, Some(&o.raw))?.unwrap_or_default()
            }
            _ => return Ok(false),
        }
        Ok(true)
    }

    /// Root under which unknown service paths are suggested.
    pub fn repo_root_or_cwd(&self) -> PathBuf {
        self.repo_root
            .clone()
            .or_else(|| std::env::current_dir().ok())
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Flag appended to package-manager commands to reduce output.
    pub fn quiet_flag(&self) -> &'static str {
        if self.log_level.is_verbose() {
            ""
        } else {
            " --silent"
        }
    }

    pub fn log_file(&self, service: &str) -> PathBuf {
        self.log_dir.join(format!("{}.log", service))
    }
}

fn invalid(o: &Override, reason: impl Into<String>) -> Error {
    Error::InvalidOverride {
        key: o.key.clone(),
        reason: reason.into(),
    }
}

fn expect_bool(o: &Override) -> Result<bool> {
    match o.value {
        OverrideValue::Bool(b) => Ok(b),
        OverrideValue::Text(ref raw) => Err(invalid(
            o,
            format!("expected a boolean, got '{}'", raw),
        )),
    }
}
