//! The persisted configuration file and its first-run creation.

use super::{ConfigFile, LogLevel};
use crate::error::{Error, Result};
use crate::output::{Console, Tone};
use crate::prompt::{InteractionGateway, Question};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Strip trailing path separators, keeping a lone root.
pub fn trim_trailing_separator(path: &str) -> String {
    let trimmed = path.trim().trim_end_matches(std::path::MAIN_SEPARATOR);
    if trimmed.is_empty() && path.trim().starts_with(std::path::MAIN_SEPARATOR) {
        std::path::MAIN_SEPARATOR.to_string()
    } else {
        trimmed.to_string()
    }
}

/// A config file on disk together with its parsed contents.
///
/// Only path overrides are ever written back after the first run; CLI
/// overrides live in [`super::Settings`] and never reach the file.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
    file: ConfigFile,
}

impl ConfigStore {
    /// Default location, `~/.devrun/config.json`.
    pub fn default_path() -> PathBuf {
        super::devrun_home().join("config.json")
    }

    /// Wrap already-loaded contents without touching the disk.
    pub fn new(path: impl Into<PathBuf>, file: ConfigFile) -> Self {
        Self {
            path: path.into(),
            file,
        }
    }

    /// Load the file, or `None` if it does not exist yet.
    pub fn load(path: &Path) -> Result<Option<Self>> {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(Error::Config(format!(
                    "Failed to read config file '{}': {}",
                    path.display(),
                    e
                )))
            }
        };

        let file: ConfigFile = serde_json::from_str(&contents).map_err(|e| {
            Error::Config(format!(
                "Failed to parse config file '{}': {}",
                path.display(),
                e
            ))
        })?;

        Ok(Some(Self::new(path, file)))
    }

    /// Load the file, creating it interactively when absent.
    pub async fn open_or_create(
        path: &Path,
        gateway: &dyn InteractionGateway,
        console: &dyn Console,
    ) -> Result<Self> {
        if let Some(store) = Self::load(path)? {
            return Ok(store);
        }

        console.log(&[
            Tone::Yellow.text("No config found at"),
            Tone::Cyan.text(path.display().to_string()),
            Tone::Yellow.text("- let's create one"),
        ]);
        let store = Self::create(path, gateway).await?;
        console.log(&[
            Tone::Green.text("Config saved to"),
            Tone::Cyan.text(path.display().to_string()),
        ]);
        Ok(store)
    }

    /// Ask the first-run questions and write a new file.
    pub async fn create(path: &Path, gateway: &dyn InteractionGateway) -> Result<Self> {
        let defaults = ConfigFile::default();
        let suggested_root = std::env::current_dir()
            .ok()
            .and_then(|cwd| cwd.parent().map(Path::to_path_buf))
            .unwrap_or_else(|| PathBuf::from("."));

        let questions = [
            Question::text("repo_root", "What is the path to your repositories?")
                .with_default(suggested_root.display().to_string()),
            Question::text("environment", "What environment to build against?")
                .with_default(defaults.environment.clone()),
            Question::text("log_level", "Log output")
                .with_choices(LogLevel::ALL.iter().map(|l| l.to_string())),
        ];
        let answers = gateway.ask(&questions).await?;

        let log_level = match answers.get("log_level").map(String::as_str) {
            None | Some("") => LogLevel::default(),
            Some(raw) => raw
                .parse()
                .map_err(|e| Error::Config(format!("Invalid first-run answer: {}", e)))?,
        };
        let environment = answers
            .get("environment")
            .map(|e| e.trim().to_string())
            .filter(|e| !e.is_empty())
            .unwrap_or(defaults.environment.clone());
        let repo_root = answers
            .get("repo_root")
            .map(|r| trim_trailing_separator(r))
            .filter(|r| !r.is_empty())
            .map(PathBuf::from);

        let store = Self::new(
            path,
            ConfigFile {
                environment,
                log_level,
                repo_root,
                ..defaults
            },
        );
        store.save()?;
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn file(&self) -> &ConfigFile {
        &self.file
    }

    pub fn path_override(&self, service: &str) -> Option<&Path> {
        self.file.path_overrides.get(service).map(PathBuf::as_path)
    }

    /// Remember a resolved service path and persist it.
    pub fn record_path(&mut self, service: &str, path: &Path) -> Result<()> {
        self.file
            .path_overrides
            .insert(service.to_string(), path.to_path_buf());
        self.save()
    }

    /// Write the file with write-temp-then-rename so an interrupted write
    /// never leaves a truncated config behind.
    pub fn save(&self) -> Result<()> {
        let contents = serde_json::to_string_pretty(&self.file)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| {
                    Error::Config(format!(
                        "Failed to create config directory '{}': {}",
                        parent.display(),
                        e
                    ))
                })?;
            }
        }

        let temp_path = self.path.with_extension("json.tmp");
        let mut file = fs::File::create(&temp_path)
            .map_err(|e| Error::Config(format!("Failed to create temp file: {}", e)))?;
        file.write_all(contents.as_bytes())
            .map_err(|e| Error::Config(format!("Failed to write temp file: {}", e)))?;
        file.sync_all()
            .map_err(|e| Error::Config(format!("Failed to sync temp file: {}", e)))?;
        drop(file);

        fs::rename(&temp_path, &self.path).map_err(|e| {
            Error::Config(format!(
                "Failed to replace config file '{}': {}",
                self.path.display(),
                e
            ))
        })?;

        tracing::debug!(path = %self.path.display(), "Saved config");
        Ok(())
    }
}
