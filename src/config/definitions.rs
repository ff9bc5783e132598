//! The static service registry file (`devrun.yaml`).

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

pub const REGISTRY_FILE_NAMES: [&str; 2] = ["devrun.yaml", "devrun.yml"];

/// Primary applications are mutually exclusive; at most this many may exist.
pub const MAX_PRIMARY_SERVICES: usize = 2;

/// One service as declared by the deployment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceDefinition {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repository: Option<String>,
    /// Has installable npm dependencies.
    #[serde(default)]
    pub npm: bool,
    /// A library linked into primary applications.
    #[serde(default)]
    pub ion: bool,
    /// A primary application that links the selected ions into itself.
    #[serde(default)]
    pub primary: bool,
    /// Pass the environment name as an argument to the start command.
    #[serde(default)]
    pub start_with_env: bool,
    /// Start command; defaults to `<package manager> start`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<String>,
    /// Setup steps that run on every start, with or without a clean rebuild.
    #[serde(default, skip_serializing_if = "is_false")]
    pub clear_dependencies: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub install: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub link: bool,
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl ServiceDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: None,
            repository: None,
            npm: false,
            ion: false,
            primary: false,
            start_with_env: false,
            start: None,
            clear_dependencies: false,
            install: false,
            link: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryFile {
    #[serde(default)]
    pub services: Vec<ServiceDefinition>,
}

impl RegistryFile {
    /// Find the registry starting from `dir` and walking up, then falling back
    /// to `~/.devrun/services.yaml`.
    pub fn find(dir: &Path) -> Result<PathBuf> {
        let mut current = Some(dir);
        while let Some(dir) = current {
            for name in REGISTRY_FILE_NAMES {
                let candidate = dir.join(name);
                if candidate.exists() {
                    return Ok(candidate);
                }
            }
            current = dir.parent();
        }

        let fallback = super::devrun_home().join("services.yaml");
        if fallback.exists() {
            return Ok(fallback);
        }

        Err(Error::Config(
            "Could not find devrun.yaml in current directory or any parent".to_string(),
        ))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            Error::Config(format!(
                "Failed to read registry file '{}': {}",
                path.display(),
                e
            ))
        })?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let file: RegistryFile = serde_yaml::from_str(content)?;
        file.validate()?;
        Ok(file)
    }

    /// Names must be non-empty and unique; no more than two primaries.
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for def in &self.services {
            if def.name.trim().is_empty() {
                return Err(Error::Registry("service with an empty name".to_string()));
            }
            if !seen.insert(def.name.as_str()) {
                return Err(Error::Registry(format!(
                    "service '{}' is declared more than once",
                    def.name
                )));
            }
        }

        let primaries: Vec<&str> = self
            .services
            .iter()
            .filter(|d| d.primary)
            .map(|d| d.name.as_str())
            .collect();
        if primaries.len() > MAX_PRIMARY_SERVICES {
            return Err(Error::Registry(format!(
                "at most {} primary services are supported, found {}: {}",
                MAX_PRIMARY_SERVICES,
                primaries.len(),
                primaries.join(", ")
            )));
        }

        Ok(())
    }
}
