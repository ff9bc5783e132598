use crate::config::{ServiceDefinition, Settings};
use crate::context::Context;
use crate::error::{Error, Result};
use crate::output::{Segment, Tone};
use std::path::{Path, PathBuf};

/// Dependency directory removed by a clean rebuild.
pub const DEPENDENCY_DIR: &str = "node_modules";

/// Classification fixed by the service definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ServiceKind {
    pub npm: bool,
    pub ion: bool,
    pub primary: bool,
    pub start_with_env: bool,
}

/// Which dependency-setup steps run for a service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SetupFlags {
    pub clear_dependencies: bool,
    pub install: bool,
    pub link: bool,
}

impl SetupFlags {
    /// A fresh clone needs installing (npm) and registering (ion).
    pub fn after_clone(self, kind: ServiceKind) -> Self {
        Self {
            install: self.install || kind.npm,
            link: self.link || kind.ion,
            ..self
        }
    }
}

/// Decide the setup steps for a service when the selection is built.
///
/// `declared` are the steps from the service definition. A clean rebuild adds
/// clearing and reinstalling for every npm service and re-linking npm ions.
pub fn derive_setup_flags(
    kind: ServiceKind,
    declared: SetupFlags,
    clean_rebuild: bool,
) -> SetupFlags {
    let clean = clean_rebuild && kind.npm;
    SetupFlags {
        clear_dependencies: declared.clear_dependencies || clean,
        install: declared.install || clean,
        link: declared.link || (clean && kind.ion),
    }
}

/// One manageable unit of the development stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Service {
    pub name: String,
    /// Working directory; `None` until resolved.
    pub path: Option<PathBuf>,
    pub repository: Option<String>,
    pub kind: ServiceKind,
    /// Start command override.
    pub start: Option<String>,
    pub flags: SetupFlags,
    /// Requested by the operator for this run.
    pub run: bool,
    /// Set by the path check.
    pub exists: bool,
    /// Checked-out branch; empty when unknown.
    pub branch: String,
}

impl Service {
    pub fn from_definition(def: &ServiceDefinition) -> Self {
        Self {
            name: def.name.clone(),
            path: def.path.clone(),
            repository: def.repository.clone().filter(|r| !r.trim().is_empty()),
            kind: ServiceKind {
                npm: def.npm,
                ion: def.ion,
                primary: def.primary,
                start_with_env: def.start_with_env,
            },
            start: def.start.clone(),
            flags: SetupFlags {
                clear_dependencies: def.clear_dependencies,
                install: def.install,
                link: def.link,
            },
            run: false,
            exists: false,
            branch: String::new(),
        }
    }

    pub(crate) fn require_path(&self) -> Result<&Path> {
        self.path
            .as_deref()
            .ok_or_else(|| Error::Config(format!("Service '{}' has no path", self.name)))
    }

    /// Command line that runs the service, without session wrapping.
    pub fn start_command(&self, settings: &Settings) -> String {
        let base = self
            .start
            .clone()
            .unwrap_or_else(|| format!("{} start", settings.package_manager));
        if self.kind.start_with_env {
            format!(
                "{} {}",
                base,
                shell_escape::escape(settings.environment.as_str().into())
            )
        } else {
            base
        }
    }

    /// Emit a console line prefixed with the service name.
    pub(crate) fn say(&self, ctx: &Context, rest: impl IntoIterator<Item = Segment>) {
        let mut segments = vec![Tone::Cyan.text(&self.name)];
        segments.extend(rest);
        ctx.console.log(&segments);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kind(npm: bool, ion: bool) -> ServiceKind {
        ServiceKind {
            npm,
            ion,
            ..Default::default()
        }
    }

    #[test]
    fn test_derive_without_clean_runs_nothing() {
        for (npm, ion) in [(false, false), (true, false), (true, true), (false, true)] {
            assert_eq!(
                derive_setup_flags(kind(npm, ion), SetupFlags::default(), false),
                SetupFlags::default()
            );
        }
    }

    #[test]
    fn test_derive_keeps_declared_steps() {
        let declared = SetupFlags {
            clear_dependencies: false,
            install: true,
            link: true,
        };
        assert_eq!(derive_setup_flags(kind(true, true), declared, false), declared);
        assert_eq!(
            derive_setup_flags(kind(true, false), declared, true),
            SetupFlags {
                clear_dependencies: true,
                install: true,
                link: true
            }
        );
    }

    #[test]
    fn test_definition_seeds_flags() {
        let mut def = ServiceDefinition::new("ion-core");
        def.install = true;
        def.link = true;
        let service = Service::from_definition(&def);
        assert!(service.flags.install);
        assert!(service.flags.link);
        assert!(!service.flags.clear_dependencies);
    }

    #[test]
    fn test_derive_clean_forces_npm_services() {
        assert_eq!(
            derive_setup_flags(kind(true, true), SetupFlags::default(), true),
            SetupFlags {
                clear_dependencies: true,
                install: true,
                link: true
            }
        );
        assert_eq!(
            derive_setup_flags(kind(true, false), SetupFlags::default(), true),
            SetupFlags {
                clear_dependencies: true,
                install: true,
                link: false
            }
        );
        assert_eq!(
            derive_setup_flags(kind(false, true), SetupFlags::default(), true),
            SetupFlags::default()
        );
    }

    #[test]
    fn test_after_clone_follows_classification() {
        for (npm, ion) in [(false, false), (true, false), (true, true), (false, true)] {
            let flags = SetupFlags::default().after_clone(kind(npm, ion));
            assert_eq!(flags.install, npm);
            assert_eq!(flags.link, ion);
            assert!(!flags.clear_dependencies);
        }
    }

    #[test]
    fn test_start_command_appends_environment() {
        let mut def = ServiceDefinition::new("member-app");
        def.start_with_env = true;
        let settings = Settings {
            environment: "stage4".to_string(),
            ..Settings::default()
        };
        assert_eq!(
            Service::from_definition(&def).start_command(&settings),
            "npm start stage4"
        );

        def.start_with_env = false;
        def.start = Some("yarn dev".to_string());
        assert_eq!(Service::from_definition(&def).start_command(&settings), "yarn dev");
    }

    #[test]
    fn test_blank_repository_is_none() {
        let mut def = ServiceDefinition::new("api");
        def.repository = Some("  ".to_string());
        assert_eq!(Service::from_definition(&def).repository, None);
    }
}
