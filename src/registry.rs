//! The known services and the operations that span several of them.

use crate::config::{ConfigStore, RegistryFile, ServiceDefinition, Settings};
use crate::context::Context;
use crate::error::{Error, Result};
use crate::output::{Console, Tone};
use crate::process::CommandSpec;
use crate::prompt::confirm;
use crate::selection::Selection;
use crate::service::{derive_setup_flags, listing_mentions, Service};
use futures::future::join_all;
use std::collections::HashSet;
use std::path::Path;

/// Every service declared for the deployment, with persisted path overrides
/// applied, plus the config store those overrides live in.
#[derive(Debug, Clone)]
pub struct ServiceRegistry {
    services: Vec<Service>,
    store: ConfigStore,
}

impl ServiceRegistry {
    /// Build the registry. A persisted path override wins over the path in
    /// the definition.
    pub fn from_definitions(definitions: Vec<ServiceDefinition>, store: ConfigStore) -> Result<Self> {
        let file = RegistryFile {
            services: definitions,
        };
        file.validate()?;

        let services = file
            .services
            .iter()
            .map(|def| {
                let mut service = Service::from_definition(def);
                if let Some(path) = store.path_override(&def.name) {
                    service.path = Some(path.to_path_buf());
                }
                service
            })
            .collect();

        Ok(Self { services, store })
    }

    pub fn from_file(path: &Path, store: ConfigStore) -> Result<Self> {
        let file = RegistryFile::load(path)?;
        Self::from_definitions(file.services, store)
    }

    pub fn services(&self) -> &[Service] {
        &self.services
    }

    pub fn get(&self, name: &str) -> Option<&Service> {
        self.services.iter().find(|s| s.name == name)
    }

    pub fn store(&self) -> &ConfigStore {
        &self.store
    }

    /// Build the execution order for the named services.
    ///
    /// Unknown names are reported and skipped, duplicates collapse. Choosing
    /// two primary applications is reported and yields an empty selection.
    pub fn select(&self, names: &[String], settings: &Settings, console: &dyn Console) -> Selection {
        let mut seen = HashSet::new();
        let mut chosen = Vec::new();
        for name in names {
            if !seen.insert(name.as_str()) {
                continue;
            }
            match self.get(name) {
                Some(service) => {
                    let mut service = service.clone();
                    service.run = true;
                    service.flags =
                        derive_setup_flags(service.kind, service.flags, settings.clean_rebuild);
                    chosen.push(service);
                }
                None => console.log(&[
                    Tone::Red.text("Service"),
                    Tone::Cyan.text(name),
                    Tone::Red.text("does not exist"),
                ]),
            }
        }

        match Selection::normalize(chosen) {
            Ok(selection) => selection,
            Err(Error::SelectionConflict { first, second }) => {
                console.log(&[
                    Tone::Red.text("Cannot run both"),
                    Tone::Cyan.text(&first),
                    Tone::Red.text("and"),
                    Tone::Cyan.text(&second),
                ]);
                Selection::empty()
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to order selection");
                Selection::empty()
            }
        }
    }

    /// Kill the session of every registered service that shows up in
    /// `screen -ls`. Returns how many were killed.
    pub async fn kill_all_running(&self, ctx: &Context) -> usize {
        let spec = CommandSpec::new("screen -ls").timeout(ctx.settings.command_timeout);
        // `screen -ls` exits nonzero when there are no sessions; only the
        // listing matters.
        let listing = match ctx.runner.run_captured(&spec).await {
            Ok(out) => out.stdout,
            Err(e) => {
                tracing::debug!(error = %e, "Could not list screen sessions");
                return 0;
            }
        };

        let running: Vec<&Service> = self
            .services
            .iter()
            .filter(|s| listing_mentions(&listing, &s.name))
            .collect();
        tracing::debug!(count = running.len(), "Killing running sessions");
        join_all(running.iter().map(|s| s.kill_session(ctx))).await;
        running.len()
    }

    /// Make sure every selected service has a path that exists.
    ///
    /// Runs one service at a time: each may prompt. A missing service with a
    /// repository is offered for cloning; a service that stays missing is
    /// reported and removed from the selection. Returns the removed names.
    pub async fn resolve_paths(&mut self, selection: &mut Selection, ctx: &Context) -> Result<Vec<String>> {
        let mut excluded = Vec::new();

        for service in selection.iter_mut() {
            service.resolve_path(ctx, &mut self.store).await?;
            if let Some(known) = self.services.iter_mut().find(|s| s.name == service.name) {
                known.path = service.path.clone();
            }

            service.exists = match service.check_exists().await {
                Ok(exists) => exists,
                Err(e) => {
                    tracing::warn!(service = %service.name, error = %e, "Path check failed");
                    ctx.console.log(&[
                        Tone::Cyan.text(&service.name),
                        Tone::Red.text(format!("could not be checked: {}", e)),
                    ]);
                    excluded.push(service.name.clone());
                    continue;
                }
            };
            if service.exists {
                continue;
            }

            if !Self::offer_clone(service, ctx).await? {
                ctx.console.log(&[
                    Tone::Cyan.text(&service.name),
                    Tone::Red.text("was not found and cannot be run"),
                ]);
                excluded.push(service.name.clone());
            }
        }

        selection.retain(|s| !excluded.contains(&s.name));
        Ok(excluded)
    }

    /// Ask to clone a missing service. Returns whether it was cloned.
    async fn offer_clone(service: &mut Service, ctx: &Context) -> Result<bool> {
        let Some(repository) = service.repository.as_deref() else {
            return Ok(false);
        };
        let path = service
            .path
            .as_deref()
            .map(|p| p.display().to_string())
            .unwrap_or_default();
        let message = format!(
            "{} not found. Clone from {} into {}?",
            service.name, repository, path
        );
        if !confirm(ctx.gateway.as_ref(), "git_clone", message).await? {
            return Ok(false);
        }

        match service.git_clone(ctx).await {
            Ok(()) => {
                service.flags = service.flags.after_clone(service.kind);
                Ok(true)
            }
            Err(e) => {
                tracing::warn!(service = %service.name, error = %e, "Clone failed");
                ctx.console.log(&[
                    Tone::Cyan.text(&service.name),
                    Tone::Red.text(format!("could not be cloned: {}", e)),
                ]);
                Ok(false)
            }
        }
    }

    /// Look up the checked-out branch of every selected service at once.
    pub async fn fetch_branches(selection: &mut Selection, ctx: &Context) {
        join_all(selection.iter_mut().map(|s| s.get_branch(ctx))).await;
    }
}
