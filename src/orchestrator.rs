//! Run orchestration: selection, preparation, setup and supervised launch.
//!
//! The orchestrator coordinates multiple services:
//! - Path resolution and cloning, one service at a time
//! - Branch lookup for all services at once
//! - A strictly sequential setup queue (libraries before the primary app)
//! - One supervisor task per service, stopped through a shared
//!   [`CancellationToken`]

use crate::context::Context;
use crate::error::Result;
use crate::output::Tone;
use crate::registry::ServiceRegistry;
use crate::selection::Selection;
use crate::service::SupervisorReport;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

pub struct Orchestrator {
    registry: ServiceRegistry,
    ctx: Context,
}

impl Orchestrator {
    pub fn new(registry: ServiceRegistry, ctx: Context) -> Self {
        Self { registry, ctx }
    }

    pub fn registry(&self) -> &ServiceRegistry {
        &self.registry
    }

    pub fn context(&self) -> &Context {
        &self.ctx
    }

    pub fn select(&self, names: &[String]) -> Selection {
        self.registry
            .select(names, &self.ctx.settings, self.ctx.console.as_ref())
    }

    /// Resolve paths, fetch branches, print the pre-flight summary, wait the
    /// start delay and run setup.
    ///
    /// Services that cannot be found are dropped from `selection`.
    pub async fn prepare(&mut self, selection: &mut Selection) -> Result<()> {
        self.registry.resolve_paths(selection, &self.ctx).await?;
        if selection.is_empty() {
            return Ok(());
        }

        ServiceRegistry::fetch_branches(selection, &self.ctx).await;
        self.preflight(selection).await;
        self.setup(selection).await;
        Ok(())
    }

    async fn preflight(&self, selection: &Selection) {
        let console = &self.ctx.console;
        for service in selection.iter() {
            let branch = if service.branch.is_empty() {
                Tone::Yellow.text("git branch not found")
            } else {
                Tone::White.text(&service.branch)
            };
            console.log(&[
                Tone::Green.text("Run"),
                Tone::Cyan.text(&service.name),
                Tone::Gray.text("on branch ("),
                branch,
                Tone::Gray.text(")"),
            ]);
        }
        console.separator();

        let delay = self.ctx.settings.start_delay;
        console.log(&[Tone::Yellow.text(format!(
            "Starting in {} seconds",
            delay.as_secs()
        ))]);
        tokio::time::sleep(delay).await;
    }

    /// Run every service's setup steps in selection order. Each service
    /// finishes before the next one begins; a failure is reported and the
    /// queue moves on.
    pub async fn setup(&self, selection: &Selection) {
        let ions = selection.ion_names();
        for service in selection.iter() {
            self.ctx.console.separator();
            self.ctx.console.log(&[
                Tone::Magenta.text(&service.name),
                Tone::Gray.text("Starting..."),
            ]);
            if let Err(e) = service.run_setup(&self.ctx, &ions).await {
                tracing::warn!(service = %service.name, error = %e, "Setup failed");
                self.ctx.console.log(&[
                    Tone::Cyan.text(&service.name),
                    Tone::Red.text(format!("setup failed: {}", e)),
                ]);
            }
        }
    }

    /// Spawn one supervisor per selected service.
    pub fn launch(&self, selection: &Selection, cancel: CancellationToken) -> Supervisors {
        let mut set = JoinSet::new();
        for service in selection.iter() {
            match service.supervisor(&self.ctx) {
                Ok(supervisor) => {
                    set.spawn(supervisor.run(cancel.clone()));
                }
                Err(e) => {
                    tracing::error!(service = %service.name, error = %e, "Cannot supervise service");
                    self.ctx.console.log(&[
                        Tone::Cyan.text(&service.name),
                        Tone::Red.text(format!("could not be started: {}", e)),
                    ]);
                }
            }
        }
        Supervisors { set, cancel }
    }

    /// Select, prepare and launch the named services.
    pub async fn start(&mut self, names: &[String], cancel: CancellationToken) -> Result<Supervisors> {
        let mut selection = self.select(names);
        if !selection.is_empty() {
            self.prepare(&mut selection).await?;
        }
        if selection.is_empty() {
            self.ctx.console.log(&[Tone::Yellow.text("No services to start")]);
        }
        Ok(self.launch(&selection, cancel))
    }

    /// Stop the named services in order, or every running service when no
    /// names are given. Returns how many sessions were targeted.
    pub async fn stop(&self, names: &[String]) -> usize {
        let console = &self.ctx.console;
        if names.is_empty() {
            console.log(&[Tone::Magenta.text("Services"), Tone::Yellow.text("Stopping...")]);
            let killed = self.registry.kill_all_running(&self.ctx).await;
            console.log(&[Tone::Magenta.text("Services"), Tone::Green.text("Stopped")]);
            return killed;
        }

        let mut stopped = 0;
        for name in names {
            let Some(service) = self.registry.get(name) else {
                console.log(&[
                    Tone::Red.text("Service"),
                    Tone::Cyan.text(name),
                    Tone::Red.text("does not exist"),
                ]);
                continue;
            };
            console.separator();
            console.log(&[Tone::Magenta.text(name), Tone::Yellow.text("Stopping...")]);
            service.kill_session(&self.ctx).await;
            console.log(&[Tone::Magenta.text(name), Tone::Green.text("Stopped")]);
            stopped += 1;
        }
        stopped
    }
}

/// Running supervisor tasks for one `start`.
pub struct Supervisors {
    set: JoinSet<SupervisorReport>,
    cancel: CancellationToken,
}

impl Supervisors {
    pub fn len(&self) -> usize {
        self.set.len()
    }

    pub fn is_empty(&self) -> bool {
        self.set.is_empty()
    }

    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Wait until every supervisor has ended.
    pub async fn wait(mut self) -> Vec<SupervisorReport> {
        let mut reports = Vec::with_capacity(self.set.len());
        while let Some(joined) = self.set.join_next().await {
            match joined {
                Ok(report) => reports.push(report),
                Err(e) => tracing::error!(error = %e, "Supervisor task failed"),
            }
        }
        reports
    }

    /// Cancel every supervisor and wait for them to end.
    pub async fn shutdown(self) -> Vec<SupervisorReport> {
        self.cancel.cancel();
        self.wait().await
    }
}
