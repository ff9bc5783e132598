//! Supervised start of a long-running service.
//!
//! A [`Supervisor`] owns one service's start command and respawns it every time
//! it exits, subject to the configured [`RestartPolicy`]. The whole lifecycle is
//! a single loop over [`SupervisorState`]; there is no per-exit callback.

use super::session::session_command;
use super::Service;
use crate::config::{OutputMode, RestartPolicy};
use crate::context::Context;
use crate::error::Result;
use crate::output::{Console, Segment, Tone};
use crate::process::{CommandSpec, Exit, OutputTarget, ProcessRunner};
use std::fmt;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Where a supervisor is in its lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SupervisorState {
    Starting,
    Running,
    Exited(Exit),
    Restarting,
    Stopped(EndReason),
}

/// Why a supervisor stopped respawning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EndReason {
    /// Operator shutdown.
    Cancelled,
    /// `maxRestarts` reached.
    RestartLimit,
    /// The command could not be launched at all.
    LaunchFailed(String),
}

impl fmt::Display for EndReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EndReason::Cancelled => write!(f, "cancelled"),
            EndReason::RestartLimit => write!(f, "restart limit reached"),
            EndReason::LaunchFailed(reason) => write!(f, "launch failed: {}", reason),
        }
    }
}

/// Summary returned when a supervisor ends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupervisorReport {
    pub name: String,
    /// Launch attempts, including the first.
    pub starts: u32,
    pub restarts: u32,
    pub last_exit: Option<Exit>,
    pub ended: EndReason,
}

pub struct Supervisor {
    name: String,
    spec: CommandSpec,
    policy: RestartPolicy,
    runner: Arc<dyn ProcessRunner>,
    console: Arc<dyn Console>,
}

impl Service {
    /// Build the supervisor that keeps this service running.
    pub fn supervisor(&self, ctx: &Context) -> Result<Supervisor> {
        let settings = &ctx.settings;
        let mut command = self.start_command(settings);
        if settings.sessions {
            command = session_command(&self.name, &command);
        }
        let output = match settings.output {
            OutputMode::Inherit => OutputTarget::Inherit,
            OutputMode::File => OutputTarget::LogFile(settings.log_file(&self.name)),
        };

        // No timeout: the start command is expected to run indefinitely.
        let spec = CommandSpec::new(command)
            .cwd(self.require_path()?)
            .output(output);

        Ok(Supervisor {
            name: self.name.clone(),
            spec,
            policy: settings.restart.clone(),
            runner: Arc::clone(&ctx.runner),
            console: Arc::clone(&ctx.console),
        })
    }
}

impl Supervisor {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn spec(&self) -> &CommandSpec {
        &self.spec
    }

    fn say(&self, rest: impl IntoIterator<Item = Segment>) {
        let mut segments = vec![Tone::Cyan.text(&self.name)];
        segments.extend(rest);
        self.console.log(&segments);
    }

    /// Drive the service until cancelled, out of restarts, or unlaunchable.
    pub async fn run(self, cancel: CancellationToken) -> SupervisorReport {
        let mut starts = 0u32;
        let mut restarts = 0u32;
        let mut last_exit = None;
        let mut state = SupervisorState::Starting;

        loop {
            tracing::trace!(service = %self.name, state = ?state, "Supervisor state");
            state = match state {
                SupervisorState::Starting => {
                    self.say([Tone::Yellow.text("Starting service...")]);
                    SupervisorState::Running
                }
                SupervisorState::Running => {
                    starts += 1;
                    tracing::debug!(service = %self.name, command = %self.spec, "Launching");
                    let outcome = tokio::select! {
                        biased;
                        _ = cancel.cancelled() => None,
                        result = self.runner.run(&self.spec) => Some(result),
                    };
                    match outcome {
                        None => SupervisorState::Stopped(EndReason::Cancelled),
                        Some(Ok(exit)) => SupervisorState::Exited(exit),
                        Some(Err(e)) => {
                            tracing::error!(service = %self.name, error = %e, "Failed to launch");
                            self.say([Tone::Red.text(format!("could not be started: {}", e))]);
                            SupervisorState::Stopped(EndReason::LaunchFailed(e.to_string()))
                        }
                    }
                }
                SupervisorState::Exited(exit) => {
                    last_exit = Some(exit);
                    tracing::info!(service = %self.name, %exit, "Service exited");
                    self.say([Tone::Red.text("has quit")]);
                    if cancel.is_cancelled() {
                        SupervisorState::Stopped(EndReason::Cancelled)
                    } else if self.policy.allows(restarts + 1) {
                        SupervisorState::Restarting
                    } else {
                        tracing::warn!(service = %self.name, restarts, "Restart limit reached");
                        SupervisorState::Stopped(EndReason::RestartLimit)
                    }
                }
                SupervisorState::Restarting => {
                    restarts += 1;
                    let delay = self.policy.delay_for(restarts);
                    let cancelled = if delay.is_zero() {
                        false
                    } else {
                        tracing::debug!(service = %self.name, ?delay, "Waiting before restart");
                        tokio::select! {
                            biased;
                            _ = cancel.cancelled() => true,
                            _ = tokio::time::sleep(delay) => false,
                        }
                    };
                    if cancelled {
                        SupervisorState::Stopped(EndReason::Cancelled)
                    } else {
                        self.say([Tone::Yellow.text("Restarting service...")]);
                        SupervisorState::Running
                    }
                }
                SupervisorState::Stopped(ended) => {
                    tracing::debug!(service = %self.name, %ended, starts, restarts, "Supervisor ended");
                    return SupervisorReport {
                        name: self.name,
                        starts,
                        restarts,
                        last_exit,
                        ended,
                    };
                }
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServiceDefinition;
    use crate::testing::{context_with, Journal, RecordingConsole, ScriptedGateway, ScriptedRunner};
    use std::path::PathBuf;
    use std::time::Duration;

    fn service(name: &str) -> Service {
        let mut def = ServiceDefinition::new(name);
        def.path = Some(PathBuf::from(format!("/repos/{}", name)));
        def.start_with_env = true;
        Service::from_definition(&def)
    }

    fn context(runner: Arc<ScriptedRunner>, policy: RestartPolicy) -> Context {
        let mut ctx = context_with(runner, Arc::new(ScriptedGateway::new()));
        let settings = Arc::make_mut(&mut ctx.settings);
        settings.restart = policy;
        settings.environment = "stage4".to_string();
        ctx
    }

    #[test]
    fn test_supervisor_command_and_output() {
        let runner = Arc::new(ScriptedRunner::new());
        let mut ctx = context(runner, RestartPolicy::never());
        let svc = service("member-app");

        let spec = svc.supervisor(&ctx).unwrap().spec().clone();
        assert_eq!(spec.command, "npm start stage4");
        assert_eq!(spec.output, OutputTarget::Inherit);
        assert_eq!(spec.timeout, None);
        assert_eq!(spec.cwd, Some(PathBuf::from("/repos/member-app")));

        let settings = Arc::make_mut(&mut ctx.settings);
        settings.sessions = true;
        settings.output = OutputMode::File;
        settings.log_dir = PathBuf::from("/tmp/devrun-logs");
        let spec = svc.supervisor(&ctx).unwrap().spec().clone();
        assert_eq!(
            spec.command,
            "screen -DmS member-app /bin/bash -c 'npm start stage4'"
        );
        assert_eq!(
            spec.output,
            OutputTarget::LogFile(PathBuf::from("/tmp/devrun-logs/member-app.log"))
        );
    }

    #[test]
    fn test_supervisor_requires_path() {
        let ctx = context(Arc::new(ScriptedRunner::new()), RestartPolicy::never());
        let svc = Service::from_definition(&ServiceDefinition::new("api"));
        assert!(svc.supervisor(&ctx).is_err());
    }

    #[tokio::test]
    async fn test_never_policy_runs_once() {
        let runner = Arc::new(ScriptedRunner::new().exit("npm start", Exit::code(1)));
        let ctx = context(runner.clone(), RestartPolicy::never());

        let report = service("api")
            .supervisor(&ctx)
            .unwrap()
            .run(CancellationToken::new())
            .await;

        assert_eq!(report.starts, 1);
        assert_eq!(report.restarts, 0);
        assert_eq!(report.last_exit, Some(Exit::code(1)));
        assert_eq!(report.ended, EndReason::RestartLimit);
        assert_eq!(runner.commands().len(), 1);
    }

    #[tokio::test]
    async fn test_every_exit_respawns_until_limit() {
        let journal = Journal::new();
        let runner = Arc::new(ScriptedRunner::new());
        let mut ctx = context(
            runner.clone(),
            RestartPolicy {
                max_restarts: Some(2),
                ..RestartPolicy::default()
            },
        );
        ctx.console = Arc::new(RecordingConsole::with_journal(journal.clone()));

        let report = service("api")
            .supervisor(&ctx)
            .unwrap()
            .run(CancellationToken::new())
            .await;

        // Clean exits respawn just like crashes.
        assert_eq!(report.starts, 3);
        assert_eq!(report.restarts, 2);
        assert_eq!(report.ended, EndReason::RestartLimit);
        assert_eq!(
            journal.entries(),
            vec![
                "log: api Starting service...",
                "log: api has quit",
                "log: api Restarting service...",
                "log: api has quit",
                "log: api Restarting service...",
                "log: api has quit",
            ]
        );
    }

    #[tokio::test]
    async fn test_launch_failure_ends_supervision() {
        let runner = Arc::new(ScriptedRunner::new().fail_on("npm start"));
        let ctx = context(runner.clone(), RestartPolicy::default());

        let report = service("api")
            .supervisor(&ctx)
            .unwrap()
            .run(CancellationToken::new())
            .await;

        assert!(matches!(report.ended, EndReason::LaunchFailed(_)));
        assert_eq!(report.starts, 1);
        assert_eq!(report.last_exit, None);
    }

    #[tokio::test]
    async fn test_cancelled_before_launch() {
        let runner = Arc::new(ScriptedRunner::new());
        let ctx = context(runner, RestartPolicy::default());
        let cancel = CancellationToken::new();
        cancel.cancel();

        let report = service("api").supervisor(&ctx).unwrap().run(cancel).await;
        assert_eq!(report.ended, EndReason::Cancelled);
        assert_eq!(report.last_exit, None);
    }

    #[tokio::test]
    async fn test_cancel_interrupts_restart_delay() {
        let runner = Arc::new(ScriptedRunner::new());
        let ctx = context(
            runner.clone(),
            RestartPolicy {
                max_restarts: None,
                delay: Some(Duration::from_secs(3600)),
                exponential: false,
            },
        );
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(
            service("api")
                .supervisor(&ctx)
                .unwrap()
                .run(cancel.clone()),
        );

        tokio::time::sleep(Duration::from_millis(50)).await;
        cancel.cancel();
        let report = tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("supervisor should stop promptly")
            .unwrap();

        assert_eq!(report.ended, EndReason::Cancelled);
        assert_eq!(report.starts, 1);
        assert_eq!(report.restarts, 1);
    }
}
