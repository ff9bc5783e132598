//! Subprocess execution.
//!
//! [`ProcessRunner`] is the seam between orchestration logic and the operating
//! system. [`ShellRunner`] is the real implementation; tests substitute
//! [`crate::testing::ScriptedRunner`].

use crate::error::{Error, Result};
use async_trait::async_trait;
use std::fmt;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

/// Where a command's stdout/stderr go.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum OutputTarget {
    /// Inherit the parent's streams.
    #[default]
    Inherit,
    /// Discard output.
    Null,
    /// Append both streams to a file, creating parent directories.
    LogFile(PathBuf),
}

/// A shell command line plus how to run it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub command: String,
    pub cwd: Option<PathBuf>,
    pub output: OutputTarget,
    pub timeout: Option<Duration>,
}

impl CommandSpec {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            cwd: None,
            output: OutputTarget::Inherit,
            timeout: None,
        }
    }

    pub fn cwd(mut self, cwd: impl AsRef<Path>) -> Self {
        self.cwd = Some(cwd.as_ref().to_path_buf());
        self
    }

    pub fn output(mut self, output: OutputTarget) -> Self {
        self.output = output;
        self
    }

    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.command)
    }
}

/// How a child process ended. `code` is `None` when it was killed by a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Exit {
    pub code: Option<i32>,
}

impl Exit {
    pub fn code(code: i32) -> Self {
        Self { code: Some(code) }
    }

    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

impl From<std::process::ExitStatus> for Exit {
    fn from(status: std::process::ExitStatus) -> Self {
        Self {
            code: status.code(),
        }
    }
}

impl fmt::Display for Exit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code {
            Some(code) => write!(f, "exit code {}", code),
            None => write!(f, "terminated by signal"),
        }
    }
}

/// Buffered result of [`ProcessRunner::run_captured`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit: Exit,
}

#[async_trait]
pub trait ProcessRunner: Send + Sync {
    /// Run a command to completion with its output routed per `spec.output`.
    ///
    /// A nonzero exit is not an error; callers decide what an exit code means.
    async fn run(&self, spec: &CommandSpec) -> Result<Exit>;

    /// Run a command with both streams buffered. Nothing reaches the parent's
    /// streams, and stderr output or a nonzero exit still resolves `Ok`.
    async fn run_captured(&self, spec: &CommandSpec) -> Result<CapturedOutput>;
}

/// Runs command lines through `/bin/bash -c`.
#[derive(Debug, Clone)]
pub struct ShellRunner {
    shell: PathBuf,
}

impl Default for ShellRunner {
    fn default() -> Self {
        Self {
            shell: PathBuf::from("/bin/bash"),
        }
    }
}

impl ShellRunner {
    pub fn new() -> Self {
        Self::default()
    }

    fn command(&self, spec: &CommandSpec) -> Command {
        let mut cmd = Command::new(&self.shell);
        cmd.arg("-c").arg(&spec.command);
        // Dropping the wait future (timeout, shutdown) must not leave orphans behind.
        cmd.kill_on_drop(true);
        if let Some(ref cwd) = spec.cwd {
            cmd.current_dir(cwd);
        }
        cmd
    }

    fn route_output(cmd: &mut Command, output: &OutputTarget) -> Result<()> {
        match output {
            OutputTarget::Inherit => {
                cmd.stdin(Stdio::inherit())
                    .stdout(Stdio::inherit())
                    .stderr(Stdio::inherit());
            }
            OutputTarget::Null => {
                cmd.stdin(Stdio::null())
                    .stdout(Stdio::null())
                    .stderr(Stdio::null());
            }
            OutputTarget::LogFile(path) => {
                if let Some(parent) = path.parent() {
                    std::fs::create_dir_all(parent)?;
                }
                let file = std::fs::OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)
                    .map_err(|e| {
                        Error::Process(format!(
                            "Failed to open log file '{}': {}",
                            path.display(),
                            e
                        ))
                    })?;
                let stderr = file.try_clone()?;
                cmd.stdin(Stdio::null())
                    .stdout(Stdio::from(file))
                    .stderr(Stdio::from(stderr));
            }
        }
        Ok(())
    }
}

/// Await `fut`, failing with [`Error::Timeout`] once `limit` elapses.
async fn within<T>(
    limit: Option<Duration>,
    command: &str,
    fut: impl Future<Output = std::io::Result<T>>,
) -> Result<T> {
    let result = match limit {
        Some(after) => tokio::time::timeout(after, fut)
            .await
            .map_err(|_| Error::Timeout {
                command: command.to_string(),
                after,
            })?,
        None => fut.await,
    };
    result.map_err(|e| Error::Process(format!("Failed to run `{}`: {}", command, e)))
}

#[async_trait]
impl ProcessRunner for ShellRunner {
    async fn run(&self, spec: &CommandSpec) -> Result<Exit> {
        tracing::debug!(command = %spec.command, cwd = ?spec.cwd, "Running command");

        let mut cmd = self.command(spec);
        Self::route_output(&mut cmd, &spec.output)?;

        let mut child = cmd
            .spawn()
            .map_err(|e| Error::Process(format!("Failed to spawn `{}`: {}", spec.command, e)))?;

        let status = within(spec.timeout, &spec.command, child.wait()).await?;
        Ok(Exit::from(status))
    }

    async fn run_captured(&self, spec: &CommandSpec) -> Result<CapturedOutput> {
        tracing::debug!(command = %spec.command, cwd = ?spec.cwd, "Running captured command");

        let mut cmd = self.command(spec);
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let output = within(spec.timeout, &spec.command, cmd.output()).await?;
        let captured = CapturedOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            exit: Exit::from(output.status),
        };

        if !captured.stdout.is_empty() {
            tracing::trace!(command = %spec.command, "stdout:\n{}", captured.stdout);
        }
        if !captured.stderr.is_empty() {
            tracing::trace!(command = %spec.command, "stderr:\n{}", captured.stderr);
        }

        Ok(captured)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_run_reports_nonzero_exit_without_error() {
        let runner = ShellRunner::new();
        let exit = runner
            .run(&CommandSpec::new("exit 3").output(OutputTarget::Null))
            .await
            .unwrap();
        assert_eq!(exit, Exit::code(3));
        assert!(!exit.success());
    }

    #[tokio::test]
    async fn test_run_captured_surfaces_both_streams() {
        let runner = ShellRunner::new();
        let out = runner
            .run_captured(&CommandSpec::new("echo out; echo err >&2; exit 1"))
            .await
            .unwrap();
        assert_eq!(out.stdout.trim(), "out");
        assert_eq!(out.stderr.trim(), "err");
        assert_eq!(out.exit, Exit::code(1));
    }

    #[tokio::test]
    async fn test_run_captured_uses_cwd() {
        let dir = tempfile::tempdir().unwrap();
        let runner = ShellRunner::new();
        let out = runner
            .run_captured(&CommandSpec::new("pwd").cwd(dir.path()))
            .await
            .unwrap();
        let reported = std::fs::canonicalize(out.stdout.trim()).unwrap();
        assert_eq!(reported, std::fs::canonicalize(dir.path()).unwrap());
    }

    #[tokio::test]
    async fn test_run_appends_to_log_file() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("logs").join("svc.log");
        let runner = ShellRunner::new();

        for line in ["first", "second"] {
            runner
                .run(&CommandSpec::new(format!("echo {}", line)).output(OutputTarget::LogFile(log.clone())))
                .await
                .unwrap();
        }

        let content = std::fs::read_to_string(&log).unwrap();
        assert_eq!(content, "first\nsecond\n");
    }

    #[tokio::test]
    async fn test_timeout_kills_slow_command() {
        let runner = ShellRunner::new();
        let spec = CommandSpec::new("sleep 5")
            .output(OutputTarget::Null)
            .timeout(Some(Duration::from_millis(100)));
        let err = runner.run(&spec).await.unwrap_err();
        assert!(matches!(err, Error::Timeout { .. }));
    }

    #[tokio::test]
    async fn test_missing_cwd_is_process_error() {
        let runner = ShellRunner::new();
        let spec = CommandSpec::new("true").cwd("/definitely/not/here");
        let err = runner.run_captured(&spec).await.unwrap_err();
        assert!(matches!(err, Error::Process(_)));
    }
}
