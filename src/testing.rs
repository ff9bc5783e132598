//! Test doubles for the orchestration seams.
//!
//! Lets orchestration logic run without touching the operating system, the
//! terminal or the operator:
//!
//! - [`ScriptedRunner`] replaces [`ShellRunner`](crate::process::ShellRunner)
//!   and records every command it is asked to run
//! - [`ScriptedGateway`] answers prompts from a script
//! - [`RecordingConsole`] keeps status lines as plain text
//! - [`Journal`] interleaves runner calls and console lines in one ordered log
//!
//! # Example
//!
//! ```
//! use devrun::process::{CommandSpec, Exit, ProcessRunner};
//! use devrun::testing::ScriptedRunner;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let runner = ScriptedRunner::new().exit("npm install", Exit::code(1));
//! let exit = runner.run(&CommandSpec::new("npm install --silent")).await.unwrap();
//!
//! assert_eq!(exit, Exit::code(1));
//! assert_eq!(runner.commands(), vec!["npm install --silent"]);
//! # }
//! ```

use crate::config::{RestartPolicy, Settings};
use crate::context::Context;
use crate::error::{Error, Result};
use crate::output::{plain, Console, QuietConsole, Segment};
use crate::process::{CapturedOutput, CommandSpec, Exit, ProcessRunner};
use crate::prompt::{Answers, InteractionGateway, Question};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Shared, ordered log of everything test doubles observed.
///
/// Entries are `run: <command>`, `log: <plain line>` and `separator`.
#[derive(Debug, Clone, Default)]
pub struct Journal {
    entries: Arc<Mutex<Vec<String>>>,
}

impl Journal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, entry: impl Into<String>) {
        self.entries.lock().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.entries.lock().clone()
    }

    /// Only the commands, in the order they were run.
    pub fn commands(&self) -> Vec<String> {
        self.entries
            .lock()
            .iter()
            .filter_map(|e| e.strip_prefix("run: ").map(str::to_string))
            .collect()
    }
}

#[derive(Debug, Clone)]
enum Outcome {
    Exit(Exit),
    Captured(CapturedOutput),
    Fail,
}

/// [`ProcessRunner`] that answers from a script instead of spawning anything.
///
/// Rules match when their pattern is a substring of the command line; the
/// first rule registered wins. Unmatched commands exit 0 with empty output.
#[derive(Debug, Default)]
pub struct ScriptedRunner {
    rules: Vec<(String, Outcome)>,
    latency: Option<Duration>,
    calls: Mutex<Vec<CommandSpec>>,
    journal: Option<Journal>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Buffered output for matching `run_captured` calls.
    pub fn captured(mut self, pattern: &str, output: CapturedOutput) -> Self {
        self.rules.push((pattern.to_string(), Outcome::Captured(output)));
        self
    }

    /// Exit status for matching commands.
    pub fn exit(mut self, pattern: &str, exit: Exit) -> Self {
        self.rules.push((pattern.to_string(), Outcome::Exit(exit)));
        self
    }

    /// Matching commands fail to launch.
    pub fn fail_on(mut self, pattern: &str) -> Self {
        self.rules.push((pattern.to_string(), Outcome::Fail));
        self
    }

    /// Every command takes `latency` to complete.
    pub fn latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn with_journal(mut self, journal: Journal) -> Self {
        self.journal = Some(journal);
        self
    }

    pub fn calls(&self) -> Vec<CommandSpec> {
        self.calls.lock().clone()
    }

    pub fn commands(&self) -> Vec<String> {
        self.calls.lock().iter().map(|c| c.command.clone()).collect()
    }

    async fn record(&self, spec: &CommandSpec) -> Option<Outcome> {
        self.calls.lock().push(spec.clone());
        if let Some(ref journal) = self.journal {
            journal.push(format!("run: {}", spec.command));
        }
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        self.rules
            .iter()
            .find(|(pattern, _)| spec.command.contains(pattern.as_str()))
            .map(|(_, outcome)| outcome.clone())
    }
}

#[async_trait]
impl ProcessRunner for ScriptedRunner {
    async fn run(&self, spec: &CommandSpec) -> Result<Exit> {
        match self.record(spec).await {
            None => Ok(Exit::code(0)),
            Some(Outcome::Exit(exit)) => Ok(exit),
            Some(Outcome::Captured(output)) => Ok(output.exit),
            Some(Outcome::Fail) => Err(Error::Process(format!(
                "Failed to spawn '{}': scripted failure",
                spec.command
            ))),
        }
    }

    async fn run_captured(&self, spec: &CommandSpec) -> Result<CapturedOutput> {
        let empty = |exit| CapturedOutput {
            stdout: String::new(),
            stderr: String::new(),
            exit,
        };
        match self.record(spec).await {
            None => Ok(empty(Exit::code(0))),
            Some(Outcome::Exit(exit)) => Ok(empty(exit)),
            Some(Outcome::Captured(output)) => Ok(output),
            Some(Outcome::Fail) => Err(Error::Process(format!(
                "Failed to spawn '{}': scripted failure",
                spec.command
            ))),
        }
    }
}

/// [`InteractionGateway`] with scripted answers keyed by question key.
///
/// Scripted answers are returned verbatim. Unscripted questions get what an
/// empty line would give: the default, or the first choice.
#[derive(Debug, Default)]
pub struct ScriptedGateway {
    answers: HashMap<String, String>,
    asked: Mutex<Vec<String>>,
}

impl ScriptedGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn answer(mut self, key: &str, value: &str) -> Self {
        self.answers.insert(key.to_string(), value.to_string());
        self
    }

    /// Keys of every question asked so far, in order.
    pub fn asked(&self) -> Vec<String> {
        self.asked.lock().clone()
    }
}

#[async_trait]
impl InteractionGateway for ScriptedGateway {
    async fn ask(&self, questions: &[Question]) -> Result<Answers> {
        let mut answers = Answers::new();
        for question in questions {
            self.asked.lock().push(question.key.clone());
            let answer = match self.answers.get(&question.key) {
                Some(answer) => answer.clone(),
                None => question.interpret("").unwrap_or_default(),
            };
            answers.insert(question.key.clone(), answer);
        }
        Ok(answers)
    }
}

/// [`Console`] that keeps every line as uncolored text.
#[derive(Debug, Default)]
pub struct RecordingConsole {
    journal: Journal,
}

impl RecordingConsole {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record into a journal shared with other doubles.
    pub fn with_journal(journal: Journal) -> Self {
        Self { journal }
    }

    /// Logged lines without the `log: ` prefix; separators are skipped.
    pub fn lines(&self) -> Vec<String> {
        self.journal
            .entries()
            .into_iter()
            .filter_map(|e| e.strip_prefix("log: ").map(str::to_string))
            .collect()
    }
}

impl Console for RecordingConsole {
    fn log(&self, segments: &[Segment]) {
        self.journal.push(format!("log: {}", plain(segments)));
    }

    fn separator(&self) {
        self.journal.push("separator");
    }
}

/// Settings for tests: no start delay, no respawns.
pub fn test_settings() -> Settings {
    Settings {
        start_delay: Duration::ZERO,
        restart: RestartPolicy::never(),
        ..Settings::default()
    }
}

/// A context around the given doubles with [`test_settings`] and no output.
pub fn context_with(
    runner: Arc<dyn ProcessRunner>,
    gateway: Arc<dyn InteractionGateway>,
) -> Context {
    Context::new(test_settings(), runner, gateway, Arc::new(QuietConsole))
}
