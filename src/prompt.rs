//! Operator prompts.
//!
//! The orchestrator asks for missing information (first-run settings, service
//! paths, clone confirmation) through [`InteractionGateway`]. The terminal
//! implementation reads lines from stdin and falls back to each question's
//! default when no operator is attached.

use crate::config::{coerce_value, OverrideValue};
use crate::error::{Error, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::io::{stdin, stdout, BufRead, IsTerminal, Write};

/// A single question put to the operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    /// Key of the answer in the returned [`Answers`].
    pub key: String,
    pub message: String,
    pub default: Option<String>,
    /// Allowed answers; empty means free text.
    pub choices: Vec<String>,
}

impl Question {
    pub fn text(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            message: message.into(),
            default: None,
            choices: Vec::new(),
        }
    }

    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self
    }

    pub fn with_choices<I, S>(mut self, choices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.choices = choices.into_iter().map(Into::into).collect();
        self
    }

    /// Map raw input onto an answer: empty input takes the default, a number
    /// picks a choice by position, anything else must name a choice.
    pub fn interpret(&self, raw: &str) -> Option<String> {
        let raw = raw.trim();
        if raw.is_empty() {
            return self.default.clone().or_else(|| self.choices.first().cloned());
        }
        if self.choices.is_empty() {
            return Some(raw.to_string());
        }
        if let Ok(index) = raw.parse::<usize>() {
            return index
                .checked_sub(1)
                .and_then(|i| self.choices.get(i))
                .cloned();
        }
        self.choices
            .iter()
            .find(|c| c.eq_ignore_ascii_case(raw))
            .cloned()
    }
}

pub type Answers = HashMap<String, String>;

#[async_trait]
pub trait InteractionGateway: Send + Sync {
    /// Ask every question in order and collect the answers by key.
    async fn ask(&self, questions: &[Question]) -> Result<Answers>;
}

/// Ask a single free-text question.
pub async fn ask_text(gateway: &dyn InteractionGateway, question: Question) -> Result<String> {
    let key = question.key.clone();
    let mut answers = gateway.ask(std::slice::from_ref(&question)).await?;
    Ok(answers.remove(&key).unwrap_or_default())
}

/// Ask a yes/no question. Accepts the same tokens as boolean overrides.
pub async fn confirm(gateway: &dyn InteractionGateway, key: &str, message: String) -> Result<bool> {
    let question = Question::text(key, message).with_default("yes");
    let answer = ask_text(gateway, question).await?;
    Ok(matches!(coerce_value(&answer), OverrideValue::Bool(true)))
}

/// Line-based prompts on the controlling terminal.
#[derive(Debug, Default, Clone)]
pub struct TerminalGateway;

impl TerminalGateway {
    pub fn new() -> Self {
        Self
    }

    /// Check if running in interactive TTY
    pub fn is_interactive() -> bool {
        if std::env::var_os("DEVRUN_NON_INTERACTIVE").is_some() {
            return false;
        }
        stdin().is_terminal() && stdout().is_terminal()
    }

    fn ask_blocking(questions: Vec<Question>) -> Result<Answers> {
        let mut answers = Answers::new();
        let interactive = Self::is_interactive();
        let input = stdin();

        for question in questions {
            let answer = if interactive {
                Self::prompt(&question, &mut input.lock())?
            } else {
                let answer = question.interpret("");
                tracing::debug!(
                    question = %question.key,
                    answer = ?answer,
                    "Non-interactive, using default answer"
                );
                answer.unwrap_or_default()
            };
            answers.insert(question.key.clone(), answer);
        }

        Ok(answers)
    }

    fn prompt(question: &Question, input: &mut impl BufRead) -> Result<String> {
        let mut out = stdout();
        loop {
            writeln!(out, "? {}", question.message).ok();
            for (i, choice) in question.choices.iter().enumerate() {
                writeln!(out, "  {}) {}", i + 1, choice).ok();
            }
            match &question.default {
                Some(default) => write!(out, "  ({}) > ", default).ok(),
                None => write!(out, "  > ").ok(),
            };
            out.flush().ok();

            let mut line = String::new();
            let read = input
                .read_line(&mut line)
                .map_err(|e| Error::Prompt(format!("Failed to read answer: {}", e)))?;
            if read == 0 {
                return Err(Error::Prompt("Input closed before an answer was given".to_string()));
            }

            match question.interpret(&line) {
                Some(answer) => return Ok(answer),
                None => writeln!(out, "  Please pick one of the listed choices").ok(),
            };
        }
    }
}

#[async_trait]
impl InteractionGateway for TerminalGateway {
    async fn ask(&self, questions: &[Question]) -> Result<Answers> {
        let questions = questions.to_vec();
        tokio::task::spawn_blocking(move || Self::ask_blocking(questions))
            .await
            .map_err(|e| Error::Prompt(format!("Prompt task failed: {}", e)))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedGateway;

    #[test]
    fn test_interpret_uses_default_on_empty_input() {
        let q = Question::text("path", "Where?").with_default("/repos/api");
        assert_eq!(q.interpret("  \n").as_deref(), Some("/repos/api"));
        assert_eq!(q.interpret("/elsewhere\n").as_deref(), Some("/elsewhere"));
    }

    #[test]
    fn test_interpret_choices_by_index_and_name() {
        let q = Question::text("log", "Log output").with_choices(["info", "debug", "verbose"]);
        assert_eq!(q.interpret("2").as_deref(), Some("debug"));
        assert_eq!(q.interpret("VERBOSE").as_deref(), Some("verbose"));
        assert_eq!(q.interpret("").as_deref(), Some("info"));
        assert_eq!(q.interpret("7"), None);
        assert_eq!(q.interpret("loud"), None);
    }

    #[test]
    fn test_prompt_reprompts_until_valid_choice() {
        let q = Question::text("log", "Log output").with_choices(["info", "debug"]);
        let mut input = std::io::Cursor::new("loud\n2\n");
        let answer = TerminalGateway::prompt(&q, &mut input).unwrap();
        assert_eq!(answer, "debug");
    }

    #[test]
    fn test_prompt_errors_on_closed_input() {
        let q = Question::text("path", "Where?");
        let mut input = std::io::Cursor::new("");
        assert!(TerminalGateway::prompt(&q, &mut input).is_err());
    }

    #[tokio::test]
    async fn test_confirm_accepts_boolean_tokens() {
        for (answer, expected) in [("y", true), ("YES", true), ("1", true), ("no", false), ("maybe", false)] {
            let gateway = ScriptedGateway::new().answer("clone", answer);
            assert_eq!(
                confirm(&gateway, "clone", "Clone?".to_string()).await.unwrap(),
                expected,
                "answer {:?}",
                answer
            );
        }
    }
}
