//! Where a service lives: path resolution, existence, clone and branch.

use super::Service;
use crate::config::{trim_trailing_separator, ConfigStore};
use crate::context::Context;
use crate::error::{Error, Result};
use crate::output::Tone;
use crate::process::CommandSpec;
use crate::prompt::{ask_text, Question};
use shell_escape::escape;
use std::path::PathBuf;

impl Service {
    /// Make sure `path` is set, asking the operator when it is not and
    /// persisting the answer. A configured path never triggers a prompt.
    pub async fn resolve_path(&mut self, ctx: &Context, store: &mut ConfigStore) -> Result<()> {
        if self.path.is_some() {
            return Ok(());
        }

        let suggestion = ctx.settings.repo_root_or_cwd().join(&self.name);
        let question = Question::text("path", format!("What is the path to {}?", self.name))
            .with_default(suggestion.display().to_string());
        let answer = ask_text(ctx.gateway.as_ref(), question).await?;

        let answer = trim_trailing_separator(&answer);
        let path = if answer.is_empty() {
            suggestion
        } else {
            PathBuf::from(answer)
        };

        store.record_path(&self.name, &path)?;
        tracing::debug!(service = %self.name, path = %path.display(), "Resolved service path");
        self.path = Some(path);
        Ok(())
    }

    /// Whether the service directory exists. Errors other than "not found"
    /// propagate.
    pub async fn check_exists(&self) -> Result<bool> {
        let Some(path) = self.path.as_deref() else {
            return Ok(false);
        };
        match tokio::fs::metadata(path).await {
            Ok(_) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(Error::Io(e)),
        }
    }

    /// Clone `repository` into `path`.
    ///
    /// Completion is all that is awaited: a failed clone is logged, not
    /// returned, and the caller proceeds as if it succeeded.
    pub async fn git_clone(&self, ctx: &Context) -> Result<()> {
        let repository = self
            .repository
            .as_deref()
            .ok_or_else(|| Error::NoRepository(self.name.clone()))?;
        let path = self.require_path()?;

        if ctx.settings.log_level.is_debug() {
            self.say(ctx, [Tone::Yellow.text(format!("cloning {}", repository))]);
        }

        let command = format!(
            "git clone {} {}",
            escape(repository.into()),
            escape(path.to_string_lossy())
        );
        let exit = ctx
            .runner
            .run(&CommandSpec::new(command).timeout(ctx.settings.command_timeout))
            .await?;

        if exit.success() {
            if ctx.settings.log_level.is_debug() {
                self.say(ctx, [Tone::Green.text("cloned")]);
            }
        } else {
            tracing::warn!(service = %self.name, %exit, "git clone did not succeed");
            self.say(ctx, [Tone::Red.text(format!("git clone finished with {}", exit))]);
        }
        Ok(())
    }

    /// Record the checked-out branch, or an empty string when it cannot be
    /// determined. Never fails.
    pub async fn get_branch(&mut self, ctx: &Context) {
        self.branch = match self.path.as_deref() {
            None => String::new(),
            Some(path) => {
                let spec = CommandSpec::new("git rev-parse --abbrev-ref HEAD")
                    .cwd(path)
                    .timeout(ctx.settings.command_timeout);
                match ctx.runner.run_captured(&spec).await {
                    Ok(out) if out.exit.success() => {
                        out.stdout.lines().next().unwrap_or_default().trim().to_string()
                    }
                    Ok(_) => String::new(),
                    Err(e) => {
                        tracing::debug!(service = %self.name, error = %e, "Branch lookup failed");
                        String::new()
                    }
                }
            }
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConfigFile, ServiceDefinition};
    use crate::process::{CapturedOutput, Exit};
    use crate::testing::{context_with, ScriptedGateway, ScriptedRunner};
    use std::path::Path;
    use std::sync::Arc;

    fn service(name: &str, path: Option<&Path>) -> Service {
        let mut def = ServiceDefinition::new(name);
        def.path = path.map(Path::to_path_buf);
        def.repository = Some("git@example.com:org/api.git".to_string());
        Service::from_definition(&def)
    }

    #[tokio::test]
    async fn test_configured_path_never_prompts() {
        let dir = tempfile::tempdir().unwrap();
        let gateway = Arc::new(ScriptedGateway::new());
        let ctx = context_with(Arc::new(ScriptedRunner::new()), gateway.clone());
        let mut store = ConfigStore::new(dir.path().join("config.json"), ConfigFile::default());

        let mut svc = service("api", Some(Path::new("/repos/api")));
        svc.resolve_path(&ctx, &mut store).await.unwrap();

        assert!(gateway.asked().is_empty());
        assert_eq!(svc.path.as_deref(), Some(Path::new("/repos/api")));
        assert!(!dir.path().join("config.json").exists());
    }

    #[tokio::test]
    async fn test_missing_path_is_asked_and_persisted() {
        let dir = tempfile::tempdir().unwrap();
        let gateway = Arc::new(ScriptedGateway::new().answer("path", "/work/api/"));
        let ctx = context_with(Arc::new(ScriptedRunner::new()), gateway.clone());
        let config_path = dir.path().join("config.json");
        let mut store = ConfigStore::new(&config_path, ConfigFile::default());

        let mut svc = service("api", None);
        svc.resolve_path(&ctx, &mut store).await.unwrap();

        assert_eq!(gateway.asked(), vec!["path"]);
        assert_eq!(svc.path.as_deref(), Some(Path::new("/work/api")));
        let reloaded = ConfigStore::load(&config_path).unwrap().unwrap();
        assert_eq!(reloaded.path_override("api"), Some(Path::new("/work/api")));
    }

    #[tokio::test]
    async fn test_default_suggestion_uses_repo_root() {
        let dir = tempfile::tempdir().unwrap();
        let gateway = Arc::new(ScriptedGateway::new());
        let mut ctx = context_with(Arc::new(ScriptedRunner::new()), gateway.clone());
        Arc::make_mut(&mut ctx.settings).repo_root = Some(PathBuf::from("/repos"));
        let mut store = ConfigStore::new(dir.path().join("config.json"), ConfigFile::default());

        let mut svc = service("api", None);
        svc.resolve_path(&ctx, &mut store).await.unwrap();
        assert_eq!(svc.path.as_deref(), Some(Path::new("/repos/api")));
    }

    #[tokio::test]
    async fn test_check_exists() {
        let dir = tempfile::tempdir().unwrap();
        assert!(service("api", Some(dir.path())).check_exists().await.unwrap());
        assert!(!service("api", Some(&dir.path().join("missing")))
            .check_exists()
            .await
            .unwrap());
        assert!(!service("api", None).check_exists().await.unwrap());
    }

    #[tokio::test]
    async fn test_branch_is_trimmed_stdout() {
        let runner = Arc::new(ScriptedRunner::new().captured(
            "rev-parse",
            CapturedOutput {
                stdout: "feature/login\n".to_string(),
                stderr: String::new(),
                exit: Exit::code(0),
            },
        ));
        let ctx = context_with(runner, Arc::new(ScriptedGateway::new()));
        let mut svc = service("api", Some(Path::new("/repos/api")));
        svc.get_branch(&ctx).await;
        assert_eq!(svc.branch, "feature/login");
    }

    #[tokio::test]
    async fn test_branch_outside_git_repository_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context_with(
            Arc::new(crate::process::ShellRunner::new()),
            Arc::new(ScriptedGateway::new()),
        );
        let mut svc = service("api", Some(dir.path()));
        svc.branch = "stale".to_string();
        svc.get_branch(&ctx).await;
        assert_eq!(svc.branch, "");
    }

    #[tokio::test]
    async fn test_branch_lookup_failure_is_empty() {
        let runner = Arc::new(ScriptedRunner::new().fail_on("rev-parse"));
        let ctx = context_with(runner, Arc::new(ScriptedGateway::new()));
        let mut svc = service("api", Some(Path::new("/repos/api")));
        svc.get_branch(&ctx).await;
        assert_eq!(svc.branch, "");
    }

    #[tokio::test]
    async fn test_git_clone_ignores_exit_code() {
        let runner = Arc::new(ScriptedRunner::new().exit("git clone", Exit::code(128)));
        let ctx = context_with(runner.clone(), Arc::new(ScriptedGateway::new()));
        let svc = service("api", Some(Path::new("/repos/my api")));

        svc.git_clone(&ctx).await.unwrap();
        assert_eq!(
            runner.commands(),
            vec!["git clone 'git@example.com:org/api.git' '/repos/my api'"]
        );
    }

    #[tokio::test]
    async fn test_git_clone_without_repository_fails() {
        let ctx = context_with(Arc::new(ScriptedRunner::new()), Arc::new(ScriptedGateway::new()));
        let mut svc = Service::from_definition(&ServiceDefinition::new("local"));
        svc.path = Some(PathBuf::from("/repos/local"));
        assert!(matches!(svc.git_clone(&ctx).await, Err(Error::NoRepository(_))));
    }
}
