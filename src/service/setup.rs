//! Dependency setup steps.
//!
//! Every step resolves `Ok` as a no-op when its flag is off, so
//! [`Service::run_setup`] can always chain all four in the same order.
//! Steps wait for completion only; a nonzero exit is logged and setup moves on.

use super::{Service, DEPENDENCY_DIR};
use crate::context::Context;
use crate::error::{Error, Result};
use crate::output::Tone;
use crate::process::{CommandSpec, Exit};
use shell_escape::escape;
use std::collections::VecDeque;

impl Service {
    /// `clear → install → link self → link children into this parent`.
    pub async fn run_setup(&self, ctx: &Context, ions: &[String]) -> Result<()> {
        self.clear_dependencies(ctx).await?;
        self.install_dependencies(ctx).await?;
        self.link_self(ctx).await?;
        self.link_into_parents(ctx, ions).await
    }

    pub async fn clear_dependencies(&self, ctx: &Context) -> Result<()> {
        if !self.flags.clear_dependencies {
            self.say(ctx, [Tone::Gray.text("Skipping node_modules removal")]);
            return Ok(());
        }

        let dir = self.require_path()?.join(DEPENDENCY_DIR);
        self.say(ctx, [Tone::Yellow.text("Removing node_modules...")]);
        match tokio::fs::remove_dir_all(&dir).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                return Err(Error::Process(format!(
                    "Failed to remove '{}': {}",
                    dir.display(),
                    e
                )))
            }
        }
        self.say(ctx, [Tone::Green.text("Removed node_modules")]);
        Ok(())
    }

    pub async fn install_dependencies(&self, ctx: &Context) -> Result<()> {
        if !self.flags.install {
            self.say(ctx, [Tone::Gray.text("Skipping dependency installation")]);
            return Ok(());
        }

        self.say(ctx, [Tone::Yellow.text("Installing dependencies...")]);
        let command = format!(
            "{} install{}",
            ctx.settings.package_manager,
            ctx.settings.quiet_flag()
        );
        self.run_step(ctx, command).await?;
        self.say(ctx, [Tone::Green.text("Installed dependencies")]);
        Ok(())
    }

    pub async fn link_self(&self, ctx: &Context) -> Result<()> {
        if !self.flags.link {
            self.say(ctx, [Tone::Gray.text("Skipping module link")]);
            return Ok(());
        }

        self.say(ctx, [Tone::Yellow.text("Linking module...")]);
        let command = format!(
            "{} link{}",
            ctx.settings.package_manager,
            ctx.settings.quiet_flag()
        );
        self.run_step(ctx, command).await?;
        self.say(ctx, [Tone::Green.text("Linked module")]);
        Ok(())
    }

    /// Link every selected ion into this service when it is a primary
    /// application.
    ///
    /// Links run one at a time: the package manager rewrites the parent's
    /// manifest on each link and concurrent links against it corrupt it.
    pub async fn link_into_parents(&self, ctx: &Context, ions: &[String]) -> Result<()> {
        if !self.kind.primary {
            return Ok(());
        }

        let mut queue: VecDeque<&str> = ions
            .iter()
            .map(String::as_str)
            .filter(|child| *child != self.name)
            .collect();

        while let Some(child) = queue.pop_front() {
            self.say(
                ctx,
                [
                    Tone::Yellow.text("Linking"),
                    Tone::Magenta.text(child),
                    Tone::Gray.text("to"),
                    Tone::Magenta.text(&self.name),
                ],
            );
            let command = format!(
                "{} link {}{}",
                ctx.settings.package_manager,
                escape(child.into()),
                ctx.settings.quiet_flag()
            );
            self.run_step(ctx, command).await?;
            self.say(
                ctx,
                [
                    Tone::Green.text("Linked"),
                    Tone::Magenta.text(child),
                    Tone::Gray.text("to"),
                    Tone::Magenta.text(&self.name),
                ],
            );
        }
        Ok(())
    }

    async fn run_step(&self, ctx: &Context, command: String) -> Result<Exit> {
        let spec = CommandSpec::new(command)
            .cwd(self.require_path()?)
            .timeout(ctx.settings.command_timeout);
        let exit = ctx.runner.run(&spec).await?;
        if !exit.success() {
            tracing::warn!(service = %self.name, command = %spec, %exit, "Setup step did not succeed");
            self.say(
                ctx,
                [Tone::Red.text(format!("`{}` finished with {}", spec, exit))],
            );
        }
        Ok(exit)
    }
}
