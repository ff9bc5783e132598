//! Detached `screen` sessions named after services.

use super::Service;
use crate::context::Context;
use crate::output::Tone;
use crate::process::{CommandSpec, OutputTarget};
use shell_escape::escape;

/// Wrap `command` so it runs inside a detached screen session called `name`.
///
/// `-D -m` keeps `screen` in the foreground until the session ends, so the
/// supervisor still observes the exit.
pub fn session_command(name: &str, command: &str) -> String {
    format!(
        "screen -DmS {} /bin/bash -c {}",
        escape(name.into()),
        escape(command.into())
    )
}

/// Whether a `screen -ls` listing mentions `name`.
///
/// Matching is by substring, so a session named `api-gateway` also matches
/// `api`.
pub fn listing_mentions(listing: &str, name: &str) -> bool {
    !name.is_empty() && listing.contains(name)
}

impl Service {
    /// Terminate the screen session named after this service.
    ///
    /// Best effort: a missing session, a nonzero exit or a failure to launch
    /// `screen` at all only shows up in debug output.
    pub async fn kill_session(&self, ctx: &Context) {
        let debug = ctx.settings.log_level.is_debug();
        if debug {
            self.say(ctx, [Tone::Yellow.text("Removing screen session...")]);
        }

        let spec = CommandSpec::new(format!("screen -X -S {} quit", escape(self.name.as_str().into())))
            .output(OutputTarget::Null)
            .timeout(ctx.settings.command_timeout);
        match ctx.runner.run(&spec).await {
            Ok(exit) if exit.success() => {
                if debug {
                    self.say(ctx, [Tone::Green.text("Removed screen session")]);
                }
            }
            Ok(exit) => {
                tracing::debug!(service = %self.name, %exit, "No screen session to remove");
            }
            Err(e) => {
                tracing::debug!(service = %self.name, error = %e, "Failed to remove screen session");
            }
        }
    }
}
