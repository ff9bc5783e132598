//! Restart policy for supervised services.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Upper bound for exponential restart delays.
const MAX_BACKOFF: Duration = Duration::from_secs(60);

/// `restart` block of the config file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestartConfig {
    /// Restarts allowed per service; absent means unlimited.
    #[serde(default)]
    pub max_restarts: Option<u32>,
    /// Delay before each restart, e.g. "2s".
    #[serde(default)]
    pub delay: Option<String>,
    /// Double the delay after every consecutive restart.
    #[serde(default)]
    pub exponential: bool,
}

/// When and how quickly an exited service is respawned.
///
/// The default respawns immediately and forever.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RestartPolicy {
    pub max_restarts: Option<u32>,
    pub delay: Option<Duration>,
    pub exponential: bool,
}

impl RestartPolicy {
    /// Never respawn; the service runs once.
    pub fn never() -> Self {
        Self {
            max_restarts: Some(0),
            ..Self::default()
        }
    }

    /// Whether restart number `restart` (1-indexed) may happen.
    pub fn allows(&self, restart: u32) -> bool {
        match self.max_restarts {
            Some(max) => restart <= max,
            None => true,
        }
    }

    /// Delay before restart number `restart` (1-indexed).
    ///
    /// Exponential delays double from the configured base, cap at 60s and get
    /// ±50% jitter so services that died together do not respawn together.
    pub fn delay_for(&self, restart: u32) -> Duration {
        let Some(base) = self.delay else {
            return Duration::ZERO;
        };
        if !self.exponential || restart == 0 {
            return base;
        }

        let exponent = restart.saturating_sub(1).min(16);
        let scaled = base.saturating_mul(2u32.pow(exponent)).min(MAX_BACKOFF);

        use rand::Rng;
        let millis = scaled.as_millis() as u64;
        let jitter = millis / 2;
        let low = millis.saturating_sub(jitter);
        let high = millis.saturating_add(jitter);
        if low < high {
            Duration::from_millis(rand::thread_rng().gen_range(low..=high))
        } else {
            scaled
        }
    }
}
