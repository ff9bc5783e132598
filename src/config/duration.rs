//! Human-readable durations for config values such as `commandTimeout`,
//! `startDelay` and `restart.delay`.

use crate::error::{Error, Result};
use std::time::Duration;

/// Parse `"500ms"`, `"30s"`, `"5m"`, `"1h"` or a bare number of seconds.
///
/// ```
/// use devrun::config::parse_duration_string;
/// use std::time::Duration;
///
/// assert_eq!(parse_duration_string("3s"), Some(Duration::from_secs(3)));
/// assert_eq!(parse_duration_string("10m"), Some(Duration::from_secs(600)));
/// assert_eq!(parse_duration_string("250ms"), Some(Duration::from_millis(250)));
/// ```
pub fn parse_duration_string(s: &str) -> Option<Duration> {
    let s = s.trim();
    // Scale to milliseconds; "ms" must be checked before "s".
    let (digits, scale) = if let Some(n) = s.strip_suffix("ms") {
        (n, 1)
    } else if let Some(n) = s.strip_suffix('s') {
        (n, 1_000)
    } else if let Some(n) = s.strip_suffix('m') {
        (n, 60_000)
    } else if let Some(n) = s.strip_suffix('h') {
        (n, 3_600_000)
    } else {
        (s, 1_000)
    };

    digits
        .trim()
        .parse::<u64>()
        .ok()
        .map(|n| Duration::from_millis(n.saturating_mul(scale)))
}

/// Parse an optional duration setting, naming the key in the error.
pub(crate) fn parse_setting(key: &str, value: Option<&str>) -> Result<Option<Duration>> {
    match value {
        None => Ok(None),
        Some(raw) => parse_duration_string(raw)
            .map(Some)
            .ok_or_else(|| Error::InvalidOverride {
                key: key.to_string(),
                reason: format!("'{}' is not a duration (try \"30s\", \"5m\", \"500ms\")", raw),
            }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_duration_units() {
        assert_eq!(parse_duration_string("5s"), Some(Duration::from_secs(5)));
        assert_eq!(parse_duration_string("2m"), Some(Duration::from_secs(120)));
        assert_eq!(parse_duration_string("1h"), Some(Duration::from_secs(3600)));
        assert_eq!(
            parse_duration_string("100ms"),
            Some(Duration::from_millis(100))
        );
        assert_eq!(parse_duration_string(" 10 "), Some(Duration::from_secs(10)));
    }

    #[test]
    fn test_parse_duration_invalid() {
        assert_eq!(parse_duration_string(""), None);
        assert_eq!(parse_duration_string("soon"), None);
        assert_eq!(parse_duration_string("-5s"), None);
        assert_eq!(parse_duration_string("5x"), None);
    }

    #[test]
    fn test_parse_setting_names_key() {
        assert_eq!(parse_setting("startDelay", None).unwrap(), None);
        let err = parse_setting("startDelay", Some("later")).unwrap_err();
        assert!(err.to_string().contains("startDelay"));
    }
}
