//! Command-line arguments: service names mixed with `key=value` overrides.

/// A coerced override value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OverrideValue {
    Bool(bool),
    Text(String),
}

/// Coerce a raw value: `true/yes/y/1` and `false/no/n/0` (any case) become
/// booleans, everything else stays text exactly as typed.
pub fn coerce_value(raw: &str) -> OverrideValue {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "y" | "1" => OverrideValue::Bool(true),
        "false" | "no" | "n" | "0" => OverrideValue::Bool(false),
        _ => OverrideValue::Text(raw.to_string()),
    }
}

/// A single `key=value` argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Override {
    pub key: String,
    /// The value as typed, for string-valued settings.
    pub raw: String,
    pub value: OverrideValue,
}

impl Override {
    /// Parse `key=value`, splitting on the first `=`.
    pub fn parse(arg: &str) -> Option<Self> {
        let (key, raw) = arg.split_once('=')?;
        let key = key.trim();
        if key.is_empty() {
            return None;
        }
        Some(Self {
            key: key.to_string(),
            raw: raw.to_string(),
            value: coerce_value(raw),
        })
    }
}

/// Positional arguments split into service names and overrides, each in the
/// order given.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Arguments {
    pub services: Vec<String>,
    pub overrides: Vec<Override>,
    /// Arguments containing `=` that are not valid overrides (e.g. `=x`).
    pub rejected: Vec<String>,
}

impl Arguments {
    pub fn parse<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut parsed = Self::default();
        for arg in args {
            let arg = arg.as_ref();
            if arg.contains('=') {
                match Override::parse(arg) {
                    Some(o) => parsed.overrides.push(o),
                    None => parsed.rejected.push(arg.to_string()),
                }
            } else {
                parsed.services.push(arg.to_string());
            }
        }
        parsed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coerce_boolean_tokens() {
        for token in ["true", "YES", "y", "1", "True"] {
            assert_eq!(coerce_value(token), OverrideValue::Bool(true), "{}", token);
        }
        for token in ["false", "No", "N", "0"] {
            assert_eq!(coerce_value(token), OverrideValue::Bool(false), "{}", token);
        }
    }

    #[test]
    fn test_coerce_keeps_other_values_verbatim() {
        assert_eq!(
            coerce_value("Stage4"),
            OverrideValue::Text("Stage4".to_string())
        );
        assert_eq!(coerce_value("2"), OverrideValue::Text("2".to_string()));
    }

    #[test]
    fn test_override_splits_on_first_equals() {
        let o = Override::parse("repos=/tmp/a=b").unwrap();
        assert_eq!(o.key, "repos");
        assert_eq!(o.raw, "/tmp/a=b");
        assert!(Override::parse("=yes").is_none());
    }

    #[test]
    fn test_arguments_split_services_and_overrides() {
        let args = Arguments::parse(["ion-core", "clean=yes", "member-app", "env=staging", "=x"]);
        assert_eq!(args.services, vec!["ion-core", "member-app"]);
        assert_eq!(args.overrides.len(), 2);
        assert_eq!(args.overrides[0].value, OverrideValue::Bool(true));
        assert_eq!(args.overrides[1].raw, "staging");
        assert_eq!(args.rejected, vec!["=x"]);
    }
}
