// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 seqflow contributors

//! Stage inclusion predicates

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::{ConfigError, ConfigValues, DataLocation};

type PredicateFn = dyn Fn(&ConfigValues) -> Result<bool, ConfigError> + Send + Sync;

/// A custom inclusion predicate supplied from code
#[derive(Clone)]
pub struct Predicate(Arc<PredicateFn>);

impl Predicate {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&ConfigValues) -> Result<bool, ConfigError> + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }
}

impl std::fmt::Debug for Predicate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Predicate(..)")
    }
}

/// Decides whether a stage is part of a given run
///
/// In YAML a variant is written as a single-key map (`flag: runDkfz`,
/// `not: { flag: cleanup }`) or, without data, a plain string (`never`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Condition {
    /// Always include (default)
    #[default]
    Always,
    /// Never include
    Never,
    /// Include when the boolean key is true; the key is required
    Flag(String),
    /// Include when the boolean key is true, falling back to `default`
    FlagOr { key: String, default: bool },
    /// Include when the key equals `value` (case-insensitive); the key is required
    Equals { key: String, value: String },
    /// Include when the key names the data location `is`. The key is
    /// required and must be one of local, GNOS or S3.
    Location { key: String, is: DataLocation },
    Not(Box<Condition>),
    All(Vec<Condition>),
    Any(Vec<Condition>),
    /// Arbitrary predicate, only available to library callers
    #[serde(skip)]
    Custom(Predicate),
}

impl Condition {
    pub fn flag(key: impl Into<String>) -> Self {
        Self::Flag(key.into())
    }

    pub fn flag_or(key: impl Into<String>, default: bool) -> Self {
        Self::FlagOr {
            key: key.into(),
            default,
        }
    }

    pub fn equals(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Equals {
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn location(key: impl Into<String>, is: DataLocation) -> Self {
        Self::Location { key: key.into(), is }
    }

    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(&ConfigValues) -> Result<bool, ConfigError> + Send + Sync + 'static,
    {
        Self::Custom(Predicate::new(f))
    }

    /// Evaluate against a configuration. Combinators short-circuit, so a key
    /// behind a false `all` branch is never required.
    pub fn evaluate(&self, config: &ConfigValues) -> Result<bool, ConfigError> {
        match self {
            Self::Always => Ok(true),
            Self::Never => Ok(false),
            Self::Flag(key) => config.require_bool(key),
            Self::FlagOr { key, default } => config.optional_bool(key, *default),
            Self::Equals { key, value } => {
                Ok(config.require_str(key)?.eq_ignore_ascii_case(value.trim()))
            }
            Self::Location { key, is } => Ok(config.require_location(key)? == *is),
            Self::Not(inner) => Ok(!inner.evaluate(config)?),
            Self::All(conditions) => {
                for c in conditions {
                    if !c.evaluate(config)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            Self::Any(conditions) => {
                for c in conditions {
                    if c.evaluate(config)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            Self::Custom(Predicate(f)) => f(config),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ConfigValues {
        ConfigValues::from_pairs([
            ("runDkfz", "true"),
            ("cleanup", "false"),
            ("uploadDestination", "s3"),
        ])
    }

    #[test]
    fn test_flags() {
        let config = config();
        assert!(Condition::flag("runDkfz").evaluate(&config).unwrap());
        assert!(!Condition::flag("cleanup").evaluate(&config).unwrap());
        assert!(Condition::flag("missing").evaluate(&config).is_err());
        assert!(Condition::flag_or("missing", true).evaluate(&config).unwrap());
    }

    #[test]
    fn test_equals_is_case_insensitive() {
        let config = config();
        assert!(Condition::equals("uploadDestination", "S3")
            .evaluate(&config)
            .unwrap());
        assert!(!Condition::equals("uploadDestination", "GNOS")
            .evaluate(&config)
            .unwrap());
    }

    #[test]
    fn test_combinators_short_circuit() {
        let config = config();
        let cond = Condition::All(vec![
            Condition::flag("cleanup"),
            Condition::flag("not_defined"),
        ]);
        assert!(!cond.evaluate(&config).unwrap());

        let cond = Condition::Any(vec![
            Condition::flag("runDkfz"),
            Condition::flag("not_defined"),
        ]);
        assert!(cond.evaluate(&config).unwrap());

        let cond = Condition::Not(Box::new(Condition::flag("cleanup")));
        assert!(cond.evaluate(&config).unwrap());
    }

    #[test]
    fn test_custom_predicate() {
        let cond = Condition::custom(|c| Ok(c.require_str("uploadDestination")? != "local"));
        assert!(cond.evaluate(&config()).unwrap());
    }

    #[test]
    fn test_location_validates_value() {
        let config = config();
        assert!(Condition::location("uploadDestination", DataLocation::S3)
            .evaluate(&config)
            .unwrap());
        assert!(!Condition::location("uploadDestination", DataLocation::Gnos)
            .evaluate(&config)
            .unwrap());

        let config = ConfigValues::from_pairs([("downloadSource", "ftp")]);
        assert!(matches!(
            Condition::location("downloadSource", DataLocation::Local).evaluate(&config),
            Err(ConfigError::Unparseable { ref key, .. }) if key == "downloadSource"
        ));
    }

    fn parse(yaml: &str) -> Condition {
        serde_yaml::with::singleton_map_recursive::deserialize(serde_yaml::Deserializer::from_str(yaml)).unwrap()
    }

    #[test]
    fn test_parse_from_yaml() {
        let cond = parse("flag_or: { key: cleanup, default: false }");
        assert!(matches!(cond, Condition::FlagOr { default: false, .. }));

        let cond = parse("always");
        assert!(matches!(cond, Condition::Always));

        let cond = parse("any:\n  - flag: runDkfz\n  - equals: { key: uploadDestination, value: GNOS }\n");
        assert!(cond.evaluate(&config()).unwrap());

        let cond = parse("location: { key: uploadDestination, is: s3 }");
        assert!(matches!(cond, Condition::Location { is: DataLocation::S3, .. }));
    }

    #[test]
    fn test_parse_nested_combinators() {
        let cond = parse(
            "all:\n  - not: { flag: cleanup }\n  - any: [ never, { flag_or: { key: runEmbl, default: true } } ]\n",
        );
        assert!(matches!(cond, Condition::All(ref c) if c.len() == 2));
        assert!(cond.evaluate(&config()).unwrap());
    }
}
