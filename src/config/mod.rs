// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 seqflow contributors

//! Run configuration
//!
//! A `ConfigValues` set is the resolved workflow ini: string keys mapped to
//! string, integer or boolean values. It is assembled once (pipeline defaults,
//! then the ini file, then command-line overrides) and is immutable for the
//! duration of a build. Lookups are lazy: a missing key only fails the stage
//! that asks for it.

mod ini;

pub use self::ini::parse_ini;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

use crate::errors::SeqflowError;

/// A single configuration value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConfigValue {
    Bool(bool),
    Int(i64),
    Str(String),
}

impl std::fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{}", b),
            Self::Int(i) => write!(f, "{}", i),
            Self::Str(s) => write!(f, "{}", s),
        }
    }
}

impl From<&str> for ConfigValue {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

impl From<String> for ConfigValue {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl From<i64> for ConfigValue {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<bool> for ConfigValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

/// Failure to look up or parse a configuration key
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("required key '{key}' is missing")]
    Missing { key: String },

    #[error("value '{value}' of key '{key}' is not a valid {expected}")]
    Unparseable {
        key: String,
        value: String,
        expected: &'static str,
    },
}

impl ConfigError {
    /// Key the error is about
    pub fn key(&self) -> &str {
        match self {
            Self::Missing { key } | Self::Unparseable { key, .. } => key,
        }
    }

    /// Lift into a build error attributed to `context` (usually "stage 'x'")
    pub fn in_context(self, context: impl Into<String>) -> SeqflowError {
        SeqflowError::ConfigResolution {
            context: context.into(),
            key: self.key().to_string(),
            reason: self.to_string(),
        }
    }
}

/// Where input data comes from or where results go
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum DataLocation {
    Local,
    Gnos,
    S3,
}

impl FromStr for DataLocation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "gnos" => Ok(Self::Gnos),
            "s3" => Ok(Self::S3),
            _ => Err(format!("Unknown data location: {}", s)),
        }
    }
}

impl std::fmt::Display for DataLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Local => write!(f, "local"),
            Self::Gnos => write!(f, "GNOS"),
            Self::S3 => write!(f, "S3"),
        }
    }
}

impl TryFrom<String> for DataLocation {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<DataLocation> for String {
    fn from(location: DataLocation) -> Self {
        location.to_string()
    }
}

/// Immutable set of configuration values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConfigValues {
    values: BTreeMap<String, ConfigValue>,
}

impl ConfigValues {
    /// Create an empty configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert, used when assembling a configuration
    pub fn with(mut self, key: impl Into<String>, value: impl Into<ConfigValue>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    /// Parse a SeqWare-style ini document
    pub fn from_ini_str(content: &str, source_name: &str) -> Result<Self, SeqflowError> {
        let values = parse_ini(content, source_name)?
            .into_iter()
            .map(|(k, v)| (k, ConfigValue::Str(v)))
            .collect();
        Ok(Self { values })
    }

    /// Load a SeqWare-style ini file
    pub fn from_ini_file(path: &Path) -> Result<Self, SeqflowError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| SeqflowError::FileReadError {
                path: path.to_path_buf(),
                error: e.to_string(),
            })?;
        Self::from_ini_str(&content, &path.display().to_string())
    }

    /// Build from plain string pairs (pipeline defaults, `--set` overrides)
    pub fn from_pairs<K, V, I>(pairs: I) -> Self
    where
        K: Into<String>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        let values = pairs
            .into_iter()
            .map(|(k, v)| (k.into(), ConfigValue::Str(v.into())))
            .collect();
        Self { values }
    }

    /// Layer `overrides` on top of `self`, returning a new set
    pub fn overlay(&self, overrides: &ConfigValues) -> Self {
        let mut values = self.values.clone();
        values.extend(
            overrides
                .values
                .iter()
                .map(|(k, v)| (k.clone(), v.clone())),
        );
        Self { values }
    }

    pub fn get(&self, key: &str) -> Option<&ConfigValue> {
        self.values.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate keys and values in key order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ConfigValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// True when the key is present, non-empty and not the literal `null`
    pub fn has_property_and_not_null(&self, key: &str) -> bool {
        match self.values.get(key) {
            Some(ConfigValue::Str(s)) => {
                let s = s.trim();
                !s.is_empty() && s != "null"
            }
            Some(_) => true,
            None => false,
        }
    }

    pub fn require_str(&self, key: &str) -> Result<String, ConfigError> {
        if !self.has_property_and_not_null(key) {
            return Err(ConfigError::Missing { key: key.into() });
        }
        Ok(self.values[key].to_string().trim().to_string())
    }

    pub fn require_int(&self, key: &str) -> Result<i64, ConfigError> {
        match self.values.get(key) {
            Some(ConfigValue::Int(i)) => Ok(*i),
            Some(_) => {
                let raw = self.require_str(key)?;
                raw.parse().map_err(|_| ConfigError::Unparseable {
                    key: key.into(),
                    value: raw,
                    expected: "integer",
                })
            }
            None => Err(ConfigError::Missing { key: key.into() }),
        }
    }

    pub fn require_bool(&self, key: &str) -> Result<bool, ConfigError> {
        match self.values.get(key) {
            Some(ConfigValue::Bool(b)) => Ok(*b),
            Some(_) => {
                let raw = self.require_str(key)?;
                parse_bool(&raw).ok_or(ConfigError::Unparseable {
                    key: key.into(),
                    value: raw,
                    expected: "boolean",
                })
            }
            None => Err(ConfigError::Missing { key: key.into() }),
        }
    }

    /// Boolean with a default for absent (or null) keys; garbage still fails
    pub fn optional_bool(&self, key: &str, default: bool) -> Result<bool, ConfigError> {
        if self.has_property_and_not_null(key) {
            self.require_bool(key)
        } else {
            Ok(default)
        }
    }

    /// Comma-separated list, trimmed, with empty items dropped
    pub fn require_list(&self, key: &str) -> Result<Vec<String>, ConfigError> {
        let raw = self.require_str(key)?;
        Ok(raw
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect())
    }

    pub fn require_location(&self, key: &str) -> Result<DataLocation, ConfigError> {
        let raw = self.require_str(key)?;
        raw.parse().map_err(|_| ConfigError::Unparseable {
            key: key.into(),
            value: raw,
            expected: "data location (local, GNOS, S3)",
        })
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "true" | "yes" | "1" => Some(true),
        "false" | "no" | "0" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ConfigValues {
        ConfigValues::from_ini_str(
            "runDkfz=false\n\
             gnosRetries=3\n\
             tumourAliquotIds=a1, a2,,a3\n\
             uploadDestination=s3\n\
             study-refname-override=\n\
             EMBL.input_bam_path_tumor=/data/tumor\n\
             EMBL.date=20150101\n",
            "test.ini",
        )
        .unwrap()
    }

    #[test]
    fn test_typed_accessors() {
        let config = sample();
        assert!(!config.require_bool("runDkfz").unwrap());
        assert_eq!(config.require_int("gnosRetries").unwrap(), 3);
        assert_eq!(
            config.require_list("tumourAliquotIds").unwrap(),
            vec!["a1", "a2", "a3"]
        );
        assert_eq!(
            config.require_location("uploadDestination").unwrap(),
            DataLocation::S3
        );
    }

    #[test]
    fn test_missing_and_unparseable() {
        let config = sample();
        assert_eq!(
            config.require_str("nope"),
            Err(ConfigError::Missing { key: "nope".into() })
        );
        assert!(matches!(
            config.require_int("runDkfz"),
            Err(ConfigError::Unparseable { .. })
        ));
    }

    #[test]
    fn test_empty_value_counts_as_null() {
        let config = sample();
        assert!(config.contains("study-refname-override"));
        assert!(!config.has_property_and_not_null("study-refname-override"));
        assert!(config.optional_bool("study-refname-override", true).unwrap());
        assert!(config.optional_bool("cleanup", false).is_ok());
    }

    #[test]
    fn test_optional_bool_rejects_garbage() {
        let config = ConfigValues::new().with("cleanup", "maybe");
        assert!(config.optional_bool("cleanup", false).is_err());
    }

    #[test]
    fn test_overlay_prefers_overrides() {
        let base = ConfigValues::from_pairs([("a", "1"), ("b", "2")]);
        let over = ConfigValues::new().with("b", 3i64);
        let merged = base.overlay(&over);
        assert_eq!(merged.require_int("a").unwrap(), 1);
        assert_eq!(merged.get("b"), Some(&ConfigValue::Int(3)));
    }

    #[test]
    fn test_error_lifts_with_context() {
        let err = ConfigError::Missing { key: "pemFile".into() }.in_context("stage 'download'");
        assert!(matches!(
            err,
            SeqflowError::ConfigResolution { ref key, ref context, .. }
                if key == "pemFile" && context == "stage 'download'"
        ));
    }
}
