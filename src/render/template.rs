// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 seqflow contributors

//! Placeholder substitution
//!
//! Placeholders look like `{key}`; `{{` and `}}` are literal braces. Anything
//! else in braces that is not a valid key (`{}`, `{ x }`) is left untouched so
//! shell idioms such as `find -exec {} \;` pass through.

use regex::{Captures, Regex};
use std::collections::BTreeMap;
use std::sync::OnceLock;

fn placeholder_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\{\{|\}\}|\{([A-Za-z_][A-Za-z0-9_.\-]*)\}").expect("placeholder regex is valid")
    })
}

/// Values available to templates
#[derive(Debug, Clone, Default)]
pub struct SubstitutionContext {
    values: BTreeMap<String, String>,
}

impl SubstitutionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value, replacing any previous one
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    /// Insert a value only when the key is free
    pub fn insert_if_absent(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.entry(key.into()).or_insert_with(|| value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Substitute every placeholder, reporting the first unknown key
    pub fn substitute(&self, template: &str) -> Result<String, String> {
        let mut missing: Option<String> = None;

        let rendered = placeholder_regex().replace_all(template, |caps: &Captures| {
            match caps.get(1) {
                None if &caps[0] == "{{" => "{".to_string(),
                None => "}".to_string(),
                Some(key) => match self.values.get(key.as_str()) {
                    Some(value) => value.clone(),
                    None => {
                        missing.get_or_insert_with(|| key.as_str().to_string());
                        String::new()
                    }
                },
            }
        });

        match missing {
            Some(key) => Err(key),
            None => Ok(rendered.into_owned()),
        }
    }
}

/// Every placeholder key a template references, in order of appearance
pub fn placeholders(template: &str) -> Vec<String> {
    placeholder_regex()
        .captures_iter(template)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str().to_string()))
        .collect()
}
