// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 seqflow contributors

//! SeqWare workflow ini parsing
//!
//! Workflow ini files are Java-properties flavoured: `key=value` lines,
//! `#` or `;` comments, keys are case-sensitive and may contain dots
//! (`DKFZ.dkfzDataBundleUUID`). Optional `[section]` headers prefix the keys
//! that follow with `section.`. Later definitions win.

use ::ini::Ini;
use std::collections::BTreeMap;

use crate::errors::SeqflowError;

/// Parse ini content into flat, section-prefixed key/value pairs
pub fn parse_ini(content: &str, source_name: &str) -> Result<BTreeMap<String, String>, SeqflowError> {
    let document = Ini::load_from_str(content).map_err(|e| SeqflowError::ConfigParse {
        source_name: source_name.to_string(),
        line: e.line,
        message: e.msg.to_string(),
    })?;

    let mut values = BTreeMap::new();
    for (section, properties) in document.iter() {
        let prefix = section.map(str::trim).filter(|s| !s.is_empty());
        for (key, value) in properties.iter() {
            let key = match prefix {
                Some(p) => format!("{}.{}", p, key),
                None => key.to_string(),
            };
            values.insert(key, value.to_string());
        }
    }

    Ok(values)
}
