// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 seqflow contributors

//! Artifact file naming
//!
//! Result files follow `{aliquotId}.{workflowName}.{date}.{somatic|germline}.{datatype}.{ext}`.
//! Names are a pure function of their inputs so a downstream stage can refer
//! to an upstream file without the upstream stage reporting it back.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Somatic or germline call set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VariantClass {
    Somatic,
    Germline,
}

impl std::fmt::Display for VariantClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Somatic => write!(f, "somatic"),
            Self::Germline => write!(f, "germline"),
        }
    }
}

impl FromStr for VariantClass {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "somatic" => Ok(Self::Somatic),
            "germline" => Ok(Self::Germline),
            _ => Err(format!("Unknown variant class: {}", s)),
        }
    }
}

/// Side files uploaded next to each result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Companion {
    Md5,
    Tbi,
    TbiMd5,
}

impl Companion {
    pub fn suffix(&self) -> &'static str {
        match self {
            Self::Md5 => ".md5",
            Self::Tbi => ".tbi",
            Self::TbiMd5 => ".tbi.md5",
        }
    }

    /// Append this companion's suffix to a file name
    pub fn apply(&self, file: &str) -> String {
        format!("{}{}", file, self.suffix())
    }
}

/// Build an artifact file name. Empty segments are omitted rather than left
/// as empty tokens, so reference-data files without a variant class read
/// `{sample}.{workflow}.{date}.{datatype}.{ext}`.
pub fn artifact_name(
    sample_id: &str,
    workflow_name: &str,
    date_stamp: &str,
    variant_class: Option<VariantClass>,
    data_type: &str,
    extension: &str,
) -> String {
    let class = variant_class.map(|c| c.to_string());
    let extension = extension.trim_start_matches('.');

    [
        Some(sample_id),
        Some(workflow_name),
        Some(date_stamp),
        class.as_deref(),
        Some(data_type),
        Some(extension),
    ]
    .into_iter()
    .flatten()
    .filter(|segment| !segment.is_empty())
    .collect::<Vec<_>>()
    .join(".")
}

/// Format a date as the `yyyyMMdd` stamp used in file names
pub fn date_stamp(date: NaiveDate) -> String {
    date.format("%Y%m%d").to_string()
}

/// Names artifacts for one workflow run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactNamer {
    workflow_name: String,
    date_stamp: String,
}

impl ArtifactNamer {
    pub fn new(workflow_name: impl Into<String>, date_stamp: impl Into<String>) -> Self {
        Self {
            workflow_name: workflow_name.into(),
            date_stamp: date_stamp.into(),
        }
    }

    pub fn for_date(workflow_name: impl Into<String>, date: NaiveDate) -> Self {
        Self::new(workflow_name, date_stamp(date))
    }

    /// Namer stamped with the local date
    pub fn today(workflow_name: impl Into<String>) -> Self {
        Self::for_date(workflow_name, chrono::Local::now().date_naive())
    }

    pub fn workflow_name(&self) -> &str {
        &self.workflow_name
    }

    pub fn date_stamp(&self) -> &str {
        &self.date_stamp
    }

    pub fn name(
        &self,
        sample_id: &str,
        variant_class: Option<VariantClass>,
        data_type: &str,
        extension: &str,
    ) -> String {
        artifact_name(
            sample_id,
            &self.workflow_name,
            &self.date_stamp,
            variant_class,
            data_type,
            extension,
        )
    }

    /// A result file followed by its `.md5`, `.tbi` and `.tbi.md5` companions
    pub fn bundle(&self, file: &str) -> Vec<String> {
        let mut files = vec![file.to_string()];
        files.extend(
            [Companion::Md5, Companion::Tbi, Companion::TbiMd5]
                .iter()
                .map(|c| c.apply(file)),
        );
        files
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_name() {
        let name = artifact_name(
            "f393bb07",
            "embl-delly_1-0-0-preFilter",
            "20150318",
            Some(VariantClass::Somatic),
            "sv",
            "vcf.gz",
        );
        assert_eq!(name, "f393bb07.embl-delly_1-0-0-preFilter.20150318.somatic.sv.vcf.gz");
    }

    #[test]
    fn test_absent_variant_class_is_omitted() {
        let name = artifact_name("ref", "dkfz", "20150318", None, "bundle", "tar.gz");
        assert_eq!(name, "ref.dkfz.20150318.bundle.tar.gz");
        assert!(!name.contains(".."));
    }

    #[test]
    fn test_deterministic() {
        let namer = ArtifactNamer::new("wf", "20240102");
        let a = namer.name("s1", Some(VariantClass::Germline), "indel", ".vcf.gz");
        let b = namer.name("s1", Some(VariantClass::Germline), "indel", ".vcf.gz");
        assert_eq!(a, b);
        assert_eq!(a, "s1.wf.20240102.germline.indel.vcf.gz");
    }

    #[test]
    fn test_date_stamp_format() {
        let date = NaiveDate::from_ymd_opt(2015, 3, 8).unwrap();
        assert_eq!(date_stamp(date), "20150308");
        assert_eq!(ArtifactNamer::for_date("wf", date).date_stamp(), "20150308");
    }

    #[test]
    fn test_bundle_lists_companions() {
        let namer = ArtifactNamer::new("wf", "20240102");
        let files = namer.bundle("x.vcf.gz");
        assert_eq!(
            files,
            vec!["x.vcf.gz", "x.vcf.gz.md5", "x.vcf.gz.tbi", "x.vcf.gz.tbi.md5"]
        );
    }

    #[test]
    fn test_variant_class_parse() {
        assert_eq!("Somatic".parse::<VariantClass>(), Ok(VariantClass::Somatic));
        assert!("tumour".parse::<VariantClass>().is_err());
    }
}
