// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 seqflow contributors

//! Pipeline definition structures
//!
//! Defines the schema for pipeline definition files. A workflow variant
//! (local/GNOS/S3 download, optional callers, cleanup modes) is data: a list
//! of stage specs plus the configuration that switches them on or off.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::Condition;
use crate::config::ConfigValues;
use crate::naming::VariantClass;

/// Pipeline definition file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineDefinition {
    /// Definition format version
    #[serde(default = "default_version")]
    pub version: String,

    /// Workflow name, also used when naming artifacts
    pub name: String,

    /// Pipeline description
    #[serde(default)]
    pub description: Option<String>,

    /// Workflow release, available to templates as `{workflow.version}`
    #[serde(default)]
    pub workflow_version: Option<String>,

    /// Configuration defaults, overridden by the workflow ini
    #[serde(default)]
    pub defaults: BTreeMap<String, String>,

    /// Stages in declaration order
    pub stages: Vec<StageSpec>,
}

fn default_version() -> String {
    "1".to_string()
}

impl PipelineDefinition {
    /// Load a definition from a YAML file
    pub fn from_file(path: &std::path::Path) -> Result<Self, crate::SeqflowError> {
        if !path.exists() {
            return Err(crate::SeqflowError::PipelineNotFound {
                path: path.to_path_buf(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| {
            crate::SeqflowError::FileReadError {
                path: path.to_path_buf(),
                error: e.to_string(),
            }
        })?;

        Self::from_yaml(&content)
    }

    /// Parse a definition from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self, crate::SeqflowError> {
        serde_yaml::from_str(yaml).map_err(Into::into)
    }

    /// Serialize the definition to YAML
    pub fn to_yaml(&self) -> Result<String, crate::SeqflowError> {
        serde_yaml::to_string(self).map_err(Into::into)
    }

    /// The `defaults` block as a configuration layer
    pub fn default_config(&self) -> ConfigValues {
        ConfigValues::from_pairs(self.defaults.clone())
    }

    pub fn get_stage(&self, name: &str) -> Option<&StageSpec> {
        self.stages.iter().find(|s| s.name == name)
    }

    pub fn stage_names(&self) -> Vec<&str> {
        self.stages.iter().map(|s| s.name.as_str()).collect()
    }
}

/// A single pipeline stage
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageSpec {
    /// Stage name (must be unique within the pipeline)
    pub name: String,

    #[serde(default)]
    pub description: Option<String>,

    /// Command template
    pub command: CommandTemplate,

    #[serde(default)]
    pub resources: ResourceSpec,

    /// Artifacts this stage consumes
    #[serde(default)]
    pub inputs: Vec<String>,

    /// Artifacts this stage produces
    #[serde(default)]
    pub outputs: Vec<ArtifactDecl>,

    /// Stages that must precede this one regardless of artifacts
    #[serde(default)]
    pub parents: Vec<String>,

    /// Inclusion predicate, written as `{ flag: key }` style maps
    #[serde(default, with = "serde_yaml::with::singleton_map_recursive")]
    pub include_if: Condition,

    /// A sink (upload, cleanup) that may consume without producing
    #[serde(default)]
    pub terminal: bool,

    /// Pipeline root flag; unset means "root if it only produces"
    #[serde(default)]
    pub root: Option<bool>,
}

impl StageSpec {
    /// Create a stage with a shell command and no artifacts
    pub fn new(name: impl Into<String>, command: impl Into<CommandTemplate>) -> Self {
        Self {
            name: name.into(),
            description: None,
            command: command.into(),
            resources: ResourceSpec::default(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            parents: Vec::new(),
            include_if: Condition::Always,
            terminal: false,
            root: None,
        }
    }

    pub fn with_inputs<I, S>(mut self, inputs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.inputs.extend(inputs.into_iter().map(Into::into));
        self
    }

    pub fn with_outputs<I, A>(mut self, outputs: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<ArtifactDecl>,
    {
        self.outputs.extend(outputs.into_iter().map(Into::into));
        self
    }

    pub fn with_parents<I, S>(mut self, parents: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.parents.extend(parents.into_iter().map(Into::into));
        self
    }

    pub fn include_if(mut self, condition: Condition) -> Self {
        self.include_if = condition;
        self
    }

    pub fn with_resources(mut self, resources: ResourceSpec) -> Self {
        self.resources = resources;
        self
    }

    pub fn terminal(mut self) -> Self {
        self.terminal = true;
        self
    }

    pub fn root(mut self, root: bool) -> Self {
        self.root = Some(root);
        self
    }

    pub fn output_names(&self) -> impl Iterator<Item = &str> {
        self.outputs.iter().map(|o| o.name.as_str())
    }

    /// Whether the stage starts a chain: explicitly flagged, or (when unset)
    /// a pure source that produces artifacts without consuming any
    pub fn is_root(&self) -> bool {
        self.root
            .unwrap_or(self.inputs.is_empty() && !self.outputs.is_empty())
    }
}

/// Command template: a shell script or an argv list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CommandTemplate {
    /// Run through `bash -c`
    Shell(String),
    /// Run directly, one template per argument
    Argv(Vec<String>),
}

impl CommandTemplate {
    /// All template strings, in order
    pub fn parts(&self) -> Vec<&str> {
        match self {
            Self::Shell(s) => vec![s.as_str()],
            Self::Argv(v) => v.iter().map(String::as_str).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Self::Shell(s) => s.trim().is_empty(),
            Self::Argv(v) => v.is_empty() || v[0].trim().is_empty(),
        }
    }
}

impl From<&str> for CommandTemplate {
    fn from(s: &str) -> Self {
        Self::Shell(s.to_string())
    }
}

impl From<String> for CommandTemplate {
    fn from(s: String) -> Self {
        Self::Shell(s)
    }
}

impl From<Vec<String>> for CommandTemplate {
    fn from(v: Vec<String>) -> Self {
        Self::Argv(v)
    }
}

/// A numeric resource, fixed or taken from a template such as `{picard_sort_mem}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Quantity {
    Fixed(u64),
    Template(String),
}

impl From<u64> for Quantity {
    fn from(v: u64) -> Self {
        Self::Fixed(v)
    }
}

impl From<&str> for Quantity {
    fn from(s: &str) -> Self {
        Self::Template(s.to_string())
    }
}

/// Requested resources before substitution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceSpec {
    #[serde(default = "default_memory")]
    pub memory_mb: Quantity,

    #[serde(default)]
    pub cores: Option<Quantity>,
}

fn default_memory() -> Quantity {
    Quantity::Fixed(DEFAULT_MEMORY_MB)
}

/// Memory for stages that don't ask for any
pub const DEFAULT_MEMORY_MB: u64 = 2000;

impl Default for ResourceSpec {
    fn default() -> Self {
        Self {
            memory_mb: default_memory(),
            cores: None,
        }
    }
}

impl ResourceSpec {
    pub fn new(memory_mb: impl Into<Quantity>) -> Self {
        Self {
            memory_mb: memory_mb.into(),
            cores: None,
        }
    }

    pub fn with_cores(mut self, cores: impl Into<Quantity>) -> Self {
        self.cores = Some(cores.into());
        self
    }
}

/// An artifact a stage produces
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "ArtifactDeclRepr")]
pub struct ArtifactDecl {
    pub name: String,
    /// Path pattern; `None` uses the artifact name as the path
    pub path: Option<PathTemplate>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ArtifactDeclRepr {
    Name(String),
    Full {
        name: String,
        #[serde(default)]
        path: Option<PathTemplate>,
    },
}

impl From<ArtifactDeclRepr> for ArtifactDecl {
    fn from(repr: ArtifactDeclRepr) -> Self {
        match repr {
            ArtifactDeclRepr::Name(name) => Self { name, path: None },
            ArtifactDeclRepr::Full { name, path } => Self { name, path },
        }
    }
}

impl ArtifactDecl {
    pub fn new(name: impl Into<String>, path: PathTemplate) -> Self {
        Self {
            name: name.into(),
            path: Some(path),
        }
    }
}

impl From<&str> for ArtifactDecl {
    fn from(name: &str) -> Self {
        Self {
            name: name.to_string(),
            path: None,
        }
    }
}

/// How an artifact's file path is formed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathTemplate {
    /// Path template with placeholders
    Pattern(String),
    /// Conventional result file name from the artifact namer
    Named {
        /// Sample/aliquot id, itself a template such as `{tumourAliquotId}`
        sample: String,
        data_type: String,
        #[serde(default)]
        variant_class: Option<VariantClass>,
        extension: String,
        /// Directory prefix template
        #[serde(default)]
        directory: Option<String>,
    },
}

impl From<&str> for PathTemplate {
    fn from(s: &str) -> Self {
        Self::Pattern(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_pipeline() {
        let yaml = r#"
version: "1"
name: "test-pipeline"
defaults:
  threads: "4"
stages:
  - name: download
    command: "gtdownload {gnosServer}/{analysisId}"
    outputs: [rawBam]
  - name: filter
    command: ["samtools", "view", "-b", "{inputs.rawBam}"]
    inputs: [rawBam]
    outputs:
      - name: filteredBam
        path: "work/{analysisId}.filtered.bam"
    resources:
      memory_mb: 8000
      cores: "{threads}"
"#;

        let pipeline = PipelineDefinition::from_yaml(yaml).unwrap();
        assert_eq!(pipeline.name, "test-pipeline");
        assert_eq!(pipeline.stage_names(), vec!["download", "filter"]);
        assert_eq!(pipeline.default_config().require_int("threads").unwrap(), 4);

        let download = pipeline.get_stage("download").unwrap();
        assert_eq!(download.outputs, vec![ArtifactDecl::from("rawBam")]);
        assert!(matches!(download.command, CommandTemplate::Shell(_)));
        assert_eq!(download.resources, ResourceSpec::default());
        assert!(download.is_root());

        let filter = pipeline.get_stage("filter").unwrap();
        assert!(matches!(filter.command, CommandTemplate::Argv(ref v) if v.len() == 4));
        assert_eq!(filter.resources.memory_mb, Quantity::Fixed(8000));
        assert_eq!(filter.resources.cores, Some(Quantity::Template("{threads}".into())));
        assert!(!filter.is_root());
    }

    #[test]
    fn test_parse_named_output() {
        let yaml = r#"
name: "embl"
stages:
  - name: call
    command: "run-delly"
    include_if: { flag: runEmbl }
    outputs:
      - name: somaticVcf
        path:
          sample: "{tumourAliquotId}"
          data_type: sv
          variant_class: somatic
          extension: vcf.gz
"#;

        let pipeline = PipelineDefinition::from_yaml(yaml).unwrap();
        let call = &pipeline.stages[0];
        assert!(matches!(call.include_if, Condition::Flag(ref k) if k == "runEmbl"));
        match &call.outputs[0].path {
            Some(PathTemplate::Named {
                variant_class,
                directory,
                ..
            }) => {
                assert_eq!(*variant_class, Some(VariantClass::Somatic));
                assert!(directory.is_none());
            }
            other => panic!("Expected named path, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_inclusion_predicates() {
        let yaml = r#"
name: "slicer"
stages:
  - name: upload_gnos
    command: "gtupload"
    include_if:
      all:
        - location: { key: uploadDestination, is: GNOS }
        - not: { flag_or: { key: skip_upload, default: false } }
  - name: cleanup
    command: "rm -rf work"
    include_if: never
  - name: report
    command: "report"
"#;

        let pipeline = PipelineDefinition::from_yaml(yaml).unwrap();
        assert!(matches!(pipeline.stages[0].include_if, Condition::All(ref c) if c.len() == 2));
        assert!(matches!(pipeline.stages[1].include_if, Condition::Never));
        assert!(matches!(pipeline.stages[2].include_if, Condition::Always));

        let config = ConfigValues::from_pairs([("uploadDestination", "gnos")]);
        assert!(pipeline.stages[0].include_if.evaluate(&config).unwrap());

        let reparsed = PipelineDefinition::from_yaml(&pipeline.to_yaml().unwrap()).unwrap();
        assert!(matches!(reparsed.stages[0].include_if, Condition::All(ref c) if c.len() == 2));
    }

    #[test]
    fn test_root_flag_overrides_inference() {
        let source = StageSpec::new("dl", "true").with_outputs(["bam"]);
        assert!(source.is_root());
        assert!(!source.clone().root(false).is_root());

        let side_effect = StageSpec::new("mkdirs", "mkdir -p x");
        assert!(!side_effect.is_root());
        assert!(side_effect.root(true).is_root());
    }

    #[test]
    fn test_empty_command_detection() {
        assert!(CommandTemplate::from("  ").is_empty());
        assert!(CommandTemplate::Argv(vec![]).is_empty());
        assert!(!CommandTemplate::from("echo").is_empty());
    }
}
