// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 seqflow contributors

//! Error types
//!
//! Every build-time failure is fatal and carries enough context (stage name,
//! missing key or artifact) to fix the pipeline definition or configuration.

mod recovery;

pub use recovery::RecoverySuggestion;

use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for seqflow operations
pub type SeqflowResult<T> = Result<T, SeqflowError>;

/// Main error type for seqflow
#[derive(Error, Debug, Diagnostic)]
pub enum SeqflowError {
    // ─────────────────────────────────────────────────────────────────────────
    // Configuration Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("Cannot resolve configuration key '{key}' for {context}: {reason}")]
    #[diagnostic(
        code(seqflow::config_resolution),
        help("Add '{key}' to the workflow ini, the pipeline defaults, or pass --set {key}=<value>")
    )]
    ConfigResolution {
        context: String,
        key: String,
        reason: String,
    },

    #[error("Malformed configuration in {source_name} at line {line}: {message}")]
    #[diagnostic(
        code(seqflow::config_parse),
        help("Configuration lines must look like 'key=value'")
    )]
    ConfigParse {
        source_name: String,
        line: usize,
        message: String,
    },

    // ─────────────────────────────────────────────────────────────────────────
    // Registration Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("Stage '{stage}' is already registered")]
    #[diagnostic(
        code(seqflow::duplicate_stage),
        help("Stage names must be unique within a pipeline; rename one of the '{stage}' stages")
    )]
    DuplicateStage { stage: String },

    #[error("Stage '{stage}' is invalid: {reason}")]
    #[diagnostic(code(seqflow::invalid_stage))]
    InvalidStage { stage: String, reason: String },

    // ─────────────────────────────────────────────────────────────────────────
    // Graph Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("Stage '{stage}' depends on unknown stage '{dependency}'")]
    #[diagnostic(
        code(seqflow::unknown_dependency),
        help("Check that '{dependency}' is defined in your pipeline")
    )]
    UnknownDependency { stage: String, dependency: String },

    #[error("Stage '{stage}' consumes artifact '{artifact}' but no included stage produces it")]
    #[diagnostic(
        code(seqflow::dangling_dependency),
        help("Include a producer of '{artifact}' or exclude '{stage}' under the same condition")
    )]
    DanglingDependency { stage: String, artifact: String },

    #[error("Artifact '{artifact}' is produced by more than one included stage: {}", .producers.join(", "))]
    #[diagnostic(
        code(seqflow::ambiguous_artifact),
        help("Give the producers mutually exclusive include_if conditions")
    )]
    AmbiguousArtifact {
        artifact: String,
        producers: Vec<String>,
    },

    #[error("Circular dependency detected between stages: {}", .stages.join(" → "))]
    #[diagnostic(
        code(seqflow::cyclic_pipeline),
        help("Review your stage parents and artifacts to remove the cycle")
    )]
    CyclicPipeline { stages: Vec<String> },

    #[error("Stage '{stage}' references unknown placeholder '{{{placeholder}}}'")]
    #[diagnostic(
        code(seqflow::unresolved_placeholder),
        help("Define '{placeholder}' in the configuration, or declare the artifact as an input or output of '{stage}'")
    )]
    UnresolvedPlaceholder { stage: String, placeholder: String },

    #[error("Invalid pipeline: {reason}")]
    #[diagnostic(code(seqflow::invalid_pipeline))]
    InvalidPipeline {
        reason: String,
        #[help]
        help: Option<String>,
    },

    // ─────────────────────────────────────────────────────────────────────────
    // Handoff Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("Handoff to engine '{engine}' failed: {message}")]
    #[diagnostic(code(seqflow::handoff_failed))]
    HandoffFailed { engine: String, message: String },

    // ─────────────────────────────────────────────────────────────────────────
    // File Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("Pipeline file not found: {path}")]
    #[diagnostic(
        code(seqflow::pipeline_not_found),
        help("Pass the path of a pipeline definition, e.g. demos/pancancer/pipeline.yaml")
    )]
    PipelineNotFound { path: PathBuf },

    #[error("Failed to read file '{path}': {error}")]
    #[diagnostic(code(seqflow::file_read_error))]
    FileReadError { path: PathBuf, error: String },

    #[error("Failed to write file '{path}': {error}")]
    #[diagnostic(code(seqflow::file_write_error))]
    FileWriteError { path: PathBuf, error: String },

    // ─────────────────────────────────────────────────────────────────────────
    // IO/Serialization Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("IO error: {message}")]
    #[diagnostic(code(seqflow::io_error))]
    Io { message: String },

    #[error("YAML parsing error: {message}")]
    #[diagnostic(code(seqflow::yaml_error))]
    Yaml { message: String },

    #[error("JSON error: {message}")]
    #[diagnostic(code(seqflow::json_error))]
    Json { message: String },
}

impl From<std::io::Error> for SeqflowError {
    fn from(e: std::io::Error) -> Self {
        Self::Io { message: e.to_string() }
    }
}

impl From<serde_yaml::Error> for SeqflowError {
    fn from(e: serde_yaml::Error) -> Self {
        Self::Yaml { message: e.to_string() }
    }
}

impl From<serde_json::Error> for SeqflowError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json { message: e.to_string() }
    }
}

impl SeqflowError {
    /// Create an invalid stage error
    pub fn invalid_stage(stage: &str, reason: impl Into<String>) -> Self {
        Self::InvalidStage {
            stage: stage.to_string(),
            reason: reason.into(),
        }
    }

    /// Name of the stage the error points at, if any
    pub fn stage(&self) -> Option<&str> {
        match self {
            Self::DuplicateStage { stage }
            | Self::InvalidStage { stage, .. }
            | Self::UnknownDependency { stage, .. }
            | Self::DanglingDependency { stage, .. }
            | Self::UnresolvedPlaceholder { stage, .. } => Some(stage),
            _ => None,
        }
    }

    /// Whether the error comes from graph structure rather than input files
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            Self::DanglingDependency { .. }
                | Self::AmbiguousArtifact { .. }
                | Self::CyclicPipeline { .. }
                | Self::UnknownDependency { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_carry_context() {
        let err = SeqflowError::DanglingDependency {
            stage: "upload".into(),
            artifact: "vcf".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("upload"));
        assert!(msg.contains("vcf"));
        assert_eq!(err.stage(), Some("upload"));
        assert!(err.is_structural());
    }

    #[test]
    fn test_placeholder_message_keeps_braces() {
        let err = SeqflowError::UnresolvedPlaceholder {
            stage: "call".into(),
            placeholder: "refGenome".into(),
        };
        assert_eq!(
            err.to_string(),
            "Stage 'call' references unknown placeholder '{refGenome}'"
        );
    }

    #[test]
    fn test_cycle_message_lists_stages() {
        let err = SeqflowError::CyclicPipeline {
            stages: vec!["a".into(), "b".into()],
        };
        assert!(err.to_string().contains("a → b"));
        assert_eq!(err.stage(), None);
    }
}
