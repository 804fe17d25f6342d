// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 seqflow contributors

//! Error recovery suggestions
//!
//! Provides actionable suggestions for recovering from build errors.

use super::SeqflowError;

/// A recovery suggestion with concrete steps
#[derive(Debug, Clone)]
pub struct RecoverySuggestion {
    /// Brief description of what to do
    pub action: String,
    /// Detailed steps
    pub steps: Vec<String>,
    /// Commands to run
    pub commands: Vec<String>,
}

impl RecoverySuggestion {
    /// Pick a suggestion for a build error, if one applies
    pub fn for_error(error: &SeqflowError) -> Option<Self> {
        match error {
            SeqflowError::CyclicPipeline { stages } => Some(Self::fix_cycle(stages)),
            SeqflowError::DanglingDependency { stage, artifact } => {
                Some(Self::fix_dangling_dependency(stage, artifact))
            }
            SeqflowError::AmbiguousArtifact {
                artifact,
                producers,
            } => Some(Self::fix_ambiguous_artifact(artifact, producers)),
            SeqflowError::ConfigResolution { context, key, .. } => {
                Some(Self::add_config_key(key, context))
            }
            SeqflowError::UnresolvedPlaceholder { stage, placeholder } => {
                Some(Self::fix_placeholder(stage, placeholder))
            }
            _ => None,
        }
    }

    /// Suggest fixing a circular dependency
    pub fn fix_cycle(stages: &[String]) -> Self {
        Self {
            action: "Remove circular dependency".into(),
            steps: vec![
                format!("Detected cycle: {}", stages.join(" → ")),
                "Check the 'parents' lists of these stages".into(),
                "Ensure no stage consumes an artifact produced downstream of itself".into(),
            ],
            commands: vec![
                "# Visualize the resolved graph:".into(),
                "seqflow graph <pipeline.yaml> --format mermaid".into(),
            ],
        }
    }

    /// Suggest fixing an input that nothing produces
    pub fn fix_dangling_dependency(stage: &str, artifact: &str) -> Self {
        Self {
            action: format!("Provide a producer for '{}'", artifact),
            steps: vec![
                format!("Stage '{}' declares '{}' as an input", stage, artifact),
                "The producing stage is either missing or excluded by its include_if".into(),
                format!(
                    "Either enable the producer or give '{}' a matching include_if",
                    stage
                ),
            ],
            commands: vec![
                "# Show which stages are included:".into(),
                "seqflow validate <pipeline.yaml> -c <workflow.ini> --verbose".into(),
            ],
        }
    }

    /// Suggest disambiguating two producers of the same artifact
    pub fn fix_ambiguous_artifact(artifact: &str, producers: &[String]) -> Self {
        Self {
            action: format!("Keep a single producer of '{}'", artifact),
            steps: vec![
                format!("Included producers: {}", producers.join(", ")),
                "Variants such as local/GNOS/S3 downloads should use exclusive conditions".into(),
                "e.g. include_if: { location: { key: downloadSource, is: S3 } }".into(),
            ],
            commands: vec![],
        }
    }

    /// Suggest adding a missing configuration key
    pub fn add_config_key(key: &str, context: &str) -> Self {
        Self {
            action: format!("Define configuration key '{}'", key),
            steps: vec![
                format!("'{}' is required by {}", key, context),
                "Add it to the workflow ini file or to the pipeline 'defaults'".into(),
            ],
            commands: vec![
                "# Or override it on the command line:".into(),
                format!("seqflow submit <pipeline.yaml> --set {}=<value>", key),
            ],
        }
    }

    /// Suggest fixing a template placeholder
    pub fn fix_placeholder(stage: &str, placeholder: &str) -> Self {
        let mut steps = vec![format!(
            "The command of stage '{}' uses '{{{}}}'",
            stage, placeholder
        )];

        if let Some(artifact) = placeholder
            .strip_prefix("inputs.")
            .or_else(|| placeholder.strip_prefix("outputs."))
        {
            steps.push(format!(
                "Declare '{}' in the stage's inputs or outputs",
                artifact
            ));
        } else {
            steps.push("Check the key for typos against your workflow ini".into());
            steps.push("Write literal braces as '{{' and '}}'".into());
        }

        Self {
            action: format!("Resolve placeholder '{{{}}}'", placeholder),
            steps,
            commands: vec![],
        }
    }
}

impl std::fmt::Display for RecoverySuggestion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "→ {}", self.action)?;

        for step in &self.steps {
            writeln!(f, "  {}", step)?;
        }

        if !self.commands.is_empty() {
            writeln!(f)?;
            for cmd in &self.commands {
                writeln!(f, "  {}", cmd)?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suggestion_for_dangling_dependency() {
        let err = SeqflowError::DanglingDependency {
            stage: "upload".into(),
            artifact: "vcf".into(),
        };
        let suggestion = RecoverySuggestion::for_error(&err).unwrap();
        assert!(suggestion.action.contains("vcf"));
        assert!(suggestion.to_string().contains("upload"));
    }

    #[test]
    fn test_placeholder_suggestion_mentions_artifact() {
        let suggestion = RecoverySuggestion::fix_placeholder("call", "inputs.bam");
        assert_eq!(suggestion.action, "Resolve placeholder '{inputs.bam}'");
        assert!(suggestion.steps.iter().any(|s| s.contains("Declare 'bam'")));
    }

    #[test]
    fn test_no_suggestion_for_io_errors() {
        let err = SeqflowError::Io {
            message: "boom".into(),
        };
        assert!(RecoverySuggestion::for_error(&err).is_none());
    }
}
