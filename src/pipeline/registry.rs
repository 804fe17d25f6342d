// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 seqflow contributors

//! Stage registry
//!
//! Append-only collection of stage specs for one pipeline-definition
//! session. It is consumed by `PipelineBuilder::build`; nothing survives
//! between builds.

use std::collections::{HashMap, HashSet};

use crate::errors::SeqflowError;
use crate::pipeline::{PipelineDefinition, StageSpec};

/// Registered stages in declaration order
#[derive(Debug, Clone, Default)]
pub struct StageRegistry {
    stages: Vec<StageSpec>,
    index: HashMap<String, usize>,
}

impl StageRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register every stage of a definition, stopping at the first error
    pub fn from_definition(definition: &PipelineDefinition) -> Result<Self, SeqflowError> {
        let mut registry = Self::new();
        for stage in &definition.stages {
            registry.register(stage.clone())?;
        }
        Ok(registry)
    }

    /// Register a stage
    pub fn register(&mut self, stage: StageSpec) -> Result<(), SeqflowError> {
        Self::check(&stage)?;

        if self.index.contains_key(&stage.name) {
            return Err(SeqflowError::DuplicateStage { stage: stage.name });
        }

        self.index.insert(stage.name.clone(), self.stages.len());
        self.stages.push(stage);
        Ok(())
    }

    /// Structural checks that need only the stage itself
    fn check(stage: &StageSpec) -> Result<(), SeqflowError> {
        if stage.name.trim().is_empty() {
            return Err(SeqflowError::invalid_stage(&stage.name, "stage name is empty"));
        }

        if stage.command.is_empty() {
            return Err(SeqflowError::invalid_stage(&stage.name, "command is empty"));
        }

        if stage.outputs.is_empty() && !stage.inputs.is_empty() && !stage.terminal {
            return Err(SeqflowError::invalid_stage(
                &stage.name,
                "consumes artifacts but produces none; mark it 'terminal' if it is a sink",
            ));
        }

        let mut seen = HashSet::new();
        for output in stage.output_names() {
            if !seen.insert(output) {
                return Err(SeqflowError::invalid_stage(
                    &stage.name,
                    format!("declares output '{}' more than once", output),
                ));
            }
        }

        if let Some(own) = stage.inputs.iter().find(|i| seen.contains(i.as_str())) {
            return Err(SeqflowError::invalid_stage(
                &stage.name,
                format!("consumes its own output '{}'", own),
            ));
        }

        Ok(())
    }

    pub fn stages(&self) -> &[StageSpec] {
        &self.stages
    }

    pub fn get(&self, name: &str) -> Option<&StageSpec> {
        self.index.get(name).map(|&i| &self.stages[i])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Registration position of a stage
    pub fn position(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_in_order() {
        let mut registry = StageRegistry::new();
        registry.register(StageSpec::new("a", "true")).unwrap();
        registry.register(StageSpec::new("b", "true")).unwrap();

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.position("b"), Some(1));
        assert_eq!(registry.stages()[0].name, "a");
        assert!(registry.get("c").is_none());
    }

    #[test]
    fn test_duplicate_stage_rejected() {
        let mut registry = StageRegistry::new();
        registry.register(StageSpec::new("upload", "true")).unwrap();

        let result = registry.register(StageSpec::new("upload", "false"));
        assert!(matches!(result, Err(SeqflowError::DuplicateStage { ref stage }) if stage == "upload"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_sink_must_be_terminal() {
        let mut registry = StageRegistry::new();
        let sink = StageSpec::new("upload", "upload {inputs.vcf}").with_inputs(["vcf"]);

        let result = registry.register(sink.clone());
        assert!(matches!(result, Err(SeqflowError::InvalidStage { .. })));

        registry.register(sink.terminal()).unwrap();
    }

    #[test]
    fn test_self_consumption_rejected() {
        let mut registry = StageRegistry::new();
        let stage = StageSpec::new("loop", "true")
            .with_inputs(["bam"])
            .with_outputs(["bam"]);

        let result = registry.register(stage);
        assert!(matches!(result, Err(SeqflowError::InvalidStage { ref reason, .. }) if reason.contains("own output")));
    }

    #[test]
    fn test_duplicate_output_rejected() {
        let mut registry = StageRegistry::new();
        let stage = StageSpec::new("dl", "true").with_outputs(["bam", "bam"]);
        assert!(registry.register(stage).is_err());
    }

    #[test]
    fn test_empty_command_rejected() {
        let mut registry = StageRegistry::new();
        assert!(registry.register(StageSpec::new("noop", "")).is_err());
    }
}
