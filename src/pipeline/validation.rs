// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 seqflow contributors

//! Pipeline validation
//!
//! Validates a pipeline definition against a configuration before handoff.
//! Unlike `PipelineBuilder::build`, which stops at the first problem, the
//! validator reports every stage that fails registration.

use std::collections::HashSet;

use crate::config::ConfigValues;
use crate::errors::SeqflowError;
use crate::naming::ArtifactNamer;
use crate::pipeline::{PipelineBuilder, PipelineDefinition, PipelineGraph, StageRegistry};

/// Pipeline validator
pub struct PipelineValidator;

impl PipelineValidator {
    /// Validate a pipeline definition under a configuration
    pub fn validate(definition: &PipelineDefinition, config: &ConfigValues) -> Result<ValidationResult, SeqflowError> {
        let builder = PipelineBuilder::new(ArtifactNamer::today(definition.name.clone()))
            .with_workflow_version(definition.workflow_version.clone());
        Self::validate_with(&builder, definition, config)
    }

    /// Validate using a preconfigured builder
    pub fn validate_with(
        builder: &PipelineBuilder,
        definition: &PipelineDefinition,
        config: &ConfigValues,
    ) -> Result<ValidationResult, SeqflowError> {
        let mut result = ValidationResult::new();

        if definition.stages.is_empty() {
            result.add_error("Pipeline has no stages defined");
            return Ok(result);
        }

        let mut registry = StageRegistry::new();
        for stage in &definition.stages {
            if let Err(e) = registry.register(stage.clone()) {
                result.add_error(&e.to_string());
            }
        }

        if !result.is_valid() {
            return Ok(result);
        }

        match builder.build(registry, config) {
            Ok(graph) => {
                Self::check_graph(&graph, &mut result);
                result.graph = Some(graph);
            }
            Err(e) => result.add_error(&e.to_string()),
        }

        Ok(result)
    }

    /// Warnings that only a built graph can reveal
    fn check_graph(graph: &PipelineGraph, result: &mut ValidationResult) {
        let consumed: HashSet<&str> = graph
            .nodes()
            .flat_map(|n| n.spec().inputs.iter().map(String::as_str))
            .collect();

        for node in graph.nodes() {
            let spec = node.spec();

            if !spec.terminal {
                for output in spec.output_names().filter(|o| !consumed.contains(o)) {
                    result.add_warning(&format!(
                        "Stage '{}': Output '{}' is never consumed by an included stage",
                        spec.name, output
                    ));
                }
            }

            for parent in &spec.parents {
                if graph.excluded_stages().contains(parent) {
                    result.add_warning(&format!(
                        "Stage '{}': Parent '{}' is excluded by this configuration and was ignored",
                        spec.name, parent
                    ));
                    continue;
                }

                let implied = graph
                    .node(parent)
                    .map(|p| p.spec().output_names().any(|o| spec.inputs.iter().any(|i| i == o)))
                    .unwrap_or(false);
                if implied {
                    result.add_warning(&format!(
                        "Stage '{}': Parent '{}' is already implied by a consumed artifact",
                        spec.name, parent
                    ));
                }
            }
        }
    }
}

/// Result of pipeline validation
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    /// The built graph, when validation got that far
    pub graph: Option<PipelineGraph>,
}

impl ValidationResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_error(&mut self, message: &str) {
        self.errors.push(message.to_string());
    }

    pub fn add_warning(&mut self, message: &str) {
        self.warnings.push(message.to_string());
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}
