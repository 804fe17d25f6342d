// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 seqflow contributors

//! JSON job manifest
//!
//! The generic engine representation: a list of jobs, each with its argv,
//! resource request and parent ids.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

use super::{write_output, DagHandoff, ExternalJobHandle};
use crate::errors::SeqflowError;
use crate::pipeline::PipelineGraph;

/// One engine job
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRecord {
    /// Job id; equal to the stage name
    pub id: String,
    pub name: String,
    pub argv: Vec<String>,
    pub memory_mb: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cores: Option<u32>,
    /// Ids of jobs that must finish first
    #[serde(default)]
    pub parents: Vec<String>,
}

/// Engine-neutral description of a built pipeline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobManifest {
    pub workflow: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workflow_version: Option<String>,
    pub date_stamp: String,
    /// Jobs in dependency order
    pub jobs: Vec<JobRecord>,
}

impl JobManifest {
    /// Translate a graph, keeping its edges exactly
    pub fn from_graph(graph: &PipelineGraph) -> Result<Self, SeqflowError> {
        let jobs = graph
            .topological_order()?
            .into_iter()
            .map(|node| {
                let command = node.command();
                JobRecord {
                    id: node.name().to_string(),
                    name: node.name().to_string(),
                    argv: command.argv.clone(),
                    memory_mb: command.resources.memory_mb,
                    cores: command.resources.cores,
                    parents: graph
                        .parents(node.name())
                        .unwrap_or_default()
                        .into_iter()
                        .map(String::from)
                        .collect(),
                }
            })
            .collect();

        Ok(Self {
            workflow: graph.name().to_string(),
            workflow_version: graph.workflow_version().map(String::from),
            date_stamp: graph.date_stamp().to_string(),
            jobs,
        })
    }

    pub fn job(&self, id: &str) -> Option<&JobRecord> {
        self.jobs.iter().find(|j| j.id == id)
    }

    pub fn job_ids(&self) -> Vec<String> {
        self.jobs.iter().map(|j| j.id.clone()).collect()
    }

    pub fn to_json(&self) -> Result<String, SeqflowError> {
        serde_json::to_string_pretty(self).map_err(Into::into)
    }

    pub fn from_json(json: &str) -> Result<Self, SeqflowError> {
        serde_json::from_str(json).map_err(Into::into)
    }
}

/// Writes the JSON manifest to a file for an external engine to pick up
#[derive(Debug, Clone)]
pub struct ManifestHandoff {
    path: PathBuf,
}

impl ManifestHandoff {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl DagHandoff for ManifestHandoff {
    fn engine(&self) -> &str {
        "manifest"
    }

    async fn submit(&self, graph: &PipelineGraph) -> Result<ExternalJobHandle, SeqflowError> {
        let manifest = JobManifest::from_graph(graph)?;
        write_output(self.engine(), &self.path, &manifest.to_json()?).await?;

        info!(
            "Wrote manifest for '{}' ({} jobs) to {}",
            manifest.workflow,
            manifest.jobs.len(),
            self.path.display()
        );

        Ok(ExternalJobHandle {
            engine: self.engine().to_string(),
            workflow: manifest.workflow.clone(),
            job_ids: manifest.job_ids(),
            location: Some(self.path.clone()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigValues;
    use crate::naming::ArtifactNamer;
    use crate::pipeline::{PipelineBuilder, ResourceSpec, StageRegistry, StageSpec};
    use tempfile::TempDir;

    fn graph() -> PipelineGraph {
        let mut registry = StageRegistry::new();
        registry
            .register(StageSpec::new("download", "fetch -o {outputs.bam}").with_outputs(["bam"]))
            .unwrap();
        registry
            .register(
                StageSpec::new("index", vec!["samtools".to_string(), "index".into(), "{inputs.bam}".into()])
                    .with_inputs(["bam"])
                    .with_resources(ResourceSpec::new(4000u64).with_cores(2u64))
                    .terminal(),
            )
            .unwrap();

        PipelineBuilder::new(ArtifactNamer::new("manifest-test", "20240101"))
            .with_workflow_version(Some("2.0".into()))
            .build(registry, &ConfigValues::new())
            .unwrap()
    }

    #[test]
    fn test_manifest_preserves_graph() {
        let manifest = JobManifest::from_graph(&graph()).unwrap();

        assert_eq!(manifest.workflow, "manifest-test");
        assert_eq!(manifest.workflow_version.as_deref(), Some("2.0"));
        assert_eq!(manifest.job_ids(), vec!["download", "index"]);

        let index = manifest.job("index").unwrap();
        assert_eq!(index.argv, vec!["samtools", "index", "bam"]);
        assert_eq!(index.memory_mb, 4000);
        assert_eq!(index.cores, Some(2));
        assert_eq!(index.parents, vec!["download"]);
        assert!(manifest.job("download").unwrap().parents.is_empty());
    }

    #[test]
    fn test_manifest_json_parses_back() {
        let manifest = JobManifest::from_graph(&graph()).unwrap();
        let json = manifest.to_json().unwrap();
        assert!(json.contains("\"memory_mb\": 4000"));
        assert_eq!(JobManifest::from_json(&json).unwrap(), manifest);
    }

    #[tokio::test]
    async fn test_manifest_handoff_writes_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("out").join("jobs.json");
        let handoff = ManifestHandoff::new(&path);

        let handle = handoff.submit(&graph()).await.unwrap();
        assert_eq!(handle.engine, "manifest");
        assert_eq!(handle.job_ids, vec!["download", "index"]);
        assert_eq!(handle.location.as_deref(), Some(path.as_path()));

        let written = tokio::fs::read_to_string(&path).await.unwrap();
        let manifest = JobManifest::from_json(&written).unwrap();
        assert_eq!(manifest.jobs.len(), 2);
    }
}
