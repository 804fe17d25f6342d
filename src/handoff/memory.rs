// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 seqflow contributors

//! In-memory handoff for dry runs

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use super::{DagHandoff, ExternalJobHandle, JobManifest};
use crate::errors::SeqflowError;
use crate::pipeline::PipelineGraph;

/// Keeps every submitted manifest instead of sending it anywhere
#[derive(Debug, Default)]
pub struct InMemoryHandoff {
    submitted: RwLock<Vec<JobManifest>>,
}

impl InMemoryHandoff {
    pub fn new() -> Self {
        Self::default()
    }

    /// Manifests submitted so far
    pub async fn submitted(&self) -> Vec<JobManifest> {
        self.submitted.read().await.clone()
    }

    pub async fn last(&self) -> Option<JobManifest> {
        self.submitted.read().await.last().cloned()
    }
}

#[async_trait]
impl DagHandoff for InMemoryHandoff {
    fn engine(&self) -> &str {
        "memory"
    }

    async fn submit(&self, graph: &PipelineGraph) -> Result<ExternalJobHandle, SeqflowError> {
        let manifest = JobManifest::from_graph(graph)?;
        let handle = ExternalJobHandle {
            engine: self.engine().to_string(),
            workflow: manifest.workflow.clone(),
            job_ids: manifest.job_ids(),
            location: None,
        };

        debug!(workflow = %manifest.workflow, jobs = manifest.jobs.len(), "kept manifest in memory");
        self.submitted.write().await.push(manifest);
        Ok(handle)
    }
}
