// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 seqflow contributors

//! Engine handoff
//!
//! A `DagHandoff` turns a built `PipelineGraph` into whatever an execution
//! engine consumes and submits it. Handoffs make no scheduling decisions:
//! parent edges, argv and resource requests pass through unchanged.

mod manifest;
mod memory;
mod script;

pub use manifest::{JobManifest, JobRecord, ManifestHandoff};
pub use memory::InMemoryHandoff;
pub use script::ScriptHandoff;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::errors::SeqflowError;
use crate::pipeline::PipelineGraph;

/// Reference to a submitted pipeline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalJobHandle {
    /// Engine that accepted the pipeline
    pub engine: String,
    pub workflow: String,
    /// Job ids in submission order
    pub job_ids: Vec<String>,
    /// Where the engine representation was written, if anywhere
    pub location: Option<PathBuf>,
}

/// Trait for execution engine integrations
#[async_trait]
pub trait DagHandoff: Send + Sync {
    /// Short engine name used in logs and handles
    fn engine(&self) -> &str;

    /// Translate and submit a built graph
    async fn submit(&self, graph: &PipelineGraph) -> Result<ExternalJobHandle, SeqflowError>;
}

/// Write a handoff artifact, creating parent directories
async fn write_output(engine: &str, path: &Path, content: &str) -> Result<(), SeqflowError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(|e| SeqflowError::HandoffFailed {
            engine: engine.to_string(),
            message: format!("Failed to create directory '{}': {}", parent.display(), e),
        })?;
    }

    tokio::fs::write(path, content).await.map_err(|e| SeqflowError::FileWriteError {
        path: path.to_path_buf(),
        error: e.to_string(),
    })
}
