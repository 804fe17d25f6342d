// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 seqflow contributors

//! Single-host bash script
//!
//! Runs every job sequentially in dependency order. Useful on one machine
//! without a cluster engine, at the cost of all parallelism.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::info;

use super::{write_output, DagHandoff, ExternalJobHandle};
use crate::errors::SeqflowError;
use crate::pipeline::PipelineGraph;

/// Writes a bash script with one function per job
#[derive(Debug, Clone)]
pub struct ScriptHandoff {
    path: PathBuf,
}

impl ScriptHandoff {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Render the script for a graph
    pub fn render_script(graph: &PipelineGraph) -> Result<String, SeqflowError> {
        let order = graph.topological_order()?;
        let mut out = String::from("#!/usr/bin/env bash\n");

        out.push_str(&format!("# {}", graph.name()));
        if let Some(version) = graph.workflow_version() {
            out.push_str(&format!(" {}", version));
        }
        out.push_str(&format!(" ({})\n", graph.date_stamp()));
        out.push_str("set -euo pipefail\n\n");

        let functions: Vec<String> = order
            .iter()
            .enumerate()
            .map(|(i, node)| function_name(i + 1, node.name()))
            .collect();

        for (node, function) in order.iter().zip(&functions) {
            let resources = node.command().resources;
            out.push_str(&format!("{}() {{\n", function));
            out.push_str(&format!("    # {} MB", resources.memory_mb));
            if let Some(cores) = resources.cores {
                out.push_str(&format!(", {} cores", cores));
            }
            let parents = graph.parents(node.name()).unwrap_or_default();
            if !parents.is_empty() {
                out.push_str(&format!("; after {}", parents.join(", ")));
            }
            out.push('\n');
            out.push_str(&format!("    {}\n}}\n\n", node.command().shell_line()));
        }

        for (node, function) in order.iter().zip(&functions) {
            out.push_str(&format!("echo \"[seqflow] {}\" >&2\n", node.name()));
            out.push_str(&format!("{}\n", function));
        }

        Ok(out)
    }
}

/// Bash-safe function name for the job at `position` in run order. The
/// position keeps names distinct when two stage names sanitize alike.
fn function_name(position: usize, stage: &str) -> String {
    let body: String = stage
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    format!("job_{}_{}", position, body)
}

#[async_trait]
impl DagHandoff for ScriptHandoff {
    fn engine(&self) -> &str {
        "script"
    }

    async fn submit(&self, graph: &PipelineGraph) -> Result<ExternalJobHandle, SeqflowError> {
        let script = Self::render_script(graph)?;
        write_output(self.engine(), &self.path, &script).await?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            tokio::fs::set_permissions(&self.path, std::fs::Permissions::from_mode(0o755))
                .await
                .map_err(|e| SeqflowError::HandoffFailed {
                    engine: self.engine().to_string(),
                    message: format!("Failed to mark script executable: {}", e),
                })?;
        }

        info!("Wrote script for '{}' to {}", graph.name(), self.path.display());

        Ok(ExternalJobHandle {
            engine: self.engine().to_string(),
            workflow: graph.name().to_string(),
            job_ids: graph
                .topological_order()?
                .into_iter()
                .map(|n| n.name().to_string())
                .collect(),
            location: Some(self.path.clone()),
        })
    }
}
