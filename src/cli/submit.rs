// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 seqflow contributors

//! Submit command - build the pipeline and hand it to an engine

use colored::Colorize;
use miette::Result;
use std::path::PathBuf;

use super::{report, Engine, PipelineArgs};
use crate::handoff::{DagHandoff, InMemoryHandoff, ManifestHandoff, ScriptHandoff};
use crate::pipeline::StageRegistry;

/// Run the submit command
pub async fn run(
    args: PipelineArgs,
    engine: Engine,
    output: Option<PathBuf>,
    dry_run: bool,
    verbose: bool,
) -> Result<()> {
    let loaded = args.load().map_err(report)?;

    let registry = StageRegistry::from_definition(&loaded.definition).map_err(report)?;
    let graph = loaded.builder.build(registry, &loaded.config).map_err(report)?;

    if dry_run {
        let handoff = InMemoryHandoff::new();
        handoff.submit(&graph).await.map_err(report)?;
        if let Some(manifest) = handoff.last().await {
            println!("{}", manifest.to_json().map_err(report)?);
        }
        return Ok(());
    }

    let handoff: Box<dyn DagHandoff> = match engine {
        Engine::Manifest => Box::new(ManifestHandoff::new(
            output.unwrap_or_else(|| PathBuf::from(format!("{}.jobs.json", graph.name()))),
        )),
        Engine::Script => Box::new(ScriptHandoff::new(
            output.unwrap_or_else(|| PathBuf::from(format!("{}.sh", graph.name()))),
        )),
    };

    let handle = handoff.submit(&graph).await.map_err(report)?;

    println!(
        "{} Submitted '{}' to {} ({} jobs)",
        "✓".green(),
        handle.workflow.bold(),
        handle.engine,
        handle.job_ids.len()
    );
    if let Some(location) = &handle.location {
        println!("  Written to {}", location.display());
    }
    if verbose {
        for id in &handle.job_ids {
            println!("    - {}", id);
        }
        if !graph.excluded_stages().is_empty() {
            println!(
                "  {} {}",
                "Excluded:".dimmed(),
                graph.excluded_stages().join(", ").dimmed()
            );
        }
    }

    Ok(())
}
