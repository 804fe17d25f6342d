// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 seqflow contributors

//! Graph command - visualize the resolved pipeline graph

use miette::Result;

use super::{report, GraphFormat, PipelineArgs};
use crate::pipeline::StageRegistry;

/// Run the graph command
pub async fn run(args: PipelineArgs, format: GraphFormat, _verbose: bool) -> Result<()> {
    let loaded = args.load().map_err(report)?;

    let registry = StageRegistry::from_definition(&loaded.definition).map_err(report)?;
    let graph = loaded.builder.build(registry, &loaded.config).map_err(report)?;

    let output = match format {
        GraphFormat::Text => graph.to_text().map_err(report)?,
        GraphFormat::Dot => graph.to_dot(),
        GraphFormat::Mermaid => graph.to_mermaid(),
    };

    println!("{}", output);

    Ok(())
}
