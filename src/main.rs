// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 seqflow contributors

//! seqflow - sequencing workflow graph builder
//!
//! Build validated job graphs from pipeline definitions and workflow ini files.

use clap::Parser;
use miette::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use seqflow::cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "seqflow=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let cli = Cli::parse();

    // Change to specified directory if provided
    if let Some(ref dir) = cli.directory {
        std::env::set_current_dir(dir).map_err(|e| {
            miette::miette!("Failed to change to directory '{}': {}", dir.display(), e)
        })?;
    }

    // Dispatch to command handlers
    match cli.command {
        Commands::Validate { pipeline } => seqflow::cli::validate::run(pipeline, cli.verbose).await,
        Commands::Graph { pipeline, format } => {
            seqflow::cli::graph::run(pipeline, format, cli.verbose).await
        }
        Commands::Submit {
            pipeline,
            engine,
            output,
            dry_run,
        } => seqflow::cli::submit::run(pipeline, engine, output, dry_run, cli.verbose).await,
        Commands::Name {
            sample,
            workflow,
            date,
            class,
            data_type,
            extension,
            companions,
        } => {
            seqflow::cli::name::run(sample, workflow, date, class, data_type, extension, companions)
                .await
        }
    }
}
