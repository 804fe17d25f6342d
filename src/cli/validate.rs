// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 seqflow contributors

//! Validate command - check a pipeline under a configuration

use colored::Colorize;
use miette::Result;

use super::{report, PipelineArgs};
use crate::pipeline::PipelineValidator;

/// Run the validate command
pub async fn run(args: PipelineArgs, verbose: bool) -> Result<()> {
    println!("{}", "Validating pipeline...".bold());
    println!();

    let loaded = match args.load() {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("  {} Failed to load pipeline", "✗".red());
            eprintln!();
            return Err(report(e));
        }
    };

    println!("  {} Pipeline file is valid YAML", "✓".green());
    if let Some(config) = &args.config {
        println!("  {} Loaded configuration from {}", "✓".green(), config.display());
    }

    let validation =
        PipelineValidator::validate_with(&loaded.builder, &loaded.definition, &loaded.config)
            .map_err(report)?;

    if !validation.errors.is_empty() {
        println!();
        println!("{}:", "Errors".red().bold());
        for error in &validation.errors {
            println!("  {} {}", "✗".red(), error);
        }
    }

    if !validation.warnings.is_empty() {
        println!();
        println!("{}:", "Warnings".yellow().bold());
        for warning in &validation.warnings {
            println!("  {} {}", "⚠".yellow(), warning);
        }
    }

    if verbose {
        if let Some(graph) = &validation.graph {
            println!();
            println!("{}:", "Pipeline summary".bold());
            println!("  Name: {}", graph.name());
            println!("  Stages: {} included, {} excluded", graph.len(), graph.excluded_stages().len());
            for node in graph.nodes() {
                let parents = graph.parents(node.name()).unwrap_or_default();
                let deps = if parents.is_empty() {
                    String::new()
                } else {
                    format!(" [depends: {}]", parents.join(", "))
                };
                println!("    - {}{}", node.name(), deps.dimmed());
            }
            for excluded in graph.excluded_stages() {
                println!("    - {} {}", excluded.dimmed(), "(excluded)".dimmed());
            }
        }
    }

    println!();

    if !validation.is_valid() {
        return Err(miette::miette!("Pipeline validation failed"));
    }

    if validation.has_warnings() {
        println!("{}", "Pipeline is valid but has warnings.".yellow().bold());
    } else {
        println!("{}", "Pipeline is valid!".green().bold());
    }
    Ok(())
}
