// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 seqflow contributors

//! CLI command definitions and handlers
//!
//! Defines the command-line interface for seqflow.

pub mod graph;
pub mod name;
pub mod submit;
pub mod validate;

use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use tracing::debug;

use crate::config::ConfigValues;
use crate::errors::{RecoverySuggestion, SeqflowError};
use crate::naming::{ArtifactNamer, VariantClass};
use crate::pipeline::{PipelineBuilder, PipelineDefinition};

/// Sequencing workflow graph builder
///
/// Turn pipeline definitions and workflow ini files into job graphs.
#[derive(Parser, Debug)]
#[clap(
    name = "seqflow",
    version,
    about = "Build validated job graphs for sequencing workflows",
    long_about = None,
    after_help = "Examples:\n\
        seqflow validate pipeline.yaml -c workflow.ini     Check a pipeline under a configuration\n\
        seqflow graph pipeline.yaml -f mermaid             Show the resolved job graph\n\
        seqflow submit pipeline.yaml -c workflow.ini       Write the job manifest\n\n\
        See 'seqflow <command> --help' for more information on a specific command."
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[clap(short, long, global = true)]
    pub verbose: bool,

    /// Change to directory before executing
    #[clap(short = 'C', long, global = true, value_name = "DIR")]
    pub directory: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Validate a pipeline under a configuration
    Validate {
        #[clap(flatten)]
        pipeline: PipelineArgs,
    },

    /// Show the resolved pipeline graph
    Graph {
        #[clap(flatten)]
        pipeline: PipelineArgs,

        /// Output format (text, dot, mermaid)
        #[clap(short, long, default_value = "text")]
        format: GraphFormat,
    },

    /// Build the pipeline and hand it to an execution engine
    Submit {
        #[clap(flatten)]
        pipeline: PipelineArgs,

        /// Engine representation to produce (manifest, script)
        #[clap(short, long, default_value = "manifest")]
        engine: Engine,

        /// Output file (default: <workflow>.jobs.json or <workflow>.sh)
        #[clap(short, long)]
        output: Option<PathBuf>,

        /// Print the job manifest instead of writing anything
        #[clap(long)]
        dry_run: bool,
    },

    /// Print a result file name
    Name {
        /// Sample or aliquot id
        #[clap(long)]
        sample: String,

        /// Workflow name
        #[clap(long)]
        workflow: String,

        /// Date stamp (YYYYMMDD)
        #[clap(long, value_parser = parse_date_stamp)]
        date: String,

        /// Variant class (somatic, germline)
        #[clap(long)]
        class: Option<VariantClass>,

        /// Data type segment, e.g. sv or snv_mnv
        #[clap(long)]
        data_type: String,

        /// File extension, e.g. vcf.gz
        #[clap(long)]
        extension: String,

        /// Also print the .md5, .tbi and .tbi.md5 companions
        #[clap(long)]
        companions: bool,
    },
}

/// Pipeline file plus its configuration layers
#[derive(Args, Debug, Clone)]
pub struct PipelineArgs {
    /// Pipeline definition file
    #[clap(default_value = "seqflow.yaml")]
    pub pipeline: PathBuf,

    /// Workflow ini file
    #[clap(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Override a configuration key
    #[clap(long = "set", value_name = "KEY=VALUE", value_parser = parse_key_val)]
    pub overrides: Vec<(String, String)>,

    /// Date stamp for artifact names (YYYYMMDD, default: today)
    #[clap(long, value_parser = parse_date_stamp)]
    pub date: Option<String>,
}

/// A loaded definition with its layered configuration
#[derive(Debug)]
pub struct LoadedPipeline {
    pub definition: PipelineDefinition,
    pub config: ConfigValues,
    pub builder: PipelineBuilder,
}

impl PipelineArgs {
    /// Load the definition and layer defaults, ini file and `--set` overrides
    pub fn load(&self) -> Result<LoadedPipeline, SeqflowError> {
        let definition = PipelineDefinition::from_file(&self.pipeline)?;

        let mut config = definition.default_config();
        if let Some(path) = &self.config {
            config = config.overlay(&ConfigValues::from_ini_file(path)?);
        }
        config = config.overlay(&ConfigValues::from_pairs(self.overrides.clone()));
        debug!(keys = config.len(), "resolved configuration");

        let builder = match &self.date {
            Some(date) => PipelineBuilder::for_definition(&definition, date.clone()),
            None => PipelineBuilder::new(ArtifactNamer::today(definition.name.clone()))
                .with_workflow_version(definition.workflow_version.clone()),
        };

        Ok(LoadedPipeline {
            definition,
            config,
            builder,
        })
    }
}

fn parse_key_val(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.trim().to_string()))
        }
        _ => Err(format!("Expected KEY=VALUE, got '{}'", s)),
    }
}

fn parse_date_stamp(s: &str) -> Result<String, String> {
    chrono::NaiveDate::parse_from_str(s, "%Y%m%d")
        .map(|_| s.to_string())
        .map_err(|_| format!("Expected a date as YYYYMMDD, got '{}'", s))
}

/// Print a recovery suggestion, if any, and turn the error into a report
pub fn report(error: SeqflowError) -> miette::Report {
    if let Some(suggestion) = RecoverySuggestion::for_error(&error) {
        eprintln!("{}", "Suggestion:".cyan().bold());
        eprintln!("{}", suggestion);
    }
    miette::Report::new(error)
}

/// Graph output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphFormat {
    Text,
    Dot,
    Mermaid,
}

impl std::str::FromStr for GraphFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "dot" => Ok(Self::Dot),
            "mermaid" => Ok(Self::Mermaid),
            _ => Err(format!("Unknown graph format: {}", s)),
        }
    }
}

/// Engine representation for `submit`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Engine {
    Manifest,
    Script,
}

impl std::str::FromStr for Engine {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "manifest" | "json" => Ok(Self::Manifest),
            "script" | "bash" => Ok(Self::Script),
            _ => Err(format!("Unknown engine: {}", s)),
        }
    }
}
