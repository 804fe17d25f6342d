// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 seqflow contributors

//! # seqflow - sequencing workflow graph builder
//!
//! `seqflow` turns declarative stage specs and a workflow configuration into
//! a validated job DAG for an external execution engine.
//!
//! ## Features
//!
//! - **Declarative variants** - download sources, optional callers and cleanup
//!   modes are inclusion conditions on stages, not copies of a workflow
//! - **Artifact wiring** - edges come from producer/consumer relationships
//! - **Build-time checks** - dangling inputs, cycles and unknown placeholders
//!   fail the build, before anything is submitted
//! - **Conventional names** - result files follow the pancancer naming scheme
//!
//! ## Quick Start
//!
//! ```bash
//! # Check a pipeline under a workflow ini
//! seqflow validate pipeline.yaml -c workflow.ini
//!
//! # Show the resolved graph
//! seqflow graph pipeline.yaml -c workflow.ini --format mermaid
//!
//! # Write a JSON job manifest
//! seqflow submit pipeline.yaml -c workflow.ini -o jobs.json
//! ```

pub mod cli;
pub mod config;
pub mod errors;
pub mod handoff;
pub mod naming;
pub mod pipeline;
pub mod render;

// Re-export commonly used types
pub use config::{ConfigValue, ConfigValues, DataLocation};
pub use errors::{SeqflowError, SeqflowResult};
pub use handoff::{DagHandoff, ExternalJobHandle};
pub use naming::{ArtifactNamer, VariantClass};
pub use pipeline::{PipelineBuilder, PipelineGraph, StageRegistry, StageSpec};
pub use render::{CommandDescription, CommandRenderer};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
