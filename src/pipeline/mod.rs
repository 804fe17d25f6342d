// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 seqflow contributors

//! Pipeline definitions and graph construction
//!
//! Stage specs are registered in declaration order, filtered by their
//! inclusion predicates, and wired into a `PipelineGraph` by artifact flow.

mod builder;
mod condition;
mod definition;
mod graph;
mod registry;
mod validation;

pub use builder::PipelineBuilder;
pub use condition::{Condition, Predicate};
pub use definition::*;
pub use graph::{PipelineGraph, StageNode};
pub use registry::StageRegistry;
pub use validation::{PipelineValidator, ValidationResult};
