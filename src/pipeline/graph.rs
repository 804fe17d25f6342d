// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 seqflow contributors

//! Resolved pipeline graph
//!
//! A `PipelineGraph` is the output of a successful build: one `StageNode` per
//! included stage, with edges from every producer to its consumers plus any
//! explicit parent edges. Nodes are never mutated after the build.

use petgraph::algo::has_path_connecting;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use std::cmp::Reverse;
use std::collections::{BTreeMap, BinaryHeap, HashMap};

use crate::errors::SeqflowError;
use crate::pipeline::StageSpec;
use crate::render::CommandDescription;

/// An included stage with its artifact paths and rendered command
#[derive(Debug, Clone)]
pub struct StageNode {
    spec: StageSpec,
    inputs: BTreeMap<String, String>,
    outputs: BTreeMap<String, String>,
    command: CommandDescription,
}

impl StageNode {
    pub(crate) fn new(
        spec: StageSpec,
        inputs: BTreeMap<String, String>,
        outputs: BTreeMap<String, String>,
        command: CommandDescription,
    ) -> Self {
        Self {
            spec,
            inputs,
            outputs,
            command,
        }
    }

    pub fn name(&self) -> &str {
        &self.spec.name
    }

    pub fn spec(&self) -> &StageSpec {
        &self.spec
    }

    /// Resolved input paths by artifact name
    pub fn inputs(&self) -> &BTreeMap<String, String> {
        &self.inputs
    }

    /// Resolved output paths by artifact name
    pub fn outputs(&self) -> &BTreeMap<String, String> {
        &self.outputs
    }

    pub fn command(&self) -> &CommandDescription {
        &self.command
    }
}

/// Resolved DAG of included stages
#[derive(Debug, Clone)]
pub struct PipelineGraph {
    name: String,
    workflow_version: Option<String>,
    date_stamp: String,
    graph: DiGraph<StageNode, ()>,
    name_to_index: HashMap<String, NodeIndex>,
    excluded: Vec<String>,
}

impl PipelineGraph {
    pub(crate) fn new(
        name: String,
        workflow_version: Option<String>,
        date_stamp: String,
        graph: DiGraph<StageNode, ()>,
        excluded: Vec<String>,
    ) -> Self {
        let name_to_index = graph
            .node_indices()
            .map(|idx| (graph[idx].name().to_string(), idx))
            .collect();

        Self {
            name,
            workflow_version,
            date_stamp,
            graph,
            name_to_index,
            excluded,
        }
    }

    /// Workflow name
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn workflow_version(&self) -> Option<&str> {
        self.workflow_version.as_deref()
    }

    pub fn date_stamp(&self) -> &str {
        &self.date_stamp
    }

    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Nodes in registration order
    pub fn nodes(&self) -> impl Iterator<Item = &StageNode> {
        self.graph.node_indices().map(move |idx| &self.graph[idx])
    }

    pub fn node(&self, name: &str) -> Option<&StageNode> {
        self.name_to_index.get(name).map(|&idx| &self.graph[idx])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.name_to_index.contains_key(name)
    }

    /// Registered stages whose predicate excluded them
    pub fn excluded_stages(&self) -> &[String] {
        &self.excluded
    }

    /// All edges as (parent, child) name pairs
    pub fn edges(&self) -> Vec<(&str, &str)> {
        self.graph
            .edge_indices()
            .filter_map(|e| self.graph.edge_endpoints(e))
            .map(|(from, to)| (self.graph[from].name(), self.graph[to].name()))
            .collect()
    }

    /// Whether there is a direct edge `parent -> child`
    pub fn has_edge(&self, parent: &str, child: &str) -> bool {
        match (self.name_to_index.get(parent), self.name_to_index.get(child)) {
            (Some(&a), Some(&b)) => self.graph.contains_edge(a, b),
            _ => false,
        }
    }

    /// Direct parents of a stage, in registration order
    pub fn parents(&self, name: &str) -> Option<Vec<&str>> {
        self.neighbors(name, Direction::Incoming)
    }

    /// Direct children of a stage, in registration order
    pub fn children(&self, name: &str) -> Option<Vec<&str>> {
        self.neighbors(name, Direction::Outgoing)
    }

    fn neighbors(&self, name: &str, direction: Direction) -> Option<Vec<&str>> {
        let node = self.name_to_index.get(name)?;
        let mut found: Vec<NodeIndex> = self.graph.neighbors_directed(*node, direction).collect();
        found.sort();
        found.dedup();
        Some(found.into_iter().map(|n| self.graph[n].name()).collect())
    }

    /// Stages without parents
    pub fn roots(&self) -> Vec<&str> {
        self.boundary(Direction::Incoming)
    }

    /// Stages nothing depends on
    pub fn terminals(&self) -> Vec<&str> {
        self.boundary(Direction::Outgoing)
    }

    fn boundary(&self, direction: Direction) -> Vec<&str> {
        self.graph
            .node_indices()
            .filter(|&n| self.graph.neighbors_directed(n, direction).next().is_none())
            .map(|n| self.graph[n].name())
            .collect()
    }

    /// Check if stage A depends (directly or transitively) on stage B
    pub fn depends_on(&self, stage_a: &str, stage_b: &str) -> bool {
        let Some(node_a) = self.name_to_index.get(stage_a) else {
            return false;
        };
        let Some(node_b) = self.name_to_index.get(stage_b) else {
            return false;
        };

        node_a != node_b && has_path_connecting(&self.graph, *node_b, *node_a, None)
    }

    /// Nodes in dependency order, ties broken by registration order
    pub fn topological_order(&self) -> Result<Vec<&StageNode>, SeqflowError> {
        let mut in_degree: Vec<usize> = self
            .graph
            .node_indices()
            .map(|n| self.graph.neighbors_directed(n, Direction::Incoming).count())
            .collect();

        let mut ready: BinaryHeap<Reverse<NodeIndex>> = self
            .graph
            .node_indices()
            .filter(|n| in_degree[n.index()] == 0)
            .map(Reverse)
            .collect();

        let mut order = Vec::with_capacity(self.len());
        while let Some(Reverse(node)) = ready.pop() {
            order.push(&self.graph[node]);
            for child in self.graph.neighbors_directed(node, Direction::Outgoing) {
                in_degree[child.index()] -= 1;
                if in_degree[child.index()] == 0 {
                    ready.push(Reverse(child));
                }
            }
        }

        if order.len() != self.len() {
            return Err(SeqflowError::CyclicPipeline {
                stages: self
                    .graph
                    .node_indices()
                    .filter(|n| in_degree[n.index()] > 0)
                    .map(|n| self.graph[n].name().to_string())
                    .collect(),
            });
        }

        Ok(order)
    }

    /// Generate Mermaid diagram of the DAG
    pub fn to_mermaid(&self) -> String {
        let mut out = String::from("graph TD\n");

        for node in self.nodes() {
            out.push_str(&format!("    {}[{}]\n", node.name(), node.name()));
        }

        for (from, to) in self.edges() {
            out.push_str(&format!("    {} --> {}\n", from, to));
        }

        out
    }

    /// Generate DOT diagram of the DAG
    pub fn to_dot(&self) -> String {
        let mut out = format!("digraph \"{}\" {{\n", self.name);
        out.push_str("    rankdir=TB;\n");
        out.push_str("    node [shape=box, style=rounded];\n\n");

        for (from, to) in self.edges() {
            out.push_str(&format!("    \"{}\" -> \"{}\";\n", from, to));
        }

        for node in self.nodes() {
            let idx = self.name_to_index[node.name()];
            if self.graph.neighbors_undirected(idx).next().is_none() {
                out.push_str(&format!("    \"{}\";\n", node.name()));
            }
        }

        out.push_str("}\n");
        out
    }

    /// Generate text representation of the execution order
    pub fn to_text(&self) -> Result<String, SeqflowError> {
        let order = self.topological_order()?;
        let mut out = String::new();

        for (i, node) in order.iter().enumerate() {
            let resources = node.command().resources;
            out.push_str(&format!("{}. {} ({} MB", i + 1, node.name(), resources.memory_mb));
            if let Some(cores) = resources.cores {
                out.push_str(&format!(", {} cores", cores));
            }
            out.push(')');

            let parents = self.parents(node.name()).unwrap_or_default();
            if !parents.is_empty() {
                out.push_str(&format!(" [depends: {}]", parents.join(", ")));
            }

            out.push('\n');
        }

        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigValues;
    use crate::naming::ArtifactNamer;
    use crate::pipeline::{PipelineBuilder, ResourceSpec, StageRegistry};

    fn diamond() -> PipelineGraph {
        let mut registry = StageRegistry::new();
        registry
            .register(StageSpec::new("download", "fetch").with_outputs(["bam"]))
            .unwrap();
        registry
            .register(
                StageSpec::new("embl", "embl {inputs.bam}")
                    .with_inputs(["bam"])
                    .with_outputs(["emblVcf"])
                    .with_resources(ResourceSpec::new(8000u64).with_cores(4u64)),
            )
            .unwrap();
        registry
            .register(
                StageSpec::new("dkfz", "dkfz {inputs.bam}")
                    .with_inputs(["bam"])
                    .with_outputs(["dkfzVcf"]),
            )
            .unwrap();
        registry
            .register(
                StageSpec::new("upload", "upload {inputs.emblVcf} {inputs.dkfzVcf}")
                    .with_inputs(["emblVcf", "dkfzVcf"])
                    .terminal(),
            )
            .unwrap();

        PipelineBuilder::new(ArtifactNamer::new("diamond", "20240101"))
            .build(registry, &ConfigValues::new())
            .unwrap()
    }

    #[test]
    fn test_structure_queries() {
        let graph = diamond();

        assert_eq!(graph.len(), 4);
        assert_eq!(graph.edge_count(), 4);
        assert_eq!(graph.roots(), vec!["download"]);
        assert_eq!(graph.terminals(), vec!["upload"]);
        assert_eq!(graph.children("download").unwrap(), vec!["embl", "dkfz"]);
        assert_eq!(graph.parents("upload").unwrap(), vec!["embl", "dkfz"]);
        assert!(graph.parents("missing").is_none());
        assert_eq!(graph.date_stamp(), "20240101");
    }

    #[test]
    fn test_depends_on_is_transitive() {
        let graph = diamond();

        assert!(graph.depends_on("upload", "download"));
        assert!(graph.depends_on("embl", "download"));
        assert!(!graph.depends_on("download", "upload"));
        assert!(!graph.depends_on("embl", "dkfz"));
        assert!(!graph.depends_on("embl", "embl"));
    }

    #[test]
    fn test_topological_order() {
        let graph = diamond();
        let order: Vec<&str> = graph
            .topological_order()
            .unwrap()
            .into_iter()
            .map(|n| n.name())
            .collect();

        assert_eq!(order, vec!["download", "embl", "dkfz", "upload"]);
    }

    #[test]
    fn test_renderings() {
        let graph = diamond();

        let mermaid = graph.to_mermaid();
        assert!(mermaid.starts_with("graph TD\n"));
        assert!(mermaid.contains("download --> embl"));

        let dot = graph.to_dot();
        assert!(dot.starts_with("digraph \"diamond\""));
        assert!(dot.contains("\"embl\" -> \"upload\";"));

        let text = graph.to_text().unwrap();
        assert!(text.contains("embl (8000 MB, 4 cores) [depends: download]"));
        assert!(text.contains("download (2000 MB)"));
    }
}
