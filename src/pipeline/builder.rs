// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 seqflow contributors

//! Pipeline builder
//!
//! Resolves a registry of stage specs against a configuration into a
//! validated `PipelineGraph`:
//!
//! 1. evaluate every stage's inclusion predicate
//! 2. map each artifact to its single included producer
//! 3. add producer → consumer edges and explicit parent edges
//! 4. chain parentless, non-root stages to the nearest earlier stage that
//!    does not already depend on them
//! 5. reject cycles
//! 6. resolve artifact paths and render every command
//!
//! Edges come from data dependencies first. Two stages that share no
//! artifacts and name no parents stay unconnected, leaving the engine free to
//! run them concurrently.

use petgraph::algo::{has_path_connecting, kosaraju_scc, toposort};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info, warn};

use crate::config::ConfigValues;
use crate::errors::SeqflowError;
use crate::naming::ArtifactNamer;
use crate::pipeline::{PipelineDefinition, PipelineGraph, StageNode, StageRegistry, StageSpec};
use crate::render::CommandRenderer;

/// Builds pipeline graphs for one workflow
#[derive(Debug, Clone)]
pub struct PipelineBuilder {
    renderer: CommandRenderer,
    workflow_version: Option<String>,
}

impl PipelineBuilder {
    /// Create a builder naming artifacts with `namer`
    pub fn new(namer: ArtifactNamer) -> Self {
        Self {
            renderer: CommandRenderer::new(namer),
            workflow_version: None,
        }
    }

    /// Builder for a definition file, stamped with `date_stamp`
    pub fn for_definition(definition: &PipelineDefinition, date_stamp: impl Into<String>) -> Self {
        Self::new(ArtifactNamer::new(definition.name.clone(), date_stamp))
            .with_workflow_version(definition.workflow_version.clone())
    }

    pub fn with_workflow_version(mut self, version: Option<String>) -> Self {
        self.renderer = self.renderer.with_workflow_version(version.clone());
        self.workflow_version = version;
        self
    }

    pub fn renderer(&self) -> &CommandRenderer {
        &self.renderer
    }

    /// Build the graph. The registry is consumed: stage sets never leak
    /// from one build into the next.
    pub fn build(&self, registry: StageRegistry, config: &ConfigValues) -> Result<PipelineGraph, SeqflowError> {
        let workflow = self.renderer.namer().workflow_name().to_string();

        if registry.is_empty() {
            return Err(SeqflowError::InvalidPipeline {
                reason: format!("pipeline '{}' has no stages", workflow),
                help: Some("Register at least one stage".into()),
            });
        }

        let (included, excluded) = Self::select_stages(&registry, config)?;
        if included.is_empty() {
            return Err(SeqflowError::InvalidPipeline {
                reason: format!("no stage of '{}' is included by this configuration", workflow),
                help: Some("Check the include_if conditions against your workflow ini".into()),
            });
        }

        let producers = Self::map_producers(&included)?;
        let skeleton = Self::wire_edges(&registry, &included, &producers)?;
        Self::check_acyclic(&skeleton, &included)?;
        let graph = self.render_nodes(&included, &producers, &skeleton, config)?;

        info!(
            "Built pipeline '{}': {} stages, {} edges, {} excluded",
            workflow,
            graph.node_count(),
            graph.edge_count(),
            excluded.len()
        );

        Ok(PipelineGraph::new(
            workflow,
            self.workflow_version.clone(),
            self.renderer.namer().date_stamp().to_string(),
            graph,
            excluded,
        ))
    }

    /// Step 1: split registered stages into included and excluded
    fn select_stages<'a>(
        registry: &'a StageRegistry,
        config: &ConfigValues,
    ) -> Result<(Vec<&'a StageSpec>, Vec<String>), SeqflowError> {
        let mut included = Vec::new();
        let mut excluded = Vec::new();

        for stage in registry.stages() {
            let include = stage
                .include_if
                .evaluate(config)
                .map_err(|e| e.in_context(format!("stage '{}'", stage.name)))?;

            debug!(stage = %stage.name, include, "evaluated inclusion");

            if include {
                included.push(stage);
            } else {
                excluded.push(stage.name.clone());
            }
        }

        Ok((included, excluded))
    }

    /// Step 2: artifact name → position of its producer in `included`
    fn map_producers<'a>(included: &[&'a StageSpec]) -> Result<HashMap<&'a str, usize>, SeqflowError> {
        let mut producers: HashMap<&str, usize> = HashMap::new();

        for (pos, stage) in included.iter().enumerate() {
            for artifact in stage.output_names() {
                if let Some(&other) = producers.get(artifact) {
                    return Err(SeqflowError::AmbiguousArtifact {
                        artifact: artifact.to_string(),
                        producers: vec![included[other].name.clone(), stage.name.clone()],
                    });
                }
                producers.insert(artifact, pos);
            }
        }

        for stage in included {
            if let Some(missing) = stage.inputs.iter().find(|i| !producers.contains_key(i.as_str())) {
                return Err(SeqflowError::DanglingDependency {
                    stage: stage.name.clone(),
                    artifact: missing.clone(),
                });
            }
        }

        Ok(producers)
    }

    /// Steps 3 and 4: data edges, explicit parents, then the fallback chain
    fn wire_edges(
        registry: &StageRegistry,
        included: &[&StageSpec],
        producers: &HashMap<&str, usize>,
    ) -> Result<DiGraph<usize, ()>, SeqflowError> {
        let mut skeleton: DiGraph<usize, ()> = DiGraph::with_capacity(included.len(), included.len());
        let nodes: Vec<NodeIndex> = (0..included.len()).map(|pos| skeleton.add_node(pos)).collect();
        let positions: HashMap<&str, usize> = included
            .iter()
            .enumerate()
            .map(|(pos, s)| (s.name.as_str(), pos))
            .collect();

        let connect = |graph: &mut DiGraph<usize, ()>, from: usize, to: usize| {
            if !graph.contains_edge(nodes[from], nodes[to]) {
                graph.add_edge(nodes[from], nodes[to], ());
            }
        };

        for (pos, stage) in included.iter().enumerate() {
            for input in &stage.inputs {
                connect(&mut skeleton, producers[input.as_str()], pos);
            }

            for parent in &stage.parents {
                match positions.get(parent.as_str()) {
                    Some(&from) => connect(&mut skeleton, from, pos),
                    None if registry.contains(parent) => {
                        warn!(stage = %stage.name, parent = %parent, "ignoring excluded parent");
                    }
                    None => {
                        return Err(SeqflowError::UnknownDependency {
                            stage: stage.name.clone(),
                            dependency: parent.clone(),
                        });
                    }
                }
            }
        }

        for (pos, stage) in included.iter().enumerate().skip(1) {
            let orphan = skeleton
                .neighbors_directed(nodes[pos], Direction::Incoming)
                .next()
                .is_none();

            if !orphan || stage.is_root() {
                continue;
            }

            // Nearest earlier stage that does not already run after this one
            let previous = (0..pos)
                .rev()
                .find(|&cand| !has_path_connecting(&skeleton, nodes[pos], nodes[cand], None));

            match previous {
                Some(previous) => {
                    debug!(
                        stage = %stage.name,
                        previous = %included[previous].name,
                        "chaining parentless stage to previous stage"
                    );
                    connect(&mut skeleton, previous, pos);
                }
                None => debug!(stage = %stage.name, "no earlier stage to chain to"),
            }
        }

        Ok(skeleton)
    }

    /// Step 5: reject cycles, naming every stage on one
    fn check_acyclic(skeleton: &DiGraph<usize, ()>, included: &[&StageSpec]) -> Result<(), SeqflowError> {
        if toposort(skeleton, None).is_ok() {
            return Ok(());
        }

        let cycle = kosaraju_scc(skeleton)
            .into_iter()
            .find(|scc| scc.len() > 1 || skeleton.contains_edge(scc[0], scc[0]))
            .unwrap_or_default();

        let mut positions: Vec<usize> = cycle.into_iter().map(|n| skeleton[n]).collect();
        positions.sort_unstable();

        Err(SeqflowError::CyclicPipeline {
            stages: positions.into_iter().map(|p| included[p].name.clone()).collect(),
        })
    }

    /// Step 6: resolve artifact paths and render commands into final nodes
    fn render_nodes(
        &self,
        included: &[&StageSpec],
        producers: &HashMap<&str, usize>,
        skeleton: &DiGraph<usize, ()>,
        config: &ConfigValues,
    ) -> Result<DiGraph<StageNode, ()>, SeqflowError> {
        let mut output_paths: Vec<BTreeMap<String, String>> = Vec::with_capacity(included.len());
        for stage in included {
            let mut paths = BTreeMap::new();
            for decl in &stage.outputs {
                let path = self.renderer.resolve_output(stage, decl, config)?;
                paths.insert(decl.name.clone(), path);
            }
            output_paths.push(paths);
        }

        let mut graph = DiGraph::with_capacity(included.len(), skeleton.edge_count());
        for (pos, stage) in included.iter().enumerate() {
            let inputs: BTreeMap<String, String> = stage
                .inputs
                .iter()
                .map(|name| {
                    let producer = producers[name.as_str()];
                    (name.clone(), output_paths[producer][name].clone())
                })
                .collect();
            let outputs = output_paths[pos].clone();

            let command = self.renderer.render_stage(stage, &inputs, &outputs, config)?;
            graph.add_node(StageNode::new((*stage).clone(), inputs, outputs, command));
        }

        for edge in skeleton.raw_edges() {
            graph.add_edge(edge.source(), edge.target(), ());
        }

        Ok(graph)
    }
}
