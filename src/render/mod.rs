// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 seqflow contributors

//! Command rendering
//!
//! Turns a stage's command template into a concrete argv plus resource
//! request. Rendering runs inside `PipelineBuilder::build`, so a typo'd key
//! or an undeclared artifact fails the build instead of the job.

mod template;

pub use template::{placeholders, SubstitutionContext};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::config::ConfigValues;
use crate::errors::SeqflowError;
use crate::naming::ArtifactNamer;
use crate::pipeline::{ArtifactDecl, CommandTemplate, PathTemplate, Quantity, StageNode, StageSpec};

/// Resolved resource request handed to the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceRequest {
    pub memory_mb: u64,
    pub cores: Option<u32>,
}

/// An executable command
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandDescription {
    pub argv: Vec<String>,
    pub resources: ResourceRequest,
}

impl CommandDescription {
    /// The argv as one shell-quoted line
    pub fn shell_line(&self) -> String {
        self.argv
            .iter()
            .map(|arg| shell_quote(arg))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

fn shell_quote(arg: &str) -> String {
    let safe = !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "_-./:=@%+,".contains(c));
    if safe {
        arg.to_string()
    } else {
        format!("'{}'", arg.replace('\'', r"'\''"))
    }
}

/// Interpreter for shell-string commands
pub const SHELL: &str = "bash";

/// Renders stage templates for one workflow run
#[derive(Debug, Clone)]
pub struct CommandRenderer {
    namer: ArtifactNamer,
    workflow_version: Option<String>,
}

impl CommandRenderer {
    pub fn new(namer: ArtifactNamer) -> Self {
        Self {
            namer,
            workflow_version: None,
        }
    }

    pub fn with_workflow_version(mut self, version: Option<String>) -> Self {
        self.workflow_version = version;
        self
    }

    pub fn namer(&self) -> &ArtifactNamer {
        &self.namer
    }

    /// Built-in values plus every config key. Keys inserted before this call
    /// shadow config keys of the same name.
    fn fill_context(&self, ctx: &mut SubstitutionContext, stage: &str, config: &ConfigValues) {
        ctx.insert("stage.name", stage);
        ctx.insert("workflow.name", self.namer.workflow_name());
        ctx.insert("workflow.date", self.namer.date_stamp());
        if let Some(version) = &self.workflow_version {
            ctx.insert("workflow.version", version.as_str());
        }
        for (key, value) in config.iter() {
            ctx.insert_if_absent(key, value.to_string());
        }
    }

    fn substitute(ctx: &SubstitutionContext, stage: &str, template: &str) -> Result<String, SeqflowError> {
        ctx.substitute(template)
            .map_err(|placeholder| SeqflowError::UnresolvedPlaceholder {
                stage: stage.to_string(),
                placeholder,
            })
    }

    /// Resolve the file path of one of a stage's outputs
    pub fn resolve_output(
        &self,
        stage: &StageSpec,
        decl: &ArtifactDecl,
        config: &ConfigValues,
    ) -> Result<String, SeqflowError> {
        let mut ctx = SubstitutionContext::new();
        self.fill_context(&mut ctx, &stage.name, config);

        match &decl.path {
            None => Ok(decl.name.clone()),
            Some(PathTemplate::Pattern(pattern)) => Self::substitute(&ctx, &stage.name, pattern),
            Some(PathTemplate::Named {
                sample,
                data_type,
                variant_class,
                extension,
                directory,
            }) => {
                let sample = Self::substitute(&ctx, &stage.name, sample)?;
                let file = self.namer.name(&sample, *variant_class, data_type, extension);
                match directory {
                    Some(dir) => {
                        let dir = Self::substitute(&ctx, &stage.name, dir)?;
                        Ok(format!("{}/{}", dir.trim_end_matches('/'), file))
                    }
                    None => Ok(file),
                }
            }
        }
    }

    /// Render a stage given its resolved artifact paths
    pub fn render_stage(
        &self,
        stage: &StageSpec,
        inputs: &BTreeMap<String, String>,
        outputs: &BTreeMap<String, String>,
        config: &ConfigValues,
    ) -> Result<CommandDescription, SeqflowError> {
        let mut ctx = SubstitutionContext::new();
        for (name, path) in inputs {
            ctx.insert(format!("inputs.{}", name), path.as_str());
        }
        for (name, path) in outputs {
            ctx.insert(format!("outputs.{}", name), path.as_str());
        }
        self.fill_context(&mut ctx, &stage.name, config);

        let argv = match &stage.command {
            CommandTemplate::Shell(script) => vec![
                SHELL.to_string(),
                "-c".to_string(),
                Self::substitute(&ctx, &stage.name, script)?,
            ],
            CommandTemplate::Argv(args) => args
                .iter()
                .map(|arg| Self::substitute(&ctx, &stage.name, arg))
                .collect::<Result<Vec<_>, _>>()?,
        };

        let memory_mb = Self::quantity(&ctx, stage, &stage.resources.memory_mb)?;
        let cores = match &stage.resources.cores {
            Some(q) => {
                let cores = Self::quantity(&ctx, stage, q)?;
                Some(u32::try_from(cores).map_err(|_| SeqflowError::ConfigResolution {
                    context: format!("stage '{}'", stage.name),
                    key: "cores".into(),
                    reason: format!("{} cores is out of range", cores),
                })?)
            }
            None => None,
        };

        Ok(CommandDescription {
            argv,
            resources: ResourceRequest { memory_mb, cores },
        })
    }

    /// Render a node of a built graph again
    pub fn render(&self, node: &StageNode, config: &ConfigValues) -> Result<CommandDescription, SeqflowError> {
        self.render_stage(node.spec(), node.inputs(), node.outputs(), config)
    }

    fn quantity(ctx: &SubstitutionContext, stage: &StageSpec, quantity: &Quantity) -> Result<u64, SeqflowError> {
        match quantity {
            Quantity::Fixed(v) => Ok(*v),
            Quantity::Template(template) => {
                let raw = Self::substitute(ctx, &stage.name, template)?;
                raw.trim().parse().map_err(|_| {
                    let refs = placeholders(template);
                    SeqflowError::ConfigResolution {
                        context: format!("stage '{}'", stage.name),
                        key: refs.first().cloned().unwrap_or_else(|| template.clone()),
                        reason: format!("resource value '{}' is not a whole number", raw.trim()),
                    }
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::naming::VariantClass;
    use crate::pipeline::ResourceSpec;

    fn renderer() -> CommandRenderer {
        CommandRenderer::new(ArtifactNamer::new("embl-delly", "20150318"))
            .with_workflow_version(Some("1.0.0".into()))
    }

    fn config() -> ConfigValues {
        ConfigValues::from_pairs([
            ("tumourAliquotId", "a1"),
            ("sharedWorkspace", "/work/shared"),
            ("picard_sort_mem", "6000"),
            ("threads", "8"),
            ("bad_mem", "lots"),
        ])
    }

    #[test]
    fn test_shell_command_rendering() {
        let stage = StageSpec::new("call", "delly -o {outputs.vcf} {inputs.bam} # {workflow.name} {workflow.version}")
            .with_inputs(["bam"])
            .with_outputs(["vcf"]);
        let inputs = BTreeMap::from([("bam".to_string(), "in/a1.bam".to_string())]);
        let outputs = BTreeMap::from([("vcf".to_string(), "a1.vcf.gz".to_string())]);

        let cmd = renderer().render_stage(&stage, &inputs, &outputs, &config()).unwrap();
        assert_eq!(cmd.argv[0], "bash");
        assert_eq!(cmd.argv[1], "-c");
        assert_eq!(cmd.argv[2], "delly -o a1.vcf.gz in/a1.bam # embl-delly 1.0.0");
        assert_eq!(cmd.resources.memory_mb, 2000);
        assert_eq!(cmd.resources.cores, None);
    }

    #[test]
    fn test_argv_and_resource_templates() {
        let stage = StageSpec::new(
            "sort",
            CommandTemplate::Argv(vec!["picard".into(), "SortSam".into(), "TMP_DIR={sharedWorkspace}".into()]),
        )
        .with_resources(ResourceSpec::new("{picard_sort_mem}").with_cores("{threads}"));

        let cmd = renderer()
            .render_stage(&stage, &BTreeMap::new(), &BTreeMap::new(), &config())
            .unwrap();
        assert_eq!(cmd.argv, vec!["picard", "SortSam", "TMP_DIR=/work/shared"]);
        assert_eq!(cmd.resources, ResourceRequest { memory_mb: 6000, cores: Some(8) });
    }

    #[test]
    fn test_unresolved_placeholder_fails() {
        let stage = StageSpec::new("call", "delly {refGenom}");
        let result = renderer().render_stage(&stage, &BTreeMap::new(), &BTreeMap::new(), &config());
        assert!(matches!(
            result,
            Err(SeqflowError::UnresolvedPlaceholder { ref stage, ref placeholder })
                if stage == "call" && placeholder == "refGenom"
        ));
    }

    #[test]
    fn test_undeclared_artifact_fails() {
        let stage = StageSpec::new("call", "delly {inputs.bam}");
        let result = renderer().render_stage(&stage, &BTreeMap::new(), &BTreeMap::new(), &config());
        assert!(matches!(result, Err(SeqflowError::UnresolvedPlaceholder { .. })));
    }

    #[test]
    fn test_bad_resource_value() {
        let stage = StageSpec::new("sort", "true").with_resources(ResourceSpec::new("{bad_mem}"));
        let result = renderer().render_stage(&stage, &BTreeMap::new(), &BTreeMap::new(), &config());
        assert!(matches!(
            result,
            Err(SeqflowError::ConfigResolution { ref key, .. }) if key == "bad_mem"
        ));
    }

    #[test]
    fn test_named_output_path() {
        let decl = ArtifactDecl::new(
            "somaticVcf",
            PathTemplate::Named {
                sample: "{tumourAliquotId}".into(),
                data_type: "sv".into(),
                variant_class: Some(VariantClass::Somatic),
                extension: "vcf.gz".into(),
                directory: Some("{sharedWorkspace}/".into()),
            },
        );
        let stage = StageSpec::new("call", "true").with_outputs([decl.clone()]);

        let path = renderer().resolve_output(&stage, &decl, &config()).unwrap();
        assert_eq!(path, "/work/shared/a1.embl-delly.20150318.somatic.sv.vcf.gz");
    }

    #[test]
    fn test_default_output_path_is_name() {
        let decl = ArtifactDecl::from("rawBam");
        let stage = StageSpec::new("dl", "true").with_outputs([decl.clone()]);
        assert_eq!(renderer().resolve_output(&stage, &decl, &config()).unwrap(), "rawBam");
    }

    #[test]
    fn test_shell_line_quotes() {
        let cmd = CommandDescription {
            argv: vec!["bash".into(), "-c".into(), "echo 'hi' > out.txt".into()],
            resources: ResourceRequest { memory_mb: 1, cores: None },
        };
        assert_eq!(cmd.shell_line(), r#"bash -c 'echo '\''hi'\'' > out.txt'"#);
    }
}
