// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 seqflow contributors

//! Name command - print conventional result file names

use miette::Result;

use crate::naming::{ArtifactNamer, VariantClass};

/// Run the name command
pub async fn run(
    sample: String,
    workflow: String,
    date: String,
    class: Option<VariantClass>,
    data_type: String,
    extension: String,
    companions: bool,
) -> Result<()> {
    let namer = ArtifactNamer::new(workflow, date);
    let file = namer.name(&sample, class, &data_type, &extension);

    if companions {
        for name in namer.bundle(&file) {
            println!("{}", name);
        }
    } else {
        println!("{}", file);
    }

    Ok(())
}
