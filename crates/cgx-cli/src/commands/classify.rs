use std::path::Path;

use anyhow::{Context, Result};
use cgx_convert::{CgmesModel, ConversionConfig, NetworkAssembler, NodeClassification};

pub fn handle(model_path: &Path) -> Result<()> {
    let model = CgmesModel::from_json_file(model_path)?;
    let config = ConversionConfig::default();
    let (classification, diagnostics) = NetworkAssembler::new(&config)?
        .classify(&model)
        .with_context(|| format!("classifying {}", model_path.display()))?;

    println!(
        "Boundary nodes in {}: {} dangling, {} merged",
        model_path.display(),
        classification.boundary_count(),
        classification.merged_count()
    );
    for (node, class) in classification.iter() {
        match class {
            NodeClassification::Ordinary => {}
            NodeClassification::Boundary { load: None } => {
                println!("  {node:<20} boundary");
            }
            NodeClassification::Boundary { load: Some(load) } => {
                println!(
                    "  {node:<20} boundary, load {} (P={} Q={})",
                    load.load, load.p, load.q
                );
            }
            NodeClassification::Merged { first, second } => {
                println!("  {node:<20} tie line {first} + {second}");
            }
        }
    }
    if diagnostics.has_warnings() {
        print!("{diagnostics}");
    }
    Ok(())
}
