use std::{fs, path::Path};

use anyhow::{bail, Context, Result};
use cgx_cli::cli::ReportFormat;
use cgx_convert::{CgmesModel, ConversionConfig, NetworkAssembler};
use cgx_core::bus_islands;
use serde_json::json;
use tracing::info;

pub fn load_config(path: Option<&Path>) -> Result<ConversionConfig> {
    match path {
        Some(path) => ConversionConfig::load(path)
            .with_context(|| format!("loading conversion config {}", path.display())),
        None => Ok(ConversionConfig::default()),
    }
}

pub fn handle(
    model_path: &Path,
    config_path: Option<&Path>,
    output: Option<&Path>,
    format: ReportFormat,
    strict: bool,
) -> Result<()> {
    let config = load_config(config_path)?;
    let model = CgmesModel::from_json_file(model_path)?;
    let conversion = NetworkAssembler::new(&config)?
        .convert(&model)
        .with_context(|| format!("converting {}", model_path.display()))?;

    let stats = conversion.network.stats();
    let islands = bus_islands(&conversion.network).len();
    info!(model = %model_path.display(), %stats, islands, "conversion finished");

    if let Some(output) = output {
        let json = serde_json::to_string_pretty(&conversion)?;
        fs::write(output, json)
            .with_context(|| format!("writing network to {}", output.display()))?;
        info!(output = %output.display(), "network written");
    }

    match format {
        ReportFormat::Text => {
            println!("Converted {}:", model_path.display());
            println!("  {stats}");
            println!("  Islands       : {islands}");
            print!("{}", conversion.diagnostics);
        }
        ReportFormat::Json => {
            let report = json!({
                "model": model_path.display().to_string(),
                "stats": stats,
                "islands": islands,
                "warnings": conversion.diagnostics.warnings,
            });
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    if strict && conversion.diagnostics.has_warnings() {
        bail!(
            "conversion produced {} with --strict",
            conversion.diagnostics.summary()
        );
    }
    Ok(())
}

pub fn print_default_config() -> Result<()> {
    let text = toml::to_string_pretty(&ConversionConfig::default())
        .context("serializing default conversion config")?;
    print!("{text}");
    Ok(())
}
