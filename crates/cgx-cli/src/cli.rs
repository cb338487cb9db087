use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about = "Convert CGMES models into bus-branch networks", long_about = None)]
pub struct Cli {
    /// Set the logging level
    #[arg(long, default_value = "warn")]
    pub log_level: tracing::Level,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Convert a CGMES model (JSON dump of the parsed object graph)
    Convert {
        /// Path to the model JSON
        model: PathBuf,
        /// Conversion settings (TOML)
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Write the converted network and warnings as JSON to this file
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Report format on stdout
        #[arg(long, value_enum, default_value_t = ReportFormat::Text)]
        format: ReportFormat,
        /// Fail when the conversion produced any warning
        #[arg(long)]
        strict: bool,
    },
    /// Show how boundary nodes would be classified, without converting
    Classify {
        /// Path to the model JSON
        model: PathBuf,
    },
    /// Print the default conversion settings as TOML
    DefaultConfig,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Text,
    Json,
}
