//! # cgx-convert: CGMES to network model conversion
//!
//! Turns a parsed CGMES object graph ([`CgmesModel`]) into a
//! [`cgx_core::Network`], applying the modelling decisions a bus-branch
//! network needs:
//!
//! - boundary nodes become dangling lines or tie lines
//! - substations joined by transformers are merged
//! - transformer windings are referred to one side, with tap changer step
//!   tables built from the CGMES step parameters
//! - state variables (voltages, flows, tap positions) are overlaid last
//!
//! Recoverable oddities are collected as warnings in
//! [`cgx_core::ConversionDiagnostics`]; structural faults abort with a
//! [`cgx_core::ConversionError`].
//!
//! ## Quick Start
//!
//! ```no_run
//! use cgx_convert::{CgmesModel, ConversionConfig, NetworkAssembler};
//! use std::path::Path;
//!
//! # fn main() -> anyhow::Result<()> {
//! let model = CgmesModel::from_json_file(Path::new("grid.json"))?;
//! let config = ConversionConfig::default();
//! let conversion = NetworkAssembler::new(&config)?.convert(&model)?;
//!
//! println!("{}", conversion.network.stats());
//! for warning in &conversion.diagnostics.warnings {
//!     println!("{warning}");
//! }
//! # Ok(())
//! # }
//! ```

pub mod assembler;
pub mod config;
pub mod context;
pub mod equipment;
pub mod naming;
pub mod reactive;
pub mod registry;
pub mod source;
pub mod substations;
pub mod tap_changer;
pub mod topology;

pub use assembler::{Conversion, NetworkAssembler};
pub use config::{ConfigError, ConversionConfig, NamingStrategyConfig};
pub use naming::{IdentityNamingStrategy, MappingNamingStrategy, NamingStrategy};
pub use source::CgmesModel;
pub use topology::{Classification, NodeClassification};

/// Convert a model with the given configuration.
pub fn convert(model: &CgmesModel, config: &ConversionConfig) -> anyhow::Result<Conversion> {
    let assembler = NetworkAssembler::new(config)?;
    Ok(assembler.convert(model)?)
}
