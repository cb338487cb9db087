//! Conversion options.
//!
//! Options are read from TOML. Every field has a default, so an empty file
//! (or no file at all) gives the same behaviour as [`ConversionConfig::default`].
//!
//! ```toml
//! invert_voltage_step_increment_out_of_phase = false
//! default_country = "FR"
//! substation_id_excluded_from_mapping = ["^_ANON_.*"]
//!
//! [naming_strategy]
//! kind = "mapping"
//! ids = { "_TN_001" = "BUS_1" }
//! ```

use std::{collections::BTreeMap, fs, path::Path, path::PathBuf};

use cgx_core::Country;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::naming::{IdentityNamingStrategy, MappingNamingStrategy, NamingStrategy};

/// Errors raised while loading or compiling a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read configuration {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid substation exclusion pattern {pattern:?}: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// Which naming strategy to build for a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NamingStrategyConfig {
    /// Network ids equal source ids
    #[default]
    Identity,
    /// Explicit source id to network id table; unmapped ids pass through
    Mapping { ids: BTreeMap<String, String> },
}

impl NamingStrategyConfig {
    pub fn build(&self) -> Box<dyn NamingStrategy> {
        match self {
            NamingStrategyConfig::Identity => Box::new(IdentityNamingStrategy),
            NamingStrategyConfig::Mapping { ids } => {
                Box::new(MappingNamingStrategy::new(ids.clone()))
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversionConfig {
    /// Negate the phase tap changer voltage increment on the du-based paths.
    pub invert_voltage_step_increment_out_of_phase: bool,

    /// Country for substations whose region does not resolve.
    pub default_country: Option<Country>,

    /// Regexes; matching substation ids never win the canonical-id tie-break.
    pub substation_id_excluded_from_mapping: Vec<String>,

    pub naming_strategy: NamingStrategyConfig,
}

impl ConversionConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: ConversionConfig = toml::from_str(text)?;
        config.exclusion_patterns()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Compile the substation exclusion patterns.
    pub fn exclusion_patterns(&self) -> Result<Vec<Regex>, ConfigError> {
        self.substation_id_excluded_from_mapping
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|source| ConfigError::InvalidPattern {
                    pattern: pattern.clone(),
                    source,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_toml_gives_defaults() {
        let config = ConversionConfig::from_toml_str("").unwrap();
        assert_eq!(config, ConversionConfig::default());
        assert!(config.exclusion_patterns().unwrap().is_empty());
    }

    #[test]
    fn parses_every_option() {
        let config = ConversionConfig::from_toml_str(
            r#"
            invert_voltage_step_increment_out_of_phase = true
            default_country = "BE"
            substation_id_excluded_from_mapping = ["^S_A$", "FICT"]

            [naming_strategy]
            kind = "mapping"
            ids = { "_TN1" = "BUS1" }
            "#,
        )
        .unwrap();

        assert!(config.invert_voltage_step_increment_out_of_phase);
        assert_eq!(config.default_country, Some(Country::Be));
        assert_eq!(config.exclusion_patterns().unwrap().len(), 2);
        match &config.naming_strategy {
            NamingStrategyConfig::Mapping { ids } => assert_eq!(ids["_TN1"], "BUS1"),
            other => panic!("unexpected naming strategy {other:?}"),
        }
    }

    #[test]
    fn invalid_regex_is_rejected() {
        let err = ConversionConfig::from_toml_str(r#"substation_id_excluded_from_mapping = ["("]"#)
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPattern { .. }));
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "default_country = \"FR\"").unwrap();

        let config = ConversionConfig::load(file.path()).unwrap();
        assert_eq!(config.default_country, Some(Country::Fr));
    }

    #[test]
    fn missing_file_reports_path() {
        let err = ConversionConfig::load(Path::new("/nonexistent/cgx.toml")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/cgx.toml"));
    }
}
