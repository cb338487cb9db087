//! Recoverable conversion warnings.
//!
//! Whenever the converter substitutes a value or drops a piece of data it
//! records a [`ConversionWarning`] instead of failing. Each warning carries a
//! [`WarningCategory`] and the ids of the affected objects so callers (and
//! tests) can assert exactly which substitution happened where.
//!
//! # Example
//!
//! ```
//! use cgx_core::diagnostics::{ConversionDiagnostics, WarningCategory};
//!
//! let mut diag = ConversionDiagnostics::new();
//! diag.add_warning(
//!     WarningCategory::MissingPowerFlow,
//!     ["LOAD_1"],
//!     "no power flow record, P0/Q0 set to 0",
//! );
//!
//! assert_eq!(diag.warning_count(), 1);
//! assert!(diag.contains(WarningCategory::MissingPowerFlow, "LOAD_1"));
//! ```

use serde::Serialize;

/// What kind of substitution or data fix a warning reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningCategory {
    /// Merged boundary node had a non-zero injection that the tie line cannot carry.
    BoundaryInjectionIgnored,
    /// Substations joined by a transformer were collapsed onto one canonical id.
    SubstationsMerged,
    /// Region name did not resolve to a country; the configured default was used.
    UnresolvedCountry,
    /// Equipment terminal had no power flow record; zero was assumed.
    MissingPowerFlow,
    /// Bus had no voltage record; voltage and angle left unset.
    MissingVoltage,
    /// Voltage-regulating machine had a zero target; nominal voltage was used.
    ZeroTargetVoltage,
    /// Machine without a regulating control; set points taken from measured flow.
    MissingRegulatingControl,
    /// Shunt section count was negative and has been sign-corrected.
    NegativeSectionCount,
    /// Shunt susceptance per section was zero and was replaced by the smallest positive value.
    ZeroSusceptancePerSection,
    /// Reactive capability curve repeated a P value; the duplicate was dropped.
    DuplicateCurvePoint,
    /// Reactive capability curve contained the P = -9999 placeholder point.
    CurveSentinelPoint,
    /// Phase tap changer xStepMin/xStepMax were unusable; the transformer X applies to every step.
    InconsistentXStepRange,
    /// Tap changer could not be represented and was dropped.
    DroppedTapChanger,
    /// Voltage-regulating ratio tap changer with a non-positive target; regulation disabled.
    NonPositiveTargetVoltage,
    /// Regulating control mode not supported for this equipment.
    UnsupportedRegulationMode,
    /// Phase tap changer without winding connection angle; 90 degrees assumed.
    DefaultConnectionAngle,
    /// Phase tap changer without any voltage step increment; 1 % assumed.
    DefaultStepIncrement,
    /// Switch between two voltage levels replaced by a low-impedance line.
    SwitchReplacedByLine,
    /// Operational limit attached to a terminal that did not produce a network element end.
    UnmappedLimit,
}

impl WarningCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            WarningCategory::BoundaryInjectionIgnored => "boundary_injection_ignored",
            WarningCategory::SubstationsMerged => "substations_merged",
            WarningCategory::UnresolvedCountry => "unresolved_country",
            WarningCategory::MissingPowerFlow => "missing_power_flow",
            WarningCategory::MissingVoltage => "missing_voltage",
            WarningCategory::ZeroTargetVoltage => "zero_target_voltage",
            WarningCategory::MissingRegulatingControl => "missing_regulating_control",
            WarningCategory::NegativeSectionCount => "negative_section_count",
            WarningCategory::ZeroSusceptancePerSection => "zero_susceptance_per_section",
            WarningCategory::DuplicateCurvePoint => "duplicate_curve_point",
            WarningCategory::CurveSentinelPoint => "curve_sentinel_point",
            WarningCategory::InconsistentXStepRange => "inconsistent_x_step_range",
            WarningCategory::DroppedTapChanger => "dropped_tap_changer",
            WarningCategory::NonPositiveTargetVoltage => "non_positive_target_voltage",
            WarningCategory::UnsupportedRegulationMode => "unsupported_regulation_mode",
            WarningCategory::DefaultConnectionAngle => "default_connection_angle",
            WarningCategory::DefaultStepIncrement => "default_step_increment",
            WarningCategory::SwitchReplacedByLine => "switch_replaced_by_line",
            WarningCategory::UnmappedLimit => "unmapped_limit",
        }
    }
}

impl std::fmt::Display for WarningCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single recoverable issue recorded during conversion
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversionWarning {
    pub category: WarningCategory,
    /// Source or network ids of the affected objects
    pub ids: Vec<String>,
    /// Human-readable description
    pub message: String,
}

impl std::fmt::Display for ConversionWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.category, self.message)?;
        if !self.ids.is_empty() {
            write!(f, " ({})", self.ids.join(", "))?;
        }
        Ok(())
    }
}

/// Ordered list of warnings produced by one conversion run.
///
/// Warnings are appended in pipeline order, and every pipeline step iterates
/// its inputs sorted by id, so the list is deterministic for a given source.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ConversionDiagnostics {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<ConversionWarning>,
}

impl ConversionDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a warning against a set of ids
    pub fn add_warning<I, S>(&mut self, category: WarningCategory, ids: I, message: &str)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.warnings.push(ConversionWarning {
            category,
            ids: ids.into_iter().map(Into::into).collect(),
            message: message.to_string(),
        });
    }

    pub fn warning_count(&self) -> usize {
        self.warnings.len()
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Warnings of one category, in recording order
    pub fn warnings_in(
        &self,
        category: WarningCategory,
    ) -> impl Iterator<Item = &ConversionWarning> {
        self.warnings.iter().filter(move |w| w.category == category)
    }

    /// True if a warning of `category` names `id`
    pub fn contains(&self, category: WarningCategory, id: &str) -> bool {
        self.warnings_in(category)
            .any(|w| w.ids.iter().any(|candidate| candidate == id))
    }

    /// All ids reported under `category`, flattened in recording order
    pub fn ids_in(&self, category: WarningCategory) -> Vec<&str> {
        self.warnings_in(category)
            .flat_map(|w| w.ids.iter().map(String::as_str))
            .collect()
    }

    pub fn merge(&mut self, other: ConversionDiagnostics) {
        self.warnings.extend(other.warnings);
    }

    pub fn summary(&self) -> String {
        match self.warning_count() {
            0 => "No issues".to_string(),
            w => format!("{} warning{}", w, if w == 1 { "" } else { "s" }),
        }
    }
}

impl std::fmt::Display for ConversionDiagnostics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Diagnostics: {}", self.summary())?;
        for warning in &self.warnings {
            writeln!(f, "  {}", warning)?;
        }
        Ok(())
    }
}
