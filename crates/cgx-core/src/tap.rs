//! Tap changer step tables and regulation settings.
//!
//! A [`TapTable`] is the synthesized per-step view of a tap changer: for every
//! position between the low and high step it stores the ratio (`rho`), the
//! phase shift (`alpha`) and the percentage deviations of the series impedance
//! and shunt admittance relative to the transformer's own values.

use serde::Serialize;

use crate::units::{Degrees, Kilovolts};
use crate::TerminalRef;

/// One position of a tap changer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TapStep {
    pub rho: f64,
    pub alpha: Degrees,
    /// Resistance deviation in percent of the transformer R
    pub r: f64,
    /// Reactance deviation in percent of the transformer X
    pub x: f64,
    /// Conductance deviation in percent of the transformer G
    pub g: f64,
    /// Susceptance deviation in percent of the transformer B
    pub b: f64,
}

impl Default for TapStep {
    fn default() -> Self {
        Self {
            rho: 1.0,
            alpha: Degrees::ZERO,
            r: 0.0,
            x: 0.0,
            g: 0.0,
            b: 0.0,
        }
    }
}

/// Steps indexed from `low_step` to `low_step + len - 1`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TapTable {
    low_step: i32,
    steps: Vec<TapStep>,
}

impl TapTable {
    pub fn new(low_step: i32, steps: Vec<TapStep>) -> Self {
        Self { low_step, steps }
    }

    pub fn low_step(&self) -> i32 {
        self.low_step
    }

    pub fn high_step(&self) -> i32 {
        self.low_step + self.steps.len() as i32 - 1
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn contains(&self, position: i32) -> bool {
        position >= self.low_step && position <= self.high_step()
    }

    /// Step at an absolute tap position
    pub fn step(&self, position: i32) -> Option<&TapStep> {
        if !self.contains(position) {
            return None;
        }
        self.steps.get((position - self.low_step) as usize)
    }

    pub fn steps(&self) -> &[TapStep] {
        &self.steps
    }
}

/// Where a regulating device measures its controlled quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RegulatedTerminal {
    /// A specific end of a network element
    Terminal(TerminalRef),
    /// A bus, used when the measured terminal has no element end of its own
    Bus { id: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RatioTapChanger {
    pub id: String,
    pub table: TapTable,
    pub neutral_step: i32,
    pub tap_position: i32,
    pub load_tap_changing_capabilities: bool,
    pub regulating: bool,
    /// NaN when the changer does not regulate voltage
    pub target_v: Kilovolts,
    pub target_deadband: f64,
    pub regulated_terminal: Option<RegulatedTerminal>,
}

impl RatioTapChanger {
    pub fn current_step(&self) -> Option<&TapStep> {
        self.table.step(self.tap_position)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseRegulationMode {
    FixedTap,
    CurrentLimiter,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PhaseTapChanger {
    pub id: String,
    pub table: TapTable,
    pub neutral_step: i32,
    pub tap_position: i32,
    pub regulation_mode: PhaseRegulationMode,
    /// Current limit in A when regulating as a current limiter, NaN otherwise
    pub regulation_value: f64,
    pub regulating: bool,
    pub target_deadband: f64,
    pub regulated_terminal: Option<RegulatedTerminal>,
}

impl PhaseTapChanger {
    pub fn current_step(&self) -> Option<&TapStep> {
        self.table.step(self.tap_position)
    }
}
