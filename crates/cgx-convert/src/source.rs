//! Source object graph: the CGMES equipment, topology and state records the
//! converter reads.
//!
//! The graph is produced by an external parser. It derives `Deserialize` so a
//! pre-parsed graph can also be loaded from a JSON dump with [`CgmesModel::from_json_file`].
//! All references between records are by id; the converter resolves them
//! through the indices built in [`crate::context::Context`].

use std::{fs, path::Path};

use anyhow::{Context as _, Result};
use serde::{Deserialize, Serialize};

/// Anything with a source identity that a naming strategy can map.
pub trait Identified {
    fn id(&self) -> &str;

    /// Human-readable name, empty when the source has none
    fn name(&self) -> &str;
}

macro_rules! impl_identified {
    ($($type:ty),* $(,)?) => {
        $(
            impl Identified for $type {
                fn id(&self) -> &str {
                    &self.id
                }

                fn name(&self) -> &str {
                    &self.name
                }
            }
        )*
    };
}

fn default_true() -> bool {
    true
}

fn default_sequence_number() -> u32 {
    1
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Substation {
    pub id: String,
    #[serde(default)]
    pub name: String,
    /// Geographical region (sub-region in CGMES) id
    #[serde(default)]
    pub region: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VoltageLevel {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub substation: String,
    /// Nominal voltage in kV
    pub nominal_voltage: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TopologicalNode {
    pub id: String,
    #[serde(default)]
    pub name: String,
    /// Boundary nodes carry their boundary code here, e.g. `"X1234; FR-BE"`
    #[serde(default)]
    pub description: String,
    /// Voltage level containing the node, absent on boundary nodes
    #[serde(default)]
    pub container: Option<String>,
    #[serde(default)]
    pub from_boundary: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Terminal {
    pub id: String,
    /// Conducting equipment owning the terminal
    pub equipment: String,
    pub topological_node: String,
    #[serde(default = "default_true")]
    pub connected: bool,
    #[serde(default = "default_sequence_number")]
    pub sequence_number: u32,
}

/// AC line segment, series impedance in ohms and total shunt admittance in siemens.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LineSegment {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub r: f64,
    pub x: f64,
    #[serde(default)]
    pub gch: f64,
    #[serde(default)]
    pub bch: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransformerEnd {
    pub id: String,
    pub terminal: String,
    /// 1 for the primary winding
    pub end_number: u32,
    /// Rated voltage in kV
    pub rated_u: f64,
    #[serde(default)]
    pub r: f64,
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub g: f64,
    #[serde(default)]
    pub b: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PowerTransformer {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub ends: Vec<TransformerEnd>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RatioTapChanger {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub transformer_end: String,
    pub low_step: i32,
    pub high_step: i32,
    pub neutral_step: i32,
    pub normal_step: i32,
    /// Voltage change per step in percent of the rated voltage
    pub step_voltage_increment: f64,
    #[serde(default)]
    pub regulating_control: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseTapChangerKind {
    #[default]
    Asymmetrical,
    Symmetrical,
    Linear,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PhaseTapChanger {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub transformer_end: String,
    #[serde(default)]
    pub kind: PhaseTapChangerKind,
    pub low_step: i32,
    pub high_step: i32,
    pub neutral_step: i32,
    pub normal_step: i32,
    /// In-phase voltage change per step, percent
    #[serde(default)]
    pub step_voltage_increment: Option<f64>,
    /// Out-of-phase voltage change per step, kV
    #[serde(default)]
    pub voltage_step_increment_out_of_phase: Option<f64>,
    /// Phase shift per step, degrees
    #[serde(default)]
    pub step_phase_shift_increment: Option<f64>,
    /// Angle between the in-phase and out-of-phase windings, degrees
    #[serde(default)]
    pub winding_connection_angle: Option<f64>,
    /// Voltage at the neutral step, kV
    #[serde(default)]
    pub neutral_u: Option<f64>,
    #[serde(default)]
    pub x_step_min: Option<f64>,
    #[serde(default)]
    pub x_step_max: Option<f64>,
    #[serde(default)]
    pub regulating_control: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnergyConsumer {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

/// Linear shunt compensator, admittance per section in siemens.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShuntCompensator {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub b_per_section: f64,
    #[serde(default)]
    pub g_per_section: f64,
    pub maximum_sections: i32,
    pub sections: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SynchronousMachine {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub min_q: Option<f64>,
    #[serde(default)]
    pub max_q: Option<f64>,
    #[serde(default)]
    pub min_p: Option<f64>,
    #[serde(default)]
    pub max_p: Option<f64>,
    #[serde(default)]
    pub reactive_capability_curve: Option<String>,
    #[serde(default)]
    pub regulating_control: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwitchKind {
    Breaker,
    Disconnector,
    LoadBreakSwitch,
    #[default]
    Switch,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Switch {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub kind: SwitchKind,
    #[serde(default)]
    pub open: bool,
}

/// Conducting equipment of a kind the converter does not map.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OtherEquipment {
    pub id: String,
    #[serde(default)]
    pub name: String,
    /// CIM class name, e.g. `EquivalentInjection`
    pub kind: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RegulatingControlMode {
    Voltage,
    ReactivePower,
    CurrentFlow,
    ActivePower,
    Fixed,
    #[serde(other)]
    Unknown,
}

impl RegulatingControlMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RegulatingControlMode::Voltage => "voltage",
            RegulatingControlMode::ReactivePower => "reactivePower",
            RegulatingControlMode::CurrentFlow => "currentFlow",
            RegulatingControlMode::ActivePower => "activePower",
            RegulatingControlMode::Fixed => "fixed",
            RegulatingControlMode::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegulatingControl {
    pub id: String,
    pub mode: RegulatingControlMode,
    /// Terminal where the controlled quantity is measured
    pub terminal: String,
    pub target_value: f64,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub target_deadband: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurvePoint {
    pub p: f64,
    pub min_q: f64,
    pub max_q: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReactiveCapabilityCurve {
    pub id: String,
    #[serde(default)]
    pub points: Vec<CurvePoint>,
}

/// Current limit on one terminal; `acceptable_duration` absent for the permanent limit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentLimit {
    pub id: String,
    pub terminal: String,
    /// Amperes
    pub value: f64,
    /// Seconds
    #[serde(default)]
    pub acceptable_duration: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoltageLimitKind {
    Low,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoltageLimit {
    pub id: String,
    pub voltage_level: String,
    pub kind: VoltageLimitKind,
    /// kV
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SvVoltage {
    pub topological_node: String,
    /// kV
    pub v: f64,
    /// Degrees
    pub angle: f64,
}

/// Power flowing into the equipment at a terminal (load sign convention).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SvPowerFlow {
    pub terminal: String,
    pub p: f64,
    pub q: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SvTapStep {
    pub tap_changer: String,
    pub position: i32,
}

/// The whole source graph handed to the converter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CgmesModel {
    pub regions: Vec<Region>,
    pub substations: Vec<Substation>,
    pub voltage_levels: Vec<VoltageLevel>,
    pub topological_nodes: Vec<TopologicalNode>,
    pub terminals: Vec<Terminal>,
    pub line_segments: Vec<LineSegment>,
    pub power_transformers: Vec<PowerTransformer>,
    pub ratio_tap_changers: Vec<RatioTapChanger>,
    pub phase_tap_changers: Vec<PhaseTapChanger>,
    pub loads: Vec<EnergyConsumer>,
    pub shunts: Vec<ShuntCompensator>,
    pub machines: Vec<SynchronousMachine>,
    pub switches: Vec<Switch>,
    pub other_equipment: Vec<OtherEquipment>,
    pub regulating_controls: Vec<RegulatingControl>,
    pub reactive_capability_curves: Vec<ReactiveCapabilityCurve>,
    pub current_limits: Vec<CurrentLimit>,
    pub voltage_limits: Vec<VoltageLimit>,
    pub sv_voltages: Vec<SvVoltage>,
    pub sv_power_flows: Vec<SvPowerFlow>,
    pub sv_tap_steps: Vec<SvTapStep>,
}

impl CgmesModel {
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("parsing CGMES model JSON")
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path)
            .with_context(|| format!("reading CGMES model {}", path.display()))?;
        Self::from_json_str(&json).with_context(|| format!("loading {}", path.display()))
    }
}

impl_identified!(
    Region,
    Substation,
    VoltageLevel,
    TopologicalNode,
    LineSegment,
    PowerTransformer,
    EnergyConsumer,
    ShuntCompensator,
    SynchronousMachine,
    Switch,
    OtherEquipment,
    RatioTapChanger,
    PhaseTapChanger,
);
