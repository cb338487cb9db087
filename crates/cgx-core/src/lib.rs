//! # cgx-core: Converted Network Model
//!
//! Data structures for the network produced by converting a CGMES object graph,
//! plus the diagnostics and error types shared by every conversion step.
//!
//! ## Design Philosophy
//!
//! The model is a bus-branch network organized in a substation hierarchy:
//! - **Containers**: [`Substation`] → [`VoltageLevel`] → [`Bus`]
//! - **Branches**: [`Line`], [`TieLine`], [`TwoWindingsTransformer`], [`ThreeWindingsTransformer`]
//! - **Injections**: [`Load`], [`Generator`], [`ShuntCompensator`], [`DanglingLine`]
//! - **Topology**: [`Switch`] inside a voltage level
//!
//! Every element end is a [`TerminalConnection`] carrying the voltage level and
//! bus it attaches to plus the measured P/Q written by the state overlay.
//! Collections are `BTreeMap`s keyed by network id, so iteration is always in
//! id order and two conversions of the same source compare equal.
//!
//! ## Quick Start
//!
//! ```rust
//! use cgx_core::*;
//!
//! let mut network = Network::new();
//! network.substations.insert(
//!     "S1".into(),
//!     Substation::new("S1", "Substation 1", Some(Country::Fr)),
//! );
//! network.voltage_levels.insert(
//!     "VL1".into(),
//!     VoltageLevel::new("VL1", "400 kV", "S1", Kilovolts(400.0)),
//! );
//! network.buses.insert("B1".into(), Bus::new("B1", "Bus 1", "VL1"));
//! network.buses.insert("B2".into(), Bus::new("B2", "Bus 2", "VL1"));
//! network.lines.insert(
//!     "L1".into(),
//!     Line {
//!         id: "L1".into(),
//!         name: "Line 1".into(),
//!         end1: TerminalConnection::new("VL1", "B1", true),
//!         end2: TerminalConnection::new("VL1", "B2", true),
//!         r: 1.0,
//!         x: 10.0,
//!         ..Line::default()
//!     },
//! );
//!
//! assert_eq!(network.stats().lines, 1);
//! assert!(network.validate_structure().is_empty());
//! ```
//!
//! ## Modules
//!
//! - [`diagnostics`] - Recoverable warnings by category and affected ids
//! - [`error`] - Fatal [`ConversionError`]
//! - [`tap`] - Tap changer step tables and regulation
//! - [`graph_utils`] - Connected components over string ids
//! - [`units`] - Unit newtypes
//! - [`country`] - Region name to country lookup

use std::collections::BTreeMap;

use serde::Serialize;

pub mod country;
pub mod diagnostics;
pub mod error;
pub mod graph_utils;
pub mod tap;
pub mod units;

pub use country::Country;
pub use diagnostics::{ConversionDiagnostics, ConversionWarning, WarningCategory};
pub use error::{ConversionError, ConversionResult};
pub use graph_utils::{bus_islands, connected_components};
pub use tap::{
    PhaseRegulationMode, PhaseTapChanger, RatioTapChanger, RegulatedTerminal, TapStep, TapTable,
};
pub use units::{Amperes, Degrees, Kilovolts, Megavars, Megawatts, Radians};

/// Which end of a branch a terminal belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Side {
    One,
    Two,
    Three,
}

impl Side {
    /// Side from a 1-based end number
    pub fn from_number(number: usize) -> Option<Side> {
        match number {
            1 => Some(Side::One),
            2 => Some(Side::Two),
            3 => Some(Side::Three),
            _ => None,
        }
    }
}

/// Reference to one end of a network element.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct TerminalRef {
    pub element: String,
    pub side: Side,
}

impl TerminalRef {
    pub fn new(element: impl Into<String>, side: Side) -> Self {
        Self {
            element: element.into(),
            side,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TemporaryLimit {
    pub acceptable_duration_s: u32,
    pub value: Amperes,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CurrentLimits {
    pub permanent: Option<Amperes>,
    /// Sorted by decreasing acceptable duration
    pub temporary: Vec<TemporaryLimit>,
}

/// Connection of one element end to the bus-branch topology.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TerminalConnection {
    pub voltage_level: String,
    pub bus: String,
    pub connected: bool,
    /// Measured active power flowing into the element at this end
    pub p: Option<Megawatts>,
    /// Measured reactive power flowing into the element at this end
    pub q: Option<Megavars>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_limits: Option<CurrentLimits>,
}

impl TerminalConnection {
    pub fn new(voltage_level: impl Into<String>, bus: impl Into<String>, connected: bool) -> Self {
        Self {
            voltage_level: voltage_level.into(),
            bus: bus.into(),
            connected,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Substation {
    pub id: String,
    pub name: String,
    pub country: Option<Country>,
    /// Source substations collapsed onto this one
    pub merged: Vec<String>,
}

impl Substation {
    pub fn new(id: impl Into<String>, name: impl Into<String>, country: Option<Country>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            country,
            merged: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VoltageLevel {
    pub id: String,
    pub name: String,
    pub substation: String,
    pub nominal_v: Kilovolts,
    pub low_voltage_limit: Option<Kilovolts>,
    pub high_voltage_limit: Option<Kilovolts>,
}

impl VoltageLevel {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        substation: impl Into<String>,
        nominal_v: Kilovolts,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            substation: substation.into(),
            nominal_v,
            low_voltage_limit: None,
            high_voltage_limit: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bus {
    pub id: String,
    pub name: String,
    pub voltage_level: String,
    /// Voltage magnitude from the state overlay
    pub v: Option<Kilovolts>,
    /// Voltage angle from the state overlay
    pub angle: Option<Degrees>,
}

impl Bus {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        voltage_level: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            voltage_level: voltage_level.into(),
            v: None,
            angle: None,
        }
    }
}

/// Two-terminal AC line, series impedance in ohms and shunt admittance in siemens.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Line {
    pub id: String,
    pub name: String,
    pub end1: TerminalConnection,
    pub end2: TerminalConnection,
    pub r: f64,
    pub x: f64,
    pub g1: f64,
    pub g2: f64,
    pub b1: f64,
    pub b2: f64,
    /// Set for lines synthesized in place of a switch
    pub fictitious: bool,
}

/// Line whose far end is a boundary node, carrying the boundary injection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DanglingLine {
    pub id: String,
    pub name: String,
    pub end: TerminalConnection,
    pub r: f64,
    pub x: f64,
    pub g: f64,
    pub b: f64,
    pub p0: Megawatts,
    pub q0: Megavars,
    pub ucte_xnode_code: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TieLineHalf {
    pub id: String,
    pub name: String,
    pub r: f64,
    pub x: f64,
    pub g1: f64,
    pub g2: f64,
    pub b1: f64,
    pub b2: f64,
}

/// Two line segments joined at a boundary node.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TieLine {
    pub id: String,
    pub name: String,
    pub end1: TerminalConnection,
    pub end2: TerminalConnection,
    pub half1: TieLineHalf,
    pub half2: TieLineHalf,
    pub ucte_xnode_code: Option<String>,
}

impl TieLine {
    /// Series resistance of both halves
    pub fn r(&self) -> f64 {
        self.half1.r + self.half2.r
    }

    /// Series reactance of both halves
    pub fn x(&self) -> f64 {
        self.half1.x + self.half2.x
    }
}

/// Two-winding transformer, impedance referred to the secondary (side 2) rated voltage.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TwoWindingsTransformer {
    pub id: String,
    pub name: String,
    pub substation: String,
    pub end1: TerminalConnection,
    pub end2: TerminalConnection,
    pub r: f64,
    pub x: f64,
    pub g: f64,
    pub b: f64,
    pub rated_u1: Kilovolts,
    pub rated_u2: Kilovolts,
    pub ratio_tap_changer: Option<RatioTapChanger>,
    pub phase_tap_changer: Option<PhaseTapChanger>,
}

/// One winding of a three-winding transformer, seen from the star point.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Leg {
    pub end: TerminalConnection,
    pub r: f64,
    pub x: f64,
    pub g: f64,
    pub b: f64,
    pub rated_u: Kilovolts,
    pub ratio_tap_changer: Option<RatioTapChanger>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThreeWindingsTransformer {
    pub id: String,
    pub name: String,
    pub substation: String,
    /// Rated voltage at the star point
    pub rated_u0: Kilovolts,
    /// Highest rated voltage
    pub leg1: Leg,
    pub leg2: Leg,
    /// Lowest rated voltage
    pub leg3: Leg,
}

impl ThreeWindingsTransformer {
    pub fn leg(&self, side: Side) -> &Leg {
        match side {
            Side::One => &self.leg1,
            Side::Two => &self.leg2,
            Side::Three => &self.leg3,
        }
    }

    pub fn leg_mut(&mut self, side: Side) -> &mut Leg {
        match side {
            Side::One => &mut self.leg1,
            Side::Two => &mut self.leg2,
            Side::Three => &mut self.leg3,
        }
    }
}

/// Linear shunt compensator, susceptance and conductance per section in siemens.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShuntCompensator {
    pub id: String,
    pub name: String,
    pub end: TerminalConnection,
    pub b_per_section: f64,
    pub g_per_section: f64,
    pub section_count: u32,
    pub maximum_section_count: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LoadType {
    Undefined,
    Fictitious,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Load {
    pub id: String,
    pub name: String,
    pub end: TerminalConnection,
    pub load_type: LoadType,
    pub p0: Megawatts,
    pub q0: Megavars,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ReactiveCurvePoint {
    pub p: Megawatts,
    pub min_q: Megavars,
    pub max_q: Megavars,
}

/// Reactive power capability of a generator.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReactiveLimits {
    MinMax { min_q: Megavars, max_q: Megavars },
    /// At least two points with distinct P, sorted by P
    Curve { points: Vec<ReactiveCurvePoint> },
}

impl ReactiveLimits {
    pub fn unbounded() -> Self {
        ReactiveLimits::MinMax {
            min_q: Megavars(-f64::MAX),
            max_q: Megavars(f64::MAX),
        }
    }
}

/// Generator in generation sign convention (positive target P injects into the bus).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Generator {
    pub id: String,
    pub name: String,
    pub end: TerminalConnection,
    pub min_p: Megawatts,
    pub max_p: Megawatts,
    pub target_p: Megawatts,
    pub target_q: Megavars,
    pub target_v: Option<Kilovolts>,
    pub voltage_regulator_on: bool,
    pub regulated_terminal: Option<RegulatedTerminal>,
    pub reactive_limits: ReactiveLimits,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SwitchKind {
    Breaker,
    Disconnector,
    LoadBreakSwitch,
    Switch,
}

/// Switch between two buses of the same voltage level.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Switch {
    pub id: String,
    pub name: String,
    pub kind: SwitchKind,
    pub voltage_level: String,
    pub bus1: String,
    pub bus2: String,
    pub open: bool,
}

/// Element counts, used for summaries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NetworkStats {
    pub substations: usize,
    pub voltage_levels: usize,
    pub buses: usize,
    pub lines: usize,
    pub dangling_lines: usize,
    pub tie_lines: usize,
    pub two_winding_transformers: usize,
    pub three_winding_transformers: usize,
    pub shunts: usize,
    pub loads: usize,
    pub generators: usize,
    pub switches: usize,
}

impl std::fmt::Display for NetworkStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} substations, {} voltage levels, {} buses, {} lines, {} dangling lines, \
             {} tie lines, {} 2W / {} 3W transformers, {} shunts, {} loads, {} generators, {} switches",
            self.substations,
            self.voltage_levels,
            self.buses,
            self.lines,
            self.dangling_lines,
            self.tie_lines,
            self.two_winding_transformers,
            self.three_winding_transformers,
            self.shunts,
            self.loads,
            self.generators,
            self.switches
        )
    }
}

/// Structural defect found by [`Network::validate_structure`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StructuralIssue {
    pub element: String,
    pub message: String,
}

impl std::fmt::Display for StructuralIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.element, self.message)
    }
}

/// The converted network
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Network {
    pub substations: BTreeMap<String, Substation>,
    pub voltage_levels: BTreeMap<String, VoltageLevel>,
    pub buses: BTreeMap<String, Bus>,
    pub lines: BTreeMap<String, Line>,
    pub dangling_lines: BTreeMap<String, DanglingLine>,
    pub tie_lines: BTreeMap<String, TieLine>,
    pub two_winding_transformers: BTreeMap<String, TwoWindingsTransformer>,
    pub three_winding_transformers: BTreeMap<String, ThreeWindingsTransformer>,
    pub shunts: BTreeMap<String, ShuntCompensator>,
    pub loads: BTreeMap<String, Load>,
    pub generators: BTreeMap<String, Generator>,
    pub switches: BTreeMap<String, Switch>,
}

impl Network {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stats(&self) -> NetworkStats {
        NetworkStats {
            substations: self.substations.len(),
            voltage_levels: self.voltage_levels.len(),
            buses: self.buses.len(),
            lines: self.lines.len(),
            dangling_lines: self.dangling_lines.len(),
            tie_lines: self.tie_lines.len(),
            two_winding_transformers: self.two_winding_transformers.len(),
            three_winding_transformers: self.three_winding_transformers.len(),
            shunts: self.shunts.len(),
            loads: self.loads.len(),
            generators: self.generators.len(),
            switches: self.switches.len(),
        }
    }

    /// Look up the connection of one element end.
    pub fn terminal(&self, terminal: &TerminalRef) -> Option<&TerminalConnection> {
        let id = terminal.element.as_str();
        match terminal.side {
            Side::One => {
                if let Some(line) = self.lines.get(id) {
                    return Some(&line.end1);
                }
                if let Some(tie) = self.tie_lines.get(id) {
                    return Some(&tie.end1);
                }
                if let Some(t2w) = self.two_winding_transformers.get(id) {
                    return Some(&t2w.end1);
                }
                if let Some(t3w) = self.three_winding_transformers.get(id) {
                    return Some(&t3w.leg1.end);
                }
                self.dangling_lines
                    .get(id)
                    .map(|dl| &dl.end)
                    .or_else(|| self.loads.get(id).map(|l| &l.end))
                    .or_else(|| self.generators.get(id).map(|g| &g.end))
                    .or_else(|| self.shunts.get(id).map(|s| &s.end))
            }
            Side::Two => self
                .lines
                .get(id)
                .map(|l| &l.end2)
                .or_else(|| self.tie_lines.get(id).map(|t| &t.end2))
                .or_else(|| self.two_winding_transformers.get(id).map(|t| &t.end2))
                .or_else(|| self.three_winding_transformers.get(id).map(|t| &t.leg2.end)),
            Side::Three => self
                .three_winding_transformers
                .get(id)
                .map(|t| &t.leg3.end),
        }
    }

    /// Mutable variant of [`Network::terminal`], used by state overlays.
    pub fn terminal_mut(&mut self, terminal: &TerminalRef) -> Option<&mut TerminalConnection> {
        let id = terminal.element.as_str();
        match terminal.side {
            Side::One => {
                if let Some(line) = self.lines.get_mut(id) {
                    return Some(&mut line.end1);
                }
                if let Some(tie) = self.tie_lines.get_mut(id) {
                    return Some(&mut tie.end1);
                }
                if let Some(t2w) = self.two_winding_transformers.get_mut(id) {
                    return Some(&mut t2w.end1);
                }
                if let Some(t3w) = self.three_winding_transformers.get_mut(id) {
                    return Some(&mut t3w.leg1.end);
                }
                if let Some(dl) = self.dangling_lines.get_mut(id) {
                    return Some(&mut dl.end);
                }
                if let Some(load) = self.loads.get_mut(id) {
                    return Some(&mut load.end);
                }
                if let Some(gen) = self.generators.get_mut(id) {
                    return Some(&mut gen.end);
                }
                self.shunts.get_mut(id).map(|s| &mut s.end)
            }
            Side::Two => {
                if let Some(line) = self.lines.get_mut(id) {
                    return Some(&mut line.end2);
                }
                if let Some(tie) = self.tie_lines.get_mut(id) {
                    return Some(&mut tie.end2);
                }
                if let Some(t2w) = self.two_winding_transformers.get_mut(id) {
                    return Some(&mut t2w.end2);
                }
                self.three_winding_transformers
                    .get_mut(id)
                    .map(|t| &mut t.leg2.end)
            }
            Side::Three => self
                .three_winding_transformers
                .get_mut(id)
                .map(|t| &mut t.leg3.end),
        }
    }

    /// Every element end, in element id order.
    pub fn connections(&self) -> Vec<(TerminalRef, &TerminalConnection)> {
        let mut ends = Vec::new();
        for (id, line) in &self.lines {
            ends.push((TerminalRef::new(id, Side::One), &line.end1));
            ends.push((TerminalRef::new(id, Side::Two), &line.end2));
        }
        for (id, tie) in &self.tie_lines {
            ends.push((TerminalRef::new(id, Side::One), &tie.end1));
            ends.push((TerminalRef::new(id, Side::Two), &tie.end2));
        }
        for (id, t2w) in &self.two_winding_transformers {
            ends.push((TerminalRef::new(id, Side::One), &t2w.end1));
            ends.push((TerminalRef::new(id, Side::Two), &t2w.end2));
        }
        for (id, t3w) in &self.three_winding_transformers {
            ends.push((TerminalRef::new(id, Side::One), &t3w.leg1.end));
            ends.push((TerminalRef::new(id, Side::Two), &t3w.leg2.end));
            ends.push((TerminalRef::new(id, Side::Three), &t3w.leg3.end));
        }
        for (id, dl) in &self.dangling_lines {
            ends.push((TerminalRef::new(id, Side::One), &dl.end));
        }
        for (id, load) in &self.loads {
            ends.push((TerminalRef::new(id, Side::One), &load.end));
        }
        for (id, gen) in &self.generators {
            ends.push((TerminalRef::new(id, Side::One), &gen.end));
        }
        for (id, shunt) in &self.shunts {
            ends.push((TerminalRef::new(id, Side::One), &shunt.end));
        }
        ends
    }

    /// Check that every reference between elements resolves.
    ///
    /// This is a well-formedness check only; electrical plausibility is not
    /// examined.
    pub fn validate_structure(&self) -> Vec<StructuralIssue> {
        let mut issues = Vec::new();

        for vl in self.voltage_levels.values() {
            if !self.substations.contains_key(&vl.substation) {
                issues.push(StructuralIssue {
                    element: vl.id.clone(),
                    message: format!("unknown substation {}", vl.substation),
                });
            }
        }

        for bus in self.buses.values() {
            if !self.voltage_levels.contains_key(&bus.voltage_level) {
                issues.push(StructuralIssue {
                    element: bus.id.clone(),
                    message: format!("unknown voltage level {}", bus.voltage_level),
                });
            }
        }

        for (terminal, connection) in self.connections() {
            match self.buses.get(&connection.bus) {
                None => issues.push(StructuralIssue {
                    element: terminal.element.clone(),
                    message: format!("{:?} end references unknown bus {}", terminal.side, connection.bus),
                }),
                Some(bus) if bus.voltage_level != connection.voltage_level => {
                    issues.push(StructuralIssue {
                        element: terminal.element.clone(),
                        message: format!(
                            "{:?} end bus {} is not in voltage level {}",
                            terminal.side, connection.bus, connection.voltage_level
                        ),
                    })
                }
                Some(_) => {}
            }
        }

        for switch in self.switches.values() {
            for bus in [&switch.bus1, &switch.bus2] {
                let in_level = self
                    .buses
                    .get(bus)
                    .map(|b| b.voltage_level == switch.voltage_level)
                    .unwrap_or(false);
                if !in_level {
                    issues.push(StructuralIssue {
                        element: switch.id.clone(),
                        message: format!(
                            "bus {} is not in voltage level {}",
                            bus, switch.voltage_level
                        ),
                    });
                }
            }
        }

        issues
    }
}
