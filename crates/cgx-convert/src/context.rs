//! Per-run conversion state.
//!
//! [`SourceIndex`] resolves id references of the read-only source graph.
//! [`Context`] bundles that index with the results of the first two pipeline
//! steps (node classification and substation mapping) and the mutable state
//! every later step writes to: the diagnostics list and the terminal registry.

use std::collections::BTreeMap;

use cgx_core::{ConversionDiagnostics, ConversionError, ConversionResult, TerminalConnection};

use crate::config::ConversionConfig;
use crate::naming::NamingStrategy;
use crate::registry::TerminalRegistry;
use crate::source::{
    CgmesModel, EnergyConsumer, Identified, LineSegment, OtherEquipment, PowerTransformer,
    ReactiveCapabilityCurve, Region, RegulatingControl, ShuntCompensator, Substation,
    SvPowerFlow, SvVoltage, Switch, SynchronousMachine, Terminal, TopologicalNode,
    TransformerEnd, VoltageLevel,
};
use crate::topology::{Classification, NodeClassification};

/// Conducting equipment owning a terminal.
#[derive(Debug, Clone, Copy)]
pub enum EquipmentRef<'a> {
    LineSegment(&'a LineSegment),
    Transformer(&'a PowerTransformer),
    Load(&'a EnergyConsumer),
    Shunt(&'a ShuntCompensator),
    Machine(&'a SynchronousMachine),
    Switch(&'a Switch),
    Other(&'a OtherEquipment),
}

/// Id lookups over a [`CgmesModel`].
///
/// Every map is a `BTreeMap`, so iterating any of them visits records in id
/// order regardless of the order the parser produced them in.
#[derive(Debug)]
pub struct SourceIndex<'a> {
    pub model: &'a CgmesModel,
    pub regions: BTreeMap<&'a str, &'a Region>,
    pub substations: BTreeMap<&'a str, &'a Substation>,
    pub voltage_levels: BTreeMap<&'a str, &'a VoltageLevel>,
    pub nodes: BTreeMap<&'a str, &'a TopologicalNode>,
    pub terminals: BTreeMap<&'a str, &'a Terminal>,
    /// Terminals per equipment, ordered by sequence number
    pub terminals_by_equipment: BTreeMap<&'a str, Vec<&'a Terminal>>,
    /// Terminals per topological node, ordered by terminal id
    pub terminals_by_node: BTreeMap<&'a str, Vec<&'a Terminal>>,
    pub equipment: BTreeMap<&'a str, EquipmentRef<'a>>,
    /// Transformer end id to its transformer and end
    pub transformer_ends: BTreeMap<&'a str, (&'a PowerTransformer, &'a TransformerEnd)>,
    pub regulating_controls: BTreeMap<&'a str, &'a RegulatingControl>,
    pub curves: BTreeMap<&'a str, &'a ReactiveCapabilityCurve>,
    pub sv_voltages: BTreeMap<&'a str, &'a SvVoltage>,
    pub sv_power_flows: BTreeMap<&'a str, &'a SvPowerFlow>,
    pub sv_tap_steps: BTreeMap<&'a str, i32>,
}

fn by_id<'a, T: Identified>(records: &'a [T]) -> BTreeMap<&'a str, &'a T> {
    records.iter().map(|r| (r.id(), r)).collect()
}

impl<'a> SourceIndex<'a> {
    /// Index the model, failing on the first reference that does not resolve.
    pub fn build(model: &'a CgmesModel) -> ConversionResult<Self> {
        let regions = by_id(&model.regions);
        let substations = by_id(&model.substations);
        let voltage_levels = by_id(&model.voltage_levels);
        let nodes = by_id(&model.topological_nodes);

        for vl in &model.voltage_levels {
            if !substations.contains_key(vl.substation.as_str()) {
                return Err(ConversionError::unknown(
                    "voltage level",
                    &vl.id,
                    "substation",
                    &vl.substation,
                ));
            }
        }
        for node in &model.topological_nodes {
            if let Some(container) = &node.container {
                if !voltage_levels.contains_key(container.as_str()) {
                    return Err(ConversionError::unknown(
                        "topological node",
                        &node.id,
                        "voltage level",
                        container,
                    ));
                }
            }
        }

        let mut equipment: BTreeMap<&str, EquipmentRef> = BTreeMap::new();
        for segment in &model.line_segments {
            equipment.insert(&segment.id, EquipmentRef::LineSegment(segment));
        }
        for transformer in &model.power_transformers {
            equipment.insert(&transformer.id, EquipmentRef::Transformer(transformer));
        }
        for load in &model.loads {
            equipment.insert(&load.id, EquipmentRef::Load(load));
        }
        for shunt in &model.shunts {
            equipment.insert(&shunt.id, EquipmentRef::Shunt(shunt));
        }
        for machine in &model.machines {
            equipment.insert(&machine.id, EquipmentRef::Machine(machine));
        }
        for switch in &model.switches {
            equipment.insert(&switch.id, EquipmentRef::Switch(switch));
        }
        for other in &model.other_equipment {
            equipment.insert(&other.id, EquipmentRef::Other(other));
        }

        let mut terminals = BTreeMap::new();
        let mut terminals_by_equipment: BTreeMap<&str, Vec<&Terminal>> = BTreeMap::new();
        let mut terminals_by_node: BTreeMap<&str, Vec<&Terminal>> = BTreeMap::new();
        for terminal in &model.terminals {
            if !nodes.contains_key(terminal.topological_node.as_str()) {
                return Err(ConversionError::unknown(
                    "terminal",
                    &terminal.id,
                    "topological node",
                    &terminal.topological_node,
                ));
            }
            if !equipment.contains_key(terminal.equipment.as_str()) {
                return Err(ConversionError::unknown(
                    "terminal",
                    &terminal.id,
                    "equipment",
                    &terminal.equipment,
                ));
            }
            terminals.insert(terminal.id.as_str(), terminal);
            terminals_by_equipment
                .entry(terminal.equipment.as_str())
                .or_default()
                .push(terminal);
            terminals_by_node
                .entry(terminal.topological_node.as_str())
                .or_default()
                .push(terminal);
        }
        for list in terminals_by_equipment.values_mut() {
            list.sort_by(|a, b| a.sequence_number.cmp(&b.sequence_number).then(a.id.cmp(&b.id)));
        }
        for list in terminals_by_node.values_mut() {
            list.sort_by(|a, b| a.id.cmp(&b.id));
        }

        let mut transformer_ends = BTreeMap::new();
        for transformer in &model.power_transformers {
            for end in &transformer.ends {
                if !terminals.contains_key(end.terminal.as_str()) {
                    return Err(ConversionError::unknown(
                        "transformer end",
                        &end.id,
                        "terminal",
                        &end.terminal,
                    ));
                }
                transformer_ends.insert(end.id.as_str(), (transformer, end));
            }
        }

        Ok(Self {
            model,
            regions,
            substations,
            voltage_levels,
            nodes,
            terminals,
            terminals_by_equipment,
            terminals_by_node,
            equipment,
            transformer_ends,
            regulating_controls: model
                .regulating_controls
                .iter()
                .map(|rc| (rc.id.as_str(), rc))
                .collect(),
            curves: model
                .reactive_capability_curves
                .iter()
                .map(|c| (c.id.as_str(), c))
                .collect(),
            sv_voltages: model
                .sv_voltages
                .iter()
                .map(|sv| (sv.topological_node.as_str(), sv))
                .collect(),
            sv_power_flows: model
                .sv_power_flows
                .iter()
                .map(|sv| (sv.terminal.as_str(), sv))
                .collect(),
            sv_tap_steps: model
                .sv_tap_steps
                .iter()
                .map(|sv| (sv.tap_changer.as_str(), sv.position))
                .collect(),
        })
    }

    pub fn node(&self, id: &str) -> ConversionResult<&'a TopologicalNode> {
        self.nodes
            .get(id)
            .copied()
            .ok_or_else(|| ConversionError::unknown("reference", id, "topological node", id))
    }

    pub fn terminal(&self, id: &str) -> ConversionResult<&'a Terminal> {
        self.terminals
            .get(id)
            .copied()
            .ok_or_else(|| ConversionError::unknown("reference", id, "terminal", id))
    }

    /// Terminals of one piece of equipment, in sequence order
    pub fn equipment_terminals(&self, equipment: &str) -> &[&'a Terminal] {
        self.terminals_by_equipment
            .get(equipment)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// The single terminal of a one-terminal device
    pub fn single_terminal(&self, kind: &'static str, equipment: &str) -> ConversionResult<&'a Terminal> {
        self.equipment_terminals(equipment)
            .first()
            .copied()
            .ok_or_else(|| ConversionError::unknown(kind, equipment, "terminal", "<none>"))
    }

    /// Terminals at a topological node, in terminal id order
    pub fn node_terminals(&self, node: &str) -> &[&'a Terminal] {
        self.terminals_by_node
            .get(node)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn voltage_level_of(&self, node: &TopologicalNode) -> Option<&'a VoltageLevel> {
        node.container
            .as_deref()
            .and_then(|vl| self.voltage_levels.get(vl).copied())
    }

    /// A node is a boundary candidate when it comes from the boundary set or has no container.
    pub fn is_boundary_candidate(node: &TopologicalNode) -> bool {
        node.from_boundary || node.container.is_none()
    }

    pub fn flow(&self, terminal: &str) -> Option<&'a SvPowerFlow> {
        self.sv_power_flows.get(terminal).copied()
    }
}

/// State shared by every pipeline step after classification and substation resolution.
pub struct Context<'a> {
    pub index: SourceIndex<'a>,
    pub config: &'a ConversionConfig,
    pub naming: Box<dyn NamingStrategy>,
    pub classification: Classification,
    /// Non-canonical source substation id to canonical source substation id
    pub substation_mapping: BTreeMap<String, String>,
    pub registry: TerminalRegistry,
    pub diagnostics: ConversionDiagnostics,
}

impl<'a> Context<'a> {
    pub fn new(
        index: SourceIndex<'a>,
        config: &'a ConversionConfig,
        classification: Classification,
        substation_mapping: BTreeMap<String, String>,
        diagnostics: ConversionDiagnostics,
    ) -> Self {
        Self {
            index,
            config,
            naming: config.naming_strategy.build(),
            classification,
            substation_mapping,
            registry: TerminalRegistry::new(),
            diagnostics,
        }
    }

    pub fn classify(&self, node: &str) -> &NodeClassification {
        self.classification.get(node)
    }

    /// Canonical source substation id
    pub fn canonical_substation<'s>(&'s self, substation: &'s str) -> &'s str {
        self.substation_mapping
            .get(substation)
            .map(String::as_str)
            .unwrap_or(substation)
    }

    /// Network id of the substation holding a source voltage level, after merging
    pub fn substation_id_of(&self, vl: &VoltageLevel) -> String {
        let canonical = self.canonical_substation(&vl.substation);
        match self.index.substations.get(canonical) {
            Some(substation) => self.naming.id(*substation),
            None => canonical.to_string(),
        }
    }

    pub fn bus_id(&self, node: &TopologicalNode) -> String {
        self.naming.id(node)
    }

    /// Element end for a terminal on an ordinary (non-boundary) node.
    pub fn connection(&self, terminal: &Terminal) -> ConversionResult<TerminalConnection> {
        let node = self.index.node(&terminal.topological_node)?;
        let vl = self.index.voltage_level_of(node).ok_or_else(|| {
            ConversionError::unknown("topological node", &node.id, "voltage level", "<none>")
        })?;
        Ok(TerminalConnection::new(
            self.naming.id(vl),
            self.bus_id(node),
            terminal.connected,
        ))
    }
}
