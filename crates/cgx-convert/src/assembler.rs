//! Conversion pipeline.
//!
//! Steps run in a fixed order over one read-only source graph:
//!
//! 1. classify boundary nodes
//! 2. build the substation graph and resolve merged substations
//! 3. substations, with country from the region name
//! 4. voltage levels, with aggregated voltage limits
//! 5. buses, then loads, shunts, generators and in-level switches per voltage level
//! 6. lines, dangling lines and tie lines
//! 7. low-impedance lines for switches between voltage levels
//! 8. two- and three-winding transformers
//! 9. tap changers
//! 10. state overlay: bus voltages, terminal flows, tap positions
//! 11. operational current limits
//!
//! Steps 3 onwards read the classification and substation mapping from the
//! [`Context`]; they are never recomputed.

use std::collections::BTreeMap;

use cgx_core::{
    Amperes, Bus, ConversionDiagnostics, ConversionResult, Country, CurrentLimits, Degrees,
    Kilovolts, Megavars, Megawatts, Network, Substation, TapTable, TemporaryLimit, VoltageLevel,
    WarningCategory,
};
use regex::Regex;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::{ConfigError, ConversionConfig};
use crate::context::{Context, EquipmentRef, SourceIndex};
use crate::equipment::{self, SwitchOutcome};
use crate::source::{
    CgmesModel, EnergyConsumer, ShuntCompensator, Switch, SynchronousMachine, VoltageLimitKind,
};
use crate::substations::{self, SubstationGraph};
use crate::tap_changer;
use crate::topology::{self, Classification};

/// Result of a successful run: the network and every recoverable issue met on the way.
#[derive(Debug, Clone, Serialize)]
pub struct Conversion {
    pub network: Network,
    pub diagnostics: ConversionDiagnostics,
}

/// Runs the conversion pipeline for one configuration.
#[derive(Debug)]
pub struct NetworkAssembler<'c> {
    config: &'c ConversionConfig,
    exclusions: Vec<Regex>,
}

/// One-terminal devices and switches of a voltage level, each list in id order.
#[derive(Default)]
struct LevelEquipment<'a> {
    loads: Vec<&'a EnergyConsumer>,
    shunts: Vec<&'a ShuntCompensator>,
    machines: Vec<&'a SynchronousMachine>,
    switches: Vec<&'a Switch>,
}

impl<'c> NetworkAssembler<'c> {
    pub fn new(config: &'c ConversionConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            config,
            exclusions: config.exclusion_patterns()?,
        })
    }

    /// Classify boundary nodes only (step 1).
    pub fn classify(&self, model: &CgmesModel) -> ConversionResult<(Classification, ConversionDiagnostics)> {
        let index = SourceIndex::build(model)?;
        let mut diagnostics = ConversionDiagnostics::new();
        let classification = topology::classify(&index, &mut diagnostics)?;
        Ok((classification, diagnostics))
    }

    pub fn convert(&self, model: &CgmesModel) -> ConversionResult<Conversion> {
        info!(
            nodes = model.topological_nodes.len(),
            terminals = model.terminals.len(),
            "converting CGMES model"
        );
        let index = SourceIndex::build(model)?;
        let mut diagnostics = ConversionDiagnostics::new();

        let classification = topology::classify(&index, &mut diagnostics)?;

        let graph = SubstationGraph::from_source(&index, &classification)?;
        let mapping = substations::resolve(&graph, &self.exclusions, &mut diagnostics);

        let mut ctx = Context::new(index, self.config, classification, mapping, diagnostics);
        let mut network = Network::new();

        create_substations(&mut ctx, &mut network);
        create_voltage_levels(&mut ctx, &mut network);
        let deferred = create_buses_and_injections(&mut ctx, &mut network)?;

        let model = ctx.index.model;
        let mut segments: Vec<_> = model.line_segments.iter().collect();
        segments.sort_by(|a, b| a.id.cmp(&b.id));
        for segment in segments {
            equipment::build_line_segment(&mut ctx, &mut network, segment)?;
        }
        for switch in deferred {
            equipment::build_switch_line(&mut ctx, &mut network, switch)?;
        }
        let mut transformers: Vec<_> = model.power_transformers.iter().collect();
        transformers.sort_by(|a, b| a.id.cmp(&b.id));
        for transformer in transformers {
            equipment::build_transformer(&mut ctx, &mut network, transformer)?;
        }
        tap_changer::attach_tap_changers(&mut ctx, &mut network)?;

        overlay_state(&mut ctx, &mut network);
        attach_current_limits(&mut ctx, &mut network);

        for issue in network.validate_structure() {
            warn!(%issue, "structural issue in converted network");
        }
        info!(stats = %network.stats(), warnings = ctx.diagnostics.warning_count(), "conversion complete");

        Ok(Conversion {
            network,
            diagnostics: ctx.diagnostics,
        })
    }
}

fn create_substations(ctx: &mut Context<'_>, network: &mut Network) {
    let mut merged: BTreeMap<&str, Vec<String>> = BTreeMap::new();
    for (from, to) in &ctx.substation_mapping {
        if let Some(source) = ctx.index.substations.get(from.as_str()) {
            merged.entry(to.as_str()).or_default().push(ctx.naming.id(*source));
        }
    }

    let mut unresolved = Vec::new();
    for (source_id, source) in &ctx.index.substations {
        if ctx.substation_mapping.contains_key(*source_id) {
            continue;
        }
        let id = ctx.naming.id(*source);
        let country = source
            .region
            .as_deref()
            .and_then(|region| ctx.index.regions.get(region))
            .and_then(|region| Country::from_region_name(&region.name));
        let country = match country {
            Some(country) => Some(country),
            None => {
                unresolved.push(id.clone());
                ctx.config.default_country
            }
        };

        let mut substation = Substation::new(id.clone(), ctx.naming.name(*source), country);
        substation.merged = merged.remove(*source_id).unwrap_or_default();
        network.substations.insert(id, substation);
    }

    for id in unresolved {
        let fallback = ctx
            .config
            .default_country
            .map(|c| c.to_string())
            .unwrap_or_else(|| "none".to_string());
        debug!(substation = %id, fallback = %fallback, "region does not resolve to a country");
        ctx.diagnostics.add_warning(
            WarningCategory::UnresolvedCountry,
            [id.as_str()],
            &format!("region does not resolve to a country, using default ({fallback})"),
        );
    }
}

fn create_voltage_levels(ctx: &mut Context<'_>, network: &mut Network) {
    let mut limits: BTreeMap<&str, (Option<f64>, Option<f64>)> = BTreeMap::new();
    let mut unmapped = Vec::new();
    for limit in &ctx.index.model.voltage_limits {
        if !ctx.index.voltage_levels.contains_key(limit.voltage_level.as_str()) {
            unmapped.push(limit.id.clone());
            continue;
        }
        let (low, high) = limits.entry(limit.voltage_level.as_str()).or_default();
        match limit.kind {
            VoltageLimitKind::Low => *low = Some(low.map_or(limit.value, |v| v.min(limit.value))),
            VoltageLimitKind::High => *high = Some(high.map_or(limit.value, |v| v.max(limit.value))),
        }
    }

    for (source_id, source) in &ctx.index.voltage_levels {
        let id = ctx.naming.id(*source);
        let mut vl = VoltageLevel::new(
            id.clone(),
            ctx.naming.name(*source),
            ctx.substation_id_of(source),
            Kilovolts(source.nominal_voltage),
        );
        if let Some((low, high)) = limits.get(source_id) {
            vl.low_voltage_limit = low.map(Kilovolts);
            vl.high_voltage_limit = high.map(Kilovolts);
        }
        network.voltage_levels.insert(id, vl);
    }

    if !unmapped.is_empty() {
        ctx.diagnostics.add_warning(
            WarningCategory::UnmappedLimit,
            unmapped,
            "voltage limit on an unknown voltage level ignored",
        );
    }
}

/// Buses for every non-boundary node, then the one-terminal devices and
/// switches of each voltage level. Returns switches spanning two voltage levels.
fn create_buses_and_injections<'a>(
    ctx: &mut Context<'a>,
    network: &mut Network,
) -> ConversionResult<Vec<&'a Switch>> {
    for node in ctx.index.nodes.values() {
        if SourceIndex::is_boundary_candidate(node) {
            continue;
        }
        let Some(vl) = ctx.index.voltage_level_of(node) else {
            continue;
        };
        let id = ctx.bus_id(node);
        network
            .buses
            .insert(id.clone(), Bus::new(id, ctx.naming.name(*node), ctx.naming.id(vl)));
    }

    let mut levels: BTreeMap<&'a str, LevelEquipment<'a>> = BTreeMap::new();
    let equipment: Vec<(&'a str, EquipmentRef<'a>)> =
        ctx.index.equipment.iter().map(|(id, e)| (*id, *e)).collect();
    for (id, record) in equipment {
        let Some(terminal) = ctx.index.equipment_terminals(id).first().copied() else {
            continue;
        };
        if !ctx.classify(&terminal.topological_node).is_ordinary() {
            debug!(equipment = id, node = %terminal.topological_node, "equipment on a boundary node not built");
            continue;
        }
        let node = ctx.index.node(&terminal.topological_node)?;
        let Some(vl) = node.container.as_deref() else {
            continue;
        };
        let level = levels.entry(vl).or_default();
        match record {
            EquipmentRef::Load(load) => level.loads.push(load),
            EquipmentRef::Shunt(shunt) => level.shunts.push(shunt),
            EquipmentRef::Machine(machine) => level.machines.push(machine),
            EquipmentRef::Switch(switch) => level.switches.push(switch),
            EquipmentRef::LineSegment(_)
            | EquipmentRef::Transformer(_)
            | EquipmentRef::Other(_) => {}
        }
    }

    let mut deferred = Vec::new();
    for (vl, level) in levels {
        debug!(
            voltage_level = vl,
            loads = level.loads.len(),
            shunts = level.shunts.len(),
            generators = level.machines.len(),
            switches = level.switches.len(),
            "building voltage level equipment"
        );
        for load in level.loads {
            equipment::build_load(ctx, network, load)?;
        }
        for shunt in level.shunts {
            equipment::build_shunt(ctx, network, shunt)?;
        }
        for machine in level.machines {
            equipment::build_generator(ctx, network, machine)?;
        }
        for switch in level.switches {
            if equipment::build_switch(ctx, network, switch)? == SwitchOutcome::Deferred {
                deferred.push(switch);
            }
        }
    }
    Ok(deferred)
}

fn overlay_state(ctx: &mut Context<'_>, network: &mut Network) {
    let mut missing = Vec::new();
    for (node_id, node) in &ctx.index.nodes {
        let bus_id = ctx.bus_id(node);
        let Some(bus) = network.buses.get_mut(&bus_id) else {
            continue;
        };
        match ctx.index.sv_voltages.get(*node_id) {
            Some(sv) => {
                bus.v = Some(Kilovolts(sv.v));
                bus.angle = Some(Degrees(sv.angle));
            }
            None => missing.push(bus_id),
        }
    }
    if !missing.is_empty() {
        warn!(count = missing.len(), "buses without voltage record");
        ctx.diagnostics.add_warning(
            WarningCategory::MissingVoltage,
            missing,
            "no voltage record, voltage and angle left unset",
        );
    }

    for (source_terminal, entry) in ctx.registry.iter() {
        let Some(flow) = ctx.index.flow(source_terminal) else {
            continue;
        };
        if let Some(end) = network.terminal_mut(&entry.terminal) {
            end.p = Some(Megawatts(flow.p));
            end.q = Some(Megavars(flow.q));
        }
    }

    let mut positions: BTreeMap<String, i32> = BTreeMap::new();
    for tc in &ctx.index.model.ratio_tap_changers {
        if let Some(position) = ctx.index.sv_tap_steps.get(tc.id.as_str()) {
            positions.insert(ctx.naming.id(tc), *position);
        }
    }
    for tc in &ctx.index.model.phase_tap_changers {
        if let Some(position) = ctx.index.sv_tap_steps.get(tc.id.as_str()) {
            positions.insert(ctx.naming.id(tc), *position);
        }
    }
    let apply = |id: &str, table: &TapTable, tap_position: &mut i32| {
        if let Some(position) = positions.get(id) {
            if table.contains(*position) {
                *tap_position = *position;
            } else {
                debug!(tap_changer = id, position, "state tap position outside the step table, kept normal step");
            }
        }
    };
    for t2w in network.two_winding_transformers.values_mut() {
        if let Some(rtc) = t2w.ratio_tap_changer.as_mut() {
            apply(&rtc.id, &rtc.table, &mut rtc.tap_position);
        }
        if let Some(ptc) = t2w.phase_tap_changer.as_mut() {
            apply(&ptc.id, &ptc.table, &mut ptc.tap_position);
        }
    }
    for t3w in network.three_winding_transformers.values_mut() {
        for leg in [&mut t3w.leg1, &mut t3w.leg2, &mut t3w.leg3] {
            if let Some(rtc) = leg.ratio_tap_changer.as_mut() {
                apply(&rtc.id, &rtc.table, &mut rtc.tap_position);
            }
        }
    }
}

fn attach_current_limits(ctx: &mut Context<'_>, network: &mut Network) {
    let mut limits: Vec<_> = ctx.index.model.current_limits.iter().collect();
    limits.sort_by(|a, b| a.id.cmp(&b.id));

    for limit in limits {
        let end = ctx
            .registry
            .terminal(&limit.terminal)
            .and_then(|terminal| network.terminal_mut(terminal));
        let Some(end) = end else {
            ctx.diagnostics.add_warning(
                WarningCategory::UnmappedLimit,
                [limit.id.as_str(), limit.terminal.as_str()],
                "current limit on a terminal without a network element end ignored",
            );
            continue;
        };

        let limits = end.current_limits.get_or_insert_with(CurrentLimits::default);
        let value = Amperes(limit.value);
        match limit.acceptable_duration {
            None => {
                limits.permanent = Some(limits.permanent.map_or(value, |current| current.min(value)));
            }
            Some(duration) => {
                limits.temporary.push(TemporaryLimit {
                    acceptable_duration_s: duration,
                    value,
                });
                limits
                    .temporary
                    .sort_by(|a, b| b.acceptable_duration_s.cmp(&a.acceptable_duration_s));
            }
        }
    }
}
