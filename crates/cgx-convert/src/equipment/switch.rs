use cgx_core::{ConversionResult, Line, Network, Side, Switch, SwitchKind, WarningCategory};
use tracing::debug;

use super::{register, two_terminals};
use crate::context::Context;
use crate::source;

/// Impedance of the line standing in for a switch between voltage levels, ohms.
pub const SWITCH_LINE_IMPEDANCE: f64 = 0.05;

/// Whether a switch was built in its voltage level or left for the line fallback pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchOutcome {
    InLevel,
    Deferred,
}

fn kind(kind: source::SwitchKind) -> SwitchKind {
    match kind {
        source::SwitchKind::Breaker => SwitchKind::Breaker,
        source::SwitchKind::Disconnector => SwitchKind::Disconnector,
        source::SwitchKind::LoadBreakSwitch => SwitchKind::LoadBreakSwitch,
        source::SwitchKind::Switch => SwitchKind::Switch,
    }
}

pub fn build_switch(
    ctx: &mut Context<'_>,
    network: &mut Network,
    switch: &source::Switch,
) -> ConversionResult<SwitchOutcome> {
    let (t1, t2) = two_terminals(ctx, "switch", &switch.id)?;
    let end1 = ctx.connection(t1)?;
    let end2 = ctx.connection(t2)?;
    if end1.voltage_level != end2.voltage_level {
        debug!(switch = %switch.id, "switch spans two voltage levels, deferred");
        return Ok(SwitchOutcome::Deferred);
    }

    let id = ctx.naming.id(switch);
    network.switches.insert(
        id.clone(),
        Switch {
            name: ctx.naming.name(switch),
            id,
            kind: kind(switch.kind),
            voltage_level: end1.voltage_level,
            bus1: end1.bus,
            bus2: end2.bus,
            open: switch.open || !t1.connected || !t2.connected,
        },
    );
    Ok(SwitchOutcome::InLevel)
}

/// Replace a switch between two voltage levels by a low-impedance line.
pub fn build_switch_line(
    ctx: &mut Context<'_>,
    network: &mut Network,
    switch: &source::Switch,
) -> ConversionResult<()> {
    let (t1, t2) = two_terminals(ctx, "switch", &switch.id)?;
    let id = ctx.naming.id(switch);
    let mut end1 = ctx.connection(t1)?;
    let mut end2 = ctx.connection(t2)?;
    if switch.open {
        end1.connected = false;
        end2.connected = false;
    }

    ctx.diagnostics.add_warning(
        WarningCategory::SwitchReplacedByLine,
        [id.as_str()],
        &format!(
            "switch between {} and {} replaced by a low-impedance line",
            end1.voltage_level, end2.voltage_level
        ),
    );

    register(ctx, t1, &id, Side::One)?;
    register(ctx, t2, &id, Side::Two)?;
    network.lines.insert(
        id.clone(),
        Line {
            name: ctx.naming.name(switch),
            id,
            end1,
            end2,
            r: SWITCH_LINE_IMPEDANCE,
            x: SWITCH_LINE_IMPEDANCE,
            fictitious: true,
            ..Line::default()
        },
    );
    Ok(())
}
