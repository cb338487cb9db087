use cgx_core::{
    ConversionError, ConversionResult, Generator, Kilovolts, Megavars, Megawatts, Network,
    RegulatedTerminal, Side, TerminalRef, WarningCategory,
};
use tracing::{debug, warn};

use super::{measured_flow, register};
use crate::context::Context;
use crate::reactive::reactive_limits;
use crate::source::{RegulatingControlMode, SynchronousMachine};

/// Build a generator. Source flows are in load convention; set points are in
/// generation convention, hence the sign flips.
pub fn build_generator(
    ctx: &mut Context<'_>,
    network: &mut Network,
    machine: &SynchronousMachine,
) -> ConversionResult<()> {
    let terminal = ctx.index.single_terminal("synchronous machine", &machine.id)?;
    let node = ctx.index.node(&terminal.topological_node)?;
    let id = ctx.naming.id(machine);
    let end = ctx.connection(terminal)?;
    let (p, q) = measured_flow(ctx, terminal, &id);

    let mut target_q = Megavars(-q);
    let mut target_v = None;
    let mut voltage_regulator_on = false;
    let mut regulated_terminal = None;

    let control = match machine.regulating_control.as_deref() {
        Some(rc) => Some(
            ctx.index
                .regulating_controls
                .get(rc)
                .copied()
                .ok_or_else(|| {
                    ConversionError::unknown("synchronous machine", &machine.id, "regulating control", rc)
                })?,
        ),
        None => None,
    };

    match control {
        None => {
            debug!(generator = %id, "no regulating control");
            ctx.diagnostics.add_warning(
                WarningCategory::MissingRegulatingControl,
                [id.as_str()],
                "no regulating control, set points taken from the measured flow",
            );
        }
        Some(rc) => match rc.mode {
            RegulatingControlMode::Voltage => {
                voltage_regulator_on = true;
                let target = if rc.target_value == 0.0 {
                    let nominal = ctx
                        .index
                        .voltage_level_of(node)
                        .map(|vl| vl.nominal_voltage)
                        .unwrap_or(0.0);
                    warn!(generator = %id, nominal, "zero target voltage, using nominal voltage");
                    ctx.diagnostics.add_warning(
                        WarningCategory::ZeroTargetVoltage,
                        [id.as_str()],
                        "zero target voltage replaced by the nominal voltage",
                    );
                    nominal
                } else {
                    rc.target_value
                };
                target_v = Some(Kilovolts(target));
                regulated_terminal = Some(if rc.terminal == terminal.id {
                    RegulatedTerminal::Terminal(TerminalRef::new(&id, Side::One))
                } else {
                    remote_bus(ctx, &rc.terminal)?
                });
            }
            RegulatingControlMode::ReactivePower => {
                target_q = Megavars(rc.target_value);
            }
            mode => {
                ctx.diagnostics.add_warning(
                    WarningCategory::UnsupportedRegulationMode,
                    [id.as_str(), rc.id.as_str()],
                    &format!("generator regulation mode {} is not supported", mode.as_str()),
                );
            }
        },
    }

    let curve = match machine.reactive_capability_curve.as_deref() {
        Some(curve) => Some(ctx.index.curves.get(curve).copied().ok_or_else(|| {
            ConversionError::unknown("synchronous machine", &machine.id, "reactive capability curve", curve)
        })?),
        None => None,
    };
    let reactive_limits = reactive_limits(&id, machine, curve, &mut ctx.diagnostics);

    register(ctx, terminal, &id, Side::One)?;
    network.generators.insert(
        id.clone(),
        Generator {
            name: ctx.naming.name(machine),
            id,
            end,
            min_p: Megawatts(machine.min_p.unwrap_or(-f64::MAX)),
            max_p: Megawatts(machine.max_p.unwrap_or(f64::MAX)),
            target_p: Megawatts(-p),
            target_q,
            target_v,
            voltage_regulator_on,
            regulated_terminal,
            reactive_limits,
        },
    );
    Ok(())
}

/// Bus of the node a remote regulation terminal sits on.
fn remote_bus(ctx: &Context<'_>, terminal: &str) -> ConversionResult<RegulatedTerminal> {
    let terminal = ctx.index.terminal(terminal)?;
    let node = ctx.index.node(&terminal.topological_node)?;
    Ok(RegulatedTerminal::Bus {
        id: ctx.bus_id(node),
    })
}
