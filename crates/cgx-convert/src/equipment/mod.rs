//! Equipment builders.
//!
//! Each builder turns one source record into network element(s), inserts them
//! into the [`Network`](cgx_core::Network) and registers the element ends it
//! created in the context's terminal registry.

mod generator;
mod line;
mod load;
mod shunt;
mod switch;
mod transformer;

pub use generator::build_generator;
pub use line::build_line_segment;
pub use load::build_load;
pub use shunt::build_shunt;
pub use switch::{build_switch, build_switch_line, SwitchOutcome};
pub use transformer::build_transformer;

use cgx_core::{ConversionError, ConversionResult, Side, TerminalRef, WarningCategory};
use tracing::warn;

use crate::context::Context;
use crate::source::Terminal;

/// The two terminals of a two-terminal device, in sequence order.
fn two_terminals<'a>(
    ctx: &Context<'a>,
    kind: &'static str,
    equipment: &str,
) -> ConversionResult<(&'a Terminal, &'a Terminal)> {
    match ctx.index.equipment_terminals(equipment) {
        [first, second] => Ok((*first, *second)),
        other => Err(ConversionError::unknown(
            kind,
            equipment,
            "terminal pair",
            format!("{} terminal(s)", other.len()),
        )),
    }
}

fn register(
    ctx: &mut Context<'_>,
    terminal: &Terminal,
    element: &str,
    side: Side,
) -> ConversionResult<()> {
    ctx.registry.register(
        &terminal.id,
        &terminal.topological_node,
        TerminalRef::new(element, side),
    )
}

/// Measured P/Q at a terminal, zero with a warning when the state has no record.
fn measured_flow(ctx: &mut Context<'_>, terminal: &Terminal, element: &str) -> (f64, f64) {
    match ctx.index.flow(&terminal.id) {
        Some(flow) => (flow.p, flow.q),
        None => {
            warn!(element, terminal = %terminal.id, "no power flow record, assuming zero");
            ctx.diagnostics.add_warning(
                WarningCategory::MissingPowerFlow,
                [element],
                "no power flow record, P and Q set to 0",
            );
            (0.0, 0.0)
        }
    }
}
