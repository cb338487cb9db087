use cgx_core::{ConversionResult, Load, LoadType, Megavars, Megawatts, Network, Side};

use super::{measured_flow, register};
use crate::context::Context;
use crate::source::EnergyConsumer;

/// Naming convention marking loads that stand in for missing equipment.
const FICTITIOUS_MARKER: &str = "fict";

pub fn build_load(
    ctx: &mut Context<'_>,
    network: &mut Network,
    load: &EnergyConsumer,
) -> ConversionResult<()> {
    let terminal = ctx.index.single_terminal("load", &load.id)?;
    let id = ctx.naming.id(load);
    let end = ctx.connection(terminal)?;
    let (p, q) = measured_flow(ctx, terminal, &id);

    let load_type = if id.to_ascii_lowercase().contains(FICTITIOUS_MARKER) {
        LoadType::Fictitious
    } else {
        LoadType::Undefined
    };

    register(ctx, terminal, &id, Side::One)?;
    network.loads.insert(
        id.clone(),
        Load {
            name: ctx.naming.name(load),
            id,
            end,
            load_type,
            p0: Megawatts(p),
            q0: Megavars(q),
        },
    );
    Ok(())
}
