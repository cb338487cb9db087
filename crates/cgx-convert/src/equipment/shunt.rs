use cgx_core::{ConversionResult, Network, ShuntCompensator, Side, WarningCategory};
use tracing::warn;

use super::register;
use crate::context::Context;
use crate::source;

pub fn build_shunt(
    ctx: &mut Context<'_>,
    network: &mut Network,
    shunt: &source::ShuntCompensator,
) -> ConversionResult<()> {
    let terminal = ctx.index.single_terminal("shunt compensator", &shunt.id)?;
    let id = ctx.naming.id(shunt);
    let end = ctx.connection(terminal)?;

    if shunt.sections < 0 {
        warn!(shunt = %id, sections = shunt.sections, "negative section count");
        ctx.diagnostics.add_warning(
            WarningCategory::NegativeSectionCount,
            [id.as_str()],
            &format!("section count {} sign-corrected", shunt.sections),
        );
    }

    let mut b_per_section = shunt.b_per_section;
    if b_per_section == 0.0 {
        b_per_section = f64::MIN_POSITIVE;
        ctx.diagnostics.add_warning(
            WarningCategory::ZeroSusceptancePerSection,
            [id.as_str()],
            "zero susceptance per section replaced by the smallest positive value",
        );
    }

    register(ctx, terminal, &id, Side::One)?;
    network.shunts.insert(
        id.clone(),
        ShuntCompensator {
            name: ctx.naming.name(shunt),
            id,
            end,
            b_per_section,
            g_per_section: shunt.g_per_section,
            section_count: shunt.sections.unsigned_abs(),
            maximum_section_count: shunt.maximum_sections.unsigned_abs(),
        },
    );
    Ok(())
}
