use cgx_core::{
    ConversionError, ConversionResult, Kilovolts, Leg, Network, Side, ThreeWindingsTransformer,
    TwoWindingsTransformer,
};

use super::register;
use crate::context::Context;
use crate::source::{PowerTransformer, Terminal, TransformerEnd};

/// Build a two- or three-winding transformer. Tap changers are attached by a
/// later pass.
pub fn build_transformer(
    ctx: &mut Context<'_>,
    network: &mut Network,
    transformer: &PowerTransformer,
) -> ConversionResult<()> {
    let mut ends = Vec::with_capacity(transformer.ends.len());
    for end in &transformer.ends {
        let terminal = ctx.index.terminal(&end.terminal)?;
        if !ctx.classify(&terminal.topological_node).is_ordinary() {
            return Err(ConversionError::BoundaryNodeFeedsTransformer {
                node: terminal.topological_node.clone(),
                transformer: transformer.id.clone(),
            });
        }
        ends.push((end, terminal));
    }

    match ends.len() {
        2 => build_two_windings(ctx, network, transformer, ends),
        3 => build_three_windings(ctx, network, transformer, ends),
        count => Err(ConversionError::UnsupportedWindingCount {
            transformer: transformer.id.clone(),
            count,
        }),
    }
}

fn substation_of(ctx: &Context<'_>, terminal: &Terminal) -> ConversionResult<String> {
    let node = ctx.index.node(&terminal.topological_node)?;
    let vl = ctx.index.voltage_level_of(node).ok_or_else(|| {
        ConversionError::unknown("topological node", &node.id, "voltage level", "<none>")
    })?;
    Ok(ctx.substation_id_of(vl))
}

/// Windings ordered by end number; impedance referred to the secondary side.
fn build_two_windings(
    ctx: &mut Context<'_>,
    network: &mut Network,
    transformer: &PowerTransformer,
    mut ends: Vec<(&TransformerEnd, &Terminal)>,
) -> ConversionResult<()> {
    ends.sort_by_key(|(end, _)| end.end_number);
    let (w1, t1) = ends[0];
    let (w2, t2) = ends[1];

    let rho0 = w2.rated_u / w1.rated_u;
    let rho0_square = rho0 * rho0;

    let id = ctx.naming.id(transformer);
    let substation = substation_of(ctx, t1)?;
    let end1 = ctx.connection(t1)?;
    let end2 = ctx.connection(t2)?;

    register(ctx, t1, &id, Side::One)?;
    register(ctx, t2, &id, Side::Two)?;
    network.two_winding_transformers.insert(
        id.clone(),
        TwoWindingsTransformer {
            name: ctx.naming.name(transformer),
            id,
            substation,
            end1,
            end2,
            r: w1.r * rho0_square + w2.r,
            x: w1.x * rho0_square + w2.x,
            g: w1.g / rho0_square + w2.g,
            b: w1.b / rho0_square + w2.b,
            rated_u1: Kilovolts(w1.rated_u),
            rated_u2: Kilovolts(w2.rated_u),
            ratio_tap_changer: None,
            phase_tap_changer: None,
        },
    );
    Ok(())
}

/// Legs ordered by decreasing rated voltage; the star point takes leg 1's rated voltage.
fn build_three_windings(
    ctx: &mut Context<'_>,
    network: &mut Network,
    transformer: &PowerTransformer,
    mut ends: Vec<(&TransformerEnd, &Terminal)>,
) -> ConversionResult<()> {
    ends.sort_by(|(a, _), (b, _)| b.rated_u.total_cmp(&a.rated_u));
    let strictly_descending = ends.windows(2).all(|pair| pair[0].0.rated_u > pair[1].0.rated_u);
    if !strictly_descending {
        return Err(ConversionError::NonDescendingRatedVoltages {
            transformer: transformer.id.clone(),
        });
    }

    let id = ctx.naming.id(transformer);
    let substation = substation_of(ctx, ends[0].1)?;

    let mut legs = Vec::with_capacity(3);
    for (position, (winding, terminal)) in ends.iter().enumerate() {
        let side = Side::from_number(position + 1).unwrap_or(Side::Three);
        let end = ctx.connection(terminal)?;
        register(ctx, terminal, &id, side)?;
        legs.push(Leg {
            end,
            r: winding.r,
            x: winding.x,
            g: winding.g,
            b: winding.b,
            rated_u: Kilovolts(winding.rated_u),
            ratio_tap_changer: None,
        });
    }
    let [leg1, leg2, leg3]: [Leg; 3] = legs.try_into().map_err(|_| {
        ConversionError::UnsupportedWindingCount {
            transformer: transformer.id.clone(),
            count: ends.len(),
        }
    })?;

    network.three_winding_transformers.insert(
        id.clone(),
        ThreeWindingsTransformer {
            name: ctx.naming.name(transformer),
            id,
            substation,
            rated_u0: leg1.rated_u,
            leg1,
            leg2,
            leg3,
        },
    );
    Ok(())
}
