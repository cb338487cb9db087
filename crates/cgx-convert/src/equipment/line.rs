use cgx_core::{
    ConversionError, ConversionResult, DanglingLine, Line, Megavars, Megawatts, Network, Side,
    TieLine, TieLineHalf,
};
use tracing::debug;

use super::{register, two_terminals};
use crate::context::{EquipmentRef, Context};
use crate::source::{LineSegment, Terminal};
use crate::topology::{boundary_code, NodeClassification};

/// Build the element for one AC line segment according to the classification
/// of its end nodes: a line, a dangling line, or (once per pair) a tie line.
pub fn build_line_segment(
    ctx: &mut Context<'_>,
    network: &mut Network,
    segment: &LineSegment,
) -> ConversionResult<()> {
    let (t1, t2) = two_terminals(ctx, "line segment", &segment.id)?;
    let c1 = ctx.classify(&t1.topological_node).clone();
    let c2 = ctx.classify(&t2.topological_node).clone();

    match (&c1, &c2) {
        (NodeClassification::Ordinary, NodeClassification::Ordinary) => {
            build_line(ctx, network, segment, t1, t2)
        }
        (NodeClassification::Ordinary, NodeClassification::Boundary { .. }) => {
            build_dangling_line(ctx, network, segment, t1, t2)
        }
        (NodeClassification::Boundary { .. }, NodeClassification::Ordinary) => {
            build_dangling_line(ctx, network, segment, t2, t1)
        }
        (NodeClassification::Ordinary, NodeClassification::Merged { .. }) => {
            build_tie_line(ctx, network, segment, t1, t2)
        }
        (NodeClassification::Merged { .. }, NodeClassification::Ordinary) => {
            build_tie_line(ctx, network, segment, t2, t1)
        }
        _ => Err(ConversionError::UnsupportedBoundaryTopology {
            node: t1.topological_node.clone(),
            reason: format!("line segment {} has both ends on boundary nodes", segment.id),
        }),
    }
}

fn build_line(
    ctx: &mut Context<'_>,
    network: &mut Network,
    segment: &LineSegment,
    t1: &Terminal,
    t2: &Terminal,
) -> ConversionResult<()> {
    let id = ctx.naming.id(segment);
    let end1 = ctx.connection(t1)?;
    let end2 = ctx.connection(t2)?;

    register(ctx, t1, &id, Side::One)?;
    register(ctx, t2, &id, Side::Two)?;
    network.lines.insert(
        id.clone(),
        Line {
            name: ctx.naming.name(segment),
            id,
            end1,
            end2,
            r: segment.r,
            x: segment.x,
            g1: segment.gch / 2.0,
            g2: segment.gch / 2.0,
            b1: segment.bch / 2.0,
            b2: segment.bch / 2.0,
            fictitious: false,
        },
    );
    Ok(())
}

fn build_dangling_line(
    ctx: &mut Context<'_>,
    network: &mut Network,
    segment: &LineSegment,
    network_side: &Terminal,
    boundary_side: &Terminal,
) -> ConversionResult<()> {
    let node = ctx.index.node(&boundary_side.topological_node)?;
    let ucte_xnode_code = boundary_code(&node.description).ok_or_else(|| {
        ConversionError::MissingBoundaryCode {
            node: node.id.clone(),
        }
    })?;
    let (p0, q0) = ctx
        .classification
        .boundary_load(&node.id)
        .map(|load| (load.p, load.q))
        .unwrap_or((0.0, 0.0));

    let id = ctx.naming.id(segment);
    let end = ctx.connection(network_side)?;
    debug!(dangling_line = %id, xnode = %ucte_xnode_code, "dangling line");

    register(ctx, network_side, &id, Side::One)?;
    network.dangling_lines.insert(
        id.clone(),
        DanglingLine {
            name: ctx.naming.name(segment),
            id,
            end,
            r: segment.r,
            x: segment.x,
            g: segment.gch,
            b: segment.bch,
            p0: Megawatts(p0),
            q0: Megavars(q0),
            ucte_xnode_code,
        },
    );
    Ok(())
}

fn half(ctx: &Context<'_>, segment: &LineSegment) -> TieLineHalf {
    TieLineHalf {
        id: ctx.naming.id(segment),
        name: ctx.naming.name(segment),
        r: segment.r,
        x: segment.x,
        g1: segment.gch / 2.0,
        g2: segment.gch / 2.0,
        b1: segment.bch / 2.0,
        b2: segment.bch / 2.0,
    }
}

/// Build the tie line for a merged pair. Only the segment with the smaller id
/// builds; its partner returns without doing anything.
fn build_tie_line(
    ctx: &mut Context<'_>,
    network: &mut Network,
    segment: &LineSegment,
    network_side: &Terminal,
    merged_side: &Terminal,
) -> ConversionResult<()> {
    let (partner_id, node_id) = ctx
        .classification
        .paired_segment(&segment.id)
        .map(|(partner, node)| (partner.to_string(), node.to_string()))
        .ok_or_else(|| ConversionError::UnsupportedBoundaryTopology {
            node: merged_side.topological_node.clone(),
            reason: format!("line segment {} is not part of a merged pair", segment.id),
        })?;
    if partner_id < segment.id {
        return Ok(());
    }

    let partner = match ctx.index.equipment.get(partner_id.as_str()) {
        Some(EquipmentRef::LineSegment(partner)) => *partner,
        _ => {
            return Err(ConversionError::unknown(
                "line segment",
                &segment.id,
                "paired line segment",
                &partner_id,
            ))
        }
    };
    let (p1, p2) = two_terminals(ctx, "line segment", &partner.id)?;
    let partner_network_side = if p1.topological_node == node_id { p2 } else { p1 };

    let node = ctx.index.node(&node_id)?;
    let ucte_xnode_code = boundary_code(&node.description);

    let half1 = half(ctx, segment);
    let half2 = half(ctx, partner);
    let id = format!("{} + {}", half1.id, half2.id);
    let name = format!("{} + {}", half1.name, half2.name);
    let end1 = ctx.connection(network_side)?;
    let end2 = ctx.connection(partner_network_side)?;
    debug!(tie_line = %id, node = %node_id, "tie line");

    register(ctx, network_side, &id, Side::One)?;
    register(ctx, partner_network_side, &id, Side::Two)?;
    network.tie_lines.insert(
        id.clone(),
        TieLine {
            id,
            name,
            end1,
            end2,
            half1,
            half2,
            ucte_xnode_code,
        },
    );
    Ok(())
}
