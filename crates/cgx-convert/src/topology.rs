//! Boundary node classification.
//!
//! Every topological node is classified once, before any equipment is built:
//!
//! - **Ordinary**: inside a voltage level; becomes a bus.
//! - **Boundary**: an inter-area tie point fed by a single branch. The branch
//!   becomes a dangling line carrying the (optional) single load at the node.
//! - **Merged**: a tie point joining exactly two line segments from different
//!   areas. The two segments become one tie line.
//!
//! Equipment at a boundary candidate is resolved into the closed
//! [`BoundaryTerminal`] variant so the checks below match exhaustively.

use std::collections::BTreeMap;

use cgx_core::{ConversionDiagnostics, ConversionError, ConversionResult, WarningCategory};
use tracing::{debug, warn};

use crate::context::{EquipmentRef, SourceIndex};
use crate::source::{TopologicalNode, Terminal};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InjectionKind {
    Load,
    Shunt,
    Machine,
}

/// What a terminal at a boundary candidate node connects to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoundaryTerminal {
    Line { segment: String },
    Winding2 { transformer: String },
    Winding3 { transformer: String },
    Injection { kind: InjectionKind, equipment: String },
    Unsupported { equipment: String, kind: String },
}

impl BoundaryTerminal {
    pub fn resolve(index: &SourceIndex<'_>, terminal: &Terminal) -> BoundaryTerminal {
        let equipment = terminal.equipment.clone();
        match index.equipment.get(terminal.equipment.as_str()) {
            Some(EquipmentRef::LineSegment(_)) => BoundaryTerminal::Line { segment: equipment },
            Some(EquipmentRef::Transformer(t)) => match t.ends.len() {
                2 => BoundaryTerminal::Winding2 { transformer: equipment },
                3 => BoundaryTerminal::Winding3 { transformer: equipment },
                n => BoundaryTerminal::Unsupported {
                    equipment,
                    kind: format!("{n}-winding transformer"),
                },
            },
            Some(EquipmentRef::Load(_)) => BoundaryTerminal::Injection {
                kind: InjectionKind::Load,
                equipment,
            },
            Some(EquipmentRef::Shunt(_)) => BoundaryTerminal::Injection {
                kind: InjectionKind::Shunt,
                equipment,
            },
            Some(EquipmentRef::Machine(_)) => BoundaryTerminal::Injection {
                kind: InjectionKind::Machine,
                equipment,
            },
            Some(EquipmentRef::Switch(_)) => BoundaryTerminal::Unsupported {
                equipment,
                kind: "Switch".into(),
            },
            Some(EquipmentRef::Other(other)) => BoundaryTerminal::Unsupported {
                equipment,
                kind: other.kind.clone(),
            },
            None => BoundaryTerminal::Unsupported {
                equipment,
                kind: "unknown".into(),
            },
        }
    }
}

/// Initial injection of a dangling line, taken from the load at its boundary node.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundaryLoad {
    pub load: String,
    pub p: f64,
    pub q: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeClassification {
    Ordinary,
    Boundary { load: Option<BoundaryLoad> },
    /// Line segment ids, sorted
    Merged { first: String, second: String },
}

impl NodeClassification {
    pub fn is_ordinary(&self) -> bool {
        matches!(self, NodeClassification::Ordinary)
    }
}

static ORDINARY: NodeClassification = NodeClassification::Ordinary;

/// Classification of every boundary candidate, plus the derived lookups.
#[derive(Debug, Clone, Default)]
pub struct Classification {
    nodes: BTreeMap<String, NodeClassification>,
    /// Segment id to (paired segment id, merged node id)
    pairs: BTreeMap<String, (String, String)>,
}

impl Classification {
    /// Classification of a node; nodes never classified are ordinary.
    pub fn get(&self, node: &str) -> &NodeClassification {
        self.nodes.get(node).unwrap_or(&ORDINARY)
    }

    pub fn boundary_load(&self, node: &str) -> Option<&BoundaryLoad> {
        match self.get(node) {
            NodeClassification::Boundary { load } => load.as_ref(),
            _ => None,
        }
    }

    /// The other segment of a tie line and the node joining them
    pub fn paired_segment(&self, segment: &str) -> Option<(&str, &str)> {
        self.pairs
            .get(segment)
            .map(|(other, node)| (other.as_str(), node.as_str()))
    }

    /// Non-ordinary nodes in id order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &NodeClassification)> {
        self.nodes.iter().map(|(id, c)| (id.as_str(), c))
    }

    pub fn boundary_count(&self) -> usize {
        self.nodes
            .values()
            .filter(|c| matches!(c, NodeClassification::Boundary { .. }))
            .count()
    }

    pub fn merged_count(&self) -> usize {
        self.nodes
            .values()
            .filter(|c| matches!(c, NodeClassification::Merged { .. }))
            .count()
    }
}

/// Boundary code embedded in a boundary node description: from the first `X`
/// up to (excluding) the next `;`.
pub fn boundary_code(description: &str) -> Option<String> {
    let start = description.find('X')?;
    let len = description[start..].find(';')?;
    Some(description[start..start + len].to_string())
}

/// Classify every boundary candidate that has terminals.
pub fn classify(
    index: &SourceIndex<'_>,
    diagnostics: &mut ConversionDiagnostics,
) -> ConversionResult<Classification> {
    let mut classification = Classification::default();

    for (id, node) in &index.nodes {
        if !SourceIndex::is_boundary_candidate(node) {
            continue;
        }
        let terminals = index.node_terminals(id);
        if terminals.is_empty() {
            debug!(node = %id, "boundary node without terminals, skipped");
            continue;
        }

        let node_class = classify_node(index, node, terminals, diagnostics)?;
        if let NodeClassification::Merged { first, second } = &node_class {
            classification
                .pairs
                .insert(first.clone(), (second.clone(), id.to_string()));
            classification
                .pairs
                .insert(second.clone(), (first.clone(), id.to_string()));
        }
        classification.nodes.insert(id.to_string(), node_class);
    }

    debug!(
        boundary = classification.boundary_count(),
        merged = classification.merged_count(),
        "classified boundary nodes"
    );
    Ok(classification)
}

fn classify_node(
    index: &SourceIndex<'_>,
    node: &TopologicalNode,
    terminals: &[&Terminal],
    diagnostics: &mut ConversionDiagnostics,
) -> ConversionResult<NodeClassification> {
    let unsupported_topology = |reason: String| ConversionError::UnsupportedBoundaryTopology {
        node: node.id.clone(),
        reason,
    };

    let mut segments = Vec::new();
    let mut windings = Vec::new();
    let mut loads = Vec::new();
    let mut injections = Vec::new();
    let mut unsupported = Vec::new();

    for terminal in terminals {
        match BoundaryTerminal::resolve(index, terminal) {
            BoundaryTerminal::Line { segment } => segments.push(segment),
            BoundaryTerminal::Winding2 { transformer } => windings.push(transformer),
            BoundaryTerminal::Winding3 { transformer } => {
                return Err(unsupported_topology(format!(
                    "three-winding transformer {transformer} ends at a boundary node"
                )));
            }
            BoundaryTerminal::Injection { kind, equipment } => {
                if kind == InjectionKind::Load {
                    loads.push(*terminal);
                }
                injections.push(*terminal);
                debug!(node = %node.id, equipment = %equipment, ?kind, "boundary injection");
            }
            BoundaryTerminal::Unsupported { equipment, kind } => {
                unsupported.push((equipment, kind, *terminal));
            }
        }
    }

    match (segments.len(), windings.len()) {
        (2, 0) => {
            if segments[0] == segments[1] {
                return Err(unsupported_topology(format!(
                    "line segment {} has both ends at the node",
                    segments[0]
                )));
            }
            for segment in &segments {
                let far_end_is_boundary = index
                    .equipment_terminals(segment)
                    .iter()
                    .filter(|t| t.topological_node != node.id)
                    .map(|t| index.node(&t.topological_node))
                    .collect::<ConversionResult<Vec<_>>>()?
                    .into_iter()
                    .any(SourceIndex::is_boundary_candidate);
                if far_end_is_boundary {
                    return Err(unsupported_topology(format!(
                        "line segment {segment} joins two boundary nodes"
                    )));
                }
            }

            let flowing: Vec<&str> = injections
                .iter()
                .copied()
                .chain(unsupported.iter().map(|(_, _, t)| *t))
                .filter(|t| {
                    index
                        .flow(&t.id)
                        .map(|f| f.p != 0.0 || f.q != 0.0)
                        .unwrap_or(false)
                })
                .map(|t| t.equipment.as_str())
                .collect();
            if !flowing.is_empty() {
                warn!(node = %node.id, "non-zero injection at merged boundary node ignored");
                diagnostics.add_warning(
                    WarningCategory::BoundaryInjectionIgnored,
                    std::iter::once(node.id.as_str()).chain(flowing),
                    "injection at a node merged into a tie line is ignored",
                );
            }

            segments.sort();
            let second = segments.pop().unwrap_or_default();
            let first = segments.pop().unwrap_or_default();
            Ok(NodeClassification::Merged { first, second })
        }
        (1, 0) | (0, 1) => {
            if let Some((equipment, kind, _)) = unsupported.first() {
                return Err(ConversionError::AmbiguousBoundaryTopology {
                    node: node.id.clone(),
                    reason: format!("unsupported injection {equipment} of kind {kind}"),
                });
            }
            if loads.len() > 1 {
                return Err(ConversionError::AmbiguousBoundaryTopology {
                    node: node.id.clone(),
                    reason: format!("{} loads", loads.len()),
                });
            }
            let load = loads.first().map(|terminal| {
                let (p, q) = index
                    .flow(&terminal.id)
                    .map(|f| (f.p, f.q))
                    .unwrap_or((0.0, 0.0));
                BoundaryLoad {
                    load: terminal.equipment.clone(),
                    p,
                    q,
                }
            });
            Ok(NodeClassification::Boundary { load })
        }
        (1, 1) => Err(unsupported_topology(
            "line segment and transformer winding meet at the node".into(),
        )),
        (s, w) => Err(unsupported_topology(format!(
            "{} branches ({s} line segments, {w} transformer windings)",
            s + w
        ))),
    }
}
