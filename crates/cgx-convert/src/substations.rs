//! Substation consolidation.
//!
//! Some models split one physical substation in two, with a transformer as the
//! only link between the halves. Such substations are merged: every connected
//! component of the substation graph maps onto one canonical id.

use std::collections::{BTreeMap, BTreeSet};

use cgx_core::{connected_components, ConversionDiagnostics, ConversionResult, WarningCategory};
use regex::Regex;
use tracing::info;

use crate::context::SourceIndex;
use crate::topology::Classification;

/// Substations as vertices, transformer spans as edges.
#[derive(Debug, Clone, Default)]
pub struct SubstationGraph {
    substations: BTreeSet<String>,
    edges: Vec<(String, String)>,
}

impl SubstationGraph {
    pub fn new<I, S>(substations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            substations: substations.into_iter().map(Into::into).collect(),
            edges: Vec::new(),
        }
    }

    /// Record the substations spanned by one transformer. Edges run from the
    /// first id to each other one; spans of a single substation add nothing.
    pub fn add_transformer<S: AsRef<str>>(&mut self, spanned: &[S]) {
        let Some((first, rest)) = spanned.split_first() else {
            return;
        };
        for other in rest {
            if other.as_ref() != first.as_ref() {
                self.edges
                    .push((first.as_ref().to_string(), other.as_ref().to_string()));
            }
        }
    }

    /// Build the graph from the transformers of a source model. Windings on
    /// boundary nodes do not contribute.
    pub fn from_source(
        index: &SourceIndex<'_>,
        classification: &Classification,
    ) -> ConversionResult<Self> {
        let mut graph = Self::new(index.substations.keys().copied());
        for transformer in &index.model.power_transformers {
            let mut spanned = BTreeSet::new();
            for end in &transformer.ends {
                let terminal = index.terminal(&end.terminal)?;
                if !classification.get(&terminal.topological_node).is_ordinary() {
                    continue;
                }
                let node = index.node(&terminal.topological_node)?;
                if let Some(vl) = index.voltage_level_of(node) {
                    spanned.insert(vl.substation.as_str());
                }
            }
            let spanned: Vec<&str> = spanned.into_iter().collect();
            graph.add_transformer(&spanned);
        }
        Ok(graph)
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }
}

/// Map every non-canonical substation id onto the canonical id of its component.
///
/// The canonical id is the smallest id matching none of `excluded`, or the
/// smallest id overall when every member is excluded. Canonical ids never
/// appear as keys of the result.
pub fn resolve(
    graph: &SubstationGraph,
    excluded: &[Regex],
    diagnostics: &mut ConversionDiagnostics,
) -> BTreeMap<String, String> {
    let components = connected_components(
        graph.substations.iter().map(String::as_str),
        graph.edges.iter().map(|(a, b)| (a.as_str(), b.as_str())),
    );

    let mut mapping = BTreeMap::new();
    for members in components.into_iter().filter(|c| c.len() > 1) {
        let canonical = members
            .iter()
            .find(|id| !excluded.iter().any(|re| re.is_match(id)))
            .unwrap_or(&members[0])
            .clone();
        for member in members {
            if member != canonical {
                mapping.insert(member, canonical.clone());
            }
        }
    }

    if !mapping.is_empty() {
        info!(count = mapping.len(), "merging substations linked by transformers");
        let message = mapping
            .iter()
            .map(|(from, to)| format!("{from} -> {to}"))
            .collect::<Vec<_>>()
            .join(", ");
        diagnostics.add_warning(
            WarningCategory::SubstationsMerged,
            mapping.keys().cloned(),
            &format!("substations merged: {message}"),
        );
    }
    mapping
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn excluded_id_never_wins_tie_break() {
        let mut graph = SubstationGraph::new(["S_A", "S_B"]);
        graph.add_transformer(&["S_A", "S_B"]);
        let excluded = vec![Regex::new("^S_A$").unwrap()];

        let mut diagnostics = ConversionDiagnostics::new();
        let mapping = resolve(&graph, &excluded, &mut diagnostics);

        assert_eq!(mapping.len(), 1);
        assert_eq!(mapping["S_A"], "S_B");
        assert_eq!(diagnostics.ids_in(WarningCategory::SubstationsMerged), vec!["S_A"]);
    }

    #[test]
    fn all_excluded_falls_back_to_smallest() {
        let mut graph = SubstationGraph::new(["S2", "S1", "S3"]);
        graph.add_transformer(&["S3", "S2"]);
        graph.add_transformer(&["S2", "S1"]);
        let excluded = vec![Regex::new("^S").unwrap()];

        let mapping = resolve(&graph, &excluded, &mut ConversionDiagnostics::new());
        assert_eq!(mapping["S2"], "S1");
        assert_eq!(mapping["S3"], "S1");
        assert!(!mapping.contains_key("S1"));
    }

    #[test]
    fn single_substation_transformers_merge_nothing() {
        let mut graph = SubstationGraph::new(["S1", "S2"]);
        graph.add_transformer(&["S1"]);
        graph.add_transformer(&["S1", "S1"]);
        let mut diagnostics = ConversionDiagnostics::new();

        assert!(resolve(&graph, &[], &mut diagnostics).is_empty());
        assert_eq!(graph.edge_count(), 0);
        assert!(!diagnostics.has_warnings());
    }
}
