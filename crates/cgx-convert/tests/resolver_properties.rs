//! Property tests for substation consolidation.

use std::collections::BTreeMap;

use cgx_convert::substations::{resolve, SubstationGraph};
use cgx_core::ConversionDiagnostics;
use proptest::prelude::*;
use regex::Regex;

const SUBSTATIONS: usize = 8;

fn substation(index: usize) -> String {
    format!("S{index}")
}

fn graph(edges: &[(usize, usize)]) -> SubstationGraph {
    let mut graph = SubstationGraph::new((0..SUBSTATIONS).map(substation));
    for &(a, b) in edges {
        graph.add_transformer(&[substation(a), substation(b)]);
    }
    graph
}

fn mapping(edges: &[(usize, usize)], excluded: &[Regex]) -> BTreeMap<String, String> {
    resolve(&graph(edges), excluded, &mut ConversionDiagnostics::new())
}

fn edges() -> impl Strategy<Value = Vec<(usize, usize)>> {
    prop::collection::vec((0..SUBSTATIONS, 0..SUBSTATIONS), 0..12)
}

proptest! {
    #[test]
    fn edge_order_does_not_change_the_mapping(
        (edges, shuffled) in edges().prop_flat_map(|e| (Just(e.clone()), Just(e).prop_shuffle()))
    ) {
        prop_assert_eq!(mapping(&edges, &[]), mapping(&shuffled, &[]));
    }

    #[test]
    fn canonical_ids_are_never_remapped(edges in edges()) {
        let mapping = mapping(&edges, &[]);
        for (from, to) in &mapping {
            prop_assert!(!mapping.contains_key(to), "{to} is both canonical and remapped");
            prop_assert!(to < from, "{to} should sort before {from}");
        }
    }

    #[test]
    fn excluded_id_only_wins_when_alone(edges in edges()) {
        let excluded = vec![Regex::new("^S0$").unwrap()];
        let mapping = mapping(&edges, &excluded);
        prop_assert!(mapping.values().all(|to| to != "S0"));
    }
}

#[test]
fn chained_transformers_collapse_onto_one_substation() {
    let mapping = mapping(&[(3, 2), (2, 1)], &[]);
    assert_eq!(mapping.len(), 2);
    assert_eq!(mapping["S2"], "S1");
    assert_eq!(mapping["S3"], "S1");
}
