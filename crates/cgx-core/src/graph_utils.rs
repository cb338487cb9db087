//! Connected components over string-identified nodes.
//!
//! Used by the substation resolver (substations joined by transformers) and for
//! the electrical island summary printed after a conversion.

use std::collections::BTreeMap;

use petgraph::unionfind::UnionFind;

use crate::{Network, TerminalConnection};

/// Groups `nodes` into connected components given undirected `edges`.
///
/// Each component is sorted, and components are ordered by their smallest
/// member. Edge endpoints absent from `nodes` are added as nodes.
pub fn connected_components<'a, N, E>(nodes: N, edges: E) -> Vec<Vec<String>>
where
    N: IntoIterator<Item = &'a str>,
    E: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut index: BTreeMap<&'a str, usize> = BTreeMap::new();
    let intern = |id: &'a str, index: &mut BTreeMap<&'a str, usize>| -> usize {
        let next = index.len();
        *index.entry(id).or_insert(next)
    };

    for node in nodes {
        intern(node, &mut index);
    }
    let edges: Vec<(usize, usize)> = edges
        .into_iter()
        .map(|(a, b)| (intern(a, &mut index), intern(b, &mut index)))
        .collect();

    let mut sets = UnionFind::<usize>::new(index.len());
    for (a, b) in edges {
        sets.union(a, b);
    }

    let mut groups: BTreeMap<usize, Vec<String>> = BTreeMap::new();
    for (id, idx) in &index {
        groups
            .entry(sets.find(*idx))
            .or_default()
            .push((*id).to_string());
    }

    let mut components: Vec<Vec<String>> = groups.into_values().collect();
    for component in &mut components {
        component.sort();
    }
    components.sort();
    components
}

/// Electrical islands of a converted network, as sets of bus ids.
///
/// Branches join their end buses when both ends are connected; closed switches
/// join their two buses.
pub fn bus_islands(network: &Network) -> Vec<Vec<String>> {
    let mut edges: Vec<(&str, &str)> = Vec::new();

    for line in network.lines.values() {
        join(&mut edges, &line.end1, &line.end2);
    }
    for tie in network.tie_lines.values() {
        join(&mut edges, &tie.end1, &tie.end2);
    }
    for t2w in network.two_winding_transformers.values() {
        join(&mut edges, &t2w.end1, &t2w.end2);
    }
    for t3w in network.three_winding_transformers.values() {
        join(&mut edges, &t3w.leg1.end, &t3w.leg2.end);
        join(&mut edges, &t3w.leg1.end, &t3w.leg3.end);
    }
    for switch in network.switches.values() {
        if !switch.open {
            edges.push((switch.bus1.as_str(), switch.bus2.as_str()));
        }
    }

    connected_components(network.buses.keys().map(String::as_str), edges)
}

fn join<'n>(edges: &mut Vec<(&'n str, &'n str)>, a: &'n TerminalConnection, b: &'n TerminalConnection) {
    if a.connected && b.connected {
        edges.push((a.bus.as_str(), b.bus.as_str()));
    }
}
