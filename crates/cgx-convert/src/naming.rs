//! Source identity to network id/name mapping.
//!
//! A [`NamingStrategy`] is owned by one conversion run (see
//! [`crate::context::Context`]) so any lookup state it keeps never outlives
//! the run.

use std::collections::BTreeMap;

use crate::source::Identified;

pub trait NamingStrategy {
    /// Network id for a source object
    fn id(&self, object: &dyn Identified) -> String;

    /// Network name for a source object
    fn name(&self, object: &dyn Identified) -> String;

    /// Source id that produced a network id
    fn reverse_id(&self, network_id: &str) -> String;
}

/// Network ids equal source ids; names fall back to the id when empty.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityNamingStrategy;

impl NamingStrategy for IdentityNamingStrategy {
    fn id(&self, object: &dyn Identified) -> String {
        object.id().to_string()
    }

    fn name(&self, object: &dyn Identified) -> String {
        if object.name().is_empty() {
            object.id().to_string()
        } else {
            object.name().to_string()
        }
    }

    fn reverse_id(&self, network_id: &str) -> String {
        network_id.to_string()
    }
}

/// Explicit id table. Ids without an entry pass through unchanged.
#[derive(Debug, Clone, Default)]
pub struct MappingNamingStrategy {
    forward: BTreeMap<String, String>,
    reverse: BTreeMap<String, String>,
}

impl MappingNamingStrategy {
    pub fn new(ids: BTreeMap<String, String>) -> Self {
        let reverse = ids
            .iter()
            .map(|(source, network)| (network.clone(), source.clone()))
            .collect();
        Self {
            forward: ids,
            reverse,
        }
    }
}

impl NamingStrategy for MappingNamingStrategy {
    fn id(&self, object: &dyn Identified) -> String {
        self.forward
            .get(object.id())
            .cloned()
            .unwrap_or_else(|| object.id().to_string())
    }

    fn name(&self, object: &dyn Identified) -> String {
        IdentityNamingStrategy.name(object)
    }

    fn reverse_id(&self, network_id: &str) -> String {
        self.reverse
            .get(network_id)
            .cloned()
            .unwrap_or_else(|| network_id.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::TopologicalNode;

    fn node(id: &str, name: &str) -> TopologicalNode {
        TopologicalNode {
            id: id.into(),
            name: name.into(),
            ..TopologicalNode::default()
        }
    }

    #[test]
    fn identity_uses_source_id_and_name_fallback() {
        let naming = IdentityNamingStrategy;
        assert_eq!(naming.id(&node("_TN1", "")), "_TN1");
        assert_eq!(naming.name(&node("_TN1", "")), "_TN1");
        assert_eq!(naming.name(&node("_TN1", "Bus 1")), "Bus 1");
        assert_eq!(naming.reverse_id("_TN1"), "_TN1");
    }

    #[test]
    fn mapping_round_trips_and_passes_through() {
        let naming = MappingNamingStrategy::new(BTreeMap::from([(
            "_TN1".to_string(),
            "BUS1".to_string(),
        )]));

        assert_eq!(naming.id(&node("_TN1", "")), "BUS1");
        assert_eq!(naming.reverse_id("BUS1"), "_TN1");
        assert_eq!(naming.id(&node("_TN2", "")), "_TN2");
        assert_eq!(naming.reverse_id("_TN2"), "_TN2");
    }
}
