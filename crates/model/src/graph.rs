//! The resolved model arena.

use std::collections::BTreeMap;

use serde::Serialize;

use modelforge_core::ObjectId;

use crate::node::ObjectModel;

/// Arena of resolved object models, keyed by identity.
///
/// Every cross-node reference in the model set is a lookup into this graph,
/// so cyclic type graphs resolve without ownership cycles. Safe for
/// unrestricted concurrent reads once built.
#[derive(Debug, PartialEq, Serialize)]
pub struct ModelGraph {
    nodes: BTreeMap<ObjectId, ObjectModel>,
}

impl ModelGraph {
    pub(crate) fn new(nodes: BTreeMap<ObjectId, ObjectModel>) -> Self {
        Self { nodes }
    }

    pub fn object(&self, id: &ObjectId) -> Option<&ObjectModel> {
        self.nodes.get(id)
    }

    pub fn contains(&self, id: &ObjectId) -> bool {
        self.nodes.contains_key(id)
    }

    /// All resolved objects, in id order.
    pub fn objects(&self) -> impl Iterator<Item = &ObjectModel> {
        self.nodes.values()
    }

    pub fn ids(&self) -> impl Iterator<Item = &ObjectId> {
        self.nodes.keys()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
