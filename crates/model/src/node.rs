//! Immutable, resolved model nodes.
//!
//! All cross-node references are identity lookups into the owning
//! [`ModelGraph`](crate::graph::ModelGraph); nodes never own each other, so
//! cyclic type graphs carry no ownership cycles. The merged
//! operation/relation views are computed lazily and memoized exactly once.

use std::collections::{BTreeMap, BTreeSet};

use once_cell::sync::OnceCell;
use serde::Serialize;
use serde_json::Value;

use modelforge_core::{DomainId, ObjectId, ObjectKind};

use crate::graph::ModelGraph;

/// Kind of a declared relationship between two object models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RelationKind {
    /// The target is part of this object's composition.
    Composite,
    /// The target is related to, but not owned by, this object.
    Aggregate,
}

/// A resolved operation on an object model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OperationModel {
    name: String,
    description: Option<String>,
    parameters: BTreeMap<String, ObjectId>,
    returns: Option<ObjectId>,
    exceptions: BTreeSet<ObjectId>,
    inheritable: bool,
}

impl OperationModel {
    pub(crate) fn new(
        name: String,
        description: Option<String>,
        parameters: BTreeMap<String, ObjectId>,
        returns: Option<ObjectId>,
        exceptions: BTreeSet<ObjectId>,
        inheritable: bool,
    ) -> Self {
        Self {
            name,
            description,
            parameters,
            returns,
            exceptions,
            inheritable,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Parameter name to referenced type id, in name order.
    pub fn parameters(&self) -> &BTreeMap<String, ObjectId> {
        &self.parameters
    }

    pub fn return_id(&self) -> Option<&ObjectId> {
        self.returns.as_ref()
    }

    pub fn exception_ids(&self) -> &BTreeSet<ObjectId> {
        &self.exceptions
    }

    /// Whether specializations of the declaring object inherit this operation.
    pub fn inheritable(&self) -> bool {
        self.inheritable
    }

    pub fn return_model<'g>(&self, graph: &'g ModelGraph) -> Option<&'g ObjectModel> {
        self.returns.as_ref().and_then(|id| graph.object(id))
    }

    pub fn parameter_model<'g>(&self, graph: &'g ModelGraph, name: &str) -> Option<&'g ObjectModel> {
        self.parameters.get(name).and_then(|id| graph.object(id))
    }

    pub fn exception_models<'g>(
        &'g self,
        graph: &'g ModelGraph,
    ) -> impl Iterator<Item = &'g ObjectModel> {
        self.exceptions.iter().filter_map(|id| graph.object(id))
    }
}

/// A resolved composite/aggregate relationship on an object model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RelationModel {
    name: String,
    target: ObjectId,
    kind: RelationKind,
    inheritable: bool,
}

impl RelationModel {
    pub(crate) fn new(name: String, target: ObjectId, kind: RelationKind, inheritable: bool) -> Self {
        Self {
            name,
            target,
            kind,
            inheritable,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn target_id(&self) -> &ObjectId {
        &self.target
    }

    pub fn kind(&self) -> RelationKind {
        self.kind
    }

    pub fn inheritable(&self) -> bool {
        self.inheritable
    }

    pub fn target_model<'g>(&self, graph: &'g ModelGraph) -> Option<&'g ObjectModel> {
        graph.object(&self.target)
    }
}

/// Resolved, immutable state of one object model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct ObjectData {
    pub(crate) kind: ObjectKind,
    pub(crate) attributes: BTreeMap<String, Value>,
    pub(crate) parents: BTreeSet<ObjectId>,
    pub(crate) specializations: BTreeSet<ObjectId>,
    pub(crate) operations: BTreeMap<String, OperationModel>,
    pub(crate) relations: BTreeMap<String, RelationModel>,
    pub(crate) related_domains: BTreeSet<DomainId>,
}

/// An immutable object model node.
///
/// Created exactly once per id during resolution. The declared state never
/// changes afterwards; the combined (declared + inherited) operation and
/// relation views are memoized on first access and are safe under concurrent
/// first access.
#[derive(Debug, Serialize)]
pub struct ObjectModel {
    id: ObjectId,
    #[serde(flatten)]
    data: ObjectData,
    #[serde(skip)]
    merged_operations: OnceCell<BTreeMap<String, OperationModel>>,
    #[serde(skip)]
    merged_relations: OnceCell<BTreeMap<String, RelationModel>>,
}

impl PartialEq for ObjectModel {
    fn eq(&self, other: &Self) -> bool {
        // The memoized views are derived state; only identity + declared
        // content participate in equality.
        self.id == other.id && self.data == other.data
    }
}

impl ObjectModel {
    pub(crate) fn new(id: ObjectId, data: ObjectData) -> Self {
        Self {
            id,
            data,
            merged_operations: OnceCell::new(),
            merged_relations: OnceCell::new(),
        }
    }

    pub fn id(&self) -> &ObjectId {
        &self.id
    }

    pub fn domain(&self) -> &DomainId {
        self.id.domain()
    }

    pub fn name(&self) -> &str {
        self.id.name()
    }

    pub fn kind(&self) -> ObjectKind {
        self.data.kind
    }

    /// Declared attributes, carried through opaquely.
    pub fn attributes(&self) -> &BTreeMap<String, Value> {
        &self.data.attributes
    }

    pub fn attribute(&self, key: &str) -> Option<&Value> {
        self.data.attributes.get(key)
    }

    pub fn parent_ids(&self) -> &BTreeSet<ObjectId> {
        &self.data.parents
    }

    pub fn specialization_ids(&self) -> &BTreeSet<ObjectId> {
        &self.data.specializations
    }

    /// Domains other than this object's own that it references.
    pub fn related_domains(&self) -> &BTreeSet<DomainId> {
        &self.data.related_domains
    }

    /// Operations declared directly on this object, without inheritance.
    pub fn declared_operations(&self) -> &BTreeMap<String, OperationModel> {
        &self.data.operations
    }

    /// Relations declared directly on this object, without inheritance.
    pub fn declared_relations(&self) -> &BTreeMap<String, RelationModel> {
        &self.data.relations
    }

    pub fn parents<'g>(&'g self, graph: &'g ModelGraph) -> impl Iterator<Item = &'g ObjectModel> {
        self.data.parents.iter().filter_map(|id| graph.object(id))
    }

    /// Combined operations: inherited (inheritable only) overlaid with the
    /// declared set, keyed by name. A local declaration replaces an inherited
    /// operation of the same name. Memoized on first access.
    pub fn operations<'g>(&'g self, graph: &'g ModelGraph) -> &'g BTreeMap<String, OperationModel> {
        self.merged_operations.get_or_init(|| {
            let mut merged = BTreeMap::new();
            for parent in self.parents(graph) {
                for (name, operation) in parent.operations(graph) {
                    if operation.inheritable() {
                        merged.insert(name.clone(), operation.clone());
                    }
                }
            }
            for (name, operation) in &self.data.operations {
                merged.insert(name.clone(), operation.clone());
            }
            merged
        })
    }

    /// Combined relations, merged like [`Self::operations`].
    pub fn relations<'g>(&'g self, graph: &'g ModelGraph) -> &'g BTreeMap<String, RelationModel> {
        self.merged_relations.get_or_init(|| {
            let mut merged = BTreeMap::new();
            for parent in self.parents(graph) {
                for (name, relation) in parent.relations(graph) {
                    if relation.inheritable() {
                        merged.insert(name.clone(), relation.clone());
                    }
                }
            }
            for (name, relation) in &self.data.relations {
                merged.insert(name.clone(), relation.clone());
            }
            merged
        })
    }

    pub fn composites<'g>(&'g self, graph: &'g ModelGraph) -> impl Iterator<Item = &'g RelationModel> {
        self.relations(graph)
            .values()
            .filter(|r| r.kind() == RelationKind::Composite)
    }

    pub fn aggregates<'g>(&'g self, graph: &'g ModelGraph) -> impl Iterator<Item = &'g RelationModel> {
        self.relations(graph)
            .values()
            .filter(|r| r.kind() == RelationKind::Aggregate)
    }

    /// Whether `ancestor` appears anywhere in this object's parent lineage.
    pub fn inherits_from(&self, graph: &ModelGraph, ancestor: &ObjectId) -> bool {
        self.data.parents.iter().any(|parent| {
            parent == ancestor
                || graph
                    .object(parent)
                    .is_some_and(|node| node.inherits_from(graph, ancestor))
        })
    }
}
