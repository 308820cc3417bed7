//! Partitioning of the resolved graph into domain models and ontologies.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use serde::Serialize;

use modelforge_core::{DomainId, ObjectId};

use crate::graph::ModelGraph;
use crate::node::ObjectModel;

/// A named, versioned, immutable set of resolved objects from one domain.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DomainModel {
    id: DomainId,
    objects: BTreeSet<ObjectId>,
    #[serde(skip)]
    graph: Arc<ModelGraph>,
}

impl DomainModel {
    fn new(id: DomainId, objects: BTreeSet<ObjectId>, graph: Arc<ModelGraph>) -> Self {
        Self { id, objects, graph }
    }

    pub fn id(&self) -> &DomainId {
        &self.id
    }

    pub fn name(&self) -> &str {
        self.id.name()
    }

    pub fn version(&self) -> &str {
        self.id.version()
    }

    pub fn object_ids(&self) -> &BTreeSet<ObjectId> {
        &self.objects
    }

    pub fn objects(&self) -> impl Iterator<Item = &ObjectModel> {
        self.objects.iter().filter_map(|id| self.graph.object(id))
    }

    pub fn object(&self, id: &ObjectId) -> Option<&ObjectModel> {
        if self.objects.contains(id) {
            self.graph.object(id)
        } else {
            None
        }
    }

    /// Look an object up by (case-insensitive) name.
    pub fn object_named(&self, name: &str) -> Option<&ObjectModel> {
        self.objects().find(|o| o.name().eq_ignore_ascii_case(name))
    }

    pub fn graph(&self) -> &ModelGraph {
        &self.graph
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

/// A domain model extended with every external domain it transitively
/// references.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ontology {
    id: DomainId,
    /// Objects declared in this domain.
    objects: BTreeSet<ObjectId>,
    /// Objects pulled in from referenced external domains, transitively.
    imported: BTreeSet<ObjectId>,
    /// The external domains contributing to `imported`.
    related: BTreeSet<DomainId>,
    #[serde(skip)]
    graph: Arc<ModelGraph>,
}

impl Ontology {
    fn new(
        id: DomainId,
        objects: BTreeSet<ObjectId>,
        imported: BTreeSet<ObjectId>,
        related: BTreeSet<DomainId>,
        graph: Arc<ModelGraph>,
    ) -> Self {
        Self {
            id,
            objects,
            imported,
            related,
            graph,
        }
    }

    pub fn id(&self) -> &DomainId {
        &self.id
    }

    pub fn name(&self) -> &str {
        self.id.name()
    }

    pub fn version(&self) -> &str {
        self.id.version()
    }

    /// Objects declared in this domain itself.
    pub fn object_ids(&self) -> &BTreeSet<ObjectId> {
        &self.objects
    }

    /// Objects contributed by referenced external domains.
    pub fn imported_ids(&self) -> &BTreeSet<ObjectId> {
        &self.imported
    }

    /// External domains whose object sets this ontology aggregates.
    pub fn related_domains(&self) -> &BTreeSet<DomainId> {
        &self.related
    }

    /// The full member set: local objects plus every imported one.
    pub fn member_ids(&self) -> impl Iterator<Item = &ObjectId> {
        self.objects.iter().chain(self.imported.iter())
    }

    pub fn members(&self) -> impl Iterator<Item = &ObjectModel> {
        self.member_ids().filter_map(|id| self.graph.object(id))
    }

    pub fn object(&self, id: &ObjectId) -> Option<&ObjectModel> {
        if self.objects.contains(id) || self.imported.contains(id) {
            self.graph.object(id)
        } else {
            None
        }
    }

    pub fn object_named(&self, name: &str) -> Option<&ObjectModel> {
        self.members().find(|o| o.name().eq_ignore_ascii_case(name))
    }

    pub fn graph(&self) -> &ModelGraph {
        &self.graph
    }
}

/// One domain's slice of a built model set.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DomainPartition {
    /// All references stay inside the domain.
    Domain(DomainModel),
    /// At least one object references a foreign domain.
    Ontology(Ontology),
}

impl DomainPartition {
    pub fn id(&self) -> &DomainId {
        match self {
            Self::Domain(model) => model.id(),
            Self::Ontology(ontology) => ontology.id(),
        }
    }

    pub fn is_ontology(&self) -> bool {
        matches!(self, Self::Ontology(_))
    }

    pub fn as_domain(&self) -> Option<&DomainModel> {
        match self {
            Self::Domain(model) => Some(model),
            Self::Ontology(_) => None,
        }
    }

    pub fn as_ontology(&self) -> Option<&Ontology> {
        match self {
            Self::Ontology(ontology) => Some(ontology),
            Self::Domain(_) => None,
        }
    }

    /// Objects declared in the partition's own domain.
    pub fn object_ids(&self) -> &BTreeSet<ObjectId> {
        match self {
            Self::Domain(model) => model.object_ids(),
            Self::Ontology(ontology) => ontology.object_ids(),
        }
    }
}

/// The result of a successful `build()`: every resolved domain, partitioned.
#[derive(Debug, PartialEq, Serialize)]
pub struct ModelSet {
    graph: Arc<ModelGraph>,
    partitions: BTreeMap<DomainId, DomainPartition>,
}

impl ModelSet {
    pub fn graph(&self) -> &ModelGraph {
        &self.graph
    }

    pub fn domains(&self) -> impl Iterator<Item = &DomainPartition> {
        self.partitions.values()
    }

    pub fn get(&self, id: &DomainId) -> Option<&DomainPartition> {
        self.partitions.get(id)
    }

    pub fn object(&self, id: &ObjectId) -> Option<&ObjectModel> {
        self.graph.object(id)
    }

    pub fn len(&self) -> usize {
        self.partitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.partitions.is_empty()
    }
}

/// Group resolved objects by domain and promote domains with cross-domain
/// references to ontologies.
pub(crate) fn partition(graph: Arc<ModelGraph>) -> ModelSet {
    let mut by_domain: BTreeMap<DomainId, BTreeSet<ObjectId>> = BTreeMap::new();
    let mut related: BTreeMap<DomainId, BTreeSet<DomainId>> = BTreeMap::new();

    for node in graph.objects() {
        let domain = node.domain().clone();
        by_domain
            .entry(domain.clone())
            .or_default()
            .insert(node.id().clone());
        for foreign in node.related_domains() {
            if foreign != &domain {
                related
                    .entry(domain.clone())
                    .or_default()
                    .insert(foreign.clone());
            }
        }
    }

    let mut partitions = BTreeMap::new();
    for (domain, objects) in &by_domain {
        let direct = related.get(domain).filter(|set| !set.is_empty());
        let partition = match direct {
            None => DomainPartition::Domain(DomainModel::new(
                domain.clone(),
                objects.clone(),
                graph.clone(),
            )),
            Some(direct) => {
                // Transitive closure: an externally referenced domain may
                // itself reference further domains.
                let mut reachable: BTreeSet<DomainId> = BTreeSet::new();
                let mut pending: Vec<DomainId> = direct.iter().cloned().collect();
                while let Some(next) = pending.pop() {
                    if next == *domain || !reachable.insert(next.clone()) {
                        continue;
                    }
                    if let Some(more) = related.get(&next) {
                        pending.extend(more.iter().cloned());
                    }
                }

                let mut imported = BTreeSet::new();
                for foreign in &reachable {
                    if let Some(objects) = by_domain.get(foreign) {
                        imported.extend(objects.iter().cloned());
                    }
                }
                DomainPartition::Ontology(Ontology::new(
                    domain.clone(),
                    objects.clone(),
                    imported,
                    reachable,
                    graph.clone(),
                ))
            }
        };
        partitions.insert(domain.clone(), partition);
    }

    tracing::debug!(
        domains = partitions.len(),
        ontologies = partitions.values().filter(|p| p.is_ontology()).count(),
        "partitioned model set"
    );
    ModelSet { graph, partitions }
}
