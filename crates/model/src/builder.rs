//! Mutable declaration registry and the fluent registration surface.
//!
//! A [`ModelBuilder`] collects mutable per-object declarations, keyed by
//! identity and created on first reference — a direct [`ModelBuilder::for_object`]
//! call or an indirect reference as parent, parameter, return, exception, or
//! relation target. Registration tolerates concurrent callers: a single lock
//! guards the id-to-declaration map, and registration work itself is cheap.
//!
//! [`ModelBuilder::build`] consumes the builder by move: the open-to-built
//! transition happens exactly once, and all declaration state is discarded
//! when it completes.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;

use modelforge_core::{DomainId, Interner, ModelError, ModelResult, ObjectId, ObjectKind};

use crate::domain::{self, ModelSet};
use crate::node::{ObjectData, OperationModel, RelationKind, RelationModel};
use crate::{resolve, validate};

/// Mutable declaration of one object type.
#[derive(Debug, Default)]
pub(crate) struct ObjectDecl {
    pub(crate) kind: ObjectKind,
    pub(crate) attributes: BTreeMap<String, Value>,
    pub(crate) parents: BTreeSet<ObjectId>,
    /// Objects that declared *this* object as a parent.
    pub(crate) specializations: BTreeSet<ObjectId>,
    pub(crate) operations: BTreeMap<String, OperationDecl>,
    pub(crate) relations: BTreeMap<String, RelationDecl>,
    /// Foreign domains referenced by this object.
    pub(crate) related: BTreeSet<DomainId>,
}

impl ObjectDecl {
    /// Every id this declaration references.
    pub(crate) fn references(&self) -> impl Iterator<Item = &ObjectId> {
        self.parents
            .iter()
            .chain(self.specializations.iter())
            .chain(self.operations.values().flat_map(OperationDecl::references))
            .chain(self.relations.values().map(|relation| &relation.target))
    }

    pub(crate) fn into_data(self) -> ObjectData {
        ObjectData {
            kind: self.kind,
            attributes: self.attributes,
            parents: self.parents,
            specializations: self.specializations,
            operations: self
                .operations
                .into_iter()
                .map(|(name, op)| (name, op.into_model()))
                .collect(),
            relations: self
                .relations
                .into_iter()
                .map(|(name, relation)| (name, relation.into_model()))
                .collect(),
            related_domains: self.related,
        }
    }
}

/// Mutable declaration of one operation.
#[derive(Debug)]
pub(crate) struct OperationDecl {
    pub(crate) name: String,
    pub(crate) description: Option<String>,
    pub(crate) parameters: BTreeMap<String, ObjectId>,
    pub(crate) returns: Option<ObjectId>,
    pub(crate) exceptions: BTreeSet<ObjectId>,
    pub(crate) inheritable: bool,
    /// First structural error hit during parameter registration; replayed by
    /// validation.
    pub(crate) defect: Option<ModelError>,
}

impl OperationDecl {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            description: None,
            parameters: BTreeMap::new(),
            returns: None,
            exceptions: BTreeSet::new(),
            inheritable: true,
            defect: None,
        }
    }

    pub(crate) fn references(&self) -> impl Iterator<Item = &ObjectId> {
        self.parameters
            .values()
            .chain(self.returns.as_ref())
            .chain(self.exceptions.iter())
    }

    fn into_model(self) -> OperationModel {
        OperationModel::new(
            self.name,
            self.description,
            self.parameters,
            self.returns,
            self.exceptions,
            self.inheritable,
        )
    }
}

/// Mutable declaration of one composite/aggregate relation.
#[derive(Debug)]
pub(crate) struct RelationDecl {
    pub(crate) name: String,
    pub(crate) target: ObjectId,
    pub(crate) kind: RelationKind,
    pub(crate) inheritable: bool,
}

impl RelationDecl {
    fn into_model(self) -> RelationModel {
        RelationModel::new(self.name, self.target, self.kind, self.inheritable)
    }
}

/// Registry of mutable object declarations with a fluent registration API.
///
/// Registration methods take `&self` and may be called from multiple threads;
/// [`Self::build`] consumes the builder and produces the immutable, validated
/// model set.
#[derive(Debug, Default)]
pub struct ModelBuilder {
    interner: Arc<Interner>,
    decls: Mutex<BTreeMap<ObjectId, ObjectDecl>>,
}

impl ModelBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build against a caller-owned interning registry.
    pub fn with_interner(interner: Arc<Interner>) -> Self {
        Self {
            interner,
            decls: Mutex::new(BTreeMap::new()),
        }
    }

    pub fn interner(&self) -> &Arc<Interner> {
        &self.interner
    }

    /// Intern the domain identity for `(name, version)`.
    pub fn domain_id(&self, name: &str, version: &str) -> ModelResult<DomainId> {
        self.interner.domain_id(name, version)
    }

    /// Intern the object identity for `name` within `domain`.
    pub fn object_id(&self, domain: &DomainId, name: &str) -> ModelResult<ObjectId> {
        self.interner.object_id(domain, name)
    }

    /// Register (or reuse) the declaration for the object `name` in domain
    /// `domain:version` and return a handle for declaring its content.
    pub fn for_object(&self, domain: &str, version: &str, name: &str) -> ModelResult<ObjectHandle<'_>> {
        let domain = self.interner.domain_id(domain, version)?;
        let id = self.interner.object_id(&domain, name)?;
        Ok(self.for_object_id(&id))
    }

    /// Register (or reuse) the declaration for an already-interned id.
    pub fn for_object_id(&self, id: &ObjectId) -> ObjectHandle<'_> {
        self.register(id);
        ObjectHandle {
            builder: self,
            id: id.clone(),
        }
    }

    /// Insert-if-absent: referencing an id is enough to register it.
    fn register(&self, id: &ObjectId) {
        self.decls.lock().entry(id.clone()).or_default();
    }

    fn with_decl<R>(&self, id: &ObjectId, f: impl FnOnce(&mut ObjectDecl) -> R) -> R {
        let mut decls = self.decls.lock();
        f(decls.entry(id.clone()).or_default())
    }

    /// Record `target.domain()` as related to `of` when the domains differ.
    fn track_related(&self, of: &ObjectId, target: &ObjectId) {
        if target.domain() != of.domain() {
            let related = target.domain().clone();
            self.with_decl(of, |decl| {
                decl.related.insert(related);
            });
        }
    }

    #[cfg(test)]
    pub(crate) fn into_decls(self) -> BTreeMap<ObjectId, ObjectDecl> {
        self.decls.into_inner()
    }

    /// Validate, resolve, and partition everything registered so far.
    ///
    /// Consumes the builder: declarations are discarded as resolution adopts
    /// them, and no partial model set is ever returned on failure.
    pub fn build(self) -> ModelResult<ModelSet> {
        let decls = self.decls.into_inner();
        tracing::debug!(objects = decls.len(), "building model set");

        validate::validate(&decls)?;
        let graph = resolve::resolve_all(decls)?;
        Ok(domain::partition(Arc::new(graph)))
    }
}

/// Fluent handle onto one object declaration.
///
/// Cheap to clone; every call locks the registry for the duration of the
/// mutation only.
#[derive(Debug, Clone)]
pub struct ObjectHandle<'b> {
    builder: &'b ModelBuilder,
    id: ObjectId,
}

impl<'b> ObjectHandle<'b> {
    pub fn id(&self) -> &ObjectId {
        &self.id
    }

    pub fn with_kind(&self, kind: ObjectKind) -> &Self {
        self.builder.with_decl(&self.id, |decl| decl.kind = kind);
        self
    }

    /// Attach an opaque attribute value. Re-registering a key replaces it.
    pub fn with_attribute(&self, key: &str, value: impl Into<Value>) -> &Self {
        let value = value.into();
        self.builder.with_decl(&self.id, |decl| {
            decl.attributes.insert(key.to_string(), value);
        });
        self
    }

    /// Declare `parent` as a parent of this object.
    ///
    /// Registers the parent's declaration if it has none yet, records this id
    /// in the parent's specialization set, and tracks the parent's domain as
    /// related when it differs from this object's.
    pub fn specializes(&self, parent: &ObjectId) -> &Self {
        self.builder.with_decl(parent, |decl| {
            decl.specializations.insert(self.id.clone());
        });
        self.builder.with_decl(&self.id, |decl| {
            decl.parents.insert(parent.clone());
        });
        self.builder.track_related(&self.id, parent);
        self
    }

    /// Declare (or reuse) the operation `name` and return a handle for it.
    pub fn with_operation(&self, name: &str) -> OperationHandle<'b> {
        self.builder.with_decl(&self.id, |decl| {
            decl.operations
                .entry(name.to_string())
                .or_insert_with(|| OperationDecl::new(name));
        });
        OperationHandle {
            builder: self.builder,
            object: self.id.clone(),
            operation: name.to_string(),
        }
    }

    /// Declare a composite relation to `target`. Re-declaring a relation name
    /// replaces the previous entry.
    pub fn with_composite(&self, name: &str, target: &ObjectId) -> &Self {
        self.with_relation(name, target, RelationKind::Composite, true)
    }

    /// Declare an aggregate relation to `target`.
    pub fn with_aggregate(&self, name: &str, target: &ObjectId) -> &Self {
        self.with_relation(name, target, RelationKind::Aggregate, true)
    }

    /// Declare a relation that specializations do not inherit.
    pub fn with_local_relation(&self, name: &str, target: &ObjectId, kind: RelationKind) -> &Self {
        self.with_relation(name, target, kind, false)
    }

    fn with_relation(
        &self,
        name: &str,
        target: &ObjectId,
        kind: RelationKind,
        inheritable: bool,
    ) -> &Self {
        self.builder.register(target);
        self.builder.with_decl(&self.id, |decl| {
            decl.relations.insert(
                name.to_string(),
                RelationDecl {
                    name: name.to_string(),
                    target: target.clone(),
                    kind,
                    inheritable,
                },
            );
        });
        self.builder.track_related(&self.id, target);
        self
    }
}

/// Fluent handle onto one operation declaration.
#[derive(Debug, Clone)]
pub struct OperationHandle<'b> {
    builder: &'b ModelBuilder,
    object: ObjectId,
    operation: String,
}

impl OperationHandle<'_> {
    pub fn object_id(&self) -> &ObjectId {
        &self.object
    }

    pub fn name(&self) -> &str {
        &self.operation
    }

    fn with_operation_decl<R>(&self, f: impl FnOnce(&mut OperationDecl) -> R) -> R {
        self.builder.with_decl(&self.object, |decl| {
            let operation = decl
                .operations
                .entry(self.operation.clone())
                .or_insert_with(|| OperationDecl::new(&self.operation));
            f(operation)
        })
    }

    pub fn described_as(&self, description: &str) -> &Self {
        self.with_operation_decl(|op| op.description = Some(description.to_string()));
        self
    }

    /// Whether specializations inherit this operation. Defaults to true.
    pub fn inheritable(&self, inheritable: bool) -> &Self {
        self.with_operation_decl(|op| op.inheritable = inheritable);
        self
    }

    /// Register a named parameter referencing `ty`.
    ///
    /// Re-registering the same name with the same type is a no-op;
    /// re-registering it with a different type stores a
    /// [`ModelError::DuplicateParameter`] that validation replays at
    /// `build()` time.
    pub fn with_parameter(&self, name: &str, ty: &ObjectId) -> &Self {
        self.builder.register(ty);
        let defect = self.with_operation_decl(|op| match op.parameters.get(name) {
            Some(existing) if existing == ty => None,
            Some(existing) => {
                let conflict = ModelError::duplicate_parameter(
                    self.object.clone(),
                    op.name.clone(),
                    name,
                    existing.clone(),
                    ty.clone(),
                );
                op.defect.get_or_insert(conflict.clone());
                Some(conflict)
            }
            None => {
                op.parameters.insert(name.to_string(), ty.clone());
                None
            }
        });
        if let Some(conflict) = defect {
            tracing::debug!(error = %conflict, "parameter conflict recorded");
        }
        self.builder.track_related(&self.object, ty);
        self
    }

    /// Set the return type. Re-declaring replaces the previous one.
    pub fn with_return(&self, ty: &ObjectId) -> &Self {
        self.builder.register(ty);
        self.with_operation_decl(|op| op.returns = Some(ty.clone()));
        self.builder.track_related(&self.object, ty);
        self
    }

    /// Add an exception type.
    pub fn with_exception(&self, ty: &ObjectId) -> &Self {
        self.builder.register(ty);
        self.with_operation_decl(|op| {
            op.exceptions.insert(ty.clone());
        });
        self.builder.track_related(&self.object, ty);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(builder: &ModelBuilder) -> (ObjectId, ObjectId) {
        let shop = builder.domain_id("shop", "1").unwrap();
        let order = builder.object_id(&shop, "order").unwrap();
        let money = builder.object_id(&shop, "money").unwrap();
        (order, money)
    }

    #[test]
    fn referencing_an_id_registers_its_declaration() {
        let builder = ModelBuilder::new();
        let (order, money) = ids(&builder);

        builder
            .for_object_id(&order)
            .with_operation("total")
            .with_return(&money);

        let decls = builder.decls.lock();
        assert!(decls.contains_key(&order));
        assert!(decls.contains_key(&money), "return reference must register");
    }

    #[test]
    fn for_object_reuses_the_existing_declaration() {
        let builder = ModelBuilder::new();

        builder
            .for_object("shop", "1", "order")
            .unwrap()
            .with_attribute("doc", "an order");
        builder
            .for_object("Shop", "1", "Order")
            .unwrap()
            .with_attribute("owner", "sales");

        let decls = builder.decls.lock();
        assert_eq!(decls.len(), 1);
        let decl = decls.values().next().unwrap();
        assert_eq!(decl.attributes.len(), 2);
    }

    #[test]
    fn specializes_links_both_sides() {
        let builder = ModelBuilder::new();
        let (order, base) = ids(&builder);

        builder.for_object_id(&order).specializes(&base);

        let decls = builder.decls.lock();
        assert!(decls[&order].parents.contains(&base));
        assert!(decls[&base].specializations.contains(&order));
    }

    #[test]
    fn cross_domain_references_are_tracked_as_related() {
        let builder = ModelBuilder::new();
        let shop = builder.domain_id("shop", "1").unwrap();
        let billing = builder.domain_id("billing", "1").unwrap();
        let order = builder.object_id(&shop, "order").unwrap();
        let invoice = builder.object_id(&billing, "invoice").unwrap();

        builder
            .for_object_id(&order)
            .with_operation("invoice")
            .with_return(&invoice);

        let decls = builder.decls.lock();
        assert!(decls[&order].related.contains(&billing));
        assert!(decls[&invoice].related.is_empty());
    }

    #[test]
    fn same_parameter_same_type_is_a_no_op() {
        let builder = ModelBuilder::new();
        let (order, money) = ids(&builder);

        let op = builder.for_object_id(&order).with_operation("refund");
        op.with_parameter("amount", &money)
            .with_parameter("amount", &money);

        let decls = builder.decls.lock();
        let operation = &decls[&order].operations["refund"];
        assert_eq!(operation.parameters.len(), 1);
        assert!(operation.defect.is_none());
    }

    #[test]
    fn conflicting_parameter_type_records_a_defect() {
        let builder = ModelBuilder::new();
        let (order, money) = ids(&builder);

        let op = builder.for_object_id(&order).with_operation("refund");
        op.with_parameter("amount", &money).with_parameter("amount", &order);

        let decls = builder.decls.lock();
        let operation = &decls[&order].operations["refund"];
        assert!(matches!(
            operation.defect,
            Some(ModelError::DuplicateParameter { .. })
        ));
        // The original registration survives.
        assert_eq!(operation.parameters["amount"], money);
    }

    #[test]
    fn concurrent_registration_of_the_same_id_is_safe() {
        let builder = ModelBuilder::new();
        let (order, money) = ids(&builder);

        std::thread::scope(|scope| {
            scope.spawn(|| {
                for _ in 0..100 {
                    builder
                        .for_object_id(&order)
                        .with_operation("total")
                        .with_return(&money);
                }
            });
            scope.spawn(|| {
                for _ in 0..100 {
                    builder
                        .for_object_id(&order)
                        .with_operation("refund")
                        .with_parameter("amount", &money);
                }
            });
        });

        let decls = builder.decls.lock();
        assert_eq!(decls.len(), 2);
        assert_eq!(decls[&order].operations.len(), 2);
    }
}
