//! `modelforge-model` — the model graph builder/resolver.
//!
//! Client code registers mutable, possibly-cyclic object type declarations
//! through the fluent [`ModelBuilder`] API; `build()` validates the full
//! registry, resolves it into an immutable [`ModelGraph`] (breaking reference
//! cycles with deferred placeholders), and partitions the result into
//! per-domain [`DomainModel`]s and cross-domain [`Ontology`]s.

pub mod builder;
pub mod domain;
pub mod graph;
pub mod node;

mod resolve;
mod validate;

pub use builder::{ModelBuilder, ObjectHandle, OperationHandle};
pub use domain::{DomainModel, DomainPartition, ModelSet, Ontology};
pub use graph::ModelGraph;
pub use node::{ObjectModel, OperationModel, RelationKind, RelationModel};

pub use modelforge_core::{DomainId, Interner, ModelError, ModelResult, ObjectId, ObjectKind};
