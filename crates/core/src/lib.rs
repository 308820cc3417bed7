//! `modelforge-core` — identity and error primitives for the model graph.
//!
//! This crate contains **pure** building blocks (no registry or resolution
//! logic): canonical domain/object identity, the explicit interning registry,
//! object kinds, and the structural error taxonomy.

pub mod error;
pub mod id;
pub mod interner;
pub mod kind;

pub use error::{ModelError, ModelResult};
pub use id::{DomainId, ObjectId};
pub use interner::Interner;
pub use kind::ObjectKind;
