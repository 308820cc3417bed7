//! Deferred, cycle-breaking resolution of the declaration graph.
//!
//! To resolve id `X`: return the cache entry if one exists; otherwise insert
//! a placeholder for `X` into the cache *before any further work*, resolve
//! every id `X` references by the same procedure, then build `X`'s immutable
//! data and have the placeholder adopt it. A reference cycle that loops back
//! to `X` finds the placeholder already present and stops, so resolution is
//! linear in the number of distinct ids and each declaration is consumed
//! exactly once.

use std::collections::BTreeMap;

use once_cell::sync::OnceCell;

use modelforge_core::{ModelError, ModelResult, ObjectId};

use crate::builder::ObjectDecl;
use crate::graph::ModelGraph;
use crate::node::{ObjectData, ObjectModel};

/// Single-use placeholder standing in for an object model still under
/// construction.
///
/// Holds no reference to the originating declaration; the declaration is
/// consumed when resolution of its id begins, so builder state becomes
/// unreachable as the walk proceeds.
#[derive(Debug)]
pub(crate) struct DeferredModel {
    id: ObjectId,
    slot: OnceCell<ObjectData>,
}

impl DeferredModel {
    pub(crate) fn new(id: ObjectId) -> Self {
        Self {
            id,
            slot: OnceCell::new(),
        }
    }

    /// Install the finished data. A placeholder adopts exactly once.
    pub(crate) fn adopt(&self, data: ObjectData) -> ModelResult<()> {
        self.slot
            .set(data)
            .map_err(|_| ModelError::deferred(self.id.clone(), "placeholder adopted twice"))
    }

    /// Access the finished data, failing while resolution is still pending.
    pub(crate) fn force(&self) -> ModelResult<&ObjectData> {
        self.slot
            .get()
            .ok_or_else(|| ModelError::deferred(self.id.clone(), "forced before resolution completed"))
    }

    /// Finalize into an immutable node.
    pub(crate) fn into_model(self) -> ModelResult<ObjectModel> {
        match self.slot.into_inner() {
            Some(data) => Ok(ObjectModel::new(self.id, data)),
            None => Err(ModelError::deferred(
                self.id,
                "never adopted a resolved model",
            )),
        }
    }
}

/// Resolve every registered declaration into the immutable model graph.
///
/// Failures surface as [`ModelError::DeferredResolution`]; they are never
/// masked behind empty results.
pub(crate) fn resolve_all(mut decls: BTreeMap<ObjectId, ObjectDecl>) -> ModelResult<ModelGraph> {
    let mut cache: BTreeMap<ObjectId, DeferredModel> = BTreeMap::new();

    let ids: Vec<ObjectId> = decls.keys().cloned().collect();
    for id in &ids {
        resolve_id(id, &mut decls, &mut cache)?;
    }

    let mut nodes = BTreeMap::new();
    for (id, deferred) in cache {
        nodes.insert(id, deferred.into_model()?);
    }
    tracing::debug!(objects = nodes.len(), "resolved model graph");
    Ok(ModelGraph::new(nodes))
}

fn resolve_id(
    id: &ObjectId,
    decls: &mut BTreeMap<ObjectId, ObjectDecl>,
    cache: &mut BTreeMap<ObjectId, DeferredModel>,
) -> ModelResult<()> {
    if cache.contains_key(id) {
        return Ok(());
    }

    // The placeholder must be cached before any dependency work so that
    // cycles looping back to this id terminate instead of recursing.
    cache.insert(id.clone(), DeferredModel::new(id.clone()));

    // Consume the declaration; each id is resolved exactly once.
    let Some(decl) = decls.remove(id) else {
        return Err(ModelError::deferred(id.clone(), "no declaration registered"));
    };

    let references: Vec<ObjectId> = decl.references().cloned().collect();
    for referenced in &references {
        resolve_id(referenced, decls, cache)?;
    }

    let data = decl.into_data();
    let Some(placeholder) = cache.get(id) else {
        return Err(ModelError::deferred(id.clone(), "placeholder vanished"));
    };
    placeholder.adopt(data)?;

    // Read back through the placeholder: accessors forward to the adopted
    // data from here on.
    let adopted = placeholder.force()?;
    tracing::trace!(
        object = %id,
        references = references.len(),
        operations = adopted.operations.len(),
        "resolved"
    );
    Ok(())
}
