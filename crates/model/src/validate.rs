//! Structural validation, run once over the full registry before resolution.

use std::collections::BTreeMap;

use modelforge_core::{ModelError, ModelResult, ObjectId};

use crate::builder::ObjectDecl;

/// Validate every registered declaration.
///
/// Checks, in order: direct parent/specialization contradictions, inheritance
/// cycles of any length, operation names and recorded parameter defects, and
/// referential integrity. The first failure aborts the whole `build()` call.
pub(crate) fn validate(decls: &BTreeMap<ObjectId, ObjectDecl>) -> ModelResult<()> {
    tracing::debug!(objects = decls.len(), "validating declarations");

    for (id, decl) in decls {
        if let Some(conflicting) = decl.parents.intersection(&decl.specializations).next() {
            return Err(ModelError::inheritance_conflict(
                id.clone(),
                conflicting.clone(),
            ));
        }
    }

    detect_inheritance_cycles(decls)?;

    for (id, decl) in decls {
        for (name, operation) in &decl.operations {
            if name.trim().is_empty() {
                return Err(ModelError::invalid_identifier(format!(
                    "operation name on {id} must not be empty"
                )));
            }
            if let Some(defect) = &operation.defect {
                return Err(defect.clone());
            }
        }
        for referenced in decl.references() {
            if !decls.contains_key(referenced) {
                return Err(ModelError::unknown_object(id.clone(), referenced.clone()));
            }
        }
    }

    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    InProgress,
    Done,
}

/// Reject any cycle in the parent graph.
///
/// The merged operation/relation views recurse over the parent lineage, so a
/// cyclic lineage has no well-defined union; reference cycles through
/// parameters, returns, exceptions, and relation targets stay legal.
fn detect_inheritance_cycles(decls: &BTreeMap<ObjectId, ObjectDecl>) -> ModelResult<()> {
    let mut marks: BTreeMap<&ObjectId, Mark> = BTreeMap::new();
    for id in decls.keys() {
        if !marks.contains_key(id) {
            visit(id, decls, &mut marks)?;
        }
    }
    Ok(())
}

fn visit<'a>(
    id: &'a ObjectId,
    decls: &'a BTreeMap<ObjectId, ObjectDecl>,
    marks: &mut BTreeMap<&'a ObjectId, Mark>,
) -> ModelResult<()> {
    marks.insert(id, Mark::InProgress);
    if let Some(decl) = decls.get(id) {
        for parent in &decl.parents {
            match marks.get(parent) {
                Some(Mark::InProgress) => {
                    return Err(ModelError::inheritance_conflict(id.clone(), parent.clone()));
                }
                Some(Mark::Done) => {}
                None => visit(parent, decls, marks)?,
            }
        }
    }
    marks.insert(id, Mark::Done);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::ModelBuilder;

    fn decls_of(builder: ModelBuilder) -> BTreeMap<ObjectId, ObjectDecl> {
        // Tests drive the validator directly over the raw registry state.
        builder.into_decls()
    }

    fn object(builder: &ModelBuilder, name: &str) -> ObjectId {
        let shop = builder.domain_id("shop", "1").unwrap();
        builder.object_id(&shop, name).unwrap()
    }

    #[test]
    fn self_specialization_is_a_direct_conflict() {
        let builder = ModelBuilder::new();
        let a = object(&builder, "a");
        builder.for_object_id(&a).specializes(&a);

        let err = validate(&decls_of(builder)).unwrap_err();
        assert_eq!(err, ModelError::inheritance_conflict(a.clone(), a));
    }

    #[test]
    fn longer_inheritance_cycles_are_rejected() {
        let builder = ModelBuilder::new();
        let a = object(&builder, "a");
        let b = object(&builder, "b");
        let c = object(&builder, "c");
        builder.for_object_id(&a).specializes(&b);
        builder.for_object_id(&b).specializes(&c);
        builder.for_object_id(&c).specializes(&a);

        let err = validate(&decls_of(builder)).unwrap_err();
        assert!(matches!(err, ModelError::InheritanceConflict { .. }));
    }

    #[test]
    fn acyclic_inheritance_chains_pass() {
        let builder = ModelBuilder::new();
        let a = object(&builder, "a");
        let b = object(&builder, "b");
        let c = object(&builder, "c");
        builder.for_object_id(&b).specializes(&a);
        builder.for_object_id(&c).specializes(&b);
        builder.for_object_id(&c).specializes(&a);

        assert!(validate(&decls_of(builder)).is_ok());
    }

    #[test]
    fn empty_operation_names_are_rejected() {
        let builder = ModelBuilder::new();
        let a = object(&builder, "a");
        builder.for_object_id(&a).with_operation("  ");

        let err = validate(&decls_of(builder)).unwrap_err();
        assert!(matches!(err, ModelError::InvalidIdentifier(_)));
    }

    #[test]
    fn recorded_parameter_defects_are_replayed() {
        let builder = ModelBuilder::new();
        let a = object(&builder, "a");
        let b = object(&builder, "b");
        builder
            .for_object_id(&a)
            .with_operation("op")
            .with_parameter("p", &a)
            .with_parameter("p", &b);

        let err = validate(&decls_of(builder)).unwrap_err();
        assert!(matches!(err, ModelError::DuplicateParameter { .. }));
    }

    #[test]
    fn dangling_references_are_rejected() {
        // The fluent API registers everything it touches, so fabricate a
        // dangling reference directly in the registry state.
        let builder = ModelBuilder::new();
        let a = object(&builder, "a");
        let ghost = object(&builder, "ghost");
        builder.for_object_id(&a).with_operation("op").with_return(&ghost);

        let mut decls = decls_of(builder);
        decls.remove(&ghost);

        let err = validate(&decls).unwrap_err();
        assert_eq!(err, ModelError::unknown_object(a, ghost));
    }
}
