//! Explicit interning registry for identity values.

use std::collections::HashMap;

use parking_lot::Mutex;

use crate::error::ModelResult;
use crate::id::{DomainId, ObjectId};

/// Owned interning registry for [`DomainId`] and [`ObjectId`].
///
/// Repeated lookups with equal (case-insensitive) inputs return identity
/// values sharing one allocation. The registry's lifecycle is explicit: it
/// lives exactly as long as its owner, typically the builder that resolves a
/// model set. There is no process-wide default instance.
#[derive(Debug, Default)]
pub struct Interner {
    domains: Mutex<HashMap<String, DomainId>>,
    objects: Mutex<HashMap<String, ObjectId>>,
}

impl Interner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern the domain identity for `(name, version)`.
    pub fn domain_id(&self, name: &str, version: &str) -> ModelResult<DomainId> {
        let candidate = DomainId::new(name, version)?;
        let mut domains = self.domains.lock();
        Ok(domains
            .entry(candidate.canonical())
            .or_insert(candidate)
            .clone())
    }

    /// Intern the object identity for `name` within `domain`.
    pub fn object_id(&self, domain: &DomainId, name: &str) -> ModelResult<ObjectId> {
        let candidate = ObjectId::new(domain.clone(), name)?;
        let mut objects = self.objects.lock();
        Ok(objects
            .entry(candidate.canonical())
            .or_insert(candidate)
            .clone())
    }

    /// Parse and intern a canonical `name:version` string.
    pub fn parse_domain_id(&self, input: &str) -> ModelResult<DomainId> {
        let candidate: DomainId = input.parse()?;
        self.domain_id(candidate.name(), candidate.version())
    }

    /// Parse and intern a canonical `name:version:object_name` string.
    pub fn parse_object_id(&self, input: &str) -> ModelResult<ObjectId> {
        let candidate: ObjectId = input.parse()?;
        let domain = self.domain_id(candidate.domain().name(), candidate.domain().version())?;
        self.object_id(&domain, candidate.name())
    }
}
