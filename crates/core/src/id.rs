//! Canonical, interned identifiers for domains and object types.
//!
//! Identity is a `(name, version)` pair for a domain and a
//! `(domain, object_name)` pair for an object within it. Names compare
//! case-insensitively; the canonical string forms `name:version` and
//! `name:version:object_name` (names lowercased) are **contractual** and are
//! used for cache keys, ordering, and diagnostics. The as-entered casing is
//! kept for display only.

use core::cmp::Ordering;
use core::fmt;
use core::hash::{Hash, Hasher};
use core::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{ModelError, ModelResult};

/// Separator of canonical identifier segments.
pub const ID_SEPARATOR: char = ':';

fn validate_segment(what: &str, value: &str) -> ModelResult<()> {
    if value.is_empty() {
        return Err(ModelError::invalid_identifier(format!(
            "{what} must not be empty"
        )));
    }
    if value.contains(ID_SEPARATOR) {
        return Err(ModelError::invalid_identifier(format!(
            "{what} '{value}' must not contain '{ID_SEPARATOR}'"
        )));
    }
    Ok(())
}

#[derive(Debug)]
struct DomainIdInner {
    /// Name as first entered. Display only, not part of identity.
    name: Box<str>,
    /// Lowercased name. The identity key.
    key: Box<str>,
    version: Box<str>,
}

/// Identity of a domain: a named, versioned namespace of object types.
///
/// Cheap to clone; prefer obtaining instances through an
/// [`Interner`](crate::interner::Interner) so equal inputs share one
/// allocation. Equality, hashing, and ordering are case-insensitive on the
/// name and exact on the version.
#[derive(Debug, Clone)]
pub struct DomainId {
    inner: Arc<DomainIdInner>,
}

impl DomainId {
    /// Create an identifier from raw parts.
    ///
    /// Segments must be non-empty and must not contain `:`. The result is
    /// not interned; it is value-equal to any interned instance with the
    /// same name (case-insensitive) and version.
    pub fn new(name: &str, version: &str) -> ModelResult<Self> {
        validate_segment("domain name", name)?;
        validate_segment("domain version", version)?;
        Ok(Self {
            inner: Arc::new(DomainIdInner {
                name: name.into(),
                key: name.to_lowercase().into_boxed_str(),
                version: version.into(),
            }),
        })
    }

    /// Lowercased domain name (the identity key).
    pub fn name(&self) -> &str {
        &self.inner.key
    }

    /// Domain name with its as-entered casing. Not contractual.
    pub fn display_name(&self) -> &str {
        &self.inner.name
    }

    pub fn version(&self) -> &str {
        &self.inner.version
    }

    /// Contractual canonical form, `name:version`.
    pub fn canonical(&self) -> String {
        format!("{}{ID_SEPARATOR}{}", self.inner.key, self.inner.version)
    }

    /// Whether two ids share one interned allocation.
    ///
    /// Diagnostic only; value equality is the semantic contract.
    pub fn shares_allocation(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl PartialEq for DomainId {
    fn eq(&self, other: &Self) -> bool {
        self.inner.key == other.inner.key && self.inner.version == other.inner.version
    }
}

impl Eq for DomainId {}

impl Hash for DomainId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.inner.key.hash(state);
        self.inner.version.hash(state);
    }
}

impl Ord for DomainId {
    fn cmp(&self, other: &Self) -> Ordering {
        (&self.inner.key, &self.inner.version).cmp(&(&other.inner.key, &other.inner.version))
    }
}

impl PartialOrd for DomainId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for DomainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{ID_SEPARATOR}{}", self.inner.key, self.inner.version)
    }
}

impl FromStr for DomainId {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split(ID_SEPARATOR).collect::<Vec<_>>().as_slice() {
            &[name, version] => Self::new(name, version),
            _ => Err(ModelError::invalid_identifier(format!(
                "'{s}' does not match name{ID_SEPARATOR}version"
            ))),
        }
    }
}

impl Serialize for DomainId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.canonical())
    }
}

impl<'de> Deserialize<'de> for DomainId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[derive(Debug)]
struct ObjectIdInner {
    domain: DomainId,
    /// Object name as first entered. Display only.
    name: Box<str>,
    /// Lowercased object name. The identity key.
    key: Box<str>,
}

/// Identity of an object type within a domain.
///
/// Canonical form `name:version:object_name`. Never reused for a different
/// semantic object. Equality is case-insensitive on the object name.
#[derive(Debug, Clone)]
pub struct ObjectId {
    inner: Arc<ObjectIdInner>,
}

impl ObjectId {
    /// Create an identifier from a domain and an object name.
    ///
    /// Not interned; see [`DomainId::new`] for the equality contract.
    pub fn new(domain: DomainId, name: &str) -> ModelResult<Self> {
        validate_segment("object name", name)?;
        Ok(Self {
            inner: Arc::new(ObjectIdInner {
                domain,
                name: name.into(),
                key: name.to_lowercase().into_boxed_str(),
            }),
        })
    }

    pub fn domain(&self) -> &DomainId {
        &self.inner.domain
    }

    /// Lowercased object name (the identity key).
    pub fn name(&self) -> &str {
        &self.inner.key
    }

    /// Object name with its as-entered casing. Not contractual.
    pub fn display_name(&self) -> &str {
        &self.inner.name
    }

    /// Contractual canonical form, `name:version:object_name`.
    pub fn canonical(&self) -> String {
        format!(
            "{}{ID_SEPARATOR}{}",
            self.inner.domain.canonical(),
            self.inner.key
        )
    }

    /// Whether two ids share one interned allocation.
    ///
    /// Diagnostic only; value equality is the semantic contract.
    pub fn shares_allocation(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl PartialEq for ObjectId {
    fn eq(&self, other: &Self) -> bool {
        self.inner.domain == other.inner.domain && self.inner.key == other.inner.key
    }
}

impl Eq for ObjectId {}

impl Hash for ObjectId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.inner.domain.hash(state);
        self.inner.key.hash(state);
    }
}

impl Ord for ObjectId {
    fn cmp(&self, other: &Self) -> Ordering {
        self.inner
            .domain
            .cmp(&other.inner.domain)
            .then_with(|| self.inner.key.cmp(&other.inner.key))
    }
}

impl PartialOrd for ObjectId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{ID_SEPARATOR}{}", self.inner.domain, self.inner.key)
    }
}

impl FromStr for ObjectId {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split(ID_SEPARATOR).collect::<Vec<_>>().as_slice() {
            &[name, version, object] => Self::new(DomainId::new(name, version)?, object),
            _ => Err(ModelError::invalid_identifier(format!(
                "'{s}' does not match name{ID_SEPARATOR}version{ID_SEPARATOR}object_name"
            ))),
        }
    }
}

impl Serialize for ObjectId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.canonical())
    }
}

impl<'de> Deserialize<'de> for ObjectId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
