//! Object type kinds.

use serde::{Deserialize, Serialize};

/// Kind of a registered object type.
///
/// Objects that are only ever referenced (as a parent, parameter, return,
/// exception, or relation target) and never declared directly stay
/// `Unspecified`. The core carries the kind through to the resolved node and
/// never interprets it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectKind {
    Unspecified,
    /// Compared by value; carries no identity of its own (e.g. `Money`).
    Value,
    /// An identified, addressable type (e.g. `Order`).
    Resource,
}

impl Default for ObjectKind {
    fn default() -> Self {
        Self::Unspecified
    }
}
