//! Stable, name-based identifiers for units, types and fields.
//!
//! Identifiers are the persisted form of cross-references inside a summary.
//! They hold only names, never a handle into a loaded program, so they can be
//! written by one analysis run and resolved again by the next.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Name fragments marking types whose names are not stable across program reloads.
///
/// Closure classes and proxies get synthetic, counter-based names, and array
/// types are derived rather than declared.
const UNSTABLE_MARKERS: [&str; 3] = ["$Lambda$", "[]", "$$ProxyImpl"];

/// Identifier of a declared type, by fully qualified name.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TypeId {
    /// Fully qualified type name.
    pub name: String,
}

impl TypeId {
    /// Creates a type identifier from a qualified name.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// Returns `true` if this name cannot be trusted as a resolution key in a
    /// later run (synthetic closure class, array type, or synthetic proxy).
    pub fn is_unstable(&self) -> bool {
        UNSTABLE_MARKERS.iter().any(|m| self.name.contains(m))
    }
}

/// Identifier of a unit: its owning type plus its signature.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UnitId {
    /// The declaring type.
    pub owner: TypeId,
    /// Name and descriptor of the unit within its owner, e.g. `run` or `run()V`.
    pub signature: String,
}

impl UnitId {
    /// Creates a unit identifier from an owner type name and a signature.
    pub fn new(owner: impl Into<String>, signature: impl Into<String>) -> Self {
        Self {
            owner: TypeId::new(owner),
            signature: signature.into(),
        }
    }

    /// The qualified name `Owner.signature`, as matched by the eligibility filter.
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.owner.name, self.signature)
    }

    /// A unit is unstable when its owning type is.
    pub fn is_unstable(&self) -> bool {
        self.owner.is_unstable()
    }
}

/// Identifier of a field: its owning type plus the field name.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FieldId {
    /// The declaring type.
    pub owner: TypeId,
    /// The field name.
    pub name: String,
}

impl FieldId {
    /// Creates a field identifier from an owner type name and a field name.
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: TypeId::new(owner),
            name: name.into(),
        }
    }

    /// A field is unstable when its owning type is.
    pub fn is_unstable(&self) -> bool {
        self.owner.is_unstable()
    }
}

impl fmt::Display for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.owner.name, self.signature)
    }
}

impl fmt::Display for FieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.owner.name, self.name)
    }
}

impl fmt::Debug for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeId({self})")
    }
}

impl fmt::Debug for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UnitId({self})")
    }
}

impl fmt::Debug for FieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FieldId({self})")
    }
}
