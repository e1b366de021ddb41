//! Small integer identifiers shared across the IRM core.
//!
//! Entities, domains, relations and groups are all small integers. We still
//! wrap them in newtypes so a `GroupId` can never be passed where an
//! `EntityId` is expected, matching the teacher's style of typed wrappers
//! over raw integers (e.g. `VectorId`, `BranchId`).

use serde::{Deserialize, Serialize};
use std::fmt;

/// Index of a domain within a model definition. Stable for the lifetime of
/// a `State` (domains are never added or removed after construction).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DomainIndex(pub usize);

impl fmt::Display for DomainIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "domain#{}", self.0)
    }
}

/// Index of a relation within a model definition. Stable for the lifetime
/// of a `State`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RelationIndex(pub usize);

impl fmt::Display for RelationIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "relation#{}", self.0)
    }
}

/// An entity within a domain: an integer in `[0, N_d)`. `N_d` is fixed at
/// construction; domain membership never grows or shrinks afterward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub usize);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "e{}", self.0)
    }
}

/// A group (block) id, drawn from a monotonically increasing per-domain
/// counter. Group ids are never reused within a domain's lifetime: a
/// deleted gid is not re-issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GroupId(pub u64);

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "g{}", self.0)
    }
}

/// A stable per-relation identifier for a sufficient-statistic cell. Never
/// reused within a relation's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellId(pub u64);

impl fmt::Display for CellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cell{}", self.0)
    }
}
