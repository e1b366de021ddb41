//! Error types for the IRM inference core.
//!
//! We use `thiserror` for automatic `Display`/`Error` impls, mirroring the
//! rest of the workspace. There is no recoverable error path in this crate:
//! every variant here corresponds to a caller contract violation or a broken
//! structural invariant, and every one of them is meant to be fatal to the
//! operation that raised it.

use thiserror::Error;

/// Result type alias for IRM core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error taxonomy for the IRM core.
///
/// Variants are grouped by *cause*, not by call site: a contract violation
/// (bad id, wrong arity) is categorically different from a structural
/// invariant break (refcount mismatch), even though both are fatal.
#[derive(Debug, Error)]
pub enum Error {
    /// Caller referenced a domain index that does not exist.
    #[error("unknown domain index {0}")]
    UnknownDomain(usize),

    /// Caller referenced a relation index that does not exist.
    #[error("unknown relation index {0}")]
    UnknownRelation(usize),

    /// Caller referenced an entity id outside `[0, N_d)` for its domain.
    #[error("entity {eid} out of range for domain {domain} (N={n})")]
    EntityOutOfRange { domain: usize, eid: usize, n: usize },

    /// Caller referenced a group id that is not currently active in its domain.
    #[error("group {gid} is not active in domain {domain}")]
    UnknownGroup { domain: usize, gid: u64 },

    /// `add_value` called for an entity that already has an assignment.
    #[error("entity {eid} in domain {domain} is already assigned to group {gid}")]
    AlreadyAssigned { domain: usize, eid: usize, gid: u64 },

    /// `remove_value` (or anything requiring an assignment) called for an
    /// unassigned entity.
    #[error("entity {eid} in domain {domain} is not assigned")]
    NotAssigned { domain: usize, eid: usize },

    /// `delete_group` called on a group whose size is nonzero.
    #[error("group {gid} in domain {domain} is not empty (size={size})")]
    GroupNotEmpty { domain: usize, gid: u64, size: usize },

    /// `score_value` called with no empty group available in the domain.
    #[error("domain {0} has no empty group to score a fresh block against")]
    NoEmptyGroup(usize),

    /// A relation's dataview yielded a coordinate tuple whose arity does not
    /// match the relation's domain list.
    #[error("relation {relation} expected arity {expected}, dataview yielded {got}")]
    ArityMismatch {
        relation: usize,
        expected: usize,
        got: usize,
    },

    /// A sufficient-statistic cell was expected to exist (e.g. on remove)
    /// but was missing. Indicates prior corruption of relation bookkeeping.
    #[error("relation {relation} has no cell for block tuple {tuple:?}")]
    MissingCell { relation: usize, tuple: Vec<u64> },

    /// A cell's reference count would go negative on removal.
    #[error("relation {relation} cell {tuple:?} has count 0, cannot remove")]
    CellUnderflow { relation: usize, tuple: Vec<u64> },

    /// A cell with nonzero count was found while cascading a group deletion.
    /// Deleting a group that still has live data attached is a structural
    /// invariant break, not a normal precondition failure.
    #[error(
        "relation {relation} cell {tuple:?} has count {count} while deleting group {gid} in domain {domain}"
    )]
    NonemptyCellOnDelete {
        relation: usize,
        tuple: Vec<u64>,
        gid: u64,
        domain: usize,
    },

    /// The definition supplied at `initialize` time disagrees with the data
    /// (wrong arity, wrong domain count, shape mismatch with the dataview).
    #[error("model definition mismatch: {0}")]
    DefinitionMismatch(String),

    /// Serialized state disagrees with the model definition it is being
    /// loaded against (domain/relation counts, arities).
    #[error("deserialize: {0}")]
    SerializationMismatch(String),

    /// Wire encode/decode failure.
    #[error("serialization error: {0}")]
    Encoding(#[from] rmp_serde::encode::Error),

    /// Wire encode/decode failure.
    #[error("deserialization error: {0}")]
    Decoding(#[from] rmp_serde::decode::Error),
}

impl Error {
    /// True for errors that indicate corrupted bookkeeping rather than a
    /// simple bad argument from the caller. Useful for callers that want to
    /// log at a different severity; there is no recovery path either way.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            Error::MissingCell { .. }
                | Error::CellUnderflow { .. }
                | Error::NonemptyCellOnDelete { .. }
        )
    }
}
