//! Shared types for the IRM (Infinite Relational Model) inference core.
//!
//! This crate holds only what every other crate in the workspace needs:
//! the error taxonomy and the small integer id newtypes that name
//! entities, domains, relations, groups and sufficient-statistic cells.
//! It owns no behavior.

pub mod error;
pub mod ids;

pub use error::{Error, Result};
pub use ids::{CellId, DomainIndex, EntityId, GroupId, RelationIndex};
