//! Dense and sparse dataview implementations for the IRM core.
//!
//! The relational dataview — sliced iteration over the observed cells of a
//! dense or sparse multi-dimensional array — is conceptually an external
//! collaborator, but the state machine cannot be exercised without a
//! concrete one, so this crate provides the trait contract plus two
//! concrete shapes: a row-major dense array with a mask bitmap, and a
//! sparse map keyed by coordinate.

mod dense;
mod error;
mod sparse;
mod traits;

pub use dense::DenseDataview;
pub use error::{Error, Result};
pub use sparse::SparseDataview;
pub use traits::{Coord, Dataview, ObservedCell};
