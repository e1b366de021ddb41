//! The dataview contract.
//!
//! A dataview exposes read-only, sliced iteration over the observed cells
//! of one relation's backing array. The IRM state machine never mutates a
//! dataview; it only walks it during `initialize` and during
//! `iterate_over_entity_data`'s per-entity traversal.

use irm_component_model::Value;

/// A coordinate into a relation's backing array: one entity id per
/// position, `coord.len() == relation.arity()`.
pub type Coord = Vec<usize>;

/// One observed (coordinate, value) pair yielded by [`Dataview::slice`].
///
/// Named to mirror the reference implementation's `value_accessor`: a
/// masked cell must never be produced by `slice` in the first place, so by
/// the time a caller holds a `Cell` it is already known-observed.
///
/// `coord` is owned rather than borrowed: dense slices compute coordinates
/// on the fly (an odometer over every dimension but the sliced one) rather
/// than storing them, so there is no backing array to borrow from. This
/// costs an allocation per yielded cell, which is fine since slicing isn't
/// on the hot path of a single Gibbs sweep.
#[derive(Debug, Clone, PartialEq)]
pub struct ObservedCell {
    pub coord: Coord,
    pub value: Value,
}

/// Read-only, sliced access to a relation's observed data.
///
/// Implementors: [`crate::DenseDataview`] (full array + mask bitmap) and
/// [`crate::SparseDataview`] (map of only the present cells).
pub trait Dataview {
    /// Number of dimensions (the relation's arity).
    fn dims(&self) -> usize;

    /// Size of each dimension, in the same order as the relation's domain
    /// tuple.
    fn shape(&self) -> &[usize];

    /// Every observed cell whose coordinate at `position` equals `eid`,
    /// lazily. Masked cells are never yielded.
    ///
    /// Implementations return a boxed iterator rather than an associated
    /// type so the trait stays object-safe — `State` holds
    /// `&dyn Dataview` per relation without needing a generic parameter
    /// per relation's concrete dataview kind.
    fn slice<'a>(&'a self, position: usize, eid: usize) -> Box<dyn Iterator<Item = ObservedCell> + 'a>;

    /// Total number of observed (unmasked) cells across the whole dataview.
    fn n_observed(&self) -> usize;
}
