//! Construction-time errors for the dataview implementations.
//!
//! Unlike the IRM state machine proper, a dataview is built once from a
//! caller-supplied buffer and then only ever read; the only failure mode
//! is a malformed buffer at construction, so this taxonomy is small.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("dense dataview: data length {data_len} does not match shape {shape:?} (expected {expected})")]
    DataShapeMismatch {
        data_len: usize,
        shape: Vec<usize>,
        expected: usize,
    },

    #[error("dense dataview: mask length {mask_len} does not match data length {data_len}")]
    MaskShapeMismatch { mask_len: usize, data_len: usize },

    #[error("sparse dataview: coordinate {coord:?} has arity {got}, expected {expected} (shape {shape:?})")]
    CoordArityMismatch {
        coord: Vec<usize>,
        got: usize,
        expected: usize,
        shape: Vec<usize>,
    },

    #[error("sparse dataview: coordinate {coord:?} out of bounds for shape {shape:?}")]
    CoordOutOfBounds { coord: Vec<usize>, shape: Vec<usize> },
}
