//! Sparse, map-backed dataview for relations where most cells are absent.
//!
//! Unlike [`crate::DenseDataview`], there is no mask buffer: a coordinate's
//! absence from the backing map *is* the mask. Maintains a per-position
//! secondary index (`eid -> coordinates`) so `slice` doesn't have to scan
//! every observed cell on every call — relevant when a relation has many
//! more candidate cells than observed ones.

use crate::error::{Error, Result};
use crate::traits::{Coord, Dataview, ObservedCell};
use irm_component_model::Value;
use rustc_hash::FxHashMap;

#[derive(Debug, Clone)]
pub struct SparseDataview {
    shape: Vec<usize>,
    cells: FxHashMap<Coord, Value>,
    /// `by_position[p]` maps an entity id at position `p` to every
    /// coordinate with that id at that position.
    by_position: Vec<FxHashMap<usize, Vec<Coord>>>,
}

impl SparseDataview {
    /// Build a sparse dataview from an explicit list of observed
    /// `(coord, value)` pairs. Coordinates not present are implicitly
    /// masked.
    pub fn new(shape: Vec<usize>, observations: Vec<(Coord, Value)>) -> Result<Self> {
        let dims = shape.len();
        let mut cells = FxHashMap::default();
        let mut by_position: Vec<FxHashMap<usize, Vec<Coord>>> =
            (0..dims).map(|_| FxHashMap::default()).collect();

        for (coord, value) in observations {
            if coord.len() != dims {
                return Err(Error::CoordArityMismatch {
                    coord: coord.clone(),
                    got: coord.len(),
                    expected: dims,
                    shape: shape.clone(),
                });
            }
            for (p, &c) in coord.iter().enumerate() {
                if c >= shape[p] {
                    return Err(Error::CoordOutOfBounds {
                        coord: coord.clone(),
                        shape: shape.clone(),
                    });
                }
            }
            for (p, &c) in coord.iter().enumerate() {
                by_position[p].entry(c).or_default().push(coord.clone());
            }
            cells.insert(coord, value);
        }

        Ok(Self {
            shape,
            cells,
            by_position,
        })
    }
}

impl Dataview for SparseDataview {
    fn dims(&self) -> usize {
        self.shape.len()
    }

    fn shape(&self) -> &[usize] {
        &self.shape
    }

    fn slice<'a>(&'a self, position: usize, eid: usize) -> Box<dyn Iterator<Item = ObservedCell> + 'a> {
        let coords = self
            .by_position
            .get(position)
            .and_then(|m| m.get(&eid))
            .map(|v| v.as_slice())
            .unwrap_or(&[]);
        Box::new(coords.iter().map(move |coord| ObservedCell {
            coord: coord.clone(),
            value: self.cells[coord],
        }))
    }

    fn n_observed(&self) -> usize {
        self.cells.len()
    }
}
