//! The observation value type threaded through the component-model contract.
//!
//! A relation is a function from a tuple of domains to an observation
//! value. The IRM core treats this value as opaque; only the component
//! model plugged into a relation interprets it.

use serde::{Deserialize, Serialize};

/// An observed cell value.
///
/// This is intentionally small and closed: real deployments of this core
/// plug in a richer, model-library-defined value type, but for the two
/// reference conjugate models shipped here (Beta-Bernoulli, Normal-Inverse-
/// Chi-Squared) a boolean/real split is sufficient.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// A binary observation (Beta-Bernoulli relations).
    Bool(bool),
    /// A real-valued observation (Normal-Inverse-Chi-Squared relations).
    Real(f64),
}

impl Value {
    /// Unwrap as a bool, panicking if this is the wrong variant.
    ///
    /// Component models are paired with relations by construction (the
    /// caller chooses which model backs which relation), so a mismatch here
    /// indicates a caller bug, not a data condition to recover from.
    pub fn as_bool(&self) -> bool {
        match self {
            Value::Bool(b) => *b,
            Value::Real(_) => panic!("expected Value::Bool, got Value::Real"),
        }
    }

    /// Unwrap as a real, panicking if this is the wrong variant.
    pub fn as_real(&self) -> f64 {
        match self {
            Value::Real(r) => *r,
            Value::Bool(_) => panic!("expected Value::Real, got Value::Bool"),
        }
    }
}
