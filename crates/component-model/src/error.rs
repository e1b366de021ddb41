//! Errors a component model can raise while handling hyperparameters.

use thiserror::Error;

/// Result type for component-model operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by [`crate::Hypers`] implementations.
#[derive(Debug, Error)]
pub enum Error {
    /// `set_hp`/`get_hp_mutator` referenced a field name the model doesn't have.
    #[error("unknown hyperparameter field: {0}")]
    UnknownField(String),

    /// A hyperparameter value was out of the model's valid domain (e.g. a
    /// negative concentration, a non-positive scale).
    #[error("invalid hyperparameter value for {field}: {value}")]
    InvalidValue { field: String, value: f64 },
}
