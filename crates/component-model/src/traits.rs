//! The component-model contract.
//!
//! The IRM core is generic over the component model backing each relation:
//! it never inspects a suffstat's internals, only calls through this
//! contract. Two reference conjugate models are provided in this crate
//! ([`crate::beta_bernoulli`], [`crate::normal_inverse_chisq`]) so the core
//! and its tests have something concrete to run against; a production
//! deployment would plug in a richer model library here instead.

use crate::error::Result;
use crate::Value;
use rand::RngCore;
use std::fmt::Debug;

/// Hyperparameters for one relation's component model.
///
/// Owned by exactly one relation within one `State`.
pub trait Hypers: Debug + Send + Sync {
    /// Name of the underlying distribution family, for diagnostics and for
    /// validating wire-format compatibility on deserialize.
    fn model_name(&self) -> &'static str;

    /// Read a scalar hyperparameter field by name (e.g. "alpha", "mu",
    /// "kappa", "sigmasq", "nu").
    fn get_hp(&self, field: &str) -> Option<f64>;

    /// Write a scalar hyperparameter field by name.
    fn set_hp(&mut self, field: &str, value: f64) -> Result<()>;

    /// Serialize the hyperparameter bag to an opaque byte string.
    fn to_bytes(&self) -> Vec<u8>;

    /// Create a fresh, empty sufficient-statistic object for a new group.
    ///
    /// Takes an RNG because non-conjugate models may need to draw an
    /// initial latent state.
    fn create_group(&self, rng: &mut dyn RngCore) -> Box<dyn Suffstat>;

    /// Reconstruct a suffstat object from bytes previously produced by
    /// [`Suffstat::to_bytes`], under these hyperparameters.
    fn suffstat_from_bytes(&self, bytes: &[u8]) -> Result<Box<dyn Suffstat>>;
}

/// A sufficient-statistic object summarizing the observations assigned to
/// one block tuple of one relation.
pub trait Suffstat: Debug {
    /// Incorporate `value` into this group's sufficient statistics.
    ///
    /// Non-conjugate models may consume randomness here.
    fn add_value(&mut self, hypers: &dyn Hypers, value: Value, rng: &mut dyn RngCore);

    /// Remove `value`'s contribution from this group's sufficient statistics.
    ///
    /// Must be an exact inverse of `add_value` for the same `value`, modulo
    /// whatever randomness either consumed.
    fn remove_value(&mut self, hypers: &dyn Hypers, value: Value, rng: &mut dyn RngCore);

    /// Posterior predictive log-probability of `value` under the *current*
    /// (pre-add) state of this group.
    fn score_value(&self, hypers: &dyn Hypers, value: Value, rng: &mut dyn RngCore) -> f64;

    /// Marginal log-likelihood of all data currently summarized by this
    /// group, under the model's prior.
    fn score_data(&self, hypers: &dyn Hypers, rng: &mut dyn RngCore) -> f64;

    /// Serialize this suffstat to an opaque byte string.
    fn to_bytes(&self) -> Vec<u8>;
}
