//! Beta-Bernoulli conjugate model, for binary relations.
//!
//! Grounded directly on the reference IRM implementation's test fixture,
//! which backs its binary "friends"/"likes" relations with exactly this
//! model (`distributions_model<BetaBernoulli>`). Fully conjugate, so no
//! randomness is consumed anywhere in this model.

use crate::error::{Error, Result};
use crate::special::ln_beta;
use crate::traits::{Hypers, Suffstat};
use crate::Value;
use rand::RngCore;
use serde::{Deserialize, Serialize};

/// Beta(alpha, beta) prior over the Bernoulli success probability.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BetaBernoulliHypers {
    pub alpha: f64,
    pub beta: f64,
}

impl BetaBernoulliHypers {
    pub fn new(alpha: f64, beta: f64) -> Self {
        Self { alpha, beta }
    }
}

impl Hypers for BetaBernoulliHypers {
    fn model_name(&self) -> &'static str {
        "beta_bernoulli"
    }

    fn get_hp(&self, field: &str) -> Option<f64> {
        match field {
            "alpha" => Some(self.alpha),
            "beta" => Some(self.beta),
            _ => None,
        }
    }

    fn set_hp(&mut self, field: &str, value: f64) -> Result<()> {
        if value <= 0.0 {
            return Err(Error::InvalidValue {
                field: field.to_string(),
                value,
            });
        }
        match field {
            "alpha" => self.alpha = value,
            "beta" => self.beta = value,
            _ => return Err(Error::UnknownField(field.to_string())),
        }
        Ok(())
    }

    fn to_bytes(&self) -> Vec<u8> {
        rmp_serde::to_vec(self).expect("BetaBernoulliHypers always serializes")
    }

    fn create_group(&self, _rng: &mut dyn RngCore) -> Box<dyn Suffstat> {
        Box::new(BetaBernoulliSuffstat::default())
    }

    fn suffstat_from_bytes(&self, bytes: &[u8]) -> Result<Box<dyn Suffstat>> {
        let ss: BetaBernoulliSuffstat = rmp_serde::from_slice(bytes)
            .map_err(|e| Error::UnknownField(format!("bad suffstat bytes: {e}")))?;
        Ok(Box::new(ss))
    }
}

/// Sufficient statistics for one block's worth of binary observations:
/// just the head/tail counts.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BetaBernoulliSuffstat {
    pub heads: u64,
    pub tails: u64,
}

impl Suffstat for BetaBernoulliSuffstat {
    fn add_value(&mut self, _hypers: &dyn Hypers, value: Value, _rng: &mut dyn RngCore) {
        if value.as_bool() {
            self.heads += 1;
        } else {
            self.tails += 1;
        }
    }

    fn remove_value(&mut self, _hypers: &dyn Hypers, value: Value, _rng: &mut dyn RngCore) {
        if value.as_bool() {
            self.heads -= 1;
        } else {
            self.tails -= 1;
        }
    }

    fn score_value(&self, hypers: &dyn Hypers, value: Value, _rng: &mut dyn RngCore) -> f64 {
        let alpha = hypers.get_hp("alpha").unwrap();
        let beta = hypers.get_hp("beta").unwrap();
        let p_true =
            (alpha + self.heads as f64) / (alpha + beta + self.heads as f64 + self.tails as f64);
        if value.as_bool() {
            p_true.ln()
        } else {
            (1.0 - p_true).ln()
        }
    }

    fn score_data(&self, hypers: &dyn Hypers, _rng: &mut dyn RngCore) -> f64 {
        let alpha = hypers.get_hp("alpha").unwrap();
        let beta = hypers.get_hp("beta").unwrap();
        ln_beta(alpha + self.heads as f64, beta + self.tails as f64) - ln_beta(alpha, beta)
    }

    fn to_bytes(&self) -> Vec<u8> {
        rmp_serde::to_vec(self).expect("BetaBernoulliSuffstat always serializes")
    }
}
