//! Tagged dispatch over the component models this crate provides.
//!
//! The core never names a concrete model type; it only calls through
//! [`crate::Hypers`]/[`crate::Suffstat`]. Deserialization is the one place
//! that needs to go the other way — from a `model_name` string on the wire
//! back to a concrete hypers object — so we keep a small registry here
//! rather than threading generics through the relation table.

use crate::beta_bernoulli::BetaBernoulliHypers;
use crate::error::{Error, Result};
use crate::normal_inverse_chisq::NormalInverseChiSqHypers;
use crate::traits::Hypers;

/// Reconstruct a hypers object from its `model_name` tag and serialized bytes.
///
/// Used when loading a relation's hypers bag back off the wire.
pub fn hypers_from_bytes(model_name: &str, bytes: &[u8]) -> Result<Box<dyn Hypers>> {
    match model_name {
        "beta_bernoulli" => {
            let hp: BetaBernoulliHypers = rmp_serde::from_slice(bytes)
                .map_err(|e| Error::UnknownField(format!("beta_bernoulli hypers: {e}")))?;
            Ok(Box::new(hp))
        }
        "normal_inverse_chisq" => {
            let hp: NormalInverseChiSqHypers = rmp_serde::from_slice(bytes)
                .map_err(|e| Error::UnknownField(format!("normal_inverse_chisq hypers: {e}")))?;
            Ok(Box::new(hp))
        }
        other => Err(Error::UnknownField(format!("unknown model: {other}"))),
    }
}

/// Reconstruct a suffstat object given the model's own hypers (which know
/// how to decode their own suffstat byte format).
pub fn suffstat_from_bytes(hypers: &dyn Hypers, bytes: &[u8]) -> Result<Box<dyn crate::Suffstat>> {
    hypers.suffstat_from_bytes(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrips_beta_bernoulli_hypers() {
        let hp = BetaBernoulliHypers::new(1.0, 2.0);
        let bytes = hp.to_bytes();
        let restored = hypers_from_bytes("beta_bernoulli", &bytes).unwrap();
        assert_eq!(restored.model_name(), "beta_bernoulli");
        assert_eq!(restored.get_hp("alpha"), Some(1.0));
        assert_eq!(restored.get_hp("beta"), Some(2.0));
    }

    #[test]
    fn roundtrips_nix_hypers() {
        let hp = NormalInverseChiSqHypers::new(0.0, 1.0, 1.0, 1.0);
        let bytes = hp.to_bytes();
        let restored = hypers_from_bytes("normal_inverse_chisq", &bytes).unwrap();
        assert_eq!(restored.model_name(), "normal_inverse_chisq");
    }

    #[test]
    fn unknown_model_name_errors() {
        assert!(hypers_from_bytes("quantum_bernoulli", &[]).is_err());
    }
}
