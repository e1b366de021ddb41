//! Normal-Inverse-Chi-Squared conjugate model, for real-valued relations.
//!
//! Suffstat fields are named for a field-wise round-trip check after
//! serialization: "mean", "count_times_variance", "count".

use crate::error::{Error, Result};
use crate::special::ln_gamma;
use crate::traits::{Hypers, Suffstat};
use crate::Value;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Normal-Inverse-Chi-Squared prior: `mu` and `kappa` govern the prior on
/// the mean, `nu` and `sigmasq` govern the prior on the variance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalInverseChiSqHypers {
    pub mu: f64,
    pub kappa: f64,
    pub nu: f64,
    pub sigmasq: f64,
}

impl NormalInverseChiSqHypers {
    pub fn new(mu: f64, kappa: f64, nu: f64, sigmasq: f64) -> Self {
        Self {
            mu,
            kappa,
            nu,
            sigmasq,
        }
    }
}

impl Hypers for NormalInverseChiSqHypers {
    fn model_name(&self) -> &'static str {
        "normal_inverse_chisq"
    }

    fn get_hp(&self, field: &str) -> Option<f64> {
        match field {
            "mu" => Some(self.mu),
            "kappa" => Some(self.kappa),
            "nu" => Some(self.nu),
            "sigmasq" => Some(self.sigmasq),
            _ => None,
        }
    }

    fn set_hp(&mut self, field: &str, value: f64) -> Result<()> {
        match field {
            "mu" => self.mu = value,
            "kappa" | "nu" | "sigmasq" if value <= 0.0 => {
                return Err(Error::InvalidValue {
                    field: field.to_string(),
                    value,
                })
            }
            "kappa" => self.kappa = value,
            "nu" => self.nu = value,
            "sigmasq" => self.sigmasq = value,
            _ => return Err(Error::UnknownField(field.to_string())),
        }
        Ok(())
    }

    fn to_bytes(&self) -> Vec<u8> {
        rmp_serde::to_vec(self).expect("NormalInverseChiSqHypers always serializes")
    }

    fn create_group(&self, _rng: &mut dyn RngCore) -> Box<dyn Suffstat> {
        Box::new(NormalInverseChiSqSuffstat::default())
    }

    fn suffstat_from_bytes(&self, bytes: &[u8]) -> Result<Box<dyn Suffstat>> {
        let ss: NormalInverseChiSqSuffstat = rmp_serde::from_slice(bytes)
            .map_err(|e| Error::UnknownField(format!("bad suffstat bytes: {e}")))?;
        Ok(Box::new(ss))
    }
}

/// Running (count, mean, sum-of-squared-deviations) maintained via Welford's
/// algorithm, so add/remove are numerically stable and exactly invertible.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NormalInverseChiSqSuffstat {
    pub count: u64,
    pub mean: f64,
    pub count_times_variance: f64,
}

/// The four scalar hyperparameters this model needs, read out of whatever
/// `Hypers` impl the relation carries (always a `NormalInverseChiSqHypers`
/// by construction, but we read it through the trait so the suffstat never
/// needs to know the concrete type).
struct NixParams {
    mu: f64,
    kappa: f64,
    nu: f64,
    sigmasq: f64,
}

fn read_params(hypers: &dyn Hypers) -> NixParams {
    NixParams {
        mu: hypers.get_hp("mu").expect("nix hypers expose mu"),
        kappa: hypers.get_hp("kappa").expect("nix hypers expose kappa"),
        nu: hypers.get_hp("nu").expect("nix hypers expose nu"),
        sigmasq: hypers
            .get_hp("sigmasq")
            .expect("nix hypers expose sigmasq"),
    }
}

impl NormalInverseChiSqSuffstat {
    /// Posterior (kappa_n, mu_n, nu_n, nu_n*sigma_n^2) given these sufficient
    /// statistics and the prior hyperparameters.
    fn posterior(&self, hp: &NixParams) -> (f64, f64, f64, f64) {
        let n = self.count as f64;
        let kappa_n = hp.kappa + n;
        let mu_n = (hp.kappa * hp.mu + n * self.mean) / kappa_n;
        let nu_n = hp.nu + n;
        let nu_n_sigma_n_sq = hp.nu * hp.sigmasq
            + self.count_times_variance
            + (hp.kappa * n / kappa_n) * (self.mean - hp.mu).powi(2);
        (kappa_n, mu_n, nu_n, nu_n_sigma_n_sq)
    }
}

/// log pdf of the (non-standardized) Student-t distribution.
fn student_t_log_pdf(x: f64, df: f64, loc: f64, scale_sq: f64) -> f64 {
    let z2 = (x - loc).powi(2) / (df * scale_sq);
    ln_gamma((df + 1.0) / 2.0) - ln_gamma(df / 2.0) - 0.5 * (df * PI * scale_sq).ln()
        - ((df + 1.0) / 2.0) * (1.0 + z2).ln()
}

impl Suffstat for NormalInverseChiSqSuffstat {
    fn add_value(&mut self, _hypers: &dyn Hypers, value: Value, _rng: &mut dyn RngCore) {
        let x = value.as_real();
        self.count += 1;
        let n = self.count as f64;
        let delta = x - self.mean;
        self.mean += delta / n;
        let delta2 = x - self.mean;
        self.count_times_variance += delta * delta2;
    }

    fn remove_value(&mut self, _hypers: &dyn Hypers, value: Value, _rng: &mut dyn RngCore) {
        let x = value.as_real();
        if self.count == 1 {
            self.count = 0;
            self.mean = 0.0;
            self.count_times_variance = 0.0;
            return;
        }
        let n = self.count as f64;
        let mean_old = (n * self.mean - x) / (n - 1.0);
        let delta = x - mean_old;
        let delta2 = x - self.mean;
        self.count_times_variance -= delta * delta2;
        self.mean = mean_old;
        self.count -= 1;
    }

    fn score_value(&self, hypers: &dyn Hypers, value: Value, _rng: &mut dyn RngCore) -> f64 {
        let hp = read_params(hypers);
        let (kappa_n, mu_n, nu_n, nu_n_sigma_n_sq) = self.posterior(&hp);
        let sigma_n_sq = nu_n_sigma_n_sq / nu_n;
        let pred_scale_sq = sigma_n_sq * (kappa_n + 1.0) / kappa_n;
        student_t_log_pdf(value.as_real(), nu_n, mu_n, pred_scale_sq)
    }

    fn score_data(&self, hypers: &dyn Hypers, _rng: &mut dyn RngCore) -> f64 {
        let hp = read_params(hypers);
        if self.count == 0 {
            return 0.0;
        }
        let n = self.count as f64;
        let (kappa_n, _mu_n, nu_n, nu_n_sigma_n_sq) = self.posterior(&hp);
        -0.5 * n * (2.0 * PI).ln() + 0.5 * (hp.kappa / kappa_n).ln()
            + (hp.nu / 2.0) * (hp.nu * hp.sigmasq).ln()
            - (nu_n / 2.0) * nu_n_sigma_n_sq.ln()
            + ln_gamma(nu_n / 2.0)
            - ln_gamma(hp.nu / 2.0)
    }

    fn to_bytes(&self) -> Vec<u8> {
        rmp_serde::to_vec(self).expect("NormalInverseChiSqSuffstat always serializes")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rng() -> impl RngCore {
        rand::rngs::mock::StepRng::new(0, 1)
    }

    #[test]
    fn add_remove_roundtrip_restores_suffstat() {
        let hp = NormalInverseChiSqHypers::new(0.0, 1.0, 1.0, 1.0);
        let mut ss = NormalInverseChiSqSuffstat::default();
        let mut r = rng();
        for x in [1.0, 2.0, 3.5, -1.2, 0.7] {
            ss.add_value(&hp, Value::Real(x), &mut r);
        }
        let snapshot = ss.clone();
        ss.add_value(&hp, Value::Real(9.9), &mut r);
        ss.remove_value(&hp, Value::Real(9.9), &mut r);
        assert_eq!(ss.count, snapshot.count);
        assert!((ss.mean - snapshot.mean).abs() < 1e-9);
        assert!((ss.count_times_variance - snapshot.count_times_variance).abs() < 1e-9);
    }

    #[test]
    fn single_point_remove_resets_to_empty() {
        let hp = NormalInverseChiSqHypers::new(0.0, 1.0, 1.0, 1.0);
        let mut ss = NormalInverseChiSqSuffstat::default();
        let mut r = rng();
        ss.add_value(&hp, Value::Real(4.2), &mut r);
        ss.remove_value(&hp, Value::Real(4.2), &mut r);
        assert_eq!(ss.count, 0);
        assert_eq!(ss.mean, 0.0);
        assert_eq!(ss.count_times_variance, 0.0);
    }

    #[test]
    fn score_data_empty_group_is_zero() {
        let hp = NormalInverseChiSqHypers::new(0.0, 1.0, 1.0, 1.0);
        let ss = NormalInverseChiSqSuffstat::default();
        let mut r = rng();
        assert_eq!(ss.score_data(&hp, &mut r), 0.0);
    }

    #[test]
    fn score_value_is_finite_and_decreases_away_from_mean() {
        let hp = NormalInverseChiSqHypers::new(0.0, 1.0, 5.0, 1.0);
        let mut ss = NormalInverseChiSqSuffstat::default();
        let mut r = rng();
        for x in [0.0, 0.1, -0.1, 0.2] {
            ss.add_value(&hp, Value::Real(x), &mut r);
        }
        let near = ss.score_value(&hp, Value::Real(0.0), &mut r);
        let far = ss.score_value(&hp, Value::Real(50.0), &mut r);
        assert!(near.is_finite() && far.is_finite());
        assert!(near > far);
    }
}
