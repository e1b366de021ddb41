//! Component-model contract for the IRM core, plus two reference conjugate
//! models: Beta-Bernoulli (binary relations) and Normal-Inverse-Chi-Squared
//! (real-valued relations).
//!
//! The conjugate-prior library itself is treated as an external
//! collaborator the core calls through a trait contract rather than owns;
//! this crate is that collaborator's minimal viable form: the trait
//! contract the core actually calls through ([`Hypers`], [`Suffstat`]) plus
//! the two reference distributions exercised by this workspace's tests.

pub mod beta_bernoulli;
pub mod error;
pub mod normal_inverse_chisq;
pub mod registry;
pub mod special;
pub mod traits;
mod value;

pub use beta_bernoulli::{BetaBernoulliHypers, BetaBernoulliSuffstat};
pub use error::{Error, Result};
pub use normal_inverse_chisq::{NormalInverseChiSqHypers, NormalInverseChiSqSuffstat};
pub use registry::{hypers_from_bytes, suffstat_from_bytes};
pub use traits::{Hypers, Suffstat};
pub use value::Value;
