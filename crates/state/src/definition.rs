//! Model definition: the shape of a `State` before any data or hypers are
//! attached.
//!
//! This is the "configuration" surface of the crate: there is no config
//! file, the model definition *is* the configuration. A caller builds one
//! in code, or reconstructs one out-of-band to pair with a deserialized
//! wire payload — callers must pair a persisted state with the
//! model-definition it was serialized against.

use irm_core::DomainIndex;
use irm_component_model::{BetaBernoulliHypers, Hypers, NormalInverseChiSqHypers};

/// The tagged component-model choices this crate ships reference
/// implementations for (Beta-Bernoulli, Normal-Inverse-Chi-Squared). A
/// production deployment would extend this enum
/// (or replace it with a dynamic registry lookup) for additional models;
/// the `State`/`Relation` machinery itself is agnostic to which variant
/// backs a given relation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ComponentModelKind {
    BetaBernoulli { alpha: f64, beta: f64 },
    NormalInverseChiSq { mu: f64, kappa: f64, nu: f64, sigmasq: f64 },
}

impl ComponentModelKind {
    /// Build a fresh `Hypers` object for this model kind.
    pub fn create_hypers(&self) -> Box<dyn Hypers> {
        match *self {
            ComponentModelKind::BetaBernoulli { alpha, beta } => {
                Box::new(BetaBernoulliHypers::new(alpha, beta))
            }
            ComponentModelKind::NormalInverseChiSq {
                mu,
                kappa,
                nu,
                sigmasq,
            } => Box::new(NormalInverseChiSqHypers::new(mu, kappa, nu, sigmasq)),
        }
    }
}

/// One relation's static shape: an ordered tuple of domain indices
/// (domains may repeat; a self-relation has the same domain at multiple
/// positions) plus the component model backing it.
#[derive(Debug, Clone)]
pub struct RelationDef {
    pub domains: Vec<DomainIndex>,
    pub model: ComponentModelKind,
}

impl RelationDef {
    pub fn new(domains: Vec<DomainIndex>, model: ComponentModelKind) -> Self {
        Self { domains, model }
    }

    pub fn arity(&self) -> usize {
        self.domains.len()
    }
}

/// The full static shape of an IRM: how many entities per domain, and the
/// relations tying domains together. Immutable for the lifetime of any
/// `State` built from it — the set of entities per domain is fixed at
/// initialization.
#[derive(Debug, Clone)]
pub struct ModelDefinition {
    /// Number of entities per domain, `domains[d] == N_d`.
    pub domains: Vec<usize>,
    pub relations: Vec<RelationDef>,
}

impl ModelDefinition {
    pub fn new(domains: Vec<usize>, relations: Vec<RelationDef>) -> Self {
        Self { domains, relations }
    }

    pub fn n_domains(&self) -> usize {
        self.domains.len()
    }

    pub fn n_relations(&self) -> usize {
        self.relations.len()
    }
}
