//! # IRM
//!
//! An Infinite Relational Model inference core: a nonparametric Bayesian
//! state object that maintains a joint clustering of entities across
//! multiple typed domains based on observed multi-domain relational data.
//!
//! Given K domains (disjoint sets of entities) and R relations (each a
//! function from a tuple of domains to an observation value), [`State`]
//! discovers a latent block structure in which every relation's data is
//! explained by the cross product of its domains' block assignments, and
//! supports incremental Gibbs-style sampling: for any entity in any
//! domain, remove it from its block, score the posterior predictive
//! likelihood of every candidate block (including a fresh one), and
//! reassign it.
//!
//! # Quick start
//!
//! ```
//! use irm::{ComponentModelKind, DenseDataview, Dataview, ModelDefinition, RelationDef, State, Value};
//! use irm_core::{DomainIndex, EntityId};
//! use rand::SeedableRng;
//!
//! // One domain of 6 entities, one binary self-relation ("friendship").
//! let defn = ModelDefinition::new(
//!     vec![6],
//!     vec![RelationDef::new(
//!         vec![DomainIndex(0), DomainIndex(0)],
//!         ComponentModelKind::BetaBernoulli { alpha: 1.0, beta: 1.0 },
//!     )],
//! );
//!
//! let data: Vec<_> = (0..36).map(|i| Value::Bool(i % 3 == 0)).collect();
//! let view = DenseDataview::fully_observed(vec![6, 6], data).unwrap();
//! let views: Vec<&dyn Dataview> = vec![&view];
//!
//! let mut rng = rand::rngs::StdRng::seed_from_u64(42);
//! let mut state = State::initialize(
//!     &defn,
//!     &[1.0],
//!     vec![ComponentModelKind::BetaBernoulli { alpha: 1.0, beta: 1.0 }.create_hypers()],
//!     vec![None],
//!     &views,
//!     &mut rng,
//! )?;
//!
//! // One incremental Gibbs step for entity 0.
//! state.create_group(DomainIndex(0))?; // ensure a fresh-block candidate exists
//! let gid = state.remove_value(DomainIndex(0), EntityId(0), &views, &mut rng)?;
//! let (gids, log_weights) = state.score_value(DomainIndex(0), EntityId(0), &views, &mut rng)?;
//! // an outer sampler would sample `gids[i]` proportional to `exp(log_weights[i])` here
//! state.add_value(DomainIndex(0), gids[0], EntityId(0), &views, &mut rng)?;
//! # let _ = gid;
//! # Ok::<(), irm_core::Error>(())
//! ```
//!
//! # Crate layout
//!
//! The workspace is organized leaves-first:
//!
//! | crate | role |
//! |---|---|
//! | `irm-core` | shared error taxonomy and integer id newtypes |
//! | `irm-component-model` | the `Hypers`/`Suffstat` contract plus Beta-Bernoulli and Normal-Inverse-Chi-Squared reference models |
//! | `irm-dataview` | the `Dataview` contract plus dense and sparse implementations |
//! | `irm-domain` | per-domain CRP group bookkeeping |
//! | `irm-relation` | per-relation sufficient-statistic cell tables |
//! | `irm-state` | the `State` object, model definitions, the bound facade, and the wire format |
//!
//! Only this crate's re-exported surface is meant to be depended on
//! directly by an outer MCMC sampler or language binding; the constituent
//! crates are internal implementation seams.

pub use irm_component_model::{
    BetaBernoulliHypers, BetaBernoulliSuffstat, Hypers, NormalInverseChiSqHypers,
    NormalInverseChiSqSuffstat, Suffstat, Value,
};
pub use irm_dataview::{Dataview, DenseDataview, SparseDataview};
pub use irm_domain::Domain;
pub use irm_relation::Relation;
pub use irm_state::{BoundDomain, ComponentModelKind, ModelDefinition, RelationDef, State};

pub use irm_core::{CellId, DomainIndex, EntityId, Error, GroupId, RelationIndex, Result};
