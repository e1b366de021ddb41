//! The per-domain bound facade.
//!
//! Given a shared state and a fixed domain index, presents the domain as a
//! generic "entity-clustered state" interface for an outer sampler:
//! `nentities / ngroups / empty_groups / assignments / add_value /
//! remove_value / score_value / score_likelihood / create_group /
//! delete_group`. A thin projection; all semantics are inherited from
//! `State` — every method here is a one-line delegation.
//!
//! The concurrency model is single-threaded cooperative with no internal
//! locking: a caller may hold multiple bound views over the same `State`
//! but must serialize all calls that cross the read/write boundary.
//! Rather than police that at runtime (the reference implementation leaves
//! it to caller discipline), this facade borrows `&mut State` for its own
//! lifetime: the borrow checker statically forbids two live bound views
//! (or a bound view and a direct `State` call) from racing, which is a
//! strictly stronger guarantee than the source model asks for for free.

use crate::definition::ModelDefinition;
use crate::state::State;
use irm_core::{CellId, DomainIndex, EntityId, GroupId, RelationIndex, Result};
use irm_dataview::Dataview;
use rand::RngCore;

/// A fixed-domain projection over a `State`, for outer samplers that think
/// in terms of "the entity-clustered state for domain d" rather than the
/// full multi-domain `State`.
pub struct BoundDomain<'a> {
    state: &'a mut State,
    domain: DomainIndex,
    data: &'a [&'a dyn Dataview],
}

impl<'a> BoundDomain<'a> {
    /// Bind `domain` within `state` for the lifetime of this view. `data`
    /// must be the same per-relation dataview slice the state was built
    /// (or is being driven) with; the bound view borrows it, it does not
    /// own it. The dataview itself is read-only and may be shared by many
    /// `State` instances.
    pub fn new(state: &'a mut State, domain: DomainIndex, data: &'a [&'a dyn Dataview]) -> Result<Self> {
        if domain.0 >= state.n_domains() {
            return Err(irm_core::Error::UnknownDomain(domain.0));
        }
        Ok(Self { state, domain, data })
    }

    pub fn domain_index(&self) -> DomainIndex {
        self.domain
    }

    /// Number of entities in the bound domain. Fixed for the `State`'s
    /// lifetime — no online learning of domain membership.
    pub fn nentities(&self) -> usize {
        self.state.domain(self.domain).n_entities()
    }

    /// Number of currently active groups (empty + nonempty).
    pub fn ngroups(&self) -> usize {
        self.state.domain(self.domain).n_groups()
    }

    /// Currently empty groups, in ascending gid order.
    pub fn empty_groups(&self) -> Vec<GroupId> {
        self.state.domain(self.domain).empty_groups().collect()
    }

    /// Current assignment of every entity in the bound domain.
    pub fn assignments(&self) -> Vec<Option<GroupId>> {
        self.state.domain(self.domain).assignments().to_vec()
    }

    pub fn assignment(&self, eid: EntityId) -> Option<GroupId> {
        self.state.domain(self.domain).assignment(eid)
    }

    pub fn create_group(&mut self) -> Result<GroupId> {
        self.state.create_group(self.domain)
    }

    pub fn delete_group(&mut self, gid: GroupId) -> Result<()> {
        self.state.delete_group(self.domain, gid)
    }

    pub fn add_value(&mut self, gid: GroupId, eid: EntityId, rng: &mut dyn RngCore) -> Result<()> {
        self.state.add_value(self.domain, gid, eid, self.data, rng)
    }

    pub fn remove_value(&mut self, eid: EntityId, rng: &mut dyn RngCore) -> Result<GroupId> {
        self.state.remove_value(self.domain, eid, self.data, rng)
    }

    pub fn score_value(
        &mut self,
        eid: EntityId,
        rng: &mut dyn RngCore,
    ) -> Result<(Vec<GroupId>, Vec<f64>)> {
        self.state.score_value(self.domain, eid, self.data, rng)
    }

    /// Data log-likelihood of one relation this domain participates in.
    /// Unlike the other methods, this takes an explicit `RelationIndex`
    /// rather than being implicitly scoped to `self.domain` — a domain can
    /// participate in several relations, and `score_likelihood` is a
    /// passthrough to the underlying `State` operation, which is itself
    /// per-relation.
    pub fn score_likelihood(
        &self,
        relation: RelationIndex,
        ident: Option<CellId>,
        rng: &mut dyn RngCore,
    ) -> Result<f64> {
        self.state.score_likelihood(relation, ident, rng)
    }

    /// Access the underlying definition-agnostic domain/relation indices
    /// this domain participates in, for callers that need to resolve
    /// `score_likelihood`'s `RelationIndex` arguments from scratch.
    pub fn participation(&self) -> &[(RelationIndex, usize)] {
        &self.state.domain_participation()[self.domain.0]
    }
}

/// Build a `ModelDefinition`-shaped description of which relations a bound
/// domain should consult, for callers that want to drive scoring across
/// every relation the domain participates in without re-deriving the
/// adjacency themselves. Thin convenience built on the domain→participation
/// index `State` already precomputes.
pub fn relations_for_domain(defn: &ModelDefinition, domain: DomainIndex) -> Vec<RelationIndex> {
    defn.relations
        .iter()
        .enumerate()
        .filter(|(_, rd)| rd.domains.contains(&domain))
        .map(|(r, _)| RelationIndex(r))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::{ComponentModelKind, RelationDef};
    use irm_core::DomainIndex;
    use irm_dataview::DenseDataview;

    fn defn(n: usize) -> ModelDefinition {
        ModelDefinition::new(
            vec![n],
            vec![RelationDef::new(
                vec![DomainIndex(0), DomainIndex(0)],
                ComponentModelKind::BetaBernoulli {
                    alpha: 1.0,
                    beta: 1.0,
                },
            )],
        )
    }

    fn rng() -> impl RngCore {
        rand::rngs::mock::StepRng::new(0, 1)
    }

    #[test]
    fn bound_domain_delegates_to_state() {
        let d = defn(3);
        let data: Vec<_> = (0..9).map(|_| irm_component_model::Value::Bool(true)).collect();
        let view = DenseDataview::fully_observed(vec![3, 3], data).unwrap();
        let views: Vec<&dyn Dataview> = vec![&view];
        let mut r = rng();
        let mut state = State::initialize(
            &d,
            &[1.0],
            vec![ComponentModelKind::BetaBernoulli { alpha: 1.0, beta: 1.0 }.create_hypers()],
            vec![None],
            &views,
            &mut r,
        )
        .unwrap();

        let mut bound = BoundDomain::new(&mut state, DomainIndex(0), &views).unwrap();
        assert_eq!(bound.nentities(), 3);
        let extra = bound.create_group().unwrap();
        assert!(bound.empty_groups().contains(&extra));
        let gid = bound.remove_value(EntityId(0), &mut r).unwrap();
        bound.add_value(gid, EntityId(0), &mut r).unwrap();
        assert_eq!(bound.assignment(EntityId(0)), Some(gid));
    }

    #[test]
    fn relations_for_domain_finds_self_relation() {
        let d = defn(3);
        let rels = relations_for_domain(&d, DomainIndex(0));
        assert_eq!(rels, vec![RelationIndex(0)]);
    }
}
