//! The top-level `State` object: composes every domain and relation, and
//! implements the add/remove/score entity operations that touch every
//! relation an entity participates in.

use crate::definition::ModelDefinition;
use irm_component_model::Hypers;
use irm_core::{CellId, DomainIndex, Error, EntityId, GroupId, RelationIndex, Result};
use irm_dataview::Dataview;
use irm_domain::Domain;
use irm_relation::{BlockTuple, Relation};
use rand::{Rng, RngCore};
use tracing::{debug, trace_span};

/// The composed IRM state: every domain's CRP bookkeeping, every
/// relation's sufficient-statistic table, and the precomputed domain→
/// relation adjacency used by the `iterate_over_entity_data` traversal
/// pattern.
#[derive(Debug)]
pub struct State {
    domains: Vec<Domain>,
    relations: Vec<Relation>,
    /// `domain_participation[d]` is the list of `(relation, position)`
    /// pairs in which domain `d` appears. Precomputed once at construction,
    /// immutable thereafter.
    domain_participation: Vec<Vec<(RelationIndex, usize)>>,
}

/// Resolve every position of a block tuple via the domains' *actual*
/// current assignments.
fn resolve_tuple(domains: &[Domain], rel_domains: &[usize], coord: &[usize]) -> Result<BlockTuple> {
    let mut tuple = BlockTuple::with_capacity(rel_domains.len());
    for (i, &dom) in rel_domains.iter().enumerate() {
        let gid = domains[dom]
            .assignment(EntityId(coord[i]))
            .ok_or(Error::NotAssigned {
                domain: dom,
                eid: coord[i],
            })?;
        tuple.push(gid);
    }
    Ok(tuple)
}

/// Like [`resolve_tuple`], but every occurrence of `(override_domain,
/// override_eid)` resolves to `override_gid` instead of consulting the
/// domain's real assignment. Used by `score_value` to hypothetically place
/// `eid` into a candidate group without actually mutating the domain.
fn resolve_tuple_with_override(
    domains: &[Domain],
    rel_domains: &[usize],
    coord: &[usize],
    override_domain: usize,
    override_eid: usize,
    override_gid: GroupId,
) -> Result<BlockTuple> {
    let mut tuple = BlockTuple::with_capacity(rel_domains.len());
    for (i, &dom) in rel_domains.iter().enumerate() {
        if dom == override_domain && coord[i] == override_eid {
            tuple.push(override_gid);
        } else {
            let gid = domains[dom]
                .assignment(EntityId(coord[i]))
                .ok_or(Error::NotAssigned {
                    domain: dom,
                    eid: coord[i],
                })?;
            tuple.push(gid);
        }
    }
    Ok(tuple)
}

pub(crate) fn build_domain_participation(defn: &ModelDefinition) -> Vec<Vec<(RelationIndex, usize)>> {
    let mut participation = vec![Vec::new(); defn.n_domains()];
    for (r, rd) in defn.relations.iter().enumerate() {
        for (p, d) in rd.domains.iter().enumerate() {
            participation[d.0].push((RelationIndex(r), p));
        }
    }
    participation
}

/// Generate a uniformly random assignment for a domain with `n` entities:
/// `min(100, n) + 1` candidate groups, each entity placed independently
/// and uniformly.
fn random_assignment(n: usize, rng: &mut dyn RngCore) -> Vec<usize> {
    let g_target = n.min(100) + 1;
    (0..n).map(|_| rng.gen_range(0..g_target)).collect()
}

impl State {
    /// Produce a structurally valid but semantically empty state: domains
    /// exist with `N_d` entities all unassigned, no groups, hypers
    /// uninitialized (placeholder alpha=1.0, placeholder component
    /// hypers). Used by loaders and tests.
    pub fn unsafe_initialize(defn: &ModelDefinition) -> Self {
        let domains = defn
            .domains
            .iter()
            .enumerate()
            .map(|(i, &n)| Domain::new(DomainIndex(i), n, 1.0))
            .collect();
        let relations = defn
            .relations
            .iter()
            .map(|rd| {
                Relation::new(
                    rd.domains.iter().map(|d| d.0).collect(),
                    rd.model.create_hypers(),
                )
            })
            .collect();
        Self {
            domains,
            relations,
            domain_participation: build_domain_participation(defn),
        }
    }

    /// Materialize a fully initialized state: hypers applied, every entity
    /// assigned (randomly if no initial assignment is given), every
    /// relation's observed cells installed.
    pub fn initialize(
        defn: &ModelDefinition,
        domain_hps: &[f64],
        relation_hypers: Vec<Box<dyn Hypers>>,
        initial_assignments: Vec<Option<Vec<GroupId>>>,
        data: &[&dyn Dataview],
        rng: &mut dyn RngCore,
    ) -> Result<Self> {
        if domain_hps.len() != defn.n_domains() {
            return Err(Error::DefinitionMismatch(format!(
                "expected {} domain hypers, got {}",
                defn.n_domains(),
                domain_hps.len()
            )));
        }
        if relation_hypers.len() != defn.n_relations() {
            return Err(Error::DefinitionMismatch(format!(
                "expected {} relation hypers, got {}",
                defn.n_relations(),
                relation_hypers.len()
            )));
        }
        if initial_assignments.len() != defn.n_domains() {
            return Err(Error::DefinitionMismatch(format!(
                "expected {} initial assignments, got {}",
                defn.n_domains(),
                initial_assignments.len()
            )));
        }
        if data.len() != defn.n_relations() {
            return Err(Error::DefinitionMismatch(format!(
                "expected {} dataviews, got {}",
                defn.n_relations(),
                data.len()
            )));
        }
        for (r, rd) in defn.relations.iter().enumerate() {
            let expected_shape: Vec<usize> = rd.domains.iter().map(|d| defn.domains[d.0]).collect();
            if data[r].shape() != expected_shape.as_slice() {
                return Err(Error::ArityMismatch {
                    relation: r,
                    expected: expected_shape.len(),
                    got: data[r].shape().len(),
                });
            }
        }

        debug!(
            n_domains = defn.n_domains(),
            n_relations = defn.n_relations(),
            "initializing IRM state"
        );

        let mut state = Self::unsafe_initialize(defn);
        for (i, &alpha) in domain_hps.iter().enumerate() {
            state.domains[i].set_alpha(alpha);
        }
        for (i, hp) in relation_hypers.into_iter().enumerate() {
            state.relations[i].set_hypers(hp);
        }

        for d in 0..defn.n_domains() {
            let n = defn.domains[d];
            let assignment: Vec<usize> = match &initial_assignments[d] {
                Some(given) => {
                    if given.len() != n {
                        return Err(Error::DefinitionMismatch(format!(
                            "domain {d}: initial assignment length {} != N_d {n}",
                            given.len()
                        )));
                    }
                    given.iter().map(|g| g.0 as usize).collect()
                }
                None => random_assignment(n, rng),
            };
            let g = assignment.iter().copied().max().map(|m| m + 1).unwrap_or(0);
            for _ in 0..g {
                state.domains[d].create_group();
            }
            for (eid, &gid) in assignment.iter().enumerate() {
                state.domains[d].add_value(GroupId(gid as u64), EntityId(eid))?;
            }
        }

        for r in 0..defn.n_relations() {
            let view = data[r];
            let outer_n = view.shape().first().copied().unwrap_or(0);
            for outer in 0..outer_n {
                for cell in view.slice(0, outer) {
                    let rel_domains = state.relations[r].domains().to_vec();
                    let tuple = resolve_tuple(&state.domains, &rel_domains, &cell.coord)?;
                    state.relations[r].add_value_to_cell(tuple, cell.value, rng, None);
                }
            }
        }

        Ok(state)
    }

    /// Assemble a `State` directly from its parts. Used only by the wire
    /// format (`crate::wire`) when reconstructing a deserialized state,
    /// where every part has already been validated against the model
    /// definition.
    pub(crate) fn from_parts(
        domains: Vec<Domain>,
        relations: Vec<Relation>,
        domain_participation: Vec<Vec<(RelationIndex, usize)>>,
    ) -> Self {
        Self {
            domains,
            relations,
            domain_participation,
        }
    }

    fn check_domain(&self, d: DomainIndex) -> Result<()> {
        if d.0 >= self.domains.len() {
            Err(Error::UnknownDomain(d.0))
        } else {
            Ok(())
        }
    }

    fn check_relation(&self, r: RelationIndex) -> Result<()> {
        if r.0 >= self.relations.len() {
            Err(Error::UnknownRelation(r.0))
        } else {
            Ok(())
        }
    }

    pub fn n_domains(&self) -> usize {
        self.domains.len()
    }

    pub fn n_relations(&self) -> usize {
        self.relations.len()
    }

    pub fn domain(&self, d: DomainIndex) -> &Domain {
        &self.domains[d.0]
    }

    pub fn relation(&self, r: RelationIndex) -> &Relation {
        &self.relations[r.0]
    }

    pub(crate) fn domains_slice(&self) -> &[Domain] {
        &self.domains
    }

    pub(crate) fn relations_slice(&self) -> &[Relation] {
        &self.relations
    }

    pub(crate) fn domain_participation(&self) -> &[Vec<(RelationIndex, usize)>] {
        &self.domain_participation
    }

    pub fn domain_alpha(&self, d: DomainIndex) -> Result<f64> {
        self.check_domain(d)?;
        Ok(self.domains[d.0].alpha())
    }

    pub fn set_domain_alpha(&mut self, d: DomainIndex, alpha: f64) -> Result<()> {
        self.check_domain(d)?;
        self.domains[d.0].set_alpha(alpha);
        Ok(())
    }

    pub fn relation_hypers(&self, r: RelationIndex) -> Result<&dyn Hypers> {
        self.check_relation(r)?;
        Ok(self.relations[r.0].hypers())
    }

    pub fn relation_hypers_mut(&mut self, r: RelationIndex) -> Result<&mut dyn Hypers> {
        self.check_relation(r)?;
        Ok(self.relations[r.0].hypers_mut())
    }

    /// CRP log-probability of a domain's current assignment, exposed at
    /// the `State` level so a caller computing a full joint log-probability
    /// doesn't need to reach past this facade.
    pub fn domain_score_assignment(&self, d: DomainIndex) -> Result<f64> {
        self.check_domain(d)?;
        Ok(self.domains[d.0].score_assignment())
    }

    /// Allocate a fresh, empty group in domain `d`.
    pub fn create_group(&mut self, d: DomainIndex) -> Result<GroupId> {
        self.check_domain(d)?;
        Ok(self.domains[d.0].create_group())
    }

    /// Delete an empty group, cascading removal of every sufficient-
    /// statistic cell that referenced it.
    pub fn delete_group(&mut self, d: DomainIndex, gid: GroupId) -> Result<()> {
        self.check_domain(d)?;
        let _span = trace_span!("delete_group", domain = d.0, gid = gid.0).entered();
        for &(r, p) in &self.domain_participation[d.0] {
            self.relations[r.0].delete_cells_with_group(p, gid, d.0, r.0)?;
        }
        self.domains[d.0].delete_group(gid)
    }

    /// Assign `eid` to `gid` without touching any relation's sufficient
    /// statistics — the bootstrap-only path `initialize` uses before any
    /// data has been installed (mirrors the reference implementation's
    /// `assign_value`/`unassign_value`).
    pub fn assign_initial(&mut self, d: DomainIndex, gid: GroupId, eid: EntityId) -> Result<()> {
        self.check_domain(d)?;
        self.domains[d.0].add_value(gid, eid)
    }

    /// `iterate_over_entity_data`: visit every observed cell touching `eid`
    /// across every relation domain `d` participates in, deduping
    /// self-relation cells so each is visited exactly once at its lowest
    /// occupied position.
    fn iterate_over_entity_data(
        &self,
        d: DomainIndex,
        eid: EntityId,
        data: &[&dyn Dataview],
        mut cb: impl FnMut(RelationIndex, &[usize], irm_component_model::Value),
    ) {
        for &(r, p) in &self.domain_participation[d.0] {
            let rel_domains = self.relations[r.0].domains();
            let view = data[r.0];
            for cell in view.slice(p, eid.0) {
                let mut skip = false;
                for pp in 0..p {
                    if rel_domains[pp] == d.0 && cell.coord[pp] == eid.0 {
                        skip = true;
                        break;
                    }
                }
                if skip {
                    continue;
                }
                cb(r, &cell.coord, cell.value);
            }
        }
    }

    /// Assign `eid` to `gid` in domain `d`, incorporating every observed
    /// cell it touches into the relevant relations' sufficient statistics.
    pub fn add_value(
        &mut self,
        d: DomainIndex,
        gid: GroupId,
        eid: EntityId,
        data: &[&dyn Dataview],
        rng: &mut dyn RngCore,
    ) -> Result<()> {
        self.check_domain(d)?;
        let _span = trace_span!("add_value", domain = d.0, gid = gid.0, eid = eid.0).entered();

        self.domains[d.0].add_value(gid, eid)?;

        let mut touched: Vec<(RelationIndex, Vec<usize>, irm_component_model::Value)> = Vec::new();
        self.iterate_over_entity_data(d, eid, data, |r, coord, value| {
            touched.push((r, coord.to_vec(), value))
        });
        for (r, coord, value) in touched {
            let rel_domains = self.relations[r.0].domains().to_vec();
            let tuple = resolve_tuple(&self.domains, &rel_domains, &coord)?;
            self.relations[r.0].add_value_to_cell(tuple, value, rng, None);
        }
        Ok(())
    }

    /// Remove `eid` from its current group in domain `d`, undoing its
    /// contribution to every relation it touches, and return the group it
    /// was removed from.
    pub fn remove_value(
        &mut self,
        d: DomainIndex,
        eid: EntityId,
        data: &[&dyn Dataview],
        rng: &mut dyn RngCore,
    ) -> Result<GroupId> {
        self.check_domain(d)?;
        let _span = trace_span!("remove_value", domain = d.0, eid = eid.0).entered();

        let mut touched: Vec<(RelationIndex, Vec<usize>, irm_component_model::Value)> = Vec::new();
        self.iterate_over_entity_data(d, eid, data, |r, coord, value| {
            touched.push((r, coord.to_vec(), value))
        });
        for (r, coord, value) in touched {
            let rel_domains = self.relations[r.0].domains().to_vec();
            let tuple = resolve_tuple(&self.domains, &rel_domains, &coord)?;
            self.relations[r.0].remove_value_from_cell(&tuple, value, rng, r.0)?;
        }
        self.domains[d.0].remove_value(eid)
    }

    /// Posterior predictive log-weight of every active group in domain
    /// `d` for a hypothetical placement of `eid`, including a fresh-block
    /// candidate. Requires at least one empty group.
    pub fn score_value(
        &mut self,
        d: DomainIndex,
        eid: EntityId,
        data: &[&dyn Dataview],
        rng: &mut dyn RngCore,
    ) -> Result<(Vec<GroupId>, Vec<f64>)> {
        self.check_domain(d)?;
        if self.domains[d.0].n_empty_groups() == 0 {
            return Err(Error::NoEmptyGroup(d.0));
        }
        let _span = trace_span!("score_value", domain = d.0, eid = eid.0).entered();

        let mut touched: Vec<(RelationIndex, Vec<usize>, irm_component_model::Value)> = Vec::new();
        self.iterate_over_entity_data(d, eid, data, |r, coord, value| {
            touched.push((r, coord.to_vec(), value))
        });

        let groups: Vec<(GroupId, usize)> = self.domains[d.0].groups().collect();
        let mut gids = Vec::with_capacity(groups.len());
        let mut weights = Vec::with_capacity(groups.len());

        for &(gid, _) in &groups {
            let mut sum = self.domains[d.0].pseudocount(gid)?.ln();
            for (r, coord, value) in &touched {
                let rel_domains = self.relations[r.0].domains().to_vec();
                let tuple =
                    resolve_tuple_with_override(&self.domains, &rel_domains, coord, d.0, eid.0, gid)?;
                // Add then immediately remove: the add scores the
                // pre-add posterior predictive, the remove undoes it so
                // the cell ends up exactly as it started.
                self.relations[r.0].add_value_to_cell(tuple.clone(), *value, rng, Some(&mut sum));
                self.relations[r.0].remove_value_from_cell(&tuple, *value, rng, r.0)?;
            }
            gids.push(gid);
            weights.push(sum);
        }

        let total_pseudo: f64 = groups
            .iter()
            .map(|&(g, _)| self.domains[d.0].pseudocount(g))
            .collect::<Result<Vec<_>>>()?
            .into_iter()
            .sum();
        let lgnorm = total_pseudo.ln();
        for w in weights.iter_mut() {
            *w -= lgnorm;
        }

        Ok((gids, weights))
    }

    /// Marginal data log-likelihood of one cell (by ident) or every cell
    /// of relation `r`.
    pub fn score_likelihood(
        &self,
        r: RelationIndex,
        ident: Option<CellId>,
        rng: &mut dyn RngCore,
    ) -> Result<f64> {
        self.check_relation(r)?;
        Ok(self.relations[r.0].score_likelihood(ident, rng))
    }
}
