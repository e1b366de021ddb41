//! Per-domain CRP (Chinese Restaurant Process) group manager.
//!
//! Grounded on the reference IRM implementation's `detail::domain` (a
//! `gcount_` counter, a `groups_` size map, a `gempty_` set, and an
//! `assignments_` vector). We keep the same ordered-map discipline the
//! original uses (`std::map`/`std::set`) via `BTreeMap`/`BTreeSet` so
//! iteration order is deterministic across runs, which matters since the
//! exact traversal sequence determines reproducibility given a seed.

use irm_core::{DomainIndex, EntityId, Error, GroupId, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// A domain's CRP group bookkeeping: which entities belong to which group,
/// how large each group is, and which groups are currently empty.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Domain {
    index: DomainIndex,
    alpha: f64,
    next_gid: u64,
    groups: BTreeMap<GroupId, usize>,
    empty: BTreeSet<GroupId>,
    assignments: Vec<Option<GroupId>>,
}

impl Domain {
    /// Construct a domain with `n` entities, all unassigned, and no groups.
    /// Matches `unsafe_initialize`'s per-domain shape: a structurally valid
    /// but semantically empty domain.
    pub fn new(index: DomainIndex, n: usize, alpha: f64) -> Self {
        Self {
            index,
            alpha,
            next_gid: 0,
            groups: BTreeMap::new(),
            empty: BTreeSet::new(),
            assignments: vec![None; n],
        }
    }

    pub fn index(&self) -> DomainIndex {
        self.index
    }

    /// Number of entities in this domain. Fixed at construction.
    pub fn n_entities(&self) -> usize {
        self.assignments.len()
    }

    /// Number of currently active groups (empty + nonempty).
    pub fn n_groups(&self) -> usize {
        self.groups.len()
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// The next group id this domain will hand out. Exposed so the wire
    /// format can round-trip the counter without re-deriving it from the
    /// max active gid, which would be wrong after a `delete_group`.
    pub fn next_gid_counter(&self) -> u64 {
        self.next_gid
    }

    /// Reconstruct a domain directly from wire-format parts. Deserializing
    /// is not strictly validated — the caller is trusted to pair this with
    /// the right model definition and a consistent `(groups, assignments)`
    /// pair.
    pub fn from_wire(
        index: DomainIndex,
        alpha: f64,
        next_gid: u64,
        groups: Vec<(GroupId, usize)>,
        assignments: Vec<Option<GroupId>>,
    ) -> Self {
        let empty = groups
            .iter()
            .filter(|&&(_, size)| size == 0)
            .map(|&(g, _)| g)
            .collect();
        Self {
            index,
            alpha,
            next_gid,
            groups: groups.into_iter().collect(),
            empty,
            assignments,
        }
    }

    pub fn set_alpha(&mut self, alpha: f64) {
        self.alpha = alpha;
    }

    /// Current assignment of an entity, or `None` if unassigned.
    pub fn assignment(&self, eid: EntityId) -> Option<GroupId> {
        self.assignments.get(eid.0).copied().flatten()
    }

    /// All current assignments, indexed by entity id.
    pub fn assignments(&self) -> &[Option<GroupId>] {
        &self.assignments
    }

    /// Size of an active group. Errors if `gid` is not active.
    pub fn size(&self, gid: GroupId) -> Result<usize> {
        self.groups
            .get(&gid)
            .copied()
            .ok_or(Error::UnknownGroup { domain: self.index.0, gid: gid.0 })
    }

    pub fn is_active(&self, gid: GroupId) -> bool {
        self.groups.contains_key(&gid)
    }

    /// Active groups in ascending gid order, with their current sizes.
    pub fn groups(&self) -> impl Iterator<Item = (GroupId, usize)> + '_ {
        self.groups.iter().map(|(&g, &s)| (g, s))
    }

    /// Currently empty groups, in ascending gid order.
    pub fn empty_groups(&self) -> impl Iterator<Item = GroupId> + '_ {
        self.empty.iter().copied()
    }

    pub fn n_empty_groups(&self) -> usize {
        self.empty.len()
    }

    /// Allocate a new, empty group. Group ids are never reused.
    pub fn create_group(&mut self) -> GroupId {
        let gid = GroupId(self.next_gid);
        self.next_gid += 1;
        self.groups.insert(gid, 0);
        self.empty.insert(gid);
        gid
    }

    /// Remove an empty group from the tables. Errors if `gid` is unknown or
    /// nonempty.
    pub fn delete_group(&mut self, gid: GroupId) -> Result<()> {
        let size = self.size(gid)?;
        if size != 0 {
            return Err(Error::GroupNotEmpty {
                domain: self.index.0,
                gid: gid.0,
                size,
            });
        }
        self.groups.remove(&gid);
        self.empty.remove(&gid);
        Ok(())
    }

    /// Assign `eid` to `gid`. Errors if `eid` is already assigned or `gid`
    /// is not active.
    pub fn add_value(&mut self, gid: GroupId, eid: EntityId) -> Result<()> {
        let slot = self
            .assignments
            .get_mut(eid.0)
            .ok_or(Error::EntityOutOfRange {
                domain: self.index.0,
                eid: eid.0,
                n: self.assignments.len(),
            })?;
        if slot.is_some() {
            return Err(Error::AlreadyAssigned {
                domain: self.index.0,
                eid: eid.0,
                gid: gid.0,
            });
        }
        let size = self
            .groups
            .get_mut(&gid)
            .ok_or(Error::UnknownGroup { domain: self.index.0, gid: gid.0 })?;
        *size += 1;
        if *size == 1 {
            self.empty.remove(&gid);
        }
        *slot = Some(gid);
        Ok(())
    }

    /// Unassign `eid`, returning the group it was removed from.
    pub fn remove_value(&mut self, eid: EntityId) -> Result<GroupId> {
        let slot = self
            .assignments
            .get_mut(eid.0)
            .ok_or(Error::EntityOutOfRange {
                domain: self.index.0,
                eid: eid.0,
                n: self.assignments.len(),
            })?;
        let gid = slot.ok_or(Error::NotAssigned { domain: self.index.0, eid: eid.0 })?;
        let size = self
            .groups
            .get_mut(&gid)
            .expect("assigned entity's group must be active");
        *size -= 1;
        if *size == 0 {
            self.empty.insert(gid);
        }
        *slot = None;
        Ok(gid)
    }

    /// CRP prior weight for `gid`: its size if occupied, `alpha / |empty|`
    /// if empty.
    pub fn pseudocount(&self, gid: GroupId) -> Result<f64> {
        let size = self.size(gid)?;
        if size > 0 {
            Ok(size as f64)
        } else {
            Ok(self.alpha / self.empty.len() as f64)
        }
    }

    /// CRP log-probability of the current assignment sequence, computed
    /// incrementally rather than via the closed-form product-of-gammas, to
    /// match the reference implementation bit-for-bit where floating point
    /// allows.
    ///
    /// # Panics
    /// Panics if any entity is unassigned — callers must ensure full
    /// assignment before scoring (mirrors `MICROSCOPES_ASSERT(gid != -1)`
    /// in the reference implementation).
    pub fn score_assignment(&self) -> f64 {
        if self.assignments.is_empty() {
            return 0.0;
        }
        let mut counts: BTreeMap<GroupId, usize> = BTreeMap::new();
        let g0 = self.assignments[0].expect("entity 0 must be assigned");
        counts.insert(g0, 1);
        let mut sum = 0.0;
        for (i, slot) in self.assignments.iter().enumerate().skip(1) {
            let gid = slot.expect("every entity must be assigned to score");
            let numerator = counts.get(&gid).copied().map(|c| c as f64).unwrap_or(self.alpha);
            let denominator = i as f64 + self.alpha;
            sum += (numerator / denominator).ln();
            *counts.entry(gid).or_insert(0) += 1;
        }
        sum
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn e(i: usize) -> EntityId {
        EntityId(i)
    }

    #[test]
    fn create_group_starts_empty() {
        let mut d = Domain::new(DomainIndex(0), 3, 1.0);
        let g = d.create_group();
        assert_eq!(d.size(g).unwrap(), 0);
        assert!(d.empty_groups().any(|x| x == g));
    }

    #[test]
    fn add_value_removes_from_empty_set_on_first_entry() {
        let mut d = Domain::new(DomainIndex(0), 3, 1.0);
        let g = d.create_group();
        d.add_value(g, e(0)).unwrap();
        assert_eq!(d.size(g).unwrap(), 1);
        assert!(!d.empty_groups().any(|x| x == g));
        assert_eq!(d.assignment(e(0)), Some(g));
    }

    #[test]
    fn remove_value_reinserts_into_empty_set_at_zero() {
        let mut d = Domain::new(DomainIndex(0), 3, 1.0);
        let g = d.create_group();
        d.add_value(g, e(0)).unwrap();
        let removed = d.remove_value(e(0)).unwrap();
        assert_eq!(removed, g);
        assert_eq!(d.size(g).unwrap(), 0);
        assert!(d.empty_groups().any(|x| x == g));
        assert_eq!(d.assignment(e(0)), None);
    }

    #[test]
    fn double_add_fails() {
        let mut d = Domain::new(DomainIndex(0), 2, 1.0);
        let g = d.create_group();
        d.add_value(g, e(0)).unwrap();
        assert!(d.add_value(g, e(0)).is_err());
    }

    #[test]
    fn delete_nonempty_group_fails() {
        let mut d = Domain::new(DomainIndex(0), 2, 1.0);
        let g = d.create_group();
        d.add_value(g, e(0)).unwrap();
        assert!(d.delete_group(g).is_err());
    }

    #[test]
    fn delete_empty_group_succeeds_and_is_not_reissued() {
        let mut d = Domain::new(DomainIndex(0), 2, 1.0);
        let g1 = d.create_group();
        d.delete_group(g1).unwrap();
        let g2 = d.create_group();
        assert_ne!(g1, g2);
        assert!(!d.is_active(g1));
    }

    #[test]
    fn pseudocount_splits_alpha_across_empties() {
        let mut d = Domain::new(DomainIndex(0), 2, 4.0);
        let g1 = d.create_group();
        let g2 = d.create_group();
        assert_eq!(d.pseudocount(g1).unwrap(), 2.0);
        assert_eq!(d.pseudocount(g2).unwrap(), 2.0);
        let total: f64 = [g1, g2].iter().map(|g| d.pseudocount(*g).unwrap()).sum();
        assert!((total - 4.0).abs() < 1e-12);
    }

    #[test]
    fn pseudocount_of_occupied_group_is_its_size() {
        let mut d = Domain::new(DomainIndex(0), 3, 1.0);
        let g = d.create_group();
        d.add_value(g, e(0)).unwrap();
        d.add_value(g, e(1)).unwrap();
        assert_eq!(d.pseudocount(g).unwrap(), 2.0);
    }

    #[test]
    fn score_assignment_single_entity_is_zero() {
        let mut d = Domain::new(DomainIndex(0), 1, 1.0);
        let g = d.create_group();
        d.add_value(g, e(0)).unwrap();
        assert_eq!(d.score_assignment(), 0.0);
    }

    #[test]
    fn score_assignment_all_same_group_matches_hand_derivation() {
        let mut d = Domain::new(DomainIndex(0), 3, 2.0);
        let g = d.create_group();
        d.add_value(g, e(0)).unwrap();
        d.add_value(g, e(1)).unwrap();
        d.add_value(g, e(2)).unwrap();
        // entity1: numer=1 (count of g0 before step), denom=1+alpha=3
        // entity2: numer=2, denom=2+alpha=4
        let expected = (1.0f64 / 3.0).ln() + (2.0f64 / 4.0).ln();
        assert!((d.score_assignment() - expected).abs() < 1e-12);
    }

    #[test]
    fn add_then_remove_is_identity_on_sizes() {
        let mut d = Domain::new(DomainIndex(0), 5, 1.0);
        let g0 = d.create_group();
        let g1 = d.create_group();
        for (i, g) in [g0, g0, g1, g1, g0].into_iter().enumerate() {
            d.add_value(g, e(i)).unwrap();
        }
        let before_sizes: Vec<_> = d.groups().collect();
        let gid = d.remove_value(e(0)).unwrap();
        d.add_value(gid, e(0)).unwrap();
        let after_sizes: Vec<_> = d.groups().collect();
        assert_eq!(before_sizes, after_sizes);
    }
}
