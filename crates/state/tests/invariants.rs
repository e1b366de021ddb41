//! Property-based invariant checks, run over randomly generated small
//! IRMs and random add/remove/score sequences.
//!
//! A small (2-3 domain, 1-2 relation) IRM driven through a random
//! sequence of operations, checking size/assignment consistency and
//! cell-count/observed-cell consistency invariants after every mutation.

use irm_component_model::Value;
use irm_core::{DomainIndex, EntityId, RelationIndex};
use irm_dataview::{Dataview, DenseDataview};
use irm_state::{ComponentModelKind, ModelDefinition, RelationDef, State};
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Group sizes match their membership, the empty set matches zero-sized
/// groups, and every relation's total cell count equals
/// its dataview's observed-cell count (valid here because every entity
/// stays assigned across this test's operation sequence).
fn check_invariants(state: &State, views: &[&dyn Dataview]) {
    for d in 0..state.n_domains() {
        let domain = state.domain(DomainIndex(d));
        for (gid, size) in domain.groups() {
            let actual = (0..domain.n_entities())
                .filter(|&e| domain.assignment(EntityId(e)) == Some(gid))
                .count();
            assert_eq!(actual, size, "domain {d} group {gid:?} size mismatch");
            assert_eq!(size == 0, domain.empty_groups().any(|g| g == gid));
        }
    }
    for r in 0..state.n_relations() {
        let relation = state.relation(RelationIndex(r));
        let observed = views[r].n_observed() as u64;
        let total: u64 = relation.cells().map(|(_, c)| c.count).sum();
        assert_eq!(total, observed, "relation {r} cell-count vs observed-cell mismatch");
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn invariants_hold_after_random_add_remove_score_sequences(
        seed in any::<u64>(),
        n_entities in 3usize..8,
        n_steps in 0usize..20,
    ) {
        let mut rng = StdRng::seed_from_u64(seed);
        let defn = ModelDefinition::new(
            vec![n_entities],
            vec![RelationDef::new(
                vec![DomainIndex(0), DomainIndex(0)],
                ComponentModelKind::BetaBernoulli { alpha: 1.0, beta: 1.0 },
            )],
        );
        let data: Vec<Value> = (0..n_entities * n_entities)
            .map(|_| Value::Bool(rng.gen_bool(0.5)))
            .collect();
        let view = DenseDataview::fully_observed(vec![n_entities, n_entities], data).unwrap();
        let views: Vec<&dyn Dataview> = vec![&view];

        let mut state = State::initialize(
            &defn,
            &[1.0],
            vec![ComponentModelKind::BetaBernoulli { alpha: 1.0, beta: 1.0 }.create_hypers()],
            vec![None],
            &views,
            &mut rng,
        )
        .unwrap();
        check_invariants(&state, &views);

        for _ in 0..n_steps {
            let eid = EntityId(rng.gen_range(0..n_entities));
            let gid = state
                .remove_value(DomainIndex(0), eid, &views, &mut rng)
                .unwrap();

            if state.domain(DomainIndex(0)).n_empty_groups() == 0 {
                state.create_group(DomainIndex(0)).unwrap();
            }
            let (gids, weights) = state
                .score_value(DomainIndex(0), eid, &views, &mut rng)
                .unwrap();
            prop_assert_eq!(gids.len(), weights.len());
            prop_assert!(weights.iter().all(|w| w.is_finite()));

            // re-assign to the group the entity came from, so every entity
            // stays assigned across the whole sequence (`gid` is still
            // active: this test never calls delete_group).
            state
                .add_value(DomainIndex(0), gid, eid, &views, &mut rng)
                .unwrap();
            check_invariants(&state, &views);
        }
    }
}
