//! The wire format: a structured message containing, in order, one
//! "domain" sub-message per domain and one "relation" sub-message per
//! relation.
//!
//! Encoded with `rmp-serde` (MessagePack), matching the teacher's wire
//! format choice for its own on-disk records. Deserialization is not
//! strictly validated — callers must pair a persisted state with the
//! model definition it was serialized against; this module checks only
//! the structural counts (domain/relation arity) needed to avoid an
//! out-of-bounds panic, not semantic consistency with the data the state
//! was trained on.

use crate::definition::ModelDefinition;
use crate::state::State;
use irm_component_model::registry;
use irm_core::{DomainIndex, Error, GroupId, Result};
use irm_domain::Domain;
use irm_relation::{BlockTuple, Relation};
use serde::{Deserialize, Serialize};

/// Wire form of one domain: its CRP hyperparameter (alpha), the next-gid
/// counter, the assignment vector (signed, `-1` sentinel for unassigned),
/// and the list of active gids with sizes.
#[derive(Debug, Serialize, Deserialize)]
struct WireDomain {
    alpha: f64,
    next_gid: u64,
    /// `-1` means unassigned.
    assignments: Vec<i64>,
    /// Active gids with sizes, ascending gid order (includes empty groups
    /// at size 0 — "the list of active gids with sizes" makes no emptiness
    /// distinction, and emptiness is recoverable from size alone).
    groups: Vec<(u64, usize)>,
}

/// Wire form of one sufficient-statistic cell: `{gids: [int], id: int,
/// count: int, suffstat: bytes}`.
#[derive(Debug, Serialize, Deserialize)]
struct WireCell {
    gids: Vec<u64>,
    id: u64,
    count: u64,
    suffstat: Vec<u8>,
}

/// Wire form of one relation: its hypers bag (tagged by model name so
/// deserialize can dispatch back to a concrete `Hypers` impl via
/// `irm_component_model::registry`) followed by its cells.
#[derive(Debug, Serialize, Deserialize)]
struct WireRelation {
    model_name: String,
    hypers: Vec<u8>,
    cells: Vec<WireCell>,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireState {
    domains: Vec<WireDomain>,
    relations: Vec<WireRelation>,
}

impl State {
    /// Serialize this state to its wire format.
    pub fn serialize(&self) -> Result<Vec<u8>> {
        let domains = self
            .domains_slice()
            .iter()
            .map(|d| WireDomain {
                alpha: d.alpha(),
                next_gid: d.next_gid_counter(),
                assignments: d
                    .assignments()
                    .iter()
                    .map(|a| a.map(|g| g.0 as i64).unwrap_or(-1))
                    .collect(),
                groups: d.groups().map(|(g, s)| (g.0, s)).collect(),
            })
            .collect();

        let relations = self
            .relations_slice()
            .iter()
            .map(|r| WireRelation {
                model_name: r.hypers().model_name().to_string(),
                hypers: r.hypers().to_bytes(),
                cells: r
                    .cells()
                    .map(|(tuple, cell)| WireCell {
                        gids: tuple.iter().map(|g| g.0).collect(),
                        id: cell.id.0,
                        count: cell.count,
                        suffstat: cell.suffstat.to_bytes(),
                    })
                    .collect(),
            })
            .collect();

        let wire = WireState { domains, relations };
        Ok(rmp_serde::to_vec(&wire)?)
    }

    /// Reconstruct a state from bytes previously produced by [`Self::serialize`],
    /// paired with the `defn` it was serialized against.
    ///
    /// Fails fast if the domain or relation counts disagree with `defn`;
    /// does not otherwise validate that the persisted counts/idents are
    /// consistent with any particular dataset — counts and idents are
    /// trusted.
    pub fn deserialize(defn: &ModelDefinition, bytes: &[u8]) -> Result<Self> {
        let wire: WireState = rmp_serde::from_slice(bytes)?;

        if wire.domains.len() != defn.n_domains() {
            return Err(Error::SerializationMismatch(format!(
                "wire has {} domains, definition expects {}",
                wire.domains.len(),
                defn.n_domains()
            )));
        }
        if wire.relations.len() != defn.n_relations() {
            return Err(Error::SerializationMismatch(format!(
                "wire has {} relations, definition expects {}",
                wire.relations.len(),
                defn.n_relations()
            )));
        }

        let mut domains = Vec::with_capacity(wire.domains.len());
        for (i, wd) in wire.domains.into_iter().enumerate() {
            if wd.assignments.len() != defn.domains[i] {
                return Err(Error::SerializationMismatch(format!(
                    "domain {i}: wire has {} entities, definition expects {}",
                    wd.assignments.len(),
                    defn.domains[i]
                )));
            }
            let assignments = wd
                .assignments
                .into_iter()
                .map(|a| if a < 0 { None } else { Some(GroupId(a as u64)) })
                .collect();
            let groups = wd.groups.into_iter().map(|(g, s)| (GroupId(g), s)).collect();
            domains.push(Domain::from_wire(DomainIndex(i), wd.alpha, wd.next_gid, groups, assignments));
        }

        let mut relations = Vec::with_capacity(wire.relations.len());
        for (r, wr) in wire.relations.into_iter().enumerate() {
            let rel_domains: Vec<usize> = defn.relations[r].domains.iter().map(|d| d.0).collect();
            let hypers = registry::hypers_from_bytes(&wr.model_name, &wr.hypers)
                .map_err(|e| Error::SerializationMismatch(format!("relation {r} hypers: {e}")))?;
            let mut relation = Relation::new(rel_domains, hypers);
            for cell in wr.cells {
                let tuple: BlockTuple = cell.gids.into_iter().map(GroupId).collect();
                let suffstat = relation
                    .hypers()
                    .suffstat_from_bytes(&cell.suffstat)
                    .map_err(|e| Error::SerializationMismatch(format!("relation {r} cell {}: {e}", cell.id)))?;
                relation.insert_cell(tuple, irm_core::CellId(cell.id), cell.count, suffstat);
            }
            relations.push(relation);
        }

        let domain_participation = crate::state::build_domain_participation(defn);
        Ok(State::from_parts(domains, relations, domain_participation))
    }
}
