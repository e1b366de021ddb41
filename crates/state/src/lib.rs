//! The IRM `State` object: the composition of every domain and relation,
//! the incremental add/remove/score entity operations, the model
//! definition ("configuration") types, the per-domain bound facade, and
//! the wire serialization format.
//!
//! This is where `irm-domain`, `irm-relation`, `irm-dataview` and
//! `irm-component-model` are composed into the actual inference-state
//! machine; the other crates in this workspace are each one piece that,
//! on their own, do nothing an outer sampler could drive.

pub mod bound;
pub mod definition;
mod state;
mod wire;

pub use bound::BoundDomain;
pub use definition::{ComponentModelKind, ModelDefinition, RelationDef};
pub use state::State;
