//! Entity graph module: the structural backbone of locus.
//!
//! Provides the graph data model, the store with its location indexes, and
//! snapshot persistence.

pub mod persistence;
pub mod store;
pub mod types;

pub use store::{GraphStore, NeighborEntry, Neighborhood, StoreStats};
pub use types::{
    EdgeData, EdgeKind, EntityData, EntityId, NewEntity, NodeKind, ProjectId, SpanRecord,
};
