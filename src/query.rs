//! Read-side views over a scanned graph.
//!
//! The CLI (and any other frontend) renders these serializable summaries
//! instead of reaching into the store, so the store's internals stay free to
//! change.

use serde::Serialize;

use crate::graph::{EntityData, GraphStore, Neighborhood, ProjectId, StoreStats};

/// One entity as listed in an overview.
#[derive(Debug, Clone, Serialize)]
pub struct NodeSummary {
    pub id: u64,
    pub kind: String,
    pub spelling: Option<String>,
    pub namespace: Option<String>,
    pub build_target: String,
    pub display_name: String,
    pub defined_at: Option<String>,
    pub implementation_count: usize,
}

/// One edge as listed in an overview.
#[derive(Debug, Clone, Serialize)]
pub struct EdgeSummary {
    pub from: u64,
    pub to: u64,
    pub kind: String,
}

/// The whole project graph, flattened for display.
#[derive(Debug, Clone, Serialize)]
pub struct GraphOverview {
    pub entities: Vec<NodeSummary>,
    pub edges: Vec<EdgeSummary>,
}

/// Everything worth showing about one named entity.
#[derive(Debug, Clone, Serialize)]
pub struct NodeContext {
    pub summary: NodeSummary,
    pub source_text: Option<String>,
    pub includes: Vec<String>,
    pub generated_description: Option<String>,
    pub user_description: Option<String>,
    pub neighborhood: Neighborhood,
}

fn summarize(entity: &EntityData) -> NodeSummary {
    NodeSummary {
        id: entity.id.0,
        kind: entity.kind.to_string(),
        spelling: entity.spelling.clone(),
        namespace: entity.namespace.clone(),
        build_target: entity.build_target.clone(),
        display_name: entity.display_label(),
        defined_at: entity.define.as_ref().map(|d| d.location.to_string()),
        implementation_count: entity.implementations.len(),
    }
}

/// Flatten a project's live graph into summaries, id-ordered.
pub fn overview(store: &GraphStore, project: ProjectId) -> GraphOverview {
    GraphOverview {
        entities: store
            .all_entities(project)
            .into_iter()
            .map(summarize)
            .collect(),
        edges: store
            .edges(project)
            .into_iter()
            .map(|(from, to, kind)| EdgeSummary {
                from: from.0,
                to: to.0,
                kind: kind.to_string(),
            })
            .collect(),
    }
}

/// Full context for every live entity with the given spelling. The same name
/// can exist once per build target, so this is a list.
pub fn node_context(store: &GraphStore, spelling: &str) -> Vec<NodeContext> {
    store
        .find_by_spelling(spelling)
        .into_iter()
        .filter_map(|id| {
            let entity = store.entity(id)?;
            Some(NodeContext {
                summary: summarize(entity),
                source_text: entity
                    .define
                    .as_ref()
                    .and_then(|d| d.source_text.clone())
                    .or_else(|| {
                        entity
                            .implementations
                            .first()
                            .and_then(|r| r.source_text.clone())
                    }),
                includes: entity.includes.clone(),
                generated_description: entity.generated_description.clone(),
                user_description: entity.user_description.clone(),
                neighborhood: store.neighborhood(id),
            })
        })
        .collect()
}

/// Live store counts.
pub fn store_stats(store: &GraphStore) -> StoreStats {
    store.stats()
}
