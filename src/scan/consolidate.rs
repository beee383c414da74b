//! Post-pass: type-declaration consolidation.
//!
//! Forward declarations extract as their own entities (container occurrences
//! are always authoritative), so after linking a class may exist several
//! times: one definition with members and N empty shells from `class Foo;`
//! lines. This pass re-points type-usage edges from the shells to the
//! definition, then sweeps class-like entities that contribute no structure.
//!
//! Running it twice changes nothing: the first run leaves one entity per
//! identity group, and the sweep condition is stable.

use std::collections::HashMap;
use tracing::{debug, info};

use crate::graph::{EdgeKind, EntityId, GraphStore, ProjectId};

/// Merge duplicate class-like declarations for one build target, then drop
/// the declaration-only leftovers.
pub fn consolidate(store: &mut GraphStore, project: ProjectId, build_target: &str) {
    merge_forward_declarations(store, project, build_target);
    remove_type_declarations(store, project, build_target);
}

/// Group class-like entities by (spelling, type spelling, namespace); inside
/// each group, entities with members are the real definitions ("canonical")
/// and the rest are forward-declaration shadows. Type-usage edges pointing
/// at a shadow move to the first canonical entity.
fn merge_forward_declarations(store: &mut GraphStore, project: ProjectId, build_target: &str) {
    let mut groups: HashMap<(Option<String>, String, Option<String>), Vec<EntityId>> =
        HashMap::new();
    for id in store.class_like(project, build_target) {
        let Some(entity) = store.entity(id) else {
            continue;
        };
        groups
            .entry((
                entity.spelling.clone(),
                entity.type_spelling.clone(),
                entity.namespace.clone(),
            ))
            .or_default()
            .push(id);
    }

    for (key, ids) in groups {
        if ids.len() < 2 {
            continue;
        }
        let Some(canonical) = ids.iter().copied().find(|&id| store.has_members(id)) else {
            // All occurrences are bodiless; nothing to merge into.
            continue;
        };
        for id in ids {
            if id == canonical || store.has_members(id) {
                continue;
            }
            store.retarget_incoming(EdgeKind::UsesType, id, canonical);
            debug!(name = ?key.0, shadow = %id, "type edges re-pointed to definition");
        }
    }
}

/// Sweep: a class-like entity with no members that depends on nothing and is
/// not the target of any type-usage edge was a reference-only forward
/// declaration; delete it outright.
fn remove_type_declarations(store: &mut GraphStore, project: ProjectId, build_target: &str) {
    let doomed: Vec<EntityId> = store
        .class_like(project, build_target)
        .into_iter()
        .filter(|&id| {
            !store.has_members(id)
                && store.outgoing(id, EdgeKind::References).is_empty()
                && store.outgoing(id, EdgeKind::Assigns).is_empty()
                && store.incoming(id, EdgeKind::UsesType).is_empty()
        })
        .collect();
    if !doomed.is_empty() {
        info!(count = doomed.len(), build_target, "declaration-only entities removed");
        store.delete_entities(&doomed);
    }
}
