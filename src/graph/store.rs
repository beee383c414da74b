//! The entity/edge store for locus.
//!
//! Uses petgraph to hold extracted entities and their relationships, with
//! location and name indexes for fast lookup. Location lookups are exact
//! structural matches; locations are the only identity mechanism prior to
//! entity creation, so the indexes are first-class here.
//!
//! Deletion is a soft-delete (`removed` flag); queries skip removed nodes
//! and `compact` physically rebuilds the graph. Edge creation is idempotent
//! on (from, to, kind).

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use std::collections::HashMap;
use tracing::{debug, info, warn};

use super::persistence::Snapshot;
use super::types::*;
use crate::location::FileLocation;

/// Location identity is per project and build target: the same header
/// compiled into two targets yields two distinct entities at the same
/// location, and two projects whose relative paths collide never share one.
type LocKey = (ProjectId, String, FileLocation);

/// The main entity store. Holds all nodes, edges, and indexes.
pub struct GraphStore {
    /// The directed graph storing entities and relationships.
    graph: DiGraph<EntityData, EdgeData>,
    /// Index: (project, build target, define location) -> node index.
    define_index: HashMap<LocKey, NodeIndex>,
    /// Index: (project, build target, implementation location) -> node index.
    impl_index: HashMap<LocKey, NodeIndex>,
    /// Index: spelling -> node indexes.
    name_index: HashMap<String, Vec<NodeIndex>>,
    /// Index: stable id -> node index.
    id_index: HashMap<EntityId, NodeIndex>,
    next_id: u64,
}

/// Read view of one entity's direct surroundings.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct Neighborhood {
    pub members: Vec<NeighborEntry>,
    pub types: Vec<NeighborEntry>,
    pub dependencies: Vec<NeighborEntry>,
}

/// One neighbor as downstream consumers see it.
#[derive(Debug, Clone, serde::Serialize)]
pub struct NeighborEntry {
    pub display_name: String,
    pub description: Option<String>,
}

/// Statistics about the store (excludes soft-deleted nodes).
#[derive(Debug, Clone, serde::Serialize)]
pub struct StoreStats {
    pub entity_count: usize,
    pub edge_count: usize,
    pub class_count: usize,
    pub unique_spellings: usize,
}

impl GraphStore {
    pub fn new() -> Self {
        Self {
            graph: DiGraph::new(),
            define_index: HashMap::new(),
            impl_index: HashMap::new(),
            name_index: HashMap::new(),
            id_index: HashMap::new(),
            next_id: 1,
        }
    }

    // ─── Entity Operations ──────────────────────────────────────

    /// Upsert an entity keyed by its define location.
    ///
    /// An existing entity at that exact location is filled in (missing
    /// spelling, namespace, cached display name and source text) rather than
    /// duplicated; this is how a forward-created entity acquires its real
    /// definition data when the defining file is scanned later.
    pub fn upsert_by_define_location(
        &mut self,
        project: ProjectId,
        build_target: &str,
        location: FileLocation,
        new: NewEntity,
        display_name: Option<String>,
        source_text: Option<String>,
    ) -> EntityId {
        let key = (project, build_target.to_string(), location.clone());
        if let Some(&idx) = self.define_index.get(&key) {
            let node = &mut self.graph[idx];
            node.removed = false;
            if node.spelling.is_none() {
                node.spelling = new.spelling.clone();
                if let Some(name) = &node.spelling {
                    self.name_index.entry(name.clone()).or_default().push(idx);
                }
            }
            if node.namespace.is_none() {
                node.namespace = new.namespace;
            }
            if node.type_spelling.is_empty() {
                node.type_spelling = new.type_spelling;
            }
            if let Some(define) = &mut node.define {
                if define.display_name.is_none() {
                    define.display_name = display_name;
                }
                if define.source_text.is_none() {
                    define.source_text = source_text;
                }
            }
            return self.graph[idx].id;
        }

        let id = EntityId(self.next_id);
        self.next_id += 1;
        let data = EntityData {
            id,
            project,
            build_target: build_target.to_string(),
            kind: new.kind,
            spelling: new.spelling,
            type_spelling: new.type_spelling,
            namespace: new.namespace,
            generated_description: None,
            user_description: None,
            define: Some(SpanRecord {
                location: location.clone(),
                display_name,
                source_text,
            }),
            implementations: Vec::new(),
            includes: Vec::new(),
            removed: false,
        };
        let name = data.spelling.clone();
        let idx = self.graph.add_node(data);
        self.define_index.insert(key, idx);
        self.id_index.insert(id, idx);
        if let Some(name) = name {
            self.name_index.entry(name).or_default().push(idx);
        }
        debug!(id = %id, "entity created");
        id
    }

    /// Exact-match lookup within one project and build target: define
    /// location first, then implementation locations.
    pub fn entity_at(
        &self,
        project: ProjectId,
        build_target: &str,
        location: &FileLocation,
    ) -> Option<EntityId> {
        let key = (project, build_target.to_string(), location.clone());
        self.define_index
            .get(&key)
            .or_else(|| self.impl_index.get(&key))
            .filter(|&&idx| self.is_live(idx))
            .map(|&idx| self.graph[idx].id)
    }

    pub fn entity(&self, id: EntityId) -> Option<&EntityData> {
        let &idx = self.id_index.get(&id)?;
        let node = &self.graph[idx];
        if node.removed {
            None
        } else {
            Some(node)
        }
    }

    /// Attach one more implementation location. Attaching the same location
    /// twice is a no-op.
    pub fn attach_implementation(&mut self, id: EntityId, record: SpanRecord) {
        let Some(&idx) = self.id_index.get(&id) else {
            warn!(id = %id, "implementation attach on unknown entity");
            return;
        };
        let node = &mut self.graph[idx];
        if node
            .implementations
            .iter()
            .any(|r| r.location == record.location)
        {
            return;
        }
        let key = (node.project, node.build_target.clone(), record.location.clone());
        self.impl_index.insert(key, idx);
        node.implementations.push(record);
    }

    /// Drop all implementation locations and install a new set. Used when a
    /// re-scan determines the locations changed.
    pub fn replace_implementations(&mut self, id: EntityId, records: Vec<SpanRecord>) {
        let Some(&idx) = self.id_index.get(&id) else {
            return;
        };
        let project = self.graph[idx].project;
        let target = self.graph[idx].build_target.clone();
        let old = std::mem::take(&mut self.graph[idx].implementations);
        for record in old {
            self.impl_index.remove(&(project, target.clone(), record.location));
        }
        for record in records {
            self.attach_implementation(id, record);
        }
    }

    /// Append include lines not yet recorded on the entity.
    pub fn append_includes(&mut self, id: EntityId, lines: &[String]) {
        let Some(&idx) = self.id_index.get(&id) else {
            return;
        };
        let node = &mut self.graph[idx];
        for line in lines {
            if !node.includes.contains(line) {
                node.includes.push(line.clone());
            }
        }
    }

    // ─── Edge Operations ────────────────────────────────────────

    /// Add an edge between two entities. Idempotent on (from, to, kind);
    /// returns true only when a new edge was stored.
    pub fn add_edge(&mut self, from: EntityId, to: EntityId, kind: EdgeKind) -> bool {
        let (Some(&a), Some(&b)) = (self.id_index.get(&from), self.id_index.get(&to)) else {
            warn!(%from, %to, %kind, "edge endpoints missing; edge skipped");
            return false;
        };
        if !self.is_live(a) || !self.is_live(b) {
            return false;
        }
        if self
            .graph
            .edges_connecting(a, b)
            .any(|e| e.weight().kind == kind)
        {
            return false;
        }
        self.graph.add_edge(a, b, EdgeData::new(kind));
        true
    }

    pub fn has_edge(&self, from: EntityId, to: EntityId, kind: EdgeKind) -> bool {
        let (Some(&a), Some(&b)) = (self.id_index.get(&from), self.id_index.get(&to)) else {
            return false;
        };
        self.graph
            .edges_connecting(a, b)
            .any(|e| e.weight().kind == kind)
    }

    /// Live targets of `kind` edges out of an entity.
    pub fn outgoing(&self, id: EntityId, kind: EdgeKind) -> Vec<EntityId> {
        self.neighbors(id, kind, Direction::Outgoing)
    }

    /// Live sources of `kind` edges into an entity.
    pub fn incoming(&self, id: EntityId, kind: EdgeKind) -> Vec<EntityId> {
        self.neighbors(id, kind, Direction::Incoming)
    }

    pub fn has_members(&self, id: EntityId) -> bool {
        !self.outgoing(id, EdgeKind::Contains).is_empty()
    }

    /// Re-point incoming `kind` edges from `old` to `new`, removing them
    /// from `old`.
    pub fn retarget_incoming(&mut self, kind: EdgeKind, old: EntityId, new: EntityId) {
        for src in self.incoming(old, kind) {
            if src != new {
                self.add_edge(src, new, kind);
            }
        }
        self.remove_incoming(old, kind);
    }

    /// Remove all incoming `kind` edges of an entity.
    pub fn remove_incoming(&mut self, id: EntityId, kind: EdgeKind) {
        let Some(&idx) = self.id_index.get(&id) else {
            return;
        };
        let mut doomed: Vec<_> = self
            .graph
            .edges_directed(idx, Direction::Incoming)
            .filter(|e| e.weight().kind == kind)
            .map(|e| e.id())
            .collect();
        // remove_edge swaps the highest edge index into the removed slot, so
        // removal must run highest-first to keep the collected ids valid.
        doomed.sort();
        for edge in doomed.into_iter().rev() {
            self.graph.remove_edge(edge);
        }
    }

    // ─── Deletion ───────────────────────────────────────────────

    /// Soft-delete entities: mark removed and strip them from every index so
    /// location identity can be re-used by later scans.
    pub fn delete_entities(&mut self, ids: &[EntityId]) {
        for &id in ids {
            let Some(idx) = self.id_index.remove(&id) else {
                continue;
            };
            let node = &mut self.graph[idx];
            node.removed = true;
            let project = node.project;
            let target = node.build_target.clone();
            if let Some(define) = &node.define {
                self.define_index.remove(&(project, target.clone(), define.location.clone()));
            }
            for record in &node.implementations {
                self.impl_index.remove(&(project, target.clone(), record.location.clone()));
            }
            if let Some(name) = node.spelling.clone() {
                if let Some(indexes) = self.name_index.get_mut(&name) {
                    indexes.retain(|&i| i != idx);
                    if indexes.is_empty() {
                        self.name_index.remove(&name);
                    }
                }
            }
        }
        debug!(count = ids.len(), "entities soft-deleted");
    }

    /// Rebuild the graph without soft-deleted nodes, preserving entity ids.
    pub fn compact(&mut self) {
        info!("compacting store, rebuilding without soft-deleted nodes");
        let snapshot = self.to_snapshot();
        *self = Self::from_snapshot(snapshot);
        let stats = self.stats();
        info!(
            entities = stats.entity_count,
            edges = stats.edge_count,
            "compact complete"
        );
    }

    // ─── Query Operations ───────────────────────────────────────

    /// All live entities of a project, in id order.
    pub fn all_entities(&self, project: ProjectId) -> Vec<&EntityData> {
        let mut out: Vec<&EntityData> = self
            .graph
            .node_weights()
            .filter(|n| !n.removed && n.project == project)
            .collect();
        out.sort_by_key(|n| n.id);
        out
    }

    /// All live edges of a project as (from, to, kind) triples.
    pub fn edges(&self, project: ProjectId) -> Vec<(EntityId, EntityId, EdgeKind)> {
        let mut out = Vec::new();
        for edge in self.graph.edge_references() {
            let (a, b) = (edge.source(), edge.target());
            if !self.is_live(a) || !self.is_live(b) {
                continue;
            }
            let from = &self.graph[a];
            if from.project != project {
                continue;
            }
            out.push((from.id, self.graph[b].id, edge.weight().kind));
        }
        out.sort();
        out
    }

    /// Live class-like entities for one build target, in id order.
    pub fn class_like(&self, project: ProjectId, build_target: &str) -> Vec<EntityId> {
        let mut out: Vec<EntityId> = self
            .graph
            .node_weights()
            .filter(|n| {
                !n.removed
                    && n.project == project
                    && n.build_target == build_target
                    && n.kind.is_class_like()
            })
            .map(|n| n.id)
            .collect();
        out.sort();
        out
    }

    /// Distinct project ids with at least one live entity.
    pub fn projects(&self) -> Vec<ProjectId> {
        let mut out: Vec<ProjectId> = self
            .graph
            .node_weights()
            .filter(|n| !n.removed)
            .map(|n| n.project)
            .collect();
        out.sort_by_key(|p| p.0);
        out.dedup();
        out
    }

    /// Live entities matching a spelling, in id order.
    pub fn find_by_spelling(&self, name: &str) -> Vec<EntityId> {
        let mut out: Vec<EntityId> = self
            .name_index
            .get(name)
            .into_iter()
            .flatten()
            .filter(|&&idx| self.is_live(idx))
            .map(|&idx| self.graph[idx].id)
            .collect();
        out.sort();
        out
    }

    /// Direct neighborhood of one entity: members, used types and
    /// dependencies, each as (display name, cached description) pairs.
    pub fn neighborhood(&self, id: EntityId) -> Neighborhood {
        let entry = |targets: Vec<EntityId>| -> Vec<NeighborEntry> {
            targets
                .into_iter()
                .filter_map(|t| self.entity(t))
                .map(|e| NeighborEntry {
                    display_name: e.display_label(),
                    description: e.generated_description.clone(),
                })
                .collect()
        };
        let mut dependencies = self.outgoing(id, EdgeKind::References);
        dependencies.extend(self.outgoing(id, EdgeKind::Assigns));
        Neighborhood {
            members: entry(self.outgoing(id, EdgeKind::Contains)),
            types: entry(self.outgoing(id, EdgeKind::UsesType)),
            dependencies: entry(dependencies),
        }
    }

    // ─── Descriptions ───────────────────────────────────────────

    /// Attach a generated description to every live entity with the given
    /// spelling. Returns how many entities were annotated. Report ingestion
    /// selects nodes by name, not by position.
    pub fn set_generated_description(&mut self, spelling: &str, text: &str) -> usize {
        self.set_description(spelling, text, true)
    }

    pub fn set_user_description(&mut self, spelling: &str, text: &str) -> usize {
        self.set_description(spelling, text, false)
    }

    fn set_description(&mut self, spelling: &str, text: &str, generated: bool) -> usize {
        let indexes: Vec<NodeIndex> = self
            .name_index
            .get(spelling)
            .into_iter()
            .flatten()
            .copied()
            .filter(|&idx| self.is_live(idx))
            .collect();
        for &idx in &indexes {
            let node = &mut self.graph[idx];
            if generated {
                node.generated_description = Some(text.to_string());
            } else {
                node.user_description = Some(text.to_string());
            }
        }
        indexes.len()
    }

    // ─── Stats ──────────────────────────────────────────────────

    pub fn stats(&self) -> StoreStats {
        let mut entity_count = 0;
        let mut class_count = 0;
        for node in self.graph.node_weights() {
            if node.removed {
                continue;
            }
            entity_count += 1;
            if node.kind.is_class_like() {
                class_count += 1;
            }
        }
        let edge_count = self
            .graph
            .edge_references()
            .filter(|e| self.is_live(e.source()) && self.is_live(e.target()))
            .count();
        StoreStats {
            entity_count,
            edge_count,
            class_count,
            unique_spellings: self.name_index.len(),
        }
    }

    // ─── Internal Helpers ───────────────────────────────────────

    fn is_live(&self, idx: NodeIndex) -> bool {
        self.graph.node_weight(idx).is_some_and(|n| !n.removed)
    }

    fn neighbors(&self, id: EntityId, kind: EdgeKind, dir: Direction) -> Vec<EntityId> {
        let Some(&idx) = self.id_index.get(&id) else {
            return Vec::new();
        };
        let mut out: Vec<EntityId> = self
            .graph
            .edges_directed(idx, dir)
            .filter(|e| e.weight().kind == kind)
            .map(|e| match dir {
                Direction::Outgoing => e.target(),
                Direction::Incoming => e.source(),
            })
            .filter(|&n| self.is_live(n))
            .map(|n| self.graph[n].id)
            .collect();
        out.sort();
        out.dedup();
        out
    }

    // ─── Snapshots ──────────────────────────────────────────────

    /// Live nodes and edges only; soft-deleted entities do not survive a
    /// snapshot round-trip.
    pub(crate) fn to_snapshot(&self) -> Snapshot {
        let entities: Vec<EntityData> = self
            .graph
            .node_weights()
            .filter(|n| !n.removed)
            .cloned()
            .collect();
        let edges = self
            .graph
            .edge_references()
            .filter(|e| self.is_live(e.source()) && self.is_live(e.target()))
            .map(|e| {
                (
                    self.graph[e.source()].id.0,
                    self.graph[e.target()].id.0,
                    e.weight().kind,
                )
            })
            .collect();
        Snapshot {
            next_id: self.next_id,
            entities,
            edges,
        }
    }

    pub(crate) fn from_snapshot(snapshot: Snapshot) -> Self {
        let mut store = Self::new();
        store.next_id = snapshot.next_id;
        for data in snapshot.entities {
            let id = data.id;
            let project = data.project;
            let target = data.build_target.clone();
            let define = data.define.as_ref().map(|d| d.location.clone());
            let impls: Vec<FileLocation> = data
                .implementations
                .iter()
                .map(|r| r.location.clone())
                .collect();
            let name = data.spelling.clone();
            let idx = store.graph.add_node(data);
            store.id_index.insert(id, idx);
            if let Some(loc) = define {
                store.define_index.insert((project, target.clone(), loc), idx);
            }
            for loc in impls {
                store.impl_index.insert((project, target.clone(), loc), idx);
            }
            if let Some(name) = name {
                store.name_index.entry(name).or_default().push(idx);
            }
        }
        for (from, to, kind) in snapshot.edges {
            store.add_edge(EntityId(from), EntityId(to), kind);
        }
        store
    }
}

impl Default for GraphStore {
    fn default() -> Self {
        Self::new()
    }
}
