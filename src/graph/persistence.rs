//! Graph snapshot persistence.
//!
//! The store serializes to a bincode snapshot on disk so a scanned project
//! survives across sessions. The snapshot is a plain node/edge list; indexes
//! are rebuilt on load. Real database schema and migrations live outside
//! this crate.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::info;

use super::store::GraphStore;
use super::types::{EdgeKind, EntityData};
use crate::error::Result;

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct Snapshot {
    pub(crate) next_id: u64,
    pub(crate) entities: Vec<EntityData>,
    pub(crate) edges: Vec<(u64, u64, EdgeKind)>,
}

impl GraphStore {
    /// Write the live graph to `path`, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let bytes = bincode::serialize(&self.to_snapshot())?;
        fs::write(path, bytes)?;
        info!(path = %path.display(), "graph saved");
        Ok(())
    }

    /// Load a graph snapshot from `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = fs::read(path)?;
        let snapshot: Snapshot = bincode::deserialize(&bytes)?;
        let store = Self::from_snapshot(snapshot);
        info!(path = %path.display(), entities = store.stats().entity_count, "graph loaded");
        Ok(store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{EdgeKind, NewEntity, NodeKind, ProjectId};
    use crate::location::FileLocation;

    #[test]
    fn test_save_load_round_trip() {
        let project = ProjectId::new();
        let mut store = GraphStore::new();
        let a = store.upsert_by_define_location(
            project,
            "Motion",
            FileLocation::new("a.h", 1, 1, 3, 2),
            NewEntity {
                kind: NodeKind::Class,
                spelling: Some("Node".into()),
                type_spelling: "Node".into(),
                namespace: Some("app".into()),
            },
            Some("class Node".into()),
            None,
        );
        let b = store.upsert_by_define_location(
            project,
            "Motion",
            FileLocation::new("a.h", 2, 3, 2, 20),
            NewEntity {
                kind: NodeKind::Method,
                spelling: Some("run".into()),
                type_spelling: "void ()".into(),
                namespace: Some("app".into()),
            },
            None,
            None,
        );
        store.add_edge(a, b, EdgeKind::Contains);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".locus").join("graph.bin");
        store.save(&path).unwrap();

        let loaded = GraphStore::load(&path).unwrap();
        assert_eq!(loaded.stats().entity_count, 2);
        assert!(loaded.has_edge(a, b, EdgeKind::Contains));
        assert_eq!(
            loaded.entity_at(project, "Motion", &FileLocation::new("a.h", 1, 1, 3, 2)),
            Some(a)
        );
        assert_eq!(loaded.find_by_spelling("run"), vec![b]);
        // Ids keep advancing from where the saved store left off.
        let c = loaded
            .entity(a)
            .map(|e| e.id)
            .unwrap();
        assert_eq!(c, a);
    }
}
