//! The two-pass scan engine.
//!
//! A scan runs per build target: pass one extracts every declaration into
//! the store (`extract`), pass two resolves references into edges (`link`),
//! and a post-pass folds forward declarations (`consolidate`). Pass two only
//! starts once pass one has seen every file of the target, so any reference
//! can resolve no matter which file defines its target.

pub mod consolidate;
pub mod extract;
pub mod link;
pub mod tracker;

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

use crate::ast::AstProvider;
use crate::error::Result;
use crate::graph::{GraphStore, ProjectId};
use crate::source::SourceMap;

use consolidate::consolidate;
use extract::NodeExtractor;
use link::ReferenceLinker;
use tracker::ScanTracker;

/// One build target: a named set of source files compiled with one argument
/// list. The same header may belong to several targets; each target gets its
/// own entities for it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildTargetConfig {
    pub name: String,
    /// Root-relative source files, in scan order.
    pub files: Vec<String>,
    /// Extra compiler arguments (include paths, defines, `-std=`).
    #[serde(default)]
    pub compiler_args: Vec<String>,
}

/// Cooperative cancellation flag shared between a scan and its caller.
///
/// Checked at file and cursor granularity; a tripped token stops the scan at
/// the next check and leaves a valid partial graph behind.
#[derive(Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

/// Scan all build targets of a project into the store.
///
/// Targets run in order; within a target the extraction pass may scan files
/// out of order when declarations pull their defining file forward, which is
/// why completion is tracked per file and not by list position.
pub fn scan<P: AstProvider>(
    store: &mut GraphStore,
    provider: &P,
    project: ProjectId,
    root: &Path,
    targets: &[BuildTargetConfig],
    cancel: CancelToken,
) -> Result<()> {
    for target in targets {
        if cancel.is_cancelled() {
            warn!(target = %target.name, "scan cancelled before target");
            return Ok(());
        }
        scan_target(store, provider, project, root, target, cancel.clone());
    }
    Ok(())
}

fn scan_target<P: AstProvider>(
    store: &mut GraphStore,
    provider: &P,
    project: ProjectId,
    root: &Path,
    target: &BuildTargetConfig,
    cancel: CancelToken,
) {
    info!(target = %target.name, files = target.files.len(), "scan starting");
    let mut tracker = ScanTracker::new(target.files.iter().cloned());
    let mut sources = SourceMap::new(root);

    let mut extractor = NodeExtractor::new(
        provider,
        store,
        &mut tracker,
        &mut sources,
        root,
        project,
        &target.name,
        &target.compiler_args,
        cancel.clone(),
    );
    for file in &target.files {
        if cancel.is_cancelled() {
            warn!(target = %target.name, "scan cancelled during extraction");
            return;
        }
        extractor.extract_file(file);
    }

    let mut linker = ReferenceLinker::new(
        provider,
        store,
        root,
        project,
        &target.name,
        &target.compiler_args,
        cancel.clone(),
    );
    for file in &target.files {
        if cancel.is_cancelled() {
            warn!(target = %target.name, "scan cancelled during linking");
            return;
        }
        linker.link_file(file);
    }

    consolidate(store, project, &target.name);
    let stats = store.stats();
    info!(
        target = %target.name,
        entities = stats.entity_count,
        edges = stats.edge_count,
        "scan complete"
    );
}
