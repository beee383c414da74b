//! First pass: AST walk and node extraction.
//!
//! Visits every cursor of a translation unit that lies in the file under
//! scan, decides whether the occurrence is authoritative (the definition) or
//! a reference to a definition located elsewhere, and writes entities,
//! implementation locations and member edges to the store incrementally.
//!
//! When a cursor's canonical definition lives in a file this target has not
//! scanned yet, that file is scanned immediately (re-entrant recursion,
//! bounded by the scan tracker) so the defining entity exists before the
//! occurrence is attached to it.

use std::path::Path;
use tracing::{debug, warn};

use super::tracker::ScanTracker;
use super::CancelToken;
use crate::ast::{AstProvider, Cursor, CursorKind};
use crate::graph::{EdgeKind, EntityId, GraphStore, NewEntity, ProjectId, SpanRecord};
use crate::location::FileLocation;
use crate::source::SourceMap;

pub struct NodeExtractor<'a, P: AstProvider> {
    provider: &'a P,
    store: &'a mut GraphStore,
    tracker: &'a mut ScanTracker,
    sources: &'a mut SourceMap,
    root: &'a Path,
    project: ProjectId,
    target: &'a str,
    args: &'a [String],
    cancel: CancelToken,
}

impl<'a, P: AstProvider> NodeExtractor<'a, P> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        provider: &'a P,
        store: &'a mut GraphStore,
        tracker: &'a mut ScanTracker,
        sources: &'a mut SourceMap,
        root: &'a Path,
        project: ProjectId,
        target: &'a str,
        args: &'a [String],
        cancel: CancelToken,
    ) -> Self {
        Self {
            provider,
            store,
            tracker,
            sources,
            root,
            project,
            target,
            args,
            cancel,
        }
    }

    /// Extract all entities declared in one (root-relative) file. A file
    /// already Done or InProgress is a silent no-op; a file that fails to
    /// parse is logged and marked Done so it is not retried.
    pub fn extract_file(&mut self, file: &str) {
        if !self.tracker.mark_in_progress(file) {
            return;
        }
        debug!(file, "extracting nodes");
        match self.provider.parse(&self.root.join(file), self.args) {
            Ok(unit) => {
                let mut includes = Vec::new();
                self.walk(&unit.root, file, String::new(), None, &mut includes);
            }
            Err(e) => warn!(file, error = %e, "parse failed; file yields no entities"),
        }
        self.tracker.mark_done(&[file]);
    }

    fn walk(
        &mut self,
        cursor: &Cursor,
        file: &str,
        namespace: String,
        parent_class: Option<FileLocation>,
        includes: &mut Vec<String>,
    ) {
        for child in &cursor.children {
            if self.cancel.is_cancelled() {
                return;
            }
            let Some(loc) = child
                .range
                .as_ref()
                .map(|s| FileLocation::from_span(s, self.root))
            else {
                continue;
            };
            // Cursors from included headers are handled when that header is
            // the file under scan.
            if loc.file != file {
                continue;
            }

            match child.kind {
                CursorKind::Namespace => {
                    let name = child.spelling.clone().unwrap_or_default();
                    let nested = if namespace.is_empty() {
                        name
                    } else {
                        format!("{}::{}", namespace, name)
                    };
                    self.walk(child, file, nested, None, includes);
                }
                CursorKind::InclusionDirective => {
                    let line = self.sources.line(file, loc.start_line);
                    if !line.is_empty() && !includes.contains(&line) {
                        includes.push(line);
                    }
                }
                kind if kind.is_excluded() => {
                    // Skipped from extraction, but the subtree is still
                    // walked for namespace bookkeeping.
                    self.walk(child, file, namespace.clone(), None, includes);
                }
                kind if kind.is_candidate() => {
                    let id = self.extract_candidate(child, &loc, &namespace, includes);
                    if let (Some(id), Some(parent)) = (id, parent_class.as_ref()) {
                        self.link_member(parent, id);
                    }
                    let next_parent = if kind.is_container() {
                        Some(loc.clone())
                    } else {
                        None
                    };
                    self.walk(child, file, namespace.clone(), next_parent, includes);
                }
                _ => {
                    self.walk(child, file, namespace.clone(), parent_class.clone(), includes);
                }
            }
        }
    }

    /// Handle one candidate declaration cursor; returns the entity it
    /// resolved to, or None when the cursor carries no usable identity.
    fn extract_candidate(
        &mut self,
        cursor: &Cursor,
        current: &FileLocation,
        namespace: &str,
        includes: &[String],
    ) -> Option<EntityId> {
        let kind = cursor.kind.node_kind()?;
        let canonical = cursor
            .canonical
            .as_ref()
            .map(|s| FileLocation::from_span(s, self.root))
            .unwrap_or_else(|| current.clone());
        let new = NewEntity {
            kind,
            spelling: cursor.spelling.clone(),
            type_spelling: cursor.type_spelling.clone(),
            namespace: if namespace.is_empty() {
                None
            } else {
                Some(namespace.to_string())
            },
        };

        // A container occurrence is always authoritative (forward
        // declarations become their own entities until consolidation);
        // everything else is authoritative only when it *is* the canonical
        // declaration.
        if cursor.kind.is_container() || *current == canonical {
            let display = self.display_name(cursor, current);
            let text = self.sources.slice(current);
            let id = self.store.upsert_by_define_location(
                self.project,
                self.target,
                current.clone(),
                new,
                Some(display),
                Some(text),
            );
            return Some(id);
        }

        // This occurrence implements a definition located elsewhere. Scan
        // the defining file first so the entity exists; the tracker's Done
        // guard bounds the recursion on circular includes.
        if self.tracker.is_pending(&canonical.file) {
            let defining = canonical.file.clone();
            debug!(file = %defining, "scanning defining file first");
            self.extract_file(&defining);
        }

        let id = match self.store.entity_at(self.project, self.target, &canonical) {
            Some(id) => id,
            None => self.store.upsert_by_define_location(
                self.project,
                self.target,
                canonical,
                new,
                None,
                None,
            ),
        };
        let display = self.display_name(cursor, current);
        let text = self.sources.slice(current);
        self.store.attach_implementation(
            id,
            SpanRecord {
                location: current.clone(),
                display_name: Some(display),
                source_text: Some(text),
            },
        );
        self.store.append_includes(id, includes);
        Some(id)
    }

    fn link_member(&mut self, parent: &FileLocation, member: EntityId) {
        match self.store.entity_at(self.project, self.target, parent) {
            Some(owner) => {
                self.store.add_edge(owner, member, EdgeKind::Contains);
            }
            None => {
                // The enclosing class was extracted just before its members;
                // its absence is a contract break between walk and store.
                debug_assert!(false, "member link target not found at {parent}");
                warn!(parent = %parent, member = %member, "member owner missing; edge skipped");
            }
        }
    }

    /// Pretty-printed signature for a cursor.
    ///
    /// Containers: text from the range start up to the first child, with the
    /// trailing brace trimmed, leaving the declaration header without the body.
    /// Function-likes: text up to the compound-statement body (cut at the
    /// body's starting column when it opens on the declaration line). All
    /// other kinds use the full range's text.
    fn display_name(&mut self, cursor: &Cursor, loc: &FileLocation) -> String {
        if cursor.kind.is_container() {
            if let Some(first) = cursor.children.iter().find_map(|c| c.range.as_ref()) {
                let first_loc = FileLocation::from_span(first, self.root);
                if first_loc.file == loc.file {
                    let head = self
                        .sources
                        .slice_to(loc, first_loc.start_line, first_loc.start_column);
                    return head
                        .trim_end()
                        .trim_end_matches('{')
                        .trim_end()
                        .to_string();
                }
            }
            self.sources.slice(loc)
        } else if cursor.kind.is_function_like() {
            if let Some(body) = cursor.body().and_then(|b| b.range.as_ref()) {
                let body_loc = FileLocation::from_span(body, self.root);
                return self
                    .sources
                    .slice_to(loc, body_loc.start_line, body_loc.start_column)
                    .trim_end()
                    .to_string();
            }
            self.sources.slice(loc)
        } else {
            self.sources.slice(loc)
        }
    }
}
