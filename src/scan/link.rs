//! Second pass: cross-reference linking.
//!
//! Re-walks every file of the target after all entities exist and turns
//! reference cursors into edges. Two notions of "current context" travel
//! down the walk:
//!
//! * the owner, the nearest enclosing declaration of any extractable kind.
//!   Type references attach to it as `UsesType` edges.
//! * the scope, the statement-level anchor (function, method, constructor,
//!   destructor, field, typedef or variable declaration). Calls and value
//!   references attach to it as `References` edges, assignments as
//!   `Assigns`. A declaration inside a function body never replaces the
//!   scope; the enclosing function stays the anchor for its whole body.
//!
//! A reference that cannot be resolved, points at an invalid location, or
//! falls back inside the scope's own lines is dropped with a log line; one
//! bad reference never stops the pass.

use std::path::Path;
use tracing::{debug, warn};

use super::CancelToken;
use crate::ast::{AstProvider, Cursor, CursorKind, SourceSpan};
use crate::graph::{EdgeKind, EntityId, GraphStore, ProjectId};
use crate::location::FileLocation;

pub struct ReferenceLinker<'a, P: AstProvider> {
    provider: &'a P,
    store: &'a mut GraphStore,
    root: &'a Path,
    project: ProjectId,
    target: &'a str,
    args: &'a [String],
    cancel: CancelToken,
}

/// Enclosing-declaration context for one point of the walk.
#[derive(Clone, Default)]
struct LinkContext {
    owner: Option<EntityId>,
    scope: Option<(EntityId, FileLocation)>,
    in_body: bool,
}

impl<'a, P: AstProvider> ReferenceLinker<'a, P> {
    pub fn new(
        provider: &'a P,
        store: &'a mut GraphStore,
        root: &'a Path,
        project: ProjectId,
        target: &'a str,
        args: &'a [String],
        cancel: CancelToken,
    ) -> Self {
        Self {
            provider,
            store,
            root,
            project,
            target,
            args,
            cancel,
        }
    }

    /// Link all references found in one (root-relative) file.
    pub fn link_file(&mut self, file: &str) {
        debug!(file, "linking references");
        match self.provider.parse(&self.root.join(file), self.args) {
            Ok(unit) => self.walk(&unit.root, file, LinkContext::default()),
            Err(e) => warn!(file, error = %e, "parse failed; file yields no edges"),
        }
    }

    fn walk(&mut self, cursor: &Cursor, file: &str, ctx: LinkContext) {
        for child in &cursor.children {
            if self.cancel.is_cancelled() {
                return;
            }
            let loc = child
                .range
                .as_ref()
                .map(|s| FileLocation::from_span(s, self.root));
            if loc.as_ref().is_some_and(|l| l.file != file) {
                continue;
            }

            let mut next = ctx.clone();
            if child.kind == CursorKind::CompoundStmt {
                next.in_body = true;
            }
            if let Some(loc) = &loc {
                if child.kind.is_candidate() {
                    if let Some(id) = self.store.entity_at(self.project, self.target, loc) {
                        next.owner = Some(id);
                        if child.kind.is_scope_anchor() && !ctx.in_body {
                            next.scope = Some((id, loc.clone()));
                        }
                    }
                } else if child.kind.is_scope_anchor() && !ctx.in_body {
                    // Variable declarations anchor a scope without being
                    // entities themselves; the anchor is the enclosing
                    // declaration when one resolves, otherwise none.
                    if let Some(id) = self.store.entity_at(self.project, self.target, loc) {
                        next.scope = Some((id, loc.clone()));
                    }
                }
            }

            if child.kind == CursorKind::TypeRef {
                self.link_type_ref(child, &next);
            } else if child.kind.is_reference() {
                self.link_dependency(child, &next);
            }

            self.walk(child, file, next);
        }
    }

    /// A type reference becomes `UsesType` from the owner; the scope also
    /// records it as a plain dependency so call-level views see the type.
    fn link_type_ref(&mut self, cursor: &Cursor, ctx: &LinkContext) {
        let Some((target, target_loc)) = self.resolve(cursor.referenced.as_ref(), cursor) else {
            return;
        };
        if let Some(owner) = ctx.owner {
            if owner != target {
                self.store.add_edge(owner, target, EdgeKind::UsesType);
            }
        }
        if let Some((scope, scope_loc)) = &ctx.scope {
            self.emit_dependency(*scope, scope_loc, target, &target_loc, EdgeKind::References);
        }
    }

    /// Calls, member accesses and value references become `References` from
    /// the scope; an `operator=` call additionally links the assignment
    /// target's type with `Assigns`.
    fn link_dependency(&mut self, cursor: &Cursor, ctx: &LinkContext) {
        let Some((scope, scope_loc)) = ctx.scope.clone() else {
            return;
        };
        if let Some((target, target_loc)) = self.resolve(cursor.referenced.as_ref(), cursor) {
            self.emit_dependency(scope, &scope_loc, target, &target_loc, EdgeKind::References);
        }
        if cursor.kind == CursorKind::CallExpr && cursor.spelling.as_deref() == Some("operator=") {
            if let Some((target, target_loc)) = self.resolve(cursor.assign_target.as_ref(), cursor)
            {
                self.emit_dependency(scope, &scope_loc, target, &target_loc, EdgeKind::Assigns);
            }
        }
    }

    fn emit_dependency(
        &mut self,
        from: EntityId,
        from_loc: &FileLocation,
        to: EntityId,
        to_loc: &FileLocation,
        kind: EdgeKind,
    ) {
        if from == to {
            return;
        }
        // A reference landing inside the scope's own lines (a recursive
        // mention, a definition nested in the body) is not a dependency.
        // The check runs on the location the reference resolved through,
        // which may be an implementation rather than the define location.
        if from_loc.contains_lines(to_loc) {
            return;
        }
        self.store.add_edge(from, to, kind);
    }

    /// Map a referenced span to an existing entity and the location it
    /// resolved through. Misses are logged and yield nothing; linking never
    /// creates entities.
    fn resolve(&self, span: Option<&SourceSpan>, cursor: &Cursor) -> Option<(EntityId, FileLocation)> {
        let span = span?;
        let loc = FileLocation::from_span(span, self.root);
        if !loc.is_valid() {
            debug!(kind = ?cursor.kind, "reference target has no usable location");
            return None;
        }
        let found = self.store.entity_at(self.project, self.target, &loc);
        if found.is_none() {
            warn!(
                kind = ?cursor.kind,
                name = cursor.spelling.as_deref().unwrap_or("<anon>"),
                target = %loc,
                "reference target not in graph; edge skipped"
            );
        }
        found.map(|id| (id, loc))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::fake::*;
    use crate::graph::{GraphStore, NewEntity, NodeKind, ProjectId, SpanRecord};
    use std::path::PathBuf;

    struct Fixture {
        provider: FakeProvider,
        store: GraphStore,
        project: ProjectId,
        root: PathBuf,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                provider: FakeProvider::new(),
                store: GraphStore::new(),
                project: ProjectId::new(),
                root: PathBuf::from("/proj"),
            }
        }

        fn span(&self, file: &str, sl: u32, sc: u32, el: u32, ec: u32) -> SourceSpan {
            SourceSpan::new(self.root.join(file), sl, sc, el, ec)
        }

        fn entity(&mut self, kind: NodeKind, name: &str, loc: FileLocation) -> EntityId {
            self.store.upsert_by_define_location(
                self.project,
                "Motion",
                loc,
                NewEntity {
                    kind,
                    spelling: Some(name.to_string()),
                    type_spelling: name.to_string(),
                    namespace: None,
                },
                None,
                None,
            )
        }

        fn link(&mut self, files: &[&str]) {
            let args = Vec::new();
            let mut linker = ReferenceLinker::new(
                &self.provider,
                &mut self.store,
                &self.root,
                self.project,
                "Motion",
                &args,
                CancelToken::new(),
            );
            for file in files {
                linker.link_file(file);
            }
        }
    }

    use crate::ast::CursorKind;

    #[test]
    fn test_call_inside_body_links_from_function() {
        let mut fx = Fixture::new();
        let caller = fx.entity(
            NodeKind::Function,
            "run",
            FileLocation::new("a.cpp", 1, 1, 3, 2),
        );
        let callee = fx.entity(
            NodeKind::Function,
            "log",
            FileLocation::new("log.h", 1, 1, 1, 12),
        );

        let mut func = decl(
            CursorKind::FunctionDecl,
            "run",
            "void ()",
            fx.span("a.cpp", 1, 1, 3, 2),
        );
        let mut body = compound(fx.span("a.cpp", 1, 12, 3, 2));
        body.children.push(refer(
            CursorKind::CallExpr,
            "log",
            fx.span("a.cpp", 2, 3, 2, 8),
            fx.span("log.h", 1, 1, 1, 12),
        ));
        func.children.push(body);
        fx.provider.insert(fx.root.join("a.cpp"), vec![func]);
        fx.link(&["a.cpp"]);

        assert!(fx.store.has_edge(caller, callee, EdgeKind::References));
        // Repeated linking stays idempotent.
        fx.link(&["a.cpp"]);
        assert_eq!(fx.store.stats().edge_count, 1);
    }

    #[test]
    fn test_type_ref_links_uses_type_from_owner() {
        let mut fx = Fixture::new();
        let class = fx.entity(
            NodeKind::Class,
            "Node",
            FileLocation::new("n.h", 1, 1, 4, 2),
        );
        let field = fx.entity(
            NodeKind::Field,
            "timer",
            FileLocation::new("n.h", 2, 3, 2, 15),
        );
        let timer = fx.entity(
            NodeKind::Class,
            "Timer",
            FileLocation::new("t.h", 1, 1, 5, 2),
        );

        let class_cursor = with_children(
            decl(CursorKind::ClassDecl, "Node", "Node", fx.span("n.h", 1, 1, 4, 2)),
            vec![with_children(
                decl(CursorKind::FieldDecl, "timer", "Timer", fx.span("n.h", 2, 3, 2, 15)),
                vec![refer(
                    CursorKind::TypeRef,
                    "Timer",
                    fx.span("n.h", 2, 3, 2, 8),
                    fx.span("t.h", 1, 1, 5, 2),
                )],
            )],
        );
        fx.provider.insert(fx.root.join("n.h"), vec![class_cursor]);
        fx.link(&["n.h"]);

        // The field owns the type usage and anchors the dependency.
        assert!(fx.store.has_edge(field, timer, EdgeKind::UsesType));
        assert!(fx.store.has_edge(field, timer, EdgeKind::References));
        assert!(!fx.store.has_edge(class, timer, EdgeKind::UsesType));
    }

    #[test]
    fn test_assignment_links_target_type() {
        let mut fx = Fixture::new();
        let method = fx.entity(
            NodeKind::Method,
            "reset",
            FileLocation::new("a.cpp", 1, 1, 3, 2),
        );
        let state = fx.entity(
            NodeKind::Class,
            "State",
            FileLocation::new("s.h", 1, 1, 6, 2),
        );

        let mut func = decl(
            CursorKind::Method,
            "reset",
            "void ()",
            fx.span("a.cpp", 1, 1, 3, 2),
        );
        let mut body = compound(fx.span("a.cpp", 1, 14, 3, 2));
        body.children
            .push(assign_call(fx.span("a.cpp", 2, 3, 2, 20), fx.span("s.h", 1, 1, 6, 2)));
        func.children.push(body);
        fx.provider.insert(fx.root.join("a.cpp"), vec![func]);
        fx.link(&["a.cpp"]);

        assert!(fx.store.has_edge(method, state, EdgeKind::Assigns));
    }

    #[test]
    fn test_self_reference_excluded() {
        let mut fx = Fixture::new();
        let recur = fx.entity(
            NodeKind::Function,
            "walk",
            FileLocation::new("a.cpp", 1, 1, 5, 2),
        );

        let mut func = decl(
            CursorKind::FunctionDecl,
            "walk",
            "void ()",
            fx.span("a.cpp", 1, 1, 5, 2),
        );
        let mut body = compound(fx.span("a.cpp", 1, 13, 5, 2));
        // A recursive call resolves back into the function's own lines.
        body.children.push(refer(
            CursorKind::CallExpr,
            "walk",
            fx.span("a.cpp", 3, 3, 3, 9),
            fx.span("a.cpp", 1, 1, 5, 2),
        ));
        func.children.push(body);
        fx.provider.insert(fx.root.join("a.cpp"), vec![func]);
        fx.link(&["a.cpp"]);

        assert!(!fx.store.has_edge(recur, recur, EdgeKind::References));
        assert_eq!(fx.store.stats().edge_count, 0);
    }

    #[test]
    fn test_reference_resolved_inside_scope_excluded() {
        let mut fx = Fixture::new();
        let func_id = fx.entity(
            NodeKind::Function,
            "setup",
            FileLocation::new("a.cpp", 1, 1, 6, 2),
        );
        // Declared in a header, but defined nested inside setup's body.
        let helper = fx.entity(
            NodeKind::Function,
            "helper",
            FileLocation::new("h.h", 1, 1, 1, 14),
        );
        fx.store
            .attach_implementation(helper, SpanRecord::bare(FileLocation::new("a.cpp", 2, 3, 4, 4)));

        let mut func = decl(
            CursorKind::FunctionDecl,
            "setup",
            "void ()",
            fx.span("a.cpp", 1, 1, 6, 2),
        );
        let mut body = compound(fx.span("a.cpp", 1, 14, 6, 2));
        // The call resolves through the nested definition; the edge would
        // point back into the function's own lines and must be dropped.
        body.children.push(refer(
            CursorKind::CallExpr,
            "helper",
            fx.span("a.cpp", 5, 3, 5, 12),
            fx.span("a.cpp", 2, 3, 4, 4),
        ));
        func.children.push(body);
        fx.provider.insert(fx.root.join("a.cpp"), vec![func]);
        fx.link(&["a.cpp"]);

        assert!(!fx.store.has_edge(func_id, helper, EdgeKind::References));
        assert_eq!(fx.store.stats().edge_count, 0);
    }

    #[test]
    fn test_declaration_inside_body_keeps_function_scope() {
        let mut fx = Fixture::new();
        let func_id = fx.entity(
            NodeKind::Function,
            "setup",
            FileLocation::new("a.cpp", 1, 1, 6, 2),
        );
        let helper = fx.entity(
            NodeKind::Function,
            "helper",
            FileLocation::new("h.h", 1, 1, 1, 14),
        );

        let mut func = decl(
            CursorKind::FunctionDecl,
            "setup",
            "void ()",
            fx.span("a.cpp", 1, 1, 6, 2),
        );
        let mut body = compound(fx.span("a.cpp", 1, 14, 6, 2));
        // A local variable declaration inside the body; the call nested under
        // it still links from the function, not from the local.
        let mut local = decl(
            CursorKind::VarDecl,
            "tmp",
            "int",
            fx.span("a.cpp", 2, 3, 2, 25),
        );
        local.children.push(refer(
            CursorKind::CallExpr,
            "helper",
            fx.span("a.cpp", 2, 13, 2, 24),
            fx.span("h.h", 1, 1, 1, 14),
        ));
        body.children.push(local);
        func.children.push(body);
        fx.provider.insert(fx.root.join("a.cpp"), vec![func]);
        fx.link(&["a.cpp"]);

        assert!(fx.store.has_edge(func_id, helper, EdgeKind::References));
    }

    #[test]
    fn test_unresolved_and_invalid_targets_skipped() {
        let mut fx = Fixture::new();
        fx.entity(
            NodeKind::Function,
            "run",
            FileLocation::new("a.cpp", 1, 1, 3, 2),
        );

        let mut func = decl(
            CursorKind::FunctionDecl,
            "run",
            "void ()",
            fx.span("a.cpp", 1, 1, 3, 2),
        );
        let mut body = compound(fx.span("a.cpp", 1, 12, 3, 2));
        // Target never extracted.
        body.children.push(refer(
            CursorKind::CallExpr,
            "ghost",
            fx.span("a.cpp", 2, 3, 2, 10),
            fx.span("ghost.h", 4, 1, 4, 12),
        ));
        // Target with an all-zero location.
        body.children.push(refer(
            CursorKind::DeclRefExpr,
            "builtin",
            fx.span("a.cpp", 2, 12, 2, 19),
            fx.span("a.cpp", 0, 0, 0, 0),
        ));
        func.children.push(body);
        fx.provider.insert(fx.root.join("a.cpp"), vec![func]);
        fx.link(&["a.cpp"]);

        assert_eq!(fx.store.stats().edge_count, 0);
    }
}
