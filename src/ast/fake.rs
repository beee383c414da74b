//! Scripted AST provider for tests.
//!
//! Engine tests hand-build cursor trees instead of invoking libclang, so the
//! full two-pass pipeline runs hermetically on any machine.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use super::{AstProvider, Cursor, CursorKind, ParsedUnit, SourceSpan};
use crate::error::{LocusError, Result};

#[derive(Default)]
pub struct FakeProvider {
    units: HashMap<PathBuf, ParsedUnit>,
}

impl FakeProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the parse result for an (absolute) file path.
    pub fn insert(&mut self, file: impl Into<PathBuf>, children: Vec<Cursor>) {
        let mut root = Cursor::bare(CursorKind::Other);
        root.children = children;
        self.units.insert(file.into(), ParsedUnit { root });
    }
}

impl AstProvider for FakeProvider {
    fn parse(&self, file: &Path, _args: &[String]) -> Result<ParsedUnit> {
        self.units
            .get(file)
            .cloned()
            .ok_or_else(|| LocusError::Parse(format!("no scripted unit for {}", file.display())))
    }
}

/// A declaration cursor whose occurrence is its own canonical location.
pub fn decl(kind: CursorKind, name: &str, ty: &str, span: SourceSpan) -> Cursor {
    Cursor {
        kind,
        spelling: Some(name.to_string()),
        type_spelling: ty.to_string(),
        canonical: Some(span.clone()),
        range: Some(span),
        referenced: None,
        assign_target: None,
        children: Vec::new(),
    }
}

/// A declaration cursor whose canonical definition lives elsewhere.
pub fn decl_split(
    kind: CursorKind,
    name: &str,
    ty: &str,
    span: SourceSpan,
    canonical: SourceSpan,
) -> Cursor {
    let mut c = decl(kind, name, ty, span);
    c.canonical = Some(canonical);
    c
}

/// A reference cursor resolving to a declaration's canonical span.
pub fn refer(kind: CursorKind, name: &str, span: SourceSpan, target: SourceSpan) -> Cursor {
    Cursor {
        kind,
        spelling: Some(name.to_string()),
        type_spelling: String::new(),
        range: Some(span),
        canonical: None,
        referenced: Some(target),
        assign_target: None,
        children: Vec::new(),
    }
}

/// An `operator=` call that resolves through the target type's declaration.
pub fn assign_call(span: SourceSpan, target_type: SourceSpan) -> Cursor {
    Cursor {
        kind: CursorKind::CallExpr,
        spelling: Some("operator=".to_string()),
        type_spelling: String::new(),
        range: Some(span),
        canonical: None,
        referenced: None,
        assign_target: Some(target_type),
        children: Vec::new(),
    }
}

pub fn compound(span: SourceSpan) -> Cursor {
    let mut c = Cursor::bare(CursorKind::CompoundStmt);
    c.range = Some(span);
    c
}

pub fn namespace(name: &str, span: SourceSpan, children: Vec<Cursor>) -> Cursor {
    let mut c = decl(CursorKind::Namespace, name, "", span);
    c.children = children;
    c
}

pub fn include_directive(span: SourceSpan) -> Cursor {
    let mut c = Cursor::bare(CursorKind::InclusionDirective);
    c.range = Some(span);
    c
}

/// Attach children to a cursor, builder-style.
pub fn with_children(mut cursor: Cursor, children: Vec<Cursor>) -> Cursor {
    cursor.children = children;
    cursor
}
