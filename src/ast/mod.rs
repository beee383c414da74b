//! AST provider seam.
//!
//! The engine never touches libclang directly. A provider parses one file and
//! hands back an owned `Cursor` tree; the native translation-unit handle is
//! released as soon as that snapshot is built, so parallel scans never share
//! one handle and nothing in the engine carries provider lifetimes.

pub mod libclang;

#[cfg(test)]
pub mod fake;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::graph::NodeKind;

/// The closed set of cursor kinds the engine dispatches on.
///
/// Everything else the provider reports collapses into `Other`; such cursors
/// are still walked (their subtrees may hold references) but never extracted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CursorKind {
    ClassDecl,
    StructDecl,
    FunctionDecl,
    Method,
    Constructor,
    Destructor,
    FieldDecl,
    TypedefDecl,
    VarDecl,
    Namespace,
    FriendDecl,
    TypeRef,
    CallExpr,
    MemberRefExpr,
    DeclRefExpr,
    OverloadedDeclRef,
    CompoundStmt,
    InclusionDirective,
    Other,
}

impl CursorKind {
    /// Class-like kinds whose occurrences are always authoritative.
    pub fn is_container(self) -> bool {
        matches!(self, CursorKind::ClassDecl | CursorKind::StructDecl)
    }

    /// Kinds the node extractor turns into entities.
    pub fn is_candidate(self) -> bool {
        matches!(
            self,
            CursorKind::ClassDecl
                | CursorKind::StructDecl
                | CursorKind::FunctionDecl
                | CursorKind::Method
                | CursorKind::Constructor
                | CursorKind::Destructor
                | CursorKind::FieldDecl
                | CursorKind::TypedefDecl
        )
    }

    /// Kinds skipped by extraction; children are still walked so namespace
    /// bookkeeping stays correct.
    pub fn is_excluded(self) -> bool {
        matches!(self, CursorKind::FriendDecl)
    }

    pub fn is_function_like(self) -> bool {
        matches!(
            self,
            CursorKind::FunctionDecl
                | CursorKind::Method
                | CursorKind::Constructor
                | CursorKind::Destructor
        )
    }

    /// Declarations that anchor a statement scope for dependency linking.
    pub fn is_scope_anchor(self) -> bool {
        matches!(
            self,
            CursorKind::FunctionDecl
                | CursorKind::Method
                | CursorKind::Constructor
                | CursorKind::Destructor
                | CursorKind::FieldDecl
                | CursorKind::TypedefDecl
                | CursorKind::VarDecl
        )
    }

    /// Cursors the linker resolves into dependency edges.
    pub fn is_reference(self) -> bool {
        matches!(
            self,
            CursorKind::TypeRef
                | CursorKind::CallExpr
                | CursorKind::MemberRefExpr
                | CursorKind::DeclRefExpr
                | CursorKind::OverloadedDeclRef
        )
    }

    /// Graph node kind for extraction candidates.
    pub fn node_kind(self) -> Option<NodeKind> {
        match self {
            CursorKind::ClassDecl => Some(NodeKind::Class),
            CursorKind::StructDecl => Some(NodeKind::Struct),
            CursorKind::FunctionDecl => Some(NodeKind::Function),
            CursorKind::Method => Some(NodeKind::Method),
            CursorKind::Constructor => Some(NodeKind::Constructor),
            CursorKind::Destructor => Some(NodeKind::Destructor),
            CursorKind::FieldDecl => Some(NodeKind::Field),
            CursorKind::TypedefDecl => Some(NodeKind::Typedef),
            _ => None,
        }
    }
}

/// A raw provider range: absolute file path plus 1-based line/column bounds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceSpan {
    pub file: PathBuf,
    pub start_line: u32,
    pub start_column: u32,
    pub end_line: u32,
    pub end_column: u32,
}

impl SourceSpan {
    pub fn new(
        file: impl Into<PathBuf>,
        start_line: u32,
        start_column: u32,
        end_line: u32,
        end_column: u32,
    ) -> Self {
        Self {
            file: file.into(),
            start_line,
            start_column,
            end_line,
            end_column,
        }
    }
}

/// Owned snapshot of one provider cursor.
#[derive(Debug, Clone)]
pub struct Cursor {
    pub kind: CursorKind,
    /// Identifier name; `None` for anonymous declarations.
    pub spelling: Option<String>,
    /// Resolved type spelling, empty when the cursor has no type.
    pub type_spelling: String,
    /// This occurrence's own range.
    pub range: Option<SourceSpan>,
    /// Range of the canonical (defining) declaration for this symbol.
    pub canonical: Option<SourceSpan>,
    /// For reference cursors: canonical range of the referenced declaration.
    pub referenced: Option<SourceSpan>,
    /// For `operator=` calls: canonical range of the assignment target's
    /// type declaration. Overloads of `operator=` are frequently implicit and
    /// not reliably locatable, so assignment links go to the type instead.
    pub assign_target: Option<SourceSpan>,
    pub children: Vec<Cursor>,
}

impl Cursor {
    /// A cursor with no payload beyond its kind; used for roots and
    /// statement nodes.
    pub fn bare(kind: CursorKind) -> Self {
        Self {
            kind,
            spelling: None,
            type_spelling: String::new(),
            range: None,
            canonical: None,
            referenced: None,
            assign_target: None,
            children: Vec::new(),
        }
    }

    /// First child that is a compound statement, if any. Function bodies.
    pub fn body(&self) -> Option<&Cursor> {
        self.children
            .iter()
            .find(|c| c.kind == CursorKind::CompoundStmt)
    }
}

/// One parsed translation unit, fully materialized.
#[derive(Debug, Clone)]
pub struct ParsedUnit {
    pub root: Cursor,
}

/// The parser the engine consumes: pure, synchronous, re-entrant per file.
///
/// Providers do not cache across scans; the scan tracker is the only
/// scan-level cache.
pub trait AstProvider {
    fn parse(&self, file: &Path, args: &[String]) -> Result<ParsedUnit>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_sets_are_consistent() {
        for kind in [
            CursorKind::ClassDecl,
            CursorKind::StructDecl,
            CursorKind::FunctionDecl,
            CursorKind::Method,
            CursorKind::Constructor,
            CursorKind::Destructor,
            CursorKind::FieldDecl,
            CursorKind::TypedefDecl,
        ] {
            assert!(kind.is_candidate());
            assert!(kind.node_kind().is_some(), "{kind:?} must map to a node kind");
        }
        assert!(!CursorKind::FriendDecl.is_candidate());
        assert!(CursorKind::FriendDecl.is_excluded());
        assert!(!CursorKind::VarDecl.is_candidate());
        assert!(CursorKind::VarDecl.is_scope_anchor());
        assert!(CursorKind::ClassDecl.is_container());
        assert!(!CursorKind::ClassDecl.is_scope_anchor());
    }

    #[test]
    fn test_body_lookup() {
        let mut f = Cursor::bare(CursorKind::FunctionDecl);
        assert!(f.body().is_none());
        f.children.push(Cursor::bare(CursorKind::CompoundStmt));
        assert_eq!(f.body().unwrap().kind, CursorKind::CompoundStmt);
    }
}
