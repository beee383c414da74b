//! Production AST provider backed by libclang (via the `clang` crate).
//!
//! Each `parse` call builds a fresh index, parses the file, converts the
//! cursors that live in that file into an owned [`Cursor`] tree and drops the
//! translation unit before returning. Cursors from included headers are
//! pruned here; each header is parsed in its own right when it is the file
//! under scan.

use clang::source::SourceRange;
use clang::{Clang, Entity, EntityKind, Index};
use std::path::Path;
use tracing::debug;

use super::{AstProvider, Cursor, CursorKind, ParsedUnit, SourceSpan};
use crate::error::{LocusError, Result};

pub struct ClangProvider {
    clang: Clang,
}

impl ClangProvider {
    /// Load libclang. Failure here is the one fatal scan error: without a
    /// provider no file can be visited.
    pub fn new() -> Result<Self> {
        let clang = Clang::new().map_err(LocusError::Provider)?;
        Ok(Self { clang })
    }
}

impl AstProvider for ClangProvider {
    fn parse(&self, file: &Path, args: &[String]) -> Result<ParsedUnit> {
        let index = Index::new(&self.clang, false, false);
        let tu = index
            .parser(file)
            .arguments(args)
            // Needed so #include directives surface as cursors.
            .detailed_preprocessing_record(true)
            .parse()
            .map_err(|e| LocusError::Parse(format!("{}: {}", file.display(), e)))?;

        let root = convert(tu.get_entity(), file);
        debug!(file = %file.display(), children = root.children.len(), "parsed translation unit");
        Ok(ParsedUnit { root })
        // `tu` and `index` drop here; the native handle is never retained.
    }
}

fn convert(entity: Entity<'_>, file: &Path) -> Cursor {
    let kind = map_kind(entity.get_kind());

    let assign_target = if kind == CursorKind::CallExpr
        && entity.get_name().as_deref() == Some("operator=")
    {
        entity
            .get_arguments()
            .and_then(|args| args.first().copied())
            .and_then(|arg| arg.get_type())
            .and_then(|ty| ty.get_declaration())
            .and_then(|decl| decl.get_canonical_entity().get_range())
            .and_then(span_of)
    } else {
        None
    };

    Cursor {
        kind,
        spelling: entity.get_name(),
        type_spelling: entity
            .get_type()
            .map(|t| t.get_display_name())
            .unwrap_or_default(),
        range: entity.get_range().and_then(span_of),
        canonical: entity.get_canonical_entity().get_range().and_then(span_of),
        referenced: entity
            .get_reference()
            .and_then(|r| r.get_canonical_entity().get_range())
            .and_then(span_of),
        assign_target,
        children: entity
            .get_children()
            .into_iter()
            .filter(|child| in_file(child, file))
            .map(|child| convert(child, file))
            .collect(),
    }
}

/// Keep only cursors whose own range lies in the parsed file.
fn in_file(entity: &Entity<'_>, file: &Path) -> bool {
    entity
        .get_range()
        .and_then(span_of)
        .map(|span| span.file == file)
        .unwrap_or(false)
}

fn span_of(range: SourceRange<'_>) -> Option<SourceSpan> {
    let start = range.get_start().get_expansion_location();
    let end = range.get_end().get_expansion_location();
    let file = start.file?.get_path();
    Some(SourceSpan {
        file,
        start_line: start.line,
        start_column: start.column,
        end_line: end.line,
        end_column: end.column,
    })
}

fn map_kind(kind: EntityKind) -> CursorKind {
    match kind {
        EntityKind::ClassDecl => CursorKind::ClassDecl,
        EntityKind::StructDecl => CursorKind::StructDecl,
        EntityKind::FunctionDecl => CursorKind::FunctionDecl,
        EntityKind::Method => CursorKind::Method,
        EntityKind::Constructor => CursorKind::Constructor,
        EntityKind::Destructor => CursorKind::Destructor,
        EntityKind::FieldDecl => CursorKind::FieldDecl,
        EntityKind::TypedefDecl | EntityKind::TypeAliasDecl => CursorKind::TypedefDecl,
        EntityKind::VarDecl => CursorKind::VarDecl,
        EntityKind::Namespace => CursorKind::Namespace,
        EntityKind::FriendDecl => CursorKind::FriendDecl,
        EntityKind::TypeRef => CursorKind::TypeRef,
        EntityKind::CallExpr => CursorKind::CallExpr,
        EntityKind::MemberRefExpr => CursorKind::MemberRefExpr,
        EntityKind::DeclRefExpr => CursorKind::DeclRefExpr,
        EntityKind::OverloadedDeclRef => CursorKind::OverloadedDeclRef,
        EntityKind::CompoundStmt => CursorKind::CompoundStmt,
        EntityKind::InclusionDirective => CursorKind::InclusionDirective,
        _ => CursorKind::Other,
    }
}
