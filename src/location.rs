//! Source locations: the identity mechanism of the whole index.
//!
//! Until an entity exists in the store, the only way to recognize "the same
//! declaration seen again" is structural equality of its source range, so
//! `FileLocation` is an immutable, hashable value type and every lookup path
//! in the store keys on it exactly.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

use crate::ast::SourceSpan;

/// A half-open source range inside one file.
///
/// The file path is project-root-relative with `/` separators; lines and
/// columns are 1-based. Two locations are equal only when every field is
/// equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FileLocation {
    pub file: String,
    pub start_line: u32,
    pub start_column: u32,
    pub end_line: u32,
    pub end_column: u32,
}

impl FileLocation {
    pub fn new(
        file: impl Into<String>,
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

    /// Convert a provider span into a root-relative location.
    ///
    /// Paths outside the root (system headers, for example) are kept as-is;
    /// they never match a project file and thus never collide with project
    /// identities.
    pub fn from_span(span: &SourceSpan, root: &Path) -> Self {
        let rel = span
            .file
            .strip_prefix(root)
            .unwrap_or(&span.file)
            .to_string_lossy()
            .replace('\\', "/");
        Self {
            file: rel,
            start_line: span.start_line,
            start_column: span.start_column,
            end_line: span.end_line,
            end_column: span.end_column,
        }
    }

    /// A usable location has a file and a non-zero range.
    pub fn is_valid(&self) -> bool {
        !self.file.is_empty()
            && !(self.start_line == 0
                && self.start_column == 0
                && self.end_line == 0
                && self.end_column == 0)
    }

    /// Line-range containment within the same file.
    ///
    /// This is the self-reference test: a resolved target that falls inside
    /// the referencing scope's own lines must not become an edge. Columns are
    /// deliberately ignored.
    pub fn contains_lines(&self, other: &FileLocation) -> bool {
        self.file == other.file
            && other.start_line >= self.start_line
            && other.end_line <= self.end_line
    }
}

impl fmt::Display for FileLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}-{}:{}",
            self.file, self.start_line, self.start_column, self.end_line, self.end_column
        )
    }
}
