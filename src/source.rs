//! Per-scan source text cache.
//!
//! Snippet capture, display-name computation and include-line capture all
//! need raw text by (line, column) range. Files are read once per scan and
//! sliced on demand; unreadable files degrade to empty text so a bad file
//! never aborts a pass.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::location::FileLocation;

pub struct SourceMap {
    root: PathBuf,
    files: HashMap<String, Vec<String>>,
}

impl SourceMap {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            files: HashMap::new(),
        }
    }

    fn lines(&mut self, file: &str) -> &[String] {
        if !self.files.contains_key(file) {
            let loaded = match fs::read_to_string(self.root.join(file)) {
                Ok(text) => text.lines().map(str::to_string).collect(),
                Err(e) => {
                    warn!(file, error = %e, "source unreadable; using empty text");
                    Vec::new()
                }
            };
            self.files.insert(file.to_string(), loaded);
        }
        &self.files[file]
    }

    /// Text of the half-open range `[start, end)`. Lines and columns are
    /// 1-based; out-of-bounds positions clamp.
    pub fn slice(&mut self, loc: &FileLocation) -> String {
        self.slice_between(
            &loc.file,
            loc.start_line,
            loc.start_column,
            loc.end_line,
            loc.end_column,
        )
    }

    /// Text from the start of `loc` up to (but excluding) the given position.
    pub fn slice_to(&mut self, loc: &FileLocation, end_line: u32, end_column: u32) -> String {
        self.slice_between(&loc.file, loc.start_line, loc.start_column, end_line, end_column)
    }

    /// One raw source line, trimmed. Used to capture `#include` directives
    /// verbatim.
    pub fn line(&mut self, file: &str, line: u32) -> String {
        let lines = self.lines(file);
        lines
            .get(line.saturating_sub(1) as usize)
            .map(|l| l.trim().to_string())
            .unwrap_or_default()
    }

    fn slice_between(
        &mut self,
        file: &str,
        start_line: u32,
        start_column: u32,
        end_line: u32,
        end_column: u32,
    ) -> String {
        let lines = self.lines(file);
        if lines.is_empty() || start_line == 0 || end_line < start_line {
            return String::new();
        }
        let start_idx = (start_line - 1) as usize;
        let end_idx = ((end_line - 1) as usize).min(lines.len().saturating_sub(1));
        if start_idx >= lines.len() {
            return String::new();
        }

        let col = |line: &str, c: u32| (c.saturating_sub(1) as usize).min(line.len());

        if start_idx == end_idx {
            let line = &lines[start_idx];
            let from = col(line, start_column);
            let to = col(line, end_column).max(from);
            return line[from..to].to_string();
        }

        let mut out = String::new();
        out.push_str(&lines[start_idx][col(&lines[start_idx], start_column)..]);
        for line in &lines[start_idx + 1..end_idx] {
            out.push('\n');
            out.push_str(line);
        }
        out.push('\n');
        let last = &lines[end_idx];
        out.push_str(&last[..col(last, end_column)]);
        out
    }
}
