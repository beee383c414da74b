//! File scan tracker.
//!
//! Per-build-target map from source file to scan state. It is the visited-set
//! guard that turns the (potentially cyclic) include graph into a DAG of scan
//! operations: a file goes Unscanned -> InProgress -> Done and never
//! backward, so re-entrant "scan that file first" requests terminate.
//!
//! One tracker per target scan, never a process-wide singleton; concurrent
//! project scans each hold their own instance.

use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    Unscanned,
    InProgress,
    Done,
}

#[derive(Debug)]
pub struct ScanTracker {
    states: HashMap<String, ScanState>,
}

impl ScanTracker {
    /// Track exactly the given (root-relative) files; anything else is
    /// unknown to the target and refused.
    pub fn new<I, S>(files: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            states: files
                .into_iter()
                .map(|f| (f.into(), ScanState::Unscanned))
                .collect(),
        }
    }

    /// Claim a file for scanning. Returns false when the file is unknown,
    /// already Done, or already being scanned (re-entrant attempt).
    pub fn mark_in_progress(&mut self, file: &str) -> bool {
        match self.states.get_mut(file) {
            Some(state @ ScanState::Unscanned) => {
                *state = ScanState::InProgress;
                true
            }
            _ => false,
        }
    }

    /// Mark files Done. Unknown files are ignored.
    pub fn mark_done(&mut self, files: &[&str]) {
        for file in files {
            if let Some(state) = self.states.get_mut(*file) {
                *state = ScanState::Done;
            }
        }
    }

    /// True when the file belongs to the target and has not been claimed yet.
    pub fn is_pending(&self, file: &str) -> bool {
        self.states.get(file) == Some(&ScanState::Unscanned)
    }

    pub fn state(&self, file: &str) -> Option<ScanState> {
        self.states.get(file).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_only_transitions() {
        let mut tracker = ScanTracker::new(["a.cpp", "b.cpp"]);
        assert!(tracker.is_pending("a.cpp"));
        assert!(tracker.mark_in_progress("a.cpp"));
        assert!(!tracker.is_pending("a.cpp"));
        // Re-entrant claim of an in-progress file is refused.
        assert!(!tracker.mark_in_progress("a.cpp"));
        tracker.mark_done(&["a.cpp"]);
        assert_eq!(tracker.state("a.cpp"), Some(ScanState::Done));
        // A Done file can never be claimed again.
        assert!(!tracker.mark_in_progress("a.cpp"));
    }

    #[test]
    fn test_unknown_files_refused() {
        let mut tracker = ScanTracker::new(["a.cpp"]);
        assert!(!tracker.mark_in_progress("other.cpp"));
        assert!(!tracker.is_pending("other.cpp"));
        tracker.mark_done(&["other.cpp"]);
        assert_eq!(tracker.state("other.cpp"), None);
    }
}
