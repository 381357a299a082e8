//! Non-fatal conditions surfaced by the document-correction passes.

use serde::Serialize;
use std::fmt;

use crate::cell_ref::format_cell_ref;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// A write targeted a merged cell that is not the merge's top-left
    /// cell; the write was skipped.
    MergedCellConflict,
}

/// A skipped write, located by its 0-indexed cell position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub row: u32,
    pub column: u32,
    pub kind: DiagnosticKind,
}

impl Diagnostic {
    #[must_use]
    pub fn merged(row: u32, column: u32) -> Self {
        Self {
            row,
            column,
            kind: DiagnosticKind::MergedCellConflict,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            DiagnosticKind::MergedCellConflict => write!(
                f,
                "skipped merged cell {} in row {}",
                format_cell_ref(self.row, self.column),
                self.row + 1
            ),
        }
    }
}
