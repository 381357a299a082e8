//! Editable XLSX documents.
//!
//! A [`Document`] keeps the original package bytes, the parsed active
//! sheet, and a set of pending edits. Saving splices the edits into the
//! original worksheet XML so styling, merges and every other part of the
//! package survive untouched.

pub(crate) mod mutation;

use tracing::{debug, warn};

use crate::diagnostic::Diagnostic;
use crate::error::Result;
use crate::export::save_xlsx;
use crate::parser::read_active_sheet;
use crate::types::{CellValue, MergeRange, SheetGrid};

pub use mutation::CellEdits;

const EMPTY: CellValue = CellValue::Empty;

/// An XLSX package opened for in-place cell edits on its active sheet.
#[derive(Debug, Clone)]
pub struct Document {
    original_bytes: Vec<u8>,
    sheet_path: String,
    grid: SheetGrid,
    edits: CellEdits,
}

impl Document {
    /// Parse `data` and keep it for the save roundtrip.
    pub fn open(data: Vec<u8>) -> Result<Self> {
        let part = read_active_sheet(&data)?;
        Ok(Self {
            original_bytes: data,
            sheet_path: part.path,
            grid: part.grid,
            edits: CellEdits::default(),
        })
    }

    /// Current value at (row, col), 0-indexed: the pending edit if any,
    /// otherwise the parsed value.
    #[must_use]
    pub fn get(&self, row: u32, col: u32) -> &CellValue {
        self.edits
            .get(row, col)
            .or_else(|| self.grid.value(row, col))
            .unwrap_or(&EMPTY)
    }

    /// Record a new value for (row, col).
    pub fn set(&mut self, row: u32, col: u32, value: impl Into<CellValue>) {
        self.edits.apply(row, col, value.into());
    }

    /// Like [`set`](Self::set), but refuses to write into a merged follower
    /// cell and reports the skipped write instead.
    #[must_use]
    pub fn set_checked(
        &mut self,
        row: u32,
        col: u32,
        value: impl Into<CellValue>,
    ) -> Option<Diagnostic> {
        if self.is_merged_follower(row, col) {
            let diagnostic = Diagnostic::merged(row, col);
            warn!(%diagnostic, "merged cell conflict");
            return Some(diagnostic);
        }
        self.set(row, col, value);
        None
    }

    /// Number of rows spanned by the sheet, edits included.
    #[must_use]
    pub fn max_row(&self) -> u32 {
        self.grid.max_row.max(self.edits.extent().0)
    }

    #[must_use]
    pub fn merge_at(&self, row: u32, col: u32) -> Option<&MergeRange> {
        self.grid.merge_at(row, col)
    }

    /// True when (row, col) lies inside a merge without being its anchor.
    /// Such cells are read-only.
    #[must_use]
    pub fn is_merged_follower(&self, row: u32, col: u32) -> bool {
        self.grid.is_merged_follower(row, col)
    }

    #[must_use]
    pub fn grid(&self) -> &SheetGrid {
        &self.grid
    }

    #[must_use]
    pub fn edits(&self) -> &CellEdits {
        &self.edits
    }

    #[must_use]
    pub fn sheet_path(&self) -> &str {
        &self.sheet_path
    }

    /// Serialize the document with all pending edits applied.
    pub fn save(&self) -> Result<Vec<u8>> {
        debug!(
            path = %self.sheet_path,
            edits = self.edits.len(),
            "saving document"
        );
        save_xlsx(&self.original_bytes, &self.sheet_path, &self.grid, &self.edits)
    }
}
