//! Pending cell edits.
//!
//! Edits are kept apart from the parsed grid so that saving only has to
//! touch the cells that actually changed.

use std::collections::BTreeMap;

use crate::types::CellValue;

/// Edits keyed by `(row, col)` (0-indexed), ordered row-major so the sheet
/// writer can splice them into the XML stream in a single pass.
#[derive(Debug, Clone, Default)]
pub struct CellEdits {
    cells: BTreeMap<(u32, u32), CellValue>,
}

impl CellEdits {
    /// Record a new value; a later edit to the same cell replaces the earlier one.
    pub fn apply(&mut self, row: u32, col: u32, value: CellValue) {
        self.cells.insert((row, col), value);
    }

    #[must_use]
    pub fn get(&self, row: u32, col: u32) -> Option<&CellValue> {
        self.cells.get(&(row, col))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Highest edited (row, col) extents as 1-based counts.
    #[must_use]
    pub fn extent(&self) -> (u32, u32) {
        self.cells.keys().fold((0, 0), |(rows, cols), &(r, c)| {
            (rows.max(r.saturating_add(1)), cols.max(c.saturating_add(1)))
        })
    }

    /// Edits grouped by row, each row's cells ordered by column.
    #[must_use]
    pub fn by_row(&self) -> BTreeMap<u32, BTreeMap<u32, CellValue>> {
        let mut rows: BTreeMap<u32, BTreeMap<u32, CellValue>> = BTreeMap::new();
        for (&(r, c), v) in &self.cells {
            rows.entry(r).or_default().insert(c, v.clone());
        }
        rows
    }
}
