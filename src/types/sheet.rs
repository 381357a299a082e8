use std::collections::BTreeMap;

use super::{CellValue, Dataset, Row};

/// A parsed cell: its value plus the raw `s` style index, kept so edits can
/// be written back without touching the formatting.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GridCell {
    pub value: CellValue,
    pub style: Option<u32>,
}

/// Merged cell range (0-indexed, inclusive).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeRange {
    pub start_row: u32,
    pub start_col: u32,
    pub end_row: u32,
    pub end_col: u32,
}

impl MergeRange {
    #[must_use]
    pub fn contains(&self, row: u32, col: u32) -> bool {
        (self.start_row..=self.end_row).contains(&row)
            && (self.start_col..=self.end_col).contains(&col)
    }

    /// The top-left cell is the only writable cell of a merge.
    #[must_use]
    pub fn is_anchor(&self, row: u32, col: u32) -> bool {
        row == self.start_row && col == self.start_col
    }
}

/// Sparse model of one worksheet.
#[derive(Debug, Clone, Default)]
pub struct SheetGrid {
    pub name: String,
    /// Cells keyed by (row, col), both 0-indexed; iteration is row-major.
    pub cells: BTreeMap<(u32, u32), GridCell>,
    pub merges: Vec<MergeRange>,
    /// Number of rows spanned (1-based extent of the last row seen).
    pub max_row: u32,
    /// Number of columns spanned.
    pub max_col: u32,
}

impl SheetGrid {
    #[must_use]
    pub fn value(&self, row: u32, col: u32) -> Option<&CellValue> {
        self.cells.get(&(row, col)).map(|c| &c.value)
    }

    #[must_use]
    pub fn merge_at(&self, row: u32, col: u32) -> Option<&MergeRange> {
        self.merges.iter().find(|m| m.contains(row, col))
    }

    /// Inside a merge but not its anchor: such cells hold no value of their own.
    #[must_use]
    pub fn is_merged_follower(&self, row: u32, col: u32) -> bool {
        self.merge_at(row, col)
            .is_some_and(|m| !m.is_anchor(row, col))
    }

    /// Last row (exclusive, 0-indexed) that holds a non-empty value.
    #[must_use]
    pub fn last_value_row(&self) -> u32 {
        self.cells
            .iter()
            .rev()
            .find(|(_, cell)| !cell.value.is_empty())
            .map_or(0, |(&(row, _), _)| row + 1)
    }

    /// Densify rows `skip..` into a rectangular dataset. Interior rows with no
    /// cells become all-`Empty` records; trailing value-less rows are dropped.
    #[must_use]
    pub fn to_dataset(&self, skip: u32) -> Dataset {
        let end = self.last_value_row();
        if skip >= end {
            return Dataset::default();
        }

        let mut rows: Vec<Row> = (skip..end).map(|_| Row::default()).collect();
        for (&(row, col), cell) in self.cells.range((skip, 0)..(end, 0)) {
            if cell.value.is_empty() {
                continue;
            }
            let Ok(idx) = usize::try_from(row - skip) else {
                continue;
            };
            if let Some(record) = rows.get_mut(idx) {
                record.set(col as usize, cell.value.clone());
            }
        }

        Dataset::from_rows(rows)
    }
}
