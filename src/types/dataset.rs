use serde::{Deserialize, Serialize};

use super::CellValue;

const EMPTY: CellValue = CellValue::Empty;

/// One record: cell values addressed by zero-based column index.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Row {
    pub cells: Vec<CellValue>,
}

impl Row {
    #[must_use]
    pub fn new(cells: Vec<CellValue>) -> Self {
        Self { cells }
    }

    /// Value at `col`; columns past the end read as `Empty`.
    #[must_use]
    pub fn get(&self, col: usize) -> &CellValue {
        self.cells.get(col).unwrap_or(&EMPTY)
    }

    /// Overwrite `col`, growing the row with `Empty` cells when needed.
    pub fn set(&mut self, col: usize, value: CellValue) {
        if col >= self.cells.len() {
            self.cells.resize(col + 1, CellValue::Empty);
        }
        if let Some(slot) = self.cells.get_mut(col) {
            *slot = value;
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// Ordered sequence of records. Order is meaningful: the first occurrence
/// of an identifier wins deduplication and chunk boundaries follow it.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Dataset {
    pub rows: Vec<Row>,
    /// Column count shared by every record.
    pub width: usize,
}

impl Dataset {
    /// Build a rectangular dataset, padding every record to the widest one.
    #[must_use]
    pub fn from_rows(mut rows: Vec<Row>) -> Self {
        let width = rows.iter().map(Row::len).max().unwrap_or(0);
        for row in &mut rows {
            row.cells.resize(width, CellValue::Empty);
        }
        Self { rows, width }
    }

    /// Restore the shared width after rows were grown in place.
    pub fn square_up(&mut self) {
        self.width = self.rows.iter().map(Row::len).max().unwrap_or(0).max(self.width);
        for row in &mut self.rows {
            row.cells.resize(self.width, CellValue::Empty);
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
