//! Chunker: fixed-size, order-preserving partitions of a dataset.

use crate::error::{ParcelError, Result};
use crate::types::{Dataset, Row};

/// A contiguous view over `rows[offset..offset + rows.len()]` of a dataset.
#[derive(Debug, Clone, Copy)]
pub struct Partition<'a> {
    /// Zero-based index of the first record in the source dataset (`i * K`).
    pub offset: usize,
    pub rows: &'a [Row],
}

impl Partition<'_> {
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Split `dataset` into `ceil(N / size)` partitions; every partition but the
/// last holds exactly `size` records.
pub fn chunk(dataset: &Dataset, size: usize) -> Result<Vec<Partition<'_>>> {
    if size == 0 {
        return Err(ParcelError::InvalidChunkSize(size));
    }

    Ok(dataset
        .rows
        .chunks(size)
        .enumerate()
        .map(|(i, rows)| Partition {
            offset: i * size,
            rows,
        })
        .collect())
}
