//! Common test utilities and read-back helpers.
//!
//! Helpers for inspecting the workbooks and archives the pipelines produce:
//! raw ZIP entries, worksheet XML, and parsed cell values.
#![allow(
    dead_code,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::panic
)]

use std::io::{Cursor, Read};

use parcelsheet::cell_ref::parse_cell_ref;
use parcelsheet::{CellValue, Document};

// Re-export fixtures for convenience
pub use super::fixtures::*;

// ============================================================================
// ZIP Helpers
// ============================================================================

/// Entry names in archive order.
#[must_use]
pub fn zip_entries_in_order(data: &[u8]) -> Vec<String> {
    let mut archive = zip::ZipArchive::new(Cursor::new(data)).expect("Failed to open ZIP archive");
    (0..archive.len())
        .map(|i| archive.by_index(i).unwrap().name().to_string())
        .collect()
}

/// Decompressed content of one entry.
#[must_use]
pub fn zip_entry(data: &[u8], name: &str) -> Vec<u8> {
    let mut archive = zip::ZipArchive::new(Cursor::new(data)).expect("Failed to open ZIP archive");
    let mut file = archive
        .by_name(name)
        .unwrap_or_else(|_| panic!("missing entry {name}"));
    let mut out = Vec::new();
    file.read_to_end(&mut out).unwrap();
    out
}

/// Raw (still compressed) bytes and CRC of one entry.
#[must_use]
pub fn zip_entry_raw(data: &[u8], name: &str) -> (u32, u64) {
    let mut archive = zip::ZipArchive::new(Cursor::new(data)).expect("Failed to open ZIP archive");
    let file = archive.by_name(name).unwrap();
    (file.crc32(), file.compressed_size())
}

/// XML of the first worksheet.
#[must_use]
pub fn sheet_xml(data: &[u8]) -> String {
    String::from_utf8(zip_entry(data, "xl/worksheets/sheet1.xml")).unwrap()
}

// ============================================================================
// Cell Helpers
// ============================================================================

#[must_use]
pub fn open(data: &[u8]) -> Document {
    Document::open(data.to_vec()).expect("Failed to open document")
}

/// Value of an A1-style cell in the active sheet.
#[must_use]
pub fn cell(doc: &Document, cell_ref: &str) -> CellValue {
    let (col, row) = parse_cell_ref(cell_ref).unwrap();
    doc.get(row, col).clone()
}

/// Style index of an A1-style cell in the active sheet.
#[must_use]
pub fn cell_style(doc: &Document, cell_ref: &str) -> Option<u32> {
    let (col, row) = parse_cell_ref(cell_ref).unwrap();
    doc.grid().cells.get(&(row, col)).and_then(|c| c.style)
}

pub fn assert_text(doc: &Document, cell_ref: &str, expected: &str) {
    assert_eq!(
        cell(doc, cell_ref),
        CellValue::Text(expected.to_string()),
        "cell {cell_ref}"
    );
}

pub fn assert_number(doc: &Document, cell_ref: &str, expected: f64) {
    match cell(doc, cell_ref) {
        CellValue::Number(n) => assert!((n - expected).abs() < 1e-9, "cell {cell_ref}: {n}"),
        other => panic!("cell {cell_ref}: expected number {expected}, got {other:?}"),
    }
}

pub fn assert_empty(doc: &Document, cell_ref: &str) {
    assert!(cell(doc, cell_ref).is_empty(), "cell {cell_ref} should be empty");
}
