//! Write-back of edited documents.
//!
//! The worksheet part is re-streamed with the edits spliced in; the rest
//! of the package is carried over entry by entry without recompression.

pub(crate) mod sheet_writer;
pub(crate) mod zip_patcher;

use std::io::{Cursor, Read};
use zip::ZipArchive;

use crate::editor::CellEdits;
use crate::error::Result;
use crate::types::SheetGrid;

/// Package bytes for `original` with `edits` applied to the part at
/// `sheet_path`. No edits means the input bytes come back as they were.
pub(crate) fn save_xlsx(
    original: &[u8],
    sheet_path: &str,
    grid: &SheetGrid,
    edits: &CellEdits,
) -> Result<Vec<u8>> {
    if edits.is_empty() {
        return Ok(original.to_vec());
    }

    let mut sheet_xml = Vec::new();
    ZipArchive::new(Cursor::new(original))?
        .by_name(sheet_path)?
        .read_to_end(&mut sheet_xml)?;

    let patched = sheet_writer::patch_sheet_xml(&sheet_xml, grid, edits)?;
    zip_patcher::replace_entry(original, sheet_path, &patched)
}
