//! XLSX package reader
//!
//! Opens the ZIP container, resolves the active worksheet through the
//! workbook relationships, and parses it into a [`SheetGrid`].

mod relationships;
mod worksheet;

use std::io::Cursor;
use tracing::debug;
use zip::ZipArchive;

use crate::error::{ParcelError, Result};
use crate::types::SheetGrid;

use relationships::{get_sheet_info, parse_shared_strings, parse_workbook_relationships};
use worksheet::parse_sheet;

/// The active worksheet of a package together with its ZIP part name,
/// which the export side needs to write edits back.
#[derive(Debug, Clone)]
pub struct SheetPart {
    pub path: String,
    pub grid: SheetGrid,
}

/// Parse the active worksheet of an XLSX file.
///
/// Any failure to read the container or its parts is reported as
/// [`ParcelError::UnreadableDocument`].
pub fn read_active_sheet(data: &[u8]) -> Result<SheetPart> {
    read_active_sheet_inner(data).map_err(|e| match e {
        ParcelError::UnreadableDocument(_) => e,
        other => ParcelError::UnreadableDocument(other.to_string()),
    })
}

fn read_active_sheet_inner(data: &[u8]) -> Result<SheetPart> {
    let cursor = Cursor::new(data);
    let mut archive = ZipArchive::new(cursor)?;

    let relationships = parse_workbook_relationships(&mut archive);
    let shared_strings =
        parse_shared_strings(&mut archive, relationships.shared_strings.as_deref())?;
    let (sheets, active) = get_sheet_info(&mut archive, &relationships.worksheets)?;

    let info = sheets
        .get(active)
        .ok_or_else(|| ParcelError::UnreadableDocument("active sheet out of range".into()))?;

    let grid = parse_sheet(&mut archive, info, &shared_strings)?;
    debug!(
        sheet = %info.name,
        path = %info.path,
        cells = grid.cells.len(),
        rows = grid.max_row,
        merges = grid.merges.len(),
        "parsed active sheet"
    );

    Ok(SheetPart {
        path: info.path.clone(),
        grid,
    })
}
