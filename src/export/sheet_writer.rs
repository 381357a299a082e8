//! Splices cell edits into existing worksheet XML.
//!
//! The original XML is streamed through unchanged except for the cells
//! being edited: an edited cell keeps its `s` style attribute and loses
//! its old value and formula, missing cells and rows are inserted in
//! document order, and `<dimension>` is widened to cover the edits.
//! Edited text uses inline strings (`t="inlineStr"`) instead of shared
//! string references, avoiding the need to rebuild the shared string table.

use quick_xml::events::{BytesStart, Event};
use quick_xml::{Reader, Writer};
use std::collections::BTreeMap;

use crate::cell_ref::{col_to_letter, format_cell_ref, parse_cell_ref_bytes};
use crate::editor::CellEdits;
use crate::error::Result;
use crate::types::{CellValue, SheetGrid};
use crate::xml_helpers::{name_prefix, xml_escape};

type RowEdits = BTreeMap<u32, CellValue>;

/// Return `xml` with every edit in `edits` applied.
pub(crate) fn patch_sheet_xml(xml: &[u8], grid: &SheetGrid, edits: &CellEdits) -> Result<Vec<u8>> {
    let mut reader = Reader::from_reader(xml);
    reader.trim_text(false);
    let mut writer = Writer::new(Vec::with_capacity(xml.len() + edits.len() * 64));

    let mut pending = edits.by_row();
    let mut row_edits = RowEdits::new();
    let mut prefix = String::new();
    let mut in_sheet_data = false;
    let mut current_row: u32 = 0;
    let mut next_row: u32 = 0;
    let mut next_col: u32 = 0;

    let (edit_rows, edit_cols) = edits.extent();
    let extent = (grid.max_row.max(edit_rows), grid.max_col.max(edit_cols));

    let mut buf = Vec::new();
    let mut skip_buf = Vec::new();

    loop {
        let event = reader.read_event_into(&mut buf)?;
        match event {
            Event::Eof => break,

            Event::Start(ref e) if e.local_name().as_ref() == b"sheetData" => {
                prefix = name_prefix(e);
                in_sheet_data = true;
                writer.write_event(&event)?;
            }
            Event::Empty(ref e) if e.local_name().as_ref() == b"sheetData" => {
                prefix = name_prefix(e);
                let out = writer.get_mut();
                push_str(out, &format!("<{prefix}sheetData>"));
                flush_rows(out, &prefix, &mut pending, None);
                push_str(out, &format!("</{prefix}sheetData>"));
            }
            Event::End(ref e) if in_sheet_data && e.local_name().as_ref() == b"sheetData" => {
                flush_rows(writer.get_mut(), &prefix, &mut pending, None);
                in_sheet_data = false;
                writer.write_event(&event)?;
            }

            Event::Start(ref e) if in_sheet_data && e.local_name().as_ref() == b"row" => {
                current_row = row_number(e).unwrap_or(next_row);
                next_row = current_row.saturating_add(1);
                next_col = 0;
                flush_rows(writer.get_mut(), &prefix, &mut pending, Some(current_row));
                row_edits = pending.remove(&current_row).unwrap_or_default();
                writer.write_event(&event)?;
            }
            Event::Empty(ref e) if in_sheet_data && e.local_name().as_ref() == b"row" => {
                let row = row_number(e).unwrap_or(next_row);
                next_row = row.saturating_add(1);
                flush_rows(writer.get_mut(), &prefix, &mut pending, Some(row));
                match pending.remove(&row) {
                    Some(mut cells) => {
                        // <row/> has no children yet; reopen it to hold the new cells
                        writer.write_event(Event::Start(e.clone()))?;
                        flush_cells(writer.get_mut(), &prefix, row, &mut cells, None);
                        writer.write_event(Event::End(e.to_end()))?;
                    }
                    None => writer.write_event(&event)?,
                }
            }
            Event::End(ref e) if in_sheet_data && e.local_name().as_ref() == b"row" => {
                flush_cells(writer.get_mut(), &prefix, current_row, &mut row_edits, None);
                writer.write_event(&event)?;
            }

            Event::Start(ref e) | Event::Empty(ref e)
                if in_sheet_data && e.local_name().as_ref() == b"c" =>
            {
                let (col, style) = cell_attrs(e, next_col);
                next_col = col.saturating_add(1);
                flush_cells(writer.get_mut(), &prefix, current_row, &mut row_edits, Some(col));

                match row_edits.remove(&col) {
                    Some(value) => {
                        write_cell(writer.get_mut(), &prefix, current_row, col, style, &value);
                        if matches!(event, Event::Start(_)) {
                            // drop the old <v>/<f>/<is> children
                            let end = e.to_end().into_owned();
                            skip_buf.clear();
                            reader.read_to_end_into(end.name(), &mut skip_buf)?;
                        }
                    }
                    None => writer.write_event(&event)?,
                }
            }

            Event::Empty(ref e) if e.local_name().as_ref() == b"dimension" && extent.0 > 0 => {
                let p = name_prefix(e);
                let end = format!(
                    "{}{}",
                    col_to_letter(extent.1.saturating_sub(1)),
                    extent.0
                );
                push_str(writer.get_mut(), &format!("<{p}dimension ref=\"A1:{end}\"/>"));
            }

            _ => writer.write_event(&event)?,
        }
        buf.clear();
    }

    Ok(writer.into_inner())
}

fn push_str(out: &mut Vec<u8>, s: &str) {
    out.extend_from_slice(s.as_bytes());
}

/// 0-indexed row from `<row r="N">`.
fn row_number(e: &BytesStart) -> Option<u32> {
    e.attributes()
        .flatten()
        .find(|a| a.key.as_ref() == b"r")
        .and_then(|a| std::str::from_utf8(&a.value).ok()?.trim().parse::<u32>().ok())
        .and_then(|r| r.checked_sub(1))
}

/// Column (0-indexed) and style index of a `<c>` element.
fn cell_attrs(e: &BytesStart, implicit_col: u32) -> (u32, Option<u32>) {
    let mut col = implicit_col;
    let mut style = None;
    for attr in e.attributes().flatten() {
        match attr.key.as_ref() {
            b"r" => {
                if let Some((c, _)) = parse_cell_ref_bytes(&attr.value) {
                    col = c;
                }
            }
            b"s" => {
                style = std::str::from_utf8(&attr.value)
                    .ok()
                    .and_then(|s| s.parse().ok());
            }
            _ => {}
        }
    }
    (col, style)
}

/// Write whole new rows for every pending row before `before` (all of them
/// when `None`).
fn flush_rows(
    out: &mut Vec<u8>,
    prefix: &str,
    pending: &mut BTreeMap<u32, RowEdits>,
    before: Option<u32>,
) {
    let rest = match before {
        Some(row) => pending.split_off(&row),
        None => BTreeMap::new(),
    };
    let flushed = std::mem::replace(pending, rest);

    for (row, mut cells) in flushed {
        if cells.values().all(CellValue::is_empty) {
            continue;
        }
        push_str(out, &format!("<{prefix}row r=\"{}\">", u64::from(row) + 1));
        flush_cells(out, prefix, row, &mut cells, None);
        push_str(out, &format!("</{prefix}row>"));
    }
}

/// Write new cells for every pending column before `before` (all of them
/// when `None`).
fn flush_cells(
    out: &mut Vec<u8>,
    prefix: &str,
    row: u32,
    cells: &mut RowEdits,
    before: Option<u32>,
) {
    let rest = match before {
        Some(col) => cells.split_off(&col),
        None => RowEdits::new(),
    };
    let flushed = std::mem::replace(cells, rest);

    for (col, value) in flushed {
        write_cell(out, prefix, row, col, None, &value);
    }
}

/// Write a single `<c>` element. Empty values keep only the style; an
/// unstyled empty cell is omitted entirely.
fn write_cell(
    out: &mut Vec<u8>,
    prefix: &str,
    row: u32,
    col: u32,
    style: Option<u32>,
    value: &CellValue,
) {
    let cell_ref = format_cell_ref(row, col);
    let style_attr = style.map(|s| format!(" s=\"{s}\"")).unwrap_or_default();

    match value {
        CellValue::Empty => {
            if style.is_some() {
                push_str(out, &format!("<{prefix}c r=\"{cell_ref}\"{style_attr}/>"));
            }
        }
        CellValue::Number(n) => {
            push_str(
                out,
                &format!("<{prefix}c r=\"{cell_ref}\"{style_attr}><{prefix}v>{n}</{prefix}v></{prefix}c>"),
            );
        }
        CellValue::Text(s) => {
            push_str(
                out,
                &format!(
                    "<{prefix}c r=\"{cell_ref}\"{style_attr} t=\"inlineStr\"><{prefix}is><{prefix}t xml:space=\"preserve\">{}</{prefix}t></{prefix}is></{prefix}c>",
                    xml_escape(s)
                ),
            );
        }
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::panic
)]
mod tests {
    use super::*;

    fn patch(xml: &str, edits: &[(u32, u32, CellValue)]) -> String {
        let mut e = CellEdits::default();
        for (r, c, v) in edits {
            e.apply(*r, *c, v.clone());
        }
        let out = patch_sheet_xml(xml.as_bytes(), &SheetGrid::default(), &e).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_replaces_value_and_keeps_style() {
        let out = patch(
            r#"<worksheet><sheetData><row r="2"><c r="E2" s="7" t="s"><v>3</v></c></row></sheetData></worksheet>"#,
            &[(1, 4, "12345678901234".into())],
        );
        assert!(out.contains(r#"<c r="E2" s="7" t="inlineStr"><is><t xml:space="preserve">12345678901234</t></is></c>"#));
        assert!(!out.contains("<v>3</v>"));
    }

    #[test]
    fn test_inserts_cells_in_column_order() {
        let out = patch(
            r#"<worksheet><sheetData><row r="1"><c r="B1"><v>2</v></c></row></sheetData></worksheet>"#,
            &[(0, 0, CellValue::Number(1.0)), (0, 3, CellValue::Number(4.0))],
        );
        let a = out.find(r#"<c r="A1"><v>1</v></c>"#).unwrap();
        let b = out.find(r#"<c r="B1"><v>2</v></c>"#).unwrap();
        let d = out.find(r#"<c r="D1"><v>4</v></c>"#).unwrap();
        assert!(a < b && b < d);
    }

    #[test]
    fn test_inserts_rows_before_between_and_after() {
        let out = patch(
            r#"<worksheet><sheetData><row r="2"><c r="A2"><v>2</v></c></row><row r="5"/></sheetData></worksheet>"#,
            &[
                (0, 0, "first".into()),
                (2, 0, "third".into()),
                (4, 1, "fifth".into()),
                (9, 0, "tenth".into()),
            ],
        );
        let order: Vec<usize> = [r#"r="1""#, r#"r="2""#, r#"r="3""#, r#"r="5""#, r#"r="10""#]
            .iter()
            .map(|needle| out.find(needle).unwrap())
            .collect();
        assert!(order.windows(2).all(|w| w[0] < w[1]), "{out}");
        assert!(out.contains(r#"<row r="5"><c r="B5" t="inlineStr">"#));
    }

    #[test]
    fn test_self_closing_sheet_data_is_expanded() {
        let out = patch(
            r#"<worksheet><dimension ref="A1"/><sheetData/></worksheet>"#,
            &[(3, 0, "x".into())],
        );
        assert!(out.contains(r#"<sheetData><row r="4"><c r="A4" t="inlineStr">"#));
        assert!(out.contains(r#"<dimension ref="A1:A4"/>"#));
    }

    #[test]
    fn test_empty_edit_keeps_style_drops_value_and_formula() {
        let out = patch(
            r#"<worksheet><sheetData><row r="4"><c r="A4" s="2"><f>1+1</f><v>2</v></c><c r="B4"><v>9</v></c></row></sheetData></worksheet>"#,
            &[(3, 0, CellValue::Empty), (3, 1, CellValue::Empty)],
        );
        assert!(out.contains(r#"<row r="4"><c r="A4" s="2"/></row>"#), "{out}");
        assert!(!out.contains("<f>"));
    }

    #[test]
    fn test_untouched_content_passes_through() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><cols><col min="1" max="1" width="20" customWidth="1"/></cols><sheetData><row r="1" ht="30" customHeight="1"><c r="A1" s="1" t="s"><v>0</v></c></row></sheetData><mergeCells count="1"><mergeCell ref="A1:C1"/></mergeCells></worksheet>"#;
        let out = patch(xml, &[(5, 0, "x".into())]);
        assert!(out.contains(r#"<cols><col min="1" max="1" width="20" customWidth="1"/></cols>"#));
        assert!(out.contains(r#"<row r="1" ht="30" customHeight="1"><c r="A1" s="1" t="s"><v>0</v></c></row>"#));
        assert!(out.contains(r#"<mergeCell ref="A1:C1"/>"#));
    }

    #[test]
    fn test_prefixed_namespace() {
        let out = patch(
            r#"<x:worksheet xmlns:x="urn:x"><x:sheetData><x:row r="1"><x:c r="A1"><x:v>1</x:v></x:c></x:row></x:sheetData></x:worksheet>"#,
            &[(0, 0, CellValue::Number(5.0))],
        );
        assert!(out.contains(r#"<x:c r="A1"><x:v>5</x:v></x:c>"#), "{out}");
    }
}
