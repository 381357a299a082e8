//! Worksheet parsing - streams one sheet XML part into a [`SheetGrid`].

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::io::{BufRead, BufReader, Read, Seek};
use zip::ZipArchive;

use crate::cell_ref::{parse_cell_range, parse_cell_ref_bytes};
use crate::error::Result;
use crate::types::{CellValue, GridCell, MergeRange, SheetGrid};

/// Sheet metadata from workbook.xml
#[derive(Debug, Clone)]
pub(super) struct SheetInfo {
    pub name: String,
    pub path: String,
}

/// Cell type tag from the `t` attribute of a `<c>` element.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(super) enum CellTypeTag {
    Shared,
    Inline,
    Str,
    Bool,
    Error,
    Date,
    Default,
}

pub(super) fn parse_cell_type_tag(value: &[u8]) -> CellTypeTag {
    match value {
        b"s" => CellTypeTag::Shared,
        b"b" => CellTypeTag::Bool,
        b"e" => CellTypeTag::Error,
        b"str" => CellTypeTag::Str,
        b"inlineStr" => CellTypeTag::Inline,
        b"d" => CellTypeTag::Date,
        _ => CellTypeTag::Default,
    }
}

pub(super) fn parse_u32_bytes(value: &[u8]) -> Option<u32> {
    let mut num: u32 = 0;
    let mut seen = false;
    for &b in value {
        if !b.is_ascii_digit() {
            return None;
        }
        seen = true;
        num = num.saturating_mul(10).saturating_add(u32::from(b - b'0'));
    }
    if seen {
        Some(num)
    } else {
        None
    }
}

/// Parse a single worksheet part from the archive.
pub(super) fn parse_sheet<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    info: &SheetInfo,
    shared_strings: &[String],
) -> Result<SheetGrid> {
    let file = archive.by_name(&info.path)?;
    let reader = BufReader::new(file);
    let mut grid = parse_sheet_xml(reader, shared_strings)?;
    grid.name = info.name.clone();
    Ok(grid)
}

/// Stream worksheet XML into a grid. Split out from [`parse_sheet`] so the
/// streaming logic can be exercised on raw XML.
pub(super) fn parse_sheet_xml<B: BufRead>(
    reader: B,
    shared_strings: &[String],
) -> Result<SheetGrid> {
    let mut xml = Reader::from_reader(reader);
    xml.trim_text(false);

    let mut grid = SheetGrid::default();
    let mut buf = Vec::new();
    let mut current_row: u32 = 0;
    let mut next_row: u32 = 0;
    let mut next_col: u32 = 0;

    loop {
        match xml.read_event_into(&mut buf)? {
            ref event @ (Event::Start(_) | Event::Empty(_)) => {
                let (Event::Start(ref e) | Event::Empty(ref e)) = event else {
                    continue;
                };
                let is_start_event = matches!(event, Event::Start(_));

                match e.local_name().as_ref() {
                    b"row" => {
                        current_row = row_index(e).unwrap_or(next_row);
                        next_row = current_row.saturating_add(1);
                        next_col = 0;
                    }
                    b"c" => {
                        let mut col = next_col;
                        let mut row = current_row;
                        let mut cell_type = CellTypeTag::Default;
                        let mut style: Option<u32> = None;

                        for attr in e.attributes().flatten() {
                            match attr.key.as_ref() {
                                b"r" => {
                                    if let Some((c, r)) = parse_cell_ref_bytes(&attr.value) {
                                        col = c;
                                        row = r;
                                    }
                                }
                                b"t" => cell_type = parse_cell_type_tag(&attr.value),
                                b"s" => style = parse_u32_bytes(&attr.value),
                                _ => {}
                            }
                        }
                        next_col = col.saturating_add(1);

                        // Self-closing cells like <c r="A1" s="2"/> carry style only
                        let raw = if is_start_event {
                            read_cell_content(&mut xml)?
                        } else {
                            None
                        };

                        let value = resolve_cell_value(raw, cell_type, shared_strings);
                        grid.max_row = grid.max_row.max(row.saturating_add(1));
                        grid.max_col = grid.max_col.max(col.saturating_add(1));
                        grid.cells.insert((row, col), GridCell { value, style });
                    }
                    b"mergeCell" => {
                        if let Some(merge) = crate::xml_helpers::attr_string(e, b"ref")
                            .as_deref()
                            .and_then(parse_merge_ref)
                        {
                            grid.merges.push(merge);
                        }
                    }
                    _ => {}
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(grid)
}

/// 0-indexed row from a `<row r="N">` attribute.
fn row_index(e: &BytesStart) -> Option<u32> {
    e.attributes()
        .flatten()
        .find(|a| a.key.as_ref() == b"r")
        .and_then(|a| parse_u32_bytes(&a.value))
        .and_then(|r| r.checked_sub(1))
}

/// Parse a merge range like "A1:B2"
fn parse_merge_ref(ref_str: &str) -> Option<MergeRange> {
    let (start_row, start_col, end_row, end_col) = parse_cell_range(ref_str)?;
    Some(MergeRange {
        start_row: start_row.min(end_row),
        start_col: start_col.min(end_col),
        end_row: start_row.max(end_row),
        end_col: start_col.max(end_col),
    })
}

/// Read the children of a `<c>` element up to its end tag and return the
/// raw value text: `<v>` for ordinary cells, the concatenated `<t>` runs of
/// `<is>` for inline strings. Formulas are skipped.
fn read_cell_content<B: BufRead>(xml: &mut Reader<B>) -> Result<Option<String>> {
    let mut value: Option<String> = None;
    let mut buf = Vec::new();
    let mut skip_buf = Vec::new();

    loop {
        match xml.read_event_into(&mut buf)? {
            Event::Start(ref inner) => match inner.local_name().as_ref() {
                b"v" | b"t" => {
                    let text = read_text(xml, inner.local_name().as_ref())?;
                    value.get_or_insert_with(String::new).push_str(&text);
                }
                b"is" | b"r" => {}
                _ => {
                    // <f>, <rPh>, <extLst>: not part of the value
                    let end = inner.to_end().into_owned();
                    skip_buf.clear();
                    xml.read_to_end_into(end.name(), &mut skip_buf)?;
                }
            },
            Event::End(ref inner) if inner.local_name().as_ref() == b"c" => break,
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(value)
}

/// Collect text (and CDATA) until the end tag with the given local name.
fn read_text<B: BufRead>(xml: &mut Reader<B>, local: &[u8]) -> Result<String> {
    let mut out = String::new();
    let mut buf = Vec::new();
    loop {
        match xml.read_event_into(&mut buf)? {
            Event::Text(ref t) => out.push_str(&t.unescape()?),
            Event::CData(ref t) => out.push_str(&String::from_utf8_lossy(t)),
            Event::End(ref e) if e.local_name().as_ref() == local => break,
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    Ok(out)
}

/// Map raw cell text plus its type tag onto a [`CellValue`].
///
/// Numeric-looking default cells become numbers; everything textual stays
/// text verbatim. Empty text reads as `Empty`.
pub(super) fn resolve_cell_value(
    raw: Option<String>,
    tag: CellTypeTag,
    shared_strings: &[String],
) -> CellValue {
    let Some(raw) = raw else {
        return CellValue::Empty;
    };

    let value = match tag {
        CellTypeTag::Shared => {
            match parse_u32_bytes(raw.trim().as_bytes())
                .and_then(|idx| shared_strings.get(idx as usize))
            {
                Some(s) => CellValue::Text(s.clone()),
                None => CellValue::Empty,
            }
        }
        CellTypeTag::Bool => match raw.trim() {
            "1" | "true" | "TRUE" => CellValue::Number(1.0),
            _ => CellValue::Number(0.0),
        },
        CellTypeTag::Inline | CellTypeTag::Str | CellTypeTag::Error | CellTypeTag::Date => {
            CellValue::Text(raw)
        }
        CellTypeTag::Default => match raw.trim().parse::<f64>() {
            Ok(n) if n.is_finite() => CellValue::Number(n),
            _ => CellValue::Text(raw),
        },
    };

    match value {
        CellValue::Text(ref s) if s.is_empty() => CellValue::Empty,
        other => other,
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp
)]
mod tests {
    use super::*;

    fn parse(xml: &str, sst: &[&str]) -> SheetGrid {
        let sst: Vec<String> = sst.iter().map(|s| (*s).to_string()).collect();
        parse_sheet_xml(xml.as_bytes(), &sst).unwrap()
    }

    #[test]
    fn test_value_types() {
        let grid = parse(
            r#"<worksheet><sheetData>
                <row r="1">
                  <c r="A1" t="s"><v>0</v></c>
                  <c r="B1"><v>12345</v></c>
                  <c r="C1" t="inlineStr"><is><t xml:space="preserve"> ab1 </t></is></c>
                  <c r="D1" s="4"/>
                  <c r="E1" t="b"><v>1</v></c>
                  <c r="F1"><f>SUM(B1)</f><v>12345</v></c>
                </row>
            </sheetData></worksheet>"#,
            &["Header"],
        );
        assert_eq!(grid.value(0, 0), Some(&CellValue::from("Header")));
        assert_eq!(grid.value(0, 1), Some(&CellValue::Number(12345.0)));
        assert_eq!(grid.value(0, 2), Some(&CellValue::from(" ab1 ")));
        assert_eq!(grid.value(0, 3), Some(&CellValue::Empty));
        assert_eq!(grid.cells[&(0, 3)].style, Some(4));
        assert_eq!(grid.value(0, 4), Some(&CellValue::Number(1.0)));
        assert_eq!(grid.value(0, 5), Some(&CellValue::Number(12345.0)));
        assert_eq!(grid.max_row, 1);
        assert_eq!(grid.max_col, 6);
    }

    #[test]
    fn test_implicit_positions() {
        let grid = parse(
            r#"<worksheet><sheetData>
                <row><c><v>1</v></c><c><v>2</v></c></row>
                <row><c t="inlineStr"><is><t>x</t></is></c></row>
            </sheetData></worksheet>"#,
            &[],
        );
        assert_eq!(grid.value(0, 1), Some(&CellValue::Number(2.0)));
        assert_eq!(grid.value(1, 0), Some(&CellValue::from("x")));
    }

    #[test]
    fn test_rich_inline_string_runs_concatenate() {
        let grid = parse(
            r#"<worksheet><sheetData><row r="2"><c r="A2" t="inlineStr"><is><r><t>AB</t></r><r><t>123</t></r></is></c></row></sheetData></worksheet>"#,
            &[],
        );
        assert_eq!(grid.value(1, 0), Some(&CellValue::from("AB123")));
    }

    #[test]
    fn test_merges() {
        let grid = parse(
            r#"<worksheet><sheetData/><mergeCells count="1"><mergeCell ref="E2:F3"/></mergeCells></worksheet>"#,
            &[],
        );
        assert_eq!(grid.merges.len(), 1);
        assert!(grid.is_merged_follower(1, 5));
        assert!(!grid.is_merged_follower(1, 4));
    }

    #[test]
    fn test_non_numeric_default_cell_stays_text() {
        assert_eq!(
            resolve_cell_value(Some("12a".into()), CellTypeTag::Default, &[]),
            CellValue::from("12a")
        );
        assert_eq!(
            resolve_cell_value(Some("7".into()), CellTypeTag::Shared, &[]),
            CellValue::Empty
        );
    }

    #[test]
    fn test_malformed_xml_is_an_error() {
        let sst: Vec<String> = Vec::new();
        assert!(parse_sheet_xml(&b"<worksheet><sheetData><row></c>"[..], &sst).is_err());
    }
}
