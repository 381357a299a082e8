//! Test fixtures for generating valid XLSX files in memory.
//!
//! Builders for manifest, lookup and template workbooks with known
//! contents, styles and merges.
//!
//! # Example
//!
//! ```rust
//! use fixtures::{SheetBuilder, XlsxBuilder};
//!
//! let xlsx = XlsxBuilder::new()
//!     .sheet(
//!         SheetBuilder::new("Sheet1")
//!             .row(1, &["id".into(), "name".into()])
//!             .cell("E2", "AB1234567", Some(2)),
//!     )
//!     .build();
//! ```
#![allow(
    dead_code,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::panic,
    clippy::cast_possible_truncation
)]

use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use zip::write::FileOptions;
use zip::ZipWriter;

/// Number of cell formats (`cellXfs`) in the generated styles part.
/// Style indices `0..STYLE_COUNT` are valid for [`SheetBuilder::cell`].
pub const STYLE_COUNT: u32 = 4;

/// Header style: bold with a solid fill.
pub const HEADER_STYLE: u32 = 1;
/// Bordered data cell.
pub const BORDER_STYLE: u32 = 2;
/// Text-formatted (`@`) data cell.
pub const TEXT_STYLE: u32 = 3;

// ============================================================================
// Cell Value
// ============================================================================

/// A cell value as written into the fixture XML.
#[derive(Debug, Clone)]
pub enum Value {
    /// Shared string.
    String(String),
    Number(f64),
    Boolean(bool),
    /// Inline string (not shared).
    InlineString(String),
    /// Style-only cell.
    Empty,
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(f64::from(n))
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

// ============================================================================
// Sheet Builder
// ============================================================================

#[derive(Debug, Clone)]
pub struct CellEntry {
    pub cell_ref: String,
    pub value: Value,
    pub style: Option<u32>,
}

#[derive(Debug, Clone)]
pub struct ColumnWidth {
    pub min: u32,
    pub max: u32,
    pub width: f64,
}

/// Builder for a single worksheet.
#[derive(Debug, Clone, Default)]
pub struct SheetBuilder {
    pub name: String,
    pub cells: Vec<CellEntry>,
    pub merges: Vec<String>,
    pub col_widths: Vec<ColumnWidth>,
    pub row_heights: Vec<(u32, f64)>,
}

impl SheetBuilder {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    /// Add a cell with a value and optional style index.
    #[must_use]
    pub fn cell<V: Into<Value>>(mut self, cell_ref: &str, value: V, style: Option<u32>) -> Self {
        self.cells.push(CellEntry {
            cell_ref: cell_ref.to_string(),
            value: value.into(),
            style,
        });
        self
    }

    /// Add a whole row (1-indexed) starting at column A. `Value::Empty`
    /// entries are skipped so the row stays sparse.
    #[must_use]
    pub fn row(mut self, row: u32, values: &[Value]) -> Self {
        for (col, value) in values.iter().enumerate() {
            if matches!(value, Value::Empty) {
                continue;
            }
            self.cells.push(CellEntry {
                cell_ref: format!("{}{row}", col_letter(col as u32)),
                value: value.clone(),
                style: None,
            });
        }
        self
    }

    /// Add a merge range (e.g., "A1:B2").
    #[must_use]
    pub fn merge(mut self, range: &str) -> Self {
        self.merges.push(range.to_string());
        self
    }

    /// Set column width for a range of columns (1-indexed, inclusive).
    #[must_use]
    pub fn col_width(mut self, min: u32, max: u32, width: f64) -> Self {
        self.col_widths.push(ColumnWidth { min, max, width });
        self
    }

    #[must_use]
    pub fn row_height(mut self, row: u32, height: f64) -> Self {
        self.row_heights.push((row, height));
        self
    }
}

// ============================================================================
// XLSX Builder
// ============================================================================

/// Builder for complete XLSX packages.
#[derive(Debug, Default)]
pub struct XlsxBuilder {
    sheets: Vec<SheetBuilder>,
    active_tab: Option<usize>,
}

impl XlsxBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn sheet(mut self, sheet: SheetBuilder) -> Self {
        self.sheets.push(sheet);
        self
    }

    /// Mark a sheet as active via `<workbookView activeTab>`.
    #[must_use]
    pub fn active_tab(mut self, index: usize) -> Self {
        self.active_tab = Some(index);
        self
    }

    #[must_use]
    pub fn build(self) -> Vec<u8> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options = FileOptions::default().compression_method(zip::CompressionMethod::Deflated);

        let mut shared_strings: Vec<String> = Vec::new();
        for sheet in &self.sheets {
            for cell in &sheet.cells {
                if let Value::String(ref s) = cell.value {
                    if !shared_strings.contains(s) {
                        shared_strings.push(s.clone());
                    }
                }
            }
        }

        let mut put = |name: &str, content: &str| {
            zip.start_file(name, options).unwrap();
            zip.write_all(content.as_bytes()).unwrap();
        };

        put("[Content_Types].xml", &generate_content_types(self.sheets.len()));
        put("_rels/.rels", &generate_rels());
        put(
            "xl/_rels/workbook.xml.rels",
            &generate_workbook_rels(self.sheets.len()),
        );
        put(
            "xl/workbook.xml",
            &generate_workbook(&self.sheets, self.active_tab),
        );
        put("xl/styles.xml", &generate_styles());
        if !shared_strings.is_empty() {
            put("xl/sharedStrings.xml", &generate_shared_strings(&shared_strings));
        }
        for (i, sheet) in self.sheets.iter().enumerate() {
            put(
                &format!("xl/worksheets/sheet{}.xml", i + 1),
                &generate_sheet_xml(sheet, &shared_strings),
            );
        }

        zip.finish().expect("Failed to finish ZIP").into_inner()
    }
}

// ============================================================================
// XML Generation
// ============================================================================

fn generate_content_types(sheet_count: usize) -> String {
    let mut xml = String::new();
    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    xml.push_str(r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#);
    xml.push_str(r#"<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>"#);
    xml.push_str(r#"<Default Extension="xml" ContentType="application/xml"/>"#);
    xml.push_str(r#"<Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>"#);
    xml.push_str(r#"<Override PartName="/xl/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml"/>"#);
    xml.push_str(r#"<Override PartName="/xl/sharedStrings.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sharedStrings+xml"/>"#);
    for i in 1..=sheet_count {
        xml.push_str(&format!(
            r#"<Override PartName="/xl/worksheets/sheet{i}.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>"#
        ));
    }
    xml.push_str("</Types>");
    xml
}

fn generate_rels() -> String {
    let mut xml = String::new();
    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    xml.push_str(
        r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    );
    xml.push_str(r#"<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/>"#);
    xml.push_str("</Relationships>");
    xml
}

fn generate_workbook_rels(sheet_count: usize) -> String {
    let mut xml = String::new();
    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    xml.push_str(
        r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    );
    for i in 1..=sheet_count {
        xml.push_str(&format!(
            r#"<Relationship Id="rId{i}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet{i}.xml"/>"#
        ));
    }
    let rid = sheet_count + 1;
    xml.push_str(&format!(
        r#"<Relationship Id="rId{rid}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>"#
    ));
    xml.push_str(&format!(
        r#"<Relationship Id="rId{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/sharedStrings" Target="sharedStrings.xml"/>"#,
        rid + 1
    ));
    xml.push_str("</Relationships>");
    xml
}

fn generate_workbook(sheets: &[SheetBuilder], active_tab: Option<usize>) -> String {
    let mut xml = String::new();
    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    xml.push_str(r#"<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">"#);
    if let Some(tab) = active_tab {
        xml.push_str(&format!(
            r#"<bookViews><workbookView activeTab="{tab}"/></bookViews>"#
        ));
    }
    xml.push_str("<sheets>");
    for (i, sheet) in sheets.iter().enumerate() {
        xml.push_str(&format!(
            r#"<sheet name="{}" sheetId="{}" r:id="rId{}"/>"#,
            escape_xml(&sheet.name),
            i + 1,
            i + 1
        ));
    }
    xml.push_str("</sheets></workbook>");
    xml
}

/// Fixed styles part with [`STYLE_COUNT`] cell formats.
fn generate_styles() -> String {
    let mut xml = String::new();
    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    xml.push_str(r#"<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">"#);
    xml.push_str(r#"<fonts count="2"><font><sz val="11"/><name val="Calibri"/></font><font><b/><sz val="11"/><name val="Calibri"/></font></fonts>"#);
    xml.push_str(r#"<fills count="3"><fill><patternFill patternType="none"/></fill><fill><patternFill patternType="gray125"/></fill><fill><patternFill patternType="solid"><fgColor rgb="FFFFFF00"/></patternFill></fill></fills>"#);
    xml.push_str(r#"<borders count="2"><border/><border><left style="thin"/><right style="thin"/><top style="thin"/><bottom style="thin"/></border></borders>"#);
    xml.push_str(r#"<cellStyleXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0"/></cellStyleXfs>"#);
    xml.push_str(&format!(r#"<cellXfs count="{STYLE_COUNT}">"#));
    xml.push_str(r#"<xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"/>"#);
    xml.push_str(r#"<xf numFmtId="0" fontId="1" fillId="2" borderId="0" xfId="0" applyFont="1" applyFill="1"/>"#);
    xml.push_str(r#"<xf numFmtId="0" fontId="0" fillId="0" borderId="1" xfId="0" applyBorder="1"/>"#);
    xml.push_str(r#"<xf numFmtId="49" fontId="0" fillId="0" borderId="1" xfId="0" applyNumberFormat="1" applyBorder="1"/>"#);
    xml.push_str("</cellXfs></styleSheet>");
    xml
}

fn generate_shared_strings(strings: &[String]) -> String {
    let mut xml = String::new();
    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    xml.push_str(&format!(
        r#"<sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" count="{}" uniqueCount="{}">"#,
        strings.len(),
        strings.len()
    ));
    for s in strings {
        xml.push_str(&format!(
            r#"<si><t xml:space="preserve">{}</t></si>"#,
            escape_xml(s)
        ));
    }
    xml.push_str("</sst>");
    xml
}

fn generate_sheet_xml(sheet: &SheetBuilder, shared_strings: &[String]) -> String {
    let mut xml = String::new();
    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    xml.push_str(
        r#"<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">"#,
    );

    let mut rows: std::collections::BTreeMap<u32, Vec<(u32, &CellEntry)>> =
        std::collections::BTreeMap::new();
    for cell in &sheet.cells {
        let (col, row) = parse_cell_ref(&cell.cell_ref);
        rows.entry(row).or_default().push((col, cell));
    }
    for cells in rows.values_mut() {
        cells.sort_by_key(|(col, _)| *col);
    }

    if let (Some(last_row), Some(last_col)) = (
        rows.keys().next_back(),
        rows.values().flatten().map(|(c, _)| *c).max(),
    ) {
        xml.push_str(&format!(
            r#"<dimension ref="A1:{}{last_row}"/>"#,
            col_letter(last_col - 1)
        ));
    }

    if !sheet.col_widths.is_empty() {
        xml.push_str("<cols>");
        for col in &sheet.col_widths {
            xml.push_str(&format!(
                r#"<col min="{}" max="{}" width="{}" customWidth="1"/>"#,
                col.min, col.max, col.width
            ));
        }
        xml.push_str("</cols>");
    }

    xml.push_str("<sheetData>");
    let heights: std::collections::HashMap<u32, f64> = sheet.row_heights.iter().copied().collect();

    for (row_num, cells) in rows {
        let mut row_attrs = format!(r#"r="{row_num}""#);
        if let Some(ht) = heights.get(&row_num) {
            row_attrs.push_str(&format!(r#" ht="{ht}" customHeight="1""#));
        }
        xml.push_str(&format!("<row {row_attrs}>"));

        for (_, cell) in cells {
            let mut attrs = format!(r#"r="{}""#, cell.cell_ref);
            if let Some(s) = cell.style {
                attrs.push_str(&format!(r#" s="{s}""#));
            }
            match &cell.value {
                Value::String(s) => {
                    let idx = shared_strings.iter().position(|x| x == s).unwrap_or(0);
                    xml.push_str(&format!(r#"<c {attrs} t="s"><v>{idx}</v></c>"#));
                }
                Value::Number(n) => {
                    xml.push_str(&format!(r#"<c {attrs}><v>{n}</v></c>"#));
                }
                Value::Boolean(b) => {
                    xml.push_str(&format!(r#"<c {attrs} t="b"><v>{}</v></c>"#, u8::from(*b)));
                }
                Value::InlineString(s) => {
                    xml.push_str(&format!(
                        r#"<c {attrs} t="inlineStr"><is><t>{}</t></is></c>"#,
                        escape_xml(s)
                    ));
                }
                Value::Empty => {
                    xml.push_str(&format!(r#"<c {attrs}/>"#));
                }
            }
        }
        xml.push_str("</row>");
    }
    xml.push_str("</sheetData>");

    if !sheet.merges.is_empty() {
        xml.push_str(&format!(r#"<mergeCells count="{}">"#, sheet.merges.len()));
        for merge in &sheet.merges {
            xml.push_str(&format!(r#"<mergeCell ref="{merge}"/>"#));
        }
        xml.push_str("</mergeCells>");
    }

    xml.push_str("</worksheet>");
    xml
}

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// 0-indexed column to letters.
pub fn col_letter(col: u32) -> String {
    let mut result = String::new();
    let mut n = col + 1;
    while n > 0 {
        n -= 1;
        result.insert(0, (b'A' + (n % 26) as u8) as char);
        n /= 26;
    }
    result
}

/// Parse a cell reference like "A1" into (col, row), both 1-indexed.
fn parse_cell_ref(cell_ref: &str) -> (u32, u32) {
    let mut col: u32 = 0;
    let mut row: u32 = 0;
    for c in cell_ref.chars() {
        if c.is_ascii_alphabetic() {
            col = col * 26 + (c.to_ascii_uppercase() as u32 - 'A' as u32 + 1);
        } else if let Some(d) = c.to_digit(10) {
            row = row * 10 + d;
        }
    }
    (col, row)
}

// ============================================================================
// Convenience Fixtures
// ============================================================================

/// One manifest record for [`manifest_xlsx`]: identifier, passport,
/// birthdate and code. Other columns get filler text.
#[derive(Debug, Clone)]
pub struct Record {
    pub id: Value,
    pub passport: Value,
    pub birthdate: Value,
    pub code: Value,
}

impl Record {
    pub fn new(
        id: impl Into<Value>,
        passport: impl Into<Value>,
        birthdate: impl Into<Value>,
        code: impl Into<Value>,
    ) -> Self {
        Self {
            id: id.into(),
            passport: passport.into(),
            birthdate: birthdate.into(),
            code: code.into(),
        }
    }

    /// The eleven manifest columns A..K.
    #[must_use]
    pub fn columns(&self, n: usize) -> Vec<Value> {
        vec![
            self.id.clone(),
            format!("Name {n}").into(),
            format!("City {n}").into(),
            format!("Street {n}").into(),
            self.passport.clone(),
            self.birthdate.clone(),
            format!("+99890{n:07}").into(),
            Value::Number(1.5),
            format!("Item {n}").into(),
            Value::Number(100.0 + n as f64),
            self.code.clone(),
        ]
    }
}

/// A manifest workbook: `header_rows` rows of titles, then one row per
/// record.
#[must_use]
pub fn manifest_xlsx(header_rows: u32, records: &[Record]) -> Vec<u8> {
    let mut sheet = SheetBuilder::new("Manifest");
    for r in 1..=header_rows {
        sheet = sheet.cell(&format!("A{r}"), format!("Header {r}"), Some(HEADER_STYLE));
    }
    for (i, record) in records.iter().enumerate() {
        sheet = sheet.row(header_rows + 1 + i as u32, &record.columns(i));
    }
    XlsxBuilder::new().sheet(sheet).build()
}

/// `n` distinct, fully valid records.
#[must_use]
pub fn generated_records(n: usize) -> Vec<Record> {
    (0..n)
        .map(|i| {
            Record::new(
                format!("ID{i:06}"),
                format!("AB{:07}", 1_000_000 + i),
                "01.01.1990",
                Value::Number(200_000.0 + i as f64),
            )
        })
        .collect()
}

/// Template workbook: a merged title row, two header rows, styled and
/// bordered data row 4, custom column widths.
#[must_use]
pub fn template_xlsx() -> Vec<u8> {
    let mut sheet = SheetBuilder::new("Template")
        .cell("A1", "Parcel manifest", Some(HEADER_STYLE))
        .merge("A1:K1")
        .cell("A2", "Sender", Some(HEADER_STYLE))
        .cell("A3", "ID", Some(HEADER_STYLE))
        .cell("E3", "Passport", Some(HEADER_STYLE))
        .cell("K3", "Code", Some(HEADER_STYLE))
        .col_width(1, 1, 18.0)
        .col_width(5, 5, 14.5)
        .row_height(1, 30.0);
    for col in 0..11 {
        let style = if col == 10 { TEXT_STYLE } else { BORDER_STYLE };
        sheet = sheet.cell(&format!("{}4", col_letter(col)), Value::Empty, Some(style));
    }
    XlsxBuilder::new().sheet(sheet).build()
}

/// Write [`template_xlsx`] into `dir` and return its path.
pub fn write_template(dir: &Path) -> PathBuf {
    let path = dir.join("template.xlsx");
    std::fs::write(&path, template_xlsx()).unwrap();
    path
}

/// A PINFL lookup workbook: passport in column I, PINFL in column J, no header.
#[must_use]
pub fn lookup_xlsx(pairs: &[(Value, Value)]) -> Vec<u8> {
    let mut sheet = SheetBuilder::new("Results");
    for (i, (passport, pinfl)) in pairs.iter().enumerate() {
        let row = i as u32 + 1;
        sheet = sheet
            .cell(&format!("A{row}"), format!("row {row}"), None)
            .cell(&format!("I{row}"), passport.clone(), None)
            .cell(&format!("J{row}"), pinfl.clone(), None);
    }
    XlsxBuilder::new().sheet(sheet).build()
}

/// Minimal valid XLSX with one empty sheet.
#[must_use]
pub fn minimal_xlsx() -> Vec<u8> {
    XlsxBuilder::new().sheet(SheetBuilder::new("Sheet1")).build()
}
