//! XLSX parser implementation.

use crate::container::{Relationships, WorkbookContainer};
use crate::detect;
use crate::error::{Error, Result};
use crate::model::{CellMatrix, CellValue};
use chrono::{NaiveDate, NaiveDateTime};
use std::path::Path;

use super::shared_strings::SharedStrings;
use super::styles::Styles;

/// Cells below this row are dropped; schedule sheets are a few hundred rows.
pub const MAX_ROWS: usize = 10_000;

/// Cells right of this column are dropped.
pub const MAX_COLUMNS: usize = 256;

const WORKBOOK_PATH: &str = "xl/workbook.xml";

/// Sheet info from workbook.xml.
#[derive(Debug, Clone)]
struct SheetInfo {
    name: String,
    /// Resolved part path inside the archive
    path: String,
}

/// Parser for XLSX (Excel) workbooks.
///
/// Opening the parser reads the workbook index, shared strings and styles;
/// worksheets are materialized one at a time by [`XlsxParser::read_sheet`].
pub struct XlsxParser {
    container: WorkbookContainer,
    shared_strings: SharedStrings,
    styles: Styles,
    sheets: Vec<SheetInfo>,
}

impl XlsxParser {
    /// Open an XLSX file for parsing.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let data = std::fs::read(path.as_ref())?;
        Self::from_bytes(data)
    }

    /// Create a parser from the bytes of a workbook.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        detect::ensure_workbook(&data)?;
        let container = WorkbookContainer::from_bytes(data)?;
        Self::from_container(container)
    }

    fn from_container(container: WorkbookContainer) -> Result<Self> {
        let shared_strings = match container.read_optional_xml("xl/sharedStrings.xml")? {
            Some(xml) => SharedStrings::parse(&xml)?,
            None => SharedStrings::default(),
        };

        let styles = match container.read_optional_xml("xl/styles.xml")? {
            Some(xml) => Styles::parse(&xml),
            None => Styles::default(),
        };

        let relationships = match container.read_optional_xml("xl/_rels/workbook.xml.rels")? {
            Some(xml) => Relationships::parse(&xml)?,
            None => Relationships::default(),
        };

        let workbook = container.read_xml(WORKBOOK_PATH)?;
        let sheets = Self::parse_workbook(&workbook, &relationships)?;

        log::debug!(
            "workbook: {} sheets, {} shared strings",
            sheets.len(),
            shared_strings.len()
        );

        Ok(Self {
            container,
            shared_strings,
            styles,
            sheets,
        })
    }

    /// Parse workbook.xml for sheet names and their part paths.
    fn parse_workbook(xml: &str, relationships: &Relationships) -> Result<Vec<SheetInfo>> {
        let mut sheets = Vec::new();
        let mut reader = quick_xml::Reader::from_str(xml);
        reader.config_mut().trim_text(true);

        let mut buf = Vec::new();
        loop {
            match reader.read_event_into(&mut buf) {
                Ok(quick_xml::events::Event::Empty(e)) | Ok(quick_xml::events::Event::Start(e))
                    if e.local_name().as_ref() == b"sheet" =>
                {
                    let mut name = String::new();
                    let mut rel_id = String::new();
                    for attr in e.attributes().flatten() {
                        match attr.key.as_ref() {
                            b"name" => {
                                name = attr
                                    .unescape_value()
                                    .map(|v| v.to_string())
                                    .unwrap_or_else(|_| {
                                        String::from_utf8_lossy(&attr.value).to_string()
                                    });
                            }
                            b"r:id" => rel_id = String::from_utf8_lossy(&attr.value).to_string(),
                            _ => {}
                        }
                    }
                    if !name.is_empty() {
                        let path = match relationships.target(&rel_id) {
                            Some(target) => WorkbookContainer::resolve_path(WORKBOOK_PATH, target),
                            // Workbooks without rels follow the default part naming
                            None => format!("xl/worksheets/sheet{}.xml", sheets.len() + 1),
                        };
                        sheets.push(SheetInfo { name, path });
                    }
                }
                Ok(quick_xml::events::Event::Eof) => break,
                Err(e) => return Err(Error::XmlParse(e.to_string())),
                _ => {}
            }
            buf.clear();
        }

        Ok(sheets)
    }

    /// Get the number of sheets.
    pub fn sheet_count(&self) -> usize {
        self.sheets.len()
    }

    /// Get sheet names in workbook order.
    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|s| s.name.as_str()).collect()
    }

    /// Materialize one worksheet, by workbook index.
    pub fn read_sheet(&self, index: usize) -> Result<CellMatrix> {
        let sheet = self
            .sheets
            .get(index)
            .ok_or_else(|| Error::InvalidData(format!("no sheet at index {}", index)))?;
        let xml = self.container.read_xml(&sheet.path)?;
        self.parse_sheet(&xml)
    }

    /// Materialize one worksheet, by name.
    pub fn read_sheet_by_name(&self, name: &str) -> Result<CellMatrix> {
        let index = self
            .sheets
            .iter()
            .position(|s| s.name == name)
            .ok_or_else(|| Error::MissingComponent(format!("sheet '{}'", name)))?;
        self.read_sheet(index)
    }

    /// Parse a worksheet XML into a cell matrix.
    fn parse_sheet(&self, xml: &str) -> Result<CellMatrix> {
        let mut reader = quick_xml::Reader::from_str(xml);
        // Keep whitespace: leading line breaks inside a cell are content
        reader.config_mut().trim_text(false);

        let mut cells: Vec<(usize, usize, CellValue)> = Vec::new();
        let mut buf = Vec::new();

        let mut next_row = 0usize;
        let mut next_col = 0usize;
        let mut row = 0usize;
        let mut cell: Option<PendingCell> = None;
        let mut in_value = false;
        let mut dropped = 0usize;

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(quick_xml::events::Event::Start(ref e)) => match e.local_name().as_ref() {
                    b"row" => {
                        row = row_index(e).unwrap_or(next_row);
                        next_col = 0;
                    }
                    b"c" => {
                        let pending = PendingCell::from_start(e, row, next_col);
                        next_col = pending.col + 1;
                        cell = Some(pending);
                    }
                    b"v" | b"t" if cell.is_some() => in_value = true,
                    _ => {}
                },
                Ok(quick_xml::events::Event::Empty(ref e)) => match e.local_name().as_ref() {
                    b"row" => next_row = row_index(e).unwrap_or(next_row) + 1,
                    b"c" => next_col = PendingCell::from_start(e, row, next_col).col + 1,
                    _ => {}
                },
                Ok(quick_xml::events::Event::Text(ref e)) if in_value => {
                    if let Some(ref mut pending) = cell {
                        pending.raw.push_str(&e.unescape().unwrap_or_default());
                    }
                }
                Ok(quick_xml::events::Event::CData(ref e)) if in_value => {
                    if let Some(ref mut pending) = cell {
                        pending.raw.push_str(&String::from_utf8_lossy(e.as_ref()));
                    }
                }
                Ok(quick_xml::events::Event::End(ref e)) => match e.local_name().as_ref() {
                    b"row" => next_row = row + 1,
                    b"c" => {
                        if let Some(pending) = cell.take() {
                            if pending.row >= MAX_ROWS || pending.col >= MAX_COLUMNS {
                                dropped += 1;
                            } else {
                                let value = self.resolve_cell_value(&pending);
                                cells.push((pending.row, pending.col, value));
                            }
                        }
                        in_value = false;
                    }
                    b"v" | b"t" => in_value = false,
                    _ => {}
                },
                Ok(quick_xml::events::Event::Eof) => break,
                Err(e) => return Err(Error::XmlParse(e.to_string())),
                _ => {}
            }
            buf.clear();
        }

        if dropped > 0 {
            log::debug!("dropped {} cells outside {}x{}", dropped, MAX_ROWS, MAX_COLUMNS);
        }

        Ok(CellMatrix::from_cells(cells))
    }

    /// Resolve a cell value based on its type and style.
    fn resolve_cell_value(&self, cell: &PendingCell) -> CellValue {
        let raw = cell.raw.as_str();
        match cell.cell_type.as_deref() {
            Some("s") => match raw.trim().parse::<usize>() {
                Ok(idx) => CellValue::text(self.shared_strings.get(idx).unwrap_or("")),
                Err(_) => CellValue::text(raw),
            },
            Some("b") => CellValue::Bool(raw.trim() == "1"),
            Some("e") => CellValue::Error(raw.trim().to_string()),
            Some("str") | Some("inlineStr") => CellValue::text(raw),
            Some("d") => parse_iso_date(raw.trim())
                .map(CellValue::DateTime)
                .unwrap_or_else(|| CellValue::text(raw)),
            _ => match raw.trim() {
                "" => CellValue::Empty,
                number => match number.parse::<f64>() {
                    Ok(n) => self.styles.convert(n, cell.style),
                    Err(_) => CellValue::text(raw),
                },
            },
        }
    }

    /// Get a reference to the container.
    pub fn container(&self) -> &WorkbookContainer {
        &self.container
    }
}

impl std::fmt::Debug for XlsxParser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("XlsxParser")
            .field("sheets", &self.sheet_names())
            .finish()
    }
}

/// A `<c>` element being read.
#[derive(Debug)]
struct PendingCell {
    row: usize,
    col: usize,
    cell_type: Option<String>,
    style: Option<usize>,
    raw: String,
}

impl PendingCell {
    fn from_start(e: &quick_xml::events::BytesStart<'_>, row: usize, next_col: usize) -> Self {
        let mut pending = Self {
            row,
            col: next_col,
            cell_type: None,
            style: None,
            raw: String::new(),
        };
        for attr in e.attributes().flatten() {
            let value = String::from_utf8_lossy(&attr.value);
            match attr.key.as_ref() {
                b"r" => {
                    if let Some((r, c)) = parse_cell_ref(&value) {
                        pending.row = r;
                        pending.col = c;
                    }
                }
                b"t" => pending.cell_type = Some(value.to_string()),
                b"s" => pending.style = value.parse().ok(),
                _ => {}
            }
        }
        pending
    }
}

fn row_index(e: &quick_xml::events::BytesStart<'_>) -> Option<usize> {
    e.attributes()
        .flatten()
        .find(|attr| attr.key.as_ref() == b"r")
        .and_then(|attr| String::from_utf8_lossy(&attr.value).parse::<usize>().ok())
        .and_then(|r| r.checked_sub(1))
}

/// Parse an A1-style reference into zero-based `(row, column)`.
pub fn parse_cell_ref(reference: &str) -> Option<(usize, usize)> {
    let reference = reference.trim().replace('$', "");
    let split = reference.find(|c: char| c.is_ascii_digit())?;
    let (letters, digits) = reference.split_at(split);
    if letters.is_empty() || !letters.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }

    let mut col = 0usize;
    for c in letters.chars() {
        let digit = (c.to_ascii_uppercase() as u8 - b'A') as usize + 1;
        col = col.checked_mul(26)?.checked_add(digit)?;
    }
    let row = digits.parse::<usize>().ok()?.checked_sub(1)?;
    Some((row, col - 1))
}

fn parse_iso_date(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .or_else(|| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S").ok())
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;
    use std::io::{Cursor, Write};
    use zip::write::SimpleFileOptions;

    const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
  <Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>
</Types>"#;

    fn workbook(sheet_xml: &str) -> Vec<u8> {
        let parts = [
            ("[Content_Types].xml", CONTENT_TYPES.to_string()),
            (
                "xl/workbook.xml",
                r#"<workbook xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets><sheet name="KW 41" sheetId="1" r:id="rId1"/></sheets></workbook>"#.to_string(),
            ),
            (
                "xl/_rels/workbook.xml.rels",
                r#"<Relationships><Relationship Id="rId1" Type="worksheet" Target="worksheets/sheet1.xml"/></Relationships>"#.to_string(),
            ),
            ("xl/sharedStrings.xml", "<sst><si><t>Montag</t></si></sst>".to_string()),
            (
                "xl/styles.xml",
                r#"<styleSheet><numFmts><numFmt numFmtId="164" formatCode="hh:mm"/></numFmts><cellXfs><xf numFmtId="0"/><xf numFmtId="164"/><xf numFmtId="14"/></cellXfs></styleSheet>"#.to_string(),
            ),
            ("xl/worksheets/sheet1.xml", sheet_xml.to_string()),
        ];

        let mut buffer = Vec::new();
        let mut zip = zip::ZipWriter::new(Cursor::new(&mut buffer));
        for (name, body) in parts {
            zip.start_file(name, SimpleFileOptions::default()).unwrap();
            zip.write_all(body.as_bytes()).unwrap();
        }
        zip.finish().unwrap();
        buffer
    }

    #[test]
    fn test_parse_cell_ref() {
        assert_eq!(parse_cell_ref("A1"), Some((0, 0)));
        assert_eq!(parse_cell_ref("B3"), Some((2, 1)));
        assert_eq!(parse_cell_ref("Z10"), Some((9, 25)));
        assert_eq!(parse_cell_ref("AA1"), Some((0, 26)));
        assert_eq!(parse_cell_ref("$C$4"), Some((3, 2)));
        assert_eq!(parse_cell_ref("A0"), None);
        assert_eq!(parse_cell_ref("12"), None);
        assert_eq!(parse_cell_ref("A"), None);
    }

    #[test]
    fn test_sheet_names() {
        let parser = XlsxParser::from_bytes(workbook("<worksheet/>")).unwrap();
        assert_eq!(parser.sheet_names(), vec!["KW 41"]);
        assert_eq!(parser.sheet_count(), 1);
    }

    #[test]
    fn test_cells_placed_by_reference() {
        let sheet = r#"<worksheet><sheetData>
<row r="1"><c r="B1" t="s"><v>0</v></c></row>
<row r="3"><c r="A3" s="1"><v>0.375</v></c><c r="B3" t="inlineStr"><is><t>Networks | Dr. X</t></is></c></row>
<row r="4"><c r="A4" s="2"><v>45936</v></c><c r="C4"><v>42</v></c><c r="D4" t="b"><v>1</v></c></row>
</sheetData></worksheet>"#;
        let parser = XlsxParser::from_bytes(workbook(sheet)).unwrap();
        let m = parser.read_sheet(0).unwrap();

        assert_eq!(m.height(), 4);
        assert_eq!(m.get(0, 1), &CellValue::Text("Montag".to_string()));
        assert!(m.get(1, 0).is_empty());
        assert_eq!(
            m.get(2, 0),
            &CellValue::Time(NaiveTime::from_hms_opt(9, 0, 0).unwrap())
        );
        assert_eq!(m.get(2, 1).display_text(), "Networks | Dr. X");
        assert!(matches!(m.get(3, 0), CellValue::DateTime(_)));
        assert_eq!(m.get(3, 2), &CellValue::Number(42.0));
        assert_eq!(m.get(3, 3), &CellValue::Bool(true));
    }

    #[test]
    fn test_huge_date_serial_stays_numeric() {
        let sheet = r#"<worksheet><sheetData>
<row r="1"><c r="A1" s="2"><v>1E+300</v></c><c r="B1" s="1"><v>-5</v></c></row>
</sheetData></worksheet>"#;
        let parser = XlsxParser::from_bytes(workbook(sheet)).unwrap();
        let m = parser.read_sheet(0).unwrap();
        assert_eq!(m.get(0, 0), &CellValue::Number(1e300));
        assert_eq!(m.get(0, 1), &CellValue::Number(-5.0));
    }

    #[test]
    fn test_cells_without_references() {
        let sheet = r#"<worksheet><sheetData>
<row><c t="inlineStr"><is><t>a</t></is></c><c/><c t="inlineStr"><is><t>c</t></is></c></row>
<row><c><v>1</v></c></row>
</sheetData></worksheet>"#;
        let parser = XlsxParser::from_bytes(workbook(sheet)).unwrap();
        let m = parser.read_sheet_by_name("KW 41").unwrap();
        assert_eq!(m.get(0, 0).display_text(), "a");
        assert_eq!(m.get(0, 2).display_text(), "c");
        assert_eq!(m.get(1, 0), &CellValue::Number(1.0));
    }

    #[test]
    fn test_missing_sheet() {
        let parser = XlsxParser::from_bytes(workbook("<worksheet/>")).unwrap();
        assert!(parser.read_sheet(3).is_err());
        assert!(matches!(
            parser.read_sheet_by_name("42"),
            Err(Error::MissingComponent(_))
        ));
    }

    #[test]
    fn test_malformed_sheet_is_an_error() {
        let parser = XlsxParser::from_bytes(workbook("<worksheet><sheetData></row>")).unwrap();
        assert!(matches!(parser.read_sheet(0), Err(Error::XmlParse(_))));
    }

    #[test]
    fn test_not_a_workbook() {
        assert!(matches!(
            XlsxParser::from_bytes(b"not a zip".to_vec()),
            Err(Error::UnknownFormat)
        ));
    }

    #[test]
    fn test_iso_date_cells() {
        assert_eq!(
            parse_iso_date("2025-10-06").unwrap().date(),
            NaiveDate::from_ymd_opt(2025, 10, 6).unwrap()
        );
        assert!(parse_iso_date("2025-10-06T09:30:00").is_some());
        assert!(parse_iso_date("06.10.2025").is_none());
    }
}
