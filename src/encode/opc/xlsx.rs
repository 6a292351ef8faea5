//! XLSX encoder: one worksheet of shared-string cells.
//!
//! Every header and data cell is a `t="s"` reference into
//! `xl/sharedStrings.xml`. By default the table gets one entry per cell in
//! the order cells are written, so `uniqueCount` equals `count` even when
//! strings repeat; `dedup_shared_strings` switches to one entry per distinct
//! value with indices reused.

use std::collections::HashMap;
use std::io::{Seek, Write};

use crate::encode::Encoder;
use crate::error::Result;
use crate::lorem::TextSource;

use super::{Package, REL_OFFICE_DOCUMENT, XML_DECLARATION, escape_xml};

const WORKBOOK_PART: &str = "xl/workbook.xml";
const SHEET_PART: &str = "xl/worksheets/sheet1.xml";
const SHARED_STRINGS_PART: &str = "xl/sharedStrings.xml";

const WORKBOOK_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml";
const SHEET_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml";
const SHARED_STRINGS_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sharedStrings+xml";

const REL_WORKSHEET: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet";
const REL_SHARED_STRINGS: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/sharedStrings";

const SPREADSHEET_NS: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";
const RELATIONSHIPS_NS: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

/// Configuration for XLSX output.
#[derive(Debug, Clone)]
pub struct XlsxConfig {
    /// Data rows below the header row.
    pub rows: usize,
    pub columns: usize,
    /// Reuse one shared-string entry per distinct value.
    pub dedup_shared_strings: bool,
    /// Compression level for deflate (0-9, default 6).
    pub compression_level: u32,
}

impl Default for XlsxConfig {
    fn default() -> Self {
        Self {
            rows: 10,
            columns: 5,
            dedup_shared_strings: false,
            compression_level: 6,
        }
    }
}

/// SpreadsheetML workbook encoder.
pub struct XlsxEncoder {
    config: XlsxConfig,
}

impl XlsxEncoder {
    pub fn new() -> Self {
        Self {
            config: XlsxConfig::default(),
        }
    }

    pub fn with_config(mut self, config: XlsxConfig) -> Self {
        self.config = config;
        self
    }

    /// Assemble the workbook for a header row and data rows.
    pub fn package(&self, title: &str, header: &[String], rows: &[Vec<String>]) -> Package {
        let mut strings = SharedStrings::new(self.config.dedup_shared_strings);
        let sheet = sheet_xml(header, rows, &mut strings);

        let mut pkg = Package::new();
        pkg.relate(None, REL_OFFICE_DOCUMENT, WORKBOOK_PART);
        let sheet_id = pkg.relate(Some(WORKBOOK_PART), REL_WORKSHEET, SHEET_PART);
        pkg.relate(Some(WORKBOOK_PART), REL_SHARED_STRINGS, SHARED_STRINGS_PART);

        pkg.add_part(WORKBOOK_PART, WORKBOOK_CONTENT_TYPE, workbook_xml(&sheet_id));
        pkg.add_part(SHEET_PART, SHEET_CONTENT_TYPE, sheet);
        pkg.add_part(
            SHARED_STRINGS_PART,
            SHARED_STRINGS_CONTENT_TYPE,
            strings.to_xml(),
        );
        pkg.add_core_properties(title);
        pkg
    }
}

impl Default for XlsxEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Encoder for XlsxEncoder {
    fn encode<W: Write + Seek>(&self, text: &mut dyn TextSource, writer: &mut W) -> Result<()> {
        let title = text.title();
        let header: Vec<String> = (0..self.config.columns).map(|_| text.title()).collect();
        let rows: Vec<Vec<String>> = (0..self.config.rows)
            .map(|_| (0..self.config.columns).map(|_| text.name()).collect())
            .collect();
        self.package(&title, &header, &rows)
            .write(writer, self.config.compression_level)
    }
}

/// Spreadsheet column letters for a zero-based index: 0 -> A, 25 -> Z, 26 -> AA.
pub fn column_name(index: usize) -> String {
    let mut n = index + 1;
    let mut letters = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push(b'A' + rem as u8);
        n = (n - 1) / 26;
    }
    letters.reverse();
    String::from_utf8(letters).unwrap_or_default()
}

struct SharedStrings {
    strings: Vec<String>,
    lookup: Option<HashMap<String, usize>>,
    references: usize,
}

impl SharedStrings {
    fn new(dedup: bool) -> Self {
        Self {
            strings: Vec::new(),
            lookup: dedup.then(HashMap::new),
            references: 0,
        }
    }

    /// Index of `s` in the table, appending it when needed.
    fn intern(&mut self, s: &str) -> usize {
        self.references += 1;
        if let Some(lookup) = &mut self.lookup
            && let Some(&index) = lookup.get(s)
        {
            return index;
        }
        let index = self.strings.len();
        self.strings.push(s.to_string());
        if let Some(lookup) = &mut self.lookup {
            lookup.insert(s.to_string(), index);
        }
        index
    }

    fn to_xml(&self) -> String {
        let mut xml = String::with_capacity(256 + 32 * self.strings.len());
        xml.push_str(XML_DECLARATION);
        xml.push_str(&format!(
            "\n<sst xmlns=\"{SPREADSHEET_NS}\" count=\"{}\" uniqueCount=\"{}\">",
            self.references,
            self.strings.len()
        ));
        for s in &self.strings {
            xml.push_str(&format!("<si><t>{}</t></si>", escape_xml(s)));
        }
        xml.push_str("</sst>");
        xml
    }
}

fn workbook_xml(sheet_rel_id: &str) -> String {
    format!(
        "{XML_DECLARATION}\n<workbook xmlns=\"{SPREADSHEET_NS}\" xmlns:r=\"{RELATIONSHIPS_NS}\">\
         <sheets><sheet name=\"Sheet1\" sheetId=\"1\" r:id=\"{sheet_rel_id}\"/></sheets></workbook>"
    )
}

fn sheet_xml(header: &[String], rows: &[Vec<String>], strings: &mut SharedStrings) -> String {
    let mut xml = String::with_capacity(256 + 48 * (rows.len() + 1) * header.len().max(1));
    xml.push_str(XML_DECLARATION);
    xml.push_str(&format!("\n<worksheet xmlns=\"{SPREADSHEET_NS}\">"));

    // Header is row 1 and data row i is row i + 2, even when rows are skipped
    let grid = std::iter::once((1, header))
        .chain(rows.iter().enumerate().map(|(i, row)| (i + 2, row.as_slice())))
        .filter(|(_, row)| !row.is_empty());

    let mut sheet_data = String::new();
    for (row_number, row) in grid {
        sheet_data.push_str(&format!("<row r=\"{row_number}\">"));
        for (c, value) in row.iter().enumerate() {
            let index = strings.intern(value);
            sheet_data.push_str(&format!(
                "<c r=\"{}{row_number}\" t=\"s\"><v>{index}</v></c>",
                column_name(c)
            ));
        }
        sheet_data.push_str("</row>");
    }

    if sheet_data.is_empty() {
        xml.push_str("<sheetData/>");
    } else {
        xml.push_str("<sheetData>");
        xml.push_str(&sheet_data);
        xml.push_str("</sheetData>");
    }
    xml.push_str("</worksheet>");
    xml
}
