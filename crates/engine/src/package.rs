//! The five XML parts of a single-sheet SpreadsheetML package.
//!
//! Every cell is written as an inline string, so no shared-string table,
//! styles part or document properties are needed.

use std::fmt::Write as _;

pub const CONTENT_TYPES_PART: &str = "[Content_Types].xml";
pub const ROOT_RELS_PART: &str = "_rels/.rels";
pub const WORKBOOK_PART: &str = "xl/workbook.xml";
pub const WORKBOOK_RELS_PART: &str = "xl/_rels/workbook.xml.rels";
pub const WORKSHEET_PART: &str = "xl/worksheets/sheet1.xml";

const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;
const MAX_SHEET_NAME_CHARS: usize = 31;

/// One named XML document of the package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackagePart {
    pub name: &'static str,
    pub xml: String,
}

/// Builds all package parts, in archive order.
pub fn build_package(sheet_name: &str, header: &[String], rows: &[Vec<String>]) -> Vec<PackagePart> {
    vec![
        PackagePart {
            name: CONTENT_TYPES_PART,
            xml: content_types_xml(),
        },
        PackagePart {
            name: ROOT_RELS_PART,
            xml: root_rels_xml(),
        },
        PackagePart {
            name: WORKBOOK_PART,
            xml: workbook_xml(sheet_name),
        },
        PackagePart {
            name: WORKBOOK_RELS_PART,
            xml: workbook_rels_xml(),
        },
        PackagePart {
            name: WORKSHEET_PART,
            xml: worksheet_xml(header, rows),
        },
    ]
}

pub fn content_types_xml() -> String {
    format!(
        "{XML_DECLARATION}\
<Types xmlns=\"http://schemas.openxmlformats.org/package/2006/content-types\">\
<Default Extension=\"rels\" ContentType=\"application/vnd.openxmlformats-package.relationships+xml\"/>\
<Default Extension=\"xml\" ContentType=\"application/xml\"/>\
<Override PartName=\"/{WORKBOOK_PART}\" ContentType=\"application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml\"/>\
<Override PartName=\"/{WORKSHEET_PART}\" ContentType=\"application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml\"/>\
</Types>"
    )
}

pub fn root_rels_xml() -> String {
    format!(
        "{XML_DECLARATION}\
<Relationships xmlns=\"http://schemas.openxmlformats.org/package/2006/relationships\">\
<Relationship Id=\"rId1\" Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument\" Target=\"{WORKBOOK_PART}\"/>\
</Relationships>"
    )
}

pub fn workbook_xml(sheet_name: &str) -> String {
    let mut name = String::with_capacity(sheet_name.len());
    escape_xml(sheet_name, &mut name);
    format!(
        "{XML_DECLARATION}\
<workbook xmlns=\"http://schemas.openxmlformats.org/spreadsheetml/2006/main\" \
xmlns:r=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships\">\
<sheets><sheet name=\"{name}\" sheetId=\"1\" r:id=\"rId1\"/></sheets>\
</workbook>"
    )
}

pub fn workbook_rels_xml() -> String {
    format!(
        "{XML_DECLARATION}\
<Relationships xmlns=\"http://schemas.openxmlformats.org/package/2006/relationships\">\
<Relationship Id=\"rId1\" Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet\" Target=\"worksheets/sheet1.xml\"/>\
</Relationships>"
    )
}

/// Header row followed by one row per entry of `rows`. Rows shorter than the
/// header are padded with empty cells.
pub fn worksheet_xml(header: &[String], rows: &[Vec<String>]) -> String {
    let width = rows.iter().map(Vec::len).fold(header.len(), usize::max);
    let mut xml = String::with_capacity(256 + (rows.len() + 1) * width * 48);
    xml.push_str(XML_DECLARATION);
    xml.push_str("<worksheet xmlns=\"http://schemas.openxmlformats.org/spreadsheetml/2006/main\">");
    if width > 0 {
        let _ = write!(
            xml,
            "<dimension ref=\"A1:{}\"/>",
            cell_ref(width - 1, rows.len() + 1)
        );
    }
    xml.push_str("<sheetData>");
    write_row(&mut xml, 1, header, width);
    for (i, row) in rows.iter().enumerate() {
        write_row(&mut xml, i + 2, row, width);
    }
    xml.push_str("</sheetData></worksheet>");
    xml
}

fn write_row(xml: &mut String, row_number: usize, cells: &[String], width: usize) {
    let _ = write!(xml, "<row r=\"{row_number}\">");
    for col in 0..width {
        let text = cells.get(col).map(String::as_str).unwrap_or("");
        let _ = write!(
            xml,
            "<c r=\"{}\" t=\"inlineStr\"><is><t xml:space=\"preserve\">",
            cell_ref(col, row_number)
        );
        escape_xml(text, xml);
        xml.push_str("</t></is></c>");
    }
    xml.push_str("</row>");
}

/// Spreadsheet column name for a zero-based index: 0 → "A", 26 → "AA".
pub fn column_letters(index: usize) -> String {
    let mut letters = Vec::new();
    let mut col = index;
    loop {
        letters.push(b'A' + (col % 26) as u8);
        if col < 26 {
            break;
        }
        col = col / 26 - 1;
    }
    letters.iter().rev().map(|&b| char::from(b)).collect()
}

/// Cell address for a zero-based column and one-based row, e.g. "C7".
pub fn cell_ref(col: usize, row: usize) -> String {
    format!("{}{row}", column_letters(col))
}

/// Appends `text` with markup characters replaced by entities. Characters
/// XML 1.0 cannot represent at all are dropped.
pub fn escape_xml(text: &str, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            '\t' | '\n' | '\r' => out.push(c),
            c if (c as u32) < 0x20 || c == '\u{FFFE}' || c == '\u{FFFF}' => {}
            c => out.push(c),
        }
    }
}

/// A legal worksheet name derived from a section label: forbidden characters
/// removed, at most 31 characters, `fallback` when nothing remains.
pub fn sheet_name(label: &str, fallback: &str) -> String {
    let cleaned: String = label
        .chars()
        .filter(|c| !matches!(c, '[' | ']' | ':' | '*' | '?' | '/' | '\\') && !c.is_control())
        .collect();
    let trimmed = cleaned.trim().trim_matches('\'');
    let name: String = trimmed.chars().take(MAX_SHEET_NAME_CHARS).collect();
    let name = name.trim_end().to_string();
    if name.is_empty() {
        fallback.to_string()
    } else {
        name
    }
}
