//! Open Packaging Conventions encoders (DOCX, XLSX, PPTX).
//!
//! All three formats are ZIP archives of XML parts tied together by a
//! `[Content_Types].xml` manifest and `_rels/*.rels` relationship parts.
//! [`Package`] owns that bookkeeping: callers register parts and
//! relationships by absolute part name, and `write` derives the manifest and
//! relationship parts from them, so a part can never be referenced without
//! existing or exist without a content type.

use std::borrow::Cow;
use std::io::{Seek, Write};

use zip::CompressionMethod;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use crate::error::{Error, Result};

mod docx;
mod pptx;
mod xlsx;

pub use docx::{DocxConfig, DocxEncoder};
pub use pptx::{PptxConfig, PptxEncoder};
pub use xlsx::{XlsxConfig, XlsxEncoder, column_name};

pub const CONTENT_TYPES_PART: &str = "[Content_Types].xml";
pub const ROOT_RELS_PART: &str = "_rels/.rels";

pub(crate) const XML_DECLARATION: &str =
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;

const RELS_CONTENT_TYPE: &str = "application/vnd.openxmlformats-package.relationships+xml";
const CORE_CONTENT_TYPE: &str = "application/vnd.openxmlformats-package.core-properties+xml";

pub(crate) const REL_OFFICE_DOCUMENT: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";
const REL_CORE_PROPERTIES: &str =
    "http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties";

/// One file inside the package.
#[derive(Debug, Clone)]
pub struct PackagePart {
    /// Part name without the leading slash, e.g. `word/document.xml`.
    pub path: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

/// A typed link from a source part (or the package root) to a target part.
#[derive(Debug, Clone)]
pub struct Relationship {
    pub id: String,
    pub rel_type: String,
    /// Absolute part name of the target.
    pub target: String,
}

/// In-memory OPC package under construction.
#[derive(Debug, Default)]
pub struct Package {
    parts: Vec<PackagePart>,
    /// (source part, relationships); `None` is the package root.
    relationships: Vec<(Option<String>, Vec<Relationship>)>,
}

impl Package {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_part(&mut self, path: &str, content_type: &str, xml: String) {
        self.parts.push(PackagePart {
            path: path.to_string(),
            content_type: content_type.to_string(),
            data: xml.into_bytes(),
        });
    }

    /// Record a relationship and return its id (`rId1`, `rId2`, ... per source).
    pub fn relate(&mut self, source: Option<&str>, rel_type: &str, target: &str) -> String {
        let index = match self
            .relationships
            .iter()
            .position(|(s, _)| s.as_deref() == source)
        {
            Some(index) => index,
            None => {
                self.relationships
                    .push((source.map(str::to_string), Vec::new()));
                self.relationships.len() - 1
            }
        };
        let rels = &mut self.relationships[index].1;
        let id = format!("rId{}", rels.len() + 1);
        rels.push(Relationship {
            id: id.clone(),
            rel_type: rel_type.to_string(),
            target: target.to_string(),
        });
        id
    }

    pub fn parts(&self) -> &[PackagePart] {
        &self.parts
    }

    /// Add `docProps/core.xml` with the given title and link it from the root.
    pub fn add_core_properties(&mut self, title: &str) {
        let xml = format!(
            r#"{XML_DECLARATION}
<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:dcterms="http://purl.org/dc/terms/" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance"><dc:title>{}</dc:title></cp:coreProperties>"#,
            escape_xml(title),
        );
        self.add_part("docProps/core.xml", CORE_CONTENT_TYPE, xml);
        self.relate(None, REL_CORE_PROPERTIES, "docProps/core.xml");
    }

    /// Check that every relationship points at a registered part.
    pub fn check(&self) -> Result<()> {
        for (source, rels) in &self.relationships {
            if let Some(source) = source
                && !self.has_part(source)
            {
                return Err(Error::Invariant(format!(
                    "relationships declared for missing part {source}"
                )));
            }
            for rel in rels {
                if !self.has_part(&rel.target) {
                    return Err(Error::Invariant(format!(
                        "relationship {} targets missing part {}",
                        rel.id, rel.target
                    )));
                }
            }
        }
        Ok(())
    }

    fn has_part(&self, path: &str) -> bool {
        self.parts.iter().any(|p| p.path == path)
    }

    /// Serialize the package as a ZIP archive.
    pub fn write<W: Write + Seek>(&self, writer: &mut W, compression_level: u32) -> Result<()> {
        self.check()?;

        let mut zip = ZipWriter::new(writer);
        let deflated = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .compression_level(Some(i64::from(compression_level.min(9))));

        // 1. Manifest first, as Office writes it
        zip.start_file(CONTENT_TYPES_PART, deflated)?;
        zip.write_all(self.content_types_xml().as_bytes())?;

        // 2. Relationship parts
        for (source, rels) in &self.relationships {
            let path = rels_part_name(source.as_deref());
            zip.start_file(path.as_str(), deflated)?;
            zip.write_all(rels_xml(source.as_deref(), rels).as_bytes())?;
        }

        // 3. Payload parts in registration order
        for part in &self.parts {
            zip.start_file(part.path.as_str(), deflated)?;
            zip.write_all(&part.data)?;
        }

        zip.finish()?;
        Ok(())
    }

    fn content_types_xml(&self) -> String {
        let mut xml = String::with_capacity(512 + 160 * self.parts.len());
        xml.push_str(XML_DECLARATION);
        xml.push_str("\n<Types xmlns=\"http://schemas.openxmlformats.org/package/2006/content-types\">");
        xml.push_str(&format!(
            "<Default Extension=\"rels\" ContentType=\"{RELS_CONTENT_TYPE}\"/>"
        ));
        xml.push_str("<Default Extension=\"xml\" ContentType=\"application/xml\"/>");
        for part in &self.parts {
            xml.push_str(&format!(
                "<Override PartName=\"/{}\" ContentType=\"{}\"/>",
                escape_xml(&part.path),
                escape_xml(&part.content_type)
            ));
        }
        xml.push_str("</Types>");
        xml
    }
}

/// `word/document.xml` -> `word/_rels/document.xml.rels`; root -> `_rels/.rels`.
pub fn rels_part_name(source: Option<&str>) -> String {
    match source {
        None => ROOT_RELS_PART.to_string(),
        Some(source) => match source.rsplit_once('/') {
            Some((dir, file)) => format!("{dir}/_rels/{file}.rels"),
            None => format!("_rels/{source}.rels"),
        },
    }
}

fn rels_xml(source: Option<&str>, rels: &[Relationship]) -> String {
    let base = source.map(part_dir).unwrap_or("");
    let mut xml = String::with_capacity(256 + 160 * rels.len());
    xml.push_str(XML_DECLARATION);
    xml.push_str(
        "\n<Relationships xmlns=\"http://schemas.openxmlformats.org/package/2006/relationships\">",
    );
    for rel in rels {
        xml.push_str(&format!(
            "<Relationship Id=\"{}\" Type=\"{}\" Target=\"{}\"/>",
            escape_xml(&rel.id),
            escape_xml(&rel.rel_type),
            escape_xml(&relative_target(base, &rel.target))
        ));
    }
    xml.push_str("</Relationships>");
    xml
}

/// Directory portion of a part name (`ppt/slides/slide1.xml` -> `ppt/slides`).
pub fn part_dir(path: &str) -> &str {
    path.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("")
}

/// Express `target` relative to the directory `base`.
///
/// `relative_target("ppt/slides", "ppt/slideLayouts/slideLayout1.xml")`
/// is `../slideLayouts/slideLayout1.xml`.
pub fn relative_target(base: &str, target: &str) -> String {
    let base: Vec<&str> = base.split('/').filter(|s| !s.is_empty()).collect();
    let target: Vec<&str> = target.split('/').filter(|s| !s.is_empty()).collect();
    let common = base
        .iter()
        .zip(&target)
        .take_while(|(a, b)| a == b)
        .count();
    let mut segments: Vec<&str> = vec![".."; base.len() - common];
    segments.extend_from_slice(&target[common..]);
    segments.join("/")
}

/// Resolve a relationship target against the directory of its source part.
pub fn resolve_target(base: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_string();
    }
    let mut segments: Vec<&str> = base.split('/').filter(|s| !s.is_empty()).collect();
    for segment in target.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }
    segments.join("/")
}

/// Escape text for XML content and attribute values.
pub(crate) fn escape_xml(s: &str) -> Cow<'_, str> {
    quick_xml::escape::escape(s)
}
