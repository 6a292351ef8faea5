//! DOCX encoder: one `word/document.xml` with a bold title and body paragraphs.

use std::io::{Seek, Write};

use crate::encode::Encoder;
use crate::error::Result;
use crate::lorem::TextSource;

use super::{Package, REL_OFFICE_DOCUMENT, XML_DECLARATION, escape_xml};

const DOCUMENT_PART: &str = "word/document.xml";
const DOCUMENT_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml";

/// Configuration for DOCX output.
#[derive(Debug, Clone)]
pub struct DocxConfig {
    /// Number of body paragraphs. `None` lets the text source decide.
    pub paragraphs: Option<usize>,
    /// Compression level for deflate (0-9, default 6).
    pub compression_level: u32,
}

impl Default for DocxConfig {
    fn default() -> Self {
        Self {
            paragraphs: None,
            compression_level: 6,
        }
    }
}

/// WordprocessingML document encoder.
pub struct DocxEncoder {
    config: DocxConfig,
}

impl DocxEncoder {
    pub fn new() -> Self {
        Self {
            config: DocxConfig::default(),
        }
    }

    pub fn with_config(mut self, config: DocxConfig) -> Self {
        self.config = config;
        self
    }

    /// Assemble the package for a title and `\n\n`-separated paragraphs.
    pub fn package(&self, title: &str, body: &str) -> Package {
        let mut pkg = Package::new();
        pkg.relate(None, REL_OFFICE_DOCUMENT, DOCUMENT_PART);
        pkg.add_part(DOCUMENT_PART, DOCUMENT_CONTENT_TYPE, document_xml(title, body));
        pkg.add_core_properties(title);
        pkg
    }
}

impl Default for DocxEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Encoder for DocxEncoder {
    fn encode<W: Write + Seek>(&self, text: &mut dyn TextSource, writer: &mut W) -> Result<()> {
        let title = text.title();
        let body = text.body(self.config.paragraphs);
        self.package(&title, &body)
            .write(writer, self.config.compression_level)
    }
}

fn document_xml(title: &str, body: &str) -> String {
    let mut xml = String::with_capacity(512 + body.len() * 2);
    xml.push_str(XML_DECLARATION);
    xml.push_str(
        "\n<w:document xmlns:w=\"http://schemas.openxmlformats.org/wordprocessingml/2006/main\"><w:body>",
    );
    xml.push_str(&format!(
        "<w:p><w:r><w:rPr><w:b/><w:sz w:val=\"32\"/></w:rPr><w:t>{}</w:t></w:r></w:p>",
        escape_xml(title)
    ));
    for paragraph in body.split("\n\n").filter(|p| !p.trim().is_empty()) {
        xml.push_str(&format!(
            "<w:p><w:r><w:t xml:space=\"preserve\">{}</w:t></w:r></w:p>",
            escape_xml(paragraph.trim())
        ));
    }
    // US Letter, one-inch margins
    xml.push_str(
        "<w:sectPr><w:pgSz w:w=\"12240\" w:h=\"15840\"/>\
         <w:pgMar w:top=\"1440\" w:right=\"1440\" w:bottom=\"1440\" w:left=\"1440\" \
         w:header=\"720\" w:footer=\"720\" w:gutter=\"0\"/></w:sectPr>",
    );
    xml.push_str("</w:body></w:document>");
    xml
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_paragraph_per_block() {
        let xml = document_xml("Title", "First para.\n\nSecond para.\n\n");
        assert_eq!(xml.matches("<w:p>").count(), 3);
        assert!(xml.contains(">First para.</w:t>"));
    }

    #[test]
    fn test_text_is_escaped() {
        let xml = document_xml("A < B", "x & y");
        assert!(xml.contains("A &lt; B"));
        assert!(xml.contains("x &amp; y"));
    }

    #[test]
    fn test_package_parts() {
        let pkg = DocxEncoder::new().package("Title", "Body.");
        let paths: Vec<_> = pkg.parts().iter().map(|p| p.path.as_str()).collect();
        assert_eq!(paths, vec!["word/document.xml", "docProps/core.xml"]);
        pkg.check().unwrap();
    }
}
