//! PPTX encoder: a single slide with a title box and a body text box.
//!
//! PresentationML requires every slide to hang off a layout, every layout off
//! a master, and the master to carry a theme, so the package always contains
//! one of each alongside `ppt/presentation.xml` and `ppt/slides/slide1.xml`.

use std::io::{Seek, Write};

use crate::encode::Encoder;
use crate::error::Result;
use crate::lorem::TextSource;

use super::{Package, REL_OFFICE_DOCUMENT, XML_DECLARATION, escape_xml};

const PRESENTATION_PART: &str = "ppt/presentation.xml";
const SLIDE_PART: &str = "ppt/slides/slide1.xml";
const LAYOUT_PART: &str = "ppt/slideLayouts/slideLayout1.xml";
const MASTER_PART: &str = "ppt/slideMasters/slideMaster1.xml";
const THEME_PART: &str = "ppt/theme/theme1.xml";

const PRESENTATION_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml";
const SLIDE_CONTENT_TYPE: &str = "application/vnd.openxmlformats-officedocument.presentationml.slide+xml";
const LAYOUT_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.presentationml.slideLayout+xml";
const MASTER_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.presentationml.slideMaster+xml";
const THEME_CONTENT_TYPE: &str = "application/vnd.openxmlformats-officedocument.theme+xml";

const REL_SLIDE: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide";
const REL_SLIDE_LAYOUT: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideLayout";
const REL_SLIDE_MASTER: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideMaster";
const REL_THEME: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/theme";

const NAMESPACES: &str = concat!(
    r#"xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" "#,
    r#"xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" "#,
    r#"xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main""#
);

/// Empty shape tree: every `p:cSld` needs the group properties even with no shapes.
const SP_TREE_HEADER: &str = r#"<p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="0" cy="0"/><a:chOff x="0" y="0"/><a:chExt cx="0" cy="0"/></a:xfrm></p:grpSpPr>"#;

// 4:3 slide in EMU
const SLIDE_CX: u64 = 9_144_000;
const SLIDE_CY: u64 = 6_858_000;

/// Configuration for PPTX output.
#[derive(Debug, Clone)]
pub struct PptxConfig {
    /// Compression level for deflate (0-9, default 6).
    pub compression_level: u32,
}

impl Default for PptxConfig {
    fn default() -> Self {
        Self {
            compression_level: 6,
        }
    }
}

/// PresentationML deck encoder.
pub struct PptxEncoder {
    config: PptxConfig,
}

impl PptxEncoder {
    pub fn new() -> Self {
        Self {
            config: PptxConfig::default(),
        }
    }

    pub fn with_config(mut self, config: PptxConfig) -> Self {
        self.config = config;
        self
    }

    pub fn package(&self, title: &str, body: &str) -> Package {
        let mut pkg = Package::new();
        pkg.relate(None, REL_OFFICE_DOCUMENT, PRESENTATION_PART);

        let master_rel = pkg.relate(Some(PRESENTATION_PART), REL_SLIDE_MASTER, MASTER_PART);
        let slide_rel = pkg.relate(Some(PRESENTATION_PART), REL_SLIDE, SLIDE_PART);
        pkg.relate(Some(PRESENTATION_PART), REL_THEME, THEME_PART);

        pkg.relate(Some(SLIDE_PART), REL_SLIDE_LAYOUT, LAYOUT_PART);
        pkg.relate(Some(LAYOUT_PART), REL_SLIDE_MASTER, MASTER_PART);
        let layout_rel = pkg.relate(Some(MASTER_PART), REL_SLIDE_LAYOUT, LAYOUT_PART);
        pkg.relate(Some(MASTER_PART), REL_THEME, THEME_PART);

        pkg.add_part(
            PRESENTATION_PART,
            PRESENTATION_CONTENT_TYPE,
            presentation_xml(&master_rel, &slide_rel),
        );
        pkg.add_part(SLIDE_PART, SLIDE_CONTENT_TYPE, slide_xml(title, body));
        pkg.add_part(LAYOUT_PART, LAYOUT_CONTENT_TYPE, layout_xml());
        pkg.add_part(MASTER_PART, MASTER_CONTENT_TYPE, master_xml(&layout_rel));
        pkg.add_part(THEME_PART, THEME_CONTENT_TYPE, theme_xml());
        pkg.add_core_properties(title);
        pkg
    }
}

impl Default for PptxEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Encoder for PptxEncoder {
    fn encode<W: Write + Seek>(&self, text: &mut dyn TextSource, writer: &mut W) -> Result<()> {
        let title = text.title();
        let body = text.paragraph();
        self.package(&title, &body)
            .write(writer, self.config.compression_level)
    }
}

fn presentation_xml(master_rel: &str, slide_rel: &str) -> String {
    format!(
        "{XML_DECLARATION}\n<p:presentation {NAMESPACES}>\
         <p:sldMasterIdLst><p:sldMasterId id=\"2147483648\" r:id=\"{master_rel}\"/></p:sldMasterIdLst>\
         <p:sldIdLst><p:sldId id=\"256\" r:id=\"{slide_rel}\"/></p:sldIdLst>\
         <p:sldSz cx=\"{SLIDE_CX}\" cy=\"{SLIDE_CY}\" type=\"screen4x3\"/>\
         <p:notesSz cx=\"{SLIDE_CY}\" cy=\"{SLIDE_CX}\"/>\
         </p:presentation>"
    )
}

/// A rectangular text box shape.
fn text_box(id: u32, name: &str, y: u64, cy: u64, size: u32, text: &str) -> String {
    format!(
        "<p:sp><p:nvSpPr><p:cNvPr id=\"{id}\" name=\"{name}\"/><p:cNvSpPr txBox=\"1\"/><p:nvPr/></p:nvSpPr>\
         <p:spPr><a:xfrm><a:off x=\"457200\" y=\"{y}\"/><a:ext cx=\"8229600\" cy=\"{cy}\"/></a:xfrm>\
         <a:prstGeom prst=\"rect\"><a:avLst/></a:prstGeom><a:noFill/></p:spPr>\
         <p:txBody><a:bodyPr wrap=\"square\" rtlCol=\"0\"><a:normAutofit/></a:bodyPr><a:lstStyle/>\
         <a:p><a:r><a:rPr lang=\"en-US\" sz=\"{size}\" dirty=\"0\"/><a:t>{}</a:t></a:r></a:p></p:txBody></p:sp>",
        escape_xml(text)
    )
}

fn slide_xml(title: &str, body: &str) -> String {
    format!(
        "{XML_DECLARATION}\n<p:sld {NAMESPACES}><p:cSld><p:spTree>{SP_TREE_HEADER}{}{}</p:spTree></p:cSld>\
         <p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:sld>",
        text_box(2, "Title", 457_200, 1_143_000, 4000, title),
        text_box(3, "Body", 1_828_800, 4_572_000, 2000, body),
    )
}

fn layout_xml() -> String {
    format!(
        "{XML_DECLARATION}\n<p:sldLayout {NAMESPACES} type=\"blank\" preserve=\"1\">\
         <p:cSld name=\"Blank\"><p:spTree>{SP_TREE_HEADER}</p:spTree></p:cSld>\
         <p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:sldLayout>"
    )
}

fn master_xml(layout_rel: &str) -> String {
    format!(
        "{XML_DECLARATION}\n<p:sldMaster {NAMESPACES}>\
         <p:cSld><p:bg><p:bgRef idx=\"1001\"><a:schemeClr val=\"bg1\"/></p:bgRef></p:bg>\
         <p:spTree>{SP_TREE_HEADER}</p:spTree></p:cSld>\
         <p:clrMap bg1=\"lt1\" tx1=\"dk1\" bg2=\"lt2\" tx2=\"dk2\" accent1=\"accent1\" accent2=\"accent2\" \
         accent3=\"accent3\" accent4=\"accent4\" accent5=\"accent5\" accent6=\"accent6\" hlink=\"hlink\" \
         folHlink=\"folHlink\"/>\
         <p:sldLayoutIdLst><p:sldLayoutId id=\"2147483649\" r:id=\"{layout_rel}\"/></p:sldLayoutIdLst>\
         </p:sldMaster>"
    )
}

fn theme_xml() -> String {
    let colors = [
        ("dk1", "000000"),
        ("lt1", "FFFFFF"),
        ("dk2", "1F497D"),
        ("lt2", "EEECE1"),
        ("accent1", "4F81BD"),
        ("accent2", "C0504D"),
        ("accent3", "9BBB59"),
        ("accent4", "8064A2"),
        ("accent5", "4BACC6"),
        ("accent6", "F79646"),
        ("hlink", "0000FF"),
        ("folHlink", "800080"),
    ];
    let scheme: String = colors
        .iter()
        .map(|(name, rgb)| format!("<a:{name}><a:srgbClr val=\"{rgb}\"/></a:{name}>"))
        .collect();

    let fill = "<a:solidFill><a:schemeClr val=\"phClr\"/></a:solidFill>";
    let fills = fill.repeat(3);
    let lines = format!("<a:ln w=\"9525\">{fill}</a:ln>").repeat(3);
    let effects = "<a:effectStyle><a:effectLst/></a:effectStyle>".repeat(3);

    format!(
        "{XML_DECLARATION}\n<a:theme xmlns:a=\"http://schemas.openxmlformats.org/drawingml/2006/main\" name=\"Office Theme\">\
         <a:themeElements>\
         <a:clrScheme name=\"Office\">{scheme}</a:clrScheme>\
         <a:fontScheme name=\"Office\">\
         <a:majorFont><a:latin typeface=\"Calibri\"/><a:ea typeface=\"\"/><a:cs typeface=\"\"/></a:majorFont>\
         <a:minorFont><a:latin typeface=\"Calibri\"/><a:ea typeface=\"\"/><a:cs typeface=\"\"/></a:minorFont>\
         </a:fontScheme>\
         <a:fmtScheme name=\"Office\">\
         <a:fillStyleLst>{fills}</a:fillStyleLst>\
         <a:lnStyleLst>{lines}</a:lnStyleLst>\
         <a:effectStyleLst>{effects}</a:effectStyleLst>\
         <a:bgFillStyleLst>{fills}</a:bgFillStyleLst>\
         </a:fmtScheme>\
         </a:themeElements></a:theme>"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_package_is_complete() {
        let pkg = PptxEncoder::new().package("Deck", "Body text.");
        pkg.check().unwrap();
        let paths: Vec<_> = pkg.parts().iter().map(|p| p.path.as_str()).collect();
        for expected in [PRESENTATION_PART, SLIDE_PART, LAYOUT_PART, MASTER_PART, THEME_PART] {
            assert!(paths.contains(&expected), "missing {expected}");
        }
    }

    #[test]
    fn test_compression_level_from_config() {
        use std::io::Cursor;

        use crate::lorem::FixedText;

        let encode = |compression_level| {
            let mut text = FixedText::new("Deck", "Body text.");
            let mut out = Cursor::new(Vec::new());
            PptxEncoder::new()
                .with_config(PptxConfig { compression_level })
                .encode(&mut text, &mut out)
                .unwrap();
            out.into_inner()
        };
        assert!(encode(0).len() > encode(9).len());
    }

    #[test]
    fn test_presentation_references_relationship_ids() {
        let xml = presentation_xml("rId1", "rId2");
        assert!(xml.contains(r#"<p:sldMasterId id="2147483648" r:id="rId1"/>"#));
        assert!(xml.contains(r#"<p:sldId id="256" r:id="rId2"/>"#));
    }

    #[test]
    fn test_slide_escapes_text() {
        let xml = slide_xml("Q&A", "<body>");
        assert!(xml.contains("<a:t>Q&amp;A</a:t>"));
        assert!(xml.contains("<a:t>&lt;body&gt;</a:t>"));
    }

    #[test]
    fn test_theme_has_twelve_colors() {
        assert_eq!(theme_xml().matches("<a:srgbClr").count(), 12);
    }
}
