use std::collections::{HashMap, HashSet};
use std::io::{Cursor, Read};

use quick_xml::Reader;
use quick_xml::events::Event;
use zip::ZipArchive;

use crate::encode::opc::{CONTENT_TYPES_PART, part_dir, rels_part_name, resolve_target};
use crate::error::{Error, Result};
use crate::format::Format;

/// Read every entry, letting the ZIP reader verify each CRC.
///
/// Returns entry names in central-directory order.
pub fn zip(bytes: &[u8]) -> Result<Vec<String>> {
    Ok(read_entries(bytes, Format::Zip)?
        .into_iter()
        .map(|(name, _)| name)
        .collect())
}

/// Check manifest and relationship completeness of an OPC package.
///
/// - every relationship target (resolved against its source part) exists
/// - every relationship part belongs to an existing source part
/// - every `Override` in `[Content_Types].xml` names an existing part
/// - every part has a content type, by override or extension default
/// - every `.xml` / `.rels` part is well-formed
///
/// Returns the part names reached through relationships, root first.
pub fn opc(bytes: &[u8]) -> Result<Vec<String>> {
    let entries = read_entries(bytes, Format::Docx)?;
    let format = if entries.iter().any(|(n, _)| n == "xl/workbook.xml") {
        Format::Xlsx
    } else if entries.iter().any(|(n, _)| n == "ppt/presentation.xml") {
        Format::Pptx
    } else {
        Format::Docx
    };
    let bad = |reason: String| Error::malformed(format, reason);

    let parts: HashMap<&str, &[u8]> = entries
        .iter()
        .map(|(name, data)| (name.as_str(), data.as_slice()))
        .collect();

    for (name, data) in &entries {
        if name.ends_with(".xml") || name.ends_with(".rels") {
            check_well_formed(data).map_err(|e| bad(format!("{name}: {e}")))?;
        }
    }

    let manifest = parts
        .get(CONTENT_TYPES_PART)
        .ok_or_else(|| bad(format!("missing {CONTENT_TYPES_PART}")))?;
    let (defaults, overrides) = parse_content_types(manifest)?;

    for part in overrides.keys() {
        if !parts.contains_key(part.as_str()) {
            return Err(bad(format!("content type declared for missing part /{part}")));
        }
    }
    for name in parts.keys().filter(|n| **n != CONTENT_TYPES_PART) {
        let ext = name.rsplit_once('.').map(|(_, e)| e.to_ascii_lowercase());
        let typed = overrides.contains_key(*name)
            || ext.is_some_and(|ext| defaults.contains(&ext));
        if !typed {
            return Err(bad(format!("part {name} has no content type")));
        }
    }

    // Relationship parts must belong to a real source
    for name in parts.keys().filter(|n| n.ends_with(".rels")) {
        if *name == rels_part_name(None) {
            continue;
        }
        let source = source_of_rels(name).ok_or_else(|| bad(format!("stray {name}")))?;
        if !parts.contains_key(source.as_str()) {
            return Err(bad(format!("{name} describes missing part {source}")));
        }
    }

    // Walk the relationship graph from the package root
    let mut reached = Vec::new();
    let mut seen = HashSet::new();
    let mut queue: Vec<Option<String>> = vec![None];
    while let Some(source) = queue.pop() {
        let rels_name = rels_part_name(source.as_deref());
        let Some(rels) = parts.get(rels_name.as_str()) else {
            if source.is_none() {
                return Err(bad(format!("missing {rels_name}")));
            }
            continue;
        };
        let base = source.as_deref().map(part_dir).unwrap_or("");
        for target in parse_relationship_targets(rels)? {
            let resolved = resolve_target(base, &target);
            if !parts.contains_key(resolved.as_str()) {
                return Err(bad(format!(
                    "{rels_name} targets missing part {resolved}"
                )));
            }
            if seen.insert(resolved.clone()) {
                reached.push(resolved.clone());
                queue.insert(0, Some(resolved));
            }
        }
    }

    Ok(reached)
}

fn read_entries(bytes: &[u8], format: Format) -> Result<Vec<(String, Vec<u8>)>> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| Error::malformed(format, e.to_string()))?;
    let mut entries = Vec::with_capacity(archive.len());
    for i in 0..archive.len() {
        let mut file = archive
            .by_index(i)
            .map_err(|e| Error::malformed(format, e.to_string()))?;
        let mut data = Vec::with_capacity(file.size() as usize);
        file.read_to_end(&mut data)
            .map_err(|e| Error::malformed(format, format!("{}: {e}", file.name())))?;
        entries.push((file.name().to_string(), data));
    }
    Ok(entries)
}

/// `ppt/slides/_rels/slide1.xml.rels` -> `ppt/slides/slide1.xml`.
fn source_of_rels(rels_name: &str) -> Option<String> {
    let (dir, file) = rels_name.rsplit_once('/')?;
    let file = file.strip_suffix(".rels")?;
    let parent = dir.strip_suffix("_rels")?;
    Some(format!("{parent}{file}"))
}

fn check_well_formed(xml: &[u8]) -> Result<()> {
    let mut reader = Reader::from_reader(xml);
    let mut buf = Vec::new();
    let mut depth: usize = 0;
    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(_) => depth += 1,
            Event::End(_) => depth = depth.saturating_sub(1),
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    if depth != 0 {
        return Err(Error::Invariant("unclosed element".into()));
    }
    Ok(())
}

/// (default extensions, override part name -> content type)
fn parse_content_types(xml: &[u8]) -> Result<(HashSet<String>, HashMap<String, String>)> {
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();
    let mut defaults = HashSet::new();
    let mut overrides = HashMap::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Empty(e) | Event::Start(e) => {
                let mut name = None;
                let mut content_type = None;
                for attr in e.attributes().flatten() {
                    let value = String::from_utf8_lossy(&attr.value).into_owned();
                    match attr.key.as_ref() {
                        b"Extension" | b"PartName" => name = Some(value),
                        b"ContentType" => content_type = Some(value),
                        _ => {}
                    }
                }
                match (e.name().as_ref(), name, content_type) {
                    (b"Default", Some(ext), Some(_)) => {
                        defaults.insert(ext.to_ascii_lowercase());
                    }
                    (b"Override", Some(part), Some(ct)) => {
                        overrides.insert(part.trim_start_matches('/').to_string(), ct);
                    }
                    _ => {}
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    Ok((defaults, overrides))
}

fn parse_relationship_targets(xml: &[u8]) -> Result<Vec<String>> {
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();
    let mut targets = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Empty(e) | Event::Start(e) if e.name().as_ref() == b"Relationship" => {
                let external = e
                    .attributes()
                    .flatten()
                    .any(|a| a.key.as_ref() == b"TargetMode" && a.value.as_ref() == b"External");
                if !external {
                    for attr in e.attributes().flatten() {
                        if attr.key.as_ref() == b"Target" {
                            targets.push(String::from_utf8_lossy(&attr.value).into_owned());
                        }
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    Ok(targets)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use zip::ZipWriter;
    use zip::write::SimpleFileOptions;

    use super::*;

    fn archive(entries: &[(&str, &str)]) -> Vec<u8> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        for (name, body) in entries {
            zip.start_file(*name, SimpleFileOptions::default()).unwrap();
            zip.write_all(body.as_bytes()).unwrap();
        }
        zip.finish().unwrap().into_inner()
    }

    const TYPES: &str = r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/></Types>"#;

    #[test]
    fn test_source_of_rels() {
        assert_eq!(
            source_of_rels("ppt/slides/_rels/slide1.xml.rels").as_deref(),
            Some("ppt/slides/slide1.xml")
        );
        assert_eq!(source_of_rels("word/document.xml"), None);
    }

    #[test]
    fn test_missing_target_rejected() {
        let rels = r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="t" Target="word/document.xml"/></Relationships>"#;
        let bytes = archive(&[(CONTENT_TYPES_PART, TYPES), ("_rels/.rels", rels)]);
        let err = opc(&bytes).unwrap_err();
        assert!(err.to_string().contains("word/document.xml"), "{err}");
    }

    #[test]
    fn test_untyped_part_rejected() {
        let rels = r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="t" Target="media/a.bin"/></Relationships>"#;
        let bytes = archive(&[
            (CONTENT_TYPES_PART, TYPES),
            ("_rels/.rels", rels),
            ("media/a.bin", "x"),
        ]);
        let err = opc(&bytes).unwrap_err();
        assert!(err.to_string().contains("no content type"), "{err}");
    }

    #[test]
    fn test_malformed_xml_rejected() {
        let bytes = archive(&[(CONTENT_TYPES_PART, "<Types><Default></Types>")]);
        assert!(opc(&bytes).is_err());
    }

    #[test]
    fn test_zip_lists_entries() {
        let bytes = archive(&[("a.txt", "one"), ("b.txt", "two")]);
        assert_eq!(zip(&bytes).unwrap(), vec!["a.txt", "b.txt"]);
    }
}
