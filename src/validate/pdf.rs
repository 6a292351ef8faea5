use memchr::memmem;

use crate::error::{Error, Result};
use crate::format::Format;

/// Cross-reference summary of a validated PDF.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfInfo {
    pub version: String,
    /// Trailer `/Size`: number of xref entries including the free object 0.
    pub size: usize,
    /// Object number named by trailer `/Root`.
    pub root: u32,
    /// Byte offset of each in-use object, indexed by object number - 1.
    pub offsets: Vec<usize>,
    pub startxref: usize,
}

/// Check the classic cross-reference table against the bytes it indexes.
pub fn pdf(bytes: &[u8]) -> Result<PdfInfo> {
    let bad = |reason: String| Error::malformed(Format::Pdf, reason);

    if !bytes.starts_with(b"%PDF-") {
        return Err(bad("missing %PDF- header".into()));
    }
    let version = line_at(bytes, 5).trim().to_string();

    let sx = memmem::rfind(bytes, b"startxref").ok_or_else(|| bad("no startxref".into()))?;
    let startxref: usize = line_at(bytes, next_line(bytes, sx))
        .trim()
        .parse()
        .map_err(|_| bad("startxref is not a number".into()))?;
    if !bytes[startxref.min(bytes.len())..].starts_with(b"xref") {
        return Err(bad(format!("startxref {startxref} does not point at xref")));
    }

    // Single subsection "0 N"
    let mut pos = next_line(bytes, startxref);
    let subsection = line_at(bytes, pos);
    let mut fields = subsection.split_whitespace();
    let first: usize = parse_field(fields.next()).ok_or_else(|| bad("bad xref subsection".into()))?;
    let count: usize = parse_field(fields.next()).ok_or_else(|| bad("bad xref subsection".into()))?;
    if first != 0 {
        return Err(bad(format!("xref starts at object {first}")));
    }
    pos = next_line(bytes, pos);

    let mut offsets = Vec::with_capacity(count.min(bytes.len() / 20));
    for n in 0..count {
        let entry = bytes
            .get(pos..pos + 20)
            .ok_or_else(|| bad(format!("truncated xref entry {n}")))?;
        let offset: usize = std::str::from_utf8(&entry[..10])
            .ok()
            .and_then(|digits| digits.parse().ok())
            .ok_or_else(|| bad(format!("xref entry {n} offset")))?;
        match entry[17] {
            b'f' if n == 0 => {}
            b'n' if n > 0 => {
                let header = format!("{n} 0 obj");
                if !bytes[offset.min(bytes.len())..].starts_with(header.as_bytes()) {
                    return Err(bad(format!(
                        "xref offset {offset} for object {n} does not point at its header"
                    )));
                }
                offsets.push(offset);
            }
            kind => {
                return Err(bad(format!(
                    "unexpected xref entry type {:?} for object {n}",
                    char::from(kind)
                )));
            }
        }
        pos += 20;
    }

    let trailer = bytes
        .get(pos..sx)
        .ok_or_else(|| bad("trailer does not precede startxref".into()))?;
    let size = dict_value(trailer, b"/Size").ok_or_else(|| bad("trailer lacks /Size".into()))?;
    if size != count {
        return Err(bad(format!("trailer /Size {size} but xref has {count} entries")));
    }
    let root = dict_value(trailer, b"/Root").ok_or_else(|| bad("trailer lacks /Root".into()))?;
    if root == 0 || root >= count {
        return Err(bad(format!("/Root {root} is not an in-use object")));
    }

    Ok(PdfInfo {
        version,
        size,
        root: root as u32,
        offsets,
        startxref,
    })
}

/// Text from `at` up to the next line ending.
fn line_at(bytes: &[u8], at: usize) -> String {
    let rest = &bytes[at.min(bytes.len())..];
    let end = memchr::memchr2(b'\n', b'\r', rest).unwrap_or(rest.len());
    String::from_utf8_lossy(&rest[..end]).into_owned()
}

/// Start of the line after the one containing `at`.
fn next_line(bytes: &[u8], at: usize) -> usize {
    let rest = &bytes[at.min(bytes.len())..];
    match memchr::memchr(b'\n', rest) {
        Some(i) => at + i + 1,
        None => bytes.len(),
    }
}

fn parse_field(field: Option<&str>) -> Option<usize> {
    field?.parse().ok()
}

/// The integer following `key` in a dictionary.
fn dict_value(dict: &[u8], key: &[u8]) -> Option<usize> {
    let at = memmem::find(dict, key)? + key.len();
    let rest = String::from_utf8_lossy(&dict[at..]);
    parse_field(rest.split_whitespace().next())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode::PdfEncoder;

    #[test]
    fn test_accepts_encoder_output() {
        let bytes = PdfEncoder::new()
            .to_bytes("Lorem (ipsum)", "dolor sit amet \\ consectetur")
            .unwrap();
        let info = pdf(&bytes).unwrap();
        assert_eq!(info.version, "1.4");
        assert_eq!(info.size, 6);
        assert_eq!(info.root, 1);
        assert_eq!(info.offsets.len(), 5);
    }

    #[test]
    fn test_detects_shifted_offsets() {
        let bytes = PdfEncoder::new().to_bytes("Title", "body").unwrap();
        // Insert a byte before the first object so every offset is stale
        let header_end = memmem::find(&bytes, b"1 0 obj").unwrap();
        let mut shifted = bytes[..header_end].to_vec();
        shifted.push(b'\n');
        shifted.extend_from_slice(&bytes[header_end..]);
        assert!(pdf(&shifted).is_err());
    }

    #[test]
    fn test_non_ascii_xref_entry_is_rejected() {
        let bytes = "%PDF-1.4\nxref\n0 1\n000000000\u{e9} 65535 f \ntrailer << /Size 1 /Root 0 >>\nstartxref\n9\n%%EOF\n";
        assert_eq!(&bytes.as_bytes()[9..13], b"xref");
        let err = pdf(bytes.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("xref entry 0"), "{err}");
    }

    #[test]
    fn test_xref_after_startxref_is_rejected() {
        let head = "%PDF-1.4\nstartxref\n";
        let tail = "xref\n0 1\n0000000000 65535 f \n";
        // Offset line is two digits plus "\n%%EOF\n"
        let xref_at = head.len() + 3 + 6;
        let bytes = format!("{head}{xref_at}\n%%EOF\n{tail}");
        assert_eq!(&bytes.as_bytes()[xref_at..xref_at + 4], b"xref");
        let err = pdf(bytes.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("trailer"), "{err}");
    }

    #[test]
    fn test_huge_xref_count_is_rejected() {
        let bytes = b"%PDF-1.4\nxref\n0 99999999999999\n0000000000 65535 f \nstartxref\n9\n";
        assert!(pdf(bytes).is_err());
    }

    #[test]
    fn test_dict_value() {
        assert_eq!(dict_value(b"<< /Size 6 /Root 1 0 R >>", b"/Size"), Some(6));
        assert_eq!(dict_value(b"<< /Size 6 /Root 1 0 R >>", b"/Root"), Some(1));
        assert_eq!(dict_value(b"<< >>", b"/Root"), None);
    }
}
