//! Built-in signature table.
//!
//! Covers the formats the media pipeline handles plus the common
//! containers and markup that show up next to them. Container formats
//! are refined by child rules (Ogg by codec identification header, ISO
//! media by brand, RIFF by form type, ZIP by embedded `mimetype` member).

use super::{SignatureDatabase, SignatureRule};

/// Priority for markup rules, which are weaker evidence than binary headers
const TEXT_PRIORITY: u8 = 40;
/// Priority for two-byte signatures prone to false positives
const WEAK_PRIORITY: u8 = 30;

/// Leading bytes tolerated before a markup tag (BOM, whitespace, comments)
const MARKUP_SLACK: usize = 64;

/// The compiled-in table.
pub fn database() -> SignatureDatabase {
    SignatureDatabase::new(rules())
}

fn typed(offset: i64, value: &[u8], mime_type: &str) -> SignatureRule {
    SignatureRule::new(offset, value.to_vec()).with_type(mime_type)
}

/// ASCII tag matched regardless of letter case.
///
/// Letters are stored upper-cased and compared under `0xDF`, which clears
/// the lower-case bit; every other byte is compared exactly.
fn caseless(offset: i64, tag: &str) -> SignatureRule {
    let value: Vec<u8> = tag.bytes().map(|b| b.to_ascii_uppercase()).collect();
    let mask: Vec<u8> = tag
        .bytes()
        .map(|b| if b.is_ascii_alphabetic() { 0xDF } else { 0xFF })
        .collect();
    SignatureRule::new(offset, value).with_mask(mask)
}

fn rules() -> Vec<SignatureRule> {
    vec![
        typed(0, b"\x89PNG\r\n\x1a\n", "image/png"),
        SignatureRule::new(0, b"GIF8".to_vec())
            .with_type("image/gif")
            .requiring_child()
            .child(SignatureRule::new(4, b"7a".to_vec()))
            .child(SignatureRule::new(4, b"9a".to_vec())),
        typed(0, b"\xff\xd8\xff", "image/jpeg"),
        typed(0, b"%PDF-", "application/pdf"),
        ogg(),
        typed(0, b"\x1a\x45\xdf\xa3", "video/x-matroska")
            .child(typed(4, b"webm", "video/webm").with_range(MARKUP_SLACK))
            .child(typed(4, b"matroska", "video/x-matroska").with_range(MARKUP_SLACK)),
        iso_media(),
        SignatureRule::new(0, b"RIFF".to_vec())
            .requiring_child()
            .child(typed(8, b"WAVE", "audio/x-wav"))
            .child(typed(8, b"AVI ", "video/x-msvideo"))
            .child(typed(8, b"WEBP", "image/webp")),
        typed(0, b"II*\0", "image/tiff"),
        typed(0, b"MM\0*", "image/tiff"),
        typed(0, b"8BPS", "image/vnd.adobe.photoshop"),
        typed(0, b"fLaC", "audio/flac"),
        typed(0, b"ID3", "audio/mpeg"),
        typed(0, b"\xff\xfb", "audio/mpeg"),
        zip(),
        typed(0, b"\x1f\x8b", "application/gzip"),
        typed(0, b"BZh", "application/x-bzip2"),
        typed(0, b"7z\xbc\xaf\x27\x1c", "application/x-7z-compressed"),
        typed(0, b"\x7fELF", "application/x-executable"),
        typed(0, b"%!PS", "application/postscript"),
        typed(0, b"{\\rtf", "text/rtf"),
        typed(0, b"BM", "image/bmp").with_priority(WEAK_PRIORITY),
        typed(0, b"<?xml", "text/xml")
            .with_range(4)
            .with_priority(TEXT_PRIORITY)
            .child(caseless(5, "<svg").with_range(256).with_type("image/svg+xml"))
            .child(caseless(5, "<html").with_range(256).with_type("application/xhtml+xml")),
        html(),
        caseless(0, "<svg")
            .with_range(MARKUP_SLACK)
            .with_type("image/svg+xml")
            .with_priority(TEXT_PRIORITY),
    ]
}

/// Ogg pages carry the first packet at byte 28 when the segment table has
/// one entry, which is always the case for the identification header page.
fn ogg() -> SignatureRule {
    SignatureRule::new(0, b"OggS".to_vec())
        .with_type("application/ogg")
        .child(typed(28, b"\x80theora", "video/ogg"))
        .child(typed(28, b"\x01vorbis", "audio/ogg"))
        .child(typed(28, b"OpusHead", "audio/ogg"))
        .child(typed(28, b"Speex   ", "audio/ogg"))
        .child(typed(28, b"\x7fFLAC", "audio/ogg"))
}

/// ISO base media files: `ftyp` box at 4, major brand at 8.
fn iso_media() -> SignatureRule {
    let mut rule = SignatureRule::new(4, b"ftyp".to_vec()).with_type("video/mp4");
    let brands = [
        ("qt  ", "video/quicktime"),
        ("M4A ", "audio/mp4"),
        ("M4B ", "audio/mp4"),
        ("3gp", "video/3gpp"),
        ("3g2", "video/3gpp2"),
        ("heic", "image/heic"),
        ("avif", "image/avif"),
        ("crx ", "image/x-canon-cr3"),
    ];
    for (brand, mime_type) in brands {
        rule = rule.child(typed(8, brand.as_bytes(), mime_type));
    }
    rule
}

/// ZIP archives that start with an uncompressed `mimetype` member declare
/// their own type (OpenDocument, EPUB).
fn zip() -> SignatureRule {
    let mut declared = SignatureRule::new(30, b"mimetype".to_vec()).requiring_child();
    for mime_type in [
        "application/vnd.oasis.opendocument.text",
        "application/vnd.oasis.opendocument.spreadsheet",
        "application/vnd.oasis.opendocument.presentation",
        "application/vnd.oasis.opendocument.graphics",
        "application/epub+zip",
    ] {
        declared = declared.child(typed(38, mime_type.as_bytes(), mime_type));
    }
    typed(0, b"PK\x03\x04", "application/zip").child(declared)
}

fn html() -> SignatureRule {
    let tags = ["<!DOCTYPE HTML", "<html", "<head", "<body", "<title", "<!--"];
    let mut rule = SignatureRule::new(0, b"<".to_vec())
        .with_range(MARKUP_SLACK)
        .with_type("text/html")
        .with_priority(TEXT_PRIORITY)
        .requiring_child();
    for tag in tags {
        rule = rule.child(caseless(0, tag).with_range(MARKUP_SLACK));
    }
    rule
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::magic::PREFIX_LIMIT;

    fn lookup(bytes: &[u8]) -> Option<String> {
        database().lookup(bytes, PREFIX_LIMIT).map(str::to_string)
    }

    fn ogg_page(packet: &[u8]) -> Vec<u8> {
        let mut page = b"OggS\0\x02".to_vec();
        page.resize(26, 0);
        page.push(1);
        page.push(packet.len() as u8);
        page.extend_from_slice(packet);
        page
    }

    #[test]
    fn test_images() {
        assert_eq!(lookup(b"GIF89a\x01\0\x01\0").as_deref(), Some("image/gif"));
        assert_eq!(lookup(b"GIF87a").as_deref(), Some("image/gif"));
        assert_eq!(lookup(b"GIF8xx"), None);
        assert_eq!(lookup(b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR").as_deref(), Some("image/png"));
        assert_eq!(lookup(b"\xff\xd8\xff\xe0\0\x10JFIF").as_deref(), Some("image/jpeg"));
        assert_eq!(lookup(b"RIFF\x24\0\0\0WEBPVP8 ").as_deref(), Some("image/webp"));
        assert_eq!(lookup(b"BM\x36\0").as_deref(), Some("image/bmp"));
    }

    #[test]
    fn test_ogg_codecs() {
        assert_eq!(lookup(&ogg_page(b"\x80theora\x03\x02")).as_deref(), Some("video/ogg"));
        assert_eq!(lookup(&ogg_page(b"\x01vorbis\0\0")).as_deref(), Some("audio/ogg"));
        assert_eq!(lookup(&ogg_page(b"OpusHead\x01")).as_deref(), Some("audio/ogg"));
        assert_eq!(lookup(&ogg_page(b"unknown!")).as_deref(), Some("application/ogg"));
    }

    #[test]
    fn test_iso_media_brands() {
        assert_eq!(lookup(b"\0\0\0\x18ftypmp42\0\0\0\0").as_deref(), Some("video/mp4"));
        assert_eq!(lookup(b"\0\0\0\x14ftypqt  \0\0\0\0").as_deref(), Some("video/quicktime"));
        assert_eq!(lookup(b"\0\0\0\x20ftypM4A \0\0\0\0").as_deref(), Some("audio/mp4"));
    }

    #[test]
    fn test_webm() {
        let header = b"\x1a\x45\xdf\xa3\x9f\x42\x86\x81\x01\x42\xf7\x81\x01\x42\x82\x84webm";
        assert_eq!(lookup(header).as_deref(), Some("video/webm"));
    }

    #[test]
    fn test_zip_declared_type() {
        let mut odt = b"PK\x03\x04".to_vec();
        odt.resize(30, 0);
        odt.extend_from_slice(b"mimetypeapplication/vnd.oasis.opendocument.text");
        assert_eq!(
            lookup(&odt).as_deref(),
            Some("application/vnd.oasis.opendocument.text")
        );

        let mut plain = b"PK\x03\x04".to_vec();
        plain.resize(30, 0);
        plain.extend_from_slice(b"docs/readme.txt");
        assert_eq!(lookup(&plain).as_deref(), Some("application/zip"));
    }

    #[test]
    fn test_markup() {
        assert_eq!(lookup(b"<!DOCTYPE html>\n<html>").as_deref(), Some("text/html"));
        assert_eq!(lookup(b"\n\n  <HTML><BODY>").as_deref(), Some("text/html"));
        assert_eq!(
            lookup(b"<?xml version=\"1.0\"?>\n<svg xmlns=\"http://www.w3.org/2000/svg\"/>")
                .as_deref(),
            Some("image/svg+xml")
        );
        assert_eq!(lookup(b"<?xml version=\"1.0\"?><feed/>").as_deref(), Some("text/xml"));
        assert_eq!(lookup(b"<notatag>"), None);
        assert_eq!(lookup(b"plain words"), None);
    }

    #[test]
    fn test_binary_headers_beat_markup() {
        // A PDF whose first object happens to contain markup-looking bytes
        assert_eq!(lookup(b"%PDF-1.4\n<html>").as_deref(), Some("application/pdf"));
    }
}
