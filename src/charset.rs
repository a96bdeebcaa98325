//! Best-effort character encoding classification of a content prefix.
//!
//! The rules, in order:
//!
//! 1. A byte-order mark decides outright (`utf-8`, `utf-16le`, `utf-16be`).
//! 2. A prefix made only of printable 7-bit bytes and common controls is `us-ascii`.
//! 3. A prefix that decodes as UTF-8 (a character cut off by the end of the
//!    prefix is tolerated) and contains no control bytes is `utf-8`.
//! 4. Anything else is `binary`.

use crate::mime::BINARY;

/// UTF-8 byte-order mark
const BOM_UTF8: &[u8] = &[0xEF, 0xBB, 0xBF];
/// UTF-16 little-endian byte-order mark
const BOM_UTF16LE: &[u8] = &[0xFF, 0xFE];
/// UTF-16 big-endian byte-order mark
const BOM_UTF16BE: &[u8] = &[0xFE, 0xFF];

/// Encoding reported for strictly 7-bit text
pub const US_ASCII: &str = "us-ascii";
/// Encoding reported for valid non-ASCII UTF-8 text
pub const UTF_8: &str = "utf-8";

/// Classify the encoding of `prefix`.
///
/// ```
/// use mimetype::charset::detect;
///
/// assert_eq!(detect(b"<html></html>\n"), "us-ascii");
/// assert_eq!(detect("caf\u{e9}".as_bytes()), "utf-8");
/// assert_eq!(detect(&[0x00, 0x01, 0x02]), "binary");
/// ```
pub fn detect(prefix: &[u8]) -> &'static str {
    if prefix.starts_with(BOM_UTF8) {
        return UTF_8;
    }
    if prefix.starts_with(BOM_UTF16LE) {
        return "utf-16le";
    }
    if prefix.starts_with(BOM_UTF16BE) {
        return "utf-16be";
    }

    // NUL never appears in text; memchr makes the common binary case cheap
    if memchr::memchr(0, prefix).is_some() {
        return BINARY;
    }

    if prefix.iter().all(|&b| is_text_byte(b)) {
        return US_ASCII;
    }

    if is_utf8_prefix(prefix) && prefix.iter().all(|&b| b >= 0x80 || is_text_byte(b)) {
        return UTF_8;
    }

    BINARY
}

/// Printable ASCII plus BEL, BS, TAB, LF, VT, FF, CR and ESC.
fn is_text_byte(b: u8) -> bool {
    matches!(b, 0x07..=0x0D | 0x1B | 0x20..=0x7E)
}

/// UTF-8 validity, tolerating a sequence truncated by the end of the buffer.
fn is_utf8_prefix(bytes: &[u8]) -> bool {
    match std::str::from_utf8(bytes) {
        Ok(_) => true,
        Err(e) => e.error_len().is_none(),
    }
}
