//! Resolved type values and MIME string normalization.
//!
//! Every answer the engine gives is a [`ResolvedType`]: a lower-cased
//! `type/subtype` plus a charset. Its canonical string form is
//! `"<type>/<subtype>; charset=<charset>"`.
//!
//! ```
//! use mimetype::mime::{simplify, ResolvedType, Strategy};
//!
//! let resolved = ResolvedType::new("Image/GIF", "binary", Strategy::Magic);
//! assert_eq!(resolved.to_string(), "image/gif; charset=binary");
//! assert_eq!(simplify("Text/HTML; charset=us-ascii"), "text/html");
//! ```

use serde::Serialize;
use std::fmt;

/// Type reported when neither strategy produces a candidate
pub const DEFAULT_TYPE: &str = "application/octet-stream";

/// Type reported for unclaimed content that reads as text
pub const TEXT_PLAIN: &str = "text/plain";

/// Charset sentinel for binary content and for answers that carry no
/// encoding information (non-textual glob types and default resolutions)
pub const BINARY: &str = "binary";

/// Which strategy produced a resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Content signature matching
    Magic,
    /// Filename pattern matching
    Glob,
    /// Nothing matched; the default type was used
    Default,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::Magic => write!(f, "magic"),
            Strategy::Glob => write!(f, "glob"),
            Strategy::Default => write!(f, "default"),
        }
    }
}

/// A normalized type resolution
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedType {
    mime_type: String,
    charset: String,
    strategy: Strategy,
}

impl ResolvedType {
    /// Build a resolution, normalizing both the type and the charset.
    pub fn new(mime_type: &str, charset: &str, strategy: Strategy) -> Self {
        Self {
            mime_type: simplify(mime_type),
            charset: charset.trim().to_ascii_lowercase(),
            strategy,
        }
    }

    /// Resolution for content nothing recognized.
    pub fn unknown() -> Self {
        Self::new(DEFAULT_TYPE, BINARY, Strategy::Default)
    }

    /// The bare `type/subtype`
    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// The charset parameter (`binary` when not applicable)
    pub fn charset(&self) -> &str {
        &self.charset
    }

    /// The strategy that produced this answer
    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    /// Coarse category: the part of the type before the `/`.
    pub fn name(&self) -> &str {
        media_name(&self.mime_type)
    }
}

impl fmt::Display for ResolvedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}; charset={}", self.mime_type, self.charset)
    }
}

/// Lower-case a type string and strip any parameters and whitespace.
pub fn simplify(mime_type: &str) -> String {
    let bare = match mime_type.find(';') {
        Some(pos) => &mime_type[..pos],
        None => mime_type,
    };
    bare.trim().to_ascii_lowercase()
}

/// The top-level media name of a type (`video/mp4` -> `video`).
pub fn media_name(mime_type: &str) -> &str {
    match mime_type.find('/') {
        Some(pos) => &mime_type[..pos],
        None => mime_type,
    }
}

/// Checks that a token looks like `type/subtype` with RFC 6838 characters.
pub fn is_valid_type(token: &str) -> bool {
    let Some((top, sub)) = token.split_once('/') else {
        return false;
    };
    let restricted = |part: &str| {
        !part.is_empty()
            && part.bytes().all(|b| {
                b.is_ascii_alphanumeric()
                    || matches!(b, b'!' | b'#' | b'$' | b'&' | b'-' | b'^' | b'_' | b'.' | b'+')
            })
    };
    restricted(top) && restricted(sub)
}

/// Whether content of this type is text for which an encoding is guessed.
pub fn is_textual(mime_type: &str) -> bool {
    mime_type.starts_with("text/")
        || mime_type.ends_with("+xml")
        || matches!(
            mime_type,
            "application/xml"
                | "application/json"
                | "application/javascript"
                | "application/x-javascript"
                | "application/postscript"
                | "application/x-sh"
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_form() {
        let resolved = ResolvedType::new("VIDEO/Ogg", "Binary", Strategy::Magic);
        assert_eq!(resolved.mime_type(), "video/ogg");
        assert_eq!(resolved.charset(), "binary");
        assert_eq!(resolved.to_string(), "video/ogg; charset=binary");
        assert_eq!(resolved.name(), "video");
    }

    #[test]
    fn test_unknown() {
        let resolved = ResolvedType::unknown();
        assert_eq!(resolved.to_string(), "application/octet-stream; charset=binary");
        assert_eq!(resolved.strategy(), Strategy::Default);
    }

    #[test]
    fn test_simplify() {
        assert_eq!(simplify("image/png"), "image/png");
        assert_eq!(simplify(" Image/PNG ; charset=binary"), "image/png");
        assert_eq!(simplify("text/plain;format=flowed"), "text/plain");
    }

    #[test]
    fn test_valid_type() {
        assert!(is_valid_type("application/vnd.oasis.opendocument.text"));
        assert!(is_valid_type("image/svg+xml"));
        assert!(!is_valid_type("css"));
        assert!(!is_valid_type("text/"));
        assert!(!is_valid_type("/plain"));
        assert!(!is_valid_type("text/pla in"));
        assert!(!is_valid_type("a/b/c"));
    }

    #[test]
    fn test_textual() {
        assert!(is_textual("text/html"));
        assert!(is_textual("image/svg+xml"));
        assert!(is_textual("application/xml"));
        assert!(!is_textual("image/png"));
        assert!(!is_textual("application/pdf"));
    }
}
