//! freedesktop.org shared-mime-info glob dialect.
//!
//! Accepts both the weighted `globs2` layout and the older `globs` one:
//!
//! ```text
//! # globs2
//! 50:text/css:*.css
//! 50:text/x-csrc:*.c:cs
//! 10:text/x-readme:README*
//! 50:image/x-foo:__NOGLOBS__
//!
//! # globs
//! text/css:*.css
//! ```
//!
//! Patterns are case-insensitive unless the flag list contains `cs`. The
//! special pattern `__NOGLOBS__` discards everything declared earlier for
//! its type.

use super::{GlobDatabaseBuilder, GlobEntry, DEFAULT_WEIGHT};
use crate::mime::is_valid_type;

/// Highest weight the format allows
pub const MAX_WEIGHT: u32 = 100;

const NO_GLOBS: &str = "__NOGLOBS__";
const CASE_SENSITIVE_FLAG: &str = "cs";

/// Parse one line into `builder`. Returns the reason when the line is unusable.
pub(crate) fn parse_line(line: &str, builder: &mut GlobDatabaseBuilder) -> Result<(), String> {
    if line.trim().is_empty() || line.starts_with('#') {
        return Ok(());
    }

    let fields: Vec<&str> = line.split(':').collect();
    let (weight, rest) = match fields[0].trim().parse::<u32>() {
        Ok(weight) => (weight, &fields[1..]),
        Err(_) => (DEFAULT_WEIGHT, &fields[..]),
    };
    if weight > MAX_WEIGHT {
        return Err(format!("weight {} exceeds {}", weight, MAX_WEIGHT));
    }

    let (mime_type, pattern) = match rest {
        [mime_type, pattern, ..] => (mime_type.trim(), *pattern),
        _ => return Err("expected type and pattern fields".to_string()),
    };
    if !is_valid_type(mime_type) {
        return Err(format!("invalid media type '{}'", mime_type));
    }
    if pattern.is_empty() {
        return Err("empty pattern".to_string());
    }

    if pattern == NO_GLOBS {
        builder.discard_type(mime_type);
        return Ok(());
    }

    let case_sensitive = rest
        .get(2)
        .map(|flags| flags.split(',').any(|flag| flag.trim() == CASE_SENSITIVE_FLAG))
        .unwrap_or(false);

    builder
        .add(GlobEntry::new(pattern, mime_type, weight, case_sensitive))
        .map(|_| ())
        .map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use crate::glob::{Dialect, GlobDatabase};

    fn parse(text: &str) -> GlobDatabase {
        GlobDatabase::parse_str(text, Dialect::Freedesktop).unwrap()
    }

    #[test]
    fn test_globs2_fields() {
        let db = parse("# comment\n80:text/x-csrc:*.c:cs\n50:text/css:*.css\n");
        assert_eq!(db.len(), 2);
        let csrc = &db.entries()[0];
        assert_eq!(csrc.weight, 80);
        assert!(csrc.case_sensitive);
        assert!(!db.entries()[1].case_sensitive);
    }

    #[test]
    fn test_legacy_globs_layout() {
        let db = parse("text/css:*.css\nimage/png:*.png\n");
        assert_eq!(db.len(), 2);
        assert_eq!(db.entries()[0].weight, 50);
        assert_eq!(db.analyze("STYLE.CSS"), vec!["text/css"]);
    }

    #[test]
    fn test_malformed_lines() {
        let db = parse(
            "\
50:text/css:*.css
150:text/x-heavy:*.heavy
50:nonsense:*.bad
50:text/plain
50:text/x-broken:*.[x
60:image/png:*.png
",
        );
        assert_eq!(db.len(), 2);
        assert_eq!(db.skipped(), 4);
        assert_eq!(db.analyze("a.png"), vec!["image/png"]);
    }

    #[test]
    fn test_noglobs_discards_earlier_entries() {
        let db = parse(
            "\
50:image/x-old:*.old
50:image/x-old:*.ancient
50:text/plain:*.txt
50:image/x-old:__NOGLOBS__
50:image/x-old:*.new
",
        );
        assert!(db.analyze("a.old").is_empty());
        assert_eq!(db.analyze("a.new"), vec!["image/x-old"]);
        assert_eq!(db.analyze("a.txt"), vec!["text/plain"]);
    }

    #[test]
    fn test_unknown_flags_ignored() {
        let db = parse("50:text/x-a:*.aa:foo,cs\n50:text/x-b:*.bb:foo\n");
        assert!(db.entries()[0].case_sensitive);
        assert!(!db.entries()[1].case_sensitive);
    }
}
