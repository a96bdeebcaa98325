//! Filename glob databases and the matcher over them.
//!
//! A [`GlobDatabase`] is an ordered list of [`GlobEntry`] values parsed
//! from one of two layouts ([`Dialect`]):
//!
//! - **Apache** (`mime.types`): `type ext1 ext2 ...`, one type per line.
//! - **Freedesktop** (`globs2` / `globs`): `[weight:]type:pattern[:flags]`.
//!
//! Lookup precedence, highest first:
//!
//! 1. whole-filename literals (`Makefile`)
//! 2. suffix patterns (`*.tar.gz`), longest matched suffix first
//! 3. any other glob, most literal characters first
//!
//! Within the first two tiers a case-sensitive hit shadows case-folded
//! hits of the same length, so `*.c:cs` beats a folded `*.C` for `hello.c`.
//! Only the best tier that matched is returned. Within it, candidates
//! are ordered by weight (descending) and then by declaration order.
//!
//! ```
//! use mimetype::glob::{Dialect, GlobDatabase};
//!
//! let db = GlobDatabase::parse_str("text/css css\nimage/gif gif\n", Dialect::Apache)?;
//! assert_eq!(db.analyze("file.css"), vec!["text/css"]);
//! assert!(db.analyze("file.unknown").is_empty());
//! # Ok::<(), mimetype::MimeError>(())
//! ```

pub mod apache;
pub mod freedesktop;
pub mod pattern;

use crate::error::{MalformedEntry, MimeError, Result};
use crate::file_reader;
use crate::mime::simplify;
use pattern::{MatchMode, Pattern, PatternKind};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::{BufRead, ErrorKind};
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info, warn};

/// Weight given to entries that do not declare one
pub const DEFAULT_WEIGHT: u32 = 50;

/// On-disk layout of a glob database
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// Apache `mime.types`
    #[serde(alias = "Apache")]
    Apache,
    /// freedesktop.org shared-mime-info `globs2` / `globs`
    #[serde(alias = "Freedesktop")]
    Freedesktop,
}

impl FromStr for Dialect {
    type Err = MimeError;

    fn from_str(s: &str) -> Result<Self> {
        if s.eq_ignore_ascii_case("apache") {
            Ok(Dialect::Apache)
        } else if s.eq_ignore_ascii_case("freedesktop") {
            Ok(Dialect::Freedesktop)
        } else {
            Err(MimeError::InvalidConfig(format!(
                "Unknown glob dialect '{}' (expected apache or freedesktop)",
                s
            )))
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dialect::Apache => write!(f, "apache"),
            Dialect::Freedesktop => write!(f, "freedesktop"),
        }
    }
}

/// One pattern-to-type mapping
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GlobEntry {
    /// Filename pattern (`*.css`, `Makefile`, `*.[ch]`)
    pub pattern: String,
    /// Normalized `type/subtype`
    pub mime_type: String,
    /// Priority among equally specific matches
    pub weight: u32,
    /// Whether the pattern is compared case-sensitively
    pub case_sensitive: bool,
}

impl GlobEntry {
    /// Create an entry; the type is normalized.
    pub fn new(pattern: &str, mime_type: &str, weight: u32, case_sensitive: bool) -> Self {
        Self {
            pattern: pattern.to_string(),
            mime_type: simplify(mime_type),
            weight,
            case_sensitive,
        }
    }

    fn mode(&self) -> MatchMode {
        if self.case_sensitive {
            MatchMode::CaseSensitive
        } else {
            MatchMode::CaseInsensitive
        }
    }
}

/// Accumulates entries during a parse.
#[derive(Debug)]
pub struct GlobDatabaseBuilder {
    dialect: Dialect,
    items: Vec<(GlobEntry, Pattern)>,
    skipped: usize,
}

impl GlobDatabaseBuilder {
    /// Start an empty database of the given dialect.
    pub fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            items: Vec::new(),
            skipped: 0,
        }
    }

    /// Append an entry.
    ///
    /// # Errors
    ///
    /// Returns [`MimeError::InvalidPattern`] when the pattern does not
    /// compile; the builder is left unchanged.
    pub fn add(&mut self, entry: GlobEntry) -> Result<&mut Self> {
        let pattern = Pattern::new(&entry.pattern, entry.mode())?;
        self.items.push((entry, pattern));
        Ok(self)
    }

    /// Forget every entry declared so far for `mime_type`.
    pub fn discard_type(&mut self, mime_type: &str) -> &mut Self {
        let mime_type = simplify(mime_type);
        self.items.retain(|(entry, _)| entry.mime_type != mime_type);
        self
    }

    /// Record a line that could not be used.
    pub(crate) fn reject(&mut self, entry: MalformedEntry) {
        debug!(dialect = %self.dialect, %entry, "skipping malformed glob entry");
        self.skipped += 1;
    }

    /// Number of entries accepted so far
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// True when nothing has been accepted
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Index the entries and freeze the database.
    pub fn build(self) -> GlobDatabase {
        let (entries, patterns): (Vec<GlobEntry>, Vec<Pattern>) = self.items.into_iter().unzip();
        let mut index = GlobIndex::default();
        for (position, pattern) in patterns.iter().enumerate() {
            let case_sensitive = pattern.mode() == MatchMode::CaseSensitive;
            match pattern.kind() {
                PatternKind::Literal(text) => {
                    let map = if case_sensitive {
                        &mut index.literals
                    } else {
                        &mut index.literals_folded
                    };
                    map.entry(text.clone()).or_default().push(position);
                }
                PatternKind::Suffix(text) => {
                    let map = if case_sensitive {
                        &mut index.suffixes
                    } else {
                        &mut index.suffixes_folded
                    };
                    map.entry(text.clone()).or_default().push(position);
                }
                PatternKind::Glob(_) => index.globs.push(position),
            }
        }

        GlobDatabase {
            dialect: self.dialect,
            entries,
            patterns,
            index,
            skipped: self.skipped,
        }
    }
}

/// Lookup tables built once per database. Keys of the `_folded` maps are
/// lower-cased; positions index into `GlobDatabase::entries`.
#[derive(Debug, Default)]
struct GlobIndex {
    literals: FxHashMap<String, Vec<usize>>,
    literals_folded: FxHashMap<String, Vec<usize>>,
    suffixes: FxHashMap<String, Vec<usize>>,
    suffixes_folded: FxHashMap<String, Vec<usize>>,
    globs: Vec<usize>,
}

/// An immutable, indexed glob database
#[derive(Debug)]
pub struct GlobDatabase {
    dialect: Dialect,
    entries: Vec<GlobEntry>,
    patterns: Vec<Pattern>,
    index: GlobIndex,
    skipped: usize,
}

impl GlobDatabase {
    /// Start building a database by hand.
    pub fn builder(dialect: Dialect) -> GlobDatabaseBuilder {
        GlobDatabaseBuilder::new(dialect)
    }

    /// A database with no entries.
    pub fn empty(dialect: Dialect) -> Self {
        GlobDatabaseBuilder::new(dialect).build()
    }

    /// Load a database file (`.gz` is decompressed transparently).
    ///
    /// # Errors
    ///
    /// Returns [`MimeError::DatabaseUnavailable`] if the file cannot be
    /// opened or read. Malformed lines are skipped, never reported.
    pub fn open<P: AsRef<Path>>(path: P, dialect: Dialect) -> Result<Self> {
        let path = path.as_ref();
        let reader = file_reader::open(path).map_err(|e| {
            MimeError::DatabaseUnavailable(format!("Failed to open {}: {}", path.display(), e))
        })?;
        let db = Self::parse(reader, dialect).map_err(|e| match e {
            MimeError::DatabaseUnavailable(msg) => {
                MimeError::DatabaseUnavailable(format!("{}: {}", path.display(), msg))
            }
            other => other,
        })?;
        info!(
            path = %path.display(),
            %dialect,
            entries = db.len(),
            skipped = db.skipped(),
            "loaded glob database"
        );
        Ok(db)
    }

    /// Load a database file, treating a missing file as an empty database.
    pub fn open_or_empty<P: AsRef<Path>>(path: P, dialect: Dialect) -> Result<Self> {
        let path = path.as_ref();
        match std::fs::metadata(path) {
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!(path = %path.display(), "glob database missing, using empty database");
                Ok(Self::empty(dialect))
            }
            _ => Self::open(path, dialect),
        }
    }

    /// Parse a database from any buffered reader.
    ///
    /// Lines are processed independently: a line that is not UTF-8 or does
    /// not fit the dialect is counted in [`skipped`](Self::skipped) and the
    /// parse continues.
    pub fn parse<R: BufRead>(mut reader: R, dialect: Dialect) -> Result<Self> {
        let mut builder = GlobDatabaseBuilder::new(dialect);
        let mut buf = Vec::new();
        let mut line_no = 0usize;

        loop {
            buf.clear();
            let read = reader.read_until(b'\n', &mut buf).map_err(|e| {
                MimeError::DatabaseUnavailable(format!("read failed after line {}: {}", line_no, e))
            })?;
            if read == 0 {
                break;
            }
            line_no += 1;

            let outcome = match std::str::from_utf8(&buf) {
                Ok(line) => {
                    let line = line.trim_end_matches(['\n', '\r']);
                    match dialect {
                        Dialect::Apache => apache::parse_line(line, &mut builder),
                        Dialect::Freedesktop => freedesktop::parse_line(line, &mut builder),
                    }
                }
                Err(_) => Err("line is not valid UTF-8".to_string()),
            };

            if let Err(reason) = outcome {
                builder.reject(MalformedEntry::new(line_no, reason));
            }
        }

        if builder.skipped > 0 {
            warn!(
                %dialect,
                skipped = builder.skipped,
                kept = builder.len(),
                "glob database had malformed entries"
            );
        }
        Ok(builder.build())
    }

    /// Parse a database held in memory.
    pub fn parse_str(text: &str, dialect: Dialect) -> Result<Self> {
        Self::parse(text.as_bytes(), dialect)
    }

    /// Layout this database was parsed from
    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Entries in declaration order
    pub fn entries(&self) -> &[GlobEntry] {
        &self.entries
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when the database has no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of malformed lines dropped while loading
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Candidate types for `filename`, best first. Empty when nothing matches.
    pub fn analyze(&self, filename: &str) -> Vec<&str> {
        let mut types: Vec<&str> = Vec::new();
        for entry in self.lookup(filename) {
            if !types.contains(&entry.mime_type.as_str()) {
                types.push(&entry.mime_type);
            }
        }
        types
    }

    /// The best matching type for `filename`, if any.
    pub fn first(&self, filename: &str) -> Option<&str> {
        self.lookup(filename)
            .first()
            .map(|entry| entry.mime_type.as_str())
    }

    /// Entries of the best matching tier for `filename`, best first.
    pub fn lookup(&self, filename: &str) -> Vec<&GlobEntry> {
        if filename.is_empty() {
            return Vec::new();
        }
        let folded = filename.to_lowercase();

        let mut tier = self.literal_matches(filename, &folded);
        if tier.is_empty() {
            tier = self.suffix_matches(filename, &folded);
        }
        if tier.is_empty() {
            tier = self.glob_matches(filename, &folded);
        }

        // Weight first, then earliest declaration
        tier.sort_by(|&a, &b| {
            self.entries[b]
                .weight
                .cmp(&self.entries[a].weight)
                .then(a.cmp(&b))
        });
        tier.dedup();
        tier.into_iter().map(|position| &self.entries[position]).collect()
    }

    // Case-sensitive hits outrank case-insensitive ones of the same length
    fn literal_matches(&self, filename: &str, folded: &str) -> Vec<usize> {
        self.index
            .literals
            .get(filename)
            .or_else(|| self.index.literals_folded.get(folded))
            .map(|positions| positions.to_vec())
            .unwrap_or_default()
    }

    fn suffix_matches(&self, filename: &str, folded: &str) -> Vec<usize> {
        let exact = longest_suffix(&self.index.suffixes, filename);
        let caseless = longest_suffix(&self.index.suffixes_folded, folded);

        match (exact, caseless) {
            (Some((a_len, a)), Some((b_len, b))) => {
                if a_len >= b_len {
                    a.to_vec()
                } else {
                    b.to_vec()
                }
            }
            (Some((_, a)), None) => a.to_vec(),
            (None, Some((_, b))) => b.to_vec(),
            (None, None) => Vec::new(),
        }
    }

    fn glob_matches(&self, filename: &str, folded: &str) -> Vec<usize> {
        let mut best = 0usize;
        let mut hits = Vec::new();

        for &position in &self.index.globs {
            let pattern = &self.patterns[position];
            let text = match pattern.mode() {
                MatchMode::CaseSensitive => filename,
                MatchMode::CaseInsensitive => folded,
            };
            if !pattern.matches_folded(text) {
                continue;
            }
            let PatternKind::Glob(specificity) = *pattern.kind() else {
                continue;
            };
            if hits.is_empty() || specificity > best {
                best = specificity;
                hits.clear();
                hits.push(position);
            } else if specificity == best {
                hits.push(position);
            }
        }
        hits
    }

    /// Every extension declared for `mime_type`, in declaration order.
    ///
    /// Only `*.ext` suffix patterns count; the leading `*.` is stripped.
    pub fn extensions_for(&self, mime_type: &str) -> Vec<&str> {
        let wanted = simplify(mime_type);
        self.entries
            .iter()
            .filter(|entry| entry.mime_type == wanted)
            .filter_map(|entry| entry.pattern.strip_prefix("*."))
            .filter(|ext| !ext.is_empty() && !ext.contains(['*', '?', '[', '\\']))
            .collect()
    }
}

/// Longest suffix of `name` present in `map`, with its length in chars.
fn longest_suffix<'m>(
    map: &'m FxHashMap<String, Vec<usize>>,
    name: &str,
) -> Option<(usize, &'m [usize])> {
    if map.is_empty() {
        return None;
    }
    let total = name.chars().count();
    // char_indices walks from the longest suffix to the shortest
    name.char_indices()
        .enumerate()
        .find_map(|(skipped, (start, _))| {
            map.get(&name[start..])
                .map(|positions| (total - skipped, positions.as_slice()))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn apache(text: &str) -> GlobDatabase {
        GlobDatabase::parse_str(text, Dialect::Apache).unwrap()
    }

    fn freedesktop(text: &str) -> GlobDatabase {
        GlobDatabase::parse_str(text, Dialect::Freedesktop).unwrap()
    }

    #[test]
    fn test_apache_lookup() {
        let db = apache("text/css css\nimage/gif gif\n");
        assert_eq!(db.analyze("file.css"), vec!["text/css"]);
        assert_eq!(db.analyze("file.gif"), vec!["image/gif"]);
        assert!(db.analyze("file.psd").is_empty());
        assert!(db.analyze("").is_empty());
    }

    #[test]
    fn test_apache_is_case_sensitive() {
        let db = apache("image/gif gif\n");
        assert!(db.analyze("FILE.GIF").is_empty());
    }

    #[test]
    fn test_literal_beats_suffix() {
        let db = freedesktop("50:text/x-makefile:makefile\n50:text/plain:*file\n");
        assert_eq!(db.analyze("Makefile"), vec!["text/x-makefile"]);
        assert_eq!(db.analyze("Gemfile"), vec!["text/plain"]);
    }

    #[test]
    fn test_longest_suffix_wins() {
        let db = freedesktop("50:application/gzip:*.gz\n50:application/x-compressed-tar:*.tar.gz\n");
        assert_eq!(db.analyze("backup.tar.gz"), vec!["application/x-compressed-tar"]);
        assert_eq!(db.analyze("notes.gz"), vec!["application/gzip"]);
    }

    #[test]
    fn test_suffix_beats_glob() {
        let db = freedesktop("50:text/x-readme:README*\n50:text/markdown:*.md\n");
        assert_eq!(db.analyze("README.md"), vec!["text/markdown"]);
        assert_eq!(db.analyze("README"), vec!["text/x-readme"]);
    }

    #[test]
    fn test_weight_then_declaration_order() {
        let db = freedesktop(
            "40:text/x-first:*.dat\n80:application/x-heavy:*.dat\n40:text/x-second:*.dat\n",
        );
        assert_eq!(
            db.analyze("a.dat"),
            vec!["application/x-heavy", "text/x-first", "text/x-second"]
        );
        assert_eq!(db.first("a.dat"), Some("application/x-heavy"));
    }

    #[test]
    fn test_same_pattern_earliest_declared_wins() {
        // Tie on specificity and weight: declaration order decides
        let db = apache("application/x-one one\napplication/x-uno one\n");
        assert_eq!(db.analyze("file.one"), vec!["application/x-one", "application/x-uno"]);
        assert_eq!(db.first("file.one"), Some("application/x-one"));
    }

    #[test]
    fn test_case_insensitive_entries() {
        let db = freedesktop("50:image/jpeg:*.jpg\n50:text/x-cs:*.C:cs\n");
        assert_eq!(db.analyze("PHOTO.JPG"), vec!["image/jpeg"]);
        assert_eq!(db.analyze("main.C"), vec!["text/x-cs"]);
        assert!(db.analyze("main.c").is_empty());
    }

    #[test]
    fn test_exact_case_outranks_folded_case() {
        let db = freedesktop(
            "\
50:text/x-c++src:*.C:cs
50:text/x-c++src:*.C
50:text/x-csrc:*.c:cs
50:text/x-csrc:*.c
",
        );
        assert_eq!(db.analyze("hello.c"), vec!["text/x-csrc"]);
        assert_eq!(db.analyze("hello.C"), vec!["text/x-c++src"]);

        // A heavier folded entry does not beat an exact one of the same length
        let db = freedesktop("50:text/x-a:*.abc:cs\n60:text/x-b:*.abc\n");
        assert_eq!(db.analyze("f.abc"), vec!["text/x-a"]);
        assert_eq!(db.analyze("F.ABC"), vec!["text/x-b"]);

        // Same for whole-filename literals
        let db = freedesktop("50:text/x-upper:Makefile:cs\n60:text/x-any:makefile\n");
        assert_eq!(db.analyze("Makefile"), vec!["text/x-upper"]);
        assert_eq!(db.analyze("MAKEFILE"), vec!["text/x-any"]);
    }

    #[test]
    fn test_glob_specificity() {
        let db = freedesktop("50:text/x-log:*.log*\n50:text/x-log-old:*.log.[0-9]\n");
        assert_eq!(db.analyze("app.log.1"), vec!["text/x-log-old"]);
        assert_eq!(db.analyze("app.logfile"), vec!["text/x-log"]);
    }

    #[test]
    fn test_duplicate_types_collapse() {
        let db = apache("text/plain txt\ntext/plain txt\n");
        assert_eq!(db.analyze("a.txt"), vec!["text/plain"]);
        assert_eq!(db.lookup("a.txt").len(), 2);
    }

    #[test]
    fn test_extensions_for() {
        let db = apache("image/jpeg jpeg jpg jpe\ntext/css css\n");
        assert_eq!(db.extensions_for("image/jpeg"), vec!["jpeg", "jpg", "jpe"]);
        assert_eq!(db.extensions_for("Text/CSS; charset=utf-8"), vec!["css"]);
        assert!(db.extensions_for("video/mp4").is_empty());
    }

    #[test]
    fn test_builder() {
        let mut builder = GlobDatabase::builder(Dialect::Freedesktop);
        builder
            .add(GlobEntry::new("*.svg", "image/svg+xml", 80, false))
            .unwrap();
        assert!(builder
            .add(GlobEntry::new("*.[x", "text/x-broken", 50, true))
            .is_err());
        assert_eq!(builder.len(), 1);
        let db = builder.build();
        assert_eq!(db.first("logo.SVG"), Some("image/svg+xml"));
    }

    #[test]
    fn test_dialect_from_str() {
        assert_eq!("Apache".parse::<Dialect>().unwrap(), Dialect::Apache);
        assert_eq!("FREEDESKTOP".parse::<Dialect>().unwrap(), Dialect::Freedesktop);
        assert!("nginx".parse::<Dialect>().is_err());
    }

    #[test]
    fn test_invalid_utf8_line_is_skipped() {
        let bytes: &[u8] = b"text/css css\n\xff\xfe broken\nimage/gif gif\n";
        let db = GlobDatabase::parse(bytes, Dialect::Apache).unwrap();
        assert_eq!(db.len(), 2);
        assert_eq!(db.skipped(), 1);
    }

    #[test]
    fn test_open_missing() {
        let err = GlobDatabase::open("/nonexistent/mime.types", Dialect::Apache).unwrap_err();
        assert!(matches!(err, MimeError::DatabaseUnavailable(_)));

        let db = GlobDatabase::open_or_empty("/nonexistent/mime.types", Dialect::Apache).unwrap();
        assert!(db.is_empty());
    }
}
