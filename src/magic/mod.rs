//! Content signature ("magic") matching.
//!
//! A [`SignatureDatabase`] is an ordered list of [`SignatureRule`] trees.
//! Matching walks the top-level rules in order (highest priority first,
//! then declaration order) and returns the first one whose byte test
//! passes. A matching rule's children are then tried depth-first in
//! declaration order; the first child that matches refines the result.
//!
//! ```text
//! OggS @0                  -> application/ogg
//! ├── \x80theora @28       -> video/ogg
//! └── \x01vorbis @28       -> audio/ogg
//! ```
//!
//! Three backends sit behind [`MagicBackend`]: the built-in table, a
//! shared-mime-info `magic` file, and the `infer` crate.

use crate::charset;
use crate::error::Result;
use crate::mime::{is_textual, ResolvedType, Strategy, BINARY};
use std::fmt;
use std::path::Path;

pub mod builtin;
pub mod freedesktop;
pub mod external;

/// Upper bound on bytes read from any stream for sniffing
pub const PREFIX_LIMIT: usize = 8 * 1024;

/// Lower bound on bytes read, so text prefixes give the charset guess
/// something to work with
pub const MIN_SNIFF_LEN: usize = 1024;

/// Default priority for rules that do not declare one
pub const DEFAULT_PRIORITY: u8 = 50;

/// One byte test plus the rules that refine it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureRule {
    /// Offset from the start of the prefix, or from its end when negative
    pub offset: i64,
    /// Number of consecutive offsets to try, starting at `offset` (at least 1)
    pub range: usize,
    /// Expected bytes
    pub value: Vec<u8>,
    /// Optional mask ANDed onto both the input and `value` before comparing
    pub mask: Option<Vec<u8>>,
    /// Type produced on match; `None` inherits the parent's type
    pub mime_type: Option<String>,
    /// Ordering key for top-level rules (higher first)
    pub priority: u8,
    /// When set, a rule with children only matches if one of them matches
    pub require_child: bool,
    /// Refinements, evaluated in declaration order
    pub children: Vec<SignatureRule>,
}

impl SignatureRule {
    /// A rule testing `value` at `offset`.
    pub fn new(offset: i64, value: impl Into<Vec<u8>>) -> Self {
        Self {
            offset,
            range: 1,
            value: value.into(),
            mask: None,
            mime_type: None,
            priority: DEFAULT_PRIORITY,
            require_child: false,
            children: Vec::new(),
        }
    }

    /// Set the type this rule produces.
    pub fn with_type(mut self, mime_type: &str) -> Self {
        self.mime_type = Some(mime_type.to_string());
        self
    }

    /// Try `range` consecutive offsets instead of one.
    pub fn with_range(mut self, range: usize) -> Self {
        self.range = range.max(1);
        self
    }

    /// Compare under `mask`.
    pub fn with_mask(mut self, mask: impl Into<Vec<u8>>) -> Self {
        self.mask = Some(mask.into());
        self
    }

    /// Set the top-level priority.
    pub fn with_priority(mut self, priority: u8) -> Self {
        self.priority = priority;
        self
    }

    /// Add a refinement.
    pub fn child(mut self, child: SignatureRule) -> Self {
        self.children.push(child);
        self
    }

    /// Only match when a child also matches.
    pub fn requiring_child(mut self) -> Self {
        self.require_child = true;
        self
    }

    /// Bytes of prefix needed to evaluate this rule and all of its children.
    pub fn required_size(&self) -> usize {
        let own = if self.offset >= 0 {
            (self.offset as usize)
                .saturating_add(self.range - 1)
                .saturating_add(self.value.len())
        } else {
            0
        };
        self.children
            .iter()
            .map(SignatureRule::required_size)
            .fold(own, usize::max)
    }

    /// Whether this rule's own byte test passes (children not consulted).
    pub fn test(&self, prefix: &[u8]) -> bool {
        let len = self.value.len();
        if len == 0 {
            return false;
        }

        let start = if self.offset >= 0 {
            self.offset as usize
        } else {
            match prefix.len().checked_sub(self.offset.unsigned_abs() as usize) {
                Some(start) => start,
                None => return false,
            }
        };

        // Only offsets where the whole value still fits in the prefix
        let Some(last) = prefix.len().checked_sub(len) else {
            return false;
        };
        if start > last {
            return false;
        }
        let end = last.min(start.saturating_add(self.range - 1));
        (start..=end).any(|pos| self.compare(&prefix[pos..pos + len]))
    }

    fn compare(&self, window: &[u8]) -> bool {
        match &self.mask {
            None => window == self.value.as_slice(),
            Some(mask) => window
                .iter()
                .zip(&self.value)
                .zip(mask)
                .all(|((&input, &expected), &m)| input & m == expected & m),
        }
    }

    /// Depth-first evaluation; returns the most refined type on match.
    fn evaluate<'a>(&'a self, prefix: &[u8], inherited: Option<&'a str>) -> Option<&'a str> {
        if !self.test(prefix) {
            return None;
        }

        let own = self.mime_type.as_deref().or(inherited);

        for child in &self.children {
            if let Some(found) = child.evaluate(prefix, own) {
                return Some(found);
            }
        }

        if self.require_child && !self.children.is_empty() {
            None
        } else {
            own
        }
    }
}

/// An immutable, ordered table of signature rules.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignatureDatabase {
    rules: Vec<SignatureRule>,
    required_size: usize,
    skipped: usize,
}

impl SignatureDatabase {
    /// Build a database from top-level rules.
    ///
    /// Rules are stably sorted by descending priority, so equal priorities
    /// keep their declaration order.
    pub fn new(mut rules: Vec<SignatureRule>) -> Self {
        rules.sort_by(|a, b| b.priority.cmp(&a.priority));
        let required_size = rules
            .iter()
            .map(SignatureRule::required_size)
            .max()
            .unwrap_or(0);
        Self {
            rules,
            required_size,
            skipped: 0,
        }
    }

    pub(crate) fn with_skipped(mut self, skipped: usize) -> Self {
        self.skipped = skipped;
        self
    }

    /// Top-level rules in evaluation order
    pub fn rules(&self) -> &[SignatureRule] {
        &self.rules
    }

    /// Number of top-level rules
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// True when the table holds no rules
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Number of malformed rules dropped while loading
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Bytes of prefix needed to evaluate every rule
    pub fn required_size(&self) -> usize {
        self.required_size
    }

    /// Match the first `max_len` bytes of `prefix` against the table.
    ///
    /// Returns the bare type of the first matching top-level rule, refined
    /// by its children, or `None`.
    pub fn lookup(&self, prefix: &[u8], max_len: usize) -> Option<&str> {
        let prefix = &prefix[..prefix.len().min(max_len)];
        self.rules.iter().find_map(|rule| rule.evaluate(prefix, None))
    }
}

/// Which magic implementation a registry uses
#[derive(Debug, Clone)]
pub enum MagicBackend {
    /// A signature table, built in or loaded from a file
    Table(SignatureDatabase),
    /// The `infer` crate's matchers
    Infer(external::InferMagic),
}

impl MagicBackend {
    /// The compiled-in signature table.
    pub fn builtin() -> Self {
        MagicBackend::Table(builtin::database())
    }

    /// Load a shared-mime-info `magic` file.
    pub fn freedesktop<P: AsRef<Path>>(path: P) -> Result<Self> {
        freedesktop::load(path).map(MagicBackend::Table)
    }

    /// The `infer` crate backend.
    pub fn infer() -> Self {
        MagicBackend::Infer(external::InferMagic::new())
    }

    /// How many bytes of prefix are worth reading for this backend.
    pub fn read_len(&self) -> usize {
        match self {
            MagicBackend::Table(db) => db.required_size().clamp(MIN_SNIFF_LEN, PREFIX_LIMIT),
            MagicBackend::Infer(_) => PREFIX_LIMIT,
        }
    }

    /// Classify a content prefix.
    ///
    /// Binary types always report `charset=binary`; text-like types get
    /// an encoding guess from the same prefix.
    pub fn analyze(&self, prefix: &[u8], max_len: usize) -> Option<ResolvedType> {
        let prefix = &prefix[..prefix.len().min(max_len)];
        let mime_type = match self {
            MagicBackend::Table(db) => db.lookup(prefix, max_len)?,
            MagicBackend::Infer(backend) => backend.lookup(prefix)?,
        };
        let charset = if is_textual(mime_type) {
            charset::detect(prefix)
        } else {
            BINARY
        };
        Some(ResolvedType::new(mime_type, charset, Strategy::Magic))
    }
}

impl fmt::Display for MagicBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MagicBackend::Table(db) => write!(f, "signature table ({} rules)", db.len()),
            MagicBackend::Infer(_) => write!(f, "infer"),
        }
    }
}
