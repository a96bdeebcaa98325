//! Filename glob patterns.
//!
//! Patterns are compiled into a token list and classified by how specific
//! they are, which drives match precedence in [`GlobDatabase`](super::GlobDatabase):
//!
//! - [`PatternKind::Literal`]: no wildcards (`Makefile`), compared whole
//! - [`PatternKind::Suffix`]: one leading `*` then literal text (`*.tar.gz`)
//! - [`PatternKind::Glob`]: anything else (`README*`, `*.[ch]`, `x?.txt`)
//!
//! # Glob Syntax
//!
//! - `*` - Matches zero or more characters
//! - `?` - Matches exactly one character
//! - `[abc]` - Matches one character from the set (a, b, or c)
//! - `[!abc]` or `[^abc]` - Matches one character NOT in the set
//! - `[a-z]` - Matches one character in the range (a through z)
//! - `\x` - Escapes special character x
//!
//! # Examples
//!
//! ```
//! use mimetype::glob::pattern::{MatchMode, Pattern, PatternKind};
//!
//! let pattern = Pattern::new("*.tar.gz", MatchMode::CaseSensitive)?;
//! assert!(pattern.matches("backup.tar.gz"));
//! assert_eq!(pattern.kind(), &PatternKind::Suffix(".tar.gz".to_string()));
//!
//! let pattern = Pattern::new("*.[ch]", MatchMode::CaseInsensitive)?;
//! assert!(pattern.matches("MAIN.C"));
//! # Ok::<(), mimetype::MimeError>(())
//! ```

use crate::error::MimeError;
use std::fmt;

/// Match mode for glob patterns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatchMode {
    /// Case-sensitive matching
    CaseSensitive,
    /// Case-insensitive matching (both sides lower-cased)
    CaseInsensitive,
}

impl MatchMode {
    /// Fold `text` the way this mode compares it.
    pub fn fold(self, text: &str) -> String {
        match self {
            MatchMode::CaseSensitive => text.to_string(),
            MatchMode::CaseInsensitive => text.to_lowercase(),
        }
    }
}

/// How specific a pattern is, from most to least.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternKind {
    /// Whole-filename literal (folded per the match mode)
    Literal(String),
    /// `*` followed by this literal suffix (folded per the match mode)
    Suffix(String),
    /// General glob; carries the number of literal characters it contains
    Glob(usize),
}

/// One compiled element of a pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Char(char),
    AnyChar,
    AnyRun,
    Class { items: Vec<ClassItem>, negated: bool },
}

/// Item in a character class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ClassItem {
    Single(char),
    Span(char, char),
}

impl Token {
    /// Whether this token consumes exactly `ch`.
    fn accepts(&self, ch: char) -> bool {
        match self {
            Token::Char(c) => *c == ch,
            Token::AnyChar => true,
            Token::AnyRun => false,
            Token::Class { items, negated } => {
                let hit = items.iter().any(|item| match *item {
                    ClassItem::Single(c) => c == ch,
                    ClassItem::Span(lo, hi) => lo <= ch && ch <= hi,
                });
                hit != *negated
            }
        }
    }
}

/// A compiled filename pattern.
#[derive(Debug, Clone)]
pub struct Pattern {
    source: String,
    tokens: Vec<Token>,
    mode: MatchMode,
    kind: PatternKind,
}

impl Pattern {
    /// Compile `pattern`.
    ///
    /// # Errors
    ///
    /// Returns [`MimeError::InvalidPattern`] for empty patterns, unclosed or
    /// empty character classes, reversed ranges and trailing backslashes.
    pub fn new(pattern: &str, mode: MatchMode) -> Result<Self, MimeError> {
        if pattern.is_empty() {
            return Err(MimeError::InvalidPattern("Empty pattern".to_string()));
        }
        let tokens = compile(&mode.fold(pattern))?;
        let kind = classify(&tokens);
        Ok(Self {
            source: pattern.to_string(),
            tokens,
            mode,
            kind,
        })
    }

    /// The pattern as written
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Match mode
    pub fn mode(&self) -> MatchMode {
        self.mode
    }

    /// Specificity class
    pub fn kind(&self) -> &PatternKind {
        &self.kind
    }

    /// Match a whole filename.
    pub fn matches(&self, filename: &str) -> bool {
        match self.mode {
            MatchMode::CaseSensitive => self.matches_folded(filename),
            MatchMode::CaseInsensitive => self.matches_folded(&filename.to_lowercase()),
        }
    }

    /// Match a filename that was already folded for this pattern's mode.
    pub(crate) fn matches_folded(&self, filename: &str) -> bool {
        let text: Vec<char> = filename.chars().collect();
        let tokens = &self.tokens;

        let (mut t, mut p) = (0usize, 0usize);
        // Position of the last `*` seen and the text index it was tried at
        let mut resume: Option<(usize, usize)> = None;

        while t < text.len() {
            if p < tokens.len() && tokens[p] == Token::AnyRun {
                resume = Some((p, t));
                p += 1;
            } else if p < tokens.len() && tokens[p].accepts(text[t]) {
                p += 1;
                t += 1;
            } else if let Some((star, from)) = resume {
                // Let the last `*` swallow one more character and retry
                p = star + 1;
                t = from + 1;
                resume = Some((star, from + 1));
            } else {
                return false;
            }
        }

        tokens[p..].iter().all(|token| *token == Token::AnyRun)
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.source)
    }
}

fn compile(pattern: &str) -> Result<Vec<Token>, MimeError> {
    let mut tokens = Vec::new();
    let mut chars = pattern.chars().peekable();

    while let Some(ch) = chars.next() {
        let token = match ch {
            // Runs of `*` are equivalent to one
            '*' if tokens.last() == Some(&Token::AnyRun) => continue,
            '*' => Token::AnyRun,
            '?' => Token::AnyChar,
            '\\' => match chars.next() {
                Some(escaped) => Token::Char(escaped),
                None => {
                    return Err(MimeError::InvalidPattern(
                        "Trailing backslash in pattern".to_string(),
                    ))
                }
            },
            '[' => {
                let negated = matches!(chars.peek(), Some('!') | Some('^'));
                if negated {
                    chars.next();
                }

                let mut members: Vec<char> = Vec::new();
                loop {
                    match chars.next() {
                        // A `]` right after the opening bracket is a member
                        Some(']') if !members.is_empty() => break,
                        Some(c) => members.push(c),
                        None => {
                            return Err(MimeError::InvalidPattern(
                                "Unclosed character class".to_string(),
                            ))
                        }
                    }
                }

                Token::Class {
                    items: class_items(&members)?,
                    negated,
                }
            }
            other => Token::Char(other),
        };
        tokens.push(token);
    }

    Ok(tokens)
}

fn class_items(members: &[char]) -> Result<Vec<ClassItem>, MimeError> {
    let mut items = Vec::new();
    let mut i = 0;
    while i < members.len() {
        // `a-z`, but a `-` at either end is literal
        if i + 2 < members.len() && members[i + 1] == '-' {
            let (lo, hi) = (members[i], members[i + 2]);
            if lo > hi {
                return Err(MimeError::InvalidPattern(format!(
                    "Invalid character range: {}-{}",
                    lo, hi
                )));
            }
            items.push(ClassItem::Span(lo, hi));
            i += 3;
        } else {
            items.push(ClassItem::Single(members[i]));
            i += 1;
        }
    }
    Ok(items)
}

fn classify(tokens: &[Token]) -> PatternKind {
    let literal = |slice: &[Token]| -> Option<String> {
        slice
            .iter()
            .map(|token| match token {
                Token::Char(c) => Some(*c),
                _ => None,
            })
            .collect()
    };

    if let Some(text) = literal(tokens) {
        return PatternKind::Literal(text);
    }
    if let Some((Token::AnyRun, rest)) = tokens.split_first() {
        if let Some(suffix) = literal(rest) {
            if !suffix.is_empty() {
                return PatternKind::Suffix(suffix);
            }
        }
    }
    PatternKind::Glob(tokens.iter().filter(|t| matches!(t, Token::Char(_))).count())
}
