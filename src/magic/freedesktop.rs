//! shared-mime-info binary `magic` file loader.
//!
//! Layout:
//!
//! ```text
//! MIME-Magic\0\n
//! [50:image/gif]\n
//! >0=<u16 BE length>GIF8\n
//! 1>4=<u16 BE length>9a\n
//! 1>4=<u16 BE length>7a\n
//! ```
//!
//! A rule line is `[indent]>offset=<len><value>[&mask][~word][+range]\n`.
//! Indented lines refine the closest line above them with one less level
//! of indent; a line matches only if one of its refinements does (when it
//! has any). Unknown trailing fields drop the line; structural damage
//! drops the rest of the section.

use super::{SignatureDatabase, SignatureRule, PREFIX_LIMIT};
use crate::error::{MalformedEntry, MimeError, Result};
use crate::file_reader;
use crate::mime::is_valid_type;
use memchr::{memchr, memmem};
use std::path::Path;
use tracing::{debug, info, warn};

/// File signature
pub const HEADER: &[u8] = b"MIME-Magic\0\n";

/// Offsets, ranges and indents above this are treated as corrupt
const MAX_FIELD: u64 = u32::MAX as u64;

/// Load a `magic` file (`.gz` is decompressed transparently).
///
/// # Errors
///
/// [`MimeError::DatabaseUnavailable`] when the file cannot be read or does
/// not start with the `MIME-Magic` header. Damaged sections are skipped.
pub fn load<P: AsRef<Path>>(path: P) -> Result<SignatureDatabase> {
    let path = path.as_ref();
    let bytes = file_reader::load_bytes(path).map_err(|e| {
        MimeError::DatabaseUnavailable(format!("Failed to read {}: {}", path.display(), e))
    })?;
    let db = parse(bytes.as_slice()).map_err(|e| match e {
        MimeError::DatabaseUnavailable(msg) => {
            MimeError::DatabaseUnavailable(format!("{}: {}", path.display(), msg))
        }
        other => other,
    })?;
    info!(
        path = %path.display(),
        rules = db.len(),
        skipped = db.skipped(),
        "loaded magic database"
    );
    Ok(db)
}

/// Parse the contents of a `magic` file.
pub fn parse(data: &[u8]) -> Result<SignatureDatabase> {
    let body = data.strip_prefix(HEADER).ok_or_else(|| {
        MimeError::DatabaseUnavailable("missing MIME-Magic header".to_string())
    })?;

    let mut parser = MagicParser {
        data: body,
        pos: 0,
        skipped: 0,
    };
    let mut rules = Vec::new();

    while !parser.at_end() {
        let start = parser.pos;
        match parser.section() {
            Ok(section) => rules.extend(section),
            Err(reason) => {
                parser.reject(start, reason);
                parser.skip_section();
            }
        }
    }

    if parser.skipped > 0 {
        warn!(
            skipped = parser.skipped,
            kept = rules.len(),
            "magic database had malformed entries"
        );
    }
    Ok(SignatureDatabase::new(rules).with_skipped(parser.skipped))
}

/// Outcome of one rule line that did not break the section
enum Line {
    Rule(usize, SignatureRule),
    Ignored(String),
}

struct MagicParser<'a> {
    data: &'a [u8],
    pos: usize,
    skipped: usize,
}

impl<'a> MagicParser<'a> {
    fn at_end(&self) -> bool {
        self.pos >= self.data.len()
    }

    fn peek(&self) -> Option<u8> {
        self.data.get(self.pos).copied()
    }

    fn eat(&mut self, byte: u8) -> bool {
        if self.peek() == Some(byte) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, byte: u8) -> std::result::Result<(), String> {
        if self.eat(byte) {
            Ok(())
        } else {
            Err(format!("expected '{}'", byte.escape_ascii()))
        }
    }

    fn number(&mut self) -> Option<u64> {
        let start = self.pos;
        let mut value: u64 = 0;
        while let Some(digit @ b'0'..=b'9') = self.peek() {
            value = value.checked_mul(10)?.checked_add(u64::from(digit - b'0'))?;
            self.pos += 1;
        }
        (self.pos > start).then_some(value)
    }

    fn take(&mut self, len: usize) -> Option<&'a [u8]> {
        let end = self.pos.checked_add(len)?;
        let bytes = self.data.get(self.pos..end)?;
        self.pos = end;
        Some(bytes)
    }

    /// Bytes up to (not including) `byte`; the delimiter is consumed.
    fn until(&mut self, byte: u8) -> Option<&'a [u8]> {
        let len = memchr(byte, &self.data[self.pos..])?;
        let bytes = &self.data[self.pos..self.pos + len];
        self.pos += len + 1;
        Some(bytes)
    }

    fn skip_line(&mut self) {
        self.pos = match memchr(b'\n', &self.data[self.pos..]) {
            Some(len) => self.pos + len + 1,
            None => self.data.len(),
        };
    }

    fn skip_section(&mut self) {
        self.pos = match memmem::find(&self.data[self.pos..], b"\n[") {
            Some(len) => self.pos + len + 1,
            None => self.data.len(),
        };
    }

    fn reject(&mut self, position: usize, reason: String) {
        let entry = MalformedEntry::new(position + HEADER.len(), reason);
        debug!(%entry, "skipping malformed magic entry");
        self.skipped += 1;
    }

    /// `[priority:type]\n` followed by rule lines.
    fn section(&mut self) -> std::result::Result<Vec<SignatureRule>, String> {
        self.expect(b'[')?;
        let priority = self.number().ok_or("missing priority")?;
        let priority = u8::try_from(priority).map_err(|_| format!("priority {} out of range", priority))?;
        self.expect(b':')?;
        let name = self.until(b']').ok_or("unterminated section header")?;
        let mime_type = std::str::from_utf8(name)
            .ok()
            .filter(|name| is_valid_type(name))
            .ok_or_else(|| format!("invalid media type '{}'", name.escape_ascii()))?;
        self.expect(b'\n')?;

        let mut tree = RuleTree::default();
        while !self.at_end() && self.peek() != Some(b'[') {
            let start = self.pos;
            let line = match self.rule_line() {
                Ok(line) => line,
                Err(reason) => {
                    self.reject(start, reason);
                    self.skip_section();
                    break;
                }
            };
            match line {
                Line::Rule(indent, rule) => {
                    if let Err(reason) = tree.push(indent, rule) {
                        self.reject(start, reason);
                    }
                }
                Line::Ignored(reason) => self.reject(start, reason),
            }
        }

        Ok(tree
            .finish()
            .into_iter()
            .map(|rule| rule.with_type(mime_type).with_priority(priority))
            .collect())
    }

    /// `[indent]>offset=<len><value>[&mask][~word][+range]\n`
    fn rule_line(&mut self) -> std::result::Result<Line, String> {
        let indent = self.number().unwrap_or(0);
        self.expect(b'>')?;
        let offset = self.number().ok_or("missing offset")?;
        self.expect(b'=')?;
        let len = self.take(2).ok_or("truncated value length")?;
        let len = usize::from(u16::from_be_bytes([len[0], len[1]]));
        let mut value = self.take(len).ok_or("truncated value")?.to_vec();

        let mut mask = None;
        let mut word = 1;
        let mut range = 1;
        if self.eat(b'&') {
            mask = Some(self.take(len).ok_or("truncated mask")?.to_vec());
        }
        if self.eat(b'~') {
            word = self.number().ok_or("missing word size")?;
        }
        if self.eat(b'+') {
            range = self.number().ok_or("missing range length")?;
        }
        if !self.eat(b'\n') {
            self.skip_line();
            return Ok(Line::Ignored("unknown trailing field".to_string()));
        }

        if indent > MAX_FIELD || offset > MAX_FIELD || range > MAX_FIELD {
            return Ok(Line::Ignored("field out of range".to_string()));
        }
        if len == 0 {
            return Ok(Line::Ignored("empty value".to_string()));
        }
        match word {
            1 => {}
            2 | 4 => {
                let word = word as usize;
                if len % word != 0 {
                    return Ok(Line::Ignored(format!(
                        "value length {} is not a multiple of word size {}",
                        len, word
                    )));
                }
                // Values are stored big-endian; host order is what gets compared
                if cfg!(target_endian = "little") {
                    value.chunks_exact_mut(word).for_each(<[u8]>::reverse);
                    if let Some(mask) = mask.as_mut() {
                        mask.chunks_exact_mut(word).for_each(<[u8]>::reverse);
                    }
                }
            }
            other => return Ok(Line::Ignored(format!("unsupported word size {}", other))),
        }

        // Offsets past the sniffed prefix never match
        let range = (range as usize).min(PREFIX_LIMIT);
        let mut rule = SignatureRule::new(offset as i64, value)
            .with_range(range)
            .requiring_child();
        if let Some(mask) = mask {
            rule = rule.with_mask(mask);
        }
        Ok(Line::Rule(indent as usize, rule))
    }
}

/// Rebuilds the rule hierarchy from indent levels. `stack[n]` is the open
/// rule at indent `n`.
#[derive(Default)]
struct RuleTree {
    roots: Vec<SignatureRule>,
    stack: Vec<SignatureRule>,
}

impl RuleTree {
    fn push(&mut self, indent: usize, rule: SignatureRule) -> std::result::Result<(), String> {
        if indent > self.stack.len() {
            return Err(format!(
                "indent {} has no parent at level {}",
                indent,
                indent - 1
            ));
        }
        while self.stack.len() > indent {
            self.close();
        }
        self.stack.push(rule);
        Ok(())
    }

    fn close(&mut self) {
        if let Some(rule) = self.stack.pop() {
            match self.stack.last_mut() {
                Some(parent) => parent.children.push(rule),
                None => self.roots.push(rule),
            }
        }
    }

    fn finish(mut self) -> Vec<SignatureRule> {
        while !self.stack.is_empty() {
            self.close();
        }
        self.roots
    }
}
