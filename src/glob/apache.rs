//! Apache `mime.types` dialect.
//!
//! ```text
//! # comment
//! text/css                css
//! image/jpeg              jpeg jpg jpe
//! application/x-nothing
//! ```
//!
//! Each extension becomes a case-sensitive `*.ext` entry with the default
//! weight. A type with no extensions contributes nothing.

use super::{GlobDatabaseBuilder, GlobEntry, DEFAULT_WEIGHT};
use crate::mime::is_valid_type;

/// Characters that would turn an extension into a wildcard
const WILDCARDS: [char; 5] = ['*', '?', '[', ']', '\\'];

/// Parse one line into `builder`. Returns the reason when the line is unusable.
pub(crate) fn parse_line(line: &str, builder: &mut GlobDatabaseBuilder) -> Result<(), String> {
    let content = match line.find('#') {
        Some(pos) => &line[..pos],
        None => line,
    };

    let mut tokens = content.split_whitespace();
    let Some(mime_type) = tokens.next() else {
        return Ok(());
    };
    if !is_valid_type(mime_type) {
        return Err(format!("invalid media type '{}'", mime_type));
    }

    let extensions: Vec<&str> = tokens.collect();
    if let Some(bad) = extensions.iter().find(|ext| ext.contains(WILDCARDS)) {
        return Err(format!("extension '{}' contains wildcard characters", bad));
    }

    for ext in extensions {
        let ext = ext.trim_start_matches('.');
        if ext.is_empty() {
            continue;
        }
        let entry = GlobEntry::new(&format!("*.{}", ext), mime_type, DEFAULT_WEIGHT, true);
        builder.add(entry).map_err(|e| e.to_string())?;
    }
    Ok(())
}
