#![no_main]
use libfuzzer_sys::fuzz_target;
use mimetype::glob::pattern::{MatchMode, Pattern, PatternKind};

fuzz_target!(|data: &[u8]| {
    if data.is_empty() {
        return;
    }

    // Use first byte to select case sensitivity
    let mode = if data[0] & 1 == 0 {
        MatchMode::CaseSensitive
    } else {
        MatchMode::CaseInsensitive
    };

    // Split the rest into a pattern and a file name at the first NUL
    let Ok(s) = std::str::from_utf8(&data[1..]) else {
        return;
    };
    let (pattern, filename) = s.split_once('\0').unwrap_or((s, s));

    // Edge cases: ****, [], [a-z, [!], trailing \, long patterns
    let Ok(compiled) = Pattern::new(pattern, mode) else {
        return;
    };
    let matched = compiled.matches(filename);

    // Literal and suffix classification must agree with the matcher
    match compiled.kind() {
        PatternKind::Literal(text) => {
            assert_eq!(matched, mode.fold(filename) == *text);
        }
        PatternKind::Suffix(suffix) => {
            assert_eq!(matched, mode.fold(filename).ends_with(suffix.as_str()));
        }
        PatternKind::Glob(_) => {}
    }
});
