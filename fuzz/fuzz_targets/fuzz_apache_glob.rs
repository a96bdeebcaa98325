#![no_main]
use libfuzzer_sys::fuzz_target;
use mimetype::{Dialect, GlobDatabase};

fuzz_target!(|data: &[u8]| {
    // Arbitrary bytes: invalid UTF-8 lines must be skipped, never fatal
    let db = match GlobDatabase::parse(data, Dialect::Apache) {
        Ok(db) => db,
        Err(_) => return,
    };

    // Every accepted entry must be reachable through its own extension
    for entry in db.entries() {
        if let Some(ext) = entry.pattern.strip_prefix("*.") {
            let name = format!("file.{}", ext);
            assert!(!db.analyze(&name).is_empty(), "{} not found", name);
        }
    }
    let _ = db.analyze("");
    let _ = db.analyze("archive.tar.gz");
});
