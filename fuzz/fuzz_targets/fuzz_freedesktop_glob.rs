#![no_main]
use libfuzzer_sys::fuzz_target;
use mimetype::{Dialect, GlobDatabase};

fuzz_target!(|data: &[u8]| {
    if let Ok(db) = GlobDatabase::parse(data, Dialect::Freedesktop) {
        for entry in db.entries() {
            assert!(entry.weight <= 100);
            // Candidate lists are deduplicated
            let types = db.analyze(&entry.pattern);
            let mut sorted = types.clone();
            sorted.sort_unstable();
            sorted.dedup();
            assert_eq!(sorted.len(), types.len());
        }
        let _ = db.analyze("Makefile");
        let _ = db.analyze("README.md");
    }
});
