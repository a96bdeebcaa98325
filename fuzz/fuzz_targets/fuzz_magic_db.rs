#![no_main]
use libfuzzer_sys::fuzz_target;
use mimetype::magic::freedesktop::{parse, HEADER};
use mimetype::magic::PREFIX_LIMIT;

fuzz_target!(|data: &[u8]| {
    // Prepend the header so the fuzzer spends its time on section parsing
    let mut file = HEADER.to_vec();
    file.extend_from_slice(data);

    if let Ok(db) = parse(&file) {
        // Run the loaded rules against their own source bytes
        let _ = db.lookup(data, PREFIX_LIMIT);
        let _ = db.lookup(b"", PREFIX_LIMIT);
        let _ = db.lookup(&file, 4);
    }
});
