#![no_main]
use libfuzzer_sys::fuzz_target;
use mimetype::{Registry, Source};

fuzz_target!(|data: &[u8]| {
    let registry = Registry::global();
    let first = registry.guess_type(Source::Bytes(data));
    let second = registry.guess_type(Source::Bytes(data));
    // Content-only resolution never fails and is deterministic
    assert!(first.is_ok());
    assert_eq!(first, second);
});
