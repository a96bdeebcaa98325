//! Magic backend delegating to the `infer` crate.
//!
//! `infer` ships its own matcher table, so this backend needs no database
//! file and cannot fail to load. It does not refine Ogg by codec.

/// `infer`-backed content classifier
#[derive(Debug, Clone, Copy, Default)]
pub struct InferMagic;

impl InferMagic {
    /// Create a classifier with `infer`'s default matchers.
    pub fn new() -> Self {
        InferMagic
    }

    /// Bare type for `prefix`, if any matcher recognizes it.
    pub fn lookup(&self, prefix: &[u8]) -> Option<&'static str> {
        ::infer::get(prefix).map(|kind| kind.mime_type())
    }
}
