//! Mimetype - Media Type Resolution for Files and Streams
//!
//! Mimetype works out the media (MIME) type of a file or byte stream by
//! combining two independent strategies:
//!
//! - **Magic**: byte signatures matched against a bounded content prefix,
//!   with nested rules that refine containers (Ogg into `video/ogg` or
//!   `audio/ogg`, ISO media by brand, ZIP by declared type).
//! - **Glob**: filename patterns from an Apache `mime.types` or a
//!   freedesktop.org `globs2` database.
//!
//! Content wins over the filename. When neither matches the answer is
//! `application/octet-stream; charset=binary`.
//!
//! # Quick Start
//!
//! ```rust
//! use mimetype::{GlobConfig, Registry, Source};
//! # let dir = std::env::temp_dir().join("mimetype_doctest_quickstart");
//! # std::fs::create_dir_all(&dir)?;
//! # std::fs::write(dir.join("mime.types"), "text/css css\nimage/gif gif\n")?;
//! # std::fs::write(dir.join("site.css"), "body { margin: 0 }\n")?;
//!
//! let registry = Registry::new();
//! registry.configure_glob(Some(GlobConfig::apache(dir.join("mime.types"))));
//!
//! // Content signature
//! let gif = registry.guess_type(Source::Bytes(b"GIF89a\x01\x00\x01\x00"))?;
//! assert_eq!(gif.to_string(), "image/gif; charset=binary");
//!
//! // No signature: the file name decides
//! let css = registry.guess_type(&dir.join("site.css"))?;
//! assert_eq!(css.mime_type(), "text/css");
//! # std::fs::remove_dir_all(&dir)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────┐
//! │  Registry (config, lazy load, reset) │
//! ├──────────────────┬───────────────────┤
//! │  MagicBackend    │  GlobDatabase     │
//! │  - builtin table │  - Apache         │
//! │  - freedesktop   │  - Freedesktop    │
//! │  - infer         │                   │
//! └──────────────────┴───────────────────┘
//!          ↓ first use, once per configuration
//! ┌──────────────────────────────────────┐
//! │  Shared, immutable databases         │
//! └──────────────────────────────────────┘
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod charset;
pub mod config;
/// Error types for resolution and database loading
pub mod error;
pub mod file_reader;
pub mod glob;
pub mod magic;
pub mod mime;
pub mod registry;

// Re-exports for Rust consumers

pub use crate::config::{GlobConfig, MagicAdapterKind, MagicConfig, RegistryConfig};
pub use crate::error::{MimeError, Result};
pub use crate::glob::{Dialect, GlobDatabase, GlobEntry};
pub use crate::magic::{MagicBackend, SignatureDatabase, SignatureRule};
pub use crate::mime::{ResolvedType, Strategy};

/// Type resolution engine
///
/// Holds the configured adapters and resolves files and streams.
///
/// # Example
/// ```rust
/// use mimetype::{Registry, Source};
///
/// let registry = Registry::new();
/// let name = registry.guess_name(Source::Bytes(b"%PDF-1.7\n"))?;
/// assert_eq!(name, "application");
/// # Ok::<(), mimetype::MimeError>(())
/// ```
pub use crate::registry::{Registry, Source};

// Version information
/// Library version string
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
