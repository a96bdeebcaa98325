//! Type resolution engine.
//!
//! A [`Registry`] owns one magic adapter and at most one glob database.
//! Both are loaded lazily on first use and shared by every caller until
//! the registry is reconfigured or reset:
//!
//! - [`Registry::config`] swaps the configuration of the adapter kinds it
//!   names and drops their cached databases.
//! - [`Registry::reset`] drops everything and returns to defaults.
//!
//! Concurrent first use triggers exactly one load per configuration; the
//! other callers block until it finishes and then share the result. A
//! failed load is remembered the same way until the next `config` or
//! `reset`.
//!
//! ```
//! use mimetype::{Registry, Source};
//!
//! let registry = Registry::new();
//! let resolved = registry.guess_type(Source::Bytes(b"GIF89a\x01\x00\x01\x00"))?;
//! assert_eq!(resolved.to_string(), "image/gif; charset=binary");
//! assert_eq!(registry.guess_name(Source::Bytes(b"GIF89a"))?, "image");
//! # Ok::<(), mimetype::MimeError>(())
//! ```

use crate::charset;
use crate::config::{GlobConfig, MagicAdapterKind, MagicConfig, RegistryConfig};
use crate::error::{MimeError, Result};
use crate::file_reader;
use crate::glob::GlobDatabase;
use crate::magic::{MagicBackend, MIN_SNIFF_LEN};
use crate::mime::{is_textual, ResolvedType, Strategy, BINARY, TEXT_PLAIN};
use std::io::{Read, Seek};
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock, PoisonError, RwLock};
use tracing::{debug, warn};

/// Anything that can be read and repositioned.
pub trait ReadSeek: Read + Seek {}

impl<T: Read + Seek + ?Sized> ReadSeek for T {}

/// What to resolve.
pub enum Source<'a> {
    /// A file on disk: magic on its prefix, then glob on its name
    Path(&'a Path),
    /// A stream that is put back where it was after sniffing
    Seekable(&'a mut dyn ReadSeek),
    /// A stream that can only move forward; sniffed bytes stay consumed
    Stream(&'a mut dyn Read),
    /// Content already in memory
    Bytes(&'a [u8]),
}

impl<'a> Source<'a> {
    /// Wrap a seekable reader.
    pub fn seekable<R: Read + Seek + 'a>(reader: &'a mut R) -> Self {
        Source::Seekable(reader)
    }

    /// Wrap a forward-only reader.
    pub fn stream<R: Read + 'a>(reader: &'a mut R) -> Self {
        Source::Stream(reader)
    }
}

impl<'a> From<&'a Path> for Source<'a> {
    fn from(path: &'a Path) -> Self {
        Source::Path(path)
    }
}

impl<'a> From<&'a PathBuf> for Source<'a> {
    fn from(path: &'a PathBuf) -> Self {
        Source::Path(path.as_path())
    }
}

impl<'a> From<&'a str> for Source<'a> {
    fn from(path: &'a str) -> Self {
        Source::Path(Path::new(path))
    }
}

impl<'a> From<&'a [u8]> for Source<'a> {
    fn from(bytes: &'a [u8]) -> Self {
        Source::Bytes(bytes)
    }
}

type Cell<T> = Arc<OnceLock<Result<Arc<T>>>>;

struct MagicSlot {
    config: MagicConfig,
    cell: Cell<MagicBackend>,
}

impl MagicSlot {
    fn new(config: MagicConfig) -> Self {
        Self {
            config,
            cell: Arc::default(),
        }
    }
}

struct GlobSlot {
    config: Option<GlobConfig>,
    cell: Cell<GlobDatabase>,
}

impl GlobSlot {
    fn new(config: Option<GlobConfig>) -> Self {
        Self {
            config,
            cell: Arc::default(),
        }
    }
}

/// Configured adapters plus their lazily loaded databases
pub struct Registry {
    magic: RwLock<MagicSlot>,
    glob: RwLock<GlobSlot>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("magic", &self.magic_config())
            .field("glob", &self.glob_config())
            .finish()
    }
}

impl Registry {
    /// Built-in magic table, no glob database.
    pub fn new() -> Self {
        Self {
            magic: RwLock::new(MagicSlot::new(MagicConfig::default())),
            glob: RwLock::new(GlobSlot::new(None)),
        }
    }

    /// Process-wide registry for callers that do not manage their own.
    pub fn global() -> &'static Registry {
        static GLOBAL: OnceLock<Registry> = OnceLock::new();
        GLOBAL.get_or_init(Registry::new)
    }

    /// Registry using `config`; unset kinds get their defaults.
    pub fn from_config(config: RegistryConfig) -> Result<Self> {
        let registry = Self::new();
        registry.config(config)?;
        Ok(registry)
    }

    /// Registry using the JSON configuration at `path`.
    pub fn from_config_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_config(RegistryConfig::from_file(path)?)
    }

    /// Apply the adapter kinds present in `config`, dropping their cached
    /// databases. Kinds left unset keep their current configuration.
    pub fn config(&self, config: RegistryConfig) -> Result<()> {
        config.validate()?;
        if let Some(magic) = config.magic {
            self.configure_magic(magic)?;
        }
        if let Some(glob) = config.glob {
            self.configure_glob(Some(glob));
        }
        Ok(())
    }

    /// Select the magic adapter.
    pub fn configure_magic(&self, config: MagicConfig) -> Result<()> {
        config.validate()?;
        debug!(adapter = %config.adapter, file = ?config.file, "configuring magic adapter");
        *self.magic.write().unwrap_or_else(PoisonError::into_inner) = MagicSlot::new(config);
        Ok(())
    }

    /// Select the glob database; `None` disables filename matching.
    pub fn configure_glob(&self, config: Option<GlobConfig>) {
        debug!(config = ?config, "configuring glob adapter");
        *self.glob.write().unwrap_or_else(PoisonError::into_inner) = GlobSlot::new(config);
    }

    /// Forget every configuration and cached database.
    pub fn reset(&self) {
        debug!("resetting registry");
        *self.magic.write().unwrap_or_else(PoisonError::into_inner) =
            MagicSlot::new(MagicConfig::default());
        *self.glob.write().unwrap_or_else(PoisonError::into_inner) = GlobSlot::new(None);
    }

    /// Current magic configuration
    pub fn magic_config(&self) -> MagicConfig {
        self.magic
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .config
            .clone()
    }

    /// Current glob configuration
    pub fn glob_config(&self) -> Option<GlobConfig> {
        self.glob
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .config
            .clone()
    }

    /// The configured magic backend, loading it on first use.
    pub fn magic_backend(&self) -> Result<Arc<MagicBackend>> {
        let (config, cell) = {
            let slot = self.magic.read().unwrap_or_else(PoisonError::into_inner);
            (slot.config.clone(), Arc::clone(&slot.cell))
        };
        // The lock is released before loading; a concurrent reconfigure
        // swaps in a fresh cell and leaves this one to its callers.
        cell.get_or_init(|| load_magic(&config)).clone()
    }

    /// The configured glob database, loading it on first use. `Ok(None)`
    /// when no glob database is configured.
    pub fn glob_database(&self) -> Result<Option<Arc<GlobDatabase>>> {
        let (config, cell) = {
            let slot = self.glob.read().unwrap_or_else(PoisonError::into_inner);
            (slot.config.clone(), Arc::clone(&slot.cell))
        };
        let Some(config) = config else {
            return Ok(None);
        };
        cell.get_or_init(|| load_glob(&config)).clone().map(Some)
    }

    /// Resolve the type of `source`.
    ///
    /// Paths are sniffed first and fall back to their file name when the
    /// magic database is unavailable or nothing matches. A textual glob
    /// type carries the charset detected in the prefix; other glob types
    /// report `binary`. Streams and bytes only get magic.
    ///
    /// Content no signature claims is `text/plain` with its charset when
    /// the prefix reads as text, else `application/octet-stream;
    /// charset=binary`.
    ///
    /// # Errors
    ///
    /// [`MimeError::StreamUnreadable`] when the path cannot be opened or
    /// the stream fails while reading. Database problems never fail this
    /// call.
    pub fn guess_type<'a, S: Into<Source<'a>>>(&self, source: S) -> Result<ResolvedType> {
        let source = source.into();
        let name = match &source {
            Source::Path(path) => path.file_name().map(|n| n.to_string_lossy().into_owned()),
            _ => None,
        };

        let magic = self.magic_backend();
        if let Err(e) = &magic {
            warn!(error = %e, "magic database unavailable, skipping content sniffing");
        }
        let read_len = magic.as_ref().map(|b| b.read_len()).unwrap_or(MIN_SNIFF_LEN);
        let prefix = read_source(source, read_len)?;

        if let Ok(backend) = &magic {
            if let Some(resolved) = backend.analyze(&prefix, read_len) {
                return Ok(resolved);
            }
        }

        let encoding = text_charset(&prefix);

        if let Some(name) = name {
            match self.glob_database() {
                Ok(Some(db)) => {
                    if let Some(mime_type) = db.first(&name) {
                        let charset = match encoding {
                            Some(charset) if is_textual(mime_type) => charset,
                            _ => BINARY,
                        };
                        return Ok(ResolvedType::new(mime_type, charset, Strategy::Glob));
                    }
                }
                Ok(None) => {}
                Err(e) => warn!(error = %e, "glob database unavailable, skipping filename match"),
            }
        }

        match encoding {
            Some(charset) => Ok(ResolvedType::new(TEXT_PLAIN, charset, Strategy::Magic)),
            None => Ok(ResolvedType::unknown()),
        }
    }

    /// Coarse category of `source`: the part of its type before the `/`.
    pub fn guess_name<'a, S: Into<Source<'a>>>(&self, source: S) -> Result<String> {
        self.guess_type(source).map(|resolved| resolved.name().to_string())
    }

    /// First extension the glob database declares for `mime_type`.
    ///
    /// # Errors
    ///
    /// [`MimeError::DatabaseUnavailable`] when no glob database is
    /// configured or it failed to load.
    pub fn guess_extension(&self, mime_type: &str) -> Result<Option<String>> {
        let db = self.require_glob()?;
        Ok(db.extensions_for(mime_type).first().map(|ext| ext.to_string()))
    }

    /// Magic-only resolution; `Ok(None)` when no signature matches.
    ///
    /// # Errors
    ///
    /// [`MimeError::DatabaseUnavailable`] when the magic database failed
    /// to load, [`MimeError::StreamUnreadable`] when the source cannot be
    /// read.
    pub fn magic_type<'a, S: Into<Source<'a>>>(&self, source: S) -> Result<Option<ResolvedType>> {
        let backend = self.magic_backend()?;
        let prefix = read_source(source.into(), backend.read_len())?;
        Ok(backend.analyze(&prefix, backend.read_len()))
    }

    /// Glob-only candidates for `filename`, best first.
    ///
    /// # Errors
    ///
    /// [`MimeError::DatabaseUnavailable`] when no glob database is
    /// configured or it failed to load.
    pub fn glob_types(&self, filename: &str) -> Result<Vec<String>> {
        let db = self.require_glob()?;
        Ok(db.analyze(filename).into_iter().map(str::to_string).collect())
    }

    fn require_glob(&self) -> Result<Arc<GlobDatabase>> {
        self.glob_database()?.ok_or_else(|| {
            MimeError::DatabaseUnavailable("no glob database configured".to_string())
        })
    }
}

fn load_magic(config: &MagicConfig) -> Result<Arc<MagicBackend>> {
    let backend = match (config.adapter, &config.file) {
        (MagicAdapterKind::Builtin, _) => MagicBackend::builtin(),
        (MagicAdapterKind::Infer, _) => MagicBackend::infer(),
        (MagicAdapterKind::Freedesktop, Some(file)) => MagicBackend::freedesktop(file)?,
        (MagicAdapterKind::Freedesktop, None) => {
            return Err(MimeError::InvalidConfig(
                "freedesktop magic adapter requires a database file".to_string(),
            ))
        }
    };
    debug!(backend = %backend, "magic adapter ready");
    Ok(Arc::new(backend))
}

fn load_glob(config: &GlobConfig) -> Result<Arc<GlobDatabase>> {
    let db = if config.required {
        GlobDatabase::open(&config.file, config.adapter)?
    } else {
        GlobDatabase::open_or_empty(&config.file, config.adapter)?
    };
    Ok(Arc::new(db))
}

/// Encoding of a prefix no signature claimed, when it reads as text.
/// Empty content is not text.
fn text_charset(prefix: &[u8]) -> Option<&'static str> {
    if prefix.is_empty() {
        return None;
    }
    match charset::detect(prefix) {
        BINARY => None,
        charset => Some(charset),
    }
}

/// Bounded prefix of `source`. Seekable streams are restored.
fn read_source(source: Source<'_>, limit: usize) -> Result<Vec<u8>> {
    let prefix = match source {
        Source::Path(path) => file_reader::read_file_prefix(path, limit).map_err(|e| {
            MimeError::StreamUnreadable(format!("{}: {}", path.display(), e))
        })?,
        Source::Seekable(reader) => file_reader::peek_prefix(reader, limit)?,
        Source::Stream(reader) => file_reader::read_prefix(reader, limit)?,
        Source::Bytes(bytes) => bytes[..bytes.len().min(limit)].to_vec(),
    };
    Ok(prefix)
}
