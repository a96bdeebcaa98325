//! Registry configuration.
//!
//! Configuration selects one implementation per adapter kind plus the
//! database file backing it. It can be built in code, parsed from CLI
//! strings, or read from JSON:
//!
//! ```json
//! {
//!   "magic": { "adapter": "freedesktop", "file": "/usr/share/mime/magic" },
//!   "glob":  { "adapter": "apache", "file": "/etc/mime.types" }
//! }
//! ```

use crate::error::{MimeError, Result};
use crate::glob::Dialect;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Magic implementation to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MagicAdapterKind {
    /// Compiled-in signature table
    #[default]
    #[serde(alias = "fileinfo", alias = "Builtin")]
    Builtin,
    /// shared-mime-info `magic` file
    #[serde(alias = "Freedesktop")]
    Freedesktop,
    /// The `infer` crate
    #[serde(alias = "Infer")]
    Infer,
}

impl FromStr for MagicAdapterKind {
    type Err = MimeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "builtin" | "fileinfo" => Ok(MagicAdapterKind::Builtin),
            "freedesktop" => Ok(MagicAdapterKind::Freedesktop),
            "infer" => Ok(MagicAdapterKind::Infer),
            _ => Err(MimeError::InvalidConfig(format!(
                "Unknown magic adapter '{}' (expected builtin, freedesktop or infer)",
                s
            ))),
        }
    }
}

impl fmt::Display for MagicAdapterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MagicAdapterKind::Builtin => write!(f, "builtin"),
            MagicAdapterKind::Freedesktop => write!(f, "freedesktop"),
            MagicAdapterKind::Infer => write!(f, "infer"),
        }
    }
}

/// Magic adapter selection
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MagicConfig {
    /// Which implementation
    #[serde(default)]
    pub adapter: MagicAdapterKind,
    /// Backing database, required by [`MagicAdapterKind::Freedesktop`]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
}

impl MagicConfig {
    /// Compiled-in table.
    pub fn builtin() -> Self {
        Self::default()
    }

    /// shared-mime-info `magic` file at `file`.
    pub fn freedesktop<P: Into<PathBuf>>(file: P) -> Self {
        Self {
            adapter: MagicAdapterKind::Freedesktop,
            file: Some(file.into()),
        }
    }

    /// The `infer` crate.
    pub fn infer() -> Self {
        Self {
            adapter: MagicAdapterKind::Infer,
            file: None,
        }
    }

    /// Check that the adapter has what it needs.
    pub fn validate(&self) -> Result<()> {
        match (self.adapter, &self.file) {
            (MagicAdapterKind::Freedesktop, None) => Err(MimeError::InvalidConfig(
                "freedesktop magic adapter requires a database file".to_string(),
            )),
            _ => Ok(()),
        }
    }
}

/// Glob adapter selection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobConfig {
    /// Database layout
    pub adapter: Dialect,
    /// Backing database
    pub file: PathBuf,
    /// Fail loads when the file is missing instead of using an empty database
    #[serde(default)]
    pub required: bool,
}

impl GlobConfig {
    /// Optional database of the given dialect.
    pub fn new<P: Into<PathBuf>>(adapter: Dialect, file: P) -> Self {
        Self {
            adapter,
            file: file.into(),
            required: false,
        }
    }

    /// Apache `mime.types` at `file`.
    pub fn apache<P: Into<PathBuf>>(file: P) -> Self {
        Self::new(Dialect::Apache, file)
    }

    /// shared-mime-info `globs2` at `file`.
    pub fn freedesktop<P: Into<PathBuf>>(file: P) -> Self {
        Self::new(Dialect::Freedesktop, file)
    }

    /// Treat a missing file as an error.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

/// Complete registry configuration
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Magic adapter; `None` means the built-in table
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub magic: Option<MagicConfig>,
    /// Glob adapter; `None` means no filename candidates
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub glob: Option<GlobConfig>,
}

impl RegistryConfig {
    /// Parse a JSON document.
    pub fn from_json(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text)
            .map_err(|e| MimeError::InvalidConfig(format!("Invalid JSON: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a JSON file. Relative database paths are resolved
    /// against the directory holding the configuration file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            MimeError::InvalidConfig(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let mut config = Self::from_json(&text)
            .map_err(|e| MimeError::InvalidConfig(format!("{}: {}", path.display(), e)))?;

        if let Some(base) = path.parent() {
            if let Some(file) = config.magic.as_mut().and_then(|m| m.file.as_mut()) {
                *file = anchor(base, file);
            }
            if let Some(glob) = config.glob.as_mut() {
                glob.file = anchor(base, &glob.file);
            }
        }
        Ok(config)
    }

    /// Check every configured adapter.
    pub fn validate(&self) -> Result<()> {
        if let Some(magic) = &self.magic {
            magic.validate()?;
        }
        Ok(())
    }

    /// Set the magic adapter.
    pub fn with_magic(mut self, magic: MagicConfig) -> Self {
        self.magic = Some(magic);
        self
    }

    /// Set the glob adapter.
    pub fn with_glob(mut self, glob: GlobConfig) -> Self {
        self.glob = Some(glob);
        self
    }
}

fn anchor(base: &Path, file: &Path) -> PathBuf {
    if file.is_relative() {
        base.join(file)
    } else {
        file.to_path_buf()
    }
}
