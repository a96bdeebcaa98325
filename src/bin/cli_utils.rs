use anyhow::{bail, Context, Result};
use mimetype::{Dialect, GlobConfig, MagicAdapterKind, MagicConfig, Registry, RegistryConfig};
use std::path::Path;
use tracing_subscriber::EnvFilter;

use crate::commands::GuessOptions;

/// Install the stderr log subscriber. `RUST_LOG` wins over `-v`.
pub fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    // A second init (tests driving main twice) is harmless
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// What a database file holds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatabaseKind {
    Glob(Dialect),
    Magic,
}

/// Resolve an explicit `--dialect`, or guess from the file name:
/// `*magic*` is a signature database, `globs`/`globs2` is freedesktop,
/// anything else is Apache `mime.types`.
pub fn database_kind(path: &Path, explicit: Option<&str>) -> Result<DatabaseKind> {
    if let Some(name) = explicit {
        if name.eq_ignore_ascii_case("magic") {
            return Ok(DatabaseKind::Magic);
        }
        let dialect = name
            .parse::<Dialect>()
            .with_context(|| format!("Invalid --dialect '{}'", name))?;
        return Ok(DatabaseKind::Glob(dialect));
    }

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    let stem = file_name.trim_end_matches(".gz");
    Ok(if stem.contains("magic") {
        DatabaseKind::Magic
    } else if stem.starts_with("globs") {
        DatabaseKind::Glob(Dialect::Freedesktop)
    } else {
        DatabaseKind::Glob(Dialect::Apache)
    })
}

/// Glob dialect for a database, rejecting magic files.
pub fn glob_dialect(path: &Path, explicit: Option<&str>) -> Result<Dialect> {
    match database_kind(path, explicit)? {
        DatabaseKind::Glob(dialect) => Ok(dialect),
        DatabaseKind::Magic => bail!("{} is not a glob database", path.display()),
    }
}

/// Registry from a configuration file overlaid with command-line flags.
pub fn build_registry(options: &GuessOptions) -> Result<Registry> {
    let mut config = match &options.config {
        Some(path) => RegistryConfig::from_file(path)
            .with_context(|| format!("Failed to load configuration: {}", path.display()))?,
        None => RegistryConfig::default(),
    };

    if options.magic.is_some() || options.magic_file.is_some() {
        let adapter = match &options.magic {
            Some(name) => name
                .parse::<MagicAdapterKind>()
                .with_context(|| format!("Invalid --magic '{}'", name))?,
            // A bare --magic-file implies the file-backed adapter
            None => MagicAdapterKind::Freedesktop,
        };
        config.magic = Some(MagicConfig {
            adapter,
            file: options.magic_file.clone(),
        });
    }

    if let Some(file) = &options.glob_file {
        let dialect = glob_dialect(file, options.glob_dialect.as_deref())?;
        // Explicitly named databases must exist
        config.glob = Some(GlobConfig::new(dialect, file).required());
    } else if options.glob_dialect.is_some() {
        bail!("--glob-dialect requires --glob-file");
    }

    Registry::from_config(config).context("Invalid configuration")
}

pub fn format_number(n: usize) -> String {
    let s = n.to_string();
    let mut result = String::new();
    for (i, c) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    result.chars().rev().collect()
}
