use anyhow::{bail, Result};
use mimetype::{Registry, ResolvedType, Source};
use serde_json::json;
use std::io;
use std::path::{Path, PathBuf};

use crate::cli_utils::build_registry;

/// Adapter selection flags for `guess`
pub struct GuessOptions {
    pub magic: Option<String>,
    pub magic_file: Option<PathBuf>,
    pub glob_dialect: Option<String>,
    pub glob_file: Option<PathBuf>,
    pub config: Option<PathBuf>,
}

pub fn cmd_guess(
    inputs: Vec<PathBuf>,
    options: GuessOptions,
    name_only: bool,
    json_output: bool,
) -> Result<()> {
    let registry = build_registry(&options)?;
    let mut failed = 0usize;

    for input in &inputs {
        let label = input.display().to_string();
        match resolve(&registry, input) {
            Ok(resolved) => {
                if json_output {
                    let line = json!({
                        "input": label,
                        "type": resolved.to_string(),
                        "mime_type": resolved.mime_type(),
                        "charset": resolved.charset(),
                        "name": resolved.name(),
                        "strategy": resolved.strategy(),
                    });
                    println!("{}", serde_json::to_string(&line)?);
                } else if name_only {
                    println!("{}: {}", label, resolved.name());
                } else {
                    println!("{}: {}", label, resolved);
                }
            }
            Err(e) => {
                failed += 1;
                eprintln!("{}: {}", label, e);
            }
        }
    }

    if failed > 0 {
        bail!("{} of {} inputs could not be read", failed, inputs.len());
    }
    Ok(())
}

fn resolve(registry: &Registry, input: &Path) -> mimetype::Result<ResolvedType> {
    if input.as_os_str() == "-" {
        let stdin = io::stdin();
        let mut lock = stdin.lock();
        registry.guess_type(Source::stream(&mut lock))
    } else {
        registry.guess_type(input)
    }
}
