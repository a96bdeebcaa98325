use anyhow::{Context, Result};
use mimetype::GlobDatabase;
use serde_json::json;
use std::path::PathBuf;

use crate::cli_utils::glob_dialect;

pub fn cmd_glob(
    database: PathBuf,
    filenames: Vec<String>,
    dialect: Option<String>,
    json_output: bool,
) -> Result<()> {
    let dialect = glob_dialect(&database, dialect.as_deref())?;
    let db = GlobDatabase::open(&database, dialect)
        .with_context(|| format!("Failed to load glob database: {}", database.display()))?;

    if json_output {
        let results: Vec<_> = filenames
            .iter()
            .map(|filename| {
                json!({
                    "filename": filename,
                    "types": db.analyze(filename),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&json!(results))?);
        return Ok(());
    }

    for filename in &filenames {
        let types = db.analyze(filename);
        if types.is_empty() {
            println!("{}: (no match)", filename);
        } else {
            println!("{}: {}", filename, types.join(", "));
        }
    }
    Ok(())
}
