use anyhow::{Context, Result};
use mimetype::magic::freedesktop;
use mimetype::{GlobDatabase, SignatureDatabase};
use serde_json::json;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::cli_utils::{database_kind, format_number, DatabaseKind};

pub fn cmd_inspect(
    database: PathBuf,
    dialect: Option<String>,
    json_output: bool,
    list_entries: bool,
) -> Result<()> {
    match database_kind(&database, dialect.as_deref())? {
        DatabaseKind::Glob(dialect) => {
            let db = GlobDatabase::open(&database, dialect)
                .with_context(|| format!("Failed to load glob database: {}", database.display()))?;
            inspect_glob(&database, &db, json_output, list_entries)
        }
        DatabaseKind::Magic => {
            let db = freedesktop::load(&database).with_context(|| {
                format!("Failed to load magic database: {}", database.display())
            })?;
            inspect_magic(&database, &db, json_output, list_entries)
        }
    }
}

fn inspect_glob(
    path: &Path,
    db: &GlobDatabase,
    json_output: bool,
    list_entries: bool,
) -> Result<()> {
    let types: BTreeSet<&str> = db.entries().iter().map(|e| e.mime_type.as_str()).collect();

    if json_output {
        let mut output = json!({
            "file": path.display().to_string(),
            "kind": "glob",
            "dialect": db.dialect(),
            "entries": db.len(),
            "types": types.len(),
            "skipped": db.skipped(),
        });
        if list_entries {
            output["patterns"] = serde_json::to_value(db.entries())?;
        }
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("Database: {}", path.display());
    println!("Format:   {} glob database", db.dialect());
    println!();
    println!("  Entries:         {}", format_number(db.len()));
    println!("  Types:           {}", format_number(types.len()));
    println!("  Skipped lines:   {}", format_number(db.skipped()));

    if list_entries {
        println!();
        for entry in db.entries() {
            println!(
                "  {:>3}  {:<24} {}{}",
                entry.weight,
                entry.pattern,
                entry.mime_type,
                if entry.case_sensitive { "" } else { " (ci)" }
            );
        }
    }
    Ok(())
}

fn inspect_magic(
    path: &Path,
    db: &SignatureDatabase,
    json_output: bool,
    list_entries: bool,
) -> Result<()> {
    let types: BTreeSet<&str> = db
        .rules()
        .iter()
        .filter_map(|rule| rule.mime_type.as_deref())
        .collect();

    if json_output {
        let mut output = json!({
            "file": path.display().to_string(),
            "kind": "magic",
            "rules": db.len(),
            "types": types.len(),
            "skipped": db.skipped(),
            "prefix_bytes": db.required_size(),
        });
        if list_entries {
            output["rule_types"] = json!(db
                .rules()
                .iter()
                .map(|rule| json!({
                    "type": rule.mime_type,
                    "priority": rule.priority,
                    "children": rule.children.len(),
                }))
                .collect::<Vec<_>>());
        }
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("Database: {}", path.display());
    println!("Format:   freedesktop magic database");
    println!();
    println!("  Rules:           {}", format_number(db.len()));
    println!("  Types:           {}", format_number(types.len()));
    println!("  Skipped:         {}", format_number(db.skipped()));
    println!("  Prefix needed:   {} bytes", format_number(db.required_size()));

    if list_entries {
        println!();
        for rule in db.rules() {
            println!(
                "  [{:>3}] {} ({} refinements)",
                rule.priority,
                rule.mime_type.as_deref().unwrap_or("?"),
                rule.children.len()
            );
        }
    }
    Ok(())
}
