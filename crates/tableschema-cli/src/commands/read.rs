//! Read command - stream a data file through a schema.

use std::fs;
use std::path::{Path, PathBuf};

use colored::Colorize;
use indexmap::IndexMap;
use tableschema::{
    Cell, InferOptions, IntegrityExpectation, ReadOptions, Relations, Schema, Table, Value,
};
use tracing::debug;

pub struct ReadArgs {
    pub file: PathBuf,
    pub schema: Option<String>,
    pub relations: Option<PathBuf>,
    pub continue_on_error: bool,
    pub limit: Option<usize>,
    pub size: Option<u64>,
    pub hash: Option<String>,
    pub json: bool,
}

pub fn run(args: ReadArgs) -> Result<(), Box<dyn std::error::Error>> {
    if !args.file.exists() {
        return Err(format!("File not found: {}", args.file.display()).into());
    }

    let mut table = Table::from_path(&args.file);
    match &args.schema {
        Some(descriptor) => table = table.with_schema(Schema::load(descriptor.as_str(), true)?),
        None => {
            table.infer(&InferOptions::default())?;
        }
    }
    let names = table.schema().map(Schema::field_names).unwrap_or_default();
    debug!(file = %args.file.display(), fields = ?names, "Reading table");

    let relations = match &args.relations {
        Some(path) => Some(load_relations(path)?),
        None => None,
    };

    let mut errors = 0usize;
    let mut rows = 0usize;
    {
        let mut options = ReadOptions::default();
        if let Some(relations) = &relations {
            options = options.with_relations(relations);
        }
        if let Some(limit) = args.limit {
            options = options.with_limit(limit);
        }
        if args.size.is_some() || args.hash.is_some() {
            options = options.with_integrity(IntegrityExpectation {
                size: args.size,
                hash: args.hash.clone(),
            });
        }
        if args.continue_on_error {
            options = options.with_handler(|report| {
                errors += 1;
                let location = match report.row_number {
                    Some(n) => format!("row {}", n),
                    None => "table".to_string(),
                };
                eprintln!("  {} {}: {}", "✗".red(), location.yellow(), report.error);
            });
        }

        for row in table.iter(options) {
            let row = row?;
            rows += 1;
            if args.json {
                println!("{}", serde_json::to_string(&row.keyed(&names))?);
            } else {
                let line: Vec<String> = row.cells.iter().map(format_cell).collect();
                println!("{:>6}  {}", row.number.to_string().dimmed(), line.join("\t"));
            }
        }
    }

    if !args.json {
        eprintln!();
        eprintln!("{} {} rows", "Read".green().bold(), rows.to_string().white().bold());
        if let (Some(size), Some(hash)) = (table.size(), table.hash()) {
            eprintln!("  size: {} bytes", size);
            eprintln!("  hash: {}", hash);
        }
    }

    if errors > 0 {
        return Err(format!("{} errors found", errors).into());
    }
    Ok(())
}

/// Load `{"resource": [{"field": value, ...}, ...]}` from a JSON file.
fn load_relations(path: &Path) -> Result<Relations, Box<dyn std::error::Error>> {
    let content = fs::read_to_string(path)?;
    let raw: IndexMap<String, Vec<IndexMap<String, serde_json::Value>>> =
        serde_json::from_str(&content)?;
    Ok(raw
        .into_iter()
        .map(|(resource, rows)| {
            let rows = rows
                .into_iter()
                .map(|row| row.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
                .collect();
            (resource, rows)
        })
        .collect())
}

fn format_cell(cell: &Cell) -> String {
    match cell {
        Cell::Value(value) => value.to_string(),
        Cell::Reference(_) => cell.to_json().to_string().blue().to_string(),
        Cell::Unresolved(value) => value.to_string().yellow().to_string(),
        Cell::Failed(failed) => failed.raw.to_string().red().to_string(),
    }
}
