//! Example: infer a schema for a delimited file and read it back.
//!
//! Usage:
//!   cargo run --example read_table -- <file_path>
//!
//! Example:
//!   cargo run --example read_table -- data/people.csv

use std::env;
use std::path::Path;

use tableschema::{InferOptions, ReadOptions, Table};

fn main() -> tableschema::Result<()> {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: cargo run --example read_table -- <file_path>");
        eprintln!("\nExample:");
        eprintln!("  cargo run --example read_table -- data/people.csv");
        std::process::exit(1);
    }

    let file_path = &args[1];
    let path = Path::new(file_path);

    if !path.exists() {
        eprintln!("Error: File not found: {}", file_path);
        std::process::exit(1);
    }

    let separator = "=".repeat(80);
    println!("{}", separator);
    println!("Table: {}", file_path);
    println!("{}", separator);
    println!();

    let mut table = Table::from_path(path);
    let schema = table.infer(&InferOptions::default())?;

    println!("## Schema ({} fields)", schema.fields().len());
    println!();
    for field in schema.fields() {
        println!("  {:20} {:10} {}", field.name(), field.field_type(), field.format());
    }
    println!();
    let names = schema.field_names();

    let mut problems = Vec::new();
    let rows = table.read(
        ReadOptions::default().with_handler(|report| {
            problems.push(format!("{:?}: {}", report.row_number, report.error))
        }),
    )?;

    println!("## Rows ({} total)", rows.len());
    println!();
    for row in rows.iter().take(10) {
        let keyed = row.keyed(&names);
        println!("  {:>4}  {}", row.number, serde_json::to_string(&keyed)?);
    }
    if rows.len() > 10 {
        println!("  ...");
    }
    println!();

    if !problems.is_empty() {
        println!("## Problems ({} total)", problems.len());
        for problem in &problems {
            println!("  {}", problem);
        }
        println!();
    }

    println!("## Integrity");
    println!("  Size: {:?}", table.size());
    println!("  Hash: {:?}", table.hash());
    println!();

    println!("{}", separator);

    Ok(())
}
