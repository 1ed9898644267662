//! Infer command - infer a schema descriptor from a data file.

use std::path::PathBuf;

use colored::Colorize;
use tableschema::{InferOptions, Table};

pub fn run(
    file: PathBuf,
    output: Option<PathBuf>,
    limit: usize,
    confidence: f64,
) -> Result<(), Box<dyn std::error::Error>> {
    if !file.exists() {
        return Err(format!("File not found: {}", file.display()).into());
    }

    let mut table = Table::from_path(&file);
    let options = InferOptions::default()
        .with_limit(limit)
        .with_confidence(confidence);
    let schema = table.infer(&options)?;

    let Some(output_path) = output else {
        println!("{}", serde_json::to_string_pretty(schema.descriptor())?);
        return Ok(());
    };

    println!(
        "{} {}",
        "Inferred".cyan().bold(),
        file.display().to_string().white()
    );
    for field in schema.fields() {
        println!("  {:20} {}", field.name(), field.field_type().to_string().yellow());
    }

    schema.save(&output_path)?;

    println!();
    println!(
        "{} {}",
        "Saved to".green().bold(),
        output_path.display().to_string().white()
    );

    Ok(())
}
