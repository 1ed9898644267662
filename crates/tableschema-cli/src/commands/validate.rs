//! Validate command - check a schema descriptor.

use colored::Colorize;
use tableschema::Schema;

pub fn run(descriptor: String, json_output: bool) -> Result<(), Box<dyn std::error::Error>> {
    let schema = Schema::load(descriptor.as_str(), false)?;
    let errors: Vec<String> = schema.errors().iter().map(|e| e.to_string()).collect();

    if json_output {
        let status = serde_json::json!({
            "descriptor": descriptor,
            "valid": schema.valid(),
            "fields": schema.field_names(),
            "errors": errors,
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else if schema.valid() {
        println!(
            "{} {} ({} fields)",
            "Valid".green().bold(),
            descriptor.white(),
            schema.fields().len()
        );
    } else {
        println!(
            "{} {}",
            "Invalid".red().bold(),
            descriptor.white()
        );
        for error in &errors {
            println!("  {} {}", "✗".red(), error);
        }
    }

    if schema.valid() {
        Ok(())
    } else {
        Err(format!("{} validation errors", errors.len()).into())
    }
}
