use super::{format_clause_set, load_crossmap};
use crate::cli::args::{ClauseArgs, OutputFormat};
use crate::exit_codes;
use anyhow::{Context, Result};
use serde_json::json;

pub fn run(args: ClauseArgs) -> Result<i32> {
    let map = load_crossmap(&args.engine)?;
    let equivalents = map.find_equivalents(args.standard, &args.clause)?;
    // find_equivalents always includes the start node
    let strictest = map
        .strictest_requirement(&equivalents)
        .context("empty equivalence set")?;

    match args.format {
        OutputFormat::Json => {
            let report = json!({
                "equivalents": equivalents,
                "strictest": strictest,
            });
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        OutputFormat::Text => {
            println!("Equivalents: {}", format_clause_set(&equivalents));
            println!(
                "Strictest:   {} {}",
                strictest.standard,
                strictest.clauses.join(", ")
            );
            if let Some(topic) = &strictest.topic {
                println!("Topic:       {}", topic);
            }
            println!("Rationale:   {}", strictest.rationale);
        }
    }
    Ok(exit_codes::SUCCESS)
}
