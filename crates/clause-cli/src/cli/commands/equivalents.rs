use super::load_crossmap;
use crate::cli::args::{ClauseArgs, OutputFormat};
use crate::exit_codes;
use anyhow::Result;
use serde_json::json;

pub fn run(args: ClauseArgs) -> Result<i32> {
    let map = load_crossmap(&args.engine)?;
    let equivalents = map.find_equivalents(args.standard, &args.clause)?;

    match args.format {
        OutputFormat::Json => {
            let report = json!({
                "standard": args.standard,
                "clause": args.clause.trim(),
                "equivalents": equivalents,
            });
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        OutputFormat::Text => {
            for (standard, clauses) in &equivalents {
                for clause in clauses {
                    let title = map
                        .node(*standard, clause)
                        .map(|n| n.title.as_str())
                        .unwrap_or_default();
                    println!("{}:{}  {}", standard, clause, title);
                }
            }
        }
    }
    Ok(exit_codes::SUCCESS)
}
