use super::{format_clause_set, load_crossmap};
use crate::cli::args::{GapsArgs, OutputFormat};
use crate::exit_codes;
use anyhow::Result;
use serde_json::json;

pub fn run(args: GapsArgs) -> Result<i32> {
    let map = load_crossmap(&args.engine)?;
    let report = map.gap_analysis(args.target, &args.covered);

    match args.format {
        OutputFormat::Json => {
            let mut value = serde_json::to_value(&report)?;
            if let Some(obj) = value.as_object_mut() {
                obj.insert("coverage".into(), json!(report.coverage()));
            }
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        OutputFormat::Text => {
            let covered: Vec<&str> = report.covered.iter().map(|s| s.as_str()).collect();
            println!(
                "{} covered by {}: {}/{} clauses ({:.0}%)",
                report.target,
                if covered.is_empty() {
                    "nothing".to_string()
                } else {
                    covered.join(", ")
                },
                report.satisfied.len(),
                report.total(),
                report.coverage() * 100.0
            );
            for entry in &report.satisfied {
                println!("  ok   {} {}  via {}", entry.clause, entry.title, format_clause_set(&entry.via));
            }
            for entry in &report.gaps {
                println!("  GAP  {} {}", entry.clause, entry.title);
            }
        }
    }
    Ok(exit_codes::SUCCESS)
}
