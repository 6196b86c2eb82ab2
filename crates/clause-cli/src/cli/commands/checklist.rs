use super::load_crossmap;
use crate::cli::args::{ChecklistArgs, OutputFormat};
use crate::exit_codes;
use anyhow::Result;
use clause_engine::Standard;
use serde_json::json;

pub fn run(args: ChecklistArgs) -> Result<i32> {
    let map = load_crossmap(&args.engine)?;
    let standards = if args.standards.is_empty() {
        Standard::ALL.to_vec()
    } else {
        args.standards.clone()
    };
    let items = map.generate_checklist(&args.activity, &standards)?;

    match args.format {
        OutputFormat::Json => {
            let report = json!({
                "activity": args.activity,
                "standards": standards,
                "items": items,
            });
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        OutputFormat::Text => {
            if items.is_empty() {
                println!("No items for '{}' under the selected standards.", args.activity);
            }
            for item in &items {
                let sources: Vec<String> = item.sources.iter().map(ToString::to_string).collect();
                println!("[ ] {}  ({})", item.item, sources.join(", "));
            }
        }
    }
    Ok(exit_codes::SUCCESS)
}
