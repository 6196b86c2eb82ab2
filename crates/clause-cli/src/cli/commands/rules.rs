use super::{load_config, load_snapshot};
use crate::cli::args::{OutputFormat, RulesArgs};
use crate::exit_codes;
use anyhow::Result;
use clause_engine::{ComplianceRule, Standard};
use serde_json::json;

pub fn run(args: RulesArgs) -> Result<i32> {
    let config = load_config(&args.engine)?;
    let snapshot = load_snapshot(&config)?;
    let registry = &snapshot.registry;

    let standards = if args.standards.is_empty() {
        Standard::ALL.to_vec()
    } else {
        args.standards.clone()
    };
    let categories = (!args.categories.is_empty()).then_some(args.categories.as_slice());
    let rules: Vec<&ComplianceRule> = standards
        .iter()
        .flat_map(|s| registry.rules_for(*s, categories))
        .collect();

    match args.format {
        OutputFormat::Json => {
            let listed: Vec<_> = rules
                .iter()
                .map(|r| {
                    json!({
                        "id": r.id,
                        "standard": r.standard,
                        "clause": r.clause,
                        "category": r.category,
                        "severity": r.severity,
                        "requirement": r.requirement,
                        "matcher": r.matcher.kind(),
                        "pack": r.pack,
                    })
                })
                .collect();
            let report = json!({
                "ruleset_digest": registry.digest(),
                "packs": registry.packs(),
                "rules": listed,
            });
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        OutputFormat::Text => {
            for pack in registry.packs() {
                println!(
                    "# {}@{} ({}, {} rules) {}",
                    pack.name, pack.version, pack.standard, pack.rules, pack.digest
                );
            }
            println!();
            for r in &rules {
                println!(
                    "{:<34} {:<9} {:<8} {:<22} {}",
                    r.id,
                    r.standard.as_str(),
                    r.severity.to_string(),
                    r.category,
                    r.requirement
                );
            }
            println!();
            println!("{} rules", rules.len());
        }
    }
    Ok(exit_codes::SUCCESS)
}
