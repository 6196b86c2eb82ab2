use super::{format_clause_set, load_config, load_snapshot};
use crate::cli::args::{ValidateArgs, ValidateOutputFormat};
use crate::exit_codes;
use anyhow::{Context, Result};
use clause_engine::sarif::{to_sarif_with_options, SarifOptions};
use clause_engine::{validate, Snapshot, ValidationContext, ValidationRequest, ValidationResult};
use std::io::Read;
use std::path::Path;

pub fn run(args: ValidateArgs) -> Result<i32> {
    let mut config = load_config(&args.engine)?;
    if args.fail_on_warning.is_some() {
        config.fail_on_warning = args.fail_on_warning;
    }
    if args.expand_related {
        config.expand_related = true;
    }
    let snapshot = load_snapshot(&config)?;

    let (text, source) = read_input(args.input.as_deref())?;

    let standards: Vec<String> = if args.standards.is_empty() {
        snapshot
            .registry
            .standards()
            .iter()
            .map(|s| s.as_str().to_string())
            .collect()
    } else {
        args.standards.clone()
    };
    let mut context = ValidationContext::new();
    for (key, value) in &args.context {
        context.insert(key.clone(), value.clone());
    }
    let mut request = ValidationRequest::new(text, standards).with_context(context);
    if !args.categories.is_empty() {
        request = request.with_categories(args.categories.iter().cloned());
    }

    let options = config.options();
    let result = validate(
        &snapshot.registry,
        Some(&snapshot.crossmap),
        &request,
        &options,
    );

    match args.format {
        ValidateOutputFormat::Json => {
            let mut report = serde_json::to_value(&result)?;
            if let Some(obj) = report.as_object_mut() {
                obj.insert(
                    "ruleset_digest".into(),
                    serde_json::json!(snapshot.registry.digest()),
                );
            }
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        ValidateOutputFormat::Sarif => {
            let sarif = to_sarif_with_options(
                &result,
                &snapshot.registry,
                &SarifOptions {
                    artifact_uri: source.clone(),
                },
            );
            println!("{}", serde_json::to_string_pretty(&sarif)?);
        }
        ValidateOutputFormat::Text => print_text(&snapshot, &request, &result, source.as_deref()),
    }

    // 0 = nothing at/above threshold, 1 = violations (or blocking warnings), 3 = nothing validated
    if result.is_degenerate() {
        return Ok(exit_codes::DEGENERATE_INPUT);
    }
    let blocking_warning = options
        .fail_on_warning
        .is_some_and(|level| result.has_warnings_at_or_above(level));
    if result.has_violations_at_or_above(args.fail_on) || blocking_warning {
        Ok(exit_codes::VIOLATIONS)
    } else {
        Ok(exit_codes::SUCCESS)
    }
}

/// Document text and, for files, the path used as the SARIF artifact.
fn read_input(input: Option<&Path>) -> Result<(String, Option<String>)> {
    match input {
        Some(path) if path != Path::new("-") => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            Ok((text, Some(path.display().to_string())))
        }
        _ => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .context("failed to read stdin")?;
            Ok((text, None))
        }
    }
}

fn print_text(
    snapshot: &Snapshot,
    request: &ValidationRequest,
    result: &ValidationResult,
    source: Option<&str>,
) {
    let registry = &snapshot.registry;
    eprintln!("Clause Validation");
    eprintln!("=================");
    eprintln!(
        "Document: {} | Standards: {}",
        source.unwrap_or("<stdin>"),
        request.standards.join(", ")
    );
    eprintln!(
        "Packs: {} ({})",
        registry
            .packs()
            .iter()
            .map(|p| format!("{}@{}", p.name, p.version))
            .collect::<Vec<_>>()
            .join(", "),
        registry.digest()
    );

    for pack in registry.packs() {
        let requested = request.standards.iter().any(|s| s.trim() == pack.standard);
        if let (true, Some(disclaimer)) = (requested, &pack.disclaimer) {
            eprintln!("Note ({}): {}", pack.name, disclaimer.trim());
        }
    }
    eprintln!();

    for warning in &result.warnings {
        eprintln!("[{}] {}", warning.level, warning.message);
    }
    if !result.warnings.is_empty() {
        eprintln!();
    }

    if result.violations.is_empty() {
        eprintln!("No violations.");
    }
    for v in &result.violations {
        let clause = v
            .clause
            .as_deref()
            .map(|c| format!(" {}", c))
            .unwrap_or_default();
        eprintln!(
            "[{}] {} ({}{}) {}",
            v.severity, v.rule_id, v.standard, clause, v.requirement
        );
        for issue in &v.issues {
            eprintln!("    - {}", issue);
        }
        if !v.remediation.is_empty() {
            eprintln!("    Remediation: {}", v.remediation.trim());
        }
        if !v.related.is_empty() {
            eprintln!("    Related: {}", format_clause_set(&v.related));
        }
    }

    let s = &result.stats;
    eprintln!();
    eprintln!(
        "Summary: {} checked, {} passed, {} failed, {} errored ({} critical, {} major, {} minor)",
        s.rules_checked,
        s.rules_passed,
        s.rules_failed,
        s.rules_errored,
        s.critical_count,
        s.major_count,
        s.minor_count
    );
    eprintln!("Result: {}", if result.ok { "PASS" } else { "FAIL" });
}
