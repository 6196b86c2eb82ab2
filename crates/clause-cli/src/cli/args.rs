use clap::{Args, Parser, Subcommand, ValueEnum};
use clause_engine::{Severity, Standard, WarningLevel};
use serde_json::Value;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "clause",
    version,
    about = "Deterministic OHS compliance validation across ISO 45001, OSHA, Law 6331 and World Bank ESS"
)]
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Validate a document against one or more standards
    Validate(ValidateArgs),
    /// List the rules of the loaded packs
    Rules(RulesArgs),
    /// Clauses equivalent to STANDARD:CLAUSE in every standard
    Equivalents(ClauseArgs),
    /// Required items for an activity, with their source clauses
    Checklist(ChecklistArgs),
    /// Strictest requirement among the equivalents of a clause
    Strictest(ClauseArgs),
    /// Clauses of a target standard not covered by other standards
    Gaps(GapsArgs),
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ValidateOutputFormat {
    #[default]
    Text,
    Json,
    Sarif,
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Where packs and the cross-standard map come from.
#[derive(Args, Debug, Clone, Default)]
pub struct EngineArgs {
    /// Engine config file (defaults to ./clause.yaml when present)
    #[arg(long, env = "CLAUSE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Comma-separated pack references (built-in name or file path); replaces the configured packs
    #[arg(long, value_delimiter = ',')]
    pub pack: Vec<String>,

    /// Cross-standard map file; replaces the configured map
    #[arg(long)]
    pub crossmap: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct ValidateArgs {
    /// Document to validate ("-" or omitted reads stdin)
    #[arg(value_name = "FILE")]
    pub input: Option<PathBuf>,

    /// Comma-separated standards (default: every standard with loaded rules)
    #[arg(short, long = "standard", value_delimiter = ',')]
    pub standards: Vec<String>,

    /// Context value, e.g. --context activity=excavation (repeatable)
    #[arg(short, long = "context", value_name = "KEY=VALUE", value_parser = parse_context)]
    pub context: Vec<(String, Value)>,

    /// Comma-separated categories to restrict evaluation to
    #[arg(long = "category", value_delimiter = ',')]
    pub categories: Vec<String>,

    /// Output format
    #[arg(long, value_enum, default_value_t)]
    pub format: ValidateOutputFormat,

    /// Fail (exit 1) if violations at or above this severity exist
    #[arg(long, default_value = "minor")]
    pub fail_on: Severity,

    /// Also fail when warnings at or above this level exist (info, warning, error)
    #[arg(long)]
    pub fail_on_warning: Option<WarningLevel>,

    /// Attach equivalent clauses of other standards to each violation
    #[arg(long)]
    pub expand_related: bool,

    #[command(flatten)]
    pub engine: EngineArgs,
}

#[derive(Args, Debug, Clone)]
pub struct RulesArgs {
    /// Comma-separated standards to list (default: all)
    #[arg(short, long = "standard", value_delimiter = ',', value_parser = parse_standard)]
    pub standards: Vec<Standard>,

    /// Comma-separated categories
    #[arg(long = "category", value_delimiter = ',')]
    pub categories: Vec<String>,

    #[arg(long, value_enum, default_value_t)]
    pub format: OutputFormat,

    #[command(flatten)]
    pub engine: EngineArgs,
}

#[derive(Args, Debug, Clone)]
pub struct ClauseArgs {
    #[arg(value_name = "STANDARD", value_parser = parse_standard)]
    pub standard: Standard,

    #[arg(value_name = "CLAUSE")]
    pub clause: String,

    #[arg(long, value_enum, default_value_t)]
    pub format: OutputFormat,

    #[command(flatten)]
    pub engine: EngineArgs,
}

#[derive(Args, Debug, Clone)]
pub struct ChecklistArgs {
    /// Activity, e.g. confined_space
    #[arg(value_name = "ACTIVITY")]
    pub activity: String,

    /// Comma-separated standards (default: all)
    #[arg(short, long = "standard", value_delimiter = ',', value_parser = parse_standard)]
    pub standards: Vec<Standard>,

    #[arg(long, value_enum, default_value_t)]
    pub format: OutputFormat,

    #[command(flatten)]
    pub engine: EngineArgs,
}

#[derive(Args, Debug, Clone)]
pub struct GapsArgs {
    /// Standard whose clauses are checked for coverage
    #[arg(value_name = "TARGET", value_parser = parse_standard)]
    pub target: Standard,

    /// Comma-separated standards already complied with
    #[arg(long, value_delimiter = ',', value_parser = parse_standard, required = true)]
    pub covered: Vec<Standard>,

    #[arg(long, value_enum, default_value_t)]
    pub format: OutputFormat,

    #[command(flatten)]
    pub engine: EngineArgs,
}

/// Wire names, case-insensitive; `-` may stand in for `_` (wb-ess).
fn parse_standard(s: &str) -> Result<Standard, String> {
    s.trim()
        .to_ascii_uppercase()
        .replace('-', "_")
        .parse::<Standard>()
        .map_err(|e| {
            format!(
                "{} (expected one of {})",
                e,
                Standard::ALL.map(|s| s.as_str()).join(", ")
            )
        })
}

/// `key=value`; numbers become JSON numbers so numeric context tables match.
fn parse_context(s: &str) -> Result<(String, Value), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("invalid context '{s}': expected KEY=VALUE"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("invalid context '{s}': empty key"));
    }
    let value = value.trim();
    let value = match value.parse::<f64>() {
        Ok(n) if n.is_finite() => serde_json::json!(n),
        _ => Value::String(value.to_string()),
    };
    Ok((key.to_string(), value))
}
