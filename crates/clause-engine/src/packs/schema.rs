//! Pack schema types.
//!
//! A pack is a YAML document holding the rules of one standard. Matchers are a
//! tagged union on `type`; every level rejects unknown fields so that a typo in
//! a pack fails the load instead of silently disabling a check.

use crate::types::Severity;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Pack definition as loaded from YAML.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PackDefinition {
    /// Pack identifier (lowercase alphanumeric + hyphens).
    pub name: String,

    /// Semver version string.
    pub version: String,

    /// Default standard for the pack's rules (wire name, e.g. `OSHA`).
    ///
    /// Kept as a string so that an unresolvable name is reported by the
    /// registry build together with every other problem.
    pub standard: String,

    /// Human-readable description.
    pub description: String,

    /// Primary source URL for the regulation text.
    #[serde(default)]
    pub source_url: Option<String>,

    /// Legal disclaimer shown alongside results.
    #[serde(default)]
    pub disclaimer: Option<String>,

    /// Rule definitions, in evaluation order.
    pub rules: Vec<RuleDefinition>,
}

impl PackDefinition {
    /// Validate pack-level fields. Rule-level problems are collected by the
    /// registry build so that all of them are reported at once.
    pub fn validate(&self) -> Result<(), PackValidationError> {
        if !is_valid_pack_name(&self.name) {
            return Err(PackValidationError::InvalidPackName {
                name: self.name.clone(),
            });
        }
        if self.version.trim().is_empty() {
            return Err(PackValidationError::EmptyVersion {
                pack: self.name.clone(),
            });
        }
        Ok(())
    }
}

/// Rule definition within a pack.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleDefinition {
    /// Globally unique rule ID (e.g. `OSHA-1910.146-CS-PERMIT`).
    pub id: String,

    /// Overrides the pack's standard.
    #[serde(default)]
    pub standard: Option<String>,

    /// Clause of the standard this rule enforces (e.g. `8.1.3`).
    #[serde(default)]
    pub clause: Option<String>,

    /// Free-form grouping tag (e.g. `ppe`, `confined_space`).
    pub category: String,

    pub severity: Severity,

    /// Human-readable text of the obligation.
    pub requirement: String,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub remediation: Option<String>,

    pub matcher: MatcherDefinition,
}

/// Whether every term must be present, or at least one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    #[default]
    All,
    Any,
}

fn any_mode() -> MatchMode {
    MatchMode::Any
}

/// Matcher definition (tagged union).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", deny_unknown_fields)]
pub enum MatcherDefinition {
    /// Literal term presence.
    Keyword {
        /// Fixed term list.
        #[serde(default)]
        terms: Vec<String>,
        /// Term lists selected by a context value.
        #[serde(default)]
        terms_by_context: Option<ContextTable<Vec<String>>>,
        #[serde(default)]
        mode: MatchMode,
        #[serde(default)]
        case_sensitive: bool,
        /// Issue template: `{term}` in `all` mode, `{terms}` in `any` mode.
        #[serde(default)]
        message: Option<String>,
    },

    /// Required patterns and numeric extraction with a post-extraction predicate.
    Pattern {
        #[serde(default)]
        required: Vec<RequiredPattern>,
        /// Issue template for a missing required pattern (`{description}`).
        #[serde(default)]
        message: Option<String>,
        /// Term obligations checked on every evaluation.
        #[serde(default)]
        requires: Vec<RequireClause>,
        #[serde(default)]
        extract: Option<ExtractDefinition>,
    },

    /// Numbered-section document shape checks.
    Structural {
        /// Override of the section header pattern.
        #[serde(default)]
        header: Option<String>,
        checks: Vec<StructuralCheckDefinition>,
    },

    /// Enumerated categories of acceptable terms.
    Checklist {
        categories: Vec<ChecklistCategoryDefinition>,
        /// Issue template (`{category}`).
        #[serde(default)]
        message: Option<String>,
    },

    /// Extracted numbers compared against a permitted range.
    Threshold {
        /// What is being measured (e.g. "Oxygen concentration").
        label: String,
        /// Pattern whose capture groups are the values (two groups for a range).
        pattern: String,
        #[serde(default)]
        unit: Option<String>,
        #[serde(default)]
        limits: Option<Limits>,
        #[serde(default)]
        limits_by_context: Option<ContextRows>,
        /// Emit an issue when no value is found at all.
        #[serde(default)]
        required: bool,
        /// Statement that satisfies `required` without a figure
        /// (e.g. "oxygen level monitored").
        #[serde(default)]
        stated_by: Option<String>,
    },

    /// Composite: compliant iff every inner matcher is compliant.
    AllOf { matchers: Vec<MatcherDefinition> },
}

impl MatcherDefinition {
    pub fn type_name(&self) -> &'static str {
        match self {
            MatcherDefinition::Keyword { .. } => "keyword",
            MatcherDefinition::Pattern { .. } => "pattern",
            MatcherDefinition::Structural { .. } => "structural",
            MatcherDefinition::Checklist { .. } => "checklist",
            MatcherDefinition::Threshold { .. } => "threshold",
            MatcherDefinition::AllOf { .. } => "all_of",
        }
    }
}

/// A table selected by a context value, with a fallback entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ContextTable<T> {
    /// Context key to read (e.g. `activity`).
    pub key: String,
    /// Table entry used when the key is missing or has no entry.
    pub default: String,
    pub table: BTreeMap<String, T>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RequiredPattern {
    pub pattern: String,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExtractDefinition {
    /// Pattern whose first capture group is a number (e.g. `(\d+)\s*feet`).
    pub pattern: String,
    pub trigger: Trigger,
    pub requires: Vec<RequireClause>,
}

/// Fires when at least one extracted value satisfies `op value`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Trigger {
    pub op: Comparison,
    pub value: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Comparison {
    Gte,
    Gt,
    Lte,
    Lt,
    Eq,
}

impl Comparison {
    pub fn holds(&self, value: f64, threshold: f64) -> bool {
        match self {
            Comparison::Gte => value >= threshold,
            Comparison::Gt => value > threshold,
            Comparison::Lte => value <= threshold,
            Comparison::Lt => value < threshold,
            Comparison::Eq => (value - threshold).abs() < f64::EPSILON,
        }
    }
}

/// A term obligation evaluated once a trigger fires.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RequireClause {
    pub any_of: Vec<String>,
    /// Only enforced when one of these terms is present.
    #[serde(default)]
    pub when_present: Vec<String>,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case", deny_unknown_fields)]
pub enum StructuralCheckDefinition {
    /// A section whose title matches `title` exists.
    SectionExists { title: String },
    /// The deepest section number has at least `depth` components.
    MinDepth { depth: usize },
    /// A section matching `title` has at least `chars` characters of content.
    MinContent { title: String, chars: usize },
    /// At least `count` numbered sections exist.
    MinSections { count: usize },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChecklistCategoryDefinition {
    pub name: String,
    pub terms: Vec<String>,
    #[serde(default = "any_mode")]
    pub mode: MatchMode,
}

/// Inclusive permitted range. Either bound may be open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Limits {
    #[serde(default)]
    pub min: Option<f64>,
    #[serde(default)]
    pub max: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ContextRows {
    pub key: String,
    pub default: String,
    pub rows: Vec<LimitRow>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LimitRow {
    pub when: String,
    #[serde(default)]
    pub min: Option<f64>,
    #[serde(default)]
    pub max: Option<f64>,
}

/// Pack-level validation error.
#[derive(Debug, thiserror::Error)]
pub enum PackValidationError {
    #[error("Invalid pack name '{name}': must be lowercase alphanumeric with hyphens")]
    InvalidPackName { name: String },

    #[error("Pack '{pack}' has an empty version")]
    EmptyVersion { pack: String },
}

/// Check if a pack name is valid (lowercase alphanumeric + hyphens).
fn is_valid_pack_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        && !name.starts_with('-')
        && !name.ends_with('-')
}
