//! Pure matcher primitives.
//!
//! A matcher is compiled once from its [`MatcherDefinition`] when the registry
//! is built, then evaluated against `(text, context)` any number of times. It
//! never touches the network, the filesystem or a clock.

pub mod checklist;
pub mod keyword;
pub mod pattern;
pub mod structural;
pub mod threshold;

pub use checklist::ChecklistMatcher;
pub use keyword::KeywordMatcher;
pub use pattern::PatternMatcher;
pub use structural::{parse_sections, Section, StructuralMatcher};
pub use threshold::ThresholdMatcher;

use crate::context::ValidationContext;
use crate::packs::schema::MatcherDefinition;
use regex::{Regex, RegexBuilder};

/// Compiled-program size cap for pack-supplied patterns.
const REGEX_SIZE_LIMIT: usize = 1 << 20;

/// Result of one matcher evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MatchOutcome {
    pub compliant: bool,
    pub issues: Vec<String>,
}

impl MatchOutcome {
    pub fn pass() -> Self {
        Self {
            compliant: true,
            issues: Vec::new(),
        }
    }

    /// Compliant iff no issues were found.
    pub fn from_issues(issues: Vec<String>) -> Self {
        Self {
            compliant: issues.is_empty(),
            issues,
        }
    }
}

/// A matcher could not produce a verdict.
///
/// The orchestrator turns this into an `error` warning and moves on to the
/// next rule.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MatcherError {
    #[error("context key '{key}' must be a {expected}, found {found}")]
    ContextType {
        key: String,
        expected: &'static str,
        found: String,
    },

    #[error("no limit row for context key '{key}' = '{value}'")]
    MissingLimitRow { key: String, value: String },

    #[error("{0}")]
    Internal(String),
}

/// Text under validation plus its case-folded form, computed once per request.
#[derive(Debug, Clone)]
pub struct Document<'a> {
    raw: &'a str,
    folded: String,
}

impl<'a> Document<'a> {
    pub fn new(raw: &'a str) -> Self {
        Self {
            raw,
            folded: raw.to_lowercase(),
        }
    }

    pub fn raw(&self) -> &'a str {
        self.raw
    }

    pub fn folded(&self) -> &str {
        &self.folded
    }

    /// Substring test. `needle` must already be folded when `case_sensitive`
    /// is false.
    pub fn contains(&self, needle: &str, case_sensitive: bool) -> bool {
        if case_sensitive {
            self.raw.contains(needle)
        } else {
            self.folded.contains(needle)
        }
    }
}

/// Compiled matcher.
#[derive(Debug, Clone)]
pub enum Matcher {
    Keyword(KeywordMatcher),
    Pattern(PatternMatcher),
    Structural(StructuralMatcher),
    Checklist(ChecklistMatcher),
    Threshold(ThresholdMatcher),
    AllOf(Vec<Matcher>),
}

impl Matcher {
    /// Compile a definition. Returns every problem found, not just the first.
    pub fn compile(def: &MatcherDefinition) -> Result<Self, Vec<String>> {
        match def {
            MatcherDefinition::Keyword { .. } => KeywordMatcher::compile(def).map(Matcher::Keyword),
            MatcherDefinition::Pattern { .. } => PatternMatcher::compile(def).map(Matcher::Pattern),
            MatcherDefinition::Structural { .. } => {
                StructuralMatcher::compile(def).map(Matcher::Structural)
            }
            MatcherDefinition::Checklist { .. } => {
                ChecklistMatcher::compile(def).map(Matcher::Checklist)
            }
            MatcherDefinition::Threshold { .. } => {
                ThresholdMatcher::compile(def).map(Matcher::Threshold)
            }
            MatcherDefinition::AllOf { matchers } => {
                if matchers.is_empty() {
                    return Err(vec!["all_of requires at least one matcher".to_string()]);
                }
                let mut compiled = Vec::with_capacity(matchers.len());
                let mut problems = Vec::new();
                for (idx, inner) in matchers.iter().enumerate() {
                    match Matcher::compile(inner) {
                        Ok(m) => compiled.push(m),
                        Err(errs) => problems.extend(
                            errs.into_iter()
                                .map(|e| format!("all_of[{}] ({}): {}", idx, inner.type_name(), e)),
                        ),
                    }
                }
                if problems.is_empty() {
                    Ok(Matcher::AllOf(compiled))
                } else {
                    Err(problems)
                }
            }
        }
    }

    pub fn evaluate(
        &self,
        doc: &Document<'_>,
        ctx: &ValidationContext,
    ) -> Result<MatchOutcome, MatcherError> {
        match self {
            Matcher::Keyword(m) => m.evaluate(doc, ctx),
            Matcher::Pattern(m) => Ok(m.evaluate(doc)),
            Matcher::Structural(m) => Ok(m.evaluate(doc)),
            Matcher::Checklist(m) => Ok(m.evaluate(doc)),
            Matcher::Threshold(m) => m.evaluate(doc, ctx),
            Matcher::AllOf(inner) => {
                let mut issues = Vec::new();
                for m in inner {
                    issues.extend(m.evaluate(doc, ctx)?.issues);
                }
                Ok(MatchOutcome::from_issues(issues))
            }
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Matcher::Keyword(_) => "keyword",
            Matcher::Pattern(_) => "pattern",
            Matcher::Structural(_) => "structural",
            Matcher::Checklist(_) => "checklist",
            Matcher::Threshold(_) => "threshold",
            Matcher::AllOf(_) => "all_of",
        }
    }
}

/// Compile a pack-supplied pattern: case-insensitive, multi-line, size-capped.
pub(crate) fn build_regex(pattern: &str) -> Result<Regex, String> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .multi_line(true)
        .size_limit(REGEX_SIZE_LIMIT)
        .build()
        .map_err(|e| format!("invalid pattern '{}': {}", pattern, e))
}

/// Every parsable number captured by any group, so a range such as
/// `19.5-23.5` yields both bounds. Unparsable captures are skipped.
pub(crate) fn extract_numbers(re: &Regex, text: &str) -> Vec<f64> {
    re.captures_iter(text)
        .flat_map(|caps| {
            caps.iter()
                .skip(1)
                .flatten()
                .map(|m| m.as_str())
                .collect::<Vec<_>>()
        })
        .filter_map(|m| m.parse::<f64>().ok())
        .filter(|v| v.is_finite())
        .collect()
}

/// Substitute `{name}` in a message template.
pub(crate) fn fill(template: &str, name: &str, value: &str) -> String {
    template.replace(&format!("{{{}}}", name), value)
}

/// Trimmed, non-empty terms, folded unless matching is case-sensitive.
pub(crate) fn normalize_terms(terms: &[String], case_sensitive: bool) -> Vec<String> {
    terms
        .iter()
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .map(|t| {
            if case_sensitive {
                t.to_string()
            } else {
                t.to_lowercase()
            }
        })
        .collect()
}
