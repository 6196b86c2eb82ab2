//! Extracted numeric values compared against permitted limits.
//!
//! Limits are either fixed or selected from a table by a context value, e.g.
//! the OSHA noise table keyed on `exposure_hours`.

use super::{build_regex, extract_numbers, Document, MatchOutcome, MatcherError};
use crate::context::ValidationContext;
use crate::packs::schema::{Limits, MatcherDefinition};
use regex::Regex;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Range {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl Range {
    pub fn contains(&self, value: f64) -> bool {
        self.min.is_none_or(|min| value >= min) && self.max.is_none_or(|max| value <= max)
    }

    fn is_open(&self) -> bool {
        self.min.is_none() && self.max.is_none()
    }

    fn ordered(&self) -> bool {
        match (self.min, self.max) {
            (Some(min), Some(max)) => min <= max,
            _ => true,
        }
    }
}

impl From<Limits> for Range {
    fn from(l: Limits) -> Self {
        Self {
            min: l.min,
            max: l.max,
        }
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.min, self.max) {
            (Some(min), Some(max)) => write!(f, "between {} and {}", min, max),
            (Some(min), None) => write!(f, "at least {}", min),
            (None, Some(max)) => write!(f, "at most {}", max),
            (None, None) => write!(f, "unbounded"),
        }
    }
}

#[derive(Debug, Clone)]
enum LimitSource {
    Fixed(Range),
    ByContext {
        key: String,
        default: String,
        rows: Vec<(String, Range)>,
    },
}

#[derive(Debug, Clone)]
pub struct ThresholdMatcher {
    label: String,
    regex: Regex,
    unit: String,
    limits: LimitSource,
    required: bool,
    stated_by: Option<Regex>,
}

impl ThresholdMatcher {
    pub fn compile(def: &MatcherDefinition) -> Result<Self, Vec<String>> {
        let MatcherDefinition::Threshold {
            label,
            pattern,
            unit,
            limits,
            limits_by_context,
            required,
            stated_by,
        } = def
        else {
            return Err(vec![format!("expected threshold matcher, got {}", def.type_name())]);
        };

        let mut problems = Vec::new();
        if label.trim().is_empty() {
            problems.push("threshold label is empty".to_string());
        }
        let regex = match build_regex(pattern) {
            Ok(re) if re.captures_len() < 2 => {
                problems.push(format!("threshold pattern '{}' has no capture group", pattern));
                None
            }
            Ok(re) => Some(re),
            Err(e) => {
                problems.push(e);
                None
            }
        };

        let stated_by = match stated_by.as_deref().map(build_regex).transpose() {
            Ok(re) => re,
            Err(e) => {
                problems.push(e);
                None
            }
        };

        let source = match (limits, limits_by_context) {
            (Some(_), Some(_)) => {
                problems.push("threshold takes either limits or limits_by_context, not both".into());
                None
            }
            (None, None) => {
                problems.push("threshold has no limits".into());
                None
            }
            (Some(l), None) => {
                let range = Range::from(*l);
                check_range(&range, "limits", &mut problems);
                Some(LimitSource::Fixed(range))
            }
            (None, Some(table)) => {
                let mut rows = Vec::with_capacity(table.rows.len());
                for row in &table.rows {
                    let when = row.when.trim().to_string();
                    if rows.iter().any(|(w, _)| *w == when) {
                        problems.push(format!("duplicate limits row '{}'", when));
                    }
                    let range = Range {
                        min: row.min,
                        max: row.max,
                    };
                    check_range(&range, &format!("row '{}'", when), &mut problems);
                    rows.push((when, range));
                }
                let default = table.default.trim();
                if !rows.iter().any(|(w, _)| w == default) {
                    problems.push(format!("limits_by_context.default '{}' has no row", default));
                }
                Some(LimitSource::ByContext {
                    key: table.key.clone(),
                    default: default.to_string(),
                    rows,
                })
            }
        };

        match (regex, source) {
            (Some(regex), Some(limits)) if problems.is_empty() => Ok(Self {
                label: label.clone(),
                regex,
                unit: unit.clone().unwrap_or_default(),
                limits,
                required: *required,
                stated_by,
            }),
            _ => Err(problems),
        }
    }

    /// Limits in effect for this context. A context value without a row is
    /// an error; a missing key selects the default row.
    pub fn range_for(&self, ctx: &ValidationContext) -> Result<Range, MatcherError> {
        match &self.limits {
            LimitSource::Fixed(range) => Ok(*range),
            LimitSource::ByContext { key, default, rows } => {
                let wanted = ctx.lookup_key(key)?.unwrap_or_else(|| default.clone());
                rows.iter()
                    .find(|(when, _)| *when == wanted)
                    .map(|(_, range)| *range)
                    .ok_or_else(|| MatcherError::MissingLimitRow {
                        key: key.clone(),
                        value: wanted,
                    })
            }
        }
    }

    pub fn evaluate(
        &self,
        doc: &Document<'_>,
        ctx: &ValidationContext,
    ) -> Result<MatchOutcome, MatcherError> {
        let range = self.range_for(ctx)?;
        let values = extract_numbers(&self.regex, doc.raw());
        let mut issues = Vec::new();
        if values.is_empty() {
            let stated = self.stated_by.as_ref().is_some_and(|re| re.is_match(doc.raw()));
            if self.required && !stated {
                issues.push(format!("No {} value found", self.label));
            }
            return Ok(MatchOutcome::from_issues(issues));
        }
        for value in values {
            if !range.contains(value) {
                issues.push(format!(
                    "{} {}{} is outside the permitted range ({}{})",
                    self.label, value, self.unit, range, self.unit
                ));
            }
        }
        Ok(MatchOutcome::from_issues(issues))
    }
}

fn check_range(range: &Range, at: &str, problems: &mut Vec<String>) {
    if range.is_open() {
        problems.push(format!("{} has neither min nor max", at));
    } else if !range.ordered() {
        problems.push(format!("{} has min greater than max", at));
    }
}
