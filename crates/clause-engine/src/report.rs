//! Result model returned by `validate`.

use crate::types::{Severity, Standard, WarningLevel};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    pub rule_id: String,
    pub standard: Standard,
    pub category: String,
    pub severity: Severity,
    pub requirement: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clause: Option<String>,
    pub issues: Vec<String>,
    pub remediation: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Equivalent clauses in other standards, when expansion is enabled.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub related: BTreeMap<Standard, Vec<String>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningCode {
    EmptyText,
    NoStandards,
    UnknownStandard,
    UnknownCategory,
    MatcherFailed,
}

/// A rule or standard that could not be evaluated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Warning {
    pub level: WarningLevel,
    pub code: WarningCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rule_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub standard: Option<String>,
}

impl Warning {
    pub fn new(level: WarningLevel, code: WarningCode, message: impl Into<String>) -> Self {
        Self {
            level,
            code,
            message: message.into(),
            rule_id: None,
            standard: None,
        }
    }

    pub fn with_rule(mut self, rule_id: impl Into<String>) -> Self {
        self.rule_id = Some(rule_id.into());
        self
    }

    pub fn with_standard(mut self, standard: impl Into<String>) -> Self {
        self.standard = Some(standard.into());
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Stats {
    /// Rules that produced a verdict. Errored rules are not counted.
    pub rules_checked: usize,
    pub rules_passed: usize,
    pub rules_failed: usize,
    pub rules_errored: usize,
    pub violations_found: usize,
    pub critical_count: usize,
    pub major_count: usize,
    pub minor_count: usize,
}

impl Stats {
    pub(crate) fn count(&mut self, severity: Severity) {
        match severity {
            Severity::Critical => self.critical_count += 1,
            Severity::Major => self.major_count += 1,
            Severity::Minor => self.minor_count += 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
    pub ok: bool,
    pub violations: Vec<Violation>,
    pub warnings: Vec<Warning>,
    pub stats: Stats,
}

impl ValidationResult {
    pub fn has_violations_at_or_above(&self, threshold: Severity) -> bool {
        self.violations
            .iter()
            .any(|v| v.severity.is_at_least(threshold))
    }

    pub fn has_warnings_at_or_above(&self, threshold: WarningLevel) -> bool {
        self.warnings.iter().any(|w| w.level.is_at_least(threshold))
    }

    /// Input was rejected before any rule ran.
    pub fn is_degenerate(&self) -> bool {
        self.warnings
            .iter()
            .any(|w| matches!(w.code, WarningCode::EmptyText | WarningCode::NoStandards))
    }
}

/// Critical first, then rule id.
pub(crate) fn sort_violations(violations: &mut [Violation]) {
    violations.sort_by(|a, b| {
        b.severity
            .priority()
            .cmp(&a.severity.priority())
            .then_with(|| a.rule_id.cmp(&b.rule_id))
    });
}
