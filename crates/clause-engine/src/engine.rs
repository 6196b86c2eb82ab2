//! Validation orchestrator.
//!
//! [`validate`] is a pure function of the registry, the map and the request.
//! [`Engine`] holds the current registry and map as one snapshot that can be
//! swapped atomically; calls already running keep the snapshot they started
//! with.

use crate::config::EngineConfig;
use crate::context::ValidationContext;
use crate::crossmap::{CrossMap, LoadedCrossMap};
use crate::error::{BuildError, EngineError};
use crate::matchers::Document;
use crate::packs::LoadedPack;
use crate::registry::RuleRegistry;
use crate::report::{sort_violations, Stats, ValidationResult, Violation, Warning, WarningCode};
use crate::types::{Standard, WarningLevel};
use arc_swap::ArcSwap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Input of one validation call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ValidationRequest {
    pub text: String,
    /// Standard wire names. Unknown names produce a warning, not an error.
    pub standards: Vec<String>,
    #[serde(default)]
    pub context: ValidationContext,
    /// Restrict evaluation to these categories. `None` or empty means all.
    #[serde(default)]
    pub categories: Option<Vec<String>>,
}

impl ValidationRequest {
    pub fn new<S: Into<String>>(
        text: impl Into<String>,
        standards: impl IntoIterator<Item = S>,
    ) -> Self {
        Self {
            text: text.into(),
            standards: standards.into_iter().map(Into::into).collect(),
            context: ValidationContext::default(),
            categories: None,
        }
    }

    pub fn with_context(mut self, context: ValidationContext) -> Self {
        self.context = context;
        self
    }

    pub fn with_categories<S: Into<String>>(mut self, categories: impl IntoIterator<Item = S>) -> Self {
        self.categories = Some(categories.into_iter().map(Into::into).collect());
        self
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidateOptions {
    /// Warnings at or above this level make the result not ok.
    pub fail_on_warning: Option<WarningLevel>,
    /// Attach equivalent clauses of other standards to each violation.
    pub expand_related: bool,
}

/// Evaluate `request` against `registry`.
///
/// Never fails: degenerate input, unknown standards and matcher errors are
/// reported as warnings. `crossmap` is only consulted when
/// `options.expand_related` is set.
pub fn validate(
    registry: &RuleRegistry,
    crossmap: Option<&CrossMap>,
    request: &ValidationRequest,
    options: &ValidateOptions,
) -> ValidationResult {
    let mut warnings = Vec::new();

    if request.text.trim().is_empty() {
        warnings.push(Warning::new(
            WarningLevel::Error,
            WarningCode::EmptyText,
            "Input text is empty; nothing to validate",
        ));
    }
    if request.standards.is_empty() {
        warnings.push(Warning::new(
            WarningLevel::Error,
            WarningCode::NoStandards,
            "No standards requested",
        ));
    }
    if !warnings.is_empty() {
        tracing::info!(warnings = warnings.len(), "degenerate validation request rejected");
        return ValidationResult {
            ok: false,
            violations: Vec::new(),
            warnings,
            stats: Stats::default(),
        };
    }

    let mut standards: Vec<Standard> = Vec::with_capacity(request.standards.len());
    for name in &request.standards {
        match name.trim().parse::<Standard>() {
            Ok(s) if standards.contains(&s) => {}
            Ok(s) => standards.push(s),
            Err(_) => {
                tracing::warn!(standard = %name, "unknown standard skipped");
                warnings.push(
                    Warning::new(
                        WarningLevel::Info,
                        WarningCode::UnknownStandard,
                        format!(
                            "Unknown standard '{}' skipped (known: {})",
                            name,
                            Standard::ALL.map(|s| s.as_str()).join(", ")
                        ),
                    )
                    .with_standard(name.clone()),
                );
            }
        }
    }

    let categories = request.categories.as_deref().filter(|c| !c.is_empty());
    if let Some(requested) = categories {
        let known = registry.categories(Some(standards.as_slice()));
        for category in requested {
            if !known.iter().any(|k| k.eq_ignore_ascii_case(category.trim())) {
                warnings.push(Warning::new(
                    WarningLevel::Info,
                    WarningCode::UnknownCategory,
                    format!(
                        "Category '{}' matches no rule of the requested standards",
                        category
                    ),
                ));
            }
        }
    }

    let doc = Document::new(&request.text);
    let mut stats = Stats::default();
    let mut violations = Vec::new();

    for standard in &standards {
        for rule in registry.rules_for(*standard, categories) {
            match rule.matcher.evaluate(&doc, &request.context) {
                Ok(outcome) if outcome.compliant => {
                    stats.rules_checked += 1;
                    stats.rules_passed += 1;
                    tracing::debug!(rule = %rule.id, "rule passed");
                }
                Ok(outcome) => {
                    stats.rules_checked += 1;
                    stats.rules_failed += 1;
                    stats.count(rule.severity);
                    tracing::debug!(rule = %rule.id, issues = outcome.issues.len(), "rule failed");
                    let related = match (options.expand_related, crossmap, &rule.clause) {
                        (true, Some(map), Some(clause)) => map
                            .related_clauses(rule.standard, clause)
                            .unwrap_or_default(),
                        _ => BTreeMap::new(),
                    };
                    violations.push(Violation {
                        rule_id: rule.id.clone(),
                        standard: rule.standard,
                        category: rule.category.clone(),
                        severity: rule.severity,
                        requirement: rule.requirement.clone(),
                        clause: rule.clause.clone(),
                        issues: outcome.issues,
                        remediation: rule.remediation.clone(),
                        description: rule.description.clone(),
                        related,
                    });
                }
                Err(e) => {
                    stats.rules_errored += 1;
                    tracing::warn!(rule = %rule.id, error = %e, "matcher failed");
                    warnings.push(
                        Warning::new(
                            WarningLevel::Error,
                            WarningCode::MatcherFailed,
                            format!("Rule {} execution failed: {}", rule.id, e),
                        )
                        .with_rule(rule.id.clone())
                        .with_standard(rule.standard.as_str()),
                    );
                }
            }
        }
    }

    sort_violations(&mut violations);
    stats.violations_found = violations.len();

    let blocked_by_warning = options
        .fail_on_warning
        .is_some_and(|level| warnings.iter().any(|w| w.level.is_at_least(level)));
    let ok = violations.is_empty() && !blocked_by_warning;

    tracing::info!(
        ok,
        checked = stats.rules_checked,
        violations = stats.violations_found,
        warnings = warnings.len(),
        "validation complete"
    );
    ValidationResult {
        ok,
        violations,
        warnings,
        stats,
    }
}

/// Registry, map and options that are swapped together.
#[derive(Debug)]
pub struct Snapshot {
    pub registry: RuleRegistry,
    pub crossmap: CrossMap,
    pub options: ValidateOptions,
}

impl Snapshot {
    /// Build registry and map, reporting the problems of both.
    pub fn build(
        packs: &[LoadedPack],
        crossmap: &LoadedCrossMap,
        options: ValidateOptions,
    ) -> Result<Self, BuildError> {
        let registry = RuleRegistry::from_packs(packs);
        let map = CrossMap::build(crossmap);
        let (registry, map) = match (registry, map) {
            (Ok(r), Ok(m)) => (r, m),
            (r, m) => {
                let problems = r
                    .err()
                    .into_iter()
                    .chain(m.err())
                    .flat_map(|e| e.problems)
                    .collect();
                return Err(BuildError { problems });
            }
        };

        for rule in registry.iter() {
            if let Some(clause) = &rule.clause {
                if map.node(rule.standard, clause).is_none() {
                    tracing::debug!(rule = %rule.id, %clause, "rule clause has no cross-standard node");
                }
            }
        }

        Ok(Self {
            registry,
            crossmap: map,
            options,
        })
    }

    pub fn from_config(config: &EngineConfig) -> Result<Self, EngineError> {
        let packs = config.load_packs()?;
        let crossmap = config.load_crossmap()?;
        Ok(Self::build(&packs, &crossmap, config.options())?)
    }

    pub fn validate(&self, request: &ValidationRequest) -> ValidationResult {
        validate(&self.registry, Some(&self.crossmap), request, &self.options)
    }
}

/// Shareable engine with an atomically replaceable snapshot.
#[derive(Debug)]
pub struct Engine {
    current: ArcSwap<Snapshot>,
}

impl Engine {
    pub fn new(snapshot: Snapshot) -> Self {
        Self {
            current: ArcSwap::from_pointee(snapshot),
        }
    }

    /// Built-in packs and map, default options.
    pub fn builtin() -> Result<Self, EngineError> {
        Self::from_config(&EngineConfig::default())
    }

    pub fn from_config(config: &EngineConfig) -> Result<Self, EngineError> {
        Ok(Self::new(Snapshot::from_config(config)?))
    }

    /// The snapshot new calls will use.
    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.current.load_full()
    }

    pub fn validate(&self, request: &ValidationRequest) -> ValidationResult {
        self.current.load().validate(request)
    }

    pub fn validate_with(
        &self,
        request: &ValidationRequest,
        options: &ValidateOptions,
    ) -> ValidationResult {
        let snapshot = self.current.load();
        validate(&snapshot.registry, Some(&snapshot.crossmap), request, options)
    }

    /// Build a new snapshot and swap it in. On failure the current snapshot
    /// stays in place.
    pub fn reload(
        &self,
        packs: &[LoadedPack],
        crossmap: &LoadedCrossMap,
        options: ValidateOptions,
    ) -> Result<(), BuildError> {
        let next = Snapshot::build(packs, crossmap, options)?;
        self.swap(next);
        Ok(())
    }

    pub fn reload_from_config(&self, config: &EngineConfig) -> Result<(), EngineError> {
        let next = Snapshot::from_config(config)?;
        self.swap(next);
        Ok(())
    }

    fn swap(&self, next: Snapshot) {
        let digest = next.registry.digest().to_string();
        let previous = self.current.swap(Arc::new(next));
        tracing::info!(
            previous = %previous.registry.digest(),
            current = %digest,
            "engine snapshot reloaded"
        );
    }
}
