//! Immutable rule registry.
//!
//! Built once from loaded packs. The build compiles every matcher and
//! collects every problem before failing, so a broken pack is fixed in one
//! pass rather than one error at a time.

use crate::error::{BuildError, BuildProblem};
use crate::matchers::Matcher;
use crate::packs::LoadedPack;
use crate::types::{Severity, Standard};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, BTreeSet, HashMap};

#[derive(Debug, Clone)]
pub struct ComplianceRule {
    pub id: String,
    pub standard: Standard,
    /// Clause of `standard` this rule enforces; links into the cross-standard map.
    pub clause: Option<String>,
    pub category: String,
    pub severity: Severity,
    pub requirement: String,
    pub description: Option<String>,
    pub remediation: String,
    pub matcher: Matcher,
    /// Name of the pack that defined the rule.
    pub pack: String,
}

/// Pack metadata retained after the build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackInfo {
    pub name: String,
    pub version: String,
    pub standard: String,
    pub digest: String,
    pub source: String,
    pub rules: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disclaimer: Option<String>,
}

#[derive(Debug, Clone)]
pub struct RuleRegistry {
    rules: Vec<ComplianceRule>,
    by_id: HashMap<String, usize>,
    packs: Vec<PackInfo>,
    digest: String,
}

impl RuleRegistry {
    pub fn from_packs(packs: &[LoadedPack]) -> Result<Self, BuildError> {
        let mut problems = Vec::new();
        let mut rules: Vec<ComplianceRule> = Vec::new();
        let mut by_id: HashMap<String, usize> = HashMap::new();
        let mut origin_of: HashMap<String, String> = HashMap::new();
        let mut infos = Vec::with_capacity(packs.len());
        let mut seen_packs = BTreeSet::new();

        for pack in packs {
            let def = &pack.definition;
            if !seen_packs.insert(def.name.clone()) {
                problems.push(BuildProblem::new(&def.name, None, "pack loaded more than once"));
                continue;
            }

            let pack_standard = def.standard.parse::<Standard>();
            if let Err(e) = &pack_standard {
                problems.push(BuildProblem::new(&def.name, None, e.to_string()));
            }

            for rule in &def.rules {
                let id = rule.id.trim();
                let item = if id.is_empty() { None } else { Some(id) };
                let mut ok = true;

                if id.is_empty() {
                    problems.push(BuildProblem::new(&def.name, None, "rule with empty id"));
                    ok = false;
                } else if let Some(first) = origin_of.get(id) {
                    problems.push(BuildProblem::new(
                        &def.name,
                        item,
                        format!("duplicate rule id (first defined in pack '{}')", first),
                    ));
                    ok = false;
                }

                let standard = match (&rule.standard, &pack_standard) {
                    (Some(s), _) => match s.parse::<Standard>() {
                        Ok(s) => Some(s),
                        Err(e) => {
                            problems.push(BuildProblem::new(&def.name, item, e.to_string()));
                            None
                        }
                    },
                    (None, Ok(s)) => Some(*s),
                    // already reported at pack level
                    (None, Err(_)) => None,
                };

                if rule.requirement.trim().is_empty() {
                    problems.push(BuildProblem::new(&def.name, item, "empty requirement"));
                    ok = false;
                }
                if rule.category.trim().is_empty() {
                    problems.push(BuildProblem::new(&def.name, item, "empty category"));
                    ok = false;
                }
                if matches!(&rule.clause, Some(c) if c.trim().is_empty()) {
                    problems.push(BuildProblem::new(&def.name, item, "empty clause"));
                    ok = false;
                }

                let matcher = match Matcher::compile(&rule.matcher) {
                    Ok(m) => Some(m),
                    Err(errs) => {
                        problems.extend(errs.into_iter().map(|e| {
                            BuildProblem::new(
                                &def.name,
                                item,
                                format!("{} matcher: {}", rule.matcher.type_name(), e),
                            )
                        }));
                        None
                    }
                };

                if !id.is_empty() {
                    origin_of
                        .entry(id.to_string())
                        .or_insert_with(|| def.name.clone());
                }

                if let (true, Some(standard), Some(matcher)) = (ok, standard, matcher) {
                    by_id.insert(id.to_string(), rules.len());
                    rules.push(ComplianceRule {
                        id: id.to_string(),
                        standard,
                        clause: rule.clause.as_ref().map(|c| c.trim().to_string()),
                        category: rule.category.trim().to_string(),
                        severity: rule.severity,
                        requirement: rule.requirement.trim().to_string(),
                        description: rule.description.clone(),
                        remediation: rule.remediation.clone().unwrap_or_default(),
                        matcher,
                        pack: def.name.clone(),
                    });
                }
            }

            infos.push(PackInfo {
                name: def.name.clone(),
                version: def.version.clone(),
                standard: def.standard.clone(),
                digest: pack.digest.clone(),
                source: pack.source.to_string(),
                rules: def.rules.len(),
                source_url: def.source_url.clone(),
                disclaimer: def.disclaimer.clone(),
            });
        }

        if !problems.is_empty() {
            tracing::warn!(problems = problems.len(), "rule registry build failed");
            return Err(BuildError { problems });
        }

        let digest = ruleset_digest(&infos);
        tracing::info!(rules = rules.len(), packs = infos.len(), %digest, "rule registry built");
        Ok(Self {
            rules,
            by_id,
            packs: infos,
            digest,
        })
    }

    /// Rules of `standard`, in pack insertion order, optionally filtered to
    /// `categories` (case-insensitive).
    pub fn rules_for<'r>(
        &'r self,
        standard: Standard,
        categories: Option<&[String]>,
    ) -> Vec<&'r ComplianceRule> {
        self.rules
            .iter()
            .filter(|r| r.standard == standard)
            .filter(|r| match categories {
                None => true,
                Some(cats) => cats.iter().any(|c| c.trim().eq_ignore_ascii_case(&r.category)),
            })
            .collect()
    }

    pub fn get(&self, id: &str) -> Option<&ComplianceRule> {
        self.by_id.get(id).map(|&idx| &self.rules[idx])
    }

    pub fn iter(&self) -> impl Iterator<Item = &ComplianceRule> {
        self.rules.iter()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Rule count per standard.
    pub fn summary(&self) -> BTreeMap<Standard, usize> {
        let mut counts = BTreeMap::new();
        for rule in &self.rules {
            *counts.entry(rule.standard).or_insert(0) += 1;
        }
        counts
    }

    /// Sorted distinct categories, optionally restricted to some standards.
    pub fn categories(&self, standards: Option<&[Standard]>) -> Vec<String> {
        self.rules
            .iter()
            .filter(|r| standards.is_none_or(|s| s.contains(&r.standard)))
            .map(|r| r.category.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Standards with at least one rule.
    pub fn standards(&self) -> Vec<Standard> {
        self.summary().into_keys().collect()
    }

    pub fn packs(&self) -> &[PackInfo] {
        &self.packs
    }

    /// `sha256:<hex>` over the ordered pack names, versions and digests.
    pub fn digest(&self) -> &str {
        &self.digest
    }
}

fn ruleset_digest(packs: &[PackInfo]) -> String {
    let mut hasher = Sha256::new();
    for pack in packs {
        hasher.update(format!("{}@{}={}\n", pack.name, pack.version, pack.digest).as_bytes());
    }
    format!("sha256:{}", hex::encode(hasher.finalize()))
}
