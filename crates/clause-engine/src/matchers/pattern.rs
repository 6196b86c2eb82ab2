//! Required patterns, term obligations and numeric extraction.

use super::{build_regex, extract_numbers, fill, normalize_terms, Document, MatchOutcome};
use crate::packs::schema::{MatcherDefinition, RequireClause, Trigger};
use regex::Regex;

const DEFAULT_MESSAGE: &str = "Missing required section: {description}";

#[derive(Debug, Clone)]
struct RequiredRegex {
    regex: Regex,
    description: String,
}

#[derive(Debug, Clone)]
struct Obligation {
    any_of: Vec<String>,
    when_present: Vec<String>,
    message: String,
}

impl Obligation {
    fn compile(clause: &RequireClause, at: &str) -> Result<Self, String> {
        let any_of = normalize_terms(&clause.any_of, false);
        if any_of.is_empty() {
            return Err(format!("{}: any_of has no terms", at));
        }
        Ok(Self {
            any_of,
            when_present: normalize_terms(&clause.when_present, false),
            message: clause.message.clone(),
        })
    }

    /// `None` when satisfied or not applicable.
    fn check(&self, doc: &Document<'_>, value: Option<f64>) -> Option<String> {
        if !self.when_present.is_empty() && !self.when_present.iter().any(|t| doc.contains(t, false))
        {
            return None;
        }
        if self.any_of.iter().any(|t| doc.contains(t, false)) {
            return None;
        }
        Some(match value {
            Some(v) => fill(&self.message, "value", &v.to_string()),
            None => self.message.clone(),
        })
    }
}

#[derive(Debug, Clone)]
struct Extraction {
    regex: Regex,
    trigger: Trigger,
    requires: Vec<Obligation>,
}

#[derive(Debug, Clone)]
pub struct PatternMatcher {
    required: Vec<RequiredRegex>,
    message: String,
    requires: Vec<Obligation>,
    extract: Option<Extraction>,
}

impl PatternMatcher {
    pub fn compile(def: &MatcherDefinition) -> Result<Self, Vec<String>> {
        let MatcherDefinition::Pattern {
            required,
            message,
            requires,
            extract,
        } = def
        else {
            return Err(vec![format!("expected pattern matcher, got {}", def.type_name())]);
        };

        let mut problems = Vec::new();
        if required.is_empty() && requires.is_empty() && extract.is_none() {
            problems.push("pattern matcher has nothing to check".to_string());
        }

        let mut compiled_required = Vec::with_capacity(required.len());
        for (idx, req) in required.iter().enumerate() {
            match build_regex(&req.pattern) {
                Ok(regex) => compiled_required.push(RequiredRegex {
                    regex,
                    description: req.description.clone(),
                }),
                Err(e) => problems.push(format!("required[{}]: {}", idx, e)),
            }
        }

        let mut obligations = Vec::with_capacity(requires.len());
        for (idx, clause) in requires.iter().enumerate() {
            match Obligation::compile(clause, &format!("requires[{}]", idx)) {
                Ok(o) => obligations.push(o),
                Err(e) => problems.push(e),
            }
        }

        let extraction = match extract {
            None => None,
            Some(ex) => {
                let regex = match build_regex(&ex.pattern) {
                    Ok(re) if re.captures_len() < 2 => {
                        problems.push(format!(
                            "extract pattern '{}' has no capture group",
                            ex.pattern
                        ));
                        None
                    }
                    Ok(re) => Some(re),
                    Err(e) => {
                        problems.push(format!("extract: {}", e));
                        None
                    }
                };
                if ex.requires.is_empty() {
                    problems.push("extract has no requires".to_string());
                }
                let mut ex_obligations = Vec::with_capacity(ex.requires.len());
                for (idx, clause) in ex.requires.iter().enumerate() {
                    match Obligation::compile(clause, &format!("extract.requires[{}]", idx)) {
                        Ok(o) => ex_obligations.push(o),
                        Err(e) => problems.push(e),
                    }
                }
                regex.map(|regex| Extraction {
                    regex,
                    trigger: ex.trigger,
                    requires: ex_obligations,
                })
            }
        };

        if !problems.is_empty() {
            return Err(problems);
        }
        Ok(Self {
            required: compiled_required,
            message: message.clone().unwrap_or_else(|| DEFAULT_MESSAGE.to_string()),
            requires: obligations,
            extract: extraction,
        })
    }

    pub fn evaluate(&self, doc: &Document<'_>) -> MatchOutcome {
        let mut issues: Vec<String> = self
            .required
            .iter()
            .filter(|r| !r.regex.is_match(doc.raw()))
            .map(|r| fill(&self.message, "description", &r.description))
            .collect();

        issues.extend(self.requires.iter().filter_map(|o| o.check(doc, None)));

        if let Some(ex) = &self.extract {
            let fired = extract_numbers(&ex.regex, doc.raw())
                .into_iter()
                .find(|v| ex.trigger.op.holds(*v, ex.trigger.value));
            if let Some(value) = fired {
                tracing::trace!(value, "extraction trigger fired");
                issues.extend(ex.requires.iter().filter_map(|o| o.check(doc, Some(value))));
            }
        }

        MatchOutcome::from_issues(issues)
    }
}
