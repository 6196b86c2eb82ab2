//! Literal term presence.

use super::{fill, normalize_terms, Document, MatchOutcome, MatcherError};
use crate::context::ValidationContext;
use crate::packs::schema::{MatchMode, MatcherDefinition};
use std::collections::BTreeMap;

const DEFAULT_ALL_MESSAGE: &str = "Missing required term: {term}";
const DEFAULT_ANY_MESSAGE: &str = "None of the expected terms found: {terms}";

#[derive(Debug, Clone)]
enum TermSource {
    Fixed(Vec<String>),
    ByContext {
        key: String,
        default: String,
        table: BTreeMap<String, Vec<String>>,
    },
}

#[derive(Debug, Clone)]
pub struct KeywordMatcher {
    source: TermSource,
    mode: MatchMode,
    case_sensitive: bool,
    message: String,
}

impl KeywordMatcher {
    pub fn compile(def: &MatcherDefinition) -> Result<Self, Vec<String>> {
        let MatcherDefinition::Keyword {
            terms,
            terms_by_context,
            mode,
            case_sensitive,
            message,
        } = def
        else {
            return Err(vec![format!("expected keyword matcher, got {}", def.type_name())]);
        };

        let mut problems: Vec<String> = Vec::new();
        let source = match (terms.is_empty(), terms_by_context) {
            (false, Some(_)) => {
                problems.push("keyword matcher takes either terms or terms_by_context, not both".into());
                None
            }
            (true, None) => {
                problems.push("keyword matcher has no terms".into());
                None
            }
            (false, None) => {
                let folded = normalize_terms(terms, *case_sensitive);
                if folded.is_empty() {
                    problems.push("keyword matcher has only blank terms".into());
                }
                Some(TermSource::Fixed(folded))
            }
            (true, Some(table)) => {
                if table.key.trim().is_empty() {
                    problems.push("terms_by_context.key is empty".into());
                }
                let mut folded = BTreeMap::new();
                for (value, list) in &table.table {
                    let list = normalize_terms(list, *case_sensitive);
                    if list.is_empty() {
                        problems.push(format!("terms_by_context entry '{}' has no terms", value));
                    }
                    folded.insert(value.trim().to_lowercase(), list);
                }
                let default = table.default.trim().to_lowercase();
                if !folded.contains_key(&default) {
                    problems.push(format!(
                        "terms_by_context.default '{}' has no table entry",
                        table.default.trim()
                    ));
                }
                Some(TermSource::ByContext {
                    key: table.key.clone(),
                    default,
                    table: folded,
                })
            }
        };

        match source {
            Some(source) if problems.is_empty() => Ok(Self {
                source,
                mode: *mode,
                case_sensitive: *case_sensitive,
                message: message.clone().unwrap_or_else(|| {
                    match mode {
                        MatchMode::All => DEFAULT_ALL_MESSAGE,
                        MatchMode::Any => DEFAULT_ANY_MESSAGE,
                    }
                    .to_string()
                }),
            }),
            _ => Err(problems),
        }
    }

    /// Terms in effect for this context.
    pub fn terms_for<'m>(&'m self, ctx: &ValidationContext) -> Result<&'m [String], MatcherError> {
        match &self.source {
            TermSource::Fixed(terms) => Ok(terms),
            TermSource::ByContext {
                key,
                default,
                table,
            } => {
                let selected = ctx
                    .lookup_key(key)?
                    .map(|v| v.to_lowercase())
                    .and_then(|v| table.get(&v))
                    .or_else(|| table.get(default));
                selected.map(Vec::as_slice).ok_or_else(|| {
                    MatcherError::Internal(format!("default entry '{}' missing", default))
                })
            }
        }
    }

    pub fn evaluate(
        &self,
        doc: &Document<'_>,
        ctx: &ValidationContext,
    ) -> Result<MatchOutcome, MatcherError> {
        let terms = self.terms_for(ctx)?;
        let issues = match self.mode {
            MatchMode::All => terms
                .iter()
                .filter(|t| !doc.contains(t, self.case_sensitive))
                .map(|t| fill(&self.message, "term", t))
                .collect(),
            MatchMode::Any => {
                if terms.iter().any(|t| doc.contains(t, self.case_sensitive)) {
                    Vec::new()
                } else {
                    vec![fill(&self.message, "terms", &terms.join(", "))]
                }
            }
        };
        Ok(MatchOutcome::from_issues(issues))
    }
}
