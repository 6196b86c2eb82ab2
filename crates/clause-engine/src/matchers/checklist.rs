//! Enumerated categories, each satisfied by any (or all) of its terms.

use super::{fill, normalize_terms, Document, MatchOutcome};
use crate::packs::schema::{MatchMode, MatcherDefinition};

const DEFAULT_MESSAGE: &str = "Missing checklist item: {category}";

#[derive(Debug, Clone)]
struct Category {
    name: String,
    terms: Vec<String>,
    mode: MatchMode,
}

#[derive(Debug, Clone)]
pub struct ChecklistMatcher {
    categories: Vec<Category>,
    message: String,
}

impl ChecklistMatcher {
    pub fn compile(def: &MatcherDefinition) -> Result<Self, Vec<String>> {
        let MatcherDefinition::Checklist {
            categories,
            message,
        } = def
        else {
            return Err(vec![format!("expected checklist matcher, got {}", def.type_name())]);
        };

        let mut problems = Vec::new();
        if categories.is_empty() {
            problems.push("checklist has no categories".to_string());
        }
        let mut compiled = Vec::with_capacity(categories.len());
        for cat in categories {
            let terms = normalize_terms(&cat.terms, false);
            if terms.is_empty() {
                problems.push(format!("checklist category '{}' has no terms", cat.name));
                continue;
            }
            compiled.push(Category {
                name: cat.name.clone(),
                terms,
                mode: cat.mode,
            });
        }

        if !problems.is_empty() {
            return Err(problems);
        }
        Ok(Self {
            categories: compiled,
            message: message.clone().unwrap_or_else(|| DEFAULT_MESSAGE.to_string()),
        })
    }

    pub fn evaluate(&self, doc: &Document<'_>) -> MatchOutcome {
        let issues = self
            .categories
            .iter()
            .filter(|cat| {
                let satisfied = match cat.mode {
                    MatchMode::Any => cat.terms.iter().any(|t| doc.contains(t, false)),
                    MatchMode::All => cat.terms.iter().all(|t| doc.contains(t, false)),
                };
                !satisfied
            })
            .map(|cat| fill(&self.message, "category", &cat.name))
            .collect();
        MatchOutcome::from_issues(issues)
    }
}
