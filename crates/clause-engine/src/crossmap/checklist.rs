use super::{CrossMap, CrossMapError, CrossMapResult, NodeId};
use crate::types::Standard;
use serde::Serialize;

/// One required item for an activity, tagged with its source clauses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChecklistItem {
    pub item: String,
    pub sources: Vec<NodeId>,
}

impl CrossMap {
    /// Items required for `activity` under `standards`.
    ///
    /// Sources are filtered to the requested standards; an item left with no
    /// source is omitted. Item order follows the map definition.
    pub fn generate_checklist(
        &self,
        activity: &str,
        standards: &[Standard],
    ) -> CrossMapResult<Vec<ChecklistItem>> {
        let key = activity.trim().to_lowercase();
        let items = self
            .checklists
            .get(&key)
            .ok_or_else(|| CrossMapError::UnknownActivity {
                activity: activity.to_string(),
                available: self.activities().join(", "),
            })?;

        Ok(items
            .iter()
            .filter_map(|item| {
                let sources: Vec<NodeId> = item
                    .sources
                    .iter()
                    .filter(|s| standards.contains(&s.standard))
                    .cloned()
                    .collect();
                (!sources.is_empty()).then(|| ChecklistItem {
                    item: item.item.clone(),
                    sources,
                })
            })
            .collect())
    }

    /// Activities with a checklist, sorted.
    pub fn activities(&self) -> Vec<&str> {
        self.checklists.keys().map(String::as_str).collect()
    }
}
