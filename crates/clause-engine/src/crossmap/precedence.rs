//! "Strictest standard wins" lookups.
//!
//! The precedence table is authored domain knowledge carried in the map
//! definition. Nothing here ranks standards on its own beyond the configured
//! fallback order.

use super::{CrossMap, NodeId};
use crate::types::Standard;
use serde::Serialize;
use std::collections::BTreeMap;

/// Topic entry of the precedence table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PrecedenceRule {
    pub topic: String,
    pub members: Vec<NodeId>,
    pub strictest: Standard,
    pub rationale: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StrictestRequirement {
    pub standard: Standard,
    /// Clauses of `standard` within the input set.
    pub clauses: Vec<String>,
    /// Topic whose precedence entry decided, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    pub rationale: String,
}

impl CrossMap {
    /// Strictest requirement among an equivalent set, as returned by
    /// [`find_equivalents`](CrossMap::find_equivalents).
    ///
    /// The first precedence entry that shares a member with the set and whose
    /// strictest standard is present decides. Otherwise the first standard of
    /// `priority_order` present in the set wins. An empty set has no answer.
    pub fn strictest_requirement(
        &self,
        set: &BTreeMap<Standard, Vec<String>>,
    ) -> Option<StrictestRequirement> {
        let present = |standard: Standard| set.get(&standard).is_some_and(|c| !c.is_empty());
        let in_set = |id: &NodeId| {
            set.get(&id.standard)
                .is_some_and(|clauses| clauses.iter().any(|c| *c == id.clause))
        };

        if let Some(rule) = self
            .precedence
            .iter()
            .find(|rule| present(rule.strictest) && rule.members.iter().any(in_set))
        {
            return Some(StrictestRequirement {
                standard: rule.strictest,
                clauses: set.get(&rule.strictest).cloned().unwrap_or_default(),
                topic: Some(rule.topic.clone()),
                rationale: rule.rationale.clone(),
            });
        }

        let fallback = self
            .priority_order
            .iter()
            .copied()
            .find(|s| present(*s))
            .or_else(|| set.iter().find(|(_, c)| !c.is_empty()).map(|(s, _)| *s))?;
        Some(StrictestRequirement {
            standard: fallback,
            clauses: set.get(&fallback).cloned().unwrap_or_default(),
            topic: None,
            rationale: format!(
                "No topic precedence applies; {} ranks first in the configured priority order",
                fallback
            ),
        })
    }

    pub fn strictest_for_topic(&self, topic: &str) -> Option<&PrecedenceRule> {
        let topic = topic.trim();
        self.precedence
            .iter()
            .find(|rule| rule.topic.eq_ignore_ascii_case(topic))
    }

    pub fn precedence(&self) -> &[PrecedenceRule] {
        &self.precedence
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::small;
    use super::*;

    #[test]
    fn test_topic_precedence_decides() {
        let map = small();
        let set = map.find_equivalents(Standard::Osha, "1910.38").unwrap();
        let strictest = map.strictest_requirement(&set).unwrap();
        assert_eq!(strictest.standard, Standard::Law6331);
        assert_eq!(strictest.clauses, vec!["Art.11"]);
        assert_eq!(strictest.topic.as_deref(), Some("emergency"));
    }

    #[test]
    fn test_falls_back_to_priority_order() {
        let map = small();
        let mut set = BTreeMap::new();
        set.insert(Standard::Osha, vec!["1910.95".to_string()]);
        set.insert(Standard::WbEss, vec!["ESS4.3".to_string()]);
        let strictest = map.strictest_requirement(&set).unwrap();
        assert_eq!(strictest.standard, Standard::Osha);
        assert!(strictest.topic.is_none());
    }

    #[test]
    fn test_strictest_standard_absent_from_set_skips_entry() {
        let map = small();
        let mut set = BTreeMap::new();
        set.insert(Standard::Iso45001, vec!["8.2".to_string()]);
        set.insert(Standard::Osha, vec!["1910.38".to_string()]);
        let strictest = map.strictest_requirement(&set).unwrap();
        assert_eq!(strictest.standard, Standard::Osha);
        assert!(strictest.topic.is_none());
    }

    #[test]
    fn test_empty_set() {
        assert!(small().strictest_requirement(&BTreeMap::new()).is_none());
    }

    #[test]
    fn test_topic_lookup_is_case_insensitive() {
        let map = small();
        assert_eq!(
            map.strictest_for_topic("Emergency").map(|r| r.strictest),
            Some(Standard::Law6331)
        );
        assert!(map.strictest_for_topic("noise").is_none());
    }
}
