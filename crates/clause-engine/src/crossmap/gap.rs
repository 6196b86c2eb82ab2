use super::CrossMap;
use crate::types::Standard;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GapEntry {
    pub clause: String,
    pub title: String,
    /// Equivalent clauses in the covered standards.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub via: BTreeMap<Standard, Vec<String>>,
}

/// Which clauses of `target` are reachable from the `covered` standards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GapReport {
    pub target: Standard,
    pub covered: Vec<Standard>,
    pub satisfied: Vec<GapEntry>,
    pub gaps: Vec<GapEntry>,
}

impl GapReport {
    pub fn total(&self) -> usize {
        self.satisfied.len() + self.gaps.len()
    }

    /// Fraction of target clauses with a mapped equivalent (1.0 when the
    /// target has no clauses).
    pub fn coverage(&self) -> f64 {
        if self.total() == 0 {
            1.0
        } else {
            self.satisfied.len() as f64 / self.total() as f64
        }
    }
}

impl CrossMap {
    /// Clauses of `target` with and without a reachable equivalent in any of
    /// `covered`. `target` itself never counts as covering.
    pub fn gap_analysis(&self, target: Standard, covered: &[Standard]) -> GapReport {
        let mut covering: Vec<Standard> =
            covered.iter().copied().filter(|s| *s != target).collect();
        covering.sort();
        covering.dedup();

        let mut satisfied = Vec::new();
        let mut gaps = Vec::new();
        for node in self.clauses_for(target) {
            let via: BTreeMap<Standard, Vec<String>> = self
                .related_clauses(target, &node.id.clause)
                .unwrap_or_default()
                .into_iter()
                .filter(|(s, _)| covering.contains(s))
                .collect();
            let entry = GapEntry {
                clause: node.id.clause.clone(),
                title: node.title.clone(),
                via,
            };
            if entry.via.is_empty() {
                gaps.push(entry);
            } else {
                satisfied.push(entry);
            }
        }

        tracing::debug!(
            %target,
            satisfied = satisfied.len(),
            gaps = gaps.len(),
            "gap analysis"
        );
        GapReport {
            target,
            covered: covering,
            satisfied,
            gaps,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::small;
    use super::*;

    #[test]
    fn test_gap_analysis_against_one_standard() {
        let map = small();
        let report = map.gap_analysis(Standard::Osha, &[Standard::Iso45001]);
        let satisfied: Vec<_> = report.satisfied.iter().map(|e| e.clause.as_str()).collect();
        let gaps: Vec<_> = report.gaps.iter().map(|e| e.clause.as_str()).collect();
        assert_eq!(satisfied, vec!["1910.38"]);
        assert_eq!(gaps, vec!["1910.95"]);
        assert_eq!(report.satisfied[0].via[&Standard::Iso45001], vec!["8.2"]);
        assert!((report.coverage() - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_target_does_not_cover_itself() {
        let map = small();
        let report = map.gap_analysis(Standard::Osha, &[Standard::Osha]);
        assert!(report.covered.is_empty());
        assert_eq!(report.gaps.len(), 2);
    }

    #[test]
    fn test_nothing_covered() {
        let report = small().gap_analysis(Standard::WbEss, &[]);
        assert_eq!(report.total(), 1);
        assert_eq!(report.gaps[0].clause, "ESS4.3");
    }
}
