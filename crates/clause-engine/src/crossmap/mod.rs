//! Cross-standard requirement map.
//!
//! One node per (standard, clause). Edges record that a clause is equivalent
//! to, or implies, a clause of another standard. The graph may contain
//! cycles; every traversal is breadth-first with a visited set.

mod checklist;
mod gap;
mod precedence;

pub use checklist::ChecklistItem;
pub use gap::{GapEntry, GapReport};
pub use precedence::{PrecedenceRule, StrictestRequirement};

use crate::error::{BuildError, BuildProblem};
use crate::packs::{canonical_digest, BUILTIN_CROSSMAP};
use crate::types::Standard;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

const ORIGIN: &str = "crossmap";

#[derive(Debug, thiserror::Error)]
pub enum CrossMapError {
    #[error("Failed to read cross-standard map '{path}': {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse cross-standard map ({origin}): {message}")]
    Parse { origin: String, message: String },

    #[error("Unknown clause {standard}:{clause}")]
    UnknownClause { standard: Standard, clause: String },

    #[error("Unknown activity '{activity}'. Available: {available}")]
    UnknownActivity { activity: String, available: String },

    #[error("Invalid requirement id '{0}': expected STANDARD:clause")]
    InvalidNodeId(String),
}

pub type CrossMapResult<T> = Result<T, CrossMapError>;

/// `STANDARD:clause`, e.g. `OSHA:1910.146`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId {
    pub standard: Standard,
    pub clause: String,
}

impl NodeId {
    pub fn new(standard: Standard, clause: impl Into<String>) -> Self {
        Self {
            standard,
            clause: clause.into(),
        }
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.standard, self.clause)
    }
}

impl FromStr for NodeId {
    type Err = CrossMapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (standard, clause) = s
            .split_once(':')
            .ok_or_else(|| CrossMapError::InvalidNodeId(s.to_string()))?;
        let standard = standard
            .trim()
            .parse::<Standard>()
            .map_err(|_| CrossMapError::InvalidNodeId(s.to_string()))?;
        let clause = clause.trim();
        if clause.is_empty() {
            return Err(CrossMapError::InvalidNodeId(s.to_string()));
        }
        Ok(NodeId::new(standard, clause))
    }
}

impl Serialize for NodeId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

// ---------------------------------------------------------------------------
// YAML definition
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CrossMapDefinition {
    pub version: String,
    /// Fallback strictness order when no topic precedence applies.
    pub priority_order: Vec<String>,
    pub nodes: Vec<NodeDefinition>,
    #[serde(default)]
    pub edges: Vec<EdgeDefinition>,
    #[serde(default)]
    pub precedence: Vec<PrecedenceDefinition>,
    /// Activity -> required items.
    #[serde(default)]
    pub checklists: BTreeMap<String, Vec<ChecklistItemDefinition>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NodeDefinition {
    pub standard: String,
    pub clause: String,
    pub title: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub citation: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Relation {
    Equivalent,
    Implies,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EdgeDefinition {
    pub from: String,
    pub to: String,
    pub relation: Relation,
    #[serde(default)]
    pub citation: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PrecedenceDefinition {
    pub topic: String,
    pub members: Vec<String>,
    pub strictest: String,
    pub rationale: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChecklistItemDefinition {
    pub item: String,
    pub sources: Vec<String>,
}

/// A parsed, not yet validated, map definition.
#[derive(Debug, Clone)]
pub struct LoadedCrossMap {
    pub definition: CrossMapDefinition,
    pub digest: String,
    pub source: String,
}

pub fn load_crossmap_from_str(content: &str, source: &str) -> CrossMapResult<LoadedCrossMap> {
    let definition: CrossMapDefinition =
        serde_yaml::from_str(content).map_err(|e| CrossMapError::Parse {
            origin: source.to_string(),
            message: e.to_string(),
        })?;
    let digest = canonical_digest(&definition).map_err(|message| CrossMapError::Parse {
        origin: source.to_string(),
        message,
    })?;
    Ok(LoadedCrossMap {
        definition,
        digest,
        source: source.to_string(),
    })
}

pub fn load_crossmap_from_file(path: &Path) -> CrossMapResult<LoadedCrossMap> {
    let content = std::fs::read_to_string(path).map_err(|e| CrossMapError::Read {
        path: path.to_path_buf(),
        source: e,
    })?;
    load_crossmap_from_str(&content, &format!("file:{}", path.display()))
}

pub fn load_builtin_crossmap() -> CrossMapResult<LoadedCrossMap> {
    load_crossmap_from_str(BUILTIN_CROSSMAP, "builtin:crossmap")
}

// ---------------------------------------------------------------------------
// Built graph
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Link {
    pub target: NodeId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub citation: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequirementNode {
    pub id: NodeId,
    pub title: String,
    pub text: String,
    /// External regulation reference, for display only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub citation: Option<String>,
    pub implies: Vec<Link>,
    pub implied_by: Vec<Link>,
}

#[derive(Debug, Clone)]
pub struct CrossMap {
    version: String,
    digest: String,
    priority_order: Vec<Standard>,
    nodes: Vec<RequirementNode>,
    index: HashMap<NodeId, usize>,
    precedence: Vec<PrecedenceRule>,
    checklists: BTreeMap<String, Vec<ChecklistItem>>,
}

impl CrossMap {
    /// Validate a loaded definition and build the graph. Every problem is
    /// reported.
    pub fn build(loaded: &LoadedCrossMap) -> Result<Self, BuildError> {
        let def = &loaded.definition;
        let mut problems = Vec::new();

        let mut priority_order = Vec::with_capacity(def.priority_order.len());
        for name in &def.priority_order {
            match name.parse::<Standard>() {
                Ok(s) if priority_order.contains(&s) => problems.push(BuildProblem::new(
                    ORIGIN,
                    None,
                    format!("priority_order lists {} twice", s),
                )),
                Ok(s) => priority_order.push(s),
                Err(_) => problems.push(BuildProblem::new(
                    ORIGIN,
                    None,
                    format!("priority_order names unknown standard '{}'", name),
                )),
            }
        }

        let mut nodes: Vec<RequirementNode> = Vec::with_capacity(def.nodes.len());
        let mut index = HashMap::with_capacity(def.nodes.len());
        for node in &def.nodes {
            let label = format!("{}:{}", node.standard, node.clause);
            let standard = match node.standard.parse::<Standard>() {
                Ok(s) => s,
                Err(e) => {
                    problems.push(BuildProblem::new(ORIGIN, Some(&label), e.to_string()));
                    continue;
                }
            };
            let clause = node.clause.trim();
            if clause.is_empty() {
                problems.push(BuildProblem::new(ORIGIN, Some(&label), "empty clause"));
                continue;
            }
            let id = NodeId::new(standard, clause);
            if index.contains_key(&id) {
                problems.push(BuildProblem::new(ORIGIN, Some(&label), "duplicate node"));
                continue;
            }
            index.insert(id.clone(), nodes.len());
            nodes.push(RequirementNode {
                id,
                title: node.title.clone(),
                text: node.text.clone(),
                citation: node.citation.clone(),
                implies: Vec::new(),
                implied_by: Vec::new(),
            });
        }

        let resolve = |raw: &str, problems: &mut Vec<BuildProblem>, at: &str| -> Option<usize> {
            match raw.parse::<NodeId>() {
                Ok(id) => match index.get(&id) {
                    Some(&idx) => Some(idx),
                    None => {
                        problems.push(BuildProblem::new(
                            ORIGIN,
                            Some(at),
                            format!("references missing node {}", id),
                        ));
                        None
                    }
                },
                Err(e) => {
                    problems.push(BuildProblem::new(ORIGIN, Some(at), e.to_string()));
                    None
                }
            }
        };

        for edge in &def.edges {
            let at = format!("edge {} -> {}", edge.from, edge.to);
            let from = resolve(&edge.from, &mut problems, &at);
            let to = resolve(&edge.to, &mut problems, &at);
            let (Some(from), Some(to)) = (from, to) else {
                continue;
            };
            if from == to {
                problems.push(BuildProblem::new(ORIGIN, Some(&at), "edge to itself"));
                continue;
            }
            let forward = Link {
                target: nodes[to].id.clone(),
                citation: edge.citation.clone(),
            };
            let backward = Link {
                target: nodes[from].id.clone(),
                citation: edge.citation.clone(),
            };
            match edge.relation {
                Relation::Implies => {
                    nodes[from].implies.push(forward);
                    nodes[to].implied_by.push(backward);
                }
                Relation::Equivalent => {
                    nodes[from].implies.push(forward.clone());
                    nodes[from].implied_by.push(forward);
                    nodes[to].implies.push(backward.clone());
                    nodes[to].implied_by.push(backward);
                }
            }
        }

        let mut precedence = Vec::with_capacity(def.precedence.len());
        for rule in &def.precedence {
            let at = format!("precedence {}", rule.topic);
            let members: Vec<NodeId> = rule
                .members
                .iter()
                .filter_map(|m| resolve(m, &mut problems, &at))
                .map(|idx| nodes[idx].id.clone())
                .collect();
            match rule.strictest.parse::<Standard>() {
                Ok(strictest) if members.iter().any(|m| m.standard == strictest) => {
                    precedence.push(PrecedenceRule {
                        topic: rule.topic.clone(),
                        members,
                        strictest,
                        rationale: rule.rationale.clone(),
                    });
                }
                Ok(strictest) => problems.push(BuildProblem::new(
                    ORIGIN,
                    Some(&at),
                    format!("strictest standard {} is not among its members", strictest),
                )),
                Err(e) => problems.push(BuildProblem::new(ORIGIN, Some(&at), e.to_string())),
            }
        }

        let mut checklists = BTreeMap::new();
        for (activity, items) in &def.checklists {
            let at = format!("checklist {}", activity);
            let mut built = Vec::with_capacity(items.len());
            for item in items {
                if item.sources.is_empty() {
                    problems.push(BuildProblem::new(
                        ORIGIN,
                        Some(&at),
                        format!("item '{}' has no source clauses", item.item),
                    ));
                    continue;
                }
                let sources = item
                    .sources
                    .iter()
                    .filter_map(|s| resolve(s, &mut problems, &at))
                    .map(|idx| nodes[idx].id.clone())
                    .collect();
                built.push(ChecklistItem {
                    item: item.item.clone(),
                    sources,
                });
            }
            checklists.insert(activity.trim().to_lowercase(), built);
        }

        if !problems.is_empty() {
            tracing::warn!(problems = problems.len(), "cross-standard map build failed");
            return Err(BuildError { problems });
        }

        tracing::info!(
            nodes = nodes.len(),
            edges = def.edges.len(),
            topics = precedence.len(),
            activities = checklists.len(),
            "cross-standard map built"
        );
        Ok(Self {
            version: def.version.clone(),
            digest: loaded.digest.clone(),
            priority_order,
            nodes,
            index,
            precedence,
            checklists,
        })
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn digest(&self) -> &str {
        &self.digest
    }

    pub fn priority_order(&self) -> &[Standard] {
        &self.priority_order
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, standard: Standard, clause: &str) -> Option<&RequirementNode> {
        self.index_of(standard, clause).ok().map(|idx| &self.nodes[idx])
    }

    /// Nodes of one standard, in definition order.
    pub fn clauses_for(&self, standard: Standard) -> Vec<&RequirementNode> {
        self.nodes
            .iter()
            .filter(|n| n.id.standard == standard)
            .collect()
    }

    fn index_of(&self, standard: Standard, clause: &str) -> CrossMapResult<usize> {
        self.index
            .get(&NodeId::new(standard, clause.trim()))
            .copied()
            .ok_or_else(|| CrossMapError::UnknownClause {
                standard,
                clause: clause.to_string(),
            })
    }

    /// Every node reachable from `(standard, clause)` over `implies` and
    /// `implied_by`, grouped by standard in discovery order. Includes the
    /// start node.
    pub fn find_equivalents(
        &self,
        standard: Standard,
        clause: &str,
    ) -> CrossMapResult<BTreeMap<Standard, Vec<String>>> {
        let start = self.index_of(standard, clause)?;
        let mut visited = HashSet::from([start]);
        let mut queue = VecDeque::from([start]);
        let mut found: BTreeMap<Standard, Vec<String>> = BTreeMap::new();

        while let Some(idx) = queue.pop_front() {
            let node = &self.nodes[idx];
            found
                .entry(node.id.standard)
                .or_default()
                .push(node.id.clause.clone());
            for link in node.implies.iter().chain(node.implied_by.iter()) {
                if let Some(&next) = self.index.get(&link.target) {
                    if visited.insert(next) {
                        queue.push_back(next);
                    }
                }
            }
        }
        Ok(found)
    }

    /// [`find_equivalents`](Self::find_equivalents) without the start node.
    pub fn related_clauses(
        &self,
        standard: Standard,
        clause: &str,
    ) -> CrossMapResult<BTreeMap<Standard, Vec<String>>> {
        let clause = clause.trim();
        let mut found = self.find_equivalents(standard, clause)?;
        if let Some(own) = found.get_mut(&standard) {
            own.retain(|c| c != clause);
        }
        found.retain(|_, clauses| !clauses.is_empty());
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    pub(super) const SMALL: &str = r#"
version: "test"
priority_order: [OSHA, LAW6331, ISO45001, WB_ESS]
nodes:
  - { standard: ISO45001, clause: "8.2", title: Emergency preparedness }
  - { standard: OSHA, clause: "1910.38", title: Emergency action plans, citation: 29 CFR 1910.38 }
  - { standard: LAW6331, clause: Art.11, title: Emergency plans }
  - { standard: WB_ESS, clause: ESS4.3, title: Community emergency preparedness }
  - { standard: OSHA, clause: "1910.95", title: Occupational noise exposure }
edges:
  - { from: "ISO45001:8.2", to: "OSHA:1910.38", relation: equivalent }
  - { from: "OSHA:1910.38", to: "LAW6331:Art.11", relation: equivalent }
  - { from: "LAW6331:Art.11", to: "ISO45001:8.2", relation: equivalent }
  - { from: "WB_ESS:ESS4.3", to: "ISO45001:8.2", relation: implies }
precedence:
  - topic: emergency
    members: ["ISO45001:8.2", "OSHA:1910.38", "LAW6331:Art.11"]
    strictest: LAW6331
    rationale: Requires designated and trained emergency teams.
checklists:
  evacuation:
    - item: Assembly point designated
      sources: ["ISO45001:8.2", "OSHA:1910.38"]
    - item: Community warning arrangements
      sources: ["WB_ESS:ESS4.3"]
"#;

    pub(super) fn small() -> CrossMap {
        CrossMap::build(&load_crossmap_from_str(SMALL, "test").unwrap()).unwrap()
    }

    #[test]
    fn test_node_id_parse() {
        let id: NodeId = "OSHA:1910.146".parse().unwrap();
        assert_eq!(id, NodeId::new(Standard::Osha, "1910.146"));
        assert_eq!(id.to_string(), "OSHA:1910.146");
        assert!("osha:1910.146".parse::<NodeId>().is_err());
        assert!("OSHA".parse::<NodeId>().is_err());
        assert!("OSHA: ".parse::<NodeId>().is_err());
    }

    #[test]
    fn test_find_equivalents_survives_cycle() {
        let map = small();
        let found = map.find_equivalents(Standard::Iso45001, "8.2").unwrap();
        assert_eq!(found[&Standard::Iso45001], vec!["8.2"]);
        assert_eq!(found[&Standard::Osha], vec!["1910.38"]);
        assert_eq!(found[&Standard::Law6331], vec!["Art.11"]);
        assert_eq!(found[&Standard::WbEss], vec!["ESS4.3"]);
        assert!(!found[&Standard::Osha].contains(&"1910.95".to_string()));
    }

    #[test]
    fn test_implies_edges_are_traversed_backwards() {
        let map = small();
        let from_iso = map.find_equivalents(Standard::Iso45001, "8.2").unwrap();
        assert!(from_iso.contains_key(&Standard::WbEss));
        let from_ess = map.find_equivalents(Standard::WbEss, "ESS4.3").unwrap();
        assert_eq!(from_ess[&Standard::Iso45001], vec!["8.2"]);
    }

    #[test]
    fn test_isolated_node_is_reflexive_only() {
        let map = small();
        let found = map.find_equivalents(Standard::Osha, "1910.95").unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[&Standard::Osha], vec!["1910.95"]);
        assert!(map.related_clauses(Standard::Osha, "1910.95").unwrap().is_empty());
    }

    #[test]
    fn test_unknown_clause() {
        let map = small();
        let err = map.find_equivalents(Standard::Osha, "9999.1").unwrap_err();
        assert!(matches!(err, CrossMapError::UnknownClause { .. }));
    }

    #[test]
    fn test_build_collects_every_problem() {
        let broken = r#"
version: "x"
priority_order: [OSHA, EU_AI_ACT]
nodes:
  - { standard: OSHA, clause: "1910.38", title: a }
  - { standard: OSHA, clause: "1910.38", title: duplicate }
  - { standard: NOPE, clause: "1", title: b }
edges:
  - { from: "OSHA:1910.38", to: "ISO45001:8.2", relation: equivalent }
precedence:
  - topic: t
    members: ["OSHA:1910.38"]
    strictest: ISO45001
    rationale: r
"#;
        let err = CrossMap::build(&load_crossmap_from_str(broken, "test").unwrap()).unwrap_err();
        let text = err.to_string();
        assert_eq!(err.problems.len(), 5, "{}", text);
        assert!(text.contains("unknown standard 'EU_AI_ACT'"));
        assert!(text.contains("duplicate node"));
        assert!(text.contains("unknown standard 'NOPE'"));
        assert!(text.contains("references missing node ISO45001:8.2"));
        assert!(text.contains("not among its members"));
    }

    #[test]
    fn test_builtin_map_builds() {
        let map = CrossMap::build(&load_builtin_crossmap().unwrap()).unwrap();
        assert!(map.len() > 20);
        assert!(map.node(Standard::Osha, "1910.146").is_some());
        assert!(map.digest().starts_with("sha256:"));
    }
}
