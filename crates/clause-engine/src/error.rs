use crate::config::ConfigError;
use crate::crossmap::CrossMapError;
use crate::packs::PackError;
use std::fmt;

/// One problem found while building the rule registry or the cross-standard map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildProblem {
    /// Pack name, or `crossmap`.
    pub origin: String,
    /// Rule id or node id the problem belongs to, if any.
    pub item: Option<String>,
    pub message: String,
}

impl BuildProblem {
    pub fn new(origin: impl Into<String>, item: Option<&str>, message: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            item: item.map(str::to_string),
            message: message.into(),
        }
    }
}

impl fmt::Display for BuildProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.item {
            Some(item) => write!(f, "[{}] {}: {}", self.origin, item, self.message),
            None => write!(f, "[{}] {}", self.origin, self.message),
        }
    }
}

/// Startup-time failure listing every offending rule or node.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{}", list_problems(problems))]
pub struct BuildError {
    pub problems: Vec<BuildProblem>,
}

impl BuildError {
    pub fn mentions(&self, item: &str) -> bool {
        self.problems.iter().any(|p| p.item.as_deref() == Some(item))
    }
}

fn list_problems(problems: &[BuildProblem]) -> String {
    let mut out = format!("build failed with {} problem(s):", problems.len());
    for problem in problems {
        out.push_str(&format!("\n  - {}", problem));
    }
    out
}

/// Umbrella error for loading and (re)building an engine.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Pack(#[from] PackError),

    #[error(transparent)]
    Build(#[from] BuildError),

    #[error(transparent)]
    CrossMap(#[from] CrossMapError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_error_lists_every_problem() {
        let err = BuildError {
            problems: vec![
                BuildProblem::new("osha", Some("OSHA-1"), "duplicate rule id"),
                BuildProblem::new("crossmap", None, "priority_order names unknown standard 'EU'"),
            ],
        };
        let text = err.to_string();
        assert!(text.starts_with("build failed with 2 problem(s):"));
        assert!(text.contains("[osha] OSHA-1: duplicate rule id"));
        assert!(text.contains("[crossmap] priority_order names unknown standard 'EU'"));
        assert!(err.mentions("OSHA-1"));
        assert!(!err.mentions("OSHA-2"));

        let wrapped = EngineError::from(err.clone());
        assert_eq!(wrapped.to_string(), text);
        let source: &dyn std::error::Error = &err;
        assert!(source.source().is_none());
    }
}
