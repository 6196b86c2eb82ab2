//! Engine configuration file (`clause.yaml`).

use crate::crossmap::{load_builtin_crossmap, load_crossmap_from_file, CrossMapResult, LoadedCrossMap};
use crate::engine::ValidateOptions;
use crate::packs::{load_builtin_packs, load_pack, LoadedPack, PackError};
use crate::types::WarningLevel;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_CONFIG_FILE: &str = "clause.yaml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config '{path}': {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config '{path}': {message}")]
    Parse { path: PathBuf, message: String },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    /// Pack references (built-in names or paths). Empty means every built-in pack.
    #[serde(default)]
    pub packs: Vec<String>,

    /// Cross-standard map file. Absent means the built-in map.
    #[serde(default)]
    pub crossmap: Option<PathBuf>,

    /// Warnings at or above this level make a result not ok.
    #[serde(default)]
    pub fail_on_warning: Option<WarningLevel>,

    /// Attach equivalent clauses of other standards to each violation.
    #[serde(default)]
    pub expand_related: bool,

    /// Directory relative paths are resolved against.
    #[serde(skip)]
    base_dir: Option<PathBuf>,
}

impl EngineConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        let mut config = Self::from_yaml(&content).map_err(|message| ConfigError::Parse {
            path: path.to_path_buf(),
            message,
        })?;
        config.base_dir = path.parent().map(Path::to_path_buf);
        tracing::debug!(path = %path.display(), packs = config.packs.len(), "config loaded");
        Ok(config)
    }

    /// An empty document is the default configuration.
    pub fn from_yaml(content: &str) -> Result<Self, String> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content).map_err(|e| e.to_string())
    }

    pub fn options(&self) -> ValidateOptions {
        ValidateOptions {
            fail_on_warning: self.fail_on_warning,
            expand_related: self.expand_related,
        }
    }

    pub fn load_packs(&self) -> Result<Vec<LoadedPack>, PackError> {
        if self.packs.is_empty() {
            return load_builtin_packs();
        }
        self.packs
            .iter()
            .map(|reference| load_pack(&self.resolve(reference)))
            .collect()
    }

    pub fn load_crossmap(&self) -> CrossMapResult<LoadedCrossMap> {
        match &self.crossmap {
            None => load_builtin_crossmap(),
            Some(path) => load_crossmap_from_file(&self.resolve_path(path)),
        }
    }

    /// A reference naming a file next to the config file wins over a
    /// built-in pack of the same name.
    fn resolve(&self, reference: &str) -> String {
        match &self.base_dir {
            Some(dir) if Path::new(reference).is_relative() => {
                let candidate = dir.join(reference);
                if candidate.exists() {
                    candidate.to_string_lossy().into_owned()
                } else {
                    reference.to_string()
                }
            }
            _ => reference.to_string(),
        }
    }

    fn resolve_path(&self, path: &Path) -> PathBuf {
        match &self.base_dir {
            Some(dir) if path.is_relative() => dir.join(path),
            _ => path.to_path_buf(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_is_default() {
        assert_eq!(EngineConfig::from_yaml("  \n").unwrap(), EngineConfig::default());
    }

    #[test]
    fn test_parse_full() {
        let config = EngineConfig::from_yaml(
            "packs: [osha, ./site.yaml]\nfail_on_warning: error\nexpand_related: true\n",
        )
        .unwrap();
        assert_eq!(config.packs, vec!["osha", "./site.yaml"]);
        assert_eq!(config.fail_on_warning, Some(WarningLevel::Error));
        assert!(config.options().expand_related);
    }

    #[test]
    fn test_unknown_key_rejected() {
        let err = EngineConfig::from_yaml("pack: [osha]\n").unwrap_err();
        assert!(err.contains("unknown field"));
    }

    #[test]
    fn test_default_loads_builtins() {
        let config = EngineConfig::default();
        assert_eq!(config.load_packs().unwrap().len(), 4);
        assert!(config.load_crossmap().is_ok());
    }
}
