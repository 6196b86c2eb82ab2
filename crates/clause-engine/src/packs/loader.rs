//! Pack loader: YAML parsing, validation and digest computation.
//!
//! Parsing is strict. Duplicate keys and unknown fields are rejected. The
//! digest is `sha256(JCS(JSON(pack)))` so that reformatting a YAML file does
//! not change it.

use super::schema::{PackDefinition, PackValidationError};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Where a pack came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PackSource {
    /// Embedded at compile time.
    BuiltIn(&'static str),
    File(PathBuf),
    /// Supplied as a string by the caller.
    Inline,
}

impl std::fmt::Display for PackSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PackSource::BuiltIn(name) => write!(f, "builtin:{}", name),
            PackSource::File(path) => write!(f, "file:{}", path.display()),
            PackSource::Inline => write!(f, "inline"),
        }
    }
}

/// A parsed and validated pack. Matchers are compiled later, by the registry.
#[derive(Debug, Clone)]
pub struct LoadedPack {
    pub definition: PackDefinition,
    /// `sha256:<hex>` of the JCS-canonical JSON form.
    pub digest: String,
    pub source: PackSource,
}

#[derive(Debug, Error)]
pub enum PackError {
    #[error("Pack '{reference}' not found. {suggestion}")]
    NotFound {
        reference: String,
        suggestion: String,
    },

    #[error("Failed to read pack file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse pack YAML ({origin}): {message}")]
    YamlParseError { origin: String, message: String },

    #[error("Pack validation failed: {0}")]
    ValidationError(#[from] PackValidationError),

    #[error("Failed to canonicalize pack '{pack}': {message}")]
    Canonicalization { pack: String, message: String },
}

/// Load a pack from a reference: an existing file path wins, then a
/// built-in name.
pub fn load_pack(reference: &str) -> Result<LoadedPack, PackError> {
    let path = Path::new(reference);
    if path.exists() {
        return load_pack_from_file(path);
    }

    if let Some((name, content)) = super::BUILTIN_PACKS
        .iter()
        .find(|(n, _)| *n == reference)
        .map(|(n, c)| (*n, *c))
    {
        return load_pack_from_str(content, PackSource::BuiltIn(name));
    }

    Err(PackError::NotFound {
        reference: reference.to_string(),
        suggestion: suggest_similar_pack(reference),
    })
}

/// Load several packs, stopping at the first failure.
pub fn load_packs(references: &[String]) -> Result<Vec<LoadedPack>, PackError> {
    references.iter().map(|r| load_pack(r)).collect()
}

/// Every built-in pack, in declaration order.
pub fn load_builtin_packs() -> Result<Vec<LoadedPack>, PackError> {
    super::BUILTIN_PACKS
        .iter()
        .map(|(name, content)| load_pack_from_str(content, PackSource::BuiltIn(name)))
        .collect()
}

pub fn load_pack_from_file(path: &Path) -> Result<LoadedPack, PackError> {
    let content = std::fs::read_to_string(path).map_err(|e| PackError::ReadError {
        path: path.to_path_buf(),
        source: e,
    })?;
    load_pack_from_str(&content, PackSource::File(path.to_path_buf()))
}

pub fn load_pack_from_str(content: &str, source: PackSource) -> Result<LoadedPack, PackError> {
    let definition: PackDefinition =
        serde_yaml::from_str(content).map_err(|e| PackError::YamlParseError {
            origin: source.to_string(),
            message: format_yaml_error(e),
        })?;

    definition.validate()?;
    let digest = compute_pack_digest(&definition)?;
    tracing::debug!(pack = %definition.name, %source, %digest, rules = definition.rules.len(), "pack loaded");

    Ok(LoadedPack {
        definition,
        digest,
        source,
    })
}

/// `sha256:<hex>` over the RFC 8785 canonical JSON of `value`.
pub fn canonical_digest<T: serde::Serialize>(value: &T) -> Result<String, String> {
    let canonical = serde_jcs::to_string(value).map_err(|e| e.to_string())?;
    Ok(format!(
        "sha256:{}",
        hex::encode(Sha256::digest(canonical.as_bytes()))
    ))
}

fn compute_pack_digest(definition: &PackDefinition) -> Result<String, PackError> {
    canonical_digest(definition).map_err(|message| PackError::Canonicalization {
        pack: definition.name.clone(),
        message,
    })
}

fn format_yaml_error(e: serde_yaml::Error) -> String {
    let msg = e.to_string();
    if msg.contains("duplicate key") {
        return format!("Duplicate key detected: {}", msg);
    }
    if msg.contains("unknown field") {
        return format!("Unknown field detected: {}", msg);
    }
    msg
}

fn suggest_similar_pack(reference: &str) -> String {
    let names: Vec<&str> = super::BUILTIN_PACKS.iter().map(|(n, _)| *n).collect();
    let close: Vec<&str> = names
        .iter()
        .copied()
        .filter(|name| {
            name.starts_with(reference)
                || reference.starts_with(*name)
                || levenshtein_distance(name, reference) <= 3
        })
        .collect();

    if close.is_empty() {
        format!(
            "Available built-in packs: {}. Or specify a file path.",
            names.join(", ")
        )
    } else {
        format!("Did you mean '{}'?", close.join("' or '"))
    }
}

fn levenshtein_distance(a: &str, b: &str) -> usize {
    let b: Vec<char> = b.chars().collect();
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0usize; b.len() + 1];
    for (i, ca) in a.chars().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != *cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}
