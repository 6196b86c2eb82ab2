//! Deterministic multi-standard OHS compliance validation.
//!
//! Rules live in YAML packs (one per standard) and are compiled into an
//! immutable [`RuleRegistry`]. [`validate`] runs every applicable rule's
//! matcher against a document and returns a sorted [`ValidationResult`]. The
//! [`CrossMap`] links equivalent clauses across standards for lookup,
//! checklists, precedence and gap analysis.

pub mod config;
pub mod context;
pub mod crossmap;
pub mod engine;
pub mod error;
pub mod matchers;
pub mod packs;
pub mod registry;
pub mod report;
pub mod sarif;
pub mod types;

pub use config::{ConfigError, EngineConfig};
pub use context::ValidationContext;
pub use crossmap::{CrossMap, CrossMapError, NodeId};
pub use engine::{validate, Engine, Snapshot, ValidateOptions, ValidationRequest};
pub use error::{BuildError, BuildProblem, EngineError};
pub use matchers::{MatchOutcome, Matcher, MatcherError};
pub use packs::{load_pack, LoadedPack, PackError};
pub use registry::{ComplianceRule, RuleRegistry};
pub use report::{Stats, ValidationResult, Violation, Warning, WarningCode};
pub use types::{Severity, Standard, WarningLevel};
