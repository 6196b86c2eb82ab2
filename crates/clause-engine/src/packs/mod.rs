//! Rule packs.
//!
//! A pack is a YAML rule set for one standard. Built-in packs are embedded
//! at compile time; callers may also load packs from files.

pub mod loader;
pub mod schema;

pub use loader::{
    canonical_digest, load_builtin_packs, load_pack, load_pack_from_file, load_pack_from_str,
    load_packs, LoadedPack, PackError, PackSource,
};
pub use schema::{MatcherDefinition, PackDefinition, RuleDefinition};

/// Built-in packs, as `(name, yaml)`.
pub static BUILTIN_PACKS: &[(&str, &str)] = &[
    ("iso45001", include_str!("../../packs/iso45001.yaml")),
    ("osha", include_str!("../../packs/osha.yaml")),
    ("law6331", include_str!("../../packs/law6331.yaml")),
    ("wb-ess", include_str!("../../packs/wb-ess.yaml")),
];

/// Built-in cross-standard map.
pub static BUILTIN_CROSSMAP: &str = include_str!("../../packs/crossmap.yaml");
