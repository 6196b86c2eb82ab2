//! Snapshot reload: failed builds never replace a working engine, and
//! in-flight callers keep the snapshot they started with.

use clause_engine::crossmap::load_builtin_crossmap;
use clause_engine::packs::{load_pack_from_str, PackSource};
use clause_engine::{
    Engine, EngineConfig, EngineError, ValidateOptions, ValidationRequest, ValidationResult,
};
use std::sync::Arc;

const SITE_PACK: &str = r#"
name: site
version: "1.0.0"
standard: OSHA
description: site housekeeping only
rules:
  - id: SITE-HOUSEKEEPING
    category: housekeeping
    severity: minor
    requirement: Housekeeping arrangements
    matcher: { type: keyword, terms: [housekeeping] }
"#;

const BROKEN_PACK: &str = r#"
name: broken
version: "1.0.0"
standard: OSHA
description: does not build
rules:
  - id: BROKEN-1
    category: general
    severity: minor
    requirement: Broken
    matcher:
      type: pattern
      required: [{ pattern: "[", description: bad }]
"#;

fn request() -> ValidationRequest {
    ValidationRequest::new("General site rules.", ["OSHA"])
}

#[test]
fn test_failed_reload_keeps_current_snapshot() {
    let engine = Engine::builtin().unwrap();
    let before = engine.snapshot();

    let broken = load_pack_from_str(BROKEN_PACK, PackSource::Inline).unwrap();
    let err = engine
        .reload(&[broken], &load_builtin_crossmap().unwrap(), ValidateOptions::default())
        .unwrap_err();
    assert!(err.mentions("BROKEN-1"));

    let after = engine.snapshot();
    assert!(Arc::ptr_eq(&before, &after));
    assert_eq!(engine.validate(&request()), before.validate(&request()));
}

#[test]
fn test_failed_reload_from_config_keeps_current_snapshot() {
    let engine = Engine::builtin().unwrap();
    let digest = engine.snapshot().registry.digest().to_string();

    let config = EngineConfig::from_yaml("packs: [no-such-pack]").unwrap();
    let err = engine.reload_from_config(&config).unwrap_err();
    assert!(matches!(err, EngineError::Pack(_)));
    assert_eq!(engine.snapshot().registry.digest(), digest);
}

#[test]
fn test_successful_reload_swaps_and_held_snapshot_survives() {
    let engine = Engine::builtin().unwrap();
    let held = engine.snapshot();
    let builtin_len = held.registry.len();

    let site = load_pack_from_str(SITE_PACK, PackSource::Inline).unwrap();
    engine
        .reload(&[site], &load_builtin_crossmap().unwrap(), ValidateOptions::default())
        .unwrap();

    let current = engine.snapshot();
    assert_eq!(current.registry.len(), 1);
    assert_ne!(current.registry.digest(), held.registry.digest());
    assert_eq!(held.registry.len(), builtin_len);

    let result = engine.validate(&request());
    assert_eq!(result.violations.len(), 1);
    assert_eq!(result.violations[0].rule_id, "SITE-HOUSEKEEPING");
    assert!(held.validate(&request()).violations.len() > 1);
}

#[test]
fn test_concurrent_validation_sees_whole_snapshots() {
    let engine = Engine::builtin().unwrap();
    let old: ValidationResult = engine.validate(&request());
    let site = load_pack_from_str(SITE_PACK, PackSource::Inline).unwrap();
    let crossmap = load_builtin_crossmap().unwrap();

    let results: Vec<ValidationResult> = std::thread::scope(|scope| {
        let workers: Vec<_> = (0..4)
            .map(|_| {
                scope.spawn(|| {
                    (0..25)
                        .map(|_| engine.validate(&request()))
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        engine
            .reload(&[site], &crossmap, ValidateOptions::default())
            .unwrap();
        workers
            .into_iter()
            .flat_map(|w| w.join().unwrap())
            .collect()
    });

    let new = engine.validate(&request());
    assert_ne!(old, new);
    for result in results {
        assert!(result == old || result == new, "mixed snapshot: {:?}", result.stats);
    }
}
