//! Validation scenarios against the built-in packs.

use clause_engine::packs::load_builtin_packs;
use clause_engine::{
    validate, RuleRegistry, Severity, Standard, ValidateOptions, ValidationContext,
    ValidationRequest, WarningCode, WarningLevel,
};
use serde_json::json;

fn builtin() -> RuleRegistry {
    RuleRegistry::from_packs(&load_builtin_packs().unwrap()).unwrap()
}

fn run(registry: &RuleRegistry, request: &ValidationRequest) -> clause_engine::ValidationResult {
    validate(registry, None, request, &ValidateOptions::default())
}

const CONFINED_SPACE_PERMIT: &str = "\
Confined space entry permit - Tank 3

Atmospheric testing before entry and every hour: oxygen 20.9%, H2S 0 ppm, LEL 2%.
Entry supervisor: J. Smith. Attendant: A. Jones remains at the portal at all times.
Rescue plan: emergency rescue team on standby with rescue equipment and a tripod.
Communication procedure: radio check with the attendant every 10 minutes.
Equipment: calibrated gas monitor, forced-air ventilation.
";

#[test]
fn test_ppe_gap_for_excavation() {
    let registry = builtin();
    let request = ValidationRequest::new(
        "Excavation method statement. All workers wear a hard hat, safety glasses and steel-toed boots.",
        ["ISO45001", "OSHA"],
    )
    .with_context(ValidationContext::new().with("activity", "excavation"))
    .with_categories(["ppe"]);

    let result = run(&registry, &request);
    assert!(!result.ok);
    assert_eq!(result.violations.len(), 1);
    let violation = &result.violations[0];
    assert_eq!(violation.rule_id, "ISO45001-8.1.3-PPE");
    assert_eq!(violation.severity, Severity::Major);
    assert!(violation
        .issues
        .iter()
        .any(|i| i.contains("high-visibility vest")));
    assert_eq!(
        violation.issues,
        vec!["Missing PPE requirement: high-visibility vest".to_string()]
    );
}

#[test]
fn test_ppe_unknown_activity_uses_general_list() {
    let registry = builtin();
    let request = ValidationRequest::new("hard hat, safety glasses, steel-toed boots", ["ISO45001"])
        .with_context(ValidationContext::new().with("activity", "basket weaving"))
        .with_categories(["ppe"]);
    let result = run(&registry, &request);
    assert!(result.ok, "{:?}", result.violations);
    assert_eq!(result.stats.rules_passed, 1);
}

#[test]
fn test_complete_confined_space_permit() {
    let registry = builtin();
    let request =
        ValidationRequest::new(CONFINED_SPACE_PERMIT, ["OSHA"]).with_categories(["confined_space"]);

    let result = run(&registry, &request);
    assert!(result.ok, "{:?}", result.violations);
    assert!(result.violations.is_empty());
    assert!(result.warnings.is_empty());
    assert_eq!(result.stats.rules_checked, 2);
    assert_eq!(result.stats.rules_passed, 2);
}

#[test]
fn test_permit_with_oxygen_range() {
    let registry = builtin();
    let text = "
        Confined Space Entry Procedure

        Atmospheric Testing:
        Test for oxygen (19.5-23.5%), LEL (<10%), H2S (<10ppm), CO (<35ppm)

        Entry Supervisor:
        John Doe, certified entry supervisor

        Attendant:
        Jane Smith will remain outside during entry

        Emergency Rescue Plan:
        Emergency rescue team on standby with rescue equipment
        Non-entry rescue preferred

        Communication Procedure:
        Radio check every 15 minutes
        Visual contact maintained

        Equipment:
        - Gas monitor (calibrated)
        - Ventilation fan (explosion-proof)
        - Rescue equipment (tripod, winch, harness)
        ";
    let request = ValidationRequest::new(text, ["OSHA"]).with_categories(["confined_space"]);

    let result = run(&registry, &request);
    assert!(result.ok, "{:?}", result.violations);
    assert_eq!(result.stats.rules_passed, 2);

    let widened = text.replace("19.5-23.5%", "18-23.5%");
    let request = ValidationRequest::new(widened, ["OSHA"]).with_categories(["confined_space"]);
    let result = run(&registry, &request);
    assert_eq!(result.violations.len(), 1);
    assert_eq!(result.violations[0].rule_id, "OSHA-1910.146-CS-ATMOSPHERE");
}

#[test]
fn test_permit_stating_oxygen_level() {
    let registry = builtin();
    let text = CONFINED_SPACE_PERMIT.replace("oxygen 20.9%", "O2 level monitored continuously");
    let request = ValidationRequest::new(text, ["OSHA"]).with_categories(["confined_space"]);
    assert!(run(&registry, &request).ok);
}

#[test]
fn test_confined_space_low_oxygen() {
    let registry = builtin();
    let text = CONFINED_SPACE_PERMIT.replace("oxygen 20.9%", "oxygen 18%");
    let request = ValidationRequest::new(text, ["OSHA"]).with_categories(["confined_space"]);

    let result = run(&registry, &request);
    assert_eq!(result.violations.len(), 1);
    assert_eq!(result.violations[0].rule_id, "OSHA-1910.146-CS-ATMOSPHERE");
    assert_eq!(
        result.violations[0].issues,
        vec!["Oxygen 18% is outside the permitted range (between 19.5 and 23.5%)".to_string()]
    );
}

#[test]
fn test_confined_space_permit_missing_elements() {
    let registry = builtin();
    let request = ValidationRequest::new("Tank entry. Oxygen 20.9%.", ["OSHA"])
        .with_categories(["confined_space"]);

    let result = run(&registry, &request);
    assert_eq!(result.violations.len(), 1);
    let issues = &result.violations[0].issues;
    assert!(issues.contains(&"Missing required section: Entry supervisor designation".to_string()));
    assert!(issues.contains(&"Missing equipment: gas monitor".to_string()));
    assert_eq!(issues.len(), 8);
}

#[test]
fn test_empty_text_is_not_ok() {
    let registry = builtin();
    let result = run(&registry, &ValidationRequest::new("  \n\t", ["OSHA", "ISO45001"]));
    assert!(!result.ok);
    assert!(result
        .warnings
        .iter()
        .any(|w| w.code == WarningCode::EmptyText && w.level == WarningLevel::Error));
    assert_eq!(result.stats.rules_checked, 0);
    assert!(result.violations.is_empty());
}

#[test]
fn test_unknown_standard_is_tolerated() {
    let registry = builtin();
    let result = run(
        &registry,
        &ValidationRequest::new("Site induction procedure", ["NOT_A_REAL_STANDARD"]),
    );
    assert!(result.ok);
    assert_eq!(result.warnings.len(), 1);
    assert_eq!(result.warnings[0].level, WarningLevel::Info);
    assert_eq!(result.warnings[0].code, WarningCode::UnknownStandard);
    assert_eq!(result.warnings[0].standard.as_deref(), Some("NOT_A_REAL_STANDARD"));
    assert_eq!(result.stats.rules_checked, 0);
}

#[test]
fn test_malformed_context_isolated_to_one_rule() {
    let registry = builtin();
    let request = ValidationRequest::new("General site rules.", ["ISO45001", "OSHA"])
        .with_context(ValidationContext::new().with("activity", json!(["excavation"])));

    let result = run(&registry, &request);
    let total = registry.rules_for(Standard::Iso45001, None).len()
        + registry.rules_for(Standard::Osha, None).len();

    let failed: Vec<_> = result
        .warnings
        .iter()
        .filter(|w| w.code == WarningCode::MatcherFailed)
        .collect();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].rule_id.as_deref(), Some("ISO45001-8.1.3-PPE"));
    assert_eq!(failed[0].level, WarningLevel::Error);
    assert_eq!(result.stats.rules_errored, 1);
    assert_eq!(result.stats.rules_checked, total - 1);
    assert!(result
        .violations
        .iter()
        .all(|v| v.rule_id != "ISO45001-8.1.3-PPE"));
}

#[test]
fn test_numeric_activity_falls_back_to_default() {
    let registry = builtin();
    let request = ValidationRequest::new("hard hat, safety glasses, steel-toed boots", ["ISO45001"])
        .with_context(ValidationContext::new().with("activity", 42))
        .with_categories(["ppe"]);
    let result = run(&registry, &request);
    assert!(result.ok);
    assert!(result.warnings.is_empty());
}

#[test]
fn test_violations_sorted_by_severity_then_id() {
    let registry = builtin();
    let request = ValidationRequest::new(
        "Work at 10 feet. Noise 99 dBA.",
        ["WB_ESS", "LAW6331", "OSHA", "ISO45001"],
    );
    let result = run(&registry, &request);
    assert!(!result.ok);
    assert!(result.violations.len() > 5);
    for pair in result.violations.windows(2) {
        let (a, b) = (&pair[0], &pair[1]);
        assert!(
            a.severity.priority() > b.severity.priority()
                || (a.severity == b.severity && a.rule_id < b.rule_id),
            "{} ({}) before {} ({})",
            a.rule_id,
            a.severity,
            b.rule_id,
            b.severity
        );
    }
    let s = &result.stats;
    assert_eq!(s.critical_count + s.major_count + s.minor_count, s.violations_found);
    assert_eq!(s.rules_passed + s.rules_failed, s.rules_checked);
    assert_eq!(s.rules_checked, registry.len());
}

#[test]
fn test_fall_protection_triggered_by_height() {
    let registry = builtin();
    let low = ValidationRequest::new("Ladder work at 4 feet.", ["OSHA"])
        .with_categories(["working_at_height"]);
    assert!(run(&registry, &low).ok);

    let high = ValidationRequest::new(
        "Roof work at 12 feet. Workers wear a harness and lanyard.",
        ["OSHA"],
    )
    .with_categories(["working_at_height"]);
    let result = run(&registry, &high);
    assert_eq!(result.violations.len(), 1);
    assert_eq!(
        result.violations[0].issues,
        vec![
            "Fall arrest system requires anchor point specification".to_string(),
            "Missing competent person designation for fall protection".to_string(),
        ]
    );
}

#[test]
fn test_noise_limit_depends_on_exposure_hours() {
    let registry = builtin();
    let request = |hours: f64| {
        ValidationRequest::new("Compressor area measured at 94 dBA.", ["OSHA"])
            .with_context(ValidationContext::new().with("exposure_hours", hours))
            .with_categories(["noise"])
    };

    assert!(run(&registry, &request(4.0)).ok);

    let full_shift = run(&registry, &request(8.0));
    assert_eq!(full_shift.violations.len(), 1);
    assert_eq!(
        full_shift.violations[0].issues,
        vec!["Sound level 94 dBA is outside the permitted range (at most 90 dBA)".to_string()]
    );

    let odd = run(&registry, &request(7.0));
    assert!(odd.ok);
    assert_eq!(odd.warnings.len(), 1);
    assert_eq!(odd.warnings[0].code, WarningCode::MatcherFailed);
    assert!(odd.warnings[0].message.contains("exposure_hours"));
}

#[test]
fn test_expand_related_attaches_equivalents() {
    let engine = clause_engine::Engine::builtin().unwrap();
    let request = ValidationRequest::new("hard hat", ["ISO45001"])
        .with_context(ValidationContext::new().with("activity", "excavation"))
        .with_categories(["ppe"]);

    let plain = engine.validate(&request);
    assert!(plain.violations[0].related.is_empty());

    let expanded = engine.validate_with(
        &request,
        &ValidateOptions {
            expand_related: true,
            ..Default::default()
        },
    );
    let related = &expanded.violations[0].related;
    assert_eq!(related.get(&Standard::Osha), Some(&vec!["1910.132".to_string()]));
    assert!(!related.contains_key(&Standard::Iso45001));
}

#[test]
fn test_result_serializes_to_api_shape() {
    let registry = builtin();
    let request = ValidationRequest::new("hard hat", ["ISO45001", "EU"]).with_categories(["ppe"]);
    let value = serde_json::to_value(run(&registry, &request)).unwrap();

    assert_eq!(value["ok"], json!(false));
    assert_eq!(value["violations"][0]["standard"], json!("ISO45001"));
    assert_eq!(value["violations"][0]["severity"], json!("major"));
    assert_eq!(value["violations"][0]["clause"], json!("8.1.3"));
    assert_eq!(value["warnings"][0]["code"], json!("unknown_standard"));
    assert_eq!(value["stats"]["rules_checked"], json!(1));
    assert_eq!(value["stats"]["major_count"], json!(1));
}
