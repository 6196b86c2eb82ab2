use clause_engine::packs::load_builtin_packs;
use clause_engine::{
    validate, RuleRegistry, ValidateOptions, ValidationContext, ValidationRequest,
    ValidationResult,
};
use proptest::prelude::*;
use std::sync::OnceLock;

const FRAGMENTS: &[&str] = &[
    "Workers wear a hard hat and safety glasses.",
    "Steel-toed boots and a high-visibility vest are mandatory.",
    "Atmospheric testing: oxygen 20.9%, H2S 2 ppm, LEL 4%.",
    "Oxygen 17% measured at the hatch.",
    "Entry supervisor and attendant designated.",
    "Roof work at 14 feet with harness and lanyard.",
    "Anchor point rated 5000 lbs; competent person inspects daily.",
    "Lockout device applied after isolation of energy sources.",
    "Noise survey: 97 dBA near the crusher.",
    "Trench depth 7 feet, ladder within 25 feet.",
    "Emergency drill held monthly; assembly point at gate 2.",
    "Hazard identification and risk assessment updated quarterly.",
    "Grievance mechanism available to all workers.",
    "Safety data sheets and labels for every chemical.",
];

const STANDARDS: &[&str] = &["ISO45001", "OSHA", "LAW6331", "WB_ESS", "EU_AI_ACT"];

const ACTIVITIES: &[&str] = &[
    "excavation",
    "confined_space",
    "hot_work",
    "working_at_height",
    "electrical",
    "knitting",
];

fn registry() -> &'static RuleRegistry {
    static REGISTRY: OnceLock<RuleRegistry> = OnceLock::new();
    REGISTRY.get_or_init(|| RuleRegistry::from_packs(&load_builtin_packs().unwrap()).unwrap())
}

fn run(request: &ValidationRequest) -> ValidationResult {
    validate(registry(), None, request, &ValidateOptions::default())
}

fn request_strategy() -> impl Strategy<Value = ValidationRequest> {
    (
        prop::sample::subsequence(FRAGMENTS.to_vec(), 0..=FRAGMENTS.len()),
        prop::sample::subsequence(STANDARDS.to_vec(), 0..=STANDARDS.len()),
        prop::option::of(prop::sample::select(ACTIVITIES.to_vec())),
        prop::option::of(prop::sample::select(vec![8.0, 4.0, 2.0, 0.5])),
    )
        .prop_map(|(fragments, standards, activity, hours)| {
            let mut context = ValidationContext::new();
            if let Some(activity) = activity {
                context.insert("activity", activity);
            }
            if let Some(hours) = hours {
                context.insert("exposure_hours", hours);
            }
            ValidationRequest::new(fragments.join("\n"), standards).with_context(context)
        })
}

proptest! {
    #[test]
    fn test_repeated_calls_are_identical(request in request_strategy()) {
        let first = run(&request);
        let second = run(&request);
        prop_assert_eq!(&first, &second);
        prop_assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn test_result_invariants(request in request_strategy()) {
        let result = run(&request);

        for pair in result.violations.windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            prop_assert!(
                a.severity.priority() > b.severity.priority()
                    || (a.severity == b.severity && a.rule_id < b.rule_id)
            );
        }

        let s = &result.stats;
        prop_assert_eq!(s.rules_passed + s.rules_failed, s.rules_checked);
        prop_assert_eq!(s.violations_found, result.violations.len());
        prop_assert_eq!(s.critical_count + s.major_count + s.minor_count, s.violations_found);
        prop_assert!(result.violations.iter().all(|v| !v.issues.is_empty()));

        let degenerate = request.text.trim().is_empty() || request.standards.is_empty();
        if degenerate {
            prop_assert!(!result.ok);
            prop_assert_eq!(s.rules_checked, 0);
        } else {
            prop_assert_eq!(result.ok, result.violations.is_empty());
        }
    }

    #[test]
    fn test_standard_order_does_not_matter(request in request_strategy()) {
        let mut reversed = request.clone();
        reversed.standards.reverse();
        let a = run(&request);
        let b = run(&reversed);
        prop_assert_eq!(a.ok, b.ok);
        prop_assert_eq!(a.violations, b.violations);
        prop_assert_eq!(a.stats, b.stats);
    }
}
