//! SARIF 2.1.0 rendering of a [`ValidationResult`].

use crate::registry::RuleRegistry;
use crate::report::{ValidationResult, Violation};
use crate::types::WarningLevel;
use serde_json::{json, Map, Value};
use sha2::{Digest, Sha256};

pub const SARIF_SCHEMA: &str =
    "https://raw.githubusercontent.com/oasis-tcs/sarif-spec/main/sarif-2.1/schema/sarif-schema-2.1.0.json";

const TOOL_NAME: &str = "clause";
const DEFAULT_ARTIFACT: &str = "document.txt";

#[derive(Debug, Clone, Default)]
pub struct SarifOptions {
    /// URI of the validated document (default `document.txt`).
    pub artifact_uri: Option<String>,
}

/// Stable per-(rule, standard) fingerprint.
pub fn fingerprint(violation: &Violation) -> String {
    format!(
        "sha256:{}",
        hex::encode(Sha256::digest(
            format!("{}:{}", violation.rule_id, violation.standard).as_bytes()
        ))
    )
}

pub fn to_sarif(result: &ValidationResult, registry: &RuleRegistry) -> Value {
    to_sarif_with_options(result, registry, &SarifOptions::default())
}

pub fn to_sarif_with_options(
    result: &ValidationResult,
    registry: &RuleRegistry,
    options: &SarifOptions,
) -> Value {
    let artifact = options.artifact_uri.as_deref().unwrap_or(DEFAULT_ARTIFACT);

    let rules: Vec<Value> = registry
        .iter()
        .map(|r| {
            let mut props = Map::new();
            props.insert("standard".into(), json!(r.standard));
            props.insert("category".into(), json!(r.category));
            props.insert("pack".into(), json!(r.pack));
            if let Some(clause) = &r.clause {
                props.insert("clause".into(), json!(clause));
            }
            let mut rule = Map::new();
            rule.insert("id".into(), json!(r.id));
            rule.insert("shortDescription".into(), json!({ "text": r.requirement }));
            if let Some(description) = &r.description {
                rule.insert("fullDescription".into(), json!({ "text": description }));
            }
            if !r.remediation.is_empty() {
                rule.insert("help".into(), json!({ "text": r.remediation }));
            }
            rule.insert(
                "defaultConfiguration".into(),
                json!({ "level": r.severity.as_sarif_level() }),
            );
            rule.insert("properties".into(), Value::Object(props));
            Value::Object(rule)
        })
        .collect();

    let results: Vec<Value> = result
        .violations
        .iter()
        .map(|v| {
            let mut props = Map::new();
            props.insert("standard".into(), json!(v.standard));
            props.insert("category".into(), json!(v.category));
            props.insert("severity".into(), json!(v.severity));
            props.insert("issues".into(), json!(v.issues));
            if !v.related.is_empty() {
                props.insert("related".into(), json!(v.related));
            }
            json!({
                "ruleId": v.rule_id,
                "level": v.severity.as_sarif_level(),
                "message": { "text": message_text(v) },
                "locations": [{
                    "physicalLocation": {
                        "artifactLocation": { "uri": artifact, "uriBaseId": "%SRCROOT%" },
                        "region": { "startLine": 1, "startColumn": 1 }
                    }
                }],
                "partialFingerprints": { "clauseViolation/v1": fingerprint(v) },
                "properties": props
            })
        })
        .collect();

    let notifications: Vec<Value> = result
        .warnings
        .iter()
        .map(|w| {
            let mut n = Map::new();
            n.insert("level".into(), json!(notification_level(w.level)));
            n.insert("message".into(), json!({ "text": w.message }));
            if let Some(rule_id) = &w.rule_id {
                n.insert("associatedRule".into(), json!({ "id": rule_id }));
            }
            Value::Object(n)
        })
        .collect();

    let version = env!("CARGO_PKG_VERSION");
    json!({
        "$schema": SARIF_SCHEMA,
        "version": "2.1.0",
        "runs": [{
            "tool": {
                "driver": {
                    "name": TOOL_NAME,
                    "version": version,
                    "semanticVersion": version,
                    "rules": rules,
                    "properties": {
                        "rulesetDigest": registry.digest(),
                        "packs": registry.packs()
                    }
                }
            },
            "invocations": [{
                "executionSuccessful": true,
                "toolExecutionNotifications": notifications
            }],
            "automationDetails": { "id": format!("{}/validate/{}", TOOL_NAME, registry.digest()) },
            "results": results,
            "properties": {
                "ok": result.ok,
                "stats": result.stats
            }
        }]
    })
}

fn message_text(v: &Violation) -> String {
    if v.issues.is_empty() {
        v.requirement.clone()
    } else {
        format!("{}: {}", v.requirement, v.issues.join("; "))
    }
}

fn notification_level(level: WarningLevel) -> &'static str {
    match level {
        WarningLevel::Error => "error",
        WarningLevel::Warning => "warning",
        WarningLevel::Info => "note",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Severity, Standard};
    use std::collections::BTreeMap;

    #[test]
    fn test_fingerprint_stable_and_distinct() {
        let mut v = Violation {
            rule_id: "OSHA-1".into(),
            standard: Standard::Osha,
            category: "c".into(),
            severity: Severity::Major,
            requirement: "r".into(),
            clause: None,
            issues: vec!["a".into()],
            remediation: String::new(),
            description: None,
            related: BTreeMap::new(),
        };
        let a = fingerprint(&v);
        v.issues.push("b".into());
        assert_eq!(a, fingerprint(&v));
        v.standard = Standard::Iso45001;
        assert_ne!(a, fingerprint(&v));
    }

    #[test]
    fn test_message_text_joins_issues() {
        let v = Violation {
            rule_id: "X".into(),
            standard: Standard::Osha,
            category: "c".into(),
            severity: Severity::Minor,
            requirement: "Noise control".into(),
            clause: None,
            issues: vec!["one".into(), "two".into()],
            remediation: String::new(),
            description: None,
            related: BTreeMap::new(),
        };
        assert_eq!(message_text(&v), "Noise control: one; two");
    }
}
