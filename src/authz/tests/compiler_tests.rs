//! Compiled decision tables: equivalence with interpretation and content addressing

use proptest::prelude::*;
use serde_json::json;
use tessera_authz::{
    policy::RuleBuilder, Action, AuthzError, CompileMode, ContentId, Domain, Effect, Operator,
    Policy, PolicyCompiler, PolicyEvaluator, PolicyRule, Predicate, Resource, Subject,
};

const SUBJECTS: &[&str] = &["u1", "u2", "role:admin", "org:admin", "anonymous"];
const RESOURCES: &[&str] = &["doc:1", "doc:2", "dec:2", "/docs/a", "/docs/a/b", "/docs/", "other"];
const ACTIONS: &[&str] = &["read", "write", "rewrite"];
const DOMAINS: &[Option<&str>] = &[None, Some("t1"), Some("t:x")];

fn rule_strategy() -> impl Strategy<Value = PolicyRule> {
    (
        prop::sample::select(vec!["*", "u1", "u2", "role:*", "*:admin", "r*e:a*n"]),
        prop::sample::select(vec![
            None,
            Some("*"),
            Some("doc:1"),
            Some("doc:*"),
            Some("*:2"),
            Some("d*c:*"),
            Some("/docs/*"),
            Some("/docs/**"),
            Some("/docs/{id}"),
            Some("/docs/:id/*"),
        ]),
        prop::sample::select(vec!["*", "read", "write", "*write", "r*e*"]),
        prop::sample::select(vec![None, Some("t1"), Some("t:*")]),
        0i64..4,
        any::<bool>(),
    )
        .prop_map(|(subject, resource, action, domain, priority, allow)| {
            let effect = if allow { Effect::Allow } else { Effect::Deny };
            let mut builder = RuleBuilder::new(subject, action, effect).priority(priority);
            if let Some(resource) = resource {
                builder = builder.resource(resource);
            }
            if let Some(domain) = domain {
                builder = builder.domain(domain);
            }
            builder.build().unwrap()
        })
}

fn assert_equivalent(policy: &Policy, compiled: &tessera_authz::CompiledPolicy) {
    let evaluator = PolicyEvaluator::new();

    for subject in SUBJECTS {
        for resource in RESOURCES {
            for action in ACTIONS {
                for domain in DOMAINS {
                    let subject = Subject::new(*subject);
                    let resource = Resource::new(*resource);
                    let action = Action::new(*action);
                    let domain = domain.map(Domain::new);

                    assert_eq!(
                        compiled.decide_in(&subject, &resource, &action, domain.as_ref()),
                        evaluator.evaluate_in(policy, &subject, &resource, &action, domain.as_ref()),
                        "divergence for ({}, {}, {}, {:?})",
                        subject.id,
                        resource.id,
                        action.name,
                        domain
                    );
                }
            }
        }
    }
}

// ============================================================================
// EQUIVALENCE
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn test_compiled_matches_interpreted(rules in prop::collection::vec(rule_strategy(), 0..8)) {
        let policy = Policy::new(rules);
        let (compiled, content_id) = PolicyCompiler::new().compile(&policy).unwrap();

        prop_assert_eq!(content_id, ContentId::of(&policy).unwrap());
        prop_assert!(compiled.is_fully_compiled());
        assert_equivalent(&policy, &compiled);
    }

    #[test]
    fn test_compilation_is_deterministic(rules in prop::collection::vec(rule_strategy(), 1..6)) {
        let policy = Policy::new(rules);
        let compiler = PolicyCompiler::new();

        let (_, first) = compiler.compile(&policy).unwrap();
        let (_, second) = compiler.compile(&policy).unwrap();
        prop_assert_eq!(first, second);
    }
}

#[test]
fn test_suffix_glob_and_template_rows_agree_with_interpreter() {
    let policy = Policy::new(vec![
        PolicyRule::allow("*:admin", "*").resource("d*c:*").build().unwrap(),
        PolicyRule::deny("r*e:a*n", "r*e*").resource("/docs/{id}").priority(4).build().unwrap(),
        PolicyRule::allow("u1", "*write").resource("/docs/:id/*").priority(2).build().unwrap(),
        PolicyRule::allow("*", "read").resource("*:2").priority(0).build().unwrap(),
    ]);
    let (compiled, _) = PolicyCompiler::new().compile(&policy).unwrap();
    assert!(compiled.is_fully_compiled());

    assert_eq!(
        compiled.decide(&Subject::new("org:admin"), &Resource::new("dec:2"), &Action::new("write")),
        Effect::Allow
    );
    assert_eq!(
        compiled.decide(&Subject::new("role:admin"), &Resource::new("/docs/a"), &Action::new("rewrite")),
        Effect::Deny
    );
    assert_eq!(
        compiled.decide(&Subject::new("u1"), &Resource::new("/docs/a/b"), &Action::new("rewrite")),
        Effect::Allow
    );
    assert_eq!(
        compiled.decide(&Subject::new("u1"), &Resource::new("/docs/a"), &Action::new("rewrite")),
        Effect::Deny
    );
    assert_eq!(
        compiled.decide(&Subject::new("u2"), &Resource::new("doc:2"), &Action::new("read")),
        Effect::Allow
    );
    assert_equivalent(&policy, &compiled);
}

#[test]
fn test_decision_report_matches_interpreter() {
    let policy = Policy::new(vec![
        PolicyRule::allow("u1", "read").resource("doc:*").build().unwrap(),
        PolicyRule::deny("*", "*").priority(0).build().unwrap(),
        PolicyRule::deny("u1", "read").resource("doc:secret").priority(5).build().unwrap(),
    ]);
    let (compiled, _) = PolicyCompiler::new().compile(&policy).unwrap();
    let evaluator = PolicyEvaluator::new();

    let subject = Subject::new("u1");
    let action = Action::new("read");
    for resource in ["doc:1", "doc:secret", "img:1"] {
        let resource = Resource::new(resource);
        let request = tessera_authz::AccessRequest::new(&subject, &resource, &action);

        assert_eq!(compiled.decide_request(&request), evaluator.decide(&policy, &request));
    }
}

// ============================================================================
// ATTRIBUTE RULES
// ============================================================================

#[test]
fn test_strict_mode_names_the_offending_rule() {
    let policy = Policy::new(vec![
        PolicyRule::allow("*", "read").build().unwrap(),
        PolicyRule::allow("*", "write").build().unwrap(),
        PolicyRule::allow("*", "delete")
            .condition(Predicate::subject("role", Operator::Eq, "owner"))
            .build()
            .unwrap(),
    ]);

    let err = PolicyCompiler::with_mode(CompileMode::Strict).compile(&policy).unwrap_err();
    assert!(matches!(err, AuthzError::Uncompilable { rule_index: 2, .. }));
}

#[test]
fn test_fallback_mode_preserves_attribute_semantics() {
    let policy = Policy::new(vec![
        PolicyRule::allow("*", "read")
            .resource("doc:*")
            .condition(Predicate::resource("classification", Operator::NotIn, json!(["secret", "top-secret"])))
            .build()
            .unwrap(),
        PolicyRule::allow("*", "read")
            .condition(Predicate::subject("level", Operator::Gt, 5))
            .priority(2)
            .build()
            .unwrap(),
        PolicyRule::deny("u2", "*").priority(3).build().unwrap(),
    ]);
    let (compiled, _) = PolicyCompiler::with_mode(CompileMode::Fallback).compile(&policy).unwrap();
    assert_eq!(compiled.interpreted_rules(), &[0, 1]);
    assert!(!compiled.is_fully_compiled());

    let evaluator = PolicyEvaluator::new();
    let read = Action::new("read");
    let subjects = [
        Subject::new("u1"),
        Subject::new("u1").with_attribute("level", 9),
        Subject::new("u1").with_attribute("level", 2.5),
        Subject::new("u2").with_attribute("level", 9),
    ];
    let resources = [
        Resource::new("doc:1"),
        Resource::new("doc:1").with_attribute("classification", "public"),
        Resource::new("doc:1").with_attribute("classification", "secret"),
        Resource::new("img:1").with_attribute("classification", "public"),
    ];

    for subject in &subjects {
        for resource in &resources {
            assert_eq!(
                compiled.decide(subject, resource, &read),
                evaluator.evaluate(&policy, subject, resource, &read)
            );
        }
    }
}

// ============================================================================
// CONTENT ADDRESSING
// ============================================================================

#[test]
fn test_identical_rules_share_content_id() {
    let build = || {
        Policy::new(vec![
            PolicyRule::allow("u1", "read").resource("doc:1").build().unwrap(),
            PolicyRule::deny("*", "*").priority(0).build().unwrap(),
        ])
    };

    assert_eq!(ContentId::of(&build()).unwrap(), ContentId::of(&build()).unwrap());
}

#[test]
fn test_json_and_builder_policies_share_content_id() {
    let from_json = Policy::from_json(
        r#"[{"subject": "u1", "resource": "doc:1", "action": "read", "effect": "allow"}]"#,
    )
    .unwrap();
    let from_builder = Policy::new(vec![PolicyRule::allow("u1", "read")
        .resource("doc:1")
        .priority(1)
        .build()
        .unwrap()]);

    assert_eq!(ContentId::of(&from_json).unwrap(), ContentId::of(&from_builder).unwrap());
}

#[test]
fn test_content_id_tracks_order_and_content() {
    let a = PolicyRule::allow("u1", "read").build().unwrap();
    let b = PolicyRule::deny("u1", "read").build().unwrap();

    let forward = ContentId::of(&Policy::new(vec![a.clone(), b.clone()])).unwrap();
    let reverse = ContentId::of(&Policy::new(vec![b.clone(), a.clone()])).unwrap();
    let changed = ContentId::of(&Policy::new(vec![
        a,
        PolicyRule::deny("u1", "read").priority(2).build().unwrap(),
    ]))
    .unwrap();

    assert_ne!(forward, reverse);
    assert_ne!(forward, changed);
}

#[test]
fn test_content_id_parses_from_display() {
    let id = ContentId::of(&Policy::empty()).unwrap();
    let parsed: ContentId = id.to_string().parse().unwrap();

    assert_eq!(parsed, id);
    assert!("not-a-hash".parse::<ContentId>().is_err());
}

// ============================================================================
// ARTIFACTS
// ============================================================================

#[tokio::test]
async fn test_artifact_roundtrip_through_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("policy.json");
    let policy = Policy::new(vec![
        PolicyRule::allow("role:admin", "delete").resource("doc:*").build().unwrap(),
        PolicyRule::deny("*", "*").domain("tenant:*").priority(0).build().unwrap(),
    ]);
    let compiler = PolicyCompiler::new();

    let written = compiler.compile_to_file(&policy, &path).await.unwrap();
    let (compiled, loaded) = compiler.load_artifact(&path).await.unwrap();

    assert_eq!(written, loaded);
    assert_equivalent(&policy, &compiled);
}

#[tokio::test]
async fn test_tampered_artifact_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("policy.json");
    let compiler = PolicyCompiler::new();
    compiler
        .compile_to_file(&Policy::new(vec![PolicyRule::deny("u1", "read").build().unwrap()]), &path)
        .await
        .unwrap();

    let text = tokio::fs::read_to_string(&path).await.unwrap();
    tokio::fs::write(&path, text.replace("\"Deny\"", "\"Allow\"")).await.unwrap();

    let err = compiler.load_artifact(&path).await.unwrap_err();
    assert!(matches!(err, AuthzError::ContentMismatch { .. }));
}
