//! Ahead-of-time policy specialisation
//!
//! [`PolicyCompiler::compile`] turns a [`Policy`] into a [`CompiledPolicy`]:
//! a flat, priority-ordered table of boxed predicates, one per rule, each
//! specialised to the rule's patterns (exact, prefix, suffix, glob, path
//! template, domain scope). Wildcard fields produce no check at all.
//!
//! The table is identified by a [`ContentId`], the BLAKE3 hash of the
//! policy's canonical rule sequence, so compiled artifacts can be cached and
//! reused safely.
//!
//! Attribute-predicate rules are not inlined. In [`CompileMode::Strict`]
//! they are rejected; in [`CompileMode::Fallback`] they stay in the table as
//! interpreted checks.

mod artifact;
pub mod cache;

pub use artifact::{CompiledArtifact, ARTIFACT_FORMAT_VERSION};
pub use cache::{CacheConfig, CacheStats, CompiledCache};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, info, warn};

use crate::error::{AuthzError, Result};
use crate::matcher::pattern::PatternKind;
use crate::matcher::{Pattern, RuleMatcher};
use crate::policy::Policy;
use crate::types::{AccessRequest, Action, Decision, Domain, Effect, Priority, Resource, Subject};

/// Content address of a policy's rule sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContentId([u8; 32]);

impl ContentId {
    /// Hash the canonical serialization of `policy`
    pub fn of(policy: &Policy) -> Result<Self> {
        let bytes = policy.canonical_bytes()?;
        let mut hasher = blake3::Hasher::new();
        hasher.update(b"tessera.policy.v1\0");
        hasher.update(&bytes);
        Ok(Self(*hasher.finalize().as_bytes()))
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        blake3::Hash::from(self.0).to_hex().to_string()
    }
}

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for ContentId {
    type Err = AuthzError;

    fn from_str(s: &str) -> Result<Self> {
        blake3::Hash::from_hex(s)
            .map(|hash| Self(*hash.as_bytes()))
            .map_err(|e| AuthzError::InvalidPolicy(format!("invalid content id '{}': {}", s, e)))
    }
}

/// How the compiler treats rules it cannot inline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompileMode {
    /// Reject the policy with [`AuthzError::Uncompilable`]
    #[default]
    Strict,
    /// Keep such rules as interpreted checks in the table
    Fallback,
}

type RequestTest = Box<dyn Fn(&AccessRequest<'_>) -> bool + Send + Sync>;

fn check_fn<F>(f: F) -> RequestTest
where
    F: Fn(&AccessRequest<'_>) -> bool + Send + Sync + 'static,
{
    Box::new(f)
}

#[derive(Debug, Clone, Copy)]
enum Field {
    Subject,
    Resource,
    Action,
}

impl Field {
    fn get<'a>(self, request: &AccessRequest<'a>) -> &'a str {
        match self {
            Field::Subject => &request.subject.id,
            Field::Resource => &request.resource.id,
            Field::Action => &request.action.name,
        }
    }
}

/// Specialise one field pattern; `None` means the field always matches
fn field_test(pattern: &Pattern, field: Field) -> Option<RequestTest> {
    let test = match pattern.kind() {
        PatternKind::Any => return None,
        PatternKind::Exact => {
            let literal: Box<str> = pattern.as_str().into();
            check_fn(move |r| field.get(r) == &*literal)
        }
        PatternKind::Prefix(prefix) => {
            let prefix: Box<str> = prefix.as_str().into();
            check_fn(move |r| field.get(r).starts_with(&*prefix))
        }
        PatternKind::Suffix(suffix) => {
            let suffix: Box<str> = suffix.as_str().into();
            check_fn(move |r| field.get(r).ends_with(&*suffix))
        }
        PatternKind::Glob(regex) => {
            let regex = regex.clone();
            check_fn(move |r| regex.is_match(field.get(r)))
        }
    };
    Some(test)
}

/// Flatten a matcher into independent tests; fails on attribute layers
fn lower(matcher: &RuleMatcher, tests: &mut Vec<RequestTest>) -> std::result::Result<(), String> {
    match matcher {
        RuleMatcher::Identity(target) => {
            tests.extend(field_test(&target.subject, Field::Subject));
            if let Some(resource) = &target.resource {
                tests.extend(field_test(resource, Field::Resource));
            }
            tests.extend(field_test(&target.action, Field::Action));
            Ok(())
        }
        RuleMatcher::PathTemplate(target) => {
            tests.extend(field_test(&target.subject, Field::Subject));
            let template = target.template.clone();
            tests.push(check_fn(move |r| template.matches(&r.resource.id)));
            tests.extend(field_test(&target.action, Field::Action));
            Ok(())
        }
        RuleMatcher::Domain { pattern, inner } => {
            let pattern = pattern.clone();
            tests.push(check_fn(move |r| r.domain.map_or(false, |d| pattern.matches(d))));
            lower(inner, tests)
        }
        RuleMatcher::Attribute { predicates, .. } => Err(format!(
            "{} attribute predicate(s) require interpretation",
            predicates.len()
        )),
    }
}

fn conjunction(mut tests: Vec<RequestTest>) -> RequestTest {
    if tests.len() <= 1 {
        return tests.pop().unwrap_or_else(|| check_fn(|_| true));
    }
    let tests = tests.into_boxed_slice();
    check_fn(move |r| tests.iter().all(|test| test(r)))
}

/// One row of the decision table
struct Check {
    rule_index: usize,
    priority: Priority,
    effect: Effect,
    test: RequestTest,
}

/// A policy specialised into an ordered decision table
///
/// Owns its table; holds no shared or global state. `Send + Sync`.
pub struct CompiledPolicy {
    content_id: ContentId,
    mode: CompileMode,
    checks: Box<[Check]>,
    /// Insertion indices of rules evaluated by the interpreter
    interpreted: Vec<usize>,
}

impl CompiledPolicy {
    pub fn content_id(&self) -> ContentId {
        self.content_id
    }

    /// Mode the table was compiled under
    pub fn mode(&self) -> CompileMode {
        self.mode
    }

    pub fn len(&self) -> usize {
        self.checks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }

    /// Rules kept on the interpreted path (insertion indices, ascending)
    pub fn interpreted_rules(&self) -> &[usize] {
        &self.interpreted
    }

    pub fn is_fully_compiled(&self) -> bool {
        self.interpreted.is_empty()
    }

    pub fn decide(&self, subject: &Subject, resource: &Resource, action: &Action) -> Effect {
        self.decide_in(subject, resource, action, None)
    }

    pub fn decide_in(
        &self,
        subject: &Subject,
        resource: &Resource,
        action: &Action,
        domain: Option<&Domain>,
    ) -> Effect {
        let request = AccessRequest::new(subject, resource, action).in_domain(domain);
        self.checks
            .iter()
            .find(|check| (check.test)(&request))
            .map_or(Effect::Deny, |check| check.effect)
    }

    /// Decide and report the deciding rule
    pub fn decide_request(&self, request: &AccessRequest<'_>) -> Decision {
        let decision = self
            .checks
            .iter()
            .find(|check| (check.test)(request))
            .map_or_else(Decision::default_deny, |check| {
                Decision::matched(check.effect, check.rule_index, check.priority)
            });

        debug!(
            policy = %self.content_id,
            subject = %request.subject.id,
            resource = %request.resource.id,
            action = %request.action.name,
            effect = %decision.effect,
            rule = ?decision.rule_index,
            "compiled decision"
        );

        decision
    }
}

impl fmt::Debug for CompiledPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledPolicy")
            .field("content_id", &self.content_id)
            .field("mode", &self.mode)
            .field("checks", &self.checks.len())
            .field("interpreted", &self.interpreted)
            .finish()
    }
}

/// Builds [`CompiledPolicy`] tables
#[derive(Debug, Clone, Copy, Default)]
pub struct PolicyCompiler {
    mode: CompileMode,
}

impl PolicyCompiler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_mode(mode: CompileMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> CompileMode {
        self.mode
    }

    /// Specialise `policy` into a decision table
    pub fn compile(&self, policy: &Policy) -> Result<(CompiledPolicy, ContentId)> {
        let content_id = ContentId::of(policy)?;
        let mut checks = Vec::with_capacity(policy.len());
        let mut interpreted = Vec::new();

        for (rule_index, rule) in policy.indexed_by_priority() {
            let mut tests = Vec::new();
            let test = match lower(rule.matcher(), &mut tests) {
                Ok(()) => conjunction(tests),
                Err(reason) => match self.mode {
                    CompileMode::Strict => {
                        return Err(AuthzError::Uncompilable { rule_index, reason });
                    }
                    CompileMode::Fallback => {
                        warn!(policy = %content_id, rule = rule_index, "{}, keeping interpreted check", reason);
                        interpreted.push(rule_index);
                        let matcher = rule.matcher().clone();
                        check_fn(move |r| matcher.matches(r))
                    }
                },
            };

            checks.push(Check {
                rule_index,
                priority: rule.priority(),
                effect: rule.effect(),
                test,
            });
        }

        interpreted.sort_unstable();

        info!(
            policy = %content_id,
            rules = checks.len(),
            interpreted = interpreted.len(),
            "policy compiled"
        );

        let compiled = CompiledPolicy {
            content_id,
            mode: self.mode,
            checks: checks.into_boxed_slice(),
            interpreted,
        };

        Ok((compiled, content_id))
    }
}
