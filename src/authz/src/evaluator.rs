//! Interpreted policy evaluation

use tracing::debug;

use crate::policy::Policy;
use crate::resolver::EffectResolver;
use crate::types::{AccessRequest, Action, Decision, Domain, Effect, Resource, Subject};

/// Stateless evaluator: one linear pass over the priority view
///
/// Matching and resolution are fused; the scan stops at the first matching
/// rule. Safe to share across threads.
#[derive(Debug, Clone, Copy, Default)]
pub struct PolicyEvaluator {
    resolver: EffectResolver,
}

impl PolicyEvaluator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Evaluate a request with no domain
    pub fn evaluate(
        &self,
        policy: &Policy,
        subject: &Subject,
        resource: &Resource,
        action: &Action,
    ) -> Effect {
        self.evaluate_in(policy, subject, resource, action, None)
    }

    /// Evaluate a request scoped to an optional domain
    pub fn evaluate_in(
        &self,
        policy: &Policy,
        subject: &Subject,
        resource: &Resource,
        action: &Action,
        domain: Option<&Domain>,
    ) -> Effect {
        let request = AccessRequest::new(subject, resource, action).in_domain(domain);
        self.resolver.resolve(policy.sorted_by_priority(), &request)
    }

    /// Evaluate and report the deciding rule
    pub fn decide(&self, policy: &Policy, request: &AccessRequest<'_>) -> Decision {
        let decision = self.resolver.decide(policy.indexed_by_priority(), request);

        debug!(
            subject = %request.subject.id,
            resource = %request.resource.id,
            action = %request.action.name,
            effect = %decision.effect,
            rule = ?decision.rule_index,
            "interpreted decision"
        );

        decision
    }
}
