//! Priority-first effect resolution
//!
//! Given rules in priority-descending, insertion-stable order, the first
//! matching rule decides. A higher-priority `Allow` therefore beats a
//! lower-priority `Deny`; give `Deny` rules the higher priority to get
//! deny-override behaviour. Nothing matching means `Deny`.

use crate::policy::PolicyRule;
use crate::types::{AccessRequest, Decision, Effect};

/// Picks the final effect from priority-ordered rules
#[derive(Debug, Clone, Copy, Default)]
pub struct EffectResolver;

impl EffectResolver {
    pub fn new() -> Self {
        Self
    }

    /// Resolve rules that are already known to match
    pub fn resolve_matched<'r, I>(&self, matched: I) -> Effect
    where
        I: IntoIterator<Item = &'r PolicyRule>,
    {
        matched
            .into_iter()
            .next()
            .map_or(Effect::Deny, PolicyRule::effect)
    }

    /// Resolve, checking each rule against the request lazily
    pub fn resolve<'r, I>(&self, rules: I, request: &AccessRequest<'_>) -> Effect
    where
        I: IntoIterator<Item = &'r PolicyRule>,
    {
        self.resolve_matched(rules.into_iter().filter(|rule| rule.matches(request)))
    }

    /// Like [`EffectResolver::resolve`], reporting which rule decided
    ///
    /// `rules` yields `(insertion_index, rule)` pairs in priority order.
    pub fn decide<'r, I>(&self, rules: I, request: &AccessRequest<'_>) -> Decision
    where
        I: IntoIterator<Item = (usize, &'r PolicyRule)>,
    {
        rules
            .into_iter()
            .find(|(_, rule)| rule.matches(request))
            .map_or_else(Decision::default_deny, |(idx, rule)| {
                Decision::matched(rule.effect(), idx, rule.priority())
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::Policy;
    use crate::types::{Action, Resource, Subject};

    #[test]
    fn test_empty_input_denies() {
        let resolver = EffectResolver::new();
        assert_eq!(resolver.resolve_matched(std::iter::empty()), Effect::Deny);
    }

    #[test]
    fn test_first_matched_wins() {
        let allow = PolicyRule::allow("*", "*").build().unwrap();
        let deny = PolicyRule::deny("*", "*").build().unwrap();
        let resolver = EffectResolver::new();

        assert_eq!(resolver.resolve_matched([&allow, &deny]), Effect::Allow);
        assert_eq!(resolver.resolve_matched([&deny, &allow]), Effect::Deny);
    }

    #[test]
    fn test_higher_priority_allow_beats_lower_deny() {
        let policy = Policy::new(vec![
            PolicyRule::deny("u1", "read").priority(1).build().unwrap(),
            PolicyRule::allow("u1", "read").priority(10).build().unwrap(),
        ]);

        let subject = Subject::new("u1");
        let resource = Resource::new("doc1");
        let action = Action::new("read");
        let request = AccessRequest::new(&subject, &resource, &action);

        let resolver = EffectResolver::new();
        assert_eq!(resolver.resolve(policy.sorted_by_priority(), &request), Effect::Allow);

        let decision = resolver.decide(policy.indexed_by_priority(), &request);
        assert_eq!(decision.effect, Effect::Allow);
        assert_eq!(decision.rule_index, Some(1));
    }

    #[test]
    fn test_all_non_matching_denies() {
        let policy = Policy::new(vec![PolicyRule::allow("u2", "read").build().unwrap()]);
        let subject = Subject::new("u1");
        let resource = Resource::new("doc1");
        let action = Action::new("read");
        let request = AccessRequest::new(&subject, &resource, &action);

        let resolver = EffectResolver::new();
        assert_eq!(resolver.resolve(policy.sorted_by_priority(), &request), Effect::Deny);
        assert_eq!(resolver.decide(policy.indexed_by_priority(), &request), Decision::default_deny());
    }
}
