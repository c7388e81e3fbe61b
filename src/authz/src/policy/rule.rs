//! Validated, immutable policy rules

use crate::error::Result;
use crate::matcher::{Predicate, RuleMatcher};
use crate::types::{AccessRequest, Effect, Priority};

use super::record::RuleRecord;

/// An atomic authorization statement
///
/// Built from a [`RuleRecord`]; patterns are parsed and the matcher variant
/// is chosen once, so matching never re-validates.
#[derive(Debug, Clone)]
pub struct PolicyRule {
    record: RuleRecord,
    matcher: RuleMatcher,
}

impl PolicyRule {
    /// Validate a record and build its matcher
    pub fn from_record(record: RuleRecord) -> Result<Self> {
        let matcher = RuleMatcher::build(
            &record.subject,
            record.resource.as_deref(),
            &record.action,
            record.domain.as_deref(),
            &record.conditions,
        )?;

        Ok(Self { record, matcher })
    }

    /// Start an `Allow` rule
    pub fn allow(subject: impl Into<String>, action: impl Into<String>) -> RuleBuilder {
        RuleBuilder::new(subject, action, Effect::Allow)
    }

    /// Start a `Deny` rule
    pub fn deny(subject: impl Into<String>, action: impl Into<String>) -> RuleBuilder {
        RuleBuilder::new(subject, action, Effect::Deny)
    }

    pub fn subject(&self) -> &str {
        &self.record.subject
    }

    pub fn resource(&self) -> Option<&str> {
        self.record.resource.as_deref()
    }

    pub fn action(&self) -> &str {
        &self.record.action
    }

    pub fn effect(&self) -> Effect {
        self.record.effect
    }

    pub fn priority(&self) -> Priority {
        self.record.priority
    }

    pub fn domain(&self) -> Option<&str> {
        self.record.domain.as_deref()
    }

    pub fn conditions(&self) -> &[Predicate] {
        &self.record.conditions
    }

    pub fn matcher(&self) -> &RuleMatcher {
        &self.matcher
    }

    pub fn record(&self) -> &RuleRecord {
        &self.record
    }

    /// Does this rule apply to the request?
    pub fn matches(&self, request: &AccessRequest<'_>) -> bool {
        self.matcher.matches(request)
    }
}

impl PartialEq for PolicyRule {
    fn eq(&self, other: &Self) -> bool {
        self.record == other.record
    }
}

impl TryFrom<RuleRecord> for PolicyRule {
    type Error = crate::error::AuthzError;

    fn try_from(record: RuleRecord) -> Result<Self> {
        Self::from_record(record)
    }
}

/// Fluent constructor for [`PolicyRule`]
#[derive(Debug, Clone)]
pub struct RuleBuilder {
    record: RuleRecord,
}

impl RuleBuilder {
    pub fn new(subject: impl Into<String>, action: impl Into<String>, effect: Effect) -> Self {
        Self {
            record: RuleRecord::new(subject, action, effect),
        }
    }

    pub fn resource(mut self, resource: impl Into<String>) -> Self {
        self.record.resource = Some(resource.into());
        self
    }

    pub fn priority(mut self, priority: Priority) -> Self {
        self.record.priority = priority;
        self
    }

    pub fn domain(mut self, domain: impl Into<String>) -> Self {
        self.record.domain = Some(domain.into());
        self
    }

    pub fn condition(mut self, predicate: Predicate) -> Self {
        self.record.conditions.push(predicate);
        self
    }

    pub fn build(self) -> Result<PolicyRule> {
        PolicyRule::from_record(self.record)
    }
}
