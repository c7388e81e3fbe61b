//! Policy definition: an ordered rule set with a priority-sorted view

mod record;
mod rule;

pub use record::RuleRecord;
pub use rule::{PolicyRule, RuleBuilder};

use crate::error::{AuthzError, Result};

/// Ordered collection of rules
///
/// Insertion order is preserved. The priority view is computed once with a
/// stable descending sort, so equal-priority rules keep insertion order.
#[derive(Debug, Clone, Default)]
pub struct Policy {
    rules: Vec<PolicyRule>,
    /// Indices into `rules`, highest priority first
    by_priority: Vec<usize>,
}

impl Policy {
    /// Build a policy from already-validated rules
    pub fn new(rules: Vec<PolicyRule>) -> Self {
        let mut by_priority: Vec<usize> = (0..rules.len()).collect();
        by_priority.sort_by_key(|&idx| std::cmp::Reverse(rules[idx].priority()));

        Self { rules, by_priority }
    }

    /// A policy with no rules; denies everything
    pub fn empty() -> Self {
        Self::default()
    }

    /// Validate persisted records, failing on the first bad one
    pub fn from_records(records: Vec<RuleRecord>) -> Result<Self> {
        let rules = records
            .into_iter()
            .enumerate()
            .map(|(index, record)| {
                PolicyRule::from_record(record).map_err(|e| AuthzError::InvalidRule {
                    index,
                    reason: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self::new(rules))
    }

    /// Parse the reference JSON representation (an array of rule records)
    pub fn from_json(json: &str) -> Result<Self> {
        let records: Vec<RuleRecord> = serde_json::from_str(json)?;
        Self::from_records(records)
    }

    pub fn to_records(&self) -> Vec<RuleRecord> {
        self.rules.iter().map(|r| r.record().clone()).collect()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.to_records())?)
    }

    /// Rules in insertion order
    pub fn rules(&self) -> &[PolicyRule] {
        &self.rules
    }

    /// Rules highest priority first, ties in insertion order
    pub fn sorted_by_priority(&self) -> impl Iterator<Item = &PolicyRule> + '_ {
        self.by_priority.iter().map(move |&idx| &self.rules[idx])
    }

    /// Same order as [`Policy::sorted_by_priority`], paired with insertion indices
    pub fn indexed_by_priority(&self) -> impl Iterator<Item = (usize, &PolicyRule)> + '_ {
        self.by_priority.iter().map(move |&idx| (idx, &self.rules[idx]))
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Canonical serialized form of the rule sequence
    pub fn canonical_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(&self.to_records())?)
    }
}

impl PartialEq for Policy {
    fn eq(&self, other: &Self) -> bool {
        self.rules == other.rules
    }
}

impl FromIterator<PolicyRule> for Policy {
    fn from_iter<I: IntoIterator<Item = PolicyRule>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
