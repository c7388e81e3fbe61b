//! Policy repository boundary
//!
//! The core consumes candidate rule sets through [`PolicyRepository`]. The
//! returned policy is only a superset hint; matchers stay authoritative.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::error::Result;
use crate::policy::{Policy, PolicyRule};
use crate::types::{Resource, Subject};

/// Supplies candidate policies for a request
#[async_trait]
pub trait PolicyRepository: Send + Sync {
    /// Rules that may apply to `(subject, resource)`, in insertion order
    async fn get_policies_for(&self, subject: &Subject, resource: &Resource) -> Result<Policy>;
}

/// In-memory repository; pre-filters on the subject pattern only
pub struct InMemoryPolicyRepository {
    rules: Arc<RwLock<Vec<PolicyRule>>>,
}

impl InMemoryPolicyRepository {
    pub fn new() -> Self {
        Self {
            rules: Arc::new(RwLock::new(Vec::new())),
        }
    }

    pub fn with_policy(policy: &Policy) -> Self {
        Self {
            rules: Arc::new(RwLock::new(policy.rules().to_vec())),
        }
    }

    /// Append a rule after all existing ones
    pub async fn add_rule(&self, rule: PolicyRule) {
        self.rules.write().await.push(rule);
    }

    /// Replace the whole rule set
    pub async fn replace(&self, policy: &Policy) {
        *self.rules.write().await = policy.rules().to_vec();
    }

    pub async fn clear(&self) {
        self.rules.write().await.clear();
    }

    pub async fn len(&self) -> usize {
        self.rules.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rules.read().await.is_empty()
    }
}

impl Default for InMemoryPolicyRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PolicyRepository for InMemoryPolicyRepository {
    async fn get_policies_for(&self, subject: &Subject, _resource: &Resource) -> Result<Policy> {
        let rules = self.rules.read().await;
        let candidates = rules
            .iter()
            .filter(|rule| rule.matcher().subject_pattern().matches(&subject.id))
            .cloned()
            .collect();

        Ok(Policy::new(candidates))
    }
}
