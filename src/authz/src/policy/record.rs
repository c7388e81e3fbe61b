//! Reference JSON shape of persisted rules

use serde::{Deserialize, Serialize};

use crate::matcher::Predicate;
use crate::types::{Effect, Priority, DEFAULT_PRIORITY};

fn default_priority() -> Priority {
    DEFAULT_PRIORITY
}

/// One persisted rule
///
/// ```json
/// { "subject": "role:admin", "resource": "doc:*", "action": "delete",
///   "effect": "Allow", "priority": 10, "domain": "tenant:acme" }
/// ```
///
/// `resource`, `priority`, `domain` and `conditions` are optional. A missing
/// priority becomes [`DEFAULT_PRIORITY`]; a missing resource matches any
/// resource identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleRecord {
    pub subject: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<String>,

    pub action: String,

    pub effect: Effect,

    #[serde(default = "default_priority")]
    pub priority: Priority,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,

    /// Attribute predicates, all of which must hold
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Predicate>,
}

impl RuleRecord {
    pub fn new(subject: impl Into<String>, action: impl Into<String>, effect: Effect) -> Self {
        Self {
            subject: subject.into(),
            resource: None,
            action: action.into(),
            effect,
            priority: DEFAULT_PRIORITY,
            domain: None,
            conditions: Vec::new(),
        }
    }
}
