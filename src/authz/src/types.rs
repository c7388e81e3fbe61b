//! Core authorization types

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Rule priority (higher = evaluated first)
pub type Priority = i64;

/// Priority assigned to rules that do not declare one
pub const DEFAULT_PRIORITY: Priority = 1;

/// Attribute value carried by subjects and resources
pub type AttributeValue = serde_json::Value;

/// Attribute map shared by subjects and resources
pub type Attributes = HashMap<String, AttributeValue>;

/// Decision outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Effect {
    /// Grant the action
    #[serde(alias = "ALLOW", alias = "allow")]
    Allow,
    /// Refuse the action
    #[serde(alias = "DENY", alias = "deny")]
    Deny,
}

impl Effect {
    pub fn is_allow(self) -> bool {
        matches!(self, Effect::Allow)
    }
}

impl fmt::Display for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Effect::Allow => f.write_str("ALLOW"),
            Effect::Deny => f.write_str("DENY"),
        }
    }
}

/// Principal (user, service account, role, agent)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subject {
    /// Subject identifier (e.g., "user:alice", "role:admin")
    pub id: String,

    /// Additional attributes (e.g., department, clearance)
    #[serde(default)]
    pub attributes: Attributes,
}

impl Subject {
    /// Identifier of the unauthenticated principal
    pub const ANONYMOUS: &'static str = "anonymous";

    /// Create a new subject from an ID string
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            attributes: HashMap::new(),
        }
    }

    /// The unauthenticated principal
    pub fn anonymous() -> Self {
        Self::new(Self::ANONYMOUS)
    }

    pub fn is_anonymous(&self) -> bool {
        self.id == Self::ANONYMOUS
    }

    /// Add an attribute to the subject
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }
}

/// Resource being accessed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    /// Resource identifier (e.g., "doc:42", "/projects/7/files")
    pub id: String,

    /// Resource type (document, api, path, ...)
    #[serde(rename = "type")]
    pub resource_type: String,

    /// Additional attributes (e.g., owner, sensitivity)
    #[serde(default)]
    pub attributes: Attributes,
}

impl Resource {
    /// Type tag of a resource that could not be resolved
    pub const UNKNOWN_TYPE: &'static str = "unknown";

    /// Create a new resource from an ID string
    ///
    /// The type is taken from a `type:` prefix when the id has one.
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        let resource_type = match id.split_once(':') {
            Some((prefix, _)) if !prefix.is_empty() => prefix.to_string(),
            _ => Self::UNKNOWN_TYPE.to_string(),
        };

        Self {
            id,
            resource_type,
            attributes: HashMap::new(),
        }
    }

    /// Create a resource with an explicit type tag
    pub fn typed(id: impl Into<String>, resource_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            resource_type: resource_type.into(),
            attributes: HashMap::new(),
        }
    }

    pub fn is_unknown(&self) -> bool {
        self.resource_type == Self::UNKNOWN_TYPE
    }

    /// Add an attribute to the resource
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }
}

/// Action being performed
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Action {
    /// Action name (read, write, delete, ...)
    pub name: String,
}

impl Action {
    /// Create a new action
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Tenant / namespace scope of a request
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Domain(String);

impl Domain {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Borrowed view of a single authorization request
#[derive(Debug, Clone, Copy)]
pub struct AccessRequest<'a> {
    pub subject: &'a Subject,
    pub resource: &'a Resource,
    pub action: &'a Action,
    pub domain: Option<&'a Domain>,
}

impl<'a> AccessRequest<'a> {
    pub fn new(subject: &'a Subject, resource: &'a Resource, action: &'a Action) -> Self {
        Self {
            subject,
            resource,
            action,
            domain: None,
        }
    }

    /// Scope the request to a domain
    pub fn in_domain(mut self, domain: Option<&'a Domain>) -> Self {
        self.domain = domain;
        self
    }
}

/// Authorization decision with the rule that produced it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    /// Final effect
    pub effect: Effect,

    /// Insertion index of the deciding rule within the evaluated policy
    ///
    /// Through [`crate::AuthzEngine::check`] the evaluated policy is the
    /// candidate set returned by the repository for this request, so the
    /// index points into that set, not into the repository's full rule list.
    pub rule_index: Option<usize>,

    /// Reason for the decision
    pub reason: DecisionReason,
}

impl Decision {
    /// Decision made by a matching rule
    pub fn matched(effect: Effect, rule_index: usize, priority: Priority) -> Self {
        Self {
            effect,
            rule_index: Some(rule_index),
            reason: DecisionReason::RuleMatch { priority },
        }
    }

    /// Fail-closed decision when nothing matched
    pub fn default_deny() -> Self {
        Self {
            effect: Effect::Deny,
            rule_index: None,
            reason: DecisionReason::NoMatch,
        }
    }

    pub fn allowed(&self) -> bool {
        self.effect.is_allow()
    }
}

/// Reason for an authorization decision
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum DecisionReason {
    /// The highest-priority matching rule decided
    RuleMatch { priority: Priority },

    /// No rule matched, default deny
    NoMatch,
}
