//! Rule matching strategies
//!
//! Every rule carries one [`RuleMatcher`], picked when the rule is built:
//!
//! ```text
//! Domain ─► Attribute ─► Identity | PathTemplate
//! ```
//!
//! `Domain` and `Attribute` only appear when the rule declares a domain or
//! conditions. Matching never fails; malformed patterns are rejected while
//! the rule is constructed.

pub mod domain;
pub mod path;
pub mod pattern;
pub mod predicate;

pub use domain::DomainPattern;
pub use path::PathTemplate;
pub use pattern::{Pattern, WILDCARD};
pub use predicate::{AttributeSource, Operator, Predicate};

use crate::error::Result;
use crate::policy::PolicyRule;
use crate::types::{AccessRequest, Action, Domain, Resource, Subject};

/// Subject/resource/action target using literal, wildcard or glob patterns
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityTarget {
    pub subject: Pattern,
    /// `None` matches any resource identifier
    pub resource: Option<Pattern>,
    pub action: Pattern,
}

impl IdentityTarget {
    fn matches(&self, request: &AccessRequest<'_>) -> bool {
        self.subject.matches(&request.subject.id)
            && self
                .resource
                .as_ref()
                .map_or(true, |p| p.matches(&request.resource.id))
            && self.action.matches(&request.action.name)
    }
}

/// Target whose resource is a path template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathTarget {
    pub subject: Pattern,
    pub template: PathTemplate,
    pub action: Pattern,
}

impl PathTarget {
    fn matches(&self, request: &AccessRequest<'_>) -> bool {
        self.subject.matches(&request.subject.id)
            && self.template.matches(&request.resource.id)
            && self.action.matches(&request.action.name)
    }
}

/// Matching strategy of a single rule
#[derive(Debug, Clone, PartialEq)]
pub enum RuleMatcher {
    /// ACL / RBAC style literal-or-wildcard matching
    Identity(IdentityTarget),

    /// Path-based resource matching
    PathTemplate(PathTarget),

    /// Inner matcher plus a conjunction of attribute predicates
    Attribute {
        predicates: Vec<Predicate>,
        inner: Box<RuleMatcher>,
    },

    /// Inner matcher restricted to a tenant / namespace
    Domain {
        pattern: DomainPattern,
        inner: Box<RuleMatcher>,
    },
}

/// Tag of the outermost matcher variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatcherKind {
    Identity,
    PathTemplate,
    Attribute,
    Domain,
}

impl RuleMatcher {
    /// Select and build the matcher for a rule's patterns
    pub fn build(
        subject: &str,
        resource: Option<&str>,
        action: &str,
        domain: Option<&str>,
        predicates: &[Predicate],
    ) -> Result<Self> {
        let subject = Pattern::parse(subject)?;
        let action = Pattern::parse(action)?;

        let mut matcher = match resource {
            Some(r) if PathTemplate::is_template(r) => RuleMatcher::PathTemplate(PathTarget {
                subject,
                template: PathTemplate::parse(r)?,
                action,
            }),
            _ => RuleMatcher::Identity(IdentityTarget {
                subject,
                resource: resource.map(Pattern::parse).transpose()?,
                action,
            }),
        };

        if !predicates.is_empty() {
            for predicate in predicates {
                predicate.validate()?;
            }
            matcher = RuleMatcher::Attribute {
                predicates: predicates.to_vec(),
                inner: Box::new(matcher),
            };
        }

        if let Some(domain) = domain {
            matcher = RuleMatcher::Domain {
                pattern: DomainPattern::parse(domain)?,
                inner: Box::new(matcher),
            };
        }

        Ok(matcher)
    }

    pub fn matches(&self, request: &AccessRequest<'_>) -> bool {
        match self {
            RuleMatcher::Identity(target) => target.matches(request),
            RuleMatcher::PathTemplate(target) => target.matches(request),
            RuleMatcher::Attribute { predicates, inner } => {
                inner.matches(request) && predicates.iter().all(|p| p.evaluate(request))
            }
            RuleMatcher::Domain { pattern, inner } => {
                request.domain.map_or(false, |d| pattern.matches(d)) && inner.matches(request)
            }
        }
    }

    pub fn kind(&self) -> MatcherKind {
        match self {
            RuleMatcher::Identity(_) => MatcherKind::Identity,
            RuleMatcher::PathTemplate(_) => MatcherKind::PathTemplate,
            RuleMatcher::Attribute { .. } => MatcherKind::Attribute,
            RuleMatcher::Domain { .. } => MatcherKind::Domain,
        }
    }

    /// Subject pattern of the innermost target
    pub fn subject_pattern(&self) -> &Pattern {
        match self {
            RuleMatcher::Identity(target) => &target.subject,
            RuleMatcher::PathTemplate(target) => &target.subject,
            RuleMatcher::Attribute { inner, .. } | RuleMatcher::Domain { inner, .. } => inner.subject_pattern(),
        }
    }

    /// Whether any layer evaluates attribute predicates
    pub fn uses_attributes(&self) -> bool {
        match self {
            RuleMatcher::Identity(_) | RuleMatcher::PathTemplate(_) => false,
            RuleMatcher::Attribute { .. } => true,
            RuleMatcher::Domain { inner, .. } => inner.uses_attributes(),
        }
    }
}

/// Does `rule` apply to this request?
pub fn matches(
    rule: &PolicyRule,
    subject: &Subject,
    resource: &Resource,
    action: &Action,
    domain: Option<&Domain>,
) -> bool {
    rule.matches(&AccessRequest::new(subject, resource, action).in_domain(domain))
}
