//! Attribute predicates for ABAC rules

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::error::{AuthzError, Result};
use crate::types::{AccessRequest, AttributeValue, Attributes};

/// Which attribute map a predicate reads from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeSource {
    Subject,
    Resource,
}

/// Closed set of comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    Eq,
    Ne,
    In,
    NotIn,
    Gt,
    Gte,
    Lt,
    Lte,
}

/// A single attribute comparison, e.g. `subject.clearance >= 3`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Predicate {
    pub source: AttributeSource,
    pub attribute: String,
    pub op: Operator,
    pub value: AttributeValue,
}

impl Predicate {
    pub fn new(
        source: AttributeSource,
        attribute: impl Into<String>,
        op: Operator,
        value: impl Into<AttributeValue>,
    ) -> Self {
        Self {
            source,
            attribute: attribute.into(),
            op,
            value: value.into(),
        }
    }

    pub fn subject(attribute: impl Into<String>, op: Operator, value: impl Into<AttributeValue>) -> Self {
        Self::new(AttributeSource::Subject, attribute, op, value)
    }

    pub fn resource(attribute: impl Into<String>, op: Operator, value: impl Into<AttributeValue>) -> Self {
        Self::new(AttributeSource::Resource, attribute, op, value)
    }

    /// Reject predicates whose operand cannot be used with the operator
    pub fn validate(&self) -> Result<()> {
        if self.attribute.is_empty() {
            return Err(AuthzError::InvalidPolicy(
                "predicate attribute name cannot be empty".to_string(),
            ));
        }

        match self.op {
            Operator::In | Operator::NotIn if !self.value.is_array() => Err(AuthzError::InvalidPolicy(
                format!("'{:?}' on '{}' requires an array operand", self.op, self.attribute),
            )),
            Operator::Gt | Operator::Gte | Operator::Lt | Operator::Lte
                if !(self.value.is_number() || self.value.is_string()) =>
            {
                Err(AuthzError::InvalidPolicy(format!(
                    "'{:?}' on '{}' requires a number or string operand",
                    self.op, self.attribute
                )))
            }
            _ => Ok(()),
        }
    }

    /// Evaluate against a request; a missing attribute is false
    pub fn evaluate(&self, request: &AccessRequest<'_>) -> bool {
        let attributes: &Attributes = match self.source {
            AttributeSource::Subject => &request.subject.attributes,
            AttributeSource::Resource => &request.resource.attributes,
        };

        let Some(actual) = attributes.get(&self.attribute) else {
            return false;
        };

        match self.op {
            Operator::Eq => values_equal(actual, &self.value),
            Operator::Ne => !values_equal(actual, &self.value),
            Operator::In => self.contains(actual),
            Operator::NotIn => self.value.is_array() && !self.contains(actual),
            Operator::Gt => compare(actual, &self.value) == Some(Ordering::Greater),
            Operator::Gte => matches!(
                compare(actual, &self.value),
                Some(Ordering::Greater | Ordering::Equal)
            ),
            Operator::Lt => compare(actual, &self.value) == Some(Ordering::Less),
            Operator::Lte => matches!(
                compare(actual, &self.value),
                Some(Ordering::Less | Ordering::Equal)
            ),
        }
    }

    fn contains(&self, actual: &AttributeValue) -> bool {
        self.value
            .as_array()
            .map_or(false, |items| items.iter().any(|item| values_equal(actual, item)))
    }
}

/// Numbers compare by value so `3` equals `3.0`
fn values_equal(a: &AttributeValue, b: &AttributeValue) -> bool {
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) if a.is_number() && b.is_number() => x == y,
        _ => a == b,
    }
}

/// Numbers numerically, strings lexicographically, anything else incomparable
fn compare(a: &AttributeValue, b: &AttributeValue) -> Option<Ordering> {
    if let (Some(x), Some(y)) = (a.as_f64(), b.as_f64()) {
        return x.partial_cmp(&y);
    }
    match (a.as_str(), b.as_str()) {
        (Some(x), Some(y)) => Some(x.cmp(y)),
        _ => None,
    }
}
