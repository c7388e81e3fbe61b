//! Domain (tenant / namespace) scoping
//!
//! A domain pattern is a colon-separated hierarchy:
//! - `tenant:acme` (exact)
//! - `tenant:*` (single wildcard - matches one segment)
//! - `tenant:acme:**` (double wildcard - matches zero or more segments)

use std::fmt;

use crate::error::{AuthzError, Result};
use crate::types::Domain;

/// Parsed domain pattern attached to a rule
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DomainPattern {
    /// Original pattern string
    raw: String,
    /// Parsed segments
    segments: Vec<String>,
}

impl DomainPattern {
    /// Parse and validate a domain pattern
    pub fn parse(raw: &str) -> Result<Self> {
        if raw.is_empty() {
            return Err(AuthzError::pattern(raw, "domain cannot be empty"));
        }

        let segments: Vec<String> = raw.split(':').map(|s| s.to_string()).collect();

        for (idx, segment) in segments.iter().enumerate() {
            if segment.is_empty() {
                return Err(AuthzError::pattern(raw, "domain segment cannot be empty"));
            }

            if segment.contains('*') && segment != "*" && segment != "**" {
                return Err(AuthzError::pattern(
                    raw,
                    format!("wildcards must be standalone: '{}'", segment),
                ));
            }

            if segment == "**" && idx < segments.len() - 1 {
                return Err(AuthzError::pattern(raw, "'**' can only appear at the end"));
            }
        }

        Ok(Self {
            raw: raw.to_string(),
            segments,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Whether the pattern is a plain literal domain
    pub fn is_literal(&self) -> bool {
        !self.segments.iter().any(|s| s == "*" || s == "**")
    }

    /// Check a request domain against this pattern
    pub fn matches(&self, domain: &Domain) -> bool {
        if self.is_literal() {
            return self.raw == domain.as_str();
        }

        let candidate: Vec<&str> = domain.as_str().split(':').collect();

        if let Some((last, prefix)) = self.segments.split_last() {
            if last == "**" {
                return prefix.len() <= candidate.len()
                    && Self::segments_match(prefix, &candidate[..prefix.len()]);
            }
        }

        self.segments.len() == candidate.len() && Self::segments_match(&self.segments, &candidate)
    }

    fn segments_match(pattern: &[String], candidate: &[&str]) -> bool {
        pattern
            .iter()
            .zip(candidate)
            .all(|(p, c)| (p == "*" && !c.is_empty()) || p == c)
    }
}

impl fmt::Display for DomainPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
