//! Literal / wildcard / glob patterns for subject, resource and action fields

use regex::Regex;
use std::fmt;

use crate::error::{AuthzError, Result};

/// The full wildcard
pub const WILDCARD: &str = "*";

/// A parsed identity pattern
///
/// - `*` matches anything
/// - `doc:*` / `*:admin` match by prefix / suffix
/// - any other `*` placement is a general glob
/// - everything else is compared literally
#[derive(Debug, Clone)]
pub struct Pattern {
    raw: String,
    kind: PatternKind,
}

#[derive(Debug, Clone)]
pub(crate) enum PatternKind {
    Any,
    Exact,
    Prefix(String),
    Suffix(String),
    Glob(Regex),
}

impl Pattern {
    /// Parse a pattern, rejecting empty input
    pub fn parse(raw: &str) -> Result<Self> {
        if raw.is_empty() {
            return Err(AuthzError::pattern(raw, "pattern cannot be empty"));
        }

        let kind = if raw == WILDCARD {
            PatternKind::Any
        } else if !raw.contains('*') {
            PatternKind::Exact
        } else {
            let stars = raw.matches('*').count();
            if stars == 1 && raw.ends_with('*') {
                PatternKind::Prefix(raw[..raw.len() - 1].to_string())
            } else if stars == 1 && raw.starts_with('*') {
                PatternKind::Suffix(raw[1..].to_string())
            } else {
                PatternKind::Glob(glob_regex(raw)?)
            }
        };

        Ok(Self {
            raw: raw.to_string(),
            kind,
        })
    }

    /// Match a value against this pattern
    pub fn matches(&self, value: &str) -> bool {
        match &self.kind {
            PatternKind::Any => true,
            PatternKind::Exact => self.raw == value,
            PatternKind::Prefix(prefix) => value.starts_with(prefix.as_str()),
            PatternKind::Suffix(suffix) => value.ends_with(suffix.as_str()),
            PatternKind::Glob(regex) => regex.is_match(value),
        }
    }

    pub fn is_wildcard(&self) -> bool {
        matches!(self.kind, PatternKind::Any)
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub(crate) fn kind(&self) -> &PatternKind {
        &self.kind
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl Eq for Pattern {}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

fn glob_regex(raw: &str) -> Result<Regex> {
    let body = raw
        .split('*')
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(".*");

    // `*` spans any character, newlines included, like the prefix/suffix forms
    Regex::new(&format!("(?s)^{}$", body))
        .map_err(|e| AuthzError::pattern(raw, e.to_string()))
}
