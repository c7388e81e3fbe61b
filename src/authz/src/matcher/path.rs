//! Path-template matching for hierarchical resource identifiers
//!
//! Templates look like `/projects/{project}/files/*` or `/api/v1/**`.

use std::collections::HashMap;

use crate::error::{AuthzError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    /// `{name}` or `:name`, exactly one segment
    Param(String),
    /// `*`, exactly one segment
    Any,
    /// trailing `**`, zero or more segments
    Rest,
}

/// Parsed path template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathTemplate {
    raw: String,
    segments: Vec<Segment>,
}

impl PathTemplate {
    /// Whether a resource pattern should be treated as a path template
    pub fn is_template(pattern: &str) -> bool {
        pattern.starts_with('/')
    }

    pub fn parse(raw: &str) -> Result<Self> {
        let Some(body) = raw.strip_prefix('/') else {
            return Err(AuthzError::pattern(raw, "path template must start with '/'"));
        };

        let parts: Vec<&str> = body.split('/').collect();
        let mut segments = Vec::with_capacity(parts.len());

        for (idx, part) in parts.iter().enumerate() {
            let segment = match *part {
                "**" if idx + 1 == parts.len() => Segment::Rest,
                "**" => {
                    return Err(AuthzError::pattern(raw, "'**' can only appear at the end"));
                }
                "*" => Segment::Any,
                p if p.starts_with('{') => {
                    let name = p
                        .strip_suffix('}')
                        .map(|p| &p[1..])
                        .ok_or_else(|| AuthzError::pattern(raw, format!("unclosed parameter '{}'", p)))?;
                    Segment::Param(param_name(raw, name)?)
                }
                p if p.starts_with(':') => Segment::Param(param_name(raw, &p[1..])?),
                p if p.contains('*') || p.contains('{') || p.contains('}') => {
                    return Err(AuthzError::pattern(
                        raw,
                        format!("wildcards and parameters must be whole segments: '{}'", p),
                    ));
                }
                p => Segment::Literal(p.to_string()),
            };
            segments.push(segment);
        }

        Ok(Self {
            raw: raw.to_string(),
            segments,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn matches(&self, path: &str) -> bool {
        self.captures(path).is_some()
    }

    /// Match a path and return the bound parameters
    pub fn captures(&self, path: &str) -> Option<HashMap<String, String>> {
        let body = path.strip_prefix('/')?;
        let parts: Vec<&str> = body.split('/').collect();
        let mut bindings = HashMap::new();

        for (idx, segment) in self.segments.iter().enumerate() {
            match segment {
                Segment::Rest => return Some(bindings),
                _ if idx >= parts.len() => return None,
                Segment::Literal(lit) if lit != parts[idx] => return None,
                Segment::Literal(_) => {}
                Segment::Any if parts[idx].is_empty() => return None,
                Segment::Any => {}
                Segment::Param(_) if parts[idx].is_empty() => return None,
                Segment::Param(name) => {
                    bindings.insert(name.clone(), parts[idx].to_string());
                }
            }
        }

        (parts.len() == self.segments.len()).then_some(bindings)
    }
}

fn param_name(raw: &str, name: &str) -> Result<String> {
    if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(AuthzError::pattern(raw, format!("invalid parameter name '{}'", name)));
    }
    Ok(name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_path() {
        let template = PathTemplate::parse("/api/users").unwrap();
        assert!(template.matches("/api/users"));
        assert!(!template.matches("/api/users/1"));
        assert!(!template.matches("api/users"));
    }

    #[test]
    fn test_params_bind_one_segment() {
        let template = PathTemplate::parse("/projects/{project}/files/:file").unwrap();
        let bindings = template.captures("/projects/7/files/readme.md").unwrap();
        assert_eq!(bindings.get("project").map(String::as_str), Some("7"));
        assert_eq!(bindings.get("file").map(String::as_str), Some("readme.md"));

        assert!(!template.matches("/projects/7/files"));
        assert!(!template.matches("/projects//files/x"));
    }

    #[test]
    fn test_single_and_rest_wildcards() {
        let one = PathTemplate::parse("/docs/*").unwrap();
        assert!(one.matches("/docs/a"));
        assert!(!one.matches("/docs/a/b"));

        let rest = PathTemplate::parse("/api/**").unwrap();
        assert!(rest.matches("/api"));
        assert!(rest.matches("/api/v1/orders/3"));
        assert!(!rest.matches("/other/v1"));
    }

    #[test]
    fn test_invalid_templates() {
        assert!(PathTemplate::parse("api/x").is_err());
        assert!(PathTemplate::parse("/a/**/b").is_err());
        assert!(PathTemplate::parse("/a/{id").is_err());
        assert!(PathTemplate::parse("/a/{}").is_err());
        assert!(PathTemplate::parse("/a/b*").is_err());
    }
}
