//! Persisted compiled-policy artifacts
//!
//! An artifact stores the rule records together with the content id they
//! hash to. Loading recompiles the rules and refuses artifacts whose id does
//! not match, so a cached artifact can never drift from its source policy.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

use super::{CompiledPolicy, ContentId, PolicyCompiler};
use crate::error::{AuthzError, Result};
use crate::policy::{Policy, RuleRecord};

/// Current on-disk artifact format
pub const ARTIFACT_FORMAT_VERSION: u32 = 1;

/// On-disk form of a compiled policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompiledArtifact {
    pub format_version: u32,

    /// Hex content id of `rules`
    pub content_id: String,

    /// Rules in insertion order
    pub rules: Vec<RuleRecord>,
}

impl PolicyCompiler {
    /// Compile `policy` and persist it as an artifact at `path`
    ///
    /// The policy must compile under this compiler's mode. The file is
    /// written to a sibling temp path and renamed into place.
    pub async fn compile_to_file(&self, policy: &Policy, path: impl AsRef<Path>) -> Result<ContentId> {
        let path = path.as_ref();
        let (_, content_id) = self.compile(policy)?;

        let artifact = CompiledArtifact {
            format_version: ARTIFACT_FORMAT_VERSION,
            content_id: content_id.to_hex(),
            rules: policy.to_records(),
        };
        let bytes = serde_json::to_vec_pretty(&artifact)?;

        let tmp = path.with_extension("tmp");
        tokio::fs::write(&tmp, &bytes).await?;
        tokio::fs::rename(&tmp, path).await?;

        info!(policy = %content_id, path = %path.display(), "compiled policy artifact written");

        Ok(content_id)
    }

    /// Load and recompile an artifact written by [`PolicyCompiler::compile_to_file`]
    pub async fn load_artifact(&self, path: impl AsRef<Path>) -> Result<(CompiledPolicy, ContentId)> {
        let bytes = tokio::fs::read(path.as_ref()).await?;
        let artifact: CompiledArtifact = serde_json::from_slice(&bytes)?;

        if artifact.format_version != ARTIFACT_FORMAT_VERSION {
            return Err(AuthzError::InvalidPolicy(format!(
                "unsupported artifact format version {}",
                artifact.format_version
            )));
        }

        let policy = Policy::from_records(artifact.rules)?;
        let (compiled, content_id) = self.compile(&policy)?;

        if content_id.to_hex() != artifact.content_id {
            return Err(AuthzError::ContentMismatch {
                expected: artifact.content_id,
                actual: content_id.to_hex(),
            });
        }

        Ok((compiled, content_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::PolicyRule;
    use crate::types::{Action, Effect, Resource, Subject};

    fn sample_policy() -> Policy {
        Policy::new(vec![
            PolicyRule::allow("role:editor", "write").resource("doc:*").build().unwrap(),
            PolicyRule::deny("*", "write").resource("doc:locked").priority(10).build().unwrap(),
        ])
    }

    #[tokio::test]
    async fn test_artifact_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("policy.json");
        let compiler = PolicyCompiler::new();

        let written = compiler.compile_to_file(&sample_policy(), &path).await.unwrap();
        let (compiled, loaded) = compiler.load_artifact(&path).await.unwrap();

        assert_eq!(written, loaded);
        let editor = Subject::new("role:editor");
        let write = Action::new("write");
        assert_eq!(compiled.decide(&editor, &Resource::new("doc:1"), &write), Effect::Allow);
        assert_eq!(compiled.decide(&editor, &Resource::new("doc:locked"), &write), Effect::Deny);
    }

    #[tokio::test]
    async fn test_tampered_artifact_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("policy.json");
        let compiler = PolicyCompiler::new();
        compiler.compile_to_file(&sample_policy(), &path).await.unwrap();

        let mut artifact: CompiledArtifact =
            serde_json::from_slice(&tokio::fs::read(&path).await.unwrap()).unwrap();
        artifact.rules[1].priority = 0;
        tokio::fs::write(&path, serde_json::to_vec(&artifact).unwrap()).await.unwrap();

        let err = compiler.load_artifact(&path).await.unwrap_err();
        assert!(matches!(err, AuthzError::ContentMismatch { .. }));
    }

    #[tokio::test]
    async fn test_unknown_format_version_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("policy.json");
        let artifact = CompiledArtifact {
            format_version: 99,
            content_id: String::new(),
            rules: Vec::new(),
        };
        tokio::fs::write(&path, serde_json::to_vec(&artifact).unwrap()).await.unwrap();

        let err = PolicyCompiler::new().load_artifact(&path).await.unwrap_err();
        assert!(matches!(err, AuthzError::InvalidPolicy(_)));
    }
}
