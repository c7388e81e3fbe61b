//! Async engine facade
//!
//! Wires a [`PolicyRepository`] to the evaluator or the compiler with its
//! content-addressed cache, and records metrics.
//!
//! ```text
//! Request → PolicyRepository → CompiledCache ─┬─► CompiledPolicy ─► Decision
//!                                             └─► PolicyEvaluator ─┘
//! ```

pub mod metrics;

pub use metrics::{DecisionPath, EngineMetrics, MetricsCollector};

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

use crate::compiler::{CacheConfig, CacheStats, CompileMode, CompiledCache, PolicyCompiler};
use crate::error::Result;
use crate::evaluator::PolicyEvaluator;
use crate::repository::PolicyRepository;
use crate::types::{AccessRequest, Action, Decision, Domain, Resource, Subject};

/// Which decision path the engine uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationMode {
    /// Walk the policy on every request
    Interpreted,
    /// Compile once per policy content id and reuse
    #[default]
    Compiled,
}

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub mode: EvaluationMode,

    /// Attribute rules stay interpreted under `Fallback`; `Strict` surfaces
    /// [`crate::AuthzError::Uncompilable`] to the caller
    pub compile_mode: CompileMode,

    pub cache: CacheConfig,

    pub enable_metrics: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            mode: EvaluationMode::Compiled,
            compile_mode: CompileMode::Fallback,
            cache: CacheConfig::default(),
            enable_metrics: true,
        }
    }
}

impl EngineConfig {
    /// Parse a JSON configuration document; missing keys take defaults
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Authorization engine
pub struct AuthzEngine {
    repository: Arc<dyn PolicyRepository>,
    evaluator: PolicyEvaluator,
    compiler: PolicyCompiler,
    cache: CompiledCache,
    metrics: Option<MetricsCollector>,
    config: EngineConfig,
}

impl AuthzEngine {
    pub fn new(config: EngineConfig, repository: Arc<dyn PolicyRepository>) -> Self {
        info!(
            "AuthzEngine initialized with mode={:?}, compile_mode={:?}, cache_capacity={}",
            config.mode, config.compile_mode, config.cache.capacity
        );

        Self {
            repository,
            evaluator: PolicyEvaluator::new(),
            compiler: PolicyCompiler::with_mode(config.compile_mode),
            cache: CompiledCache::new(config.cache.clone()),
            metrics: config.enable_metrics.then(MetricsCollector::new),
            config,
        }
    }

    pub fn with_repository(repository: Arc<dyn PolicyRepository>) -> Self {
        Self::new(EngineConfig::default(), repository)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Decide a request
    ///
    /// Errors only come from the repository or, under strict compilation,
    /// from a policy the compiler refuses; no matching rule is a `Deny`.
    /// `Decision::rule_index` indexes the candidate policy returned by
    /// [`PolicyRepository::get_policies_for`] for this request.
    pub async fn check(
        &self,
        subject: &Subject,
        resource: &Resource,
        action: &Action,
        domain: Option<&Domain>,
    ) -> Result<Decision> {
        let start = Instant::now();

        let result = self.decide(subject, resource, action, domain).await;

        if let Some(metrics) = &self.metrics {
            match &result {
                Ok((decision, path)) => {
                    metrics.record_decision(decision.allowed(), *path).await;
                    metrics.record_latency(start.elapsed()).await;
                }
                Err(_) => metrics.record_error().await,
            }
        }

        result.map(|(decision, _)| decision)
    }

    async fn decide(
        &self,
        subject: &Subject,
        resource: &Resource,
        action: &Action,
        domain: Option<&Domain>,
    ) -> Result<(Decision, DecisionPath)> {
        let policy = self.repository.get_policies_for(subject, resource).await?;
        let request = AccessRequest::new(subject, resource, action).in_domain(domain);

        debug!("Evaluating {} candidate rules", policy.len());

        match self.config.mode {
            EvaluationMode::Interpreted => {
                Ok((self.evaluator.decide(&policy, &request), DecisionPath::Interpreted))
            }
            EvaluationMode::Compiled => {
                let compiled = self.cache.get_or_compile(&self.compiler, &policy)?;
                Ok((compiled.decide_request(&request), DecisionPath::Compiled))
            }
        }
    }

    /// Drop all compiled policies
    pub fn invalidate_cache(&self) {
        self.cache.clear();
        info!("Compiled policy cache invalidated");
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub async fn get_metrics(&self) -> Option<EngineMetrics> {
        match &self.metrics {
            Some(metrics) => Some(metrics.get_metrics().await),
            None => None,
        }
    }
}
