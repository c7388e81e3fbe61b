//! Decision metrics for the engine facade

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

/// Which path produced a decision
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecisionPath {
    Compiled,
    Interpreted,
}

/// Engine counters and latency summary
#[derive(Debug, Clone, Default)]
pub struct EngineMetrics {
    /// Total number of authorization requests
    pub total_requests: u64,

    /// Number of allowed decisions
    pub allowed_decisions: u64,

    /// Number of denied decisions
    pub denied_decisions: u64,

    /// Decisions answered by a compiled table
    pub compiled_decisions: u64,

    /// Decisions answered by the interpreter
    pub interpreted_decisions: u64,

    pub latency_p50_ms: f64,
    pub latency_p99_ms: f64,
    pub avg_latency_ms: f64,

    /// Repository / compilation failures
    pub error_count: u64,
}

impl EngineMetrics {
    /// Calculate allow rate
    pub fn allow_rate(&self) -> f64 {
        let total = self.allowed_decisions + self.denied_decisions;
        if total == 0 {
            0.0
        } else {
            self.allowed_decisions as f64 / total as f64
        }
    }
}

/// Collects [`EngineMetrics`]
pub struct MetricsCollector {
    metrics: Arc<RwLock<EngineMetrics>>,

    /// Recent latency samples (ms) for percentiles
    latency_samples: Arc<RwLock<Vec<f64>>>,

    max_samples: usize,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self::with_max_samples(10_000)
    }

    pub fn with_max_samples(max_samples: usize) -> Self {
        Self {
            metrics: Arc::new(RwLock::new(EngineMetrics::default())),
            latency_samples: Arc::new(RwLock::new(Vec::with_capacity(max_samples.min(10_000)))),
            max_samples: max_samples.max(1),
        }
    }

    /// Record an authorization decision
    pub async fn record_decision(&self, allowed: bool, path: DecisionPath) {
        let mut metrics = self.metrics.write().await;
        metrics.total_requests += 1;

        if allowed {
            metrics.allowed_decisions += 1;
        } else {
            metrics.denied_decisions += 1;
        }

        match path {
            DecisionPath::Compiled => metrics.compiled_decisions += 1,
            DecisionPath::Interpreted => metrics.interpreted_decisions += 1,
        }
    }

    /// Record request latency
    pub async fn record_latency(&self, latency: Duration) {
        let latency_ms = latency.as_secs_f64() * 1000.0;

        let mut samples = self.latency_samples.write().await;
        samples.push(latency_ms);

        // Keep only recent samples
        if samples.len() > self.max_samples {
            let excess = samples.len() - self.max_samples;
            samples.drain(0..excess);
        }

        let mut sorted = samples.clone();
        drop(samples);
        sorted.sort_by(|a, b| a.total_cmp(b));

        let mut metrics = self.metrics.write().await;
        metrics.avg_latency_ms = sorted.iter().sum::<f64>() / sorted.len() as f64;
        metrics.latency_p50_ms = Self::percentile(&sorted, 0.50);
        metrics.latency_p99_ms = Self::percentile(&sorted, 0.99);
    }

    /// Record an error
    pub async fn record_error(&self) {
        let mut metrics = self.metrics.write().await;
        metrics.error_count += 1;
    }

    /// Get current metrics snapshot
    pub async fn get_metrics(&self) -> EngineMetrics {
        self.metrics.read().await.clone()
    }

    /// Reset all metrics
    pub async fn reset(&self) {
        *self.metrics.write().await = EngineMetrics::default();
        self.latency_samples.write().await.clear();
    }

    /// Export metrics in Prometheus text format
    pub async fn export_prometheus(&self) -> String {
        let metrics = self.metrics.read().await;

        format!(
            r#"# HELP tessera_requests_total Total number of authorization requests
# TYPE tessera_requests_total counter
tessera_requests_total {}

# HELP tessera_decisions_total Decisions by effect
# TYPE tessera_decisions_total counter
tessera_decisions_total{{effect="allow"}} {}
tessera_decisions_total{{effect="deny"}} {}

# HELP tessera_decision_path_total Decisions by evaluation path
# TYPE tessera_decision_path_total counter
tessera_decision_path_total{{path="compiled"}} {}
tessera_decision_path_total{{path="interpreted"}} {}

# HELP tessera_latency_seconds Request latency percentiles
# TYPE tessera_latency_seconds summary
tessera_latency_seconds{{quantile="0.5"}} {}
tessera_latency_seconds{{quantile="0.99"}} {}

# HELP tessera_errors_total Error count
# TYPE tessera_errors_total counter
tessera_errors_total {}
"#,
            metrics.total_requests,
            metrics.allowed_decisions,
            metrics.denied_decisions,
            metrics.compiled_decisions,
            metrics.interpreted_decisions,
            metrics.latency_p50_ms / 1000.0,
            metrics.latency_p99_ms / 1000.0,
            metrics.error_count,
        )
    }

    /// Percentile from sorted data
    fn percentile(sorted: &[f64], p: f64) -> f64 {
        if sorted.is_empty() {
            return 0.0;
        }

        let idx = ((sorted.len() as f64) * p) as usize;
        sorted[idx.min(sorted.len() - 1)]
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}
