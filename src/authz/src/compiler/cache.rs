//! Compiled-policy cache keyed by content id

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

use super::{CompileMode, CompiledPolicy, ContentId, PolicyCompiler};
use crate::error::Result;
use crate::policy::Policy;

/// Cache configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Maximum number of compiled policies kept; `0` disables caching
    pub capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { capacity: 1_024 }
    }
}

type CacheKey = (ContentId, CompileMode);

/// Thread-safe cache of compiled policies
///
/// Keys are content id plus compile mode, so an entry can never serve a
/// policy whose rules differ from the ones it was compiled from, nor a
/// compiler running under a different mode.
pub struct CompiledCache {
    entries: DashMap<CacheKey, Arc<CompiledPolicy>>,
    config: CacheConfig,
    stats: DashMap<&'static str, usize>,
}

impl CompiledCache {
    pub fn new(config: CacheConfig) -> Self {
        Self {
            entries: DashMap::new(),
            config,
            stats: DashMap::new(),
        }
    }

    pub fn get(&self, id: &ContentId, mode: CompileMode) -> Option<Arc<CompiledPolicy>> {
        match self.entries.get(&(*id, mode)) {
            Some(entry) => {
                self.increment_stat("hits");
                Some(Arc::clone(entry.value()))
            }
            None => {
                self.increment_stat("misses");
                None
            }
        }
    }

    pub fn insert(&self, compiled: Arc<CompiledPolicy>) {
        if self.config.capacity == 0 {
            return;
        }

        let key = (compiled.content_id(), compiled.mode());
        if self.entries.len() >= self.config.capacity && !self.entries.contains_key(&key) {
            self.evict();
        }

        self.entries.insert(key, compiled);
    }

    /// Return the cached table for `policy`, compiling it on a miss
    pub fn get_or_compile(&self, compiler: &PolicyCompiler, policy: &Policy) -> Result<Arc<CompiledPolicy>> {
        let id = ContentId::of(policy)?;
        if let Some(hit) = self.get(&id, compiler.mode()) {
            return Ok(hit);
        }

        let (compiled, _) = compiler.compile(policy)?;
        let compiled = Arc::new(compiled);
        self.insert(Arc::clone(&compiled));
        Ok(compiled)
    }

    pub fn clear(&self) {
        self.entries.clear();
        self.stats.clear();
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.get_stat("hits"),
            misses: self.get_stat("misses"),
            evictions: self.get_stat("evictions"),
            entries: self.entries.len(),
            capacity: self.config.capacity,
        }
    }

    /// Drop roughly a tenth of the entries (at least one)
    fn evict(&self) {
        let to_remove = (self.config.capacity / 10).max(1);
        let victims: Vec<CacheKey> = self
            .entries
            .iter()
            .take(to_remove)
            .map(|entry| *entry.key())
            .collect();

        for id in &victims {
            self.entries.remove(id);
        }

        self.stats
            .entry("evictions")
            .and_modify(|count| *count += victims.len())
            .or_insert(victims.len());

        debug!(evicted = victims.len(), "compiled cache eviction");
    }

    fn increment_stat(&self, key: &'static str) {
        self.stats
            .entry(key)
            .and_modify(|count| *count += 1)
            .or_insert(1);
    }

    fn get_stat(&self, key: &'static str) -> usize {
        self.stats.get(key).map(|v| *v).unwrap_or(0)
    }
}

impl Default for CompiledCache {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}

/// Cache statistics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: usize,
    pub misses: usize,
    pub evictions: usize,
    pub entries: usize,
    pub capacity: usize,
}

impl CacheStats {
    /// Calculate cache hit rate
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}
