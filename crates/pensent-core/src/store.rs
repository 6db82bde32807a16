//! In-memory pattern pool and the provider interface the matcher reads from.

use serde::{Deserialize, Serialize};

use crate::types::{now_secs, Domain, PersistedPattern};

/// Criteria applied when fetching a pool for matching.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PoolFilter {
    #[serde(default)]
    pub archetypes: Vec<String>,
    #[serde(default)]
    pub outcomes: Vec<String>,
    /// Only patterns created at or after this unix timestamp.
    #[serde(default)]
    pub created_after: Option<u64>,
    /// Keep at most this many, newest first.
    #[serde(default)]
    pub limit: Option<usize>,
}

impl PoolFilter {
    fn accepts(&self, p: &PersistedPattern) -> bool {
        if !self.archetypes.is_empty() && !self.archetypes.contains(&p.archetype) {
            return false;
        }
        if !self.outcomes.is_empty() && !self.outcomes.contains(&p.outcome) {
            return false;
        }
        if let Some(after) = self.created_after {
            if p.created_at < after {
                return false;
            }
        }
        true
    }
}

/// Source of historical patterns for one domain.
pub trait PatternPoolProvider {
    fn fetch_pattern_pool(&self, domain: Domain, filter: &PoolFilter) -> Vec<PersistedPattern>;
}

/// Container for all recorded patterns.
#[derive(Debug, Clone)]
pub struct PatternStore {
    pub patterns: Vec<PersistedPattern>,
    pub next_id: u64,
    pub session_count: u32,
    pub created_at: u64,
    pub updated_at: u64,
}

impl PatternStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        let now = now_secs();
        Self {
            patterns: Vec::new(),
            next_id: 1,
            session_count: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn get(&self, id: u64) -> Option<&PersistedPattern> {
        self.patterns.iter().find(|p| p.id == id)
    }

    /// Add a pattern and return its assigned ID.
    pub fn add(&mut self, mut pattern: PersistedPattern) -> u64 {
        let id = self.next_id;
        pattern.id = id;
        self.next_id += 1;
        self.updated_at = now_secs();
        self.patterns.push(pattern);
        id
    }

    pub fn count(&self) -> usize {
        self.patterns.len()
    }

    pub fn by_domain(&self, domain: Domain) -> Vec<&PersistedPattern> {
        self.patterns.iter().filter(|p| p.domain == domain).collect()
    }

    /// Count per domain, in [`Domain::ALL`] order.
    pub fn domain_counts(&self) -> Vec<(Domain, usize)> {
        Domain::ALL
            .iter()
            .map(|d| (*d, self.patterns.iter().filter(|p| p.domain == *d).count()))
            .collect()
    }

    /// Most recently created patterns first.
    pub fn recent(&self, limit: usize) -> Vec<&PersistedPattern> {
        let mut sorted: Vec<_> = self.patterns.iter().collect();
        sorted.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        sorted.truncate(limit);
        sorted
    }

    /// Owned pool for one domain, in insertion order.
    pub fn pool(&self, domain: Domain, filter: &PoolFilter) -> Vec<PersistedPattern> {
        let mut pool: Vec<PersistedPattern> = self
            .patterns
            .iter()
            .filter(|p| p.domain == domain && filter.accepts(p))
            .cloned()
            .collect();

        if let Some(limit) = filter.limit {
            if pool.len() > limit {
                // Keep the newest entries but preserve insertion order.
                let mut by_age: Vec<(u64, u64)> =
                    pool.iter().map(|p| (p.created_at, p.id)).collect();
                by_age.sort_by(|a, b| b.cmp(a));
                by_age.truncate(limit);
                pool.retain(|p| by_age.contains(&(p.created_at, p.id)));
            }
        }
        pool
    }
}

impl Default for PatternStore {
    fn default() -> Self {
        Self::new()
    }
}

impl PatternPoolProvider for PatternStore {
    fn fetch_pattern_pool(&self, domain: Domain, filter: &PoolFilter) -> Vec<PersistedPattern> {
        self.pool(domain, filter)
    }
}
