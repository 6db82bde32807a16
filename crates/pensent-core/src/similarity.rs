//! Similarity scoring between temporal signatures.

use std::collections::{HashMap, VecDeque};

use serde::{Deserialize, Serialize};

use crate::archetype::{ArchetypeRelatedness, ExactArchetypeMatch};
use crate::types::{PersistedPattern, QuadrantProfile, TemporalFlow, TemporalSignature};

const PHASE_WEIGHT: f64 = 0.6;
const TREND_WEIGHT: f64 = 0.2;
const MOMENTUM_WEIGHT: f64 = 0.2;

/// Entries kept by [`SimilarityCache::new`] before the oldest are evicted.
pub const DEFAULT_CACHE_CAPACITY: usize = 4096;

/// Relative weights of the three similarity axes. Need not sum to 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimilarityWeights {
    pub archetype: f64,
    pub quadrant: f64,
    pub temporal: f64,
}

impl Default for SimilarityWeights {
    fn default() -> Self {
        Self {
            archetype: 0.3,
            quadrant: 0.35,
            temporal: 0.35,
        }
    }
}

impl SimilarityWeights {
    /// Negative weights count as zero; an all-zero set falls back to the defaults.
    fn effective(&self) -> (f64, f64, f64) {
        let a = self.archetype.max(0.0);
        let q = self.quadrant.max(0.0);
        let t = self.temporal.max(0.0);
        let total = a + q + t;
        if !total.is_finite() || total <= 0.0 {
            let d = Self::default();
            return (d.archetype, d.quadrant, d.temporal);
        }
        (a, q, t)
    }
}

/// Mean absolute difference across shared quadrant axes, mapped to [0,1].
///
/// `center` counts only when both profiles carry it; likewise each `custom` key.
pub fn quadrant_similarity(a: &QuadrantProfile, b: &QuadrantProfile) -> f64 {
    let mut total_diff = (a.q1 - b.q1).abs()
        + (a.q2 - b.q2).abs()
        + (a.q3 - b.q3).abs()
        + (a.q4 - b.q4).abs();
    let mut axes = 4usize;

    if let (Some(ca), Some(cb)) = (a.center, b.center) {
        total_diff += (ca - cb).abs();
        axes += 1;
    }

    for (key, va) in &a.custom {
        if let Some(vb) = b.custom.get(key) {
            total_diff += (va - vb).abs();
            axes += 1;
        }
    }

    clamp_unit(1.0 - total_diff / axes as f64)
}

/// Closeness of phase activity, trend, and momentum.
pub fn temporal_flow_similarity(a: &TemporalFlow, b: &TemporalFlow) -> f64 {
    let phase_diff = ((a.opening - b.opening).abs()
        + (a.middle - b.middle).abs()
        + (a.ending - b.ending).abs())
        / 3.0;
    let phase = clamp_unit(1.0 - phase_diff);

    let trend = if a.trend == b.trend { 1.0 } else { 0.0 };

    // Momentum spans [-1,1], so the largest possible gap is 2.
    let momentum = clamp_unit(1.0 - (a.momentum - b.momentum).abs() / 2.0);

    clamp_unit(PHASE_WEIGHT * phase + TREND_WEIGHT * trend + MOMENTUM_WEIGHT * momentum)
}

/// Weighted similarity of two signatures using exact archetype matching.
pub fn signature_similarity(
    a: &TemporalSignature,
    b: &TemporalSignature,
    weights: Option<&SimilarityWeights>,
) -> f64 {
    signature_similarity_with(a, b, weights, &ExactArchetypeMatch)
}

/// Weighted similarity with a pluggable archetype relatedness strategy.
pub fn signature_similarity_with(
    a: &TemporalSignature,
    b: &TemporalSignature,
    weights: Option<&SimilarityWeights>,
    relatedness: &dyn ArchetypeRelatedness,
) -> f64 {
    let (wa, wq, wt) = weights.copied().unwrap_or_default().effective();

    let archetype = clamp_unit(relatedness.relatedness(&a.archetype, &b.archetype));
    let quadrant = quadrant_similarity(&a.quadrant_profile, &b.quadrant_profile);
    let temporal = temporal_flow_similarity(&a.temporal_flow, &b.temporal_flow);

    clamp_unit((wa * archetype + wq * quadrant + wt * temporal) / (wa + wq + wt))
}

type CacheKey = (u64, u64, [u64; 3]);

/// Memoizes pairwise similarity of stored patterns.
///
/// Keyed by pattern id, which is unique per store and never reused, so two
/// patterns sharing a fingerprint still get their own entries. Holds at most
/// `capacity` entries; the oldest insertion is evicted first.
#[derive(Debug)]
pub struct SimilarityCache {
    entries: HashMap<CacheKey, f64>,
    order: VecDeque<CacheKey>,
    capacity: usize,
    hits: u64,
    misses: u64,
}

impl Default for SimilarityCache {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CACHE_CAPACITY)
    }
}

impl SimilarityCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// A cache bounded to `capacity` entries (at least one).
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: HashMap::new(),
            order: VecDeque::new(),
            capacity: capacity.max(1),
            hits: 0,
            misses: 0,
        }
    }

    pub fn similarity(
        &mut self,
        a: &PersistedPattern,
        b: &PersistedPattern,
        weights: Option<&SimilarityWeights>,
    ) -> f64 {
        let w = weights.copied().unwrap_or_default();
        let key = (
            a.id.min(b.id),
            a.id.max(b.id),
            [
                w.archetype.to_bits(),
                w.quadrant.to_bits(),
                w.temporal.to_bits(),
            ],
        );

        if let Some(score) = self.entries.get(&key) {
            self.hits += 1;
            return *score;
        }
        self.misses += 1;
        let score = signature_similarity(&a.signature, &b.signature, Some(&w));

        while self.entries.len() >= self.capacity {
            let Some(oldest) = self.order.pop_front() else {
                break;
            };
            self.entries.remove(&oldest);
        }
        self.entries.insert(key, score);
        self.order.push_back(key);
        score
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// (hits, misses)
    pub fn stats(&self) -> (u64, u64) {
        (self.hits, self.misses)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }
}

fn clamp_unit(x: f64) -> f64 {
    if x.is_nan() {
        return 0.0;
    }
    x.clamp(0.0, 1.0)
}
