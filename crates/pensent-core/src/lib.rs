//! En Pensent: temporal signatures, pattern matching and outcome fusion.
//!
//! Domain adapters (chess, code, market) turn raw sequences into a
//! [`TemporalSignature`]. This crate scores signatures against a pool of
//! resolved historical patterns and turns the matches into outcome
//! probabilities and a fused recommendation.

pub mod archetype;
pub mod fusion;
pub mod matcher;
pub mod similarity;
pub mod storage;
pub mod store;
pub mod types;

#[cfg(test)]
mod testutil;

pub use archetype::{
    ArchetypeCatalog, ArchetypeDefinition, ArchetypeRegistry, ArchetypeRelatedness,
    ExactArchetypeMatch, PredictedOutcome, RegistryRelatedness,
};
pub use fusion::{
    analyze, classify_outcome, derive_strategic_insight, fuse_recommendation,
    predict_trajectory, FusedRecommendation, FusionConfig, HybridAnalysis, OutcomeSide,
    Priority, StrategicInsight, TacticalInsight, TrajectoryMilestone, TrajectoryPrediction,
    NO_PATTERN_DATA,
};
pub use matcher::{
    find_similar_patterns, find_similar_patterns_with, match_confidence, most_likely_outcome,
    outcome_probabilities, pattern_diversity, MatchOptions, OutcomeEstimate,
    DEFAULT_MIN_SAMPLE_SIZE,
};
pub use similarity::{
    quadrant_similarity, signature_similarity, signature_similarity_with,
    temporal_flow_similarity, SimilarityCache, SimilarityWeights, DEFAULT_CACHE_CAPACITY,
};
pub use storage::{PensReader, PensWriter};
pub use store::{PatternPoolProvider, PatternStore, PoolFilter};
pub use types::*;
