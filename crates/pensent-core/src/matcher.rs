//! Pattern matching against a historical pool and aggregation of matched outcomes.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::archetype::{ArchetypeRelatedness, ExactArchetypeMatch};
use crate::similarity::{signature_similarity_with, SimilarityWeights};
use crate::types::{PatternMatch, PersistedPattern, TemporalSignature};

/// Sample size below which match confidence is scaled down.
pub const DEFAULT_MIN_SAMPLE_SIZE: usize = 5;

/// Filters and limits for [`find_similar_patterns`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchOptions {
    /// Inclusive lower bound on similarity. Unset means 0.0, i.e. keep everything.
    #[serde(default)]
    pub min_similarity: Option<f64>,
    #[serde(default)]
    pub limit: Option<usize>,
    /// Allow-list on the pattern signature's archetype. Empty means no filter.
    #[serde(default)]
    pub archetype_filter: Vec<String>,
    /// Allow-list on the recorded outcome. Empty means no filter.
    #[serde(default)]
    pub outcome_filter: Vec<String>,
    #[serde(default)]
    pub weights: Option<SimilarityWeights>,
}

impl MatchOptions {
    pub fn with_min_similarity(mut self, min: f64) -> Self {
        self.min_similarity = Some(min);
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// The arg-max of an outcome distribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutcomeEstimate {
    pub outcome: String,
    pub probability: f64,
}

/// Score `target` against every pattern in `pool` and keep the best.
pub fn find_similar_patterns(
    target: &TemporalSignature,
    pool: &[PersistedPattern],
    options: &MatchOptions,
) -> Vec<PatternMatch> {
    find_similar_patterns_with(target, pool, options, &ExactArchetypeMatch)
}

/// [`find_similar_patterns`] with a custom archetype relatedness strategy.
pub fn find_similar_patterns_with(
    target: &TemporalSignature,
    pool: &[PersistedPattern],
    options: &MatchOptions,
    relatedness: &dyn ArchetypeRelatedness,
) -> Vec<PatternMatch> {
    let min_similarity = options.min_similarity.unwrap_or(0.0);

    let mut matches: Vec<PatternMatch> = pool
        .iter()
        .filter(|p| {
            options.archetype_filter.is_empty()
                || options.archetype_filter.contains(&p.signature.archetype)
        })
        .filter(|p| options.outcome_filter.is_empty() || options.outcome_filter.contains(&p.outcome))
        .map(|p| PatternMatch {
            pattern_id: p.id,
            similarity: signature_similarity_with(
                target,
                &p.signature,
                options.weights.as_ref(),
                relatedness,
            ),
            signature: p.signature.clone(),
            outcome: p.outcome.clone(),
            source_metadata: p.metadata.clone(),
        })
        .filter(|m| m.similarity >= min_similarity)
        .collect();

    // Stable sort: equal scores keep pool order.
    matches.sort_by(|a, b| {
        b.similarity
            .partial_cmp(&a.similarity)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    if let Some(limit) = options.limit {
        matches.truncate(limit);
    }

    tracing::debug!(
        pool = pool.len(),
        matched = matches.len(),
        min_similarity,
        "Pattern search complete"
    );
    matches
}

/// Similarity-weighted vote over matched outcomes.
///
/// Sums to 1 for any non-empty input. If every similarity is zero each match
/// gets an equal vote.
pub fn outcome_probabilities(matches: &[PatternMatch]) -> BTreeMap<String, f64> {
    let mut weights: BTreeMap<String, f64> = BTreeMap::new();
    if matches.is_empty() {
        return weights;
    }

    let total: f64 = matches.iter().map(|m| vote_weight(m.similarity)).sum();
    let uniform = total <= 0.0;

    for m in matches {
        let w = if uniform { 1.0 } else { vote_weight(m.similarity) };
        *weights.entry(m.outcome.clone()).or_insert(0.0) += w;
    }

    let denom = if uniform { matches.len() as f64 } else { total };
    for w in weights.values_mut() {
        *w /= denom;
    }
    weights
}

/// The most probable outcome; ties go to the outcome seen first in `matches`.
pub fn most_likely_outcome(matches: &[PatternMatch]) -> Option<OutcomeEstimate> {
    let probabilities = outcome_probabilities(matches);

    let mut best: Option<OutcomeEstimate> = None;
    for m in matches {
        let Some(&probability) = probabilities.get(&m.outcome) else {
            continue;
        };
        if best.as_ref().map_or(true, |b| probability > b.probability) {
            best = Some(OutcomeEstimate {
                outcome: m.outcome.clone(),
                probability,
            });
        }
    }
    best
}

/// Normalized Herfindahl diversity over (archetype, outcome) pairs.
///
/// 0 for fewer than two matches or a homogeneous set, 1 when every pair is distinct.
pub fn pattern_diversity(matches: &[PatternMatch]) -> f64 {
    let n = matches.len();
    if n < 2 {
        return 0.0;
    }

    let mut counts: BTreeMap<(&str, &str), usize> = BTreeMap::new();
    for m in matches {
        *counts
            .entry((m.signature.archetype.as_str(), m.outcome.as_str()))
            .or_insert(0) += 1;
    }

    let n_f = n as f64;
    let concentration: f64 = counts
        .values()
        .map(|&c| {
            let p = c as f64 / n_f;
            p * p
        })
        .sum();

    ((1.0 - concentration) / (1.0 - 1.0 / n_f)).clamp(0.0, 1.0)
}

/// Confidence in a match set from its size, average similarity, and consensus.
///
/// Sets smaller than `min_sample_size` are scaled down proportionally.
pub fn match_confidence(matches: &[PatternMatch], min_sample_size: usize) -> f64 {
    if matches.is_empty() {
        return 0.0;
    }

    let n = matches.len() as f64;
    let m = min_sample_size.max(1) as f64;

    let avg_similarity =
        matches.iter().map(|p| p.similarity.clamp(0.0, 1.0)).sum::<f64>() / n;
    let consensus = 1.0 - pattern_diversity(matches);
    let volume = n / (n + m);
    let sample_factor = (n / m).min(1.0);

    ((0.5 * avg_similarity + 0.3 * consensus + 0.2 * volume) * sample_factor).clamp(0.0, 1.0)
}

fn vote_weight(similarity: f64) -> f64 {
    if similarity.is_finite() {
        similarity.max(0.0)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{contrasting, pattern, signature};

    fn m(archetype: &str, outcome: &str, similarity: f64) -> PatternMatch {
        PatternMatch {
            pattern_id: 0,
            similarity,
            signature: signature("fp", archetype),
            outcome: outcome.to_string(),
            source_metadata: None,
        }
    }

    fn sum(probs: &BTreeMap<String, f64>) -> f64 {
        probs.values().sum()
    }

    #[test]
    fn test_empty_pool() {
        let target = signature("t", "type_a");
        assert!(find_similar_patterns(&target, &[], &MatchOptions::default()).is_empty());
    }

    #[test]
    fn test_limit_respected() {
        let target = signature("t", "type_a");
        let pool: Vec<_> = (1..=24)
            .map(|i| {
                let sig = if i % 2 == 0 {
                    signature(&format!("fp{i}"), "type_a")
                } else {
                    contrasting(&format!("fp{i}"), "type_b")
                };
                pattern(i, sig, "win")
            })
            .collect();
        for limit in [0, 1, 5, 20, 30] {
            let found = find_similar_patterns(&target, &pool, &MatchOptions::default().with_limit(limit));
            assert!(found.len() <= limit);
        }
        let all = find_similar_patterns(&target, &pool, &MatchOptions::default());
        assert_eq!(all.len(), 24);
    }

    #[test]
    fn test_sorted_descending_stable() {
        let target = signature("t", "type_a");
        let pool = vec![
            pattern(1, contrasting("c1", "type_b"), "loss"),
            pattern(2, signature("s2", "type_a"), "win"),
            pattern(3, signature("s3", "type_a"), "draw"),
        ];
        let found = find_similar_patterns(&target, &pool, &MatchOptions::default());
        let ids: Vec<u64> = found.iter().map(|m| m.pattern_id).collect();
        assert_eq!(ids, vec![2, 3, 1]);
        assert!(found.windows(2).all(|w| w[0].similarity >= w[1].similarity));
    }

    #[test]
    fn test_archetype_filter() {
        let target = signature("t", "type_a");
        let pool = vec![
            pattern(1, signature("a1", "type_a"), "win"),
            pattern(2, signature("b1", "type_b"), "win"),
            pattern(3, contrasting("a2", "type_a"), "loss"),
        ];
        let options = MatchOptions {
            archetype_filter: vec!["type_a".to_string()],
            ..Default::default()
        };
        let found = find_similar_patterns(&target, &pool, &options);
        assert_eq!(found.len(), 2);
        assert!(found.iter().all(|m| m.signature.archetype == "type_a"));
    }

    #[test]
    fn test_outcome_filter_and_metadata_copied() {
        let target = signature("t", "type_a");
        let pool = vec![
            pattern(1, signature("a1", "type_a"), "win")
                .with_metadata(serde_json::json!({"event": "Linares 1994"})),
            pattern(2, signature("a2", "type_a"), "loss"),
        ];
        let options = MatchOptions {
            outcome_filter: vec!["win".to_string()],
            ..Default::default()
        };
        let found = find_similar_patterns(&target, &pool, &options);
        assert_eq!(found.len(), 1);
        assert_eq!(
            found[0].source_metadata,
            Some(serde_json::json!({"event": "Linares 1994"}))
        );
    }

    #[test]
    fn test_min_similarity_inclusive() {
        let target = signature("t", "type_a");
        let pool = vec![pattern(1, signature("a1", "type_a"), "win")];
        let found = find_similar_patterns(
            &target,
            &pool,
            &MatchOptions::default().with_min_similarity(1.0),
        );
        assert_eq!(found.len(), 1);
    }

    #[test]
    fn test_probabilities_empty() {
        assert!(outcome_probabilities(&[]).is_empty());
    }

    #[test]
    fn test_probabilities_exact_split() {
        let probs = outcome_probabilities(&[m("a", "win", 1.0), m("a", "loss", 0.0)]);
        assert_eq!(probs["win"], 1.0);
        assert_eq!(probs["loss"], 0.0);
    }

    #[test]
    fn test_probabilities_sum_to_one() {
        let matches = vec![
            m("a", "win", 0.9),
            m("a", "win", 0.35),
            m("b", "loss", 0.5),
            m("c", "draw", 0.12),
        ];
        assert!((sum(&outcome_probabilities(&matches)) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_probabilities_all_zero_similarity() {
        let probs = outcome_probabilities(&[m("a", "win", 0.0), m("a", "loss", 0.0)]);
        assert_eq!(probs["win"], 0.5);
        assert_eq!(probs["loss"], 0.5);
    }

    #[test]
    fn test_most_likely_empty() {
        assert!(most_likely_outcome(&[]).is_none());
    }

    #[test]
    fn test_most_likely_tie_first_seen() {
        let best = most_likely_outcome(&[m("a", "loss", 0.5), m("b", "win", 0.5)]).unwrap();
        assert_eq!(best.outcome, "loss");
        assert_eq!(best.probability, 0.5);
    }

    #[test]
    fn test_diversity_edges() {
        assert_eq!(pattern_diversity(&[]), 0.0);
        assert_eq!(pattern_diversity(&[m("a", "win", 0.9)]), 0.0);
        let distinct = vec![m("a", "win", 0.9), m("b", "win", 0.8), m("a", "loss", 0.7)];
        assert!((pattern_diversity(&distinct) - 1.0).abs() < 1e-12);
        let same = vec![m("a", "win", 0.9), m("a", "win", 0.8), m("a", "win", 0.7)];
        assert!(pattern_diversity(&same) < 0.5);
    }

    #[test]
    fn test_confidence_empty() {
        assert_eq!(match_confidence(&[], DEFAULT_MIN_SAMPLE_SIZE), 0.0);
    }

    #[test]
    fn test_confidence_grows_with_count() {
        let mut previous = 0.0;
        for n in 1..=12 {
            let matches: Vec<_> = (0..n).map(|_| m("a", "win", 0.7)).collect();
            let c = match_confidence(&matches, DEFAULT_MIN_SAMPLE_SIZE);
            assert!(c >= previous, "confidence dropped at n={n}");
            previous = c;
        }
    }

    #[test]
    fn test_confidence_grows_with_similarity() {
        let low: Vec<_> = (0..4).map(|_| m("a", "win", 0.3)).collect();
        let high: Vec<_> = (0..4).map(|_| m("a", "win", 0.9)).collect();
        assert!(
            match_confidence(&high, DEFAULT_MIN_SAMPLE_SIZE)
                >= match_confidence(&low, DEFAULT_MIN_SAMPLE_SIZE)
        );
    }

    #[test]
    fn test_confidence_consensus_beats_diversity() {
        let consensus = vec![m("a", "win", 0.8), m("a", "win", 0.8), m("a", "win", 0.8)];
        let diverse = vec![m("a", "win", 0.8), m("b", "loss", 0.8), m("c", "draw", 0.8)];
        assert!(match_confidence(&consensus, 3) > match_confidence(&diverse, 3));
    }

    #[test]
    fn test_confidence_min_sample_penalty() {
        let matches = vec![m("a", "win", 0.8), m("a", "win", 0.75), m("b", "loss", 0.6)];
        assert!(match_confidence(&matches, 10) <= match_confidence(&matches, 2));
        assert!(match_confidence(&matches, 0) <= 1.0);
    }
}
