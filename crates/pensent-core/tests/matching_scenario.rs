//! End-to-end matching scenarios over the public API.

use serde_json::Map;

use pensent_core::{
    analyze, find_similar_patterns, match_confidence, most_likely_outcome, pattern_diversity,
    signature_similarity, ArchetypeRegistry, Domain, DominantForce, FlowDirection, FusionConfig,
    MatchOptions, PatternMatch, PatternPoolProvider, PatternStore, PersistedPattern, PoolFilter,
    QuadrantProfile, SimilarityWeights, TacticalInsight, TemporalFlow, TemporalSignature, Trend,
    DEFAULT_MIN_SAMPLE_SIZE, NO_PATTERN_DATA,
};

fn sig(fingerprint: &str, archetype: &str, quadrants: [f64; 4], trend: Trend) -> TemporalSignature {
    TemporalSignature {
        fingerprint: fingerprint.to_string(),
        archetype: archetype.to_string(),
        dominant_force: DominantForce::Balanced,
        flow_direction: FlowDirection::Lateral,
        intensity: 0.5,
        quadrant_profile: QuadrantProfile::new(
            quadrants[0],
            quadrants[1],
            quadrants[2],
            quadrants[3],
        ),
        temporal_flow: TemporalFlow {
            opening: 0.4,
            middle: 0.5,
            ending: 0.3,
            trend,
            momentum: 0.1,
        },
        critical_moments: Vec::new(),
        domain_data: Map::new(),
    }
}

fn matched(archetype: &str, outcome: &str, similarity: f64) -> PatternMatch {
    PatternMatch {
        pattern_id: 0,
        similarity,
        signature: sig("m", archetype, [0.25; 4], Trend::Stable),
        outcome: outcome.to_string(),
        source_metadata: None,
    }
}

#[test]
fn three_match_scenario() {
    let matches = vec![
        matched("a", "win", 0.9),
        matched("a", "win", 0.8),
        matched("b", "loss", 0.5),
    ];

    let best = most_likely_outcome(&matches).unwrap();
    assert_eq!(best.outcome, "win");

    let diversity = pattern_diversity(&matches);
    assert!(diversity > 0.0 && diversity < 1.0);

    assert!(match_confidence(&matches, DEFAULT_MIN_SAMPLE_SIZE) > 0.0);
}

#[test]
fn min_similarity_excludes_distant_pattern() {
    let target = sig("target", "a", [0.7, 0.1, 0.1, 0.1], Trend::Accelerating);
    let mut store = PatternStore::new();
    store.add(PersistedPattern::new(
        Domain::Chess,
        sig("p1", "a", [0.7, 0.1, 0.1, 0.1], Trend::Accelerating),
        "win",
    ));
    store.add(PersistedPattern::new(
        Domain::Chess,
        sig("p2", "a", [0.6, 0.2, 0.1, 0.1], Trend::Accelerating),
        "win",
    ));
    store.add(PersistedPattern::new(
        Domain::Chess,
        sig("p3", "b", [0.0, 0.1, 0.1, 0.8], Trend::Declining),
        "loss",
    ));

    let pool = store.fetch_pattern_pool(Domain::Chess, &PoolFilter::default());
    let all = find_similar_patterns(&target, &pool, &MatchOptions::default());
    assert_eq!(all.len(), 3);
    assert!(all[2].similarity < 0.6);

    let options = MatchOptions::default().with_min_similarity(0.6);
    let close = find_similar_patterns(&target, &pool, &options);
    assert_eq!(close.len(), 2);
    assert!(close.iter().all(|m| m.outcome == "win"));
}

#[test]
fn archetype_weight_separates_pairs() {
    let a = sig("x", "type_a", [0.4, 0.3, 0.2, 0.1], Trend::Stable);
    let same = sig("y", "type_a", [0.1, 0.2, 0.3, 0.4], Trend::Volatile);
    let other = sig("z", "type_b", [0.1, 0.2, 0.3, 0.4], Trend::Volatile);

    let separation = |w: &SimilarityWeights| {
        signature_similarity(&a, &same, Some(w))
            - signature_similarity(&a, &other, Some(w))
    };
    let heavy = SimilarityWeights {
        archetype: 0.8,
        quadrant: 0.1,
        temporal: 0.1,
    };
    let light = SimilarityWeights {
        archetype: 0.1,
        quadrant: 0.45,
        temporal: 0.45,
    };
    assert!(separation(&heavy) > separation(&light));
}

#[test]
fn empty_pool_analysis_is_tactical_only() {
    let target = sig("target", "kingside_attack", [0.7, 0.1, 0.1, 0.1], Trend::Accelerating);
    let tactical = TacticalInsight {
        best_action: "Rxh7".to_string(),
        evaluation: 2.1,
        depth: 18,
        confidence: 0.72,
        themes: vec!["sacrifice".to_string()],
        alternatives: Vec::new(),
    };
    let registry = ArchetypeRegistry::builtin(Domain::Chess);
    let analysis = analyze(
        &target,
        &[],
        &MatchOptions::default(),
        Some(&tactical),
        Some(&registry),
        12,
        &FusionConfig::default(),
    );

    assert!(analysis.matches.is_empty());
    assert_eq!(analysis.strategic.confidence, 0.0);
    assert_eq!(analysis.recommendation.action, "Rxh7");
    assert!(analysis.recommendation.strategic_reason.contains(NO_PATTERN_DATA));
    assert_eq!(analysis.trajectory.pattern_sample_size, 0);
    let t = &analysis.trajectory;
    let total = t.primary_win_probability + t.secondary_win_probability + t.draw_probability;
    assert!((total - 1.0).abs() < 1e-9);
}
