//! Hybrid fusion of tactical (engine) and strategic (pattern) insight.
//!
//! The tactical side comes from an external calculation engine as a
//! [`TacticalInsight`]. The strategic side is derived here from a match set.
//! Either may be missing; fusion then degrades confidence instead of failing.

use serde::{Deserialize, Serialize};

use crate::archetype::{ArchetypeRegistry, PredictedOutcome};
use crate::matcher::{
    find_similar_patterns, match_confidence, most_likely_outcome, outcome_probabilities,
    MatchOptions, DEFAULT_MIN_SAMPLE_SIZE,
};
use crate::types::{PatternMatch, PersistedPattern, TemporalSignature};

/// Reason text used whenever no historical patterns back a decision.
pub const NO_PATTERN_DATA: &str = "no historical pattern data";

/// Logistic slope applied to engine evaluations.
const EVALUATION_SCALE: f64 = 0.7;

/// Peak draw probability when the evaluation is level.
const DRAW_BAND: f64 = 0.3;

/// Side probabilities closer than this count as level.
const SIDE_TIE_TOLERANCE: f64 = 1e-9;

/// Tunables for fusion and trajectory projection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FusionConfig {
    /// Share of the blend given to the tactical side, in [0,1].
    pub tactical_weight: f64,
    pub min_sample_size: usize,
    pub min_milestone_probability: f64,
    /// Furthest step ahead of the current index a milestone may be projected.
    pub max_lookahead: usize,
    /// Absolute evaluation at or beyond which a recommendation is critical.
    pub critical_evaluation: f64,
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            tactical_weight: 0.6,
            min_sample_size: DEFAULT_MIN_SAMPLE_SIZE,
            min_milestone_probability: 0.3,
            max_lookahead: 40,
            critical_evaluation: 3.0,
        }
    }
}

impl FusionConfig {
    fn weight(&self) -> f64 {
        if self.tactical_weight.is_finite() {
            self.tactical_weight.clamp(0.0, 1.0)
        } else {
            Self::default().tactical_weight
        }
    }
}

/// Output of the external calculation engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TacticalInsight {
    pub best_action: String,
    /// Signed score from the primary side's perspective, in pawn-like units.
    pub evaluation: f64,
    pub depth: u32,
    pub confidence: f64,
    #[serde(default)]
    pub themes: Vec<String>,
    #[serde(default)]
    pub alternatives: Vec<String>,
}

/// Pattern-derived view of where the sequence is heading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategicInsight {
    pub archetype: Option<String>,
    pub archetype_name: Option<String>,
    pub predicted_outcome: Option<String>,
    pub outcome_probability: f64,
    pub success_rate: Option<f64>,
    pub confidence: f64,
    pub guidance: String,
    pub sample_size: usize,
}

impl StrategicInsight {
    /// Insight for an empty match set.
    pub fn empty() -> Self {
        Self {
            archetype: None,
            archetype_name: None,
            predicted_outcome: None,
            outcome_probability: 0.0,
            success_rate: None,
            confidence: 0.0,
            guidance: NO_PATTERN_DATA.to_string(),
            sample_size: 0,
        }
    }

    pub fn has_pattern_data(&self) -> bool {
        self.sample_size > 0
    }

    fn plan_action(&self) -> Option<String> {
        self.archetype.as_ref().map(|a| format!("follow_{a}_plan"))
    }
}

/// Urgency tier of a fused recommendation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Critical,
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FusedRecommendation {
    pub action: String,
    pub tactical_reason: String,
    pub strategic_reason: String,
    pub confidence: f64,
    pub priority: Priority,
    pub alternatives: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryMilestone {
    pub predicted_index: usize,
    pub event: String,
    pub probability: f64,
    pub impact: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryPrediction {
    pub predicted_outcome: String,
    pub confidence: f64,
    pub primary_win_probability: f64,
    pub secondary_win_probability: f64,
    pub draw_probability: f64,
    pub milestones: Vec<TrajectoryMilestone>,
    pub strategic_guidance: String,
    pub lookahead_horizon: usize,
    pub pattern_sample_size: usize,
}

/// Everything [`analyze`] produces in one pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HybridAnalysis {
    pub matches: Vec<PatternMatch>,
    pub strategic: StrategicInsight,
    pub recommendation: FusedRecommendation,
    pub trajectory: TrajectoryPrediction,
}

/// Which side a free-form outcome tag favours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutcomeSide {
    Primary,
    Secondary,
    Draw,
    Unknown,
}

/// Map a recorded outcome tag onto a side.
pub fn classify_outcome(outcome: &str) -> OutcomeSide {
    match outcome.trim().to_ascii_lowercase().as_str() {
        "win" | "primary" | "primary_wins" | "white" | "white_wins" | "1-0" | "success"
        | "bullish" | "up" => OutcomeSide::Primary,
        "loss" | "secondary" | "secondary_wins" | "black" | "black_wins" | "0-1"
        | "failure" | "bearish" | "down" => OutcomeSide::Secondary,
        "draw" | "1/2-1/2" | "½-½" | "stalemate" | "stable" | "neutral" | "flat" => {
            OutcomeSide::Draw
        }
        _ => OutcomeSide::Unknown,
    }
}

/// Summarize a match set as strategic insight.
///
/// The dominant archetype is the one with the largest summed similarity.
pub fn derive_strategic_insight(
    matches: &[PatternMatch],
    registry: Option<&ArchetypeRegistry>,
    min_sample_size: usize,
) -> StrategicInsight {
    if matches.is_empty() {
        return StrategicInsight::empty();
    }

    let mut scores: Vec<(&str, f64)> = Vec::new();
    for m in matches {
        let w = m.similarity.max(0.0);
        match scores.iter_mut().find(|(a, _)| *a == m.signature.archetype) {
            Some((_, s)) => *s += w,
            None => scores.push((m.signature.archetype.as_str(), w)),
        }
    }
    let mut dominant = scores[0];
    for entry in &scores[1..] {
        if entry.1 > dominant.1 {
            dominant = *entry;
        }
    }
    let archetype = dominant.0.to_string();

    let definition = registry.and_then(|r| r.get(&archetype));
    let estimate = most_likely_outcome(matches);
    let confidence = match_confidence(matches, min_sample_size);

    let (outcome, probability) = estimate
        .map(|e| (Some(e.outcome), e.probability))
        .unwrap_or((None, 0.0));

    let mut guidance = match definition {
        Some(def) => format!(
            "{}: {} Historical success rate {:.0}%.",
            def.name,
            def.description,
            def.success_rate * 100.0
        ),
        None => format!("Dominant pattern '{archetype}' (not in the archetype registry)."),
    };
    if let Some(o) = &outcome {
        guidance.push_str(&format!(
            " {} matched pattern(s) favour '{o}' ({:.0}%).",
            matches.len(),
            probability * 100.0
        ));
    }

    StrategicInsight {
        archetype: Some(archetype),
        archetype_name: definition.map(|d| d.name.clone()),
        predicted_outcome: outcome,
        outcome_probability: probability,
        success_rate: definition.map(|d| d.success_rate),
        confidence,
        guidance,
        sample_size: matches.len(),
    }
}

/// Blend tactical and strategic insight into one recommendation.
pub fn fuse_recommendation(
    tactical: Option<&TacticalInsight>,
    strategic: &StrategicInsight,
    config: &FusionConfig,
) -> FusedRecommendation {
    let confidence = blended_confidence(tactical, strategic, config);

    let action = tactical
        .map(|t| t.best_action.clone())
        .filter(|a| !a.trim().is_empty())
        .or_else(|| strategic.plan_action())
        .unwrap_or_else(|| "hold".to_string());

    let tactical_reason = match tactical {
        Some(t) if t.themes.is_empty() => format!(
            "Engine prefers {} at depth {} (eval {:+.2}).",
            t.best_action, t.depth, t.evaluation
        ),
        Some(t) => format!(
            "Engine prefers {} at depth {} (eval {:+.2}; themes: {}).",
            t.best_action,
            t.depth,
            t.evaluation,
            t.themes.join(", ")
        ),
        None => "No tactical analysis available.".to_string(),
    };

    let strategic_reason = if strategic.has_pattern_data() {
        strategic.guidance.clone()
    } else if tactical.is_some() {
        format!("{NO_PATTERN_DATA}; recommendation is purely tactical.")
    } else {
        format!("{NO_PATTERN_DATA}.")
    };

    let mut alternatives: Vec<String> = Vec::new();
    let candidates = tactical
        .map(|t| t.alternatives.clone())
        .unwrap_or_default()
        .into_iter()
        .chain(strategic.plan_action());
    for alt in candidates {
        if alt != action && !alternatives.contains(&alt) {
            alternatives.push(alt);
        }
    }

    let priority = priority_for(tactical, confidence, config);

    tracing::debug!(%action, confidence, ?priority, "Fused recommendation");

    FusedRecommendation {
        action,
        tactical_reason,
        strategic_reason,
        confidence,
        priority,
        alternatives,
    }
}

/// Project outcome probabilities and upcoming milestones.
pub fn predict_trajectory(
    tactical: Option<&TacticalInsight>,
    strategic: &StrategicInsight,
    matches: &[PatternMatch],
    current_index: usize,
    config: &FusionConfig,
) -> TrajectoryPrediction {
    let w = config.weight();
    let strategic_side = side_probabilities(matches);
    let tactical_side = tactical.map(|t| evaluation_probabilities(t.evaluation));

    let blended = match (tactical_side, strategic_side) {
        (Some(t), Some(s)) => [
            w * t[0] + (1.0 - w) * s[0],
            w * t[1] + (1.0 - w) * s[1],
            w * t[2] + (1.0 - w) * s[2],
        ],
        (Some(t), None) => t,
        (None, Some(s)) => s,
        (None, None) => [1.0 / 3.0; 3],
    };
    let [primary, secondary, draw] = renormalize(blended);

    let predicted_outcome = if tactical_side.is_none() && strategic_side.is_none() {
        PredictedOutcome::Uncertain
    } else {
        leading_side([primary, secondary, draw])
    };

    let milestones = project_milestones(matches, current_index, config);
    let lookahead_horizon = milestones
        .iter()
        .map(|m| m.predicted_index.saturating_sub(current_index))
        .max()
        .unwrap_or(0);

    TrajectoryPrediction {
        predicted_outcome: predicted_outcome.as_str().to_string(),
        confidence: blended_confidence(tactical, strategic, config),
        primary_win_probability: primary,
        secondary_win_probability: secondary,
        draw_probability: draw,
        milestones,
        strategic_guidance: strategic.guidance.clone(),
        lookahead_horizon,
        pattern_sample_size: matches.len(),
    }
}

/// Match `target` against `pool`, then fuse the result with `tactical`.
#[allow(clippy::too_many_arguments)]
pub fn analyze(
    target: &TemporalSignature,
    pool: &[PersistedPattern],
    options: &MatchOptions,
    tactical: Option<&TacticalInsight>,
    registry: Option<&ArchetypeRegistry>,
    current_index: usize,
    config: &FusionConfig,
) -> HybridAnalysis {
    let matches = find_similar_patterns(target, pool, options);
    let strategic = derive_strategic_insight(&matches, registry, config.min_sample_size);
    let recommendation = fuse_recommendation(tactical, &strategic, config);
    let trajectory = predict_trajectory(tactical, &strategic, &matches, current_index, config);

    HybridAnalysis {
        matches,
        strategic,
        recommendation,
        trajectory,
    }
}

fn blended_confidence(
    tactical: Option<&TacticalInsight>,
    strategic: &StrategicInsight,
    config: &FusionConfig,
) -> f64 {
    let w = config.weight();
    let s = strategic.confidence.clamp(0.0, 1.0);
    let value = match (tactical, strategic.has_pattern_data()) {
        (Some(t), true) => w * unit(t.confidence) + (1.0 - w) * s,
        (Some(t), false) => unit(t.confidence),
        (None, true) => (1.0 - w) * s,
        (None, false) => 0.0,
    };
    value.clamp(0.0, 1.0)
}

fn priority_for(
    tactical: Option<&TacticalInsight>,
    confidence: f64,
    config: &FusionConfig,
) -> Priority {
    let forcing = tactical.is_some_and(|t| {
        t.evaluation.abs() >= config.critical_evaluation
            || t.themes.iter().any(|th| {
                th.to_ascii_lowercase()
                    .split(|c: char| !c.is_ascii_alphanumeric())
                    .any(|word| matches!(word, "mate" | "checkmate" | "mating"))
            })
    });

    if forcing {
        Priority::Critical
    } else if confidence >= 0.7 {
        Priority::High
    } else if confidence >= 0.4 {
        Priority::Medium
    } else {
        Priority::Low
    }
}

/// [primary, secondary, draw] from matched outcomes; `None` without matches.
fn side_probabilities(matches: &[PatternMatch]) -> Option<[f64; 3]> {
    if matches.is_empty() {
        return None;
    }
    let mut sides = [0.0; 3];
    for (outcome, p) in outcome_probabilities(matches) {
        match classify_outcome(&outcome) {
            OutcomeSide::Primary => sides[0] += p,
            OutcomeSide::Secondary => sides[1] += p,
            OutcomeSide::Draw => sides[2] += p,
            OutcomeSide::Unknown => {
                for s in sides.iter_mut() {
                    *s += p / 3.0;
                }
            }
        }
    }
    Some(renormalize(sides))
}

/// [primary, secondary, draw] from an engine evaluation.
fn evaluation_probabilities(evaluation: f64) -> [f64; 3] {
    let evaluation = if evaluation.is_finite() {
        evaluation
    } else {
        0.0
    };
    let expected = 1.0 / (1.0 + (-EVALUATION_SCALE * evaluation).exp());
    let draw = DRAW_BAND * (1.0 - (2.0 * expected - 1.0).abs());
    [expected - draw / 2.0, 1.0 - expected - draw / 2.0, draw]
}

/// The side with the highest probability, or uncertain when the top two tie.
fn leading_side(p: [f64; 3]) -> PredictedOutcome {
    const SIDES: [PredictedOutcome; 3] = [
        PredictedOutcome::PrimaryWins,
        PredictedOutcome::SecondaryWins,
        PredictedOutcome::Draw,
    ];
    let mut order = [0usize, 1, 2];
    order.sort_by(|&a, &b| p[b].partial_cmp(&p[a]).unwrap_or(std::cmp::Ordering::Equal));
    if p[order[0]] - p[order[1]] <= SIDE_TIE_TOLERANCE {
        PredictedOutcome::Uncertain
    } else {
        SIDES[order[0]]
    }
}

fn renormalize(p: [f64; 3]) -> [f64; 3] {
    let p = p.map(|x| if x.is_finite() { x.max(0.0) } else { 0.0 });
    let total: f64 = p.iter().sum();
    if total <= 0.0 {
        return [1.0 / 3.0; 3];
    }
    p.map(|x| x / total)
}

struct MilestoneAccumulator {
    event: String,
    weight: f64,
    weighted_index: f64,
    severity_sum: f64,
    occurrences: usize,
}

fn project_milestones(
    matches: &[PatternMatch],
    current_index: usize,
    config: &FusionConfig,
) -> Vec<TrajectoryMilestone> {
    if matches.is_empty() {
        return Vec::new();
    }

    let total_similarity: f64 = matches.iter().map(|m| m.similarity.max(0.0)).sum();
    let uniform = total_similarity <= 0.0;
    let total_weight = if uniform {
        matches.len() as f64
    } else {
        total_similarity
    };

    let mut groups: Vec<MilestoneAccumulator> = Vec::new();
    for m in matches {
        let w = if uniform { 1.0 } else { m.similarity.max(0.0) };
        let mut seen: Vec<&str> = Vec::new();
        for moment in &m.signature.critical_moments {
            if moment.index <= current_index || seen.contains(&moment.moment_type.as_str()) {
                continue;
            }
            seen.push(moment.moment_type.as_str());

            let group = match groups.iter_mut().position(|g| g.event == moment.moment_type) {
                Some(i) => &mut groups[i],
                None => {
                    groups.push(MilestoneAccumulator {
                        event: moment.moment_type.clone(),
                        weight: 0.0,
                        weighted_index: 0.0,
                        severity_sum: 0.0,
                        occurrences: 0,
                    });
                    let last = groups.len() - 1;
                    &mut groups[last]
                }
            };
            group.weight += w;
            group.weighted_index += w * moment.index as f64;
            group.severity_sum += unit(moment.severity);
            group.occurrences += 1;
        }
    }

    let mut milestones: Vec<TrajectoryMilestone> = groups
        .into_iter()
        .filter(|g| g.weight > 0.0)
        .filter_map(|g| {
            let predicted_index = (g.weighted_index / g.weight).round() as usize;
            let probability = (g.weight / total_weight).clamp(0.0, 1.0);
            let impact = g.severity_sum / g.occurrences as f64;
            if probability < config.min_milestone_probability
                || predicted_index.saturating_sub(current_index) > config.max_lookahead
            {
                return None;
            }
            let recommendation = (impact >= 0.7).then(|| {
                format!("Prepare for {} around step {predicted_index}.", g.event)
            });
            Some(TrajectoryMilestone {
                predicted_index,
                event: g.event,
                probability,
                impact,
                recommendation,
            })
        })
        .collect();

    milestones.sort_by(|a, b| {
        a.predicted_index.cmp(&b.predicted_index).then(
            b.probability
                .partial_cmp(&a.probability)
                .unwrap_or(std::cmp::Ordering::Equal),
        )
    });
    milestones
}

fn unit(x: f64) -> f64 {
    if x.is_finite() {
        x.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{moment, signature};
    use crate::types::Domain;

    fn tactical(evaluation: f64, confidence: f64) -> TacticalInsight {
        TacticalInsight {
            best_action: "Nf5".to_string(),
            evaluation,
            depth: 22,
            confidence,
            themes: vec!["outpost".to_string()],
            alternatives: vec!["Qd2".to_string(), "Nf5".to_string()],
        }
    }

    fn hit(archetype: &str, outcome: &str, similarity: f64) -> PatternMatch {
        PatternMatch {
            pattern_id: 0,
            similarity,
            signature: signature("fp", archetype),
            outcome: outcome.to_string(),
            source_metadata: None,
        }
    }

    #[test]
    fn test_classify_outcome() {
        assert_eq!(classify_outcome("1-0"), OutcomeSide::Primary);
        assert_eq!(classify_outcome("Loss"), OutcomeSide::Secondary);
        assert_eq!(classify_outcome("1/2-1/2"), OutcomeSide::Draw);
        assert_eq!(classify_outcome("abandoned"), OutcomeSide::Unknown);
    }

    #[test]
    fn test_strategic_from_matches() {
        let registry = ArchetypeRegistry::builtin(Domain::Chess);
        let matches = vec![
            hit("kingside_attack", "win", 0.9),
            hit("kingside_attack", "win", 0.8),
            hit("fortress_defense", "draw", 0.5),
        ];
        let s = derive_strategic_insight(&matches, Some(&registry), DEFAULT_MIN_SAMPLE_SIZE);
        assert_eq!(s.archetype.as_deref(), Some("kingside_attack"));
        assert_eq!(s.archetype_name.as_deref(), Some("Kingside Attack"));
        assert_eq!(s.predicted_outcome.as_deref(), Some("win"));
        assert_eq!(s.sample_size, 3);
        assert!(s.confidence > 0.0);
        assert!(s.guidance.contains("Kingside Attack"));
    }

    #[test]
    fn test_strategic_unknown_archetype() {
        let s = derive_strategic_insight(&[hit("mystery", "win", 0.7)], None, 1);
        assert_eq!(s.archetype.as_deref(), Some("mystery"));
        assert!(s.archetype_name.is_none());
        assert!(s.guidance.contains("mystery"));
    }

    #[test]
    fn test_empty_pool_falls_back_to_tactical() {
        let t = tactical(0.8, 0.65);
        let s = derive_strategic_insight(&[], None, DEFAULT_MIN_SAMPLE_SIZE);
        assert_eq!(s.confidence, 0.0);

        let rec = fuse_recommendation(Some(&t), &s, &FusionConfig::default());
        assert_eq!(rec.action, "Nf5");
        assert!(rec.strategic_reason.contains(NO_PATTERN_DATA));
        assert_eq!(rec.confidence, 0.65);
        assert_eq!(rec.alternatives, vec!["Qd2".to_string()]);
    }

    #[test]
    fn test_no_inputs_at_all() {
        let s = StrategicInsight::empty();
        let rec = fuse_recommendation(None, &s, &FusionConfig::default());
        assert_eq!(rec.action, "hold");
        assert_eq!(rec.confidence, 0.0);
        assert_eq!(rec.priority, Priority::Low);

        let traj = predict_trajectory(None, &s, &[], 10, &FusionConfig::default());
        assert_eq!(traj.predicted_outcome, "uncertain");
        assert_eq!(traj.pattern_sample_size, 0);
        assert_eq!(traj.lookahead_horizon, 0);
        let total =
            traj.primary_win_probability + traj.secondary_win_probability + traj.draw_probability;
        assert!((total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_confidence_monotone_in_inputs() {
        let matches = vec![hit("a", "win", 0.9), hit("a", "win", 0.85)];
        let s = derive_strategic_insight(&matches, None, 2);
        let config = FusionConfig::default();
        let low = fuse_recommendation(Some(&tactical(0.2, 0.3)), &s, &config);
        let high = fuse_recommendation(Some(&tactical(0.2, 0.9)), &s, &config);
        assert!(high.confidence > low.confidence);
    }

    #[test]
    fn test_strategic_only_action() {
        let matches = vec![hit("bull_trend", "bullish", 0.9)];
        let s = derive_strategic_insight(&matches, None, 1);
        let rec = fuse_recommendation(None, &s, &FusionConfig::default());
        assert_eq!(rec.action, "follow_bull_trend_plan");
        assert!(rec.tactical_reason.contains("No tactical"));
    }

    #[test]
    fn test_mate_theme_is_critical() {
        let mut t = tactical(0.5, 0.2);
        t.themes.push("Mate in 3".to_string());
        let rec = fuse_recommendation(Some(&t), &StrategicInsight::empty(), &FusionConfig::default());
        assert_eq!(rec.priority, Priority::Critical);
    }

    #[test]
    fn test_trajectory_probabilities_sum_to_one() {
        let matches = vec![
            hit("a", "win", 0.9),
            hit("a", "loss", 0.4),
            hit("b", "draw", 0.3),
            hit("c", "abandoned", 0.2),
        ];
        let s = derive_strategic_insight(&matches, None, 3);
        for eval in [-6.0, -0.5, 0.0, 1.2, 9.0] {
            let traj =
                predict_trajectory(Some(&tactical(eval, 0.7)), &s, &matches, 0, &FusionConfig::default());
            let total = traj.primary_win_probability
                + traj.secondary_win_probability
                + traj.draw_probability;
            assert!((total - 1.0).abs() < 1e-9, "eval {eval} sums to {total}");
            assert_eq!(traj.pattern_sample_size, 4);
        }
    }

    #[test]
    fn test_unclassifiable_outcomes_are_uncertain() {
        let matches = vec![hit("a", "abandoned", 0.8)];
        let s = derive_strategic_insight(&matches, None, 1);
        let traj = predict_trajectory(None, &s, &matches, 0, &FusionConfig::default());
        assert_eq!(traj.predicted_outcome, "uncertain");
        assert!((traj.primary_win_probability - 1.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_primary_secondary_tie_is_uncertain() {
        let matches = vec![hit("a", "win", 0.7), hit("b", "loss", 0.7)];
        let s = derive_strategic_insight(&matches, None, 2);
        let traj = predict_trajectory(None, &s, &matches, 0, &FusionConfig::default());
        assert_eq!(traj.predicted_outcome, "uncertain");

        let leaning = vec![hit("a", "win", 0.7), hit("b", "loss", 0.6)];
        let s = derive_strategic_insight(&leaning, None, 2);
        let traj = predict_trajectory(None, &s, &leaning, 0, &FusionConfig::default());
        assert_eq!(traj.predicted_outcome, "primary_wins");
    }

    #[test]
    fn test_evaluation_favours_primary() {
        let s = StrategicInsight::empty();
        let traj = predict_trajectory(Some(&tactical(4.0, 0.8)), &s, &[], 0, &FusionConfig::default());
        assert_eq!(traj.predicted_outcome, "primary_wins");
        assert!(traj.primary_win_probability > traj.secondary_win_probability);
    }

    #[test]
    fn test_milestones_projected_from_matches() {
        let mut a = hit("a", "win", 0.8);
        a.signature.critical_moments = vec![
            moment(5, "opening_break", 0.4),
            moment(24, "sacrifice", 0.9),
            moment(40, "endgame", 0.5),
        ];
        let mut b = hit("a", "win", 0.8);
        b.signature.critical_moments = vec![moment(26, "sacrifice", 0.8)];
        let matches = vec![a, b];
        let s = derive_strategic_insight(&matches, None, 2);
        let traj = predict_trajectory(None, &s, &matches, 10, &FusionConfig::default());

        assert_eq!(traj.milestones.len(), 2);
        let sac = &traj.milestones[0];
        assert_eq!(sac.event, "sacrifice");
        assert_eq!(sac.predicted_index, 25);
        assert!((sac.probability - 1.0).abs() < 1e-9);
        assert!(sac.recommendation.is_some());

        let endgame = &traj.milestones[1];
        assert_eq!(endgame.event, "endgame");
        assert!((endgame.probability - 0.5).abs() < 1e-9);
        assert!(endgame.recommendation.is_none());
        assert_eq!(traj.lookahead_horizon, 30);
    }

    #[test]
    fn test_milestones_beyond_lookahead_dropped() {
        let mut a = hit("a", "win", 0.8);
        a.signature.critical_moments = vec![moment(500, "collapse", 0.9)];
        let traj = predict_trajectory(
            None,
            &StrategicInsight::empty(),
            &[a],
            0,
            &FusionConfig::default(),
        );
        assert!(traj.milestones.is_empty());
        assert_eq!(traj.lookahead_horizon, 0);
    }

    #[test]
    fn test_analyze_end_to_end() {
        let pool = vec![
            crate::testutil::pattern(1, signature("p1", "kingside_attack"), "win"),
            crate::testutil::pattern(2, signature("p2", "kingside_attack"), "win"),
        ];
        let registry = ArchetypeRegistry::builtin(Domain::Chess);
        let analysis = analyze(
            &signature("t", "kingside_attack"),
            &pool,
            &MatchOptions::default(),
            Some(&tactical(1.5, 0.8)),
            Some(&registry),
            0,
            &FusionConfig::default(),
        );
        assert_eq!(analysis.matches.len(), 2);
        assert_eq!(analysis.recommendation.action, "Nf5");
        assert_eq!(analysis.trajectory.predicted_outcome, "primary_wins");
        assert_eq!(analysis.trajectory.pattern_sample_size, 2);
    }
}
