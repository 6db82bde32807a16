//! Per-domain archetype catalogs and archetype relatedness strategies.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::types::{Domain, PensentError, PensentResult};

/// Score given to archetypes listed in each other's `related_archetypes`.
pub const RELATED_ARCHETYPE_SCORE: f64 = 0.5;

/// Outcome an archetype historically leads to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PredictedOutcome {
    PrimaryWins,
    SecondaryWins,
    Draw,
    Uncertain,
}

impl PredictedOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            PredictedOutcome::PrimaryWins => "primary_wins",
            PredictedOutcome::SecondaryWins => "secondary_wins",
            PredictedOutcome::Draw => "draw",
            PredictedOutcome::Uncertain => "uncertain",
        }
    }
}

/// A named pattern class with its historical base rate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchetypeDefinition {
    pub id: String,
    pub name: String,
    pub description: String,
    pub success_rate: f64,
    pub predicted_outcome: PredictedOutcome,
    pub confidence: f64,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub related_archetypes: Vec<String>,
}

/// Read-only archetype catalog for one domain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchetypeRegistry {
    pub domain: Domain,
    pub version: u32,
    archetypes: Vec<ArchetypeDefinition>,
}

impl ArchetypeRegistry {
    /// Build a registry, rejecting duplicate ids.
    pub fn new(
        domain: Domain,
        version: u32,
        archetypes: Vec<ArchetypeDefinition>,
    ) -> PensentResult<Self> {
        for (i, a) in archetypes.iter().enumerate() {
            if archetypes[..i].iter().any(|b| b.id == a.id) {
                return Err(PensentError::InvalidInput(format!(
                    "duplicate archetype id '{}' in {domain} registry",
                    a.id
                )));
            }
        }
        Ok(Self {
            domain,
            version,
            archetypes,
        })
    }

    /// The built-in catalog for a domain.
    pub fn builtin(domain: Domain) -> Self {
        let archetypes = match domain {
            Domain::Chess => chess_archetypes(),
            Domain::Code => code_archetypes(),
            Domain::Market => market_archetypes(),
        };
        Self {
            domain,
            version: 1,
            archetypes,
        }
    }

    pub fn get(&self, id: &str) -> Option<&ArchetypeDefinition> {
        self.archetypes.iter().find(|a| a.id == id)
    }

    pub fn require(&self, id: &str) -> PensentResult<&ArchetypeDefinition> {
        self.get(id).ok_or_else(|| PensentError::UnknownArchetype {
            domain: self.domain,
            archetype: id.to_string(),
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = &ArchetypeDefinition> {
        self.archetypes.iter()
    }

    pub fn len(&self) -> usize {
        self.archetypes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.archetypes.is_empty()
    }

    /// Whether either archetype lists the other as related.
    pub fn related(&self, a: &str, b: &str) -> bool {
        let lists = |from: &str, to: &str| {
            self.get(from)
                .is_some_and(|d| d.related_archetypes.iter().any(|r| r == to))
        };
        lists(a, b) || lists(b, a)
    }

    /// Fuzzy classification by keyword overlap.
    ///
    /// The archetype matching the most tags wins; ties go to registry order.
    pub fn classify<S: AsRef<str>>(&self, tags: &[S]) -> Option<&ArchetypeDefinition> {
        let tags: Vec<String> = tags
            .iter()
            .map(|t| t.as_ref().trim().to_ascii_lowercase())
            .filter(|t| !t.is_empty())
            .collect();

        let mut best: Option<(&ArchetypeDefinition, usize)> = None;
        for archetype in &self.archetypes {
            let hits = archetype
                .keywords
                .iter()
                .filter(|k| tags.iter().any(|t| t == &k.to_ascii_lowercase()))
                .count();
            if hits > best.map_or(0, |(_, h)| h) {
                best = Some((archetype, hits));
            }
        }
        best.map(|(a, _)| a)
    }
}

/// Registries for every known domain.
#[derive(Debug, Clone)]
pub struct ArchetypeCatalog {
    registries: BTreeMap<Domain, ArchetypeRegistry>,
}

impl ArchetypeCatalog {
    pub fn builtin() -> Self {
        let registries = Domain::ALL
            .iter()
            .map(|d| (*d, ArchetypeRegistry::builtin(*d)))
            .collect();
        Self { registries }
    }

    pub fn registry(&self, domain: Domain) -> Option<&ArchetypeRegistry> {
        self.registries.get(&domain)
    }

    /// Replace a domain's registry, e.g. with a newer version.
    pub fn install(&mut self, registry: ArchetypeRegistry) {
        tracing::info!(
            domain = %registry.domain,
            version = registry.version,
            archetypes = registry.len(),
            "Installing archetype registry"
        );
        self.registries.insert(registry.domain, registry);
    }
}

impl Default for ArchetypeCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Strategy for scoring how related two archetype ids are, in [0,1].
pub trait ArchetypeRelatedness {
    fn relatedness(&self, a: &str, b: &str) -> f64;
}

/// Exact id equality only.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExactArchetypeMatch;

impl ArchetypeRelatedness for ExactArchetypeMatch {
    fn relatedness(&self, a: &str, b: &str) -> f64 {
        if a == b {
            1.0
        } else {
            0.0
        }
    }
}

/// Equality plus partial credit for registry-declared relations.
#[derive(Debug, Clone, Copy)]
pub struct RegistryRelatedness<'a> {
    registry: &'a ArchetypeRegistry,
}

impl<'a> RegistryRelatedness<'a> {
    pub fn new(registry: &'a ArchetypeRegistry) -> Self {
        Self { registry }
    }
}

impl ArchetypeRelatedness for RegistryRelatedness<'_> {
    fn relatedness(&self, a: &str, b: &str) -> f64 {
        if a == b {
            1.0
        } else if self.registry.related(a, b) {
            RELATED_ARCHETYPE_SCORE
        } else {
            0.0
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn def(
    id: &str,
    name: &str,
    description: &str,
    success_rate: f64,
    predicted_outcome: PredictedOutcome,
    confidence: f64,
    keywords: &[&str],
    related: &[&str],
) -> ArchetypeDefinition {
    ArchetypeDefinition {
        id: id.to_string(),
        name: name.to_string(),
        description: description.to_string(),
        success_rate,
        predicted_outcome,
        confidence,
        keywords: keywords.iter().map(|s| s.to_string()).collect(),
        related_archetypes: related.iter().map(|s| s.to_string()).collect(),
    }
}

fn chess_archetypes() -> Vec<ArchetypeDefinition> {
    use PredictedOutcome::*;
    vec![
        def(
            "kingside_attack",
            "Kingside Attack",
            "Pieces and pawns converge on the enemy king's flank.",
            0.62,
            PrimaryWins,
            0.70,
            &["attack", "kingside", "sacrifice", "pawn_storm", "mate"],
            &["opposite_castling_race", "tactical_melee"],
        ),
        def(
            "queenside_expansion",
            "Queenside Expansion",
            "Space gained on the queenside through a pawn majority.",
            0.56,
            PrimaryWins,
            0.60,
            &["queenside", "majority", "space", "minority_attack"],
            &["positional_squeeze"],
        ),
        def(
            "central_domination",
            "Central Domination",
            "Control of the center restricts the opponent's pieces.",
            0.58,
            PrimaryWins,
            0.65,
            &["center", "outpost", "control", "space"],
            &["positional_squeeze", "queenside_expansion"],
        ),
        def(
            "positional_squeeze",
            "Positional Squeeze",
            "Slow accumulation of small advantages with little counterplay.",
            0.60,
            PrimaryWins,
            0.62,
            &["squeeze", "prophylaxis", "restriction", "weakness"],
            &["central_domination", "endgame_grind"],
        ),
        def(
            "tactical_melee",
            "Tactical Melee",
            "Sharp, forcing play with mutual threats.",
            0.48,
            Uncertain,
            0.45,
            &["tactics", "fork", "pin", "sacrifice", "complications"],
            &["kingside_attack", "opposite_castling_race"],
        ),
        def(
            "opposite_castling_race",
            "Opposite-Side Castling Race",
            "Both sides storm the opposite flank; tempo decides.",
            0.50,
            Uncertain,
            0.50,
            &["opposite_castling", "pawn_storm", "race", "attack"],
            &["kingside_attack", "tactical_melee"],
        ),
        def(
            "endgame_grind",
            "Endgame Grind",
            "A long technical conversion of a slight endgame edge.",
            0.54,
            PrimaryWins,
            0.55,
            &["endgame", "technique", "conversion", "king_activity"],
            &["positional_squeeze", "fortress_defense"],
        ),
        def(
            "fortress_defense",
            "Fortress Defense",
            "The defending side builds an impregnable setup.",
            0.40,
            Draw,
            0.58,
            &["fortress", "defense", "blockade", "draw"],
            &["endgame_grind"],
        ),
    ]
}

fn code_archetypes() -> Vec<ArchetypeDefinition> {
    use PredictedOutcome::*;
    vec![
        def(
            "feature_sprint",
            "Feature Sprint",
            "Bursts of feature commits with rising contributor activity.",
            0.64,
            PrimaryWins,
            0.62,
            &["feature", "sprint", "growth", "release"],
            &["rapid_growth"],
        ),
        def(
            "rapid_growth",
            "Rapid Growth",
            "Sustained acceleration in commit volume and scope.",
            0.61,
            PrimaryWins,
            0.58,
            &["growth", "acceleration", "adoption", "contributors"],
            &["feature_sprint", "tech_debt_spiral"],
        ),
        def(
            "stable_maintenance",
            "Stable Maintenance",
            "Steady, low-variance upkeep of a mature codebase.",
            0.70,
            Draw,
            0.66,
            &["maintenance", "stable", "bugfix", "mature"],
            &["refactor_cycle"],
        ),
        def(
            "refactor_cycle",
            "Refactor Cycle",
            "Periods of restructuring followed by renewed feature work.",
            0.57,
            PrimaryWins,
            0.52,
            &["refactor", "cleanup", "restructure", "migration"],
            &["stable_maintenance", "tech_debt_spiral"],
        ),
        def(
            "tech_debt_spiral",
            "Tech-Debt Spiral",
            "Hotfixes pile up while velocity falls.",
            0.33,
            SecondaryWins,
            0.60,
            &["hotfix", "debt", "regression", "churn"],
            &["project_decline", "rapid_growth"],
        ),
        def(
            "project_decline",
            "Project Decline",
            "Contributor attrition and a declining commit cadence.",
            0.25,
            SecondaryWins,
            0.68,
            &["decline", "abandoned", "attrition", "stale"],
            &["tech_debt_spiral"],
        ),
    ]
}

fn market_archetypes() -> Vec<ArchetypeDefinition> {
    use PredictedOutcome::*;
    vec![
        def(
            "bull_trend",
            "Bull Trend",
            "Higher highs and higher lows on expanding volume.",
            0.60,
            PrimaryWins,
            0.60,
            &["bullish", "uptrend", "momentum", "higher_highs"],
            &["breakout"],
        ),
        def(
            "bear_trend",
            "Bear Trend",
            "Lower highs and lower lows with persistent selling.",
            0.58,
            SecondaryWins,
            0.60,
            &["bearish", "downtrend", "selling", "lower_lows"],
            &["capitulation"],
        ),
        def(
            "consolidation",
            "Consolidation",
            "Range-bound trading with contracting volatility.",
            0.50,
            Draw,
            0.55,
            &["range", "sideways", "consolidation", "low_volatility"],
            &["breakout", "mean_reversion"],
        ),
        def(
            "breakout",
            "Breakout",
            "Price escapes a range on a volume surge.",
            0.55,
            PrimaryWins,
            0.50,
            &["breakout", "volume", "resistance", "expansion"],
            &["bull_trend", "consolidation"],
        ),
        def(
            "capitulation",
            "Capitulation",
            "Panic selling into a volatility spike.",
            0.45,
            SecondaryWins,
            0.48,
            &["panic", "capitulation", "volatility", "liquidation"],
            &["bear_trend", "mean_reversion"],
        ),
        def(
            "mean_reversion",
            "Mean Reversion",
            "Overextended moves snap back toward the average.",
            0.53,
            Uncertain,
            0.47,
            &["reversion", "overextended", "oscillation", "fade"],
            &["consolidation", "capitulation"],
        ),
    ]
}
