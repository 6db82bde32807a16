//! Pattern store lifecycle, file I/O, and session tracking.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use serde::Serialize;
use serde_json::Value;

use pensent_core::{
    analyze, derive_strategic_insight, find_similar_patterns, find_similar_patterns_with,
    fuse_recommendation, match_confidence, most_likely_outcome, outcome_probabilities,
    pattern_diversity, predict_trajectory, quadrant_similarity, temporal_flow_similarity,
    ArchetypeCatalog, ArchetypeRegistry, Domain, FusedRecommendation, FusionConfig,
    HybridAnalysis, MatchOptions, OutcomeEstimate, PatternMatch, PatternStore, PensReader,
    PensWriter, PersistedPattern, PoolFilter, RegistryRelatedness, SimilarityCache,
    SimilarityWeights, StrategicInsight, TacticalInsight, TemporalSignature,
};

use crate::types::{McpError, McpResult};

const DEFAULT_AUTO_SAVE_SECS: u64 = 30;

/// Manages the pattern store lifecycle, file I/O, and session state.
pub struct PatternSessionManager {
    store: PatternStore,
    catalog: ArchetypeCatalog,
    cache: SimilarityCache,
    file_path: PathBuf,
    current_session: u32,
    dirty: bool,
    last_save: Instant,
    auto_save_interval: Duration,
}

impl PatternSessionManager {
    /// Open or create a pattern file at the given path.
    pub fn open(path: &str) -> McpResult<Self> {
        let file_path = PathBuf::from(path);

        let store = if file_path.exists() {
            tracing::info!("Opening existing pattern file: {}", file_path.display());
            PensReader::read_from_file(&file_path)
                .map_err(|e| McpError::EngineError(format!("Failed to read pattern file: {e}")))?
        } else {
            tracing::info!("Creating new pattern file: {}", file_path.display());
            if let Some(parent) = file_path.parent() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    McpError::Io(std::io::Error::other(format!(
                        "Failed to create directory {}: {e}",
                        parent.display()
                    )))
                })?;
            }
            PatternStore::new()
        };

        let current_session = store.session_count + 1;

        tracing::info!(
            "Session {} started. Store has {} patterns.",
            current_session,
            store.count()
        );

        Ok(Self {
            store,
            catalog: ArchetypeCatalog::builtin(),
            cache: SimilarityCache::new(),
            file_path,
            current_session,
            dirty: false,
            last_save: Instant::now(),
            auto_save_interval: Duration::from_secs(DEFAULT_AUTO_SAVE_SECS),
        })
    }

    pub fn store(&self) -> &PatternStore {
        &self.store
    }

    pub fn catalog(&self) -> &ArchetypeCatalog {
        &self.catalog
    }

    pub fn registry(&self, domain: Domain) -> McpResult<&ArchetypeRegistry> {
        self.catalog.registry(domain).ok_or_else(|| {
            McpError::EngineError(format!("No archetype registry for domain {domain}"))
        })
    }

    pub fn current_session_id(&self) -> u32 {
        self.current_session
    }

    /// (hits, misses) of the pairwise similarity cache.
    pub fn cache_stats(&self) -> (u64, u64) {
        self.cache.stats()
    }

    pub fn start_session(&mut self, explicit_id: Option<u32>) -> McpResult<u32> {
        let session_id = explicit_id.unwrap_or(self.current_session + 1);
        if session_id == 0 {
            return Err(McpError::InvalidParams(
                "Session IDs start at 1".to_string(),
            ));
        }
        self.current_session = session_id;
        self.store.session_count = self.store.session_count.max(session_id);
        self.dirty = true;
        tracing::info!("Started session {session_id}");
        Ok(session_id)
    }

    /// End the current session. `expected`, when given, must name it.
    pub fn end_session(&mut self, expected: Option<u32>) -> McpResult<u32> {
        let session_id = self.current_session;
        if let Some(id) = expected {
            if id != session_id {
                return Err(McpError::SessionNotFound(id));
            }
        }
        if self.store.session_count < session_id {
            self.store.session_count = session_id;
            self.dirty = true;
        }
        self.save()?;
        tracing::info!("Ended session {session_id}");
        Ok(session_id)
    }

    /// Validate, normalize, and persist a resolved signature.
    pub fn record(
        &mut self,
        domain: Domain,
        signature: TemporalSignature,
        outcome: &str,
        metadata: Option<Value>,
        created_by: Option<String>,
    ) -> McpResult<RecordResult> {
        let outcome = outcome.trim();
        if outcome.is_empty() {
            return Err(McpError::InvalidParams(
                "'outcome' must not be empty".to_string(),
            ));
        }

        let mut signature = prepare(signature)?;
        if signature.fingerprint.trim().is_empty() {
            signature.fingerprint = uuid::Uuid::new_v4().to_string();
        }

        let known_archetype = self
            .catalog
            .registry(domain)
            .is_some_and(|r| r.get(&signature.archetype).is_some());
        if !known_archetype {
            tracing::warn!(
                domain = %domain,
                archetype = %signature.archetype,
                "Recording pattern with an archetype outside the registry"
            );
        }

        let fingerprint = signature.fingerprint.clone();
        let archetype = signature.archetype.clone();

        let mut pattern = PersistedPattern::new(domain, signature, outcome)
            .with_creator(created_by.unwrap_or_else(|| format!("session-{}", self.current_session)));
        if let Some(metadata) = metadata {
            pattern = pattern.with_metadata(metadata);
        }

        let pattern_id = self.store.add(pattern);
        self.dirty = true;
        self.maybe_auto_save()?;

        tracing::debug!(pattern_id, %domain, %archetype, "Recorded pattern");

        Ok(RecordResult {
            pattern_id,
            fingerprint,
            archetype,
            known_archetype,
        })
    }

    /// Rank the domain's pool against `target`.
    ///
    /// With `fuzzy` set, registry-related archetypes earn partial credit.
    pub fn find_matches(
        &self,
        domain: Domain,
        target: TemporalSignature,
        options: &MatchOptions,
        fuzzy: bool,
    ) -> McpResult<Vec<PatternMatch>> {
        let target = prepare(target)?;
        let pool = self.store.pool(domain, &PoolFilter::default());

        let matches = if fuzzy {
            let registry = self.registry(domain)?;
            find_similar_patterns_with(&target, &pool, options, &RegistryRelatedness::new(registry))
        } else {
            find_similar_patterns(&target, &pool, options)
        };
        Ok(matches)
    }

    /// Score two stored patterns and break the score into its parts.
    pub fn compare(
        &mut self,
        id_a: u64,
        id_b: u64,
        weights: Option<&SimilarityWeights>,
    ) -> McpResult<Comparison> {
        let a = self
            .store
            .get(id_a)
            .ok_or(McpError::PatternNotFound(id_a))?;
        let b = self
            .store
            .get(id_b)
            .ok_or(McpError::PatternNotFound(id_b))?;

        let related = a.domain == b.domain
            && self
                .catalog
                .registry(a.domain)
                .is_some_and(|r| r.related(&a.archetype, &b.archetype));

        let similarity = self.cache.similarity(a, b, weights);

        Ok(Comparison {
            pattern_a: id_a,
            pattern_b: id_b,
            similarity,
            quadrant: quadrant_similarity(
                &a.signature.quadrant_profile,
                &b.signature.quadrant_profile,
            ),
            temporal: temporal_flow_similarity(
                &a.signature.temporal_flow,
                &b.signature.temporal_flow,
            ),
            same_archetype: a.signature.archetype == b.signature.archetype,
            related_archetypes: related,
            same_outcome: a.outcome == b.outcome,
        })
    }

    /// Outcome distribution, strategic read, and fused recommendation.
    pub fn predict(
        &self,
        domain: Domain,
        target: TemporalSignature,
        options: &MatchOptions,
        tactical: Option<&TacticalInsight>,
        config: &FusionConfig,
        fuzzy: bool,
    ) -> McpResult<OutcomeReport> {
        let matches = self.find_matches(domain, target, options, fuzzy)?;
        let registry = self.catalog.registry(domain);

        let strategic = derive_strategic_insight(&matches, registry, config.min_sample_size);
        let recommendation = fuse_recommendation(tactical, &strategic, config);

        Ok(OutcomeReport {
            sample_size: matches.len(),
            probabilities: outcome_probabilities(&matches),
            most_likely: most_likely_outcome(&matches),
            diversity: pattern_diversity(&matches),
            confidence: match_confidence(&matches, config.min_sample_size),
            strategic,
            recommendation,
            matches,
        })
    }

    /// Full hybrid analysis, trajectory included.
    #[allow(clippy::too_many_arguments)]
    pub fn trajectory(
        &self,
        domain: Domain,
        target: TemporalSignature,
        options: &MatchOptions,
        tactical: Option<&TacticalInsight>,
        current_index: usize,
        config: &FusionConfig,
        fuzzy: bool,
    ) -> McpResult<HybridAnalysis> {
        let registry = self.catalog.registry(domain);

        if !fuzzy {
            let target = prepare(target)?;
            let pool = self.store.pool(domain, &PoolFilter::default());
            return Ok(analyze(
                &target,
                &pool,
                options,
                tactical,
                registry,
                current_index,
                config,
            ));
        }

        let matches = self.find_matches(domain, target, options, true)?;
        let strategic = derive_strategic_insight(&matches, registry, config.min_sample_size);
        let recommendation = fuse_recommendation(tactical, &strategic, config);
        let trajectory = predict_trajectory(tactical, &strategic, &matches, current_index, config);
        Ok(HybridAnalysis {
            matches,
            strategic,
            recommendation,
            trajectory,
        })
    }

    pub fn save(&mut self) -> McpResult<()> {
        if !self.dirty {
            return Ok(());
        }

        PensWriter::write_to_file(&self.store, &self.file_path)
            .map_err(|e| McpError::EngineError(format!("Failed to write pattern file: {e}")))?;

        self.dirty = false;
        self.last_save = Instant::now();
        tracing::debug!("Saved pattern file: {}", self.file_path.display());
        Ok(())
    }

    fn maybe_auto_save(&mut self) -> McpResult<()> {
        if self.dirty && self.last_save.elapsed() >= self.auto_save_interval {
            self.save()?;
        }
        Ok(())
    }

    pub fn file_path(&self) -> &PathBuf {
        &self.file_path
    }
}

impl Drop for PatternSessionManager {
    fn drop(&mut self) {
        if self.dirty {
            if let Err(e) = self.save() {
                tracing::error!("Failed to save on drop: {e}");
            }
        }
    }
}

fn prepare(signature: TemporalSignature) -> McpResult<TemporalSignature> {
    signature.validate()?;
    Ok(signature.normalized())
}

/// Result of recording a pattern.
#[derive(Debug, Clone, Serialize)]
pub struct RecordResult {
    pub pattern_id: u64,
    pub fingerprint: String,
    pub archetype: String,
    pub known_archetype: bool,
}

/// Pairwise comparison of two stored patterns.
#[derive(Debug, Clone, Serialize)]
pub struct Comparison {
    pub pattern_a: u64,
    pub pattern_b: u64,
    pub similarity: f64,
    pub quadrant: f64,
    pub temporal: f64,
    pub same_archetype: bool,
    pub related_archetypes: bool,
    pub same_outcome: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct OutcomeReport {
    pub sample_size: usize,
    pub probabilities: BTreeMap<String, f64>,
    pub most_likely: Option<OutcomeEstimate>,
    pub diversity: f64,
    pub confidence: f64,
    pub strategic: StrategicInsight,
    pub recommendation: FusedRecommendation,
    pub matches: Vec<PatternMatch>,
}
