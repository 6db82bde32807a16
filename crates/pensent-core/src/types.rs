//! Core data types for temporal signatures, pattern matches, and persisted patterns.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Domains with a registered archetype catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    Chess,
    Code,
    Market,
}

impl Domain {
    pub const ALL: [Domain; 3] = [Domain::Chess, Domain::Code, Domain::Market];

    pub fn as_str(&self) -> &'static str {
        match self {
            Domain::Chess => "chess",
            Domain::Code => "code",
            Domain::Market => "market",
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Domain {
    type Err = PensentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "chess" => Ok(Domain::Chess),
            "code" => Ok(Domain::Code),
            "market" | "finance" => Ok(Domain::Market),
            other => Err(PensentError::UnknownDomain(other.to_string())),
        }
    }
}

/// Spatial distribution of activity across four regions, plus optional extras.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuadrantProfile {
    pub q1: f64,
    pub q2: f64,
    pub q3: f64,
    pub q4: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub center: Option<f64>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub custom: BTreeMap<String, f64>,
}

impl QuadrantProfile {
    pub fn new(q1: f64, q2: f64, q3: f64, q4: f64) -> Self {
        Self {
            q1,
            q2,
            q3,
            q4,
            center: None,
            custom: BTreeMap::new(),
        }
    }

    pub fn with_center(mut self, center: f64) -> Self {
        self.center = Some(center);
        self
    }

    fn values(&self) -> impl Iterator<Item = f64> + '_ {
        [self.q1, self.q2, self.q3, self.q4]
            .into_iter()
            .chain(self.center)
            .chain(self.custom.values().copied())
    }

    /// Rescale to the canonical [0,1] range.
    ///
    /// Producers that report percentages (any axis above 1) are divided by 100.
    pub fn normalized(&self) -> Self {
        let scale = if self.values().any(|v| v > 1.0) {
            100.0
        } else {
            1.0
        };
        let fix = |v: f64| (v / scale).clamp(0.0, 1.0);
        Self {
            q1: fix(self.q1),
            q2: fix(self.q2),
            q3: fix(self.q3),
            q4: fix(self.q4),
            center: self.center.map(fix),
            custom: self.custom.iter().map(|(k, v)| (k.clone(), fix(*v))).collect(),
        }
    }
}

/// Shape of the activity curve over a sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Accelerating,
    Stable,
    Declining,
    Volatile,
}

/// Phase activity, trend, and momentum of a sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemporalFlow {
    pub opening: f64,
    pub middle: f64,
    pub ending: f64,
    pub trend: Trend,
    pub momentum: f64,
}

impl TemporalFlow {
    /// Phases on a percentage scale (any above 1) are divided by 100, as is a
    /// momentum outside [-1,1].
    pub fn normalized(&self) -> Self {
        let phase_scale = if [self.opening, self.middle, self.ending]
            .iter()
            .any(|&v| v > 1.0)
        {
            100.0
        } else {
            1.0
        };
        let phase = |v: f64| (v / phase_scale).clamp(0.0, 1.0);
        let momentum = if self.momentum.abs() > 1.0 {
            self.momentum / 100.0
        } else {
            self.momentum
        };
        Self {
            opening: phase(self.opening),
            middle: phase(self.middle),
            ending: phase(self.ending),
            trend: self.trend,
            momentum: momentum.clamp(-1.0, 1.0),
        }
    }
}

impl Default for TemporalFlow {
    fn default() -> Self {
        Self {
            opening: 0.0,
            middle: 0.0,
            ending: 0.0,
            trend: Trend::Stable,
            momentum: 0.0,
        }
    }
}

/// A turning point within the analyzed sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriticalMoment {
    pub index: usize,
    #[serde(rename = "type")]
    pub moment_type: String,
    pub severity: f64,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

/// Which side dominated the sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DominantForce {
    Primary,
    Secondary,
    Balanced,
}

/// Overall direction of play or change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowDirection {
    Forward,
    Lateral,
    Backward,
    Chaotic,
}

/// Universal fingerprint of one analyzed sequence.
///
/// Produced once by a domain adapter. Any adjustment yields a new value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemporalSignature {
    pub fingerprint: String,
    pub archetype: String,
    pub dominant_force: DominantForce,
    pub flow_direction: FlowDirection,
    pub intensity: f64,
    pub quadrant_profile: QuadrantProfile,
    pub temporal_flow: TemporalFlow,
    #[serde(default)]
    pub critical_moments: Vec<CriticalMoment>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub domain_data: Map<String, Value>,
}

impl TemporalSignature {
    /// Reject scalars no adapter should ever produce.
    pub fn validate(&self) -> PensentResult<()> {
        if self.archetype.trim().is_empty() {
            return Err(PensentError::InvalidInput(
                "signature archetype must not be empty".to_string(),
            ));
        }

        let q = &self.quadrant_profile;
        let named = [
            ("intensity", self.intensity),
            ("quadrant_profile.q1", q.q1),
            ("quadrant_profile.q2", q.q2),
            ("quadrant_profile.q3", q.q3),
            ("quadrant_profile.q4", q.q4),
            ("quadrant_profile.center", q.center.unwrap_or(0.0)),
            ("temporal_flow.opening", self.temporal_flow.opening),
            ("temporal_flow.middle", self.temporal_flow.middle),
            ("temporal_flow.ending", self.temporal_flow.ending),
        ];
        for (name, value) in named {
            if !value.is_finite() || value < 0.0 {
                return Err(PensentError::InvalidInput(format!(
                    "{name} must be a non-negative finite number, got {value}"
                )));
            }
        }
        for (key, value) in &q.custom {
            if !value.is_finite() || *value < 0.0 {
                return Err(PensentError::InvalidInput(format!(
                    "quadrant_profile.custom.{key} must be a non-negative finite number, got {value}"
                )));
            }
        }
        if !self.temporal_flow.momentum.is_finite() {
            return Err(PensentError::InvalidInput(
                "temporal_flow.momentum must be finite".to_string(),
            ));
        }
        for moment in &self.critical_moments {
            if !moment.severity.is_finite() {
                return Err(PensentError::InvalidInput(format!(
                    "critical moment at index {} has a non-finite severity",
                    moment.index
                )));
            }
        }
        Ok(())
    }

    /// A copy with every scalar in the canonical [0,1] range.
    pub fn normalized(&self) -> Self {
        let intensity = if self.intensity > 1.0 {
            tracing::debug!(
                fingerprint = %self.fingerprint,
                intensity = self.intensity,
                "Rescaling percentage-scale intensity"
            );
            self.intensity / 100.0
        } else {
            self.intensity
        };

        Self {
            fingerprint: self.fingerprint.clone(),
            archetype: self.archetype.clone(),
            dominant_force: self.dominant_force,
            flow_direction: self.flow_direction,
            intensity: intensity.clamp(0.0, 1.0),
            quadrant_profile: self.quadrant_profile.normalized(),
            temporal_flow: self.temporal_flow.normalized(),
            critical_moments: self
                .critical_moments
                .iter()
                .map(|m| CriticalMoment {
                    severity: m.severity.clamp(0.0, 1.0),
                    ..m.clone()
                })
                .collect(),
            domain_data: self.domain_data.clone(),
        }
    }
}

/// A historical signature scored against a target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternMatch {
    pub pattern_id: u64,
    pub similarity: f64,
    pub signature: TemporalSignature,
    pub outcome: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_metadata: Option<Value>,
}

/// A resolved historical pattern as held by the pattern store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedPattern {
    pub id: u64,
    pub domain: Domain,
    pub fingerprint: String,
    pub archetype: String,
    pub outcome: String,
    pub signature: TemporalSignature,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
    pub created_at: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
}

impl PersistedPattern {
    /// Build a record for a resolved signature. The store assigns the id.
    pub fn new(domain: Domain, signature: TemporalSignature, outcome: impl Into<String>) -> Self {
        Self {
            id: 0,
            domain,
            fingerprint: signature.fingerprint.clone(),
            archetype: signature.archetype.clone(),
            outcome: outcome.into(),
            signature,
            metadata: None,
            created_at: now_secs(),
            created_by: None,
        }
    }

    pub fn with_metadata(mut self, metadata: Value) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn with_creator(mut self, created_by: impl Into<String>) -> Self {
        self.created_by = Some(created_by.into());
        self
    }
}

pub(crate) fn now_secs() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Errors that can occur in the pattern engine.
#[derive(thiserror::Error, Debug)]
pub enum PensentError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Pattern not found: {0}")]
    PatternNotFound(u64),

    #[error("Unknown domain: {0}")]
    UnknownDomain(String),

    #[error("Unknown archetype '{archetype}' in domain {domain}")]
    UnknownArchetype { domain: Domain, archetype: String },
}

/// Convenience result type.
pub type PensentResult<T> = Result<T, PensentError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_parse() {
        assert_eq!("Chess".parse::<Domain>().unwrap(), Domain::Chess);
        assert_eq!(" finance ".parse::<Domain>().unwrap(), Domain::Market);
        assert!(matches!(
            "poker".parse::<Domain>(),
            Err(PensentError::UnknownDomain(_))
        ));
    }

    #[test]
    fn test_percentage_profile_normalized() {
        let profile = QuadrantProfile::new(40.0, 30.0, 20.0, 10.0).with_center(50.0);
        let n = profile.normalized();
        assert!((n.q1 - 0.4).abs() < 1e-12);
        assert!((n.q4 - 0.1).abs() < 1e-12);
        assert_eq!(n.center, Some(0.5));
    }

    #[test]
    fn test_unit_profile_untouched() {
        let profile = QuadrantProfile::new(0.4, 0.3, 0.2, 0.1);
        assert_eq!(profile.normalized(), profile);
    }

    #[test]
    fn test_percentage_flow_normalized() {
        let flow = TemporalFlow {
            opening: 40.0,
            middle: 75.0,
            ending: 0.5,
            trend: Trend::Declining,
            momentum: -35.0,
        };
        let n = flow.normalized();
        assert!((n.opening - 0.4).abs() < 1e-12);
        assert!((n.middle - 0.75).abs() < 1e-12);
        assert!((n.ending - 0.005).abs() < 1e-12);
        assert!((n.momentum + 0.35).abs() < 1e-12);
        assert_eq!(n.trend, Trend::Declining);
    }

    #[test]
    fn test_unit_flow_untouched() {
        let flow = TemporalFlow {
            opening: 0.2,
            middle: 1.0,
            ending: 0.6,
            trend: Trend::Stable,
            momentum: -0.5,
        };
        assert_eq!(flow.normalized(), flow);
    }

    #[test]
    fn test_critical_moment_type_field() {
        let json = serde_json::json!({
            "index": 12,
            "type": "sacrifice",
            "severity": 0.8,
            "description": "Exchange sac on f6"
        });
        let moment: CriticalMoment = serde_json::from_value(json).unwrap();
        assert_eq!(moment.moment_type, "sacrifice");
        assert!(moment.metadata.is_none());
    }
}
