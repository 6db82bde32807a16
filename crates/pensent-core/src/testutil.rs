//! Shared fixtures for unit tests.

use serde_json::Map;

use crate::types::{
    CriticalMoment, DominantForce, FlowDirection, PersistedPattern, QuadrantProfile,
    TemporalFlow, TemporalSignature, Trend,
};
use crate::Domain;

pub fn signature(fingerprint: &str, archetype: &str) -> TemporalSignature {
    TemporalSignature {
        fingerprint: fingerprint.to_string(),
        archetype: archetype.to_string(),
        dominant_force: DominantForce::Primary,
        flow_direction: FlowDirection::Forward,
        intensity: 0.6,
        quadrant_profile: QuadrantProfile::new(0.4, 0.3, 0.2, 0.1),
        temporal_flow: TemporalFlow {
            opening: 0.3,
            middle: 0.6,
            ending: 0.4,
            trend: Trend::Accelerating,
            momentum: 0.4,
        },
        critical_moments: Vec::new(),
        domain_data: Map::new(),
    }
}

/// A signature that differs from [`signature`] on every axis except the archetype.
pub fn contrasting(fingerprint: &str, archetype: &str) -> TemporalSignature {
    TemporalSignature {
        quadrant_profile: QuadrantProfile::new(0.1, 0.2, 0.3, 0.4),
        temporal_flow: TemporalFlow {
            opening: 0.7,
            middle: 0.2,
            ending: 0.6,
            trend: Trend::Declining,
            momentum: -0.5,
        },
        ..signature(fingerprint, archetype)
    }
}

pub fn moment(index: usize, kind: &str, severity: f64) -> CriticalMoment {
    CriticalMoment {
        index,
        moment_type: kind.to_string(),
        severity,
        description: format!("{kind} at {index}"),
        metadata: None,
    }
}

pub fn pattern(id: u64, sig: TemporalSignature, outcome: &str) -> PersistedPattern {
    let mut p = PersistedPattern::new(Domain::Chess, sig, outcome);
    p.id = id;
    p
}
