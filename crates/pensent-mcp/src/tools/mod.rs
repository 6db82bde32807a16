//! MCP tool implementations.

pub mod archetype_classify;
pub mod archetype_list;
pub mod outcome_predict;
pub mod pattern_compare;
pub mod pattern_match;
pub mod pattern_record;
pub mod registry;
pub mod session_end;
pub mod session_start;
pub mod trajectory_predict;

pub use registry::ToolRegistry;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};

use pensent_core::{Domain, MatchOptions, PatternMatch, SimilarityWeights};

use crate::types::{McpError, McpResult};

pub(crate) fn parse_args<T: DeserializeOwned>(args: Value) -> McpResult<T> {
    serde_json::from_value(args).map_err(|e| McpError::InvalidParams(e.to_string()))
}

pub(crate) fn parse_domain(domain: &str) -> McpResult<Domain> {
    Ok(domain.parse::<Domain>()?)
}

/// One match as reported by the match and prediction tools.
pub(crate) fn match_summary(m: &PatternMatch) -> Value {
    json!({
        "pattern_id": m.pattern_id,
        "similarity": m.similarity,
        "archetype": m.signature.archetype,
        "fingerprint": m.signature.fingerprint,
        "outcome": m.outcome,
        "source_metadata": m.source_metadata,
    })
}

fn default_limit() -> usize {
    10
}

/// Matching knobs shared by the match and prediction tools.
#[derive(Debug, Deserialize)]
pub(crate) struct MatchArgs {
    #[serde(default)]
    pub min_similarity: Option<f64>,
    #[serde(default = "default_limit")]
    pub limit: usize,
    #[serde(default)]
    pub archetype_filter: Vec<String>,
    #[serde(default)]
    pub outcome_filter: Vec<String>,
    #[serde(default)]
    pub weights: Option<SimilarityWeights>,
    /// Give partial credit to registry-related archetypes.
    #[serde(default)]
    pub fuzzy_archetypes: bool,
}

impl MatchArgs {
    pub fn options(&self) -> McpResult<MatchOptions> {
        if let Some(min) = self.min_similarity {
            if !(0.0..=1.0).contains(&min) {
                return Err(McpError::InvalidParams(format!(
                    "min_similarity must be within [0, 1], got {min}"
                )));
            }
        }
        Ok(MatchOptions {
            min_similarity: self.min_similarity,
            limit: Some(self.limit),
            archetype_filter: self.archetype_filter.clone(),
            outcome_filter: self.outcome_filter.clone(),
            weights: self.weights,
        })
    }
}

/// JSON schema properties for [`MatchArgs`], merged into each tool's schema.
pub(crate) fn match_properties() -> serde_json::Map<String, Value> {
    let props = json!({
        "min_similarity": {
            "type": "number",
            "minimum": 0,
            "maximum": 1,
            "description": "Drop matches scoring below this (default 0)"
        },
        "limit": { "type": "integer", "default": 10 },
        "archetype_filter": {
            "type": "array",
            "items": { "type": "string" },
            "description": "Only consider patterns with these archetypes"
        },
        "outcome_filter": {
            "type": "array",
            "items": { "type": "string" },
            "description": "Only consider patterns with these outcomes"
        },
        "weights": {
            "type": "object",
            "properties": {
                "archetype": { "type": "number" },
                "quadrant": { "type": "number" },
                "temporal": { "type": "number" }
            },
            "description": "Relative weights of the three similarity axes"
        },
        "fuzzy_archetypes": {
            "type": "boolean",
            "default": false,
            "description": "Give partial credit to related archetypes"
        }
    });
    match props {
        Value::Object(map) => map,
        _ => serde_json::Map::new(),
    }
}

/// Schema fragment for a temporal signature argument.
pub(crate) fn signature_schema() -> Value {
    json!({
        "type": "object",
        "description": "Temporal signature produced by a domain adapter",
        "properties": {
            "fingerprint": { "type": "string" },
            "archetype": { "type": "string" },
            "dominant_force": { "type": "string", "enum": ["primary", "secondary", "balanced"] },
            "flow_direction": {
                "type": "string",
                "enum": ["forward", "lateral", "backward", "chaotic"]
            },
            "intensity": { "type": "number" },
            "quadrant_profile": {
                "type": "object",
                "properties": {
                    "q1": { "type": "number" },
                    "q2": { "type": "number" },
                    "q3": { "type": "number" },
                    "q4": { "type": "number" },
                    "center": { "type": "number" }
                },
                "required": ["q1", "q2", "q3", "q4"]
            },
            "temporal_flow": {
                "type": "object",
                "properties": {
                    "opening": { "type": "number" },
                    "middle": { "type": "number" },
                    "ending": { "type": "number" },
                    "trend": {
                        "type": "string",
                        "enum": ["accelerating", "stable", "declining", "volatile"]
                    },
                    "momentum": { "type": "number" }
                },
                "required": ["opening", "middle", "ending", "trend", "momentum"]
            },
            "critical_moments": { "type": "array", "items": { "type": "object" } }
        },
        "required": [
            "fingerprint", "archetype", "dominant_force", "flow_direction",
            "intensity", "quadrant_profile", "temporal_flow"
        ]
    })
}

pub(crate) fn domain_schema() -> Value {
    json!({
        "type": "string",
        "enum": ["chess", "code", "market"],
        "description": "Domain whose pattern pool to use"
    })
}

/// Build an object schema from the base properties plus the shared match knobs.
pub(crate) fn schema_with_match_args(mut properties: serde_json::Map<String, Value>, required: &[&str]) -> Value {
    properties.extend(match_properties());
    json!({
        "type": "object",
        "properties": properties,
        "required": required,
    })
}
