//! `pattern_compare` tool: similarity breakdown between two stored patterns.

use std::sync::Arc;
use tokio::sync::Mutex;

use serde::Deserialize;
use serde_json::{json, Value};

use pensent_core::SimilarityWeights;

use crate::session::PatternSessionManager;
use crate::types::{McpResult, ToolCallResult, ToolDefinition};

use super::parse_args;

#[derive(Debug, Deserialize)]
struct CompareParams {
    pattern_a: u64,
    pattern_b: u64,
    #[serde(default)]
    weights: Option<SimilarityWeights>,
}

pub fn definition() -> ToolDefinition {
    ToolDefinition {
        name: "pattern_compare".to_string(),
        description: Some("Compare two recorded patterns axis by axis".to_string()),
        input_schema: json!({
            "type": "object",
            "properties": {
                "pattern_a": { "type": "integer", "description": "First pattern ID" },
                "pattern_b": { "type": "integer", "description": "Second pattern ID" },
                "weights": {
                    "type": "object",
                    "properties": {
                        "archetype": { "type": "number" },
                        "quadrant": { "type": "number" },
                        "temporal": { "type": "number" }
                    }
                }
            },
            "required": ["pattern_a", "pattern_b"]
        }),
    }
}

pub async fn execute(
    args: Value,
    session: &Arc<Mutex<PatternSessionManager>>,
) -> McpResult<ToolCallResult> {
    let params: CompareParams = parse_args(args)?;

    let mut session = session.lock().await;
    let comparison = session.compare(params.pattern_a, params.pattern_b, params.weights.as_ref())?;

    Ok(ToolCallResult::json(&comparison))
}
