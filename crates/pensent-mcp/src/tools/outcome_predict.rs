//! `outcome_predict` tool: outcome distribution and fused recommendation.

use std::sync::Arc;
use tokio::sync::Mutex;

use serde::Deserialize;
use serde_json::{json, Value};

use pensent_core::{FusionConfig, TacticalInsight, TemporalSignature};

use crate::session::PatternSessionManager;
use crate::types::{McpResult, ToolCallResult, ToolDefinition};

use super::{
    domain_schema, match_summary, parse_args, parse_domain, schema_with_match_args,
    signature_schema, MatchArgs,
};

#[derive(Debug, Deserialize)]
struct PredictParams {
    domain: String,
    signature: TemporalSignature,
    #[serde(default)]
    tactical: Option<TacticalInsight>,
    #[serde(default)]
    tactical_weight: Option<f64>,
    #[serde(flatten)]
    matching: MatchArgs,
}

pub(crate) fn tactical_schema() -> Value {
    json!({
        "type": "object",
        "description": "Output of an external calculation engine",
        "properties": {
            "best_action": { "type": "string" },
            "evaluation": { "type": "number", "description": "Signed, primary side's view" },
            "depth": { "type": "integer" },
            "confidence": { "type": "number" },
            "themes": { "type": "array", "items": { "type": "string" } },
            "alternatives": { "type": "array", "items": { "type": "string" } }
        },
        "required": ["best_action", "evaluation", "depth", "confidence"]
    })
}

pub fn definition() -> ToolDefinition {
    let mut props = serde_json::Map::new();
    props.insert("domain".to_string(), domain_schema());
    props.insert("signature".to_string(), signature_schema());
    props.insert("tactical".to_string(), tactical_schema());
    props.insert(
        "tactical_weight".to_string(),
        json!({ "type": "number", "default": 0.6, "description": "Share given to the engine" }),
    );

    ToolDefinition {
        name: "outcome_predict".to_string(),
        description: Some(
            "Predict the outcome of a sequence from similar historical patterns, \
             optionally fused with an engine evaluation"
                .to_string(),
        ),
        input_schema: schema_with_match_args(props, &["domain", "signature"]),
    }
}

pub async fn execute(
    args: Value,
    session: &Arc<Mutex<PatternSessionManager>>,
) -> McpResult<ToolCallResult> {
    let params: PredictParams = parse_args(args)?;
    let domain = parse_domain(&params.domain)?;
    let options = params.matching.options()?;

    let mut config = FusionConfig::default();
    if let Some(w) = params.tactical_weight {
        config.tactical_weight = w;
    }

    let session = session.lock().await;
    let report = session.predict(
        domain,
        params.signature,
        &options,
        params.tactical.as_ref(),
        &config,
        params.matching.fuzzy_archetypes,
    )?;

    let top: Vec<Value> = report.matches.iter().map(match_summary).collect();

    Ok(ToolCallResult::json(&json!({
        "domain": domain,
        "sample_size": report.sample_size,
        "probabilities": report.probabilities,
        "most_likely": report.most_likely,
        "diversity": report.diversity,
        "confidence": report.confidence,
        "strategic": report.strategic,
        "recommendation": report.recommendation,
        "matches": top,
    })))
}
