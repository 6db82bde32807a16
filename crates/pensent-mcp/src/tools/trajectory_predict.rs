//! `trajectory_predict` tool: hybrid analysis with projected milestones.

use std::sync::Arc;
use tokio::sync::Mutex;

use serde::Deserialize;
use serde_json::{json, Value};

use pensent_core::{FusionConfig, TacticalInsight, TemporalSignature};

use crate::session::PatternSessionManager;
use crate::types::{McpResult, ToolCallResult, ToolDefinition};

use super::outcome_predict::tactical_schema;
use super::{
    domain_schema, parse_args, parse_domain, schema_with_match_args, signature_schema, MatchArgs,
};

#[derive(Debug, Deserialize)]
struct TrajectoryParams {
    domain: String,
    signature: TemporalSignature,
    #[serde(default)]
    tactical: Option<TacticalInsight>,
    /// Position of the live sequence, e.g. the current move number.
    #[serde(default)]
    current_index: usize,
    #[serde(default)]
    max_lookahead: Option<usize>,
    #[serde(flatten)]
    matching: MatchArgs,
}

pub fn definition() -> ToolDefinition {
    let mut props = serde_json::Map::new();
    props.insert("domain".to_string(), domain_schema());
    props.insert("signature".to_string(), signature_schema());
    props.insert("tactical".to_string(), tactical_schema());
    props.insert(
        "current_index".to_string(),
        json!({ "type": "integer", "default": 0, "description": "Current position in the sequence" }),
    );
    props.insert(
        "max_lookahead".to_string(),
        json!({ "type": "integer", "default": 40, "description": "Furthest milestone projection" }),
    );

    ToolDefinition {
        name: "trajectory_predict".to_string(),
        description: Some(
            "Project win/draw probabilities and upcoming critical moments for a live sequence"
                .to_string(),
        ),
        input_schema: schema_with_match_args(props, &["domain", "signature"]),
    }
}

pub async fn execute(
    args: Value,
    session: &Arc<Mutex<PatternSessionManager>>,
) -> McpResult<ToolCallResult> {
    let params: TrajectoryParams = parse_args(args)?;
    let domain = parse_domain(&params.domain)?;
    let options = params.matching.options()?;

    let mut config = FusionConfig::default();
    if let Some(lookahead) = params.max_lookahead {
        config.max_lookahead = lookahead;
    }

    let session = session.lock().await;
    let analysis = session.trajectory(
        domain,
        params.signature,
        &options,
        params.tactical.as_ref(),
        params.current_index,
        &config,
        params.matching.fuzzy_archetypes,
    )?;

    Ok(ToolCallResult::json(&json!({
        "domain": domain,
        "current_index": params.current_index,
        "trajectory": analysis.trajectory,
        "recommendation": analysis.recommendation,
        "strategic": analysis.strategic,
        "pattern_ids": analysis.matches.iter().map(|m| m.pattern_id).collect::<Vec<_>>(),
    })))
}
