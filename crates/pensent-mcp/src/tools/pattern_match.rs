//! `pattern_match` tool: rank historical patterns by similarity.

use std::sync::Arc;
use tokio::sync::Mutex;

use serde::Deserialize;
use serde_json::{json, Value};

use pensent_core::TemporalSignature;

use crate::session::PatternSessionManager;
use crate::types::{McpResult, ToolCallResult, ToolDefinition};

use super::{
    domain_schema, match_summary, parse_args, parse_domain, schema_with_match_args,
    signature_schema, MatchArgs,
};

#[derive(Debug, Deserialize)]
struct MatchParams {
    domain: String,
    signature: TemporalSignature,
    #[serde(flatten)]
    matching: MatchArgs,
}

pub fn definition() -> ToolDefinition {
    let mut props = serde_json::Map::new();
    props.insert("domain".to_string(), domain_schema());
    props.insert("signature".to_string(), signature_schema());

    ToolDefinition {
        name: "pattern_match".to_string(),
        description: Some(
            "Find the recorded patterns most similar to a signature, best first".to_string(),
        ),
        input_schema: schema_with_match_args(props, &["domain", "signature"]),
    }
}

pub async fn execute(
    args: Value,
    session: &Arc<Mutex<PatternSessionManager>>,
) -> McpResult<ToolCallResult> {
    let params: MatchParams = parse_args(args)?;
    let domain = parse_domain(&params.domain)?;
    let options = params.matching.options()?;

    let session = session.lock().await;
    let matches =
        session.find_matches(domain, params.signature, &options, params.matching.fuzzy_archetypes)?;

    let results: Vec<Value> = matches.iter().map(match_summary).collect();

    Ok(ToolCallResult::json(&json!({
        "domain": domain,
        "total": results.len(),
        "matches": results,
    })))
}
