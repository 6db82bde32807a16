//! `archetype_classify` tool: pick the archetype best described by a set of tags.

use std::sync::Arc;
use tokio::sync::Mutex;

use serde::Deserialize;
use serde_json::{json, Value};

use crate::session::PatternSessionManager;
use crate::types::{McpError, McpResult, ToolCallResult, ToolDefinition};

use super::{domain_schema, parse_args, parse_domain};

#[derive(Debug, Deserialize)]
struct ClassifyParams {
    domain: String,
    tags: Vec<String>,
}

pub fn definition() -> ToolDefinition {
    ToolDefinition {
        name: "archetype_classify".to_string(),
        description: Some(
            "Classify free-form tags (themes, observations) into a registered archetype"
                .to_string(),
        ),
        input_schema: json!({
            "type": "object",
            "properties": {
                "domain": domain_schema(),
                "tags": {
                    "type": "array",
                    "items": { "type": "string" },
                    "description": "Keywords describing the sequence"
                }
            },
            "required": ["domain", "tags"]
        }),
    }
}

pub async fn execute(
    args: Value,
    session: &Arc<Mutex<PatternSessionManager>>,
) -> McpResult<ToolCallResult> {
    let params: ClassifyParams = parse_args(args)?;
    let domain = parse_domain(&params.domain)?;
    if params.tags.is_empty() {
        return Err(McpError::InvalidParams(
            "'tags' must contain at least one entry".to_string(),
        ));
    }

    let session = session.lock().await;
    let registry = session.registry(domain)?;

    match registry.classify(&params.tags) {
        Some(def) => Ok(ToolCallResult::json(&json!({
            "domain": domain,
            "matched": true,
            "archetype": def,
        }))),
        None => Ok(ToolCallResult::json(&json!({
            "domain": domain,
            "matched": false,
            "archetype": null,
        }))),
    }
}
