//! `archetype_list` tool: show a domain's archetype registry.

use std::sync::Arc;
use tokio::sync::Mutex;

use serde::Deserialize;
use serde_json::{json, Value};

use crate::session::PatternSessionManager;
use crate::types::{McpResult, ToolCallResult, ToolDefinition};

use super::{domain_schema, parse_args, parse_domain};

#[derive(Debug, Deserialize)]
struct ListParams {
    domain: String,
}

pub fn definition() -> ToolDefinition {
    ToolDefinition {
        name: "archetype_list".to_string(),
        description: Some("List the archetypes known for a domain".to_string()),
        input_schema: json!({
            "type": "object",
            "properties": { "domain": domain_schema() },
            "required": ["domain"]
        }),
    }
}

pub async fn execute(
    args: Value,
    session: &Arc<Mutex<PatternSessionManager>>,
) -> McpResult<ToolCallResult> {
    let params: ListParams = parse_args(args)?;
    let domain = parse_domain(&params.domain)?;

    let session = session.lock().await;
    let registry = session.registry(domain)?;
    let archetypes: Vec<_> = registry.iter().collect();

    Ok(ToolCallResult::json(&json!({
        "domain": domain,
        "version": registry.version,
        "count": archetypes.len(),
        "archetypes": archetypes,
    })))
}
