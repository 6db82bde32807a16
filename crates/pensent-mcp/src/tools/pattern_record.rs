//! `pattern_record` tool: persist a resolved signature with its outcome.

use std::sync::Arc;
use tokio::sync::Mutex;

use serde::Deserialize;
use serde_json::{json, Value};

use pensent_core::TemporalSignature;

use crate::session::PatternSessionManager;
use crate::types::{McpResult, ToolCallResult, ToolDefinition};

use super::{domain_schema, parse_args, parse_domain, signature_schema};

#[derive(Debug, Deserialize)]
struct RecordParams {
    domain: String,
    signature: TemporalSignature,
    outcome: String,
    #[serde(default)]
    metadata: Option<Value>,
    #[serde(default)]
    created_by: Option<String>,
}

pub fn definition() -> ToolDefinition {
    ToolDefinition {
        name: "pattern_record".to_string(),
        description: Some(
            "Record a finished sequence's temporal signature and its known outcome".to_string(),
        ),
        input_schema: json!({
            "type": "object",
            "properties": {
                "domain": domain_schema(),
                "signature": signature_schema(),
                "outcome": {
                    "type": "string",
                    "description": "Resolved outcome label, e.g. white_wins or success"
                },
                "metadata": { "type": "object", "description": "Free-form source details" },
                "created_by": { "type": "string" }
            },
            "required": ["domain", "signature", "outcome"]
        }),
    }
}

pub async fn execute(
    args: Value,
    session: &Arc<Mutex<PatternSessionManager>>,
) -> McpResult<ToolCallResult> {
    let params: RecordParams = parse_args(args)?;
    let domain = parse_domain(&params.domain)?;

    let mut session = session.lock().await;
    let result = session.record(
        domain,
        params.signature,
        &params.outcome,
        params.metadata,
        params.created_by,
    )?;

    Ok(ToolCallResult::json(&json!({
        "pattern_id": result.pattern_id,
        "fingerprint": result.fingerprint,
        "archetype": result.archetype,
        "known_archetype": result.known_archetype,
        "domain": domain,
        "total_patterns": session.store().count(),
    })))
}
