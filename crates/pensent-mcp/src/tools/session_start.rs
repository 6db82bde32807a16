//! `session_start` tool: start a new pattern-recording session.

use std::sync::Arc;
use tokio::sync::Mutex;

use serde::Deserialize;
use serde_json::{json, Value};

use crate::session::PatternSessionManager;
use crate::types::{McpResult, ToolCallResult, ToolDefinition};

use super::parse_args;

#[derive(Debug, Deserialize)]
struct StartParams {
    #[serde(default)]
    session_id: Option<u32>,
}

pub fn definition() -> ToolDefinition {
    ToolDefinition {
        name: "session_start".to_string(),
        description: Some("Start a new pattern-recording session".to_string()),
        input_schema: json!({
            "type": "object",
            "properties": {
                "session_id": { "type": "integer", "description": "Optional explicit session ID (1 or higher)" }
            }
        }),
    }
}

pub async fn execute(
    args: Value,
    session: &Arc<Mutex<PatternSessionManager>>,
) -> McpResult<ToolCallResult> {
    let params: StartParams = parse_args(args)?;

    let mut session = session.lock().await;
    let session_id = session.start_session(params.session_id)?;

    Ok(ToolCallResult::json(&json!({
        "session_id": session_id,
        "status": "started"
    })))
}
