//! `session_end` tool: end the current session.

use std::sync::Arc;
use tokio::sync::Mutex;

use serde::Deserialize;
use serde_json::{json, Value};

use crate::session::PatternSessionManager;
use crate::types::{McpResult, ToolCallResult, ToolDefinition};

use super::parse_args;

#[derive(Debug, Deserialize)]
struct EndParams {
    #[serde(default)]
    session_id: Option<u32>,
}

pub fn definition() -> ToolDefinition {
    ToolDefinition {
        name: "session_end".to_string(),
        description: Some("End the current session and flush the pattern store to disk".to_string()),
        input_schema: json!({
            "type": "object",
            "properties": {
                "session_id": { "type": "integer", "description": "Session expected to be current; rejected if another one is" }
            }
        }),
    }
}

pub async fn execute(
    args: Value,
    session: &Arc<Mutex<PatternSessionManager>>,
) -> McpResult<ToolCallResult> {
    let params: EndParams = parse_args(args)?;

    let mut session = session.lock().await;
    let session_id = session.end_session(params.session_id)?;
    let count = session.store().count();

    Ok(ToolCallResult::json(&json!({
        "session_id": session_id,
        "total_patterns": count,
        "file": session.file_path().display().to_string(),
        "status": "ended"
    })))
}
