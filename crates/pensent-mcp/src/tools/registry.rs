//! Tool registration and dispatch.

use std::sync::Arc;
use tokio::sync::Mutex;

use serde_json::Value;

use crate::session::PatternSessionManager;
use crate::types::{McpError, McpResult, ToolCallResult, ToolDefinition};

use super::{
    archetype_classify, archetype_list, outcome_predict, pattern_compare, pattern_match,
    pattern_record, session_end, session_start, trajectory_predict,
};

pub struct ToolRegistry;

impl ToolRegistry {
    pub fn list_tools() -> Vec<ToolDefinition> {
        vec![
            pattern_record::definition(),
            pattern_match::definition(),
            pattern_compare::definition(),
            outcome_predict::definition(),
            trajectory_predict::definition(),
            archetype_list::definition(),
            archetype_classify::definition(),
            session_start::definition(),
            session_end::definition(),
        ]
    }

    pub async fn call(
        name: &str,
        arguments: Option<Value>,
        session: &Arc<Mutex<PatternSessionManager>>,
    ) -> McpResult<ToolCallResult> {
        let args = arguments.unwrap_or(Value::Object(serde_json::Map::new()));

        tracing::debug!(tool = name, "Tool call");

        match name {
            "pattern_record" => pattern_record::execute(args, session).await,
            "pattern_match" => pattern_match::execute(args, session).await,
            "pattern_compare" => pattern_compare::execute(args, session).await,
            "outcome_predict" => outcome_predict::execute(args, session).await,
            "trajectory_predict" => trajectory_predict::execute(args, session).await,
            "archetype_list" => archetype_list::execute(args, session).await,
            "archetype_classify" => archetype_classify::execute(args, session).await,
            "session_start" => session_start::execute(args, session).await,
            "session_end" => session_end::execute(args, session).await,
            _ => Err(McpError::ToolNotFound(name.to_string())),
        }
    }
}
