//! Resource: pens://pattern/{id}

use std::sync::Arc;
use tokio::sync::Mutex;

use serde_json::json;

use crate::session::PatternSessionManager;
use crate::types::{McpError, McpResult, ReadResourceResult, ResourceContent};

use super::rfc3339;

pub async fn read_pattern(
    id: u64,
    session: &Arc<Mutex<PatternSessionManager>>,
) -> McpResult<ReadResourceResult> {
    let session = session.lock().await;
    let pattern = session
        .store()
        .get(id)
        .ok_or(McpError::PatternNotFound(id))?;

    let content = json!({
        "id": pattern.id,
        "domain": pattern.domain,
        "archetype": pattern.archetype,
        "outcome": pattern.outcome,
        "fingerprint": pattern.fingerprint,
        "signature": pattern.signature,
        "metadata": pattern.metadata,
        "created_at": rfc3339(pattern.created_at),
        "created_by": pattern.created_by,
    });

    Ok(ReadResourceResult {
        contents: vec![ResourceContent::json(&format!("pens://pattern/{id}"), &content)],
    })
}
