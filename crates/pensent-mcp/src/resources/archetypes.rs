//! Resource: pens://archetypes/{domain}

use std::sync::Arc;
use tokio::sync::Mutex;

use serde_json::json;

use pensent_core::Domain;

use crate::session::PatternSessionManager;
use crate::types::{McpResult, ReadResourceResult, ResourceContent};

pub async fn read_archetypes(
    domain: Domain,
    session: &Arc<Mutex<PatternSessionManager>>,
) -> McpResult<ReadResourceResult> {
    let session = session.lock().await;
    let registry = session.registry(domain)?;

    let content = json!({
        "domain": domain,
        "version": registry.version,
        "archetypes": registry.iter().collect::<Vec<_>>(),
    });

    Ok(ReadResourceResult {
        contents: vec![ResourceContent::json(
            &format!("pens://archetypes/{domain}"),
            &content,
        )],
    })
}
