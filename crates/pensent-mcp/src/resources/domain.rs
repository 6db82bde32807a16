//! Resource: pens://domain/{domain}

use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::Mutex;

use serde_json::json;

use pensent_core::Domain;

use crate::session::PatternSessionManager;
use crate::types::{McpResult, ReadResourceResult, ResourceContent};

use super::summary;

pub async fn read_domain(
    domain: Domain,
    session: &Arc<Mutex<PatternSessionManager>>,
) -> McpResult<ReadResourceResult> {
    let session = session.lock().await;
    let patterns = session.store().by_domain(domain);

    let mut outcomes: BTreeMap<&str, usize> = BTreeMap::new();
    let mut archetypes: BTreeMap<&str, usize> = BTreeMap::new();
    for p in &patterns {
        *outcomes.entry(p.outcome.as_str()).or_default() += 1;
        *archetypes.entry(p.archetype.as_str()).or_default() += 1;
    }

    let content = json!({
        "domain": domain,
        "count": patterns.len(),
        "outcomes": outcomes,
        "archetypes": archetypes,
        "patterns": patterns.iter().map(|p| summary(p)).collect::<Vec<_>>(),
    });

    Ok(ReadResourceResult {
        contents: vec![ResourceContent::json(&format!("pens://domain/{domain}"), &content)],
    })
}
