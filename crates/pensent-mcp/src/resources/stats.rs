//! Resource: pens://stats and pens://recent

use std::sync::Arc;
use tokio::sync::Mutex;

use serde_json::json;

use crate::session::PatternSessionManager;
use crate::types::{McpResult, ReadResourceResult, ResourceContent};

use super::{rfc3339, summary};

const RECENT_LIMIT: usize = 20;

pub async fn read_stats(
    session: &Arc<Mutex<PatternSessionManager>>,
) -> McpResult<ReadResourceResult> {
    let session = session.lock().await;
    let store = session.store();

    let by_domain: serde_json::Map<String, serde_json::Value> = store
        .domain_counts()
        .into_iter()
        .map(|(d, n)| (d.to_string(), json!(n)))
        .collect();
    let (hits, misses) = session.cache_stats();

    let content = json!({
        "total_patterns": store.count(),
        "by_domain": by_domain,
        "session_count": store.session_count,
        "current_session": session.current_session_id(),
        "next_id": store.next_id,
        "created_at": rfc3339(store.created_at),
        "updated_at": rfc3339(store.updated_at),
        "similarity_cache": { "hits": hits, "misses": misses },
        "file_path": session.file_path().display().to_string(),
    });

    Ok(ReadResourceResult {
        contents: vec![ResourceContent::json("pens://stats", &content)],
    })
}

pub async fn read_recent(
    session: &Arc<Mutex<PatternSessionManager>>,
) -> McpResult<ReadResourceResult> {
    let session = session.lock().await;
    let patterns: Vec<_> = session
        .store()
        .recent(RECENT_LIMIT)
        .into_iter()
        .map(summary)
        .collect();

    let content = json!({
        "count": patterns.len(),
        "patterns": patterns,
    });

    Ok(ReadResourceResult {
        contents: vec![ResourceContent::json("pens://recent", &content)],
    })
}
