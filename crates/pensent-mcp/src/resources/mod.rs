//! MCP resource implementations.

pub mod archetypes;
pub mod domain;
pub mod pattern;
pub mod registry;
pub mod stats;
pub mod templates;

pub use registry::ResourceRegistry;

use serde_json::{json, Value};

use pensent_core::PersistedPattern;

/// Unix seconds as RFC 3339, or the raw number if out of range.
pub(crate) fn rfc3339(secs: u64) -> Value {
    i64::try_from(secs)
        .ok()
        .and_then(|s| chrono::DateTime::from_timestamp(s, 0))
        .map(|dt| Value::String(dt.to_rfc3339()))
        .unwrap_or_else(|| json!(secs))
}

/// One-line listing entry for a pattern.
pub(crate) fn summary(p: &PersistedPattern) -> Value {
    json!({
        "id": p.id,
        "domain": p.domain,
        "archetype": p.archetype,
        "outcome": p.outcome,
        "fingerprint": p.fingerprint,
        "created_at": rfc3339(p.created_at),
        "created_by": p.created_by,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rfc3339_epoch() {
        assert_eq!(rfc3339(0), json!("1970-01-01T00:00:00+00:00"));
    }

    #[test]
    fn test_rfc3339_out_of_range_falls_back() {
        assert_eq!(rfc3339(u64::MAX), json!(u64::MAX));
    }
}
