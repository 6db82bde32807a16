//! Resource registration and dispatch.

use std::sync::Arc;
use tokio::sync::Mutex;

use pensent_core::Domain;

use crate::session::PatternSessionManager;
use crate::types::{
    McpError, McpResult, ReadResourceResult, ResourceDefinition, ResourceTemplateDefinition,
};

use super::{archetypes, domain, pattern, stats, templates};

pub struct ResourceRegistry;

impl ResourceRegistry {
    pub fn list_templates() -> Vec<ResourceTemplateDefinition> {
        templates::list_templates()
    }

    pub fn list_resources() -> Vec<ResourceDefinition> {
        templates::list_resources()
    }

    pub async fn read(
        uri: &str,
        session: &Arc<Mutex<PatternSessionManager>>,
    ) -> McpResult<ReadResourceResult> {
        if let Some(id_str) = uri.strip_prefix("pens://pattern/") {
            let id: u64 = id_str
                .parse()
                .map_err(|_| McpError::InvalidParams(format!("Invalid pattern ID: {id_str}")))?;
            pattern::read_pattern(id, session).await
        } else if let Some(name) = uri.strip_prefix("pens://domain/") {
            domain::read_domain(parse_domain(name)?, session).await
        } else if let Some(name) = uri.strip_prefix("pens://archetypes/") {
            archetypes::read_archetypes(parse_domain(name)?, session).await
        } else if uri == "pens://stats" {
            stats::read_stats(session).await
        } else if uri == "pens://recent" {
            stats::read_recent(session).await
        } else {
            Err(McpError::ResourceNotFound(uri.to_string()))
        }
    }
}

fn parse_domain(name: &str) -> McpResult<Domain> {
    name.parse::<Domain>()
        .map_err(|_| McpError::ResourceNotFound(format!("Unknown domain: {name}")))
}
