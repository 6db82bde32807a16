//! Resource URI templates and static resource definitions.

use crate::types::{ResourceDefinition, ResourceTemplateDefinition};

pub fn list_templates() -> Vec<ResourceTemplateDefinition> {
    vec![
        ResourceTemplateDefinition::json(
            "pens://pattern/{id}",
            "Pattern",
            "A recorded pattern with its full signature",
        ),
        ResourceTemplateDefinition::json(
            "pens://domain/{domain}",
            "Domain Patterns",
            "All patterns for one domain with outcome counts",
        ),
        ResourceTemplateDefinition::json(
            "pens://archetypes/{domain}",
            "Archetype Registry",
            "The archetype catalog for one domain",
        ),
    ]
}

pub fn list_resources() -> Vec<ResourceDefinition> {
    vec![
        ResourceDefinition::json(
            "pens://stats",
            "Pattern Store Statistics",
            "Pattern counts, sessions, and cache usage",
        ),
        ResourceDefinition::json("pens://recent", "Recent Patterns", "Most recent 20 patterns"),
    ]
}
