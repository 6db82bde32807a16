//! `compare` prompt: guide for comparing two recorded patterns.

use serde_json::Value;

use crate::types::{McpError, McpResult, PromptGetResult, PromptMessage};

pub fn expand(args: Value) -> McpResult<PromptGetResult> {
    let pattern_a = args
        .get("pattern_a")
        .ok_or_else(|| McpError::InvalidParams("'pattern_a' argument is required".to_string()))?;

    let pattern_b = args
        .get("pattern_b")
        .ok_or_else(|| McpError::InvalidParams("'pattern_b' argument is required".to_string()))?;

    let text = format!(
        "Compare these two recorded patterns:\n\
         - Pattern A: {pattern_a}\n\
         - Pattern B: {pattern_b}\n\n\
         Please:\n\
         1. Use pattern_compare to get the overall similarity and the per-axis scores\n\
         2. Read pens://pattern/{{id}} for each to inspect archetype, quadrants, and flow\n\
         3. Explain which axis drives the score (archetype, spatial, or temporal)\n\
         4. Say whether their outcomes agree and what that suggests"
    );

    Ok(PromptGetResult {
        description: "Guide for comparing two recorded patterns".to_string(),
        messages: vec![PromptMessage::user(text)],
    })
}
