//! Prompt registration and dispatch.

use serde_json::Value;

use crate::types::{McpError, McpResult, PromptArgument, PromptDefinition, PromptGetResult};

use super::{compare, predict};

pub struct PromptRegistry;

impl PromptRegistry {
    pub fn list_prompts() -> Vec<PromptDefinition> {
        vec![
            PromptDefinition {
                name: "predict".to_string(),
                description: "Guide for predicting an outcome from historical patterns".to_string(),
                arguments: vec![
                    PromptArgument::new("domain", "chess, code, or market", true),
                    PromptArgument::new("context", "What is being analyzed", false),
                ],
            },
            PromptDefinition {
                name: "compare".to_string(),
                description: "Guide for comparing two recorded patterns".to_string(),
                arguments: vec![
                    PromptArgument::new("pattern_a", "First pattern ID", true),
                    PromptArgument::new("pattern_b", "Second pattern ID", true),
                ],
            },
        ]
    }

    pub async fn get(name: &str, arguments: Option<Value>) -> McpResult<PromptGetResult> {
        let args = arguments.unwrap_or(Value::Object(serde_json::Map::new()));

        match name {
            "predict" => predict::expand(args),
            "compare" => compare::expand(args),
            _ => Err(McpError::PromptNotFound(name.to_string())),
        }
    }
}
