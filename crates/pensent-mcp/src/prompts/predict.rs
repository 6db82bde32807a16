//! `predict` prompt: guide for outcome prediction against the pattern pool.

use serde_json::Value;

use crate::types::{McpError, McpResult, PromptGetResult, PromptMessage};

pub fn expand(args: Value) -> McpResult<PromptGetResult> {
    let domain = args
        .get("domain")
        .and_then(|v| v.as_str())
        .ok_or_else(|| McpError::InvalidParams("'domain' argument is required".to_string()))?;
    let domain: pensent_core::Domain = domain.parse()?;

    let context = args
        .get("context")
        .and_then(|v| v.as_str())
        .map(|c| format!("Context: {c}\n\n"))
        .unwrap_or_default();

    let text = format!(
        "{context}Predict where this {domain} sequence is heading.\n\n\
         Please:\n\
         1. Build a temporal signature for the sequence (archetype, quadrant profile, temporal flow)\n\
         2. Use archetype_classify if you are unsure which archetype fits\n\
         3. Call outcome_predict with domain \"{domain}\"; pass any engine evaluation as `tactical`\n\
         4. If the sequence is still live, call trajectory_predict with the current index\n\
         5. Report the most likely outcome, its probability, and the confidence. \
            Treat low sample sizes with caution"
    );

    Ok(PromptGetResult {
        description: format!("Outcome prediction for the {domain} domain"),
        messages: vec![PromptMessage::user(text)],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_requires_domain() {
        assert!(matches!(
            expand(json!({})),
            Err(McpError::InvalidParams(_))
        ));
    }

    #[test]
    fn test_mentions_domain_and_context() {
        let result = expand(json!({"domain": "Finance", "context": "BTC weekly"})).unwrap();
        let text = &result.messages[0].content.text;
        assert!(text.contains("market"));
        assert!(text.contains("BTC weekly"));
    }
}
