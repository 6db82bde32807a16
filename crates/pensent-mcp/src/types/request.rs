//! Params of the client calls the pattern server accepts.

use serde::Deserialize;
use serde_json::Value;

use super::message::RequestId;

/// `tools/call`. Missing `arguments` means an empty object.
#[derive(Debug, Clone, Deserialize)]
pub struct ToolCallParams {
    pub name: String,
    #[serde(default)]
    pub arguments: Option<Value>,
}

/// `resources/read`, `resources/subscribe` and `resources/unsubscribe`.
#[derive(Debug, Clone, Deserialize)]
pub struct ResourceUriParams {
    pub uri: String,
}

/// `prompts/get`.
#[derive(Debug, Clone, Deserialize)]
pub struct PromptGetParams {
    pub name: String,
    #[serde(default)]
    pub arguments: Option<Value>,
}

/// `notifications/cancelled`. Logged only; calls run to completion.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelledParams {
    pub request_id: RequestId,
    #[serde(default)]
    pub reason: Option<String>,
}
