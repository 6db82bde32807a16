//! Main request dispatcher. Routes JSON-RPC messages to their handlers.

use std::sync::Arc;
use tokio::sync::Mutex;

use serde_json::{json, Value};

use crate::prompts::PromptRegistry;
use crate::resources::ResourceRegistry;
use crate::session::PatternSessionManager;
use crate::tools::ToolRegistry;
use crate::transport::framing::parse_message;
use crate::types::*;

use super::negotiation::NegotiatedCapabilities;
use super::validator::validate_request;

/// The main protocol handler that dispatches incoming JSON-RPC messages.
pub struct ProtocolHandler {
    session: Arc<Mutex<PatternSessionManager>>,
    capabilities: Arc<Mutex<NegotiatedCapabilities>>,
}

impl ProtocolHandler {
    pub fn new(session: Arc<Mutex<PatternSessionManager>>) -> Self {
        Self {
            session,
            capabilities: Arc::new(Mutex::new(NegotiatedCapabilities::default())),
        }
    }

    /// Handle one raw line from the wire. Unparseable input yields an
    /// error response with a null id.
    pub async fn handle_line(&self, line: &str) -> Option<Value> {
        if line.trim().is_empty() {
            return None;
        }
        match parse_message(line) {
            Ok(msg) => self.handle_message(msg).await,
            Err(e) => {
                tracing::warn!("Parse error: {e}");
                Some(serde_json::to_value(e.to_json_rpc_error(RequestId::Null)).unwrap_or_default())
            }
        }
    }

    /// Persist any unsaved patterns.
    pub async fn flush(&self) -> McpResult<()> {
        self.session.lock().await.save()
    }

    pub async fn handle_message(&self, msg: IncomingMessage) -> Option<Value> {
        match msg {
            IncomingMessage::Request(req) => Some(self.handle_request(req).await),
            IncomingMessage::Notification(notif) => {
                self.handle_notification(notif).await;
                None
            }
            IncomingMessage::StrayReply(reply) => {
                tracing::warn!(id = %reply.id, "Ignoring reply to a request the server never sent");
                None
            }
        }
    }

    async fn handle_request(&self, request: JsonRpcRequest) -> Value {
        if let Err(e) = validate_request(&request) {
            return serde_json::to_value(e.to_json_rpc_error(request.id)).unwrap_or_default();
        }

        let id = request.id.clone();
        let result = self.dispatch_request(&request).await;
        if let Err(e) = &result {
            tracing::debug!(method = %request.method, code = e.code(), "Request failed: {e}");
        }

        match result {
            Ok(value) => serde_json::to_value(JsonRpcResponse::new(id, value)).unwrap_or_default(),
            Err(e) => serde_json::to_value(e.to_json_rpc_error(id)).unwrap_or_default(),
        }
    }

    async fn dispatch_request(&self, request: &JsonRpcRequest) -> McpResult<Value> {
        match request.method.as_str() {
            "initialize" => self.handle_initialize(request.params.clone()).await,
            "shutdown" => self.handle_shutdown().await,

            "tools/list" => self.handle_tools_list().await,
            "tools/call" => self.handle_tools_call(request.params.clone()).await,

            "resources/list" => self.handle_resources_list().await,
            "resources/templates/list" => self.handle_resource_templates_list().await,
            "resources/read" => self.handle_resources_read(request.params.clone()).await,
            "resources/subscribe" | "resources/unsubscribe" => {
                self.handle_subscription(&request.method, request.params.clone())
            }

            "prompts/list" => self.handle_prompts_list().await,
            "prompts/get" => self.handle_prompts_get(request.params.clone()).await,

            "ping" => Ok(Value::Object(serde_json::Map::new())),

            _ => Err(McpError::MethodNotFound(request.method.clone())),
        }
    }

    async fn handle_notification(&self, notification: JsonRpcNotification) {
        match notification.method.as_str() {
            "initialized" | "notifications/initialized" => {
                let mut caps = self.capabilities.lock().await;
                if let Err(e) = caps.mark_initialized() {
                    tracing::error!("Failed to mark initialized: {e}");
                }
            }
            "notifications/cancelled" | "$/cancelRequest" => {
                // Requests run to completion one at a time, so there is nothing to abort.
                let cancel = notification
                    .params
                    .and_then(|p| serde_json::from_value::<CancelledParams>(p).ok());
                match cancel {
                    Some(c) => tracing::info!(
                        request_id = %c.request_id,
                        reason = c.reason.as_deref().unwrap_or(""),
                        "Received cancellation notification"
                    ),
                    None => tracing::info!("Received cancellation notification"),
                }
            }
            _ => {
                tracing::debug!("Unknown notification: {}", notification.method);
            }
        }
    }

    async fn handle_initialize(&self, params: Option<Value>) -> McpResult<Value> {
        let init_params: InitializeParams = params
            .map(serde_json::from_value)
            .transpose()
            .map_err(|e| McpError::InvalidParams(e.to_string()))?
            .ok_or_else(|| McpError::InvalidParams("Initialize params required".to_string()))?;

        let mut caps = self.capabilities.lock().await;
        let result = caps.negotiate(init_params)?;

        let session = self.session.lock().await;
        tracing::info!(
            patterns = session.store().count(),
            store = %session.file_path().display(),
            "Serving pattern store"
        );

        serde_json::to_value(result).map_err(|e| McpError::InternalError(e.to_string()))
    }

    async fn handle_shutdown(&self) -> McpResult<Value> {
        tracing::info!("Shutdown requested");
        self.flush().await?;
        Ok(Value::Object(serde_json::Map::new()))
    }

    /// Updates are never pushed, so subscriptions are acknowledged only.
    fn handle_subscription(&self, method: &str, params: Option<Value>) -> McpResult<Value> {
        let sub: ResourceUriParams = params
            .map(serde_json::from_value)
            .transpose()
            .map_err(|e| McpError::InvalidParams(e.to_string()))?
            .ok_or_else(|| McpError::InvalidParams("Resource URI required".to_string()))?;
        if !sub.uri.starts_with("pens://") {
            return Err(McpError::ResourceNotFound(sub.uri));
        }
        tracing::debug!(%method, uri = %sub.uri, "Subscription acknowledged");
        Ok(Value::Object(serde_json::Map::new()))
    }

    async fn handle_tools_list(&self) -> McpResult<Value> {
        Ok(json!({ "tools": ToolRegistry::list_tools() }))
    }

    async fn handle_tools_call(&self, params: Option<Value>) -> McpResult<Value> {
        let call_params: ToolCallParams = params
            .map(serde_json::from_value)
            .transpose()
            .map_err(|e| McpError::InvalidParams(e.to_string()))?
            .ok_or_else(|| McpError::InvalidParams("Tool call params required".to_string()))?;

        let result =
            ToolRegistry::call(&call_params.name, call_params.arguments, &self.session).await?;

        serde_json::to_value(result).map_err(|e| McpError::InternalError(e.to_string()))
    }

    async fn handle_resources_list(&self) -> McpResult<Value> {
        Ok(json!({ "resources": ResourceRegistry::list_resources() }))
    }

    async fn handle_resource_templates_list(&self) -> McpResult<Value> {
        Ok(json!({ "resourceTemplates": ResourceRegistry::list_templates() }))
    }

    async fn handle_resources_read(&self, params: Option<Value>) -> McpResult<Value> {
        let read_params: ResourceUriParams = params
            .map(serde_json::from_value)
            .transpose()
            .map_err(|e| McpError::InvalidParams(e.to_string()))?
            .ok_or_else(|| McpError::InvalidParams("Resource read params required".to_string()))?;

        let result = ResourceRegistry::read(&read_params.uri, &self.session).await?;

        serde_json::to_value(result).map_err(|e| McpError::InternalError(e.to_string()))
    }

    async fn handle_prompts_list(&self) -> McpResult<Value> {
        Ok(json!({ "prompts": PromptRegistry::list_prompts() }))
    }

    async fn handle_prompts_get(&self, params: Option<Value>) -> McpResult<Value> {
        let get_params: PromptGetParams = params
            .map(serde_json::from_value)
            .transpose()
            .map_err(|e| McpError::InvalidParams(e.to_string()))?
            .ok_or_else(|| McpError::InvalidParams("Prompt get params required".to_string()))?;

        let result = PromptRegistry::get(&get_params.name, get_params.arguments).await?;

        serde_json::to_value(result).map_err(|e| McpError::InternalError(e.to_string()))
    }
}
