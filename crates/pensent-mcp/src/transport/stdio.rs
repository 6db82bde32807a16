//! Stdio transport: JSON-RPC in on stdin, out on stdout.

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use crate::protocol::ProtocolHandler;
use crate::types::{McpError, McpResult};

use super::framing;

/// Stdio transport for desktop MCP clients.
pub struct StdioTransport {
    handler: ProtocolHandler,
}

impl StdioTransport {
    pub fn new(handler: ProtocolHandler) -> Self {
        Self { handler }
    }

    /// Run until stdin closes, then flush the store.
    pub async fn run(&self) -> McpResult<()> {
        let stdin = tokio::io::stdin();
        let mut stdout = tokio::io::stdout();
        let mut reader = BufReader::new(stdin);
        let mut line = String::new();

        tracing::info!("Stdio transport started");

        loop {
            line.clear();
            let bytes_read = reader.read_line(&mut line).await.map_err(McpError::Io)?;

            if bytes_read == 0 {
                tracing::info!("EOF on stdin, shutting down");
                break;
            }

            if let Some(response) = self.handler.handle_line(&line).await {
                let framed = framing::frame_message(&response)?;
                stdout
                    .write_all(framed.as_bytes())
                    .await
                    .map_err(McpError::Io)?;
                stdout.flush().await.map_err(McpError::Io)?;
            }
        }

        self.handler.flush().await
    }
}
