//! En Pensent MCP server: pattern recording, matching, and outcome prediction
//! for LLM clients.

pub mod config;
pub mod prompts;
pub mod protocol;
pub mod repl;
pub mod resources;
pub mod session;
pub mod tools;
pub mod transport;
pub mod types;

pub use config::resolve_store_path;
pub use protocol::ProtocolHandler;
pub use session::PatternSessionManager;
pub use transport::StdioTransport;
