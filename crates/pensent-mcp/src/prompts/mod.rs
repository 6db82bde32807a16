//! MCP prompt implementations.

pub mod compare;
pub mod predict;
pub mod registry;

pub use registry::PromptRegistry;
