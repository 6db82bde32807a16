//! Session management for the pattern store.

pub mod manager;

pub use manager::PatternSessionManager;
