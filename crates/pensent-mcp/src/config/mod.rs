//! Configuration loading and resolution.

use std::path::PathBuf;

/// Environment variable naming the pattern file.
pub const STORE_ENV_VAR: &str = "PENS_FILE";

/// Resolve the pattern file path.
///
/// Order: explicit flag, `PENS_FILE`, `./.pensent/patterns.pens` if it exists,
/// then `~/.pensent/patterns.pens`.
pub fn resolve_store_path(explicit: Option<&str>) -> String {
    if let Some(path) = explicit {
        return path.to_string();
    }

    if let Ok(env_path) = std::env::var(STORE_ENV_VAR) {
        if !env_path.trim().is_empty() {
            return env_path;
        }
    }

    let cwd_store = PathBuf::from(".pensent/patterns.pens");
    if cwd_store.exists() {
        return cwd_store.display().to_string();
    }

    resolve_default_store_path()
}

fn resolve_default_store_path() -> String {
    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .unwrap_or_else(|_| ".".to_string());

    format!("{home}/.pensent/patterns.pens")
}
