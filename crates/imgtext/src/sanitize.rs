//! Helpers for sanitizing data before it enters logs or tracing spans.
//!
//! File paths and remote error bodies can carry user data; these functions
//! keep span attributes and log lines free of it.

use std::path::Path;

/// Maximum length for remote error bodies copied into messages.
pub const MAX_ERROR_BODY_LENGTH: usize = 200;

/// Returns only the filename component of a path (no directory).
pub fn redact_path(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("<unknown>")
        .to_string()
}

/// Truncates a response body to `MAX_ERROR_BODY_LENGTH` characters.
pub fn truncate_body(body: &str) -> String {
    let trimmed = body.trim();
    match trimmed.char_indices().nth(MAX_ERROR_BODY_LENGTH) {
        Some((cut, _)) => format!("{}... (truncated)", &trimmed[..cut]),
        None => trimmed.to_string(),
    }
}
