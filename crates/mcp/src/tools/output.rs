// Shared result rendering and call deadline for the registry tools

use crate::protocol::CallToolResult;
use serde::Serialize;
use std::future::Future;
use std::time::Duration;

/// Deadline for one tool's registry work, independent of any caller deadline.
pub const CALL_TIMEOUT: Duration = Duration::from_secs(30);

/// Run a registry call under [`CALL_TIMEOUT`], flattening the error to text.
pub(crate) async fn with_deadline<T, F>(fut: F) -> Result<T, String>
where
    F: Future<Output = ocireg_core::Result<T>>,
{
    match tokio::time::timeout(CALL_TIMEOUT, fut).await {
        Ok(result) => result.map_err(|e| {
            tracing::warn!(kind = e.kind(), "Registry call failed: {}", e);
            e.to_string()
        }),
        Err(_) => {
            tracing::warn!(kind = "timeout", "Registry call exceeded {:?}", CALL_TIMEOUT);
            Err(format!("timed out after {}s", CALL_TIMEOUT.as_secs()))
        }
    }
}

/// `"<kind> for <subject>:"` followed by the value as a fenced JSON block.
pub(crate) fn json_block(kind: &str, subject: &str, value: &impl Serialize) -> CallToolResult {
    match serde_json::to_string_pretty(value) {
        Ok(json) => CallToolResult::text(format!(
            "{} for {}:\n\n```json\n{}\n```",
            kind, subject, json
        )),
        Err(e) => failure("failed to marshal result", e),
    }
}

/// Error result carrying a short label and the underlying message.
pub(crate) fn failure(label: &str, err: impl std::fmt::Display) -> CallToolResult {
    CallToolResult::error(format!("{}: {}", label, err))
}
