//! Common helpers shared across tool definitions.

use rmcp::model::{CallToolResult, Content};
use serde::Serialize;
use tracing::warn;

/// Create an error result with a formatted message.
pub fn error_result(message: &str) -> CallToolResult {
    warn!("{}", message);
    CallToolResult::error(vec![Content::text(message.to_string())])
}

/// Create a success result with text content.
pub fn success_result(content: String) -> CallToolResult {
    CallToolResult::success(vec![Content::text(content)])
}

/// Create a success result carrying both a summary and structured content.
pub fn structured_result<T: Serialize>(summary: String, data: T) -> CallToolResult {
    let mut result = CallToolResult::success(vec![Content::text(summary)]);
    result.structured_content = serde_json::to_value(data).ok();
    result
}

/// Default bounding-box size in meters for location tools.
pub fn default_box_size() -> f64 {
    100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_result_flag() {
        let result = error_result("boom");
        assert_eq!(result.is_error, Some(true));
    }

    #[test]
    fn test_structured_result_carries_content() {
        let result = structured_result(
            "ok".to_string(),
            serde_json::json!({"answer": 42}),
        );
        assert_eq!(result.is_error, Some(false));
        let structured = result.structured_content.unwrap();
        assert_eq!(structured["answer"], 42);
    }
}
