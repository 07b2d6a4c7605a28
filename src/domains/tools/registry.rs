//! Tool Registry - central registration and dispatch for all tools.
//!
//! This module provides:
//! - A registry of all available tools
//! - HTTP dispatch for tool calls (when http feature is enabled)
//! - Tool metadata for listing

use std::sync::Arc;
#[cfg(feature = "http")]
use tracing::warn;

use rmcp::model::Tool;

use crate::core::config::Config;

use super::definitions::{
    ContextGeneratorTool, GetWeatherTool, LocationToCoordinatesTool, ModelInfoTool,
    RunDefinitionTool, RunMathTool,
};

// ============================================================================
// Tool Registry
// ============================================================================

/// Tool registry - manages all available tools.
///
/// This struct provides a central point for:
/// - Listing all available tools
/// - Dispatching HTTP tool calls (when http feature is enabled)
pub struct ToolRegistry {
    config: Arc<Config>,
}

impl ToolRegistry {
    /// Create a new tool registry.
    pub fn new(config: Arc<Config>) -> Self {
        Self { config }
    }

    /// Get all tool names.
    pub fn tool_names(&self) -> Vec<&'static str> {
        vec![
            GetWeatherTool::NAME,
            RunDefinitionTool::NAME,
            RunMathTool::NAME,
            ContextGeneratorTool::NAME,
            LocationToCoordinatesTool::NAME,
            ModelInfoTool::NAME,
        ]
    }

    /// Get all tools as Tool models (metadata).
    ///
    /// This is the single source of truth for all available tools.
    /// Both HTTP and STDIO transports use this to get tool metadata.
    pub fn get_all_tools() -> Vec<Tool> {
        vec![
            GetWeatherTool::to_tool(),
            RunDefinitionTool::to_tool(),
            RunMathTool::to_tool(),
            ContextGeneratorTool::to_tool(),
            LocationToCoordinatesTool::to_tool(),
            ModelInfoTool::to_tool(),
        ]
    }

    /// Dispatch an HTTP tool call to the appropriate handler.
    ///
    /// This is used by the HTTP transport to call tools.
    #[cfg(feature = "http")]
    pub fn call_tool(
        &self,
        name: &str,
        arguments: serde_json::Value,
    ) -> Result<serde_json::Value, String> {
        match name {
            GetWeatherTool::NAME => GetWeatherTool::http_handler(arguments, self.config.clone()),
            RunDefinitionTool::NAME => {
                RunDefinitionTool::http_handler(arguments, self.config.clone())
            }
            RunMathTool::NAME => RunMathTool::http_handler(arguments, self.config.clone()),
            ContextGeneratorTool::NAME => {
                ContextGeneratorTool::http_handler(arguments, self.config.clone())
            }
            LocationToCoordinatesTool::NAME => {
                LocationToCoordinatesTool::http_handler(arguments, self.config.clone())
            }
            ModelInfoTool::NAME => ModelInfoTool::http_handler(arguments, self.config.clone()),
            _ => {
                warn!("Unknown tool requested: {}", name);
                Err(format!("Unknown tool: {}", name))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> Arc<Config> {
        Arc::new(Config::default())
    }

    #[test]
    fn test_registry_tool_names() {
        let registry = ToolRegistry::new(test_config());
        let names = registry.tool_names();
        assert_eq!(names.len(), 6);
        assert!(names.contains(&"get_weather"));
        assert!(names.contains(&"run_grasshopper_definition"));
        assert!(names.contains(&"run_grasshopper_math"));
        assert!(names.contains(&"run_context_generator"));
        assert!(names.contains(&"location_to_coordinates"));
        assert!(names.contains(&"read_model_info"));
    }

    #[test]
    fn test_get_all_tools_matches_names() {
        let registry = ToolRegistry::new(test_config());
        let tools = ToolRegistry::get_all_tools();
        assert_eq!(tools.len(), registry.tool_names().len());
    }

    #[cfg(feature = "http")]
    #[test]
    fn test_registry_call_weather() {
        // Without an API key the weather tool returns mock data offline.
        let registry = ToolRegistry::new(test_config());
        let result = registry.call_tool("get_weather", serde_json::json!({ "city": "Boston" }));
        assert!(result.is_ok());
    }

    #[cfg(feature = "http")]
    #[test]
    fn test_registry_call_unknown() {
        let registry = ToolRegistry::new(test_config());
        let result = registry.call_tool("unknown", serde_json::json!({}));
        assert!(result.is_err());
    }
}
