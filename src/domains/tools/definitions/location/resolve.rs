//! Location-to-coordinates tool.
//!
//! Exposes the location resolution pipeline directly: the tool returns the
//! Overpass bounding-box URL for a location without running any Grasshopper
//! definition.

use futures::FutureExt;
use rmcp::{
    ErrorData as McpError,
    handler::server::tool::{ToolCallContext, ToolRoute, cached_schema_for_type},
    model::{CallToolResult, Tool},
};
use schemars::JsonSchema;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{error, info};

use crate::core::config::Config;

use super::super::common::{default_box_size, error_result, success_result};
use super::nominatim::GeocodeClient;
use super::pipeline::resolve_location;

/// Parameters for the location resolution tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct LocationToCoordinatesParams {
    /// Human-readable location name, intersection, or "lat, lon" pair.
    #[schemars(description = "Location name, intersection, or coordinates (e.g. '5th Ave and 23rd St, New York')")]
    pub location: String,

    /// Size of the bounding box in meters.
    #[serde(default = "default_box_size")]
    #[schemars(description = "Size of the bounding box in meters (default: 100)")]
    pub box_size_meters: f64,
}

/// Location resolution tool implementation.
#[derive(Debug, Clone)]
pub struct LocationToCoordinatesTool;

impl LocationToCoordinatesTool {
    /// Tool name as registered in MCP.
    pub const NAME: &'static str = "location_to_coordinates";

    /// Tool description shown to clients.
    pub const DESCRIPTION: &'static str = "Resolve a location name, street intersection, or coordinate pair to \
         an OpenStreetMap Overpass bounding-box URL. Useful to preview the \
         area the context generator would fetch.";

    pub fn new() -> Self {
        Self
    }

    /// Execute the tool logic (for STDIO transport via rmcp).
    pub fn execute(params: &LocationToCoordinatesParams, config: &Config) -> CallToolResult {
        info!("Resolving location: {}", params.location);

        let client = match GeocodeClient::new(&config.geocoding) {
            Ok(client) => client,
            Err(e) => return error_result(&format!("Error: {}", e)),
        };

        match resolve_location(
            &client,
            &config.geocoding.overpass_url,
            &params.location,
            params.box_size_meters,
        ) {
            Ok(url) => success_result(url),
            Err(e) => {
                error!("Location resolution failed: {}", e);
                error_result(&format!("Error: {}", e))
            }
        }
    }

    /// HTTP handler for this tool (for HTTP transport).
    #[cfg(feature = "http")]
    pub fn http_handler(
        arguments: serde_json::Value,
        config: Arc<Config>,
    ) -> Result<serde_json::Value, String> {
        let params: LocationToCoordinatesParams =
            serde_json::from_value(arguments).map_err(|e| format!("Invalid arguments: {}", e))?;

        // Use std::thread::spawn to avoid nested runtime panic.
        // reqwest::blocking creates its own runtime.
        let handle = std::thread::spawn(move || Self::execute(&params, &config));

        let result = handle
            .join()
            .map_err(|_| "Thread panicked during location resolution".to_string())?;

        Ok(serde_json::json!({
            "content": result.content,
            "isError": result.is_error.unwrap_or(false)
        }))
    }

    /// Create a Tool model for this tool (metadata).
    pub fn to_tool() -> Tool {
        Tool {
            name: Self::NAME.into(),
            description: Some(Self::DESCRIPTION.into()),
            input_schema: cached_schema_for_type::<LocationToCoordinatesParams>(),
            annotations: None,
            output_schema: None,
            icons: None,
            meta: None,
            title: None,
        }
    }

    /// Create a ToolRoute for STDIO transport.
    pub fn create_route<S>(config: Arc<Config>) -> ToolRoute<S>
    where
        S: Send + Sync + 'static,
    {
        ToolRoute::new_dyn(Self::to_tool(), move |ctx: ToolCallContext<'_, S>| {
            let args = ctx.arguments.clone().unwrap_or_default();
            let config = config.clone();
            async move {
                let params: LocationToCoordinatesParams =
                    serde_json::from_value(serde_json::Value::Object(args))
                        .map_err(|e| McpError::invalid_params(e.to_string(), None))?;

                // Use std::thread::spawn to avoid nested runtime panic.
                // reqwest::blocking creates its own runtime.
                let handle = std::thread::spawn(move || Self::execute(&params, &config));

                let result = handle
                    .join()
                    .map_err(|_| McpError::internal_error("Thread panicked".to_string(), None))?;

                Ok(result)
            }
            .boxed()
        })
    }
}

impl Default for LocationToCoordinatesTool {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rmcp::model::RawContent;

    fn text_of(result: &CallToolResult) -> String {
        match &result.content[0].raw {
            RawContent::Text(text) => text.text.clone(),
            other => panic!("expected text content, got {:?}", other),
        }
    }

    #[test]
    fn test_params_default_box_size() {
        let json = r#"{"location": "40.7128, -74.0060"}"#;
        let params: LocationToCoordinatesParams = serde_json::from_str(json).unwrap();
        assert_eq!(params.box_size_meters, 100.0);
    }

    #[test]
    fn test_direct_coordinates_resolve_offline() {
        let config = Config::default();
        let params = LocationToCoordinatesParams {
            location: "40.7128, -74.0060".to_string(),
            box_size_meters: 100.0,
        };
        let result = LocationToCoordinatesTool::execute(&params, &config);
        assert_eq!(result.is_error, Some(false));
        assert!(text_of(&result).contains("bbox="));
    }

    // Integration test (requires network)
    #[ignore]
    #[test]
    fn test_named_location_live() {
        let config = Config::from_env();
        let params = LocationToCoordinatesParams {
            location: "Borough Market, London".to_string(),
            box_size_meters: 150.0,
        };
        let result = LocationToCoordinatesTool::execute(&params, &config);
        assert_eq!(result.is_error, Some(false));
    }
}
