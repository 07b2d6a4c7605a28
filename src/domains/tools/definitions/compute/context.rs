//! Context generator tool.
//!
//! Resolves a location to an Overpass bounding-box URL, feeds it to the
//! context generator Grasshopper definition, and writes the returned 3dm
//! model to the configured output directory.

use base64::Engine;
use futures::FutureExt;
use rmcp::{
    ErrorData as McpError,
    handler::server::tool::{ToolCallContext, ToolRoute, cached_schema_for_type},
    model::{CallToolResult, Tool},
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};

use crate::core::config::Config;

use super::super::common::{default_box_size, error_result, structured_result};
use super::super::location::{GeocodeClient, resolve_location};
use super::client::ComputeClient;
use super::tree::{DecodedValue, EvaluateResponse, ParamValue, decode_output, encode_parameter};

/// Output parameter carrying the generated model in the definition.
const MODEL_OUTPUT_PARAM: &str = "RH_OUT:context_model_3dm";

/// Branch path where the definition places the model payload.
const MODEL_OUTPUT_BRANCH: &str = "{0;0;0}";

/// Filename for the generated model.
const MODEL_FILENAME: &str = "context_model.3dm";

/// Parameters for the context generator.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ContextGeneratorParams {
    /// Human-readable location name, intersection, or "lat, lon" pair.
    #[schemars(description = "Location name, intersection, or coordinates (e.g. 'Borough Market, London')")]
    pub location: String,

    /// Size of the bounding box in meters.
    #[serde(default = "default_box_size")]
    #[schemars(description = "Size of the bounding box in meters (default: 100)")]
    pub box_size_meters: f64,
}

/// Structured output for the context generator.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ContextGeneratorResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub download_path: Option<String>,
    pub location: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ContextGeneratorResult {
    fn failure(location: &str, error: impl Into<String>) -> Self {
        Self {
            success: false,
            download_path: None,
            location: location.to_string(),
            error: Some(error.into()),
        }
    }
}

/// Context generator tool implementation.
#[derive(Debug, Clone)]
pub struct ContextGeneratorTool;

impl ContextGeneratorTool {
    /// Tool name as registered in MCP.
    pub const NAME: &'static str = "run_context_generator";

    /// Tool description shown to clients.
    pub const DESCRIPTION: &'static str = "Generate a 3D context model for a location. Resolves the location to \
         a bounding box, runs the context generator Grasshopper definition \
         via Rhino.Compute, and saves the resulting .3dm model to the output \
         directory.";

    pub fn new() -> Self {
        Self
    }

    /// Execute the tool logic (for STDIO transport via rmcp).
    ///
    /// Every failure path produces a structured `{success: false, error}`
    /// result rather than an error propagating to the caller.
    pub fn execute(params: &ContextGeneratorParams, config: &Config) -> CallToolResult {
        info!("Starting context generator for location: {}", params.location);

        let geocoder = match GeocodeClient::new(&config.geocoding) {
            Ok(client) => client,
            Err(e) => return Self::failure_result(&params.location, format!("Error: {}", e)),
        };

        let overpass_url = match resolve_location(
            &geocoder,
            &config.geocoding.overpass_url,
            &params.location,
            params.box_size_meters,
        ) {
            Ok(url) => url,
            Err(e) => return Self::failure_result(&params.location, format!("Error: {}", e)),
        };

        let client = match ComputeClient::new(&config.compute) {
            Ok(client) => client,
            Err(e) => return Self::failure_result(&params.location, format!("Error: {}", e)),
        };

        let values = vec![encode_parameter(
            "osmURL",
            &ParamValue::Str(overpass_url),
        )];

        let definition = config.compute.context_definition();
        let response = match client.evaluate(&definition.to_string_lossy(), &values) {
            Ok(response) => response,
            Err(e) => {
                error!("Context evaluation failed: {}", e);
                return Self::failure_result(&params.location, format!("Error: {}", e));
            }
        };

        let bytes = match extract_model_bytes(&response) {
            Ok(bytes) => bytes,
            Err(e) => {
                return Self::failure_result(
                    &params.location,
                    format!("Error processing response data: {}", e),
                );
            }
        };

        let file_path = config.output.dir.join(MODEL_FILENAME);
        if let Err(e) = std::fs::write(&file_path, &bytes) {
            return Self::failure_result(
                &params.location,
                format!("Error: Failed to write model file: {}", e),
            );
        }

        info!("Saved model to: {}", file_path.display());

        let result = ContextGeneratorResult {
            success: true,
            download_path: Some(config.output.dir.display().to_string()),
            location: params.location.clone(),
            error: None,
        };
        structured_result(
            format!("Context model saved to {}", file_path.display()),
            result,
        )
    }

    fn failure_result(location: &str, error: String) -> CallToolResult {
        error!("{}", error);
        let mut result = error_result(&error);
        result.structured_content =
            serde_json::to_value(ContextGeneratorResult::failure(location, error)).ok();
        result
    }

    /// HTTP handler for this tool (for HTTP transport).
    #[cfg(feature = "http")]
    pub fn http_handler(
        arguments: serde_json::Value,
        config: Arc<Config>,
    ) -> Result<serde_json::Value, String> {
        let params: ContextGeneratorParams =
            serde_json::from_value(arguments).map_err(|e| format!("Invalid arguments: {}", e))?;

        // Use std::thread::spawn to avoid nested runtime panic.
        // reqwest::blocking creates its own runtime.
        let handle = std::thread::spawn(move || Self::execute(&params, &config));

        let result = handle
            .join()
            .map_err(|_| "Thread panicked during context generation".to_string())?;

        let mut response = serde_json::json!({
            "content": result.content,
            "isError": result.is_error.unwrap_or(false)
        });

        // Include structured_content if present
        if let Some(structured) = result.structured_content {
            response
                .as_object_mut()
                .unwrap()
                .insert("structuredContent".to_string(), structured);
        }

        Ok(response)
    }

    /// Create a Tool model for this tool (metadata).
    pub fn to_tool() -> Tool {
        Tool {
            name: Self::NAME.into(),
            description: Some(Self::DESCRIPTION.into()),
            input_schema: cached_schema_for_type::<ContextGeneratorParams>(),
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
                let params: ContextGeneratorParams =
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

impl Default for ContextGeneratorTool {
    fn default() -> Self {
        Self::new()
    }
}

/// Pull the base64-encoded model payload out of the evaluation response.
fn extract_model_bytes(response: &EvaluateResponse) -> Result<Vec<u8>, String> {
    let decoded = decode_output(response, MODEL_OUTPUT_PARAM, MODEL_OUTPUT_BRANCH)
        .map_err(|e| e.to_string())?;

    // decode_output rejects empty branches, so the first leaf exists.
    let encoded = match &decoded[0] {
        DecodedValue::Text(text) => text.as_str(),
        other => return Err(format!("Model payload is not a string: {}", other)),
    };

    base64::engine::general_purpose::STANDARD
        .decode(encoded)
        .map_err(|e| format!("Invalid base64 model payload: {}", e))
}
