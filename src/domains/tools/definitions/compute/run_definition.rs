//! Generic Grasshopper definition runner.
//!
//! Encodes caller-supplied named scalar parameters into data trees,
//! evaluates an arbitrary definition on the compute server, and returns
//! the raw response.

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

use super::super::common::{error_result, success_result};
use super::client::ComputeClient;
use super::tree::{ParamValue, encode_parameters};

/// One named input parameter for a Grasshopper definition.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct NamedParameter {
    /// Name of the parameter in the Grasshopper definition.
    #[schemars(description = "Parameter name in the definition")]
    pub name: String,

    /// Scalar value: string, boolean, integer, or real number.
    #[schemars(description = "Scalar value (string, boolean, integer, or real)")]
    pub value: ParamValue,
}

/// Parameters for running a Grasshopper definition.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct RunDefinitionParams {
    /// Path to the Grasshopper definition file (.gh) on the compute server.
    #[schemars(description = "Path to the Grasshopper definition file (.gh)")]
    pub definition_path: String,

    /// Ordered input parameters.
    #[serde(default)]
    #[schemars(description = "Named scalar input parameters, in order")]
    pub parameters: Vec<NamedParameter>,
}

/// Grasshopper definition runner tool implementation.
#[derive(Debug, Clone)]
pub struct RunDefinitionTool;

impl RunDefinitionTool {
    /// Tool name as registered in MCP.
    pub const NAME: &'static str = "run_grasshopper_definition";

    /// Tool description shown to clients.
    pub const DESCRIPTION: &'static str = "Run a Grasshopper definition via Rhino.Compute with named scalar \
         parameters. Parameter types (string, boolean, integer, real) are \
         inferred and whole reals are normalized to integers. Returns the \
         raw evaluation result as JSON.";

    pub fn new() -> Self {
        Self
    }

    /// Execute the tool logic (for STDIO transport via rmcp).
    pub fn execute(params: &RunDefinitionParams, config: &Config) -> CallToolResult {
        info!(
            "Running definition {} with {} parameter(s)",
            params.definition_path,
            params.parameters.len()
        );

        let client = match ComputeClient::new(&config.compute) {
            Ok(client) => client,
            Err(e) => return error_result(&format!("Error: {}", e)),
        };

        let pairs: Vec<(String, ParamValue)> = params
            .parameters
            .iter()
            .map(|p| (p.name.clone(), p.value.clone()))
            .collect();
        let values = encode_parameters(&pairs);

        match client.evaluate(&params.definition_path, &values) {
            Ok(response) => {
                let json = serde_json::to_string_pretty(&response)
                    .unwrap_or_else(|_| "{}".to_string());
                success_result(format!(
                    "Grasshopper definition executed successfully. Result: {}",
                    json
                ))
            }
            Err(e) => {
                error!("Definition evaluation failed: {}", e);
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
        let params: RunDefinitionParams =
            serde_json::from_value(arguments).map_err(|e| format!("Invalid arguments: {}", e))?;

        // Use std::thread::spawn to avoid nested runtime panic.
        // reqwest::blocking creates its own runtime.
        let handle = std::thread::spawn(move || Self::execute(&params, &config));

        let result = handle
            .join()
            .map_err(|_| "Thread panicked during definition evaluation".to_string())?;

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
            input_schema: cached_schema_for_type::<RunDefinitionParams>(),
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
                let params: RunDefinitionParams =
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

impl Default for RunDefinitionTool {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_params_deserialization() {
        let json = r#"{
            "definition_path": "definitions/twisty.gh",
            "parameters": [
                {"name": "RH_IN:rotate", "value": 20},
                {"name": "RH_IN:label", "value": "test"},
                {"name": "RH_IN:enabled", "value": true}
            ]
        }"#;
        let params: RunDefinitionParams = serde_json::from_str(json).unwrap();
        assert_eq!(params.parameters.len(), 3);
        assert_eq!(params.parameters[0].value, ParamValue::Int(20));
        assert_eq!(
            params.parameters[1].value,
            ParamValue::Str("test".to_string())
        );
        assert_eq!(params.parameters[2].value, ParamValue::Bool(true));
    }

    #[test]
    fn test_params_default_empty_parameters() {
        let json = r#"{"definition_path": "definitions/plain.gh"}"#;
        let params: RunDefinitionParams = serde_json::from_str(json).unwrap();
        assert!(params.parameters.is_empty());
    }
}
