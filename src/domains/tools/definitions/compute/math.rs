//! Simplified two-input Grasshopper math tool.
//!
//! Runs the configured math definition with two numeric parameters named
//! `a` and `b` and reports the first decoded output value.

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
use super::tree::{DEFAULT_OUTPUT_BRANCH, ParamValue, decode_branch, encode_parameters};

/// Parameters for the math definition.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct RunMathParams {
    /// First numeric parameter (definition input 'a').
    #[schemars(description = "First numeric parameter (input 'a')")]
    pub param_a: i64,

    /// Second numeric parameter (definition input 'b').
    #[schemars(description = "Second numeric parameter (input 'b')")]
    pub param_b: i64,
}

/// Grasshopper math tool implementation.
#[derive(Debug, Clone)]
pub struct RunMathTool;

impl RunMathTool {
    /// Tool name as registered in MCP.
    pub const NAME: &'static str = "run_grasshopper_math";

    /// Tool description shown to clients.
    pub const DESCRIPTION: &'static str = "Run the configured Grasshopper math definition with two numeric \
         parameters 'a' and 'b' and return the computed result.";

    pub fn new() -> Self {
        Self
    }

    /// Execute the tool logic (for STDIO transport via rmcp).
    pub fn execute(params: &RunMathParams, config: &Config) -> CallToolResult {
        info!(
            "Running math definition with a={}, b={}",
            params.param_a, params.param_b
        );

        let client = match ComputeClient::new(&config.compute) {
            Ok(client) => client,
            Err(e) => return error_result(&format!("Error: {}", e)),
        };

        let values = encode_parameters(&[
            ("a".to_string(), ParamValue::Int(params.param_a)),
            ("b".to_string(), ParamValue::Int(params.param_b)),
        ]);

        let definition = config.compute.math_definition();
        let response = match client.evaluate(&definition.to_string_lossy(), &values) {
            Ok(response) => response,
            Err(e) => {
                error!("Math evaluation failed: {}", e);
                return error_result(&format!("Error: {}", e));
            }
        };

        match decode_branch(&response, DEFAULT_OUTPUT_BRANCH) {
            Ok(decoded) => success_result(format!(
                "Grasshopper definition executed successfully. Result: {}",
                decoded[0]
            )),
            Err(e) => error_result(&format!("Error: {}", e)),
        }
    }

    /// HTTP handler for this tool (for HTTP transport).
    #[cfg(feature = "http")]
    pub fn http_handler(
        arguments: serde_json::Value,
        config: Arc<Config>,
    ) -> Result<serde_json::Value, String> {
        let params: RunMathParams =
            serde_json::from_value(arguments).map_err(|e| format!("Invalid arguments: {}", e))?;

        // Use std::thread::spawn to avoid nested runtime panic.
        // reqwest::blocking creates its own runtime.
        let handle = std::thread::spawn(move || Self::execute(&params, &config));

        let result = handle
            .join()
            .map_err(|_| "Thread panicked during math evaluation".to_string())?;

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
            input_schema: cached_schema_for_type::<RunMathParams>(),
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
                let params: RunMathParams =
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

impl Default for RunMathTool {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_params_deserialization() {
        let json = r#"{"param_a": 2, "param_b": 3}"#;
        let params: RunMathParams = serde_json::from_str(json).unwrap();
        assert_eq!(params.param_a, 2);
        assert_eq!(params.param_b, 3);
    }

    // Integration test (requires a running Rhino.Compute server)
    #[ignore]
    #[test]
    fn test_math_live() {
        let config = Config::from_env();
        let params = RunMathParams {
            param_a: 2,
            param_b: 3,
        };
        let result = RunMathTool::execute(&params, &config);
        assert_eq!(result.is_error, Some(false));
    }
}
