//! Model inspection tool.
//!
//! Reads a saved model file and reports how many objects of each geometry
//! kind it contains.

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

use super::super::common::{error_result, structured_result};
use super::geometry::GeometryKind;
use super::writer::read_model;

/// Parameters for the model inspection tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ModelInfoParams {
    /// Path to a saved model file.
    #[schemars(description = "Path to a saved model file")]
    pub path: String,
}

/// Structured output: object counts per geometry kind.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ModelInfoResult {
    pub path: String,
    pub total_objects: usize,
    pub curves: usize,
    pub points: usize,
    pub surfaces: usize,
    pub meshes: usize,
    pub breps: usize,
}

/// Model inspection tool implementation.
#[derive(Debug, Clone)]
pub struct ModelInfoTool;

impl ModelInfoTool {
    /// Tool name as registered in MCP.
    pub const NAME: &'static str = "read_model_info";

    /// Tool description shown to clients.
    pub const DESCRIPTION: &'static str = "Read a JSON model file written by this server's model writer and \
         report the number of objects it contains, broken down by geometry \
         kind (curves, points, surfaces, meshes, breps). Binary .3dm files \
         (such as the context generator's output) are not supported.";

    pub fn new() -> Self {
        Self
    }

    /// Execute the tool logic (for STDIO transport via rmcp).
    pub fn execute(params: &ModelInfoParams, _config: &Config) -> CallToolResult {
        info!("Reading model info from {}", params.path);

        let model = match read_model(&params.path) {
            Ok(model) => model,
            Err(e) => {
                error!("Failed to read model: {}", e);
                return error_result(&format!("Error: Failed to read model file: {}", e));
            }
        };

        let counts = model.counts();
        let count_of = |kind: GeometryKind| counts.get(&kind).copied().unwrap_or(0);

        let result = ModelInfoResult {
            path: params.path.clone(),
            total_objects: model.len(),
            curves: count_of(GeometryKind::Curve),
            points: count_of(GeometryKind::Point),
            surfaces: count_of(GeometryKind::Surface),
            meshes: count_of(GeometryKind::Mesh),
            breps: count_of(GeometryKind::Brep),
        };

        let summary = format!(
            "Model '{}' contains {} object(s): {} curve(s), {} point(s), \
             {} surface(s), {} mesh(es), {} brep(s)",
            result.path,
            result.total_objects,
            result.curves,
            result.points,
            result.surfaces,
            result.meshes,
            result.breps
        );

        structured_result(summary, result)
    }

    /// HTTP handler for this tool (for HTTP transport).
    #[cfg(feature = "http")]
    pub fn http_handler(
        arguments: serde_json::Value,
        config: Arc<Config>,
    ) -> Result<serde_json::Value, String> {
        let params: ModelInfoParams =
            serde_json::from_value(arguments).map_err(|e| format!("Invalid arguments: {}", e))?;

        let result = Self::execute(&params, &config);

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
            input_schema: cached_schema_for_type::<ModelInfoParams>(),
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
                let params: ModelInfoParams =
                    serde_json::from_value(serde_json::Value::Object(args))
                        .map_err(|e| McpError::invalid_params(e.to_string(), None))?;

                let result = Self::execute(&params, &config);
                Ok(result)
            }
            .boxed()
        })
    }
}

impl Default for ModelInfoTool {
    fn default() -> Self {
        Self::new()
    }
}
