//! Tool definitions module.
//!
//! This module exports all available tool definitions.
//! Each tool is defined in its own file for better maintainability.

pub mod common;
pub mod compute;
pub mod location;
pub mod model;
pub mod weather;

pub use compute::{
    ContextGeneratorParams, ContextGeneratorTool, RunDefinitionParams, RunDefinitionTool,
    RunMathParams, RunMathTool,
};
pub use location::{LocationToCoordinatesParams, LocationToCoordinatesTool};
pub use model::{ModelInfoParams, ModelInfoTool};
pub use weather::{GetWeatherParams, GetWeatherTool};
