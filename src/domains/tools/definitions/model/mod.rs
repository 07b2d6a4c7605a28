//! Model tools: geometry classification, the model writer, and the model
//! inspection tool.

pub mod geometry;
pub mod info;
pub mod writer;

pub use geometry::{Geometry, GeometryKind};
pub use info::{ModelInfoParams, ModelInfoTool};
pub use writer::{ModelError, ModelWriter, read_model, save_model};
