//! Rhino.Compute tools: HTTP client, data-tree codec, and the Grasshopper
//! evaluation tools built on them.

pub mod client;
pub mod context;
pub mod math;
pub mod run_definition;
pub mod tree;

pub use client::{ComputeClient, ComputeError};
pub use context::{ContextGeneratorParams, ContextGeneratorTool};
pub use math::{RunMathParams, RunMathTool};
pub use run_definition::{NamedParameter, RunDefinitionParams, RunDefinitionTool};
pub use tree::{
    DEFAULT_OUTPUT_BRANCH, DataTree, DecodedValue, EvaluateResponse, ParamValue, TreeItem,
    decode_branch, decode_output, encode_parameter, encode_parameters, find_output,
};
