//! Weather tools.

pub mod current;

pub use current::{GetWeatherParams, GetWeatherTool};
