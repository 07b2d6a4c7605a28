//! Current-weather lookup tool.
//!
//! Fetches current conditions from OpenWeatherMap for a city/country pair.
//! Without an API key the tool returns mock data so the server stays usable
//! in demos and tests.

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

/// Parameters for the weather lookup.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct GetWeatherParams {
    /// Name of the city.
    #[schemars(description = "Name of the city")]
    pub city: String,

    /// Country name or country code.
    #[serde(default = "default_country")]
    #[schemars(description = "Country name or country code (default: US)")]
    pub country: String,
}

fn default_country() -> String {
    "US".to_string()
}

/// Subset of the OpenWeatherMap response this tool reads.
#[derive(Debug, Deserialize)]
struct WeatherResponse {
    main: WeatherMain,
    weather: Vec<WeatherCondition>,
}

#[derive(Debug, Deserialize)]
struct WeatherMain {
    temp: f64,
    feels_like: f64,
    humidity: f64,
}

#[derive(Debug, Deserialize)]
struct WeatherCondition {
    description: String,
}

/// Weather lookup tool implementation.
#[derive(Debug, Clone)]
pub struct GetWeatherTool;

impl GetWeatherTool {
    /// Tool name as registered in MCP.
    pub const NAME: &'static str = "get_weather";

    /// Tool description shown to clients.
    pub const DESCRIPTION: &'static str = "Get current weather information for a specified city and country. \
         Returns temperature, conditions, and humidity. Without an OpenWeatherMap \
         API key configured, mock data is returned.";

    pub fn new() -> Self {
        Self
    }

    /// Execute the tool logic (for STDIO transport via rmcp).
    pub fn execute(params: &GetWeatherParams, config: &Config) -> CallToolResult {
        info!("Weather lookup for {}, {}", params.city, params.country);

        let Some(api_key) = config.weather.api_key.as_deref() else {
            return success_result(format!(
                "Mock Weather Data for {}, {}: Temperature: 22°C, Conditions: \
                 Partly Cloudy, Humidity: 65%. (Note: Set MCP_OPENWEATHER_API_KEY \
                 environment variable for real data)",
                params.city, params.country
            ));
        };

        let http = match reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(config.weather.timeout_secs))
            .build()
        {
            Ok(client) => client,
            Err(e) => return error_result(&format!("Error: {}", e)),
        };

        let response = http
            .get(&config.weather.base_url)
            .query(&[
                ("q", format!("{},{}", params.city, params.country).as_str()),
                ("appid", api_key),
                ("units", "metric"),
            ])
            .send();

        let response = match response {
            Ok(r) => r,
            Err(e) if e.is_timeout() => {
                return error_result("Error: Weather API request timed out");
            }
            Err(e) => {
                error!("Weather request failed: {:?}", e);
                return error_result(&format!(
                    "Error: Network error when fetching weather data: {}",
                    e
                ));
            }
        };

        match response.status().as_u16() {
            200 => match response.json::<WeatherResponse>() {
                Ok(data) => {
                    let description = data
                        .weather
                        .first()
                        .map(|c| title_case(&c.description))
                        .unwrap_or_else(|| "Unknown".to_string());
                    success_result(format!(
                        "Weather in {}, {}: {}°C (feels like {}°C), {}, Humidity: {}%",
                        params.city,
                        params.country,
                        data.main.temp,
                        data.main.feels_like,
                        description,
                        data.main.humidity
                    ))
                }
                Err(e) => error_result(&format!("Error: {}", e)),
            },
            404 => error_result(&format!(
                "Error: City '{}' in '{}' not found",
                params.city, params.country
            )),
            status => error_result(&format!(
                "Error: Unable to fetch weather data (HTTP {})",
                status
            )),
        }
    }

    /// HTTP handler for this tool (for HTTP transport).
    #[cfg(feature = "http")]
    pub fn http_handler(
        arguments: serde_json::Value,
        config: Arc<Config>,
    ) -> Result<serde_json::Value, String> {
        let params: GetWeatherParams =
            serde_json::from_value(arguments).map_err(|e| format!("Invalid arguments: {}", e))?;

        // Use std::thread::spawn to avoid nested runtime panic.
        // reqwest::blocking creates its own runtime.
        let handle = std::thread::spawn(move || Self::execute(&params, &config));

        let result = handle
            .join()
            .map_err(|_| "Thread panicked during weather lookup".to_string())?;

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
            input_schema: cached_schema_for_type::<GetWeatherParams>(),
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
                let params: GetWeatherParams =
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

impl Default for GetWeatherTool {
    fn default() -> Self {
        Self::new()
    }
}

/// Capitalize the first letter of each word, e.g. "broken clouds" ->
/// "Broken Clouds".
fn title_case(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
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
    fn test_params_default_country() {
        let json = r#"{"city": "Boston"}"#;
        let params: GetWeatherParams = serde_json::from_str(json).unwrap();
        assert_eq!(params.country, "US");
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("broken clouds"), "Broken Clouds");
        assert_eq!(title_case("rain"), "Rain");
        assert_eq!(title_case(""), "");
    }

    #[test]
    fn test_mock_data_without_api_key() {
        let config = Config::default();
        assert!(config.weather.api_key.is_none());

        let params = GetWeatherParams {
            city: "London".to_string(),
            country: "GB".to_string(),
        };
        let result = GetWeatherTool::execute(&params, &config);
        assert_eq!(result.is_error, Some(false));
        let text = text_of(&result);
        assert!(text.contains("Mock Weather Data for London, GB"));
    }

    // Integration test (requires network and MCP_OPENWEATHER_API_KEY)
    #[ignore]
    #[test]
    fn test_live_weather() {
        let config = Config::from_env();
        let params = GetWeatherParams {
            city: "London".to_string(),
            country: "GB".to_string(),
        };
        let result = GetWeatherTool::execute(&params, &config);
        assert_eq!(result.is_error, Some(false));
        assert!(text_of(&result).contains("Weather in London"));
    }
}
