//! Configuration management for the MCP server.
//!
//! This module provides a centralized configuration structure that can be
//! populated from environment variables, configuration files, or defaults.

use super::transport::TransportConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{info, warn};

/// Main configuration structure for the MCP server.
///
/// This struct contains all configurable aspects of the server, organized
/// by domain for clarity and maintainability.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server identification and metadata.
    pub server: ServerConfig,

    /// Logging configuration.
    pub logging: LoggingConfig,

    /// Transport configuration.
    pub transport: TransportConfig,

    /// Rhino.Compute evaluation service configuration.
    pub compute: ComputeConfig,

    /// Geocoding service configuration.
    pub geocoding: GeocodingConfig,

    /// Weather service configuration.
    pub weather: WeatherConfig,

    /// Output locations for generated model files.
    pub output: OutputConfig,
}

/// Server identification configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// The name of the server as reported to clients.
    pub name: String,

    /// The version of the server.
    pub version: String,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "trace").
    pub level: String,

    /// Whether to include timestamps in log output.
    pub with_timestamps: bool,
}

/// Configuration for the Rhino.Compute evaluation service.
///
/// The base URL is threaded through the `ComputeClient` constructor so
/// that no process-wide mutable state is involved.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputeConfig {
    /// Base URL of the Rhino.Compute server.
    pub base_url: String,

    /// Request timeout in seconds. Grasshopper evaluations can be slow.
    pub timeout_secs: u64,

    /// Directory containing Grasshopper definition files (.gh).
    pub definitions_dir: PathBuf,
}

impl ComputeConfig {
    /// Path to the two-input math definition used by `run_grasshopper_math`.
    pub fn math_definition(&self) -> PathBuf {
        self.definitions_dir.join("add.gh")
    }

    /// Path to the definition used by `run_context_generator`.
    pub fn context_definition(&self) -> PathBuf {
        self.definitions_dir.join("context_generator.gh")
    }
}

/// Configuration for the Nominatim geocoding service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeocodingConfig {
    /// Base URL of the Nominatim-compatible geocoding API.
    pub base_url: String,

    /// Identifying User-Agent, required by the Nominatim usage policy.
    pub user_agent: String,

    /// Request timeout in seconds.
    pub timeout_secs: u64,

    /// Base URL of the Overpass map endpoint used for bounding-box queries.
    pub overpass_url: String,
}

/// Configuration for the OpenWeatherMap service.
#[derive(Clone, Serialize, Deserialize)]
pub struct WeatherConfig {
    /// OpenWeatherMap API key. When absent, the weather tool returns
    /// mock data instead of calling the API.
    pub api_key: Option<String>,

    /// Base URL of the current-weather endpoint.
    pub base_url: String,

    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

/// Custom Debug implementation to redact secrets from logs.
impl std::fmt::Debug for WeatherConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeatherConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("base_url", &self.base_url)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// Output locations for generated geometry files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Directory where generated .3dm files are written.
    /// Writers are not coordinated; last writer wins on a path collision.
    pub dir: PathBuf,
}

impl Default for ComputeConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:6001".to_string(),
            timeout_secs: 600,
            definitions_dir: PathBuf::from("definitions"),
        }
    }
}

impl Default for GeocodingConfig {
    fn default() -> Self {
        Self {
            base_url: "https://nominatim.openstreetmap.org".to_string(),
            user_agent: "MCP-Tool/1.0".to_string(),
            timeout_secs: 30,
            overpass_url: "https://overpass-api.de/api/map".to_string(),
        }
    }
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "http://api.openweathermap.org/data/2.5/weather".to_string(),
            timeout_secs: 30,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        // Generated models go to the user's Downloads folder, matching the
        // desktop workflow this server feeds. Temp dir as a fallback.
        let dir = std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .map(|home| PathBuf::from(home).join("Downloads"))
            .unwrap_or_else(|_| std::env::temp_dir());
        Self { dir }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                name: "compute-mcp-server".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                with_timestamps: true,
            },
            transport: TransportConfig::default(),
            compute: ComputeConfig::default(),
            geocoding: GeocodingConfig::default(),
            weather: WeatherConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

impl Config {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from environment variables.
    ///
    /// Environment variables are expected to be prefixed with `MCP_`.
    /// For example: `MCP_SERVER_NAME`, `MCP_COMPUTE_URL`.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let mut config = Self::default();

        if let Ok(name) = std::env::var("MCP_SERVER_NAME") {
            config.server.name = name;
        }

        if let Ok(level) = std::env::var("MCP_LOG_LEVEL") {
            config.logging.level = level;
        }

        // Load transport configuration from environment
        config.transport = TransportConfig::from_env();

        if let Ok(url) = std::env::var("MCP_COMPUTE_URL") {
            config.compute.base_url = url;
        }

        if let Ok(timeout) = std::env::var("MCP_COMPUTE_TIMEOUT_SECS") {
            match timeout.parse() {
                Ok(secs) => config.compute.timeout_secs = secs,
                Err(_) => warn!("Ignoring invalid MCP_COMPUTE_TIMEOUT_SECS: {}", timeout),
            }
        }

        if let Ok(dir) = std::env::var("MCP_DEFINITIONS_DIR") {
            config.compute.definitions_dir = PathBuf::from(dir);
        }

        if let Ok(url) = std::env::var("MCP_GEOCODER_URL") {
            config.geocoding.base_url = url;
        }

        if let Ok(agent) = std::env::var("MCP_GEOCODER_USER_AGENT") {
            config.geocoding.user_agent = agent;
        }

        if let Ok(url) = std::env::var("MCP_OVERPASS_URL") {
            config.geocoding.overpass_url = url;
        }

        // Load OpenWeatherMap API key
        if let Ok(api_key) = std::env::var("MCP_OPENWEATHER_API_KEY") {
            config.weather.api_key = Some(api_key);
            info!("OpenWeatherMap API key loaded from environment");
        } else {
            warn!(
                "MCP_OPENWEATHER_API_KEY not set - the weather tool will \
                 return mock data instead of live conditions"
            );
        }

        if let Ok(dir) = std::env::var("MCP_OUTPUT_DIR") {
            config.output.dir = PathBuf::from(dir);
        }

        info!(
            "Compute service: {} (definitions in {:?})",
            config.compute.base_url, config.compute.definitions_dir
        );

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Mutex to ensure env var tests run serially
    static ENV_TEST_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn test_compute_url_from_env() {
        let _lock = ENV_TEST_LOCK.lock().unwrap();
        unsafe {
            std::env::set_var("MCP_COMPUTE_URL", "http://compute.example:8081");
        }
        let config = Config::from_env();
        assert_eq!(config.compute.base_url, "http://compute.example:8081");
        unsafe {
            std::env::remove_var("MCP_COMPUTE_URL");
        }
    }

    #[test]
    fn test_compute_defaults() {
        let _lock = ENV_TEST_LOCK.lock().unwrap();
        unsafe {
            std::env::remove_var("MCP_COMPUTE_URL");
            std::env::remove_var("MCP_COMPUTE_TIMEOUT_SECS");
        }
        let config = Config::from_env();
        assert_eq!(config.compute.base_url, "http://localhost:6001");
        assert_eq!(config.compute.timeout_secs, 600);
    }

    #[test]
    fn test_weather_key_redacted_in_debug() {
        let weather = WeatherConfig {
            api_key: Some("super_secret_key".to_string()),
            ..WeatherConfig::default()
        };
        let debug_str = format!("{:?}", weather);
        assert!(debug_str.contains("REDACTED"));
        assert!(!debug_str.contains("super_secret_key"));
    }

    #[test]
    fn test_definition_paths() {
        let compute = ComputeConfig {
            definitions_dir: PathBuf::from("/opt/defs"),
            ..ComputeConfig::default()
        };
        assert_eq!(compute.math_definition(), PathBuf::from("/opt/defs/add.gh"));
        assert_eq!(
            compute.context_definition(),
            PathBuf::from("/opt/defs/context_generator.gh")
        );
    }

    #[test]
    fn test_geocoding_defaults() {
        let config = Config::default();
        assert_eq!(
            config.geocoding.base_url,
            "https://nominatim.openstreetmap.org"
        );
        assert_eq!(config.geocoding.user_agent, "MCP-Tool/1.0");
    }
}
