//! Rhino.Compute HTTP client.
//!
//! Thin blocking client for the `/grasshopper` evaluation endpoint. The
//! base URL and timeout come from `ComputeConfig`, threaded through the
//! constructor rather than any process-wide state.

use thiserror::Error;
use tracing::{debug, warn};

use super::tree::{DataTree, EvaluateResponse};
use crate::core::config::ComputeConfig;

/// Errors from talking to the compute service.
#[derive(Debug, Error)]
pub enum ComputeError {
    #[error("Rhino.Compute request timed out")]
    Timeout,

    #[error("Network error calling Rhino.Compute: {0}")]
    Transport(String),

    #[error("Rhino.Compute returned status {code}: {body}")]
    Status { code: u16, body: String },

    #[error("Failed to process response: {0}")]
    MalformedResponse(String),
}

/// Client for a Rhino.Compute server.
pub struct ComputeClient {
    base_url: String,
    http: reqwest::blocking::Client,
}

impl ComputeClient {
    /// Build a client from configuration.
    pub fn new(config: &ComputeConfig) -> Result<Self, ComputeError> {
        let http = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ComputeError::Transport(e.to_string()))?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    /// Evaluate a Grasshopper definition with the given input trees.
    ///
    /// The service conventionally reports evaluation problems with error
    /// status codes while still returning a usable result payload; a
    /// non-success status whose body carries a `values` key is therefore
    /// treated as a soft success.
    pub fn evaluate(
        &self,
        definition: &str,
        values: &[DataTree],
    ) -> Result<EvaluateResponse, ComputeError> {
        let url = format!("{}/grasshopper", self.base_url);
        let payload = serde_json::json!({
            "algo": null,
            "pointer": definition,
            "values": values,
        });

        debug!("Evaluating definition {} via {}", definition, url);

        let response = self
            .http
            .post(&url)
            .json(&payload)
            .send()
            .map_err(|e| {
                if e.is_timeout() {
                    ComputeError::Timeout
                } else {
                    ComputeError::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        debug!("Rhino.Compute response status: {}", status);

        let body: serde_json::Value = response
            .json()
            .map_err(|e| ComputeError::MalformedResponse(e.to_string()))?;

        if !status.is_success() {
            if body.get("values").is_some() {
                warn!(
                    "Got status {} but response contains data. Processing anyway.",
                    status
                );
            } else {
                return Err(ComputeError::Status {
                    code: status.as_u16(),
                    body: body.to_string(),
                });
            }
        }

        serde_json::from_value(body).map_err(|e| ComputeError::MalformedResponse(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_stripped() {
        let config = ComputeConfig {
            base_url: "http://localhost:6001/".to_string(),
            ..ComputeConfig::default()
        };
        let client = ComputeClient::new(&config).unwrap();
        assert_eq!(client.base_url, "http://localhost:6001");
    }

    // Integration test (requires a running Rhino.Compute server)
    #[ignore]
    #[test]
    fn test_evaluate_math_definition() {
        use super::super::tree::{ParamValue, decode_branch, encode_parameters};

        let config = ComputeConfig::default();
        let client = ComputeClient::new(&config).unwrap();

        let values = encode_parameters(&[
            ("a".to_string(), ParamValue::Int(2)),
            ("b".to_string(), ParamValue::Int(3)),
        ]);

        let response = client
            .evaluate(&config.math_definition().to_string_lossy(), &values)
            .unwrap();
        let decoded = decode_branch(&response, super::super::tree::DEFAULT_OUTPUT_BRANCH).unwrap();
        assert!(!decoded.is_empty());
    }
}
