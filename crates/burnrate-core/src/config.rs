use serde::{Deserialize, Serialize};

use crate::{BurnRateError, Result};

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000/v1";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointConfig {
    pub base_url: String,
    #[serde(default)]
    pub api_key: Option<String>,
    /// Model to benchmark; the first catalog entry is used when unset.
    #[serde(default)]
    pub model: Option<String>,
    pub request_timeout_secs: u64,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            model: None,
            request_timeout_secs: 300,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkConfig {
    #[serde(default)]
    pub endpoint: EndpointConfig,
    pub concurrency_levels: Vec<u32>,
    /// Number of random words appended to the synthesized prompt.
    pub num_words: usize,
    pub max_tokens: u32,
    /// Directory for the Markdown report.
    #[serde(default = "default_report_dir")]
    pub report_dir: String,
    /// Directory for per-level output archives.
    pub output_dir: String,
    #[serde(default = "default_save_outputs")]
    pub save_outputs: bool,
}

fn default_save_outputs() -> bool {
    true
}

fn default_report_dir() -> String {
    ".".to_string()
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        Self {
            endpoint: EndpointConfig::default(),
            concurrency_levels: vec![1, 2, 4, 8, 16, 32, 64, 128],
            num_words: 512,
            max_tokens: 512,
            report_dir: default_report_dir(),
            output_dir: "model_outputs".to_string(),
            save_outputs: true,
        }
    }
}

impl BenchmarkConfig {
    pub fn validate(&self) -> Result<()> {
        if self.endpoint.base_url.trim().is_empty() {
            return Err(BurnRateError::Config("base_url must not be empty".into()));
        }
        if self.concurrency_levels.is_empty() {
            return Err(BurnRateError::Config(
                "at least one concurrency level is required".into(),
            ));
        }
        if self.concurrency_levels.contains(&0) {
            return Err(BurnRateError::Config(
                "concurrency levels must be greater than zero".into(),
            ));
        }
        if self.max_tokens == 0 {
            return Err(BurnRateError::Config(
                "max_tokens must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

/// Parses a comma separated list such as `1,2,4,8`.
pub fn parse_concurrency_levels(input: &str) -> Result<Vec<u32>> {
    input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<u32>()
                .map_err(|e| BurnRateError::Config(format!("invalid concurrency '{}': {}", s, e)))
        })
        .collect()
}
