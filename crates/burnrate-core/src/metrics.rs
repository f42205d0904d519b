use serde::{Deserialize, Serialize};

/// Outcome of one successful request/response exchange.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunMetrics {
    pub content: String,
    /// Seconds until the first non-blank delta, `0.0` if none arrived.
    pub time_to_first_token: f64,
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

/// Aggregate for one concurrency level.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkResultRow {
    pub concurrency: u32,
    pub generation_throughput: f64,
    pub prompt_throughput: f64,
    pub min_ttft: f64,
    pub max_ttft: f64,
    /// Fraction of requests that completed, in `[0, 1]`.
    pub success_rate: f64,
}
