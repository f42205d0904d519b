use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Raw completion texts of one concurrency level, persisted as JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputArchive {
    pub model_name: String,
    pub concurrency: u32,
    pub timestamp: DateTime<Utc>,
    pub outputs: Vec<String>,
    pub count: usize,
}

impl OutputArchive {
    pub fn new(
        model_name: impl Into<String>,
        concurrency: u32,
        timestamp: DateTime<Utc>,
        outputs: Vec<String>,
    ) -> Self {
        let count = outputs.len();
        Self {
            model_name: model_name.into(),
            concurrency,
            timestamp,
            outputs,
            count,
        }
    }
}

/// Metadata printed above the results table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportMeta {
    pub model_name: String,
    pub input_tokens: u32,
    pub max_tokens: u32,
    pub latency_ms: f64,
}
