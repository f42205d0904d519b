use std::pin::Pin;
use std::time::Instant;

use async_trait::async_trait;
use burnrate_core::{BurnRateError, Result, StreamEvent};
use futures::Stream;
use tracing::{debug, instrument};

pub type EventStream = Pin<Box<dyn Stream<Item = Result<StreamEvent>> + Send>>;

/// Sampling temperature sent with every benchmark request.
pub const BENCHMARK_TEMPERATURE: f32 = 1.0;

#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub model: String,
    pub prompt: String,
    pub max_tokens: u32,
    pub temperature: f32,
    /// Ask the server to append a usage record to the stream.
    pub include_usage: bool,
}

impl CompletionRequest {
    pub fn new(model: &str, prompt: &str, max_tokens: u32) -> Self {
        Self {
            model: model.to_string(),
            prompt: prompt.to_string(),
            max_tokens,
            temperature: BENCHMARK_TEMPERATURE,
            include_usage: true,
        }
    }
}

/// Opens streaming chat completions.
///
/// Errors opening the stream and errors yielded by it are both
/// `BurnRateError::Stream`.
#[async_trait]
pub trait CompletionSource: Send + Sync {
    async fn stream(&self, request: &CompletionRequest) -> Result<EventStream>;
}

#[async_trait]
pub trait ModelCatalog: Send + Sync {
    async fn list_models(&self) -> Result<Vec<String>>;
}

#[instrument(skip(catalog))]
pub async fn first_available_model(catalog: &dyn ModelCatalog) -> Result<String> {
    let models = catalog.list_models().await?;
    let model = models.into_iter().next().ok_or(BurnRateError::NoModels)?;
    debug!(model = %model, "Using first available model");
    Ok(model)
}

/// Mean round-trip time of `samples` catalog calls, in milliseconds.
#[instrument(skip(catalog))]
pub async fn measure_latency(catalog: &dyn ModelCatalog, samples: u32) -> Result<f64> {
    let samples = samples.max(1);
    let mut total_ms = 0.0;
    for _ in 0..samples {
        let start = Instant::now();
        catalog.list_models().await?;
        total_ms += start.elapsed().as_secs_f64() * 1000.0;
    }
    Ok(total_ms / f64::from(samples))
}
