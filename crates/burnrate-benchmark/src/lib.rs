pub mod consumer;
pub mod estimator;
pub mod openai;
pub mod progress;
pub mod prompt;
pub mod report;
pub mod runner;
pub mod source;
pub mod usage;

#[cfg(test)]
pub(crate) mod testing;

pub use consumer::{run_streaming, StreamConsumer, StreamState};
pub use estimator::{estimate_tokens, TokenEstimator};
pub use openai::OpenAiClient;
pub use progress::{ProgressSink, TokenCounter};
pub use prompt::random_prompt;
pub use report::ReportWriter;
pub use runner::{summarize_level, BenchmarkRunner, LevelResult};
pub use source::{
    first_available_model, measure_latency, CompletionRequest, CompletionSource, EventStream,
    ModelCatalog,
};
pub use usage::reconcile;
