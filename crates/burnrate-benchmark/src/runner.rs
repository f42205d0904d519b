use std::sync::Arc;
use std::time::{Duration, Instant};

use burnrate_core::{BenchmarkConfig, BenchmarkResultRow, Result, RunMetrics};
use tokio::task::JoinSet;
use tracing::{info, warn};

use crate::consumer::StreamConsumer;
use crate::estimator::estimate_tokens;
use crate::progress::{ProgressSink, TokenCounter};
use crate::prompt::random_prompt;
use crate::source::{CompletionRequest, CompletionSource};

/// Drives concurrency levels against one model.
pub struct BenchmarkRunner {
    source: Arc<dyn CompletionSource>,
    consumer: StreamConsumer,
    model: String,
    num_words: usize,
    max_tokens: u32,
}

#[derive(Debug, Clone)]
pub struct LevelResult {
    pub row: BenchmarkResultRow,
    /// Contents of the successful runs, in task order.
    pub outputs: Vec<String>,
    pub failures: Vec<String>,
}

impl BenchmarkRunner {
    pub fn new(source: Arc<dyn CompletionSource>, model: &str, config: &BenchmarkConfig) -> Self {
        Self {
            source,
            consumer: StreamConsumer::default(),
            model: model.to_string(),
            num_words: config.num_words,
            max_tokens: config.max_tokens,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn request(&self) -> CompletionRequest {
        CompletionRequest::new(&self.model, &random_prompt(self.num_words), self.max_tokens)
    }

    /// Single untimed exchange; returns the prompt size in tokens.
    pub async fn warmup(&self) -> Result<u32> {
        info!(model = %self.model, "Warming up");
        let request = self.request();
        let metrics = self.consumer.run(self.source.as_ref(), &request, None).await?;

        if metrics.prompt_tokens > 0 {
            return Ok(metrics.prompt_tokens);
        }
        warn!("Server reported no prompt tokens, estimating input size");
        Ok(estimate_tokens(&request.prompt))
    }

    pub async fn run_level(
        &self,
        concurrency: u32,
        progress: Option<Arc<dyn ProgressSink>>,
    ) -> LevelResult {
        info!(concurrency, "Starting concurrency level");
        let start = Instant::now();

        let mut join_set = JoinSet::new();
        for index in 0..concurrency {
            let source = Arc::clone(&self.source);
            let progress = progress.clone();
            let consumer = self.consumer;
            let request = self.request();
            join_set.spawn(async move {
                let result = consumer
                    .run(source.as_ref(), &request, progress.as_deref())
                    .await;
                (index, result)
            });
        }

        let mut slots: Vec<Option<RunMetrics>> = vec![None; concurrency as usize];
        let mut failures = Vec::new();
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((index, Ok(metrics))) => slots[index as usize] = Some(metrics),
                Ok((index, Err(e))) => {
                    warn!(concurrency, request = index, "Request failed: {}", e);
                    failures.push(e.to_string());
                }
                Err(e) => {
                    warn!(concurrency, "Request task failed: {}", e);
                    failures.push(e.to_string());
                }
            }
        }

        let wall = start.elapsed();
        let runs: Vec<RunMetrics> = slots.into_iter().flatten().collect();
        let row = summarize_level(concurrency, &runs, wall);
        info!(
            concurrency,
            generation_tps = row.generation_throughput,
            success_rate = row.success_rate,
            "Concurrency level complete"
        );

        LevelResult {
            row,
            outputs: runs.into_iter().map(|m| m.content).collect(),
            failures,
        }
    }

    /// Runs every level in order, handing each result to `on_level` as soon
    /// as it completes.
    pub async fn run_sweep<F>(&self, levels: &[u32], show_progress: bool, mut on_level: F) -> Vec<BenchmarkResultRow>
    where
        F: FnMut(&LevelResult),
    {
        let mut rows = Vec::with_capacity(levels.len());
        for &concurrency in levels {
            let counter = show_progress.then(|| {
                Arc::new(TokenCounter::with_bar(
                    u64::from(concurrency) * u64::from(self.max_tokens),
                    &format!("concurrency {}", concurrency),
                ))
            });
            let progress = counter
                .clone()
                .map(|c| c as Arc<dyn ProgressSink>);

            let result = self.run_level(concurrency, progress).await;
            if let Some(counter) = counter {
                counter.finish();
            }

            on_level(&result);
            rows.push(result.row);
        }
        rows
    }
}

/// Aggregates the successful runs of one level.
///
/// Prompt throughput divides by the slowest first token: by then every
/// prompt of the level has been processed.
pub fn summarize_level(concurrency: u32, runs: &[RunMetrics], wall: Duration) -> BenchmarkResultRow {
    let wall_secs = wall.as_secs_f64();
    let completion_tokens: u64 = runs.iter().map(|m| u64::from(m.completion_tokens)).sum();
    let prompt_tokens: u64 = runs.iter().map(|m| u64::from(m.prompt_tokens)).sum();

    let (min_ttft, max_ttft) = if runs.is_empty() {
        (0.0, 0.0)
    } else {
        runs.iter().fold((f64::INFINITY, 0.0_f64), |(lo, hi), m| {
            (lo.min(m.time_to_first_token), hi.max(m.time_to_first_token))
        })
    };

    let generation_throughput = if wall_secs > 0.0 {
        completion_tokens as f64 / wall_secs
    } else {
        0.0
    };
    let prompt_throughput = if max_ttft > 0.0 {
        prompt_tokens as f64 / max_ttft
    } else {
        0.0
    };
    let success_rate = if concurrency > 0 {
        runs.len() as f64 / f64::from(concurrency)
    } else {
        0.0
    };

    BenchmarkResultRow {
        concurrency,
        generation_throughput,
        prompt_throughput,
        min_ttft,
        max_ttft,
        success_rate,
    }
}
