use std::time::{Duration, Instant};

use burnrate_core::{Result, RunMetrics, StreamEvent, Usage};
use futures::StreamExt;
use tracing::debug;

use crate::estimator::TokenEstimator;
use crate::progress::ProgressSink;
use crate::source::{CompletionRequest, CompletionSource};
use crate::usage::reconcile;

/// Accumulates one exchange's events into `RunMetrics`.
///
/// Elapsed times are supplied by the caller so the state machine stays
/// independent of the clock.
pub struct StreamState<'a> {
    estimator: TokenEstimator,
    progress: Option<&'a dyn ProgressSink>,
    content: String,
    time_to_first_token: Option<Duration>,
    estimated_tokens: u32,
    usage: Option<Usage>,
}

impl<'a> StreamState<'a> {
    pub fn new(estimator: TokenEstimator, progress: Option<&'a dyn ProgressSink>) -> Self {
        Self {
            estimator,
            progress,
            content: String::new(),
            time_to_first_token: None,
            estimated_tokens: 0,
            usage: None,
        }
    }

    pub fn observe(&mut self, event: StreamEvent, elapsed: Duration) {
        // Latest non-empty usage record wins.
        if let Some(usage) = event.usage.filter(|u| !u.is_empty()) {
            self.usage = Some(usage);
        }

        let Some(delta) = event.delta.filter(|d| !d.is_empty()) else {
            return;
        };

        if self.time_to_first_token.is_none() && !delta.trim().is_empty() {
            self.time_to_first_token = Some(elapsed);
        }

        let tokens = self.estimator.estimate(&delta);
        self.estimated_tokens += tokens;
        self.content.push_str(&delta);

        if let Some(progress) = self.progress {
            progress.add(i64::from(tokens));
        }
    }

    pub fn estimated_tokens(&self) -> u32 {
        self.estimated_tokens
    }

    pub fn finish(self) -> RunMetrics {
        let prompt_tokens = self.usage.map(|u| u.prompt_tokens).unwrap_or(0);
        let authoritative = self
            .usage
            .map(|u| u.completion_tokens)
            .filter(|&tokens| tokens > 0);

        let completion_tokens = match authoritative {
            Some(tokens) => {
                if let Some(progress) = self.progress {
                    reconcile(tokens, self.estimated_tokens, progress);
                }
                tokens
            }
            None => self.estimated_tokens,
        };

        RunMetrics {
            content: self.content,
            time_to_first_token: self
                .time_to_first_token
                .map(|d| d.as_secs_f64())
                .unwrap_or(0.0),
            prompt_tokens,
            completion_tokens,
        }
    }
}

/// Runs single streaming exchanges and measures them.
#[derive(Debug, Clone, Copy, Default)]
pub struct StreamConsumer {
    estimator: TokenEstimator,
}

impl StreamConsumer {
    pub fn new(estimator: TokenEstimator) -> Self {
        Self { estimator }
    }

    /// Executes one request. Any transport error aborts the exchange and the
    /// partial metrics are discarded.
    pub async fn run(
        &self,
        source: &dyn CompletionSource,
        request: &CompletionRequest,
        progress: Option<&dyn ProgressSink>,
    ) -> Result<RunMetrics> {
        let start = Instant::now();
        let mut events = source.stream(request).await?;
        let mut state = StreamState::new(self.estimator, progress);

        while let Some(event) = events.next().await {
            state.observe(event?, start.elapsed());
        }

        let metrics = state.finish();
        debug!(
            ttft = metrics.time_to_first_token,
            prompt_tokens = metrics.prompt_tokens,
            completion_tokens = metrics.completion_tokens,
            total_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Stream finished"
        );
        Ok(metrics)
    }
}

pub async fn run_streaming(
    source: &dyn CompletionSource,
    request: &CompletionRequest,
    progress: Option<&dyn ProgressSink>,
) -> Result<RunMetrics> {
    StreamConsumer::default().run(source, request, progress).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::TokenCounter;
    use crate::testing::{Recorder, Scripted, ScriptedSource};
    use burnrate_core::{BurnRateError, ErrorKind};

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_authoritative_usage_overrides_estimate() {
        let mut state = StreamState::new(TokenEstimator::default(), None);
        state.observe(StreamEvent::content("Hello"), ms(150));
        state.observe(StreamEvent::content(" world"), ms(300));
        state.observe(StreamEvent::usage(5, 3), ms(310));

        let metrics = state.finish();
        assert_eq!(metrics.content, "Hello world");
        assert_eq!(metrics.completion_tokens, 3);
        assert_eq!(metrics.prompt_tokens, 5);
        assert_eq!(metrics.time_to_first_token, 0.15);
    }

    #[test]
    fn test_estimate_used_without_usage() {
        let mut state = StreamState::new(TokenEstimator::default(), None);
        for delta in ["one", " two", " three", " four"] {
            state.observe(StreamEvent::content(delta), ms(10));
        }
        assert_eq!(state.estimated_tokens(), 4);

        let metrics = state.finish();
        assert_eq!(metrics.completion_tokens, 4);
        assert_eq!(metrics.prompt_tokens, 0);
    }

    #[test]
    fn test_ttft_skips_blank_deltas_and_is_fixed() {
        let mut state = StreamState::new(TokenEstimator::default(), None);
        state.observe(StreamEvent::content(""), ms(5));
        state.observe(StreamEvent::content("\n  "), ms(10));
        state.observe(StreamEvent::content("first"), ms(20));
        state.observe(StreamEvent::content(" second"), ms(40));

        let metrics = state.finish();
        assert_eq!(metrics.time_to_first_token, 0.02);
        assert_eq!(metrics.content, "\n  first second");
    }

    #[test]
    fn test_only_blank_deltas_leave_ttft_zero() {
        let mut state = StreamState::new(TokenEstimator::default(), None);
        state.observe(StreamEvent::content(" "), ms(5));
        state.observe(StreamEvent::content("\n"), ms(10));

        let metrics = state.finish();
        assert_eq!(metrics.time_to_first_token, 0.0);
        assert_eq!(metrics.completion_tokens, 0);
    }

    #[test]
    fn test_latest_non_empty_usage_wins() {
        let mut state = StreamState::new(TokenEstimator::default(), None);
        state.observe(StreamEvent::usage(5, 2), ms(1));
        state.observe(StreamEvent::usage(5, 9), ms(2));
        state.observe(StreamEvent::usage(0, 0), ms(3));

        assert_eq!(state.finish().completion_tokens, 9);
    }

    #[test]
    fn test_prompt_only_usage_falls_back_to_estimate() {
        let mut state = StreamState::new(TokenEstimator::default(), None);
        state.observe(StreamEvent::content("a b"), ms(1));
        state.observe(StreamEvent::usage(7, 0), ms(2));

        let metrics = state.finish();
        assert_eq!(metrics.prompt_tokens, 7);
        assert_eq!(metrics.completion_tokens, 2);
    }

    #[test]
    fn test_progress_reconciled_to_authoritative() {
        let counter = TokenCounter::new();
        let mut state = StreamState::new(TokenEstimator::default(), Some(&counter));
        state.observe(StreamEvent::content("Hello"), ms(1));
        state.observe(StreamEvent::content(" world"), ms(2));
        assert_eq!(counter.total(), 2);

        state.observe(StreamEvent::usage(5, 7), ms(3));
        state.finish();
        assert_eq!(counter.total(), 7);
    }

    #[test]
    fn test_single_correction_of_authoritative_minus_estimate() {
        let recorder = Recorder::default();
        let mut state = StreamState::new(TokenEstimator::default(), Some(&recorder));
        state.observe(StreamEvent::content("Hello"), ms(1));
        state.observe(StreamEvent::content(" world"), ms(2));
        state.observe(StreamEvent::usage(5, 7), ms(3));
        state.finish();

        assert_eq!(recorder.calls(), vec![1, 1, 5]);
    }

    #[test]
    fn test_no_correction_without_usage() {
        let recorder = Recorder::default();
        let mut state = StreamState::new(TokenEstimator::default(), Some(&recorder));
        for delta in ["one", " two", " three"] {
            state.observe(StreamEvent::content(delta), ms(1));
        }

        let metrics = state.finish();
        assert_eq!(metrics.completion_tokens, 3);
        assert_eq!(recorder.calls(), vec![1, 1, 1]);
    }

    #[test]
    fn test_no_correction_for_prompt_only_usage() {
        let recorder = Recorder::default();
        let mut state = StreamState::new(TokenEstimator::default(), Some(&recorder));
        state.observe(StreamEvent::content("a b"), ms(1));
        state.observe(StreamEvent::usage(7, 0), ms(2));

        let metrics = state.finish();
        assert_eq!(metrics.prompt_tokens, 7);
        assert_eq!(metrics.completion_tokens, 2);
        assert_eq!(recorder.calls(), vec![2]);
    }

    #[test]
    fn test_progress_corrects_over_estimate() {
        let counter = TokenCounter::new();
        let mut state = StreamState::new(TokenEstimator::default(), Some(&counter));
        state.observe(StreamEvent::content("one two three four five"), ms(1));
        assert_eq!(counter.total(), 6);

        state.observe(StreamEvent::usage(5, 4), ms(2));
        state.finish();
        assert_eq!(counter.total(), 4);
    }

    #[tokio::test]
    async fn test_run_measures_ttft() {
        let source = ScriptedSource::with_delay(
            vec![
                Scripted::Event(StreamEvent::content("Hello")),
                Scripted::Event(StreamEvent::content(" world")),
                Scripted::Event(StreamEvent::usage(5, 3)),
            ],
            ms(5),
        );
        let counter = TokenCounter::new();
        let request = CompletionRequest::new("m", "p", 16);

        let metrics = run_streaming(&source, &request, Some(&counter))
            .await
            .unwrap();

        assert_eq!(metrics.content, "Hello world");
        assert_eq!(metrics.completion_tokens, 3);
        assert!(metrics.time_to_first_token >= 0.005);
        assert_eq!(counter.total(), 3);
        assert_eq!(source.requests(), vec![request]);
    }

    #[tokio::test]
    async fn test_mid_stream_error_discards_metrics() {
        let source = ScriptedSource::new(vec![
            Scripted::Event(StreamEvent::content("partial")),
            Scripted::Fail("connection reset".into()),
            Scripted::Event(StreamEvent::usage(5, 3)),
        ]);
        let request = CompletionRequest::new("m", "p", 16);

        let err = run_streaming(&source, &request, None).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Stream);
        assert!(err.to_string().contains("connection reset"));
    }

    #[tokio::test]
    async fn test_open_error_is_stream_error() {
        let source = ScriptedSource::failing_to_open("timed out");
        let request = CompletionRequest::new("m", "p", 16);

        let err = run_streaming(&source, &request, None).await.unwrap_err();
        assert!(matches!(err, BurnRateError::Stream(_)));
    }
}
