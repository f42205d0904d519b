use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use burnrate_core::{BurnRateError, Result, StreamEvent};
use futures::StreamExt;

use crate::progress::ProgressSink;
use crate::source::{CompletionRequest, CompletionSource, EventStream};

#[derive(Debug, Clone)]
pub enum Scripted {
    Event(StreamEvent),
    Fail(String),
}

/// Replays the same script for every request.
pub struct ScriptedSource {
    script: Vec<Scripted>,
    delay: Duration,
    open_error: Option<String>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedSource {
    pub fn new(script: Vec<Scripted>) -> Self {
        Self::with_delay(script, Duration::ZERO)
    }

    pub fn with_delay(script: Vec<Scripted>, delay: Duration) -> Self {
        Self {
            script,
            delay,
            open_error: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn failing_to_open(message: &str) -> Self {
        Self {
            open_error: Some(message.to_string()),
            ..Self::new(Vec::new())
        }
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionSource for ScriptedSource {
    async fn stream(&self, request: &CompletionRequest) -> Result<EventStream> {
        self.requests.lock().unwrap().push(request.clone());
        if let Some(message) = &self.open_error {
            return Err(BurnRateError::Stream(message.clone()));
        }

        let delay = self.delay;
        let items = self.script.clone().into_iter().map(|item| match item {
            Scripted::Event(event) => Ok(event),
            Scripted::Fail(message) => Err(BurnRateError::Stream(message)),
        });
        let stream = futures::stream::iter(items).then(move |item| async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            item
        });
        Ok(Box::pin(stream))
    }
}

/// Progress sink that keeps every call in order.
#[derive(Default)]
pub struct Recorder(Mutex<Vec<i64>>);

impl Recorder {
    pub fn calls(&self) -> Vec<i64> {
        self.0.lock().unwrap().clone()
    }
}

impl ProgressSink for Recorder {
    fn add(&self, tokens: i64) {
        self.0.lock().unwrap().push(tokens);
    }
}
