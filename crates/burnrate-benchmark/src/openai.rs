use std::time::Duration;

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::{
        ChatCompletionRequestMessage, ChatCompletionRequestUserMessageArgs,
        ChatCompletionStreamOptions, CreateChatCompletionRequest,
        CreateChatCompletionRequestArgs, CreateChatCompletionStreamResponse,
    },
    Client,
};
use async_trait::async_trait;
use burnrate_core::{BurnRateError, EndpointConfig, Result, StreamEvent, Usage};
use futures::StreamExt;
use tracing::{debug, info, instrument};

use crate::source::{CompletionRequest, CompletionSource, EventStream, ModelCatalog};

fn stream_err(e: impl ToString) -> BurnRateError {
    BurnRateError::Stream(e.to_string())
}

/// OpenAI-compatible endpoint: streaming chat completions plus `/models`.
#[derive(Clone)]
pub struct OpenAiClient {
    client: Client<OpenAIConfig>,
    base_url: String,
}

impl OpenAiClient {
    pub fn new(endpoint: &EndpointConfig) -> Result<Self> {
        let mut config = OpenAIConfig::new().with_api_base(endpoint.base_url.trim_end_matches('/'));
        if let Some(key) = endpoint.api_key.as_deref().filter(|k| !k.is_empty()) {
            config = config.with_api_key(key);
        }

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(endpoint.request_timeout_secs))
            .build()
            .map_err(|e| BurnRateError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client: Client::with_config(config).with_http_client(http_client),
            base_url: endpoint.base_url.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

fn build_request(request: &CompletionRequest) -> std::result::Result<CreateChatCompletionRequest, OpenAIError> {
    let mut args = CreateChatCompletionRequestArgs::default();
    args.model(&request.model)
        .messages(vec![ChatCompletionRequestMessage::User(
            ChatCompletionRequestUserMessageArgs::default()
                .content(request.prompt.as_str())
                .build()?,
        )])
        .max_completion_tokens(request.max_tokens)
        .temperature(request.temperature);

    if request.include_usage {
        args.stream_options(ChatCompletionStreamOptions {
            include_usage: true,
        });
    }

    args.build()
}

fn to_event(chunk: CreateChatCompletionStreamResponse) -> StreamEvent {
    let delta = chunk
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.delta.content);
    let usage = chunk
        .usage
        .map(|u| Usage::new(u.prompt_tokens, u.completion_tokens));
    StreamEvent { delta, usage }
}

#[async_trait]
impl CompletionSource for OpenAiClient {
    #[instrument(skip(self, request), fields(model = %request.model, max_tokens = request.max_tokens))]
    async fn stream(&self, request: &CompletionRequest) -> Result<EventStream> {
        let body = build_request(request).map_err(stream_err)?;
        debug!("Opening completion stream");

        let stream = self
            .client
            .chat()
            .create_stream(body)
            .await
            .map_err(stream_err)?;

        let events = stream.map(|item| item.map(to_event).map_err(stream_err));
        Ok(Box::pin(events))
    }
}

#[async_trait]
impl ModelCatalog for OpenAiClient {
    #[instrument(skip(self), fields(base_url = %self.base_url))]
    async fn list_models(&self) -> Result<Vec<String>> {
        let list = self
            .client
            .models()
            .list()
            .await
            .map_err(|e| BurnRateError::Catalog(e.to_string()))?;

        let models: Vec<String> = list.data.into_iter().map(|m| m.id).collect();
        info!(count = models.len(), "Fetched models");
        Ok(models)
    }
}
