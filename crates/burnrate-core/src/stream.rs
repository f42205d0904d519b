use serde::{Deserialize, Serialize};

/// Authoritative token accounting reported by the server, usually only on the
/// final event of a stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

impl Usage {
    pub fn new(prompt_tokens: u32, completion_tokens: u32) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.prompt_tokens == 0 && self.completion_tokens == 0
    }
}

/// One incremental unit of a completion stream.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamEvent {
    #[serde(default)]
    pub delta: Option<String>,
    #[serde(default)]
    pub usage: Option<Usage>,
}

impl StreamEvent {
    pub fn content(delta: impl Into<String>) -> Self {
        Self {
            delta: Some(delta.into()),
            usage: None,
        }
    }

    pub fn usage(prompt_tokens: u32, completion_tokens: u32) -> Self {
        Self {
            delta: None,
            usage: Some(Usage::new(prompt_tokens, completion_tokens)),
        }
    }
}
