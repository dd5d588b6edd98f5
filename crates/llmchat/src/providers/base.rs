use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::time::Instant;

use crate::errors::ChatResult;
use crate::models::message::Message;
use crate::models::role::Role;
use crate::settings::Settings;

/// Raw response body chunks, in arrival order
pub type ByteStream = BoxStream<'static, ChatResult<Bytes>>;

/// A live response body that has not been read yet
pub struct StreamHandle {
    /// When the request was issued; throughput is measured from here
    pub started: Instant,
    pub body: ByteStream,
}

impl StreamHandle {
    pub fn new(started: Instant, body: ByteStream) -> Self {
        Self { started, body }
    }
}

/// A fully read completion with the throughput measured over the whole request
#[derive(Debug, Clone, PartialEq)]
pub struct BufferedResult {
    pub body: Value,
    pub speed: f64,
}

pub enum Completion {
    Stream(StreamHandle),
    Buffered(BufferedResult),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequestMessage {
    pub role: Role,
    pub content: String,
}

/// Body of a chat-completions request, plus the key used to authorize it
#[derive(Clone, PartialEq, Serialize)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<RequestMessage>,
    pub stream: bool,
    pub max_tokens: u32,
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: u32,
    #[serde(skip)]
    pub api_key: String,
}

impl CompletionRequest {
    pub fn new(settings: &Settings, history: &[Message]) -> Self {
        let messages = history
            .iter()
            .map(|message| RequestMessage {
                role: message.role,
                content: message.content.clone(),
            })
            .collect();

        Self {
            model: settings.model.clone(),
            messages,
            stream: settings.stream,
            max_tokens: settings.effective_max_tokens(),
            temperature: settings.temperature,
            top_p: settings.top_p,
            top_k: settings.top_k,
            api_key: settings.api_key.clone(),
        }
    }
}

impl fmt::Debug for CompletionRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompletionRequest")
            .field("model", &self.model)
            .field("messages", &self.messages.len())
            .field("stream", &self.stream)
            .field("max_tokens", &self.max_tokens)
            .field("temperature", &self.temperature)
            .field("top_p", &self.top_p)
            .field("top_k", &self.top_k)
            .finish_non_exhaustive()
    }
}

/// Transport for chat completions (any OpenAI-compatible endpoint)
#[async_trait]
pub trait Provider: Send + Sync {
    /// Issue one request. Streaming requests return as soon as the response
    /// headers arrive; buffered requests return the parsed body.
    async fn send(&self, request: &CompletionRequest) -> ChatResult<Completion>;
}
