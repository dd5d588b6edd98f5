use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{self, StreamExt};
use std::sync::{Arc, Mutex};
use std::time::Instant;

use crate::errors::{ChatError, ChatResult};
use crate::providers::base::{
    BufferedResult, ByteStream, Completion, CompletionRequest, Provider, StreamHandle,
};

/// A mock provider that returns pre-configured completions for testing
pub struct MockProvider {
    responses: Arc<Mutex<Vec<ChatResult<Completion>>>>,
    requests: Arc<Mutex<Vec<CompletionRequest>>>,
}

impl MockProvider {
    /// Create a new mock provider with a sequence of responses
    pub fn new(responses: Vec<ChatResult<Completion>>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(responses)),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Requests seen so far, in order
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

/// A stream completion that yields the given chunks and then ends
pub fn chunked(chunks: &[&str]) -> Completion {
    let items: Vec<ChatResult<Bytes>> = chunks
        .iter()
        .map(|chunk| Ok(Bytes::copy_from_slice(chunk.as_bytes())))
        .collect();
    stream_of(stream::iter(items).boxed())
}

/// A stream completion that yields the given chunks and then never ends
pub fn hanging(chunks: &[&str]) -> Completion {
    let items: Vec<ChatResult<Bytes>> = chunks
        .iter()
        .map(|chunk| Ok(Bytes::copy_from_slice(chunk.as_bytes())))
        .collect();
    stream_of(stream::iter(items).chain(stream::pending()).boxed())
}

/// A stream completion whose connection drops after the given chunks
pub fn dropped(chunks: &[&str]) -> Completion {
    let mut items: Vec<ChatResult<Bytes>> = chunks
        .iter()
        .map(|chunk| Ok(Bytes::copy_from_slice(chunk.as_bytes())))
        .collect();
    items.push(Err(ChatError::StreamRead("connection reset".to_string())));
    stream_of(stream::iter(items).boxed())
}

pub fn buffered(body: serde_json::Value, speed: f64) -> Completion {
    Completion::Buffered(BufferedResult { body, speed })
}

fn stream_of(body: ByteStream) -> Completion {
    Completion::Stream(StreamHandle::new(Instant::now(), body))
}

#[async_trait]
impl Provider for MockProvider {
    async fn send(&self, request: &CompletionRequest) -> ChatResult<Completion> {
        self.requests.lock().unwrap().push(request.clone());
        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            // Return an empty stream if no more pre-configured responses
            Ok(chunked(&[]))
        } else {
            responses.remove(0)
        }
    }
}
