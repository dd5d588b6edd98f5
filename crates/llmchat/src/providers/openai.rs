use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use serde_json::Value;
use std::time::{Duration, Instant};

use super::base::{BufferedResult, Completion, CompletionRequest, Provider, StreamHandle};
use super::utils::{compute_speed, get_completion_tokens};
use crate::errors::{ChatError, ChatResult};

/// Chat-completions client for any OpenAI-compatible endpoint
pub struct OpenAiCompatibleProvider {
    client: Client,
    host: String,
}

impl OpenAiCompatibleProvider {
    pub fn new<S: Into<String>>(host: S) -> ChatResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(600)) // 10 minutes timeout
            .build()?;

        Ok(Self {
            client,
            host: host.into(),
        })
    }

    fn url(&self) -> String {
        format!("{}/v1/chat/completions", self.host.trim_end_matches('/'))
    }
}

#[async_trait]
impl Provider for OpenAiCompatibleProvider {
    async fn send(&self, request: &CompletionRequest) -> ChatResult<Completion> {
        tracing::debug!(?request, "sending chat completion");

        let started = Instant::now();
        let response = self
            .client
            .post(self.url())
            .bearer_auth(&request.api_key)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            tracing::error!(status = status.as_u16(), "chat API error");
            return Err(ChatError::Transport {
                status_code: status.as_u16(),
            });
        }

        if request.stream {
            let body = response
                .bytes_stream()
                .map(|chunk| chunk.map_err(|e| ChatError::StreamRead(e.to_string())))
                .boxed();
            return Ok(Completion::Stream(StreamHandle::new(started, body)));
        }

        let body: Value = response.json().await?;
        let tokens = get_completion_tokens(&body).unwrap_or_default();
        let speed = compute_speed(tokens, started.elapsed());
        tracing::debug!(tokens, speed, "buffered completion received");

        Ok(Completion::Buffered(BufferedResult { body, speed }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::message::{Message, MessageDraft};
    use crate::settings::Settings;
    use bytes::Bytes;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request(stream: bool) -> CompletionRequest {
        let settings = Settings {
            api_key: "test_api_key".to_string(),
            stream,
            ..Default::default()
        };
        let history = vec![Message::from_draft(
            "1".to_string(),
            MessageDraft::user().with_text("Hello?"),
        )];
        CompletionRequest::new(&settings, &history)
    }

    async fn setup_mock_server(response: ResponseTemplate) -> (MockServer, OpenAiCompatibleProvider) {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer test_api_key"))
            .respond_with(response)
            .mount(&mock_server)
            .await;

        let provider = OpenAiCompatibleProvider::new(mock_server.uri()).unwrap();
        (mock_server, provider)
    }

    #[tokio::test]
    async fn test_buffered_completion_attaches_speed() -> ChatResult<()> {
        let response_body = json!({
            "id": "chatcmpl-123",
            "object": "chat.completion",
            "choices": [{
                "index": 0,
                "message": {
                    "role": "assistant",
                    "content": "Hello! How can I assist you today?",
                    "reasoning_content": "The user greeted me."
                },
                "finish_reason": "stop"
            }],
            "usage": {
                "prompt_tokens": 12,
                "completion_tokens": 15,
                "total_tokens": 27
            }
        });
        let (_server, provider) =
            setup_mock_server(ResponseTemplate::new(200).set_body_json(response_body.clone()))
                .await;

        match provider.send(&request(false)).await? {
            Completion::Buffered(result) => {
                assert_eq!(result.body, response_body);
                assert!(result.speed > 0.0);
            }
            Completion::Stream(_) => panic!("Expected buffered completion"),
        }
        Ok(())
    }

    #[tokio::test]
    async fn test_streaming_completion_returns_raw_bytes() -> ChatResult<()> {
        let sse = "data: {\"choices\":[{\"delta\":{\"content\":\"Hi\"}}]}\n\ndata: [DONE]\n\n";
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(body_partial_json(json!({"stream": true, "top_k": 50})))
            .respond_with(ResponseTemplate::new(200).set_body_raw(sse, "text/event-stream"))
            .mount(&mock_server)
            .await;
        let provider = OpenAiCompatibleProvider::new(format!("{}/", mock_server.uri()))?;

        let handle = match provider.send(&request(true)).await? {
            Completion::Stream(handle) => handle,
            Completion::Buffered(_) => panic!("Expected streaming completion"),
        };

        let chunks: Vec<Bytes> = handle
            .body
            .collect::<Vec<_>>()
            .await
            .into_iter()
            .collect::<ChatResult<_>>()?;
        assert_eq!(chunks.concat(), sse.as_bytes());
        Ok(())
    }

    #[tokio::test]
    async fn test_non_success_status_is_transport_error() {
        let (_server, provider) = setup_mock_server(ResponseTemplate::new(429)).await;

        let err = provider.send(&request(true)).await.err().unwrap();
        assert!(matches!(err, ChatError::Transport { status_code: 429 }));
    }

    #[tokio::test]
    async fn test_unmatched_key_is_rejected() {
        let (_server, provider) = setup_mock_server(ResponseTemplate::new(200)).await;
        let mut request = request(false);
        request.api_key = "wrong".to_string();

        // wiremock answers unmatched requests with 404
        let err = provider.send(&request).await.err().unwrap();
        assert!(matches!(err, ChatError::Transport { status_code: 404 }));
    }
}
