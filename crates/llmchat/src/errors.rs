use thiserror::Error;

/// Failures that abort a chat turn or a store operation.
///
/// None of these are retried. A turn that fails leaves the assistant
/// placeholder with whatever content it had reached.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ChatError {
    #[error("HTTP error! status: {status_code}")]
    Transport { status_code: u16 },

    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Stream read failed: {0}")]
    StreamRead(String),

    #[error("Malformed event payload {payload:?}: {source}")]
    MalformedEvent {
        payload: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Malformed completion response: {0}")]
    MalformedResponse(String),

    #[error("A completion is already in flight")]
    TurnInProgress,

    #[error("No active conversation")]
    NoActiveConversation,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to (de)serialize conversations: {0}")]
    Persist(#[from] serde_json::Error),
}

pub type ChatResult<T> = Result<T, ChatError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_error_reports_status() {
        let err = ChatError::Transport { status_code: 401 };
        assert_eq!(err.to_string(), "HTTP error! status: 401");
    }

    #[test]
    fn test_malformed_event_keeps_payload() {
        let source = serde_json::from_str::<serde_json::Value>("{not json}").unwrap_err();
        let err = ChatError::MalformedEvent {
            payload: "{not json}".to_string(),
            source,
        };
        assert!(err.to_string().contains("{not json}"));
        assert!(std::error::Error::source(&err).is_some());
    }
}
