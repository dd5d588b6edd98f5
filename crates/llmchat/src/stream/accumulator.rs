use serde_json::Value;
use std::time::Instant;

use crate::errors::{ChatError, ChatResult};
use crate::providers::base::BufferedResult;
use crate::providers::utils::{compute_speed, first_choice_text, format_speed, get_completion_tokens};

/// Cumulative state of one assistant turn
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StreamSnapshot {
    pub content: String,
    pub reasoning_content: String,
    pub completion_tokens: u64,
    pub speed: f64,
}

impl StreamSnapshot {
    /// Speed as shown to users, e.g. `"50.00"`
    pub fn speed_display(&self) -> String {
        format_speed(self.speed)
    }
}

/// Folds stream event payloads into a running [`StreamSnapshot`]
#[derive(Debug, Clone)]
pub struct DeltaAccumulator {
    started: Instant,
    snapshot: StreamSnapshot,
}

impl DeltaAccumulator {
    /// `started` is when the request was issued, not when decoding began
    pub fn new(started: Instant) -> Self {
        Self {
            started,
            snapshot: StreamSnapshot::default(),
        }
    }

    pub fn snapshot(&self) -> &StreamSnapshot {
        &self.snapshot
    }

    pub fn apply(&mut self, payload: &str) -> ChatResult<&StreamSnapshot> {
        self.apply_at(payload, Instant::now())
    }

    /// Apply one payload as of `now`. Invalid JSON fails without touching the
    /// snapshot; every valid payload produces a new snapshot, even when it only
    /// carries usage.
    pub fn apply_at(&mut self, payload: &str, now: Instant) -> ChatResult<&StreamSnapshot> {
        let data: Value =
            serde_json::from_str(payload).map_err(|source| ChatError::MalformedEvent {
                payload: payload.to_string(),
                source,
            })?;

        self.snapshot
            .content
            .push_str(first_choice_text(&data, "delta", "content"));
        self.snapshot
            .reasoning_content
            .push_str(first_choice_text(&data, "delta", "reasoning_content"));
        if let Some(tokens) = get_completion_tokens(&data) {
            self.snapshot.completion_tokens = tokens;
        }
        self.snapshot.speed = compute_speed(
            self.snapshot.completion_tokens,
            now.saturating_duration_since(self.started),
        );

        Ok(&self.snapshot)
    }

    /// Snapshot of a buffered (non-streaming) completion
    pub fn finalize(result: &BufferedResult) -> ChatResult<StreamSnapshot> {
        let has_message = result
            .body
            .get("choices")
            .and_then(|choices| choices.get(0))
            .and_then(|choice| choice.get("message"))
            .is_some_and(Value::is_object);
        if !has_message {
            return Err(ChatError::MalformedResponse(
                "missing choices[0].message".to_string(),
            ));
        }

        Ok(StreamSnapshot {
            content: first_choice_text(&result.body, "message", "content").to_string(),
            reasoning_content: first_choice_text(&result.body, "message", "reasoning_content")
                .to_string(),
            completion_tokens: get_completion_tokens(&result.body).unwrap_or_default(),
            speed: result.speed,
        })
    }
}
