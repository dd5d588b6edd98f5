use super::role::Role;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A file attached to a user message. Only the reference is kept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    pub name: String,
    pub url: String,
}

impl Attachment {
    pub fn new<S: Into<String>, T: Into<String>>(name: S, url: T) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }
}

/// A message before the store has given it an id and a timestamp
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MessageDraft {
    pub role: Option<Role>,
    pub content: String,
    pub reasoning_content: String,
    pub files: Vec<Attachment>,
    pub loading: bool,
}

impl MessageDraft {
    pub fn user() -> Self {
        Self {
            role: Some(Role::User),
            ..Default::default()
        }
    }

    pub fn assistant() -> Self {
        Self {
            role: Some(Role::Assistant),
            ..Default::default()
        }
    }

    pub fn with_text<S: Into<String>>(mut self, text: S) -> Self {
        self.content = text.into();
        self
    }

    pub fn with_reasoning<S: Into<String>>(mut self, reasoning: S) -> Self {
        self.reasoning_content = reasoning.into();
        self
    }

    pub fn with_file(mut self, file: Attachment) -> Self {
        self.files.push(file);
        self
    }

    /// Mark the message as a placeholder that a stream will fill in
    pub fn loading(mut self) -> Self {
        self.loading = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// A message to or from the LLM, as held by the conversation store
pub struct Message {
    pub id: String,
    pub role: Role,
    pub content: String,
    #[serde(default)]
    pub reasoning_content: String,
    #[serde(default)]
    pub completion_tokens: u64,
    #[serde(default)]
    pub speed: f64,
    #[serde(default)]
    pub files: Vec<Attachment>,
    #[serde(default)]
    pub loading: bool,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    pub(crate) fn from_draft(id: String, draft: MessageDraft) -> Self {
        Message {
            id,
            role: draft.role.unwrap_or(Role::User),
            content: draft.content,
            reasoning_content: draft.reasoning_content,
            completion_tokens: 0,
            speed: 0.0,
            files: draft.files,
            loading: draft.loading,
            timestamp: Utc::now(),
        }
    }
}
