use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use tokio::sync::watch;

use crate::errors::ChatResult;
use crate::models::conversation::Conversation;
use crate::models::message::{Message, MessageDraft};
use crate::stream::accumulator::StreamSnapshot;

/// Issues millisecond-timestamp ids that never repeat and never go backwards
#[derive(Debug, Default)]
struct IdGenerator {
    last: i64,
}

impl IdGenerator {
    fn next(&mut self) -> String {
        let now = Utc::now().timestamp_millis();
        self.last = if now > self.last { now } else { self.last + 1 };
        self.last.to_string()
    }

    fn observe(&mut self, id: &str) {
        if let Ok(value) = id.parse::<i64>() {
            self.last = self.last.max(value);
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PersistedState {
    conversations: Vec<Conversation>,
    current_conversation_id: Option<String>,
}

/// Owner of every conversation and the only place their messages change.
///
/// Derived views (`current_conversation`, `current_messages`) are computed on
/// each call from the active id. Observers call [`ConversationStore::subscribe`]
/// and re-read the store whenever the revision changes.
pub struct ConversationStore {
    conversations: Vec<Conversation>,
    current_conversation_id: Option<String>,
    is_loading: bool,
    ids: IdGenerator,
    revision: watch::Sender<u64>,
}

impl Default for ConversationStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConversationStore {
    /// A store holding one empty, active conversation
    pub fn new() -> Self {
        let (revision, _) = watch::channel(0);
        let mut store = Self {
            conversations: Vec::new(),
            current_conversation_id: None,
            is_loading: false,
            ids: IdGenerator::default(),
            revision,
        };
        store.create_conversation();
        store
    }

    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    pub fn revision(&self) -> u64 {
        *self.revision.borrow()
    }

    fn touch(&self) {
        self.revision.send_modify(|revision| *revision += 1);
    }

    pub fn conversations(&self) -> &[Conversation] {
        &self.conversations
    }

    pub fn current_conversation_id(&self) -> Option<&str> {
        self.current_conversation_id.as_deref()
    }

    pub fn current_conversation(&self) -> Option<&Conversation> {
        let id = self.current_conversation_id.as_deref()?;
        self.conversations.iter().find(|c| c.id == id)
    }

    fn current_conversation_mut(&mut self) -> Option<&mut Conversation> {
        let id = self.current_conversation_id.as_deref()?;
        self.conversations.iter_mut().find(|c| c.id == id)
    }

    /// Messages of the active conversation, empty when it does not resolve
    pub fn current_messages(&self) -> &[Message] {
        self.current_conversation()
            .map(|c| c.messages.as_slice())
            .unwrap_or_default()
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn set_loading(&mut self, loading: bool) {
        self.is_loading = loading;
        self.touch();
    }

    /// Prepend a new empty conversation and make it active, returning its id
    pub fn create_conversation(&mut self) -> String {
        let conversation = Conversation::new(self.ids.next());
        let id = conversation.id.clone();
        self.conversations.insert(0, conversation);
        self.current_conversation_id = Some(id.clone());
        self.touch();
        id
    }

    /// Make `id` active. Unknown ids are accepted; reads then return defaults.
    pub fn switch_conversation(&mut self, id: &str) {
        self.current_conversation_id = Some(id.to_string());
        self.touch();
    }

    /// Append a message to the active conversation, returning its id
    pub fn add_message(&mut self, draft: MessageDraft) -> Option<String> {
        let id = self.ids.next();
        let conversation = self.current_conversation_mut()?;
        conversation.messages.push(Message::from_draft(id.clone(), draft));
        self.touch();
        Some(id)
    }

    pub fn last_message(&self) -> Option<&Message> {
        self.current_conversation()?.last_message()
    }

    /// Overwrite the last message of the active conversation with `snapshot`
    pub fn apply_snapshot(&mut self, snapshot: &StreamSnapshot) {
        let Some(last) = self
            .current_conversation_mut()
            .and_then(|c| c.messages.last_mut())
        else {
            return;
        };
        last.content.clone_from(&snapshot.content);
        last.reasoning_content.clone_from(&snapshot.reasoning_content);
        last.completion_tokens = snapshot.completion_tokens;
        last.speed = snapshot.speed;
        self.touch();
    }

    /// Freeze the last message and clear the loading flags
    pub fn finish_turn(&mut self) {
        if let Some(last) = self
            .current_conversation_mut()
            .and_then(|c| c.messages.last_mut())
        {
            last.loading = false;
        }
        self.is_loading = false;
        self.touch();
    }

    pub fn update_conversation_title(&mut self, id: &str, title: &str) {
        if let Some(conversation) = self.conversations.iter_mut().find(|c| c.id == id) {
            conversation.title = title.to_string();
            self.touch();
        }
    }

    /// Remove a conversation. The store is never left without conversations
    /// or with a dangling active id as a result.
    pub fn delete_conversation(&mut self, id: &str) {
        let Some(index) = self.conversations.iter().position(|c| c.id == id) else {
            return;
        };
        self.conversations.remove(index);

        if self.conversations.is_empty() {
            self.create_conversation();
        } else if self.current_conversation_id.as_deref() == Some(id) {
            self.current_conversation_id = Some(self.conversations[0].id.clone());
        }
        self.touch();
    }

    /// Write all conversations and the active id as JSON
    pub fn save(&self, path: &Path) -> ChatResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(
            &mut writer,
            &PersistedState {
                conversations: self.conversations.clone(),
                current_conversation_id: self.current_conversation_id.clone(),
            },
        )?;
        writer.flush()?;
        Ok(())
    }

    /// Restore a store written by [`ConversationStore::save`]. Messages that
    /// were mid-stream when saved come back frozen.
    pub fn load(path: &Path) -> ChatResult<Self> {
        let reader = BufReader::new(File::open(path)?);
        let state: PersistedState = serde_json::from_reader(reader)?;

        let mut store = Self::new();
        if state.conversations.is_empty() {
            return Ok(store);
        }

        store.conversations = state.conversations;
        for conversation in &mut store.conversations {
            store.ids.observe(&conversation.id);
            for message in &mut conversation.messages {
                store.ids.observe(&message.id);
                message.loading = false;
            }
        }
        store.current_conversation_id = state
            .current_conversation_id
            .filter(|id| store.conversations.iter().any(|c| &c.id == id))
            .or_else(|| store.conversations.first().map(|c| c.id.clone()));
        Ok(store)
    }
}
