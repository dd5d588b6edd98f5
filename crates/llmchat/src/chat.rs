use std::future::{self, Future};

use crate::errors::{ChatError, ChatResult};
use crate::models::message::MessageDraft;
use crate::providers::base::{Completion, CompletionRequest, Provider, StreamHandle};
use crate::settings::Settings;
use crate::store::ConversationStore;
use crate::stream::accumulator::{DeltaAccumulator, StreamSnapshot};
use crate::stream::decoder::{EventStream, Pull};

/// How a turn ended when it did not fail
#[derive(Debug, Clone, PartialEq)]
pub enum TurnOutcome {
    Completed(StreamSnapshot),
    /// Cancelled by the caller; holds the last snapshot that was applied
    Cancelled(StreamSnapshot),
}

impl TurnOutcome {
    pub fn snapshot(&self) -> &StreamSnapshot {
        match self {
            TurnOutcome::Completed(snapshot) | TurnOutcome::Cancelled(snapshot) => snapshot,
        }
    }
}

/// Runs chat turns against a provider, one at a time per store
pub struct ChatClient {
    provider: Box<dyn Provider>,
}

impl ChatClient {
    pub fn new(provider: Box<dyn Provider>) -> Self {
        Self { provider }
    }

    /// Send `draft` in the active conversation and stream the reply into it.
    /// `on_snapshot` sees every snapshot right after the store applied it.
    pub async fn send<F>(
        &self,
        store: &mut ConversationStore,
        settings: &Settings,
        draft: MessageDraft,
        on_snapshot: F,
    ) -> ChatResult<TurnOutcome>
    where
        F: FnMut(&StreamSnapshot),
    {
        self.send_until(store, settings, draft, future::pending::<()>(), on_snapshot)
            .await
    }

    /// Like [`ChatClient::send`], but stops as soon as `cancel` resolves.
    /// Nothing is applied to the store after cancellation.
    pub async fn send_until<C, F>(
        &self,
        store: &mut ConversationStore,
        settings: &Settings,
        draft: MessageDraft,
        cancel: C,
        mut on_snapshot: F,
    ) -> ChatResult<TurnOutcome>
    where
        C: Future<Output = ()>,
        F: FnMut(&StreamSnapshot),
    {
        if store.is_loading() {
            return Err(ChatError::TurnInProgress);
        }
        if store.current_conversation().is_none() {
            return Err(ChatError::NoActiveConversation);
        }

        store.add_message(draft);
        let request = CompletionRequest::new(settings, store.current_messages());
        store.add_message(MessageDraft::assistant().loading());
        store.set_loading(true);

        let result = self
            .run_turn(store, &request, cancel, &mut on_snapshot)
            .await;
        store.finish_turn();

        match &result {
            Ok(TurnOutcome::Completed(snapshot)) => tracing::debug!(
                tokens = snapshot.completion_tokens,
                speed = snapshot.speed,
                "turn completed"
            ),
            Ok(TurnOutcome::Cancelled(_)) => tracing::debug!("turn cancelled"),
            Err(e) => tracing::error!("turn failed: {}", e),
        }
        result
    }

    async fn run_turn<C, F>(
        &self,
        store: &mut ConversationStore,
        request: &CompletionRequest,
        cancel: C,
        on_snapshot: &mut F,
    ) -> ChatResult<TurnOutcome>
    where
        C: Future<Output = ()>,
        F: FnMut(&StreamSnapshot),
    {
        tokio::pin!(cancel);

        let completion = tokio::select! {
            biased;
            _ = &mut cancel => return Ok(TurnOutcome::Cancelled(StreamSnapshot::default())),
            completion = self.provider.send(request) => completion?,
        };

        match completion {
            Completion::Buffered(result) => {
                let snapshot = DeltaAccumulator::finalize(&result)?;
                store.apply_snapshot(&snapshot);
                on_snapshot(&snapshot);
                Ok(TurnOutcome::Completed(snapshot))
            }
            Completion::Stream(handle) => {
                Self::stream_turn(store, handle, cancel, on_snapshot).await
            }
        }
    }

    async fn stream_turn<C, F>(
        store: &mut ConversationStore,
        handle: StreamHandle,
        mut cancel: std::pin::Pin<&mut C>,
        on_snapshot: &mut F,
    ) -> ChatResult<TurnOutcome>
    where
        C: Future<Output = ()>,
        F: FnMut(&StreamSnapshot),
    {
        let mut accumulator = DeltaAccumulator::new(handle.started);
        let mut events = EventStream::new(handle.body);

        loop {
            let pulled = tokio::select! {
                biased;
                _ = &mut cancel => {
                    return Ok(TurnOutcome::Cancelled(accumulator.snapshot().clone()));
                }
                pulled = events.pull() => pulled?,
            };

            match pulled {
                Pull::Event(payload) => {
                    let snapshot = accumulator.apply(&payload)?;
                    store.apply_snapshot(snapshot);
                    on_snapshot(snapshot);
                }
                Pull::End => return Ok(TurnOutcome::Completed(accumulator.snapshot().clone())),
            }
        }
    }
}
