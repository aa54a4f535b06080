//! Synchronizer: drives gateway calls and keeps the state store current
//!
//! Each collection (the conversation list, the open chat) runs the pure
//! state machine in `transition`; this module executes the effects it
//! returns. Locks are never held across a gateway call, so the two
//! collections load independently.

mod effect;
pub mod event;
pub(crate) mod transition;

#[cfg(test)]
mod proptests;
#[cfg(test)]
pub(crate) mod testing;

pub use effect::Effect;
pub use event::Event;
pub use transition::{transition, CollectionState, TransitionError, TransitionResult};

use crate::gateway::{Conversation, ConversationId, GatewayError, Message, Page, RemoteGateway};
use crate::pagination::PaginationCursor;
use crate::state::{ChatState, SendState};
use crate::store::StateStore;
use std::future::Future;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Gateway(#[from] GatewayError),
    #[error("Synchronizer scope was cancelled")]
    Cancelled,
    #[error("Invalid input: {0}")]
    Validation(String),
}

/// Message content must contain something besides whitespace.
pub fn validate_content(content: &str) -> Result<&str, SyncError> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        Err(SyncError::Validation("message is empty".to_string()))
    } else {
        Ok(trimmed)
    }
}

/// Messages of whichever conversation is open
struct ChatSlot {
    conversation_id: Option<ConversationId>,
    collection: CollectionState<Message>,
}

pub struct Synchronizer<G> {
    gateway: G,
    store: Arc<StateStore>,
    page_size: u32,
    conversations: Mutex<CollectionState<Conversation>>,
    chat: Mutex<ChatSlot>,
    scope: CancellationToken,
}

impl<G: RemoteGateway> Synchronizer<G> {
    pub fn new(gateway: G, store: Arc<StateStore>, page_size: u32) -> Self {
        Self {
            gateway,
            store,
            page_size,
            conversations: Mutex::new(CollectionState::default()),
            chat: Mutex::new(ChatSlot {
                conversation_id: None,
                collection: CollectionState::default(),
            }),
            scope: CancellationToken::new(),
        }
    }

    /// Tie this synchronizer's lifetime to an outer scope (e.g. a screen).
    #[must_use]
    pub fn with_parent_scope(mut self, parent: &CancellationToken) -> Self {
        self.scope = parent.child_token();
        self
    }

    pub fn store(&self) -> &Arc<StateStore> {
        &self.store
    }

    /// Cancel every in-flight request. Answers that were pending are never
    /// written to the store and later calls fail with `Cancelled`.
    pub fn shutdown(&self) {
        tracing::debug!("Synchronizer scope cancelled");
        self.scope.cancel();
    }

    pub fn is_shut_down(&self) -> bool {
        self.scope.is_cancelled()
    }

    /// Page bookkeeping of the conversation list
    pub async fn conversations_cursor(&self) -> PaginationCursor {
        self.conversations.lock().await.cursor
    }

    /// Race a gateway call against the owning scope.
    async fn scoped<T>(
        &self,
        call: impl Future<Output = Result<T, GatewayError>>,
    ) -> Option<Result<T, GatewayError>> {
        tokio::select! {
            biased;
            () = self.scope.cancelled() => None,
            result = call => Some(result),
        }
    }

    // ========================================================================
    // Conversation list
    // ========================================================================

    /// Load the first page (`is_loading_more == false`) or the next one.
    pub async fn load_conversations(&self, is_loading_more: bool) -> Result<(), SyncError> {
        if self.is_shut_down() {
            return Err(SyncError::Cancelled);
        }

        let fetch = {
            let mut collection = self.conversations.lock().await;
            match self.step_conversations(
                &mut collection,
                Event::LoadRequested {
                    more: is_loading_more,
                },
            ) {
                Ok(fetch) => fetch,
                Err(e) => {
                    tracing::debug!(reason = %e, is_loading_more, "Conversation load skipped");
                    return Ok(());
                }
            }
        };
        let Some((page, generation)) = fetch else {
            return Ok(());
        };

        tracing::debug!(page, generation, "Fetching conversations");
        let outcome = self
            .scoped(self.gateway.list_conversations(page, self.page_size))
            .await;

        let mut collection = self.conversations.lock().await;
        let (event, error) = outcome_to_event(generation, outcome);
        if let Err(e) = self.step_conversations(&mut collection, event) {
            tracing::debug!(reason = %e, "Conversation answer discarded");
        }
        error.map_or(Ok(()), Err)
    }

    fn step_conversations(
        &self,
        collection: &mut CollectionState<Conversation>,
        event: Event<Conversation>,
    ) -> Result<Option<(u32, u64)>, TransitionError> {
        let effects = step(collection, event)?;
        Ok(run_effects(&effects, || {
            self.store.set_conversations(collection.page_state.clone());
        }))
    }

    // ========================================================================
    // Chat
    // ========================================================================

    /// Load the first page of `conversation_id`'s messages, or the next one.
    ///
    /// Opening a different conversation discards the previous one's messages
    /// and always starts from the first page.
    pub async fn load_chat(
        &self,
        conversation_id: ConversationId,
        is_loading_more: bool,
    ) -> Result<(), SyncError> {
        if self.is_shut_down() {
            return Err(SyncError::Cancelled);
        }

        let fetch = {
            let mut slot = self.chat.lock().await;
            let mut more = is_loading_more;
            if slot.conversation_id != Some(conversation_id) {
                tracing::debug!(conv_id = %conversation_id, "Switching chat");
                slot.collection = CollectionState::succeeding(&slot.collection);
                slot.conversation_id = Some(conversation_id);
                more = false;
            }
            match self.step_chat(&mut slot, Event::LoadRequested { more }) {
                Ok(fetch) => fetch,
                Err(e) => {
                    tracing::debug!(
                        conv_id = %conversation_id,
                        reason = %e,
                        is_loading_more,
                        "Chat load skipped"
                    );
                    return Ok(());
                }
            }
        };
        let Some((page, generation)) = fetch else {
            return Ok(());
        };

        tracing::debug!(conv_id = %conversation_id, page, generation, "Fetching messages");
        let outcome = self
            .scoped(
                self.gateway
                    .get_messages(conversation_id, page, self.page_size),
            )
            .await;

        let mut slot = self.chat.lock().await;
        let (event, error) = outcome_to_event(generation, outcome);
        if slot.conversation_id != Some(conversation_id) {
            tracing::debug!(conv_id = %conversation_id, "Answer for a closed chat discarded");
        } else if let Err(e) = self.step_chat(&mut slot, event) {
            tracing::debug!(conv_id = %conversation_id, reason = %e, "Chat answer discarded");
        }
        error.map_or(Ok(()), Err)
    }

    /// Send `content` to the open conversation.
    ///
    /// Whitespace-only content, or a chat that is not showing loaded messages
    /// for `conversation_id`, is dropped without error. A failed send leaves
    /// the messages untouched, keeps the draft and publishes
    /// `SendState::Failed`.
    pub async fn send_message(
        &self,
        conversation_id: ConversationId,
        content: &str,
    ) -> Result<(), SyncError> {
        if self.is_shut_down() {
            return Err(SyncError::Cancelled);
        }
        let Ok(text) = validate_content(content) else {
            tracing::debug!(conv_id = %conversation_id, "Empty message dropped");
            return Ok(());
        };

        {
            let slot = self.chat.lock().await;
            if slot.conversation_id != Some(conversation_id)
                || !slot.collection.page_state.is_success()
            {
                tracing::debug!(conv_id = %conversation_id, "Chat not loaded, message dropped");
                return Ok(());
            }
        }

        let previous = self.store.current_send_state();
        self.store
            .set_send_state(SendState::Sending { conversation_id });

        let outcome = self
            .scoped(self.gateway.send_message(conversation_id, text))
            .await;

        match outcome {
            None => {
                self.store.set_send_state(previous);
                Err(SyncError::Cancelled)
            }
            Some(Ok(tail)) => {
                let mut slot = self.chat.lock().await;
                if slot.conversation_id == Some(conversation_id) {
                    if let Err(e) = self.step_chat(&mut slot, Event::TailReceived { items: tail }) {
                        tracing::debug!(
                            conv_id = %conversation_id,
                            reason = %e,
                            "Sent message tail discarded"
                        );
                    }
                }
                drop(slot);
                self.store.clear_draft();
                self.store.set_send_state(SendState::Idle);
                Ok(())
            }
            Some(Err(e)) => {
                tracing::warn!(conv_id = %conversation_id, error = %e, "Send failed");
                self.store.set_send_state(SendState::Failed {
                    conversation_id,
                    message: e.message.clone(),
                    content: text.to_string(),
                });
                Err(SyncError::Gateway(e))
            }
        }
    }

    fn step_chat(
        &self,
        slot: &mut ChatSlot,
        event: Event<Message>,
    ) -> Result<Option<(u32, u64)>, TransitionError> {
        let effects = step(&mut slot.collection, event)?;
        Ok(run_effects(&effects, || {
            if let Some(id) = slot.conversation_id {
                self.store
                    .set_chat(ChatState::new(id, slot.collection.page_state.clone()));
            }
        }))
    }
}

/// Apply `event` in place and hand back the effects to run.
fn step<T: Clone>(
    collection: &mut CollectionState<T>,
    event: Event<T>,
) -> Result<Vec<Effect>, TransitionError> {
    let result = transition(collection, event)?;
    *collection = result.new_state;
    Ok(result.effects)
}

/// Run `Publish` effects and return the fetch to perform, if any.
fn run_effects(effects: &[Effect], mut publish: impl FnMut()) -> Option<(u32, u64)> {
    let mut fetch = None;
    for effect in effects {
        match *effect {
            Effect::Publish => publish(),
            Effect::Fetch { page, generation } => fetch = Some((page, generation)),
        }
    }
    fetch
}

/// Map a scoped gateway outcome to the event to apply and the error to return.
fn outcome_to_event<T>(
    generation: u64,
    outcome: Option<Result<Page<T>, GatewayError>>,
) -> (Event<T>, Option<SyncError>) {
    match outcome {
        Some(Ok(page)) => (Event::PageLoaded { generation, page }, None),
        Some(Err(e)) => (
            Event::LoadFailed {
                generation,
                message: e.message.clone(),
            },
            Some(SyncError::Gateway(e)),
        ),
        None => (Event::Abandoned { generation }, Some(SyncError::Cancelled)),
    }
}
