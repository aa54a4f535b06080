//! Observable holder of the latest view-state
//!
//! One writer (the synchronizer), any number of readers. Each slot is a
//! `watch` channel, so readers always see the newest value and never a queue
//! of stale ones.

use crate::gateway::Conversation;
use crate::state::{ChatState, PageState, SendState};
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

pub struct StateStore {
    conversations: watch::Sender<PageState<Conversation>>,
    chat: watch::Sender<ChatState>,
    send: watch::Sender<SendState>,
    draft: watch::Sender<String>,
}

impl Default for StateStore {
    fn default() -> Self {
        Self::new()
    }
}

impl StateStore {
    pub fn new() -> Self {
        Self {
            conversations: watch::Sender::new(PageState::Idle),
            chat: watch::Sender::new(ChatState::default()),
            send: watch::Sender::new(SendState::Idle),
            draft: watch::Sender::new(String::new()),
        }
    }

    pub fn current_conversations_state(&self) -> PageState<Conversation> {
        self.conversations.borrow().clone()
    }

    pub fn current_chat_state(&self) -> ChatState {
        self.chat.borrow().clone()
    }

    pub fn current_send_state(&self) -> SendState {
        self.send.borrow().clone()
    }

    pub fn draft(&self) -> String {
        self.draft.borrow().clone()
    }

    pub fn subscribe_conversations(&self) -> watch::Receiver<PageState<Conversation>> {
        self.conversations.subscribe()
    }

    pub fn subscribe_chat(&self) -> watch::Receiver<ChatState> {
        self.chat.subscribe()
    }

    pub fn subscribe_send(&self) -> watch::Receiver<SendState> {
        self.send.subscribe()
    }

    pub fn conversations_stream(&self) -> WatchStream<PageState<Conversation>> {
        WatchStream::new(self.subscribe_conversations())
    }

    pub fn chat_stream(&self) -> WatchStream<ChatState> {
        WatchStream::new(self.subscribe_chat())
    }

    /// The input buffer is owned by the UI; the synchronizer only clears it
    /// after a successful send.
    pub fn set_draft(&self, text: impl Into<String>) {
        self.draft.send_replace(text.into());
    }

    pub(crate) fn set_conversations(&self, state: PageState<Conversation>) {
        self.conversations.send_replace(state);
    }

    pub(crate) fn set_chat(&self, state: ChatState) {
        self.chat.send_replace(state);
    }

    pub(crate) fn set_send_state(&self, state: SendState) {
        self.send.send_replace(state);
    }

    pub(crate) fn clear_draft(&self) {
        self.draft.send_replace(String::new());
    }
}
