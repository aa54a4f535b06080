//! View-state types published to observers

use crate::gateway::{ConversationId, Message};
use serde::Serialize;

/// Load state of one paginated collection
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PageState<T> {
    /// Nothing requested yet
    Idle,
    /// First page in flight
    Loading,
    Success {
        items: Vec<T>,
        /// A follow-up page is in flight
        is_loading_more: bool,
        can_load_more: bool,
    },
    /// `last_items` is the last successfully loaded list, kept so the UI can
    /// show it under an error banner.
    Error { message: String, last_items: Vec<T> },
}

impl<T> Default for PageState<T> {
    fn default() -> Self {
        PageState::Idle
    }
}

impl<T> PageState<T> {
    pub fn success(items: Vec<T>, can_load_more: bool) -> Self {
        PageState::Success {
            items,
            is_loading_more: false,
            can_load_more,
        }
    }

    /// Items to display: the loaded list, or the stale list behind an error
    pub fn items(&self) -> &[T] {
        match self {
            PageState::Success { items, .. } | PageState::Error { last_items: items, .. } => items,
            PageState::Idle | PageState::Loading => &[],
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, PageState::Success { .. })
    }

    pub fn is_loading_more(&self) -> bool {
        matches!(
            self,
            PageState::Success {
                is_loading_more: true,
                ..
            }
        )
    }

    pub fn can_load_more(&self) -> bool {
        matches!(
            self,
            PageState::Success {
                can_load_more: true,
                ..
            }
        )
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            PageState::Error { message, .. } => Some(message),
            _ => None,
        }
    }
}

/// Messages of the single conversation currently open
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChatState {
    pub conversation_id: Option<ConversationId>,
    pub messages: PageState<Message>,
}

impl ChatState {
    pub fn new(conversation_id: ConversationId, messages: PageState<Message>) -> Self {
        Self {
            conversation_id: Some(conversation_id),
            messages,
        }
    }

    pub fn is_open(&self, conversation_id: ConversationId) -> bool {
        self.conversation_id == Some(conversation_id)
    }
}

/// Outcome of the latest send
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SendState {
    #[default]
    Idle,
    Sending {
        conversation_id: ConversationId,
    },
    Failed {
        conversation_id: ConversationId,
        message: String,
        /// What the user tried to send, for a retry button
        content: String,
    },
}
