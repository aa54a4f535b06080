//! Mock gateway for synchronizer tests

use crate::gateway::{
    Conversation, ConversationId, GatewayError, Message, Page, RemoteGateway, Sender,
};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;

/// Call recorded by the mock
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    ListConversations { page: u32, page_size: u32 },
    GetMessages { conversation_id: ConversationId, page: u32 },
    SendMessage { conversation_id: ConversationId, content: String },
}

/// Gateway that answers from queued responses.
///
/// With `gated()`, every call blocks until the test calls `release()`, which
/// lets tests observe intermediate states and overlap requests.
#[derive(Default)]
pub struct MockGateway {
    conversations: Mutex<VecDeque<Result<Page<Conversation>, GatewayError>>>,
    messages: Mutex<VecDeque<Result<Page<Message>, GatewayError>>>,
    sends: Mutex<VecDeque<Result<Vec<Message>, GatewayError>>>,
    calls: Mutex<Vec<Call>>,
    gate: Option<Arc<Semaphore>>,
}

impl MockGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn gated() -> Self {
        Self {
            gate: Some(Arc::new(Semaphore::new(0))),
            ..Self::default()
        }
    }

    /// Let `n` blocked calls proceed
    pub fn release(&self, n: usize) {
        if let Some(gate) = &self.gate {
            gate.add_permits(n);
        }
    }

    pub fn queue_conversations(&self, result: Result<Page<Conversation>, GatewayError>) {
        self.conversations.lock().unwrap().push_back(result);
    }

    pub fn queue_messages(&self, result: Result<Page<Message>, GatewayError>) {
        self.messages.lock().unwrap().push_back(result);
    }

    pub fn queue_send(&self, result: Result<Vec<Message>, GatewayError>) {
        self.sends.lock().unwrap().push_back(result);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    async fn pass_gate(&self) {
        if let Some(gate) = &self.gate {
            gate.acquire().await.unwrap().forget();
        }
    }
}

#[async_trait]
impl RemoteGateway for MockGateway {
    async fn list_conversations(
        &self,
        page: u32,
        page_size: u32,
    ) -> Result<Page<Conversation>, GatewayError> {
        self.calls
            .lock()
            .unwrap()
            .push(Call::ListConversations { page, page_size });
        self.pass_gate().await;
        self.conversations
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(GatewayError::network("No mock response queued")))
    }

    async fn get_messages(
        &self,
        conversation_id: ConversationId,
        page: u32,
        _page_size: u32,
    ) -> Result<Page<Message>, GatewayError> {
        self.calls.lock().unwrap().push(Call::GetMessages {
            conversation_id,
            page,
        });
        self.pass_gate().await;
        self.messages
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(GatewayError::network("No mock response queued")))
    }

    async fn send_message(
        &self,
        conversation_id: ConversationId,
        content: &str,
    ) -> Result<Vec<Message>, GatewayError> {
        self.calls.lock().unwrap().push(Call::SendMessage {
            conversation_id,
            content: content.to_string(),
        });
        self.pass_gate().await;
        self.sends
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(GatewayError::network("No mock response queued")))
    }
}

pub fn conversation(id: i64) -> Conversation {
    Conversation {
        id: ConversationId(id),
        title: Some(format!("Conversation {id}")),
        created_at: "2024-05-01T10:00:00Z".to_string(),
        updated_at: "2024-05-01T10:00:00Z".to_string(),
    }
}

pub fn message(id: i64, conversation_id: i64, content: &str) -> Message {
    Message {
        id,
        conversation_id: Some(ConversationId(conversation_id)),
        sender: Sender::User(Some("user".to_string())),
        content: Some(content.to_string()),
        url: None,
        created_at: Some("2024-05-01T10:00:00Z".to_string()),
        rating: None,
        comment: None,
        trace_id: None,
        original_file_name: None,
    }
}
