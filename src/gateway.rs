//! Remote gateway abstraction
//!
//! Single-attempt wrappers around the conversation REST endpoints.

mod cipher;
mod error;
mod http;
mod types;

pub use cipher::{CipherError, PayloadCipher};
pub use error::{GatewayError, GatewayErrorKind};
pub use http::HttpGateway;
pub use types::{parse_timestamp, Conversation, ConversationId, Message, Page, Sender};

#[cfg(test)]
pub(crate) use cipher::testing as cipher_testing;

use async_trait::async_trait;
use std::sync::Arc;

/// REST operations the synchronizer depends on
#[async_trait]
pub trait RemoteGateway: Send + Sync {
    /// `GET /conversations?page={n}&per_page={m}`
    async fn list_conversations(
        &self,
        page: u32,
        page_size: u32,
    ) -> Result<Page<Conversation>, GatewayError>;

    /// `GET /conversations/{id}?page={n}&per_page={m}`
    ///
    /// Fails with `NotFound` when the server does not know the id.
    async fn get_messages(
        &self,
        conversation_id: ConversationId,
        page: u32,
        page_size: u32,
    ) -> Result<Page<Message>, GatewayError>;

    /// `POST /messages/send_message`, returning the message tail the server
    /// echoes back. Content is not validated here.
    async fn send_message(
        &self,
        conversation_id: ConversationId,
        content: &str,
    ) -> Result<Vec<Message>, GatewayError>;
}

#[async_trait]
impl<T: RemoteGateway + ?Sized> RemoteGateway for Arc<T> {
    async fn list_conversations(
        &self,
        page: u32,
        page_size: u32,
    ) -> Result<Page<Conversation>, GatewayError> {
        (**self).list_conversations(page, page_size).await
    }

    async fn get_messages(
        &self,
        conversation_id: ConversationId,
        page: u32,
        page_size: u32,
    ) -> Result<Page<Message>, GatewayError> {
        (**self).get_messages(conversation_id, page, page_size).await
    }

    async fn send_message(
        &self,
        conversation_id: ConversationId,
        content: &str,
    ) -> Result<Vec<Message>, GatewayError> {
        (**self).send_message(conversation_id, content).await
    }
}

/// Logging wrapper for gateways
pub struct LoggingGateway<G> {
    inner: G,
}

impl<G: RemoteGateway> LoggingGateway<G> {
    pub fn new(inner: G) -> Self {
        Self { inner }
    }
}

fn log_outcome<T>(
    operation: &'static str,
    started: std::time::Instant,
    result: &Result<T, GatewayError>,
    count: impl FnOnce(&T) -> usize,
) {
    let duration = started.elapsed();
    match result {
        Ok(value) => {
            tracing::info!(
                operation,
                duration_ms = %duration.as_millis(),
                items = count(value),
                "Gateway request completed"
            );
        }
        Err(e) => {
            tracing::error!(
                operation,
                duration_ms = %duration.as_millis(),
                error = %e.message,
                kind = e.kind.as_str(),
                retryable = e.kind.is_retryable(),
                "Gateway request failed"
            );
        }
    }
}

#[async_trait]
impl<G: RemoteGateway> RemoteGateway for LoggingGateway<G> {
    async fn list_conversations(
        &self,
        page: u32,
        page_size: u32,
    ) -> Result<Page<Conversation>, GatewayError> {
        let started = std::time::Instant::now();
        let result = self.inner.list_conversations(page, page_size).await;
        log_outcome("list_conversations", started, &result, |p| p.items.len());
        result
    }

    async fn get_messages(
        &self,
        conversation_id: ConversationId,
        page: u32,
        page_size: u32,
    ) -> Result<Page<Message>, GatewayError> {
        let started = std::time::Instant::now();
        let result = self
            .inner
            .get_messages(conversation_id, page, page_size)
            .await;
        log_outcome("get_messages", started, &result, |p| p.items.len());
        result
    }

    async fn send_message(
        &self,
        conversation_id: ConversationId,
        content: &str,
    ) -> Result<Vec<Message>, GatewayError> {
        let started = std::time::Instant::now();
        let result = self.inner.send_message(conversation_id, content).await;
        log_outcome("send_message", started, &result, Vec::len);
        result
    }
}
