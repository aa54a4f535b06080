//! `reqwest` implementation of the remote gateway

use super::cipher::{open_json, seal_json};
use super::types::{PageEnvelope, SendMessageBody};
use super::{Conversation, ConversationId, GatewayError, Message, Page, RemoteGateway};
use crate::config::GatewayConfig;
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;

pub struct HttpGateway {
    client: Client,
    config: GatewayConfig,
}

impl HttpGateway {
    pub fn new(config: GatewayConfig) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| GatewayError::unknown(format!("Failed to create HTTP client: {e}")))?;
        Ok(Self { client, config })
    }

    fn authorize(&self, mut request: RequestBuilder) -> RequestBuilder {
        if let Some(token) = self.config.token_provider.token() {
            request = request.bearer_auth(token);
        }
        if let Some(tz) = &self.config.timezone {
            request = request.header("timezone", tz);
        }
        request
            .header("x-request-id", uuid::Uuid::new_v4().to_string())
            .header("accept", "application/json")
    }

    fn with_json_body(
        &self,
        request: RequestBuilder,
        body: &impl serde::Serialize,
    ) -> Result<RequestBuilder, GatewayError> {
        let json = serde_json::to_vec(body)
            .map_err(|e| GatewayError::unknown(format!("Failed to encode request: {e}")))?;
        let bytes = match &self.config.cipher {
            Some(cipher) => seal_json(cipher.as_ref(), &json)
                .map_err(|e| GatewayError::unknown(format!("Failed to seal request: {e}")))?,
            None => json,
        };
        Ok(request.header("content-type", "application/json").body(bytes))
    }

    async fn fetch<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, GatewayError> {
        let response = self.authorize(request).send().await.map_err(|e| {
            if e.is_timeout() {
                GatewayError::network(format!("Request timeout: {e}"))
            } else if e.is_connect() {
                GatewayError::network(format!("Connection failed: {e}"))
            } else {
                GatewayError::network(format!("Request failed: {e}"))
            }
        })?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| GatewayError::network(format!("Failed to read response: {e}")))?;

        if !status.is_success() {
            return Err(classify_error(status, &String::from_utf8_lossy(&body)));
        }

        let plain = match &self.config.cipher {
            Some(cipher) => open_json(cipher.as_ref(), &body)
                .map_err(|e| GatewayError::decode(format!("Failed to open response: {e}")))?,
            None => body.to_vec(),
        };

        serde_json::from_slice(&plain)
            .map_err(|e| GatewayError::decode(format!("Failed to parse response: {e}")))
    }
}

fn classify_error(status: StatusCode, body: &str) -> GatewayError {
    match status.as_u16() {
        404 => GatewayError::not_found(format!("Not found: {body}")),
        401 | 403 => GatewayError::auth(format!("Authentication failed: {body}")),
        500..=599 => GatewayError::server_error(format!("Server error: {body}")),
        _ => GatewayError::unknown(format!("HTTP {status}: {body}")),
    }
}

fn page_query(page: u32, page_size: u32) -> [(&'static str, u32); 2] {
    [("page", page), ("per_page", page_size)]
}

#[async_trait]
impl RemoteGateway for HttpGateway {
    async fn list_conversations(
        &self,
        page: u32,
        page_size: u32,
    ) -> Result<Page<Conversation>, GatewayError> {
        let request = self
            .client
            .get(self.config.url("conversations"))
            .query(&page_query(page, page_size));
        let envelope: PageEnvelope<Conversation> = self.fetch(request).await?;
        Ok(envelope.into_page(page))
    }

    async fn get_messages(
        &self,
        conversation_id: ConversationId,
        page: u32,
        page_size: u32,
    ) -> Result<Page<Message>, GatewayError> {
        let request = self
            .client
            .get(self.config.url(&format!("conversations/{conversation_id}")))
            .query(&page_query(page, page_size));
        let envelope: PageEnvelope<Message> = self.fetch(request).await?;
        let mut page = envelope.into_page(page);
        for message in &mut page.items {
            message.conversation_id.get_or_insert(conversation_id);
        }
        Ok(page)
    }

    async fn send_message(
        &self,
        conversation_id: ConversationId,
        content: &str,
    ) -> Result<Vec<Message>, GatewayError> {
        let body = SendMessageBody {
            conversation_id,
            message: content,
        };
        let request = self.with_json_body(
            self.client.post(self.config.url("messages/send_message")),
            &body,
        )?;
        let envelope: PageEnvelope<Message> = self.fetch(request).await?;
        let mut items = envelope.items;
        for message in &mut items {
            message.conversation_id.get_or_insert(conversation_id);
        }
        Ok(items)
    }
}
