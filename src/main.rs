//! Demo shell: loads the conversation list (and optionally one conversation)
//! and prints every published state as a JSON line.

use conversation_sync::{
    Config, ConversationId, HttpGateway, LoggingGateway, StateStore, Synchronizer,
};
use futures::StreamExt;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "conversation_sync=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(std::io::stderr)
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    let config = Config::from_env()?;
    let conversation_id = std::env::args()
        .nth(1)
        .map(|arg| arg.parse::<ConversationId>())
        .transpose()?;

    tracing::info!(base_url = %config.gateway.base_url, page_size = config.page_size, "Starting");

    let gateway = LoggingGateway::new(HttpGateway::new(config.gateway)?);
    let store = Arc::new(StateStore::new());
    let sync = Synchronizer::new(gateway, Arc::clone(&store), config.page_size);

    // Print states as they are published
    let mut conversations = store.conversations_stream();
    let mut chat = store.chat_stream();
    let printer = tokio::spawn(async move {
        loop {
            let line = tokio::select! {
                Some(state) = conversations.next() => serde_json::json!({ "conversations": state }),
                Some(state) = chat.next() => serde_json::json!({ "chat": state }),
                else => break,
            };
            println!("{line}");
        }
    });

    let result = async {
        sync.load_conversations(false).await?;
        while store.current_conversations_state().can_load_more() {
            let before = sync.conversations_cursor().await.current_page();
            sync.load_conversations(true).await?;
            // A server that keeps answering the same page would loop forever
            if sync.conversations_cursor().await.current_page() <= before {
                tracing::warn!(page = before, "Conversation list stopped advancing");
                break;
            }
        }
        if let Some(id) = conversation_id {
            sync.load_chat(id, false).await?;
        }
        Ok::<_, conversation_sync::SyncError>(())
    }
    .await;

    if let Some(conv) = store
        .current_conversations_state()
        .items()
        .iter()
        .max_by_key(|c| c.updated_at_utc())
    {
        tracing::info!(conv_id = %conv.id, updated_at = %conv.updated_at, "Most recently updated conversation");
    }

    sync.shutdown();
    drop(store);
    drop(sync);
    // Streams end once every sender is gone
    if let Err(e) = printer.await {
        tracing::warn!(error = %e, "State printer task failed");
    }

    result?;
    Ok(())
}
