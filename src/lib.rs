//! Paginated conversation synchronizer
//!
//! Loads, pages and mutates a remote conversation list and the messages of
//! one open conversation, publishing every change through an observable
//! state store.

pub mod config;
pub mod gateway;
pub mod pagination;
pub mod state;
pub mod store;
pub mod sync;

pub use config::{Config, ConfigError, GatewayConfig, StaticToken, TokenProvider};
pub use gateway::{
    Conversation, ConversationId, GatewayError, GatewayErrorKind, HttpGateway, LoggingGateway,
    Message, Page, PayloadCipher, RemoteGateway, Sender,
};
pub use pagination::PaginationCursor;
pub use state::{ChatState, PageState, SendState};
pub use store::StateStore;
pub use sync::{SyncError, Synchronizer};
