//! Events that drive a collection's state machine

use crate::gateway::Page;

#[derive(Debug, Clone)]
pub enum Event<T> {
    /// Caller asked for the first page (`more == false`) or the next one
    LoadRequested { more: bool },

    /// Gateway answered the request tagged with `generation`
    PageLoaded { generation: u64, page: Page<T> },
    LoadFailed { generation: u64, message: String },

    /// Request tagged with `generation` was cancelled before it answered
    Abandoned { generation: u64 },

    /// Server echoed new items after a send; appended to the loaded list
    TailReceived { items: Vec<T> },
}
