//! Effects produced by state transitions

/// Work the synchronizer performs after a transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// Push the collection's page state to the store
    Publish,

    /// Ask the gateway for `page`; the answer must carry `generation`
    Fetch { page: u32, generation: u64 },
}

impl Effect {
    pub fn fetch(page: u32, generation: u64) -> Self {
        Effect::Fetch { page, generation }
    }
}
