//! Page bookkeeping for one paginated collection

/// Current/total page pair as last reported by the server.
///
/// `current_page == 0` means nothing has been fetched yet; the first request
/// is always page 1.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PaginationCursor {
    current_page: u32,
    total_pages: u32,
}

impl PaginationCursor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_page(&self) -> u32 {
        self.current_page
    }

    pub fn total_pages(&self) -> u32 {
        self.total_pages
    }

    /// Record a successful fetch. A page number past the reported total is
    /// clamped so `current_page <= total_pages` always holds afterwards.
    pub fn advance(&mut self, new_page: u32, new_total: u32) {
        self.total_pages = new_total;
        self.current_page = new_page.min(new_total);
    }

    pub fn can_load_more(&self) -> bool {
        self.current_page < self.total_pages
    }

    /// Page to request for the next load-more
    pub fn next_page(&self) -> u32 {
        self.current_page + 1
    }

    /// Forget everything; used before a fresh first-page fetch.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
