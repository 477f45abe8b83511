//! Client-side pager over the derived list.
//!
//! The pager only tracks how many items are revealed. It grows by one page
//! at a time, never past the list length, and is reset to a single page by
//! the catalog whenever the list it windows over changes identity
//! (new canonical list, favorites-only toggled, sort key changed).

/// Revealed-window state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pager {
    page_size: usize,
    visible_count: usize,
}

impl Pager {
    /// A pager showing one page. A zero page size is treated as one.
    pub fn new(page_size: usize) -> Self {
        let page_size = page_size.max(1);
        Self {
            page_size,
            visible_count: page_size,
        }
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn visible_count(&self) -> usize {
        self.visible_count
    }

    /// Number of items actually shown for a list of `total` items.
    pub fn visible_len(&self, total: usize) -> usize {
        self.visible_count.min(total)
    }

    /// Whether another page can be revealed.
    pub fn has_more(&self, total: usize, favorites_only: bool) -> bool {
        !favorites_only && self.visible_count < total
    }

    /// Reveal one more page, clamped to `total`. Returns whether the count
    /// changed.
    pub fn grow_by_one_page(&mut self, total: usize) -> bool {
        if self.visible_count >= total {
            return false;
        }
        self.visible_count = (self.visible_count + self.page_size).min(total);
        true
    }

    /// Back to a single page.
    pub fn reset(&mut self) {
        self.visible_count = self.page_size;
    }
}

impl Default for Pager {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_PAGE_SIZE)
    }
}
