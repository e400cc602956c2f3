//! Client-side windowing over the flattened result sequence.

use serde::Serialize;

pub const PAGE_SIZE: usize = 48;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PaginationWindow {
    pub displayed_count: usize,
    pub page_size: usize,
    pub has_more: bool,
}

impl Default for PaginationWindow {
    fn default() -> Self { Self { displayed_count: PAGE_SIZE, page_size: PAGE_SIZE, has_more: false } }
}

impl PaginationWindow {
    /// First page for a fresh result set of `total` items.
    pub fn first_page(total: usize) -> Self {
        let mut w = Self::default();
        w.has_more = w.displayed_count < total;
        w
    }

    /// Grows the window by one page. Returns false (and changes nothing) when
    /// there is nothing more to show.
    pub fn advance(&mut self, total: usize) -> bool {
        if !self.has_more { return false; }
        self.displayed_count += self.page_size;
        self.has_more = self.displayed_count < total;
        true
    }

    /// Number of items actually visible for `total`.
    pub fn visible(&self, total: usize) -> usize { self.displayed_count.min(total) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_page_flags() {
        assert!(!PaginationWindow::first_page(0).has_more);
        assert!(!PaginationWindow::first_page(48).has_more);
        assert!(PaginationWindow::first_page(49).has_more);
        assert_eq!(PaginationWindow::first_page(3).visible(3), 3);
    }

    #[test]
    fn advance_until_exhausted() {
        let mut w = PaginationWindow::first_page(100);
        assert!(w.advance(100));
        assert_eq!(w.displayed_count, 96);
        assert!(w.has_more);
        assert!(w.advance(100));
        assert_eq!(w.displayed_count, 144);
        assert!(!w.has_more);
        assert_eq!(w.visible(100), 100);
        assert!(!w.advance(100));
        assert_eq!(w.displayed_count, 144);
    }
}
