/// Products shown per page of the listing
pub const PAGE_SIZE: usize = 12;

/// Slices a filtered list into fixed-size, 1-indexed pages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paginator {
    page_size: usize,
}

impl Default for Paginator {
    fn default() -> Self {
        Self::new(PAGE_SIZE)
    }
}

impl Paginator {
    /// A zero page size would never make progress, so it is bumped to 1
    pub fn new(page_size: usize) -> Self {
        Self {
            page_size: page_size.max(1),
        }
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn total_pages(&self, item_count: usize) -> usize {
        item_count.div_ceil(self.page_size)
    }

    /// Items on page `n`; empty when `n` is out of range
    pub fn page<'a, T>(&self, items: &'a [T], n: usize) -> &'a [T] {
        if n == 0 {
            return &[];
        }
        let start = (n - 1).saturating_mul(self.page_size).min(items.len());
        let end = start.saturating_add(self.page_size).min(items.len());
        &items[start..end]
    }

    /// Move `current` to `n` if that page exists. Returns whether it moved.
    pub fn go_to(&self, current: &mut usize, n: usize, item_count: usize) -> bool {
        if n < 1 || n > self.total_pages(item_count) {
            return false;
        }
        *current = n;
        true
    }

    pub fn next(&self, current: &mut usize, item_count: usize) -> bool {
        self.go_to(current, current.saturating_add(1), item_count)
    }

    pub fn previous(&self, current: &mut usize, item_count: usize) -> bool {
        self.go_to(current, current.saturating_sub(1), item_count)
    }

    /// Page controls only make sense once there is more than one page
    pub fn controls_visible(&self, item_count: usize) -> bool {
        item_count > self.page_size
    }
}
