/// A page position within `[1, total_pages]`. With no pages at all the window
/// sits on page 1 and can move in neither direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    page: u32,
    size: u32,
    total_pages: u32,
}

impl PageWindow {
    pub fn new(size: u32) -> Self {
        Self {
            page: 1,
            size: size.max(1),
            total_pages: 0,
        }
    }

    /// Window sized for `count` items.
    pub fn for_count(count: usize, size: u32) -> Self {
        let mut window = Self::new(size);
        window.set_total_pages(pages_for(count, window.size));
        window
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn total_pages(&self) -> u32 {
        self.total_pages
    }

    pub fn set_total_pages(&mut self, total_pages: u32) {
        self.total_pages = total_pages;
        self.page = self.clamp(self.page);
    }

    /// Jump to `page`, clamped into range.
    pub fn set_page(&mut self, page: u32) {
        self.page = self.clamp(page);
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    pub fn has_prev(&self) -> bool {
        self.page > 1
    }

    /// The page after this one, if any.
    pub fn next_page(&self) -> Option<u32> {
        self.has_next().then(|| self.page + 1)
    }

    pub fn prev_page(&self) -> Option<u32> {
        self.has_prev().then(|| self.page - 1)
    }

    /// Advance one page. Returns false (and changes nothing) at the last page.
    pub fn next(&mut self) -> bool {
        match self.next_page() {
            Some(p) => {
                self.page = p;
                true
            }
            None => false,
        }
    }

    /// Step back one page. Returns false (and changes nothing) at page 1.
    pub fn prev(&mut self) -> bool {
        match self.prev_page() {
            Some(p) => {
                self.page = p;
                true
            }
            None => false,
        }
    }

    /// The slice of `items` this window covers.
    pub fn slice<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        let size = self.size as usize;
        let start = (self.page as usize - 1).saturating_mul(size).min(items.len());
        let end = start.saturating_add(size).min(items.len());
        &items[start..end]
    }

    fn clamp(&self, page: u32) -> u32 {
        page.clamp(1, self.total_pages.max(1))
    }
}

pub fn pages_for(count: usize, size: u32) -> u32 {
    let size = size.max(1) as usize;
    u32::try_from(count.div_ceil(size)).unwrap_or(u32::MAX)
}

/// Rows of at most two for a two-column layout; the last row may hold one.
pub fn group_pairs<T>(items: &[T]) -> Vec<&[T]> {
    items.chunks(2).collect()
}
