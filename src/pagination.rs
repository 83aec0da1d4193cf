use serde::Serialize;

/// Number of authors shown on one list page.
pub const PAGE_SIZE: u64 = 4;

/// Authors per grid row. Must divide the 12-column layout evenly.
pub const AUTHORS_PER_ROW: u64 = 2;

/// The slice of a paginated listing a request asked for.
///
/// `previous` and `next` are `0` when there is no such page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageWindow {
    offset: u64,
    current: u64,
    previous: u64,
    next: u64,
}

impl PageWindow {
    /// Derives the window for `requested_page` (1-based) of a listing holding
    /// `total_count` items split into pages of `page_size`.
    ///
    /// A `requested_page` of 0 is treated as the first page.
    #[must_use]
    pub fn compute(requested_page: u64, page_size: u64, total_count: u64) -> Self {
        let current = requested_page.max(1);
        let offset = Self::offset_for(current, page_size);
        let previous = current - 1;
        let next = if total_count > page_size.saturating_mul(current) {
            current + 1
        } else {
            0
        };

        Self {
            offset,
            current,
            previous,
            next,
        }
    }

    /// Offset of the first item of `page`, without needing the total count.
    #[must_use]
    pub const fn offset_for(page: u64, page_size: u64) -> u64 {
        page.saturating_sub(1).saturating_mul(page_size)
    }

    pub const fn offset(&self) -> u64 {
        self.offset
    }

    pub const fn current(&self) -> u64 {
        self.current
    }

    pub const fn previous(&self) -> Option<u64> {
        if self.previous == 0 { None } else { Some(self.previous) }
    }

    pub const fn next(&self) -> Option<u64> {
        if self.next == 0 { None } else { Some(self.next) }
    }
}

/// Reads a `page` query value. Anything missing, non-numeric or below 1 is page 1.
#[must_use]
pub fn parse_page(raw: Option<&str>) -> u64 {
    raw.and_then(|page| page.trim().parse::<u64>().ok())
        .filter(|page| *page >= 1)
        .unwrap_or(1)
}
