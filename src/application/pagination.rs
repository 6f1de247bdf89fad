//! Page-number pagination for list views.
//!
//! Pages are 1-based. Missing or non-numeric page parameters select the first
//! page; numbers outside `1..=num_pages` clamp to the nearest valid page.
//! A collection with no items still has one (empty) page.

use std::num::NonZeroUsize;

use serde::{Serialize, Serializer};

pub const DEFAULT_PER_PAGE: usize = 10;

/// A requested page number as parsed from user input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageNumber(i64);

impl PageNumber {
    pub const FIRST: PageNumber = PageNumber(1);

    pub fn new(value: i64) -> Self {
        Self(value)
    }

    /// Parse a raw `page` parameter; anything that is not an integer means page 1.
    ///
    /// Integers too large for `i64` saturate so they still clamp to the nearest
    /// valid page.
    pub fn parse(raw: Option<&str>) -> Self {
        let Some(value) = raw.map(str::trim) else {
            return Self::FIRST;
        };
        if let Ok(number) = value.parse::<i64>() {
            return Self(number);
        }

        let (negative, digits) = match value.as_bytes().first() {
            Some(b'-') => (true, &value[1..]),
            Some(b'+') => (false, &value[1..]),
            _ => (false, value),
        };
        if digits.is_empty() || !digits.bytes().all(|byte| byte.is_ascii_digit()) {
            return Self::FIRST;
        }
        Self(if negative { i64::MIN } else { i64::MAX })
    }

    pub fn get(self) -> i64 {
        self.0
    }
}

impl Default for PageNumber {
    fn default() -> Self {
        Self::FIRST
    }
}

impl From<Option<&str>> for PageNumber {
    fn from(raw: Option<&str>) -> Self {
        Self::parse(raw)
    }
}

/// Resolved slice of an ordered collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub number: usize,
    pub num_pages: usize,
    pub per_page: usize,
    pub total: u64,
    pub offset: u64,
    pub limit: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paginator {
    per_page: NonZeroUsize,
}

impl Paginator {
    pub fn new(per_page: NonZeroUsize) -> Self {
        Self { per_page }
    }

    pub fn num_pages(&self, total: u64) -> usize {
        let per_page = self.per_page.get() as u64;
        let pages = total.div_ceil(per_page).max(1);
        usize::try_from(pages).unwrap_or(usize::MAX)
    }

    /// Clamp `requested` against `total` items and compute the slice bounds.
    pub fn locate(&self, total: u64, requested: PageNumber) -> PageWindow {
        let num_pages = self.num_pages(total);
        let number = requested.get().clamp(1, num_pages as i64) as usize;
        let per_page = self.per_page.get() as u64;
        let offset = (number as u64 - 1) * per_page;
        let limit = per_page.min(total.saturating_sub(offset));

        PageWindow {
            number,
            num_pages,
            per_page: self.per_page.get(),
            total,
            offset,
            limit,
        }
    }

    /// Paginate an already materialised, ordered collection.
    pub fn paginate<T>(&self, items: Vec<T>, requested: PageNumber) -> Page<T> {
        let window = self.locate(items.len() as u64, requested);
        let items = items
            .into_iter()
            .skip(window.offset as usize)
            .take(window.limit as usize)
            .collect();
        Page::from_window(items, window)
    }
}

impl Default for Paginator {
    fn default() -> Self {
        Self::new(NonZeroUsize::new(DEFAULT_PER_PAGE).unwrap_or(NonZeroUsize::MIN))
    }
}

/// One page of results plus the metadata list views need.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub number: usize,
    pub num_pages: usize,
    pub per_page: usize,
    pub total: u64,
}

impl<T> Page<T> {
    pub fn from_window(items: Vec<T>, window: PageWindow) -> Self {
        Self {
            items,
            number: window.number,
            num_pages: window.num_pages,
            per_page: window.per_page,
            total: window.total,
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn has_next(&self) -> bool {
        self.number < self.num_pages
    }

    pub fn has_previous(&self) -> bool {
        self.number > 1
    }

    pub fn has_other_pages(&self) -> bool {
        self.has_next() || self.has_previous()
    }

    pub fn next_page_number(&self) -> Option<usize> {
        self.has_next().then_some(self.number + 1)
    }

    pub fn previous_page_number(&self) -> Option<usize> {
        self.has_previous().then_some(self.number - 1)
    }

    /// 1-based index of the first item on this page, or 0 when the page is empty.
    pub fn start_index(&self) -> u64 {
        if self.total == 0 {
            return 0;
        }
        (self.number as u64 - 1) * self.per_page as u64 + 1
    }

    /// 1-based index of the last item on this page, or 0 when the page is empty.
    pub fn end_index(&self) -> u64 {
        if self.total == 0 {
            return 0;
        }
        self.start_index() + self.items.len() as u64 - 1
    }
}

/// Wire form of a [`Page`], including the navigation fields derived from it.
#[derive(Serialize)]
struct PageJson<'a, T> {
    items: &'a [T],
    number: usize,
    num_pages: usize,
    per_page: usize,
    total: u64,
    has_next: bool,
    has_previous: bool,
    next_page_number: Option<usize>,
    previous_page_number: Option<usize>,
    start_index: u64,
    end_index: u64,
}

impl<T: Serialize> Serialize for Page<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        PageJson {
            items: &self.items,
            number: self.number,
            num_pages: self.num_pages,
            per_page: self.per_page,
            total: self.total,
            has_next: self.has_next(),
            has_previous: self.has_previous(),
            next_page_number: self.next_page_number(),
            previous_page_number: self.previous_page_number(),
            start_index: self.start_index(),
            end_index: self.end_index(),
        }
        .serialize(serializer)
    }
}
