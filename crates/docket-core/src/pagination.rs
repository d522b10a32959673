//! # Content Pagination
//!
//! Splits the three independently paginated content streams of a printed
//! document into fixed-capacity pages:
//!
//! - line items (capacity counted in rows)
//! - term groups (capacity counted in *groups*)
//! - technical-clause groups (capacity counted in *groups*)
//!
//! ## Item Pages
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  items = [1 .. 20], first = 8, continuation = 5                         │
//! │                                                                         │
//! │  Page 1 (first)         │ 1 2 3 4 5 6 7 8 │                             │
//! │  Page 2 (continuation)  │ 9 10 11 12 13   │                             │
//! │  Page 3 (continuation)  │ 14 15 16 17 18  │                             │
//! │  Page 4 (continuation)  │ 19 20           │  ← partial chunk still a page│
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Group Pages
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Group "Payment" (3 entries)       Group "General" (1 entry)            │
//! │     Header(Payment)                   Body                              │
//! │     Body, Body, Body                  Spacer  ← dropped if page-final   │
//! │     Spacer                                                              │
//! │                                                                         │
//! │  A group is one unit of capacity no matter how many entries it has.    │
//! │  Groups with no catalog entries emit nothing and take no capacity.     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Pages are derived data: they are recomputed from the source lists on every
//! change and never persisted.

use std::num::NonZeroUsize;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::types::{ClauseEntry, LineItem};
use crate::GENERAL_GROUP;

// =============================================================================
// Capacity Configuration
// =============================================================================

/// Page capacity of one content stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageCapacity {
    pub first: NonZeroUsize,
    pub continuation: NonZeroUsize,
}

impl PageCapacity {
    /// Returns `None` when either capacity is zero.
    pub fn new(first: usize, continuation: usize) -> Option<Self> {
        Some(PageCapacity {
            first: NonZeroUsize::new(first)?,
            continuation: NonZeroUsize::new(continuation)?,
        })
    }
}

/// Process-wide capacities for all three streams. Loaded once at startup
/// and read-only afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationConfig {
    pub items_first_page: NonZeroUsize,
    pub items_continuation_page: NonZeroUsize,
    pub term_groups_first_page: NonZeroUsize,
    pub term_groups_continuation_page: NonZeroUsize,
    pub technical_groups_first_page: NonZeroUsize,
    pub technical_groups_continuation_page: NonZeroUsize,
}

impl PaginationConfig {
    pub fn items(&self) -> PageCapacity {
        PageCapacity {
            first: self.items_first_page,
            continuation: self.items_continuation_page,
        }
    }

    pub fn term_groups(&self) -> PageCapacity {
        PageCapacity {
            first: self.term_groups_first_page,
            continuation: self.term_groups_continuation_page,
        }
    }

    pub fn technical_groups(&self) -> PageCapacity {
        PageCapacity {
            first: self.technical_groups_first_page,
            continuation: self.technical_groups_continuation_page,
        }
    }
}

impl Default for PaginationConfig {
    /// Capacities of the A4 layout: the first item page shares space with the
    /// letterhead and client block, continuation pages do not.
    fn default() -> Self {
        let n = |v: usize| NonZeroUsize::new(v).unwrap_or(NonZeroUsize::MIN);
        PaginationConfig {
            items_first_page: n(8),
            items_continuation_page: n(14),
            term_groups_first_page: n(3),
            term_groups_continuation_page: n(4),
            technical_groups_first_page: n(3),
            technical_groups_continuation_page: n(4),
        }
    }
}

// =============================================================================
// Page
// =============================================================================

/// One page of one content stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    /// 1-based, sequential within the stream.
    pub page_number: usize,
    pub is_first_page: bool,
    pub is_continuation: bool,
    pub content: Vec<T>,
}

impl<T> Page<T> {
    fn first(content: Vec<T>) -> Self {
        Page {
            page_number: 1,
            is_first_page: true,
            is_continuation: false,
            content,
        }
    }

    fn numbered(page_number: usize, content: Vec<T>) -> Self {
        if page_number == 1 {
            return Page::first(content);
        }
        Page {
            page_number,
            is_first_page: false,
            is_continuation: true,
            content,
        }
    }
}

/// Tagged content of a term or technical page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GroupEntry {
    /// Group title; omitted for the general group.
    Header { group: String },
    /// One catalog clause.
    Body {
        group: String,
        entry_id: String,
        text: String,
    },
    /// Vertical gap after a group.
    Spacer,
}

// =============================================================================
// Line Items
// =============================================================================

/// Splits line items into a first page and continuation pages.
///
/// - empty input → one empty first page
/// - `len <= first` → a single page
/// - otherwise `first` rows, then chunks of `continuation` rows
///
/// Concatenating the pages' content always reproduces `items`.
pub fn paginate_items<T: Clone>(items: &[T], capacity: PageCapacity) -> Vec<Page<T>> {
    let first = capacity.first.get();

    if items.len() <= first {
        return vec![Page::first(items.to_vec())];
    }

    let (head, tail) = items.split_at(first);
    let mut pages = vec![Page::first(head.to_vec())];
    pages.extend(
        tail.chunks(capacity.continuation.get())
            .enumerate()
            .map(|(i, chunk)| Page::numbered(i + 2, chunk.to_vec())),
    );
    pages
}

// =============================================================================
// Term / Technical Groups
// =============================================================================

/// Paginates clause groups. Returns no pages when no group has entries.
///
/// `group_tags` is the ordered, deduplicated group list of the document;
/// `catalog` is the clause catalog in catalog order.
pub fn paginate_groups(
    group_tags: &[String],
    catalog: &[ClauseEntry],
    capacity: PageCapacity,
) -> Vec<Page<GroupEntry>> {
    let blocks: Vec<Vec<GroupEntry>> = group_tags
        .iter()
        .filter_map(|tag| group_block(tag, catalog))
        .collect();

    let mut pages = Vec::new();
    let mut rest = blocks.as_slice();
    let mut page_number = 1;

    while !rest.is_empty() {
        let take = if page_number == 1 {
            capacity.first.get()
        } else {
            capacity.continuation.get()
        };
        let (chunk, tail) = rest.split_at(take.min(rest.len()));

        let mut content: Vec<GroupEntry> = chunk.concat();
        if content.last() == Some(&GroupEntry::Spacer) {
            content.pop();
        }

        pages.push(Page::numbered(page_number, content));
        rest = tail;
        page_number += 1;
    }

    pages
}

/// Term pages. With no terms at all a single empty page is still produced
/// so the terms section renders.
pub fn paginate_terms(
    group_tags: &[String],
    catalog: &[ClauseEntry],
    capacity: PageCapacity,
) -> Vec<Page<GroupEntry>> {
    let pages = paginate_groups(group_tags, catalog, capacity);
    if pages.is_empty() {
        return vec![Page::first(Vec::new())];
    }
    pages
}

/// Technical pages. With no technical clauses the section is left out
/// entirely (zero pages), unlike terms.
pub fn paginate_technicals(
    group_tags: &[String],
    catalog: &[ClauseEntry],
    capacity: PageCapacity,
) -> Vec<Page<GroupEntry>> {
    paginate_groups(group_tags, catalog, capacity)
}

/// Header (unless general), bodies in catalog order, trailing spacer.
fn group_block(tag: &str, catalog: &[ClauseEntry]) -> Option<Vec<GroupEntry>> {
    let mut entries = catalog
        .iter()
        .filter(|entry| entry.group_type == tag)
        .peekable();
    entries.peek()?;

    let mut block = Vec::new();
    if !is_general_group(tag) {
        block.push(GroupEntry::Header {
            group: tag.to_string(),
        });
    }
    block.extend(entries.map(|entry| GroupEntry::Body {
        group: tag.to_string(),
        entry_id: entry.id.clone(),
        text: entry.text.clone(),
    }));
    block.push(GroupEntry::Spacer);

    Some(block)
}

pub fn is_general_group(tag: &str) -> bool {
    tag.trim().eq_ignore_ascii_case(GENERAL_GROUP)
}

// =============================================================================
// Group Collection
// =============================================================================

/// Union of every item's own group tags followed by the legacy list,
/// deduplicated in first-seen order.
pub fn collect_group_tags<'a, I>(item_tags: I, legacy: &'a [String]) -> Vec<String>
where
    I: IntoIterator<Item = &'a [String]>,
{
    let mut tags: Vec<String> = Vec::new();
    for tag in item_tags.into_iter().flatten().chain(legacy.iter()) {
        if !tags.iter().any(|t| t == tag) {
            tags.push(tag.clone());
        }
    }
    tags
}

/// Term groups referenced by a document.
pub fn term_groups(items: &[LineItem], legacy: &[String]) -> Vec<String> {
    collect_group_tags(items.iter().map(|i| i.term_refs.as_slice()), legacy)
}

/// Technical groups referenced by a document.
pub fn technical_groups(items: &[LineItem], legacy: &[String]) -> Vec<String> {
    collect_group_tags(items.iter().map(|i| i.technical_refs.as_slice()), legacy)
}

// =============================================================================
// Unit Tests
// =============================================================================
