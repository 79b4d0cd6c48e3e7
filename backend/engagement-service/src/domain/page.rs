//! Pagination and ordering primitives shared by the stores and the
//! aggregation engine.
//!
//! Pages are 1-based. The envelope mirrors what clients of the old API
//! expect (`totalDocs`, `hasNextPage`, ...), so field names are camelCase.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::cmp::Ordering;
use uuid::Uuid;

use crate::domain::models::Video;
use crate::error::ServiceError;

pub const DEFAULT_PAGE_SIZE: i64 = 10;
pub const MAX_PAGE_SIZE: i64 = 100;
/// Keeps `offset + limit` and the envelope arithmetic inside i64
pub const MAX_PAGE: i64 = i64::MAX / (MAX_PAGE_SIZE + 1);

fn sanitize_limit(value: i64, min: i64, max: i64, default: i64) -> i64 {
    if value < min {
        default
    } else if value > max {
        max
    } else {
        value
    }
}

/// Requested page, already clamped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub limit: i64,
}

impl PageRequest {
    pub fn new(page: Option<i64>, limit: Option<i64>) -> Self {
        Self {
            page: page.filter(|p| *p >= 1).unwrap_or(1).min(MAX_PAGE),
            limit: sanitize_limit(
                limit.unwrap_or(DEFAULT_PAGE_SIZE),
                1,
                MAX_PAGE_SIZE,
                DEFAULT_PAGE_SIZE,
            ),
        }
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }

    pub fn window(&self) -> Window {
        Window {
            offset: self.offset(),
            limit: self.limit,
        }
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(None, None)
    }
}

/// OFFSET/LIMIT pair handed to the stores
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub offset: i64,
    pub limit: i64,
}

impl Window {
    /// Slice an already ordered vector
    pub fn apply<T>(&self, items: Vec<T>) -> Vec<T> {
        let offset = usize::try_from(self.offset).unwrap_or(usize::MAX);
        let limit = usize::try_from(self.limit).unwrap_or(0);
        items.into_iter().skip(offset).take(limit).collect()
    }
}

/// One window of a result set plus the pre-slice match count
#[derive(Debug, Clone)]
pub struct PageSlice<T> {
    pub items: Vec<T>,
    pub total: i64,
}

impl<T> PageSlice<T> {
    pub fn from_ordered(items: Vec<T>, window: Window) -> Self {
        let total = items.len() as i64;
        Self {
            items: window.apply(items),
            total,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub docs: Vec<T>,
    pub total_docs: i64,
    pub limit: i64,
    pub total_pages: i64,
    pub current_page: i64,
    pub paging_counter: i64,
    pub has_prev_page: bool,
    pub has_next_page: bool,
    pub prev_page: Option<i64>,
    pub next_page: Option<i64>,
}

impl<T> Page<T> {
    pub fn new(docs: Vec<T>, total_docs: i64, request: PageRequest) -> Self {
        let total_docs = total_docs.max(0);
        let total_pages = total_docs
            .saturating_add(request.limit - 1)
            .checked_div(request.limit)
            .unwrap_or(0)
            .max(1);
        let has_prev_page = request.page > 1;
        let has_next_page = request.page < total_pages;

        Self {
            docs,
            total_docs,
            limit: request.limit,
            total_pages,
            current_page: request.page,
            paging_counter: request.offset().saturating_add(1),
            has_prev_page,
            has_next_page,
            prev_page: has_prev_page.then(|| request.page - 1),
            next_page: has_next_page.then(|| request.page.saturating_add(1)),
        }
    }

    pub fn empty(request: PageRequest) -> Self {
        Self::new(Vec::new(), 0, request)
    }
}

// ============================================================================
// Ordering
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(|v| v.to_ascii_lowercase()) {
            Some(v) if v == "asc" || v == "1" => SortDirection::Asc,
            _ => SortDirection::Desc,
        }
    }

    pub fn as_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }

    fn apply(&self, ordering: Ordering) -> Ordering {
        match self {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    }
}

/// Caller-selectable sort column for video listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VideoSortField {
    #[default]
    CreatedAt,
    UpdatedAt,
    Views,
    Duration,
    Title,
}

impl VideoSortField {
    pub fn parse(value: Option<&str>) -> Result<Self, ServiceError> {
        let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) else {
            return Ok(VideoSortField::CreatedAt);
        };
        match value {
            "createdAt" | "created_at" => Ok(VideoSortField::CreatedAt),
            "updatedAt" | "updated_at" => Ok(VideoSortField::UpdatedAt),
            "views" => Ok(VideoSortField::Views),
            "duration" => Ok(VideoSortField::Duration),
            "title" => Ok(VideoSortField::Title),
            other => Err(ServiceError::InvalidInput(format!(
                "unsupported sortBy '{}'",
                other
            ))),
        }
    }

    pub fn column(&self) -> &'static str {
        match self {
            VideoSortField::CreatedAt => "created_at",
            VideoSortField::UpdatedAt => "updated_at",
            VideoSortField::Views => "views",
            VideoSortField::Duration => "duration",
            VideoSortField::Title => "title",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VideoSort {
    pub field: VideoSortField,
    pub direction: SortDirection,
}

impl VideoSort {
    /// Total order used by the in-memory store; ties fall back to id ascending
    pub fn compare(&self, a: &Video, b: &Video) -> Ordering {
        let primary = match self.field {
            VideoSortField::CreatedAt => a.created_at.cmp(&b.created_at),
            VideoSortField::UpdatedAt => a.updated_at.cmp(&b.updated_at),
            VideoSortField::Views => a.views.cmp(&b.views),
            VideoSortField::Duration => a.duration.total_cmp(&b.duration),
            VideoSortField::Title => a.title.cmp(&b.title),
        };
        self.direction.apply(primary).then_with(|| a.id.cmp(&b.id))
    }
}

/// Newest first, then id ascending
pub fn newest_first(
    a_created: DateTime<Utc>,
    a_id: Uuid,
    b_created: DateTime<Utc>,
    b_id: Uuid,
) -> Ordering {
    b_created.cmp(&a_created).then_with(|| a_id.cmp(&b_id))
}

/// Base-set filter for video listings
#[derive(Debug, Clone, Default)]
pub struct VideoFilter {
    pub owner_id: Option<Uuid>,
    /// Case-insensitive match on title or description
    pub query: Option<String>,
    pub published_only: bool,
}

impl VideoFilter {
    pub fn matches(&self, video: &Video) -> bool {
        if self.published_only && !video.is_published {
            return false;
        }
        if let Some(owner_id) = self.owner_id {
            if video.owner_id != owner_id {
                return false;
            }
        }
        if let Some(query) = self.query.as_deref() {
            let needle = query.to_lowercase();
            if !video.title.to_lowercase().contains(&needle)
                && !video.description.to_lowercase().contains(&needle)
            {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_request_clamps_limit() {
        assert_eq!(PageRequest::new(None, None), PageRequest { page: 1, limit: 10 });
        assert_eq!(PageRequest::new(Some(0), Some(0)).limit, 10);
        assert_eq!(PageRequest::new(Some(-3), Some(500)), PageRequest { page: 1, limit: 100 });
        assert_eq!(PageRequest::new(Some(4), Some(25)).offset(), 75);
    }

    #[test]
    fn test_page_envelope_middle_and_last() {
        let middle = Page::new(vec![0; 10], 25, PageRequest::new(Some(2), Some(10)));
        assert_eq!(middle.total_pages, 3);
        assert!(middle.has_next_page);
        assert!(middle.has_prev_page);
        assert_eq!(middle.paging_counter, 11);
        assert_eq!(middle.next_page, Some(3));

        let last = Page::new(vec![0; 5], 25, PageRequest::new(Some(3), Some(10)));
        assert!(!last.has_next_page);
        assert_eq!(last.next_page, None);
        assert_eq!(last.prev_page, Some(2));
    }

    #[test]
    fn test_huge_page_number_does_not_overflow() {
        let request = PageRequest::new(Some(i64::MAX / 2), Some(10));
        assert_eq!(request.page, MAX_PAGE);

        let page: Page<u8> = Page::new(Vec::new(), 5, request);
        assert!(page.paging_counter > 0);
        assert_eq!(page.total_pages, 1);
        assert!(!page.has_next_page);
        assert_eq!(page.prev_page, Some(MAX_PAGE - 1));

        let window = PageRequest::new(Some(i64::MAX), Some(MAX_PAGE_SIZE)).window();
        assert!(window.offset.checked_add(window.limit).is_some());
        assert!(window.apply(vec![1, 2, 3]).is_empty());

        let beyond: Page<u8> = Page::new(Vec::new(), i64::MAX, request);
        assert!(beyond.total_pages > 0);
    }

    #[test]
    fn test_empty_page() {
        let page: Page<u8> = Page::empty(PageRequest::default());
        assert_eq!(page.total_docs, 0);
        assert_eq!(page.total_pages, 1);
        assert!(!page.has_next_page);
        assert!(!page.has_prev_page);

        let json = serde_json::to_value(&page).unwrap();
        assert_eq!(json["totalDocs"], 0);
        assert_eq!(json["docs"], serde_json::json!([]));
    }

    #[test]
    fn test_window_past_end_is_empty() {
        let slice = PageSlice::from_ordered((0..5).collect::<Vec<_>>(), Window { offset: 10, limit: 10 });
        assert!(slice.items.is_empty());
        assert_eq!(slice.total, 5);
    }

    #[test]
    fn test_sort_field_parse() {
        assert_eq!(VideoSortField::parse(None).unwrap(), VideoSortField::CreatedAt);
        assert_eq!(VideoSortField::parse(Some("views")).unwrap(), VideoSortField::Views);
        assert!(VideoSortField::parse(Some("owner; DROP TABLE videos")).is_err());
        assert_eq!(SortDirection::parse(Some("ASC")), SortDirection::Asc);
        assert_eq!(SortDirection::parse(None), SortDirection::Desc);
    }
}
