//! Skip/limit pagination primitives shared by list endpoints.
//!
//! [`PageRequest`] normalises raw query parameters: `skip` must be
//! non-negative and `limit` is clamped into `[MIN_LIMIT, MAX_LIMIT]`,
//! defaulting to [`DEFAULT_LIMIT`]. [`Page`] is the response envelope carrying
//! the matching total and a `has_more` flag computed as
//! `skip + returned < total`.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

/// Page size used when the caller does not supply a limit.
pub const DEFAULT_LIMIT: u32 = 10;
/// Smallest page size a request may resolve to.
pub const MIN_LIMIT: u32 = 1;
/// Largest page size a request may resolve to.
pub const MAX_LIMIT: u32 = 100;

/// Errors raised while normalising page request parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PageRequestError {
    /// `skip` was below zero.
    #[error("skip must be greater than or equal to 0, got {value}")]
    NegativeSkip {
        /// Offending value.
        value: i64,
    },
}

/// Normalised offset pagination request.
///
/// # Examples
/// ```
/// use pagination::{PageRequest, MAX_LIMIT};
///
/// let request = PageRequest::new(Some(20), Some(500)).expect("skip is valid");
/// assert_eq!(request.skip(), 20);
/// assert_eq!(request.limit(), MAX_LIMIT);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    skip: u64,
    limit: u32,
}

impl PageRequest {
    /// Build a request from raw, optional query values.
    ///
    /// # Errors
    ///
    /// Returns [`PageRequestError::NegativeSkip`] when `skip` is negative.
    pub fn new(skip: Option<i64>, limit: Option<i64>) -> Result<Self, PageRequestError> {
        let skip = match skip {
            None => 0,
            Some(value) => {
                u64::try_from(value).map_err(|_| PageRequestError::NegativeSkip { value })?
            }
        };
        Ok(Self {
            skip,
            limit: clamp_limit(limit),
        })
    }

    /// Number of records to skip.
    #[must_use]
    pub const fn skip(&self) -> u64 {
        self.skip
    }

    /// Maximum number of records to return.
    #[must_use]
    pub const fn limit(&self) -> u32 {
        self.limit
    }

    /// The request for the page that follows this one.
    #[must_use]
    pub const fn next(&self) -> Self {
        Self {
            skip: self.skip.saturating_add(self.limit as u64),
            limit: self.limit,
        }
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            skip: 0,
            limit: DEFAULT_LIMIT,
        }
    }
}

fn clamp_limit(limit: Option<i64>) -> u32 {
    match limit {
        None => DEFAULT_LIMIT,
        Some(value) => {
            let clamped = value.clamp(i64::from(MIN_LIMIT), i64::from(MAX_LIMIT));
            u32::try_from(clamped).unwrap_or(DEFAULT_LIMIT)
        }
    }
}

/// One page of results plus the metadata needed to request the next page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    items: Vec<T>,
    total: u64,
    skip: u64,
    limit: u32,
    has_more: bool,
}

impl<T> Page<T> {
    /// Wrap a slice of results returned for `request` out of `total` matches.
    ///
    /// # Examples
    /// ```
    /// use pagination::{Page, PageRequest};
    ///
    /// let request = PageRequest::new(Some(0), Some(2)).expect("valid request");
    /// let page = Page::new(vec!["a", "b"], 3, request);
    /// assert!(page.has_more());
    /// ```
    #[must_use]
    pub fn new(items: Vec<T>, total: u64, request: PageRequest) -> Self {
        let returned = u64::try_from(items.len()).unwrap_or(u64::MAX);
        let has_more = request.skip().saturating_add(returned) < total;
        Self {
            items,
            total,
            skip: request.skip(),
            limit: request.limit(),
            has_more,
        }
    }

    /// Items on this page.
    #[must_use]
    pub fn items(&self) -> &[T] {
        &self.items
    }

    /// Total number of records matching the query across all pages.
    #[must_use]
    pub const fn total(&self) -> u64 {
        self.total
    }

    /// Offset this page starts at.
    #[must_use]
    pub const fn skip(&self) -> u64 {
        self.skip
    }

    /// Page size that was requested after clamping.
    #[must_use]
    pub const fn limit(&self) -> u32 {
        self.limit
    }

    /// Whether more records exist beyond this page.
    #[must_use]
    pub const fn has_more(&self) -> bool {
        self.has_more
    }

    /// Consume the page and return its items.
    #[must_use]
    pub fn into_items(self) -> Vec<T> {
        self.items
    }

    /// Convert every item while keeping the paging metadata.
    #[must_use]
    pub fn map<U, F>(self, f: F) -> Page<U>
    where
        F: FnMut(T) -> U,
    {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            skip: self.skip,
            limit: self.limit,
            has_more: self.has_more,
        }
    }

    /// Build the link for the following page from the URL that served this
    /// one, preserving unrelated query parameters.
    ///
    /// Returns `None` when this is the last page.
    ///
    /// # Examples
    /// ```
    /// use pagination::{Page, PageRequest};
    /// use url::Url;
    ///
    /// let request = PageRequest::new(Some(0), Some(1)).expect("valid request");
    /// let page = Page::new(vec![1], 2, request);
    /// let current = Url::parse("http://localhost/orders?status=pending").expect("url");
    /// let next = page.next_link(&current).expect("more results");
    /// assert_eq!(next.query(), Some("status=pending&skip=1&limit=1"));
    /// ```
    #[must_use]
    pub fn next_link(&self, current: &Url) -> Option<Url> {
        if !self.has_more {
            return None;
        }
        let next = PageRequest {
            skip: self.skip,
            limit: self.limit,
        }
        .next();
        let retained: Vec<(String, String)> = current
            .query_pairs()
            .filter(|(key, _)| key != "skip" && key != "limit")
            .map(|(key, value)| (key.into_owned(), value.into_owned()))
            .collect();
        let mut link = current.clone();
        link.query_pairs_mut()
            .clear()
            .extend_pairs(retained)
            .append_pair("skip", &next.skip().to_string())
            .append_pair("limit", &next.limit().to_string());
        Some(link)
    }
}
