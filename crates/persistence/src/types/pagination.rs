//! Pagination types for list, criteria and search results.
//!
//! A [`Pageable`] is the page request handed through from the inbound layer
//! (page index, size and sort orders); a [`Page`] is what comes back.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Default page size when the request does not specify one.
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Largest page size a request may ask for.
pub const MAX_PAGE_SIZE: u32 = 2000;

/// A page request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pageable {
    /// Zero-based page index.
    pub page: u32,

    /// Maximum number of items in the page.
    pub size: u32,

    /// Requested sort orders, most significant first.
    #[serde(default)]
    pub sort: Vec<SortOrder>,
}

impl Default for Pageable {
    fn default() -> Self {
        Self {
            page: 0,
            size: DEFAULT_PAGE_SIZE,
            sort: Vec::new(),
        }
    }
}

impl Pageable {
    /// Creates a page request without sort orders.
    pub fn new(page: u32, size: u32) -> Self {
        Self {
            page,
            size,
            sort: Vec::new(),
        }
    }

    /// Creates a request for the first page of the given size.
    pub fn first(size: u32) -> Self {
        Self::new(0, size)
    }

    /// Appends a sort order.
    pub fn with_sort(mut self, order: SortOrder) -> Self {
        self.sort.push(order);
        self
    }

    /// Returns the request for the following page.
    pub fn next(&self) -> Self {
        Self {
            page: self.page + 1,
            size: self.size,
            sort: self.sort.clone(),
        }
    }

    /// Number of items to skip.
    pub fn offset(&self) -> u64 {
        u64::from(self.page) * u64::from(self.size)
    }

    /// Checks that the size is within `1..=MAX_PAGE_SIZE`.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.size == 0 {
            return Err(ValidationError::InvalidPagination {
                message: "page size must be at least 1".to_string(),
            });
        }
        if self.size > MAX_PAGE_SIZE {
            return Err(ValidationError::InvalidPagination {
                message: format!("page size must not exceed {}", MAX_PAGE_SIZE),
            });
        }
        Ok(())
    }
}

/// Direction of a sort order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    /// Smallest first.
    #[default]
    Asc,
    /// Largest first.
    Desc,
}

impl SortDirection {
    /// SQL keyword for this direction.
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortDirection::Asc => write!(f, "asc"),
            SortDirection::Desc => write!(f, "desc"),
        }
    }
}

/// A sort order on one entity property.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SortOrder {
    /// Property name as exposed on the wire (e.g. `stateProvince`).
    pub property: String,
    /// Sort direction.
    pub direction: SortDirection,
}

impl SortOrder {
    /// Ascending order on a property.
    pub fn asc(property: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            direction: SortDirection::Asc,
        }
    }

    /// Descending order on a property.
    pub fn desc(property: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            direction: SortDirection::Desc,
        }
    }

    /// Parses a `sort` parameter value: `property[,asc|desc]`.
    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        let mut parts = s.split(',').map(str::trim);
        let property = parts.next().unwrap_or_default();
        if property.is_empty() {
            return Err(ValidationError::InvalidPagination {
                message: format!("empty sort property in '{}'", s),
            });
        }

        let direction = match parts.next() {
            None => SortDirection::Asc,
            Some(d) if d.eq_ignore_ascii_case("asc") => SortDirection::Asc,
            Some(d) if d.eq_ignore_ascii_case("desc") => SortDirection::Desc,
            Some(d) => {
                return Err(ValidationError::InvalidPagination {
                    message: format!("unknown sort direction '{}'", d),
                });
            }
        };

        if parts.next().is_some() {
            return Err(ValidationError::InvalidPagination {
                message: format!("too many sort components in '{}'", s),
            });
        }

        Ok(Self {
            property: property.to_string(),
            direction,
        })
    }
}

/// Information about a page of results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    /// Zero-based index of this page.
    pub page: u32,

    /// Requested page size.
    pub size: u32,

    /// Total number of matching items across all pages.
    pub total: u64,

    /// Whether there are more results after this page.
    pub has_next: bool,

    /// Whether there are results before this page.
    pub has_previous: bool,
}

impl PageInfo {
    /// Builds page info for the given request and total.
    pub fn new(pageable: &Pageable, total: u64) -> Self {
        let end = pageable.offset() + u64::from(pageable.size);
        Self {
            page: pageable.page,
            size: pageable.size,
            total,
            has_next: end < total,
            has_previous: pageable.page > 0,
        }
    }

    /// Total number of pages for this page size.
    pub fn total_pages(&self) -> u64 {
        if self.size == 0 {
            return 0;
        }
        self.total.div_ceil(u64::from(self.size))
    }
}

/// A page of results.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    /// The items in this page.
    pub items: Vec<T>,

    /// Pagination information.
    pub page_info: PageInfo,
}

impl<T> Page<T> {
    /// Creates a new page with the given items and page info.
    pub fn new(items: Vec<T>, page_info: PageInfo) -> Self {
        Self { items, page_info }
    }

    /// Creates an empty page for the request.
    pub fn empty(pageable: &Pageable) -> Self {
        Self {
            items: Vec::new(),
            page_info: PageInfo::new(pageable, 0),
        }
    }

    /// Returns true if this page has no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns the number of items in this page.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Total number of matching items across all pages.
    pub fn total(&self) -> u64 {
        self.page_info.total
    }

    /// Maps the items to a different type.
    pub fn map<U, F>(self, f: F) -> Page<U>
    where
        F: FnMut(T) -> U,
    {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page_info: self.page_info,
        }
    }
}
