//! Core types for the persistence layer.
//!
//! - [`Pageable`], [`SortOrder`] - Page requests handed through from the inbound layer
//! - [`Page`], [`PageInfo`] - Pages of results
//!
//! # Example
//!
//! ```
//! use vetclinic_persistence::types::{Pageable, SortOrder};
//!
//! let pageable = Pageable::new(2, 50).with_sort(SortOrder::desc("apptTime"));
//! assert_eq!(pageable.offset(), 100);
//! ```

mod pagination;

pub use pagination::{
    DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE, Page, PageInfo, Pageable, SortDirection, SortOrder,
};
