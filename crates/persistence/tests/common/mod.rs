//! Test infrastructure for the persistence layer.
//!
//! Fixtures build SQLite-backed stores and a seeded clinic schedule; the
//! doubles stand in for the search index where a test needs to observe or
//! break mirror writes.

#![allow(dead_code)]

pub mod doubles;
pub mod fixtures;

pub use doubles::*;
pub use fixtures::*;
