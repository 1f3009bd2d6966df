//! Storage layer - file I/O and the page cache.
//!
//! - [`Pager`] - Owns the table file and every in-memory page
//! - [`Page`] - The raw 4KB buffer

mod page;
mod pager;

pub use page::Page;
pub use pager::Pager;
