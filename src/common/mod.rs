//! Common types shared across rowstore.
//!
//! - Configuration constants
//! - Identifiers (PageId)

pub mod config;
mod page_id;

pub use page_id::PageId;
