//! rowstore - a single-table storage engine backed by an on-disk B-tree.
//!
//! # Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                            rowstore                             │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  ┌─────────────────────────────────────────────────────────┐   │
//! │  │        REPL (main.rs) + Statement parsing (statement/)   │   │
//! │  └─────────────────────────────────────────────────────────┘   │
//! │                              ↓                                  │
//! │  ┌─────────────────────────────────────────────────────────┐   │
//! │  │                  Table (table.rs)                        │   │
//! │  │          open/close, insert, select, point lookup        │   │
//! │  └─────────────────────────────────────────────────────────┘   │
//! │                              ↓                                  │
//! │  ┌─────────────────────────────────────────────────────────┐   │
//! │  │              B-tree (index/btree/)                       │   │
//! │  │     Cursor + search/insert/split + node page views       │   │
//! │  └─────────────────────────────────────────────────────────┘   │
//! │                              ↓                                  │
//! │  ┌─────────────────────────────────────────────────────────┐   │
//! │  │              Storage Layer (storage/)                    │   │
//! │  │            Pager (page cache over one file) + Page       │   │
//! │  └─────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//! - [`common`] - Shared primitives (PageId, config)
//! - [`error`] - Error and Result types
//! - [`row`] - The fixed-schema row and its encoding
//! - [`storage`] - Pages and the pager
//! - [`index`] - The B-tree and its cursor
//! - [`table`] - The table handle
//! - [`statement`] - Parsing of REPL input
//!
//! # Quick Start
//! ```no_run
//! use rowstore::{Row, Table};
//!
//! let mut table = Table::open("my_database.db").unwrap();
//! table.insert(&Row::new(1, "user1", "person1@example.com").unwrap()).unwrap();
//!
//! for row in table.execute_select().unwrap() {
//!     println!("{row}");
//! }
//! table.close().unwrap();
//! ```

pub mod common;
pub mod error;
pub mod index;
pub mod row;
pub mod statement;
pub mod storage;
pub mod table;

// Re-export commonly used items at crate root for convenience
pub use common::config::PAGE_SIZE;
pub use common::PageId;
pub use error::{Error, Result};

pub use index::btree::dump::render_constants;
pub use index::btree::Cursor;
pub use row::Row;
pub use storage::{Page, Pager};
pub use table::{ExecuteResult, Table};
