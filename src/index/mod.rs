//! Index structures.
//!
//! - [`btree`] - The primary-key B-tree that stores the table's rows

pub mod btree;
