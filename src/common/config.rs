//! Configuration constants for rowstore.
//!
//! Every bound here is fixed at compile time. The on-disk format depends on
//! `PAGE_SIZE` and the column widths, so changing them breaks existing files.

/// Size of a page in bytes (4KB).
///
/// Pages are the unit of I/O and caching. Page N lives at file offset
/// `N × PAGE_SIZE`.
pub const PAGE_SIZE: usize = 4096;

/// Maximum number of pages a table file may hold.
///
/// The pager keeps every page it has touched in memory, so this also bounds
/// the resident working set: `TABLE_MAX_PAGES × PAGE_SIZE` bytes.
pub const TABLE_MAX_PAGES: usize = 100;

/// Maximum number of keyed cells in an internal node.
///
/// Kept far below what a page could physically hold. Internal nodes are never
/// split, so once the root's cells are used up the table reports itself full.
pub const INTERNAL_NODE_MAX_CELLS: usize = 3;

/// Maximum length of the `username` column in bytes.
pub const COLUMN_USERNAME_SIZE: usize = 32;

/// Maximum length of the `email` column in bytes.
pub const COLUMN_EMAIL_SIZE: usize = 255;

/// Maximum size of a table file in bytes.
pub const TABLE_MAX_BYTES: u64 = (TABLE_MAX_PAGES as u64) * (PAGE_SIZE as u64);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_size_is_power_of_two() {
        assert!(PAGE_SIZE.is_power_of_two());
        assert_eq!(PAGE_SIZE, 4096);
    }

    #[test]
    fn test_table_max_bytes() {
        assert_eq!(TABLE_MAX_BYTES, 100 * 4096);
    }
}
