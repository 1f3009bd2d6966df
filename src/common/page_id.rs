//! Page identifier type.

use std::fmt;

use super::config::PAGE_SIZE;

/// Identifies a page in the table file.
///
/// Page numbers are plain indices into the pager's arena. Nodes refer to
/// each other (parent and child pointers) by page number, never by reference.
///
/// # Example
/// ```
/// use rowstore::PageId;
///
/// let page_id = PageId::new(2);
/// assert_eq!(page_id.0, 2);
/// assert_eq!(page_id.file_offset(), 8192);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PageId(pub u32);

impl PageId {
    /// The page that holds the root leaf of a freshly created table.
    pub const FIRST: PageId = PageId(0);

    /// Create a new PageId.
    #[inline]
    pub fn new(id: u32) -> Self {
        PageId(id)
    }

    /// Index of this page in the pager's arena.
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// Byte offset of this page in the table file.
    #[inline]
    pub fn file_offset(self) -> u64 {
        (self.0 as u64) * (PAGE_SIZE as u64)
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Page({})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_id_new() {
        let pid = PageId::new(42);
        assert_eq!(pid.0, 42);
        assert_eq!(pid.index(), 42);
    }

    #[test]
    fn test_page_id_file_offset() {
        assert_eq!(PageId::FIRST.file_offset(), 0);
        assert_eq!(PageId::new(3).file_offset(), 3 * PAGE_SIZE as u64);
    }

    #[test]
    fn test_page_id_ordering() {
        assert!(PageId::new(1) < PageId::new(2));
        assert!(PageId::new(5) > PageId::new(3));
    }

    #[test]
    fn test_page_id_display() {
        assert_eq!(format!("{}", PageId::new(42)), "Page(42)");
    }
}
