//! Pager - maps page numbers to cached page buffers backed by one file.
//!
//! The [`Pager`] handles all direct file operations:
//! - Loading pages on first access
//! - Handing out new page numbers
//! - Writing dirty pages back to the file

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use crate::common::config::{PAGE_SIZE, TABLE_MAX_PAGES};
use crate::common::PageId;
use crate::error::{Error, Result};
use crate::storage::Page;

/// A cached page plus its write-back state.
struct Slot {
    page: Box<Page>,
    is_dirty: bool,
}

/// Owns the table file and an arena of cached pages.
///
/// # File Layout
/// The table is stored as a single file with pages laid out sequentially:
/// ```text
/// ┌─────────┬─────────┬─────────┬─────────┬─────────┐
/// │ Page 0  │ Page 1  │ Page 2  │  ...    │ Page N  │
/// │ (4KB)   │ (4KB)   │ (4KB)   │         │ (4KB)   │
/// └─────────┴─────────┴─────────┴─────────┴─────────┘
/// Offset:  0      4096     8192    ...    N×4096
/// ```
///
/// # Caching
/// A page is read on first access and stays cached until the pager is
/// dropped. Nothing is ever evicted: the arena has exactly
/// [`TABLE_MAX_PAGES`] slots. Pages past the end of the file start out zeroed.
///
/// # Allocation
/// New pages come from a watermark: [`Pager::unused_page_id`] is always
/// `num_pages`, and page numbers are never reused.
///
/// # Thread Safety
/// `Pager` is single-threaded. All access goes through `&mut self`.
pub struct Pager {
    file: File,
    /// Number of whole pages currently in the file.
    pages_on_disk: u32,
    /// Number of pages in the table, including ones not yet written.
    num_pages: u32,
    slots: Vec<Option<Slot>>,
}

impl Pager {
    /// Open a table file, creating it if it doesn't exist.
    ///
    /// # Errors
    /// - `Error::Io` if the file cannot be opened or created
    /// - `Error::Corrupt` if the file length is not a whole number of pages,
    ///   or the file holds more than [`TABLE_MAX_PAGES`] pages
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path.as_ref())?;

        let file_size = file.metadata()?.len();
        if file_size % PAGE_SIZE as u64 != 0 {
            return Err(Error::Corrupt(format!(
                "file length {} is not a multiple of the page size",
                file_size
            )));
        }

        let page_count = file_size / PAGE_SIZE as u64;
        if page_count > TABLE_MAX_PAGES as u64 {
            return Err(Error::Corrupt(format!(
                "file holds {} pages, more than the limit of {}",
                page_count, TABLE_MAX_PAGES
            )));
        }

        tracing::debug!(
            path = %path.as_ref().display(),
            pages = page_count,
            "opened table file"
        );

        Ok(Self {
            file,
            pages_on_disk: page_count as u32,
            num_pages: page_count as u32,
            slots: (0..TABLE_MAX_PAGES).map(|_| None).collect(),
        })
    }

    /// Get a page for reading, loading it on first access.
    ///
    /// # Errors
    /// - `Error::PageOutOfBounds` if `page_id` is not below [`TABLE_MAX_PAGES`]
    /// - `Error::Io` if the page cannot be read
    pub fn page(&mut self, page_id: PageId) -> Result<&Page> {
        Ok(&self.slot(page_id)?.page)
    }

    /// Get a page for writing, loading it on first access.
    ///
    /// The page is marked dirty and will be written back on flush or close.
    ///
    /// # Errors
    /// Same as [`Pager::page`].
    pub fn page_mut(&mut self, page_id: PageId) -> Result<&mut Page> {
        let slot = self.slot(page_id)?;
        slot.is_dirty = true;
        Ok(&mut slot.page)
    }

    /// The next page number the watermark allocator will hand out.
    #[inline]
    pub fn unused_page_id(&self) -> PageId {
        PageId::new(self.num_pages)
    }

    /// Number of pages in the table, including unflushed ones.
    #[inline]
    pub fn num_pages(&self) -> u32 {
        self.num_pages
    }

    /// Number of pages that may still be allocated.
    #[inline]
    pub fn free_page_count(&self) -> usize {
        TABLE_MAX_PAGES.saturating_sub(self.num_pages as usize)
    }

    /// Whether the page is cached and has unflushed changes.
    pub fn is_dirty(&self, page_id: PageId) -> bool {
        self.slots
            .get(page_id.index())
            .and_then(Option::as_ref)
            .is_some_and(|slot| slot.is_dirty)
    }

    /// Write a cached page to its file offset.
    ///
    /// Pages that were never loaded have nothing to write and are skipped.
    ///
    /// # Errors
    /// - `Error::PageOutOfBounds` if `page_id` is not below [`TABLE_MAX_PAGES`]
    /// - `Error::Io` on a failed or partial write
    pub fn flush(&mut self, page_id: PageId) -> Result<()> {
        let index = page_id.index();
        if index >= TABLE_MAX_PAGES {
            return Err(Error::PageOutOfBounds {
                page: page_id.0,
                max: TABLE_MAX_PAGES,
            });
        }

        let Some(slot) = self.slots[index].as_mut() else {
            return Ok(());
        };

        self.file.seek(SeekFrom::Start(page_id.file_offset()))?;
        self.file.write_all(slot.page.as_slice())?;
        slot.is_dirty = false;

        if page_id.0 >= self.pages_on_disk {
            self.pages_on_disk = page_id.0 + 1;
        }

        tracing::debug!(page = page_id.0, "flushed page");
        Ok(())
    }

    /// Write every dirty page back and sync the file.
    ///
    /// The pager stays usable afterwards; dropping it closes the file.
    ///
    /// # Errors
    /// - `Error::Io` if any write or the final sync fails
    pub fn close(&mut self) -> Result<()> {
        for page_num in 0..self.num_pages {
            let page_id = PageId::new(page_num);
            if self.is_dirty(page_id) {
                self.flush(page_id)?;
            }
        }
        self.file.sync_all()?;
        Ok(())
    }

    /// Find or load the slot for a page.
    fn slot(&mut self, page_id: PageId) -> Result<&mut Slot> {
        let index = page_id.index();
        if index >= TABLE_MAX_PAGES {
            return Err(Error::PageOutOfBounds {
                page: page_id.0,
                max: TABLE_MAX_PAGES,
            });
        }

        let slot = match self.slots[index].take() {
            Some(slot) => slot,
            None => self.load(page_id)?,
        };
        Ok(self.slots[index].insert(slot))
    }

    /// Read a page from disk, or zero-fill it if it lies past the end of the file.
    fn load(&mut self, page_id: PageId) -> Result<Slot> {
        let mut page = Box::new(Page::new());

        if page_id.0 < self.pages_on_disk {
            self.file.seek(SeekFrom::Start(page_id.file_offset()))?;
            self.file.read_exact(page.as_mut_slice())?;
            tracing::debug!(page = page_id.0, "loaded page from disk");
        }

        if page_id.0 >= self.num_pages {
            self.num_pages = page_id.0 + 1;
        }

        Ok(Slot {
            page,
            is_dirty: false,
        })
    }
}

impl Drop for Pager {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            tracing::warn!("failed to flush pages while dropping pager: {e}");
        }
    }
}
