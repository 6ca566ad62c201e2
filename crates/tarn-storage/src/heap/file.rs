//! Heap files: one paged file of tuples backing one table.
//!
//! A heap file performs raw page I/O itself (seek + read/write of whole
//! pages), but every page *access* during tuple operations is routed
//! through a [`PageCache`], which enforces locking and caching.

use crate::cache::{PageCache, PageRef};
use crate::heap::page::HeapPage;
use crate::schema::Schema;
use crate::tuple::Tuple;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tarn_common::{PageId, Permissions, Result, TarnError, TransactionId, PAGE_SIZE};

/// A table's on-disk backing store: a flat file of fixed-size pages.
///
/// The table id is a CRC32 of the canonical file path, so the same file
/// always yields the same id across processes.
pub struct HeapFile {
    path: PathBuf,
    schema: Arc<Schema>,
    table_id: u32,
    file: Mutex<File>,
}

impl HeapFile {
    /// Opens (or creates) the heap file at `path`.
    pub fn open(path: impl AsRef<Path>, schema: Arc<Schema>) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(path.as_ref())?;
        let path = path.as_ref().canonicalize()?;
        let table_id = crc32fast::hash(path.to_string_lossy().as_bytes());

        Ok(Self {
            path,
            schema,
            table_id,
            file: Mutex::new(file),
        })
    }

    /// Returns the stable table id.
    pub fn table_id(&self) -> u32 {
        self.table_id
    }

    /// Returns the table's schema.
    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// Returns the backing file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the number of whole pages in the file.
    pub fn num_pages(&self) -> Result<u32> {
        let len = self.file.lock().metadata()?.len();
        Ok((len / PAGE_SIZE as u64) as u32)
    }

    /// Reads one page from disk.
    pub fn read_page(&self, pid: PageId) -> Result<HeapPage> {
        if pid.table_id != self.table_id {
            return Err(TarnError::BadTable(pid, self.table_id));
        }

        let mut file = self.file.lock();
        let num_pages = (file.metadata()?.len() / PAGE_SIZE as u64) as u32;
        if pid.page_no >= num_pages {
            return Err(TarnError::PageOutOfBounds {
                page_no: pid.page_no,
                num_pages,
            });
        }

        file.seek(SeekFrom::Start(pid.page_no as u64 * PAGE_SIZE as u64))?;
        let mut data = [0u8; PAGE_SIZE];
        file.read_exact(&mut data)?;
        drop(file);

        HeapPage::from_bytes(pid, self.schema.clone(), &data)
    }

    /// Writes one page back to its slot in the file.
    pub fn write_page(&self, page: &HeapPage) -> Result<()> {
        let pid = page.id();
        if pid.table_id != self.table_id {
            return Err(TarnError::BadTable(pid, self.table_id));
        }

        let data = page.to_bytes();
        let mut file = self.file.lock();
        file.seek(SeekFrom::Start(pid.page_no as u64 * PAGE_SIZE as u64))?;
        file.write_all(&data)?;
        file.sync_data()?;
        Ok(())
    }

    /// Appends a zeroed page to the file and returns its id.
    fn append_empty_page(&self) -> Result<PageId> {
        let mut file = self.file.lock();
        let len = file.metadata()?.len();
        let page_no = (len / PAGE_SIZE as u64) as u32;

        file.seek(SeekFrom::Start(len))?;
        file.write_all(&[0u8; PAGE_SIZE])?;
        file.sync_data()?;

        log::debug!("heap file {} grew to {} pages", self.table_id, page_no + 1);
        Ok(PageId::new(self.table_id, page_no))
    }

    /// Inserts a tuple into the first page with a free slot, appending a
    /// fresh page if every existing page is full.
    ///
    /// Pages are probed in exclusive mode through the cache. Returns the
    /// page(s) mutated by the insert.
    pub fn add_tuple(
        &self,
        cache: &dyn PageCache,
        tid: TransactionId,
        tuple: Tuple,
    ) -> Result<Vec<PageRef>> {
        let num_pages = self.num_pages()?;

        let mut target = None;
        for page_no in 0..num_pages {
            let pid = PageId::new(self.table_id, page_no);
            let page = cache.fetch(tid, pid, Permissions::ReadWrite)?;
            if page.read().num_empty_slots() > 0 {
                target = Some(page);
                break;
            }
        }

        let page = match target {
            Some(page) => page,
            None => {
                let pid = self.append_empty_page()?;
                cache.fetch(tid, pid, Permissions::ReadWrite)?
            }
        };

        page.write().insert_tuple(tuple)?;
        Ok(vec![page])
    }

    /// Deletes a tuple in place on the page its RecordId names.
    ///
    /// Returns the mutated page.
    pub fn delete_tuple(
        &self,
        cache: &dyn PageCache,
        tid: TransactionId,
        tuple: &Tuple,
    ) -> Result<PageRef> {
        let rid = tuple.rid().ok_or(TarnError::MissingRecordId)?;
        let page = cache.fetch(tid, rid.page_id, Permissions::ReadWrite)?;
        page.write().delete_tuple(rid)?;
        Ok(page)
    }
}

/// Pull-based tuple stream over a heap file.
///
/// Pages `0..num_pages` (counted at open/rewind time) are fetched one at
/// a time in shared mode through the cache; each page's used tuples are
/// buffered and handed out in slot order.
pub struct HeapScan {
    file: Arc<HeapFile>,
    cache: Arc<dyn PageCache>,
    tid: TransactionId,
    num_pages: u32,
    next_page: u32,
    buffered: VecDeque<Tuple>,
}

impl HeapScan {
    /// Creates a scan of `file` on behalf of a transaction.
    pub fn new(file: Arc<HeapFile>, cache: Arc<dyn PageCache>, tid: TransactionId) -> Self {
        Self {
            file,
            cache,
            tid,
            num_pages: 0,
            next_page: 0,
            buffered: VecDeque::new(),
        }
    }

    /// Positions the scan at the first tuple.
    pub fn open(&mut self) -> Result<()> {
        self.rewind()
    }

    /// Returns the next tuple, or None once the scan is exhausted.
    pub fn next(&mut self) -> Result<Option<Tuple>> {
        loop {
            if let Some(tuple) = self.buffered.pop_front() {
                return Ok(Some(tuple));
            }
            if self.next_page >= self.num_pages {
                return Ok(None);
            }

            let pid = PageId::new(self.file.table_id(), self.next_page);
            self.next_page += 1;
            let page = self.cache.fetch(self.tid, pid, Permissions::ReadOnly)?;
            self.buffered.extend(page.read().iter().cloned());
        }
    }

    /// Restarts the scan from page 0.
    pub fn rewind(&mut self) -> Result<()> {
        self.num_pages = self.file.num_pages()?;
        self.next_page = 0;
        self.buffered.clear();
        Ok(())
    }

    /// Ends the scan; subsequent `next` calls return None until rewind.
    pub fn close(&mut self) {
        self.next_page = self.num_pages;
        self.buffered.clear();
    }
}
