//! Buffer pool: the single gateway for page access.
//!
//! Every page fetch first acquires the page lock, then consults the
//! cache, and only reads from disk on a miss. Mutations route through
//! `insert_tuple` / `delete_tuple`, which mark the cached copies dirty;
//! the cached copy of a dirty page is authoritative until commit.
//!
//! Eviction is NO-STEAL: a dirty page is never written out (or dropped)
//! by eviction, so aborting a transaction only requires re-reading its
//! pages from disk.

use crate::lock::LockManager;
use crate::lru::LruList;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::Arc;
use tarn_common::{PageId, Permissions, Result, TarnError, TransactionId};
use tarn_storage::{Catalog, PageCache, PageRef, Tuple};

/// Default number of cached pages.
pub const DEFAULT_POOL_PAGES: usize = 50;

/// Configuration for the buffer pool.
#[derive(Debug, Clone)]
pub struct BufferPoolConfig {
    /// Number of pages the pool may cache at once.
    pub num_pages: usize,
}

impl Default for BufferPoolConfig {
    fn default() -> Self {
        Self {
            num_pages: DEFAULT_POOL_PAGES,
        }
    }
}

struct CacheEntry {
    page: PageRef,
    node: usize,
}

#[derive(Default)]
struct PoolInner {
    cache: HashMap<PageId, CacheEntry>,
    lru: LruList,
}

impl PoolInner {
    fn hit(&mut self, pid: PageId) -> Option<PageRef> {
        let (page, node) = {
            let entry = self.cache.get(&pid)?;
            (entry.page.clone(), entry.node)
        };
        self.lru.move_to_front(node);
        Some(page)
    }
}

/// Fixed-capacity LRU page cache with page-lock mediation.
pub struct BufferPool {
    config: BufferPoolConfig,
    catalog: Arc<Catalog>,
    locks: LockManager,
    inner: Mutex<PoolInner>,
}

impl BufferPool {
    /// Creates a buffer pool over the given catalog.
    pub fn new(catalog: Arc<Catalog>, config: BufferPoolConfig) -> Self {
        Self {
            config,
            catalog,
            locks: LockManager::new(),
            inner: Mutex::new(PoolInner::default()),
        }
    }

    /// Returns the catalog this pool serves.
    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    /// Returns the pool capacity in pages.
    pub fn capacity(&self) -> usize {
        self.config.num_pages
    }

    /// Returns the number of pages currently cached.
    pub fn num_cached(&self) -> usize {
        self.inner.lock().cache.len()
    }

    /// Returns whether a page is currently cached.
    pub fn is_cached(&self, pid: PageId) -> bool {
        self.inner.lock().cache.contains_key(&pid)
    }

    /// Fetches a page on behalf of a transaction.
    ///
    /// Acquires the page lock first (a deadlock victim surfaces as
    /// `TransactionAborted`), then serves the page from cache or disk.
    /// The cache monitor is never held across the disk read.
    pub fn get_page(
        &self,
        tid: TransactionId,
        pid: PageId,
        perm: Permissions,
    ) -> Result<PageRef> {
        self.locks.acquire(tid, pid, perm).map_err(|e| match e {
            TarnError::Deadlock => TarnError::TransactionAborted(tid),
            other => other,
        })?;

        if let Some(page) = self.inner.lock().hit(pid) {
            return Ok(page);
        }

        let file = self.catalog.file(pid.table_id)?;
        let page = file.read_page(pid)?;

        let mut inner = self.inner.lock();
        // Another thread may have cached the page while we were reading.
        if let Some(page) = inner.hit(pid) {
            return Ok(page);
        }
        if inner.cache.len() >= self.config.num_pages {
            Self::evict(&mut inner)?;
        }

        let page = Arc::new(RwLock::new(page));
        let node = inner.lru.push_front(pid);
        inner.cache.insert(
            pid,
            CacheEntry {
                page: page.clone(),
                node,
            },
        );
        Ok(page)
    }

    /// Evicts the least recently used clean page.
    fn evict(inner: &mut PoolInner) -> Result<()> {
        let mut victim = None;
        for (node, pid) in inner.lru.iter_lru() {
            if inner.cache[&pid].page.read().dirtied_by().is_none() {
                victim = Some((node, pid));
                break;
            }
        }
        let (node, pid) = victim.ok_or(TarnError::BufferPoolFull)?;

        inner.lru.remove(node);
        inner.cache.remove(&pid);
        log::debug!("evicted clean page {}", pid);
        Ok(())
    }

    /// Inserts a tuple into a table.
    ///
    /// The heap file probes its pages through this pool under exclusive
    /// locks; every mutated page is marked dirty by the inserting
    /// transaction.
    pub fn insert_tuple(&self, tid: TransactionId, table_id: u32, tuple: Tuple) -> Result<()> {
        let file = self.catalog.file(table_id)?;
        let pages = file.add_tuple(self, tid, tuple)?;
        for page in pages {
            page.write().mark_dirty(Some(tid));
        }
        Ok(())
    }

    /// Deletes a tuple from the page its RecordId names.
    pub fn delete_tuple(&self, tid: TransactionId, tuple: &Tuple) -> Result<()> {
        let rid = tuple.rid().ok_or(TarnError::MissingRecordId)?;
        let file = self.catalog.file(rid.page_id.table_id)?;
        let page = file.delete_tuple(self, tid, tuple)?;
        page.write().mark_dirty(Some(tid));
        Ok(())
    }

    /// Ends a transaction.
    ///
    /// On commit every locked page is flushed to disk and marked clean.
    /// On abort every locked page still in cache is overwritten in place
    /// with its on-disk image, discarding the transaction's mutations.
    /// Locks are released in both cases, even if flushing or restoring
    /// fails; the first such error is returned.
    pub fn transaction_complete(&self, tid: TransactionId, commit: bool) -> Result<()> {
        let pages = self.locks.pages_locked_by(tid);

        let mut first_err = None;
        for pid in pages {
            let outcome = if commit {
                self.flush_page(pid)
            } else {
                self.restore_page(pid)
            };
            if let Err(e) = outcome {
                first_err.get_or_insert(e);
            }
        }

        self.locks.release_all(tid);
        log::debug!("{} {}", tid, if commit { "committed" } else { "aborted" });
        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Rereads a cached page from disk, dropping in-memory mutations.
    fn restore_page(&self, pid: PageId) -> Result<()> {
        let cached = self.inner.lock().cache.get(&pid).map(|e| e.page.clone());
        if let Some(page) = cached {
            let fresh = self.catalog.file(pid.table_id)?.read_page(pid)?;
            *page.write() = fresh;
        }
        Ok(())
    }

    /// Writes one cached page to disk if dirty, then marks it clean.
    pub fn flush_page(&self, pid: PageId) -> Result<()> {
        let cached = self.inner.lock().cache.get(&pid).map(|e| e.page.clone());
        if let Some(page) = cached {
            let mut guard = page.write();
            if guard.dirtied_by().is_some() {
                self.catalog.file(pid.table_id)?.write_page(&guard)?;
                guard.mark_dirty(None);
            }
        }
        Ok(())
    }

    /// Flushes every dirty cached page.
    ///
    /// Breaks NO-STEAL for uncommitted transactions; intended for
    /// orderly shutdown only.
    pub fn flush_all_pages(&self) -> Result<()> {
        let pids: Vec<_> = self.inner.lock().cache.keys().copied().collect();
        for pid in pids {
            self.flush_page(pid)?;
        }
        Ok(())
    }

    /// Drops a page from the cache without writing it back.
    pub fn discard_page(&self, pid: PageId) {
        let mut inner = self.inner.lock();
        if let Some(entry) = inner.cache.remove(&pid) {
            inner.lru.remove(entry.node);
        }
    }

    /// Releases one page lock early.
    ///
    /// This steps outside two-phase locking and can expose other
    /// transactions to unrepeatable reads; it exists as a debugging
    /// hook and must not be called by operators.
    pub fn release_page(&self, tid: TransactionId, pid: PageId) {
        self.locks.release(tid, pid);
    }

    /// Returns whether the transaction holds a lock on the page.
    pub fn holds_lock(&self, tid: TransactionId, pid: PageId) -> bool {
        self.locks.holds_lock(tid, pid)
    }
}

impl PageCache for BufferPool {
    fn fetch(&self, tid: TransactionId, pid: PageId, perm: Permissions) -> Result<PageRef> {
        self.get_page(tid, pid, perm)
    }
}
