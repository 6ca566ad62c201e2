//! The seam between heap files and the page cache that serves them.

use crate::heap::HeapPage;
use parking_lot::RwLock;
use std::sync::Arc;
use tarn_common::{PageId, Permissions, Result, TransactionId};

/// A cached page shared between the cache and its callers.
///
/// The outer lock guards the in-memory page image; the page-level lock
/// protocol (shared/exclusive per transaction) is enforced by the cache
/// before a PageRef is handed out.
pub type PageRef = Arc<RwLock<HeapPage>>;

/// Source of pages for heap-file operations.
///
/// Every page access of a heap file goes through an implementation of
/// this trait, which is responsible for lock acquisition, caching, and
/// reading missing pages from disk. `ReadOnly` requests take a shared
/// page lock, `ReadWrite` an exclusive one; the call blocks until the
/// lock is granted or the requesting transaction is chosen as a
/// deadlock victim.
pub trait PageCache: Send + Sync {
    /// Fetches a page on behalf of a transaction.
    fn fetch(&self, tid: TransactionId, pid: PageId, perm: Permissions) -> Result<PageRef>;
}
