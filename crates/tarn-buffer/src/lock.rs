//! Page-level shared/exclusive lock manager with deadlock detection.
//!
//! All lock-table state lives behind a single mutex. A blocked request
//! re-tries on a fixed backoff; each failed attempt records waits-for
//! edges toward the conflicting holders and then runs a DFS over the
//! waits-for graph. A request that finds itself on a cycle fails with
//! `Deadlock` (the victim is always the detecting transaction).

use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::time::Duration;
use tarn_common::{PageId, Permissions, Result, TarnError, TransactionId};

/// Backoff between grant attempts while blocked.
const LOCK_WAIT: Duration = Duration::from_millis(10);

/// Lock table for page-granular two-phase locking.
#[derive(Default)]
pub struct LockManager {
    tables: Mutex<LockTables>,
}

#[derive(Default)]
struct LockTables {
    /// Mode the page is currently held in.
    page_perm: HashMap<PageId, Permissions>,
    /// Transactions holding each page.
    holders: HashMap<PageId, HashSet<TransactionId>>,
    /// Pages held by each transaction, in any mode.
    txn_pages: HashMap<TransactionId, HashSet<PageId>>,
    /// Edges from a blocked requester to the holders it waits on.
    waits_for: HashMap<TransactionId, Vec<TransactionId>>,
}

impl LockTables {
    /// Attempts to grant; on failure records fresh wait edges and
    /// returns false.
    fn try_grant(&mut self, tid: TransactionId, pid: PageId, perm: Permissions) -> bool {
        if self.blocked(tid, pid, perm) {
            return false;
        }

        // Never downgrade: a re-request by the holder of an exclusive
        // lock keeps the page exclusive.
        let mode = match self.page_perm.get(&pid) {
            Some(Permissions::ReadWrite) => Permissions::ReadWrite,
            _ => perm,
        };
        self.page_perm.insert(pid, mode);
        self.holders.entry(pid).or_default().insert(tid);
        self.txn_pages.entry(tid).or_default().insert(pid);
        true
    }

    /// Returns true if the request conflicts with current holders,
    /// recording waits-for edges when it does.
    fn blocked(&mut self, tid: TransactionId, pid: PageId, perm: Permissions) -> bool {
        let already_holds = self
            .txn_pages
            .get(&tid)
            .map(|pages| pages.contains(&pid))
            .unwrap_or(false);

        match perm {
            Permissions::ReadOnly => {
                if already_holds {
                    return false;
                }
                match self.page_perm.get(&pid) {
                    None | Some(Permissions::ReadOnly) => false,
                    Some(Permissions::ReadWrite) => {
                        self.record_waits(tid, pid);
                        true
                    }
                }
            }
            Permissions::ReadWrite => {
                let holders = self.holders.get(&pid);
                match holders {
                    None => false,
                    Some(h) if h.is_empty() => false,
                    Some(h) if h.len() == 1 && h.contains(&tid) => false,
                    Some(_) => {
                        self.record_waits(tid, pid);
                        true
                    }
                }
            }
        }
    }

    /// Replaces the requester's wait edges with the page's current
    /// conflicting holders.
    fn record_waits(&mut self, tid: TransactionId, pid: PageId) {
        let conflicting: Vec<_> = self
            .holders
            .get(&pid)
            .map(|h| h.iter().copied().filter(|h| *h != tid).collect())
            .unwrap_or_default();
        self.waits_for.insert(tid, conflicting);
    }

    /// DFS over the waits-for graph: does any path from `start`'s
    /// successors lead back to `start`?
    fn cycle_from(&self, start: TransactionId) -> bool {
        let mut stack: Vec<_> = match self.waits_for.get(&start) {
            Some(edges) => edges.clone(),
            None => return false,
        };
        let mut visited = HashSet::new();
        while let Some(t) = stack.pop() {
            if t == start {
                return true;
            }
            if !visited.insert(t) {
                continue;
            }
            if let Some(next) = self.waits_for.get(&t) {
                stack.extend(next.iter().copied());
            }
        }
        false
    }

    fn release(&mut self, tid: TransactionId, pid: PageId) {
        if let Some(pages) = self.txn_pages.get_mut(&tid) {
            pages.remove(&pid);
            if pages.is_empty() {
                self.txn_pages.remove(&tid);
            }
        }
        if let Some(holders) = self.holders.get_mut(&pid) {
            holders.remove(&tid);
            if holders.is_empty() {
                self.holders.remove(&pid);
                self.page_perm.remove(&pid);
            }
        }
    }
}

impl LockManager {
    /// Creates an empty lock manager.
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquires a page lock, blocking until granted.
    ///
    /// Fails with `Deadlock` if the waiting request is found on a
    /// waits-for cycle; the caller is the victim and must abort.
    pub fn acquire(&self, tid: TransactionId, pid: PageId, perm: Permissions) -> Result<()> {
        loop {
            {
                let mut tables = self.tables.lock();
                if tables.try_grant(tid, pid, perm) {
                    tables.waits_for.remove(&tid);
                    return Ok(());
                }
                if tables.cycle_from(tid) {
                    log::warn!("{} hit a waits-for cycle requesting {} on {}", tid, perm, pid);
                    tables.waits_for.remove(&tid);
                    return Err(TarnError::Deadlock);
                }
            }
            std::thread::sleep(LOCK_WAIT);
        }
    }

    /// Releases one page lock held by a transaction.
    pub fn release(&self, tid: TransactionId, pid: PageId) {
        self.tables.lock().release(tid, pid);
    }

    /// Releases every lock held by a transaction and clears it out of
    /// the waits-for graph.
    pub fn release_all(&self, tid: TransactionId) {
        let mut tables = self.tables.lock();
        if let Some(pages) = tables.txn_pages.remove(&tid) {
            for pid in pages {
                if let Some(holders) = tables.holders.get_mut(&pid) {
                    holders.remove(&tid);
                    if holders.is_empty() {
                        tables.holders.remove(&pid);
                        tables.page_perm.remove(&pid);
                    }
                }
            }
        }
        tables.waits_for.remove(&tid);
        for edges in tables.waits_for.values_mut() {
            edges.retain(|t| *t != tid);
        }
    }

    /// Returns whether the transaction holds any lock on the page.
    pub fn holds_lock(&self, tid: TransactionId, pid: PageId) -> bool {
        self.tables
            .lock()
            .txn_pages
            .get(&tid)
            .map(|pages| pages.contains(&pid))
            .unwrap_or(false)
    }

    /// Returns a snapshot of the pages locked by a transaction.
    pub fn pages_locked_by(&self, tid: TransactionId) -> Vec<PageId> {
        self.tables
            .lock()
            .txn_pages
            .get(&tid)
            .map(|pages| pages.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Returns the mode a page is currently held in, if any.
    pub fn page_mode(&self, pid: PageId) -> Option<Permissions> {
        self.tables.lock().page_perm.get(&pid).copied()
    }
}
