//! Buffer management for Tarn.
//!
//! This crate provides:
//! - Page-level shared/exclusive locking with waits-for deadlock detection
//! - A fixed-capacity LRU page cache mediating all page I/O (NO-STEAL)
//! - Transaction handles driving commit and abort

mod lock;
mod lru;
mod pool;
mod transaction;

pub use lock::LockManager;
pub use lru::LruList;
pub use pool::{BufferPool, BufferPoolConfig, DEFAULT_POOL_PAGES};
pub use transaction::Transaction;
