//! The top-level database handle.

use std::sync::Arc;
use tarn_buffer::{BufferPool, BufferPoolConfig, Transaction};
use tarn_storage::Catalog;

/// Owns the catalog and the buffer pool serving it.
///
/// There is no global state: components that need the catalog or the
/// pool receive them from here.
pub struct Database {
    catalog: Arc<Catalog>,
    pool: Arc<BufferPool>,
}

impl Database {
    /// Creates a database with the default pool capacity.
    pub fn new() -> Self {
        Self::with_config(BufferPoolConfig::default())
    }

    /// Creates a database with an explicit pool configuration.
    pub fn with_config(config: BufferPoolConfig) -> Self {
        let catalog = Arc::new(Catalog::new());
        let pool = Arc::new(BufferPool::new(catalog.clone(), config));
        Self { catalog, pool }
    }

    /// Returns the table catalog.
    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    /// Returns the buffer pool.
    pub fn pool(&self) -> &Arc<BufferPool> {
        &self.pool
    }

    /// Begins a new transaction.
    pub fn begin(&self) -> Transaction {
        Transaction::new()
    }
}

impl Default for Database {
    fn default() -> Self {
        Self::new()
    }
}
