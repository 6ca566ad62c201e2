//! Sequential scan over one table.

use crate::op::Operator;
use std::sync::Arc;
use tarn_buffer::BufferPool;
use tarn_common::{Result, TransactionId};
use tarn_storage::{Column, HeapScan, PageCache, Schema, Tuple};

/// Scans a table's heap file in page order, as part of a transaction.
///
/// The output schema carries the table's field names qualified with the
/// scan alias (`alias.field`); the tuples themselves keep the table
/// schema, which is equal under type-sequence equality.
pub struct SeqScan {
    scan: HeapScan,
    schema: Arc<Schema>,
}

impl SeqScan {
    /// Creates a scan of `table_id` under the given alias.
    pub fn new(
        pool: Arc<BufferPool>,
        tid: TransactionId,
        table_id: u32,
        alias: &str,
    ) -> Result<Self> {
        let file = pool.catalog().file(table_id)?;

        let columns = file
            .schema()
            .columns()
            .iter()
            .map(|c| {
                Column::new(
                    format!("{}.{}", alias, c.name.as_deref().unwrap_or("")),
                    c.ty,
                )
            })
            .collect();
        let schema = Arc::new(Schema::new(columns));

        let cache: Arc<dyn PageCache> = pool;
        let scan = HeapScan::new(file, cache, tid);
        Ok(Self { scan, schema })
    }
}

impl Operator for SeqScan {
    fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    fn open(&mut self) -> Result<()> {
        self.scan.open()
    }

    fn next(&mut self) -> Result<Option<Tuple>> {
        self.scan.next()
    }

    fn rewind(&mut self) -> Result<()> {
        self.scan.rewind()
    }

    fn close(&mut self) {
        self.scan.close();
    }
}
