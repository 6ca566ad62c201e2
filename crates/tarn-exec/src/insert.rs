//! Tuple insertion operator.

use crate::op::Operator;
use std::sync::Arc;
use tarn_buffer::BufferPool;
use tarn_common::{Result, TarnError, TransactionId};
use tarn_storage::{Field, FieldType, Schema, Tuple};

/// Inserts every tuple read from the child into one table, routing each
/// through the buffer pool.
///
/// The first `next` drains the child completely and yields a single
/// one-field tuple holding the insert count; every later call yields
/// None.
pub struct Insert {
    tid: TransactionId,
    child: Box<dyn Operator>,
    table_id: u32,
    pool: Arc<BufferPool>,
    schema: Arc<Schema>,
    done: bool,
}

impl std::fmt::Debug for Insert {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Insert")
            .field("tid", &self.tid)
            .field("table_id", &self.table_id)
            .field("schema", &self.schema)
            .field("done", &self.done)
            .finish()
    }
}

impl Insert {
    /// Creates an insert into `table_id`.
    ///
    /// Fails with `SchemaMismatch` if the child's schema differs from
    /// the table's.
    pub fn new(
        pool: Arc<BufferPool>,
        tid: TransactionId,
        child: Box<dyn Operator>,
        table_id: u32,
    ) -> Result<Self> {
        let table_schema = pool.catalog().schema(table_id)?;
        if child.schema().as_ref() != table_schema.as_ref() {
            return Err(TarnError::SchemaMismatch {
                expected: table_schema.type_desc(),
                actual: child.schema().type_desc(),
            });
        }

        Ok(Self {
            tid,
            child,
            table_id,
            pool,
            schema: Arc::new(Schema::from_types([FieldType::Int])),
            done: false,
        })
    }
}

impl Operator for Insert {
    fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    fn open(&mut self) -> Result<()> {
        self.child.open()
    }

    fn next(&mut self) -> Result<Option<Tuple>> {
        if self.done {
            return Ok(None);
        }

        let mut count = 0;
        while let Some(tuple) = self.child.next()? {
            self.pool.insert_tuple(self.tid, self.table_id, tuple)?;
            count += 1;
        }
        self.done = true;
        log::debug!("{} inserted {} tuples into table {}", self.tid, count, self.table_id);
        Ok(Some(Tuple::new(self.schema.clone(), vec![Field::Int(count)])?))
    }

    fn rewind(&mut self) -> Result<()> {
        // The count tuple is one-shot; rewinding only repositions the
        // drained child.
        self.child.rewind()
    }

    fn close(&mut self) {
        self.child.close();
    }
}
