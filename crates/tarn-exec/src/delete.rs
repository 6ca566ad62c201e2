//! Tuple deletion operator.

use crate::op::Operator;
use std::sync::Arc;
use tarn_buffer::BufferPool;
use tarn_common::{Result, TransactionId};
use tarn_storage::{Field, FieldType, Schema, Tuple};

/// Deletes every tuple read from the child from the table it lives in,
/// routing each through the buffer pool.
///
/// The first `next` drains the child and yields a single one-field
/// tuple holding the delete count; every later call yields None.
pub struct Delete {
    tid: TransactionId,
    child: Box<dyn Operator>,
    pool: Arc<BufferPool>,
    schema: Arc<Schema>,
    done: bool,
}

impl Delete {
    /// Creates a delete fed by `child`.
    pub fn new(pool: Arc<BufferPool>, tid: TransactionId, child: Box<dyn Operator>) -> Self {
        Self {
            tid,
            child,
            pool,
            schema: Arc::new(Schema::from_types([FieldType::Int])),
            done: false,
        }
    }
}

impl Operator for Delete {
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
            self.pool.delete_tuple(self.tid, &tuple)?;
            count += 1;
        }
        self.done = true;
        log::debug!("{} deleted {} tuples", self.tid, count);
        Ok(Some(Tuple::new(self.schema.clone(), vec![Field::Int(count)])?))
    }

    fn rewind(&mut self) -> Result<()> {
        self.child.rewind()
    }

    fn close(&mut self) {
        self.child.close();
    }
}
