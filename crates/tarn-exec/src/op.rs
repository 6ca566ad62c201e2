//! The pull-based operator contract.

use std::sync::Arc;
use tarn_common::Result;
use tarn_storage::{Schema, Tuple};

/// A query operator.
///
/// Lifecycle: `open → next* → (rewind → next*)* → close`. `next` yields
/// `Ok(None)` once the operator is exhausted. Child errors propagate
/// unchanged; a deadlock victim surfaces as `TransactionAborted`.
///
/// The output schema is fixed at construction and may be inspected
/// before `open`.
pub trait Operator {
    /// Returns the operator's output schema.
    fn schema(&self) -> &Arc<Schema>;

    /// Prepares the operator for iteration.
    fn open(&mut self) -> Result<()>;

    /// Returns the next output tuple, or None when exhausted.
    fn next(&mut self) -> Result<Option<Tuple>>;

    /// Restarts iteration from the first tuple.
    fn rewind(&mut self) -> Result<()>;

    /// Ends iteration and releases operator-local state.
    fn close(&mut self);
}
