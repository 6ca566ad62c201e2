//! Pull-based query execution for Tarn.
//!
//! Operators share one contract (`open → next* → rewind? → close`) and
//! pull tuples upward; the scan leaves fetch pages through the buffer
//! pool, so every page touch is locked and cached uniformly.

mod aggregate;
mod database;
mod delete;
mod filter;
mod insert;
mod join;
mod op;
mod seq_scan;

pub use aggregate::{AggOp, Aggregate};
pub use database::Database;
pub use delete::Delete;
pub use filter::{Filter, Predicate};
pub use insert::Insert;
pub use join::{Join, JoinPredicate};
pub use op::Operator;
pub use seq_scan::SeqScan;
