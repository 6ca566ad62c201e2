//! Storage engine for Tarn.
//!
//! This crate provides:
//! - Field, schema, and tuple primitives with fixed-width serialization
//! - Slotted heap pages (used-slot bitmap plus fixed-size tuple slots)
//! - Heap files backing one table each, with page-granular I/O
//! - The process-wide table catalog
//! - The `PageCache` seam through which all page traffic is routed

mod cache;
mod catalog;
mod field;
mod schema;
mod tuple;
mod types;

pub mod heap;

pub use cache::{PageCache, PageRef};
pub use catalog::Catalog;
pub use field::{CmpOp, Field};
pub use heap::{HeapFile, HeapPage, HeapScan};
pub use schema::{Column, Schema};
pub use tuple::{RecordId, Tuple};
pub use types::{FieldType, TEXT_CAPACITY};
