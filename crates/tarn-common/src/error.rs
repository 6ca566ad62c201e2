//! Error types for Tarn.

use crate::page::PageId;
use crate::tx::TransactionId;
use thiserror::Error;

/// Result type alias using TarnError.
pub type Result<T> = std::result::Result<T, TarnError>;

/// Errors that can occur in Tarn operations.
#[derive(Debug, Error)]
pub enum TarnError {
    // I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Structural errors
    #[error("schema mismatch: expected {expected}, got {actual}")]
    SchemaMismatch { expected: String, actual: String },

    #[error("no such table: {0}")]
    NoSuchTable(String),

    #[error("no such field: {0}")]
    NoSuchField(String),

    #[error("page {0} does not belong to table {1}")]
    BadTable(PageId, u32),

    // Page-level errors
    #[error("no free slot on page {0}")]
    PageFull(PageId),

    #[error("tuple is not stored on page {0}")]
    TupleNotOnPage(PageId),

    #[error("page {page_no} out of bounds, file has {num_pages} pages")]
    PageOutOfBounds { page_no: u32, num_pages: u32 },

    #[error("page data is {0} bytes, expected {1}")]
    BadPageSize(usize, usize),

    #[error("corrupt page data: {0}")]
    Corrupt(String),

    // Concurrency errors
    #[error("deadlock detected")]
    Deadlock,

    #[error("transaction {0} aborted")]
    TransactionAborted(TransactionId),

    // Buffer pool errors
    #[error("buffer pool full, every cached page is dirty")]
    BufferPoolFull,

    // Execution errors
    #[error("unsupported aggregation: {0}")]
    UnsupportedAggregation(String),

    #[error("tuple has no record id")]
    MissingRecordId,

    // Catalog ingest errors
    #[error("malformed catalog entry: {0}")]
    BadCatalogEntry(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: TarnError = io_err.into();
        assert!(matches!(err, TarnError::Io(_)));
        assert!(err.to_string().contains("I/O error"));
    }

    #[test]
    fn test_structural_errors_display() {
        let err = TarnError::SchemaMismatch {
            expected: "INT, STRING".to_string(),
            actual: "INT".to_string(),
        };
        assert_eq!(err.to_string(), "schema mismatch: expected INT, STRING, got INT");

        let err = TarnError::NoSuchTable("users".to_string());
        assert_eq!(err.to_string(), "no such table: users");

        let err = TarnError::BadTable(PageId::new(1, 0), 2);
        assert_eq!(err.to_string(), "page 1:0 does not belong to table 2");
    }

    #[test]
    fn test_page_errors_display() {
        let err = TarnError::PageFull(PageId::new(3, 4));
        assert_eq!(err.to_string(), "no free slot on page 3:4");

        let err = TarnError::PageOutOfBounds {
            page_no: 9,
            num_pages: 3,
        };
        assert_eq!(err.to_string(), "page 9 out of bounds, file has 3 pages");

        let err = TarnError::BadPageSize(100, 4096);
        assert_eq!(err.to_string(), "page data is 100 bytes, expected 4096");
    }

    #[test]
    fn test_concurrency_errors_display() {
        assert_eq!(TarnError::Deadlock.to_string(), "deadlock detected");

        let tid = TransactionId::new();
        let err = TarnError::TransactionAborted(tid);
        assert_eq!(err.to_string(), format!("transaction {} aborted", tid));
    }

    #[test]
    fn test_buffer_pool_full_display() {
        assert_eq!(
            TarnError::BufferPoolFull.to_string(),
            "buffer pool full, every cached page is dirty"
        );
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<TarnError>();
    }
}
