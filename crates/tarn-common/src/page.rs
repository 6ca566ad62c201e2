//! Page identity for Tarn storage.

use serde::{Deserialize, Serialize};

/// Size of an on-disk page in bytes. Every heap file is a whole number of
/// pages, and the buffer pool caches pages of exactly this size.
pub const PAGE_SIZE: usize = 4096;

/// Unique identifier for a page.
///
/// A PageId names a page number within the heap file of one table. The
/// table id is a stable hash of the file path, so PageIds remain valid
/// across process restarts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PageId {
    /// Table whose heap file holds the page.
    pub table_id: u32,
    /// Page number within the file (0-indexed).
    pub page_no: u32,
}

impl PageId {
    /// Creates a new PageId.
    pub fn new(table_id: u32, page_no: u32) -> Self {
        Self { table_id, page_no }
    }

    /// Returns the PageId packed into a single u64.
    pub fn as_u64(&self) -> u64 {
        ((self.table_id as u64) << 32) | (self.page_no as u64)
    }

    /// Unpacks a PageId from its u64 representation.
    pub fn from_u64(value: u64) -> Self {
        Self {
            table_id: (value >> 32) as u32,
            page_no: value as u32,
        }
    }
}

impl std::fmt::Display for PageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.table_id, self.page_no)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_size_constant() {
        assert_eq!(PAGE_SIZE, 4096);
    }

    #[test]
    fn test_page_id_new() {
        let pid = PageId::new(7, 100);
        assert_eq!(pid.table_id, 7);
        assert_eq!(pid.page_no, 100);
    }

    #[test]
    fn test_page_id_u64_roundtrip() {
        for pid in [
            PageId::new(0, 0),
            PageId::new(42, 1000),
            PageId::new(u32::MAX, 0),
            PageId::new(0, u32::MAX),
            PageId::new(u32::MAX, u32::MAX),
        ] {
            assert_eq!(pid, PageId::from_u64(pid.as_u64()));
        }
    }

    #[test]
    fn test_page_id_u64_bit_layout() {
        let pid = PageId::new(1, 2);
        assert_eq!(pid.as_u64(), (1u64 << 32) | 2);
    }

    #[test]
    fn test_page_id_display() {
        assert_eq!(PageId::new(5, 123).to_string(), "5:123");
    }

    #[test]
    fn test_page_id_hash() {
        use std::collections::HashSet;

        let mut set = HashSet::new();
        set.insert(PageId::new(1, 1));
        set.insert(PageId::new(1, 2));
        set.insert(PageId::new(1, 1));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_page_id_serde_roundtrip() {
        let original = PageId::new(10, 500);
        let serialized = serde_json::to_string(&original).unwrap();
        let deserialized: PageId = serde_json::from_str(&serialized).unwrap();
        assert_eq!(original, deserialized);
    }
}
