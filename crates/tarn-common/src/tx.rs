//! Transaction identity and page access permissions.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_TRANSACTION_ID: AtomicU64 = AtomicU64::new(0);

/// Process-unique transaction identifier.
///
/// Ids are drawn from a monotonically increasing counter, so no two
/// transactions in the same process ever share an id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TransactionId(u64);

impl TransactionId {
    /// Allocates a fresh transaction id.
    pub fn new() -> Self {
        Self(NEXT_TRANSACTION_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the raw id value.
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl Default for TransactionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TransactionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "txn:{}", self.0)
    }
}

/// Access mode requested when fetching a page.
///
/// ReadOnly maps to a shared page lock, ReadWrite to an exclusive one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Permissions {
    /// Shared access; many transactions may read the page together.
    ReadOnly,
    /// Exclusive access; a single transaction may mutate the page.
    ReadWrite,
}

impl std::fmt::Display for Permissions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Permissions::ReadOnly => write!(f, "shared"),
            Permissions::ReadWrite => write!(f, "exclusive"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transaction_ids_unique() {
        let a = TransactionId::new();
        let b = TransactionId::new();
        let c = TransactionId::new();
        assert_ne!(a, b);
        assert_ne!(b, c);
        assert_ne!(a, c);
    }

    #[test]
    fn test_transaction_ids_monotonic() {
        let a = TransactionId::new();
        let b = TransactionId::new();
        assert!(a.value() < b.value());
    }

    #[test]
    fn test_transaction_id_display() {
        let tid = TransactionId::new();
        assert_eq!(tid.to_string(), format!("txn:{}", tid.value()));
    }

    #[test]
    fn test_permissions_display() {
        assert_eq!(Permissions::ReadOnly.to_string(), "shared");
        assert_eq!(Permissions::ReadWrite.to_string(), "exclusive");
    }

    #[test]
    fn test_permissions_equality() {
        assert_eq!(Permissions::ReadOnly, Permissions::ReadOnly);
        assert_ne!(Permissions::ReadOnly, Permissions::ReadWrite);
    }
}
