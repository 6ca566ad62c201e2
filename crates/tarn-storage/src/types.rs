//! Field type identifiers.

use serde::{Deserialize, Serialize};

/// Maximum payload of a Text field in bytes. On disk every Text field
/// occupies a 4-byte length prefix plus exactly this many payload bytes.
pub const TEXT_CAPACITY: usize = 128;

/// Type of a single column value.
///
/// All widths are known statically, so rows of a given schema are
/// fixed-size and pages can be laid out as fixed slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum FieldType {
    /// 32-bit signed integer.
    Int = 0,
    /// Fixed-capacity string of at most TEXT_CAPACITY bytes.
    Text = 1,
}

impl FieldType {
    /// Returns the on-disk width of a value of this type in bytes.
    pub fn width(&self) -> usize {
        match self {
            FieldType::Int => 4,
            FieldType::Text => 4 + TEXT_CAPACITY,
        }
    }

    /// Parses a catalog type name (`int` or `string`).
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "int" => Some(FieldType::Int),
            "string" => Some(FieldType::Text),
            _ => None,
        }
    }
}

impl std::fmt::Display for FieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldType::Int => write!(f, "INT"),
            FieldType::Text => write!(f, "STRING"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_widths() {
        assert_eq!(FieldType::Int.width(), 4);
        assert_eq!(FieldType::Text.width(), 132);
    }

    #[test]
    fn test_parse() {
        assert_eq!(FieldType::parse("int"), Some(FieldType::Int));
        assert_eq!(FieldType::parse("string"), Some(FieldType::Text));
        assert_eq!(FieldType::parse("float"), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(FieldType::Int.to_string(), "INT");
        assert_eq!(FieldType::Text.to_string(), "STRING");
    }

    #[test]
    fn test_serde_roundtrip() {
        for ty in [FieldType::Int, FieldType::Text] {
            let serialized = serde_json::to_string(&ty).unwrap();
            let deserialized: FieldType = serde_json::from_str(&serialized).unwrap();
            assert_eq!(ty, deserialized);
        }
    }
}
