//! Column values and their fixed-width encoding.

use crate::types::{FieldType, TEXT_CAPACITY};
use bytes::{Buf, BufMut};
use tarn_common::{Result, TarnError};

/// Comparison operators usable in selection predicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    /// Substring match for Text values; plain equality for Int values.
    Like,
}

impl std::fmt::Display for CmpOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            CmpOp::Eq => "=",
            CmpOp::Ne => "<>",
            CmpOp::Lt => "<",
            CmpOp::Le => "<=",
            CmpOp::Gt => ">",
            CmpOp::Ge => ">=",
            CmpOp::Like => "like",
        };
        write!(f, "{}", s)
    }
}

/// A single column value.
///
/// Fields are ordered and hashable so they can key aggregation groups.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    Int(i32),
    Text(String),
}

impl Field {
    /// Builds a Text field, truncating the payload to TEXT_CAPACITY
    /// bytes (on a character boundary).
    pub fn text(s: impl Into<String>) -> Self {
        let mut s = s.into();
        if s.len() > TEXT_CAPACITY {
            let mut end = TEXT_CAPACITY;
            while !s.is_char_boundary(end) {
                end -= 1;
            }
            s.truncate(end);
        }
        Field::Text(s)
    }

    /// Returns the type of this field.
    pub fn field_type(&self) -> FieldType {
        match self {
            Field::Int(_) => FieldType::Int,
            Field::Text(_) => FieldType::Text,
        }
    }

    /// Serializes the field at its type's fixed width.
    ///
    /// Integers are 4-byte little-endian. Text is a 4-byte little-endian
    /// length followed by exactly TEXT_CAPACITY payload bytes, zero past
    /// the length.
    pub fn write_to(&self, buf: &mut impl BufMut) {
        match self {
            Field::Int(v) => buf.put_i32_le(*v),
            Field::Text(s) => {
                let len = s.len().min(TEXT_CAPACITY);
                buf.put_u32_le(len as u32);
                buf.put_slice(&s.as_bytes()[..len]);
                buf.put_bytes(0, TEXT_CAPACITY - len);
            }
        }
    }

    /// Deserializes a field of the given type from its fixed-width encoding.
    pub fn read_from(ty: FieldType, buf: &mut impl Buf) -> Result<Self> {
        match ty {
            FieldType::Int => Ok(Field::Int(buf.get_i32_le())),
            FieldType::Text => {
                let len = buf.get_u32_le() as usize;
                if len > TEXT_CAPACITY {
                    return Err(TarnError::Corrupt(format!(
                        "text length {} exceeds capacity {}",
                        len, TEXT_CAPACITY
                    )));
                }
                let mut payload = [0u8; TEXT_CAPACITY];
                buf.copy_to_slice(&mut payload);
                let s = String::from_utf8_lossy(&payload[..len]).into_owned();
                Ok(Field::Text(s))
            }
        }
    }

    /// Evaluates `self op other`.
    ///
    /// Comparing fields of different types yields false (true for Ne).
    pub fn compare(&self, op: CmpOp, other: &Field) -> bool {
        match (self, other) {
            (Field::Int(a), Field::Int(b)) => match op {
                CmpOp::Eq | CmpOp::Like => a == b,
                CmpOp::Ne => a != b,
                CmpOp::Lt => a < b,
                CmpOp::Le => a <= b,
                CmpOp::Gt => a > b,
                CmpOp::Ge => a >= b,
            },
            (Field::Text(a), Field::Text(b)) => match op {
                CmpOp::Eq => a == b,
                CmpOp::Ne => a != b,
                CmpOp::Lt => a < b,
                CmpOp::Le => a <= b,
                CmpOp::Gt => a > b,
                CmpOp::Ge => a >= b,
                CmpOp::Like => a.contains(b.as_str()),
            },
            _ => op == CmpOp::Ne,
        }
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Field::Int(v) => write!(f, "{}", v),
            Field::Text(s) => write!(f, "{}", s),
        }
    }
}
