//! Tuple representation and serialization.

use crate::field::Field;
use crate::schema::Schema;
use bytes::{Buf, BufMut};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tarn_common::{PageId, Result, TarnError};

/// Stable address of a tuple slot: a page plus a slot number on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordId {
    /// Page holding the tuple.
    pub page_id: PageId,
    /// Slot number within the page.
    pub slot: u16,
}

impl RecordId {
    /// Creates a new RecordId.
    pub fn new(page_id: PageId, slot: u16) -> Self {
        Self { page_id, slot }
    }
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.page_id, self.slot)
    }
}

/// A row: schema-shaped field values, plus the slot address once the
/// tuple has been materialized on a page.
///
/// Construction validates field types against the schema, so a Tuple is
/// always internally consistent. Equality compares field values only.
#[derive(Debug, Clone)]
pub struct Tuple {
    schema: Arc<Schema>,
    fields: Vec<Field>,
    rid: Option<RecordId>,
}

impl Tuple {
    /// Creates a tuple, validating arity and field types.
    pub fn new(schema: Arc<Schema>, fields: Vec<Field>) -> Result<Self> {
        let actual: Vec<_> = fields.iter().map(|f| f.field_type()).collect();
        let matches = actual.len() == schema.num_fields()
            && actual
                .iter()
                .zip(schema.columns())
                .all(|(ty, col)| *ty == col.ty);
        if !matches {
            return Err(TarnError::SchemaMismatch {
                expected: schema.type_desc(),
                actual: actual
                    .iter()
                    .map(|t| t.to_string())
                    .collect::<Vec<_>>()
                    .join(", "),
            });
        }
        Ok(Self {
            schema,
            fields,
            rid: None,
        })
    }

    /// Returns the tuple's schema.
    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// Returns field `i`.
    pub fn field(&self, i: usize) -> Result<&Field> {
        self.fields
            .get(i)
            .ok_or_else(|| TarnError::NoSuchField(format!("index {} of {}", i, self.fields.len())))
    }

    /// Returns all fields in order.
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Replaces field `i`, keeping the schema's type.
    pub fn set_field(&mut self, i: usize, field: Field) -> Result<()> {
        let expected = self.schema.field_type(i)?;
        if field.field_type() != expected {
            return Err(TarnError::SchemaMismatch {
                expected: expected.to_string(),
                actual: field.field_type().to_string(),
            });
        }
        self.fields[i] = field;
        Ok(())
    }

    /// Returns the slot address, if this tuple is materialized on a page.
    pub fn rid(&self) -> Option<RecordId> {
        self.rid
    }

    /// Sets or clears the slot address.
    pub fn set_rid(&mut self, rid: Option<RecordId>) {
        self.rid = rid;
    }

    /// Serializes all fields at the schema's fixed row width.
    pub fn write_to(&self, buf: &mut impl BufMut) {
        for field in &self.fields {
            field.write_to(buf);
        }
    }

    /// Deserializes one row of the given schema.
    pub fn read_from(schema: Arc<Schema>, buf: &mut impl Buf) -> Result<Self> {
        let mut fields = Vec::with_capacity(schema.num_fields());
        for column in schema.columns() {
            fields.push(Field::read_from(column.ty, buf)?);
        }
        Ok(Self {
            schema,
            fields,
            rid: None,
        })
    }
}

impl PartialEq for Tuple {
    fn eq(&self, other: &Self) -> bool {
        self.fields == other.fields
    }
}

impl Eq for Tuple {}

impl std::fmt::Display for Tuple {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let rendered = self
            .fields
            .iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join("\t");
        write!(f, "{}", rendered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Column;
    use crate::types::FieldType;

    fn int_text_schema() -> Arc<Schema> {
        Arc::new(Schema::new(vec![
            Column::new("a", FieldType::Int),
            Column::new("b", FieldType::Text),
        ]))
    }

    #[test]
    fn test_record_id_display_and_eq() {
        let rid = RecordId::new(PageId::new(1, 2), 3);
        assert_eq!(rid.to_string(), "1:2:3");
        assert_eq!(rid, RecordId::new(PageId::new(1, 2), 3));
        assert_ne!(rid, RecordId::new(PageId::new(1, 2), 4));
    }

    #[test]
    fn test_new_validates_types() {
        let schema = int_text_schema();
        assert!(Tuple::new(schema.clone(), vec![Field::Int(1), Field::text("x")]).is_ok());

        let wrong_arity = Tuple::new(schema.clone(), vec![Field::Int(1)]);
        assert!(matches!(wrong_arity, Err(TarnError::SchemaMismatch { .. })));

        let wrong_type = Tuple::new(schema, vec![Field::text("x"), Field::text("y")]);
        assert!(matches!(wrong_type, Err(TarnError::SchemaMismatch { .. })));
    }

    #[test]
    fn test_field_access() {
        let t = Tuple::new(int_text_schema(), vec![Field::Int(7), Field::text("q")]).unwrap();
        assert_eq!(t.field(0).unwrap(), &Field::Int(7));
        assert_eq!(t.field(1).unwrap(), &Field::text("q"));
        assert!(t.field(2).is_err());
    }

    #[test]
    fn test_set_field_checks_type() {
        let mut t = Tuple::new(int_text_schema(), vec![Field::Int(7), Field::text("q")]).unwrap();
        t.set_field(0, Field::Int(9)).unwrap();
        assert_eq!(t.field(0).unwrap(), &Field::Int(9));
        assert!(t.set_field(0, Field::text("no")).is_err());
    }

    #[test]
    fn test_rid_roundtrip() {
        let mut t = Tuple::new(int_text_schema(), vec![Field::Int(1), Field::text("x")]).unwrap();
        assert!(t.rid().is_none());
        let rid = RecordId::new(PageId::new(1, 0), 5);
        t.set_rid(Some(rid));
        assert_eq!(t.rid(), Some(rid));
    }

    #[test]
    fn test_serialization_roundtrip() {
        let schema = int_text_schema();
        let t = Tuple::new(schema.clone(), vec![Field::Int(-42), Field::text("pocket")]).unwrap();

        let mut buf = Vec::new();
        t.write_to(&mut buf);
        assert_eq!(buf.len(), schema.width());

        let mut cursor = buf.as_slice();
        let back = Tuple::read_from(schema, &mut cursor).unwrap();
        assert_eq!(back, t);
    }

    #[test]
    fn test_equality_ignores_rid() {
        let a = Tuple::new(int_text_schema(), vec![Field::Int(1), Field::text("x")]).unwrap();
        let mut b = a.clone();
        b.set_rid(Some(RecordId::new(PageId::new(0, 0), 0)));
        assert_eq!(a, b);
    }

    #[test]
    fn test_display() {
        let t = Tuple::new(int_text_schema(), vec![Field::Int(1), Field::text("x")]).unwrap();
        assert_eq!(t.to_string(), "1\tx");
    }
}
