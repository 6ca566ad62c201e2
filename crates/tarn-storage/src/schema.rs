//! Table schemas: ordered, optionally named, fixed-width columns.

use crate::types::FieldType;
use tarn_common::{Result, TarnError};

/// One column of a schema.
#[derive(Debug, Clone)]
pub struct Column {
    /// Optional column name; anonymous columns cannot be looked up by name.
    pub name: Option<String>,
    /// Value type of the column.
    pub ty: FieldType,
}

impl Column {
    /// Creates a named column.
    pub fn new(name: impl Into<String>, ty: FieldType) -> Self {
        Self {
            name: Some(name.into()),
            ty,
        }
    }

    /// Creates an anonymous column.
    pub fn unnamed(ty: FieldType) -> Self {
        Self { name: None, ty }
    }
}

/// Schema of a tuple: an ordered sequence of at least one column.
///
/// Row width is the sum of the column widths and is fixed per schema.
/// Two schemas are equal iff their type sequences are pointwise equal;
/// column names do not participate in equality.
#[derive(Debug, Clone)]
pub struct Schema {
    columns: Vec<Column>,
    width: usize,
}

impl Schema {
    /// Creates a schema from columns. Must contain at least one column.
    pub fn new(columns: Vec<Column>) -> Self {
        assert!(!columns.is_empty(), "schema needs at least one column");
        let width = columns.iter().map(|c| c.ty.width()).sum();
        Self { columns, width }
    }

    /// Creates a schema of anonymous columns from types alone.
    pub fn from_types(types: impl IntoIterator<Item = FieldType>) -> Self {
        Self::new(types.into_iter().map(Column::unnamed).collect())
    }

    /// Returns the number of columns.
    pub fn num_fields(&self) -> usize {
        self.columns.len()
    }

    /// Returns the columns in order.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Returns the type of column `i`.
    pub fn field_type(&self, i: usize) -> Result<FieldType> {
        self.columns
            .get(i)
            .map(|c| c.ty)
            .ok_or_else(|| TarnError::NoSuchField(format!("index {} of {}", i, self.columns.len())))
    }

    /// Returns the name of column `i`, if it has one.
    pub fn field_name(&self, i: usize) -> Option<&str> {
        self.columns.get(i).and_then(|c| c.name.as_deref())
    }

    /// Returns the index of the first column with the given name.
    pub fn index_of(&self, name: &str) -> Result<usize> {
        self.columns
            .iter()
            .position(|c| c.name.as_deref() == Some(name))
            .ok_or_else(|| TarnError::NoSuchField(name.to_string()))
    }

    /// Returns the fixed on-disk width of one row in bytes.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Concatenates two schemas, left columns first.
    pub fn combine(left: &Schema, right: &Schema) -> Schema {
        let mut columns = left.columns.clone();
        columns.extend(right.columns.iter().cloned());
        Schema::new(columns)
    }

    /// Renders the type sequence, e.g. `INT, STRING`.
    pub fn type_desc(&self) -> String {
        self.columns
            .iter()
            .map(|c| c.ty.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl PartialEq for Schema {
    fn eq(&self, other: &Self) -> bool {
        self.columns.len() == other.columns.len()
            && self
                .columns
                .iter()
                .zip(other.columns.iter())
                .all(|(a, b)| a.ty == b.ty)
    }
}

impl Eq for Schema {}

impl std::fmt::Display for Schema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let rendered = self
            .columns
            .iter()
            .map(|c| format!("{}({})", c.ty, c.name.as_deref().unwrap_or("")))
            .collect::<Vec<_>>()
            .join(", ");
        write!(f, "{}", rendered)
    }
}
