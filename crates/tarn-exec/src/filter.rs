//! Relational selection.

use crate::op::Operator;
use std::sync::Arc;
use tarn_common::Result;
use tarn_storage::{CmpOp, Field, Schema, Tuple};

/// A comparison of one tuple field against a constant.
#[derive(Debug, Clone)]
pub struct Predicate {
    /// Index of the field to test.
    pub field: usize,
    /// Comparison operator.
    pub op: CmpOp,
    /// Constant operand on the right-hand side.
    pub operand: Field,
}

impl Predicate {
    /// Creates a predicate `tuple[field] op operand`.
    pub fn new(field: usize, op: CmpOp, operand: Field) -> Self {
        Self { field, op, operand }
    }

    /// Evaluates the predicate against one tuple.
    pub fn eval(&self, tuple: &Tuple) -> Result<bool> {
        Ok(tuple.field(self.field)?.compare(self.op, &self.operand))
    }
}

impl std::fmt::Display for Predicate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "f{} {} {}", self.field, self.op, self.operand)
    }
}

/// Re-yields the child's tuples that satisfy a predicate.
pub struct Filter {
    predicate: Predicate,
    child: Box<dyn Operator>,
    schema: Arc<Schema>,
}

impl Filter {
    /// Creates a filter over `child`.
    pub fn new(predicate: Predicate, child: Box<dyn Operator>) -> Self {
        let schema = child.schema().clone();
        Self {
            predicate,
            child,
            schema,
        }
    }
}

impl Operator for Filter {
    fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    fn open(&mut self) -> Result<()> {
        self.child.open()
    }

    fn next(&mut self) -> Result<Option<Tuple>> {
        while let Some(tuple) = self.child.next()? {
            if self.predicate.eval(&tuple)? {
                return Ok(Some(tuple));
            }
        }
        Ok(None)
    }

    fn rewind(&mut self) -> Result<()> {
        self.child.rewind()
    }

    fn close(&mut self) {
        self.child.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::op::testing::RowSource;
    use tarn_storage::FieldType;

    fn rows() -> (Arc<Schema>, Vec<Tuple>) {
        let schema = Arc::new(Schema::from_types([FieldType::Int, FieldType::Text]));
        let rows = [(1, "ant"), (2, "bee"), (3, "anteater"), (4, "wasp")]
            .into_iter()
            .map(|(a, b)| {
                Tuple::new(schema.clone(), vec![Field::Int(a), Field::text(b)]).unwrap()
            })
            .collect();
        (schema, rows)
    }

    fn collect(op: &mut dyn Operator) -> Vec<Tuple> {
        let mut out = Vec::new();
        while let Some(t) = op.next().unwrap() {
            out.push(t);
        }
        out
    }

    #[test]
    fn test_filter_on_int_field() {
        let (schema, rows) = rows();
        let child = Box::new(RowSource::new(schema, rows));
        let mut filter = Filter::new(Predicate::new(0, CmpOp::Ge, Field::Int(3)), child);

        filter.open().unwrap();
        let out = collect(&mut filter);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].field(0).unwrap(), &Field::Int(3));
        assert_eq!(out[1].field(0).unwrap(), &Field::Int(4));
    }

    #[test]
    fn test_filter_like_on_text_field() {
        let (schema, rows) = rows();
        let child = Box::new(RowSource::new(schema, rows));
        let mut filter = Filter::new(Predicate::new(1, CmpOp::Like, Field::text("ant")), child);

        filter.open().unwrap();
        let out = collect(&mut filter);
        assert_eq!(out.len(), 2, "'ant' and 'anteater' both contain 'ant'");
    }

    #[test]
    fn test_filter_rewind() {
        let (schema, rows) = rows();
        let child = Box::new(RowSource::new(schema, rows));
        let mut filter = Filter::new(Predicate::new(0, CmpOp::Eq, Field::Int(2)), child);

        filter.open().unwrap();
        assert_eq!(collect(&mut filter).len(), 1);
        filter.rewind().unwrap();
        assert_eq!(collect(&mut filter).len(), 1);
    }

    #[test]
    fn test_filter_bad_field_index_errors() {
        let (schema, rows) = rows();
        let child = Box::new(RowSource::new(schema, rows));
        let mut filter = Filter::new(Predicate::new(9, CmpOp::Eq, Field::Int(1)), child);

        filter.open().unwrap();
        assert!(filter.next().is_err());
    }

    #[test]
    fn test_filter_schema_matches_child() {
        let (schema, rows) = rows();
        let child = Box::new(RowSource::new(schema.clone(), rows));
        let filter = Filter::new(Predicate::new(0, CmpOp::Eq, Field::Int(1)), child);
        assert_eq!(filter.schema().as_ref(), schema.as_ref());
    }
}
