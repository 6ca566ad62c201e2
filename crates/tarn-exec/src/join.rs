//! Nested-loop join.

use crate::op::Operator;
use std::sync::Arc;
use tarn_common::Result;
use tarn_storage::{CmpOp, Schema, Tuple};

/// A comparison between one field of each join input.
#[derive(Debug, Clone)]
pub struct JoinPredicate {
    /// Field index in the left (outer) input.
    pub left: usize,
    /// Comparison operator.
    pub op: CmpOp,
    /// Field index in the right (inner) input.
    pub right: usize,
}

impl JoinPredicate {
    /// Creates a predicate `left[i] op right[j]`.
    pub fn new(left: usize, op: CmpOp, right: usize) -> Self {
        Self { left, op, right }
    }

    /// Evaluates the predicate for one pair of tuples.
    pub fn eval(&self, left: &Tuple, right: &Tuple) -> Result<bool> {
        Ok(left
            .field(self.left)?
            .compare(self.op, right.field(self.right)?))
    }
}

/// Joins two children with nested-loop semantics: the left input is the
/// outer loop, and the right input is rewound for every outer tuple.
/// Output rows concatenate left fields then right fields.
pub struct Join {
    predicate: JoinPredicate,
    left: Box<dyn Operator>,
    right: Box<dyn Operator>,
    schema: Arc<Schema>,
    outer: Option<Tuple>,
}

impl Join {
    /// Creates a join of `left` and `right`.
    pub fn new(predicate: JoinPredicate, left: Box<dyn Operator>, right: Box<dyn Operator>) -> Self {
        let schema = Arc::new(Schema::combine(left.schema(), right.schema()));
        Self {
            predicate,
            left,
            right,
            schema,
            outer: None,
        }
    }
}

impl Operator for Join {
    fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    fn open(&mut self) -> Result<()> {
        self.left.open()?;
        self.right.open()?;
        self.outer = None;
        Ok(())
    }

    fn next(&mut self) -> Result<Option<Tuple>> {
        loop {
            let outer = match self.outer.clone() {
                Some(t) => t,
                None => match self.left.next()? {
                    Some(t) => {
                        self.right.rewind()?;
                        self.outer = Some(t.clone());
                        t
                    }
                    None => return Ok(None),
                },
            };

            while let Some(inner) = self.right.next()? {
                if self.predicate.eval(&outer, &inner)? {
                    let mut fields = outer.fields().to_vec();
                    fields.extend(inner.fields().iter().cloned());
                    return Ok(Some(Tuple::new(self.schema.clone(), fields)?));
                }
            }
            self.outer = None;
        }
    }

    fn rewind(&mut self) -> Result<()> {
        self.left.rewind()?;
        self.right.rewind()?;
        self.outer = None;
        Ok(())
    }

    fn close(&mut self) {
        self.left.close();
        self.right.close();
        self.outer = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::op::testing::RowSource;
    use tarn_storage::{Field, FieldType};

    fn source(values: &[(i32, &str)]) -> Box<RowSource> {
        let schema = Arc::new(Schema::from_types([FieldType::Int, FieldType::Text]));
        let rows = values
            .iter()
            .map(|(a, b)| {
                Tuple::new(schema.clone(), vec![Field::Int(*a), Field::text(*b)]).unwrap()
            })
            .collect();
        Box::new(RowSource::new(schema, rows))
    }

    fn collect(op: &mut dyn Operator) -> Vec<Tuple> {
        let mut out = Vec::new();
        while let Some(t) = op.next().unwrap() {
            out.push(t);
        }
        out
    }

    #[test]
    fn test_equijoin() {
        let left = source(&[(1, "l1"), (2, "l2"), (3, "l3")]);
        let right = source(&[(2, "r2"), (3, "r3a"), (3, "r3b")]);
        let mut join = Join::new(JoinPredicate::new(0, CmpOp::Eq, 0), left, right);

        join.open().unwrap();
        let out = collect(&mut join);
        assert_eq!(out.len(), 3);

        // Matches come out in outer order, inner order within.
        assert_eq!(out[0].field(1).unwrap(), &Field::text("l2"));
        assert_eq!(out[0].field(3).unwrap(), &Field::text("r2"));
        assert_eq!(out[1].field(3).unwrap(), &Field::text("r3a"));
        assert_eq!(out[2].field(3).unwrap(), &Field::text("r3b"));
    }

    #[test]
    fn test_join_schema_combines_children() {
        let left = source(&[]);
        let right = source(&[]);
        let join = Join::new(JoinPredicate::new(0, CmpOp::Eq, 0), left, right);
        assert_eq!(join.schema().num_fields(), 4);
        assert_eq!(join.schema().width(), 2 * (4 + 132));
    }

    #[test]
    fn test_join_inequality() {
        let left = source(&[(1, "a"), (2, "b")]);
        let right = source(&[(1, "x"), (2, "y")]);
        let mut join = Join::new(JoinPredicate::new(0, CmpOp::Lt, 0), left, right);

        join.open().unwrap();
        let out = collect(&mut join);
        // Only (1, ...) < (2, ...)
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].field(0).unwrap(), &Field::Int(1));
        assert_eq!(out[0].field(2).unwrap(), &Field::Int(2));
    }

    #[test]
    fn test_join_empty_inputs() {
        let mut join = Join::new(JoinPredicate::new(0, CmpOp::Eq, 0), source(&[]), source(&[(1, "x")]));
        join.open().unwrap();
        assert!(join.next().unwrap().is_none());

        let mut join = Join::new(JoinPredicate::new(0, CmpOp::Eq, 0), source(&[(1, "x")]), source(&[]));
        join.open().unwrap();
        assert!(join.next().unwrap().is_none());
    }

    #[test]
    fn test_join_rewind() {
        let left = source(&[(1, "a")]);
        let right = source(&[(1, "x")]);
        let mut join = Join::new(JoinPredicate::new(0, CmpOp::Eq, 0), left, right);

        join.open().unwrap();
        assert_eq!(collect(&mut join).len(), 1);
        join.rewind().unwrap();
        assert_eq!(collect(&mut join).len(), 1);
    }
}
