//! Grouped aggregation.

use crate::op::Operator;
use std::collections::BTreeMap;
use std::sync::Arc;
use tarn_common::{Result, TarnError};
use tarn_storage::{Column, Field, FieldType, Schema, Tuple};

/// Aggregation operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggOp {
    Min,
    Max,
    Sum,
    Avg,
    Count,
}

impl std::fmt::Display for AggOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            AggOp::Min => "min",
            AggOp::Max => "max",
            AggOp::Sum => "sum",
            AggOp::Avg => "avg",
            AggOp::Count => "count",
        };
        write!(f, "{}", s)
    }
}

/// Per-group accumulator state. Grouping state sits in a BTreeMap so
/// result order is deterministic; the `None` key is the single group of
/// an ungrouped aggregate.
#[derive(Debug)]
enum Aggregator {
    /// Full aggregate set over an Int column.
    Int {
        acc: BTreeMap<Option<Field>, i64>,
        counts: BTreeMap<Option<Field>, i64>,
        op: AggOp,
    },
    /// Count over a Text column.
    TextCount {
        counts: BTreeMap<Option<Field>, i64>,
    },
}

impl Aggregator {
    fn merge(&mut self, group: Option<Field>, value: &Field) -> Result<()> {
        match self {
            Aggregator::Int { acc, counts, op } => {
                let v = match value {
                    Field::Int(v) => *v as i64,
                    other => {
                        return Err(TarnError::UnsupportedAggregation(format!(
                            "{} over {}",
                            op,
                            other.field_type()
                        )))
                    }
                };
                *counts.entry(group.clone()).or_insert(0) += 1;
                match acc.entry(group) {
                    std::collections::btree_map::Entry::Vacant(e) => {
                        e.insert(v);
                    }
                    std::collections::btree_map::Entry::Occupied(mut e) => {
                        let cur = *e.get();
                        let next = match op {
                            AggOp::Min => cur.min(v),
                            AggOp::Max => cur.max(v),
                            AggOp::Sum | AggOp::Avg => cur + v,
                            AggOp::Count => cur,
                        };
                        e.insert(next);
                    }
                }
                Ok(())
            }
            Aggregator::TextCount { counts } => {
                *counts.entry(group).or_insert(0) += 1;
                Ok(())
            }
        }
    }

    fn results(&self, schema: &Arc<Schema>, grouped: bool) -> Result<Vec<Tuple>> {
        let rows: Vec<(Option<Field>, i64)> = match self {
            Aggregator::Int { acc, counts, op } => acc
                .iter()
                .map(|(group, total)| {
                    let count = counts[group];
                    let out = match op {
                        AggOp::Min | AggOp::Max | AggOp::Sum => *total,
                        AggOp::Avg => total / count,
                        AggOp::Count => count,
                    };
                    (group.clone(), out)
                })
                .collect(),
            Aggregator::TextCount { counts } => counts
                .iter()
                .map(|(group, count)| (group.clone(), *count))
                .collect(),
        };

        rows.into_iter()
            .map(|(group, value)| {
                let mut fields = Vec::with_capacity(2);
                if grouped {
                    fields.push(group.expect("grouped aggregate yields grouped keys"));
                }
                fields.push(Field::Int(value as i32));
                Tuple::new(schema.clone(), fields)
            })
            .collect()
    }
}

/// Computes one aggregate over one column, optionally grouped by
/// another column.
///
/// `open` drains the child completely, then results stream from the
/// accumulated groups. Text aggregate columns support Count only.
pub struct Aggregate {
    child: Box<dyn Operator>,
    afield: usize,
    gfield: Option<usize>,
    aggregator: Aggregator,
    schema: Arc<Schema>,
    results: Vec<Tuple>,
    cursor: usize,
}

impl std::fmt::Debug for Aggregate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Aggregate")
            .field("afield", &self.afield)
            .field("gfield", &self.gfield)
            .field("aggregator", &self.aggregator)
            .field("schema", &self.schema)
            .field("results", &self.results)
            .field("cursor", &self.cursor)
            .finish()
    }
}

impl Aggregate {
    /// Creates an aggregate of `child[afield]`, grouped by
    /// `child[gfield]` when given.
    pub fn new(
        child: Box<dyn Operator>,
        afield: usize,
        gfield: Option<usize>,
        op: AggOp,
    ) -> Result<Self> {
        let child_schema = child.schema();
        let atype = child_schema.field_type(afield)?;

        let aggregator = match atype {
            FieldType::Int => Aggregator::Int {
                acc: BTreeMap::new(),
                counts: BTreeMap::new(),
                op,
            },
            FieldType::Text => {
                if op != AggOp::Count {
                    return Err(TarnError::UnsupportedAggregation(format!(
                        "{} over STRING",
                        op
                    )));
                }
                Aggregator::TextCount {
                    counts: BTreeMap::new(),
                }
            }
        };

        let agg_name = format!(
            "{}({})",
            op,
            child_schema.field_name(afield).unwrap_or("")
        );
        let mut columns = Vec::with_capacity(2);
        if let Some(g) = gfield {
            let gtype = child_schema.field_type(g)?;
            let gname = child_schema.field_name(g).unwrap_or("").to_string();
            columns.push(Column::new(gname, gtype));
        }
        columns.push(Column::new(agg_name, FieldType::Int));
        let schema = Arc::new(Schema::new(columns));

        Ok(Self {
            child,
            afield,
            gfield,
            aggregator,
            schema,
            results: Vec::new(),
            cursor: 0,
        })
    }
}

impl Operator for Aggregate {
    fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    fn open(&mut self) -> Result<()> {
        self.child.open()?;
        while let Some(tuple) = self.child.next()? {
            let group = match self.gfield {
                Some(g) => Some(tuple.field(g)?.clone()),
                None => None,
            };
            let value = tuple.field(self.afield)?.clone();
            self.aggregator.merge(group, &value)?;
        }
        self.child.close();

        self.results = self.aggregator.results(&self.schema, self.gfield.is_some())?;
        self.cursor = 0;
        Ok(())
    }

    fn next(&mut self) -> Result<Option<Tuple>> {
        let row = self.results.get(self.cursor).cloned();
        if row.is_some() {
            self.cursor += 1;
        }
        Ok(row)
    }

    fn rewind(&mut self) -> Result<()> {
        self.cursor = 0;
        Ok(())
    }

    fn close(&mut self) {
        self.cursor = self.results.len();
    }
}
