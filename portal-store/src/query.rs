//! Query descriptions.
//!
//! Subscription adapters forward queries verbatim; only stores evaluate
//! constraints.

use crate::error::{StoreError, StoreResult};
use portal_model::{FieldValue, RawRecord};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Comparison used by a `where` constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterOp {
    Equal,
    NotEqual,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
    /// The field is an array containing the value.
    ArrayContains,
    /// The field equals one element of the value, which must be an array.
    In,
}

/// Sort direction of an `order by` constraint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    #[default]
    #[serde(alias = "asc")]
    Ascending,
    #[serde(alias = "desc")]
    Descending,
}

/// One filter, ordering or limit applied to a collection query.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryConstraint {
    Where {
        field: String,
        op: FilterOp,
        value: FieldValue,
    },
    OrderBy {
        field: String,
        direction: Direction,
    },
    Limit(usize),
}

impl QueryConstraint {
    /// True when `record` passes this constraint. Orderings and limits pass
    /// every record.
    pub fn matches(&self, record: &RawRecord) -> bool {
        let Self::Where { field, op, value } = self else {
            return true;
        };
        let Some(actual) = record.get(field) else {
            return false;
        };
        match op {
            FilterOp::Equal => same(actual, value),
            FilterOp::NotEqual => !same(actual, value),
            FilterOp::LessThan => actual.compare(value) == Some(Ordering::Less),
            FilterOp::LessThanOrEqual => {
                matches!(actual.compare(value), Some(Ordering::Less | Ordering::Equal))
            }
            FilterOp::GreaterThan => actual.compare(value) == Some(Ordering::Greater),
            FilterOp::GreaterThanOrEqual => {
                matches!(actual.compare(value), Some(Ordering::Greater | Ordering::Equal))
            }
            FilterOp::ArrayContains => actual
                .as_array()
                .is_some_and(|items| items.iter().any(|item| same(item, value))),
            FilterOp::In => value
                .as_array()
                .is_some_and(|options| options.iter().any(|option| same(actual, option))),
        }
    }
}

fn same(a: &FieldValue, b: &FieldValue) -> bool {
    a == b || a.compare(b) == Some(Ordering::Equal)
}

/// A live query against one collection.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    collection: String,
    constraints: Vec<QueryConstraint>,
}

impl Query {
    /// Every document of `collection`.
    pub fn collection(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            constraints: Vec::new(),
        }
    }

    /// Adds a `where` constraint.
    #[must_use]
    pub fn filter(mut self, field: impl Into<String>, op: FilterOp, value: impl Into<FieldValue>) -> Self {
        self.constraints.push(QueryConstraint::Where {
            field: field.into(),
            op,
            value: value.into(),
        });
        self
    }

    /// Adds an `order by` constraint.
    #[must_use]
    pub fn order_by(mut self, field: impl Into<String>, direction: Direction) -> Self {
        self.constraints.push(QueryConstraint::OrderBy {
            field: field.into(),
            direction,
        });
        self
    }

    /// Adds a limit. The last limit wins.
    #[must_use]
    pub fn limit(mut self, limit: usize) -> Self {
        self.constraints.push(QueryConstraint::Limit(limit));
        self
    }

    /// Adds an arbitrary constraint.
    #[must_use]
    pub fn with_constraint(mut self, constraint: QueryConstraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    pub fn collection_name(&self) -> &str {
        &self.collection
    }

    pub fn constraints(&self) -> &[QueryConstraint] {
        &self.constraints
    }

    /// Checks the query is well formed.
    pub fn validate(&self) -> StoreResult<()> {
        if self.collection.is_empty() || self.collection.contains('/') {
            return Err(StoreError::InvalidQuery(format!(
                "invalid collection name {:?}",
                self.collection
            )));
        }
        for constraint in &self.constraints {
            if let QueryConstraint::Where {
                field,
                op: FilterOp::In,
                value,
            } = constraint
            {
                if value.as_array().is_none() {
                    return Err(StoreError::InvalidQuery(format!(
                        "`in` filter on `{field}` needs an array value"
                    )));
                }
            }
        }
        Ok(())
    }

    /// True when `record` passes every `where` constraint.
    pub fn matches(&self, record: &RawRecord) -> bool {
        self.constraints.iter().all(|c| c.matches(record))
    }

    /// `order by` constraints in declaration order.
    pub fn orderings(&self) -> impl Iterator<Item = (&str, Direction)> {
        self.constraints.iter().filter_map(|c| match c {
            QueryConstraint::OrderBy { field, direction } => Some((field.as_str(), *direction)),
            _ => None,
        })
    }

    /// The effective limit, if any.
    pub fn limit_value(&self) -> Option<usize> {
        self.constraints.iter().rev().find_map(|c| match c {
            QueryConstraint::Limit(n) => Some(*n),
            _ => None,
        })
    }
}
