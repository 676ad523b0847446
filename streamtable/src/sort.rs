//! Sort declarations and row comparators.

use serde::{Deserialize, Serialize};
use stache::Value;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::error::TableError;

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Smallest first
    #[default]
    Asc,
    /// Largest first
    Desc,
}

impl Direction {
    /// The other direction.
    pub fn toggled(self) -> Self {
        match self {
            Direction::Asc => Direction::Desc,
            Direction::Desc => Direction::Asc,
        }
    }

    fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            Direction::Asc => ordering,
            Direction::Desc => ordering.reverse(),
        }
    }
}

/// How column values are compared
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    /// Case-insensitive text comparison
    #[default]
    String,
    /// Numeric comparison; values are coerced to numbers first
    Number,
}

/// A sort column: field, direction and comparison type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortSpec {
    /// Object key (or array position) compared
    pub field: String,
    /// Sort direction
    pub direction: Direction,
    /// Comparison type
    pub value_type: ValueType,
}

impl SortSpec {
    /// A column sorted as strings, ascending.
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: Direction::Asc,
            value_type: ValueType::String,
        }
    }

    /// Set the direction.
    pub fn direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    /// Compare as numbers.
    pub fn numeric(mut self) -> Self {
        self.value_type = ValueType::Number;
        self
    }

    /// Compare two rows by this column.
    ///
    /// Values that fail to coerce to a number (NaN) sort after every number
    /// in ascending order and before them in descending order; among
    /// themselves they compare equal.
    pub fn compare(&self, a: &Value, b: &Value) -> Ordering {
        let (a, b) = (a.get(&self.field), b.get(&self.field));
        let ordering = match self.value_type {
            ValueType::Number => compare_numbers(a.as_f64(), b.as_f64()),
            ValueType::String => a
                .to_string()
                .to_lowercase()
                .cmp(&b.to_string().to_lowercase()),
        };
        self.direction.apply(ordering)
    }
}

/// A total order over coerced numbers: NaN is greater than any number.
fn compare_numbers(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (false, false) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
        (false, true) => Ordering::Less,
        (true, false) => Ordering::Greater,
        (true, true) => Ordering::Equal,
    }
}

impl FromStr for SortSpec {
    type Err = TableError;

    /// Parse `field[:asc|desc[:string|number]]`.
    fn from_str(declaration: &str) -> Result<Self, Self::Err> {
        let invalid = || TableError::SortDeclaration {
            declaration: declaration.to_string(),
        };
        let mut parts = declaration.split(':').map(str::trim);

        let field = parts.next().filter(|f| !f.is_empty()).ok_or_else(invalid)?;
        let direction = match parts.next() {
            None | Some("") | Some("asc") => Direction::Asc,
            Some("desc") => Direction::Desc,
            Some(_) => return Err(invalid()),
        };
        let value_type = match parts.next() {
            None | Some("") | Some("string") => ValueType::String,
            Some("number") => ValueType::Number,
            Some(_) => return Err(invalid()),
        };
        if parts.next().is_some() {
            return Err(invalid());
        }

        Ok(Self {
            field: field.to_string(),
            direction,
            value_type,
        })
    }
}

impl fmt::Display for SortSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dir = match self.direction {
            Direction::Asc => "asc",
            Direction::Desc => "desc",
        };
        let ty = match self.value_type {
            ValueType::String => "string",
            ValueType::Number => "number",
        };
        write!(f, "{}:{dir}:{ty}", self.field)
    }
}
