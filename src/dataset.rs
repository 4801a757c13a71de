//! In-memory columnar dataset handed over by a loader.
//!
//! The profiler never reads files itself. Whatever produced the data (the CSV
//! loader in [`crate::loader`], a database cursor, a test) builds a
//! [`Dataset`] out of named [`Column`]s of typed cells.

use std::collections::HashSet;

use crate::data::Value;
use crate::error::AnalysisError;

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    name: String,
    values: Vec<Option<Value>>,
}

impl Column {
    pub fn new(name: impl Into<String>, values: Vec<Option<Value>>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    /// Builds a column from anything convertible into [`Value`]; `None`
    /// entries become missing cells.
    pub fn from_values<I, T>(name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = Option<T>>,
        T: Into<Value>,
    {
        Self::new(
            name,
            values.into_iter().map(|value| value.map(Into::into)).collect(),
        )
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn values(&self) -> &[Option<Value>] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Present values; `NaN` numbers are skipped like empty slots.
    pub fn non_null(&self) -> impl Iterator<Item = &Value> + '_ {
        self.values.iter().flatten().filter(|value| !value.is_missing())
    }

    pub fn missing_count(&self) -> usize {
        self.values.iter().filter(|cell| is_missing_cell(cell)).count()
    }

    pub fn distinct_count(&self) -> usize {
        self.non_null()
            .map(Value::distinct_key)
            .collect::<HashSet<_>>()
            .len()
    }

    pub fn estimated_size(&self) -> usize {
        let slots = self.values.len() * std::mem::size_of::<Option<Value>>();
        let heap = self
            .values
            .iter()
            .flatten()
            .map(|value| value.estimated_size() - std::mem::size_of::<Option<Value>>())
            .sum::<usize>();
        self.name.len() + slots + heap
    }
}

pub fn is_missing_cell(cell: &Option<Value>) -> bool {
    cell.as_ref().is_none_or(Value::is_missing)
}

#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    columns: Vec<Column>,
    row_count: usize,
}

impl Dataset {
    /// Row count is taken from the first column. Columns of a different
    /// length are kept as-is and fail individually during profiling.
    pub fn new(columns: Vec<Column>) -> Self {
        let row_count = columns.first().map_or(0, Column::len);
        Self { columns, row_count }
    }

    pub fn with_row_count(row_count: usize, columns: Vec<Column>) -> Self {
        Self { columns, row_count }
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|column| column.name == name)
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(Column::name).collect()
    }

    pub fn ensure_not_empty(&self) -> Result<(), AnalysisError> {
        if self.row_count == 0 || self.columns.is_empty() {
            return Err(AnalysisError::EmptyDataset {
                rows: self.row_count,
                columns: self.columns.len(),
            });
        }
        Ok(())
    }
}
