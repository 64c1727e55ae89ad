//! Flat tabular dataset model
//!
//! A [`Dataset`] is an ordered sequence of named [`Column`]s holding nullable
//! scalar [`CellValue`]s. Column names are unique and every column has the same
//! number of rows. Unstructured documents (PDF text) are represented as a
//! single-row, single-column dataset built with [`Dataset::document`].

use super::errors::LoaderError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::borrow::Cow;
use std::collections::HashSet;
use std::fmt;

/// A nullable scalar cell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
}

impl CellValue {
    /// Infers a typed cell from raw text.
    ///
    /// Numbers are only typed when their canonical rendering equals the raw
    /// text, so values such as `0612345678` or `3.50` keep their exact form.
    pub fn infer(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return CellValue::Null;
        }
        if let Ok(n) = trimmed.parse::<i64>() {
            if n.to_string() == raw {
                return CellValue::Integer(n);
            }
        }
        if let Ok(f) = trimmed.parse::<f64>() {
            if f.is_finite() && f.to_string() == raw {
                return CellValue::Float(f);
            }
        }
        match raw {
            "true" | "True" | "TRUE" => CellValue::Bool(true),
            "false" | "False" | "FALSE" => CellValue::Bool(false),
            _ => CellValue::Text(raw.to_string()),
        }
    }

    /// Converts a JSON scalar into a cell; nested values are kept as JSON text
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => CellValue::Null,
            Value::Bool(b) => CellValue::Bool(*b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => CellValue::Integer(i),
                None => n.as_f64().map_or(CellValue::Null, CellValue::Float),
            },
            Value::String(s) => CellValue::Text(s.clone()),
            other => CellValue::Text(other.to_string()),
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            CellValue::Null => Value::Null,
            CellValue::Bool(b) => Value::Bool(*b),
            CellValue::Integer(i) => Value::from(*i),
            CellValue::Float(f) => serde_json::Number::from_f64(*f)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            CellValue::Text(s) => Value::String(s.clone()),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    /// String form of the cell, `None` for nulls
    pub fn as_text(&self) -> Option<Cow<'_, str>> {
        match self {
            CellValue::Null => None,
            CellValue::Text(s) => Some(Cow::Borrowed(s.as_str())),
            other => Some(Cow::Owned(other.to_string())),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Null => Ok(()),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::Integer(i) => write!(f, "{i}"),
            CellValue::Float(v) => write!(f, "{v}"),
            CellValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::Text(s)
    }
}

impl From<i64> for CellValue {
    fn from(i: i64) -> Self {
        CellValue::Integer(i)
    }
}

impl<T: Into<CellValue>> From<Option<T>> for CellValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(CellValue::Null, Into::into)
    }
}

/// A named, ordered column of cells
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    name: String,
    values: Vec<CellValue>,
}

impl Column {
    pub fn new(name: impl Into<String>, values: Vec<CellValue>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn values(&self) -> &[CellValue] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Non-null cells as `(row_index, text)` pairs, in row order
    pub fn non_null_texts(&self) -> Vec<(usize, String)> {
        self.values
            .iter()
            .enumerate()
            .filter_map(|(i, v)| v.as_text().map(|t| (i, t.into_owned())))
            .collect()
    }

    /// Returns a column with the same name and new values
    pub fn with_values(&self, values: Vec<CellValue>) -> Self {
        Self::new(self.name.clone(), values)
    }
}

/// Ordered sequence of uniquely named, equally long columns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    columns: Vec<Column>,
}

impl Dataset {
    /// Builds a dataset, checking name uniqueness and row-count equality
    pub fn new(columns: Vec<Column>) -> Result<Self, LoaderError> {
        let mut seen = HashSet::new();
        for column in &columns {
            if !seen.insert(column.name()) {
                return Err(LoaderError::InvalidShape(format!(
                    "duplicate column name '{}'",
                    column.name()
                )));
            }
        }

        if let Some(first) = columns.first() {
            let rows = first.len();
            if let Some(bad) = columns.iter().find(|c| c.len() != rows) {
                return Err(LoaderError::InvalidShape(format!(
                    "column '{}' has {} rows, expected {}",
                    bad.name(),
                    bad.len(),
                    rows
                )));
            }
        }

        Ok(Self { columns })
    }

    /// Single-document text mode: one row, one column holding the full text
    pub fn document(column: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            columns: vec![Column::new(column, vec![CellValue::Text(text.into())])],
        }
    }

    /// Builds a dataset from JSON records.
    ///
    /// Columns follow the first-seen key order across all records; keys
    /// missing from a record become nulls.
    pub fn from_records(records: &[Map<String, Value>]) -> Result<Self, LoaderError> {
        let mut names: Vec<String> = Vec::new();
        let mut seen = HashSet::new();
        for record in records {
            for key in record.keys() {
                if seen.insert(key.clone()) {
                    names.push(key.clone());
                }
            }
        }

        let columns = names
            .into_iter()
            .map(|name| {
                let values = records
                    .iter()
                    .map(|r| r.get(&name).map_or(CellValue::Null, CellValue::from_json))
                    .collect();
                Column::new(name, values)
            })
            .collect();

        Self::new(columns)
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name() == name)
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(Column::name).collect()
    }

    pub fn row_count(&self) -> usize {
        self.columns.first().map_or(0, Column::len)
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// `(rows, columns)`
    pub fn shape(&self) -> (usize, usize) {
        (self.row_count(), self.column_count())
    }

    /// First `n` rows as JSON records, keyed by column name
    pub fn head_records(&self, n: usize) -> Vec<Map<String, Value>> {
        (0..self.row_count().min(n))
            .map(|row| {
                self.columns
                    .iter()
                    .map(|c| (c.name().to_string(), c.values()[row].to_json()))
                    .collect()
            })
            .collect()
    }

    /// Replaces columns positionally; used by the substitution engine which
    /// never changes names or lengths.
    pub(crate) fn with_columns(columns: Vec<Column>) -> Self {
        Self { columns }
    }
}
