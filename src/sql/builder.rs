//! Positional argument collection for composed statements

use crate::types::{ColumnType, SqlValue};

/// A composed SQL statement and the arguments its `$n` placeholders refer to
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<SqlValue>,
}

impl Statement {
    pub fn new(sql: impl Into<String>, params: Vec<SqlValue>) -> Self {
        Self {
            sql: sql.into(),
            params,
        }
    }

    /// Statement without arguments
    pub fn plain(sql: impl Into<String>) -> Self {
        Self::new(sql, Vec::new())
    }
}

/// Arguments collected while compiling fragments of one statement
///
/// Every argument is bound as text; callers attach a cast so the database
/// coerces it to the target column's type.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Params {
    values: Vec<SqlValue>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an argument and return its placeholder (`$n`)
    pub fn push(&mut self, value: SqlValue) -> String {
        self.values.push(value);
        format!("${}", self.values.len())
    }

    /// Add an argument and return its placeholder cast to `column_type`
    pub fn push_typed(&mut self, value: SqlValue, column_type: Option<&ColumnType>) -> String {
        let placeholder = self.push(value);
        match column_type {
            Some(column_type) => format!("{}{}", placeholder, column_type.cast()),
            None => placeholder,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[SqlValue] {
        &self.values
    }

    pub fn into_values(self) -> Vec<SqlValue> {
        self.values
    }
}
