//! Core type definitions for Object Catalog
//!
//! Includes the request-side value variant, catalog column types, and the
//! column descriptors produced by schema resolution.

use serde::{Deserialize, Serialize};

use crate::sql::sanitize::quote_identifier;

// ============================================================================
// Request Values
// ============================================================================

/// A filter or mutation value, typed once at the request boundary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(untagged)]
pub enum SqlValue {
    #[default]
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
    List(Vec<SqlValue>),
}

impl SqlValue {
    pub fn is_null(&self) -> bool {
        matches!(self, SqlValue::Null)
    }

    pub fn is_list(&self) -> bool {
        matches!(self, SqlValue::List(_))
    }

    /// Text form bound as a query argument; `None` binds SQL NULL.
    ///
    /// Lists render as a PostgreSQL array literal.
    pub fn to_text(&self) -> Option<String> {
        match self {
            SqlValue::Null => None,
            SqlValue::Bool(b) => Some(b.to_string()),
            SqlValue::Integer(i) => Some(i.to_string()),
            SqlValue::Float(f) => Some(f.to_string()),
            SqlValue::Text(s) => Some(s.clone()),
            SqlValue::List(items) => {
                let elements: Vec<String> = items
                    .iter()
                    .map(|item| match item.to_text() {
                        None => "NULL".to_string(),
                        Some(text) => {
                            format!("\"{}\"", text.replace('\\', "\\\\").replace('"', "\\\""))
                        }
                    })
                    .collect();
                Some(format!("{{{}}}", elements.join(",")))
            }
        }
    }

    /// Wrap the value for a LIKE-class comparison (`%value%`)
    pub fn like_pattern(&self) -> Option<SqlValue> {
        match self {
            SqlValue::Null | SqlValue::List(_) => None,
            other => other.to_text().map(|text| SqlValue::Text(format!("%{}%", text))),
        }
    }

    /// Whether a stored row value already holds this value
    pub fn matches_json(&self, stored: &serde_json::Value) -> bool {
        match (self, stored) {
            (SqlValue::Null, serde_json::Value::Null) => true,
            (SqlValue::Null, _) | (_, serde_json::Value::Null) => false,
            (SqlValue::Float(f), serde_json::Value::Number(n)) => n.as_f64() == Some(*f),
            (SqlValue::Integer(i), serde_json::Value::Number(n)) => {
                n.as_i64() == Some(*i) || n.as_f64() == Some(*i as f64)
            }
            (SqlValue::Text(s), serde_json::Value::Number(n)) => {
                s.trim().parse::<f64>().ok() == n.as_f64()
            }
            (value, stored) => value.to_text() == json_to_text(stored),
        }
    }

    /// Like [`matches_json`](Self::matches_json), but equivalent spellings of
    /// the same uuid, instant, date, time or JSON document count as equal
    pub fn matches_stored(&self, kind: &DataKind, stored: &serde_json::Value) -> bool {
        if self.matches_json(stored) {
            return true;
        }
        if *kind == DataKind::Json {
            return self
                .to_text()
                .and_then(|text| serde_json::from_str::<serde_json::Value>(&text).ok())
                .is_some_and(|given| &given == stored);
        }
        let (Some(given), serde_json::Value::String(stored)) = (self.to_text(), stored) else {
            return false;
        };
        let (given, stored) = (given.trim(), stored.trim());

        match kind {
            DataKind::Uuid => same_parsed(given, stored, uuid::Uuid::parse_str),
            DataKind::TimestampTz => {
                same_parsed(given, stored, chrono::DateTime::parse_from_rfc3339)
            }
            DataKind::Timestamp => same_parsed(given, stored, parse_naive_timestamp),
            DataKind::Date => same_parsed(given, stored, |s| {
                chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d")
            }),
            DataKind::Time => same_parsed(given, stored, |s| s.parse::<chrono::NaiveTime>()),
            _ => false,
        }
    }

    /// Convert a value to the shape a column of `kind` accepts
    pub fn coerce(&self, kind: &DataKind, column_name: &str) -> Result<SqlValue, String> {
        if self.is_null() {
            return Ok(SqlValue::Null);
        }

        match (kind, self) {
            (DataKind::SmallInt | DataKind::Integer | DataKind::BigInt, SqlValue::Integer(_)) => {
                Ok(self.clone())
            }
            (DataKind::SmallInt | DataKind::Integer | DataKind::BigInt, SqlValue::Text(s)) => s
                .trim()
                .parse::<i64>()
                .map(SqlValue::Integer)
                .map_err(|_| format!("Column '{}' expected integer, got '{}'", column_name, s)),
            (DataKind::SmallInt | DataKind::Integer | DataKind::BigInt, _) => {
                Err(format!("Column '{}' expected integer", column_name))
            }
            (DataKind::Real | DataKind::Double | DataKind::Numeric, SqlValue::Integer(_))
            | (DataKind::Real | DataKind::Double | DataKind::Numeric, SqlValue::Float(_)) => {
                Ok(self.clone())
            }
            (DataKind::Real | DataKind::Double | DataKind::Numeric, SqlValue::Text(s)) => s
                .trim()
                .parse::<f64>()
                .map(|_| SqlValue::Text(s.trim().to_string()))
                .map_err(|_| format!("Column '{}' expected decimal, got '{}'", column_name, s)),
            (DataKind::Real | DataKind::Double | DataKind::Numeric, _) => {
                Err(format!("Column '{}' expected decimal", column_name))
            }
            (DataKind::Boolean, SqlValue::Bool(_)) => Ok(self.clone()),
            (DataKind::Boolean, SqlValue::Integer(i)) if *i == 0 || *i == 1 => {
                Ok(SqlValue::Bool(*i == 1))
            }
            (DataKind::Boolean, SqlValue::Text(s)) => match s.to_lowercase().as_str() {
                "true" | "1" | "yes" => Ok(SqlValue::Bool(true)),
                "false" | "0" | "no" => Ok(SqlValue::Bool(false)),
                _ => Err(format!(
                    "Column '{}' expected boolean, got '{}'",
                    column_name, s
                )),
            },
            (DataKind::Boolean, _) => Err(format!("Column '{}' expected boolean", column_name)),
            (DataKind::Uuid, SqlValue::Text(s)) => uuid::Uuid::parse_str(s)
                .map(|_| self.clone())
                .map_err(|e| format!("Column '{}' has invalid uuid: {}", column_name, e)),
            (DataKind::TimestampTz, SqlValue::Text(s)) => chrono::DateTime::parse_from_rfc3339(s)
                .map(|_| self.clone())
                .map_err(|e| format!("Column '{}' has invalid timestamp: {}", column_name, e)),
            (DataKind::Json, SqlValue::List(_)) => Err(format!(
                "Column '{}' expects a JSON document as text",
                column_name
            )),
            (_, SqlValue::List(_)) if !kind.is_array() => Err(format!(
                "Column '{}' does not accept a list value",
                column_name
            )),
            _ => Ok(self.clone()),
        }
    }
}

fn same_parsed<T: PartialEq, E>(given: &str, stored: &str, parse: impl Fn(&str) -> Result<T, E>) -> bool {
    match (parse(given), parse(stored)) {
        (Ok(given), Ok(stored)) => given == stored,
        _ => false,
    }
}

fn parse_naive_timestamp(s: &str) -> Result<chrono::NaiveDateTime, chrono::ParseError> {
    chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f"))
}

fn json_to_text(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::Null => None,
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        serde_json::Value::Bool(b) => Some(b.to_string()),
        other => Some(other.to_string()),
    }
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        SqlValue::Text(value.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(value: String) -> Self {
        SqlValue::Text(value)
    }
}

impl From<i64> for SqlValue {
    fn from(value: i64) -> Self {
        SqlValue::Integer(value)
    }
}

impl From<i32> for SqlValue {
    fn from(value: i32) -> Self {
        SqlValue::Integer(value as i64)
    }
}

impl From<f64> for SqlValue {
    fn from(value: f64) -> Self {
        SqlValue::Float(value)
    }
}

impl From<bool> for SqlValue {
    fn from(value: bool) -> Self {
        SqlValue::Bool(value)
    }
}

impl<T: Into<SqlValue>> From<Vec<T>> for SqlValue {
    fn from(values: Vec<T>) -> Self {
        SqlValue::List(values.into_iter().map(Into::into).collect())
    }
}

// ============================================================================
// Catalog Column Types
// ============================================================================

/// Decoding class of a PostgreSQL type, derived from its `udt_name`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataKind {
    Text,
    SmallInt,
    Integer,
    BigInt,
    Real,
    Double,
    Numeric,
    Boolean,
    Uuid,
    Date,
    Time,
    Timestamp,
    TimestampTz,
    Json,
    /// Enums, domains, arrays and anything else decoded through its text form
    Other(String),
}

impl DataKind {
    /// Classify a catalog `udt_name` (also accepts the common SQL spellings)
    pub fn from_udt_name(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "text" | "varchar" | "bpchar" | "char" | "name" | "citext" | "string"
            | "character varying" => DataKind::Text,
            "int2" | "smallint" => DataKind::SmallInt,
            "int4" | "int" | "integer" => DataKind::Integer,
            "int8" | "bigint" => DataKind::BigInt,
            "float4" | "real" => DataKind::Real,
            "float8" | "double precision" => DataKind::Double,
            "numeric" | "decimal" => DataKind::Numeric,
            "bool" | "boolean" => DataKind::Boolean,
            "uuid" => DataKind::Uuid,
            "date" => DataKind::Date,
            "time" => DataKind::Time,
            "timestamp" => DataKind::Timestamp,
            "timestamptz" => DataKind::TimestampTz,
            "json" | "jsonb" => DataKind::Json,
            other => DataKind::Other(other.to_string()),
        }
    }

    pub fn is_array(&self) -> bool {
        matches!(self, DataKind::Other(name) if name.starts_with('_'))
    }
}

/// A column's declared type as reported by `information_schema.columns`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnType {
    /// Schema owning the type (`pg_catalog` for built-ins)
    pub udt_schema: String,
    /// Type name, e.g. `int4`, `uuid`, `order_status`
    pub udt_name: String,
}

impl ColumnType {
    pub fn new(udt_schema: impl Into<String>, udt_name: impl Into<String>) -> Self {
        Self {
            udt_schema: udt_schema.into(),
            udt_name: udt_name.into(),
        }
    }

    /// Shorthand for a built-in type
    pub fn builtin(udt_name: impl Into<String>) -> Self {
        Self::new("pg_catalog", udt_name)
    }

    pub fn kind(&self) -> DataKind {
        DataKind::from_udt_name(&self.udt_name)
    }

    /// Explicit cast applied to text-bound arguments, e.g. `::"pg_catalog"."int4"`
    pub fn cast(&self) -> String {
        format!(
            "::{}.{}",
            quote_identifier(&self.udt_schema),
            quote_identifier(&self.udt_name)
        )
    }
}

// ============================================================================
// Column Descriptors
// ============================================================================

/// A foreign-key edge discovered in the catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKey {
    /// Schema of the referenced table
    pub schema: String,
    /// Referenced table
    pub table: String,
    /// Referenced column
    pub column: String,
}

impl ForeignKey {
    pub fn new(
        schema: impl Into<String>,
        table: impl Into<String>,
        column: impl Into<String>,
    ) -> Self {
        Self {
            schema: schema.into(),
            table: table.into(),
            column: column.into(),
        }
    }
}

/// Where a projected column is read from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnSource {
    /// A physical column of the queried table
    Base {
        tenant: String,
        table: String,
        column: String,
    },
    /// A column of a joined table, addressed through its alias
    Joined { alias: String, column: String },
    /// No backing column; always reads as NULL
    Absent,
}

impl ColumnSource {
    /// Qualified, quoted SQL expression for the column
    pub fn to_sql(&self) -> String {
        match self {
            ColumnSource::Base {
                tenant,
                table,
                column,
            } => format!(
                "{}.{}.{}",
                quote_identifier(tenant),
                quote_identifier(table),
                quote_identifier(column)
            ),
            ColumnSource::Joined { alias, column } => {
                format!("{}.{}", quote_identifier(alias), quote_identifier(column))
            }
            ColumnSource::Absent => "NULL".to_string(),
        }
    }
}

/// One projected column, recomputed from live metadata on every request
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDescriptor {
    /// Code the value is returned under
    pub field_code: String,
    /// Human readable label
    pub display_name: String,
    /// Raw database type name, or `string`/`text` for derived columns
    pub data_type: String,
    /// Dotted origin of the value, `tenant.table.column` or `alias.column`
    pub complete_code: String,
    /// Referenced table when this column is a relationship column
    pub foreign_table: Option<String>,
    /// Referenced column when this column is a relationship column
    pub foreign_column: Option<String>,
    /// Requested key this column was resolved from, for chained fields
    pub original_field_code: Option<String>,
    pub is_displayed_in_table: bool,
    pub field_order: Option<i32>,
    pub render_config: Option<String>,
    pub source: ColumnSource,
    pub kind: DataKind,
}

impl ColumnDescriptor {
    /// Descriptor for a physical column of `tenant.table`
    pub fn physical(tenant: &str, table: &str, column: &str, column_type: &ColumnType) -> Self {
        Self {
            field_code: column.to_string(),
            display_name: column.to_string(),
            data_type: column_type.udt_name.clone(),
            complete_code: format!("{}.{}.{}", tenant, table, column),
            foreign_table: None,
            foreign_column: None,
            original_field_code: None,
            is_displayed_in_table: false,
            field_order: None,
            render_config: None,
            source: ColumnSource::Base {
                tenant: tenant.to_string(),
                table: table.to_string(),
                column: column.to_string(),
            },
            kind: column_type.kind(),
        }
    }

    /// Descriptor for a column read through a join alias
    pub fn joined(
        field_code: &str,
        data_type: &str,
        alias: &str,
        column: &str,
        kind: DataKind,
    ) -> Self {
        Self {
            field_code: field_code.to_string(),
            display_name: field_code.to_string(),
            data_type: data_type.to_string(),
            complete_code: format!("{}.{}", alias, column),
            foreign_table: None,
            foreign_column: None,
            original_field_code: None,
            is_displayed_in_table: false,
            field_order: None,
            render_config: None,
            source: ColumnSource::Joined {
                alias: alias.to_string(),
                column: column.to_string(),
            },
            kind,
        }
    }

    /// Descriptor that always reads as NULL
    pub fn absent(field_code: &str, data_type: &str) -> Self {
        Self {
            field_code: field_code.to_string(),
            display_name: field_code.to_string(),
            data_type: data_type.to_string(),
            complete_code: String::new(),
            foreign_table: None,
            foreign_column: None,
            original_field_code: None,
            is_displayed_in_table: false,
            field_order: None,
            render_config: None,
            source: ColumnSource::Absent,
            kind: DataKind::Text,
        }
    }

    pub fn is_relationship(&self) -> bool {
        self.foreign_table.is_some() && self.foreign_column.is_some()
    }

    pub fn sql_expression(&self) -> String {
        self.source.to_sql()
    }
}
