//! Statement assembly for reads, writes and raw queries

use crate::config::CatalogConfig;
use crate::error::{CatalogError, Result};
use crate::request::CatalogQuery;
use crate::response::Pagination;
use crate::schema::SchemaSnapshot;
use crate::sql::builder::{Params, Statement};
use crate::sql::filter::compile_filters;
use crate::sql::join::JoinPlan;
use crate::sql::order::compile_orders;
use crate::sql::projection::Projection;
use crate::sql::sanitize::quote_identifier;
use crate::types::{ColumnDescriptor, ColumnType, SqlValue};

/// `"tenant"."table"`
pub fn table_ref(snapshot: &SchemaSnapshot) -> String {
    format!(
        "{}.{}",
        quote_identifier(snapshot.tenant()),
        quote_identifier(snapshot.table())
    )
}

fn qualified_column(snapshot: &SchemaSnapshot, column: &str) -> String {
    format!("{}.{}", table_ref(snapshot), quote_identifier(column))
}

/// Baseline WHERE: hide soft-deleted rows when the object can be soft-deleted
fn visibility_guard(snapshot: &SchemaSnapshot, config: &CatalogConfig) -> String {
    if snapshot.has_column(snapshot.table(), &config.soft_delete_column) {
        format!(
            "{} IS NULL",
            qualified_column(snapshot, &config.soft_delete_column)
        )
    } else {
        "TRUE".to_string()
    }
}

// ============================================================================
// Row Lookup
// ============================================================================

/// Column a single row is addressed by
#[derive(Debug, Clone, PartialEq)]
pub struct LookupKey {
    pub column: String,
    pub column_type: ColumnType,
}

impl LookupKey {
    /// UUID-shaped serials address the primary identifier, anything else the
    /// fallback identifier
    pub fn select(snapshot: &SchemaSnapshot, serial: &str, config: &CatalogConfig) -> Result<Self> {
        let column = if uuid::Uuid::parse_str(serial).is_ok() {
            &config.primary_identifier
        } else {
            &config.fallback_identifier
        };
        Self::for_column(snapshot, column)
    }

    /// Address rows by an explicit column of the object
    pub fn for_column(snapshot: &SchemaSnapshot, column: &str) -> Result<Self> {
        let column_type = snapshot.base_column_type(column).ok_or_else(|| {
            CatalogError::validation(format!(
                "object {} has no identifier column {}",
                snapshot.table(),
                column
            ))
        })?;

        Ok(Self {
            column: column.to_string(),
            column_type: column_type.clone(),
        })
    }

    fn condition(&self, snapshot: &SchemaSnapshot, serial: &str, params: &mut Params) -> String {
        format!(
            "{} = {}",
            qualified_column(snapshot, &self.column),
            params.push_typed(SqlValue::from(serial), Some(&self.column_type))
        )
    }
}

// ============================================================================
// Reads
// ============================================================================

/// Composed read over one object: projection, joins, filters and ordering
/// share one join plan and one argument list
#[derive(Debug, Clone)]
pub struct SelectQuery {
    from: String,
    projection: Projection,
    plan: JoinPlan,
    where_clause: String,
    order_by: String,
    params: Params,
}

impl SelectQuery {
    pub fn compose(
        snapshot: &SchemaSnapshot,
        query: &CatalogQuery,
        config: &CatalogConfig,
    ) -> Result<Self> {
        let mut plan = JoinPlan::new();
        let mut params = Params::new();

        let projection = Projection::resolve(snapshot, &query.fields, &mut plan, config)?;
        let filters = compile_filters(snapshot, &query.filters, &mut plan, &mut params)?;
        let order_by = compile_orders(snapshot, &snapshot.columns(), &query.orders, &mut plan)?;

        let mut where_clause = visibility_guard(snapshot, config);
        if !filters.is_empty() {
            where_clause = format!("{} AND {}", where_clause, filters);
        }

        Ok(Self {
            from: table_ref(snapshot),
            projection,
            plan,
            where_clause,
            order_by,
            params,
        })
    }

    pub fn columns(&self) -> &[ColumnDescriptor] {
        self.projection.columns()
    }

    pub fn joins(&self) -> &JoinPlan {
        &self.plan
    }

    fn from_clause(&self) -> String {
        if self.plan.is_empty() {
            self.from.clone()
        } else {
            format!("{} {}", self.from, self.plan.to_sql())
        }
    }

    /// Total rows matching the filters
    pub fn count(&self) -> Statement {
        Statement::new(
            format!(
                "SELECT COUNT(*) FROM {} WHERE {}",
                self.from_clause(),
                self.where_clause
            ),
            self.params.values().to_vec(),
        )
    }

    /// One page of matching rows
    pub fn page(&self, pagination: Pagination) -> Statement {
        let mut sql = format!(
            "SELECT {} FROM {} WHERE {}",
            self.projection.to_sql(),
            self.from_clause(),
            self.where_clause
        );
        if !self.order_by.is_empty() {
            sql.push_str(" ORDER BY ");
            sql.push_str(&self.order_by);
        }
        sql.push_str(&format!(
            " LIMIT {} OFFSET {}",
            pagination.page_size,
            pagination.offset()
        ));
        Statement::new(sql, self.params.values().to_vec())
    }

    /// The row addressed by `serial`, under the same filters
    pub fn single(&self, snapshot: &SchemaSnapshot, key: &LookupKey, serial: &str) -> Statement {
        let mut params = self.params.clone();
        let condition = key.condition(snapshot, serial, &mut params);
        Statement::new(
            format!(
                "SELECT {} FROM {} WHERE {} AND {}",
                self.projection.to_sql(),
                self.from_clause(),
                self.where_clause,
                condition
            ),
            params.into_values(),
        )
    }
}

// ============================================================================
// Writes
// ============================================================================

/// One `SET` entry of an update
#[derive(Debug, Clone, PartialEq)]
pub enum Assignment {
    Value(String, SqlValue),
    Now(String),
}

fn value_expression(
    snapshot: &SchemaSnapshot,
    column: &str,
    value: &SqlValue,
    params: &mut Params,
) -> String {
    if value.is_null() {
        "NULL".to_string()
    } else {
        params.push_typed(value.clone(), snapshot.base_column_type(column))
    }
}

/// `INSERT` of the given column values, optionally returning one column as text
pub fn insert_statement(
    snapshot: &SchemaSnapshot,
    values: &[(String, SqlValue)],
    returning: Option<&str>,
) -> Statement {
    let mut params = Params::new();
    let columns: Vec<String> = values.iter().map(|(c, _)| quote_identifier(c)).collect();
    let placeholders: Vec<String> = values
        .iter()
        .map(|(column, value)| value_expression(snapshot, column, value, &mut params))
        .collect();

    let mut sql = format!(
        "INSERT INTO {} ({}) VALUES ({})",
        table_ref(snapshot),
        columns.join(", "),
        placeholders.join(", ")
    );
    if let Some(column) = returning {
        sql.push_str(&format!(" RETURNING {}::text", quote_identifier(column)));
    }
    Statement::new(sql, params.into_values())
}

/// `UPDATE` of one visible row, returning `returning` as text so the row can
/// be read back even when the update rewrote its lookup column
pub fn update_statement(
    snapshot: &SchemaSnapshot,
    assignments: &[Assignment],
    key: &LookupKey,
    serial: &str,
    returning: &str,
    config: &CatalogConfig,
) -> Statement {
    let mut params = Params::new();
    let set: Vec<String> = assignments
        .iter()
        .map(|assignment| match assignment {
            Assignment::Value(column, value) => format!(
                "{} = {}",
                quote_identifier(column),
                value_expression(snapshot, column, value, &mut params)
            ),
            Assignment::Now(column) => format!("{} = NOW()", quote_identifier(column)),
        })
        .collect();
    let condition = key.condition(snapshot, serial, &mut params);

    Statement::new(
        format!(
            "UPDATE {} SET {} WHERE {} AND {} RETURNING {}::text",
            table_ref(snapshot),
            set.join(", "),
            condition,
            visibility_guard(snapshot, config),
            quote_identifier(returning)
        ),
        params.into_values(),
    )
}

/// Soft delete of one visible row; fails when the object has no soft-delete column
pub fn soft_delete_statement(
    snapshot: &SchemaSnapshot,
    key: &LookupKey,
    serial: &str,
    config: &CatalogConfig,
) -> Result<Statement> {
    let column = &config.soft_delete_column;
    if !snapshot.has_column(snapshot.table(), column) {
        return Err(CatalogError::validation(format!(
            "object {} has no {} column and cannot be deleted",
            snapshot.table(),
            column
        )));
    }

    let mut params = Params::new();
    let condition = key.condition(snapshot, serial, &mut params);
    Ok(Statement::new(
        format!(
            "UPDATE {} SET {} = NOW() WHERE {} AND {} IS NULL",
            table_ref(snapshot),
            quote_identifier(column),
            condition,
            qualified_column(snapshot, column)
        ),
        params.into_values(),
    ))
}

// ============================================================================
// Raw Queries
// ============================================================================

fn raw_body(body: &str) -> Result<&str> {
    let body = body.trim().trim_end_matches(';').trim_end();
    if body.is_empty() {
        return Err(CatalogError::validation("raw query is empty"));
    }
    Ok(body)
}

/// Row count of a caller-supplied query
pub fn raw_count_statement(body: &str) -> Result<Statement> {
    Ok(Statement::plain(format!(
        "SELECT SUM(1) AS total FROM ({}) AS subquery",
        raw_body(body)?
    )))
}

/// One page of a caller-supplied query, one `row_to_json` document per row
pub fn raw_page_statement(body: &str, pagination: Pagination) -> Result<Statement> {
    Ok(Statement::plain(format!(
        "SELECT row_to_json(page) FROM ({} LIMIT {} OFFSET {}) AS page",
        raw_body(body)?,
        pagination.page_size,
        pagination.offset()
    )))
}
