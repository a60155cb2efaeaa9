//! ObjectCatalog - Main entry point for schema-driven tenant object access
//!
//! Every operation reads the tenant schema from the live catalog, composes
//! its statements against that snapshot, and executes them with bound
//! arguments.

use sqlx::postgres::{PgArguments, PgRow};
use sqlx::{PgConnection, PgPool, Postgres};

use crate::catalog::{SchemaCatalog, load_snapshot};
use crate::config::CatalogConfig;
use crate::error::{CatalogError, Result};
use crate::metadata::{
    DataType, ObjectField, ObjectFields, ObjectRecord, data_types_statement, index_fields,
    object_by_code_statement, object_fields_statement, parse_record,
};
use crate::request::{CatalogQuery, DataMutationRequest};
use crate::response::{CatalogResponse, DataRow, Pagination};
use crate::row::{decode_raw_row, decode_row};
use crate::schema::SchemaSnapshot;
use crate::sql::builder::Statement;
use crate::sql::query::{
    Assignment, LookupKey, SelectQuery, insert_statement, raw_count_statement,
    raw_page_statement, soft_delete_statement, update_statement,
};
use crate::types::{DataKind, SqlValue};

/// Schema-driven access to the objects of every tenant in one database
///
/// Tenants are schemas, objects are tables, and relationships are read from
/// foreign-key constraints. Nothing about a tenant's schema is cached.
pub struct ObjectCatalog {
    /// Database connection pool
    pool: PgPool,
    /// Catalog configuration
    config: CatalogConfig,
    catalog: SchemaCatalog,
}

impl ObjectCatalog {
    /// Connect to the database named in the configuration
    pub async fn new(config: CatalogConfig) -> Result<Self> {
        let pool = PgPool::connect(&config.database_url).await.map_err(|e| {
            CatalogError::Connection(format!("Database connection failed: {}", e))
        })?;

        Ok(Self::from_pool(pool, config))
    }

    /// Create a catalog over an existing pool
    pub fn from_pool(pool: PgPool, config: CatalogConfig) -> Self {
        let catalog = SchemaCatalog::new(pool.clone());
        Self {
            pool,
            config,
            catalog,
        }
    }

    /// Get a reference to the connection pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Get a reference to the configuration
    pub fn config(&self) -> &CatalogConfig {
        &self.config
    }

    /// Direct access to schema introspection
    pub fn catalog(&self) -> &SchemaCatalog {
        &self.catalog
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// One page of rows plus the total number of matching rows
    ///
    /// The count runs first; if it fails the page is never read.
    pub async fn list_objects(&self, query: &CatalogQuery) -> Result<CatalogResponse> {
        let mut conn = self.pool.acquire().await?;
        let snapshot = open_snapshot(&mut conn, &query.tenant_code, &query.object_code).await?;

        let select = SelectQuery::compose(&snapshot, query, &self.config)?;
        let pagination =
            Pagination::normalize(query.page, query.page_size, self.config.default_page_size);

        let count = select.count();
        self.log_statement("count", &snapshot, &count);
        let total: i64 = bind_scalar(&count).fetch_one(&mut *conn).await?;

        let page = select.page(pagination);
        self.log_statement("list", &snapshot, &page);
        let rows = bind(&page).fetch_all(&mut *conn).await?;

        let items = rows
            .iter()
            .map(|row| decode_row(row, select.columns(), &self.config.display_column))
            .collect();

        Ok(CatalogResponse::new(items, total, pagination))
    }

    /// The row addressed by `query.serial`
    ///
    /// A serial that matches no visible row yields an empty map, not an error.
    pub async fn get_object_detail(&self, query: &CatalogQuery) -> Result<DataRow> {
        let serial = required_serial(query.serial.as_deref())?;

        let mut conn = self.pool.acquire().await?;
        let snapshot = open_snapshot(&mut conn, &query.tenant_code, &query.object_code).await?;
        let select = SelectQuery::compose(&snapshot, query, &self.config)?;
        let key = LookupKey::select(&snapshot, serial, &self.config)?;

        Ok(self
            .fetch_row(&mut conn, &snapshot, &select, &key, serial)
            .await?
            .unwrap_or_default())
    }

    /// Page through a caller-supplied query
    ///
    /// Columns are whatever the query returns; no schema lookup is involved.
    pub async fn run_raw_query(&self, query: &CatalogQuery) -> Result<CatalogResponse> {
        let body = query
            .raw_query
            .as_deref()
            .ok_or_else(|| CatalogError::validation("raw query is required"))?;
        let pagination =
            Pagination::normalize(query.page, query.page_size, self.config.default_page_size);

        let count = raw_count_statement(body)?;
        let page = raw_page_statement(body, pagination)?;

        let mut conn = self.pool.acquire().await?;

        self.log_raw(&query.tenant_code, &count);
        let total: Option<i64> = bind_scalar(&count).fetch_one(&mut *conn).await?;

        self.log_raw(&query.tenant_code, &page);
        let documents: Vec<Option<serde_json::Value>> =
            bind_scalar(&page).fetch_all(&mut *conn).await?;
        let items = documents.into_iter().map(decode_raw_row).collect();

        Ok(CatalogResponse::new(items, total.unwrap_or(0), pagination))
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Insert one row and return it as stored
    ///
    /// Objects without the primary identifier column return an empty map
    /// since the new row cannot be addressed.
    pub async fn create_object(&self, request: &DataMutationRequest) -> Result<DataRow> {
        if request.items.is_empty() {
            return Err(CatalogError::validation("no data item found"));
        }

        let mut tx = self.pool.begin().await?;
        let snapshot = open_snapshot(&mut tx, &request.tenant_code, &request.object_code).await?;

        let mut values = Vec::with_capacity(request.items.len());
        for item in &request.items {
            let kind = column_kind(&snapshot, &item.field_code, item.data_type.as_deref())?;
            let value = item
                .value
                .coerce(&kind, &item.field_code)
                .map_err(CatalogError::Validation)?;
            values.push((item.field_code.clone(), value));
        }

        let primary = self.config.primary_identifier.as_str();
        let returning = snapshot
            .has_column(snapshot.table(), primary)
            .then_some(primary);
        let insert = insert_statement(&snapshot, &values, returning);
        self.log_statement("create", &snapshot, &insert);

        let created = match returning {
            Some(_) => {
                let serial: Option<String> = bind_scalar(&insert).fetch_one(&mut *tx).await?;
                match serial {
                    Some(serial) => {
                        let query = CatalogQuery::new(&request.tenant_code, &request.object_code);
                        let select = SelectQuery::compose(&snapshot, &query, &self.config)?;
                        let key = LookupKey::for_column(&snapshot, primary)?;
                        self.fetch_row(&mut tx, &snapshot, &select, &key, &serial)
                            .await?
                            .unwrap_or_default()
                    }
                    None => DataRow::new(),
                }
            }
            None => {
                bind(&insert).execute(&mut *tx).await?;
                DataRow::new()
            }
        };

        tx.commit().await?;

        tracing::info!(
            tenant = %request.tenant_code,
            object = %request.object_code,
            "Created object row"
        );

        Ok(created)
    }

    /// Update the fields of one row that differ from what is stored
    ///
    /// Fetch, diff, update and refetch run in one transaction. A request that
    /// changes nothing fails with [`CatalogError::NoChanges`] and never issues
    /// an UPDATE.
    pub async fn update_object(&self, request: &DataMutationRequest) -> Result<DataRow> {
        let serial = required_serial(request.serial.as_deref())?;

        let mut tx = self.pool.begin().await?;
        let snapshot = open_snapshot(&mut tx, &request.tenant_code, &request.object_code).await?;
        let query = CatalogQuery::new(&request.tenant_code, &request.object_code);
        let select = SelectQuery::compose(&snapshot, &query, &self.config)?;
        let key = LookupKey::select(&snapshot, serial, &self.config)?;

        let current = self
            .fetch_row(&mut tx, &snapshot, &select, &key, serial)
            .await?
            .ok_or_else(|| {
                CatalogError::not_found(format!(
                    "{} {} is not found",
                    request.object_code, serial
                ))
            })?;

        let mut assignments = Vec::new();
        for item in &request.items {
            let kind = column_kind(&snapshot, &item.field_code, item.data_type.as_deref())?;
            let value = item
                .value
                .coerce(&kind, &item.field_code)
                .map_err(CatalogError::Validation)?;

            let unchanged = current
                .get(&item.field_code)
                .is_some_and(|stored| value.matches_stored(&kind, &stored.value));
            if !unchanged {
                assignments.push(Assignment::Value(item.field_code.clone(), value));
            }
        }

        if assignments.is_empty() {
            return Err(CatalogError::no_changes(format!(
                "no update data found for {}",
                request.object_code
            )));
        }

        self.stamp_audit_columns(&snapshot, request, &mut assignments);

        // Read back through the primary identifier when the object has one;
        // the request's own key may be one of the rewritten columns.
        let refetch_key = if snapshot.has_column(snapshot.table(), &self.config.primary_identifier) {
            LookupKey::for_column(&snapshot, &self.config.primary_identifier)?
        } else {
            key.clone()
        };

        let update = update_statement(
            &snapshot,
            &assignments,
            &key,
            serial,
            &refetch_key.column,
            &self.config,
        );
        self.log_statement("update", &snapshot, &update);
        let returned: Option<Option<String>> =
            bind_scalar(&update).fetch_optional(&mut *tx).await?;
        let Some(identifier) = returned else {
            return Err(CatalogError::not_found(format!(
                "{} {} is not found",
                request.object_code, serial
            )));
        };

        let updated = match identifier {
            Some(identifier) => {
                self.fetch_row(&mut tx, &snapshot, &select, &refetch_key, &identifier)
                    .await?
            }
            None => None,
        };

        tx.commit().await?;

        let Some(updated) = updated else {
            // the update cleared the identifier or hid the row
            tracing::warn!(
                tenant = %request.tenant_code,
                object = %request.object_code,
                serial = %serial,
                "Updated row is no longer readable"
            );
            return Ok(DataRow::new());
        };

        Ok(updated)
    }

    /// Soft delete one row; it stays in the table but is hidden from reads
    pub async fn delete_object(&self, request: &DataMutationRequest) -> Result<()> {
        let serial = required_serial(request.serial.as_deref())?;

        let mut conn = self.pool.acquire().await?;
        let snapshot = open_snapshot(&mut conn, &request.tenant_code, &request.object_code).await?;
        let key = LookupKey::select(&snapshot, serial, &self.config)?;

        let delete = soft_delete_statement(&snapshot, &key, serial, &self.config)?;
        self.log_statement("delete", &snapshot, &delete);
        let result = bind(&delete).execute(&mut *conn).await?;

        if result.rows_affected() == 0 {
            return Err(CatalogError::not_found(format!(
                "{} {} is not found",
                request.object_code, serial
            )));
        }

        Ok(())
    }

    // =========================================================================
    // Registry Lookups
    // =========================================================================

    /// The registry entry of `object_code` for the tenant `tenant_code`
    pub async fn get_object_by_code(
        &self,
        tenant_code: &str,
        object_code: &str,
    ) -> Result<ObjectRecord> {
        let statement =
            object_by_code_statement(&self.config.metadata_tables, tenant_code, object_code)?;
        self.log_raw(tenant_code, &statement);

        let document: Option<Option<serde_json::Value>> =
            bind_scalar(&statement).fetch_optional(&self.pool).await?;
        match document.flatten() {
            Some(document) => parse_record(document),
            None => Err(CatalogError::not_found(format!(
                "object {} is not registered for tenant {}",
                object_code, tenant_code
            ))),
        }
    }

    /// Registered fields of the queried object, keyed by field code
    pub async fn get_object_fields(&self, query: &CatalogQuery) -> Result<ObjectFields> {
        let statement = object_fields_statement(
            &self.config.metadata_tables,
            &query.tenant_code,
            &query.object_code,
        )?;
        self.log_raw(&query.tenant_code, &statement);

        let documents: Vec<Option<serde_json::Value>> =
            bind_scalar(&statement).fetch_all(&self.pool).await?;
        let fields = documents
            .into_iter()
            .flatten()
            .map(parse_record)
            .collect::<Result<Vec<ObjectField>>>()?;

        Ok(index_fields(fields))
    }

    /// The registered data type with the given serial
    pub async fn get_data_type_by_serial(&self, serial: &str) -> Result<DataType> {
        self.get_data_types_by_serials(&[serial])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| CatalogError::not_found(format!("data type {} is not found", serial)))
    }

    /// Registered data types for every known serial; unknown serials are skipped
    pub async fn get_data_types_by_serials(&self, serials: &[&str]) -> Result<Vec<DataType>> {
        let Some(statement) = data_types_statement(&self.config.metadata_tables, serials)? else {
            return Ok(Vec::new());
        };
        tracing::debug!(count = serials.len(), sql = %statement.sql, "Loading data types");

        let documents: Vec<Option<serde_json::Value>> =
            bind_scalar(&statement).fetch_all(&self.pool).await?;
        documents.into_iter().flatten().map(parse_record).collect()
    }

    // =========================================================================
    // Internal Helpers
    // =========================================================================

    async fn fetch_row(
        &self,
        conn: &mut PgConnection,
        snapshot: &SchemaSnapshot,
        select: &SelectQuery,
        key: &LookupKey,
        serial: &str,
    ) -> Result<Option<DataRow>> {
        let statement = select.single(snapshot, key, serial);
        self.log_statement("detail", snapshot, &statement);

        let row = bind(&statement).fetch_optional(&mut *conn).await?;
        Ok(row.map(|row| decode_row(&row, select.columns(), &self.config.display_column)))
    }

    /// Add `updated_at = NOW()` and `updated_by = <user>` when the object has
    /// those columns and the request did not set them itself
    fn stamp_audit_columns(
        &self,
        snapshot: &SchemaSnapshot,
        request: &DataMutationRequest,
        assignments: &mut Vec<Assignment>,
    ) {
        let assigned = |assignments: &[Assignment], column: &str| {
            assignments.iter().any(|a| match a {
                Assignment::Value(c, _) | Assignment::Now(c) => c == column,
            })
        };

        let audit = &self.config.audit_columns;
        if snapshot.has_column(snapshot.table(), &audit.updated_at)
            && !assigned(assignments.as_slice(), &audit.updated_at)
        {
            assignments.push(Assignment::Now(audit.updated_at.clone()));
        }

        if let Some(column_type) = snapshot.base_column_type(&audit.updated_by)
            && !assigned(assignments.as_slice(), &audit.updated_by)
        {
            let user = request
                .user_serial
                .as_deref()
                .unwrap_or(&self.config.system_user);
            match SqlValue::from(user).coerce(&column_type.kind(), &audit.updated_by) {
                Ok(value) => {
                    assignments.push(Assignment::Value(audit.updated_by.clone(), value));
                }
                Err(e) => tracing::warn!(
                    tenant = %snapshot.tenant(),
                    object = %snapshot.table(),
                    error = %e,
                    "Skipping audit user stamp"
                ),
            }
        }
    }

    fn log_statement(&self, operation: &str, snapshot: &SchemaSnapshot, statement: &Statement) {
        if self.config.log_queries {
            tracing::info!(
                tenant = %snapshot.tenant(),
                object = %snapshot.table(),
                operation = %operation,
                params = statement.params.len(),
                sql = %statement.sql,
                "Executing catalog statement"
            );
        } else {
            tracing::debug!(
                tenant = %snapshot.tenant(),
                object = %snapshot.table(),
                operation = %operation,
                params = statement.params.len(),
                sql = %statement.sql,
                "Executing catalog statement"
            );
        }
    }

    fn log_raw(&self, tenant: &str, statement: &Statement) {
        if self.config.log_queries {
            tracing::info!(tenant = %tenant, sql = %statement.sql, "Executing raw query");
        } else {
            tracing::debug!(tenant = %tenant, sql = %statement.sql, "Executing raw query");
        }
    }
}

async fn open_snapshot(
    conn: &mut PgConnection,
    tenant: &str,
    object: &str,
) -> Result<SchemaSnapshot> {
    let snapshot = load_snapshot(conn, tenant, object).await?;
    if !snapshot.table_exists(object) {
        return Err(CatalogError::validation(format!(
            "object {} is not found in tenant {}",
            object, tenant
        )));
    }
    Ok(snapshot)
}

fn required_serial(serial: Option<&str>) -> Result<&str> {
    serial
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| CatalogError::validation("serial is required"))
}

/// Decoding class for a written column; the catalog type wins over the
/// request's hint unless the catalog type has no native class
fn column_kind(snapshot: &SchemaSnapshot, field: &str, hint: Option<&str>) -> Result<DataKind> {
    let column_type = snapshot.base_column_type(field).ok_or_else(|| {
        CatalogError::validation(format!(
            "field {} is not found in object {}",
            field,
            snapshot.table()
        ))
    })?;

    Ok(match (column_type.kind(), hint) {
        (DataKind::Other(_), Some(hint)) => DataKind::from_udt_name(hint),
        (kind, _) => kind,
    })
}

fn bind(statement: &Statement) -> sqlx::query::Query<'_, Postgres, PgArguments> {
    statement
        .params
        .iter()
        .fold(sqlx::query(&statement.sql), |query, param| {
            query.bind(param.to_text())
        })
}

fn bind_scalar<O>(statement: &Statement) -> sqlx::query::QueryScalar<'_, Postgres, O, PgArguments>
where
    (O,): for<'r> sqlx::FromRow<'r, PgRow>,
{
    statement
        .params
        .iter()
        .fold(sqlx::query_scalar(&statement.sql), |query, param| {
            query.bind(param.to_text())
        })
}
