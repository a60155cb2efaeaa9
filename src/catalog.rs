//! Live schema introspection through `information_schema`
//!
//! Every lookup goes to the database; nothing is cached between requests so
//! schema changes are visible immediately.

use sqlx::{PgConnection, PgPool};

use crate::error::{CatalogError, Result};
use crate::schema::SchemaSnapshot;
use crate::sql::sanitize::{validate_identifier, validate_tenant};
use crate::types::{ColumnDescriptor, ColumnType, ForeignKey};

const COLUMNS_SQL: &str = r#"
    SELECT table_name::text, column_name::text, udt_schema::text, udt_name::text
    FROM information_schema.columns
    WHERE table_schema = $1
    ORDER BY table_name, ordinal_position
"#;

const FOREIGN_KEYS_SQL: &str = r#"
    SELECT kcu.table_name::text, kcu.column_name::text,
           ccu.table_schema::text, ccu.table_name::text, ccu.column_name::text
    FROM information_schema.table_constraints AS tc
    JOIN information_schema.key_column_usage AS kcu
      ON tc.constraint_name = kcu.constraint_name
     AND tc.constraint_schema = kcu.constraint_schema
    JOIN information_schema.constraint_column_usage AS ccu
      ON ccu.constraint_name = tc.constraint_name
     AND ccu.constraint_schema = tc.constraint_schema
    WHERE tc.constraint_type = 'FOREIGN KEY'
      AND tc.table_schema = $1
    ORDER BY kcu.table_name, kcu.column_name, tc.constraint_name
"#;

const FOREIGN_KEY_SQL: &str = r#"
    SELECT ccu.table_schema::text, ccu.table_name::text, ccu.column_name::text
    FROM information_schema.table_constraints AS tc
    JOIN information_schema.key_column_usage AS kcu
      ON tc.constraint_name = kcu.constraint_name
     AND tc.constraint_schema = kcu.constraint_schema
    JOIN information_schema.constraint_column_usage AS ccu
      ON ccu.constraint_name = tc.constraint_name
     AND ccu.constraint_schema = tc.constraint_schema
    WHERE tc.constraint_type = 'FOREIGN KEY'
      AND kcu.column_name = $1
      AND tc.table_name = $2
      AND tc.table_schema = $3
    ORDER BY tc.constraint_name
    LIMIT 1
"#;

/// Reads tenant schema metadata from the live database
#[derive(Debug, Clone)]
pub struct SchemaCatalog {
    pool: PgPool,
}

impl SchemaCatalog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Column descriptors of `tenant.table` in ordinal order
    pub async fn resolve_columns(&self, tenant: &str, table: &str) -> Result<Vec<ColumnDescriptor>> {
        Ok(self.snapshot(tenant, table).await?.columns())
    }

    /// Foreign-key target of `schema.table.column`, if the column has one
    pub async fn resolve_foreign_key(
        &self,
        schema: &str,
        table: &str,
        column: &str,
    ) -> Result<Option<ForeignKey>> {
        let row = sqlx::query_as::<_, (String, String, String)>(FOREIGN_KEY_SQL)
            .bind(column)
            .bind(table)
            .bind(schema)
            .fetch_optional(&self.pool)
            .await
            .map_err(introspection_error)?;

        Ok(row.map(|(schema, table, column)| ForeignKey::new(schema, table, column)))
    }

    /// Snapshot of every column and foreign key in `tenant`, anchored on `table`
    pub async fn snapshot(&self, tenant: &str, table: &str) -> Result<SchemaSnapshot> {
        let mut conn = self.pool.acquire().await?;
        load_snapshot(&mut conn, tenant, table).await
    }
}

/// Load a snapshot over an existing connection or transaction
pub(crate) async fn load_snapshot(
    conn: &mut PgConnection,
    tenant: &str,
    table: &str,
) -> Result<SchemaSnapshot> {
    validate_tenant(tenant).map_err(CatalogError::Validation)?;
    validate_identifier(table).map_err(CatalogError::Validation)?;

    let columns = sqlx::query_as::<_, (String, String, String, String)>(COLUMNS_SQL)
        .bind(tenant)
        .fetch_all(&mut *conn)
        .await
        .map_err(introspection_error)?;

    let foreign_keys = sqlx::query_as::<_, (String, String, String, String, String)>(
        FOREIGN_KEYS_SQL,
    )
    .bind(tenant)
    .fetch_all(&mut *conn)
    .await
    .map_err(introspection_error)?;

    let mut snapshot = SchemaSnapshot::new(tenant, table);
    for (table_name, column_name, udt_schema, udt_name) in columns {
        snapshot.add_column(
            &table_name,
            &column_name,
            ColumnType::new(udt_schema, udt_name),
        );
    }
    for (table_name, column_name, target_schema, target_table, target_column) in foreign_keys {
        snapshot.add_foreign_key(
            &table_name,
            &column_name,
            ForeignKey::new(target_schema, target_table, target_column),
        );
    }

    tracing::debug!(
        tenant = %tenant,
        object = %table,
        object_exists = snapshot.table_exists(table),
        "Loaded schema snapshot"
    );

    Ok(snapshot)
}

fn introspection_error(err: sqlx::Error) -> CatalogError {
    CatalogError::schema(format!("Schema introspection failed: {}", err))
}
