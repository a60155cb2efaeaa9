//! Configuration for ObjectCatalog
//!
//! Provides a builder pattern for configuring the catalog.

/// Names of the audit columns stamped on update when a table has them
#[derive(Debug, Clone)]
pub struct AuditColumns {
    /// Column set to `NOW()` on every update
    pub updated_at: String,
    /// Column set to the acting user's serial on every update
    pub updated_by: String,
}

impl Default for AuditColumns {
    fn default() -> Self {
        Self {
            updated_at: "updated_at".to_string(),
            updated_by: "updated_by".to_string(),
        }
    }
}

/// Location of the registry tables describing tenants, objects, fields and
/// data types
#[derive(Debug, Clone)]
pub struct MetadataTables {
    /// Schema holding the registry tables (default: "public")
    pub schema: String,
    pub tenants: String,
    pub objects: String,
    pub object_fields: String,
    pub data_types: String,
}

impl Default for MetadataTables {
    fn default() -> Self {
        Self {
            schema: "public".to_string(),
            tenants: "tenants".to_string(),
            objects: "objects".to_string(),
            object_fields: "object_fields".to_string(),
            data_types: "data_types".to_string(),
        }
    }
}

impl MetadataTables {
    /// Registry tables under `schema` with the default table names
    pub fn in_schema(schema: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            ..Self::default()
        }
    }
}

/// Configuration for the object catalog
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    /// PostgreSQL database URL
    pub database_url: String,
    /// Page size used when the caller asks for less than one row per page
    pub default_page_size: i64,
    /// Identifier column used when the lookup serial is UUID-shaped (default: "serial")
    pub primary_identifier: String,
    /// Identifier column used for any other lookup serial (default: "code")
    pub fallback_identifier: String,
    /// Timestamp column marking soft-deleted rows (default: "deleted_at")
    pub soft_delete_column: String,
    /// Column read from the referenced table for `<field>__name` display columns
    pub display_column: String,
    /// Audit columns maintained on update
    pub audit_columns: AuditColumns,
    /// User serial stamped into `updated_by` when the request has none
    pub system_user: String,
    /// Log every composed statement at info level instead of debug
    pub log_queries: bool,
    /// Registry tables read by the metadata lookups
    pub metadata_tables: MetadataTables,
}

impl CatalogConfig {
    /// Create a new configuration builder
    pub fn builder(database_url: impl Into<String>) -> CatalogConfigBuilder {
        CatalogConfigBuilder::new(database_url)
    }
}

/// Builder for CatalogConfig
#[derive(Debug)]
pub struct CatalogConfigBuilder {
    config: CatalogConfig,
}

impl CatalogConfigBuilder {
    /// Create a new builder with the database URL
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            config: CatalogConfig {
                database_url: database_url.into(),
                default_page_size: 10,
                primary_identifier: "serial".to_string(),
                fallback_identifier: "code".to_string(),
                soft_delete_column: "deleted_at".to_string(),
                display_column: "name".to_string(),
                audit_columns: AuditColumns::default(),
                system_user: "system".to_string(),
                log_queries: false,
                metadata_tables: MetadataTables::default(),
            },
        }
    }

    /// Set the page size used for out-of-range requests (default: 10)
    pub fn default_page_size(mut self, size: i64) -> Self {
        self.config.default_page_size = size.max(1);
        self
    }

    /// Set the UUID identifier column (default: "serial")
    pub fn primary_identifier(mut self, column: impl Into<String>) -> Self {
        self.config.primary_identifier = column.into();
        self
    }

    /// Set the non-UUID identifier column (default: "code")
    pub fn fallback_identifier(mut self, column: impl Into<String>) -> Self {
        self.config.fallback_identifier = column.into();
        self
    }

    /// Set the soft-delete timestamp column (default: "deleted_at")
    pub fn soft_delete_column(mut self, column: impl Into<String>) -> Self {
        self.config.soft_delete_column = column.into();
        self
    }

    /// Set the display column of referenced tables (default: "name")
    pub fn display_column(mut self, column: impl Into<String>) -> Self {
        self.config.display_column = column.into();
        self
    }

    /// Set the audit column names
    pub fn audit_columns(
        mut self,
        updated_at: impl Into<String>,
        updated_by: impl Into<String>,
    ) -> Self {
        self.config.audit_columns = AuditColumns {
            updated_at: updated_at.into(),
            updated_by: updated_by.into(),
        };
        self
    }

    /// Set the fallback acting user (default: "system")
    pub fn system_user(mut self, serial: impl Into<String>) -> Self {
        self.config.system_user = serial.into();
        self
    }

    /// Enable or disable info-level statement logging (default: false)
    pub fn log_queries(mut self, enabled: bool) -> Self {
        self.config.log_queries = enabled;
        self
    }

    /// Set where the registry tables live (default: `public`)
    pub fn metadata_tables(mut self, tables: MetadataTables) -> Self {
        self.config.metadata_tables = tables;
        self
    }

    /// Build the configuration
    pub fn build(self) -> CatalogConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CatalogConfig::builder("postgres://localhost/test").build();

        assert_eq!(config.database_url, "postgres://localhost/test");
        assert_eq!(config.default_page_size, 10);
        assert_eq!(config.primary_identifier, "serial");
        assert_eq!(config.fallback_identifier, "code");
        assert_eq!(config.soft_delete_column, "deleted_at");
        assert_eq!(config.display_column, "name");
        assert_eq!(config.audit_columns.updated_at, "updated_at");
        assert_eq!(config.audit_columns.updated_by, "updated_by");
        assert_eq!(config.system_user, "system");
        assert!(!config.log_queries);
        assert_eq!(config.metadata_tables.schema, "public");
        assert_eq!(config.metadata_tables.object_fields, "object_fields");
    }

    #[test]
    fn test_metadata_tables_in_schema() {
        let config = CatalogConfig::builder("postgres://localhost/test")
            .metadata_tables(MetadataTables::in_schema("registry"))
            .build();

        assert_eq!(config.metadata_tables.schema, "registry");
        assert_eq!(config.metadata_tables.tenants, "tenants");
        assert_eq!(config.metadata_tables.data_types, "data_types");
    }

    #[test]
    fn test_builder_accepts_string() {
        let config = CatalogConfig::builder(String::from("postgres://localhost/db")).build();
        assert_eq!(config.database_url, "postgres://localhost/db");
    }

    #[test]
    fn test_page_size_never_below_one() {
        let config = CatalogConfig::builder("postgres://localhost/test")
            .default_page_size(0)
            .build();
        assert_eq!(config.default_page_size, 1);

        let config = CatalogConfig::builder("postgres://localhost/test")
            .default_page_size(25)
            .build();
        assert_eq!(config.default_page_size, 25);
    }

    #[test]
    fn test_identifier_columns() {
        let config = CatalogConfig::builder("postgres://localhost/test")
            .primary_identifier("uuid")
            .fallback_identifier("slug")
            .build();

        assert_eq!(config.primary_identifier, "uuid");
        assert_eq!(config.fallback_identifier, "slug");
    }

    #[test]
    fn test_full_custom_config() {
        let config = CatalogConfig::builder("postgres://localhost/test")
            .soft_delete_column("removed_at")
            .display_column("title")
            .audit_columns("modified_at", "modified_by")
            .system_user("importer")
            .log_queries(true)
            .build();

        assert_eq!(config.soft_delete_column, "removed_at");
        assert_eq!(config.display_column, "title");
        assert_eq!(config.audit_columns.updated_at, "modified_at");
        assert_eq!(config.audit_columns.updated_by, "modified_by");
        assert_eq!(config.system_user, "importer");
        assert!(config.log_queries);
    }

    #[test]
    fn test_builder_order_independence() {
        let config1 = CatalogConfig::builder("postgres://localhost/test")
            .log_queries(true)
            .display_column("label")
            .build();

        let config2 = CatalogConfig::builder("postgres://localhost/test")
            .display_column("label")
            .log_queries(true)
            .build();

        assert_eq!(config1.display_column, config2.display_column);
        assert_eq!(config1.log_queries, config2.log_queries);
    }

    #[test]
    fn test_config_clone() {
        let config1 = CatalogConfig::builder("postgres://localhost/test")
            .fallback_identifier("slug")
            .build();
        let config2 = config1.clone();

        assert_eq!(config1.database_url, config2.database_url);
        assert_eq!(config1.fallback_identifier, config2.fallback_identifier);
    }
}
