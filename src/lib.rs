//! # runtara-object-catalog
//!
//! A schema-driven, multi-tenant PostgreSQL data-access layer.
//!
//! Given a tenant code, an object code and a declarative query, this crate
//! reads the tenant's schema from `information_schema` at request time and
//! composes the SQL to list, filter, sort, paginate, fetch, create, update and
//! soft-delete rows. There is no per-object code and no schema cache.
//!
//! ## Concepts
//!
//! - **Tenant**: a PostgreSQL schema; all tenants share one database
//! - **Object**: a table inside a tenant schema
//! - **Chained field**: `customer_serial__region_serial__name` walks foreign
//!   keys hop by hop and reads `name` from the last joined table
//! - **Display column**: for every relationship column `x`, a list without
//!   explicit fields also returns `x__name` from the referenced row
//! - **Soft delete**: rows with `deleted_at` set are hidden from every read
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use runtara_object_catalog::{
//!     CatalogConfig, CatalogQuery, FieldSpec, FilterGroup, FilterOperator, ObjectCatalog,
//!     OrderDirection,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = CatalogConfig::builder("postgres://localhost/mydb").build();
//!     let catalog = ObjectCatalog::new(config).await?;
//!
//!     let query = CatalogQuery::new("acme", "orders")
//!         .field("code", FieldSpec::new().displayed())
//!         .field("customer_serial__name", FieldSpec::new().name("Customer"))
//!         .filter_group(FilterGroup::all().with("customer_serial__name", FilterOperator::Ilike, "ann"))
//!         .order_by("code", OrderDirection::Desc)
//!         .paginate(1, 20);
//!
//!     let response = catalog.list_objects(&query).await?;
//!     println!("{} of {} rows", response.items.len(), response.total_data);
//!     Ok(())
//! }
//! ```
//!
//! ## Configuration
//!
//! ```rust
//! use runtara_object_catalog::CatalogConfig;
//!
//! let config = CatalogConfig::builder("postgres://localhost/mydb")
//!     .default_page_size(25)          // Used when a request asks for < 1 row
//!     .primary_identifier("serial")   // Lookup column for UUID-shaped serials
//!     .fallback_identifier("code")    // Lookup column for everything else
//!     .soft_delete_column("deleted_at")
//!     .display_column("name")
//!     .build();
//! ```
//!
//! ## Safety
//!
//! Identifiers are validated and quoted; every value is bound as a statement
//! argument and cast to the target column's catalog type.

pub mod catalog;
pub mod config;
pub mod error;
pub mod metadata;
pub mod request;
pub mod response;
pub mod row;
pub mod schema;
pub mod sql;
pub mod store;
pub mod types;

// Re-export main types for convenience
pub use catalog::SchemaCatalog;
pub use config::{AuditColumns, CatalogConfig, CatalogConfigBuilder, MetadataTables};
pub use error::{CatalogError, Result};
pub use metadata::{DataType, ObjectField, ObjectFields, ObjectRecord};
pub use request::{
    CatalogQuery, DataMutationRequest, FieldSpec, FilterGroup, FilterItem, FilterOperator,
    GroupOperator, MutationItem, OrderDirection, OrderSpec,
};
pub use response::{CatalogResponse, DataItem, DataRow, Pagination};
pub use schema::SchemaSnapshot;
pub use store::ObjectCatalog;
pub use types::{ColumnDescriptor, ColumnSource, ColumnType, DataKind, ForeignKey, SqlValue};

// Re-export SQL utilities for advanced users
pub use sql::sanitize::{quote_identifier, validate_identifier};
