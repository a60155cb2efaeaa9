//! Per-request view of a tenant schema
//!
//! A `SchemaSnapshot` holds the columns and foreign-key edges of one tenant
//! schema as read from `information_schema` at the start of a request. It is
//! never cached across requests; the SQL planners consume it synchronously.

use std::collections::HashMap;

use crate::types::{ColumnDescriptor, ColumnType, ForeignKey};

/// Columns and foreign-key edges of a tenant schema, anchored on one object
#[derive(Debug, Clone)]
pub struct SchemaSnapshot {
    tenant: String,
    table: String,
    /// table -> columns in ordinal order
    tables: HashMap<String, Vec<(String, ColumnType)>>,
    /// (table, column) -> referenced column
    foreign_keys: HashMap<(String, String), ForeignKey>,
}

impl SchemaSnapshot {
    /// Empty snapshot of `tenant`, anchored on `table`
    pub fn new(tenant: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            tenant: tenant.into(),
            table: table.into(),
            tables: HashMap::new(),
            foreign_keys: HashMap::new(),
        }
    }

    /// Record a column; columns keep the order they are added in
    pub fn add_column(&mut self, table: &str, column: &str, column_type: ColumnType) {
        self.tables
            .entry(table.to_string())
            .or_default()
            .push((column.to_string(), column_type));
    }

    /// Record a foreign-key edge; the first edge recorded for a column wins
    pub fn add_foreign_key(&mut self, table: &str, column: &str, target: ForeignKey) {
        self.foreign_keys
            .entry((table.to_string(), column.to_string()))
            .or_insert(target);
    }

    /// Builder form of [`add_column`](Self::add_column)
    pub fn with_column(mut self, table: &str, column: &str, column_type: ColumnType) -> Self {
        self.add_column(table, column, column_type);
        self
    }

    /// Builder form of [`add_foreign_key`](Self::add_foreign_key)
    pub fn with_foreign_key(mut self, table: &str, column: &str, target: ForeignKey) -> Self {
        self.add_foreign_key(table, column, target);
        self
    }

    pub fn tenant(&self) -> &str {
        &self.tenant
    }

    /// The object the snapshot is anchored on
    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn table_exists(&self, table: &str) -> bool {
        self.tables.contains_key(table)
    }

    pub fn has_column(&self, table: &str, column: &str) -> bool {
        self.column_type(table, column).is_some()
    }

    pub fn column_type(&self, table: &str, column: &str) -> Option<&ColumnType> {
        self.tables
            .get(table)?
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, column_type)| column_type)
    }

    /// Type of a column on the anchored object
    pub fn base_column_type(&self, column: &str) -> Option<&ColumnType> {
        self.column_type(&self.table, column)
    }

    /// Foreign-key edge leaving `table.column`, if any
    pub fn foreign_key(&self, table: &str, column: &str) -> Option<&ForeignKey> {
        self.foreign_keys
            .get(&(table.to_string(), column.to_string()))
    }

    /// Column descriptors of the anchored object in ordinal order
    ///
    /// Foreign keys that point back at the object itself or at an `id` column
    /// are not treated as relationship columns.
    pub fn columns(&self) -> Vec<ColumnDescriptor> {
        let Some(columns) = self.tables.get(&self.table) else {
            return Vec::new();
        };

        columns
            .iter()
            .map(|(name, column_type)| {
                let mut descriptor =
                    ColumnDescriptor::physical(&self.tenant, &self.table, name, column_type);
                if let Some(fk) = self.foreign_key(&self.table, name)
                    && fk.table != self.table
                    && fk.column != "id"
                {
                    descriptor.foreign_table = Some(fk.table.clone());
                    descriptor.foreign_column = Some(fk.column.clone());
                }
                descriptor
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot() -> SchemaSnapshot {
        SchemaSnapshot::new("acme", "orders")
            .with_column("orders", "id", ColumnType::builtin("int4"))
            .with_column("orders", "code", ColumnType::builtin("varchar"))
            .with_column("orders", "customer_serial", ColumnType::builtin("uuid"))
            .with_column("orders", "parent_serial", ColumnType::builtin("uuid"))
            .with_column("orders", "owner_id", ColumnType::builtin("int4"))
            .with_column("customers", "serial", ColumnType::builtin("uuid"))
            .with_column("customers", "name", ColumnType::builtin("text"))
            .with_foreign_key(
                "orders",
                "customer_serial",
                ForeignKey::new("acme", "customers", "serial"),
            )
            .with_foreign_key(
                "orders",
                "parent_serial",
                ForeignKey::new("acme", "orders", "serial"),
            )
            .with_foreign_key("orders", "owner_id", ForeignKey::new("acme", "users", "id"))
    }

    #[test]
    fn test_columns_keep_ordinal_order() {
        let codes: Vec<String> = snapshot()
            .columns()
            .into_iter()
            .map(|c| c.field_code)
            .collect();
        assert_eq!(
            codes,
            vec!["id", "code", "customer_serial", "parent_serial", "owner_id"]
        );
    }

    #[test]
    fn test_relationship_columns_exclude_self_and_id_targets() {
        let columns = snapshot().columns();
        let relationships: Vec<&str> = columns
            .iter()
            .filter(|c| c.is_relationship())
            .map(|c| c.field_code.as_str())
            .collect();

        assert_eq!(relationships, vec!["customer_serial"]);
        let customer = &columns[2];
        assert_eq!(customer.foreign_table.as_deref(), Some("customers"));
        assert_eq!(customer.foreign_column.as_deref(), Some("serial"));
    }

    #[test]
    fn test_raw_foreign_keys_remain_visible() {
        let snapshot = snapshot();
        assert!(snapshot.foreign_key("orders", "parent_serial").is_some());
        assert!(snapshot.foreign_key("orders", "owner_id").is_some());
        assert!(snapshot.foreign_key("orders", "code").is_none());
    }

    #[test]
    fn test_first_foreign_key_wins() {
        let mut snapshot = snapshot();
        snapshot.add_foreign_key(
            "orders",
            "customer_serial",
            ForeignKey::new("acme", "accounts", "serial"),
        );
        assert_eq!(
            snapshot
                .foreign_key("orders", "customer_serial")
                .map(|fk| fk.table.as_str()),
            Some("customers")
        );
    }

    #[test]
    fn test_lookups() {
        let snapshot = snapshot();
        assert!(snapshot.table_exists("customers"));
        assert!(!snapshot.table_exists("invoices"));
        assert!(snapshot.has_column("customers", "name"));
        assert_eq!(
            snapshot.base_column_type("customer_serial"),
            Some(&ColumnType::builtin("uuid"))
        );
        assert!(snapshot.columns().iter().all(|c| c.complete_code.starts_with("acme.orders.")));
    }

    #[test]
    fn test_unknown_object_has_no_columns() {
        let snapshot = SchemaSnapshot::new("acme", "ghosts");
        assert!(snapshot.columns().is_empty());
    }
}
