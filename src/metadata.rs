//! Registry lookups for objects, object fields and data types
//!
//! Besides the tenant schemas themselves, a deployment keeps registry tables
//! describing which objects each tenant exposes, the fields of each object,
//! and the data types those fields use. Rows are read as `row_to_json`
//! documents: the columns listed on each record are required, anything else
//! the registry carries is kept in `attributes`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::MetadataTables;
use crate::error::{CatalogError, Result};
use crate::sql::builder::{Params, Statement};
use crate::sql::sanitize::{quote_identifier, validate_identifier};
use crate::types::SqlValue;

/// One registered object of a tenant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectRecord {
    pub serial: String,
    pub code: String,
    #[serde(default)]
    pub tenant_serial: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(flatten)]
    pub attributes: serde_json::Map<String, serde_json::Value>,
}

/// One registered field of an object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectField {
    pub serial: String,
    pub object_serial: String,
    pub field_code: String,
    #[serde(default)]
    pub field_name: Option<String>,
    #[serde(default)]
    pub data_type_serial: Option<String>,
    #[serde(flatten)]
    pub attributes: serde_json::Map<String, serde_json::Value>,
}

/// One registered data type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataType {
    pub serial: String,
    pub code: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(flatten)]
    pub attributes: serde_json::Map<String, serde_json::Value>,
}

/// Object fields keyed by field code
pub type ObjectFields = BTreeMap<String, ObjectField>;

// ============================================================================
// Statements
// ============================================================================

struct Registry {
    tenants: String,
    objects: String,
    object_fields: String,
    data_types: String,
}

impl Registry {
    fn new(tables: &MetadataTables) -> Result<Self> {
        let qualify = |table: &str| -> Result<String> {
            validate_identifier(&tables.schema).map_err(CatalogError::Validation)?;
            validate_identifier(table).map_err(CatalogError::Validation)?;
            Ok(format!(
                "{}.{}",
                quote_identifier(&tables.schema),
                quote_identifier(table)
            ))
        };

        Ok(Self {
            tenants: qualify(&tables.tenants)?,
            objects: qualify(&tables.objects)?,
            object_fields: qualify(&tables.object_fields)?,
            data_types: qualify(&tables.data_types)?,
        })
    }
}

/// The object registered as `object_code` for the tenant `tenant_code`
pub fn object_by_code_statement(
    tables: &MetadataTables,
    tenant_code: &str,
    object_code: &str,
) -> Result<Statement> {
    let registry = Registry::new(tables)?;
    Ok(Statement::new(
        format!(
            "SELECT row_to_json(o) FROM {} AS o \
             JOIN {} AS t ON t.\"serial\" = o.\"tenant_serial\" \
             WHERE o.\"code\" = $1 AND t.\"code\" = $2 LIMIT 1",
            registry.objects, registry.tenants
        ),
        vec![SqlValue::from(object_code), SqlValue::from(tenant_code)],
    ))
}

/// Every field registered for the object `object_code` of `tenant_code`
pub fn object_fields_statement(
    tables: &MetadataTables,
    tenant_code: &str,
    object_code: &str,
) -> Result<Statement> {
    let registry = Registry::new(tables)?;
    Ok(Statement::new(
        format!(
            "SELECT row_to_json(f) FROM {} AS f \
             JOIN {} AS o ON o.\"serial\" = f.\"object_serial\" \
             JOIN {} AS t ON t.\"serial\" = o.\"tenant_serial\" \
             WHERE o.\"code\" = $1 AND t.\"code\" = $2",
            registry.object_fields, registry.objects, registry.tenants
        ),
        vec![SqlValue::from(object_code), SqlValue::from(tenant_code)],
    ))
}

/// Data types whose serial is one of `serials`
///
/// Returns `None` for an empty list; there is nothing to look up.
pub fn data_types_statement(tables: &MetadataTables, serials: &[&str]) -> Result<Option<Statement>> {
    if serials.is_empty() {
        return Ok(None);
    }

    let registry = Registry::new(tables)?;
    let mut params = Params::new();
    let placeholders: Vec<String> = serials
        .iter()
        .map(|serial| params.push(SqlValue::from(*serial)))
        .collect();

    Ok(Some(Statement::new(
        format!(
            "SELECT row_to_json(d) FROM {} AS d WHERE d.\"serial\"::text IN ({})",
            registry.data_types,
            placeholders.join(", ")
        ),
        params.into_values(),
    )))
}

/// Parse one registry document
pub fn parse_record<T: serde::de::DeserializeOwned>(document: serde_json::Value) -> Result<T> {
    Ok(serde_json::from_value(document)?)
}

/// Key parsed fields by their field code
pub fn index_fields(fields: Vec<ObjectField>) -> ObjectFields {
    fields
        .into_iter()
        .map(|field| (field.field_code.clone(), field))
        .collect()
}
