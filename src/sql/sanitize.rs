//! SQL Identifier Sanitization Utilities
//!
//! Identifiers arriving in requests (tenant codes, object codes, field keys) are
//! validated against a strict pattern and always emitted double-quoted.

use std::sync::LazyLock;

use regex::Regex;

static IDENTIFIER_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z][a-z0-9_]*$").expect("identifier pattern compiles"));

/// Schemas that can never be addressed as a tenant
pub const SYSTEM_SCHEMAS: &[&str] = &["information_schema", "pg_catalog", "pg_toast"];

/// Separator between hops of a chained field key (`customer_serial__region__name`)
pub const CHAIN_SEPARATOR: &str = "__";

/// Quote a SQL identifier to make it safe for use in queries
///
/// # Example
/// ```
/// use runtara_object_catalog::sql::quote_identifier;
///
/// let quoted = quote_identifier("orders");
/// assert_eq!(quoted, "\"orders\"");
/// ```
pub fn quote_identifier(identifier: &str) -> String {
    let escaped = identifier.replace('"', "\"\"");
    format!("\"{}\"", escaped)
}

/// Validate a table, column, or tenant code
///
/// Rules:
/// - Must start with a lowercase letter
/// - Can only contain lowercase letters, numbers, and underscores
///
/// # Example
/// ```
/// use runtara_object_catalog::sql::validate_identifier;
///
/// assert!(validate_identifier("orders").is_ok());
/// assert!(validate_identifier("Orders").is_err());
/// ```
pub fn validate_identifier(name: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err("Identifier cannot be empty".to_string());
    }

    if !IDENTIFIER_PATTERN.is_match(name) {
        return Err(format!(
            "Identifier '{}' is invalid. Must start with a lowercase letter and contain only lowercase letters, numbers, and underscores.",
            name
        ));
    }

    Ok(())
}

/// Validate a tenant code, which doubles as a schema name
pub fn validate_tenant(tenant: &str) -> Result<(), String> {
    validate_identifier(tenant)?;
    if SYSTEM_SCHEMAS.contains(&tenant) || tenant.starts_with("pg_") {
        return Err(format!("Tenant '{}' refers to a system schema", tenant));
    }
    Ok(())
}

/// Whether a field key denotes a relationship traversal
pub fn is_chain(field: &str) -> bool {
    field.contains(CHAIN_SEPARATOR)
}

/// Split a chained field key into its hops; `None` when a hop is empty or invalid
pub fn split_chain(field: &str) -> Option<Vec<&str>> {
    let hops: Vec<&str> = field.split(CHAIN_SEPARATOR).collect();
    if hops.len() < 2 {
        return None;
    }
    if hops
        .iter()
        .any(|hop| hop.is_empty() || validate_identifier(hop).is_err())
    {
        return None;
    }
    Some(hops)
}
