//! ORDER BY compilation

use crate::error::{CatalogError, Result};
use crate::request::OrderSpec;
use crate::schema::SchemaSnapshot;
use crate::sql::join::JoinPlan;
use crate::sql::sanitize::{is_chain, quote_identifier, split_chain, validate_identifier};
use crate::types::ColumnDescriptor;

/// Compile sort specs into an ORDER BY list (without the keyword)
///
/// A chained sort joins through the shared plan only when its first hop is one
/// of the object's relationship columns in `columns`; otherwise it is sorted
/// as a plain column of the object.
pub fn compile_orders(
    snapshot: &SchemaSnapshot,
    columns: &[ColumnDescriptor],
    orders: &[OrderSpec],
    plan: &mut JoinPlan,
) -> Result<String> {
    let mut clauses = Vec::with_capacity(orders.len());

    for order in orders {
        let field = order.field_name.as_str();
        let expression = if snapshot.base_column_type(field).is_some() {
            base_column(snapshot, field)
        } else if is_chain(field) {
            chain_expression(snapshot, columns, field, plan)?
        } else {
            return Err(CatalogError::validation(format!(
                "order field {} is not found in object {}",
                field,
                snapshot.table()
            )));
        };
        clauses.push(format!("{} {}", expression, order.direction.sql()));
    }

    Ok(clauses.join(", "))
}

fn chain_expression(
    snapshot: &SchemaSnapshot,
    columns: &[ColumnDescriptor],
    field: &str,
    plan: &mut JoinPlan,
) -> Result<String> {
    let first_hop_is_relationship = split_chain(field)
        .and_then(|hops| hops.first().copied())
        .is_some_and(|hop| {
            columns
                .iter()
                .any(|c| c.field_code == hop && c.is_relationship())
        });

    if first_hop_is_relationship && let Some(target) = plan.plan_chain(snapshot, field) {
        return Ok(target.to_sql());
    }

    validate_identifier(field).map_err(CatalogError::Validation)?;
    tracing::debug!(
        object = %snapshot.table(),
        field = %field,
        "Sorting unresolved chain as a plain column"
    );
    Ok(base_column(snapshot, field))
}

fn base_column(snapshot: &SchemaSnapshot, field: &str) -> String {
    format!(
        "{}.{}.{}",
        quote_identifier(snapshot.tenant()),
        quote_identifier(snapshot.table()),
        quote_identifier(field)
    )
}
