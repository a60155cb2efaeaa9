//! Compilation of filter groups into a parameterised boolean expression
//!
//! Conditions inside a group are joined by the group's operator and wrapped
//! in parentheses; groups are joined with AND. Values are always bound, never
//! interpolated.

use crate::error::{CatalogError, Result};
use crate::request::{FilterGroup, FilterItem, FilterOperator};
use crate::schema::SchemaSnapshot;
use crate::sql::builder::Params;
use crate::sql::join::JoinPlan;
use crate::sql::sanitize::{is_chain, quote_identifier};
use crate::types::{ColumnType, SqlValue};

/// A filterable field expression and its column type
struct Operand {
    sql: String,
    column_type: Option<ColumnType>,
}

/// Compile `groups` into a WHERE fragment; empty filters give an empty string
///
/// Chained fields add their joins to `plan`, and every value is appended to
/// `params`.
pub fn compile_filters(
    snapshot: &SchemaSnapshot,
    groups: &[FilterGroup],
    plan: &mut JoinPlan,
    params: &mut Params,
) -> Result<String> {
    let mut clauses = Vec::new();

    for group in groups.iter().filter(|g| !g.is_empty()) {
        let mut conditions = Vec::with_capacity(group.filters.len());
        for (field, item) in &group.filters {
            let operand = resolve_operand(snapshot, field, plan)?;
            conditions.push(compile_condition(&operand, field, item, params)?);
        }
        clauses.push(format!(
            "({})",
            conditions.join(&format!(" {} ", group.operator.sql()))
        ));
    }

    Ok(clauses.join(" AND "))
}

fn resolve_operand(snapshot: &SchemaSnapshot, field: &str, plan: &mut JoinPlan) -> Result<Operand> {
    if let Some(column_type) = snapshot.base_column_type(field) {
        return Ok(Operand {
            sql: format!(
                "{}.{}.{}",
                quote_identifier(snapshot.tenant()),
                quote_identifier(snapshot.table()),
                quote_identifier(field)
            ),
            column_type: Some(column_type.clone()),
        });
    }

    if is_chain(field) {
        return plan
            .plan_chain(snapshot, field)
            .map(|target| match &target.column_type {
                Some(column_type) => Operand {
                    sql: target.to_sql(),
                    column_type: Some(column_type.clone()),
                },
                // unknown type outside the tenant: compare as text
                None => Operand {
                    sql: format!("{}::text", target.to_sql()),
                    column_type: None,
                },
            })
            .ok_or_else(|| {
                CatalogError::validation(format!(
                    "filter field {} cannot be resolved from object {}",
                    field,
                    snapshot.table()
                ))
            });
    }

    Err(CatalogError::validation(format!(
        "filter field {} is not found in object {}",
        field,
        snapshot.table()
    )))
}

fn compile_condition(
    operand: &Operand,
    field: &str,
    item: &FilterItem,
    params: &mut Params,
) -> Result<String> {
    let op = item.operator;
    let lhs = &operand.sql;

    if op.is_like() {
        let pattern = item.value.like_pattern().ok_or_else(|| {
            CatalogError::validation(format!(
                "operator {} on field {} needs a single non-null value",
                op.sql(),
                field
            ))
        })?;
        return Ok(format!("{}::text {} {}", lhs, op.sql(), params.push(pattern)));
    }

    match op {
        FilterOperator::In | FilterOperator::NotIn => {
            let elements = match &item.value {
                SqlValue::List(values) => values.clone(),
                scalar => vec![scalar.clone()],
            };
            if elements.is_empty() {
                // nothing is in an empty set
                let constant = if op == FilterOperator::In { "FALSE" } else { "TRUE" };
                return Ok(constant.to_string());
            }

            let mut placeholders = Vec::with_capacity(elements.len());
            for element in elements {
                match element {
                    SqlValue::Null => placeholders.push("NULL".to_string()),
                    SqlValue::List(_) => {
                        return Err(CatalogError::validation(format!(
                            "nested list in filter on field {}",
                            field
                        )));
                    }
                    value => placeholders.push(params.push_typed(value, operand.column_type.as_ref())),
                }
            }
            Ok(format!("{} {} ({})", lhs, op.sql(), placeholders.join(", ")))
        }
        FilterOperator::Is | FilterOperator::IsNot => {
            let keyword = match item.value {
                SqlValue::Null => "NULL",
                SqlValue::Bool(true) => "TRUE",
                SqlValue::Bool(false) => "FALSE",
                _ => {
                    return Err(CatalogError::validation(format!(
                        "operator {} on field {} accepts only null or a boolean",
                        op.sql(),
                        field
                    )));
                }
            };
            Ok(format!("{} {} {}", lhs, op.sql(), keyword))
        }
        _ => match &item.value {
            SqlValue::Null => Ok(format!("{} {} NULL", lhs, op.sql())),
            SqlValue::List(_) => Err(CatalogError::validation(format!(
                "operator {} on field {} does not accept a list",
                op.sql(),
                field
            ))),
            value => Ok(format!(
                "{} {} {}",
                lhs,
                op.sql(),
                params.push_typed(value.clone(), operand.column_type.as_ref())
            )),
        },
    }
}
