//! Field resolution: which columns a read returns and where they come from

use std::collections::BTreeMap;

use crate::config::CatalogConfig;
use crate::error::{CatalogError, Result};
use crate::request::FieldSpec;
use crate::schema::SchemaSnapshot;
use crate::sql::join::{ChainTarget, JoinPlan};
use crate::sql::sanitize::{is_chain, quote_identifier};
use crate::types::{ColumnDescriptor, ColumnSource, DataKind};

/// Data type reported for `<field>__<display>` columns
pub const DISPLAY_COLUMN_TYPE: &str = "string";

/// Data type reported for explicitly requested chained fields
pub const CHAIN_COLUMN_TYPE: &str = "text";

/// Resolved select list of one read
#[derive(Debug, Clone, PartialEq)]
pub struct Projection {
    columns: Vec<ColumnDescriptor>,
}

impl Projection {
    /// Resolve the requested fields against the snapshot
    ///
    /// With no requested fields every column of the object is returned, plus a
    /// `<field>__<display>` column for each relationship column. The display
    /// column reads as NULL when the referenced table has no such column. Requested simple fields must exist; requested
    /// chains that cannot be resolved are left out without an error.
    pub fn resolve(
        snapshot: &SchemaSnapshot,
        fields: &BTreeMap<String, FieldSpec>,
        plan: &mut JoinPlan,
        config: &CatalogConfig,
    ) -> Result<Self> {
        let base = snapshot.columns();

        let mut columns = if fields.is_empty() {
            Self::all_columns(snapshot, base, plan, config)
        } else {
            Self::requested_columns(snapshot, &base, fields, plan)?
        };

        if columns.is_empty() {
            return Err(CatalogError::validation(format!(
                "no field found for object {}",
                snapshot.table()
            )));
        }

        columns.sort_by_key(|column| (column.field_order.is_none(), column.field_order));

        Ok(Self { columns })
    }

    fn all_columns(
        snapshot: &SchemaSnapshot,
        base: Vec<ColumnDescriptor>,
        plan: &mut JoinPlan,
        config: &CatalogConfig,
    ) -> Vec<ColumnDescriptor> {
        let mut display_columns = Vec::new();

        for column in base.iter().filter(|c| c.is_relationship()) {
            let field_code = format!("{}__{}", column.field_code, config.display_column);
            match plan.plan_path(snapshot, &[column.field_code.as_str()], &config.display_column) {
                Some(target) => {
                    display_columns.push(joined_descriptor(&field_code, DISPLAY_COLUMN_TYPE, &target));
                }
                None => {
                    tracing::debug!(
                        object = %snapshot.table(),
                        field = %field_code,
                        "Referenced table has no display column, reading NULL"
                    );
                    display_columns.push(ColumnDescriptor::absent(&field_code, DISPLAY_COLUMN_TYPE));
                }
            }
        }

        let mut columns = base;
        columns.extend(display_columns);
        columns
    }

    fn requested_columns(
        snapshot: &SchemaSnapshot,
        base: &[ColumnDescriptor],
        fields: &BTreeMap<String, FieldSpec>,
        plan: &mut JoinPlan,
    ) -> Result<Vec<ColumnDescriptor>> {
        let mut columns = Vec::with_capacity(fields.len());

        for (key, spec) in fields {
            let mut column = if let Some(column) = base.iter().find(|c| &c.field_code == key) {
                column.clone()
            } else if is_chain(key) {
                match plan.plan_chain(snapshot, key) {
                    Some(target) => {
                        let mut column = joined_descriptor(key, CHAIN_COLUMN_TYPE, &target);
                        column.original_field_code = Some(key.clone());
                        column
                    }
                    None => {
                        // unresolvable chains are dropped, unlike unknown simple fields
                        tracing::debug!(
                            object = %snapshot.table(),
                            field = %key,
                            "Dropping unresolvable chained field"
                        );
                        continue;
                    }
                }
            } else {
                return Err(CatalogError::validation(format!(
                    "field {} is not found in object {}",
                    key,
                    snapshot.table()
                )));
            };

            apply_spec(&mut column, spec);
            columns.push(column);
        }

        Ok(columns)
    }

    pub fn columns(&self) -> &[ColumnDescriptor] {
        &self.columns
    }

    pub fn into_columns(self) -> Vec<ColumnDescriptor> {
        self.columns
    }

    /// Select list, in resolution order
    pub fn to_sql(&self) -> String {
        self.columns
            .iter()
            .map(select_expression)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

fn joined_descriptor(field_code: &str, data_type: &str, target: &ChainTarget) -> ColumnDescriptor {
    let kind = target
        .column_type
        .as_ref()
        .map(|t| t.kind())
        .unwrap_or_else(|| DataKind::Other("unknown".to_string()));
    ColumnDescriptor::joined(field_code, data_type, &target.alias, &target.column, kind)
}

fn apply_spec(column: &mut ColumnDescriptor, spec: &FieldSpec) {
    if let Some(code) = spec.field_code.as_deref().filter(|c| !c.is_empty()) {
        column.field_code = code.to_string();
    }
    if let Some(name) = spec.field_name.as_deref().filter(|n| !n.is_empty()) {
        column.display_name = name.to_string();
    }
    column.is_displayed_in_table = spec.is_displayed_in_table;
    column.field_order = spec.field_order;
    column.render_config = spec.render_config.clone();
}

/// Types without a native decoder are read through their text form
fn select_expression(column: &ColumnDescriptor) -> String {
    let mut expression = column.sql_expression();
    if matches!(column.kind, DataKind::Other(_)) || column.source == ColumnSource::Absent {
        expression.push_str("::text");
    }

    let renamed = match &column.source {
        ColumnSource::Base { column: source, .. } => &column.field_code != source,
        ColumnSource::Joined { .. } | ColumnSource::Absent => true,
    };
    if renamed {
        expression = format!("{} AS {}", expression, quote_identifier(&column.field_code));
    }
    expression
}
