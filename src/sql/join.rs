//! Join planning for chained relationship fields
//!
//! A chained field `a__b__c` walks foreign keys from the queried table: `a`
//! and `b` are relationship columns, `c` is the column read from the last
//! joined table. Each hop boundary becomes one `LEFT JOIN`, aliased by the
//! hop path it was reached through, so the same path requested from the
//! projection, a filter and an ORDER BY produces a single join.

use crate::schema::SchemaSnapshot;
use crate::sql::sanitize::{quote_identifier, split_chain};
use crate::types::ColumnType;

/// PostgreSQL truncates identifiers beyond this many bytes
const MAX_IDENTIFIER_LEN: usize = 63;

/// One planned join
#[derive(Debug, Clone, PartialEq)]
pub struct Join {
    /// Hop columns traversed from the base table to reach this join
    pub path: Vec<String>,
    pub alias: String,
    /// Table the alias refers to
    pub table: String,
    pub clause: String,
}

/// Where a chained field ends up after planning
#[derive(Debug, Clone, PartialEq)]
pub struct ChainTarget {
    /// Alias of the last joined table
    pub alias: String,
    /// Column read from the last joined table
    pub column: String,
    /// Type of that column, when its table is visible in the snapshot
    pub column_type: Option<ColumnType>,
}

impl ChainTarget {
    pub fn to_sql(&self) -> String {
        format!(
            "{}.{}",
            quote_identifier(&self.alias),
            quote_identifier(&self.column)
        )
    }
}

/// Ordered, deduplicated joins of one statement
///
/// Insertion order is emission order: a join may only reference aliases
/// planned before it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JoinPlan {
    joins: Vec<Join>,
}

impl JoinPlan {
    pub fn new() -> Self {
        Self::default()
    }

    /// Plan the joins for a chained field key
    ///
    /// Returns `None` when the key is not a valid chain or a hop has no
    /// foreign key; nothing is added to the plan in that case.
    pub fn plan_chain(&mut self, snapshot: &SchemaSnapshot, field: &str) -> Option<ChainTarget> {
        let hops = split_chain(field)?;
        let (column, path) = hops.split_last()?;
        self.plan_path(snapshot, path, column)
    }

    /// Plan the joins that reach `column` through the relationship columns in `path`
    pub fn plan_path(
        &mut self,
        snapshot: &SchemaSnapshot,
        path: &[&str],
        column: &str,
    ) -> Option<ChainTarget> {
        if path.is_empty() {
            return None;
        }

        let mut pending: Vec<Join> = Vec::new();
        let mut traversed: Vec<String> = Vec::with_capacity(path.len());
        let mut current_table = snapshot.table().to_string();
        let mut current_in_tenant = true;
        let mut source = format!(
            "{}.{}",
            quote_identifier(snapshot.tenant()),
            quote_identifier(snapshot.table())
        );

        for hop in path {
            if !current_in_tenant {
                return None;
            }
            let fk = snapshot.foreign_key(&current_table, hop)?;
            traversed.push(hop.to_string());

            let alias = match self.find(&traversed) {
                Some(existing) => existing.alias.clone(),
                None => {
                    let alias = self.allocate_alias(snapshot.table(), &traversed, &pending);
                    let clause = format!(
                        "LEFT JOIN {}.{} AS {} ON {}.{} = {}.{}",
                        quote_identifier(&fk.schema),
                        quote_identifier(&fk.table),
                        quote_identifier(&alias),
                        quote_identifier(&alias),
                        quote_identifier(&fk.column),
                        source,
                        quote_identifier(hop)
                    );
                    pending.push(Join {
                        path: traversed.clone(),
                        alias: alias.clone(),
                        table: fk.table.clone(),
                        clause,
                    });
                    alias
                }
            };

            source = quote_identifier(&alias);
            current_in_tenant = fk.schema == snapshot.tenant();
            current_table = fk.table.clone();
        }

        let column_type = if current_in_tenant && snapshot.table_exists(&current_table) {
            // a known table without the column cannot satisfy the chain
            Some(snapshot.column_type(&current_table, column)?.clone())
        } else {
            None
        };

        let alias = self
            .find(&traversed)
            .map(|join| join.alias.clone())
            .or_else(|| pending.last().map(|join| join.alias.clone()))?;

        self.joins.extend(pending);

        Some(ChainTarget {
            alias,
            column: column.to_string(),
            column_type,
        })
    }

    pub fn joins(&self) -> &[Join] {
        &self.joins
    }

    pub fn aliases(&self) -> Vec<&str> {
        self.joins.iter().map(|join| join.alias.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.joins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.joins.is_empty()
    }

    /// Join clauses in emission order, space separated
    pub fn to_sql(&self) -> String {
        self.joins
            .iter()
            .map(|join| join.clause.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn find(&self, path: &[String]) -> Option<&Join> {
        self.joins.iter().find(|join| join.path == path)
    }

    fn allocate_alias(&self, base_table: &str, path: &[String], pending: &[Join]) -> String {
        let taken = |candidate: &str| {
            self.joins
                .iter()
                .chain(pending.iter())
                .any(|join| join.alias == candidate)
        };

        let mut alias = format!("{}__{}", base_table, path.join("__")).replace('.', "_");
        let ordinal = self.joins.len() + pending.len() + 1;

        if alias.len() > MAX_IDENTIFIER_LEN {
            alias = format!("{}_{}", truncate(&alias, MAX_IDENTIFIER_LEN - 8), ordinal);
        }

        let mut candidate = alias.clone();
        let mut suffix = ordinal;
        while taken(&candidate) {
            candidate = format!("{}_{}", truncate(&alias, MAX_IDENTIFIER_LEN - 8), suffix);
            suffix += 1;
        }
        candidate
    }
}

fn truncate(value: &str, max_len: usize) -> &str {
    if value.len() <= max_len {
        return value;
    }
    let mut end = max_len;
    while !value.is_char_boundary(end) {
        end -= 1;
    }
    &value[..end]
}
