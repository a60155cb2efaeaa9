//! Request types for catalog operations
//!
//! Includes CatalogQuery (list, detail and raw reads), its filter and order
//! building blocks, and DataMutationRequest for writes.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::SqlValue;

// ============================================================================
// Field Specs
// ============================================================================

/// Caller-supplied presentation of one requested field
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldSpec {
    /// Code the value is returned under instead of the column name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_code: Option<String>,
    /// Label returned instead of the column name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_name: Option<String>,
    #[serde(default)]
    pub is_displayed_in_table: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_order: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub render_config: Option<String>,
}

impl FieldSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn code(mut self, field_code: impl Into<String>) -> Self {
        self.field_code = Some(field_code.into());
        self
    }

    pub fn name(mut self, field_name: impl Into<String>) -> Self {
        self.field_name = Some(field_name.into());
        self
    }

    pub fn displayed(mut self) -> Self {
        self.is_displayed_in_table = true;
        self
    }

    pub fn order(mut self, field_order: i32) -> Self {
        self.field_order = Some(field_order);
        self
    }

    pub fn render(mut self, render_config: impl Into<String>) -> Self {
        self.render_config = Some(render_config.into());
        self
    }
}

// ============================================================================
// Filters
// ============================================================================

/// Comparison applied by one filter item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterOperator {
    Equal,
    NotEqual,
    GreaterThan,
    GreaterThanEqual,
    LessThan,
    LessThanEqual,
    Like,
    NotLike,
    Ilike,
    NotIlike,
    In,
    NotIn,
    Is,
    IsNot,
}

impl FilterOperator {
    /// Operators whose value is wrapped in `%` wildcards
    pub const LIKE_CLASS: &'static [FilterOperator] = &[
        FilterOperator::Like,
        FilterOperator::NotLike,
        FilterOperator::Ilike,
        FilterOperator::NotIlike,
    ];

    /// SQL symbol for the operator
    pub fn sql(&self) -> &'static str {
        match self {
            FilterOperator::Equal => "=",
            FilterOperator::NotEqual => "!=",
            FilterOperator::GreaterThan => ">",
            FilterOperator::GreaterThanEqual => ">=",
            FilterOperator::LessThan => "<",
            FilterOperator::LessThanEqual => "<=",
            FilterOperator::Like => "LIKE",
            FilterOperator::NotLike => "NOT LIKE",
            FilterOperator::Ilike => "ILIKE",
            FilterOperator::NotIlike => "NOT ILIKE",
            FilterOperator::In => "IN",
            FilterOperator::NotIn => "NOT IN",
            FilterOperator::Is => "IS",
            FilterOperator::IsNot => "IS NOT",
        }
    }

    pub fn is_like(&self) -> bool {
        Self::LIKE_CLASS.contains(self)
    }
}

/// Boolean operator joining the conditions of one group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "Option<String>", into = "String")]
pub enum GroupOperator {
    #[default]
    And,
    Or,
}

impl GroupOperator {
    pub fn sql(&self) -> &'static str {
        match self {
            GroupOperator::And => "AND",
            GroupOperator::Or => "OR",
        }
    }
}

impl TryFrom<Option<String>> for GroupOperator {
    type Error = String;

    /// Unset and empty operators mean AND
    fn try_from(value: Option<String>) -> Result<Self, Self::Error> {
        match value.as_deref().map(str::trim) {
            None | Some("") => Ok(GroupOperator::And),
            Some(op) if op.eq_ignore_ascii_case("and") => Ok(GroupOperator::And),
            Some(op) if op.eq_ignore_ascii_case("or") => Ok(GroupOperator::Or),
            Some(op) => Err(format!("Unsupported group operator '{}'", op)),
        }
    }
}

impl From<GroupOperator> for String {
    fn from(value: GroupOperator) -> Self {
        value.sql().to_string()
    }
}

/// One condition on one field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterItem {
    pub operator: FilterOperator,
    #[serde(default)]
    pub value: SqlValue,
}

impl FilterItem {
    pub fn new(operator: FilterOperator, value: impl Into<SqlValue>) -> Self {
        Self {
            operator,
            value: value.into(),
        }
    }
}

/// Conditions combined with one group operator; groups are combined with AND
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterGroup {
    #[serde(default)]
    pub operator: GroupOperator,
    /// Field key (simple or chained) to condition
    #[serde(default)]
    pub filters: BTreeMap<String, FilterItem>,
}

impl FilterGroup {
    /// Group whose conditions must all hold
    pub fn all() -> Self {
        Self::default()
    }

    /// Group where any condition suffices
    pub fn any() -> Self {
        Self {
            operator: GroupOperator::Or,
            filters: BTreeMap::new(),
        }
    }

    /// Add a condition on `field`
    pub fn with(
        mut self,
        field: impl Into<String>,
        operator: FilterOperator,
        value: impl Into<SqlValue>,
    ) -> Self {
        self.filters
            .insert(field.into(), FilterItem::new(operator, value));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }
}

// ============================================================================
// Ordering
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "Option<String>", into = "String")]
pub enum OrderDirection {
    #[default]
    Asc,
    Desc,
}

impl OrderDirection {
    pub fn sql(&self) -> &'static str {
        match self {
            OrderDirection::Asc => "ASC",
            OrderDirection::Desc => "DESC",
        }
    }
}

impl TryFrom<Option<String>> for OrderDirection {
    type Error = String;

    /// Unset and empty directions mean ascending
    fn try_from(value: Option<String>) -> Result<Self, Self::Error> {
        match value.as_deref().map(str::trim) {
            None | Some("") => Ok(OrderDirection::Asc),
            Some(dir) if dir.eq_ignore_ascii_case("asc") => Ok(OrderDirection::Asc),
            Some(dir) if dir.eq_ignore_ascii_case("desc") => Ok(OrderDirection::Desc),
            Some(dir) => Err(format!("Unsupported order direction '{}'", dir)),
        }
    }
}

impl From<OrderDirection> for String {
    fn from(value: OrderDirection) -> Self {
        value.sql().to_string()
    }
}

impl fmt::Display for OrderDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.sql())
    }
}

/// Sort on one field (simple or chained)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderSpec {
    pub field_name: String,
    #[serde(default)]
    pub direction: OrderDirection,
}

impl OrderSpec {
    pub fn new(field_name: impl Into<String>, direction: OrderDirection) -> Self {
        Self {
            field_name: field_name.into(),
            direction,
        }
    }
}

// ============================================================================
// Queries
// ============================================================================

/// Read request against one tenant object
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogQuery {
    pub tenant_code: String,
    pub object_code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_code: Option<String>,
    /// Requested fields; empty means every column plus display columns
    #[serde(default)]
    pub fields: BTreeMap<String, FieldSpec>,
    #[serde(default)]
    pub filters: Vec<FilterGroup>,
    #[serde(default)]
    pub orders: Vec<OrderSpec>,
    /// 1-based page; values below 1 fall back to the first page
    #[serde(default)]
    pub page: i64,
    /// Values below 1 fall back to the configured default page size
    #[serde(default)]
    pub page_size: i64,
    /// Row identifier for detail lookups
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serial: Option<String>,
    /// Complete query body for raw reads
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_query: Option<String>,
}

impl CatalogQuery {
    pub fn new(tenant_code: impl Into<String>, object_code: impl Into<String>) -> Self {
        Self {
            tenant_code: tenant_code.into(),
            object_code: object_code.into(),
            ..Self::default()
        }
    }

    pub fn product(mut self, product_code: impl Into<String>) -> Self {
        self.product_code = Some(product_code.into());
        self
    }

    /// Request a field with its presentation
    pub fn field(mut self, key: impl Into<String>, spec: FieldSpec) -> Self {
        self.fields.insert(key.into(), spec);
        self
    }

    pub fn filter_group(mut self, group: FilterGroup) -> Self {
        self.filters.push(group);
        self
    }

    pub fn order_by(mut self, field_name: impl Into<String>, direction: OrderDirection) -> Self {
        self.orders.push(OrderSpec::new(field_name, direction));
        self
    }

    pub fn paginate(mut self, page: i64, page_size: i64) -> Self {
        self.page = page;
        self.page_size = page_size;
        self
    }

    pub fn serial(mut self, serial: impl Into<String>) -> Self {
        self.serial = Some(serial.into());
        self
    }

    pub fn raw(mut self, raw_query: impl Into<String>) -> Self {
        self.raw_query = Some(raw_query.into());
        self
    }
}

// ============================================================================
// Mutations
// ============================================================================

/// One column value of a create or update request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MutationItem {
    pub field_code: String,
    /// Type hint used when the column type cannot be read from the catalog
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_type: Option<String>,
    #[serde(default)]
    pub value: SqlValue,
}

impl MutationItem {
    pub fn new(field_code: impl Into<String>, value: impl Into<SqlValue>) -> Self {
        Self {
            field_code: field_code.into(),
            data_type: None,
            value: value.into(),
        }
    }

    pub fn typed(mut self, data_type: impl Into<String>) -> Self {
        self.data_type = Some(data_type.into());
        self
    }
}

/// Create, update or delete request against one tenant object
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataMutationRequest {
    pub tenant_code: String,
    pub object_code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_code: Option<String>,
    /// Target row for update and delete
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serial: Option<String>,
    /// Acting user, stamped into the audit column on update
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_serial: Option<String>,
    #[serde(default)]
    pub items: Vec<MutationItem>,
}

impl DataMutationRequest {
    pub fn new(tenant_code: impl Into<String>, object_code: impl Into<String>) -> Self {
        Self {
            tenant_code: tenant_code.into(),
            object_code: object_code.into(),
            ..Self::default()
        }
    }

    pub fn serial(mut self, serial: impl Into<String>) -> Self {
        self.serial = Some(serial.into());
        self
    }

    pub fn user(mut self, user_serial: impl Into<String>) -> Self {
        self.user_serial = Some(user_serial.into());
        self
    }

    pub fn item(mut self, field_code: impl Into<String>, value: impl Into<SqlValue>) -> Self {
        self.items.push(MutationItem::new(field_code, value));
        self
    }

    pub fn with_item(mut self, item: MutationItem) -> Self {
        self.items.push(item);
        self
    }
}
