//! Response types and pagination arithmetic

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One field of a returned row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataItem {
    pub field_code: String,
    pub field_name: String,
    pub data_type: String,
    pub value: serde_json::Value,
    /// Human readable form of the value, e.g. the referenced row's name for a
    /// relationship column
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_value: Option<serde_json::Value>,
}

impl DataItem {
    pub fn new(
        field_code: impl Into<String>,
        field_name: impl Into<String>,
        data_type: impl Into<String>,
        value: serde_json::Value,
    ) -> Self {
        Self {
            field_code: field_code.into(),
            field_name: field_name.into(),
            data_type: data_type.into(),
            value,
            display_value: None,
        }
    }
}

/// A decoded row keyed by field code
pub type DataRow = BTreeMap<String, DataItem>;

/// Result envelope of list and raw reads
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogResponse {
    pub items: Vec<DataRow>,
    pub total_data: i64,
    pub page: i64,
    pub page_size: i64,
    pub total_page: i64,
}

impl CatalogResponse {
    pub fn new(items: Vec<DataRow>, total_data: i64, pagination: Pagination) -> Self {
        Self {
            items,
            total_data,
            page: pagination.page,
            page_size: pagination.page_size,
            total_page: pagination.total_pages(total_data),
        }
    }
}

/// Normalised 1-based page window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: i64,
    pub page_size: i64,
}

impl Pagination {
    /// Pages below 1 become 1; page sizes below 1 become `default_page_size`
    pub fn normalize(page: i64, page_size: i64, default_page_size: i64) -> Self {
        Self {
            page: if page < 1 { 1 } else { page },
            page_size: if page_size < 1 {
                default_page_size.max(1)
            } else {
                page_size
            },
        }
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.page_size)
    }

    /// `ceil(total / page_size)`; an empty result has zero pages
    pub fn total_pages(&self, total: i64) -> i64 {
        if total <= 0 {
            return 0;
        }
        total / self.page_size + i64::from(total % self.page_size != 0)
    }
}
