//! Row decoding into response items

use rust_decimal::prelude::ToPrimitive;
use sqlx::postgres::PgRow;
use sqlx::Row;

use crate::response::{DataItem, DataRow};
use crate::types::{ColumnDescriptor, DataKind};

/// Data type reported for every column of a raw query
pub const RAW_COLUMN_TYPE: &str = "text";

/// Decode a row read through a projection; values are positional
///
/// A relationship column whose `<field>__<display_column>` companion was also
/// read gets the companion's value as its display value.
pub fn decode_row(row: &PgRow, columns: &[ColumnDescriptor], display_column: &str) -> DataRow {
    let mut decoded = DataRow::new();
    for (index, column) in columns.iter().enumerate() {
        decoded.insert(
            column.field_code.clone(),
            DataItem::new(
                &column.field_code,
                &column.display_name,
                &column.data_type,
                decode_value(row, index, &column.kind),
            ),
        );
    }

    for column in columns.iter().filter(|c| c.is_relationship()) {
        let companion = format!("{}__{}", column.field_code, display_column);
        let display = decoded.get(&companion).map(|item| item.value.clone());
        if let (Some(display), Some(item)) = (display, decoded.get_mut(&column.field_code)) {
            item.display_value = Some(display);
        }
    }

    decoded
}

/// Decode one row of a caller-supplied query
///
/// Raw pages are read back as `row_to_json` documents, so every column type
/// arrives in PostgreSQL's own JSON rendering (arrays as arrays, intervals and
/// network types as strings) instead of being guessed from its binary form.
pub fn decode_raw_row(document: Option<serde_json::Value>) -> DataRow {
    let Some(serde_json::Value::Object(fields)) = document else {
        return DataRow::new();
    };

    fields
        .into_iter()
        .map(|(name, value)| {
            let item = DataItem::new(&name, titleize(&name), RAW_COLUMN_TYPE, value);
            (name, item)
        })
        .collect()
}

/// Decode one column; values that cannot be read come back as null
pub(crate) fn decode_value(row: &PgRow, index: usize, kind: &DataKind) -> serde_json::Value {
    use serde_json::Value;

    let value = match kind {
        DataKind::SmallInt => row
            .try_get::<Option<i16>, _>(index)
            .ok()
            .flatten()
            .map(Value::from),
        DataKind::Integer => row
            .try_get::<Option<i32>, _>(index)
            .ok()
            .flatten()
            .map(Value::from),
        DataKind::BigInt => row
            .try_get::<Option<i64>, _>(index)
            .ok()
            .flatten()
            .map(Value::from),
        DataKind::Real => row
            .try_get::<Option<f32>, _>(index)
            .ok()
            .flatten()
            .and_then(|v| serde_json::Number::from_f64(v as f64))
            .map(Value::Number),
        DataKind::Double => row
            .try_get::<Option<f64>, _>(index)
            .ok()
            .flatten()
            .and_then(serde_json::Number::from_f64)
            .map(Value::Number),
        DataKind::Numeric => row
            .try_get::<Option<rust_decimal::Decimal>, _>(index)
            .ok()
            .flatten()
            .and_then(|d| d.to_f64())
            .and_then(serde_json::Number::from_f64)
            .map(Value::Number),
        DataKind::Boolean => row
            .try_get::<Option<bool>, _>(index)
            .ok()
            .flatten()
            .map(Value::Bool),
        DataKind::Uuid => row
            .try_get::<Option<uuid::Uuid>, _>(index)
            .ok()
            .flatten()
            .map(|v| Value::String(v.to_string())),
        DataKind::Date => row
            .try_get::<Option<chrono::NaiveDate>, _>(index)
            .ok()
            .flatten()
            .map(|v| Value::String(v.to_string())),
        DataKind::Time => row
            .try_get::<Option<chrono::NaiveTime>, _>(index)
            .ok()
            .flatten()
            .map(|v| Value::String(v.to_string())),
        DataKind::Timestamp => row
            .try_get::<Option<chrono::NaiveDateTime>, _>(index)
            .ok()
            .flatten()
            .map(|v| Value::String(v.format("%Y-%m-%dT%H:%M:%S%.f").to_string())),
        DataKind::TimestampTz => row
            .try_get::<Option<chrono::DateTime<chrono::Utc>>, _>(index)
            .ok()
            .flatten()
            .map(|v| Value::String(v.to_rfc3339())),
        DataKind::Json => row
            .try_get::<Option<Value>, _>(index)
            .ok()
            .flatten(),
        DataKind::Text | DataKind::Other(_) => row
            .try_get_unchecked::<Option<String>, _>(index)
            .ok()
            .flatten()
            .map(Value::String),
    };
    value.unwrap_or(Value::Null)
}

/// `order_total` -> `Order Total`
pub fn titleize(name: &str) -> String {
    name.split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}
