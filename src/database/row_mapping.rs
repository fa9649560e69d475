//! Decodes dynamically shaped result rows into ordered JSON records.
//!
//! The shape of a record is whatever the stored statement selects, so
//! columns are decoded by their Postgres type name. Types without a JSON
//! rendering here fail with `StoreError::Decode` rather than guessing.

use bigdecimal::{BigDecimal, ToPrimitive};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde_json::Value;
use sqlx::postgres::PgRow;
use sqlx::{Column, Row, TypeInfo};
use uuid::Uuid;

use crate::error::{Result, StoreError};
use crate::models::Record;

pub fn row_to_record(row: &PgRow) -> Result<Record> {
    let mut record = Record::new();
    for (index, column) in row.columns().iter().enumerate() {
        let type_name = column.type_info().name();
        let value = decode_column(row, index, type_name).map_err(|_| StoreError::Decode {
            column: column.name().to_string(),
            type_name: type_name.to_string(),
        })?;
        record.insert(column.name().to_string(), value);
    }
    Ok(record)
}

fn decode_column(row: &PgRow, index: usize, type_name: &str) -> std::result::Result<Value, sqlx::Error> {
    let value = match type_name {
        "BOOL" => row.try_get::<Option<bool>, _>(index)?.map(Value::from),
        "INT2" => row.try_get::<Option<i16>, _>(index)?.map(Value::from),
        "INT4" => row.try_get::<Option<i32>, _>(index)?.map(Value::from),
        "INT8" => row.try_get::<Option<i64>, _>(index)?.map(Value::from),
        "FLOAT4" => row
            .try_get::<Option<f32>, _>(index)?
            .map(|v| Value::from(f64::from(v))),
        "FLOAT8" => row.try_get::<Option<f64>, _>(index)?.map(Value::from),
        "NUMERIC" => row
            .try_get::<Option<BigDecimal>, _>(index)?
            .map(|v| v.to_f64().map_or(Value::Null, Value::from)),
        "TEXT" | "VARCHAR" | "BPCHAR" | "NAME" => {
            row.try_get::<Option<String>, _>(index)?.map(Value::from)
        }
        "UUID" => row
            .try_get::<Option<Uuid>, _>(index)?
            .map(|v| Value::from(v.to_string())),
        "DATE" => row
            .try_get::<Option<NaiveDate>, _>(index)?
            .map(|v| Value::from(v.to_string())),
        "TIME" => row
            .try_get::<Option<NaiveTime>, _>(index)?
            .map(|v| Value::from(v.to_string())),
        "TIMESTAMP" => row
            .try_get::<Option<NaiveDateTime>, _>(index)?
            .map(|v| Value::from(v.format("%Y-%m-%dT%H:%M:%S%.f").to_string())),
        "TIMESTAMPTZ" => row
            .try_get::<Option<DateTime<Utc>>, _>(index)?
            .map(|v| Value::from(v.to_rfc3339())),
        "JSON" | "JSONB" => row.try_get::<Option<Value>, _>(index)?,
        "BOOL[]" => array::<bool>(row, index)?,
        "INT2[]" => array::<i16>(row, index)?,
        "INT4[]" => array::<i32>(row, index)?,
        "INT8[]" => array::<i64>(row, index)?,
        "FLOAT8[]" => array::<f64>(row, index)?,
        "TEXT[]" | "VARCHAR[]" => array::<String>(row, index)?,
        "UUID[]" => row
            .try_get::<Option<Vec<Option<Uuid>>>, _>(index)?
            .map(|items| {
                items
                    .into_iter()
                    .map(|item| item.map_or(Value::Null, |v| Value::from(v.to_string())))
                    .collect()
            }),
        _ => {
            return Err(sqlx::Error::Decode(
                format!("unsupported column type {type_name}").into(),
            ))
        }
    };
    Ok(value.unwrap_or(Value::Null))
}

fn array<T>(row: &PgRow, index: usize) -> std::result::Result<Option<Value>, sqlx::Error>
where
    T: for<'r> sqlx::Decode<'r, sqlx::Postgres> + sqlx::Type<sqlx::Postgres> + Into<Value>,
    Vec<Option<T>>: for<'r> sqlx::Decode<'r, sqlx::Postgres> + sqlx::Type<sqlx::Postgres>,
{
    Ok(row.try_get::<Option<Vec<Option<T>>>, _>(index)?.map(|items| {
        items
            .into_iter()
            .map(|item| item.map_or(Value::Null, Into::into))
            .collect()
    }))
}
