use polars::prelude::*;
use rayon::prelude::*;
use std::collections::HashMap;
use std::time::Instant;
use tracing::{debug, info};

use crate::column::ColumnDef;
use crate::domain::RTVError;
use crate::resource::scan_frame;
use crate::schema::{self, ColumnConfig};
use crate::value::Value;

/// A row of a file whose shape is only known at runtime.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    values: HashMap<String, Value>,
}

impl Record {
    /// Missing fields read as [`Value::Null`].
    pub fn get(&self, key: &str) -> Value {
        self.values.get(key).cloned().unwrap_or_default()
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn field(key: &str) -> schema::Field<Record, Value> {
        schema::Field::dynamic(key, |record, key| record.get(key))
    }

    /// All fields in key order, used as row identity when no key column is
    /// configured.
    pub fn fingerprint(&self) -> String {
        let mut keys: Vec<&String> = self.values.keys().collect();
        keys.sort();
        keys.iter()
            .map(|k| format!("{k}={}", self.values[*k]))
            .collect::<Vec<_>>()
            .join("\u{1f}")
    }

    /// Row identity taken from `column`. Rows without a value there fall
    /// back to their fingerprint so they stay distinct.
    pub fn key_by(&self, column: &str) -> String {
        match self.get(column) {
            Value::Null => self.fingerprint(),
            value => value.to_string(),
        }
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

fn is_numeric_type(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}

fn is_tag_type(dtype: &DataType) -> bool {
    matches!(dtype, DataType::List(inner) if inner.as_ref() == &DataType::String)
}

fn load_column(df: &DataFrame, col_name: &str) -> Result<Vec<Value>, PolarsError> {
    let column = df.column(col_name)?;
    let dtype = column.dtype().clone();

    if is_numeric_type(&dtype) {
        let col = column.cast(&DataType::Float64)?;
        let values = col
            .as_materialized_series()
            .f64()?
            .into_iter()
            .map(|v| v.map(Value::Number).unwrap_or(Value::Null))
            .collect();
        return Ok(values);
    }

    if is_tag_type(&dtype) {
        let series = column.as_materialized_series();
        let mut values = Vec::with_capacity(series.len());
        for item in series.list()?.into_iter() {
            let value = match item {
                Some(tags) => Value::Tags(
                    tags.str()?
                        .into_iter()
                        .flatten()
                        .map(str::to_string)
                        .collect(),
                ),
                None => Value::Null,
            };
            values.push(value);
        }
        return Ok(values);
    }

    let col = column.cast(&DataType::String)?;
    let values = col
        .str()?
        .into_iter()
        .map(|v| match v {
            Some(s) => Value::Text(s.replace("\r\n", " ↵ ").replace('\n', " ↵ ")),
            None => Value::Null,
        })
        .collect();
    Ok(values)
}

/// Converts a frame into records. Each column is converted in its own
/// rayon task.
pub fn records_from_frame(df: DataFrame) -> Result<Vec<Record>, RTVError> {
    let start_time = Instant::now();
    let names: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|name| name.to_string())
        .collect();

    let c_: Result<Vec<Vec<Value>>, _> = names
        .par_iter()
        .map(|name| load_column(&df, name))
        .collect();
    let columns = c_?;

    let mut records = vec![Record::default(); df.height()];
    for (name, values) in names.iter().zip(columns) {
        for (record, value) in records.iter_mut().zip(values) {
            record.values.insert(name.clone(), value);
        }
    }

    info!(
        "Converted {} rows x {} columns in {}ms",
        records.len(),
        names.len(),
        start_time.elapsed().as_millis()
    );
    Ok(records)
}

/// Picks a column kind per field from the frame schema: numeric types,
/// string lists as tags, everything else as text.
pub fn infer_columns(schema: &Schema) -> Vec<ColumnDef<Record>> {
    schema
        .iter()
        .map(|(name, dtype)| {
            let field = Record::field(name.as_str());
            debug!("Inferring column \"{name}\" from {dtype:?}");
            if is_numeric_type(dtype) {
                schema::col(field, ColumnConfig::numeric(name.as_str()))
            } else if is_tag_type(dtype) {
                schema::col(field, ColumnConfig::tags(name.as_str()))
            } else {
                schema::col(field, ColumnConfig::text(name.as_str()))
            }
        })
        .collect()
}

/// Reads only the schema of the file behind `url` and infers its columns.
pub fn infer_columns_from(url: &str) -> Result<Vec<ColumnDef<Record>>, RTVError> {
    let schema = scan_frame(url)?.collect_schema()?;
    Ok(infer_columns(&schema))
}
