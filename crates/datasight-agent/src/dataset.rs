//! Tabular dataset backed by a polars `DataFrame`, plus the column
//! statistics the prompt context needs (describe, distinct counts, value counts).

use crate::error::{Error, Result};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::io::{Cursor, Read};
use std::path::Path;

/// Cell values read as null
const MISSING_MARKERS: &[&str] = &["", "NA", "N/A", "NaN", "nan", "null", "NULL", "None", "#N/A"];

/// Rows scanned for schema inference
const INFER_SCHEMA_ROWS: usize = 10_000;

/// Column data type, named the way the generated pandas code will see it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DType {
    Int64,
    Float64,
    Bool,
    Object,
}

impl DType {
    pub fn name(&self) -> &'static str {
        match self {
            DType::Int64 => "int64",
            DType::Float64 => "float64",
            DType::Bool => "bool",
            DType::Object => "object",
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, DType::Int64 | DType::Float64)
    }

    fn from_polars(dtype: &DataType) -> Self {
        match dtype {
            DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64 => DType::Int64,
            DataType::Float32 | DataType::Float64 => DType::Float64,
            DataType::Boolean => DType::Bool,
            _ => DType::Object,
        }
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Format a float the way a dataframe prints a single value
pub(crate) fn format_float(v: f64) -> String {
    if v.is_finite() && v.fract() == 0.0 && v.abs() < 1e16 {
        format!("{:.1}", v)
    } else {
        format!("{}", v)
    }
}

/// Display label of one cell, `None` for null and NaN
fn cell_label(value: &AnyValue<'_>) -> Option<String> {
    match value {
        AnyValue::Null => None,
        AnyValue::Boolean(b) => Some(if *b { "True" } else { "False" }.to_string()),
        AnyValue::Float32(v) => (!v.is_nan()).then(|| format_float(*v as f64)),
        AnyValue::Float64(v) => (!v.is_nan()).then(|| format_float(*v)),
        AnyValue::String(s) => Some(s.to_string()),
        other => Some(other.str_value().to_string()),
    }
}

/// Descriptive statistics of one numeric column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Describe {
    pub count: usize,
    pub mean: Option<f64>,
    /// Sample standard deviation (n - 1); undefined below two values
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub q25: Option<f64>,
    pub median: Option<f64>,
    pub q75: Option<f64>,
    pub max: Option<f64>,
}

/// Linearly interpolated quantile of sorted values
fn quantile(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64))
}

/// Borrowed view of one column of a [`Dataset`]
#[derive(Debug, Clone, Copy)]
pub struct DataColumn<'a> {
    inner: &'a Column,
}

impl<'a> DataColumn<'a> {
    pub fn name(&self) -> &'a str {
        self.inner.name().as_str()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn dtype(&self) -> DType {
        DType::from_polars(self.inner.dtype())
    }

    /// Display label of every cell, `None` for missing (and NaN)
    pub fn labels(&self) -> Vec<Option<String>> {
        (0..self.inner.len())
            .map(|i| self.inner.get(i).ok().and_then(|v| cell_label(&v)))
            .collect()
    }

    /// Non-missing values of a numeric column
    pub fn numeric_values(&self) -> Option<Vec<f64>> {
        if !self.dtype().is_numeric() {
            return None;
        }
        let cast = self.inner.cast(&DataType::Float64).ok()?;
        let values = cast
            .f64()
            .ok()?
            .into_iter()
            .flatten()
            .filter(|x| !x.is_nan())
            .collect();
        Some(values)
    }

    /// Number of distinct non-missing values
    pub fn n_unique(&self) -> usize {
        self.inner
            .as_materialized_series()
            .drop_nulls()
            .n_unique()
            .unwrap_or(0)
    }

    /// Counts per distinct non-missing value, most frequent first.
    /// Ties keep first-appearance order so the output is deterministic.
    pub fn value_counts(&self) -> Vec<(String, usize)> {
        let mut index: HashMap<String, usize> = HashMap::new();
        let mut counts: Vec<(String, usize)> = Vec::new();
        for label in self.labels().into_iter().flatten() {
            match index.get(&label) {
                Some(&i) => counts[i].1 += 1,
                None => {
                    index.insert(label.clone(), counts.len());
                    counts.push((label, 1));
                }
            }
        }
        // sort_by is stable
        counts.sort_by(|a, b| b.1.cmp(&a.1));
        counts
    }

    /// Descriptive statistics; `None` for non-numeric columns
    pub fn describe(&self) -> Option<Describe> {
        let mut values = self.numeric_values()?;
        let cast = self.inner.cast(&DataType::Float64).ok()?;
        let ca = cast.f64().ok()?;

        let count = values.len();
        values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        Some(Describe {
            count,
            mean: if count > 0 { ca.mean() } else { None },
            std: if count > 1 { ca.std(1) } else { None },
            min: values.first().copied(),
            q25: quantile(&values, 0.25),
            median: quantile(&values, 0.5),
            q75: quantile(&values, 0.75),
            max: values.last().copied(),
        })
    }
}

/// A tabular dataset with named, typed columns of equal length
#[derive(Debug, Clone)]
pub struct Dataset {
    frame: DataFrame,
}

impl Dataset {
    /// Wrap an already loaded frame
    pub fn from_frame(frame: DataFrame) -> Result<Self> {
        if frame.width() == 0 {
            return Err(Error::InvalidDataset("no columns in header".to_string()));
        }
        Ok(Self { frame })
    }

    /// Load a CSV file with a header row
    pub fn from_csv_path(path: impl AsRef<Path>, delimiter: u8) -> Result<Self> {
        let file = std::fs::File::open(path.as_ref())?;
        let frame = csv_options(delimiter)
            .into_reader_with_file_handle(file)
            .finish()?;
        Self::from_frame(frame)
    }

    /// Load CSV data with a header row from any reader
    pub fn from_csv_reader<R: Read>(mut reader: R, delimiter: u8) -> Result<Self> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        if bytes.iter().all(|b| b.is_ascii_whitespace()) {
            return Err(Error::InvalidDataset("no columns in header".to_string()));
        }
        let frame = csv_options(delimiter)
            .into_reader_with_file_handle(Cursor::new(bytes))
            .finish()?;
        Self::from_frame(frame)
    }

    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    pub fn n_rows(&self) -> usize {
        self.frame.height()
    }

    pub fn n_cols(&self) -> usize {
        self.frame.width()
    }

    pub fn columns(&self) -> impl Iterator<Item = DataColumn<'_>> + '_ {
        self.frame
            .get_columns()
            .iter()
            .map(|inner| DataColumn { inner })
    }

    pub fn column(&self, name: &str) -> Option<DataColumn<'_>> {
        self.frame.column(name).ok().map(|inner| DataColumn { inner })
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.frame
            .get_column_names()
            .into_iter()
            .map(|n| n.as_str())
            .collect()
    }
}

/// Reader options shared by file and in-memory loading. Short rows are
/// padded with nulls and long rows truncated; duplicate and blank header
/// names are made unique by the reader.
fn csv_options(delimiter: u8) -> CsvReadOptions {
    let null_values: Vec<PlSmallStr> = MISSING_MARKERS.iter().map(|m| (*m).into()).collect();
    let parse_options = CsvParseOptions::default()
        .with_separator(delimiter)
        .with_missing_is_null(true)
        .with_truncate_ragged_lines(true)
        .with_null_values(Some(NullValues::AllColumns(null_values)));

    CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(INFER_SCHEMA_ROWS))
        .map_parse_options(|_opts| parse_options.clone())
}
