//! Column-typed tabular frame used for request data and model output.
//!
//! A [`TimeSeriesFrame`] is an ordered list of named columns of equal length. Column order is
//! significant: it is preserved through encoding and is what a caller sees on the wire.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::Value;

use crate::error::FrameError;

const ISO_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// Renders a timestamp the way `datetime.isoformat()` does: fractional seconds only when non-zero.
pub fn isoformat(ts: &NaiveDateTime) -> String {
    ts.format(ISO_FORMAT).to_string()
}

/// Parses the ISO-8601 variants accepted on input. Offsets are normalised to UTC.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    NaiveDateTime::parse_from_str(raw, ISO_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
        .ok()
        .or_else(|| {
            DateTime::parse_from_rfc3339(raw)
                .ok()
                .map(|ts| ts.naive_utc())
        })
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}

#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    Datetime(Vec<Option<NaiveDateTime>>),
    Float(Vec<Option<f64>>),
    Int(Vec<Option<i64>>),
    Str(Vec<Option<String>>),
    Bool(Vec<Option<bool>>),
}

fn gather<T: Clone>(values: &[Option<T>], indices: &[usize]) -> Vec<Option<T>> {
    indices
        .iter()
        .map(|&i| values.get(i).cloned().flatten())
        .collect()
}

impl ColumnData {
    pub fn len(&self) -> usize {
        match self {
            ColumnData::Datetime(v) => v.len(),
            ColumnData::Float(v) => v.len(),
            ColumnData::Int(v) => v.len(),
            ColumnData::Str(v) => v.len(),
            ColumnData::Bool(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_datetime(&self) -> bool {
        matches!(self, ColumnData::Datetime(_))
    }

    pub fn as_datetime(&self) -> Option<&[Option<NaiveDateTime>]> {
        match self {
            ColumnData::Datetime(v) => Some(v),
            _ => None,
        }
    }

    /// JSON form of a single cell. Missing rows and non-finite floats map to `null`.
    pub fn value(&self, row: usize) -> Value {
        match self {
            ColumnData::Datetime(v) => v
                .get(row)
                .and_then(Option::as_ref)
                .map_or(Value::Null, |ts| Value::String(isoformat(ts))),
            ColumnData::Float(v) => v.get(row).copied().flatten().map_or(Value::Null, Value::from),
            ColumnData::Int(v) => v.get(row).copied().flatten().map_or(Value::Null, Value::from),
            ColumnData::Str(v) => v
                .get(row)
                .and_then(Option::as_ref)
                .map_or(Value::Null, |s| Value::String(s.clone())),
            ColumnData::Bool(v) => v.get(row).copied().flatten().map_or(Value::Null, Value::Bool),
        }
    }

    pub fn is_null(&self, row: usize) -> bool {
        self.value(row).is_null()
    }

    pub fn to_values(&self) -> Vec<Value> {
        (0..self.len()).map(|row| self.value(row)).collect()
    }

    /// Builds a column of the same kind from the given row indices (repeats allowed).
    pub fn take(&self, indices: &[usize]) -> ColumnData {
        match self {
            ColumnData::Datetime(v) => ColumnData::Datetime(gather(v, indices)),
            ColumnData::Float(v) => ColumnData::Float(gather(v, indices)),
            ColumnData::Int(v) => ColumnData::Int(gather(v, indices)),
            ColumnData::Str(v) => ColumnData::Str(gather(v, indices)),
            ColumnData::Bool(v) => ColumnData::Bool(gather(v, indices)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    name: String,
    data: ColumnData,
}

impl Column {
    pub fn new(name: impl Into<String>, data: ColumnData) -> Self {
        Self {
            name: name.into(),
            data,
        }
    }

    pub fn datetime(name: impl Into<String>, values: Vec<NaiveDateTime>) -> Self {
        Self::new(
            name,
            ColumnData::Datetime(values.into_iter().map(Some).collect()),
        )
    }

    pub fn float(name: impl Into<String>, values: Vec<f64>) -> Self {
        Self::new(name, ColumnData::Float(values.into_iter().map(Some).collect()))
    }

    pub fn int(name: impl Into<String>, values: Vec<i64>) -> Self {
        Self::new(name, ColumnData::Int(values.into_iter().map(Some).collect()))
    }

    pub fn string<S: Into<String>>(name: impl Into<String>, values: Vec<S>) -> Self {
        Self::new(
            name,
            ColumnData::Str(values.into_iter().map(|s| Some(s.into())).collect()),
        )
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data(&self) -> &ColumnData {
        &self.data
    }

    pub fn set_data(&mut self, data: ColumnData) {
        self.data = data;
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimeSeriesFrame {
    columns: Vec<Column>,
}

impl TimeSeriesFrame {
    pub fn new(columns: Vec<Column>) -> Result<Self, FrameError> {
        let mut seen = HashSet::new();
        let expected = columns.first().map_or(0, Column::len);
        for column in &columns {
            if !seen.insert(column.name()) {
                return Err(FrameError::DuplicateColumn(column.name().to_string()));
            }
            if column.len() != expected {
                return Err(FrameError::LengthMismatch {
                    name: column.name().to_string(),
                    expected,
                    actual: column.len(),
                });
            }
        }
        Ok(Self { columns })
    }

    pub fn num_rows(&self) -> usize {
        self.columns.first().map_or(0, Column::len)
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.num_rows() == 0
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(Column::name).collect()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name() == name)
    }

    pub fn column_mut(&mut self, name: &str) -> Option<&mut Column> {
        self.columns.iter_mut().find(|c| c.name() == name)
    }

    pub fn require_column(&self, name: &str) -> Result<&Column, FrameError> {
        self.column(name)
            .ok_or_else(|| FrameError::UnknownColumn(name.to_string()))
    }

    fn row_key(columns: &[&Column], row: usize) -> Vec<String> {
        columns
            .iter()
            .map(|c| c.data().value(row).to_string())
            .collect()
    }

    /// Row indices grouped by the values of `columns`, groups in first-appearance order.
    /// With no grouping columns every row belongs to a single group.
    pub fn group_rows(&self, columns: &[String]) -> Result<Vec<Vec<usize>>, FrameError> {
        let keyed = columns
            .iter()
            .map(|name| self.require_column(name))
            .collect::<Result<Vec<_>, _>>()?;

        let mut index: HashMap<Vec<String>, usize> = HashMap::new();
        let mut groups: Vec<Vec<usize>> = Vec::new();
        for row in 0..self.num_rows() {
            let key = Self::row_key(&keyed, row);
            let slot = *index.entry(key).or_insert_with(|| {
                groups.push(Vec::new());
                groups.len() - 1
            });
            groups[slot].push(row);
        }
        Ok(groups)
    }

    /// Number of distinct value tuples over `columns`.
    pub fn distinct_count(&self, columns: &[String]) -> Result<usize, FrameError> {
        Ok(self.group_rows(columns)?.len())
    }

    /// Decodes a column-oriented JSON object (`{"col": [v0, v1, ...], ...}`).
    ///
    /// String columns named in `datetime_columns` are parsed as timestamps; any value that does not
    /// parse keeps the whole column as strings.
    pub fn from_json_columns(value: &Value, datetime_columns: &[&str]) -> Result<Self, FrameError> {
        let object = value.as_object().ok_or(FrameError::NotColumnOriented)?;
        let columns = object
            .iter()
            .map(|(name, values)| {
                let values = values.as_array().ok_or(FrameError::NotColumnOriented)?;
                let data = decode_column(name, values, datetime_columns.contains(&name.as_str()))?;
                Ok(Column::new(name.clone(), data))
            })
            .collect::<Result<Vec<_>, FrameError>>()?;
        Self::new(columns)
    }

    /// Column-oriented JSON form, the inverse of [`TimeSeriesFrame::from_json_columns`].
    pub fn to_json_columns(&self) -> Value {
        Value::Object(
            self.columns
                .iter()
                .map(|c| (c.name().to_string(), Value::Array(c.data().to_values())))
                .collect(),
        )
    }
}

fn decode_column(
    name: &str,
    values: &[Value],
    as_datetime: bool,
) -> Result<ColumnData, FrameError> {
    let invalid = |reason: &str| FrameError::InvalidValues {
        column: name.to_string(),
        reason: reason.to_string(),
    };

    let (mut strings, mut bools, mut ints, mut floats) = (false, false, false, false);
    for value in values {
        match value {
            Value::Null => {}
            Value::Bool(_) => bools = true,
            Value::Number(n) if n.is_i64() => ints = true,
            Value::Number(_) => floats = true,
            Value::String(_) => strings = true,
            Value::Array(_) | Value::Object(_) => {
                return Err(invalid("nested arrays and objects are not supported"));
            }
        }
    }

    let data = match (strings, bools, ints || floats) {
        (true, false, false) => {
            let raw: Vec<Option<String>> = values
                .iter()
                .map(|v| v.as_str().map(str::to_string))
                .collect();
            let parsed: Option<Vec<Option<NaiveDateTime>>> = as_datetime
                .then(|| {
                    raw.iter()
                        .map(|s| match s {
                            Some(s) => parse_timestamp(s).map(Some),
                            None => Some(None),
                        })
                        .collect::<Option<Vec<_>>>()
                })
                .flatten();
            match parsed {
                Some(timestamps) => ColumnData::Datetime(timestamps),
                None => ColumnData::Str(raw),
            }
        }
        (false, true, false) => ColumnData::Bool(values.iter().map(Value::as_bool).collect()),
        (false, false, true) if floats => {
            ColumnData::Float(values.iter().map(Value::as_f64).collect())
        }
        (false, false, true) => ColumnData::Int(values.iter().map(Value::as_i64).collect()),
        (false, false, false) if as_datetime => ColumnData::Datetime(vec![None; values.len()]),
        (false, false, false) => ColumnData::Float(vec![None; values.len()]),
        _ => return Err(invalid("mixed value types")),
    };
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ts(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    #[test]
    fn rejects_columns_of_different_lengths() {
        let result = TimeSeriesFrame::new(vec![
            Column::float("a", vec![1.0, 2.0]),
            Column::float("b", vec![1.0]),
        ]);
        assert_eq!(
            result,
            Err(FrameError::LengthMismatch {
                name: "b".to_string(),
                expected: 2,
                actual: 1
            })
        );
    }

    #[test]
    fn rejects_duplicate_columns() {
        let result = TimeSeriesFrame::new(vec![
            Column::float("a", vec![1.0]),
            Column::int("a", vec![1]),
        ]);
        assert_eq!(result, Err(FrameError::DuplicateColumn("a".to_string())));
    }

    #[test]
    fn groups_rows_in_first_appearance_order() {
        let frame = TimeSeriesFrame::new(vec![
            Column::string("id", vec!["b", "a", "b", "a", "c"]),
            Column::float("y", vec![1.0, 2.0, 3.0, 4.0, 5.0]),
        ])
        .unwrap();

        let groups = frame.group_rows(&["id".to_string()]).unwrap();
        assert_eq!(groups, vec![vec![0, 2], vec![1, 3], vec![4]]);
        assert_eq!(frame.distinct_count(&["id".to_string()]).unwrap(), 3);
        assert_eq!(frame.distinct_count(&[]).unwrap(), 1);
        assert_eq!(TimeSeriesFrame::default().distinct_count(&[]).unwrap(), 0);
    }

    #[test]
    fn grouping_by_unknown_column_fails() {
        let frame = TimeSeriesFrame::new(vec![Column::float("y", vec![1.0])]).unwrap();
        assert_eq!(
            frame.group_rows(&["id".to_string()]),
            Err(FrameError::UnknownColumn("id".to_string()))
        );
    }

    #[test]
    fn decodes_column_oriented_json() {
        let value = json!({
            "ts": ["2024-01-01T00:00:00", "2024-01-01 01:00:00", null],
            "id": ["a", "a", "a"],
            "y": [1, 2.5, null],
            "n": [1, 2, 3],
            "flag": [true, null, false]
        });
        let frame = TimeSeriesFrame::from_json_columns(&value, &["ts"]).unwrap();

        assert_eq!(frame.column_names(), vec!["ts", "id", "y", "n", "flag"]);
        assert_eq!(
            frame.column("ts").unwrap().data(),
            &ColumnData::Datetime(vec![Some(ts(1, 0)), Some(ts(1, 1)), None])
        );
        assert_eq!(
            frame.column("y").unwrap().data(),
            &ColumnData::Float(vec![Some(1.0), Some(2.5), None])
        );
        assert_eq!(
            frame.column("n").unwrap().data(),
            &ColumnData::Int(vec![Some(1), Some(2), Some(3)])
        );
        assert_eq!(frame.to_json_columns()["ts"][1], json!("2024-01-01T01:00:00"));
    }

    #[test]
    fn unparseable_timestamps_stay_strings() {
        let value = json!({ "ts": ["yesterday", "today"] });
        let frame = TimeSeriesFrame::from_json_columns(&value, &["ts"]).unwrap();
        assert!(!frame.column("ts").unwrap().data().is_datetime());
    }

    #[test]
    fn mixed_columns_are_rejected() {
        let value = json!({ "y": [1, "two"] });
        assert!(matches!(
            TimeSeriesFrame::from_json_columns(&value, &[]),
            Err(FrameError::InvalidValues { .. })
        ));
        assert_eq!(
            TimeSeriesFrame::from_json_columns(&json!([1, 2]), &[]),
            Err(FrameError::NotColumnOriented)
        );
    }

    #[test]
    fn take_repeats_rows() {
        let data = ColumnData::Str(vec![Some("a".into()), Some("b".into())]);
        assert_eq!(
            data.take(&[1, 1, 0, 5]),
            ColumnData::Str(vec![Some("b".into()), Some("b".into()), Some("a".into()), None])
        );
    }

    #[test]
    fn parses_offsets_and_dates() {
        assert_eq!(parse_timestamp("2024-01-02T03:00:00+02:00"), Some(ts(2, 1)));
        assert_eq!(parse_timestamp("2024-01-02"), Some(ts(2, 0)));
        assert_eq!(parse_timestamp("not a date"), None);
    }

    #[test]
    fn isoformat_omits_zero_fraction() {
        let with_fraction = ts(1, 0) + chrono::Duration::milliseconds(250);
        assert_eq!(isoformat(&ts(1, 0)), "2024-01-01T00:00:00");
        assert_eq!(isoformat(&with_fraction), "2024-01-01T00:00:00.250");
    }
}
