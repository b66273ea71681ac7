//! Data-point accounting attached to every successful response.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::FrameError;
use crate::frame::TimeSeriesFrame;
use crate::schema::MetadataInput;

/// Named data-point counts. The input and output counts are always present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataPointCounts {
    pub input_data_points: u64,
    pub output_data_points: u64,
    #[serde(flatten)]
    pub extra: BTreeMap<String, u64>,
}

impl DataPointCounts {
    pub fn new(input_data_points: u64, output_data_points: u64) -> Self {
        Self {
            input_data_points,
            output_data_points,
            extra: BTreeMap::new(),
        }
    }

    /// Sets a named count. The input and output names address the typed fields.
    pub fn with(mut self, name: impl Into<String>, value: u64) -> Self {
        let name = name.into();
        match name.as_str() {
            "input_data_points" => self.input_data_points = value,
            "output_data_points" => self.output_data_points = value,
            _ => {
                self.extra.insert(name, value);
            }
        }
        self
    }

    pub fn get(&self, name: &str) -> Option<u64> {
        match name {
            "input_data_points" => Some(self.input_data_points),
            "output_data_points" => Some(self.output_data_points),
            other => self.extra.get(other).copied(),
        }
    }
}

/// Counting rule shared by forecasting model families.
///
/// Time-varying input columns are counted once per history row, static categoricals once per
/// series, and future covariates only for the rows that fall inside the produced forecast.
pub fn forecasting_data_point_counts(
    data: &TimeSeriesFrame,
    future_data: Option<&TimeSeriesFrame>,
    output_data: &TimeSeriesFrame,
    schema: &MetadataInput,
) -> Result<DataPointCounts, FrameError> {
    let implicit_columns =
        (data.num_columns() as u64).saturating_sub(schema.id_columns.len() as u64 + 1);

    let declared_ts_columns = (schema.target_columns.len()
        + schema.observable_columns.len()
        + schema.control_columns.len()
        + schema.conditional_columns.len()) as u64;
    let input_ts_columns = if declared_ts_columns == 0 {
        implicit_columns
    } else {
        declared_ts_columns
    };
    let num_targets = if schema.target_columns.is_empty() {
        implicit_columns
    } else {
        schema.target_columns.len() as u64
    };

    let unique_series = data.distinct_count(&schema.id_columns)? as u64;
    let output_rows = output_data.num_rows() as u64;

    let future_data_points = match future_data {
        Some(_) => input_ts_columns.saturating_sub(num_targets) * output_rows,
        None => 0,
    };

    let input_data_points = input_ts_columns * data.num_rows() as u64
        + schema.static_categorical_columns.len() as u64 * unique_series
        + future_data_points;

    Ok(DataPointCounts::new(input_data_points, output_rows * num_targets))
}
