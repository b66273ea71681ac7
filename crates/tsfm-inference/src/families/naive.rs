//! Last-value forecaster.
//!
//! Repeats the last observed value of every target column over the forecast horizon, per series.
//! It needs no weights, which makes it the reference family for exercising the handler lifecycle
//! end to end.

use std::collections::HashMap;
use std::iter;
use std::path::PathBuf;

use anyhow::{Context, bail, ensure};
use chrono::NaiveDateTime;

use crate::config::HandlerConfig;
use crate::counts::{DataPointCounts, forecasting_data_point_counts};
use crate::frame::{Column, ColumnData, TimeSeriesFrame};
use crate::handler::{ForecastingInput, InferenceStrategy, PrepareContext};
use crate::schema::{ForecastingParameters, MetadataInput};

pub const FAMILY: &str = "naive";

/// Horizon limit applied when the configuration artifact declares no `maximum_prediction_length`.
pub const DEFAULT_MAXIMUM_PREDICTION_LENGTH: usize = 10_000;

#[derive(Debug, Clone, Default)]
pub struct NaiveForecaster {
    minimum_context_length: Option<usize>,
    maximum_prediction_length: Option<usize>,
    multivariate_support: bool,
    model_dir: Option<PathBuf>,
}

impl NaiveForecaster {
    pub fn from_config(config: &HandlerConfig) -> Self {
        Self {
            minimum_context_length: config.minimum_context_length,
            maximum_prediction_length: config.maximum_prediction_length,
            multivariate_support: config.multivariate_support,
            model_dir: None,
        }
    }

    fn horizon(&self, parameters: &ForecastingParameters) -> anyhow::Result<usize> {
        let horizon = parameters
            .prediction_length
            .or(self.maximum_prediction_length)
            .context(
                "No prediction_length given and the model declares no maximum_prediction_length",
            )?;

        let maximum = self
            .maximum_prediction_length
            .unwrap_or(DEFAULT_MAXIMUM_PREDICTION_LENGTH);
        ensure!(horizon > 0, "prediction_length must be positive");
        ensure!(
            horizon <= maximum,
            "prediction_length {horizon} exceeds the model maximum of {maximum}"
        );
        Ok(horizon)
    }

    fn validate(&self, input: &ForecastingInput) -> anyhow::Result<()> {
        let schema = &input.schema;
        for name in schema.declared_columns() {
            input.data.require_column(name)?;
        }
        ensure!(
            !schema.target_columns.is_empty(),
            "At least one target column is required"
        );
        ensure!(
            self.multivariate_support || schema.target_columns.len() == 1,
            "Model does not support multivariate forecasting ({} targets given)",
            schema.target_columns.len()
        );

        if let Some(future) = &input.future_data {
            for name in schema.timestamp_column.iter().chain(&schema.id_columns) {
                future
                    .require_column(name)
                    .context("future_data must carry the timestamp and id columns")?;
            }
        }
        Ok(())
    }
}

fn series_key(frame: &TimeSeriesFrame, id_columns: &[String], row: usize) -> Vec<String> {
    id_columns
        .iter()
        .map(|name| {
            frame
                .column(name)
                .map_or_else(String::new, |c| c.data().value(row).to_string())
        })
        .collect()
}

fn timestamps_of<'a>(
    frame: &'a TimeSeriesFrame,
    name: &str,
) -> anyhow::Result<&'a [Option<NaiveDateTime>]> {
    frame
        .require_column(name)?
        .data()
        .as_datetime()
        .with_context(|| format!("Timestamp column '{name}' must hold datetime values"))
}

/// Forecast timestamps: future rows after the last observation first, then extrapolation using
/// the last observed sampling interval.
fn forecast_timestamps(
    history: &[NaiveDateTime],
    future: &[NaiveDateTime],
    horizon: usize,
) -> anyhow::Result<Vec<NaiveDateTime>> {
    let last = *history.last().context("Series has no observed timestamps")?;

    let mut steps: Vec<NaiveDateTime> = future
        .iter()
        .filter(|ts| **ts > last)
        .take(horizon)
        .copied()
        .collect();

    if steps.len() < horizon {
        let [.., previous, _] = history else {
            bail!("Cannot infer the sampling interval from a single observation");
        };
        let interval = last - *previous;
        ensure!(
            interval > chrono::Duration::zero(),
            "Timestamps must be strictly increasing within a series"
        );

        let mut current = steps.last().copied().unwrap_or(last);
        while steps.len() < horizon {
            current += interval;
            steps.push(current);
        }
    }
    Ok(steps)
}

impl InferenceStrategy<ForecastingInput> for NaiveForecaster {
    fn prepare(&mut self, ctx: &PrepareContext<'_>) -> anyhow::Result<()> {
        ensure!(
            ctx.model_dir.is_dir(),
            "Model directory '{}' is not available",
            ctx.model_dir.display()
        );
        self.model_dir = Some(ctx.model_dir.to_path_buf());
        Ok(())
    }

    fn execute(&mut self, input: &ForecastingInput) -> anyhow::Result<TimeSeriesFrame> {
        self.validate(input)?;

        let MetadataInput {
            timestamp_column,
            id_columns,
            target_columns,
            ..
        } = &input.schema;
        let timestamp_column = timestamp_column
            .as_deref()
            .context("A timestamp column is required for forecasting")?;
        let horizon = self.horizon(&input.parameters)?;
        let data = &input.data;
        let observed = timestamps_of(data, timestamp_column)?;

        let mut future_by_series: HashMap<Vec<String>, Vec<NaiveDateTime>> = HashMap::new();
        if let Some(future) = &input.future_data {
            let future_ts = timestamps_of(future, timestamp_column)?;
            for (row, ts) in future_ts.iter().enumerate() {
                if let Some(ts) = ts {
                    future_by_series
                        .entry(series_key(future, id_columns, row))
                        .or_default()
                        .push(*ts);
                }
            }
        }

        let mut forecast_ts = Vec::new();
        let mut id_rows = Vec::new();
        let mut target_rows = vec![Vec::new(); target_columns.len()];

        for rows in data.group_rows(id_columns)? {
            let history: Vec<NaiveDateTime> = rows.iter().filter_map(|&r| observed[r]).collect();
            if let Some(minimum) = self.minimum_context_length {
                ensure!(
                    history.len() >= minimum,
                    "Series has {} observations, the model needs at least {minimum}",
                    history.len()
                );
            }

            let last_row = *rows.last().context("Empty series group")?;
            let key = series_key(data, id_columns, last_row);
            let future = future_by_series.get(&key).map_or(&[][..], Vec::as_slice);
            let steps = forecast_timestamps(&history, future, horizon)?;
            forecast_ts.extend(steps.into_iter().map(Some));
            id_rows.extend(iter::repeat_n(last_row, horizon));

            for (target, taken) in target_columns.iter().zip(target_rows.iter_mut()) {
                let column = data.require_column(target)?.data();
                let source = rows
                    .iter()
                    .rev()
                    .find(|&&r| !column.is_null(r))
                    .copied()
                    .unwrap_or(last_row);
                taken.extend(iter::repeat_n(source, horizon));
            }
        }

        let mut columns = vec![Column::new(
            timestamp_column,
            ColumnData::Datetime(forecast_ts),
        )];
        for name in id_columns {
            let ids = data.require_column(name)?.data().take(&id_rows);
            columns.push(Column::new(name.clone(), ids));
        }
        for (name, rows) in target_columns.iter().zip(&target_rows) {
            let values = data.require_column(name)?.data().take(rows);
            columns.push(Column::new(name.clone(), values));
        }
        Ok(TimeSeriesFrame::new(columns)?)
    }

    fn count(
        &self,
        input: &ForecastingInput,
        output: &TimeSeriesFrame,
    ) -> anyhow::Result<DataPointCounts> {
        Ok(forecasting_data_point_counts(
            &input.data,
            input.future_data.as_ref(),
            output,
            &input.schema,
        )?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    fn hour(h: i64) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
            + Duration::hours(h)
    }

    fn forecaster(config: HandlerConfig) -> NaiveForecaster {
        NaiveForecaster::from_config(&config)
    }

    fn two_series() -> TimeSeriesFrame {
        TimeSeriesFrame::new(vec![
            Column::datetime("ts", vec![hour(0), hour(0), hour(1), hour(1)]),
            Column::string("id", vec!["a", "b", "a", "b"]),
            Column::new(
                "y",
                ColumnData::Float(vec![Some(1.0), Some(10.0), Some(2.0), None]),
            ),
        ])
        .unwrap()
    }

    fn input(data: TimeSeriesFrame, prediction_length: usize) -> ForecastingInput {
        ForecastingInput {
            data,
            future_data: None,
            schema: MetadataInput::new("ts")
                .with_id_columns(["id"])
                .with_target_columns(["y"]),
            parameters: ForecastingParameters::with_prediction_length(prediction_length),
        }
    }

    #[test]
    fn repeats_last_observed_value_per_series() {
        let output = forecaster(HandlerConfig::default())
            .execute(&input(two_series(), 2))
            .unwrap();

        assert_eq!(output.column_names(), vec!["ts", "id", "y"]);
        assert_eq!(
            output.column("ts").unwrap().data(),
            &ColumnData::Datetime(vec![Some(hour(2)), Some(hour(3)), Some(hour(2)), Some(hour(3))])
        );
        assert_eq!(
            output.column("y").unwrap().data(),
            &ColumnData::Float(vec![Some(2.0), Some(2.0), Some(10.0), Some(10.0)])
        );
    }

    #[test]
    fn prefers_future_timestamps() {
        let mut request = input(two_series(), 2);
        request.future_data = Some(
            TimeSeriesFrame::new(vec![
                Column::datetime("ts", vec![hour(5), hour(9)]),
                Column::string("id", vec!["a", "a"]),
            ])
            .unwrap(),
        );

        let output = forecaster(HandlerConfig::default())
            .execute(&request)
            .unwrap();
        let ts = output.column("ts").unwrap().data().as_datetime().unwrap();
        assert_eq!(&ts[..2], &[Some(hour(5)), Some(hour(9))]);
        assert_eq!(&ts[2..], &[Some(hour(2)), Some(hour(3))]);
    }

    #[test]
    fn falls_back_to_configured_maximum_horizon() {
        let config = HandlerConfig {
            maximum_prediction_length: Some(3),
            ..Default::default()
        };
        let mut request = input(two_series(), 1);
        request.parameters = ForecastingParameters::default();

        let output = forecaster(config).execute(&request).unwrap();
        assert_eq!(output.num_rows(), 6);
    }

    #[test]
    fn rejects_horizon_above_maximum() {
        let config = HandlerConfig {
            maximum_prediction_length: Some(3),
            ..Default::default()
        };
        assert!(forecaster(config).execute(&input(two_series(), 4)).is_err());
    }

    #[test]
    fn unbounded_model_still_caps_the_horizon() {
        let model = forecaster(HandlerConfig::default());
        let err = model
            .clone()
            .execute(&input(two_series(), usize::MAX))
            .unwrap_err();
        assert!(err.to_string().contains("exceeds the model maximum"));

        let output = model
            .clone()
            .execute(&input(two_series(), DEFAULT_MAXIMUM_PREDICTION_LENGTH))
            .unwrap();
        assert_eq!(output.num_rows(), 2 * DEFAULT_MAXIMUM_PREDICTION_LENGTH);
    }

    #[test]
    fn future_data_without_id_columns_is_rejected() {
        let mut request = input(two_series(), 2);
        request.future_data = Some(
            TimeSeriesFrame::new(vec![Column::datetime("ts", vec![hour(7), hour(9)])]).unwrap(),
        );

        let err = forecaster(HandlerConfig::default())
            .execute(&request)
            .unwrap_err();
        assert!(format!("{err:#}").contains("Column 'id' not found"));
    }

    #[test]
    fn rejects_short_history() {
        let config = HandlerConfig {
            minimum_context_length: Some(3),
            ..Default::default()
        };
        assert!(forecaster(config).execute(&input(two_series(), 1)).is_err());
    }

    #[test]
    fn rejects_missing_schema_columns() {
        let mut request = input(two_series(), 1);
        request.schema.control_columns = vec!["temperature".to_string()];
        let err = forecaster(HandlerConfig::default())
            .execute(&request)
            .unwrap_err();
        assert!(err.to_string().contains("temperature"));
    }

    #[test]
    fn rejects_multivariate_when_unsupported() {
        let config = HandlerConfig {
            multivariate_support: false,
            ..Default::default()
        };
        let mut request = input(two_series(), 1);
        request.schema.target_columns = vec!["y".to_string(), "id".to_string()];
        assert!(forecaster(config).execute(&request).is_err());
    }

    #[test]
    fn single_observation_cannot_be_extrapolated() {
        assert!(forecast_timestamps(&[hour(0)], &[], 1).is_err());
        assert_eq!(
            forecast_timestamps(&[hour(0)], &[hour(4)], 1).unwrap(),
            vec![hour(4)]
        );
    }
}
