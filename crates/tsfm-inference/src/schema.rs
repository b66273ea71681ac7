//! Request and response payloads.

use serde::{Deserialize, Serialize};

use crate::counts::DataPointCounts;
use crate::encode::EncodedResult;

/// Declares which columns of the request frames play which role.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetadataInput {
    pub timestamp_column: Option<String>,
    pub id_columns: Vec<String>,
    pub target_columns: Vec<String>,
    pub observable_columns: Vec<String>,
    pub control_columns: Vec<String>,
    pub conditional_columns: Vec<String>,
    pub static_categorical_columns: Vec<String>,
    pub freq: Option<String>,
}

impl MetadataInput {
    pub fn new(timestamp_column: impl Into<String>) -> Self {
        Self {
            timestamp_column: Some(timestamp_column.into()),
            ..Default::default()
        }
    }

    pub fn with_id_columns<S: Into<String>>(
        mut self,
        columns: impl IntoIterator<Item = S>,
    ) -> Self {
        self.id_columns = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_target_columns<S: Into<String>>(
        mut self,
        columns: impl IntoIterator<Item = S>,
    ) -> Self {
        self.target_columns = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_control_columns<S: Into<String>>(
        mut self,
        columns: impl IntoIterator<Item = S>,
    ) -> Self {
        self.control_columns = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Every column name the schema refers to, timestamp first.
    pub fn declared_columns(&self) -> impl Iterator<Item = &str> {
        self.timestamp_column
            .iter()
            .chain(&self.id_columns)
            .chain(&self.target_columns)
            .chain(&self.observable_columns)
            .chain(&self.control_columns)
            .chain(&self.conditional_columns)
            .chain(&self.static_categorical_columns)
            .map(String::as_str)
    }
}

/// Forecasting knobs. Only the horizon is typed; family-specific settings travel untouched in
/// [`ForecastingParameters::extra`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastingParameters {
    pub prediction_length: Option<usize>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl ForecastingParameters {
    pub fn with_prediction_length(prediction_length: usize) -> Self {
        Self {
            prediction_length: Some(prediction_length),
            ..Default::default()
        }
    }

    pub fn get(&self, name: &str) -> Option<&serde_json::Value> {
        self.extra.get(name)
    }
}

/// Successful response of a `run` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictOutput {
    pub model_id: String,
    pub created_at: String,
    /// Always exactly one encoded result per invocation.
    pub results: Vec<EncodedResult>,
    #[serde(flatten)]
    pub counts: DataPointCounts,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn metadata_defaults_missing_roles() {
        let schema: MetadataInput =
            serde_json::from_value(json!({ "timestamp_column": "ts", "target_columns": ["y"] }))
                .unwrap();

        assert_eq!(schema.timestamp_column.as_deref(), Some("ts"));
        assert!(schema.id_columns.is_empty());
        assert_eq!(schema.declared_columns().collect::<Vec<_>>(), vec!["ts", "y"]);
    }

    #[test]
    fn forecasting_parameters_keep_family_settings() {
        let raw = json!({ "prediction_length": 4, "num_samples": 20, "quantiles": [0.1, 0.9] });
        let parameters: ForecastingParameters = serde_json::from_value(raw.clone()).unwrap();

        assert_eq!(parameters.prediction_length, Some(4));
        assert_eq!(parameters.get("num_samples"), Some(&json!(20)));
        assert_eq!(serde_json::to_value(&parameters).unwrap(), raw);
    }

    #[test]
    fn predict_output_flattens_counts() {
        let mut result = EncodedResult::new();
        result.insert("y".to_string(), json!([1.0, 2.0]));
        let output = PredictOutput {
            model_id: "m1".to_string(),
            created_at: "2024-01-01T00:00:00Z".to_string(),
            results: vec![result],
            counts: DataPointCounts::new(100, 10).with("future_data_points", 0),
        };

        let wire = serde_json::to_value(&output).unwrap();
        assert_eq!(
            wire,
            json!({
                "model_id": "m1",
                "created_at": "2024-01-01T00:00:00Z",
                "results": [{ "y": [1.0, 2.0] }],
                "input_data_points": 100,
                "output_data_points": 10,
                "future_data_points": 0
            })
        );

        let back: PredictOutput = serde_json::from_value(wire).unwrap();
        assert_eq!(back, output);
    }
}
