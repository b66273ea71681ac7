use chrono::{SecondsFormat, Utc};

use super::base::{ServiceHandler, isolate};
use super::strategy::HandlerInput;
use crate::encode::encode;
use crate::error::{ServiceError, ServiceResult};
use crate::frame::TimeSeriesFrame;
use crate::schema::{MetadataInput, PredictOutput};

/// Request of a plain inference handler. Parameters are opaque to the dispatcher.
#[derive(Debug, Clone, Default)]
pub struct InferenceInput {
    pub data: TimeSeriesFrame,
    pub schema: MetadataInput,
    pub parameters: serde_json::Value,
}

impl HandlerInput for InferenceInput {
    fn data(&self) -> &TimeSeriesFrame {
        &self.data
    }

    fn schema(&self) -> &MetadataInput {
        &self.schema
    }
}

pub type InferenceHandler = ServiceHandler<InferenceInput>;

impl<I: HandlerInput + 'static> ServiceHandler<I> {
    /// Executes one request: execute, count, encode, wrap.
    ///
    /// Fails with [`ServiceError::NotPrepared`] before touching family code when the handler has
    /// not been prepared.
    pub fn run_input(&mut self, input: &I) -> ServiceResult<PredictOutput> {
        if !self.is_prepared() {
            log::error!(
                "Run requested on unprepared handler for model '{}'",
                self.model_id()
            );
            return Err(ServiceError::NotPrepared);
        }

        log::debug!(
            "Running model '{}' on {} history rows",
            self.model_id(),
            input.data().num_rows()
        );

        self.execute_pipeline(input).inspect_err(|e| {
            log::error!("Inference for model '{}' failed: {e}", self.model_id());
        })
    }

    fn execute_pipeline(&mut self, input: &I) -> ServiceResult<PredictOutput> {
        let strategy = &mut self.strategy;
        let mut result = isolate(|| strategy.execute(input), ServiceError::Execution)?;
        let counts = isolate(|| strategy.count(input, &result), ServiceError::Execution)?;
        let encoded = encode(&mut result, input.schema().timestamp_column.as_deref());

        Ok(PredictOutput {
            model_id: self.model_id().to_string(),
            created_at: Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true),
            results: vec![encoded],
            counts,
        })
    }
}

impl ServiceHandler<InferenceInput> {
    pub fn run(
        &mut self,
        data: TimeSeriesFrame,
        schema: Option<MetadataInput>,
        parameters: Option<serde_json::Value>,
    ) -> ServiceResult<PredictOutput> {
        let input = InferenceInput {
            data,
            schema: schema.unwrap_or_default(),
            parameters: parameters.unwrap_or_default(),
        };
        self.run_input(&input)
    }
}
