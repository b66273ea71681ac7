use super::base::ServiceHandler;
use super::strategy::HandlerInput;
use crate::error::ServiceResult;
use crate::frame::TimeSeriesFrame;
use crate::schema::{ForecastingParameters, MetadataInput, PredictOutput};

/// Request of a forecasting handler.
///
/// `future_data` carries covariates known over the forecast horizon; `None` means no exogenous
/// future information is available, which is not an error.
#[derive(Debug, Clone, Default)]
pub struct ForecastingInput {
    pub data: TimeSeriesFrame,
    pub future_data: Option<TimeSeriesFrame>,
    pub schema: MetadataInput,
    pub parameters: ForecastingParameters,
}

impl HandlerInput for ForecastingInput {
    fn data(&self) -> &TimeSeriesFrame {
        &self.data
    }

    fn schema(&self) -> &MetadataInput {
        &self.schema
    }
}

pub type ForecastingInferenceHandler = ServiceHandler<ForecastingInput>;

impl ServiceHandler<ForecastingInput> {
    pub fn run(
        &mut self,
        data: TimeSeriesFrame,
        future_data: Option<TimeSeriesFrame>,
        schema: Option<MetadataInput>,
        parameters: Option<ForecastingParameters>,
    ) -> ServiceResult<PredictOutput> {
        let input = ForecastingInput {
            data,
            future_data,
            schema: schema.unwrap_or_default(),
            parameters: parameters.unwrap_or_default(),
        };
        self.run_input(&input)
    }
}
