//! Built-in model families.
pub mod naive;

use crate::handler::{ForecastingInput, InferenceStrategy};
use crate::registry::HandlerRegistry;

pub fn register_defaults(registry: &mut HandlerRegistry<ForecastingInput>) {
    registry.inference(naive::FAMILY, |config| {
        Ok(Box::new(naive::NaiveForecaster::from_config(config))
            as Box<dyn InferenceStrategy<ForecastingInput>>)
    });
}
