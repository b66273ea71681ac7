//! Handler lifecycle and run pipeline.
//!
//! A handler is obtained from [`crate::HandlerLoader::load`] in the unprepared state, moved to the
//! prepared state with [`ServiceHandler::prepare`], and then serves `run` calls:
//! 1. the family strategy executes the request and produces a result frame,
//! 2. the strategy counts the data points of the request and of the result,
//! 3. the result frame is encoded column-wise,
//! 4. everything is wrapped into a [`crate::PredictOutput`].
//!
//! Every failure, including a panic inside family code, is returned as a [`crate::ServiceError`].
mod base;
mod forecasting;
mod inference;
mod strategy;


pub use base::ServiceHandler;
pub use forecasting::{ForecastingInferenceHandler, ForecastingInput};
pub use inference::{InferenceHandler, InferenceInput};
pub use strategy::{HandlerInput, InferenceStrategy, PrepareContext};
