//! Model-serving adapter layer for time-series forecasting models.
//!
//! Given a model identifier and a model location, [`HandlerLoader::load`] reads the model's
//! configuration artifact and builds the handler registered for its family. The caller prepares
//! the handler and then calls `run` with historical (and, for forecasting, optional future) data.
//! Every public operation returns a [`ServiceResult`]; errors are values, never panics.
//!
//! ```no_run
//! use tsfm_inference::{HandlerFunction, HandlerLoader, HandlerRegistry, ServiceConfig};
//!
//! let loader = HandlerLoader::new(ServiceConfig::default(), HandlerRegistry::with_defaults());
//! let mut handler = loader.load("m1", "/models/m1", HandlerFunction::Inference)?;
//! handler.prepare()?;
//! # Ok::<(), tsfm_inference::ServiceError>(())
//! ```
pub mod config;
pub mod counts;
pub mod encode;
pub mod error;
pub mod families;
pub mod frame;
pub mod handler;
pub mod loader;
pub mod location;
pub mod registry;
pub mod schema;

pub use config::{HandlerConfig, ServiceConfig, resolve_family};
pub use counts::{DataPointCounts, forecasting_data_point_counts};
pub use encode::{EncodedResult, encode};
pub use error::{ConfigError, FrameError, ResolutionError, ServiceError, ServiceResult};
pub use frame::{Column, ColumnData, TimeSeriesFrame};
pub use handler::{
    ForecastingInferenceHandler, ForecastingInput, HandlerInput, InferenceHandler, InferenceInput,
    InferenceStrategy, PrepareContext, ServiceHandler,
};
pub use loader::{ArtifactSource, HandlerLoader, LocalArtifactSource};
pub use location::{ModelLocation, RemoteReference};
pub use registry::{BoxedStrategy, HandlerFunction, HandlerKey, HandlerRegistry, StrategyFactory};
pub use schema::{ForecastingParameters, MetadataInput, PredictOutput};
