use std::path::Path;

use crate::config::HandlerConfig;
use crate::counts::DataPointCounts;
use crate::frame::TimeSeriesFrame;
use crate::schema::MetadataInput;

/// Borrowed view of the handler identity handed to [`InferenceStrategy::prepare`].
#[derive(Debug, derive_new::new)]
pub struct PrepareContext<'a> {
    pub model_id: &'a str,
    pub model_dir: &'a Path,
    pub config: &'a HandlerConfig,
}

/// What the run pipeline needs to know about a request, whatever the handler kind.
pub trait HandlerInput {
    fn data(&self) -> &TimeSeriesFrame;
    fn schema(&self) -> &MetadataInput;
}

/// Capability interface implemented once per model family.
///
/// The dispatcher only ever holds a `Box<dyn InferenceStrategy<I>>`; it never inspects what a
/// family does inside these hooks, only the shapes going in and out.
pub trait InferenceStrategy<I>: Send {
    /// Loads weights and allocates whatever the family needs. Called at most once per handler.
    fn prepare(&mut self, ctx: &PrepareContext<'_>) -> anyhow::Result<()>;

    /// Produces the result frame for a request.
    fn execute(&mut self, input: &I) -> anyhow::Result<TimeSeriesFrame>;

    /// Counts the data points consumed by `input` and produced in `output`.
    fn count(&self, input: &I, output: &TimeSeriesFrame) -> anyhow::Result<DataPointCounts>;
}
