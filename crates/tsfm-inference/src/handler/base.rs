use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};

use super::strategy::{HandlerInput, InferenceStrategy, PrepareContext};
use crate::config::HandlerConfig;
use crate::error::{ServiceError, ServiceResult};
use crate::loader::HandlerLoader;
use crate::location::ModelLocation;
use crate::registry::HandlerFunction;

/// A loaded model handler: identity, resolved configuration and the family strategy.
///
/// Owned exclusively by the caller that loaded it. `run` takes `&mut self`, so sharing one handler
/// between threads requires the caller's own synchronisation.
pub struct ServiceHandler<I> {
    model_id: String,
    location: ModelLocation,
    model_dir: PathBuf,
    family: String,
    config: HandlerConfig,
    prepared: bool,
    pub(super) strategy: Box<dyn InferenceStrategy<I>>,
}

impl<I> std::fmt::Debug for ServiceHandler<I> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceHandler")
            .field("model_id", &self.model_id)
            .field("location", &self.location)
            .field("family", &self.family)
            .field("prepared", &self.prepared)
            .finish_non_exhaustive()
    }
}

impl<I: HandlerInput + 'static> ServiceHandler<I> {
    pub(crate) fn new(
        model_id: String,
        location: ModelLocation,
        model_dir: PathBuf,
        family: String,
        config: HandlerConfig,
        strategy: Box<dyn InferenceStrategy<I>>,
    ) -> Self {
        Self {
            model_id,
            location,
            model_dir,
            family,
            config,
            prepared: false,
            strategy,
        }
    }

    /// Resolves the handler for `model_path` without loading any weights.
    pub fn load(
        model_id: impl Into<String>,
        model_path: &str,
        handler_function: HandlerFunction,
        loader: &HandlerLoader<I>,
    ) -> ServiceResult<Self> {
        loader.load(model_id, model_path, handler_function)
    }

    /// Runs the family preparation hook. A prepared handler stays prepared; calling this again is
    /// a no-op.
    pub fn prepare(&mut self) -> ServiceResult<()> {
        if self.prepared {
            log::debug!("Handler for model '{}' is already prepared", self.model_id);
            return Ok(());
        }

        let ctx = PrepareContext::new(&self.model_id, &self.model_dir, &self.config);
        let strategy = &mut self.strategy;
        isolate(|| strategy.prepare(&ctx), ServiceError::Preparation).inspect_err(|e| {
            log::error!("Failed to prepare model '{}': {e}", self.model_id);
        })?;

        self.prepared = true;
        log::info!(
            "Prepared '{}' handler for model '{}'",
            self.family,
            self.model_id
        );
        Ok(())
    }

    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    pub fn location(&self) -> &ModelLocation {
        &self.location
    }

    pub fn model_dir(&self) -> &Path {
        &self.model_dir
    }

    pub fn family(&self) -> &str {
        &self.family
    }

    pub fn config(&self) -> &HandlerConfig {
        &self.config
    }

    pub fn is_prepared(&self) -> bool {
        self.prepared
    }
}

/// Runs family code, turning both returned errors and panics into a [`ServiceError`].
pub(super) fn isolate<T>(
    f: impl FnOnce() -> anyhow::Result<T>,
    on_error: fn(anyhow::Error) -> ServiceError,
) -> ServiceResult<T> {
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(on_error(e)),
        Err(payload) => Err(ServiceError::Panicked(panic_message(payload.as_ref()))),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
