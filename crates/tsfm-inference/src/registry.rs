use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::config::{HandlerConfig, resolve_family};
use crate::error::ResolutionError;
use crate::families;
use crate::handler::{ForecastingInput, InferenceStrategy};

/// The service capability a handler is requested for.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum HandlerFunction {
    Inference,
}

/// Registry key: a model family tag paired with a capability.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct HandlerKey {
    pub family: String,
    pub function: HandlerFunction,
}

impl std::fmt::Display for HandlerKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.family, self.function)
    }
}

pub type BoxedStrategy<I> = Box<dyn InferenceStrategy<I>>;

pub type StrategyFactory<I> =
    Box<dyn Fn(&HandlerConfig) -> anyhow::Result<BoxedStrategy<I>> + Send + Sync>;

/// Maps `(family, capability)` to the factory building that family's strategy.
///
/// Populated at startup; `load` only ever looks up the key derived from the configuration
/// artifact, it never guesses between families.
pub struct HandlerRegistry<I> {
    factories: HashMap<HandlerKey, StrategyFactory<I>>,
}

impl<I> Default for HandlerRegistry<I> {
    fn default() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }
}

impl<I: 'static> HandlerRegistry<I> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(
        &mut self,
        family: impl Into<String>,
        function: HandlerFunction,
        factory: F,
    ) -> &mut Self
    where
        F: Fn(&HandlerConfig) -> anyhow::Result<BoxedStrategy<I>> + Send + Sync + 'static,
    {
        let key = HandlerKey {
            family: family.into().trim().to_lowercase(),
            function,
        };

        log::debug!("Registering handler factory for {key}");

        if self.factories.insert(key.clone(), Box::new(factory)).is_some() {
            log::warn!("Handler factory for {key} replaced an existing registration");
        }
        self
    }

    pub fn inference<F>(&mut self, family: impl Into<String>, factory: F) -> &mut Self
    where
        F: Fn(&HandlerConfig) -> anyhow::Result<BoxedStrategy<I>> + Send + Sync + 'static,
    {
        self.register(family, HandlerFunction::Inference, factory)
    }

    /// Lists all registered keys.
    pub fn keys(&self) -> Vec<HandlerKey> {
        let mut keys: Vec<_> = self.factories.keys().cloned().collect();
        keys.sort_by(|a, b| a.to_string().cmp(&b.to_string()));
        keys
    }

    pub fn contains(&self, family: &str, function: HandlerFunction) -> bool {
        self.factories.contains_key(&HandlerKey {
            family: family.trim().to_lowercase(),
            function,
        })
    }

    /// Builds the strategy registered for the artifact's family and the requested capability.
    ///
    /// Returns the resolved family tag alongside the unprepared strategy.
    pub fn resolve(
        &self,
        config: &HandlerConfig,
        function: HandlerFunction,
    ) -> Result<(String, BoxedStrategy<I>), ResolutionError> {
        let family = resolve_family(config)?;

        if !config.supports(function) {
            return Err(ResolutionError::CapabilityNotDeclared { family, function });
        }

        let key = HandlerKey {
            family: family.clone(),
            function,
        };
        let factory = self.factories.get(&key).ok_or_else(|| {
            log::error!("No handler registered for {key}");
            ResolutionError::HandlerNotFound {
                family: family.clone(),
                function,
            }
        })?;

        log::debug!("Resolved handler for {key}");

        let strategy = factory(config).map_err(|cause| ResolutionError::Factory {
            family: family.clone(),
            cause,
        })?;
        Ok((family, strategy))
    }
}

impl HandlerRegistry<ForecastingInput> {
    /// A forecasting registry with the built-in model families.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        families::register_defaults(&mut registry);
        registry
    }
}
