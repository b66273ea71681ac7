use std::path::PathBuf;

use crate::config::{HandlerConfig, ServiceConfig};
use crate::error::{ResolutionError, ServiceResult};
use crate::handler::{HandlerInput, ServiceHandler};
use crate::location::ModelLocation;
use crate::registry::{HandlerFunction, HandlerRegistry};

/// Turns a [`ModelLocation`] into a local directory holding the model artifacts.
pub trait ArtifactSource: Send + Sync {
    fn name(&self) -> &str;
    fn supports(&self, location: &ModelLocation) -> bool;
    fn materialize(&self, location: &ModelLocation) -> anyhow::Result<PathBuf>;
}

/// Serves model directories already present on the local filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalArtifactSource;

impl ArtifactSource for LocalArtifactSource {
    fn name(&self) -> &str {
        "local"
    }

    fn supports(&self, location: &ModelLocation) -> bool {
        matches!(location, ModelLocation::Local(_))
    }

    fn materialize(&self, location: &ModelLocation) -> anyhow::Result<PathBuf> {
        match location {
            ModelLocation::Local(path) if path.is_dir() => Ok(path.clone()),
            ModelLocation::Local(path) => {
                anyhow::bail!("'{}' is not a model directory", path.display())
            }
            ModelLocation::Remote(reference) => {
                anyhow::bail!("'{reference}' is not a local model directory")
            }
        }
    }
}

/// Resolves model paths into unprepared handlers.
///
/// Loading reads only the configuration artifact; weights are left to [`ServiceHandler::prepare`].
pub struct HandlerLoader<I> {
    config: ServiceConfig,
    registry: HandlerRegistry<I>,
    sources: Vec<Box<dyn ArtifactSource>>,
}

impl<I: HandlerInput + 'static> HandlerLoader<I> {
    pub fn new(config: ServiceConfig, registry: HandlerRegistry<I>) -> Self {
        Self {
            config,
            registry,
            sources: vec![Box::new(LocalArtifactSource)],
        }
    }

    /// Adds a source consulted after the ones already registered.
    pub fn with_source(mut self, source: impl ArtifactSource + 'static) -> Self {
        self.sources.push(Box::new(source));
        self
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    pub fn registry(&self) -> &HandlerRegistry<I> {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut HandlerRegistry<I> {
        &mut self.registry
    }

    pub fn locate(&self, model_path: &str) -> ModelLocation {
        ModelLocation::parse(model_path, self.config.model_root.as_deref())
    }

    /// Materializes the model directory and reads its configuration artifact.
    pub fn read_config(
        &self,
        location: &ModelLocation,
    ) -> Result<(PathBuf, HandlerConfig), ResolutionError> {
        if let ModelLocation::Local(path) = location {
            if !path.exists() {
                return Err(ResolutionError::PathNotFound(path.clone()));
            }
        }

        let source = self
            .sources
            .iter()
            .find(|source| source.supports(location))
            .ok_or_else(|| ResolutionError::UnsupportedLocation(location.to_string()))?;

        let model_dir = source
            .materialize(location)
            .map_err(|cause| ResolutionError::Source {
                source_name: source.name().to_string(),
                location: location.to_string(),
                cause,
            })?;

        let config_path = model_dir.join(&self.config.config_file_name);
        if !config_path.is_file() {
            return Err(ResolutionError::ConfigMissing {
                dir: model_dir,
                file: self.config.config_file_name.clone(),
            });
        }

        let config = HandlerConfig::from_file(&config_path).map_err(|cause| {
            ResolutionError::ConfigMalformed {
                path: config_path.clone(),
                cause,
            }
        })?;

        Ok((model_dir, config))
    }

    /// Resolves the handler registered for the model at `model_path` and `function`.
    pub fn load(
        &self,
        model_id: impl Into<String>,
        model_path: &str,
        function: HandlerFunction,
    ) -> ServiceResult<ServiceHandler<I>> {
        let model_id = model_id.into();
        let location = self.locate(model_path);

        log::debug!("Loading '{function}' handler for model '{model_id}' from {location}");

        let resolved = self
            .read_config(&location)
            .and_then(|(model_dir, config)| {
                let (family, strategy) = self.registry.resolve(&config, function)?;
                Ok((model_dir, config, family, strategy))
            })
            .inspect_err(|e| log::error!("Failed to load model '{model_id}': {e}"))?;

        let (model_dir, config, family, strategy) = resolved;
        log::info!("Loaded '{family}' {function} handler for model '{model_id}'");

        Ok(ServiceHandler::new(
            model_id, location, model_dir, family, config, strategy,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ServiceError;
    use crate::handler::ForecastingInput;
    use std::fs;

    fn loader() -> HandlerLoader<ForecastingInput> {
        HandlerLoader::new(ServiceConfig::default(), HandlerRegistry::with_defaults())
    }

    fn model_dir(config: &str) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("tsfm_config.json"), config).unwrap();
        dir
    }

    #[test]
    fn missing_path_fails_resolution() {
        let result = loader().load("m1", "/models/m1", HandlerFunction::Inference);
        assert!(matches!(
            result,
            Err(ServiceError::Resolution(ResolutionError::PathNotFound(_)))
        ));
    }

    #[test]
    fn directory_without_artifact_fails_resolution() {
        let dir = tempfile::tempdir().unwrap();
        let result = loader().load(
            "m1",
            dir.path().to_str().unwrap(),
            HandlerFunction::Inference,
        );
        assert!(matches!(
            result,
            Err(ServiceError::Resolution(ResolutionError::ConfigMissing { .. }))
        ));
    }

    #[test]
    fn malformed_artifact_fails_resolution() {
        let dir = model_dir("{ not json");
        let result = loader().load(
            "m1",
            dir.path().to_str().unwrap(),
            HandlerFunction::Inference,
        );
        assert!(matches!(
            result,
            Err(ServiceError::Resolution(ResolutionError::ConfigMalformed { .. }))
        ));
    }

    #[test]
    fn remote_reference_without_source_is_unsupported() {
        let result = loader().load(
            "ttm",
            "ibm-granite/granite-timeseries-ttm-r2",
            HandlerFunction::Inference,
        );
        assert!(matches!(
            result,
            Err(ServiceError::Resolution(ResolutionError::UnsupportedLocation(_)))
        ));
    }

    #[test]
    fn remote_reference_uses_registered_source() {
        struct Mirror(PathBuf);

        impl ArtifactSource for Mirror {
            fn name(&self) -> &str {
                "mirror"
            }

            fn supports(&self, location: &ModelLocation) -> bool {
                matches!(location, ModelLocation::Remote(_))
            }

            fn materialize(&self, _location: &ModelLocation) -> anyhow::Result<PathBuf> {
                Ok(self.0.clone())
            }
        }

        let dir = model_dir(r#"{"model_type": "naive"}"#);
        let handler = loader()
            .with_source(Mirror(dir.path().to_path_buf()))
            .load("ttm", "org/naive-model@main", HandlerFunction::Inference)
            .unwrap();

        assert_eq!(handler.family(), "naive");
        assert!(matches!(handler.location(), ModelLocation::Remote(_)));
        assert_eq!(handler.model_dir(), dir.path());
    }

    #[test]
    fn loads_unprepared_handler() {
        let dir = model_dir(r#"{"model_type": "naive", "maximum_prediction_length": 24}"#);
        let handler = loader()
            .load("m1", dir.path().to_str().unwrap(), HandlerFunction::Inference)
            .unwrap();

        assert_eq!(handler.model_id(), "m1");
        assert!(!handler.is_prepared());
        assert_eq!(handler.config().maximum_prediction_length, Some(24));
    }

    #[test]
    fn custom_artifact_name_and_model_root() {
        let root = tempfile::tempdir().unwrap();
        fs::create_dir_all(root.path().join("naive")).unwrap();
        fs::write(
            root.path().join("naive/service.json"),
            r#"{"model_family": "naive"}"#,
        )
        .unwrap();

        let config = ServiceConfig {
            config_file_name: "service.json".to_string(),
            model_root: Some(root.path().to_path_buf()),
        };
        let loader = HandlerLoader::new(config, HandlerRegistry::with_defaults());
        let handler = loader
            .load("m1", "naive", HandlerFunction::Inference)
            .unwrap();
        assert_eq!(handler.model_dir(), root.path().join("naive"));
    }
}
