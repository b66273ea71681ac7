use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use derive_more::{Display, From};
use once_cell::sync::Lazy;
use regex::Regex;

/// A model hosted in a remote repository, `owner/name` with an optional `@revision`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteReference {
    pub repository: String,
    pub revision: Option<String>,
}

impl RemoteReference {
    pub fn new(repository: impl Into<String>, revision: Option<String>) -> Self {
        RemoteReference {
            repository: repository.into(),
            revision,
        }
    }

    pub fn validate(raw: &str) -> bool {
        static REFERENCE_REGEX: Lazy<Regex> = Lazy::new(|| {
            Regex::new(
                r"^[a-zA-Z0-9][a-zA-Z0-9_.-]*/[a-zA-Z0-9][a-zA-Z0-9_.-]*(@[a-zA-Z0-9_./-]+)?$",
            )
            .expect("Should be able to compile remote reference regex.")
        });

        REFERENCE_REGEX.is_match(raw)
    }
}

impl FromStr for RemoteReference {
    type Err = anyhow::Error;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        if !RemoteReference::validate(raw) {
            anyhow::bail!("Invalid remote model reference: {}", raw);
        }

        Ok(match raw.split_once('@') {
            Some((repository, revision)) => {
                RemoteReference::new(repository, Some(revision.to_string()))
            }
            None => RemoteReference::new(raw, None),
        })
    }
}

impl fmt::Display for RemoteReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.revision {
            Some(revision) => write!(f, "{}@{}", self.repository, revision),
            None => write!(f, "{}", self.repository),
        }
    }
}

/// Where a model's artifacts live.
#[derive(Debug, Clone, PartialEq, Eq, Display, From)]
pub enum ModelLocation {
    #[display("{}", _0.display())]
    Local(PathBuf),
    #[display("{_0}")]
    Remote(RemoteReference),
}

impl ModelLocation {
    /// Interprets a caller-supplied model path.
    ///
    /// Relative paths are joined to `root` when one is given. An existing path is always local;
    /// otherwise an `owner/name[@revision]` string is a remote reference, and anything else stays
    /// a (missing) local path.
    pub fn parse(raw: &str, root: Option<&Path>) -> Self {
        let path = Path::new(raw);
        let candidate = match root {
            Some(root) if path.is_relative() => root.join(path),
            _ => path.to_path_buf(),
        };

        if candidate.exists() {
            return ModelLocation::Local(candidate);
        }

        match raw.parse::<RemoteReference>() {
            Ok(reference) => ModelLocation::Remote(reference),
            Err(_) => ModelLocation::Local(candidate),
        }
    }
}
