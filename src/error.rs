use std::path::PathBuf;
use thiserror::Error;

/// What the caller does with a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Recovery {
    /// Log it, treat the input as absent and keep going.
    Continue,
    /// Stop the run with a non-zero exit.
    Abort,
}

/// Failure reading one of the candidate files in an instance directory.
#[derive(Debug, Error)]
pub(crate) enum ConfigError {
    #[error("reading {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parsing {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

impl ConfigError {
    pub(crate) fn recovery(&self) -> Recovery {
        match self {
            ConfigError::Read { .. } | ConfigError::Parse { .. } => Recovery::Continue,
        }
    }
}

/// Failure while turning a classification into sources.
#[derive(Debug, Error, PartialEq, Eq)]
pub(crate) enum SynthesisError {
    #[error("unknown app type `{0}`, expected one of plain, local-helm, remote-helm, local-cdk8s")]
    UnknownAppType(String),

    #[error("remote helm chart requested for {instance} but no helmRepo/chartRepo is configured")]
    MissingChartRepo { instance: String },
}

impl SynthesisError {
    pub(crate) fn recovery(&self, strict: bool) -> Recovery {
        match self {
            SynthesisError::UnknownAppType(_) => Recovery::Abort,
            SynthesisError::MissingChartRepo { .. } if strict => Recovery::Abort,
            SynthesisError::MissingChartRepo { .. } => Recovery::Continue,
        }
    }
}
