use std::io;
use std::path::PathBuf;

use assetmill_walk::WalkError;

use crate::stage::StageKind;

/// Errors produced while generating an artifact.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Reading a source or writing the artifact failed.
    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Walking the source list failed.
    #[error(transparent)]
    Walk(#[from] WalkError),

    /// A configured stage reported failure.
    #[error("{stage} stage failed: {message}")]
    Stage { stage: StageKind, message: String },

    /// The stages do not fit together, e.g. a custom accumulator reached
    /// the default reduce.
    #[error("pipeline configuration error: {0}")]
    Configuration(String),

    /// Text could not be converted to or from the configured encoding.
    #[error("{encoding} encoding error: {message}")]
    Encoding {
        encoding: &'static str,
        message: String,
    },
}

impl PipelineError {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Failure reported by a custom stage.
    pub fn stage(stage: StageKind, message: impl Into<String>) -> Self {
        Self::Stage {
            stage,
            message: message.into(),
        }
    }
}

/// Result alias for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;
