use std::io;
use std::path::PathBuf;

use assetmill_pipeline::PipelineError;
use assetmill_registry::RegistryError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    #[error("artifact path {} exists but is not a file", .0.display())]
    NotAFile(PathBuf),

    #[error(
        "destination {} escapes output root {}",
        destination.display(),
        root.display()
    )]
    SandboxViolation { destination: PathBuf, root: PathBuf },

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("source resolution failed: {0}")]
    Source(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("http error: {0}")]
    Http(#[from] axum::http::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl AssetError {
    /// I/O failure at `path`.
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type AssetResult<T> = Result<T, AssetError>;
