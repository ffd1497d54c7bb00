use std::path::PathBuf;

/// Errors from the generation registry.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// The build being waited on was dropped before it reported an outcome.
    #[error("build for {} was abandoned before completing", .0.display())]
    Abandoned(PathBuf),
}

/// Result alias for registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;
