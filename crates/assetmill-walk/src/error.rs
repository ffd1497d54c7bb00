use std::io;
use std::path::PathBuf;

/// Errors produced while walking source trees.
#[derive(Debug, thiserror::Error)]
pub enum WalkError {
    /// A stat or directory listing failed.
    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The path exists but is neither a regular file nor a directory.
    #[error("{} is neither a file nor a directory", .0.display())]
    NotFileOrDirectory(PathBuf),

    /// A shared walker was advanced while a previous advance was still
    /// outstanding. This is a programming error, not an I/O failure.
    #[error("walker advanced again before the previous path was returned")]
    Busy,
}

impl WalkError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Returns `true` for caller misuse rather than filesystem failure.
    pub fn is_misuse(&self) -> bool {
        matches!(self, Self::Busy)
    }
}

/// Result alias for walk operations.
pub type WalkResult<T> = Result<T, WalkError>;
