use std::fs::Metadata;
use std::path::PathBuf;

use assetmill_walk::path::dotted_extension;
use assetmill_walk::WalkEntry;

use crate::error::{PipelineError, PipelineResult};
use crate::value::Mapped;

/// One source file as it moves through the pipeline.
///
/// Built for every file the walker visits and dropped once reduce has
/// consumed its mapped value.
#[derive(Debug)]
pub struct SourceFile {
    pub path: PathBuf,
    /// Metadata from the walk, if already known.
    pub metadata: Option<Metadata>,
    /// Extension with its leading dot (`".js"`), or empty.
    pub extension: String,
    /// Set by the map stage.
    pub mapped: Option<Mapped>,
}

impl SourceFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            extension: dotted_extension(&path),
            path,
            metadata: None,
            mapped: None,
        }
    }

    /// Take the mapped value, leaving `None` behind.
    pub fn take_mapped(&mut self) -> PipelineResult<Mapped> {
        self.mapped.take().ok_or_else(|| {
            PipelineError::Configuration(format!(
                "{} reached reduce without a mapped value",
                self.path.display()
            ))
        })
    }
}

impl From<WalkEntry> for SourceFile {
    fn from(entry: WalkEntry) -> Self {
        Self {
            extension: dotted_extension(&entry.path),
            path: entry.path,
            metadata: Some(entry.metadata),
            mapped: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_is_dotted() {
        assert_eq!(SourceFile::new("lib/app.js").extension, ".js");
        assert_eq!(SourceFile::new("README").extension, "");
    }

    #[test]
    fn take_mapped_twice_fails() {
        let mut file = SourceFile::new("a.js");
        file.mapped = Some(Mapped::from("x"));
        assert!(file.take_mapped().is_ok());
        assert!(matches!(file.take_mapped(), Err(PipelineError::Configuration(_))));
    }
}
