use async_trait::async_trait;

use crate::error::PipelineResult;
use crate::file::SourceFile;
use crate::stage::{Filter, Prefilter};

/// Accepts every file. Default for both filter stages.
#[derive(Clone, Copy, Debug, Default)]
pub struct AcceptAll;

#[async_trait]
impl Prefilter for AcceptAll {
    async fn include(&self, _file: &SourceFile) -> PipelineResult<bool> {
        Ok(true)
    }
}

#[async_trait]
impl Filter for AcceptAll {
    async fn keep(&self, _file: &SourceFile) -> PipelineResult<bool> {
        Ok(true)
    }
}

/// Accepts files whose extension is on an allow-list.
///
/// Entries may be given with or without the leading dot. Matching is exact
/// and case-sensitive.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExtensionPrefilter {
    extensions: Vec<String>,
}

impl ExtensionPrefilter {
    pub fn new<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let extensions = extensions
            .into_iter()
            .map(|ext| {
                let ext = ext.as_ref();
                if ext.starts_with('.') {
                    ext.to_string()
                } else {
                    format!(".{ext}")
                }
            })
            .collect();
        Self { extensions }
    }

    pub fn extensions(&self) -> &[String] {
        &self.extensions
    }
}

#[async_trait]
impl Prefilter for ExtensionPrefilter {
    async fn include(&self, file: &SourceFile) -> PipelineResult<bool> {
        Ok(self.extensions.iter().any(|ext| *ext == file.extension))
    }
}
