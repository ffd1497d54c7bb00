use std::sync::Arc;

use async_trait::async_trait;
use tokio::fs::{self, File};

use crate::encoding::TextEncoding;
use crate::error::{PipelineError, PipelineResult};
use crate::file::SourceFile;
use crate::stage::{MapContent, Mapper, StageKind};
use crate::value::Mapped;

/// Opens the source file as a byte stream. Default map stage.
#[derive(Clone, Copy, Debug, Default)]
pub struct ReadStream;

#[async_trait]
impl Mapper for ReadStream {
    async fn map(&self, file: &SourceFile) -> PipelineResult<Mapped> {
        let is_file = match &file.metadata {
            Some(metadata) => metadata.is_file(),
            None => fs::metadata(&file.path)
                .await
                .map_err(|source| PipelineError::io(&file.path, source))?
                .is_file(),
        };
        if !is_file {
            return Err(PipelineError::stage(
                StageKind::Map,
                format!("{} is not a file", file.path.display()),
            ));
        }
        let stream = File::open(&file.path)
            .await
            .map_err(|source| PipelineError::io(&file.path, source))?;
        Ok(Mapped::Stream(Box::new(stream)))
    }
}

/// Reads the whole file as text and hands it to a [`MapContent`] stage.
#[derive(Clone)]
pub struct ContentMapper {
    inner: Arc<dyn MapContent>,
    encoding: TextEncoding,
}

impl ContentMapper {
    pub fn new(inner: Arc<dyn MapContent>, encoding: TextEncoding) -> Self {
        Self { inner, encoding }
    }
}

#[async_trait]
impl Mapper for ContentMapper {
    async fn map(&self, file: &SourceFile) -> PipelineResult<Mapped> {
        let bytes = fs::read(&file.path)
            .await
            .map_err(|source| PipelineError::io(&file.path, source))?;
        let content = self.encoding.decode(bytes)?;
        let mapped = self.inner.map_content(content, file).await?;
        Ok(Mapped::Text(mapped))
    }
}

impl std::fmt::Debug for ContentMapper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentMapper")
            .field("encoding", &self.encoding)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn read_stream_yields_file_bytes() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("a.js");
        std::fs::write(&path, "1;").unwrap();

        let mapped = ReadStream.map(&SourceFile::new(&path)).await.unwrap();
        assert!(matches!(mapped, Mapped::Stream(_)));
        assert_eq!(mapped.into_text(TextEncoding::Utf8).await.unwrap(), "1;");
    }

    #[tokio::test]
    async fn read_stream_rejects_directories() {
        let tmp = TempDir::new().unwrap();
        let err = ReadStream.map(&SourceFile::new(tmp.path())).await.unwrap_err();
        assert!(matches!(err, PipelineError::Stage { stage: StageKind::Map, .. }));
    }

    #[tokio::test]
    async fn read_stream_missing_file_is_io_error() {
        let tmp = TempDir::new().unwrap();
        let err = ReadStream
            .map(&SourceFile::new(tmp.path().join("gone.js")))
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Io { .. }));
    }

    #[tokio::test]
    async fn content_mapper_applies_function() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("a.js");
        std::fs::write(&path, "var x = 1;").unwrap();

        let wrap = |content: String, file: &SourceFile| -> PipelineResult<String> {
            Ok(format!("/* {} */\n{content}", file.extension))
        };
        let mapper = ContentMapper::new(Arc::new(wrap), TextEncoding::Utf8);
        let Mapped::Text(text) = mapper.map(&SourceFile::new(&path)).await.unwrap() else {
            panic!("content mapper must produce text");
        };
        assert_eq!(text, "/* .js */\nvar x = 1;");
    }
}
