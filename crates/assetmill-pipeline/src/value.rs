use std::any::Any;
use std::fmt;
use std::path::{Path, PathBuf};

use tokio::fs::File;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt, BufWriter};
use tracing::debug;

use crate::encoding::TextEncoding;
use crate::error::{PipelineError, PipelineResult};

/// Readable byte stream produced by a map stage.
pub type ByteStream = Box<dyn AsyncRead + Send + Sync + Unpin>;

// ---------------------------------------------------------------------------
// Mapped
// ---------------------------------------------------------------------------

/// Intermediate value a map stage produces for one source file.
pub enum Mapped {
    /// Raw bytes still to be read.
    Stream(ByteStream),
    /// Already-materialized text.
    Text(String),
}

impl Mapped {
    /// Read the value fully as text.
    pub async fn into_text(self, encoding: TextEncoding) -> PipelineResult<String> {
        match self {
            Self::Text(text) => Ok(text),
            Self::Stream(mut stream) => {
                let mut bytes = Vec::new();
                stream
                    .read_to_end(&mut bytes)
                    .await
                    .map_err(|source| PipelineError::io("<mapped stream>", source))?;
                encoding.decode(bytes)
            }
        }
    }
}

impl From<String> for Mapped {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&str> for Mapped {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl fmt::Debug for Mapped {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stream(_) => f.write_str("Mapped::Stream(..)"),
            Self::Text(text) => f.debug_tuple("Mapped::Text").field(&text.len()).finish(),
        }
    }
}

// ---------------------------------------------------------------------------
// ByteSink
// ---------------------------------------------------------------------------

/// Buffered writer for the artifact file.
///
/// The file is created on the first write, so a sink that never receives
/// data leaves any existing artifact untouched.
pub struct ByteSink {
    path: PathBuf,
    writer: Option<BufWriter<File>>,
    written: u64,
}

impl ByteSink {
    /// Create a sink for `path`. Nothing is opened yet.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            writer: None,
            written: 0,
        }
    }

    /// Artifact path this sink writes to.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the underlying file has been created.
    pub fn is_open(&self) -> bool {
        self.writer.is_some()
    }

    /// Bytes written so far.
    pub fn written(&self) -> u64 {
        self.written
    }

    async fn writer(&mut self) -> PipelineResult<&mut BufWriter<File>> {
        let writer = match self.writer.take() {
            Some(writer) => writer,
            None => {
                let file = File::create(&self.path)
                    .await
                    .map_err(|source| PipelineError::io(&self.path, source))?;
                debug!(path = %self.path.display(), "opened artifact for writing");
                BufWriter::new(file)
            }
        };
        Ok(self.writer.insert(writer))
    }

    pub async fn write_all(&mut self, bytes: &[u8]) -> PipelineResult<()> {
        let path = self.path.clone();
        self.writer()
            .await?
            .write_all(bytes)
            .await
            .map_err(|source| PipelineError::io(path, source))?;
        self.written += bytes.len() as u64;
        Ok(())
    }

    /// Copy `stream` to the end of the artifact. The sink stays open.
    pub async fn pipe_from(&mut self, stream: &mut ByteStream) -> PipelineResult<u64> {
        let path = self.path.clone();
        let copied = tokio::io::copy(stream, self.writer().await?)
            .await
            .map_err(|source| PipelineError::io(path, source))?;
        self.written += copied;
        Ok(copied)
    }

    /// Flush and close the artifact. A sink that was never written to is a
    /// no-op.
    pub async fn close(mut self) -> PipelineResult<()> {
        if let Some(mut writer) = self.writer.take() {
            writer
                .shutdown()
                .await
                .map_err(|source| PipelineError::io(&self.path, source))?;
            debug!(path = %self.path.display(), bytes = self.written, "closed artifact");
        }
        Ok(())
    }
}

impl fmt::Debug for ByteSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ByteSink")
            .field("path", &self.path)
            .field("open", &self.is_open())
            .field("written", &self.written)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Accumulator
// ---------------------------------------------------------------------------

/// Text collected in memory and written to `path` when finalized.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TextAccumulator {
    pub path: PathBuf,
    pub content: String,
}

impl TextAccumulator {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            content: String::new(),
        }
    }
}

/// The value threaded through every reduce call.
pub enum Accumulator {
    /// Streaming writer for the artifact.
    Sink(ByteSink),
    /// In-memory text destined for a path.
    Text(TextAccumulator),
    /// Bare string with no destination; useful for custom finalizers.
    Plain(String),
    /// Anything else. Only custom reduce/finalize stages understand it.
    Opaque(Box<dyn Any + Send>),
}

impl Accumulator {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Sink(_) => "sink",
            Self::Text(_) => "text",
            Self::Plain(_) => "plain",
            Self::Opaque(_) => "opaque",
        }
    }
}

impl fmt::Debug for Accumulator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sink(sink) => f.debug_tuple("Sink").field(sink).finish(),
            Self::Text(acc) => f.debug_tuple("Text").field(acc).finish(),
            Self::Plain(s) => f.debug_tuple("Plain").field(&s.len()).finish(),
            Self::Opaque(_) => f.write_str("Opaque(..)"),
        }
    }
}
