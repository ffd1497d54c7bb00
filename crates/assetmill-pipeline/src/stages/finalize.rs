use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::fs;

use crate::encoding::TextEncoding;
use crate::error::{PipelineError, PipelineResult};
use crate::stage::{Finalizer, PostReduceContent};
use crate::value::Accumulator;

/// Default finalize: closes a sink or writes a text record to its path.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultFinalize {
    encoding: TextEncoding,
}

impl DefaultFinalize {
    pub fn new(encoding: TextEncoding) -> Self {
        Self { encoding }
    }
}

#[async_trait]
impl Finalizer for DefaultFinalize {
    async fn finalize(&self, acc: Accumulator) -> PipelineResult<()> {
        match acc {
            Accumulator::Sink(sink) => sink.close().await,
            Accumulator::Text(record) => {
                write_text(&record.path, &record.content, self.encoding).await
            }
            other => Err(unsupported(&other)),
        }
    }
}

/// Finalize for pipelines with a `post_reduce_content` stage: rewrites the
/// collected text, then writes it to the record's path.
#[derive(Clone)]
pub struct ContentFinalize {
    inner: Arc<dyn PostReduceContent>,
    encoding: TextEncoding,
}

impl ContentFinalize {
    pub fn new(inner: Arc<dyn PostReduceContent>, encoding: TextEncoding) -> Self {
        Self { inner, encoding }
    }
}

#[async_trait]
impl Finalizer for ContentFinalize {
    async fn finalize(&self, acc: Accumulator) -> PipelineResult<()> {
        let record = match acc {
            Accumulator::Text(record) => record,
            other => return Err(unsupported(&other)),
        };
        let content = self.inner.post_reduce_content(record.content).await?;
        write_text(&record.path, &content, self.encoding).await
    }
}

impl std::fmt::Debug for ContentFinalize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentFinalize")
            .field("encoding", &self.encoding)
            .finish_non_exhaustive()
    }
}

async fn write_text(path: &Path, content: &str, encoding: TextEncoding) -> PipelineResult<()> {
    let bytes = encoding.encode(content)?;
    fs::write(path, bytes)
        .await
        .map_err(|source| PipelineError::io(path, source))
}

fn unsupported(acc: &Accumulator) -> PipelineError {
    PipelineError::Configuration(format!(
        "cannot finalize a {} accumulator; reduce must produce a sink or a text record",
        acc.kind()
    ))
}
