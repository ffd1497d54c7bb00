use std::fmt;
use std::path::Path;

use async_trait::async_trait;

use crate::error::PipelineResult;
use crate::file::SourceFile;
use crate::value::{Accumulator, Mapped};

// ---------------------------------------------------------------------------
// StageKind
// ---------------------------------------------------------------------------

/// Identifies a pipeline stage in logs and errors.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StageKind {
    Prefilter,
    Map,
    Filter,
    ReduceSeed,
    Reduce,
    PostReduce,
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Prefilter => "prefilter",
            Self::Map => "map",
            Self::Filter => "filter",
            Self::ReduceSeed => "reduce-seed",
            Self::Reduce => "reduce",
            Self::PostReduce => "post-reduce",
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// Stage traits
// ---------------------------------------------------------------------------

/// Cheap accept/reject before any content is read.
#[async_trait]
pub trait Prefilter: Send + Sync {
    async fn include(&self, file: &SourceFile) -> PipelineResult<bool>;
}

/// Turns a source file into an intermediate value.
#[async_trait]
pub trait Mapper: Send + Sync {
    async fn map(&self, file: &SourceFile) -> PipelineResult<Mapped>;
}

/// Accept/reject after mapping; `file.mapped` is set.
#[async_trait]
pub trait Filter: Send + Sync {
    async fn keep(&self, file: &SourceFile) -> PipelineResult<bool>;
}

/// Produces the initial accumulator for a destination.
#[async_trait]
pub trait SeedFactory: Send + Sync {
    async fn seed(&self, destination: &Path) -> PipelineResult<Accumulator>;
}

/// Folds one file's mapped value into the accumulator.
#[async_trait]
pub trait Reducer: Send + Sync {
    async fn reduce(&self, acc: Accumulator, file: &mut SourceFile) -> PipelineResult<Accumulator>;
}

/// Writes the accumulator out as the artifact.
#[async_trait]
pub trait Finalizer: Send + Sync {
    async fn finalize(&self, acc: Accumulator) -> PipelineResult<()>;
}

/// Content form of the map stage: receives the whole file as text.
#[async_trait]
pub trait MapContent: Send + Sync {
    async fn map_content(&self, content: String, file: &SourceFile) -> PipelineResult<String>;
}

/// Content form of the finalize stage: rewrites the concatenated text
/// before it is written.
#[async_trait]
pub trait PostReduceContent: Send + Sync {
    async fn post_reduce_content(&self, content: String) -> PipelineResult<String>;
}

// ---------------------------------------------------------------------------
// Closures as stages
// ---------------------------------------------------------------------------

#[async_trait]
impl<F> Prefilter for F
where
    F: Fn(&SourceFile) -> PipelineResult<bool> + Send + Sync,
{
    async fn include(&self, file: &SourceFile) -> PipelineResult<bool> {
        self(file)
    }
}

#[async_trait]
impl<F> Filter for F
where
    F: Fn(&SourceFile) -> PipelineResult<bool> + Send + Sync,
{
    async fn keep(&self, file: &SourceFile) -> PipelineResult<bool> {
        self(file)
    }
}

#[async_trait]
impl<F> MapContent for F
where
    F: Fn(String, &SourceFile) -> PipelineResult<String> + Send + Sync,
{
    async fn map_content(&self, content: String, file: &SourceFile) -> PipelineResult<String> {
        self(content, file)
    }
}

#[async_trait]
impl<F> PostReduceContent for F
where
    F: Fn(String) -> PipelineResult<String> + Send + Sync,
{
    async fn post_reduce_content(&self, content: String) -> PipelineResult<String> {
        self(content)
    }
}
