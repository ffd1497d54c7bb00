use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime};

use assetmill_walk::path::{absolute, clean};
use assetmill_walk::{SourcePredicate, SubpathWalker, WalkEntry};
use async_trait::async_trait;
use tracing::{debug, info};

use crate::encoding::TextEncoding;
use crate::error::{PipelineError, PipelineResult};
use crate::file::SourceFile;
use crate::stage::{Filter, Finalizer, Mapper, Prefilter, Reducer, SeedFactory};
use crate::value::Accumulator;

// ---------------------------------------------------------------------------
// PipelineReport
// ---------------------------------------------------------------------------

/// What a pipeline run did.
#[derive(Clone, Debug)]
pub struct PipelineReport {
    /// Where the artifact was (or would have been) written.
    pub destination: PathBuf,
    /// Files folded into the artifact, in order.
    pub included: Vec<PathBuf>,
    /// Files rejected by the prefilter.
    pub prefiltered: usize,
    /// Files rejected by the filter after mapping.
    pub filtered: usize,
    /// Wall-clock time for the whole run.
    pub elapsed: Duration,
}

impl PipelineReport {
    fn new(destination: &Path) -> Self {
        Self {
            destination: destination.to_path_buf(),
            included: Vec::new(),
            prefiltered: 0,
            filtered: 0,
            elapsed: Duration::ZERO,
        }
    }

    /// The artifact path, or `None` if no file survived both filters and
    /// nothing was written.
    pub fn artifact(&self) -> Option<&Path> {
        if self.included.is_empty() {
            None
        } else {
            Some(&self.destination)
        }
    }
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// A fully resolved stage sequence. Built by
/// [`PipelineConfig::build`](crate::PipelineConfig::build); cheap to clone.
#[derive(Clone)]
pub struct Pipeline {
    pub(crate) encoding: TextEncoding,
    pub(crate) prefilter: Arc<dyn Prefilter>,
    pub(crate) map: Arc<dyn Mapper>,
    pub(crate) filter: Arc<dyn Filter>,
    pub(crate) reduce_seed: Arc<dyn SeedFactory>,
    pub(crate) reduce: Arc<dyn Reducer>,
    pub(crate) post_reduce: Arc<dyn Finalizer>,
    pub(crate) staleness_filter: Arc<dyn Prefilter>,
}

impl Pipeline {
    pub fn encoding(&self) -> TextEncoding {
        self.encoding
    }

    pub async fn prefilter_accepts(&self, file: &SourceFile) -> PipelineResult<bool> {
        self.prefilter.include(file).await
    }

    /// Whether any source accepted by the staleness filter is newer than
    /// `artifact_modified`.
    pub async fn is_stale(
        &self,
        artifact_modified: SystemTime,
        sources: &[PathBuf],
    ) -> PipelineResult<bool> {
        assetmill_walk::is_stale(artifact_modified, sources, self).await
    }

    /// Fold every file under `sources` into the artifact at `destination`.
    ///
    /// Files are processed strictly one after another in walk order. The
    /// destination itself is never read as a source. If no file survives
    /// both filters, finalize is skipped and nothing is written.
    ///
    /// The first error aborts the run. An open sink is dropped without being
    /// flushed, so a partially written artifact may remain.
    pub async fn run(
        &self,
        sources: &[PathBuf],
        destination: &Path,
    ) -> PipelineResult<PipelineReport> {
        let started = Instant::now();
        let mut report = PipelineReport::new(destination);
        debug!(
            destination = %destination.display(),
            sources = sources.len(),
            "generating artifact"
        );

        let seed = self.reduce_seed.seed(destination).await?;
        let acc = self.fold(sources, destination, seed, &mut report).await?;

        if report.included.is_empty() {
            debug!(destination = %destination.display(), "no sources included; nothing written");
        } else {
            debug!("calling post-reduce");
            self.post_reduce.finalize(acc).await?;
        }

        report.elapsed = started.elapsed();
        info!(
            destination = %destination.display(),
            included = report.included.len(),
            prefiltered = report.prefiltered,
            filtered = report.filtered,
            elapsed_ms = report.elapsed.as_millis() as u64,
            "pipeline finished"
        );
        Ok(report)
    }

    async fn fold(
        &self,
        sources: &[PathBuf],
        destination: &Path,
        mut acc: Accumulator,
        report: &mut PipelineReport,
    ) -> PipelineResult<Accumulator> {
        let destination = comparable(destination);
        let mut walker = SubpathWalker::new(sources.iter().cloned());

        while let Some(entry) = walker.next().await? {
            if comparable(&entry.path) == destination {
                info!(path = %entry.path.display(), "ignored output path as an input file");
                continue;
            }

            let mut file = SourceFile::from(entry);
            if !self.prefilter.include(&file).await? {
                debug!(path = %file.path.display(), "prefiltered");
                report.prefiltered += 1;
                continue;
            }

            file.mapped = Some(self.map.map(&file).await?);

            if !self.filter.keep(&file).await? {
                debug!(path = %file.path.display(), "filtered");
                report.filtered += 1;
                continue;
            }

            acc = self.reduce.reduce(acc, &mut file).await?;
            info!(path = %file.path.display(), "included");
            report.included.push(file.path);
        }

        Ok(acc)
    }
}

fn comparable(path: &Path) -> PathBuf {
    absolute(path).unwrap_or_else(|_| clean(path))
}

#[async_trait]
impl SourcePredicate for Pipeline {
    type Error = PipelineError;

    async fn accepts(&self, entry: &WalkEntry) -> PipelineResult<bool> {
        let file = SourceFile::from(entry.clone());
        self.staleness_filter.include(&file).await
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("encoding", &self.encoding)
            .finish_non_exhaustive()
    }
}
