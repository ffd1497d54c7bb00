use std::sync::Arc;

use tracing::warn;

use crate::encoding::TextEncoding;
use crate::error::PipelineResult;
use crate::file::SourceFile;
use crate::pipeline::Pipeline;
use crate::stage::{
    Filter, Finalizer, MapContent, Mapper, PostReduceContent, Prefilter, Reducer, SeedFactory,
};
use crate::stages::{
    AcceptAll, ContentFinalize, ContentMapper, DefaultFinalize, DefaultReduce, ExtensionPrefilter,
    ReadStream, SinkSeed, TextSeed,
};

/// Stage overrides for a pipeline. Every field is optional; see
/// [`build`](Self::build) for the defaults.
#[derive(Clone, Default)]
pub struct PipelineConfig {
    encoding: TextEncoding,
    extensions: Option<Vec<String>>,
    prefilter: Option<Arc<dyn Prefilter>>,
    map: Option<Arc<dyn Mapper>>,
    map_content: Option<Arc<dyn MapContent>>,
    filter: Option<Arc<dyn Filter>>,
    reduce_seed: Option<Arc<dyn SeedFactory>>,
    reduce: Option<Arc<dyn Reducer>>,
    post_reduce: Option<Arc<dyn Finalizer>>,
    post_reduce_content: Option<Arc<dyn PostReduceContent>>,
    staleness_filter: Option<Arc<dyn Prefilter>>,
}

impl PipelineConfig {
    /// Empty configuration; every stage uses its default.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn encoding(mut self, encoding: TextEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Parse and set the text encoding by name (`utf8`, `latin1`, ...).
    pub fn encoding_name(self, name: &str) -> PipelineResult<Self> {
        Ok(self.encoding(name.parse()?))
    }

    /// Prefilter on an extension allow-list. Ignored if an explicit
    /// prefilter is also set.
    pub fn extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extensions = Some(extensions.into_iter().map(Into::into).collect());
        self
    }

    /// Accept or reject files before they are read.
    pub fn prefilter(mut self, stage: impl Prefilter + 'static) -> Self {
        self.prefilter = Some(Arc::new(stage));
        self
    }

    pub fn prefilter_fn<F>(self, f: F) -> Self
    where
        F: Fn(&SourceFile) -> PipelineResult<bool> + Send + Sync + 'static,
    {
        self.prefilter(f)
    }

    /// Custom map stage.
    pub fn map(mut self, stage: impl Mapper + 'static) -> Self {
        self.map = Some(Arc::new(stage));
        self
    }

    /// Map from whole-file text. Takes precedence over [`map`](Self::map).
    pub fn map_content(mut self, stage: impl MapContent + 'static) -> Self {
        self.map_content = Some(Arc::new(stage));
        self
    }

    pub fn map_content_fn<F>(self, f: F) -> Self
    where
        F: Fn(String, &SourceFile) -> PipelineResult<String> + Send + Sync + 'static,
    {
        self.map_content(f)
    }

    /// Accept or reject files after mapping.
    pub fn filter(mut self, stage: impl Filter + 'static) -> Self {
        self.filter = Some(Arc::new(stage));
        self
    }

    pub fn filter_fn<F>(self, f: F) -> Self
    where
        F: Fn(&SourceFile) -> PipelineResult<bool> + Send + Sync + 'static,
    {
        self.filter(f)
    }

    /// Initial accumulator for each run.
    pub fn reduce_seed(mut self, stage: impl SeedFactory + 'static) -> Self {
        self.reduce_seed = Some(Arc::new(stage));
        self
    }

    /// Fold each mapped file into the accumulator.
    pub fn reduce(mut self, stage: impl Reducer + 'static) -> Self {
        self.reduce = Some(Arc::new(stage));
        self
    }

    /// Write the accumulator out. Takes precedence over
    /// [`post_reduce_content`](Self::post_reduce_content).
    pub fn post_reduce(mut self, stage: impl Finalizer + 'static) -> Self {
        self.post_reduce = Some(Arc::new(stage));
        self
    }

    /// Rewrite the concatenated text before it is written. Switches the
    /// default seed to an in-memory text record.
    pub fn post_reduce_content(mut self, stage: impl PostReduceContent + 'static) -> Self {
        self.post_reduce_content = Some(Arc::new(stage));
        self
    }

    pub fn post_reduce_content_fn<F>(self, f: F) -> Self
    where
        F: Fn(String) -> PipelineResult<String> + Send + Sync + 'static,
    {
        self.post_reduce_content(f)
    }

    /// Predicate for the staleness check. Defaults to the prefilter.
    pub fn staleness_filter(mut self, stage: impl Prefilter + 'static) -> Self {
        self.staleness_filter = Some(Arc::new(stage));
        self
    }

    /// Resolve every stage, filling gaps with the defaults:
    ///
    /// - prefilter: explicit stage, else the extension allow-list, else accept all
    /// - map: `map_content` wrapper, else explicit map, else [`ReadStream`]
    /// - filter: accept all
    /// - seed: explicit, else a text record when `post_reduce_content` is set,
    ///   else a lazy [`SinkSeed`]
    /// - reduce: [`DefaultReduce`]
    /// - finalize: explicit, else the `post_reduce_content` wrapper, else
    ///   [`DefaultFinalize`]
    pub fn build(self) -> Pipeline {
        let encoding = self.encoding;

        let prefilter: Arc<dyn Prefilter> = match (self.prefilter, self.extensions) {
            (Some(stage), _) => stage,
            (None, Some(extensions)) => Arc::new(ExtensionPrefilter::new(extensions)),
            (None, None) => Arc::new(AcceptAll),
        };

        if self.map.is_some() && self.map_content.is_some() {
            warn!("both map and map_content configured; map_content wins");
        }
        let map: Arc<dyn Mapper> = match (self.map_content, self.map) {
            (Some(content), _) => Arc::new(ContentMapper::new(content, encoding)),
            (None, Some(stage)) => stage,
            (None, None) => Arc::new(ReadStream),
        };

        let filter: Arc<dyn Filter> = self.filter.unwrap_or_else(|| Arc::new(AcceptAll));

        let content_finalize = self.post_reduce_content.is_some();
        let reduce_seed: Arc<dyn SeedFactory> = match self.reduce_seed {
            Some(stage) => stage,
            None if content_finalize => Arc::new(TextSeed),
            None => Arc::new(SinkSeed),
        };

        let reduce: Arc<dyn Reducer> = self
            .reduce
            .unwrap_or_else(|| Arc::new(DefaultReduce::new(encoding)));

        let post_reduce: Arc<dyn Finalizer> = match (self.post_reduce, self.post_reduce_content) {
            (Some(stage), _) => stage,
            (None, Some(content)) => Arc::new(ContentFinalize::new(content, encoding)),
            (None, None) => Arc::new(DefaultFinalize::new(encoding)),
        };

        let staleness_filter = self.staleness_filter.unwrap_or_else(|| Arc::clone(&prefilter));

        Pipeline {
            encoding,
            prefilter,
            map,
            filter,
            reduce_seed,
            reduce,
            post_reduce,
            staleness_filter,
        }
    }
}

impl std::fmt::Debug for PipelineConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineConfig")
            .field("encoding", &self.encoding)
            .field("extensions", &self.extensions)
            .field("prefilter", &self.prefilter.is_some())
            .field("map", &self.map.is_some())
            .field("map_content", &self.map_content.is_some())
            .field("filter", &self.filter.is_some())
            .field("reduce_seed", &self.reduce_seed.is_some())
            .field("reduce", &self.reduce.is_some())
            .field("post_reduce", &self.post_reduce.is_some())
            .field("post_reduce_content", &self.post_reduce_content.is_some())
            .field("staleness_filter", &self.staleness_filter.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PipelineError;

    #[test]
    fn defaults() {
        let config = PipelineConfig::new();
        let debug = format!("{config:?}");
        assert!(debug.contains("Utf8"));
        assert_eq!(config.build().encoding(), TextEncoding::Utf8);
    }

    #[test]
    fn encoding_by_name() {
        let config = PipelineConfig::new().encoding_name("latin1").unwrap();
        assert_eq!(config.build().encoding(), TextEncoding::Latin1);
        assert!(matches!(
            PipelineConfig::new().encoding_name("utf16"),
            Err(PipelineError::Configuration(_))
        ));
    }

    #[tokio::test]
    async fn extension_list_becomes_prefilter() {
        let pipeline = PipelineConfig::new().extensions(["js"]).build();
        assert!(pipeline.prefilter_accepts(&SourceFile::new("a.js")).await.unwrap());
        assert!(!pipeline.prefilter_accepts(&SourceFile::new("a.css")).await.unwrap());
    }

    #[tokio::test]
    async fn explicit_prefilter_beats_extensions() {
        let pipeline = PipelineConfig::new()
            .extensions(["js"])
            .prefilter_fn(|f| Ok(f.extension == ".css"))
            .build();
        assert!(pipeline.prefilter_accepts(&SourceFile::new("a.css")).await.unwrap());
        assert!(!pipeline.prefilter_accepts(&SourceFile::new("a.js")).await.unwrap());
    }
}
