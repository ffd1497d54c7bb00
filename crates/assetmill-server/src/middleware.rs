//! Request orchestration: decide whether to serve, build or pass through.

use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use assetmill_pipeline::{Pipeline, PipelineConfig, PipelineError, TextEncoding};
use assetmill_registry::{claim_or_join, BuildGuard, Claim, GenerationRegistry, InMemoryRegistry};
use axum::http::Method;
use tokio::fs;
use tracing::{debug, debug_span, error, Instrument};

use crate::config::{AssetsConfig, ForcePolicy};
use crate::destination::{DestinationResolver, DestinationSpec};
use crate::error::{AssetError, AssetResult};
use crate::source::SourceSpec;

/// What a finished build hands to everyone waiting on it: the artifact to
/// serve, nothing (no source qualified), or the shared error.
pub type GenerationOutcome = Result<Option<PathBuf>, Arc<AssetError>>;

/// Registry shared by every middleware in the process that was not given
/// its own.
pub fn shared_registry() -> Arc<dyn GenerationRegistry<GenerationOutcome>> {
    static REGISTRY: OnceLock<Arc<InMemoryRegistry<GenerationOutcome>>> = OnceLock::new();
    REGISTRY.get_or_init(|| Arc::new(InMemoryRegistry::new())).clone()
}

/// How a request should continue.
#[derive(Debug)]
pub enum Resolution {
    /// Not ours, or nothing to serve; hand the request to the next handler.
    PassThrough,
    /// Stream this artifact.
    Serve(PathBuf),
    /// Generation failed; the next handler reports it.
    Failed(Arc<AssetError>),
}

// ---------------------------------------------------------------------------
// AssetMiddleware
// ---------------------------------------------------------------------------

/// Builds artifacts on demand and decides what each request gets.
pub struct AssetMiddleware {
    destinations: DestinationResolver,
    serve_after_build: bool,
    generator: Arc<Generator>,
    registry: Arc<dyn GenerationRegistry<GenerationOutcome>>,
}

impl AssetMiddleware {
    /// Start configuring a middleware from declarative settings.
    pub fn builder(config: AssetsConfig) -> AssetMiddlewareBuilder {
        AssetMiddlewareBuilder::new(config)
    }

    /// Middleware with default stages and the process-wide registry.
    pub fn from_config(config: AssetsConfig) -> AssetResult<Self> {
        Self::builder(config).build()
    }

    /// The resolved pipeline every build runs.
    pub fn pipeline(&self) -> &Pipeline {
        &self.generator.pipeline
    }

    /// Request-path to artifact-path mapping.
    pub fn destinations(&self) -> &DestinationResolver {
        &self.destinations
    }

    /// Resolve one request.
    ///
    /// Never writes a response itself. Errors come back as
    /// [`Resolution::Failed`].
    pub async fn handle(&self, method: &Method, request_path: &str) -> Resolution {
        if !is_read(method) {
            return Resolution::PassThrough;
        }

        let destination = match self.destinations.resolve(request_path) {
            Ok(Some(destination)) => destination,
            Ok(None) => return Resolution::PassThrough,
            Err(err) => {
                error!(path = request_path, error = %err, "rejected asset request");
                return Resolution::Failed(Arc::new(err));
            }
        };

        let span = debug_span!("asset", destination = %destination.display());
        self.handle_destination(destination).instrument(span).await
    }

    async fn handle_destination(&self, destination: PathBuf) -> Resolution {
        // Claim before the first await so two requests can never both
        // decide to build.
        let outcome = match claim_or_join(&self.registry, destination) {
            Claim::Joined(waiter) => {
                debug!("being generated by another request, waiting");
                match waiter.outcome().await {
                    Ok(outcome) => outcome,
                    Err(err) => Err(Arc::new(err.into())),
                }
            }
            Claim::Builder(guard) => self.spawn_build(guard).await,
        };
        self.resolution(outcome)
    }

    /// Run the build on its own task. The task owns the guard, so a
    /// builder request that goes away does not cancel the build its
    /// joiners are waiting on.
    async fn spawn_build(&self, guard: BuildGuard<GenerationOutcome>) -> GenerationOutcome {
        let generator = Arc::clone(&self.generator);
        let build = async move {
            let outcome = generator
                .evaluate(guard.destination())
                .await
                .map_err(Arc::new);
            if let Err(err) = &outcome {
                error!(error = %err, "artifact generation failed");
            }
            let woken = guard.release(outcome.clone());
            debug!(waiters = woken, "released generation");
            outcome
        };

        match tokio::spawn(build.in_current_span()).await {
            Ok(outcome) => outcome,
            Err(err) => Err(Arc::new(AssetError::Internal(format!(
                "generation task failed: {err}"
            )))),
        }
    }

    fn resolution(&self, outcome: GenerationOutcome) -> Resolution {
        match outcome {
            Err(err) => Resolution::Failed(err),
            Ok(Some(path)) if self.serve_after_build => Resolution::Serve(path),
            Ok(_) => Resolution::PassThrough,
        }
    }
}

impl std::fmt::Debug for AssetMiddleware {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssetMiddleware")
            .field("destinations", &self.destinations)
            .field("serve_after_build", &self.serve_after_build)
            .field("generator", &self.generator)
            .finish_non_exhaustive()
    }
}

fn is_read(method: &Method) -> bool {
    method == Method::GET || method == Method::HEAD
}

// ---------------------------------------------------------------------------
// Generator
// ---------------------------------------------------------------------------

/// The part of the middleware a build task needs.
#[derive(Debug)]
struct Generator {
    sources: SourceSpec,
    force: ForcePolicy,
    pipeline: Pipeline,
}

impl Generator {
    /// Build if needed and report the artifact to serve.
    async fn evaluate(&self, destination: &Path) -> AssetResult<Option<PathBuf>> {
        let metadata = match fs::metadata(destination).await {
            Ok(metadata) => metadata,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!("artifact missing, generating");
                if let Some(parent) = destination.parent() {
                    fs::create_dir_all(parent)
                        .await
                        .map_err(|source| AssetError::io(parent, source))?;
                }
                return self.generate(destination).await;
            }
            Err(source) => return Err(AssetError::io(destination, source)),
        };
        if !metadata.is_file() {
            return Err(AssetError::NotAFile(destination.to_path_buf()));
        }

        match self.force {
            ForcePolicy::Always => {
                debug!("forced rebuild");
                self.generate(destination).await
            }
            ForcePolicy::Never => {
                debug!("serving existing artifact");
                Ok(Some(destination.to_path_buf()))
            }
            ForcePolicy::IfNewer => {
                let sources = self.sources.resolve(destination).await?;
                let modified = metadata
                    .modified()
                    .map_err(|source| AssetError::io(destination, source))?;
                if self.pipeline.is_stale(modified, &sources).await? {
                    debug!("artifact is stale, regenerating");
                    self.run_pipeline(&sources, destination).await
                } else {
                    debug!("artifact is fresh");
                    Ok(Some(destination.to_path_buf()))
                }
            }
        }
    }

    async fn generate(&self, destination: &Path) -> AssetResult<Option<PathBuf>> {
        let sources = self.sources.resolve(destination).await?;
        self.run_pipeline(&sources, destination).await
    }

    async fn run_pipeline(
        &self,
        sources: &[PathBuf],
        destination: &Path,
    ) -> AssetResult<Option<PathBuf>> {
        let report = self.pipeline.run(sources, destination).await?;
        Ok(report.artifact().map(Path::to_path_buf))
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Combines declarative [`AssetsConfig`] with code-only settings.
pub struct AssetMiddlewareBuilder {
    config: AssetsConfig,
    sources: Option<SourceSpec>,
    destination: Option<DestinationSpec>,
    pipeline: PipelineConfig,
    registry: Option<Arc<dyn GenerationRegistry<GenerationOutcome>>>,
}

impl AssetMiddlewareBuilder {
    /// Builder with default stages and no overrides.
    pub fn new(config: AssetsConfig) -> Self {
        Self {
            config,
            sources: None,
            destination: None,
            pipeline: PipelineConfig::new(),
            registry: None,
        }
    }

    /// Replace the configured source list.
    pub fn sources(mut self, sources: SourceSpec) -> Self {
        self.sources = Some(sources);
        self
    }

    /// Replace the configured destination.
    pub fn destination(mut self, destination: DestinationSpec) -> Self {
        self.destination = Some(destination);
        self
    }

    /// Stage overrides. The configured encoding and extension list are
    /// applied on top.
    pub fn pipeline(mut self, pipeline: PipelineConfig) -> Self {
        self.pipeline = pipeline;
        self
    }

    /// Use a private registry instead of the process-wide one.
    pub fn registry(mut self, registry: Arc<dyn GenerationRegistry<GenerationOutcome>>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Validate the settings and assemble the middleware.
    ///
    /// Fails on an unknown text encoding or a fixed destination outside
    /// the output root.
    pub fn build(self) -> AssetResult<AssetMiddleware> {
        let config = self.config;

        let encoding: TextEncoding = config
            .text_encoding
            .parse()
            .map_err(|e: PipelineError| AssetError::Config(e.to_string()))?;
        let mut pipeline = self.pipeline.encoding(encoding);
        if let Some(extensions) = config.extensions.clone() {
            pipeline = pipeline.extensions(extensions);
        }

        let sources = self
            .sources
            .unwrap_or_else(|| SourceSpec::Paths(config.source.clone()));
        let destination = match (self.destination, config.destination.clone()) {
            (Some(spec), _) => spec,
            (None, Some(path)) => DestinationSpec::Fixed(path),
            (None, None) => DestinationSpec::UnderRoot,
        };
        let destinations =
            DestinationResolver::new(&config.output_root, &config.url_prefix, destination)?;

        Ok(AssetMiddleware {
            destinations,
            serve_after_build: config.serve_after_build,
            generator: Arc::new(Generator {
                sources,
                force: config.force,
                pipeline: pipeline.build(),
            }),
            registry: self.registry.unwrap_or_else(shared_registry),
        })
    }
}
