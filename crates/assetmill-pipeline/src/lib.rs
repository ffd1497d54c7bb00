//! Transformation pipeline for assetmill.
//!
//! A pipeline folds every file under a list of sources into one artifact.
//! Each file passes through up to five stages, one file at a time:
//!
//! ```text
//! prefilter -> map -> filter -> reduce          (per file)
//! reduce_seed                                   (once, before the walk)
//! post_reduce                                   (once, after the walk)
//! ```
//!
//! Any stage left unset falls back to a default that concatenates the
//! sources byte for byte. Stages can work with streams or with whole-file
//! text; the default reduce combines either kind of mapped value with
//! either kind of accumulator.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::path::PathBuf;
//! use assetmill_pipeline::PipelineConfig;
//!
//! # async fn demo() -> assetmill_pipeline::PipelineResult<()> {
//! let pipeline = PipelineConfig::new()
//!     .extensions(["js"])
//!     .map_content_fn(|content, _file| Ok(format!("{content};\n")))
//!     .build();
//! let report = pipeline
//!     .run(&[PathBuf::from("app/assets/javascript")], "public/app.js".as_ref())
//!     .await?;
//! assert!(report.artifact().is_some());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod encoding;
pub mod error;
pub mod file;
pub mod pipeline;
pub mod stage;
pub mod stages;
pub mod value;

// Re-exports for convenience.
pub use config::PipelineConfig;
pub use encoding::TextEncoding;
pub use error::{PipelineError, PipelineResult};
pub use file::SourceFile;
pub use pipeline::{Pipeline, PipelineReport};
pub use stage::{
    Filter, Finalizer, MapContent, Mapper, PostReduceContent, Prefilter, Reducer, SeedFactory,
    StageKind,
};
pub use value::{Accumulator, ByteSink, ByteStream, Mapped, TextAccumulator};
