//! HTTP middleware that builds assets on demand and caches them on disk.
//!
//! For each `GET` or `HEAD` under the URL prefix, [`AssetMiddleware`]
//! resolves an artifact path, decides whether the artifact must be
//! (re)built, runs the pipeline if so, and streams the result. Concurrent
//! requests for the same artifact share a single build.
//!
//! # Design Rules
//!
//! 1. The build for a destination is claimed before any filesystem access.
//! 2. Every request waiting on a build receives the same outcome.
//! 3. Static destinations never leave the output root.
//! 4. The middleware never writes error responses; failures travel to the
//!    next handler as an [`AssetFailure`] request extension.

pub mod config;
pub mod destination;
pub mod error;
pub mod handler;
pub mod middleware;
pub mod respond;
pub mod router;
pub mod server;
pub mod source;

// Re-exports for convenience.
pub use config::{AssetsConfig, ForcePolicy, ServerConfig};
pub use destination::{DestinationResolver, DestinationSpec};
pub use error::{AssetError, AssetResult};
pub use middleware::{
    shared_registry, AssetMiddleware, AssetMiddlewareBuilder, GenerationOutcome, Resolution,
};
pub use respond::{artifact_response, serve_assets, with_assets, AssetFailure};
pub use router::build_router;
pub use server::AssetServer;
pub use source::{SourceResolver, SourceSpec};

pub use axum::http::Method;
