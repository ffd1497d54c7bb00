use std::sync::Arc;

use tokio::net::TcpListener;

use crate::config::ServerConfig;
use crate::error::{AssetError, AssetResult};
use crate::middleware::AssetMiddleware;
use crate::router::build_router;

/// Standalone asset server.
pub struct AssetServer {
    config: ServerConfig,
    assets: Arc<AssetMiddleware>,
}

impl AssetServer {
    pub fn new(config: ServerConfig) -> AssetResult<Self> {
        let assets = Arc::new(AssetMiddleware::from_config(config.assets.clone())?);
        Ok(Self { config, assets })
    }

    /// Use an already configured middleware, e.g. one with custom stages.
    pub fn with_middleware(config: ServerConfig, assets: Arc<AssetMiddleware>) -> Self {
        Self { config, assets }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Build the router (useful for testing).
    pub fn router(&self) -> axum::Router {
        build_router(Arc::clone(&self.assets))
    }

    /// Start serving requests.
    pub async fn serve(self) -> AssetResult<()> {
        let app = self.router();
        let listener = TcpListener::bind(&self.config.bind_addr)
            .await
            .map_err(|e| AssetError::Internal(e.to_string()))?;
        tracing::info!("assetmill listening on {}", self.config.bind_addr);
        axum::serve(listener, app)
            .await
            .map_err(|e| AssetError::Internal(e.to_string()))
    }
}
