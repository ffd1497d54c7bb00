use std::sync::Arc;

use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;

use crate::handler;
use crate::middleware::AssetMiddleware;
use crate::respond::with_assets;

/// Build the standalone router: assets in front of a reporting fallback.
pub fn build_router(assets: Arc<AssetMiddleware>) -> Router {
    let assets_routes = with_assets(Router::new().fallback(handler::fallback_handler), assets);
    Router::new()
        .route("/_assetmill/info", get(handler::info_handler))
        .fallback_service(assets_routes)
        .layer(TraceLayer::new_for_http())
}
