use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::Extension;
use serde_json::json;
use tracing::warn;

use crate::respond::AssetFailure;

/// Info handler.
pub async fn info_handler() -> Json<serde_json::Value> {
    Json(json!({
        "name": "assetmill",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Final handler behind the asset middleware: reports a generation
/// failure as 500, anything else as 404.
pub async fn fallback_handler(failure: Option<Extension<AssetFailure>>) -> Response {
    match failure {
        Some(Extension(AssetFailure(err))) => {
            warn!(error = %err, "responding with asset failure");
            (StatusCode::INTERNAL_SERVER_ERROR, "asset generation failed").into_response()
        }
        None => StatusCode::NOT_FOUND.into_response(),
    }
}
