//! axum glue: run [`AssetMiddleware`] in front of the rest of a router.

use std::path::Path;
use std::sync::Arc;

use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::header::{CONTENT_LENGTH, CONTENT_TYPE};
use axum::http::StatusCode;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::Router;
use tokio::fs::File;
use tokio_util::io::ReaderStream;
use tracing::error;

use crate::error::{AssetError, AssetResult};
use crate::middleware::{AssetMiddleware, Resolution};

/// Request extension carrying a generation failure to the next handler.
#[derive(Clone, Debug)]
pub struct AssetFailure(pub Arc<AssetError>);

/// Put `assets` in front of every route and the fallback of `router`.
pub fn with_assets(router: Router, assets: Arc<AssetMiddleware>) -> Router {
    router.layer(middleware::from_fn_with_state(assets, serve_assets))
}

/// Middleware function for [`axum::middleware::from_fn_with_state`].
pub async fn serve_assets(
    State(assets): State<Arc<AssetMiddleware>>,
    mut request: Request,
    next: Next,
) -> Response {
    let resolution = assets.handle(request.method(), request.uri().path()).await;
    let failure = match resolution {
        Resolution::PassThrough => return next.run(request).await,
        Resolution::Serve(path) => match artifact_response(&path).await {
            Ok(response) => return response,
            Err(err) => {
                error!(path = %path.display(), error = %err, "failed to serve artifact");
                Arc::new(err)
            }
        },
        Resolution::Failed(err) => err,
    };
    request.extensions_mut().insert(AssetFailure(failure));
    next.run(request).await
}

/// Stream an artifact from disk.
pub async fn artifact_response(path: &Path) -> AssetResult<Response> {
    let file = File::open(path)
        .await
        .map_err(|source| AssetError::io(path, source))?;
    let metadata = file
        .metadata()
        .await
        .map_err(|source| AssetError::io(path, source))?;
    if !metadata.is_file() {
        return Err(AssetError::NotAFile(path.to_path_buf()));
    }
    let len = metadata.len();
    let mime = mime_guess::from_path(path).first_or_octet_stream();

    let response = Response::builder()
        .status(StatusCode::OK)
        .header(CONTENT_TYPE, mime.as_ref())
        .header(CONTENT_LENGTH, len)
        .body(Body::from_stream(ReaderStream::new(file)))?;
    Ok(response)
}
