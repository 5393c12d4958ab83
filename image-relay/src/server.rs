//! HTTP surface: the `/upload` route and the listener loop.

use std::future::Future;

use anyhow::{Context, Result};
use axum::{
    extract::{multipart::MultipartRejection, DefaultBodyLimit, Multipart, State},
    routing::post,
    Json, Router,
};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

use image_relay_core::model::UploadResult;
use image_relay_core::orchestrator::UploadOrchestrator;

use crate::error::ApiError;
use crate::intake::collect_files;
use crate::load_config::Config;

/// Shared handler state. Only the orchestrator, which is immutable.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: UploadOrchestrator,
}

pub fn router(state: AppState, max_body_bytes: usize) -> Router {
    Router::new()
        .route("/upload", post(upload_images))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// `POST /upload`: relay every `images` part to the media host.
pub async fn upload_images(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<Vec<UploadResult>>, ApiError> {
    let span = info_span!("upload", request_id = %Uuid::new_v4(), files = tracing::field::Empty);

    async move {
        let mut multipart = match multipart {
            Ok(m) => m,
            Err(rejection) => {
                warn!(reason = %rejection, "Request is not multipart, treating as empty upload");
                return Err(ApiError::NoFiles);
            }
        };

        let request = collect_files(&mut multipart).await?;
        tracing::Span::current().record("files", request.len());

        let results = state.orchestrator.upload_all(request).await?;
        Ok(Json(results))
    }
    .instrument(span)
    .await
}

/// Bind the configured address and serve until `shutdown` resolves.
pub async fn serve<F>(config: &Config, orchestrator: UploadOrchestrator, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = router(AppState { orchestrator }, config.max_body_bytes);

    let addr = config.listen_addr();
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(%addr, "Server is running on port {}", config.port);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .context("server error")?;

    info!("Server stopped");
    Ok(())
}
