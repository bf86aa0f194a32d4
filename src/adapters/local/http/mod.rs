//! HTTP inbound adapter: video upload endpoint plus static serving of the HLS tree.

mod error;
mod index;
mod upload;

pub use error::ApiError;
pub use upload::{safe_extension, stream_to_file};

use crate::application::StreamLibrary;
use crate::ports::encoder::RenditionEncoder;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

pub struct AppState<E> {
    pub library: StreamLibrary<E>,
    /// Where uploads are spooled while their job runs
    pub upload_dir: PathBuf,
    /// Static root; `index.html` here replaces the built-in upload page
    pub public_dir: PathBuf,
    pub max_upload_bytes: usize,
}

pub fn router<E>(state: AppState<E>) -> Router
where
    E: RenditionEncoder + 'static,
{
    let streams = ServeDir::new(state.library.streams_dir());
    let public = ServeDir::new(&state.public_dir);
    let body_limit = DefaultBodyLimit::max(state.max_upload_bytes);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(index::index_page::<E>))
        .route("/process-video", post(upload::process_video::<E>))
        .layer(body_limit)
        .nest_service("/streams", streams)
        .fallback_service(public)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(state))
}
