use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};

use super::controller::{commit_import, download_template, preview_import};
use crate::state::AppState;

/// Import routes, merged under `/students`.
pub fn init_import_router(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/import/template", get(download_template))
        .route("/import/preview", post(preview_import))
        .route("/import", post(commit_import))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
}
