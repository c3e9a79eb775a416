use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::handlers::{attest, download, index, version};
use crate::state::AppState;

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/version", get(version))
        .route("/download/{fid}", get(download))
        .route("/attest", post(attest))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
