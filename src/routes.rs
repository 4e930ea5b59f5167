use axum::Router;
use tower_http::trace::TraceLayer;

use crate::AppState;
use crate::pipeline;

/// Create the file share router.
///
/// There are no fixed routes: paths name files and directories under the
/// root, so every request goes to the pipeline.
pub fn file_routes() -> Router<AppState> {
    Router::new().fallback(pipeline::serve)
}

/// Router with tracing and state attached, ready to serve.
pub fn app(state: AppState) -> Router {
    file_routes()
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
