//! Per-request orchestration.
//!
//! Every request runs the same stages in order: context, security check,
//! body collection, routing, handler. Any stage may fail with a
//! [`ServeError`]; this module is the only place that turns those failures
//! into responses.

use axum::{
    extract::{Request, State},
    http::header,
    response::{IntoResponse, Response},
};
use tracing::{debug, error, info, warn};

use crate::AppState;
use crate::body::collect_body;
use crate::context::RequestContext;
use crate::error::{ServeError, status_response};
use crate::router::{self, HandlerResult};
use crate::security;

/// Bytes of a request body mirrored to the log in debug mode.
const DEBUG_BODY_PREVIEW: usize = 4096;

/// Fallback handler that serves every request.
pub async fn serve(State(state): State<AppState>, request: Request) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    let response = match process(&state, request).await {
        Ok(response) => response,
        Err(err) => {
            // the status line below carries the level
            debug!("{} {} failed: {}", method, path, err);
            err.into_response()
        }
    };

    let status = response.status();
    if status.is_server_error() {
        error!("{} {} -> {}", method, path, status.as_u16());
    } else if status.is_client_error() {
        warn!("{} {} -> {}", method, path, status.as_u16());
    } else {
        info!("{} {} -> {}", method, path, status.as_u16());
    }
    response
}

async fn process(state: &AppState, request: Request) -> Result<Response, ServeError> {
    let (parts, body) = request.into_parts();

    let mut ctx = RequestContext::from_parts(&parts, &state.root_dir)?;
    security::verify(&ctx, &state.root_dir)?;

    let content_length = parts
        .headers
        .get(header::CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<u64>().ok());
    let body = collect_body(body, content_length, state.config.max_body_size).await?;

    if state.config.debug && !body.is_empty() {
        let preview = &body[..body.len().min(DEBUG_BODY_PREVIEW)];
        debug!(
            "Request body ({} bytes): {}",
            body.len(),
            String::from_utf8_lossy(preview)
        );
    }
    ctx.attach_body(body);

    match router::route(&ctx).await {
        HandlerResult::Handler(handler) => {
            debug!("Dispatching {} to {:?}", ctx.raw_path, handler);
            handler.run(&ctx, state).await
        }
        HandlerResult::Status { status, message } => Ok(status_response(status, message)),
    }
}
