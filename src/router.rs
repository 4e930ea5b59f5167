//! Handler selection.

use axum::http::{Method, StatusCode};
use tokio::fs;
use tracing::{debug, error};

use crate::context::RequestContext;
use crate::handlers::{ASSET_PREFIX, Handler};

/// Outcome of routing: run a handler, or answer with a status right away.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandlerResult {
    Handler(Handler),
    Status {
        status: StatusCode,
        message: Option<String>,
    },
}

impl HandlerResult {
    fn status(status: StatusCode) -> Self {
        HandlerResult::Status {
            status,
            message: None,
        }
    }
}

/// Pick the handler for a request.
///
/// Asset URLs are matched by prefix without touching the filesystem; every
/// other path is stat'ed. Only POST is special-cased, and only on
/// directories.
pub async fn route(ctx: &RequestContext) -> HandlerResult {
    if ctx.raw_path.starts_with(ASSET_PREFIX) {
        return HandlerResult::Handler(Handler::Asset);
    }

    let metadata = match fs::metadata(&ctx.resolved_path).await {
        Ok(metadata) => metadata,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            debug!("No entry at {}", ctx.resolved_path.display());
            return HandlerResult::status(StatusCode::NOT_FOUND);
        }
        Err(err) => {
            error!("Failed to stat {}: {}", ctx.resolved_path.display(), err);
            return HandlerResult::status(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };

    if metadata.is_dir() {
        if ctx.method == Method::POST {
            HandlerResult::Handler(Handler::Upload)
        } else {
            HandlerResult::Handler(Handler::DirectoryListing)
        }
    } else if metadata.is_file() {
        HandlerResult::Handler(Handler::File)
    } else {
        // sockets, fifos and devices are never served
        HandlerResult::status(StatusCode::NOT_FOUND)
    }
}
