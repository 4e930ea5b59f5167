use std::path::{Component, Path};

use axum::{
    body::Body,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use tokio::fs;
use tokio_util::io::ReaderStream;
use tracing::{debug, info, warn};

use crate::AppState;
use crate::context::RequestContext;
use crate::error::ServeError;
use crate::listing;
use crate::multipart;

/// URL prefix reserved for the listing page's own stylesheet and script.
pub const ASSET_PREFIX: &str = "/__fileshare/";

/// Assets served under the reserved prefix, compiled into the binary so they
/// do not depend on the served root or the build checkout.
pub const ASSETS: &[(&str, &[u8])] = &[
    ("listing.css", include_bytes!("../assets/listing.css")),
    ("listing.js", include_bytes!("../assets/listing.js")),
];

pub const UPLOAD_SUCCESS: &str = "Files uploaded successfully";

/// Terminal operation selected by the router.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handler {
    Asset,
    File,
    DirectoryListing,
    Upload,
}

impl Handler {
    pub async fn run(self, ctx: &RequestContext, state: &AppState) -> Result<Response, ServeError> {
        match self {
            Handler::Asset => serve_asset(ctx).await,
            Handler::File => serve_file(ctx).await,
            Handler::DirectoryListing => list_directory(ctx, state).await,
            Handler::Upload => upload(ctx).await,
        }
    }
}

// ============================================================================
// Helper functions
// ============================================================================

/// Stream a regular file without loading it into memory.
async fn stream_file(path: &Path, what: &str) -> Result<Response, ServeError> {
    let file = fs::File::open(path)
        .await
        .map_err(|e| ServeError::from_open(e, what))?;
    let metadata = file.metadata().await?;

    // opening a directory succeeds on some platforms
    if !metadata.is_file() {
        return Err(ServeError::NotFound(what.to_string()));
    }

    let body = Body::from_stream(ReaderStream::new(file));
    let mime = mime_guess::from_path(path).first_or_octet_stream().to_string();

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, mime),
            (header::CONTENT_LENGTH, metadata.len().to_string()),
        ],
        body,
    )
        .into_response())
}

/// Look up the part of an asset URL after [`ASSET_PREFIX`] in [`ASSETS`].
fn find_asset(name: &str) -> Option<&'static [u8]> {
    ASSETS
        .iter()
        .find(|(asset, _)| *asset == name)
        .map(|(_, data)| *data)
}

/// Pull the boundary out of a `multipart/form-data` content type.
fn extract_boundary(content_type: Option<&str>) -> Result<String, ServeError> {
    let content_type = content_type
        .ok_or_else(|| ServeError::InvalidUpload("Missing Content-Type header".to_string()))?;

    let mut params = content_type.split(';').map(str::trim);
    let mime = params.next().unwrap_or_default();
    if !mime.eq_ignore_ascii_case("multipart/form-data") {
        return Err(ServeError::InvalidUpload(
            "Content-Type must be multipart/form-data".to_string(),
        ));
    }

    let boundary = params
        .filter_map(|param| param.split_once('='))
        .find(|(key, _)| key.trim().eq_ignore_ascii_case("boundary"))
        .map(|(_, value)| value.trim().trim_matches('"'))
        .unwrap_or_default();

    if boundary.is_empty() {
        return Err(ServeError::InvalidUpload(
            "Missing boundary in multipart Content-Type".to_string(),
        ));
    }

    Ok(boundary.to_string())
}

/// A client filename is usable only as a single plain path component.
fn is_plain_filename(filename: &str) -> bool {
    if filename.contains(['/', '\\', '\0']) {
        return false;
    }
    let mut components = Path::new(filename).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

// ============================================================================
// Handlers
// ============================================================================

/// Serve the listing page's bundled assets. Unknown names are 404.
pub async fn serve_asset(ctx: &RequestContext) -> Result<Response, ServeError> {
    let name = ctx
        .raw_path
        .strip_prefix(ASSET_PREFIX)
        .ok_or_else(|| ServeError::NotFound(ctx.raw_path.clone()))?;
    let data = find_asset(name).ok_or_else(|| ServeError::NotFound(ctx.raw_path.clone()))?;

    debug!("Serving asset: {}", name);
    let mime = mime_guess::from_path(name).first_or_octet_stream().to_string();

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, mime),
            (header::CONTENT_LENGTH, data.len().to_string()),
        ],
        Body::from(Bytes::from_static(data)),
    )
        .into_response())
}

/// Stream a file from under the served root.
pub async fn serve_file(ctx: &RequestContext) -> Result<Response, ServeError> {
    debug!("Streaming file: {}", ctx.resolved_path.display());
    stream_file(&ctx.resolved_path, &ctx.raw_path).await
}

/// Render the HTML listing of a directory.
pub async fn list_directory(
    ctx: &RequestContext,
    state: &AppState,
) -> Result<Response, ServeError> {
    let dir = ctx.resolved_path.clone();
    let request_path = ctx.raw_path.clone();
    let is_root = dir == state.root_dir;

    debug!("Listing directory: {}", dir.display());

    let html = tokio::task::spawn_blocking(move || {
        listing::render_directory(&dir, &request_path, is_root)
    })
    .await
    .map_err(|e| ServeError::Unclassified(e.to_string()))??;

    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
        html,
    )
        .into_response())
}

/// Write every file part of a multipart body into the target directory.
///
/// Parts are written one at a time, in body order, overwriting existing
/// files of the same name. A filename that is not a single plain path
/// component fails the whole request with 403 before anything is written.
pub async fn upload(ctx: &RequestContext) -> Result<Response, ServeError> {
    let boundary = extract_boundary(ctx.content_type())?;
    let parts = multipart::decode(ctx.body_bytes(), &boundary);

    // reject the whole request before anything touches the disk
    if let Some(bad) = parts
        .iter()
        .find(|part| !part.filename.is_empty() && !is_plain_filename(&part.filename))
    {
        warn!("Rejected upload filename: {:?}", bad.filename);
        return Err(ServeError::SecurityViolation(bad.filename.clone()));
    }

    if parts.is_empty() {
        debug!("Upload to {} contained no file parts", ctx.raw_path);
    }

    for part in &parts {
        if part.filename.is_empty() {
            debug!("Skipping part {:?} with empty filename", part.name);
            continue;
        }

        let final_path = ctx.resolved_path.join(&part.filename);
        info!(
            "Uploading file: {} ({} bytes)",
            final_path.display(),
            part.data.len()
        );
        fs::write(&final_path, &part.data).await?;
    }

    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        UPLOAD_SUCCESS,
    )
        .into_response())
}
