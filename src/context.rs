//! Per-request state derived from the incoming request and the served root.

use std::path::{Component, Path, PathBuf};

use axum::http::{HeaderMap, Method, header, request::Parts};
use bytes::Bytes;
use tracing::warn;

use crate::error::ServeError;

/// Everything later pipeline stages need to know about one request.
///
/// Built once by [`RequestContext::from_parts`]; the only later mutation is
/// attaching the collected body.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub method: Method,
    /// Request path exactly as received (still percent-encoded)
    pub original_path: String,
    /// Percent-decoded request path
    pub raw_path: String,
    /// `raw_path` joined onto the root and lexically normalized
    pub resolved_path: PathBuf,
    pub query: Option<String>,
    pub headers: HeaderMap,
    pub body: Option<Bytes>,
}

impl RequestContext {
    /// Derive the context for a request, failing closed on any traversal.
    pub fn from_parts(parts: &Parts, root: &Path) -> Result<Self, ServeError> {
        let original_path = parts.uri.path().to_string();
        let raw_path = decode_path(&original_path);

        if raw_path.contains('\0') {
            warn!("Request path contains null byte: {:?}", original_path);
            return Err(ServeError::SecurityViolation(original_path));
        }

        // Rejected regardless of where normalization would land.
        if has_parent_segment(&raw_path) {
            warn!("Path traversal attempt detected: {:?}", original_path);
            return Err(ServeError::SecurityViolation(original_path));
        }

        let relative = raw_path.trim_start_matches(['/', '\\']);
        let resolved_path = normalize_path(&root.join(relative));

        if !resolved_path.starts_with(root) {
            warn!(
                "Request path {:?} resolved outside root: {:?}",
                original_path, resolved_path
            );
            return Err(ServeError::SecurityViolation(original_path));
        }

        Ok(Self {
            method: parts.method.clone(),
            original_path,
            raw_path,
            resolved_path,
            query: parts.uri.query().map(str::to_string),
            headers: parts.headers.clone(),
            body: None,
        })
    }

    pub fn attach_body(&mut self, body: Bytes) {
        self.body = Some(body);
    }

    /// Collected body, empty until one has been attached.
    pub fn body_bytes(&self) -> &[u8] {
        self.body.as_deref().unwrap_or_default()
    }

    pub fn content_type(&self) -> Option<&str> {
        self.headers
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
    }
}

/// Percent-decode a URL path. Invalid UTF-8 is replaced rather than rejected.
pub fn decode_path(path: &str) -> String {
    let decoded = urlencoding::decode_binary(path.as_bytes());
    String::from_utf8_lossy(&decoded).into_owned()
}

/// True if any `/`- or `\`-separated segment is exactly `..`.
pub fn has_parent_segment(path: &str) -> bool {
    path.split(['/', '\\']).any(|segment| segment == "..")
}

/// Collapse `.` and `..` components without touching the filesystem.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir | Component::Normal(_) => {
                normalized.push(component.as_os_str());
            }
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
        }
    }
    normalized
}
