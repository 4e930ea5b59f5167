//! Second, independent containment check run after the context is built.
//!
//! This repeats what [`RequestContext::from_parts`](crate::context::RequestContext::from_parts)
//! already enforces, using different machinery, so a bug in one check does not
//! silently admit a traversal.

use std::path::{Component, Path, PathBuf};

use tracing::{error, warn};

use crate::context::RequestContext;
use crate::error::ServeError;

/// Verify `ctx` still points inside `root`.
///
/// 1. The absolute forms of the resolved path and the root must be
///    prefix-contained and free of `..` components.
/// 2. No segment of the original request path may decode to `..`.
/// 3. If the resolved path exists, its canonical form (symlinks followed) must
///    stay under the canonical root.
pub fn verify(ctx: &RequestContext, root: &Path) -> Result<(), ServeError> {
    let violation = || ServeError::SecurityViolation(ctx.original_path.clone());

    let absolute_root = std::path::absolute(root)?;
    let absolute_path = std::path::absolute(&ctx.resolved_path)?;

    if absolute_path
        .components()
        .any(|component| component == Component::ParentDir)
    {
        error!("Resolved path still contains a parent component: {:?}", absolute_path);
        return Err(violation());
    }

    if !absolute_path.starts_with(&absolute_root) {
        error!("Resolved path escaped root: {:?}", absolute_path);
        return Err(violation());
    }

    if original_has_traversal(&ctx.original_path) {
        warn!("Traversal token in request path: {:?}", ctx.original_path);
        return Err(violation());
    }

    if let Some(canonical_path) = canonical_if_exists(&absolute_path)? {
        let canonical_root = absolute_root.canonicalize()?;
        if !canonical_path.starts_with(&canonical_root) {
            warn!(
                "Symlink escape attempt: {:?} resolved to {:?} which is outside {:?}",
                absolute_path, canonical_path, canonical_root
            );
            return Err(violation());
        }
    }

    Ok(())
}

/// Scan the undecoded path segment by segment, decoding each on its own.
fn original_has_traversal(original: &str) -> bool {
    original.split(['/', '\\']).any(|segment| {
        let decoded = urlencoding::decode_binary(segment.as_bytes());
        decoded
            .split(|byte| *byte == b'/' || *byte == b'\\')
            .any(|piece| piece == b"..")
    })
}

fn canonical_if_exists(path: &Path) -> Result<Option<PathBuf>, ServeError> {
    match path.canonicalize() {
        Ok(canonical) => Ok(Some(canonical)),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(err.into()),
    }
}
