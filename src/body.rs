//! Bounded request-body accumulation.

use axum::body::Body;
use bytes::{Bytes, BytesMut};
use futures::StreamExt;
use tracing::{debug, warn};

use crate::error::ServeError;

/// Read the whole body into one buffer, in arrival order.
///
/// Fails with [`ServeError::BodyTooLarge`] as soon as the running total would
/// pass `limit`; the partial buffer is dropped and no further chunks are read.
/// A declared `content_length` above the limit is rejected before reading.
pub async fn collect_body(
    body: Body,
    content_length: Option<u64>,
    limit: u64,
) -> Result<Bytes, ServeError> {
    if let Some(declared) = content_length {
        if declared > limit {
            warn!("Declared body of {} bytes exceeds limit of {}", declared, limit);
            return Err(ServeError::BodyTooLarge {
                size: declared,
                limit,
            });
        }
    }

    let mut stream = body.into_data_stream();
    let mut buffer = BytesMut::new();
    let mut total: u64 = 0;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| ServeError::Unclassified(e.to_string()))?;
        total += chunk.len() as u64;
        if total > limit {
            warn!("Request body exceeded limit of {} bytes", limit);
            return Err(ServeError::BodyTooLarge { size: total, limit });
        }
        buffer.extend_from_slice(&chunk);
    }

    debug!("Collected request body of {} bytes", total);
    Ok(buffer.freeze())
}
