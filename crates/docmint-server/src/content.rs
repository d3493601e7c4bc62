//! Byte streams flowing between the template store and the external clients

use axum::body::Bytes;
use futures::stream::{self, BoxStream, StreamExt, TryStreamExt};

/// Streamed document content.
///
/// Produced by the template store on read and consumed by the preview and
/// merge clients, or forwarded to an HTTP response body.
pub type ContentStream = BoxStream<'static, std::io::Result<Bytes>>;

/// Wrap an in-memory buffer as a single-chunk stream
pub fn from_bytes(bytes: Bytes) -> ContentStream {
    stream::once(async move { Ok(bytes) }).boxed()
}

/// Drain a stream into one contiguous buffer
pub async fn collect(mut stream: ContentStream) -> std::io::Result<Bytes> {
    let mut buffer = Vec::new();
    while let Some(chunk) = stream.try_next().await? {
        buffer.extend_from_slice(&chunk);
    }
    Ok(Bytes::from(buffer))
}
