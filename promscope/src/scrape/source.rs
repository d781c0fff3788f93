//! Bounded reads of scrape payloads from files and HTTP responses

use std::{
    io,
    path::{Path, PathBuf},
};

use async_compression::tokio::bufread::GzipDecoder;
use futures::TryStreamExt;
use metrics::counter;
use reqwest::{
    StatusCode,
    header::{CONTENT_ENCODING, CONTENT_TYPE},
};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio_util::io::StreamReader;
use tracing::warn;

/// Errors produced while reading a payload
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The payload reached the configured ceiling
    #[error("Body size exceeded limit of {limit} bytes")]
    SizeLimitExceeded {
        /// The ceiling, in bytes
        limit: u64,
    },
    /// The target answered with a non-success status
    #[error("Server returned HTTP status {0}")]
    Status(StatusCode),
    /// The request could not be completed
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),
    /// The response body could not be read or decompressed
    #[error("Failed to read response body: {0}")]
    Decode(#[source] Box<io::Error>),
    /// The payload file could not be opened
    #[error("Failed to open file {path:?} to scrape metrics: {source}")]
    Open {
        /// File path
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: Box<io::Error>,
    },
    /// The payload file could not be read
    #[error("Failed reading file {path:?} to scrape metrics: {source}")]
    Read {
        /// File path
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: Box<io::Error>,
    },
}

impl Error {
    /// Whether the error originates from the source itself rather than from
    /// the limits we impose on it
    #[must_use]
    pub fn is_upstream(&self) -> bool {
        !matches!(self, Self::SizeLimitExceeded { .. })
    }
}

/// Read a payload from `path`.
///
/// # Errors
///
/// Fails if the file cannot be opened or read, or holds `limit` bytes or
/// more.
pub async fn read_file(path: &Path, limit: u64) -> Result<Vec<u8>, Error> {
    let file = tokio::fs::File::open(path)
        .await
        .map_err(|source| Error::Open {
            path: path.to_path_buf(),
            source: Box::new(source),
        })?;
    let body = read_limited(file, limit)
        .await
        .map_err(|source| Error::Read {
            path: path.to_path_buf(),
            source: Box::new(source),
        })?;
    check_limit(body, limit)
}

/// Read the body of `response`, decompressing it if it is gzip encoded.
///
/// Returns the response content type, empty if absent, and the body. The
/// limit applies to the decompressed body.
///
/// # Errors
///
/// Fails on a non-success status, on a transport or decompression error, and
/// if the body holds `limit` bytes or more.
pub async fn read_response(
    response: reqwest::Response,
    limit: u64,
) -> Result<(String, Vec<u8>), Error> {
    let status = response.status();
    if !status.is_success() {
        return Err(Error::Status(status));
    }

    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string();
    let gzipped = response
        .headers()
        .get(CONTENT_ENCODING)
        .is_some_and(|value| value.as_bytes().eq_ignore_ascii_case(b"gzip"));

    let reader = StreamReader::new(Box::pin(
        response.bytes_stream().map_err(io::Error::other),
    ));
    let body = if gzipped {
        read_limited(GzipDecoder::new(reader), limit).await
    } else {
        read_limited(reader, limit).await
    }
    .map_err(|e| Error::Decode(Box::new(e)))?;

    Ok((content_type, check_limit(body, limit)?))
}

/// Read at most `limit` bytes from `reader`.
///
/// # Errors
///
/// Propagates errors of the underlying reader.
pub async fn read_limited<R>(reader: R, limit: u64) -> Result<Vec<u8>, io::Error>
where
    R: AsyncRead + Unpin,
{
    let mut body = Vec::new();
    reader.take(limit).read_to_end(&mut body).await?;
    Ok(body)
}

fn check_limit(body: Vec<u8>, limit: u64) -> Result<Vec<u8>, Error> {
    let body_size = body.len() as u64;
    if body_size >= limit {
        warn!(limit_bytes = limit, body_size, "body size limit exceeded");
        return Err(Error::SizeLimitExceeded { limit });
    }
    counter!("bytes_read").increment(body_size);
    Ok(body)
}
