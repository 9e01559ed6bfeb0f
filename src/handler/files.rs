//! File serving module
//!
//! The per-request dispatch for `/files`: resolves the request path against
//! the project root, stats the target, and serves it as a HEAD
//! short-circuit, a chunked full-file stream, or a ranged read through the
//! byte-range cache.

use hyper::body::Bytes;
use hyper::Response;
use std::io::{self, SeekFrom};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::{AsyncReadExt, AsyncSeekExt};

use crate::http::cache;
use crate::http::range::RangeParseResult;
use crate::http::response::{self, ResponseBody};
use crate::http::{parse_range_header, ByteRange};
use crate::logger;
use crate::state::ServerState;

/// Request-scoped failures, each mapped to one response. None of these
/// terminate the server or leave a partial cache entry behind.
enum ServeError {
    /// No project root configured
    RootNotConfigured,
    /// Path does not exist
    NotFound,
    /// Path exists but is not a regular file
    NotAFile,
    /// Malformed Range header; carries the file size for `Content-Range: */n`
    InvalidRange(u64),
    /// Well-formed Range that cannot be satisfied
    NotSatisfiable(u64),
    /// Open/seek/read failure on the positional-read or open path
    Read(io::Error),
}

impl ServeError {
    fn into_response(self) -> Response<ResponseBody> {
        match self {
            Self::RootNotConfigured => response::build_404_response(response::MSG_NO_ROOT),
            Self::NotFound => response::build_404_response(response::MSG_NOT_FOUND),
            Self::NotAFile => response::build_404_response(response::MSG_NOT_A_FILE),
            Self::InvalidRange(total) => response::build_416_response("Invalid Range", total),
            Self::NotSatisfiable(total) => {
                response::build_416_response("Range Not Satisfiable", total)
            }
            Self::Read(_) => response::build_500_response(),
        }
    }
}

/// Map a request path onto the project root.
///
/// Leading slashes are trimmed and every `..` substring is removed before
/// joining. This is a blunt sanitization: it does not canonicalize
/// symlinks. Sufficient for a loopback server fronting a user-chosen
/// project directory.
#[must_use]
pub fn resolve_path(root: &Path, request_path: &str) -> PathBuf {
    let clean = request_path.replace("..", "");
    // Trim after the removal: stripping ".." can surface a leading slash,
    // and joining an absolute path would replace the root outright.
    root.join(clean.trim_start_matches('/'))
}

/// Serve one `/files` request. Never fails the hyper service; every error
/// becomes a plain error response.
pub async fn serve(
    state: &ServerState,
    request_path: &str,
    is_head: bool,
    range_header: Option<&str>,
) -> Response<ResponseBody> {
    match serve_inner(state, request_path, is_head, range_header).await {
        Ok(resp) => resp,
        Err(err) => err.into_response(),
    }
}

async fn serve_inner(
    state: &ServerState,
    request_path: &str,
    is_head: bool,
    range_header: Option<&str>,
) -> Result<Response<ResponseBody>, ServeError> {
    let root = state.root().await.ok_or(ServeError::RootNotConfigured)?;
    let file_path = resolve_path(&root, request_path);

    let meta = fs::metadata(&file_path)
        .await
        .map_err(|_| ServeError::NotFound)?;
    if !meta.is_file() {
        return Err(ServeError::NotAFile);
    }
    let total = meta.len();

    // HEAD reports full-length headers without touching the file, even
    // when a Range header is present.
    if is_head {
        return Ok(response::build_head_response(total));
    }

    let Some(header) = range_header else {
        return serve_full_stream(state, &file_path, total).await;
    };

    match parse_range_header(header, total) {
        RangeParseResult::Invalid => Err(ServeError::InvalidRange(total)),
        RangeParseResult::NotSatisfiable => Err(ServeError::NotSatisfiable(total)),
        RangeParseResult::Valid(range) => serve_range(state, &file_path, range, total).await,
    }
}

/// Full-file path: sequential chunked stream, bounded by the configured
/// high-water mark so large rasters are never buffered whole.
async fn serve_full_stream(
    state: &ServerState,
    file_path: &Path,
    total: u64,
) -> Result<Response<ResponseBody>, ServeError> {
    let file = fs::File::open(file_path).await.map_err(|e| {
        logger::log_read_error(file_path, &e);
        ServeError::Read(e)
    })?;
    Ok(response::build_full_stream_response(
        file,
        total,
        state.config.stream.chunk_size,
    ))
}

/// Ranged path: cache lookup, then a single positional read on miss. Only
/// ranges at or below the cacheable ceiling are offered to the cache.
async fn serve_range(
    state: &ServerState,
    file_path: &Path,
    range: ByteRange,
    total: u64,
) -> Result<Response<ResponseBody>, ServeError> {
    let length = range.length();
    let key = cache::cache_key(file_path, range.start, range.end);

    if let Some(buf) = state.with_cache(|c| c.get(&key)) {
        // A length mismatch is treated as a miss
        if usize::try_from(length).is_ok_and(|l| buf.len() == l) {
            return Ok(response::build_partial_response(
                buf,
                range.start,
                range.end,
                total,
            ));
        }
    }

    let data = read_range(file_path, range.start, length)
        .await
        .map_err(|e| {
            logger::log_read_error(file_path, &e);
            ServeError::Read(e)
        })?;

    if length <= state.config.cache.max_cacheable_range {
        state.with_cache(|c| c.put(key, data.clone()));
    }

    Ok(response::build_partial_response(
        data,
        range.start,
        range.end,
        total,
    ))
}

/// One positional read: open, seek, fill the exact requested length.
async fn read_range(path: &Path, start: u64, length: u64) -> io::Result<Bytes> {
    let length = usize::try_from(length)
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "range exceeds address space"))?;
    let mut file = fs::File::open(path).await?;
    file.seek(SeekFrom::Start(start)).await?;
    let mut buf = vec![0_u8; length];
    file.read_exact(&mut buf).await?;
    Ok(Bytes::from(buf))
}
