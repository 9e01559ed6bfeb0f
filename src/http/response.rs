//! HTTP response building module
//!
//! Builders for every status the file server emits. All responses carry the
//! CORS headers the embedding viewer relies on, error responses included.
//! Bodies are boxed so buffered (cache hit, range read) and streamed
//! (full-file) responses share one response type.

use crate::logger;
use futures::StreamExt;
use http_body_util::combinators::BoxBody;
use http_body_util::{BodyExt, Full, StreamBody};
use hyper::body::{Bytes, Frame};
use hyper::Response;
use std::io;
use tokio_util::io::ReaderStream;

/// Body type shared by buffered and streamed responses.
pub type ResponseBody = BoxBody<Bytes, io::Error>;

/// Error body text for 404 when no project root is configured.
pub const MSG_NO_ROOT: &str = "Project path not set.";
/// Error body text for 404 when the path does not exist.
pub const MSG_NOT_FOUND: &str = "File not found.";
/// Error body text for 404 when the path is not a regular file.
pub const MSG_NOT_A_FILE: &str = "Not a file.";

/// Box a fully buffered body.
#[must_use]
pub fn full_body(data: Bytes) -> ResponseBody {
    Full::new(data).map_err(|never| match never {}).boxed()
}

/// Box an empty body.
#[must_use]
pub fn empty_body() -> ResponseBody {
    full_body(Bytes::new())
}

/// Box a chunked file stream. The capacity is the high-water mark: no more
/// than one chunk is buffered ahead of the socket, so a slow consumer
/// suspends the file reads.
#[must_use]
pub fn stream_body(file: tokio::fs::File, chunk_size: usize) -> ResponseBody {
    let stream = ReaderStream::with_capacity(file, chunk_size);
    BodyExt::boxed(StreamBody::new(stream.map(|chunk| chunk.map(Frame::data))))
}

/// Start a response builder carrying the CORS headers every response needs.
fn builder_with_cors(status: u16) -> hyper::http::response::Builder {
    Response::builder()
        .status(status)
        .header("Access-Control-Allow-Origin", "*")
        .header("Access-Control-Allow-Methods", "GET, OPTIONS, HEAD")
        .header("Access-Control-Allow-Headers", "Range")
        .header(
            "Access-Control-Expose-Headers",
            "Content-Range, Content-Length, Accept-Ranges",
        )
}

/// Build the CORS preflight response (200, empty body).
#[must_use]
pub fn build_options_response() -> Response<ResponseBody> {
    builder_with_cors(200)
        .body(empty_body())
        .unwrap_or_else(|e| {
            log_build_error("OPTIONS", &e);
            Response::new(empty_body())
        })
}

/// Build a 404 Not Found response with the given body text.
#[must_use]
pub fn build_404_response(message: &'static str) -> Response<ResponseBody> {
    builder_with_cors(404)
        .header("Content-Type", "text/plain")
        .body(full_body(Bytes::from_static(message.as_bytes())))
        .unwrap_or_else(|e| {
            log_build_error("404", &e);
            Response::new(empty_body())
        })
}

/// Build a 405 Method Not Allowed response.
#[must_use]
pub fn build_405_response() -> Response<ResponseBody> {
    builder_with_cors(405)
        .header("Content-Type", "text/plain")
        .header("Allow", "GET, HEAD, OPTIONS")
        .body(full_body(Bytes::from_static(b"405 Method Not Allowed")))
        .unwrap_or_else(|e| {
            log_build_error("405", &e);
            Response::new(empty_body())
        })
}

/// Build a 416 response for a malformed or unsatisfiable Range header.
#[must_use]
pub fn build_416_response(message: &'static str, total: u64) -> Response<ResponseBody> {
    builder_with_cors(416)
        .header("Content-Type", "text/plain")
        .header("Content-Range", format!("bytes */{total}"))
        .body(full_body(Bytes::from_static(message.as_bytes())))
        .unwrap_or_else(|e| {
            log_build_error("416", &e);
            Response::new(empty_body())
        })
}

/// Build a 500 response for a failed file read.
#[must_use]
pub fn build_500_response() -> Response<ResponseBody> {
    builder_with_cors(500)
        .header("Content-Type", "text/plain")
        .body(full_body(Bytes::from_static(b"Read error")))
        .unwrap_or_else(|e| {
            log_build_error("500", &e);
            Response::new(empty_body())
        })
}

/// Build the HEAD response: full-length headers, empty body. The Range
/// header is deliberately not evaluated on HEAD.
#[must_use]
pub fn build_head_response(total: u64) -> Response<ResponseBody> {
    builder_with_cors(200)
        .header("Accept-Ranges", "bytes")
        .header("Content-Length", total)
        .body(empty_body())
        .unwrap_or_else(|e| {
            log_build_error("HEAD", &e);
            Response::new(empty_body())
        })
}

/// Build the full-file streaming response (no Range header supplied).
#[must_use]
pub fn build_full_stream_response(
    file: tokio::fs::File,
    total: u64,
    chunk_size: usize,
) -> Response<ResponseBody> {
    builder_with_cors(200)
        .header("Accept-Ranges", "bytes")
        .header("Content-Length", total)
        .body(stream_body(file, chunk_size))
        .unwrap_or_else(|e| {
            log_build_error("200", &e);
            Response::new(empty_body())
        })
}

/// Build a 206 Partial Content response from an in-memory range buffer.
#[must_use]
pub fn build_partial_response(
    data: Bytes,
    start: u64,
    end: u64,
    total: u64,
) -> Response<ResponseBody> {
    builder_with_cors(206)
        .header("Accept-Ranges", "bytes")
        .header("Content-Range", format!("bytes {start}-{end}/{total}"))
        .header("Content-Length", end - start + 1)
        .body(full_body(data))
        .unwrap_or_else(|e| {
            log_build_error("206", &e);
            Response::new(empty_body())
        })
}

/// Log a response build error
fn log_build_error(status: &str, error: &hyper::http::Error) {
    logger::log_error(&format!("Failed to build {status} response: {error}"));
}
