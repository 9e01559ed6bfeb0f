//! Request handling module
//!
//! Entry point for HTTP request processing: method gating, `/files` base
//! path routing, and access logging.

pub mod files;

use hyper::{Method, Request, Response};
use std::convert::Infallible;
use std::sync::Arc;

use crate::http::response::{self, ResponseBody};
use crate::logger;
use crate::state::ServerState;

/// Base path all file requests live under.
pub const FILES_PREFIX: &str = "/files";

/// Main entry point for HTTP request handling.
///
/// Per-request state machine, first applicable step terminal: OPTIONS
/// preflight, method gate, base-path match, then the file dispatch in
/// [`files::serve`].
pub async fn handle_request(
    req: Request<hyper::body::Incoming>,
    state: Arc<ServerState>,
) -> Result<Response<ResponseBody>, Infallible> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    // CORS preflight answers immediately, no file touched.
    if method == Method::OPTIONS {
        return Ok(log_and_return(&state, &method, &path, response::build_options_response()));
    }

    let is_head = method == Method::HEAD;
    if !is_head && method != Method::GET {
        return Ok(log_and_return(&state, &method, &path, response::build_405_response()));
    }

    let Some(rel_path) = strip_files_prefix(&path) else {
        return Ok(log_and_return(
            &state,
            &method,
            &path,
            response::build_404_response(response::MSG_NOT_FOUND),
        ));
    };

    let range_header = req
        .headers()
        .get("range")
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string);

    let resp = files::serve(&state, rel_path, is_head, range_header.as_deref()).await;
    Ok(log_and_return(&state, &method, &path, resp))
}

/// Match the `/files` base path; `/filesystem` and friends do not count.
fn strip_files_prefix(path: &str) -> Option<&str> {
    let rel = path.strip_prefix(FILES_PREFIX)?;
    if rel.is_empty() || rel.starts_with('/') {
        Some(rel)
    } else {
        None
    }
}

fn log_and_return(
    state: &ServerState,
    method: &Method,
    path: &str,
    resp: Response<ResponseBody>,
) -> Response<ResponseBody> {
    if state.config.logging.access_log {
        logger::log_access(method, path, resp.status().as_u16());
    }
    resp
}
