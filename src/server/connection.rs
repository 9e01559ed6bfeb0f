// Connection handling module
// Accepts and serves a single TCP connection

use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::handler;
use crate::logger;
use crate::state::ServerState;

/// Accept a connection, enforcing the optional connection bound.
///
/// The counter is incremented before the limit check so two racing accepts
/// cannot both slip under the bound.
pub fn accept_connection(
    stream: tokio::net::TcpStream,
    peer_addr: std::net::SocketAddr,
    state: &Arc<ServerState>,
    conn_counter: &Arc<AtomicUsize>,
) {
    let prev_count = conn_counter.fetch_add(1, Ordering::SeqCst);

    if let Some(max_conn) = state.config.performance.max_connections {
        if prev_count >= usize::try_from(max_conn).unwrap_or(usize::MAX) {
            conn_counter.fetch_sub(1, Ordering::SeqCst);
            logger::log_warning(&format!(
                "Max connections reached: {prev_count}/{max_conn}. Connection rejected."
            ));
            drop(stream);
            return;
        }
    }

    if state.config.logging.access_log {
        logger::log_connection_accepted(&peer_addr);
    }

    handle_connection(stream, Arc::clone(state), Arc::clone(conn_counter));
}

/// Serve a single connection in a spawned task.
///
/// The optional whole-connection timeout is off by default; a range client
/// streaming a large raster may legitimately hold a connection for a long
/// time.
fn handle_connection(
    stream: tokio::net::TcpStream,
    state: Arc<ServerState>,
    conn_counter: Arc<AtomicUsize>,
) {
    tokio::spawn(async move {
        let io = TokioIo::new(stream);
        let timeout_secs = state.config.performance.connection_timeout;

        let conn = http1::Builder::new().keep_alive(true).serve_connection(
            io,
            service_fn(move |req| {
                let state = Arc::clone(&state);
                async move { handler::handle_request(req, state).await }
            }),
        );

        match timeout_secs {
            Some(secs) => {
                let duration = std::time::Duration::from_secs(secs);
                match tokio::time::timeout(duration, conn).await {
                    Ok(Ok(())) => {}
                    Ok(Err(err)) => logger::log_connection_error(&err),
                    Err(_) => {
                        logger::log_warning(&format!("Connection timeout after {secs} seconds"));
                    }
                }
            }
            None => {
                if let Err(err) = conn.await {
                    // A client tearing down mid-stream lands here; the file
                    // handle inside the body stream is dropped with it.
                    logger::log_connection_error(&err);
                }
            }
        }

        conn_counter.fetch_sub(1, Ordering::SeqCst);
    });
}
