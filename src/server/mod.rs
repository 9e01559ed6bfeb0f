//! Server lifecycle module
//!
//! [`FileServer`] owns the listening socket and the per-instance state
//! (project root + range cache). It binds an OS-assigned ephemeral port so
//! the embedding application can construct request URLs from [`FileServer::port`].

pub mod connection;
pub mod listener;

use std::io;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::atomic::AtomicUsize;
use std::sync::Arc;
use tokio::sync::Notify;

use crate::config::Config;
use crate::http::cache::CacheStats;
use crate::logger;
use crate::state::ServerState;

/// A running byte-range file server bound to an ephemeral local port.
///
/// Dropping the server closes it; `close` can also be called explicitly.
/// Each instance owns its root and cache, so independent servers coexist.
pub struct FileServer {
    port: u16,
    state: Arc<ServerState>,
    shutdown: Arc<Notify>,
}

impl FileServer {
    /// Bind the listener and start accepting connections.
    ///
    /// Must be called from within a tokio runtime. The project root starts
    /// unset; every file request is refused until
    /// [`FileServer::set_project_path`] configures one.
    pub fn start(config: Config) -> io::Result<Self> {
        let addr: SocketAddr = format!("{}:0", config.server.host)
            .parse()
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, format!("{e}")))?;

        let listener = listener::create_listener(addr)?;
        let port = listener.local_addr()?.port();
        let host = config.server.host.clone();

        let state = Arc::new(ServerState::new(config));
        let shutdown = Arc::new(Notify::new());
        let conn_counter = Arc::new(AtomicUsize::new(0));

        let accept_state = Arc::clone(&state);
        let accept_shutdown = Arc::clone(&shutdown);
        tokio::spawn(async move {
            let closed = accept_shutdown.notified();
            tokio::pin!(closed);
            loop {
                tokio::select! {
                    () = &mut closed => break,
                    accepted = listener.accept() => match accepted {
                        Ok((stream, peer_addr)) => {
                            connection::accept_connection(
                                stream,
                                peer_addr,
                                &accept_state,
                                &conn_counter,
                            );
                        }
                        Err(e) => logger::log_warning(&format!("Accept failed: {e}")),
                    },
                }
            }
            // Listener drops here, releasing the socket. In-flight
            // connections run to completion in their own tasks.
            logger::log_server_stopped(port);
        });

        logger::log_server_start(&host, port);
        Ok(Self {
            port,
            state,
            shutdown,
        })
    }

    /// The OS-assigned port this server is listening on.
    #[must_use]
    pub const fn port(&self) -> u16 {
        self.port
    }

    /// Update (or clear) the servable project root.
    pub async fn set_project_path(&self, path: Option<&Path>) {
        self.state.set_project_path(path).await;
    }

    /// Snapshot of the range cache counters.
    #[must_use]
    pub fn cache_stats(&self) -> CacheStats {
        self.state.cache_stats()
    }

    /// Stop accepting connections and release the listening socket. The
    /// cache is discarded with the server; nothing persists.
    pub fn close(&self) {
        self.shutdown.notify_one();
    }
}

impl Drop for FileServer {
    fn drop(&mut self) {
        self.shutdown.notify_one();
    }
}
