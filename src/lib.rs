//! cogserve: a local byte-range HTTP server for cloud-optimized rasters.
//!
//! Serves files beneath a configurable project root over `GET`/`HEAD` with
//! `Range` support, backed by a bounded LRU cache of recently served
//! ranges. The embedding application starts a [`FileServer`], points it at
//! a project directory, and builds request URLs from the ephemeral port.

pub mod config;
pub mod handler;
pub mod http;
pub mod logger;
pub mod server;
pub mod state;

pub use self::config::Config;
pub use self::server::FileServer;
