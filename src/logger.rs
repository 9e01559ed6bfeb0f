//! Logger module
//!
//! Timestamped logging for the file server: lifecycle events, access
//! lines, warnings, and errors. Info and access lines go to stdout,
//! warnings and errors to stderr.

use chrono::Local;
use hyper::Method;
use std::net::SocketAddr;
use std::path::Path;

fn timestamp() -> String {
    Local::now().format("%Y-%m-%d %H:%M:%S%.3f").to_string()
}

/// Write to info/access log
fn write_info(message: &str) {
    println!("[{}] {message}", timestamp());
}

/// Write to error log
fn write_error(message: &str) {
    eprintln!("[{}] {message}", timestamp());
}

pub fn log_server_start(host: &str, port: u16) {
    write_info(&format!(
        "[Server] Range file server listening on http://{host}:{port}/files"
    ));
}

pub fn log_server_stopped(port: u16) {
    write_info(&format!("[Server] Listener on port {port} closed"));
}

pub fn log_root_updated(path: &Path) {
    write_info(&format!("[Server] Project root set to {}", path.display()));
}

pub fn log_root_cleared() {
    write_info("[Server] Project root cleared");
}

pub fn log_invalid_root(path: &Path) {
    write_error(&format!(
        "[WARN] Project root does not exist, clearing: {}",
        path.display()
    ));
}

pub fn log_connection_accepted(peer_addr: &SocketAddr) {
    write_info(&format!("[Connection] Accepted from: {peer_addr}"));
}

pub fn log_connection_error(err: &impl std::fmt::Debug) {
    write_error(&format!("[ERROR] Failed to serve connection: {err:?}"));
}

pub fn log_access(method: &Method, path: &str, status: u16) {
    write_info(&format!("[Access] {method} {path} -> {status}"));
}

pub fn log_read_error(path: &Path, err: &std::io::Error) {
    write_error(&format!(
        "[ERROR] Failed to read '{}': {err}",
        path.display()
    ));
}

pub fn log_error(message: &str) {
    write_error(&format!("[ERROR] {message}"));
}

pub fn log_warning(message: &str) {
    write_error(&format!("[WARN] {message}"));
}
