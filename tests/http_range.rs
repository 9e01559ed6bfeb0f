//! End-to-end tests: boot a real `FileServer` on an ephemeral port and
//! speak HTTP/1.1 to it over a plain TCP stream.

use std::path::Path;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use cogserve::{Config, FileServer};

/// A parsed HTTP/1.1 response.
struct RawResponse {
    status: u16,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
}

impl RawResponse {
    fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Send one request and read the connection to EOF. `Connection: close` is
/// always included so the server ends the connection after the response.
async fn request(port: u16, method: &str, path: &str, extra_headers: &[(&str, &str)]) -> RawResponse {
    let mut raw = format!("{method} {path} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n");
    for (name, value) in extra_headers {
        raw.push_str(&format!("{name}: {value}\r\n"));
    }
    raw.push_str("\r\n");

    let mut stream = TcpStream::connect(("127.0.0.1", port))
        .await
        .expect("connect");
    stream.write_all(raw.as_bytes()).await.expect("send");
    let mut buf = Vec::new();
    stream.read_to_end(&mut buf).await.expect("receive");
    parse_response(&buf)
}

fn parse_response(raw: &[u8]) -> RawResponse {
    let split = raw
        .windows(4)
        .position(|w| w == b"\r\n\r\n")
        .expect("header terminator");
    let head = std::str::from_utf8(&raw[..split]).expect("ascii headers");
    let body = raw[split + 4..].to_vec();

    let mut lines = head.lines();
    let status_line = lines.next().expect("status line");
    let status: u16 = status_line
        .split_whitespace()
        .nth(1)
        .expect("status code")
        .parse()
        .expect("numeric status");

    let headers = lines
        .filter_map(|line| {
            let (name, value) = line.split_once(':')?;
            Some((name.trim().to_string(), value.trim().to_string()))
        })
        .collect();

    RawResponse {
        status,
        headers,
        body,
    }
}

/// A server with a tempdir root containing `data.bin` filled with a
/// 1000-byte repeating pattern.
async fn server_with_fixture() -> (FileServer, tempfile::TempDir, Vec<u8>) {
    let content: Vec<u8> = (0..1000_u32)
        .map(|i| u8::try_from(i % 256).unwrap())
        .collect();
    let dir = tempfile::tempdir().expect("tempdir");
    tokio::fs::write(dir.path().join("data.bin"), &content)
        .await
        .expect("write fixture");

    let server = FileServer::start(Config::default()).expect("start server");
    server.set_project_path(Some(dir.path())).await;
    (server, dir, content)
}

#[tokio::test]
async fn test_range_first_100_bytes() {
    let (server, _dir, content) = server_with_fixture().await;
    let resp = request(
        server.port(),
        "GET",
        "/files/data.bin",
        &[("Range", "bytes=0-99")],
    )
    .await;

    assert_eq!(resp.status, 206);
    assert_eq!(resp.header("Content-Range"), Some("bytes 0-99/1000"));
    assert_eq!(resp.header("Content-Length"), Some("100"));
    assert_eq!(resp.header("Accept-Ranges"), Some("bytes"));
    assert_eq!(&resp.body[..], &content[..100]);
}

#[tokio::test]
async fn test_open_ended_range_tail() {
    let (server, _dir, content) = server_with_fixture().await;
    let resp = request(
        server.port(),
        "GET",
        "/files/data.bin",
        &[("Range", "bytes=900-")],
    )
    .await;

    assert_eq!(resp.status, 206);
    assert_eq!(resp.header("Content-Range"), Some("bytes 900-999/1000"));
    assert_eq!(&resp.body[..], &content[900..]);
}

#[tokio::test]
async fn test_malformed_range_416() {
    let (server, _dir, _content) = server_with_fixture().await;
    let resp = request(
        server.port(),
        "GET",
        "/files/data.bin",
        &[("Range", "bytes=abc")],
    )
    .await;

    assert_eq!(resp.status, 416);
    assert_eq!(&resp.body[..], b"Invalid Range");
    // CORS headers accompany error responses too
    assert_eq!(resp.header("Access-Control-Allow-Origin"), Some("*"));
}

#[tokio::test]
async fn test_full_file_without_range() {
    let (server, _dir, content) = server_with_fixture().await;
    let resp = request(server.port(), "GET", "/files/data.bin", &[]).await;

    assert_eq!(resp.status, 200);
    assert_eq!(resp.header("Content-Length"), Some("1000"));
    assert_eq!(resp.header("Accept-Ranges"), Some("bytes"));
    assert_eq!(resp.body, content);
}

#[tokio::test]
async fn test_streaming_large_file() {
    // Larger than the 256 KiB chunk high-water mark, so the sequential
    // path must deliver multiple chunks.
    let content: Vec<u8> = (0..1_000_000_u32)
        .map(|i| u8::try_from((i * 7 + 13) % 256).unwrap())
        .collect();
    let dir = tempfile::tempdir().expect("tempdir");
    tokio::fs::write(dir.path().join("big.tif"), &content)
        .await
        .expect("write fixture");

    let server = FileServer::start(Config::default()).expect("start server");
    server.set_project_path(Some(dir.path())).await;

    let resp = request(server.port(), "GET", "/files/big.tif", &[]).await;
    assert_eq!(resp.status, 200);
    assert_eq!(resp.header("Content-Length"), Some("1000000"));
    assert_eq!(resp.body, content);
}

#[tokio::test]
async fn test_head_reports_full_length_and_ignores_range() {
    let (server, _dir, _content) = server_with_fixture().await;
    let resp = request(
        server.port(),
        "HEAD",
        "/files/data.bin",
        &[("Range", "bytes=0-99")],
    )
    .await;

    assert_eq!(resp.status, 200);
    assert_eq!(resp.header("Content-Length"), Some("1000"));
    assert_eq!(resp.header("Accept-Ranges"), Some("bytes"));
    assert!(resp.body.is_empty());
}

#[tokio::test]
async fn test_options_preflight() {
    let (server, _dir, _content) = server_with_fixture().await;
    let resp = request(server.port(), "OPTIONS", "/files/data.bin", &[]).await;

    assert_eq!(resp.status, 200);
    assert_eq!(resp.header("Access-Control-Allow-Origin"), Some("*"));
    assert_eq!(
        resp.header("Access-Control-Allow-Methods"),
        Some("GET, OPTIONS, HEAD")
    );
    assert_eq!(resp.header("Access-Control-Allow-Headers"), Some("Range"));
    assert_eq!(
        resp.header("Access-Control-Expose-Headers"),
        Some("Content-Range, Content-Length, Accept-Ranges")
    );
    assert!(resp.body.is_empty());
}

#[tokio::test]
async fn test_post_not_allowed() {
    let (server, _dir, _content) = server_with_fixture().await;
    let resp = request(server.port(), "POST", "/files/data.bin", &[]).await;
    assert_eq!(resp.status, 405);
}

#[tokio::test]
async fn test_unset_root_refuses_requests() {
    let server = FileServer::start(Config::default()).expect("start server");
    let resp = request(server.port(), "GET", "/files/data.bin", &[]).await;
    assert_eq!(resp.status, 404);
    assert_eq!(&resp.body[..], b"Project path not set.");
}

#[tokio::test]
async fn test_clearing_root_refuses_requests_again() {
    let (server, _dir, _content) = server_with_fixture().await;

    server.set_project_path(None).await;
    let resp = request(server.port(), "GET", "/files/data.bin", &[]).await;
    assert_eq!(resp.status, 404);
    assert_eq!(&resp.body[..], b"Project path not set.");
}

#[tokio::test]
async fn test_missing_file_404() {
    let (server, _dir, _content) = server_with_fixture().await;
    let resp = request(server.port(), "GET", "/files/absent.bin", &[]).await;
    assert_eq!(resp.status, 404);
    assert_eq!(&resp.body[..], b"File not found.");
}

#[tokio::test]
async fn test_traversal_stays_inside_root() {
    let (server, _dir, _content) = server_with_fixture().await;
    let resp = request(server.port(), "GET", "/files/../../secret", &[]).await;
    // Traversal segments are stripped, the sanitized path is missing
    // beneath the root, so the request 404s instead of escaping.
    assert_eq!(resp.status, 404);
}

#[tokio::test]
async fn test_path_outside_files_prefix_404() {
    let (server, _dir, _content) = server_with_fixture().await;
    let resp = request(server.port(), "GET", "/other/data.bin", &[]).await;
    assert_eq!(resp.status, 404);
}

#[tokio::test]
async fn test_repeat_range_served_from_cache() {
    let (server, _dir, _content) = server_with_fixture().await;

    let first = request(
        server.port(),
        "GET",
        "/files/data.bin",
        &[("Range", "bytes=0-99")],
    )
    .await;
    let second = request(
        server.port(),
        "GET",
        "/files/data.bin",
        &[("Range", "bytes=0-99")],
    )
    .await;

    assert_eq!(first.body, second.body, "cached body must be byte-identical");
    let stats = server.cache_stats();
    assert_eq!(stats.misses, 1, "only the first request reads the disk");
    assert_eq!(stats.hits, 1);
}

#[tokio::test]
async fn test_independent_servers_do_not_share_state() {
    let (server_a, _dir_a, _content) = server_with_fixture().await;
    let server_b = FileServer::start(Config::default()).expect("second server");

    assert_ne!(server_a.port(), server_b.port());

    // server_b has no root; the same request that succeeds on a fails on b
    let ok = request(
        server_a.port(),
        "GET",
        "/files/data.bin",
        &[("Range", "bytes=0-9")],
    )
    .await;
    assert_eq!(ok.status, 206);

    let refused = request(server_b.port(), "GET", "/files/data.bin", &[]).await;
    assert_eq!(refused.status, 404);
    assert_eq!(server_b.cache_stats().insertions, 0);
}

#[tokio::test]
async fn test_close_releases_listener() {
    let (server, _dir, _content) = server_with_fixture().await;
    let port = server.port();

    server.close();
    tokio::time::sleep(Duration::from_millis(200)).await;

    assert!(
        TcpStream::connect(("127.0.0.1", port)).await.is_err(),
        "closed server must not accept new connections"
    );
}

#[tokio::test]
async fn test_set_project_path_with_missing_dir_clears_root() {
    let (server, _dir, _content) = server_with_fixture().await;

    server
        .set_project_path(Some(Path::new("/no/such/dir/at/all")))
        .await;
    let resp = request(server.port(), "GET", "/files/data.bin", &[]).await;
    assert_eq!(resp.status, 404);
    assert_eq!(&resp.body[..], b"Project path not set.");
}
