//! Shared utilities for integration testing.
#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use route_proxy::config::load_all;
use route_proxy::{HttpServer, ProxyConfig, RouteStore, Shutdown};

/// A running proxy bound to an ephemeral port.
pub struct TestProxy {
    pub addr: SocketAddr,
    pub store: Arc<RouteStore>,
    pub shutdown: Shutdown,
}

impl TestProxy {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

/// Load routes from `routes_dir` and serve them on 127.0.0.1.
pub async fn start_proxy(routes_dir: &Path) -> TestProxy {
    let table = load_all(routes_dir).await.unwrap();
    let store = Arc::new(RouteStore::new(table));
    let shutdown = Shutdown::new();

    let config = ProxyConfig {
        port: 0,
        bind_host: "127.0.0.1".to_string(),
        routes_dir: routes_dir.to_path_buf(),
        views_dir: routes_dir.join("no-views"),
    };

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = HttpServer::new(config, store.clone());
    let rx = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, rx).await;
    });

    TestProxy {
        addr,
        store,
        shutdown,
    }
}

/// Write a route definition file into `dir`.
pub fn write_route(dir: &Path, name: &str, json: &str) {
    std::fs::write(dir.join(name), json).unwrap();
}

/// An HTTP client that never goes through an environment proxy.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}

/// Read until the end of the request head.
async fn read_head(socket: &mut TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    loop {
        let n = socket.read(&mut chunk).await.unwrap_or(0);
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
        if buf.windows(4).any(|w| w == b"\r\n\r\n") {
            break;
        }
    }
    String::from_utf8_lossy(&buf).into_owned()
}

async fn spawn_backend<F, Fut>(handler: F) -> SocketAddr
where
    F: Fn(TcpStream) -> Fut + Send + Sync + 'static,
    Fut: std::future::Future<Output = ()> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handler = Arc::new(handler);
    tokio::spawn(async move {
        while let Ok((socket, _)) = listener.accept().await {
            let handler = handler.clone();
            tokio::spawn(async move { handler(socket).await });
        }
    });
    addr
}

fn ok_response(body: &str) -> String {
    format!(
        "HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        body.len(),
        body
    )
}

/// Answers `"<METHOD> <target>\nhost: <host>\nserved-by: <addr>"` for every request.
pub async fn start_echo_backend() -> SocketAddr {
    spawn_backend(|mut socket| async move {
        let head = read_head(&mut socket).await;
        let request_line = head.lines().next().unwrap_or_default();
        let mut parts = request_line.split_whitespace();
        let method = parts.next().unwrap_or_default();
        let target = parts.next().unwrap_or_default();
        let host = head
            .lines()
            .find_map(|l| {
                let (name, value) = l.split_once(':')?;
                name.eq_ignore_ascii_case("host").then(|| value.trim().to_string())
            })
            .unwrap_or_default();

        let served_by = socket
            .local_addr()
            .map(|a| a.to_string())
            .unwrap_or_default();

        let body = format!("{method} {target}\nhost: {host}\nserved-by: {served_by}");
        let _ = socket.write_all(ok_response(&body).as_bytes()).await;
        let _ = socket.shutdown().await;
    })
    .await
}

/// Sends the response head at once, then the body after `delay`.
pub async fn start_stalled_body_backend(delay: Duration) -> SocketAddr {
    spawn_backend(move |mut socket| async move {
        read_head(&mut socket).await;
        let head = "HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\nContent-Length: 5\r\nConnection: close\r\n\r\n";
        let _ = socket.write_all(head.as_bytes()).await;
        let _ = socket.flush().await;
        tokio::time::sleep(delay).await;
        let _ = socket.write_all(b"hello").await;
        let _ = socket.shutdown().await;
    })
    .await
}

/// Sends the whole response only after `delay`.
pub async fn start_stalled_head_backend(delay: Duration) -> SocketAddr {
    spawn_backend(move |mut socket| async move {
        read_head(&mut socket).await;
        tokio::time::sleep(delay).await;
        let _ = socket.write_all(ok_response("late").as_bytes()).await;
        let _ = socket.shutdown().await;
    })
    .await
}

/// Reads the request and closes the connection without answering.
pub async fn start_closing_backend() -> SocketAddr {
    spawn_backend(|mut socket| async move {
        read_head(&mut socket).await;
        drop(socket);
    })
    .await
}

/// Reads the whole request body, then answers `"received <n> bytes"`.
pub async fn start_draining_backend() -> SocketAddr {
    spawn_backend(|mut socket| async move {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];
        let head_end = loop {
            let n = socket.read(&mut chunk).await.unwrap_or(0);
            if n == 0 {
                return;
            }
            buf.extend_from_slice(&chunk[..n]);
            if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                break pos + 4;
            }
        };

        let head = String::from_utf8_lossy(&buf[..head_end]).into_owned();
        let length: usize = head
            .lines()
            .find_map(|l| {
                let (name, value) = l.split_once(':')?;
                name.eq_ignore_ascii_case("content-length")
                    .then(|| value.trim().parse().ok())
                    .flatten()
            })
            .unwrap_or(0);

        let mut received = buf.len() - head_end;
        while received < length {
            let n = socket.read(&mut chunk).await.unwrap_or(0);
            if n == 0 {
                return;
            }
            received += n;
        }

        let body = format!("received {received} bytes");
        let _ = socket.write_all(ok_response(&body).as_bytes()).await;
        let _ = socket.shutdown().await;
    })
    .await
}

/// POST to the proxy over a raw connection, announcing `declared_len` body
/// bytes and sending `body` one byte every `gap`. Returns the raw response.
pub async fn trickle_post(
    addr: SocketAddr,
    path: &str,
    declared_len: usize,
    body: &[u8],
    gap: Duration,
) -> String {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    let head = format!(
        "POST {path} HTTP/1.1\r\nHost: {addr}\r\nContent-Length: {declared_len}\r\nConnection: close\r\n\r\n"
    );
    stream.write_all(head.as_bytes()).await.unwrap();

    for byte in body {
        tokio::time::sleep(gap).await;
        let _ = stream.write_all(&[*byte]).await;
    }

    let mut response = Vec::new();
    let _ = tokio::time::timeout(Duration::from_secs(5), stream.read_to_end(&mut response)).await;
    String::from_utf8_lossy(&response).into_owned()
}

/// An address with nothing listening on it.
pub async fn refused_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

/// A route definition pointing `context` at `backend`.
pub fn route_json(context: &str, backend: SocketAddr, extra: &str) -> String {
    if extra.is_empty() {
        format!(r#"{{"urlContext": "{context}", "backend": "{backend}"}}"#)
    } else {
        format!(r#"{{"urlContext": "{context}", "backend": "{backend}", {extra}}}"#)
    }
}
