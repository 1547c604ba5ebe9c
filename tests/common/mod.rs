//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::oneshot;

use edge_proxy::config::EdgeConfig;
use edge_proxy::http::HttpServer;
use edge_proxy::lifecycle::Shutdown;

pub const PASSWORD: &str = "swordfish";

/// A raw TCP upstream that answers every connection with the same bytes.
pub struct MockUpstream {
    pub addr: SocketAddr,
    pub requests: Arc<Mutex<Vec<String>>>,
}

impl MockUpstream {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn last_request(&self) -> Option<String> {
        self.requests.lock().unwrap().last().cloned()
    }
}

/// Build a raw HTTP/1.1 response.
pub fn http_response(status_line: &str, headers: &[(&str, &str)], body: &str) -> String {
    let mut response = format!("HTTP/1.1 {}\r\n", status_line);
    for (name, value) in headers {
        response.push_str(&format!("{}: {}\r\n", name, value));
    }
    response.push_str(&format!(
        "Content-Length: {}\r\nConnection: close\r\n\r\n{}",
        body.len(),
        body
    ));
    response
}

/// Start a mock upstream on an ephemeral port returning `response` verbatim.
pub async fn start_mock_upstream(response: String) -> MockUpstream {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let requests = Arc::new(Mutex::new(Vec::new()));
    let seen = requests.clone();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let response = response.clone();
            let seen = seen.clone();
            tokio::spawn(async move {
                let mut buf = vec![0u8; 8192];
                let n = socket.read(&mut buf).await.unwrap_or(0);
                seen.lock().unwrap().push(String::from_utf8_lossy(&buf[..n]).into_owned());
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
                tokio::time::sleep(Duration::from_millis(10)).await;
            });
        }
    });

    MockUpstream { addr, requests }
}

/// Start an upstream that accepts connections and never answers.
pub async fn start_hanging_upstream() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });

    addr
}

/// An upstream that sends headers and `first_chunk` of a chunked body,
/// then holds the connection open without finishing it.
pub struct StalledUpstream {
    pub addr: SocketAddr,
    /// Fires when the peer closes the connection.
    pub closed: oneshot::Receiver<()>,
}

pub async fn start_stalled_upstream(first_chunk: &'static str) -> StalledUpstream {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (closed_tx, closed) = oneshot::channel();

    tokio::spawn(async move {
        let Ok((mut socket, _)) = listener.accept().await else {
            return;
        };
        let mut buf = vec![0u8; 8192];
        let _ = socket.read(&mut buf).await;

        let head = format!(
            "HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\nTransfer-Encoding: chunked\r\n\r\n{:x}\r\n{}\r\n",
            first_chunk.len(),
            first_chunk
        );
        let _ = socket.write_all(head.as_bytes()).await;
        let _ = socket.flush().await;

        // Never send the terminating chunk; wait for the peer to hang up.
        loop {
            match socket.read(&mut buf).await {
                Ok(0) | Err(_) => break,
                Ok(_) => {}
            }
        }
        let _ = closed_tx.send(());
    });

    StalledUpstream { addr, closed }
}

/// An address nothing listens on.
pub async fn closed_port() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

/// A throwaway project root with pages and assets.
pub fn site() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write(root, "index.html", "<script>const H='{{PASSWORD}}';</script>index");
    write(root, "player.html", "<script>const H='{{PASSWORD}}';</script>player");
    write(root, "watch.html", "watch");
    write(root, "about.html", "about {{PASSWORD}}");
    write(root, "contact.html", "contact");
    write(root, "style.css", "body { color: red; }");
    write(root, "js/app.js", "console.log('app');");
    std::fs::create_dir_all(root.join("assets.d")).unwrap();
    dir
}

pub fn write(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, content).unwrap();
}

/// Defaults with the given root and password; 127.0.0.1 is reachable so
/// mock upstreams can be proxied to, `localhost` stays blocked.
pub fn test_config(root: &Path, password: &str) -> EdgeConfig {
    let mut config = EdgeConfig::default();
    config.site.root = root.to_path_buf();
    config.proxy.password = password.to_string();
    config.proxy.timeout_ms = 1_000;
    config.ssrf.blocked_hosts = vec!["localhost".to_string(), "0.0.0.0".to_string()];
    config
}

/// Start the edge server on an ephemeral port.
pub async fn start_edge(config: EdgeConfig) -> (SocketAddr, Shutdown) {
    let server = HttpServer::new(config).unwrap();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let signal = shutdown.subscribe();

    tokio::spawn(async move {
        let _ = server.run(listener, signal).await;
    });

    (addr, shutdown)
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .no_proxy()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap()
}
