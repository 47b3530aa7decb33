//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use tokio::net::TcpListener;

use sluice::http::Responder;
use sluice::{AppConfig, Application, Shutdown};

/// Deterministic test payload: byte `i` is `i % 251`.
pub fn patterned(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}

/// Write a patterned file of `len` bytes under `dir`.
pub fn write_patterned(dir: &Path, name: &str, len: usize) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, patterned(len)).unwrap();
    path
}

/// Config with a small chunk size, ephemeral port and `root` as file root.
pub fn test_config(root: &Path) -> AppConfig {
    let mut config = AppConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.files.root = root.to_path_buf();
    config.files.chunk_size = 1024;
    config.middleware.metrics = false;
    config
}

/// A running server on an ephemeral port.
pub struct TestServer {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Serve `app` around `terminal` in the background.
pub async fn spawn_app(app: Application, terminal: impl Responder) -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let server = app.into_server(terminal);
    let signal = shutdown.subscribe();

    tokio::spawn(async move {
        let _ = server.run(listener, signal).await;
    });

    TestServer { addr, shutdown }
}

/// Serve the configured file root.
pub async fn spawn_file_server(config: AppConfig) -> TestServer {
    let app = Application::new(config);
    let files = app.file_server();
    spawn_app(app, files).await
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
