//! Shared utilities for integration and load testing.

use std::net::SocketAddr;
use std::path::PathBuf;

use task_api::config::ApiConfig;
use task_api::http::HttpServer;
use task_api::lifecycle::Shutdown;
use task_api::Store;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// A running API server on an ephemeral local port.
pub struct TestServer {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub handle: JoinHandle<Result<(), std::io::Error>>,
}

#[allow(dead_code)]
impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Trigger shutdown and wait for the server task to finish.
    pub async fn stop(self) {
        self.shutdown.trigger();
        let _ = self.handle.await;
    }
}

/// Start a server over `store` with default settings.
pub async fn spawn_server(store: Store) -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let mut config = ApiConfig::default();
    config.listener.bind_address = addr.to_string();

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config, store, shutdown.clone()).unwrap();
    let server_shutdown = shutdown.subscribe();
    let handle = tokio::spawn(async move { server.run(listener, server_shutdown).await });

    TestServer {
        addr,
        shutdown,
        handle,
    }
}

/// Client that never reuses connections or goes through a proxy.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}

/// Unique path under the system temp directory.
#[allow(dead_code)]
pub fn temp_store_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("{}-{}.json", name, uuid::Uuid::new_v4()))
}
