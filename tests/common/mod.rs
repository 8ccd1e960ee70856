//! Shared setup for integration tests.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use issue_tracker::config::{StoreBackend, TrackerConfig};
use issue_tracker::{HttpServer, InMemoryIssueStore, Shutdown};

/// A running server on an ephemeral port, backed by the in-memory store.
pub struct TestServer {
    pub addr: SocketAddr,
    pub store: Arc<InMemoryIssueStore>,
    pub shutdown: Shutdown,
}

impl TestServer {
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

pub async fn start_server() -> TestServer {
    let mut config = TrackerConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.database.backend = StoreBackend::Memory;

    let listener = tokio::net::TcpListener::bind(&config.listener.bind_address)
        .await
        .unwrap();
    let addr = listener.local_addr().unwrap();

    let store = Arc::new(InMemoryIssueStore::new());
    let shutdown = Shutdown::new();
    let server = HttpServer::new(&config, store.clone());
    let server_shutdown = shutdown.subscribe();

    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    // The listener is already bound; give the accept loop a moment to start.
    tokio::time::sleep(Duration::from_millis(50)).await;

    TestServer {
        addr,
        store,
        shutdown,
    }
}

/// HTTP client that never reuses connections across tests.
#[allow(dead_code)]
pub fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
