//! Shared utilities for integration tests.

use std::fs;
use std::net::SocketAddr;
use std::path::Path;

use breach_lookup::config::ServiceConfig;
use breach_lookup::store::ingest;
use breach_lookup::{CredentialStore, HttpServer, Shutdown};
use tempfile::TempDir;
use tokio::net::TcpListener;

/// A running server and the resources that must outlive it.
pub struct TestServer {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    _dir: TempDir,
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

fn write(dir: &Path, rel: &str, body: &str) {
    let path = dir.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, body).unwrap();
}

/// Build the sample dataset and serve it on an ephemeral port.
pub async fn start_server(mut config: ServiceConfig) -> TestServer {
    let dir = tempfile::tempdir().unwrap();
    let data = dir.path().join("data");
    write(
        &data,
        "passwords/rockyou.txt",
        "password\nPassword1\nletmein\nadmin123\n' OR '1'='1\n<script>alert('xss')</script>\n",
    );
    write(&data, "passwords/linkedin.txt", "password\nsuperSecret\n");
    write(&data, "usernames/names.txt", "aaron\nAaron_Smith\njohn_doe\n");

    let db = dir.path().join("creds.db");
    ingest(&data, &db).unwrap();
    config.dataset.database_path = db.clone();
    config.dataset.data_dir = data;

    let store = CredentialStore::open(&db).unwrap();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config, store);
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    TestServer {
        addr,
        shutdown,
        _dir: dir,
    }
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}
