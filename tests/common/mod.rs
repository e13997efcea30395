//! Common test utilities - I3fTest harness for end-to-end testing

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use i3fd::{Config, Server};
use reqwest::{redirect, Client};
use tempfile::TempDir;
use tokio::task::JoinHandle;

/// Image shipped in every harness image directory
pub const TEST_IMAGE: &str = "67352ccc-d1b0-11e1-89ae-279075081939.png";
pub const TEST_IMAGE_BYTES: &[u8] = b"\x89PNG\r\n\x1a\nnot really a png";

/// Second image, without a known MIME type
pub const OTHER_IMAGE: &str = "starfish.raw";

/// Client secret fixture
pub const CLIENT_SECRET_FILE: &str = "tests/testdata/test_client_secret.json";

/// Test harness that spawns a real i3fd server on a random port
pub struct I3fTest {
    pub addr: SocketAddr,
    pub client: Client,
    server: Arc<Server>,
    _handle: JoinHandle<()>,
    _images: TempDir,
}

impl I3fTest {
    /// Start a server with default settings
    pub async fn start() -> Result<Self> {
        Self::start_with(|_| {}).await
    }

    /// Start a server, adjusting the config first
    pub async fn start_with(configure: impl FnOnce(&mut Config)) -> Result<Self> {
        let images = TempDir::new()?;
        std::fs::write(images.path().join(TEST_IMAGE), TEST_IMAGE_BYTES)?;
        std::fs::write(images.path().join(OTHER_IMAGE), b"raw")?;

        // Find a random available port
        let listener = std::net::TcpListener::bind("127.0.0.1:0")?;
        let addr = listener.local_addr()?;
        drop(listener);

        let mut config = Config {
            bind_addr: addr,
            image_dir: images.path().to_path_buf(),
            ..Default::default()
        };
        configure(&mut config);
        let addr = config.bind_addr;

        let server = Arc::new(Server::new(config).await?);
        let server_clone = server.clone();

        // Spawn the server in a background task
        let handle = tokio::spawn(async move {
            if let Err(e) = server_clone.run().await {
                eprintln!("Server error: {}", e);
            }
        });

        let client = Client::builder()
            .timeout(Duration::from_secs(5))
            .redirect(redirect::Policy::none())
            .build()?;

        // Poll until server is ready (max 2 seconds)
        let mut ready = false;
        for _ in 0..20 {
            tokio::time::sleep(Duration::from_millis(100)).await;
            if client
                .get(format!("http://{}/health", addr))
                .send()
                .await
                .is_ok()
            {
                ready = true;
                break;
            }
        }

        if !ready {
            anyhow::bail!("Server failed to start within 2 seconds");
        }

        Ok(Self {
            addr,
            client,
            server,
            _handle: handle,
            _images: images,
        })
    }

    /// Get the base URL for the server
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Make a GET request
    pub async fn get(&self, path: &str) -> Result<reqwest::Response> {
        Ok(self
            .client
            .get(format!("{}{}", self.base_url(), path))
            .send()
            .await?)
    }

    /// Make a GET request with a Cookie header
    pub async fn get_with_cookie(&self, path: &str, cookie: &str) -> Result<reqwest::Response> {
        Ok(self
            .client
            .get(format!("{}{}", self.base_url(), path))
            .header("Cookie", cookie)
            .send()
            .await?)
    }

    /// Make a GET request with a bearer token
    pub async fn get_with_bearer(&self, path: &str, token: &str) -> Result<reqwest::Response> {
        Ok(self
            .client
            .get(format!("{}{}", self.base_url(), path))
            .bearer_auth(token)
            .send()
            .await?)
    }
}

impl Drop for I3fTest {
    fn drop(&mut self) {
        self.server.shutdown();
    }
}
