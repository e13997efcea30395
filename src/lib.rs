//! i3fd - I3F image server test harness
//!
//! Parses I3F image-request URLs, maps them to local test images, runs a
//! stub manipulator over them and returns the result. Access can be gated
//! behind a Google OAuth2 login.

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod images;
pub mod profiles;
pub mod request;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{info, warn};

use api::{AppState, RequestSettings};
use auth::GoogleAuth;
pub use config::{AuthConfig, Config};
pub use error::I3fError;
use images::{DummyManipulator, TestImageStore};
pub use request::I3fRequest;

/// The i3fd server instance
pub struct Server {
    config: Config,
    state: AppState,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
}

impl Server {
    /// Create a new server instance
    pub async fn new(config: Config) -> Result<Self> {
        let profiles = config.named_profiles()?;

        let is_dir = tokio::fs::metadata(&config.image_dir)
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false);
        if !is_dir {
            warn!("Image directory {} not found", config.image_dir.display());
        }

        let auth = config.auth.as_ref().map(|a| {
            let google = GoogleAuth::from_config(a);
            info!(
                "Google login enabled at /{} (cookie {})",
                google.prefix,
                google.account_cookie_name()
            );
            Arc::new(google)
        });

        let state = AppState {
            settings: Arc::new(RequestSettings {
                base_url: config.base_url.clone(),
                max_uri_length: config.max_uri_length,
                debug: config.debug,
            }),
            profiles: Arc::new(profiles),
            images: Arc::new(TestImageStore::new(&config.image_dir)),
            manipulator: Arc::new(DummyManipulator),
            auth,
        };

        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        Ok(Self {
            config,
            state,
            shutdown_tx,
            shutdown_rx,
        })
    }

    /// Build the router
    fn router(&self) -> Router {
        api::router(self.state.clone())
    }

    /// Run the server until shutdown
    pub async fn run(&self) -> Result<()> {
        let listener = TcpListener::bind(self.config.bind_addr).await?;
        let local_addr = listener.local_addr()?;
        info!("i3fd listening on {}", local_addr);
        info!(
            "Serving images from {} under {}",
            self.config.image_dir.display(),
            self.config.base_url
        );

        let router = self.router();
        let mut shutdown_rx = self.shutdown_rx.clone();

        axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                shutdown_rx.changed().await.ok();
            })
            .await?;

        info!("i3fd shutdown complete");
        Ok(())
    }

    /// Signal the server to shutdown
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
    }

    /// Get the configured bind address
    pub fn bind_addr(&self) -> SocketAddr {
        self.config.bind_addr
    }
}
