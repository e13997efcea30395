//! HTTP API module - I3F image requests and auth endpoints

mod auth;
mod images;

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use serde::Serialize;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::auth::GoogleAuth;
use crate::images::{Manipulator, TestImageStore};
use crate::profiles::NamedProfiles;

/// Request handling settings taken from the server config
#[derive(Debug, Clone)]
pub struct RequestSettings {
    pub base_url: String,
    pub max_uri_length: usize,
    pub debug: bool,
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<RequestSettings>,
    pub profiles: Arc<NamedProfiles>,
    pub images: Arc<TestImageStore>,
    pub manipulator: Arc<dyn Manipulator>,
    pub auth: Option<Arc<GoogleAuth>>,
}

/// Build the API router
///
/// Paths not matched by an explicit route are treated as image requests.
pub fn router(state: AppState) -> Router {
    let mut router = Router::new()
        .route("/health", get(health_check))
        .route("/", get(root));

    if let Some(google) = &state.auth {
        let endpoints = auth::router().with_state(google.clone());
        router = if google.prefix.is_empty() {
            router.merge(endpoints)
        } else {
            router.nest(&format!("/{}", google.prefix), endpoints)
        };
    }

    router
        .fallback(images::get_image)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Root endpoint
async fn root(State(state): State<AppState>) -> impl IntoResponse {
    Json(RootResponse {
        name: "i3fd",
        version: env!("CARGO_PKG_VERSION"),
        compliance: state.manipulator.compliance_level().to_string(),
        profiles: state.profiles.names().into_iter().map(String::from).collect(),
        auth: state.auth.is_some(),
    })
}

#[derive(Serialize)]
struct RootResponse {
    name: &'static str,
    version: &'static str,
    compliance: String,
    profiles: Vec<String>,
    auth: bool,
}

/// Health check endpoint
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let images_ok = tokio::fs::metadata(state.images.dir())
        .await
        .map(|m| m.is_dir())
        .unwrap_or(false);

    if images_ok {
        (
            StatusCode::OK,
            Json(HealthResponse {
                status: "healthy",
                images: "ok",
            }),
        )
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(HealthResponse {
                status: "unhealthy",
                images: "missing",
            }),
        )
    }
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    images: &'static str,
}
