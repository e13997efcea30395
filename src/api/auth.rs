//! Google login endpoints
//!
//! Mounted under the configured auth prefix (default `/auth`).

use std::sync::{Arc, LazyLock};

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::auth::{GoogleAuth, ServiceDescription};

/// Page that closes the login popup
const CLOSE_WINDOW_HTML: &str =
    "<html>You may close this tab or window<script>window.close();</script></html>";

static CALLBACK_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_$][\w$.]*$").unwrap());

/// Build auth router
pub fn router() -> Router<Arc<GoogleAuth>> {
    Router::new()
        .route("/login", get(login))
        .route("/logout", get(logout))
        .route("/token", get(access_token))
        .route("/home", get(home))
        .route("/services", get(services))
}

/// Login query params
#[derive(Debug, Deserialize)]
pub struct LoginQuery {
    #[serde(default)]
    pub next: String,
}

/// Redirect to Google's consent page
async fn login(State(auth): State<Arc<GoogleAuth>>, Query(params): Query<LoginQuery>) -> Response {
    match auth.login_url(&params.next) {
        Ok(url) => {
            let body = redirect_page(&url);
            (
                StatusCode::FOUND,
                [
                    (header::LOCATION, url),
                    (header::CONTENT_TYPE, "text/html; charset=utf-8".to_string()),
                ],
                body,
            )
                .into_response()
        }
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, format!("Error: {}", e)).into_response(),
    }
}

fn redirect_page(url: &str) -> String {
    let href = url
        .replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;");
    format!(
        "<!DOCTYPE HTML PUBLIC \"-//W3C//DTD HTML 3.2 Final//EN\">\n\
         <title>Redirecting...</title>\n\
         <h1>Redirecting...</h1>\n\
         <p>You should be redirected automatically to target URL: \
         <a href=\"{0}\">{0}</a>.  If not click the link.",
        href
    )
}

/// Drop the session and expire the account cookie
async fn logout(State(auth): State<Arc<GoogleAuth>>, jar: CookieJar) -> impl IntoResponse {
    if let Some(token) = auth.account_cookie(&jar) {
        if auth.sessions.remove(&token) {
            info!("Logged out session");
        }
    }
    let jar = jar.remove(Cookie::build((auth.account_cookie_name(), "")).path("/"));
    (
        jar,
        [(header::CONTENT_TYPE, "text/html")],
        "<html><script>window.close();</script></html>",
    )
}

/// Token query params
#[derive(Debug, Deserialize)]
pub struct TokenQuery {
    pub callback: Option<String>,
    #[serde(rename = "messageId")]
    pub message_id: Option<String>,
}

/// Hand the account cookie back as a bearer token, JSON or JSONP
async fn access_token(
    State(auth): State<Arc<GoogleAuth>>,
    Query(params): Query<TokenQuery>,
    jar: CookieJar,
) -> Response {
    let mut data: Value = match auth.account_cookie(&jar) {
        Some(account) => json!({
            "access_token": account,
            "token_type": "Bearer",
            "expires_in": auth.sessions.lifetime_secs(),
        }),
        None => json!({
            "error": "client_unauthorized",
            "error_description": "No login details received",
        }),
    };
    if let Some(message_id) = params.message_id {
        data["messageId"] = json!(message_id);
    }

    match params.callback {
        Some(callback) if CALLBACK_REGEX.is_match(&callback) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "application/javascript")],
            format!("{}({});", callback, data),
        )
            .into_response(),
        Some(_) => (StatusCode::BAD_REQUEST, "Bad callback name").into_response(),
        None => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "application/json")],
            data.to_string(),
        )
            .into_response(),
    }
}

/// OAuth callback query params
#[derive(Debug, Deserialize)]
pub struct HomeQuery {
    #[serde(default)]
    pub code: String,
}

/// OAuth callback, completes the login
async fn home(
    State(auth): State<Arc<GoogleAuth>>,
    Query(params): Query<HomeQuery>,
    jar: CookieJar,
) -> Response {
    if params.code.is_empty() {
        return (StatusCode::BAD_REQUEST, "Missing authorization code").into_response();
    }

    let token = match auth.google_get_token(&params.code).await {
        Ok(token) => token,
        Err(e) => {
            warn!("Google token exchange failed: {}", e);
            return (StatusCode::BAD_GATEWAY, format!("Login failed: {}", e)).into_response();
        }
    };

    let data = match auth.google_get_data(&token).await {
        Ok(data) => data,
        Err(e) => {
            warn!("Google user data request failed: {}", e);
            return (StatusCode::BAD_GATEWAY, format!("Login failed: {}", e)).into_response();
        }
    };

    let email = data.get("email").and_then(Value::as_str).unwrap_or("NO_EMAIL");
    let name = data.get("name").and_then(Value::as_str).unwrap_or("NO_NAME");
    let session = auth.sessions.create(email, name);
    info!("Login for {} <{}>", name, email);

    let cookie = Cookie::build((auth.account_cookie_name(), session))
        .path("/")
        .http_only(true);
    (
        jar.add(cookie),
        [(header::CONTENT_TYPE, "text/html")],
        CLOSE_WINDOW_HTML,
    )
        .into_response()
}

/// Auth service descriptions
#[derive(Debug, Serialize)]
pub struct ServicesResponse {
    pub login: ServiceDescription,
    pub logout: ServiceDescription,
    pub token: ServiceDescription,
}

async fn services(State(auth): State<Arc<GoogleAuth>>) -> Json<ServicesResponse> {
    Json(ServicesResponse {
        login: auth.login_service_description(),
        logout: auth.logout_service_description(),
        token: auth.token_service_description(),
    })
}
