//! Google OAuth2 login
//!
//! Three-legged flow:
//! 1. `/login` redirects the browser to Google's consent page
//! 2. Google redirects back to `/home?code=...`
//! 3. The code is exchanged for a token, the token for the user's profile
//!
//! A successful login opens a session whose token is set as the account
//! cookie. Image requests are authorized by that cookie or by the same token
//! sent as `Authorization: Bearer <token>`.

use std::path::Path;
use std::time::Duration;

use axum::http::{header, HeaderMap};
use axum_extra::extract::cookie::CookieJar;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use super::{
    random_cookie_prefix, scheme_host_port_prefix, ServiceDescription, SessionStore,
    LOGIN_PROFILE, LOGOUT_PROFILE, TOKEN_PROFILE,
};
use crate::config::AuthConfig;

/// Scope requested from Google
pub const GOOGLE_API_SCOPE: &str =
    "https://www.googleapis.com/auth/userinfo.profile https://www.googleapis.com/auth/userinfo.email";

pub const MISSING_CLIENT_ID: &str = "oops_missing_client_id";
pub const MISSING_CLIENT_SECRET: &str = "oops_missing_client_secret";

/// Google API errors
#[derive(Debug, Error)]
pub enum GoogleError {
    #[error("request to Google failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Google returned HTTP {0}")]
    Status(u16),

    #[error("no access_token in Google token response")]
    MissingAccessToken,

    #[error("bad Google URL: {0}")]
    Url(#[from] url::ParseError),
}

/// Client secret file errors
#[derive(Debug, Error)]
pub enum SecretError {
    #[error("cannot read client secret file: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed client secret file: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Deserialize)]
struct ClientSecretFile {
    web: ClientSecret,
}

#[derive(Debug, Deserialize)]
struct ClientSecret {
    client_id: String,
    client_secret: String,
}

fn load_client_secret(path: &Path) -> Result<ClientSecret, SecretError> {
    let raw = std::fs::read_to_string(path)?;
    let file: ClientSecretFile = serde_json::from_str(&raw)?;
    Ok(file.web)
}

/// Google login helper
#[derive(Debug)]
pub struct GoogleAuth {
    pub cookie_prefix: String,
    pub google_api_client_id: String,
    google_api_client_secret: String,
    pub google_api_scope: String,
    pub google_oauth2_url: String,
    pub google_api_url: String,
    /// Path prefix of the auth endpoints
    pub prefix: String,
    pub login_uri: String,
    pub logout_uri: String,
    pub token_uri: String,
    /// OAuth callback, Google sends the browser here after consent
    pub redirect_uri: String,
    pub require_login: bool,
    pub sessions: SessionStore,
    client: Client,
}

impl GoogleAuth {
    /// Create a helper from a client secret file
    ///
    /// A missing or unreadable file is logged and replaced by placeholder
    /// credentials, so the endpoints still answer.
    pub fn new(client_secret_file: &Path, cookie_prefix: Option<String>) -> Self {
        let (client_id, client_secret) = match load_client_secret(client_secret_file) {
            Ok(secret) => (secret.client_id, secret.client_secret),
            Err(e) => {
                warn!(
                    "Failed to load Google client secret from {}: {}",
                    client_secret_file.display(),
                    e
                );
                (MISSING_CLIENT_ID.to_string(), MISSING_CLIENT_SECRET.to_string())
            }
        };

        let defaults = AuthConfig::default();
        let base = scheme_host_port_prefix("http", &defaults.host, defaults.port, &defaults.prefix);

        Self {
            cookie_prefix: cookie_prefix.unwrap_or_else(random_cookie_prefix),
            google_api_client_id: client_id,
            google_api_client_secret: client_secret,
            google_api_scope: GOOGLE_API_SCOPE.to_string(),
            google_oauth2_url: defaults.oauth2_url,
            google_api_url: defaults.api_url,
            prefix: defaults.prefix,
            login_uri: format!("{}/login", base),
            logout_uri: format!("{}/logout", base),
            token_uri: format!("{}/token", base),
            redirect_uri: format!("{}/home", base),
            require_login: defaults.require_login,
            sessions: SessionStore::new(defaults.session_lifetime_secs),
            client: Client::builder()
                .timeout(Duration::from_secs(30))
                .build()
                .unwrap_or_default(),
        }
    }

    /// Create a helper from the server's auth settings
    pub fn from_config(config: &AuthConfig) -> Self {
        let mut auth = Self::new(&config.client_secret_file, config.cookie_prefix.clone());
        let base = scheme_host_port_prefix("http", &config.host, config.port, &config.prefix);
        auth.google_oauth2_url = config.oauth2_url.clone();
        auth.google_api_url = config.api_url.clone();
        auth.prefix = config.prefix.trim_matches('/').to_string();
        auth.login_uri = format!("{}/login", base);
        auth.logout_uri = format!("{}/logout", base);
        auth.token_uri = format!("{}/token", base);
        auth.redirect_uri = format!("{}/home", base);
        auth.require_login = config.require_login;
        auth.sessions = SessionStore::new(config.session_lifetime_secs);
        auth
    }

    pub fn account_cookie_name(&self) -> String {
        format!("{}account", self.cookie_prefix)
    }

    pub fn login_service_description(&self) -> ServiceDescription {
        ServiceDescription {
            id: self.login_uri.clone(),
            profile: LOGIN_PROFILE.to_string(),
            label: "Login to image server".to_string(),
        }
    }

    pub fn logout_service_description(&self) -> ServiceDescription {
        ServiceDescription {
            id: self.logout_uri.clone(),
            profile: LOGOUT_PROFILE.to_string(),
            label: "Logout from image server".to_string(),
        }
    }

    pub fn token_service_description(&self) -> ServiceDescription {
        ServiceDescription {
            id: self.token_uri.clone(),
            profile: TOKEN_PROFILE.to_string(),
            label: "Access token for image server".to_string(),
        }
    }

    /// Account cookie value, if a non-empty one was sent
    pub fn account_cookie(&self, jar: &CookieJar) -> Option<String> {
        jar.get(&self.account_cookie_name())
            .map(|c| c.value().to_string())
            .filter(|v| !v.is_empty())
    }

    /// Whether an info request carries login details
    pub fn info_authn(&self, jar: &CookieJar) -> bool {
        self.account_cookie(jar).is_some()
    }

    /// Authorization header sent with an image request, empty if none
    pub fn image_authn(&self, headers: &HeaderMap) -> String {
        headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string()
    }

    /// Whether a request is backed by a live session
    pub fn is_authorized(&self, headers: &HeaderMap, jar: &CookieJar) -> bool {
        let authorization = self.image_authn(headers);
        if let Some(token) = authorization.strip_prefix("Bearer ") {
            if self.sessions.is_valid(token.trim()) {
                return true;
            }
        }
        self.account_cookie(jar)
            .is_some_and(|token| self.sessions.is_valid(&token))
    }

    /// URL of Google's consent page, `next` comes back as the OAuth state
    pub fn login_url(&self, next: &str) -> Result<String, GoogleError> {
        let url = url::Url::parse_with_params(
            &format!("{}auth", self.google_oauth2_url),
            &[
                ("response_type", "code"),
                ("client_id", self.google_api_client_id.as_str()),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("scope", self.google_api_scope.as_str()),
                ("state", next),
            ],
        )?;
        Ok(url.into())
    }

    /// Exchange an authorization code for a token
    pub async fn google_get_token(&self, code: &str) -> Result<Value, GoogleError> {
        let params = [
            ("code", code),
            ("client_id", self.google_api_client_id.as_str()),
            ("client_secret", self.google_api_client_secret.as_str()),
            ("redirect_uri", self.redirect_uri.as_str()),
            ("grant_type", "authorization_code"),
        ];

        debug!("Exchanging authorization code with Google");

        let response = self
            .client
            .post(format!("{}token", self.google_oauth2_url))
            .form(&params)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!("Google token error: {} - {}", status, body);
            return Err(GoogleError::Status(status.as_u16()));
        }

        Ok(response.json().await?)
    }

    /// Fetch the user's profile with a token response
    pub async fn google_get_data(&self, token: &Value) -> Result<Value, GoogleError> {
        let access_token = token
            .get("access_token")
            .and_then(Value::as_str)
            .ok_or(GoogleError::MissingAccessToken)?;

        let response = self
            .client
            .get(format!("{}userinfo", self.google_api_url))
            .query(&[("access_token", access_token)])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            warn!("Google userinfo error: {}", status);
            return Err(GoogleError::Status(status.as_u16()));
        }

        Ok(response.json().await?)
    }
}
