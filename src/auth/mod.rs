//! Authentication module
//!
//! Provides the Google OAuth2 login helper used to gate image access, plus
//! the IIIF auth service descriptions it advertises.

pub mod google;
pub mod sessions;

use rand::Rng;
use serde::Serialize;
use sha2::{Digest, Sha256};

pub use google::{GoogleAuth, GoogleError};
pub use sessions::{Session, SessionStore};

/// IIIF auth service profiles
pub const LOGIN_PROFILE: &str = "http://iiif.io/api/auth/0/login";
pub const LOGOUT_PROFILE: &str = "http://iiif.io/api/auth/0/logout";
pub const TOKEN_PROFILE: &str = "http://iiif.io/api/auth/0/token";

/// Description of an auth service endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceDescription {
    #[serde(rename = "@id")]
    pub id: String,
    pub profile: String,
    pub label: String,
}

/// Generate a secure random token
pub fn generate_token() -> String {
    let random_bytes: [u8; 32] = rand::rng().random();
    let mut hasher = Sha256::new();
    hasher.update(random_bytes);
    hasher.update(
        chrono::Utc::now()
            .timestamp_nanos_opt()
            .unwrap_or(0)
            .to_le_bytes(),
    );
    hex::encode(hasher.finalize())
}

/// Random cookie name prefix such as `482913_`
pub fn random_cookie_prefix() -> String {
    format!("{}_", rand::rng().random_range(0..1_000_000u32))
}

/// Build `scheme://host[:port][/prefix]`
pub fn scheme_host_port_prefix(scheme: &str, host: &str, port: Option<u16>, prefix: &str) -> String {
    let mut url = format!("{}://{}", scheme, host);
    if let Some(port) = port {
        url.push_str(&format!(":{}", port));
    }
    let prefix = prefix.trim_matches('/');
    if !prefix.is_empty() {
        url.push('/');
        url.push_str(prefix);
    }
    url
}
