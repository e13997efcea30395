//! Server configuration
//!
//! Layered with figment: built-in defaults, then an optional TOML file, then
//! `I3FD_`-prefixed environment variables (nested keys split on `__`, e.g.
//! `I3FD_AUTH__CLIENT_SECRET_FILE`).

use std::collections::BTreeMap;
use std::net::{Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::profiles::{NamedProfiles, ProfileParams};
use crate::request::RequestError;

/// Default config file looked up when none is given
pub const DEFAULT_CONFIG_FILE: &str = "i3fd.toml";

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid configuration: {0}")]
    Figment(#[from] Box<figment::Error>),

    #[error("named profile '{name}': {source}")]
    InvalidProfile {
        name: String,
        #[source]
        source: RequestError,
    },
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub bind_addr: SocketAddr,
    /// Directory holding the test images
    pub image_dir: PathBuf,
    /// Path prefix of image requests
    pub base_url: String,
    /// Longest accepted request URI (path and query)
    pub max_uri_length: usize,
    /// Append request parameters to error responses
    pub debug: bool,
    /// Extra named profiles, added on top of the built-ins
    pub profiles: BTreeMap<String, ProfileParams>,
    /// Google login, image access is open when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth: Option<AuthConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from((Ipv4Addr::LOCALHOST, 8000)),
            image_dir: PathBuf::from("testimages"),
            base_url: "/".to_string(),
            max_uri_length: 1024,
            debug: true,
            profiles: BTreeMap::new(),
            auth: None,
        }
    }
}

/// Google OAuth settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Google API client secret JSON (`{"web": {"client_id", "client_secret"}}`)
    pub client_secret_file: PathBuf,
    /// Cookie name prefix, random when unset
    pub cookie_prefix: Option<String>,
    /// Public host and port used to build the OAuth redirect URI
    pub host: String,
    pub port: Option<u16>,
    /// Path prefix of the auth endpoints
    pub prefix: String,
    pub oauth2_url: String,
    pub api_url: String,
    pub session_lifetime_secs: u64,
    /// Reject image requests without a live session
    pub require_login: bool,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            client_secret_file: PathBuf::from("client_secret.json"),
            cookie_prefix: None,
            host: "localhost".to_string(),
            port: None,
            prefix: "auth".to_string(),
            oauth2_url: "https://accounts.google.com/o/oauth2/".to_string(),
            api_url: "https://www.googleapis.com/oauth2/v1/".to_string(),
            session_lifetime_secs: 3600,
            require_login: true,
        }
    }
}

impl Config {
    /// Load configuration from defaults, a TOML file and the environment
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_FILE));
        Self::figment(path).extract().map_err(|e| ConfigError::from(Box::new(e)))
    }

    fn figment(path: &Path) -> Figment {
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed("I3FD_").split("__"))
    }

    /// Build the named-profile table
    pub fn named_profiles(&self) -> Result<NamedProfiles, ConfigError> {
        let mut profiles = NamedProfiles::new();
        for (name, params) in &self.profiles {
            profiles
                .load_profile(name, params.clone())
                .map_err(|source| ConfigError::InvalidProfile {
                    name: name.clone(),
                    source,
                })?;
        }
        Ok(profiles)
    }
}
