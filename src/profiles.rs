//! Named profiles
//!
//! A named profile stands for a preset parameterized request. Profiles are
//! loaded once at start-up and read-only afterwards.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::I3fError;
use crate::request::{
    validate_color, validate_format, validate_region, validate_rotation, validate_size,
    RequestError,
};

/// Parameters substituted for a named profile, unset fields use identity values
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}

impl ProfileParams {
    /// Check every set field against the request syntax
    pub fn validate(&self) -> Result<(), RequestError> {
        if let Some(region) = &self.region {
            validate_region(region)?;
        }
        if let Some(size) = &self.size {
            validate_size(size)?;
        }
        if let Some(rotation) = &self.rotation {
            validate_rotation(rotation)?;
        }
        if let Some(color) = &self.color {
            validate_color(color)?;
        }
        if let Some(format) = &self.format {
            validate_format(format)?;
        }
        Ok(())
    }
}

/// Table of named profiles
#[derive(Debug, Clone)]
pub struct NamedProfiles {
    profiles: HashMap<String, ProfileParams>,
}

impl NamedProfiles {
    /// Create a table with the built-in profiles
    pub fn new() -> Self {
        let mut profiles = HashMap::new();
        profiles.insert("unmodified".to_string(), ProfileParams::default());
        profiles.insert(
            "thumb".to_string(),
            ProfileParams {
                size: Some("32,32".to_string()),
                ..Default::default()
            },
        );
        Self { profiles }
    }

    /// Add or replace a profile
    pub fn load_profile(&mut self, name: &str, params: ProfileParams) -> Result<(), RequestError> {
        params.validate()?;
        self.profiles.insert(name.to_string(), params);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&ProfileParams> {
        self.profiles.get(name)
    }

    /// Look up a profile, failing with the I3F "not implemented" error
    pub fn resolve(&self, name: &str) -> Result<&ProfileParams, I3fError> {
        self.get(name).ok_or_else(|| {
            I3fError::bad_request("profile", format!("Named-profile {} not implemented", name))
        })
    }

    /// Sorted profile names
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.profiles.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl Default for NamedProfiles {
    fn default() -> Self {
        Self::new()
    }
}
