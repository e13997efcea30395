//! I3F image requests
//!
//! A request path has one of two shapes below the base URL:
//! - `{identifier}/{region}/{size}/{rotation}/{color}[.{format}]`
//! - `{identifier}/{profile}[.{format}]` (named-profile request)

mod params;

use std::fmt;

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};
use thiserror::Error;

use crate::profiles::ProfileParams;
pub use params::{
    mime_type_for, validate_color, validate_format, validate_profile, validate_region,
    validate_rotation, validate_size, COLORS,
};

/// Characters escaped when an identifier is written back into a path
const IDENTIFIER_ESCAPE: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'?')
    .add(b'<')
    .add(b'>');

/// Request parse and validation errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    #[error("path '{0}' is not below the base URL")]
    OutsideBaseUrl(String),

    #[error("expected 2 or 5 path segments, got {0}")]
    SegmentCount(usize),

    #[error("empty path segment")]
    EmptySegment,

    #[error("path segment '{0}' is not valid percent-encoded UTF-8")]
    InvalidEncoding(String),

    #[error("bad region parameter '{0}'")]
    InvalidRegion(String),

    #[error("bad size parameter '{0}'")]
    InvalidSize(String),

    #[error("bad rotation parameter '{0}'")]
    InvalidRotation(String),

    #[error("bad color parameter '{0}'")]
    InvalidColor(String),

    #[error("bad format parameter '{0}'")]
    InvalidFormat(String),

    #[error("bad profile name '{0}'")]
    InvalidProfile(String),
}

impl RequestError {
    /// The request parameter this error refers to
    pub fn parameter(&self) -> &'static str {
        match self {
            RequestError::OutsideBaseUrl(_)
            | RequestError::SegmentCount(_)
            | RequestError::EmptySegment => "unknown",
            RequestError::InvalidEncoding(_) => "identifier",
            RequestError::InvalidRegion(_) => "region",
            RequestError::InvalidSize(_) => "size",
            RequestError::InvalidRotation(_) => "rotation",
            RequestError::InvalidColor(_) => "color",
            RequestError::InvalidFormat(_) => "format",
            RequestError::InvalidProfile(_) => "profile",
        }
    }
}

/// A parsed image request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct I3fRequest {
    /// Path prefix under which requests are served, always ends in `/`
    pub base_url: String,
    pub identifier: String,
    pub region: Option<String>,
    pub size: Option<String>,
    pub rotation: Option<String>,
    pub color: Option<String>,
    pub format: Option<String>,
    /// Set for named-profile requests until the profile is applied
    pub profile: Option<String>,
}

impl I3fRequest {
    /// Create an empty request bound to a base URL
    pub fn new(base_url: &str) -> Self {
        let trimmed = base_url.trim_end_matches('/');
        Self {
            base_url: format!("{}/", trimmed),
            ..Default::default()
        }
    }

    /// Reset all request parameters, keeping the base URL
    fn clear(&mut self) {
        *self = Self {
            base_url: std::mem::take(&mut self.base_url),
            ..Default::default()
        };
    }

    /// Parse a request path (without query string) into this request
    pub fn parse_url(&mut self, path: &str) -> Result<(), RequestError> {
        self.clear();

        let rest = path
            .strip_prefix(self.base_url.as_str())
            .ok_or_else(|| RequestError::OutsideBaseUrl(path.to_string()))?;

        let segments = rest
            .split('/')
            .map(|raw| {
                if raw.is_empty() {
                    return Err(RequestError::EmptySegment);
                }
                percent_decode_str(raw)
                    .decode_utf8()
                    .map(|s| s.into_owned())
                    .map_err(|_| RequestError::InvalidEncoding(raw.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        match segments.as_slice() {
            [identifier, region, size, rotation, last] => {
                let (color, format) = split_format(last);
                validate_region(region)?;
                validate_size(size)?;
                validate_rotation(rotation)?;
                validate_color(color)?;
                if let Some(format) = format {
                    validate_format(format)?;
                }
                self.identifier = identifier.clone();
                self.region = Some(region.clone());
                self.size = Some(size.clone());
                self.rotation = Some(rotation.clone());
                self.color = Some(color.to_string());
                self.format = format.map(str::to_string);
            }
            [identifier, last] => {
                let (profile, format) = split_format(last);
                validate_profile(profile)?;
                if let Some(format) = format {
                    validate_format(format)?;
                }
                self.identifier = identifier.clone();
                self.profile = Some(profile.to_string());
                self.format = format.map(str::to_string);
            }
            other => return Err(RequestError::SegmentCount(other.len())),
        }

        Ok(())
    }

    /// Whether this is a named-profile request not yet resolved
    pub fn is_profile_request(&self) -> bool {
        self.profile.is_some()
    }

    /// Substitute the parameters of a named profile
    ///
    /// Unset profile fields take the identity values. The format falls back
    /// to the one given on the request.
    pub fn apply_profile(&mut self, params: &ProfileParams) {
        self.region = Some(params.region.clone().unwrap_or_else(|| "full".into()));
        self.size = Some(params.size.clone().unwrap_or_else(|| "full".into()));
        self.rotation = Some(params.rotation.clone().unwrap_or_else(|| "0".into()));
        self.color = Some(params.color.clone().unwrap_or_else(|| "color".into()));
        if params.format.is_some() {
            self.format = params.format.clone();
        }
        self.profile = None;
    }

    /// Canonical request path for the current parameters
    pub fn to_path(&self) -> String {
        let identifier = utf8_percent_encode(&self.identifier, IDENTIFIER_ESCAPE);
        let suffix = self
            .format
            .as_deref()
            .map(|f| format!(".{}", f))
            .unwrap_or_default();

        match &self.profile {
            Some(profile) => format!("{}{}/{}{}", self.base_url, identifier, profile, suffix),
            None => format!(
                "{}{}/{}/{}/{}/{}{}",
                self.base_url,
                identifier,
                self.region.as_deref().unwrap_or("full"),
                self.size.as_deref().unwrap_or("full"),
                self.rotation.as_deref().unwrap_or("0"),
                self.color.as_deref().unwrap_or("color"),
                suffix
            ),
        }
    }
}

/// Split `name.ext` at the last dot
fn split_format(segment: &str) -> (&str, Option<&str>) {
    match segment.rsplit_once('.') {
        Some((name, ext)) => (name, Some(ext)),
        None => (segment, None),
    }
}

impl fmt::Display for I3fRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let show = |v: &Option<String>| v.clone().unwrap_or_else(|| "-".to_string());
        writeln!(f, "identifier: {}", self.identifier)?;
        writeln!(f, "region: {}", show(&self.region))?;
        writeln!(f, "size: {}", show(&self.size))?;
        writeln!(f, "rotation: {}", show(&self.rotation))?;
        writeln!(f, "color: {}", show(&self.color))?;
        writeln!(f, "format: {}", show(&self.format))?;
        writeln!(f, "profile: {}", show(&self.profile))
    }
}
