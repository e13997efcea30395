//! I3F error responses
//!
//! Every failure while serving an image request ends up as an [`I3fError`],
//! which is rendered as the I3F XML error document with the matching HTTP
//! status code.

use std::fmt;

use axum::http::StatusCode;

use crate::request::{I3fRequest, RequestError};

/// XML namespace of the I3F error document
pub const ERROR_NAMESPACE: &str = "http://library.stanford.edu/iiif/image-api/ns/";

/// An I3F protocol error
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct I3fError {
    pub status: StatusCode,
    /// Request parameter that caused the error, "unknown" if none applies
    pub parameter: String,
    /// Human-readable description
    pub text: String,
}

impl I3fError {
    pub fn new(status: StatusCode, parameter: &str, text: impl Into<String>) -> Self {
        Self {
            status,
            parameter: parameter.to_string(),
            text: text.into(),
        }
    }

    /// 400 Bad Request
    pub fn bad_request(parameter: &str, text: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, parameter, text)
    }

    /// 401 Unauthorized
    pub fn unauthorized(text: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "unknown", text)
    }

    /// 404 Not Found
    pub fn not_found(parameter: &str, text: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, parameter, text)
    }

    /// 405 Method Not Allowed
    pub fn method_not_allowed(method: &str) -> Self {
        Self::new(
            StatusCode::METHOD_NOT_ALLOWED,
            "unknown",
            format!("Method {} not supported, use GET\n", method),
        )
    }

    /// 414 URI Too Long
    pub fn uri_too_long(len: usize, max: usize) -> Self {
        Self::new(
            StatusCode::URI_TOO_LONG,
            "unknown",
            format!("URI Too Long: Max {} chars, got {}\n", max, len),
        )
    }

    /// 500 Internal Server Error
    pub fn internal(text: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "unknown", text)
    }

    /// Wrap an unexpected failure as a 500
    pub fn unexpected(err: impl fmt::Display) -> Self {
        Self::internal(format!("Something went wrong... {}.\n", err))
    }

    /// Append a dump of the request parameters (debug mode)
    pub fn append_request(&mut self, request: &I3fRequest) {
        self.text.push_str("\nRequest parameters:\n");
        self.text.push_str(&request.to_string());
    }

    /// Render the I3F XML error document
    pub fn to_xml(&self) -> String {
        format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n\
             <error xmlns=\"{}\">\n\
             <parameter>{}</parameter>\n\
             <text>{}</text>\n\
             </error>\n",
            ERROR_NAMESPACE,
            xml_escape(&self.parameter),
            xml_escape(&self.text)
        )
    }
}

impl fmt::Display for I3fError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_xml())
    }
}

impl std::error::Error for I3fError {}

impl From<RequestError> for I3fError {
    fn from(err: RequestError) -> Self {
        Self::bad_request(err.parameter(), format!("Bad request: {}\n", err))
    }
}

fn xml_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}
