//! Image request endpoint
//!
//! GET /{identifier}/{region}/{size}/{rotation}/{color}[.{format}]
//! GET /{identifier}/{profile}[.{format}]

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, HeaderValue, Method, Uri},
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::CookieJar;
use tracing::{debug, warn};

use super::AppState;
use crate::error::I3fError;
use crate::images::ManipulatedImage;
use crate::request::I3fRequest;

/// Per-request outputs needed to build the response
struct Exchange {
    request: I3fRequest,
    /// Set once a manipulator has been chosen
    compliance: Option<String>,
}

/// Serve an image request
pub async fn get_image(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    jar: CookieJar,
) -> Response {
    let mut exchange = Exchange {
        request: I3fRequest::new(&state.settings.base_url),
        compliance: None,
    };

    let mut response = match serve(&state, &method, &uri, &headers, &jar, &mut exchange).await {
        Ok(image) => image_response(image, exchange.compliance.as_deref()),
        Err(mut err) => {
            warn!(
                status = err.status.as_u16(),
                parameter = %err.parameter,
                "I3F error for {}",
                uri.path()
            );
            if state.settings.debug {
                err.append_request(&exchange.request);
            }
            error_response(&err, exchange.compliance.as_deref())
        }
    };
    if method == Method::HEAD {
        *response.body_mut() = Body::empty();
    }
    response
}

async fn serve(
    state: &AppState,
    method: &Method,
    uri: &Uri,
    headers: &HeaderMap,
    jar: &CookieJar,
    exchange: &mut Exchange,
) -> Result<ManipulatedImage, I3fError> {
    if *method != Method::GET && *method != Method::HEAD {
        return Err(I3fError::method_not_allowed(method.as_str()));
    }

    let length = uri
        .path_and_query()
        .map(|pq| pq.as_str().len())
        .unwrap_or_else(|| uri.path().len());
    if length > state.settings.max_uri_length {
        return Err(I3fError::uri_too_long(length, state.settings.max_uri_length));
    }

    debug!("GET {}", uri);

    let request = &mut exchange.request;
    request.parse_url(uri.path())?;

    if let Some(profile) = request.profile.clone() {
        let params = state.profiles.resolve(&profile)?;
        request.apply_profile(params);
    }

    if let Some(auth) = &state.auth {
        if auth.require_login && !auth.is_authorized(headers, jar) {
            return Err(I3fError::unauthorized(format!(
                "Login required to access image '{}', see {}\n",
                request.identifier, auth.login_uri
            )));
        }
    }

    let source = state.images.resolve(&request.identifier).await?;

    exchange.compliance = Some(state.manipulator.compliance_level().to_string());
    state.manipulator.manipulate(&source, &exchange.request).await
}

fn compliance_link(level: &str) -> Option<HeaderValue> {
    HeaderValue::from_str(&format!("<{}>;rel=\"compliesTo\"", level)).ok()
}

fn image_response(image: ManipulatedImage, compliance: Option<&str>) -> Response {
    let mut response = Response::new(Body::from(image.data));
    let headers = response.headers_mut();
    if let Some(mime) = image.mime_type.and_then(|m| HeaderValue::from_str(&m).ok()) {
        headers.insert(header::CONTENT_TYPE, mime);
    }
    if let Some(link) = compliance.and_then(compliance_link) {
        headers.insert(header::LINK, link);
    }
    response
}

fn error_response(err: &I3fError, compliance: Option<&str>) -> Response {
    let mut response = (
        err.status,
        [(header::CONTENT_TYPE, "text/xml")],
        err.to_xml(),
    )
        .into_response();
    if let Some(link) = compliance.and_then(compliance_link) {
        response.headers_mut().insert(header::LINK, link);
    }
    response
}
