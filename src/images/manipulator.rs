//! Image manipulators
//!
//! A manipulator turns a source image plus a fully resolved request into the
//! response bytes. Back-ends are swappable behind the [`Manipulator`] trait.

use std::path::Path;

use async_trait::async_trait;

use crate::error::I3fError;
use crate::request::{mime_type_for, I3fRequest};

/// Result of a manipulation
#[derive(Debug, Clone)]
pub struct ManipulatedImage {
    pub data: Vec<u8>,
    pub mime_type: Option<String>,
}

#[async_trait]
pub trait Manipulator: Send + Sync {
    /// Compliance level URI sent in the `Link` header
    fn compliance_level(&self) -> &str;

    /// Apply the request to the image at `source`
    async fn manipulate(
        &self,
        source: &Path,
        request: &I3fRequest,
    ) -> Result<ManipulatedImage, I3fError>;
}

/// Compliance level of [`DummyManipulator`]
pub const LEVEL0_COMPLIANCE: &str = "http://iiif.io/api/image/1/level0.json";

/// Returns the source image unchanged, whatever was requested
#[derive(Debug, Clone, Default)]
pub struct DummyManipulator;

#[async_trait]
impl Manipulator for DummyManipulator {
    fn compliance_level(&self) -> &str {
        LEVEL0_COMPLIANCE
    }

    async fn manipulate(
        &self,
        source: &Path,
        _request: &I3fRequest,
    ) -> Result<ManipulatedImage, I3fError> {
        let data = tokio::fs::read(source)
            .await
            .map_err(|e| I3fError::unexpected(format!("cannot read {}: {}", source.display(), e)))?;

        let mime_type = source
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(mime_type_for)
            .map(str::to_string);

        Ok(ManipulatedImage { data, mime_type })
    }
}
