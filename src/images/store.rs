//! Local test image storage
//!
//! Identifiers map directly to file names inside the image directory. Only
//! identifiers made of word characters, dots and hyphens are looked up.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, warn};

use crate::error::I3fError;

static IDENTIFIER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\w.\-]+$").unwrap());

/// Directory of test images
#[derive(Debug, Clone)]
pub struct TestImageStore {
    dir: PathBuf,
}

impl TestImageStore {
    /// Create a store over a directory
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Whether an identifier has the shape of a local file name
    pub fn is_local_identifier(identifier: &str) -> bool {
        IDENTIFIER_REGEX.is_match(identifier)
    }

    /// Resolve an identifier to the path of an existing image file
    pub async fn resolve(&self, identifier: &str) -> Result<PathBuf, I3fError> {
        if !Self::is_local_identifier(identifier) {
            return Err(I3fError::not_found(
                "identifier",
                format!(
                    "Image resource '{}' not found. Only local test images and http: URIs for images are supported.\n",
                    identifier
                ),
            ));
        }

        let path = self.dir.join(identifier);
        let is_file = tokio::fs::metadata(&path)
            .await
            .map(|m| m.is_file())
            .unwrap_or(false);

        if !is_file {
            let mut text = format!(
                "Image resource '{}' not found. Local image files available:\n",
                identifier
            );
            for name in self.list().await {
                text.push_str("  ");
                text.push_str(&name);
                text.push('\n');
            }
            return Err(I3fError::not_found("identifier", text));
        }

        debug!("Resolved {} to {}", identifier, path.display());
        Ok(path)
    }

    /// Sorted names of the regular files in the image directory
    pub async fn list(&self) -> Vec<String> {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Cannot read image directory {}: {}", self.dir.display(), e);
                return Vec::new();
            }
        };

        let mut names = Vec::new();
        while let Ok(Some(entry)) = entries.next_entry().await {
            let is_file = entry.file_type().await.map(|t| t.is_file()).unwrap_or(false);
            if is_file {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        names.sort();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store_with(files: &[&str]) -> (TempDir, TestImageStore) {
        let dir = TempDir::new().unwrap();
        for name in files {
            std::fs::write(dir.path().join(name), b"data").unwrap();
        }
        std::fs::create_dir(dir.path().join("subdir")).unwrap();
        let store = TestImageStore::new(dir.path());
        (dir, store)
    }

    #[tokio::test]
    async fn test_resolve_existing() {
        let (_dir, store) = store_with(&["a.png"]);
        let path = store.resolve("a.png").await.unwrap();
        assert!(path.ends_with("a.png"));
    }

    #[tokio::test]
    async fn test_missing_lists_available_files() {
        let (_dir, store) = store_with(&["b.jpg", "a.png"]);
        let err = store.resolve("nope.png").await.unwrap_err();
        assert_eq!(err.status.as_u16(), 404);
        assert_eq!(err.parameter, "identifier");
        assert_eq!(
            err.text,
            "Image resource 'nope.png' not found. Local image files available:\n  a.png\n  b.jpg\n"
        );
    }

    #[tokio::test]
    async fn test_directory_is_not_an_image() {
        let (_dir, store) = store_with(&[]);
        let err = store.resolve("subdir").await.unwrap_err();
        assert_eq!(err.status.as_u16(), 404);
        let err = store.resolve("..").await.unwrap_err();
        assert_eq!(err.status.as_u16(), 404);
    }

    #[tokio::test]
    async fn test_non_local_identifier() {
        let (_dir, store) = store_with(&["a.png"]);
        let err = store.resolve("http://example.org/a.png").await.unwrap_err();
        assert_eq!(err.status.as_u16(), 404);
        assert!(err.text.contains("Only local test images"));
    }

    #[tokio::test]
    async fn test_missing_directory_lists_nothing() {
        let store = TestImageStore::new("/does/not/exist");
        assert!(store.list().await.is_empty());
        let err = store.resolve("a.png").await.unwrap_err();
        assert!(err.text.ends_with("available:\n"));
    }
}
