//! Parameter syntax checks for parameterized requests
//!
//! Region: `full` | `x,y,w,h` | `pct:x,y,w,h`
//! Size: `full` | `w,` | `,h` | `pct:n` | `w,h` | `!w,h`
//! Rotation: degrees in `[0, 360]`
//! Color: `color` | `grey` | `bitonal` | `native`

use regex::Regex;
use std::sync::LazyLock;

use super::RequestError;

const NUM: &str = r"\d+(?:\.\d+)?";

static REGION_PIXELS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+),(\d+),(\d+),(\d+)$").unwrap());

static REGION_PCT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"^pct:({NUM}),({NUM}),({NUM}),({NUM})$")).unwrap()
});

static SIZE_WIDTH: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(\d+),$").unwrap());

static SIZE_HEIGHT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^,(\d+)$").unwrap());

static SIZE_PCT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"^pct:({NUM})$")).unwrap());

static SIZE_BOX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^!?(\d+),(\d+)$").unwrap());

static ROTATION: LazyLock<Regex> = LazyLock::new(|| Regex::new(&format!(r"^{NUM}$")).unwrap());

static FORMAT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[a-z0-9]+$").unwrap());

static PROFILE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[\w.\-]+$").unwrap());

/// Accepted color (quality) values
pub const COLORS: [&str; 4] = ["color", "grey", "bitonal", "native"];

/// Parse a captured integer, failing on overflow
fn int(caps: &regex::Captures<'_>, i: usize) -> Option<u64> {
    caps.get(i).and_then(|m| m.as_str().parse().ok())
}

fn float(caps: &regex::Captures<'_>, i: usize) -> Option<f64> {
    caps.get(i).and_then(|m| m.as_str().parse().ok())
}

pub fn validate_region(region: &str) -> Result<(), RequestError> {
    let invalid = || RequestError::InvalidRegion(region.to_string());

    if region == "full" {
        return Ok(());
    }
    if let Some(caps) = REGION_PIXELS.captures(region) {
        let ok = int(&caps, 1).is_some()
            && int(&caps, 2).is_some()
            && int(&caps, 3).is_some_and(|w| w > 0)
            && int(&caps, 4).is_some_and(|h| h > 0);
        return if ok { Ok(()) } else { Err(invalid()) };
    }
    if let Some(caps) = REGION_PCT.captures(region) {
        let ok = float(&caps, 1).is_some()
            && float(&caps, 2).is_some()
            && float(&caps, 3).is_some_and(|w| w > 0.0)
            && float(&caps, 4).is_some_and(|h| h > 0.0);
        return if ok { Ok(()) } else { Err(invalid()) };
    }
    Err(invalid())
}

pub fn validate_size(size: &str) -> Result<(), RequestError> {
    let invalid = || RequestError::InvalidSize(size.to_string());

    if size == "full" {
        return Ok(());
    }
    let positive = |v: Option<u64>| v.is_some_and(|v| v > 0);
    if let Some(caps) = SIZE_WIDTH.captures(size) {
        return positive(int(&caps, 1)).then_some(()).ok_or_else(invalid);
    }
    if let Some(caps) = SIZE_HEIGHT.captures(size) {
        return positive(int(&caps, 1)).then_some(()).ok_or_else(invalid);
    }
    if let Some(caps) = SIZE_PCT.captures(size) {
        return float(&caps, 1)
            .is_some_and(|p| p > 0.0)
            .then_some(())
            .ok_or_else(invalid);
    }
    if let Some(caps) = SIZE_BOX.captures(size) {
        let ok = positive(int(&caps, 1)) && positive(int(&caps, 2));
        return ok.then_some(()).ok_or_else(invalid);
    }
    Err(invalid())
}

pub fn validate_rotation(rotation: &str) -> Result<(), RequestError> {
    let degrees = ROTATION
        .is_match(rotation)
        .then(|| rotation.parse::<f64>().ok())
        .flatten();
    match degrees {
        Some(d) if (0.0..=360.0).contains(&d) => Ok(()),
        _ => Err(RequestError::InvalidRotation(rotation.to_string())),
    }
}

pub fn validate_color(color: &str) -> Result<(), RequestError> {
    if COLORS.contains(&color) {
        Ok(())
    } else {
        Err(RequestError::InvalidColor(color.to_string()))
    }
}

pub fn validate_format(format: &str) -> Result<(), RequestError> {
    if FORMAT.is_match(format) {
        Ok(())
    } else {
        Err(RequestError::InvalidFormat(format.to_string()))
    }
}

pub fn validate_profile(profile: &str) -> Result<(), RequestError> {
    if PROFILE.is_match(profile) {
        Ok(())
    } else {
        Err(RequestError::InvalidProfile(profile.to_string()))
    }
}

/// MIME type for a format extension, if known
pub fn mime_type_for(format: &str) -> Option<&'static str> {
    match format.to_ascii_lowercase().as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "gif" => Some("image/gif"),
        "tif" | "tiff" => Some("image/tiff"),
        "jp2" => Some("image/jp2"),
        "webp" => Some("image/webp"),
        "pdf" => Some("application/pdf"),
        _ => None,
    }
}
