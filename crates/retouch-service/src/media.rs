//! Image payload helpers.
//!
//! Clients submit images either as raw base64 or as `data:image/...;base64,`
//! URLs. Provider payloads always use one canonical form, so both inputs
//! must normalize to identical bytes.

use base64::Engine as _;

const DATA_URL_MARKER: &str = ";base64,";

/// Strip a `data:image/*;base64,` prefix if present.
///
/// Idempotent: stripping an already-stripped payload returns it unchanged.
#[must_use]
pub fn strip_data_url_prefix(image: &str) -> &str {
    if let Some(rest) = image.strip_prefix("data:image/") {
        if let Some(idx) = rest.find(DATA_URL_MARKER) {
            return &rest[idx + DATA_URL_MARKER.len()..];
        }
    }
    image
}

/// Decode an image payload (raw base64 or data URL) into bytes.
///
/// # Errors
///
/// Returns the underlying decode error for malformed base64.
pub fn decode_image(image: &str) -> Result<Vec<u8>, base64::DecodeError> {
    base64::engine::general_purpose::STANDARD.decode(strip_data_url_prefix(image).trim())
}

/// Render a payload as a data URL for providers that take image URLs.
///
/// Payloads that already are data URLs pass through untouched.
#[must_use]
pub fn to_data_url(image: &str) -> String {
    if image.starts_with("data:image/") {
        image.to_string()
    } else {
        format!("data:image/jpeg;base64,{image}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PIXEL: &str = "iVBORw0KGgoAAAANSUhEUg==";

    #[test]
    fn strips_png_prefix() {
        let input = format!("data:image/png;base64,{PIXEL}");
        assert_eq!(strip_data_url_prefix(&input), PIXEL);
    }

    #[test]
    fn stripping_is_idempotent() {
        let input = format!("data:image/jpeg;base64,{PIXEL}");
        let once = strip_data_url_prefix(&input);
        assert_eq!(strip_data_url_prefix(once), once);
    }

    #[test]
    fn raw_base64_passes_through() {
        assert_eq!(strip_data_url_prefix(PIXEL), PIXEL);
    }

    #[test]
    fn data_url_and_raw_decode_identically() {
        let as_data_url = format!("data:image/png;base64,{PIXEL}");
        assert_eq!(
            decode_image(&as_data_url).unwrap(),
            decode_image(PIXEL).unwrap()
        );
    }

    #[test]
    fn malformed_base64_is_rejected() {
        assert!(decode_image("!!!not base64!!!").is_err());
    }

    #[test]
    fn to_data_url_wraps_raw_payloads_only() {
        assert!(to_data_url(PIXEL).starts_with("data:image/jpeg;base64,"));

        let already = format!("data:image/png;base64,{PIXEL}");
        assert_eq!(to_data_url(&already), already);
    }
}
