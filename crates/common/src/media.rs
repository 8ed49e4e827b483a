//! Media types understood by the API and content sniffing for uploads.

pub const HAL_JSON: &str = "application/hal+json";
pub const APPLICATION_JSON: &str = "application/json";
pub const APPLICATION_XLSX: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
pub const APPLICATION_XLS: &str = "application/vnd.ms-excel";
pub const IMAGE_PNG: &str = "image/png";
pub const IMAGE_JPEG: &str = "image/jpeg";
pub const IMAGE_GIF: &str = "image/gif";
pub const MULTIPART_FORM_DATA: &str = "multipart/form-data";

pub const SUPPORTED_IMAGES: [&str; 3] = [IMAGE_PNG, IMAGE_JPEG, IMAGE_GIF];

/// Lower-cased media type without parameters (`text/html; charset=utf-8` -> `text/html`).
pub fn essence(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

pub fn is_supported_image(content_type: &str) -> bool {
    SUPPORTED_IMAGES.contains(&essence(content_type).as_str())
}

/// Guess a media type from the leading bytes of a file.
pub fn detect_mime_type(bytes: &[u8]) -> Option<&'static str> {
    const PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
    const JPEG: &[u8] = &[0xFF, 0xD8, 0xFF];
    const ZIP: &[u8] = &[b'P', b'K', 0x03, 0x04];
    const OLE: &[u8] = &[0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];

    if bytes.starts_with(PNG) {
        Some(IMAGE_PNG)
    } else if bytes.starts_with(JPEG) {
        Some(IMAGE_JPEG)
    } else if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
        Some(IMAGE_GIF)
    } else if bytes.starts_with(ZIP) {
        // xlsx is a zip container; nothing else we accept is
        Some(APPLICATION_XLSX)
    } else if bytes.starts_with(OLE) {
        Some(APPLICATION_XLS)
    } else {
        None
    }
}

/// Pick the content type of an upload: explicit header first, sniffed bytes second.
pub fn resolve_content_type(declared: Option<&str>, bytes: &[u8]) -> Option<String> {
    declared
        .map(essence)
        .filter(|ct| !ct.is_empty() && ct != "application/octet-stream")
        .or_else(|| detect_mime_type(bytes).map(str::to_string))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn essence_strips_parameters() {
        assert_eq!(essence("Image/PNG; q=0.9"), "image/png");
        assert_eq!(essence(""), "");
    }

    #[test]
    fn detects_common_images() {
        assert_eq!(detect_mime_type(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0]), Some(IMAGE_PNG));
        assert_eq!(detect_mime_type(&[0xFF, 0xD8, 0xFF, 0xE0]), Some(IMAGE_JPEG));
        assert_eq!(detect_mime_type(b"GIF89a...."), Some(IMAGE_GIF));
        assert_eq!(detect_mime_type(b"hello"), None);
    }

    #[test]
    fn declared_type_wins_over_sniffing() {
        let png = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
        assert_eq!(resolve_content_type(Some("image/gif"), &png).as_deref(), Some(IMAGE_GIF));
        assert_eq!(resolve_content_type(Some("application/octet-stream"), &png).as_deref(), Some(IMAGE_PNG));
        assert_eq!(resolve_content_type(None, b"nope"), None);
    }

    #[test]
    fn supported_image_check_ignores_case() {
        assert!(is_supported_image("IMAGE/JPEG"));
        assert!(!is_supported_image("image/webp"));
    }
}
