//! Image payload helpers: base64 decoding and format sniffing.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

const PNG_MAGIC: &[u8] = b"\x89PNG\r\n\x1a\n";
const JPEG_MAGIC: &[u8] = b"\xff\xd8";

/// MIME type assumed when the leading bytes match no known format.
pub const FALLBACK_MIME_TYPE: &str = "image/jpeg";

/// Decodes a standard base64 image payload.
///
/// ASCII whitespace (line breaks from wrapped encoders) is ignored.
pub fn decode_image(encoded: &str) -> Result<Vec<u8>, base64::DecodeError> {
    let compact: String = encoded
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();
    STANDARD.decode(compact)
}

/// Detects the image MIME type from its magic bytes.
///
/// Recognizes PNG, JPEG, GIF (87a and 89a) and WebP; anything else is
/// reported as [`FALLBACK_MIME_TYPE`].
pub fn detect_mime_type(bytes: &[u8]) -> &'static str {
    if bytes.starts_with(PNG_MAGIC) {
        "image/png"
    } else if bytes.starts_with(JPEG_MAGIC) {
        "image/jpeg"
    } else if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
        "image/gif"
    } else if bytes.len() >= 12 && &bytes[..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        "image/webp"
    } else {
        FALLBACK_MIME_TYPE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_known_formats() {
        assert_eq!(detect_mime_type(b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR"), "image/png");
        assert_eq!(detect_mime_type(b"\xff\xd8\xff\xe0JFIF"), "image/jpeg");
        assert_eq!(detect_mime_type(b"GIF87a...."), "image/gif");
        assert_eq!(detect_mime_type(b"GIF89a...."), "image/gif");
        assert_eq!(detect_mime_type(b"RIFF\x24\0\0\0WEBPVP8 "), "image/webp");
    }

    #[test]
    fn test_detect_unknown_defaults_to_jpeg() {
        assert_eq!(detect_mime_type(b""), "image/jpeg");
        assert_eq!(detect_mime_type(b"BM\x36\0"), "image/jpeg");
        // RIFF container that is not WebP
        assert_eq!(detect_mime_type(b"RIFF\x24\0\0\0WAVEfmt "), "image/jpeg");
        // Truncated PNG signature
        assert_eq!(detect_mime_type(b"\x89PNG"), "image/jpeg");
    }

    #[test]
    fn test_decode_image() {
        assert_eq!(decode_image("AQID").unwrap(), vec![1, 2, 3]);
        assert_eq!(decode_image("AQ\nID\r\n").unwrap(), vec![1, 2, 3]);
        assert!(decode_image("not base64!").is_err());
    }
}
