//! Transport encoding of response bodies
//!
//! The envelope carries bodies as strings: textual content types travel as
//! UTF-8, everything else as base64.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use super::mime;
use crate::logger;

/// A response body in its envelope representation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportBody {
    Text(String),
    Base64(String),
}

impl TransportBody {
    /// Encode raw bytes according to the response's Content-Type
    pub fn encode(content_type: Option<&str>, body: &[u8]) -> Self {
        if mime::is_textual(content_type) {
            Self::Text(String::from_utf8_lossy(body).into_owned())
        } else {
            Self::Base64(STANDARD.encode(body))
        }
    }

    pub fn into_string(self) -> String {
        match self {
            Self::Text(s) | Self::Base64(s) => s,
        }
    }
}

/// Decode a base64 request body
///
/// Bodies that are not valid base64 are returned as their raw bytes.
pub fn decode_request_body(body: &str) -> Vec<u8> {
    STANDARD.decode(body).unwrap_or_else(|e| {
        logger::log_warning(&format!(
            "Request body is not valid base64 ({e}), passing it through verbatim"
        ));
        body.as_bytes().to_vec()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_is_text() {
        let body = TransportBody::encode(Some("application/json"), br#"{"ok":true}"#);
        assert_eq!(body, TransportBody::Text(r#"{"ok":true}"#.to_string()));
    }

    #[test]
    fn test_parameters_are_ignored() {
        let body = TransportBody::encode(Some("text/html; charset=utf-8"), b"<p>hi</p>");
        assert_eq!(body, TransportBody::Text("<p>hi</p>".to_string()));
    }

    #[test]
    fn test_png_is_base64() {
        let png = [0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a, 0x00, 0xff];
        let body = TransportBody::encode(Some("image/png"), &png);
        let TransportBody::Base64(encoded) = body else {
            panic!("expected base64 body");
        };
        assert_eq!(STANDARD.decode(encoded).unwrap(), png);
    }

    #[test]
    fn test_missing_content_type_is_base64() {
        let body = TransportBody::encode(None, b"abc");
        assert_eq!(body, TransportBody::Base64("YWJj".to_string()));
    }

    #[test]
    fn test_decode_request_body() {
        assert_eq!(decode_request_body("aGVsbG8="), b"hello");
        assert_eq!(decode_request_body(""), b"");
        assert_eq!(decode_request_body("not base64!"), b"not base64!");
    }
}
