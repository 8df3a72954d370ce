//! Response body decoding: decompression followed by lossy UTF-8 decoding.
//!
//! Decoding never fails. A body whose declared compression turns out to be
//! wrong is treated as already decompressed, and invalid UTF-8 sequences are
//! replaced with U+FFFD.

use std::borrow::Cow;
use std::io::Read;

use flate2::read::{GzDecoder, ZlibDecoder};
use tracing::debug;

/// Compression declared by a `Content-Encoding` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentEncoding {
    /// No (or an unrecognized) compression.
    Identity,
    /// gzip / x-gzip.
    Gzip,
    /// zlib-wrapped deflate.
    Deflate,
}

impl ContentEncoding {
    /// Parses a header value. Unknown schemes map to `Identity`.
    pub fn from_header(value: Option<&str>) -> Self {
        let Some(value) = value else {
            return ContentEncoding::Identity;
        };
        match value.trim().to_ascii_lowercase().as_str() {
            "gzip" | "x-gzip" => ContentEncoding::Gzip,
            "deflate" => ContentEncoding::Deflate,
            _ => ContentEncoding::Identity,
        }
    }
}

/// Decodes a raw response body into text.
pub fn decode(body: &[u8], content_encoding: Option<&str>) -> String {
    let bytes = decompress(body, ContentEncoding::from_header(content_encoding));
    String::from_utf8_lossy(&bytes).into_owned()
}

fn decompress(body: &[u8], encoding: ContentEncoding) -> Cow<'_, [u8]> {
    let mut out = Vec::new();
    let result = match encoding {
        ContentEncoding::Identity => return Cow::Borrowed(body),
        ContentEncoding::Gzip => GzDecoder::new(body).read_to_end(&mut out),
        ContentEncoding::Deflate => ZlibDecoder::new(body).read_to_end(&mut out),
    };

    match result {
        Ok(_) => Cow::Owned(out),
        Err(e) => {
            debug!(
                "Declared {:?} body failed to decompress ({}), using raw bytes",
                encoding, e
            );
            Cow::Borrowed(body)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::{GzEncoder, ZlibEncoder};
    use flate2::Compression;
    use std::io::Write;

    fn gzip(data: &[u8]) -> Vec<u8> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    #[test]
    fn test_content_encoding_from_header() {
        assert_eq!(ContentEncoding::from_header(None), ContentEncoding::Identity);
        assert_eq!(ContentEncoding::from_header(Some("gzip")), ContentEncoding::Gzip);
        assert_eq!(ContentEncoding::from_header(Some(" X-GZIP ")), ContentEncoding::Gzip);
        assert_eq!(ContentEncoding::from_header(Some("deflate")), ContentEncoding::Deflate);
        assert_eq!(ContentEncoding::from_header(Some("br")), ContentEncoding::Identity);
    }

    #[test]
    fn test_decode_plain_utf8() {
        let html = "<p>百度一下，你就知道</p>";
        assert_eq!(decode(html.as_bytes(), None), html);
    }

    #[test]
    fn test_decode_gzip() {
        let html = "<html><body>Rust 编程语言</body></html>";
        assert_eq!(decode(&gzip(html.as_bytes()), Some("gzip")), html);
    }

    #[test]
    fn test_decode_deflate() {
        let html = "<p>deflated</p>";
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(html.as_bytes()).unwrap();
        let body = encoder.finish().unwrap();
        assert_eq!(decode(&body, Some("deflate")), html);
    }

    #[test]
    fn test_decode_gzip_header_on_plain_body_falls_back() {
        let html = "<p>not actually compressed</p>";
        assert_eq!(decode(html.as_bytes(), Some("gzip")), html);
    }

    #[test]
    fn test_decode_invalid_utf8_is_replaced() {
        let body = [b'a', 0xff, 0xfe, b'b'];
        let text = decode(&body, None);
        assert!(text.starts_with('a'));
        assert!(text.ends_with('b'));
        assert!(text.contains('\u{FFFD}'));
    }

    #[test]
    fn test_decode_gbk_bytes_do_not_error() {
        // "百度" in GBK is not valid UTF-8
        let body = [0xb0, 0xd9, 0xb6, 0xc8];
        let text = decode(&body, None);
        assert!(text.contains('\u{FFFD}'));
        assert!(!text.contains("百度"));
    }

    #[test]
    fn test_decode_empty() {
        assert_eq!(decode(&[], Some("gzip")), "");
    }
}
