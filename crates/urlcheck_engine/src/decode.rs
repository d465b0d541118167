use chardetng::EncodingDetector;
use encoding_rs::Encoding;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedBody {
    pub text: String,
    pub encoding_label: String,
}

/// Decode raw bytes into UTF-8 using: BOM -> Content-Type charset -> chardetng fallback.
///
/// Decoding never fails: malformed sequences become U+FFFD.
pub fn decode_body(bytes: &[u8], content_type: Option<&str>) -> DecodedBody {
    // 1) BOM aware decode using encoding_rs helper
    if let Some((encoding, _)) = Encoding::for_bom(bytes) {
        return decode_with(bytes, encoding);
    }

    // 2) Content-Type header charset
    if let Some(label) = content_type.and_then(extract_charset) {
        if let Some(enc) = Encoding::for_label(label.as_bytes()) {
            return decode_with(bytes, enc);
        }
    }

    // 3) chardetng detection, which also looks at meta charset hints
    let mut detector = EncodingDetector::new();
    detector.feed(bytes, true);
    let enc = detector.guess(None, true);
    decode_with(bytes, enc)
}

fn extract_charset(content_type: &str) -> Option<String> {
    content_type
        .split(';')
        .filter_map(|part| {
            let (key, value) = part.split_once('=')?;
            key.trim()
                .eq_ignore_ascii_case("charset")
                .then(|| value.trim().trim_matches(['"', '\'']).to_string())
        })
        .next()
}

fn decode_with(bytes: &[u8], enc: &'static Encoding) -> DecodedBody {
    let (text, actual, _had_errors) = enc.decode(bytes);
    DecodedBody {
        text: text.into_owned(),
        encoding_label: actual.name().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn respects_charset_header() {
        let decoded = decode_body(b"caf\xe9", Some("text/html; charset=ISO-8859-1"));
        assert_eq!(decoded.text, "café");
        assert_eq!(decoded.encoding_label, "windows-1252");
    }

    #[test]
    fn handles_utf8_bom() {
        let decoded = decode_body(b"\xEF\xBB\xBFhello", Some("text/html"));
        assert_eq!(decoded.text, "hello");
        assert_eq!(decoded.encoding_label, "UTF-8");
    }

    #[test]
    fn quoted_upper_case_charset_is_understood() {
        let decoded = decode_body("привет".as_bytes(), Some(r#"text/html; Charset="UTF-8""#));
        assert_eq!(decoded.text, "привет");
    }

    #[test]
    fn invalid_bytes_are_replaced_not_rejected() {
        let decoded = decode_body(b"ok \xff\xfe done", Some("text/html; charset=utf-8"));
        assert!(decoded.text.starts_with("ok "));
        assert!(decoded.text.ends_with(" done"));
        assert!(decoded.text.contains('\u{FFFD}'));
    }
}
