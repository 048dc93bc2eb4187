use super::{ContentExtractor, ExtractError, ExtractResult};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Accepts UTF-8 text files and rejects anything that looks binary.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainTextExtractor;

impl ContentExtractor for PlainTextExtractor {
    fn extract_plain_text(&self, bytes: &[u8]) -> ExtractResult<String> {
        let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);

        // NUL never appears in text files
        if bytes.contains(&0) {
            return Err(ExtractError::Binary);
        }

        Ok(String::from_utf8(bytes.to_vec())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_utf8() {
        let text = PlainTextExtractor
            .extract_plain_text("zażółć gęślą jaźń".as_bytes())
            .unwrap();
        assert_eq!(text, "zażółć gęślą jaźń");
    }

    #[test]
    fn test_strips_bom() {
        let text = PlainTextExtractor
            .extract_plain_text(b"\xEF\xBB\xBFapple")
            .unwrap();
        assert_eq!(text, "apple");
    }

    #[test]
    fn test_rejects_binary_and_invalid_utf8() {
        assert!(matches!(
            PlainTextExtractor.extract_plain_text(b"PNG\0\x01"),
            Err(ExtractError::Binary)
        ));
        assert!(matches!(
            PlainTextExtractor.extract_plain_text(b"\xff\xfe"),
            Err(ExtractError::InvalidUtf8(_))
        ));
    }
}
