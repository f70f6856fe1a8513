//! Text encoding detection for delimited files

use super::ImportError;
use chardetng::EncodingDetector;
use encoding_rs::{Encoding, UTF_8};

/// Decode raw file bytes into text
///
/// A byte-order mark wins. Otherwise NUL bytes mean binary content, valid
/// UTF-8 is taken as is, and anything else goes through `chardetng`.
/// Decoding that needs replacement characters is rejected.
pub fn decode_text(bytes: &[u8]) -> Result<(String, &'static Encoding), ImportError> {
    if let Some((encoding, bom_len)) = Encoding::for_bom(bytes) {
        return decode_with(encoding, &bytes[bom_len..]);
    }

    if bytes.contains(&0) {
        return Err(ImportError::UndetectableEncoding);
    }

    if let Ok(text) = std::str::from_utf8(bytes) {
        return Ok((text.to_string(), UTF_8));
    }

    let mut detector = EncodingDetector::new();
    detector.feed(bytes, true);
    let encoding = detector.guess(None, true);
    decode_with(encoding, bytes)
}

fn decode_with(
    encoding: &'static Encoding,
    bytes: &[u8],
) -> Result<(String, &'static Encoding), ImportError> {
    let (text, had_errors) = encoding.decode_without_bom_handling(bytes);
    if had_errors {
        return Err(ImportError::UndetectableEncoding);
    }
    Ok((text.into_owned(), encoding))
}
