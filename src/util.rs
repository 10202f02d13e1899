//! Text decoding and hashing helpers.

use std::borrow::Cow;
use std::path::Path;

use crate::error::Result;

/// Decode bytes to a string, handling various encodings.
///
/// This function:
/// 1. First tries UTF-8 (handles BOM automatically via encoding_rs)
/// 2. If malformed, tries the hint encoding (e.g. from `<meta charset>`)
/// 3. Falls back to Windows-1252, which is what editors on older student
///    machines tend to save
///
/// Uses `Cow<str>` to avoid allocation when the input is valid UTF-8.
pub fn decode_text<'a>(bytes: &'a [u8], hint_encoding: Option<&str>) -> Cow<'a, str> {
    let (result, _encoding, malformed) = encoding_rs::UTF_8.decode(bytes);

    if !malformed {
        return result;
    }

    if let Some(name) = hint_encoding
        && let Some(encoding) = encoding_rs::Encoding::for_label(name.as_bytes())
    {
        let (result, _, _) = encoding.decode(bytes);
        return result;
    }

    let (result, _, _) = encoding_rs::WINDOWS_1252.decode(bytes);
    result
}

/// Read a submission file as text.
pub fn read_text_file(path: impl AsRef<Path>) -> Result<String> {
    let path = path.as_ref();
    let bytes = std::fs::read(path)?;
    tracing::debug!(path = %path.display(), bytes = bytes.len(), "read input file");
    Ok(decode_text(&bytes, None).into_owned())
}

/// Hex SHA-1 of the text.
pub fn content_hash(text: &str) -> String {
    sha1_smol::Sha1::from(text.as_bytes()).hexdigest()
}

/// Hex SHA-1 of the text with every whitespace character removed.
///
/// Used to detect edits to provided markup while tolerating line-ending and
/// indentation changes made by editors.
pub fn markup_digest(text: &str) -> String {
    let mut hasher = sha1_smol::Sha1::new();
    let mut buf = [0u8; 4];
    for ch in text.chars().filter(|c| !c.is_whitespace()) {
        hasher.update(ch.encode_utf8(&mut buf).as_bytes());
    }
    hasher.digest().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_utf8() {
        assert_eq!(decode_text("héllo".as_bytes(), None), "héllo");
    }

    #[test]
    fn test_decode_windows_1252_fallback() {
        // 0xE9 is "é" in Windows-1252 and invalid as a lone UTF-8 byte
        assert_eq!(decode_text(b"caf\xE9", None), "café");
    }

    #[test]
    fn test_markup_digest_ignores_whitespace() {
        let a = "<p>\n  Hello\r\n</p>";
        let b = "<p>Hello</p>";
        assert_eq!(markup_digest(a), markup_digest(b));
        assert_ne!(markup_digest(b), markup_digest("<p>Hello!</p>"));
    }

    #[test]
    fn test_content_hash_is_sha1_hex() {
        assert_eq!(
            content_hash("abc"),
            "a9993e364706816aba3e25717850c26c9cd0d89d"
        );
    }
}
