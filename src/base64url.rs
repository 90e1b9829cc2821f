//! Base64url codec (URL-safe alphabet, no padding).

use base64ct::{Base64UrlUnpadded, Encoding};

/// Checks whether `ch` belongs to the base64url alphabet `[A-Za-z0-9-_]`.
pub fn is_alphabet_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '-' || ch == '_'
}

/// Checks that `segment` is non-empty and consists only of base64url characters.
pub fn is_valid_segment(segment: &str) -> bool {
    !segment.is_empty() && segment.chars().all(is_alphabet_char)
}

/// Encodes `bytes` as unpadded base64url.
pub fn encode(bytes: impl AsRef<[u8]>) -> String {
    Base64UrlUnpadded::encode_string(bytes.as_ref())
}

/// Decodes an unpadded base64url string.
///
/// Returns `None` if the string contains characters outside the alphabet, or has a length
/// or trailing bits that cannot result from encoding. In particular, decoding is stricter
/// than lenient decoders (e.g., Node's `Buffer`): `e31` is rejected even though such
/// decoders would ignore the non-zero trailing bit and return `{}`.
pub fn decode(encoded: &str) -> Option<Vec<u8>> {
    if !encoded.chars().all(is_alphabet_char) {
        return None;
    }
    Base64UrlUnpadded::decode_vec(encoded).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_canonical_trailing_bits_are_rejected() {
        assert_eq!(decode("e30").unwrap(), b"{}");
        assert_eq!(decode("e31"), None);
        assert_eq!(decode("e3"), None);
    }

    #[test]
    fn alphabet_check() {
        assert!(is_valid_segment("eyJhbGciOiJIUzI1NiJ9"));
        assert!(is_valid_segment("a-b_c"));
        assert!(!is_valid_segment(""));
        assert!(!is_valid_segment("a+b"));
        assert!(!is_valid_segment("ab/c"));
        assert!(!is_valid_segment("abc="));
        assert!(!is_valid_segment("ab.c"));
        assert!(!is_valid_segment("ñ"));
    }

    #[test]
    fn encoding_uses_url_safe_alphabet_without_padding() {
        assert_eq!(encode([0xfb, 0xff]), "-_8");
        assert_eq!(encode(b"Hello"), "SGVsbG8");
        assert_eq!(encode(b""), "");
    }

    #[test]
    fn decoding_restores_bytes() {
        assert_eq!(decode("SGVsbG8").unwrap(), b"Hello");
        assert_eq!(decode("-_8").unwrap(), [0xfb, 0xff]);
        assert_eq!(decode("").unwrap(), b"");
    }

    #[test]
    fn decoding_errors() {
        // Padding and the standard alphabet are rejected.
        assert!(decode("SGVsbG8=").is_none());
        assert!(decode("+/8").is_none());
        // Length 1 (mod 4) cannot result from encoding.
        assert!(decode("SGVsb").is_none());
        // Non-zero trailing bits.
        assert!(decode("SGVsbG9").is_none());
    }
}
