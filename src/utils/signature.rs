use base64::{
    alphabet,
    engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
    Engine,
};

use super::errors::Error;

/// Standard alphabet, padding optional, trailing bits tolerated.
const FORGIVING: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

/// Decodes a Base64 signature, ignoring ASCII whitespace such as line wraps.
pub fn decode_signature(signature: &str) -> Result<Vec<u8>, Error> {
    let compact: String = signature
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();

    FORGIVING
        .decode(compact)
        .map_err(|_| Error::SignatureDecode)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_padded_and_unpadded() {
        assert_eq!(decode_signature("aGVsbG8=").unwrap(), b"hello");
        assert_eq!(decode_signature("aGVsbG8").unwrap(), b"hello");
    }

    #[test]
    fn test_decode_ignores_whitespace() {
        assert_eq!(decode_signature(" aGVs\nbG8=\r\n").unwrap(), b"hello");
    }

    #[test]
    fn test_decode_empty() {
        assert!(decode_signature("").unwrap().is_empty());
    }

    #[test]
    fn test_decode_rejects_non_base64() {
        assert!(matches!(
            decode_signature("not base64 at all!"),
            Err(Error::SignatureDecode)
        ));
        assert!(decode_signature("a").is_err());
        // url-safe alphabet is not accepted
        assert!(decode_signature("-_-_").is_err());
    }
}
