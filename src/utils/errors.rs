use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("key text is not valid base64: {0}")]
    PemDecode(#[from] base64::DecodeError),
    #[error("key is not a valid SPKI RSA public key: {0}")]
    KeyImport(#[from] rsa::pkcs8::spki::Error),
    #[error("expected a {expected}-bit modulus, got {actual} bits")]
    UnsupportedModulus { expected: usize, actual: usize },
    #[error("unexpected public exponent")]
    UnsupportedExponent,
    #[error("failed to canonicalize message: {0}")]
    Canonicalization(#[from] serde_json::Error),
    #[error("signature is not valid base64")]
    SignatureDecode,
}
