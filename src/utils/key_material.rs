use base64::{prelude::BASE64_STANDARD, Engine};
use rsa::{pkcs8::DecodePublicKey, traits::PublicKeyParts, BigUint, RsaPublicKey};
use serde::Deserialize;

use super::errors::Error;

/// Delimiter fragments that mark a line as PEM framing rather than payload.
///
/// Private-key markers are only stripped; the body is always imported as a
/// public key and fails import if it is anything else.
const PEM_DELIMITERS: [&str; 8] = [
    "-BEGIN RSA PUBLIC KEY-",
    "-BEGIN RSA PRIVATE KEY-",
    "-BEGIN PUBLIC KEY-",
    "-BEGIN PRIVATE KEY-",
    "-END RSA PUBLIC KEY-",
    "-END RSA PRIVATE KEY-",
    "-END PUBLIC KEY-",
    "-END PRIVATE KEY-",
];

/// Parameters the imported RSA key must carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct KeyParams {
    pub modulus_bits: usize,
    pub public_exponent: u32,
}

impl Default for KeyParams {
    fn default() -> Self {
        Self {
            modulus_bits: 3072,
            public_exponent: 65537,
        }
    }
}

/// Strips PEM framing and blank lines, then decodes the remaining body.
pub fn pem_to_der(pem: &str) -> Result<Vec<u8>, Error> {
    let encoded: String = pem
        .split('\n')
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter(|line| !PEM_DELIMITERS.iter().any(|marker| line.contains(marker)))
        .collect();

    Ok(BASE64_STANDARD.decode(encoded)?)
}

/// Imports SPKI DER bytes as an RSA public key and checks its parameters.
pub fn import_public_key(der: &[u8], params: KeyParams) -> Result<RsaPublicKey, Error> {
    let key = RsaPublicKey::from_public_key_der(der)?;

    let bits = key.n().bits();
    if bits != params.modulus_bits {
        return Err(Error::UnsupportedModulus {
            expected: params.modulus_bits,
            actual: bits,
        });
    }
    if *key.e() != BigUint::from(params.public_exponent) {
        return Err(Error::UnsupportedExponent);
    }

    Ok(key)
}
