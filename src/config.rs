use config::{Config as ConfigLib, ConfigError, Environment};
use serde::Deserialize;

use crate::utils::key_material::KeyParams;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub verifier: VerifierConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VerifierConfig {
    /// PEM text of the trusted public key. Unset means nothing verifies.
    #[serde(default)]
    pub public_key: Option<String>,
    pub modulus_bits: usize,
    pub public_exponent: u32,
    pub payload_encoding: PayloadEncoding,
}

/// Byte layout the signer signed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PayloadEncoding {
    /// UTF-8 bytes of the canonical JSON.
    #[default]
    Utf8,
    /// ASCII bytes of the standard Base64 encoding of the canonical JSON.
    Base64,
}

impl VerifierConfig {
    pub fn key_params(&self) -> KeyParams {
        KeyParams {
            modulus_bits: self.modulus_bits,
            public_exponent: self.public_exponent,
        }
    }
}

impl Default for VerifierConfig {
    fn default() -> Self {
        let params = KeyParams::default();
        Self {
            public_key: None,
            modulus_bits: params.modulus_bits,
            public_exponent: params.public_exponent,
            payload_encoding: PayloadEncoding::default(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        let params = KeyParams::default();
        let config = ConfigLib::builder()
            .set_default("verifier.modulus_bits", params.modulus_bits as i64)?
            .set_default("verifier.public_exponent", i64::from(params.public_exponent))?
            .set_default("verifier.payload_encoding", "utf8")?
            // Override config values via environment variables
            // The environment variables should be prefixed with 'APP_' and use '__' as a separator
            // Example: APP_VERIFIER__PUBLIC_KEY="-----BEGIN PUBLIC KEY-----..."
            .add_source(
                Environment::with_prefix("APP")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        config.try_deserialize()
    }
}
