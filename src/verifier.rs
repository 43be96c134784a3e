use base64::{prelude::BASE64_STANDARD, Engine};
use once_cell::sync::Lazy;
use rsa::{
    pkcs1v15::{Signature, VerifyingKey},
    signature::Verifier,
};
use serde::Serialize;
use sha2::Sha256;
use thiserror::Error;

use crate::{
    config::{Config, PayloadEncoding, VerifierConfig},
    utils::{
        canonical::to_canonical_bytes,
        errors::Error as KeyError,
        key_material::{import_public_key, pem_to_der, KeyParams},
        signature::decode_signature,
    },
};

/// Verifier configuration read from the environment on first use.
static CONFIG: Lazy<VerifierConfig> = Lazy::new(|| {
    dotenvy::dotenv().ok();
    match Config::load() {
        Ok(config) => config.verifier,
        Err(e) => {
            tracing::error!("failed to load verifier configuration: {e}");
            VerifierConfig::default()
        }
    }
});

/// Whether the process has any public key text configured.
pub static HAS_PUBLIC_KEY: Lazy<bool> =
    Lazy::new(|| SignatureVerifier::from_config(&CONFIG).has_public_key());

pub fn has_public_key() -> bool {
    *HAS_PUBLIC_KEY
}

/// Checks `signature` (standard Base64) against `message` using the
/// process-wide public key.
///
/// Resolves to `false` on every failure: no key, unusable key, message that
/// cannot be canonicalized, undecodable signature, or a signature mismatch.
pub async fn verify_signature<T: Serialize + ?Sized>(message: &T, signature: &str) -> bool {
    SignatureVerifier::from_config(&CONFIG)
        .verify_async(message, signature)
        .await
}

#[derive(Debug, Error)]
pub(crate) enum VerifyError {
    #[error("no public key configured")]
    ConfigurationMissing,
    #[error("public key is unusable: {0}")]
    KeyImport(KeyError),
    #[error("message could not be canonicalized: {0}")]
    Canonicalization(KeyError),
    #[error("signature could not be decoded")]
    Decoding,
    #[error("signature does not match")]
    Mismatch,
}

/// An imported RSA public key, usable for PKCS#1 v1.5 / SHA-256 verification only.
pub struct PublicKeyMaterial {
    key: VerifyingKey<Sha256>,
}

impl PublicKeyMaterial {
    pub fn from_pem(pem: &str, params: KeyParams) -> Result<Self, KeyError> {
        let der = pem_to_der(pem)?;
        let key = import_public_key(&der, params)?;
        Ok(Self {
            key: VerifyingKey::new(key),
        })
    }

    /// Returns `true` if `signature` is valid over `payload`.
    pub fn verify(&self, payload: &[u8], signature: &[u8]) -> bool {
        Signature::try_from(signature)
            .and_then(|signature| self.key.verify(payload, &signature))
            .is_ok()
    }
}

/// Verifies detached signatures over canonical JSON.
///
/// The key is re-imported on every call; nothing is cached between calls.
#[derive(Debug, Clone, Default)]
pub struct SignatureVerifier {
    public_key_pem: Option<String>,
    params: KeyParams,
    payload_encoding: PayloadEncoding,
}

impl SignatureVerifier {
    /// Empty key text is treated as no key.
    pub fn new(public_key_pem: Option<String>) -> Self {
        Self {
            public_key_pem: public_key_pem.filter(|pem| !pem.is_empty()),
            ..Default::default()
        }
    }

    pub fn from_config(config: &VerifierConfig) -> Self {
        Self::new(config.public_key.clone())
            .with_key_params(config.key_params())
            .with_payload_encoding(config.payload_encoding)
    }

    pub fn with_key_params(mut self, params: KeyParams) -> Self {
        self.params = params;
        self
    }

    pub fn with_payload_encoding(mut self, encoding: PayloadEncoding) -> Self {
        self.payload_encoding = encoding;
        self
    }

    pub fn has_public_key(&self) -> bool {
        self.public_key_pem.is_some()
    }

    /// Imports the configured key, or `None` if there is none or it is unusable.
    pub fn load_key(&self) -> Option<PublicKeyMaterial> {
        match self.try_load_key() {
            Ok(key) => Some(key),
            Err(VerifyError::KeyImport(e)) => {
                tracing::warn!("failed to import public key: {e}");
                None
            }
            Err(_) => None,
        }
    }

    /// Synchronous verification. See [`verify_signature`] for the failure policy.
    pub fn verify<T: Serialize + ?Sized>(&self, message: &T, signature: &str) -> bool {
        settle(self.check(message, signature))
    }

    /// Runs verification on the blocking pool.
    pub async fn verify_async<T: Serialize + ?Sized>(&self, message: &T, signature: &str) -> bool {
        if !self.has_public_key() {
            return settle(Err(VerifyError::ConfigurationMissing));
        }
        let payload = match self.payload(message) {
            Ok(payload) => payload,
            Err(e) => return settle(Err(e)),
        };

        let verifier = self.clone();
        let signature = signature.to_owned();
        let task = tokio::task::spawn_blocking(move || {
            let key = verifier.try_load_key()?;
            verifier.check_payload(&key, &payload, &signature)
        });

        match task.await {
            Ok(result) => settle(result),
            Err(e) => {
                tracing::error!("signature verification task failed: {e}");
                false
            }
        }
    }

    fn check<T: Serialize + ?Sized>(&self, message: &T, signature: &str) -> Result<(), VerifyError> {
        let key = self.try_load_key()?;
        let payload = self.payload(message)?;
        self.check_payload(&key, &payload, signature)
    }

    fn check_payload(
        &self,
        key: &PublicKeyMaterial,
        payload: &[u8],
        signature: &str,
    ) -> Result<(), VerifyError> {
        let signature = decode_signature(signature).map_err(|_| VerifyError::Decoding)?;
        if key.verify(payload, &signature) {
            Ok(())
        } else {
            Err(VerifyError::Mismatch)
        }
    }

    fn try_load_key(&self) -> Result<PublicKeyMaterial, VerifyError> {
        let pem = self
            .public_key_pem
            .as_deref()
            .ok_or(VerifyError::ConfigurationMissing)?;
        PublicKeyMaterial::from_pem(pem, self.params).map_err(VerifyError::KeyImport)
    }

    fn payload<T: Serialize + ?Sized>(&self, message: &T) -> Result<Vec<u8>, VerifyError> {
        let canonical = to_canonical_bytes(message).map_err(VerifyError::Canonicalization)?;
        Ok(match self.payload_encoding {
            PayloadEncoding::Utf8 => canonical,
            PayloadEncoding::Base64 => BASE64_STANDARD.encode(canonical).into_bytes(),
        })
    }
}

fn settle(result: Result<(), VerifyError>) -> bool {
    match result {
        Ok(()) => true,
        Err(VerifyError::KeyImport(e)) => {
            tracing::warn!("failed to import public key: {e}");
            false
        }
        Err(e) => {
            tracing::debug!("signature rejected: {e}");
            false
        }
    }
}
