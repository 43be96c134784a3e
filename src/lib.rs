pub mod config;
pub mod utils;
pub mod verifier;

pub use utils::canonical;
pub use verifier::{
    has_public_key, verify_signature, PublicKeyMaterial, SignatureVerifier, HAS_PUBLIC_KEY,
};
