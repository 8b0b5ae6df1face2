//! Ed25519 request-signature verification.

use ed25519_dalek::{Signature, Verifier, VerifyingKey};

use crate::error::ConfigurationError;

/// Verifies `x-signature-ed25519` headers against the application's
/// public key.
#[derive(Clone)]
pub struct SignatureVerifier {
    key: VerifyingKey,
}

impl SignatureVerifier {
    /// Build a verifier from the hex-encoded public key shown in the
    /// platform's application dashboard.
    pub fn from_hex(public_key: &str) -> Result<Self, ConfigurationError> {
        let bytes = hex::decode(public_key.trim())
            .map_err(|error| ConfigurationError::invalid("public_key", error.to_string()))?;
        let bytes: [u8; 32] = bytes
            .try_into()
            .map_err(|_| ConfigurationError::invalid("public_key", "expected 32 bytes"))?;
        let key = VerifyingKey::from_bytes(&bytes)
            .map_err(|error| ConfigurationError::invalid("public_key", error.to_string()))?;
        Ok(Self { key })
    }

    /// Check a hex signature over `timestamp ‖ body`.
    pub fn verify(&self, timestamp: &[u8], body: &[u8], signature_hex: &str) -> bool {
        let Ok(bytes) = hex::decode(signature_hex) else {
            return false;
        };
        let Ok(signature) = Signature::from_slice(&bytes) else {
            return false;
        };

        let mut message = Vec::with_capacity(timestamp.len() + body.len());
        message.extend_from_slice(timestamp);
        message.extend_from_slice(body);
        self.key.verify(&message, &signature).is_ok()
    }
}
