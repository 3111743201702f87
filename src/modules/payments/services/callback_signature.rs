use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::core::{AppError, Result};

type HmacSha256 = Hmac<Sha256>;

/// HMAC-SHA256 check for provider callbacks.
///
/// The provider signs the raw request body with the shared secret and sends
/// the hex digest in `X-Signature`.
#[derive(Clone)]
pub struct CallbackVerifier {
    secret: Vec<u8>,
}

impl CallbackVerifier {
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// Hex signature of a body; used by tests and provider simulators
    pub fn sign(&self, body: &[u8]) -> Result<String> {
        let mut mac = self.mac()?;
        mac.update(body);
        Ok(hex::encode(mac.finalize().into_bytes()))
    }

    /// Verify a hex signature in constant time
    ///
    /// # Errors
    /// * `Unauthorized` - signature is not hex or does not match
    pub fn verify(&self, signature_hex: &str, body: &[u8]) -> Result<()> {
        let signature = hex::decode(signature_hex.trim())
            .map_err(|_| AppError::unauthorized("Callback signature is not valid hex"))?;

        let mut mac = self.mac()?;
        mac.update(body);
        mac.verify_slice(&signature)
            .map_err(|_| AppError::unauthorized("Callback signature mismatch"))
    }

    fn mac(&self) -> Result<HmacSha256> {
        HmacSha256::new_from_slice(&self.secret)
            .map_err(|e| AppError::internal(format!("Invalid callback secret: {}", e)))
    }
}

impl std::fmt::Debug for CallbackVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallbackVerifier")
            .field("secret", &"<redacted>")
            .finish()
    }
}
