//! Payload encryption capability
//!
//! The actual cryptography lives in platform code outside this crate. The
//! gateway only knows how to wrap sealed bytes in the `{"data": "<base64>"}`
//! envelope and unwrap responses that arrive that way.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
#[error("cipher failure: {0}")]
pub struct CipherError(pub String);

/// Injected encrypt/decrypt bridge
pub trait PayloadCipher: Send + Sync {
    fn seal(&self, plaintext: &[u8]) -> Result<Vec<u8>, CipherError>;
    fn open(&self, sealed: &[u8]) -> Result<Vec<u8>, CipherError>;
}

#[derive(Debug, Serialize, Deserialize)]
struct SealedEnvelope {
    data: String,
}

/// Seal a JSON body into the envelope the API expects.
pub(crate) fn seal_json(cipher: &dyn PayloadCipher, json: &[u8]) -> Result<Vec<u8>, CipherError> {
    let sealed = cipher.seal(json)?;
    let envelope = SealedEnvelope {
        data: STANDARD.encode(sealed),
    };
    serde_json::to_vec(&envelope).map_err(|e| CipherError(e.to_string()))
}

/// Open a successful response body. With a cipher configured, anything
/// other than a sealed envelope is rejected.
pub(crate) fn open_json(cipher: &dyn PayloadCipher, body: &[u8]) -> Result<Vec<u8>, CipherError> {
    let envelope = serde_json::from_slice::<SealedEnvelope>(body)
        .map_err(|e| CipherError(format!("response is not a sealed envelope: {e}")))?;
    let sealed = STANDARD
        .decode(envelope.data.as_bytes())
        .map_err(|e| CipherError(format!("invalid base64 payload: {e}")))?;
    cipher.open(&sealed)
}
