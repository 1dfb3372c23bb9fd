use base64::{engine::general_purpose, Engine as _};
use x25519_dalek::{PublicKey, StaticSecret};

use crate::error::{Error, Result};

/// Opaque key material for one endpoint. The rest of the engine never looks
/// inside the base64 text, it only copies it into config files.
pub struct Keypair {
    pub private_b64: String,
    pub public_b64: String,
}

/**
 * @brief Generate a fresh X25519 keypair, base64-encoded.
 */
pub fn generate_keypair() -> Keypair {
    let secret = StaticSecret::random_from_rng(rand::rngs::OsRng);
    let public = PublicKey::from(&secret);
    Keypair {
        private_b64: general_purpose::STANDARD.encode(secret.to_bytes()),
        public_b64: general_purpose::STANDARD.encode(public.as_bytes()),
    }
}

/**
 * @brief Derive the public key from private key text taken out of a config.
 *
 * Used when adding a client to an already-provisioned server, to recover the
 * server's public key without minting a new pair.
 */
pub fn derive_public_key(private_b64: &str) -> Result<String> {
    let bytes = general_purpose::STANDARD
        .decode(private_b64.trim())
        .map_err(|e| Error::InvalidKey(e.to_string()))?;
    let bytes: [u8; 32] = bytes
        .as_slice()
        .try_into()
        .map_err(|_| Error::InvalidKey("private key must decode to 32 bytes".into()))?;
    let secret = StaticSecret::from(bytes);
    Ok(general_purpose::STANDARD.encode(PublicKey::from(&secret).as_bytes()))
}
