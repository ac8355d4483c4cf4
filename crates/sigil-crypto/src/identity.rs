//! Deterministic identity key derivation.
//!
//! Each party holds a single long-lived secp256k1 scalar, configured as a
//! hex string. The identity key pair is a pure function of that secret:
//! deriving it twice always yields the same pair, with no randomness and
//! no I/O involved.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use k256::elliptic_curve::sec1::ToEncodedPoint;
use k256::{PublicKey, SecretKey};
use zeroize::Zeroize;

use crate::error::CryptoError;

/// Length of the raw private scalar in bytes.
pub const SECRET_SIZE: usize = 32;

/// Length of an uncompressed SEC1 public point in bytes (`0x04 || x || y`).
pub const PUBLIC_KEY_SIZE: usize = 65;

/// A secp256k1 identity key pair.
pub struct IdentityKeyPair {
    secret: SecretKey,
    public: PublicKey,
}

impl std::fmt::Debug for IdentityKeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityKeyPair")
            .field("public", &hex::encode(self.public_sec1_bytes()))
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

impl IdentityKeyPair {
    /// Derive the identity key pair from a hex-encoded secret scalar.
    ///
    /// Rejects malformed hex, inputs that are not exactly [`SECRET_SIZE`]
    /// bytes, and scalars outside the curve order (including zero).
    pub fn from_secret_hex(secret_hex: &str) -> Result<Self, CryptoError> {
        let mut bytes = hex::decode(secret_hex)
            .map_err(|e| CryptoError::InvalidSecret(format!("secret is not valid hex: {e}")))?;
        if bytes.len() != SECRET_SIZE {
            let actual = bytes.len();
            bytes.zeroize();
            return Err(CryptoError::InvalidSecret(format!(
                "expected a {SECRET_SIZE}-byte scalar, got {actual} bytes"
            )));
        }
        let parsed = SecretKey::from_slice(&bytes);
        bytes.zeroize();
        let secret = parsed.map_err(|_| {
            CryptoError::InvalidSecret("scalar is zero or outside the curve order".to_string())
        })?;
        let public = secret.public_key();
        Ok(Self { secret, public })
    }

    /// Get the public key.
    pub const fn public_key(&self) -> &PublicKey {
        &self.public
    }

    /// Get the public key as uncompressed SEC1 bytes.
    pub fn public_sec1_bytes(&self) -> Vec<u8> {
        self.public.to_encoded_point(false).as_bytes().to_vec()
    }

    /// Get the public key in the base64 form exchanged with counterparts.
    pub fn public_key_b64(&self) -> String {
        STANDARD.encode(self.public_sec1_bytes())
    }

    /// Get the secret key reference for ECDH and signing-key derivation.
    pub(crate) const fn secret(&self) -> &SecretKey {
        &self.secret
    }

    /// Compute a human-readable hex fingerprint of the public key.
    ///
    /// Uses SHA-256 of the SEC1 bytes, formatted as colon-separated hex
    /// pairs. Safe to log; never used in the protocol itself.
    pub fn fingerprint(&self) -> String {
        fingerprint_of(&self.public_sec1_bytes())
    }
}

/// Parse a counterpart's raw public key from its base64 SEC1 encoding.
pub fn parse_peer_public(peer_public_b64: &str) -> Result<PublicKey, CryptoError> {
    let bytes = STANDARD.decode(peer_public_b64).map_err(|e| {
        CryptoError::KeyAgreement(format!("counterpart public key is not valid base64: {e}"))
    })?;
    PublicKey::from_sec1_bytes(&bytes).map_err(|_| {
        CryptoError::KeyAgreement("counterpart public key is not a valid curve point".to_string())
    })
}

/// Compute a colon-separated hex fingerprint from raw public key bytes.
pub fn fingerprint_of(pubkey_bytes: &[u8]) -> String {
    use sha2::{Digest, Sha256};
    let hash = Sha256::digest(pubkey_bytes);
    hash.iter()
        .map(|b| format!("{b:02x}"))
        .collect::<Vec<_>>()
        .join(":")
}
