//! Envelope protocol orchestration.
//!
//! Sign-then-encrypt on the way out, decrypt-then-verify on the way in.
//! The signature covers the exact canonical plaintext that is encrypted,
//! and verification runs over the exact string decryption yields, so both
//! sides agree on the bytes without re-serializing.

use k256::PublicKey;
use k256::ecdh;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::cipher::{self, KEY_SIZE};
use crate::error::{CryptoError, Rejected};
use crate::identity::{IdentityKeyPair, parse_peer_public};
use crate::signing::{self, SigningKeyPair};

/// Configuration for constructing an [`EnvelopeProtocol`].
///
/// Explicit rather than read from the environment per call: resolve the
/// secret once at startup and hand it to the protocol.
#[derive(Clone, zeroize::ZeroizeOnDrop)]
pub struct ProtocolConfig {
    /// Hex-encoded secp256k1 private scalar identifying this process.
    pub private_key_hex: String,
}

impl std::fmt::Debug for ProtocolConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProtocolConfig")
            .field("private_key_hex", &"[REDACTED]")
            .finish()
    }
}

/// The wire-level unit exchanged between parties: a detached signature
/// over the canonical plaintext plus the authenticated ciphertext bundle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    /// Base64 DER ECDSA/SHA-256 signature over the canonical plaintext.
    pub signature: String,
    /// Serialized cipher bundle: `b64(ciphertext).b64(iv).b64(tag)`.
    pub encrypted: String,
}

/// Protocol state for one party: its identity and signing form.
///
/// Both key pairs are pure functions of the configured secret, so two
/// instances built from the same config are interchangeable. All methods
/// take `&self`; concurrent use from multiple threads is safe.
pub struct EnvelopeProtocol {
    identity: IdentityKeyPair,
    signer: SigningKeyPair,
}

impl std::fmt::Debug for EnvelopeProtocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnvelopeProtocol")
            .field("fingerprint", &self.identity.fingerprint())
            .finish_non_exhaustive()
    }
}

impl EnvelopeProtocol {
    /// Derive the identity and its signing form from configuration.
    pub fn new(config: &ProtocolConfig) -> Result<Self, CryptoError> {
        let identity = IdentityKeyPair::from_secret_hex(&config.private_key_hex)?;
        let signer = SigningKeyPair::from_identity(&identity)?;
        Ok(Self { identity, signer })
    }

    /// Local raw public key, base64-encoded uncompressed SEC1. This is the
    /// form a counterpart needs for key agreement.
    pub fn public_key_b64(&self) -> String {
        self.identity.public_key_b64()
    }

    /// Local public-key PEM container. This is the form a counterpart
    /// needs to verify this identity's signatures.
    pub fn public_key_pem(&self) -> &str {
        self.signer.public_key_pem()
    }

    /// Sign and encrypt `message` for the counterpart identified by
    /// `peer_public_b64` (base64 SEC1 curve point).
    ///
    /// Failures propagate as distinct [`CryptoError`] kinds; no partial
    /// envelope is ever returned.
    pub fn encrypt_for<T: Serialize>(
        &self,
        peer_public_b64: &str,
        message: &T,
    ) -> Result<Envelope, CryptoError> {
        let plaintext = canonical_json(message)?;
        let key = self.shared_key(peer_public_b64)?;
        let signature = self.signer.sign(&plaintext);
        let encrypted = cipher::encrypt(&plaintext, &key)?;
        Ok(Envelope {
            signature,
            encrypted,
        })
    }

    /// Decrypt and verify an envelope from the counterpart identified by
    /// `peer_public_b64` (key agreement) and `peer_public_pem` (signature
    /// verification).
    ///
    /// Every failure collapses into the opaque [`Rejected`]: a tampered
    /// ciphertext and a bad signature are indistinguishable to the caller.
    /// The concrete cause is logged at `debug` level.
    pub fn decrypt_from<T: DeserializeOwned>(
        &self,
        peer_public_b64: &str,
        peer_public_pem: &str,
        envelope: &Envelope,
    ) -> Result<T, Rejected> {
        self.open(peer_public_b64, peer_public_pem, envelope)
            .map_err(|err| {
                tracing::debug!(error = %err, "rejecting envelope");
                Rejected
            })
    }

    fn open<T: DeserializeOwned>(
        &self,
        peer_public_b64: &str,
        peer_public_pem: &str,
        envelope: &Envelope,
    ) -> Result<T, CryptoError> {
        let key = self.shared_key(peer_public_b64)?;
        let plaintext = cipher::decrypt(&envelope.encrypted, &key)?;
        let verifying_key = signing::verifying_key_from_pem(peer_public_pem)?;
        signing::verify(&plaintext, &envelope.signature, &verifying_key)?;
        serde_json::from_str(&plaintext).map_err(|e| {
            CryptoError::Serialization(format!("decrypted payload is not valid JSON: {e}"))
        })
    }

    /// ECDH with the counterpart's raw public key.
    ///
    /// The x-coordinate of the shared point is exactly [`KEY_SIZE`] bytes
    /// on this curve and is used directly as the cipher key. Both ends
    /// must derive it identically. The secret lives only for the duration
    /// of one seal or open call and is wiped on drop.
    fn shared_key(&self, peer_public_b64: &str) -> Result<Zeroizing<[u8; KEY_SIZE]>, CryptoError> {
        let peer: PublicKey = parse_peer_public(peer_public_b64)?;
        let shared = ecdh::diffie_hellman(
            self.identity.secret().to_nonzero_scalar(),
            peer.as_affine(),
        );
        let mut key = Zeroizing::new([0u8; KEY_SIZE]);
        key.copy_from_slice(&shared.raw_secret_bytes()[..KEY_SIZE]);
        Ok(key)
    }
}

/// Canonicalize a message to the string that is both signed and encrypted.
///
/// `serde_json` output is deterministic for a given value: struct fields
/// serialize in declaration order and `Value` maps in sorted key order, so
/// sender and receiver never disagree on the signed bytes.
fn canonical_json<T: Serialize>(message: &T) -> Result<String, CryptoError> {
    serde_json::to_string(message)
        .map_err(|e| CryptoError::Serialization(format!("message is not JSON-representable: {e}")))
}

/// Create a matched pair of protocols with distinct random identities.
///
/// Each side can encrypt for and verify the other, the way two configured
/// processes would in production.
#[cfg(any(test, feature = "test-utils"))]
pub fn test_protocol_pair() -> Result<(EnvelopeProtocol, EnvelopeProtocol), CryptoError> {
    use k256::SecretKey;

    let random_config = || ProtocolConfig {
        private_key_hex: hex::encode(SecretKey::random(&mut rand::rngs::OsRng).to_bytes()),
    };
    Ok((
        EnvelopeProtocol::new(&random_config())?,
        EnvelopeProtocol::new(&random_config())?,
    ))
}
