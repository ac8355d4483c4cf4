//! Sigil envelope protocol library.
//!
//! Hybrid encrypt-and-sign protection for JSON payloads exchanged between
//! two parties identified by secp256k1 key pairs.
//!
//! ## Crypto primitives
//!
//! - **Identity**: secp256k1 key pair derived deterministically from a
//!   configured secret scalar; never generated fresh
//! - **Key agreement**: ECDH per exchange, x-coordinate used directly as
//!   the 32-byte message key
//! - **Encryption**: AES-256-GCM, 12-byte random IV, detached 16-byte tag,
//!   `ciphertext.iv.tag` base64 wire encoding
//! - **Signatures**: ECDSA/SHA-256 over the canonical plaintext, DER,
//!   base64-encoded
//!
//! Messages travel as an [`Envelope`]: the signature is computed over the
//! exact string that is encrypted, and verified over the exact string that
//! decryption yields.

pub mod cipher;
pub mod error;
pub mod identity;
pub mod protocol;
pub mod signing;

pub use cipher::{CipherBundle, IV_SIZE, KEY_SIZE, TAG_SIZE};
pub use error::{CryptoError, Rejected};
pub use identity::{IdentityKeyPair, fingerprint_of};
#[cfg(any(test, feature = "test-utils"))]
pub use protocol::test_protocol_pair;
pub use protocol::{Envelope, EnvelopeProtocol, ProtocolConfig};
pub use signing::SigningKeyPair;
