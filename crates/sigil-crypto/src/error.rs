//! Protocol error types.

/// Errors from cryptographic operations.
///
/// Send-path callers see these directly so they can tell what went wrong.
/// The receive path collapses every failure into [`Rejected`] before it
/// crosses the protocol boundary; the concrete variant is only logged.
#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    /// The configured identity secret does not decode to a valid scalar.
    #[error("invalid identity secret: {0}")]
    InvalidSecret(String),

    /// Key material could not be wrapped in or read from its PEM container.
    #[error("key container encoding failed: {0}")]
    Encoding(String),

    /// The counterpart public key is malformed or not a point on the curve.
    #[error("key agreement failed: {0}")]
    KeyAgreement(String),

    /// Cipher-level encryption failure.
    #[error("encryption failed: {0}")]
    Encryption(String),

    /// The wire bundle does not have the `ciphertext.iv.tag` shape.
    #[error("malformed cipher bundle: {0}")]
    MalformedBundle(String),

    /// The authentication tag did not verify: tampered or wrong-key data.
    #[error("ciphertext failed authentication")]
    AuthenticationFailure,

    /// The signature does not verify over the decrypted plaintext.
    #[error("signature does not verify")]
    InvalidSignature,

    /// The message is not JSON-representable, or the decrypted text is not
    /// valid JSON/UTF-8.
    #[error("serialization failed: {0}")]
    Serialization(String),
}

/// Uniform rejection returned by the receive path.
///
/// A tampered ciphertext and an invalid signature are deliberately
/// indistinguishable to the caller, so a counterpart cannot use the
/// protocol as a decryption oracle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("envelope rejected")]
pub struct Rejected;
