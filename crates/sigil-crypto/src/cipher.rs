//! Authenticated message encryption.
//!
//! AES-256-GCM with a random 96-bit IV and a detached 128-bit tag. A
//! sealed message travels as three base64 segments joined by `.`, in the
//! fixed order `ciphertext.iv.tag`.

use aes_gcm::{AeadInPlace, Aes256Gcm, Key, KeyInit, Nonce, Tag};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use rand::RngCore;
use rand::rngs::OsRng;

use crate::error::CryptoError;

/// AES-256 key length in bytes.
pub const KEY_SIZE: usize = 32;

/// GCM initialisation vector length in bytes.
pub const IV_SIZE: usize = 12;

/// GCM authentication tag length in bytes.
pub const TAG_SIZE: usize = 16;

/// Number of `.`-separated segments in a serialized bundle.
const BUNDLE_SEGMENTS: usize = 3;

/// A decoded `ciphertext.iv.tag` wire bundle.
#[derive(Debug, Clone)]
pub struct CipherBundle {
    /// Ciphertext, same length as the plaintext (tag is detached).
    pub ciphertext: Vec<u8>,
    /// Initialisation vector, fresh random per encryption.
    pub iv: [u8; IV_SIZE],
    /// GCM authentication tag.
    pub tag: [u8; TAG_SIZE],
}

impl CipherBundle {
    /// Serialize as three base64 segments joined by `.`.
    pub fn encode(&self) -> String {
        [
            STANDARD.encode(&self.ciphertext),
            STANDARD.encode(self.iv),
            STANDARD.encode(self.tag),
        ]
        .join(".")
    }

    /// Parse a serialized bundle, validating segment count and lengths.
    pub fn decode(bundle: &str) -> Result<Self, CryptoError> {
        let segments: Vec<&str> = bundle.split('.').collect();
        if segments.len() != BUNDLE_SEGMENTS {
            return Err(CryptoError::MalformedBundle(format!(
                "expected {BUNDLE_SEGMENTS} segments, got {}",
                segments.len()
            )));
        }
        let ciphertext = decode_segment(segments[0], "ciphertext")?;
        let iv = decode_segment(segments[1], "iv")?;
        let tag = decode_segment(segments[2], "tag")?;

        let iv_len = iv.len();
        let iv: [u8; IV_SIZE] = iv.try_into().map_err(|_| {
            CryptoError::MalformedBundle(format!("iv must be {IV_SIZE} bytes, got {iv_len}"))
        })?;
        let tag_len = tag.len();
        let tag: [u8; TAG_SIZE] = tag.try_into().map_err(|_| {
            CryptoError::MalformedBundle(format!("tag must be {TAG_SIZE} bytes, got {tag_len}"))
        })?;

        Ok(Self { ciphertext, iv, tag })
    }
}

fn decode_segment(segment: &str, name: &str) -> Result<Vec<u8>, CryptoError> {
    STANDARD
        .decode(segment)
        .map_err(|e| CryptoError::MalformedBundle(format!("{name} is not valid base64: {e}")))
}

fn cipher_for(key: &[u8; KEY_SIZE]) -> Aes256Gcm {
    Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key))
}

/// Encrypt `plaintext` under `key`, returning the serialized bundle.
///
/// Draws a fresh random IV from the OS on every call; reusing an IV under
/// the same key would void the authentication guarantee.
pub fn encrypt(plaintext: &str, key: &[u8; KEY_SIZE]) -> Result<String, CryptoError> {
    let mut iv = [0u8; IV_SIZE];
    OsRng.fill_bytes(&mut iv);

    let mut buffer = plaintext.as_bytes().to_vec();
    let tag = cipher_for(key)
        .encrypt_in_place_detached(Nonce::from_slice(&iv), b"", &mut buffer)
        .map_err(|e| CryptoError::Encryption(e.to_string()))?;

    let mut tag_bytes = [0u8; TAG_SIZE];
    tag_bytes.copy_from_slice(tag.as_slice());
    Ok(CipherBundle {
        ciphertext: buffer,
        iv,
        tag: tag_bytes,
    }
    .encode())
}

/// Decrypt a serialized bundle under `key`.
///
/// The authentication tag is checked before any plaintext is released;
/// tampered or wrong-key input never yields garbled output.
pub fn decrypt(bundle: &str, key: &[u8; KEY_SIZE]) -> Result<String, CryptoError> {
    let CipherBundle {
        mut ciphertext,
        iv,
        tag,
    } = CipherBundle::decode(bundle)?;

    cipher_for(key)
        .decrypt_in_place_detached(
            Nonce::from_slice(&iv),
            b"",
            &mut ciphertext,
            Tag::from_slice(&tag),
        )
        .map_err(|_| CryptoError::AuthenticationFailure)?;

    String::from_utf8(ciphertext)
        .map_err(|_| CryptoError::Serialization("decrypted plaintext is not valid UTF-8".to_string()))
}

#[cfg(test)]
#[allow(clippy::panic, clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    fn test_key() -> [u8; KEY_SIZE] {
        let mut key = [0u8; KEY_SIZE];
        OsRng.fill_bytes(&mut key);
        key
    }

    #[test]
    fn encrypt_decrypt_roundtrip() {
        let key = test_key();
        let bundle = encrypt(r#"{"hello":"world"}"#, &key).unwrap();
        assert_eq!(decrypt(&bundle, &key).unwrap(), r#"{"hello":"world"}"#);
    }

    #[test]
    fn bundle_has_three_segments_with_fixed_lengths() {
        let key = test_key();
        let bundle = encrypt("payload", &key).unwrap();

        let segments: Vec<&str> = bundle.split('.').collect();
        assert_eq!(segments.len(), 3);
        assert_eq!(STANDARD.decode(segments[0]).unwrap().len(), "payload".len());
        assert_eq!(STANDARD.decode(segments[1]).unwrap().len(), IV_SIZE);
        assert_eq!(STANDARD.decode(segments[2]).unwrap().len(), TAG_SIZE);
    }

    #[test]
    fn iv_is_fresh_per_encryption() {
        let key = test_key();
        let first = encrypt("same message", &key).unwrap();
        let second = encrypt("same message", &key).unwrap();
        assert_ne!(first, second);

        let iv = |bundle: &str| bundle.split('.').nth(1).map(str::to_string).unwrap();
        assert_ne!(iv(&first), iv(&second));

        let ct = |bundle: &str| bundle.split('.').next().map(str::to_string).unwrap();
        assert_ne!(ct(&first), ct(&second));
    }

    #[test]
    fn tampered_ciphertext_fails_authentication() {
        let key = test_key();
        let bundle = encrypt("secret data", &key).unwrap();

        let mut parsed = CipherBundle::decode(&bundle).unwrap();
        parsed.ciphertext[0] ^= 0x01;
        let err = decrypt(&parsed.encode(), &key).unwrap_err();
        assert!(matches!(err, CryptoError::AuthenticationFailure), "got {err:?}");
    }

    #[test]
    fn tampered_tag_fails_authentication() {
        let key = test_key();
        let bundle = encrypt("secret data", &key).unwrap();

        let mut parsed = CipherBundle::decode(&bundle).unwrap();
        parsed.tag[0] ^= 0x80;
        let err = decrypt(&parsed.encode(), &key).unwrap_err();
        assert!(matches!(err, CryptoError::AuthenticationFailure), "got {err:?}");
    }

    #[test]
    fn wrong_key_fails_authentication() {
        let bundle = encrypt("secret data", &test_key()).unwrap();
        let err = decrypt(&bundle, &test_key()).unwrap_err();
        assert!(matches!(err, CryptoError::AuthenticationFailure), "got {err:?}");
    }

    #[test]
    fn too_few_segments_is_malformed() {
        let err = decrypt("onesegment", &test_key()).unwrap_err();
        assert!(matches!(err, CryptoError::MalformedBundle(_)), "got {err:?}");

        let err = decrypt("two.segments", &test_key()).unwrap_err();
        assert!(matches!(err, CryptoError::MalformedBundle(_)), "got {err:?}");
    }

    #[test]
    fn too_many_segments_is_malformed() {
        let key = test_key();
        let bundle = format!("{}.extra", encrypt("data", &key).unwrap());
        let err = decrypt(&bundle, &key).unwrap_err();
        assert!(matches!(err, CryptoError::MalformedBundle(_)), "got {err:?}");
    }

    #[test]
    fn invalid_base64_segment_is_malformed() {
        let key = test_key();
        let bundle = encrypt("data", &key).unwrap();
        let mut segments: Vec<String> = bundle.split('.').map(str::to_string).collect();
        segments[1] = "!!!".to_string();
        let err = decrypt(&segments.join("."), &key).unwrap_err();
        assert!(matches!(err, CryptoError::MalformedBundle(_)), "got {err:?}");
    }

    #[test]
    fn wrong_iv_or_tag_length_is_malformed() {
        let key = test_key();
        let bundle = encrypt("data", &key).unwrap();
        let segments: Vec<&str> = bundle.split('.').collect();

        let short_iv = [segments[0], &STANDARD.encode([0u8; 8]), segments[2]].join(".");
        let err = decrypt(&short_iv, &key).unwrap_err();
        assert!(matches!(err, CryptoError::MalformedBundle(_)), "got {err:?}");

        let short_tag = [segments[0], segments[1], &STANDARD.encode([0u8; 8])].join(".");
        let err = decrypt(&short_tag, &key).unwrap_err();
        assert!(matches!(err, CryptoError::MalformedBundle(_)), "got {err:?}");
    }

    #[test]
    fn empty_plaintext_roundtrips() {
        let key = test_key();
        let bundle = encrypt("", &key).unwrap();
        assert_eq!(decrypt(&bundle, &key).unwrap(), "");
    }

    #[test]
    fn unicode_plaintext_roundtrips() {
        let key = test_key();
        let plaintext = "grüße \u{1f512} здравствуйте";
        let bundle = encrypt(plaintext, &key).unwrap();
        assert_eq!(decrypt(&bundle, &key).unwrap(), plaintext);
    }
}
