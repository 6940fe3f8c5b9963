//! AES-GCM AEAD adapter over the `aes-gcm` crate.

use aes_gcm::aead::{Aead, Payload};
use aes_gcm::{Aes128Gcm, Aes256Gcm, KeyInit, Nonce};
use ferro_types::CryptoError;

use crate::provider::TlsAead;

/// GCM tag length in bytes.
pub const GCM_TAG_LEN: usize = 16;

/// GCM nonce length in bytes.
pub const GCM_NONCE_LEN: usize = 12;

struct AesGcm128(Aes128Gcm);
struct AesGcm256(Aes256Gcm);

macro_rules! impl_tls_aead {
    ($name:ident) => {
        impl TlsAead for $name {
            fn tag_size(&self) -> usize {
                GCM_TAG_LEN
            }

            fn encrypt(
                &self,
                nonce: &[u8],
                aad: &[u8],
                plaintext: &[u8],
            ) -> Result<Vec<u8>, CryptoError> {
                if nonce.len() != GCM_NONCE_LEN {
                    return Err(CryptoError::InvalidIvLength);
                }
                self.0
                    .encrypt(
                        Nonce::from_slice(nonce),
                        Payload {
                            msg: plaintext,
                            aad,
                        },
                    )
                    .map_err(|_| CryptoError::InvalidArg)
            }

            fn decrypt(
                &self,
                nonce: &[u8],
                aad: &[u8],
                ciphertext: &[u8],
            ) -> Result<Vec<u8>, CryptoError> {
                if nonce.len() != GCM_NONCE_LEN {
                    return Err(CryptoError::InvalidIvLength);
                }
                self.0
                    .decrypt(
                        Nonce::from_slice(nonce),
                        Payload {
                            msg: ciphertext,
                            aad,
                        },
                    )
                    .map_err(|_| CryptoError::AeadTagVerifyFail)
            }
        }
    };
}

impl_tls_aead!(AesGcm128);
impl_tls_aead!(AesGcm256);

/// Create an AES-GCM AEAD; the key length (16 or 32 bytes) selects
/// AES-128-GCM or AES-256-GCM.
pub fn create_aes_gcm(key: &[u8]) -> Result<Box<dyn TlsAead>, CryptoError> {
    match key.len() {
        16 => Ok(Box::new(AesGcm128(
            Aes128Gcm::new_from_slice(key).map_err(|_| CryptoError::InvalidKey)?,
        ))),
        32 => Ok(Box::new(AesGcm256(
            Aes256Gcm::new_from_slice(key).map_err(|_| CryptoError::InvalidKey)?,
        ))),
        got => Err(CryptoError::InvalidKeyLength { expected: 16, got }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gcm128_roundtrip() {
        let aead = create_aes_gcm(&[0x42u8; 16]).unwrap();
        let nonce = [0u8; 12];
        let aad = b"associated";
        let ct = aead.encrypt(&nonce, aad, b"secret payload").unwrap();
        assert_eq!(ct.len(), 14 + GCM_TAG_LEN);
        let pt = aead.decrypt(&nonce, aad, &ct).unwrap();
        assert_eq!(pt, b"secret payload");
    }

    #[test]
    fn test_gcm256_roundtrip_empty_plaintext() {
        let aead = create_aes_gcm(&[0x42u8; 32]).unwrap();
        let nonce = [7u8; 12];
        let ct = aead.encrypt(&nonce, b"aad", b"").unwrap();
        assert_eq!(ct.len(), GCM_TAG_LEN);
        let pt = aead.decrypt(&nonce, b"aad", &ct).unwrap();
        assert!(pt.is_empty());
    }

    #[test]
    fn test_gcm_tampered_ciphertext_fails() {
        let aead = create_aes_gcm(&[1u8; 16]).unwrap();
        let nonce = [0u8; 12];
        let mut ct = aead.encrypt(&nonce, b"", b"data").unwrap();
        ct[0] ^= 1;
        assert!(matches!(
            aead.decrypt(&nonce, b"", &ct),
            Err(CryptoError::AeadTagVerifyFail)
        ));
    }

    #[test]
    fn test_gcm_wrong_aad_fails() {
        let aead = create_aes_gcm(&[1u8; 16]).unwrap();
        let nonce = [0u8; 12];
        let ct = aead.encrypt(&nonce, b"aad-a", b"data").unwrap();
        assert!(aead.decrypt(&nonce, b"aad-b", &ct).is_err());
    }

    #[test]
    fn test_invalid_key_length() {
        assert!(create_aes_gcm(&[0u8; 24]).is_err());
    }
}
