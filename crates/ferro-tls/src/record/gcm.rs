//! AES-GCM record protection with explicit nonce (RFC 5288).
//!
//! Nonce = salt(4) || explicit_nonce(8); the explicit nonce is the write
//! sequence number and travels as the first 8 bytes of the fragment.
//! Record fragment = explicit_nonce(8) || ciphertext || tag(16).

use ferro_crypto::aead::GCM_TAG_LEN;
use ferro_crypto::provider::TlsAead;
use ferro_types::TlsError;
use zeroize::Zeroize;

use super::{build_record_aad, ContentType, Record, MAX_CIPHERTEXT_LENGTH, TLS12_VERSION};

/// Explicit nonce length on the wire.
pub const EXPLICIT_NONCE_LEN: usize = 8;

/// GCM salt length from the key block.
pub const GCM_SALT_LEN: usize = 4;

fn build_nonce(salt: &[u8], explicit: &[u8; EXPLICIT_NONCE_LEN]) -> [u8; 12] {
    let mut nonce = [0u8; 12];
    nonce[..GCM_SALT_LEN].copy_from_slice(salt);
    nonce[GCM_SALT_LEN..].copy_from_slice(explicit);
    nonce
}

/// GCM record encryptor.
pub struct GcmEncryptor {
    aead: Box<dyn TlsAead>,
    salt: Vec<u8>,
    seq: u64,
}

impl Drop for GcmEncryptor {
    fn drop(&mut self) {
        self.salt.zeroize();
    }
}

impl GcmEncryptor {
    pub fn new(key: &[u8], salt: Vec<u8>) -> Result<Self, TlsError> {
        if salt.len() != GCM_SALT_LEN {
            return Err(TlsError::IllegalParameter("GCM salt must be 4 bytes".into()));
        }
        Ok(Self {
            aead: ferro_crypto::aead::create_aes_gcm(key)?,
            salt,
            seq: 0,
        })
    }

    pub fn sequence_number(&self) -> u64 {
        self.seq
    }

    pub fn encrypt_record(
        &mut self,
        content_type: ContentType,
        plaintext: &[u8],
    ) -> Result<Record, TlsError> {
        let explicit = self.seq.to_be_bytes();
        let nonce = build_nonce(&self.salt, &explicit);
        let aad = build_record_aad(self.seq, content_type, plaintext.len() as u16);

        let ciphertext = self.aead.encrypt(&nonce, &aad, plaintext)?;

        let mut fragment = Vec::with_capacity(EXPLICIT_NONCE_LEN + ciphertext.len());
        fragment.extend_from_slice(&explicit);
        fragment.extend_from_slice(&ciphertext);

        self.seq = self
            .seq
            .checked_add(1)
            .ok_or_else(|| TlsError::DecryptError("write sequence number overflow".into()))?;

        Ok(Record {
            content_type,
            version: TLS12_VERSION,
            fragment,
        })
    }
}

/// GCM record decryptor.
pub struct GcmDecryptor {
    aead: Box<dyn TlsAead>,
    salt: Vec<u8>,
    seq: u64,
}

impl Drop for GcmDecryptor {
    fn drop(&mut self) {
        self.salt.zeroize();
    }
}

impl GcmDecryptor {
    pub fn new(key: &[u8], salt: Vec<u8>) -> Result<Self, TlsError> {
        if salt.len() != GCM_SALT_LEN {
            return Err(TlsError::IllegalParameter("GCM salt must be 4 bytes".into()));
        }
        Ok(Self {
            aead: ferro_crypto::aead::create_aes_gcm(key)?,
            salt,
            seq: 0,
        })
    }

    pub fn sequence_number(&self) -> u64 {
        self.seq
    }

    pub fn decrypt_record(&mut self, record: &Record) -> Result<Vec<u8>, TlsError> {
        if record.fragment.len() > MAX_CIPHERTEXT_LENGTH {
            return Err(TlsError::RecordOverflow);
        }
        if record.fragment.len() < EXPLICIT_NONCE_LEN + GCM_TAG_LEN {
            return Err(TlsError::DecodeError("GCM record too short".into()));
        }

        let explicit: [u8; EXPLICIT_NONCE_LEN] = record.fragment[..EXPLICIT_NONCE_LEN]
            .try_into()
            .expect("length checked");
        let ciphertext = &record.fragment[EXPLICIT_NONCE_LEN..];
        let plaintext_len = ciphertext.len() - GCM_TAG_LEN;

        let nonce = build_nonce(&self.salt, &explicit);
        let aad = build_record_aad(self.seq, record.content_type, plaintext_len as u16);

        let plaintext = self
            .aead
            .decrypt(&nonce, &aad, ciphertext)
            .map_err(|_| TlsError::BadRecordMac)?;

        self.seq = self
            .seq
            .checked_add(1)
            .ok_or_else(|| TlsError::DecryptError("read sequence number overflow".into()))?;

        Ok(plaintext)
    }
}
