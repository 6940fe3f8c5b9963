//! CBC MAC-then-pad-then-encrypt record protection (RFC 5246 §6.2.3.2).
//!
//! Record fragment = explicit_IV(16) || AES-CBC(plaintext || MAC || padding).
//! MAC input is `seq(8) || type(1) || version(2) || length(2) || plaintext`.
//! Padding is `pad_len + 1` bytes, each equal to `pad_len`.
//!
//! Decryption evaluates the padding-length sanity check, every padding
//! byte, and the MAC comparison before deciding the verdict, so a padding
//! failure and a MAC failure are indistinguishable by timing.

use ferro_crypto::aes::{AesKey, AES_BLOCK_SIZE};
use ferro_crypto::hash::HashAlgId;
use ferro_crypto::hmac::Hmac;
use ferro_crypto::rand::random_bytes;
use ferro_types::TlsError;
use subtle::ConstantTimeEq;
use zeroize::Zeroize;

use super::{build_record_aad, ContentType, Record, MAX_CIPHERTEXT_LENGTH, TLS12_VERSION};

/// Select the HMAC algorithm from the suite's MAC length.
fn mac_alg(mac_len: usize) -> Result<HashAlgId, TlsError> {
    match mac_len {
        20 => Ok(HashAlgId::Sha1),
        32 => Ok(HashAlgId::Sha256),
        48 => Ok(HashAlgId::Sha384),
        _ => Err(TlsError::IllegalParameter(format!(
            "unsupported MAC length {mac_len}"
        ))),
    }
}

/// HMAC over the record pseudo-header and plaintext.
fn compute_record_mac(
    mac_len: usize,
    mac_key: &[u8],
    seq: u64,
    content_type: ContentType,
    plaintext: &[u8],
) -> Result<Vec<u8>, TlsError> {
    let mut hmac = Hmac::new(mac_alg(mac_len)?, mac_key)?;
    hmac.update(&build_record_aad(seq, content_type, plaintext.len() as u16));
    hmac.update(plaintext);
    let mut mac = vec![0u8; mac_len];
    hmac.finish(&mut mac)?;
    Ok(mac)
}

/// Padding for `data_len` bytes: `pad_len + 1` bytes, all equal to
/// `pad_len`, bringing the total to a block multiple.
fn build_padding(data_len: usize) -> Vec<u8> {
    let pad_len = (AES_BLOCK_SIZE - ((data_len + 1) % AES_BLOCK_SIZE)) % AES_BLOCK_SIZE;
    vec![pad_len as u8; pad_len + 1]
}

/// CBC record encryptor.
pub struct CbcEncryptor {
    enc_key: Vec<u8>,
    mac_key: Vec<u8>,
    mac_len: usize,
    seq: u64,
}

impl Drop for CbcEncryptor {
    fn drop(&mut self) {
        self.enc_key.zeroize();
        self.mac_key.zeroize();
    }
}

impl CbcEncryptor {
    pub fn new(enc_key: Vec<u8>, mac_key: Vec<u8>, mac_len: usize) -> Self {
        Self {
            enc_key,
            mac_key,
            mac_len,
            seq: 0,
        }
    }

    pub fn sequence_number(&self) -> u64 {
        self.seq
    }

    pub fn encrypt_record(
        &mut self,
        content_type: ContentType,
        plaintext: &[u8],
    ) -> Result<Record, TlsError> {
        let mac = compute_record_mac(
            self.mac_len,
            &self.mac_key,
            self.seq,
            content_type,
            plaintext,
        )?;

        let padding = build_padding(plaintext.len() + self.mac_len);
        let mut block_data = Vec::with_capacity(plaintext.len() + self.mac_len + padding.len());
        block_data.extend_from_slice(plaintext);
        block_data.extend_from_slice(&mac);
        block_data.extend_from_slice(&padding);

        let mut iv = [0u8; AES_BLOCK_SIZE];
        random_bytes(&mut iv)?;

        let cipher = AesKey::new(&self.enc_key)?;
        cipher.cbc_encrypt(&iv, &mut block_data)?;

        let mut fragment = Vec::with_capacity(AES_BLOCK_SIZE + block_data.len());
        fragment.extend_from_slice(&iv);
        fragment.extend_from_slice(&block_data);

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

/// CBC record decryptor with a constant-time verdict.
pub struct CbcDecryptor {
    enc_key: Vec<u8>,
    mac_key: Vec<u8>,
    mac_len: usize,
    seq: u64,
}

impl Drop for CbcDecryptor {
    fn drop(&mut self) {
        self.enc_key.zeroize();
        self.mac_key.zeroize();
    }
}

impl CbcDecryptor {
    pub fn new(enc_key: Vec<u8>, mac_key: Vec<u8>, mac_len: usize) -> Self {
        Self {
            enc_key,
            mac_key,
            mac_len,
            seq: 0,
        }
    }

    pub fn sequence_number(&self) -> u64 {
        self.seq
    }

    pub fn decrypt_record(&mut self, record: &Record) -> Result<Vec<u8>, TlsError> {
        let fragment = &record.fragment;

        if fragment.len() > MAX_CIPHERTEXT_LENGTH {
            return Err(TlsError::RecordOverflow);
        }
        // Structural minimum: IV, at least one MAC byte and the padding
        // length byte. Structure failures are not oracle-relevant.
        if fragment.len() < AES_BLOCK_SIZE + self.mac_len + 1 {
            return Err(TlsError::DecodeError("CBC record too short".into()));
        }
        let iv = &fragment[..AES_BLOCK_SIZE];
        let mut decrypted = fragment[AES_BLOCK_SIZE..].to_vec();
        if decrypted.len() % AES_BLOCK_SIZE != 0 {
            return Err(TlsError::DecodeError(
                "CBC ciphertext not block-aligned".into(),
            ));
        }

        let cipher = AesKey::new(&self.enc_key)?;
        cipher.cbc_decrypt(iv, &mut decrypted)?;

        // Deferred padding validation: on an implausible padding length,
        // proceed with pad_len = 0 and remember the failure.
        let claimed_pad = decrypted[decrypted.len() - 1] as usize;
        let padding_fail = claimed_pad + 1 + self.mac_len > decrypted.len();
        let pad_len = if padding_fail { 0 } else { claimed_pad };

        // Every stated padding byte must equal pad_len
        let pad_start = decrypted.len() - 1 - pad_len;
        let mut pad_ok = 1u8;
        for &b in &decrypted[pad_start..] {
            pad_ok &= b.ct_eq(&(pad_len as u8)).unwrap_u8();
        }

        let content_len = decrypted.len() - 1 - pad_len - self.mac_len;
        let expected_mac = compute_record_mac(
            self.mac_len,
            &self.mac_key,
            self.seq,
            record.content_type,
            &decrypted[..content_len],
        )?;
        let mac_ok = decrypted[content_len..content_len + self.mac_len]
            .ct_eq(expected_mac.as_slice())
            .unwrap_u8();

        // Single combined verdict after every check has run
        if pad_ok & mac_ok != 1 || padding_fail {
            decrypted.zeroize();
            return Err(TlsError::BadRecordMac);
        }

        self.seq = self
            .seq
            .checked_add(1)
            .ok_or_else(|| TlsError::DecryptError("read sequence number overflow".into()))?;

        decrypted.truncate(content_len);
        Ok(decrypted)
    }
}
