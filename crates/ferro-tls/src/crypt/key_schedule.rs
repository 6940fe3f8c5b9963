//! TLS 1.2 key derivation (RFC 5246 §6.3, §8.1).

use ferro_crypto::hash::HashAlgId;
use ferro_types::TlsError;
use zeroize::Zeroize;

use super::prf::prf;
use super::CipherSuiteParams;

/// Finished verify_data length (RFC 5246 §7.4.9).
pub const VERIFY_DATA_LEN: usize = 12;

/// Master secret length.
pub const MASTER_SECRET_LEN: usize = 48;

/// Partitioned key block: MAC keys (CBC only), write keys, and fixed IVs
/// (GCM only).
pub struct KeyBlock {
    pub client_write_mac_key: Vec<u8>,
    pub server_write_mac_key: Vec<u8>,
    pub client_write_key: Vec<u8>,
    pub server_write_key: Vec<u8>,
    pub client_write_iv: Vec<u8>,
    pub server_write_iv: Vec<u8>,
}

impl Drop for KeyBlock {
    fn drop(&mut self) {
        self.client_write_mac_key.zeroize();
        self.server_write_mac_key.zeroize();
        self.client_write_key.zeroize();
        self.server_write_key.zeroize();
        self.client_write_iv.zeroize();
        self.server_write_iv.zeroize();
    }
}

/// Derive the 48-byte master secret:
///
/// ```text
/// master_secret = PRF(pre_master_secret, "master secret",
///                     client_random + server_random)[0..47]
/// ```
pub fn derive_master_secret(
    hash: HashAlgId,
    pre_master_secret: &[u8],
    client_random: &[u8; 32],
    server_random: &[u8; 32],
) -> Result<Vec<u8>, TlsError> {
    let mut seed = Vec::with_capacity(64);
    seed.extend_from_slice(client_random);
    seed.extend_from_slice(server_random);
    prf(
        hash,
        pre_master_secret,
        "master secret",
        &seed,
        MASTER_SECRET_LEN,
    )
}

/// Derive and partition the key block:
///
/// ```text
/// key_block = PRF(master_secret, "key expansion",
///                 server_random + client_random)
/// ```
///
/// Note the random order is reversed relative to the master secret seed.
pub fn derive_key_block(
    master_secret: &[u8],
    client_random: &[u8; 32],
    server_random: &[u8; 32],
    params: &CipherSuiteParams,
) -> Result<KeyBlock, TlsError> {
    let mut seed = Vec::with_capacity(64);
    seed.extend_from_slice(server_random);
    seed.extend_from_slice(client_random);

    let mut key_block = prf(
        params.prf_hash,
        master_secret,
        "key expansion",
        &seed,
        params.key_block_len(),
    )?;

    let mut offset = 0;
    let mut take = |len: usize| {
        let part = key_block[offset..offset + len].to_vec();
        offset += len;
        part
    };

    let client_write_mac_key = take(params.mac_len);
    let server_write_mac_key = take(params.mac_len);
    let client_write_key = take(params.key_len);
    let server_write_key = take(params.key_len);
    let client_write_iv = take(params.fixed_iv_len);
    let server_write_iv = take(params.fixed_iv_len);
    key_block.zeroize();

    Ok(KeyBlock {
        client_write_mac_key,
        server_write_mac_key,
        client_write_key,
        server_write_key,
        client_write_iv,
        server_write_iv,
    })
}

/// Compute the 12-byte Finished verify_data.
///
/// `label` is `"client finished"` or `"server finished"`.
pub fn compute_verify_data(
    hash: HashAlgId,
    master_secret: &[u8],
    label: &str,
    transcript_hash: &[u8],
) -> Result<Vec<u8>, TlsError> {
    prf(hash, master_secret, label, transcript_hash, VERIFY_DATA_LEN)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CipherSuite;

    #[test]
    fn test_master_secret_shape_and_determinism() {
        let pms = [0x03u8, 0x03, 0xAA, 0xBB];
        let cr = [0x01u8; 32];
        let sr = [0x02u8; 32];
        let ms1 = derive_master_secret(HashAlgId::Sha256, &pms, &cr, &sr).unwrap();
        let ms2 = derive_master_secret(HashAlgId::Sha256, &pms, &cr, &sr).unwrap();
        assert_eq!(ms1, ms2);
        assert_eq!(ms1.len(), 48);

        let other = derive_master_secret(HashAlgId::Sha256, &pms, &sr, &cr).unwrap();
        assert_ne!(ms1, other);
    }

    #[test]
    fn test_key_block_partition_gcm() {
        let params =
            CipherSuiteParams::from_suite(CipherSuite::TLS_ECDHE_RSA_WITH_AES_128_GCM_SHA256)
                .unwrap();
        let kb = derive_key_block(&[0xAB; 48], &[0x01; 32], &[0x02; 32], &params).unwrap();
        assert!(kb.client_write_mac_key.is_empty());
        assert!(kb.server_write_mac_key.is_empty());
        assert_eq!(kb.client_write_key.len(), 16);
        assert_eq!(kb.server_write_key.len(), 16);
        assert_eq!(kb.client_write_iv.len(), 4);
        assert_eq!(kb.server_write_iv.len(), 4);
        assert_ne!(kb.client_write_key, kb.server_write_key);
    }

    #[test]
    fn test_key_block_partition_cbc() {
        let params =
            CipherSuiteParams::from_suite(CipherSuite::TLS_RSA_WITH_AES_256_CBC_SHA).unwrap();
        let kb = derive_key_block(&[0xCD; 48], &[0x03; 32], &[0x04; 32], &params).unwrap();
        assert_eq!(kb.client_write_mac_key.len(), 20);
        assert_eq!(kb.server_write_mac_key.len(), 20);
        assert_eq!(kb.client_write_key.len(), 32);
        assert_eq!(kb.server_write_key.len(), 32);
        assert!(kb.client_write_iv.is_empty());
        assert!(kb.server_write_iv.is_empty());
    }

    #[test]
    fn test_key_block_partition_order() {
        // The MAC keys come first in the expansion; check the concatenated
        // partition reproduces the raw PRF output.
        let params =
            CipherSuiteParams::from_suite(CipherSuite::TLS_RSA_WITH_AES_128_CBC_SHA).unwrap();
        let ms = [0x11u8; 48];
        let cr = [0x22u8; 32];
        let sr = [0x33u8; 32];
        let kb = derive_key_block(&ms, &cr, &sr, &params).unwrap();

        let mut seed = Vec::new();
        seed.extend_from_slice(&sr);
        seed.extend_from_slice(&cr);
        let raw = crate::crypt::prf::prf(
            HashAlgId::Sha256,
            &ms,
            "key expansion",
            &seed,
            params.key_block_len(),
        )
        .unwrap();

        let mut rebuilt = Vec::new();
        rebuilt.extend_from_slice(&kb.client_write_mac_key);
        rebuilt.extend_from_slice(&kb.server_write_mac_key);
        rebuilt.extend_from_slice(&kb.client_write_key);
        rebuilt.extend_from_slice(&kb.server_write_key);
        assert_eq!(rebuilt, raw);
    }

    #[test]
    fn test_verify_data() {
        let vd = compute_verify_data(HashAlgId::Sha256, &[0xAB; 48], "client finished", &[0xCD; 32])
            .unwrap();
        assert_eq!(vd.len(), 12);

        let vd_server =
            compute_verify_data(HashAlgId::Sha256, &[0xAB; 48], "server finished", &[0xCD; 32])
                .unwrap();
        assert_ne!(vd, vd_server);
    }
}
