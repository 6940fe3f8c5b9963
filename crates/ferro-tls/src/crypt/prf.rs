//! TLS 1.2 PRF (RFC 5246 §5).
//!
//! ```text
//! PRF(secret, label, seed) = P_<hash>(secret, label + seed)
//!
//! P_hash(secret, seed) = HMAC_hash(secret, A(1) + seed) ||
//!                        HMAC_hash(secret, A(2) + seed) || ...
//! A(0) = seed
//! A(i) = HMAC_hash(secret, A(i-1))
//! ```

use ferro_crypto::hash::HashAlgId;
use ferro_crypto::hmac::Hmac;
use ferro_types::TlsError;
use zeroize::Zeroize;

/// Derive `output_len` bytes from `secret`, `label`, and `seed` using the
/// negotiated PRF hash (SHA-256 or SHA-384).
pub fn prf(
    hash: HashAlgId,
    secret: &[u8],
    label: &str,
    seed: &[u8],
    output_len: usize,
) -> Result<Vec<u8>, TlsError> {
    let mut label_seed = Vec::with_capacity(label.len() + seed.len());
    label_seed.extend_from_slice(label.as_bytes());
    label_seed.extend_from_slice(seed);
    let out = p_hash(hash, secret, &label_seed, output_len);
    label_seed.zeroize();
    out
}

/// P_hash expansion function.
fn p_hash(
    hash: HashAlgId,
    secret: &[u8],
    seed: &[u8],
    output_len: usize,
) -> Result<Vec<u8>, TlsError> {
    let mut result = Vec::with_capacity(output_len);

    // A(0) = seed
    let mut a = seed.to_vec();

    while result.len() < output_len {
        // A(i) = HMAC_hash(secret, A(i-1))
        a = Hmac::mac(hash, secret, &a)?;

        let mut ctx = Hmac::new(hash, secret)?;
        ctx.update(&a);
        ctx.update(seed);
        let mut block = vec![0u8; ctx.output_size()];
        ctx.finish(&mut block)?;

        result.extend_from_slice(&block);
        block.zeroize();
    }

    a.zeroize();
    result.truncate(output_len);
    Ok(result)
}
