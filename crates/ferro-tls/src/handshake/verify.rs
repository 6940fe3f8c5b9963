//! ServerKeyExchange signature verification (RFC 5246 §7.4.3).
//!
//! The signature covers `client_random || server_random || params`. The
//! explicit hash byte selects the digest; the signature byte dispatches to
//! RSA PKCS#1 v1.5, DSA, or ECDSA against the leaf certificate's key.

use ferro_crypto::hash::HashAlgId;
use ferro_pki::PublicKeyInfo;
use ferro_types::TlsError;

use crate::crypt::AuthAlg;

/// Map a wire HashAlgorithm byte (RFC 5246 §7.4.1.4.1).
pub fn hash_alg_from_wire(value: u8) -> Result<HashAlgId, TlsError> {
    match value {
        2 => Ok(HashAlgId::Sha1),
        4 => Ok(HashAlgId::Sha256),
        5 => Ok(HashAlgId::Sha384),
        6 => Ok(HashAlgId::Sha512),
        _ => Err(TlsError::IllegalParameter(format!(
            "unsupported hash algorithm {value}"
        ))),
    }
}

/// The data covered by the ServerKeyExchange signature.
pub fn build_signed_data(
    client_random: &[u8; 32],
    server_random: &[u8; 32],
    params: &[u8],
) -> Vec<u8> {
    let mut data = Vec::with_capacity(64 + params.len());
    data.extend_from_slice(client_random);
    data.extend_from_slice(server_random);
    data.extend_from_slice(params);
    data
}

/// Verify a ServerKeyExchange signature against the leaf key.
///
/// `expected_auth` is the suite's authentication algorithm; a signature
/// algorithm byte that contradicts it, or a key of the wrong type, is an
/// illegal_parameter condition. A structurally valid signature that fails
/// to verify is a decrypt_error condition.
pub fn verify_ske_signature(
    leaf_key: &PublicKeyInfo,
    expected_auth: AuthAlg,
    hash_alg: u8,
    sig_alg: u8,
    signed_data: &[u8],
    signature: &[u8],
) -> Result<(), TlsError> {
    let hash = hash_alg_from_wire(hash_alg)?;
    let digest = hash.digest(signed_data);

    let ok = match (sig_alg, leaf_key) {
        // rsa(1)
        (1, PublicKeyInfo::Rsa { n, e }) => {
            if expected_auth != AuthAlg::Rsa {
                return Err(TlsError::IllegalParameter(
                    "RSA signature for non-RSA suite".into(),
                ));
            }
            let key = ferro_crypto::rsa::RsaPublicKey::new(n, e)?;
            key.verify_pkcs1(hash, &digest, signature)?
        }
        // dsa(2)
        (2, PublicKeyInfo::Dsa { p, q, g, y }) => {
            if expected_auth != AuthAlg::Dsa {
                return Err(TlsError::IllegalParameter(
                    "DSA signature for non-DSS suite".into(),
                ));
            }
            let params = ferro_crypto::dsa::DsaParams::new(p, q, g)?;
            let key = ferro_crypto::dsa::DsaPublicKey::new(params, y)?;
            key.verify(&digest, signature)?
        }
        // ecdsa(3)
        (3, PublicKeyInfo::Ec { curve, point }) => {
            if expected_auth != AuthAlg::Ecdsa {
                return Err(TlsError::IllegalParameter(
                    "ECDSA signature for non-ECDSA suite".into(),
                ));
            }
            ferro_crypto::ecdsa::ecdsa_verify(*curve, point, &digest, signature)?
        }
        _ => {
            return Err(TlsError::IllegalParameter(format!(
                "signature algorithm {sig_alg} does not match certificate key"
            )))
        }
    };

    if ok {
        Ok(())
    } else {
        Err(TlsError::DecryptError(
            "ServerKeyExchange signature verification failed".into(),
        ))
    }
}
