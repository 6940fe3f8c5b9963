//! CertificateVerify signing for client authentication.
//!
//! TLS 1.2 client auth here signs the SHA-1 transcript with the client's
//! private key; the supported signers are RSA PKCS#1 v1.5 with SHA-1 and
//! DSA with SHA-1.

use ferro_crypto::hash::HashAlgId;
use ferro_types::TlsError;

use crate::config::ClientPrivateKey;

/// Wire identifiers for the CertificateVerify header.
pub const HASH_SHA1: u8 = 2;
pub const SIG_RSA: u8 = 1;
pub const SIG_DSA: u8 = 2;

/// Sign the SHA-1 transcript digest with the client key.
///
/// Returns `(hash_alg, sig_alg, signature)` for the CertificateVerify
/// message header.
pub fn sign_certificate_verify(
    key: &ClientPrivateKey,
    sha1_transcript: &[u8],
) -> Result<(u8, u8, Vec<u8>), TlsError> {
    match key {
        ClientPrivateKey::Rsa { n, d } => {
            let sk = ferro_crypto::rsa::RsaPrivateKey::new(n, d)?;
            let signature = sk.sign_pkcs1(HashAlgId::Sha1, sha1_transcript)?;
            Ok((HASH_SHA1, SIG_RSA, signature))
        }
        ClientPrivateKey::Dsa { p, q, g, x } => {
            let params = ferro_crypto::dsa::DsaParams::new(p, q, g)?;
            let sk = ferro_crypto::dsa::DsaPrivateKey::new(params, x)?;
            let signature = sk.sign(sha1_transcript)?;
            Ok((HASH_SHA1, SIG_DSA, signature))
        }
    }
}

/// Whether the server's CertificateRequest admits this key: rsa_sign(1) /
/// dss_sign(2) certificate types and the SHA-1 pair for the key's
/// algorithm. An empty requirement list admits everything.
pub fn key_satisfies_request(
    key: &ClientPrivateKey,
    cert_types: &[u8],
    sig_algs: &[(u8, u8)],
) -> bool {
    let (cert_type, sig_alg) = match key {
        ClientPrivateKey::Rsa { .. } => (1u8, SIG_RSA),
        ClientPrivateKey::Dsa { .. } => (2u8, SIG_DSA),
    };
    let type_ok = cert_types.is_empty() || cert_types.contains(&cert_type);
    let alg_ok = sig_algs.is_empty() || sig_algs.contains(&(HASH_SHA1, sig_alg));
    type_ok && alg_ok
}
