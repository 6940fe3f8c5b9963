//! Cipher suite parameters and key derivation for the TLS 1.2 engine.

pub mod key_schedule;
pub mod prf;
pub mod transcript;

use ferro_crypto::hash::HashAlgId;
use ferro_types::TlsError;

use crate::CipherSuite;

/// Key exchange algorithm of a cipher suite.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyExchangeAlg {
    /// Static RSA: client encrypts the premaster secret to the certificate
    /// key.
    Rsa,
    /// Ephemeral finite-field Diffie-Hellman, signed ServerKeyExchange.
    Dhe,
    /// Ephemeral elliptic-curve Diffie-Hellman, signed ServerKeyExchange.
    Ecdhe,
    /// Static elliptic-curve Diffie-Hellman against the certificate point.
    Ecdh,
}

impl KeyExchangeAlg {
    /// ServerKeyExchange is present only for the ephemeral exchanges.
    pub fn expects_server_key_exchange(self) -> bool {
        matches!(self, KeyExchangeAlg::Dhe | KeyExchangeAlg::Ecdhe)
    }

    /// Forward secrecy gates false start.
    pub fn forward_secrecy(self) -> bool {
        matches!(self, KeyExchangeAlg::Dhe | KeyExchangeAlg::Ecdhe)
    }
}

/// Server authentication algorithm: what key the certificate must carry and
/// what signature the ServerKeyExchange must use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthAlg {
    Rsa,
    Ecdsa,
    Dsa,
}

/// Parameters of a TLS 1.2 cipher suite.
#[derive(Debug, Clone)]
pub struct CipherSuiteParams {
    pub suite: CipherSuite,
    pub kx_alg: KeyExchangeAlg,
    pub auth_alg: AuthAlg,
    /// PRF / Finished hash (SHA-256 or SHA-384 in this profile).
    pub prf_hash: HashAlgId,
    /// AES key length: 16 or 32.
    pub key_len: usize,
    /// Key-block IV length: 4 (GCM salt) or 0 (CBC, per-record random IV).
    pub fixed_iv_len: usize,
    /// MAC key and output length: 0 for AEAD, 20/32/48 for CBC.
    pub mac_len: usize,
    /// true = CBC MAC-then-encrypt, false = AES-GCM.
    pub is_cbc: bool,
}

impl CipherSuiteParams {
    /// Look up the parameters for a suite from the compiled-in table.
    pub fn from_suite(suite: CipherSuite) -> Result<Self, TlsError> {
        let (kx_alg, auth_alg, prf_hash, key_len, mac_len, is_cbc) = match suite {
            CipherSuite::TLS_RSA_WITH_AES_128_CBC_SHA => {
                (KeyExchangeAlg::Rsa, AuthAlg::Rsa, HashAlgId::Sha256, 16, 20, true)
            }
            CipherSuite::TLS_RSA_WITH_AES_256_CBC_SHA => {
                (KeyExchangeAlg::Rsa, AuthAlg::Rsa, HashAlgId::Sha256, 32, 20, true)
            }
            CipherSuite::TLS_RSA_WITH_AES_128_CBC_SHA256 => {
                (KeyExchangeAlg::Rsa, AuthAlg::Rsa, HashAlgId::Sha256, 16, 32, true)
            }
            CipherSuite::TLS_RSA_WITH_AES_256_CBC_SHA256 => {
                (KeyExchangeAlg::Rsa, AuthAlg::Rsa, HashAlgId::Sha256, 32, 32, true)
            }
            CipherSuite::TLS_RSA_WITH_AES_128_GCM_SHA256 => {
                (KeyExchangeAlg::Rsa, AuthAlg::Rsa, HashAlgId::Sha256, 16, 0, false)
            }
            CipherSuite::TLS_RSA_WITH_AES_256_GCM_SHA384 => {
                (KeyExchangeAlg::Rsa, AuthAlg::Rsa, HashAlgId::Sha384, 32, 0, false)
            }
            CipherSuite::TLS_DHE_DSS_WITH_AES_128_CBC_SHA => {
                (KeyExchangeAlg::Dhe, AuthAlg::Dsa, HashAlgId::Sha256, 16, 20, true)
            }
            CipherSuite::TLS_DHE_DSS_WITH_AES_256_CBC_SHA => {
                (KeyExchangeAlg::Dhe, AuthAlg::Dsa, HashAlgId::Sha256, 32, 20, true)
            }
            CipherSuite::TLS_DHE_RSA_WITH_AES_128_CBC_SHA => {
                (KeyExchangeAlg::Dhe, AuthAlg::Rsa, HashAlgId::Sha256, 16, 20, true)
            }
            CipherSuite::TLS_DHE_RSA_WITH_AES_256_CBC_SHA => {
                (KeyExchangeAlg::Dhe, AuthAlg::Rsa, HashAlgId::Sha256, 32, 20, true)
            }
            CipherSuite::TLS_DHE_RSA_WITH_AES_128_CBC_SHA256 => {
                (KeyExchangeAlg::Dhe, AuthAlg::Rsa, HashAlgId::Sha256, 16, 32, true)
            }
            CipherSuite::TLS_DHE_RSA_WITH_AES_256_CBC_SHA256 => {
                (KeyExchangeAlg::Dhe, AuthAlg::Rsa, HashAlgId::Sha256, 32, 32, true)
            }
            CipherSuite::TLS_DHE_RSA_WITH_AES_128_GCM_SHA256 => {
                (KeyExchangeAlg::Dhe, AuthAlg::Rsa, HashAlgId::Sha256, 16, 0, false)
            }
            CipherSuite::TLS_DHE_RSA_WITH_AES_256_GCM_SHA384 => {
                (KeyExchangeAlg::Dhe, AuthAlg::Rsa, HashAlgId::Sha384, 32, 0, false)
            }
            CipherSuite::TLS_ECDH_ECDSA_WITH_AES_128_CBC_SHA => {
                (KeyExchangeAlg::Ecdh, AuthAlg::Ecdsa, HashAlgId::Sha256, 16, 20, true)
            }
            CipherSuite::TLS_ECDH_ECDSA_WITH_AES_256_CBC_SHA => {
                (KeyExchangeAlg::Ecdh, AuthAlg::Ecdsa, HashAlgId::Sha256, 32, 20, true)
            }
            CipherSuite::TLS_ECDH_RSA_WITH_AES_128_CBC_SHA => {
                (KeyExchangeAlg::Ecdh, AuthAlg::Rsa, HashAlgId::Sha256, 16, 20, true)
            }
            CipherSuite::TLS_ECDH_RSA_WITH_AES_256_CBC_SHA => {
                (KeyExchangeAlg::Ecdh, AuthAlg::Rsa, HashAlgId::Sha256, 32, 20, true)
            }
            CipherSuite::TLS_ECDH_ECDSA_WITH_AES_128_GCM_SHA256 => {
                (KeyExchangeAlg::Ecdh, AuthAlg::Ecdsa, HashAlgId::Sha256, 16, 0, false)
            }
            CipherSuite::TLS_ECDH_ECDSA_WITH_AES_256_GCM_SHA384 => {
                (KeyExchangeAlg::Ecdh, AuthAlg::Ecdsa, HashAlgId::Sha384, 32, 0, false)
            }
            CipherSuite::TLS_ECDH_RSA_WITH_AES_128_GCM_SHA256 => {
                (KeyExchangeAlg::Ecdh, AuthAlg::Rsa, HashAlgId::Sha256, 16, 0, false)
            }
            CipherSuite::TLS_ECDH_RSA_WITH_AES_256_GCM_SHA384 => {
                (KeyExchangeAlg::Ecdh, AuthAlg::Rsa, HashAlgId::Sha384, 32, 0, false)
            }
            CipherSuite::TLS_ECDHE_ECDSA_WITH_AES_128_CBC_SHA => {
                (KeyExchangeAlg::Ecdhe, AuthAlg::Ecdsa, HashAlgId::Sha256, 16, 20, true)
            }
            CipherSuite::TLS_ECDHE_ECDSA_WITH_AES_256_CBC_SHA => {
                (KeyExchangeAlg::Ecdhe, AuthAlg::Ecdsa, HashAlgId::Sha256, 32, 20, true)
            }
            CipherSuite::TLS_ECDHE_RSA_WITH_AES_128_CBC_SHA => {
                (KeyExchangeAlg::Ecdhe, AuthAlg::Rsa, HashAlgId::Sha256, 16, 20, true)
            }
            CipherSuite::TLS_ECDHE_RSA_WITH_AES_256_CBC_SHA => {
                (KeyExchangeAlg::Ecdhe, AuthAlg::Rsa, HashAlgId::Sha256, 32, 20, true)
            }
            CipherSuite::TLS_ECDHE_ECDSA_WITH_AES_128_CBC_SHA256 => {
                (KeyExchangeAlg::Ecdhe, AuthAlg::Ecdsa, HashAlgId::Sha256, 16, 32, true)
            }
            CipherSuite::TLS_ECDHE_ECDSA_WITH_AES_256_CBC_SHA384 => {
                (KeyExchangeAlg::Ecdhe, AuthAlg::Ecdsa, HashAlgId::Sha384, 32, 48, true)
            }
            CipherSuite::TLS_ECDHE_RSA_WITH_AES_128_CBC_SHA256 => {
                (KeyExchangeAlg::Ecdhe, AuthAlg::Rsa, HashAlgId::Sha256, 16, 32, true)
            }
            CipherSuite::TLS_ECDHE_RSA_WITH_AES_256_CBC_SHA384 => {
                (KeyExchangeAlg::Ecdhe, AuthAlg::Rsa, HashAlgId::Sha384, 32, 48, true)
            }
            CipherSuite::TLS_ECDHE_ECDSA_WITH_AES_128_GCM_SHA256 => {
                (KeyExchangeAlg::Ecdhe, AuthAlg::Ecdsa, HashAlgId::Sha256, 16, 0, false)
            }
            CipherSuite::TLS_ECDHE_ECDSA_WITH_AES_256_GCM_SHA384 => {
                (KeyExchangeAlg::Ecdhe, AuthAlg::Ecdsa, HashAlgId::Sha384, 32, 0, false)
            }
            CipherSuite::TLS_ECDHE_RSA_WITH_AES_128_GCM_SHA256 => {
                (KeyExchangeAlg::Ecdhe, AuthAlg::Rsa, HashAlgId::Sha256, 16, 0, false)
            }
            CipherSuite::TLS_ECDHE_RSA_WITH_AES_256_GCM_SHA384 => {
                (KeyExchangeAlg::Ecdhe, AuthAlg::Rsa, HashAlgId::Sha384, 32, 0, false)
            }
            _ => {
                return Err(TlsError::IllegalParameter(format!(
                    "unknown cipher suite 0x{:04x}",
                    suite.0
                )))
            }
        };

        Ok(Self {
            suite,
            kx_alg,
            auth_alg,
            prf_hash,
            key_len,
            fixed_iv_len: if is_cbc { 0 } else { 4 },
            mac_len,
            is_cbc,
        })
    }

    /// Total key block length: 2·mac + 2·key + 2·iv.
    pub fn key_block_len(&self) -> usize {
        2 * self.mac_len + 2 * self.key_len + 2 * self.fixed_iv_len
    }

    /// Whether any ECDHE/ECDH suite is in the list (drives the curve
    /// extensions in ClientHello).
    pub fn any_elliptic(suites: &[CipherSuite]) -> bool {
        suites.iter().any(|s| {
            Self::from_suite(*s)
                .map(|p| matches!(p.kx_alg, KeyExchangeAlg::Ecdhe | KeyExchangeAlg::Ecdh))
                .unwrap_or(false)
        })
    }
}

/// The compiled-in default suite offer, in preference order: forward-secret
/// AEAD first, CBC and static exchanges last.
pub fn default_cipher_suites() -> Vec<CipherSuite> {
    vec![
        CipherSuite::TLS_ECDHE_ECDSA_WITH_AES_256_GCM_SHA384,
        CipherSuite::TLS_ECDHE_ECDSA_WITH_AES_128_GCM_SHA256,
        CipherSuite::TLS_ECDHE_RSA_WITH_AES_256_GCM_SHA384,
        CipherSuite::TLS_ECDHE_RSA_WITH_AES_128_GCM_SHA256,
        CipherSuite::TLS_DHE_RSA_WITH_AES_256_GCM_SHA384,
        CipherSuite::TLS_DHE_RSA_WITH_AES_128_GCM_SHA256,
        CipherSuite::TLS_ECDHE_ECDSA_WITH_AES_256_CBC_SHA384,
        CipherSuite::TLS_ECDHE_ECDSA_WITH_AES_128_CBC_SHA256,
        CipherSuite::TLS_ECDHE_RSA_WITH_AES_256_CBC_SHA384,
        CipherSuite::TLS_ECDHE_RSA_WITH_AES_128_CBC_SHA256,
        CipherSuite::TLS_ECDHE_ECDSA_WITH_AES_256_CBC_SHA,
        CipherSuite::TLS_ECDHE_ECDSA_WITH_AES_128_CBC_SHA,
        CipherSuite::TLS_ECDHE_RSA_WITH_AES_256_CBC_SHA,
        CipherSuite::TLS_ECDHE_RSA_WITH_AES_128_CBC_SHA,
        CipherSuite::TLS_DHE_RSA_WITH_AES_256_CBC_SHA256,
        CipherSuite::TLS_DHE_RSA_WITH_AES_128_CBC_SHA256,
        CipherSuite::TLS_DHE_RSA_WITH_AES_256_CBC_SHA,
        CipherSuite::TLS_DHE_RSA_WITH_AES_128_CBC_SHA,
        CipherSuite::TLS_DHE_DSS_WITH_AES_256_CBC_SHA,
        CipherSuite::TLS_DHE_DSS_WITH_AES_128_CBC_SHA,
        CipherSuite::TLS_ECDH_ECDSA_WITH_AES_256_GCM_SHA384,
        CipherSuite::TLS_ECDH_ECDSA_WITH_AES_128_GCM_SHA256,
        CipherSuite::TLS_ECDH_RSA_WITH_AES_256_GCM_SHA384,
        CipherSuite::TLS_ECDH_RSA_WITH_AES_128_GCM_SHA256,
        CipherSuite::TLS_ECDH_ECDSA_WITH_AES_256_CBC_SHA,
        CipherSuite::TLS_ECDH_ECDSA_WITH_AES_128_CBC_SHA,
        CipherSuite::TLS_ECDH_RSA_WITH_AES_256_CBC_SHA,
        CipherSuite::TLS_ECDH_RSA_WITH_AES_128_CBC_SHA,
        CipherSuite::TLS_RSA_WITH_AES_256_GCM_SHA384,
        CipherSuite::TLS_RSA_WITH_AES_128_GCM_SHA256,
        CipherSuite::TLS_RSA_WITH_AES_256_CBC_SHA256,
        CipherSuite::TLS_RSA_WITH_AES_128_CBC_SHA256,
        CipherSuite::TLS_RSA_WITH_AES_256_CBC_SHA,
        CipherSuite::TLS_RSA_WITH_AES_128_CBC_SHA,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_params_lookup_gcm() {
        let p =
            CipherSuiteParams::from_suite(CipherSuite::TLS_ECDHE_RSA_WITH_AES_128_GCM_SHA256)
                .unwrap();
        assert_eq!(p.kx_alg, KeyExchangeAlg::Ecdhe);
        assert_eq!(p.auth_alg, AuthAlg::Rsa);
        assert_eq!(p.prf_hash, HashAlgId::Sha256);
        assert_eq!(p.key_len, 16);
        assert_eq!(p.fixed_iv_len, 4);
        assert_eq!(p.mac_len, 0);
        assert!(!p.is_cbc);
        // 2*0 + 2*16 + 2*4
        assert_eq!(p.key_block_len(), 40);
    }

    #[test]
    fn test_params_lookup_cbc_sha() {
        let p = CipherSuiteParams::from_suite(CipherSuite::TLS_RSA_WITH_AES_128_CBC_SHA).unwrap();
        assert_eq!(p.kx_alg, KeyExchangeAlg::Rsa);
        assert_eq!(p.mac_len, 20);
        assert_eq!(p.fixed_iv_len, 0);
        assert!(p.is_cbc);
        // 2*20 + 2*16 + 0
        assert_eq!(p.key_block_len(), 72);
    }

    #[test]
    fn test_params_lookup_cbc_sha384() {
        let p =
            CipherSuiteParams::from_suite(CipherSuite::TLS_ECDHE_RSA_WITH_AES_256_CBC_SHA384)
                .unwrap();
        assert_eq!(p.prf_hash, HashAlgId::Sha384);
        assert_eq!(p.mac_len, 48);
        assert_eq!(p.key_len, 32);
        assert_eq!(p.key_block_len(), 2 * 48 + 2 * 32);
    }

    #[test]
    fn test_unknown_suite_rejected() {
        assert!(CipherSuiteParams::from_suite(CipherSuite(0x1301)).is_err());
        assert!(CipherSuiteParams::from_suite(CipherSuite(0x0000)).is_err());
    }

    #[test]
    fn test_default_suites_all_resolvable() {
        for suite in default_cipher_suites() {
            assert!(CipherSuiteParams::from_suite(suite).is_ok());
        }
    }

    #[test]
    fn test_forward_secrecy() {
        assert!(KeyExchangeAlg::Dhe.forward_secrecy());
        assert!(KeyExchangeAlg::Ecdhe.forward_secrecy());
        assert!(!KeyExchangeAlg::Rsa.forward_secrecy());
        assert!(!KeyExchangeAlg::Ecdh.forward_secrecy());
    }

    #[test]
    fn test_ske_expectation() {
        assert!(KeyExchangeAlg::Dhe.expects_server_key_exchange());
        assert!(KeyExchangeAlg::Ecdhe.expects_server_key_exchange());
        assert!(!KeyExchangeAlg::Rsa.expects_server_key_exchange());
        assert!(!KeyExchangeAlg::Ecdh.expects_server_key_exchange());
    }

    #[test]
    fn test_any_elliptic() {
        assert!(CipherSuiteParams::any_elliptic(&default_cipher_suites()));
        assert!(!CipherSuiteParams::any_elliptic(&[
            CipherSuite::TLS_RSA_WITH_AES_128_CBC_SHA,
            CipherSuite::TLS_DHE_RSA_WITH_AES_128_GCM_SHA256,
        ]));
    }
}
