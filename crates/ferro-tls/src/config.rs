//! TLS client configuration with builder pattern.

use std::fmt;
use std::sync::Arc;

use ferro_pki::ChainStatus;
use zeroize::Zeroize;

use crate::crypt::default_cipher_suites;
use crate::CipherSuite;

/// Client private key material for CertificateVerify signing.
///
/// TLS 1.2 client authentication here signs the SHA-1 transcript with RSA
/// PKCS#1 v1.5 or DSA.
#[derive(Clone)]
pub enum ClientPrivateKey {
    /// RSA modulus and private exponent, big-endian.
    Rsa { n: Vec<u8>, d: Vec<u8> },
    /// DSA domain parameters and private value, big-endian.
    Dsa {
        p: Vec<u8>,
        q: Vec<u8>,
        g: Vec<u8>,
        x: Vec<u8>,
    },
}

impl Drop for ClientPrivateKey {
    fn drop(&mut self) {
        match self {
            ClientPrivateKey::Rsa { d, .. } => d.zeroize(),
            ClientPrivateKey::Dsa { x, .. } => x.zeroize(),
        }
    }
}

impl fmt::Debug for ClientPrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientPrivateKey::Rsa { .. } => f.write_str("ClientPrivateKey::Rsa"),
            ClientPrivateKey::Dsa { .. } => f.write_str("ClientPrivateKey::Dsa"),
        }
    }
}

/// Callback for overriding certificate validation.
///
/// Receives the leaf certificate, the built chain (DER, leaf first), and the
/// per-certificate status flags. Returning `true` accepts the peer
/// certificate regardless of the default verdict; `false` rejects it.
pub type CertValidationCallback =
    Arc<dyn Fn(&[u8], &[Vec<u8>], &[ChainStatus]) -> bool + Send + Sync>;

/// TLS client configuration.
#[derive(Clone)]
pub struct TlsConfig {
    /// Server hostname: drives SNI (suppressed for IP literals) and
    /// certificate name checking. `None` disables both.
    pub server_name: Option<String>,
    /// Enabled cipher suites, in preference order.
    pub cipher_suites: Vec<CipherSuite>,
    /// Trusted root certificates (DER-encoded).
    pub trusted_certs: Vec<Vec<u8>>,
    /// Client certificate chain (DER-encoded, leaf first) for mutual TLS.
    pub client_certificate_chain: Vec<Vec<u8>>,
    /// Client private key matching the leaf of the client chain.
    pub client_private_key: Option<ClientPrivateKey>,
    /// Whether to verify the peer's certificate chain at all.
    pub verify_peer: bool,
    /// Custom certificate validation callback; overrides the default
    /// verdict when set.
    pub cert_validation_callback: Option<CertValidationCallback>,
    /// Require the renegotiation_info extension on the initial handshake.
    pub require_secure_renegotiation: bool,
    /// Respond to server HelloRequests by renegotiating. When false a
    /// warning no_renegotiation alert is sent instead.
    pub allow_renegotiation: bool,
    /// Send application data after the client Finished without waiting for
    /// the server's, when the suite provides forward secrecy.
    pub enable_false_start: bool,
}

impl fmt::Debug for TlsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TlsConfig")
            .field("server_name", &self.server_name)
            .field("cipher_suites", &self.cipher_suites.len())
            .field("trusted_certs", &self.trusted_certs.len())
            .field(
                "client_certificate_chain",
                &self.client_certificate_chain.len(),
            )
            .field("verify_peer", &self.verify_peer)
            .field(
                "cert_validation_callback",
                &self.cert_validation_callback.as_ref().map(|_| "<callback>"),
            )
            .field(
                "require_secure_renegotiation",
                &self.require_secure_renegotiation,
            )
            .field("allow_renegotiation", &self.allow_renegotiation)
            .field("enable_false_start", &self.enable_false_start)
            .finish_non_exhaustive()
    }
}

impl TlsConfig {
    pub fn builder() -> TlsConfigBuilder {
        TlsConfigBuilder::default()
    }

    /// True when `server_name` is an IP literal; SNI must then be omitted
    /// (RFC 6066 §3).
    pub fn server_name_is_ip(&self) -> bool {
        self.server_name
            .as_deref()
            .map(|n| n.parse::<std::net::IpAddr>().is_ok())
            .unwrap_or(false)
    }
}

/// Builder for `TlsConfig`.
pub struct TlsConfigBuilder {
    server_name: Option<String>,
    cipher_suites: Vec<CipherSuite>,
    trusted_certs: Vec<Vec<u8>>,
    client_certificate_chain: Vec<Vec<u8>>,
    client_private_key: Option<ClientPrivateKey>,
    verify_peer: bool,
    cert_validation_callback: Option<CertValidationCallback>,
    require_secure_renegotiation: bool,
    allow_renegotiation: bool,
    enable_false_start: bool,
}

impl Default for TlsConfigBuilder {
    fn default() -> Self {
        Self {
            server_name: None,
            cipher_suites: default_cipher_suites(),
            trusted_certs: Vec::new(),
            client_certificate_chain: Vec::new(),
            client_private_key: None,
            verify_peer: true,
            cert_validation_callback: None,
            require_secure_renegotiation: false,
            allow_renegotiation: true,
            enable_false_start: false,
        }
    }
}

impl TlsConfigBuilder {
    pub fn server_name(mut self, name: impl Into<String>) -> Self {
        self.server_name = Some(name.into());
        self
    }

    pub fn cipher_suites(mut self, suites: Vec<CipherSuite>) -> Self {
        self.cipher_suites = suites;
        self
    }

    pub fn add_trusted_cert(mut self, der: Vec<u8>) -> Self {
        self.trusted_certs.push(der);
        self
    }

    pub fn client_certificate(mut self, chain: Vec<Vec<u8>>, key: ClientPrivateKey) -> Self {
        self.client_certificate_chain = chain;
        self.client_private_key = Some(key);
        self
    }

    pub fn verify_peer(mut self, verify: bool) -> Self {
        self.verify_peer = verify;
        self
    }

    pub fn cert_validation_callback(mut self, cb: CertValidationCallback) -> Self {
        self.cert_validation_callback = Some(cb);
        self
    }

    pub fn require_secure_renegotiation(mut self, require: bool) -> Self {
        self.require_secure_renegotiation = require;
        self
    }

    pub fn allow_renegotiation(mut self, allow: bool) -> Self {
        self.allow_renegotiation = allow;
        self
    }

    pub fn enable_false_start(mut self, enable: bool) -> Self {
        self.enable_false_start = enable;
        self
    }

    pub fn build(self) -> TlsConfig {
        TlsConfig {
            server_name: self.server_name,
            cipher_suites: self.cipher_suites,
            trusted_certs: self.trusted_certs,
            client_certificate_chain: self.client_certificate_chain,
            client_private_key: self.client_private_key,
            verify_peer: self.verify_peer,
            cert_validation_callback: self.cert_validation_callback,
            require_secure_renegotiation: self.require_secure_renegotiation,
            allow_renegotiation: self.allow_renegotiation,
            enable_false_start: self.enable_false_start,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let config = TlsConfig::builder().build();
        assert!(config.verify_peer);
        assert!(config.allow_renegotiation);
        assert!(!config.require_secure_renegotiation);
        assert!(!config.enable_false_start);
        assert!(!config.cipher_suites.is_empty());
        assert!(config.server_name.is_none());
    }

    #[test]
    fn test_ip_literal_detection() {
        let config = TlsConfig::builder().server_name("192.0.2.7").build();
        assert!(config.server_name_is_ip());

        let config = TlsConfig::builder().server_name("2001:db8::1").build();
        assert!(config.server_name_is_ip());

        let config = TlsConfig::builder().server_name("example.com").build();
        assert!(!config.server_name_is_ip());
    }

    #[test]
    fn test_builder_fields() {
        let config = TlsConfig::builder()
            .server_name("example.com")
            .verify_peer(false)
            .enable_false_start(true)
            .allow_renegotiation(false)
            .build();
        assert_eq!(config.server_name.as_deref(), Some("example.com"));
        assert!(!config.verify_peer);
        assert!(config.enable_false_start);
        assert!(!config.allow_renegotiation);
    }
}
