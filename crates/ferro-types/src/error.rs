/// Cryptographic operation errors.
#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    #[error("invalid argument")]
    InvalidArg,
    #[error("operation not supported")]
    NotSupported,
    #[error("invalid key")]
    InvalidKey,
    #[error("invalid key length: expected {expected}, got {got}")]
    InvalidKeyLength { expected: usize, got: usize },
    #[error("invalid iv length")]
    InvalidIvLength,
    #[error("aead: tag verification failed")]
    AeadTagVerifyFail,
    #[error("random generation failed")]
    RandGenFail,

    // RSA
    #[error("rsa: verification failed")]
    RsaVerifyFail,
    #[error("rsa: invalid padding")]
    RsaInvalidPadding,
    #[error("rsa: message too long for modulus")]
    RsaInputOverflow,

    // ECC
    #[error("ecc: invalid public key")]
    EccInvalidPublicKey,
    #[error("ecc: invalid private key")]
    EccInvalidPrivateKey,
    #[error("ecc: unsupported curve")]
    EccUnsupportedCurve,
    #[error("ecdsa: verification failed")]
    EcdsaVerifyFail,

    // DH / DSA
    #[error("dh: invalid group parameters")]
    DhInvalidParams,
    #[error("dh: invalid peer public value")]
    DhInvalidPeerKey,
    #[error("dsa: verification failed")]
    DsaVerifyFail,
    #[error("dsa: invalid domain parameters")]
    DsaInvalidParams,
}

/// PKI certificate errors.
#[derive(Debug, thiserror::Error)]
pub enum PkiError {
    #[error("invalid certificate: {0}")]
    InvalidCert(String),
    #[error("certificate expired or not yet valid")]
    CertNotTimeValid,
    #[error("certificate revoked")]
    CertRevoked,
    #[error("certificate chain verification failed: {0}")]
    ChainVerifyFailed(String),
    #[error("hostname mismatch: {0}")]
    HostnameMismatch(String),
    #[error("issuer certificate not found")]
    IssuerNotFound,
    #[error("unsupported public key algorithm")]
    UnsupportedPublicKey,
    #[error("crypto error: {0}")]
    CryptoError(#[from] CryptoError),
}

/// TLS protocol errors.
///
/// Every fatal variant corresponds to exactly one alert description from the
/// closed set the record layer can emit; the mapping lives in the tls crate's
/// alert module.
#[derive(Debug, thiserror::Error)]
pub enum TlsError {
    #[error("handshake failed: {0}")]
    HandshakeFailed(String),
    #[error("unexpected message: {0}")]
    UnexpectedMessage(String),
    #[error("decode error: {0}")]
    DecodeError(String),
    #[error("illegal parameter: {0}")]
    IllegalParameter(String),
    #[error("bad record MAC")]
    BadRecordMac,
    #[error("record overflow")]
    RecordOverflow,
    #[error("decrypt error: {0}")]
    DecryptError(String),
    #[error("unsupported protocol version")]
    UnsupportedVersion,
    #[error("certificate expired")]
    CertificateExpired,
    #[error("certificate revoked")]
    CertificateRevoked,
    #[error("certificate verification failed: {0}")]
    CertificateUnknown(String),
    #[error("fatal alert received: {0}")]
    AlertReceived(u8),
    #[error("connection closed")]
    ConnectionClosed,
    #[error("io error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("crypto error: {0}")]
    CryptoError(#[from] CryptoError),
    #[error("pki error: {0}")]
    PkiError(#[from] PkiError),
}
