//! Owned certificate representation extracted from DER.

use ferro_crypto::ecdh::EcCurveId;
use ferro_crypto::hash::HashAlgId;
use ferro_types::PkiError;
use x509_parser::prelude::{FromDer, GeneralName, X509Certificate};

use crate::der::Decoder;

/// Subject public key material extracted from the SubjectPublicKeyInfo.
#[derive(Debug, Clone)]
pub enum PublicKeyInfo {
    /// RSA modulus and exponent, big-endian.
    Rsa { n: Vec<u8>, e: Vec<u8> },
    /// EC named curve and uncompressed SEC1 point.
    Ec { curve: EcCurveId, point: Vec<u8> },
    /// DSA domain parameters and public value, big-endian.
    Dsa {
        p: Vec<u8>,
        q: Vec<u8>,
        g: Vec<u8>,
        y: Vec<u8>,
    },
}

/// The algorithm a certificate is signed with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureAlg {
    RsaPkcs1(HashAlgId),
    Ecdsa(HashAlgId),
    Dsa(HashAlgId),
    /// Recognised structure but unsupported algorithm.
    Unsupported,
}

/// A certificate parsed once into owned fields.
///
/// The raw DER is retained for wire re-encoding and trust-anchor comparison;
/// everything the engine consults afterwards is extracted here.
#[derive(Debug, Clone)]
pub struct Certificate {
    pub der: Vec<u8>,
    pub subject_raw: Vec<u8>,
    pub issuer_raw: Vec<u8>,
    pub not_before: i64,
    pub not_after: i64,
    pub public_key: PublicKeyInfo,
    pub signature_alg: SignatureAlg,
    pub tbs_raw: Vec<u8>,
    pub signature: Vec<u8>,
    pub san_dns: Vec<String>,
    pub san_ip: Vec<Vec<u8>>,
    pub common_name: Option<String>,
}

impl Certificate {
    pub fn from_der(der: &[u8]) -> Result<Self, PkiError> {
        let (_, cert) = X509Certificate::from_der(der)
            .map_err(|e| PkiError::InvalidCert(format!("parse failed: {e}")))?;

        let public_key = parse_spki(&cert)?;
        let signature_alg = map_signature_oid(&cert.signature_algorithm.algorithm.to_id_string());

        let mut san_dns = Vec::new();
        let mut san_ip = Vec::new();
        if let Ok(Some(san)) = cert.subject_alternative_name() {
            for name in &san.value.general_names {
                match name {
                    GeneralName::DNSName(dns) => san_dns.push(dns.to_string()),
                    GeneralName::IPAddress(ip) => san_ip.push(ip.to_vec()),
                    _ => {}
                }
            }
        }

        let common_name = cert
            .subject()
            .iter_common_name()
            .next()
            .and_then(|cn| cn.as_str().ok())
            .map(|s| s.to_string());

        Ok(Self {
            der: der.to_vec(),
            subject_raw: cert.subject().as_raw().to_vec(),
            issuer_raw: cert.issuer().as_raw().to_vec(),
            not_before: cert.validity().not_before.timestamp(),
            not_after: cert.validity().not_after.timestamp(),
            public_key,
            signature_alg,
            tbs_raw: cert.tbs_certificate.as_ref().to_vec(),
            signature: cert.signature_value.data.to_vec(),
            san_dns,
            san_ip,
            common_name,
        })
    }

    /// Subject DN equals issuer DN.
    pub fn is_self_issued(&self) -> bool {
        self.subject_raw == self.issuer_raw
    }

    /// Valid at the given Unix timestamp.
    pub fn is_time_valid(&self, now: i64) -> bool {
        now >= self.not_before && now <= self.not_after
    }

    /// Verify this certificate's signature with the given issuer key.
    pub fn verify_signed_by(&self, issuer_key: &PublicKeyInfo) -> Result<bool, PkiError> {
        let hash = match self.signature_alg {
            SignatureAlg::RsaPkcs1(h) | SignatureAlg::Ecdsa(h) | SignatureAlg::Dsa(h) => h,
            SignatureAlg::Unsupported => return Ok(false),
        };
        let digest = hash.digest(&self.tbs_raw);

        match (&self.signature_alg, issuer_key) {
            (SignatureAlg::RsaPkcs1(h), PublicKeyInfo::Rsa { n, e }) => {
                let key = ferro_crypto::rsa::RsaPublicKey::new(n, e)?;
                Ok(key.verify_pkcs1(*h, &digest, &self.signature)?)
            }
            (SignatureAlg::Ecdsa(_), PublicKeyInfo::Ec { curve, point }) => Ok(
                ferro_crypto::ecdsa::ecdsa_verify(*curve, point, &digest, &self.signature)?,
            ),
            (SignatureAlg::Dsa(_), PublicKeyInfo::Dsa { p, q, g, y }) => {
                let params = ferro_crypto::dsa::DsaParams::new(p, q, g)?;
                let key = ferro_crypto::dsa::DsaPublicKey::new(params, y)?;
                Ok(key.verify(&digest, &self.signature)?)
            }
            _ => Ok(false),
        }
    }
}

fn parse_spki(cert: &X509Certificate<'_>) -> Result<PublicKeyInfo, PkiError> {
    let spki = cert.public_key();
    let alg_oid = spki.algorithm.algorithm.to_id_string();
    let key_data: &[u8] = &spki.subject_public_key.data;

    match alg_oid.as_str() {
        // rsaEncryption: BIT STRING holds SEQUENCE { n, e }
        "1.2.840.113549.1.1.1" => {
            let mut dec = Decoder::new(key_data);
            let mut seq = dec.read_sequence()?;
            let n = seq.read_integer()?.to_vec();
            let e = seq.read_integer()?.to_vec();
            Ok(PublicKeyInfo::Rsa { n, e })
        }
        // id-ecPublicKey: parameters carry the named-curve OID, BIT STRING
        // holds the SEC1 point
        "1.2.840.10045.2.1" => {
            let params = spki
                .algorithm
                .parameters
                .as_ref()
                .ok_or(PkiError::UnsupportedPublicKey)?;
            let curve_oid = params
                .as_oid()
                .map_err(|_| PkiError::UnsupportedPublicKey)?
                .to_id_string();
            let curve = match curve_oid.as_str() {
                "1.2.840.10045.3.1.7" => EcCurveId::P256,
                "1.3.132.0.34" => EcCurveId::P384,
                "1.3.132.0.35" => EcCurveId::P521,
                _ => return Err(PkiError::UnsupportedPublicKey),
            };
            Ok(PublicKeyInfo::Ec {
                curve,
                point: key_data.to_vec(),
            })
        }
        // id-dsa: parameters carry SEQUENCE { p, q, g }, BIT STRING holds
        // INTEGER y
        "1.2.840.10040.4.1" => {
            let params = spki
                .algorithm
                .parameters
                .as_ref()
                .ok_or(PkiError::UnsupportedPublicKey)?;
            // The Any value's data is the SEQUENCE content: three INTEGERs
            let mut seq = Decoder::new(params.data);
            let p = seq.read_integer()?.to_vec();
            let q = seq.read_integer()?.to_vec();
            let g = seq.read_integer()?.to_vec();

            let mut y_dec = Decoder::new(key_data);
            let y = y_dec.read_integer()?.to_vec();
            Ok(PublicKeyInfo::Dsa { p, q, g, y })
        }
        _ => Err(PkiError::UnsupportedPublicKey),
    }
}

fn map_signature_oid(oid: &str) -> SignatureAlg {
    match oid {
        "1.2.840.113549.1.1.5" => SignatureAlg::RsaPkcs1(HashAlgId::Sha1),
        "1.2.840.113549.1.1.11" => SignatureAlg::RsaPkcs1(HashAlgId::Sha256),
        "1.2.840.113549.1.1.12" => SignatureAlg::RsaPkcs1(HashAlgId::Sha384),
        "1.2.840.113549.1.1.13" => SignatureAlg::RsaPkcs1(HashAlgId::Sha512),
        "1.2.840.10045.4.1" => SignatureAlg::Ecdsa(HashAlgId::Sha1),
        "1.2.840.10045.4.3.2" => SignatureAlg::Ecdsa(HashAlgId::Sha256),
        "1.2.840.10045.4.3.3" => SignatureAlg::Ecdsa(HashAlgId::Sha384),
        "1.2.840.10045.4.3.4" => SignatureAlg::Ecdsa(HashAlgId::Sha512),
        "1.2.840.10040.4.3" => SignatureAlg::Dsa(HashAlgId::Sha1),
        "2.16.840.1.101.3.4.3.2" => SignatureAlg::Dsa(HashAlgId::Sha256),
        _ => SignatureAlg::Unsupported,
    }
}
