//! TLS 1.2 client handshake state machine (RFC 5246 §7).
//!
//! Consumes complete server handshake messages in arrival order, enforces
//! flight ordering, derives keys, and produces the client flight when
//! ServerHelloDone arrives. The connection controller owns record I/O and
//! the ChangeCipherSpec fence; this engine owns everything between.

use ferro_crypto::dh::{DhKeyPair, DhParams};
use ferro_crypto::ecdh::{EcCurveId, EcdhKeyPair};
use ferro_crypto::hash::HashAlgId;
use ferro_crypto::rand::random_bytes;
use ferro_pki::{BuiltChain, PublicKeyInfo};
use ferro_types::TlsError;
use subtle::ConstantTimeEq;
use zeroize::Zeroize;

use super::codec::{
    decode_certificate, decode_certificate_request, decode_ske_dhe, decode_ske_ecdhe,
    decode_server_hello, encode_certificate, encode_certificate_verify, encode_cke_dhe,
    encode_cke_ecdh, encode_cke_rsa, encode_client_hello, encode_finished, CertificateRequest,
    ClientHello, ServerHello,
};
use super::extensions::{
    build_ec_point_formats, build_renegotiation_info, build_server_name,
    build_signature_algorithms, build_supported_curves, parse_renegotiation_info, Extension,
    ExtensionType,
};
use super::signing::{key_satisfies_request, sign_certificate_verify};
use super::verify::{build_signed_data, verify_ske_signature};
use super::{HandshakeMessage, HandshakeType};
use crate::cert_verify::verify_server_certificate;
use crate::config::TlsConfig;
use crate::crypt::key_schedule::{
    compute_verify_data, derive_key_block, derive_master_secret, MASTER_SECRET_LEN,
};
use crate::crypt::transcript::Transcript;
use crate::crypt::{CipherSuiteParams, KeyExchangeAlg};
use crate::CipherSuite;

/// Client handshake states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientHandshakeState {
    Idle,
    WaitServerHello,
    WaitCertificate,
    WaitServerKeyExchange,
    WaitServerHelloDone,
    WaitChangeCipherSpec,
    WaitFinished,
    Connected,
}

/// Symmetric keys for both directions, handed to the record layer. The
/// write half activates when the client sends ChangeCipherSpec, the read
/// half when the server's arrives.
pub struct PendingKeys {
    pub suite: CipherSuite,
    pub is_cbc: bool,
    pub mac_len: usize,
    pub client_write_mac_key: Vec<u8>,
    pub server_write_mac_key: Vec<u8>,
    pub client_write_key: Vec<u8>,
    pub server_write_key: Vec<u8>,
    pub client_write_iv: Vec<u8>,
    pub server_write_iv: Vec<u8>,
}

impl Drop for PendingKeys {
    fn drop(&mut self) {
        self.client_write_mac_key.zeroize();
        self.server_write_mac_key.zeroize();
        self.client_write_key.zeroize();
        self.server_write_key.zeroize();
        self.client_write_iv.zeroize();
        self.server_write_iv.zeroize();
    }
}

/// The client's response flight, produced on ServerHelloDone.
///
/// Wire order: [Certificate] ClientKeyExchange [CertificateVerify]
/// ChangeCipherSpec Finished; the controller inserts the CCS and switches
/// the write cipher before Finished.
pub struct ClientFlight {
    pub client_certificate: Option<Vec<u8>>,
    pub client_key_exchange: Vec<u8>,
    pub certificate_verify: Option<Vec<u8>>,
    pub finished: Vec<u8>,
    pub keys: PendingKeys,
}

/// TLS 1.2 client handshake engine.
pub struct ClientHandshake {
    config: TlsConfig,
    state: ClientHandshakeState,
    params: Option<CipherSuiteParams>,
    transcript: Transcript,
    client_random: [u8; 32],
    server_random: [u8; 32],
    /// Chain as received on the wire.
    server_chain_der: Vec<Vec<u8>>,
    /// Built and validated chain (None when validation is disabled and the
    /// presented chain is unusable).
    server_chain: Option<BuiltChain>,
    /// DHE parameters from ServerKeyExchange: (p, g, Ys).
    server_dh: Option<(Vec<u8>, Vec<u8>, Vec<u8>)>,
    /// ECDHE parameters from ServerKeyExchange.
    server_ecdh: Option<(EcCurveId, Vec<u8>)>,
    cert_request: Option<CertificateRequest>,
    master_secret: Vec<u8>,
    client_verify_data: Vec<u8>,
    server_verify_data: Vec<u8>,
    prev_client_verify_data: Vec<u8>,
    prev_server_verify_data: Vec<u8>,
    secure_renegotiation: bool,
    is_renegotiation: bool,
    /// True once the peer's Finished has been validated.
    authenticated: bool,
}

impl Drop for ClientHandshake {
    fn drop(&mut self) {
        self.master_secret.zeroize();
    }
}

impl ClientHandshake {
    pub fn new(config: TlsConfig) -> Self {
        Self {
            config,
            state: ClientHandshakeState::Idle,
            params: None,
            transcript: Transcript::new(HashAlgId::Sha256),
            client_random: [0u8; 32],
            server_random: [0u8; 32],
            server_chain_der: Vec::new(),
            server_chain: None,
            server_dh: None,
            server_ecdh: None,
            cert_request: None,
            master_secret: Vec::new(),
            client_verify_data: Vec::new(),
            server_verify_data: Vec::new(),
            prev_client_verify_data: Vec::new(),
            prev_server_verify_data: Vec::new(),
            secure_renegotiation: false,
            is_renegotiation: false,
            authenticated: false,
        }
    }

    pub fn state(&self) -> ClientHandshakeState {
        self.state
    }

    pub fn suite(&self) -> Option<CipherSuite> {
        self.params.as_ref().map(|p| p.suite)
    }

    /// True for DHE/ECDHE suites; gates false start.
    pub fn forward_secrecy(&self) -> bool {
        self.params
            .as_ref()
            .map(|p| p.kx_alg.forward_secrecy())
            .unwrap_or(false)
    }

    pub fn secure_renegotiation(&self) -> bool {
        self.secure_renegotiation
    }

    pub fn is_renegotiation(&self) -> bool {
        self.is_renegotiation
    }

    /// True once the server Finished has been validated.
    pub fn authenticated(&self) -> bool {
        self.authenticated
    }

    pub fn client_verify_data(&self) -> &[u8] {
        &self.client_verify_data
    }

    pub fn server_verify_data(&self) -> &[u8] {
        &self.server_verify_data
    }

    /// The server chain exactly as received, leaf first.
    pub fn peer_certificates(&self) -> &[Vec<u8>] {
        &self.server_chain_der
    }

    /// Reset for a renegotiation handshake, binding it to the completed
    /// one's verify_data (RFC 5746 §3.5).
    pub fn reset_for_renegotiation(&mut self) {
        self.prev_client_verify_data = std::mem::take(&mut self.client_verify_data);
        self.prev_server_verify_data = std::mem::take(&mut self.server_verify_data);
        self.state = ClientHandshakeState::Idle;
        self.params = None;
        self.transcript.reset();
        self.client_random = [0u8; 32];
        self.server_random = [0u8; 32];
        self.server_chain_der.clear();
        self.server_chain = None;
        self.server_dh = None;
        self.server_ecdh = None;
        self.cert_request = None;
        self.master_secret.zeroize();
        self.master_secret.clear();
        self.authenticated = false;
        self.is_renegotiation = true;
    }

    /// Build and record the ClientHello; moves to WaitServerHello.
    pub fn build_client_hello(&mut self) -> Result<Vec<u8>, TlsError> {
        // client_random: 4-byte Unix timestamp then 28 random bytes
        let now = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs() as u32)
            .unwrap_or(0);
        self.client_random[..4].copy_from_slice(&now.to_be_bytes());
        random_bytes(&mut self.client_random[4..])?;

        let mut extensions: Vec<Extension> = Vec::new();
        if self.is_renegotiation {
            extensions.push(build_renegotiation_info(&self.prev_client_verify_data));
        } else {
            extensions.push(build_renegotiation_info(&[]));
        }
        if let Some(ref name) = self.config.server_name {
            if !self.config.server_name_is_ip() {
                extensions.push(build_server_name(name));
            }
        }
        extensions.push(build_signature_algorithms());
        if CipherSuiteParams::any_elliptic(&self.config.cipher_suites) {
            extensions.push(build_supported_curves());
            extensions.push(build_ec_point_formats());
        }

        if self.config.cipher_suites.is_empty() {
            return Err(TlsError::HandshakeFailed("no cipher suites enabled".into()));
        }

        let ch = ClientHello {
            random: self.client_random,
            session_id: Vec::new(),
            cipher_suites: self.config.cipher_suites.clone(),
            extensions,
        };
        let msg = encode_client_hello(&ch);
        self.transcript.update(&msg);
        self.state = ClientHandshakeState::WaitServerHello;
        Ok(msg)
    }

    /// Process one server handshake message; returns the client flight when
    /// ServerHelloDone completes the server's.
    pub fn process_message(
        &mut self,
        msg: &HandshakeMessage,
    ) -> Result<Option<ClientFlight>, TlsError> {
        match (self.state, msg.msg_type) {
            (ClientHandshakeState::WaitServerHello, HandshakeType::ServerHello) => {
                let sh = decode_server_hello(msg.body())?;
                self.process_server_hello(&msg.raw, &sh)?;
                Ok(None)
            }
            (ClientHandshakeState::WaitCertificate, HandshakeType::Certificate) => {
                self.process_certificate(msg)?;
                Ok(None)
            }
            (ClientHandshakeState::WaitServerKeyExchange, HandshakeType::ServerKeyExchange) => {
                self.process_server_key_exchange(msg)?;
                Ok(None)
            }
            (ClientHandshakeState::WaitServerHelloDone, HandshakeType::CertificateRequest) => {
                let cr = decode_certificate_request(msg.body())?;
                if self.cert_request.is_some() {
                    return Err(TlsError::UnexpectedMessage(
                        "duplicate CertificateRequest".into(),
                    ));
                }
                self.transcript.update(&msg.raw);
                self.cert_request = Some(cr);
                Ok(None)
            }
            (ClientHandshakeState::WaitServerHelloDone, HandshakeType::ServerHelloDone) => {
                if !msg.body().is_empty() {
                    return Err(TlsError::DecodeError(
                        "ServerHelloDone must be empty".into(),
                    ));
                }
                let flight = self.process_server_hello_done(&msg.raw)?;
                Ok(Some(flight))
            }
            (ClientHandshakeState::WaitFinished, HandshakeType::Finished) => {
                self.process_finished(msg)?;
                Ok(None)
            }
            (state, msg_type) => Err(TlsError::UnexpectedMessage(format!(
                "{msg_type:?} in state {state:?}"
            ))),
        }
    }

    /// Advance across the ChangeCipherSpec fence (record-layer event, not a
    /// handshake message; never enters the transcript).
    pub fn process_change_cipher_spec(&mut self) -> Result<(), TlsError> {
        if self.state != ClientHandshakeState::WaitChangeCipherSpec {
            return Err(TlsError::UnexpectedMessage(
                "ChangeCipherSpec outside the cipher transition".into(),
            ));
        }
        self.state = ClientHandshakeState::WaitFinished;
        Ok(())
    }

    fn process_server_hello(&mut self, raw: &[u8], sh: &ServerHello) -> Result<(), TlsError> {
        if sh.version != 0x0303 {
            return Err(TlsError::UnsupportedVersion);
        }
        if !self.config.cipher_suites.contains(&sh.cipher_suite) {
            return Err(TlsError::IllegalParameter(format!(
                "server selected unoffered suite 0x{:04x}",
                sh.cipher_suite.0
            )));
        }
        let params = CipherSuiteParams::from_suite(sh.cipher_suite)?;
        if sh.compression != 0 {
            return Err(TlsError::IllegalParameter(
                "non-null compression selected".into(),
            ));
        }

        let mut saw_renegotiation_info = false;
        for ext in &sh.extensions {
            match ext.extension_type {
                ExtensionType::RENEGOTIATION_INFO => {
                    saw_renegotiation_info = true;
                    let value = parse_renegotiation_info(&ext.data)?;
                    if self.is_renegotiation {
                        // Must be exactly client_verify_data || server_verify_data
                        let mut expected = Vec::with_capacity(
                            self.prev_client_verify_data.len()
                                + self.prev_server_verify_data.len(),
                        );
                        expected.extend_from_slice(&self.prev_client_verify_data);
                        expected.extend_from_slice(&self.prev_server_verify_data);
                        if value.ct_eq(expected.as_slice()).unwrap_u8() != 1 {
                            return Err(TlsError::HandshakeFailed(
                                "renegotiation_info binding mismatch".into(),
                            ));
                        }
                    } else if !value.is_empty() {
                        return Err(TlsError::HandshakeFailed(
                            "non-empty renegotiation_info on initial handshake".into(),
                        ));
                    }
                    self.secure_renegotiation = true;
                }
                // Empty acknowledgement of our SNI
                ExtensionType::SERVER_NAME => {
                    if !ext.data.is_empty() {
                        return Err(TlsError::DecodeError(
                            "server_name acknowledgement must be empty".into(),
                        ));
                    }
                }
                ExtensionType::EC_POINT_FORMATS => {
                    // Must still include uncompressed
                    if !ext.data.get(1..).unwrap_or(&[]).contains(&0) {
                        return Err(TlsError::IllegalParameter(
                            "peer dropped uncompressed point format".into(),
                        ));
                    }
                }
                other => {
                    return Err(TlsError::HandshakeFailed(format!(
                        "unsupported ServerHello extension 0x{:04x}",
                        other.0
                    )));
                }
            }
        }

        if !saw_renegotiation_info {
            if self.is_renegotiation && self.secure_renegotiation {
                return Err(TlsError::HandshakeFailed(
                    "renegotiation_info missing on renegotiation".into(),
                ));
            }
            if !self.is_renegotiation && self.config.require_secure_renegotiation {
                return Err(TlsError::HandshakeFailed(
                    "peer does not support secure renegotiation".into(),
                ));
            }
        }

        self.server_random = sh.random;
        // The negotiated suite fixes the PRF hash; the transcript replays
        // the buffered ClientHello under the new hash.
        self.transcript.set_hash(params.prf_hash);
        self.transcript.update(raw);
        self.params = Some(params);
        self.state = ClientHandshakeState::WaitCertificate;
        Ok(())
    }

    fn process_certificate(&mut self, msg: &HandshakeMessage) -> Result<(), TlsError> {
        let chain_der = decode_certificate(msg.body())?;
        if chain_der.is_empty() {
            return Err(TlsError::HandshakeFailed("empty certificate chain".into()));
        }
        self.transcript.update(&msg.raw);

        self.server_chain = verify_server_certificate(&self.config, &chain_der)?;
        self.server_chain_der = chain_der;

        let params = self.params.as_ref().expect("params set by ServerHello");
        self.state = if params.kx_alg.expects_server_key_exchange() {
            ClientHandshakeState::WaitServerKeyExchange
        } else {
            ClientHandshakeState::WaitServerHelloDone
        };
        Ok(())
    }

    fn leaf_key(&self) -> Result<&PublicKeyInfo, TlsError> {
        self.server_chain
            .as_ref()
            .map(|c| &c.certs[0].public_key)
            .ok_or_else(|| {
                TlsError::HandshakeFailed("server certificate key unavailable".into())
            })
    }

    fn process_server_key_exchange(&mut self, msg: &HandshakeMessage) -> Result<(), TlsError> {
        let params = self.params.as_ref().expect("params set by ServerHello");
        let auth_alg = params.auth_alg;

        match params.kx_alg {
            KeyExchangeAlg::Dhe => {
                let ske = decode_ske_dhe(msg.body())?;
                if self.config.verify_peer {
                    let signed = build_signed_data(
                        &self.client_random,
                        &self.server_random,
                        &super::codec::build_dhe_params(&ske.p, &ske.g, &ske.ys),
                    );
                    verify_ske_signature(
                        self.leaf_key()?,
                        auth_alg,
                        ske.hash_alg,
                        ske.sig_alg,
                        &signed,
                        &ske.signature,
                    )?;
                }
                self.server_dh = Some((ske.p, ske.g, ske.ys));
            }
            KeyExchangeAlg::Ecdhe => {
                let ske = decode_ske_ecdhe(msg.body())?;
                let curve = EcCurveId::from_named_curve(ske.named_curve).ok_or_else(|| {
                    TlsError::IllegalParameter(format!(
                        "unsupported named curve 0x{:04x}",
                        ske.named_curve
                    ))
                })?;
                if ske.public_point.first() != Some(&0x04)
                    || ske.public_point.len() != curve.point_len()
                {
                    return Err(TlsError::IllegalParameter(
                        "server point is not uncompressed".into(),
                    ));
                }
                if self.config.verify_peer {
                    let signed = build_signed_data(
                        &self.client_random,
                        &self.server_random,
                        &super::codec::build_ecdhe_params(
                            ske.curve_type,
                            ske.named_curve,
                            &ske.public_point,
                        ),
                    );
                    verify_ske_signature(
                        self.leaf_key()?,
                        auth_alg,
                        ske.hash_alg,
                        ske.sig_alg,
                        &signed,
                        &ske.signature,
                    )?;
                }
                self.server_ecdh = Some((curve, ske.public_point));
            }
            KeyExchangeAlg::Rsa | KeyExchangeAlg::Ecdh => {
                return Err(TlsError::UnexpectedMessage(
                    "ServerKeyExchange for a static key exchange".into(),
                ));
            }
        }

        self.transcript.update(&msg.raw);
        self.state = ClientHandshakeState::WaitServerHelloDone;
        Ok(())
    }

    /// Compute the premaster secret and the ClientKeyExchange message.
    fn build_key_exchange(&self) -> Result<(Vec<u8>, Vec<u8>), TlsError> {
        let params = self.params.as_ref().expect("params set by ServerHello");
        match params.kx_alg {
            KeyExchangeAlg::Rsa => {
                let mut pms = vec![0u8; 48];
                pms[0] = 0x03;
                pms[1] = 0x03;
                random_bytes(&mut pms[2..])?;

                let PublicKeyInfo::Rsa { n, e } = self.leaf_key()? else {
                    return Err(TlsError::IllegalParameter(
                        "RSA key exchange needs an RSA certificate key".into(),
                    ));
                };
                let key = ferro_crypto::rsa::RsaPublicKey::new(n, e)?;
                let encrypted = key.encrypt_pkcs1(&pms)?;
                Ok((pms, encode_cke_rsa(&encrypted)))
            }
            KeyExchangeAlg::Dhe => {
                let (p, g, ys) = self
                    .server_dh
                    .as_ref()
                    .ok_or_else(|| TlsError::HandshakeFailed("missing DHE parameters".into()))?;
                let dh_params = DhParams::new(p, g)?;
                let keypair = DhKeyPair::generate(&dh_params)?;
                let pms = keypair.compute_shared_secret(&dh_params, ys)?;
                let cke = encode_cke_dhe(keypair.public_key_bytes());
                Ok((pms, cke))
            }
            KeyExchangeAlg::Ecdhe => {
                let (curve, point) = self
                    .server_ecdh
                    .as_ref()
                    .ok_or_else(|| TlsError::HandshakeFailed("missing ECDHE parameters".into()))?;
                let keypair = EcdhKeyPair::generate(*curve)?;
                let pms = keypair.compute_shared_secret(point)?;
                let cke = encode_cke_ecdh(keypair.public_key_bytes());
                Ok((pms, cke))
            }
            KeyExchangeAlg::Ecdh => {
                // Static exchange against the certificate's point
                let PublicKeyInfo::Ec { curve, point } = self.leaf_key()? else {
                    return Err(TlsError::IllegalParameter(
                        "ECDH key exchange needs an EC certificate key".into(),
                    ));
                };
                let (curve, point) = (*curve, point.clone());
                let keypair = EcdhKeyPair::generate(curve)?;
                let pms = keypair.compute_shared_secret(&point)?;
                let cke = encode_cke_ecdh(keypair.public_key_bytes());
                Ok((pms, cke))
            }
        }
    }

    /// Select the client certificate chain to present, or an empty chain
    /// when nothing satisfies the request.
    fn select_client_chain(&self, request: &CertificateRequest) -> Vec<Vec<u8>> {
        let Some(ref key) = self.config.client_private_key else {
            return Vec::new();
        };
        if self.config.client_certificate_chain.is_empty() {
            return Vec::new();
        }
        if !key_satisfies_request(key, &request.cert_types, &request.sig_algs) {
            return Vec::new();
        }
        if !request.issuer_dns.is_empty() {
            let leaf_issuer = ferro_pki::Certificate::from_der(
                &self.config.client_certificate_chain[0],
            )
            .map(|c| c.issuer_raw)
            .unwrap_or_default();
            if !request.issuer_dns.iter().any(|dn| *dn == leaf_issuer) {
                return Vec::new();
            }
        }
        self.config.client_certificate_chain.clone()
    }

    fn process_server_hello_done(&mut self, raw: &[u8]) -> Result<ClientFlight, TlsError> {
        self.transcript.update(raw);

        // Optional client Certificate (possibly an empty chain)
        let client_chain = self
            .cert_request
            .as_ref()
            .map(|request| self.select_client_chain(request));
        let client_certificate = client_chain.as_ref().map(|chain| {
            let msg = encode_certificate(chain);
            self.transcript.update(&msg);
            msg
        });

        // ClientKeyExchange
        let (mut pms, cke) = self.build_key_exchange()?;
        self.transcript.update(&cke);

        // Master secret; the premaster dies here
        let params = self.params.as_ref().expect("params set by ServerHello");
        let prf_hash = params.prf_hash;
        let master_secret =
            derive_master_secret(prf_hash, &pms, &self.client_random, &self.server_random)?;
        pms.zeroize();
        debug_assert_eq!(master_secret.len(), MASTER_SECRET_LEN);

        let key_block = derive_key_block(
            &master_secret,
            &self.client_random,
            &self.server_random,
            params,
        )?;

        // CertificateVerify over the SHA-1 transcript so far, when we
        // actually presented a certificate
        let sent_client_cert = client_chain.map(|c| !c.is_empty()).unwrap_or(false);
        let certificate_verify = if sent_client_cert {
            let key = self
                .config
                .client_private_key
                .as_ref()
                .expect("chain selection requires a key");
            let sha1_transcript = self.transcript.hash_with(HashAlgId::Sha1);
            let (hash_alg, sig_alg, signature) = sign_certificate_verify(key, &sha1_transcript)?;
            let msg = encode_certificate_verify(hash_alg, sig_alg, &signature);
            self.transcript.update(&msg);
            Some(msg)
        } else {
            None
        };

        // Client Finished: the verify_data hashes everything up to but not
        // including the Finished message itself
        let transcript_hash = self.transcript.current_hash();
        let verify_data =
            compute_verify_data(prf_hash, &master_secret, "client finished", &transcript_hash)?;
        self.client_verify_data = verify_data.clone();
        let finished = encode_finished(&verify_data);
        // The server's Finished covers ours
        self.transcript.update(&finished);

        let keys = PendingKeys {
            suite: params.suite,
            is_cbc: params.is_cbc,
            mac_len: params.mac_len,
            client_write_mac_key: key_block.client_write_mac_key.clone(),
            server_write_mac_key: key_block.server_write_mac_key.clone(),
            client_write_key: key_block.client_write_key.clone(),
            server_write_key: key_block.server_write_key.clone(),
            client_write_iv: key_block.client_write_iv.clone(),
            server_write_iv: key_block.server_write_iv.clone(),
        };

        self.master_secret = master_secret;
        self.state = ClientHandshakeState::WaitChangeCipherSpec;

        Ok(ClientFlight {
            client_certificate,
            client_key_exchange: cke,
            certificate_verify,
            finished,
            keys,
        })
    }

    fn process_finished(&mut self, msg: &HandshakeMessage) -> Result<(), TlsError> {
        let params = self.params.as_ref().expect("params set by ServerHello");
        let transcript_hash = self.transcript.current_hash();
        let expected = compute_verify_data(
            params.prf_hash,
            &self.master_secret,
            "server finished",
            &transcript_hash,
        )?;

        if msg.body().ct_eq(expected.as_slice()).unwrap_u8() != 1 {
            return Err(TlsError::DecryptError(
                "server Finished verify_data mismatch".into(),
            ));
        }
        self.server_verify_data = msg.body().to_vec();

        // Handshake complete: the secrets scoped to it die now
        self.master_secret.zeroize();
        self.master_secret.clear();
        self.transcript.reset();
        self.server_dh = None;
        self.server_ecdh = None;
        self.cert_request = None;
        self.authenticated = true;
        self.is_renegotiation = false;
        self.state = ClientHandshakeState::Connected;
        Ok(())
    }
}
