//! End-to-end handshake tests against a scripted in-process server.
//!
//! The server side is assembled from the crate's own record layer and key
//! schedule, driven lockstep through an in-memory transport: every client
//! write is processed immediately and the response queued for the next
//! client read.

use std::collections::VecDeque;
use std::io::{Read, Write};

use ferro_crypto::ecdh::{EcCurveId, EcdhKeyPair};
use ferro_crypto::hash::HashAlgId;
use ferro_tls::config::TlsConfig;
use ferro_tls::connection::{ConnectionState, TlsClientConnection};
use ferro_tls::crypt::key_schedule::{compute_verify_data, derive_key_block, derive_master_secret};
use ferro_tls::crypt::CipherSuiteParams;
use ferro_tls::handshake::codec::{build_ecdhe_params, wrap_handshake};
use ferro_tls::handshake::extensions::{build_renegotiation_info, encode_extensions, Extension};
use ferro_tls::record::{ContentType, RecordLayer};
use ferro_tls::{CipherSuite, TlsError};

// ---------------------------------------------------------------------------
// Scripted server
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ServerState {
    ExpectClientHello,
    ExpectClientFlight,
    Established,
}

struct ScriptedServer {
    suite: CipherSuite,
    params: CipherSuiteParams,
    record: RecordLayer,
    out: VecDeque<u8>,
    in_buf: Vec<u8>,
    hs_buf: Vec<u8>,
    state: ServerState,
    transcript: Vec<u8>,
    client_random: [u8; 32],
    server_random: [u8; 32],
    ecdh: Option<EcdhKeyPair>,
    master_secret: Vec<u8>,
    client_verify_data: Vec<u8>,
    server_verify_data: Vec<u8>,
    /// Keys derived at ClientKeyExchange, adopted at the CCS fences.
    keys: Option<ferro_tls::crypt::key_schedule::KeyBlock>,
    in_renegotiation: bool,
    renegotiations_completed: usize,
    send_after_reneg: bool,
}

impl ScriptedServer {
    fn new(suite: CipherSuite) -> Self {
        let params = CipherSuiteParams::from_suite(suite).unwrap();
        Self {
            suite,
            params,
            record: RecordLayer::new(),
            out: VecDeque::new(),
            in_buf: Vec::new(),
            hs_buf: Vec::new(),
            state: ServerState::ExpectClientHello,
            transcript: Vec::new(),
            client_random: [0u8; 32],
            server_random: [0u8; 32],
            ecdh: None,
            master_secret: Vec::new(),
            client_verify_data: Vec::new(),
            server_verify_data: Vec::new(),
            keys: None,
            in_renegotiation: false,
            renegotiations_completed: 0,
            send_after_reneg: false,
        }
    }

    fn prf_hash(&self) -> HashAlgId {
        self.params.prf_hash
    }

    fn push_record(&mut self, content_type: ContentType, payload: &[u8]) {
        let wire = self.record.seal_record(content_type, payload).unwrap();
        self.out.extend(wire);
    }

    fn push_handshake(&mut self, msg: Vec<u8>) {
        self.transcript.extend_from_slice(&msg);
        self.push_record(ContentType::Handshake, &msg);
    }

    fn queue_hello_request(&mut self) {
        let hr = wrap_handshake(ferro_tls::handshake::HandshakeType::HelloRequest, &[]);
        self.push_record(ContentType::Handshake, &hr);
    }

    fn on_client_bytes(&mut self, bytes: &[u8]) {
        self.in_buf.extend_from_slice(bytes);
        loop {
            if self.in_buf.len() < 5 {
                break;
            }
            let length = u16::from_be_bytes([self.in_buf[3], self.in_buf[4]]) as usize;
            if self.in_buf.len() < 5 + length {
                break;
            }
            let (content_type, payload, consumed) =
                self.record.open_record(&self.in_buf).unwrap();
            self.in_buf.drain(..consumed);
            self.handle_record(content_type, payload);
        }
    }

    fn handle_record(&mut self, content_type: ContentType, payload: Vec<u8>) {
        match content_type {
            ContentType::Handshake => {
                self.hs_buf.extend_from_slice(&payload);
                loop {
                    if self.hs_buf.len() < 4 {
                        break;
                    }
                    let length = ((self.hs_buf[1] as usize) << 16)
                        | ((self.hs_buf[2] as usize) << 8)
                        | self.hs_buf[3] as usize;
                    if self.hs_buf.len() < 4 + length {
                        break;
                    }
                    let msg: Vec<u8> = self.hs_buf.drain(..4 + length).collect();
                    self.handle_handshake(msg);
                }
            }
            ContentType::ChangeCipherSpec => {
                assert_eq!(payload, [0x01]);
                let keys = self.keys.as_ref().expect("CCS before ClientKeyExchange");
                if self.params.is_cbc {
                    self.record.activate_read_cbc(
                        keys.client_write_key.clone(),
                        keys.client_write_mac_key.clone(),
                        self.params.mac_len,
                    );
                } else {
                    self.record
                        .activate_read_gcm(&keys.client_write_key, keys.client_write_iv.clone())
                        .unwrap();
                }
            }
            ContentType::ApplicationData => {
                assert_eq!(self.state, ServerState::Established);
                // Echo back
                self.push_record(ContentType::ApplicationData, &payload);
            }
            ContentType::Alert => {
                // Orderly shutdown: answer close_notify in kind
                if payload == [1, 0] {
                    self.push_record(ContentType::Alert, &[1, 0]);
                }
            }
        }
    }

    fn handle_handshake(&mut self, msg: Vec<u8>) {
        match (self.state, msg[0]) {
            // ClientHello: initial or renegotiation
            (ServerState::ExpectClientHello, 1) | (ServerState::Established, 1) => {
                let renegotiating = self.state == ServerState::Established;
                let (client_random, reneg_info) = parse_client_hello(&msg);
                if renegotiating {
                    assert_eq!(
                        reneg_info.as_deref(),
                        Some(&self.client_verify_data[..]),
                        "renegotiation_info must carry the prior client verify_data"
                    );
                    self.transcript.clear();
                } else {
                    assert_eq!(reneg_info.as_deref(), Some(&[][..]));
                }
                self.client_random = client_random;
                self.in_renegotiation = renegotiating;
                self.transcript.extend_from_slice(&msg);
                self.send_server_flight(renegotiating);
                self.state = ServerState::ExpectClientFlight;
            }
            // ClientKeyExchange
            (ServerState::ExpectClientFlight, 16) => {
                let body = &msg[4..];
                let point_len = body[0] as usize;
                let point = &body[1..1 + point_len];
                let pms = self
                    .ecdh
                    .as_ref()
                    .unwrap()
                    .compute_shared_secret(point)
                    .unwrap();
                self.transcript.extend_from_slice(&msg);

                self.master_secret = derive_master_secret(
                    self.prf_hash(),
                    &pms,
                    &self.client_random,
                    &self.server_random,
                )
                .unwrap();
                self.keys = Some(
                    derive_key_block(
                        &self.master_secret,
                        &self.client_random,
                        &self.server_random,
                        &self.params,
                    )
                    .unwrap(),
                );
            }
            // Client Finished (arrives after the client's CCS)
            (ServerState::ExpectClientFlight, 20) => {
                let transcript_hash = self.prf_hash().digest(&self.transcript);
                let expected = compute_verify_data(
                    self.prf_hash(),
                    &self.master_secret,
                    "client finished",
                    &transcript_hash,
                )
                .unwrap();
                assert_eq!(&msg[4..], &expected[..], "client verify_data mismatch");
                self.client_verify_data = expected;
                self.transcript.extend_from_slice(&msg);

                // CCS, switch write keys, Finished
                self.push_record(ContentType::ChangeCipherSpec, &[0x01]);
                let keys = self.keys.as_ref().unwrap();
                if self.params.is_cbc {
                    self.record.activate_write_cbc(
                        keys.server_write_key.clone(),
                        keys.server_write_mac_key.clone(),
                        self.params.mac_len,
                    );
                } else {
                    self.record
                        .activate_write_gcm(&keys.server_write_key, keys.server_write_iv.clone())
                        .unwrap();
                }

                let transcript_hash = self.prf_hash().digest(&self.transcript);
                let verify_data = compute_verify_data(
                    self.prf_hash(),
                    &self.master_secret,
                    "server finished",
                    &transcript_hash,
                )
                .unwrap();
                self.server_verify_data = verify_data.clone();
                let finished = wrap_handshake(
                    ferro_tls::handshake::HandshakeType::Finished,
                    &verify_data,
                );
                self.push_handshake(finished);

                self.state = ServerState::Established;
                if self.in_renegotiation {
                    self.in_renegotiation = false;
                    self.renegotiations_completed += 1;
                    if self.send_after_reneg {
                        self.send_after_reneg = false;
                        self.push_record(ContentType::ApplicationData, b"post-reneg");
                    }
                }
            }
            (state, msg_type) => panic!("server got handshake type {msg_type} in {state:?}"),
        }
    }

    fn send_server_flight(&mut self, renegotiating: bool) {
        self.server_random = if renegotiating { [0x66u8; 32] } else { [0x5Au8; 32] };

        // ServerHello with renegotiation_info
        let reneg_value = if renegotiating {
            let mut value = self.client_verify_data.clone();
            value.extend_from_slice(&self.server_verify_data);
            value
        } else {
            Vec::new()
        };
        let extensions: Vec<Extension> = vec![build_renegotiation_info(&reneg_value)];
        let mut body = Vec::new();
        body.extend_from_slice(&[0x03, 0x03]);
        body.extend_from_slice(&self.server_random);
        body.push(0);
        body.extend_from_slice(&self.suite.0.to_be_bytes());
        body.push(0);
        let ext = encode_extensions(&extensions);
        body.extend_from_slice(&(ext.len() as u16).to_be_bytes());
        body.extend_from_slice(&ext);
        let sh = wrap_handshake(ferro_tls::handshake::HandshakeType::ServerHello, &body);
        self.push_handshake(sh);

        // Certificate: opaque bytes; the client runs without verification
        let mut cert_body = Vec::new();
        let dummy = [0x30u8, 0x03, 0x02, 0x01, 0x01];
        let total = 3 + dummy.len();
        cert_body.extend_from_slice(&[(total >> 16) as u8, (total >> 8) as u8, total as u8]);
        cert_body.extend_from_slice(&[0x00, 0x00, dummy.len() as u8]);
        cert_body.extend_from_slice(&dummy);
        let cert = wrap_handshake(ferro_tls::handshake::HandshakeType::Certificate, &cert_body);
        self.push_handshake(cert);

        // ServerKeyExchange: fresh P-256 key, placeholder signature
        let ecdh = EcdhKeyPair::generate(EcCurveId::P256).unwrap();
        let mut ske_body = build_ecdhe_params(3, 0x0017, ecdh.public_key_bytes());
        ske_body.push(4); // sha256
        ske_body.push(1); // rsa
        ske_body.extend_from_slice(&(64u16).to_be_bytes());
        ske_body.extend_from_slice(&[0xAA; 64]);
        self.ecdh = Some(ecdh);
        let ske = wrap_handshake(
            ferro_tls::handshake::HandshakeType::ServerKeyExchange,
            &ske_body,
        );
        self.push_handshake(ske);

        // ServerHelloDone
        let done = wrap_handshake(ferro_tls::handshake::HandshakeType::ServerHelloDone, &[]);
        self.push_handshake(done);
    }
}

/// Extract client_random and the renegotiation_info value from a raw
/// ClientHello handshake message.
fn parse_client_hello(msg: &[u8]) -> ([u8; 32], Option<Vec<u8>>) {
    let body = &msg[4..];
    let mut random = [0u8; 32];
    random.copy_from_slice(&body[2..34]);

    let sid_len = body[34] as usize;
    let mut i = 35 + sid_len;
    let suites_len = u16::from_be_bytes([body[i], body[i + 1]]) as usize;
    i += 2 + suites_len;
    let comp_len = body[i] as usize;
    i += 1 + comp_len;

    let mut reneg = None;
    if i + 2 <= body.len() {
        i += 2; // extensions length
        while i + 4 <= body.len() {
            let ext_type = u16::from_be_bytes([body[i], body[i + 1]]);
            let len = u16::from_be_bytes([body[i + 2], body[i + 3]]) as usize;
            let data = &body[i + 4..i + 4 + len];
            if ext_type == 0xFF01 {
                reneg = Some(data[1..].to_vec());
            }
            i += 4 + len;
        }
    }
    (random, reneg)
}

// ---------------------------------------------------------------------------
// In-memory transport
// ---------------------------------------------------------------------------

struct ServerChannel {
    server: ScriptedServer,
}

impl Read for ServerChannel {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let n = buf.len().min(self.server.out.len());
        for slot in buf.iter_mut().take(n) {
            *slot = self.server.out.pop_front().expect("length checked");
        }
        Ok(n)
    }
}

impl Write for ServerChannel {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.server.on_client_bytes(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

fn client_config(suite: CipherSuite) -> TlsConfig {
    TlsConfig::builder()
        .cipher_suites(vec![suite])
        .verify_peer(false)
        .build()
}

fn connect(
    suite: CipherSuite,
) -> TlsClientConnection<ServerChannel> {
    let channel = ServerChannel {
        server: ScriptedServer::new(suite),
    };
    let mut conn = TlsClientConnection::new(channel, client_config(suite));
    conn.perform_handshake().unwrap();
    conn
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[test]
fn test_ecdhe_gcm_handshake_and_echo() {
    let mut conn = connect(CipherSuite::TLS_ECDHE_RSA_WITH_AES_128_GCM_SHA256);
    assert_eq!(conn.state(), ConnectionState::Connected);
    assert_eq!(
        conn.cipher_suite(),
        Some(CipherSuite::TLS_ECDHE_RSA_WITH_AES_128_GCM_SHA256)
    );
    assert!(conn.is_secure_renegotiation());
    assert_eq!(conn.local_verify_data().len(), 12);
    assert_eq!(conn.peer_verify_data().len(), 12);

    conn.write(b"hello").unwrap();
    let mut buf = [0u8; 64];
    let n = conn.read(&mut buf).unwrap();
    assert_eq!(&buf[..n], b"hello");
}

#[test]
fn test_ecdhe_cbc_handshake_and_echo() {
    let mut conn = connect(CipherSuite::TLS_ECDHE_RSA_WITH_AES_128_CBC_SHA);
    conn.write(b"cbc payload over the record layer").unwrap();
    let mut buf = [0u8; 64];
    let n = conn.read(&mut buf).unwrap();
    assert_eq!(&buf[..n], b"cbc payload over the record layer");
}

#[test]
fn test_ecdhe_cbc_sha384_handshake() {
    // SHA-384 PRF and HMAC-SHA384 record MAC
    let mut conn = connect(CipherSuite::TLS_ECDHE_RSA_WITH_AES_256_CBC_SHA384);
    conn.write(b"sha384 suite").unwrap();
    let mut buf = [0u8; 64];
    let n = conn.read(&mut buf).unwrap();
    assert_eq!(&buf[..n], b"sha384 suite");
}

#[test]
fn test_large_write_is_fragmented() {
    let mut conn = connect(CipherSuite::TLS_ECDHE_RSA_WITH_AES_128_GCM_SHA256);
    // Over one record of payload: the write splits, the echo comes back in
    // multiple records
    let payload: Vec<u8> = (0..40_000u32).map(|i| i as u8).collect();
    conn.write(&payload).unwrap();

    let mut received = Vec::new();
    let mut buf = [0u8; 16 * 1024];
    while received.len() < payload.len() {
        let n = conn.read(&mut buf).unwrap();
        assert!(n > 0);
        received.extend_from_slice(&buf[..n]);
    }
    assert_eq!(received, payload);
}

#[test]
fn test_partial_reads_drain_buffered_plaintext() {
    let mut conn = connect(CipherSuite::TLS_ECDHE_RSA_WITH_AES_128_GCM_SHA256);
    conn.write(b"buffered read data").unwrap();

    let mut first = [0u8; 8];
    let n = conn.read(&mut first).unwrap();
    assert_eq!(&first[..n], b"buffered");
    assert!(conn.has_buffered_read_data());

    let mut rest = [0u8; 32];
    let n = conn.read(&mut rest).unwrap();
    assert_eq!(&rest[..n], b" read data");
}

#[test]
fn test_renegotiation_via_hello_request() {
    let mut conn = connect(CipherSuite::TLS_ECDHE_RSA_WITH_AES_128_GCM_SHA256);
    conn.write(b"before").unwrap();
    let mut buf = [0u8; 64];
    let n = conn.read(&mut buf).unwrap();
    assert_eq!(&buf[..n], b"before");

    let prior_client_vd = conn.local_verify_data().to_vec();

    // The server asks for a new handshake and promises data afterwards
    conn.get_mut().server.send_after_reneg = true;
    conn.get_mut().server.queue_hello_request();

    // The next read drives the renegotiation to completion and then
    // surfaces the post-handshake data
    let n = conn.read(&mut buf).unwrap();
    assert_eq!(&buf[..n], b"post-reneg");
    assert_eq!(conn.state(), ConnectionState::Connected);
    assert_eq!(conn.get_ref().server.renegotiations_completed, 1);

    // New keys, new verify_data
    assert_ne!(conn.local_verify_data(), &prior_client_vd[..]);

    // The rekeyed connection still carries data both ways
    conn.write(b"after").unwrap();
    let n = conn.read(&mut buf).unwrap();
    assert_eq!(&buf[..n], b"after");
}

#[test]
fn test_false_start_write_before_server_finished() {
    let suite = CipherSuite::TLS_ECDHE_RSA_WITH_AES_128_GCM_SHA256;
    let channel = ServerChannel {
        server: ScriptedServer::new(suite),
    };
    let config = TlsConfig::builder()
        .cipher_suites(vec![suite])
        .verify_peer(false)
        .enable_false_start(true)
        .build();
    let mut conn = TlsClientConnection::new(channel, config);
    conn.perform_handshake().unwrap();

    // The handshake returned before the server Finished was read
    assert_ne!(conn.state(), ConnectionState::Connected);

    conn.write(b"early data").unwrap();
    let mut buf = [0u8; 64];
    let n = conn.read(&mut buf).unwrap();
    assert_eq!(&buf[..n], b"early data");
    assert_eq!(conn.state(), ConnectionState::Connected);
}

#[test]
fn test_close_notify_exchange() {
    let mut conn = connect(CipherSuite::TLS_ECDHE_RSA_WITH_AES_128_GCM_SHA256);
    conn.write(b"goodbye").unwrap();
    conn.close().unwrap();
    assert_eq!(conn.state(), ConnectionState::Closed);
    // Reading after orderly closure reports end of stream
    let mut buf = [0u8; 8];
    assert!(matches!(conn.read(&mut buf), Ok(0) | Err(TlsError::ConnectionClosed)));
}

#[test]
fn test_server_close_notify_yields_eof() {
    let mut conn = connect(CipherSuite::TLS_ECDHE_RSA_WITH_AES_128_GCM_SHA256);
    // Server closes: queue a close_notify alert
    let wire = conn
        .get_mut()
        .server
        .record
        .seal_record(ContentType::Alert, &[1, 0])
        .unwrap();
    conn.get_mut().server.out.extend(wire);

    let mut buf = [0u8; 8];
    assert_eq!(conn.read(&mut buf).unwrap(), 0);
    assert_eq!(conn.state(), ConnectionState::Closed);
}

#[test]
fn test_rsa_client_key_exchange_shape() {
    // A 2048-bit modulus yields a 256-byte EncryptedPreMasterSecret and a
    // 258-byte ClientKeyExchange body (2-byte length prefix included).
    use num_bigint::BigUint;
    let one = BigUint::from(1u8);
    let n = (&one << 2047usize) + 1u8;
    let key =
        ferro_crypto::rsa::RsaPublicKey::new(&n.to_bytes_be(), &[0x01, 0x00, 0x01]).unwrap();
    assert_eq!(key.modulus_len(), 256);

    let mut pms = vec![0u8; 48];
    pms[0] = 0x03;
    pms[1] = 0x03;
    let encrypted = key.encrypt_pkcs1(&pms).unwrap();
    assert_eq!(encrypted.len(), 256);

    let cke = ferro_tls::handshake::codec::encode_cke_rsa(&encrypted);
    // 4-byte handshake header + 258-byte body
    assert_eq!(cke.len(), 4 + 258);
    assert_eq!(&cke[4..6], &[0x01, 0x00]);
}

#[test]
fn test_p256_deterministic_public_point() {
    // Scalar 1 yields the P-256 generator as the public point
    let mut scalar = [0u8; 32];
    scalar[31] = 1;
    let kp = EcdhKeyPair::from_scalar_bytes(EcCurveId::P256, &scalar).unwrap();
    let point = kp.public_key_bytes();
    assert_eq!(point.len(), 65);
    assert_eq!(point[0], 0x04);
    let gx = "6b17d1f2e12c4247f8bce6e563a440f277037d812deb33a0f4a13945d898c296";
    let gx_bytes: Vec<u8> = (0..gx.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&gx[i..i + 2], 16).unwrap())
        .collect();
    assert_eq!(&point[1..33], &gx_bytes[..]);
}
