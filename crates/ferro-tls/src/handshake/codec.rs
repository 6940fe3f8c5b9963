//! Handshake message encoding and decoding (RFC 5246 §7.4, RFC 4492).

use ferro_types::TlsError;

use super::extensions::{encode_extensions, parse_extensions, Extension};
use super::HandshakeType;
use crate::CipherSuite;

// ---------------------------------------------------------------------------
// Header helpers
// ---------------------------------------------------------------------------

/// Parse a handshake header: msg_type(1) || length(3).
/// Returns (type, body, total bytes consumed).
pub fn parse_handshake_header(data: &[u8]) -> Result<(HandshakeType, &[u8], usize), TlsError> {
    if data.len() < 4 {
        return Err(TlsError::DecodeError("handshake header too short".into()));
    }
    let msg_type = HandshakeType::from_u8(data[0])?;
    let length = read_u24(&data[1..]);
    let total = 4 + length;
    if data.len() < total {
        return Err(TlsError::DecodeError("handshake body truncated".into()));
    }
    Ok((msg_type, &data[4..total], total))
}

/// Wrap a body with the 4-byte handshake header.
pub fn wrap_handshake(msg_type: HandshakeType, body: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(4 + body.len());
    out.push(msg_type as u8);
    push_u24(&mut out, body.len());
    out.extend_from_slice(body);
    out
}

pub(crate) fn read_u24(data: &[u8]) -> usize {
    ((data[0] as usize) << 16) | ((data[1] as usize) << 8) | data[2] as usize
}

pub(crate) fn push_u24(buf: &mut Vec<u8>, value: usize) {
    buf.push((value >> 16) as u8);
    buf.push((value >> 8) as u8);
    buf.push(value as u8);
}

// ---------------------------------------------------------------------------
// ClientHello / ServerHello
// ---------------------------------------------------------------------------

/// ClientHello message.
#[derive(Debug, Clone)]
pub struct ClientHello {
    pub random: [u8; 32],
    pub session_id: Vec<u8>,
    pub cipher_suites: Vec<CipherSuite>,
    pub extensions: Vec<Extension>,
}

/// Encode a ClientHello as a complete handshake message.
pub fn encode_client_hello(ch: &ClientHello) -> Vec<u8> {
    let mut body = Vec::with_capacity(128);
    body.extend_from_slice(&0x0303u16.to_be_bytes());
    body.extend_from_slice(&ch.random);
    body.push(ch.session_id.len() as u8);
    body.extend_from_slice(&ch.session_id);

    body.extend_from_slice(&((ch.cipher_suites.len() * 2) as u16).to_be_bytes());
    for suite in &ch.cipher_suites {
        body.extend_from_slice(&suite.0.to_be_bytes());
    }

    // compression methods: null only
    body.push(1);
    body.push(0);

    let ext_data = encode_extensions(&ch.extensions);
    body.extend_from_slice(&(ext_data.len() as u16).to_be_bytes());
    body.extend_from_slice(&ext_data);

    wrap_handshake(HandshakeType::ClientHello, &body)
}

/// ServerHello message.
#[derive(Debug, Clone)]
pub struct ServerHello {
    pub version: u16,
    pub random: [u8; 32],
    pub session_id: Vec<u8>,
    pub cipher_suite: CipherSuite,
    pub compression: u8,
    pub extensions: Vec<Extension>,
}

/// Decode a ServerHello body.
pub fn decode_server_hello(body: &[u8]) -> Result<ServerHello, TlsError> {
    if body.len() < 2 + 32 + 1 {
        return Err(TlsError::DecodeError("ServerHello too short".into()));
    }
    let version = u16::from_be_bytes([body[0], body[1]]);
    let mut random = [0u8; 32];
    random.copy_from_slice(&body[2..34]);

    let sid_len = body[34] as usize;
    if sid_len > 32 || body.len() < 35 + sid_len + 3 {
        return Err(TlsError::DecodeError("ServerHello session_id invalid".into()));
    }
    let session_id = body[35..35 + sid_len].to_vec();
    let mut offset = 35 + sid_len;

    let cipher_suite = CipherSuite(u16::from_be_bytes([body[offset], body[offset + 1]]));
    let compression = body[offset + 2];
    offset += 3;

    let extensions = if offset == body.len() {
        Vec::new()
    } else {
        if body.len() < offset + 2 {
            return Err(TlsError::DecodeError("ServerHello extensions truncated".into()));
        }
        let ext_len = u16::from_be_bytes([body[offset], body[offset + 1]]) as usize;
        offset += 2;
        if body.len() != offset + ext_len {
            return Err(TlsError::DecodeError(
                "ServerHello extensions length mismatch".into(),
            ));
        }
        parse_extensions(&body[offset..])?
    };

    Ok(ServerHello {
        version,
        random,
        session_id,
        cipher_suite,
        compression,
        extensions,
    })
}

// ---------------------------------------------------------------------------
// Certificate
// ---------------------------------------------------------------------------

/// Encode a Certificate message from DER blobs, leaf first. An empty list
/// encodes as a zero-length certificate_list (client with no suitable
/// certificate).
pub fn encode_certificate(chain: &[Vec<u8>]) -> Vec<u8> {
    let total: usize = chain.iter().map(|c| 3 + c.len()).sum();
    let mut body = Vec::with_capacity(3 + total);
    push_u24(&mut body, total);
    for cert in chain {
        push_u24(&mut body, cert.len());
        body.extend_from_slice(cert);
    }
    wrap_handshake(HandshakeType::Certificate, &body)
}

/// Decode a Certificate body into DER blobs, leaf first.
pub fn decode_certificate(body: &[u8]) -> Result<Vec<Vec<u8>>, TlsError> {
    if body.len() < 3 {
        return Err(TlsError::DecodeError("Certificate too short".into()));
    }
    let total = read_u24(body);
    if body.len() != 3 + total {
        return Err(TlsError::DecodeError("Certificate length mismatch".into()));
    }

    let mut certs = Vec::new();
    let mut offset = 3;
    while offset < body.len() {
        if offset + 3 > body.len() {
            return Err(TlsError::DecodeError("Certificate entry truncated".into()));
        }
        let len = read_u24(&body[offset..]);
        offset += 3;
        if offset + len > body.len() {
            return Err(TlsError::DecodeError("Certificate data truncated".into()));
        }
        certs.push(body[offset..offset + len].to_vec());
        offset += len;
    }
    Ok(certs)
}

// ---------------------------------------------------------------------------
// ServerKeyExchange
// ---------------------------------------------------------------------------

/// ECDHE ServerKeyExchange (RFC 4492 §5.4).
#[derive(Debug, Clone)]
pub struct EcdheServerKeyExchange {
    pub curve_type: u8,
    pub named_curve: u16,
    pub public_point: Vec<u8>,
    pub hash_alg: u8,
    pub sig_alg: u8,
    pub signature: Vec<u8>,
}

/// The raw ServerKeyExchange params covered by the signature.
pub fn build_ecdhe_params(curve_type: u8, named_curve: u16, point: &[u8]) -> Vec<u8> {
    let mut params = Vec::with_capacity(4 + point.len());
    params.push(curve_type);
    params.extend_from_slice(&named_curve.to_be_bytes());
    params.push(point.len() as u8);
    params.extend_from_slice(point);
    params
}

/// Decode an ECDHE ServerKeyExchange body.
pub fn decode_ske_ecdhe(body: &[u8]) -> Result<EcdheServerKeyExchange, TlsError> {
    if body.len() < 4 {
        return Err(TlsError::DecodeError("ServerKeyExchange too short".into()));
    }
    let curve_type = body[0];
    if curve_type != 0x03 {
        return Err(TlsError::IllegalParameter(format!(
            "curve type {curve_type} is not named_curve"
        )));
    }
    let named_curve = u16::from_be_bytes([body[1], body[2]]);
    let point_len = body[3] as usize;
    if body.len() < 4 + point_len + 4 {
        return Err(TlsError::DecodeError("ServerKeyExchange truncated".into()));
    }
    let public_point = body[4..4 + point_len].to_vec();
    let offset = 4 + point_len;

    let hash_alg = body[offset];
    let sig_alg = body[offset + 1];
    let sig_len = u16::from_be_bytes([body[offset + 2], body[offset + 3]]) as usize;
    if body.len() != offset + 4 + sig_len {
        return Err(TlsError::DecodeError(
            "ServerKeyExchange signature truncated".into(),
        ));
    }
    let signature = body[offset + 4..].to_vec();

    Ok(EcdheServerKeyExchange {
        curve_type,
        named_curve,
        public_point,
        hash_alg,
        sig_alg,
        signature,
    })
}

/// DHE ServerKeyExchange (RFC 5246 §7.4.3).
#[derive(Debug, Clone)]
pub struct DheServerKeyExchange {
    pub p: Vec<u8>,
    pub g: Vec<u8>,
    pub ys: Vec<u8>,
    pub hash_alg: u8,
    pub sig_alg: u8,
    pub signature: Vec<u8>,
}

/// The raw DHE params covered by the signature.
pub fn build_dhe_params(p: &[u8], g: &[u8], ys: &[u8]) -> Vec<u8> {
    let mut params = Vec::with_capacity(6 + p.len() + g.len() + ys.len());
    for field in [p, g, ys] {
        params.extend_from_slice(&(field.len() as u16).to_be_bytes());
        params.extend_from_slice(field);
    }
    params
}

fn read_u16_vector<'a>(data: &'a [u8], offset: &mut usize) -> Result<&'a [u8], TlsError> {
    if data.len() < *offset + 2 {
        return Err(TlsError::DecodeError("vector length truncated".into()));
    }
    let len = u16::from_be_bytes([data[*offset], data[*offset + 1]]) as usize;
    *offset += 2;
    if data.len() < *offset + len {
        return Err(TlsError::DecodeError("vector data truncated".into()));
    }
    let out = &data[*offset..*offset + len];
    *offset += len;
    Ok(out)
}

/// Decode a DHE ServerKeyExchange body.
pub fn decode_ske_dhe(body: &[u8]) -> Result<DheServerKeyExchange, TlsError> {
    let mut offset = 0;
    let p = read_u16_vector(body, &mut offset)?.to_vec();
    let g = read_u16_vector(body, &mut offset)?.to_vec();
    let ys = read_u16_vector(body, &mut offset)?.to_vec();

    if body.len() < offset + 4 {
        return Err(TlsError::DecodeError("ServerKeyExchange truncated".into()));
    }
    let hash_alg = body[offset];
    let sig_alg = body[offset + 1];
    offset += 2;
    let signature = read_u16_vector(body, &mut offset)?.to_vec();
    if offset != body.len() {
        return Err(TlsError::DecodeError(
            "trailing bytes after ServerKeyExchange".into(),
        ));
    }

    Ok(DheServerKeyExchange {
        p,
        g,
        ys,
        hash_alg,
        sig_alg,
        signature,
    })
}

// ---------------------------------------------------------------------------
// CertificateRequest / ServerHelloDone
// ---------------------------------------------------------------------------

/// CertificateRequest contents (RFC 5246 §7.4.4).
#[derive(Debug, Clone)]
pub struct CertificateRequest {
    /// Acceptable client certificate types (1 = rsa_sign, 2 = dss_sign, ...).
    pub cert_types: Vec<u8>,
    /// Acceptable (hash, signature) pairs.
    pub sig_algs: Vec<(u8, u8)>,
    /// Acceptable certificate authority DNs, DER-encoded.
    pub issuer_dns: Vec<Vec<u8>>,
}

/// Decode a CertificateRequest body.
pub fn decode_certificate_request(body: &[u8]) -> Result<CertificateRequest, TlsError> {
    if body.is_empty() {
        return Err(TlsError::DecodeError("CertificateRequest too short".into()));
    }
    let types_len = body[0] as usize;
    if body.len() < 1 + types_len {
        return Err(TlsError::DecodeError("certificate_types truncated".into()));
    }
    let cert_types = body[1..1 + types_len].to_vec();
    let mut offset = 1 + types_len;

    let algs = read_u16_vector(body, &mut offset)?;
    if algs.len() % 2 != 0 {
        return Err(TlsError::DecodeError(
            "odd supported_signature_algorithms length".into(),
        ));
    }
    let sig_algs = algs.chunks(2).map(|c| (c[0], c[1])).collect();

    let dns_block = read_u16_vector(body, &mut offset)?;
    if offset != body.len() {
        return Err(TlsError::DecodeError(
            "trailing bytes after CertificateRequest".into(),
        ));
    }
    let mut issuer_dns = Vec::new();
    let mut dn_offset = 0;
    while dn_offset < dns_block.len() {
        let dn = read_u16_vector(dns_block, &mut dn_offset)?;
        issuer_dns.push(dn.to_vec());
    }

    Ok(CertificateRequest {
        cert_types,
        sig_algs,
        issuer_dns,
    })
}

// ---------------------------------------------------------------------------
// ClientKeyExchange / CertificateVerify / Finished / HelloRequest
// ---------------------------------------------------------------------------

/// RSA ClientKeyExchange: 2-byte length-prefixed EncryptedPreMasterSecret.
pub fn encode_cke_rsa(encrypted_pms: &[u8]) -> Vec<u8> {
    let mut body = Vec::with_capacity(2 + encrypted_pms.len());
    body.extend_from_slice(&(encrypted_pms.len() as u16).to_be_bytes());
    body.extend_from_slice(encrypted_pms);
    wrap_handshake(HandshakeType::ClientKeyExchange, &body)
}

/// DHE ClientKeyExchange: 2-byte length-prefixed dh_Yc.
pub fn encode_cke_dhe(dh_yc: &[u8]) -> Vec<u8> {
    let mut body = Vec::with_capacity(2 + dh_yc.len());
    body.extend_from_slice(&(dh_yc.len() as u16).to_be_bytes());
    body.extend_from_slice(dh_yc);
    wrap_handshake(HandshakeType::ClientKeyExchange, &body)
}

/// ECDHE/ECDH ClientKeyExchange: 1-byte length-prefixed uncompressed point.
pub fn encode_cke_ecdh(point: &[u8]) -> Vec<u8> {
    let mut body = Vec::with_capacity(1 + point.len());
    body.push(point.len() as u8);
    body.extend_from_slice(point);
    wrap_handshake(HandshakeType::ClientKeyExchange, &body)
}

/// CertificateVerify: hash_alg(1) || sig_alg(1) || length(2) || signature.
pub fn encode_certificate_verify(hash_alg: u8, sig_alg: u8, signature: &[u8]) -> Vec<u8> {
    let mut body = Vec::with_capacity(4 + signature.len());
    body.push(hash_alg);
    body.push(sig_alg);
    body.extend_from_slice(&(signature.len() as u16).to_be_bytes());
    body.extend_from_slice(signature);
    wrap_handshake(HandshakeType::CertificateVerify, &body)
}

/// Finished carrying the 12-byte verify_data.
pub fn encode_finished(verify_data: &[u8]) -> Vec<u8> {
    wrap_handshake(HandshakeType::Finished, verify_data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handshake::extensions::build_renegotiation_info;

    #[test]
    fn test_header_roundtrip() {
        let msg = wrap_handshake(HandshakeType::Finished, &[0xAA; 12]);
        let (msg_type, body, total) = parse_handshake_header(&msg).unwrap();
        assert_eq!(msg_type, HandshakeType::Finished);
        assert_eq!(body, &[0xAA; 12]);
        assert_eq!(total, 16);
    }

    #[test]
    fn test_header_rejects_truncation() {
        assert!(parse_handshake_header(&[20, 0, 0]).is_err());
        assert!(parse_handshake_header(&[20, 0, 0, 12, 0xAA]).is_err());
    }

    #[test]
    fn test_client_hello_layout() {
        let ch = ClientHello {
            random: [0x11; 32],
            session_id: Vec::new(),
            cipher_suites: vec![
                CipherSuite::TLS_ECDHE_RSA_WITH_AES_128_GCM_SHA256,
                CipherSuite::TLS_RSA_WITH_AES_128_CBC_SHA,
            ],
            extensions: vec![build_renegotiation_info(&[])],
        };
        let msg = encode_client_hello(&ch);
        let (msg_type, body, _) = parse_handshake_header(&msg).unwrap();
        assert_eq!(msg_type, HandshakeType::ClientHello);

        // version {3,3}
        assert_eq!(&body[..2], &[0x03, 0x03]);
        // random
        assert_eq!(&body[2..34], &[0x11; 32]);
        // empty session id
        assert_eq!(body[34], 0);
        // two suites
        assert_eq!(&body[35..37], &[0x00, 0x04]);
        assert_eq!(&body[37..39], &[0xC0, 0x2F]);
        assert_eq!(&body[39..41], &[0x00, 0x2F]);
        // null compression only
        assert_eq!(&body[41..43], &[0x01, 0x00]);
    }

    #[test]
    fn test_server_hello_roundtrip() {
        // Handcraft a ServerHello body
        let mut body = Vec::new();
        body.extend_from_slice(&[0x03, 0x03]);
        body.extend_from_slice(&[0x22; 32]);
        body.push(0); // empty session id
        body.extend_from_slice(&[0xC0, 0x2F]);
        body.push(0); // null compression
        let exts = crate::handshake::extensions::encode_extensions(&[build_renegotiation_info(
            &[],
        )]);
        body.extend_from_slice(&(exts.len() as u16).to_be_bytes());
        body.extend_from_slice(&exts);

        let sh = decode_server_hello(&body).unwrap();
        assert_eq!(sh.version, 0x0303);
        assert_eq!(sh.random, [0x22; 32]);
        assert!(sh.session_id.is_empty());
        assert_eq!(
            sh.cipher_suite,
            CipherSuite::TLS_ECDHE_RSA_WITH_AES_128_GCM_SHA256
        );
        assert_eq!(sh.compression, 0);
        assert_eq!(sh.extensions.len(), 1);
    }

    #[test]
    fn test_server_hello_without_extensions() {
        let mut body = Vec::new();
        body.extend_from_slice(&[0x03, 0x03]);
        body.extend_from_slice(&[0x22; 32]);
        body.push(0);
        body.extend_from_slice(&[0x00, 0x2F]);
        body.push(0);
        let sh = decode_server_hello(&body).unwrap();
        assert!(sh.extensions.is_empty());
    }

    #[test]
    fn test_certificate_roundtrip() {
        let chain = vec![vec![0x30, 0x82, 0x01, 0x00], vec![0x30, 0x82, 0x02, 0x00]];
        let msg = encode_certificate(&chain);
        let (msg_type, body, _) = parse_handshake_header(&msg).unwrap();
        assert_eq!(msg_type, HandshakeType::Certificate);
        assert_eq!(decode_certificate(body).unwrap(), chain);
    }

    #[test]
    fn test_empty_certificate() {
        let msg = encode_certificate(&[]);
        let (_, body, _) = parse_handshake_header(&msg).unwrap();
        assert_eq!(body, &[0, 0, 0]);
        assert!(decode_certificate(body).unwrap().is_empty());
    }

    #[test]
    fn test_ske_ecdhe_roundtrip() {
        let params = build_ecdhe_params(3, 0x0017, &[0x04; 65]);
        let mut body = params.clone();
        body.push(4); // sha256
        body.push(1); // rsa
        body.extend_from_slice(&(128u16).to_be_bytes());
        body.extend_from_slice(&[0xAA; 128]);

        let ske = decode_ske_ecdhe(&body).unwrap();
        assert_eq!(ske.curve_type, 3);
        assert_eq!(ske.named_curve, 0x0017);
        assert_eq!(ske.public_point, vec![0x04; 65]);
        assert_eq!(ske.hash_alg, 4);
        assert_eq!(ske.sig_alg, 1);
        assert_eq!(ske.signature, vec![0xAA; 128]);
    }

    #[test]
    fn test_ske_ecdhe_rejects_explicit_curve() {
        // curve_type 1 (explicit_prime) is unsupported
        let body = [1u8, 0x00, 0x17, 0x01, 0x04, 0, 0, 0, 0];
        assert!(matches!(
            decode_ske_ecdhe(&body),
            Err(TlsError::IllegalParameter(_))
        ));
    }

    #[test]
    fn test_ske_dhe_roundtrip() {
        let p = vec![0xFF; 256];
        let g = vec![0x02];
        let ys = vec![0xCD; 256];
        let mut body = build_dhe_params(&p, &g, &ys);
        body.push(2); // sha1
        body.push(2); // dsa
        body.extend_from_slice(&(46u16).to_be_bytes());
        body.extend_from_slice(&[0xEE; 46]);

        let ske = decode_ske_dhe(&body).unwrap();
        assert_eq!(ske.p, p);
        assert_eq!(ske.g, g);
        assert_eq!(ske.ys, ys);
        assert_eq!(ske.hash_alg, 2);
        assert_eq!(ske.sig_alg, 2);
        assert_eq!(ske.signature.len(), 46);
    }

    #[test]
    fn test_certificate_request_decode() {
        let mut body = vec![2u8, 1, 2]; // rsa_sign, dss_sign
        body.extend_from_slice(&[0x00, 0x04, 4, 1, 2, 2]); // sha256/rsa, sha1/dsa
        // one DN of 5 bytes inside the DN block
        body.extend_from_slice(&[0x00, 0x07, 0x00, 0x05, 0x30, 0x03, 0x31, 0x01, 0x00]);

        let cr = decode_certificate_request(&body).unwrap();
        assert_eq!(cr.cert_types, vec![1, 2]);
        assert_eq!(cr.sig_algs, vec![(4, 1), (2, 2)]);
        assert_eq!(cr.issuer_dns.len(), 1);
        assert_eq!(cr.issuer_dns[0].len(), 5);
    }

    #[test]
    fn test_cke_encodings() {
        let rsa = encode_cke_rsa(&[0xAA; 256]);
        let (_, body, _) = parse_handshake_header(&rsa).unwrap();
        assert_eq!(body.len(), 258);
        assert_eq!(&body[..2], &[0x01, 0x00]);

        let ec = encode_cke_ecdh(&[0x04; 65]);
        let (_, body, _) = parse_handshake_header(&ec).unwrap();
        assert_eq!(body.len(), 66);
        assert_eq!(body[0], 65);

        let dhe = encode_cke_dhe(&[0xBB; 256]);
        let (_, body, _) = parse_handshake_header(&dhe).unwrap();
        assert_eq!(body.len(), 258);
    }

    #[test]
    fn test_certificate_verify_layout() {
        let msg = encode_certificate_verify(2, 1, &[0xCC; 96]);
        let (msg_type, body, _) = parse_handshake_header(&msg).unwrap();
        assert_eq!(msg_type, HandshakeType::CertificateVerify);
        assert_eq!(body[0], 2);
        assert_eq!(body[1], 1);
        assert_eq!(&body[2..4], &[0x00, 0x60]);
        assert_eq!(body.len(), 4 + 96);
    }

    #[test]
    fn test_finished_layout() {
        let msg = encode_finished(&[0xAB; 12]);
        assert_eq!(msg.len(), 16);
        let (msg_type, body, _) = parse_handshake_header(&msg).unwrap();
        assert_eq!(msg_type, HandshakeType::Finished);
        assert_eq!(body, &[0xAB; 12]);
    }
}
