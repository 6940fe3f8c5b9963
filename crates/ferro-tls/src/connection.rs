//! Connection controller: record dispatch, renegotiation, closure.
//!
//! Owns the transport, the record layer, and the handshake engine. One
//! logical caller at a time; all blocking happens wherever the transport
//! blocks.

use std::collections::VecDeque;
use std::io::{Read, Write};

use ferro_types::TlsError;
use zeroize::Zeroize;

use crate::alert::{alert_for_error, Alert, AlertDescription, AlertLevel};
use crate::config::TlsConfig;
use crate::handshake::buffer::{HandshakeBuffer, HelloRequestPolicy};
use crate::handshake::client::{ClientFlight, ClientHandshake, ClientHandshakeState};
use crate::handshake::HandshakeType;
use crate::record::{
    ContentType, RecordLayer, MAX_CIPHERTEXT_LENGTH, MAX_PLAINTEXT_LENGTH, RECORD_HEADER_LEN,
};
use crate::CipherSuite;

/// Bound on application data buffered while the controller drives a
/// handshake.
const MAX_BUFFERED_APP_DATA: usize = 10 * 1024 * 1024;

/// Connection lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Handshaking,
    Connected,
    Renegotiating,
    Closed,
}

/// Read-direction keys parked between sending our ChangeCipherSpec and
/// receiving the server's.
struct PendingReadKeys {
    is_cbc: bool,
    mac_len: usize,
    key: Vec<u8>,
    mac_key: Vec<u8>,
    iv: Vec<u8>,
}

impl Drop for PendingReadKeys {
    fn drop(&mut self) {
        self.key.zeroize();
        self.mac_key.zeroize();
        self.iv.zeroize();
    }
}

enum AlertOutcome {
    CloseNotify,
    Ignored,
}

/// A synchronous TLS 1.2 client connection over any blocking transport.
pub struct TlsClientConnection<S: Read + Write> {
    stream: S,
    config: TlsConfig,
    record_layer: RecordLayer,
    hs: ClientHandshake,
    hs_buffer: HandshakeBuffer,
    state: ConnectionState,
    pending_read_keys: Option<PendingReadKeys>,
    /// Raw transport bytes not yet consumed as records.
    read_buf: Vec<u8>,
    /// Plaintext left over from a partially consumed application record.
    plain_buf: Vec<u8>,
    /// Application records that arrived while a handshake was being driven.
    queued_app_data: VecDeque<Vec<u8>>,
    queued_len: usize,
    /// Our Finished is sent but the server's is not yet verified.
    finished_pending: bool,
    /// A server Finished has validated the connection at least once; the
    /// active read cipher belongs to an authenticated epoch.
    read_authenticated: bool,
    sent_close_notify: bool,
    received_close_notify: bool,
    terminated: bool,
}

impl<S: Read + Write> TlsClientConnection<S> {
    /// Take ownership of the transport. The handshake runs on
    /// `perform_handshake`.
    pub fn new(stream: S, config: TlsConfig) -> Self {
        let hs = ClientHandshake::new(config.clone());
        Self {
            stream,
            config,
            record_layer: RecordLayer::new(),
            hs,
            hs_buffer: HandshakeBuffer::new(),
            state: ConnectionState::Handshaking,
            pending_read_keys: None,
            read_buf: Vec::with_capacity(MAX_CIPHERTEXT_LENGTH + RECORD_HEADER_LEN),
            plain_buf: Vec::new(),
            queued_app_data: VecDeque::new(),
            queued_len: 0,
            finished_pending: false,
            read_authenticated: false,
            sent_close_notify: false,
            received_close_notify: false,
            terminated: false,
        }
    }

    // -- public surface -----------------------------------------------------

    /// Run the initial handshake. With false start enabled and a
    /// forward-secret suite this returns once the client flight is on the
    /// wire; the first read completes the handshake.
    pub fn perform_handshake(&mut self) -> Result<(), TlsError> {
        if self.terminated || self.hs.state() != ClientHandshakeState::Idle {
            return Err(TlsError::HandshakeFailed(
                "handshake already performed".into(),
            ));
        }
        self.run(|conn| {
            let hello = conn.hs.build_client_hello()?;
            conn.send_record(ContentType::Handshake, &hello)?;
            conn.stream.flush()?;
            conn.drive_handshake(true)
        })
    }

    /// Read decrypted application data. Returns 0 at orderly end of stream.
    pub fn read(&mut self, buf: &mut [u8]) -> Result<usize, TlsError> {
        if buf.is_empty() {
            return Ok(0);
        }
        if let Some(n) = self.serve_buffered(buf) {
            return Ok(n);
        }
        if self.terminated {
            return if self.received_close_notify {
                Ok(0)
            } else {
                Err(TlsError::ConnectionClosed)
            };
        }
        self.run(|conn| conn.read_loop(buf))
    }

    /// Encrypt and send application data, splitting at the maximum
    /// plaintext fragment size.
    pub fn write(&mut self, buf: &[u8]) -> Result<usize, TlsError> {
        if self.terminated {
            return Err(TlsError::ConnectionClosed);
        }
        self.run(|conn| {
            conn.ensure_writable()?;
            for chunk in buf.chunks(MAX_PLAINTEXT_LENGTH) {
                conn.send_record(ContentType::ApplicationData, chunk)?;
            }
            Ok(buf.len())
        })
    }

    /// Flush the transport.
    pub fn flush(&mut self) -> Result<(), TlsError> {
        if self.terminated {
            return Ok(());
        }
        self.stream.flush().map_err(TlsError::from)
    }

    /// Orderly closure: send close_notify, flush, surface any abrupt reset
    /// with a zero-byte read, then tear down.
    pub fn close(&mut self) -> Result<(), TlsError> {
        if self.terminated {
            return Ok(());
        }
        if !self.sent_close_notify {
            self.sent_close_notify = true;
            let _ = self.send_alert(AlertLevel::Warning, AlertDescription::CloseNotify);
            let _ = self.stream.flush();
            let _ = self.stream.read(&mut []);
        }
        self.teardown();
        Ok(())
    }

    /// Start a caller-initiated renegotiation and drive it to completion.
    pub fn renegotiate(&mut self) -> Result<(), TlsError> {
        if self.state != ConnectionState::Connected {
            return Err(TlsError::HandshakeFailed(
                "renegotiation requires an established connection".into(),
            ));
        }
        self.run(|conn| {
            conn.begin_renegotiation(false)?;
            conn.drive_handshake(false)
        })
    }

    /// The underlying transport.
    pub fn get_ref(&self) -> &S {
        &self.stream
    }

    /// Mutable access to the underlying transport. Writing or reading raw
    /// bytes through it mid-connection corrupts the record stream.
    pub fn get_mut(&mut self) -> &mut S {
        &mut self.stream
    }

    /// Application data already decrypted and waiting.
    pub fn has_buffered_read_data(&self) -> bool {
        !self.plain_buf.is_empty() || !self.queued_app_data.is_empty()
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// The negotiated suite, once the ServerHello has been processed.
    pub fn cipher_suite(&self) -> Option<CipherSuite> {
        self.hs.suite()
    }

    /// Whether RFC 5746 secure renegotiation was negotiated.
    pub fn is_secure_renegotiation(&self) -> bool {
        self.hs.secure_renegotiation()
    }

    /// The server chain exactly as received, leaf first.
    pub fn peer_certificates(&self) -> &[Vec<u8>] {
        self.hs.peer_certificates()
    }

    pub fn local_verify_data(&self) -> &[u8] {
        self.hs.client_verify_data()
    }

    pub fn peer_verify_data(&self) -> &[u8] {
        self.hs.server_verify_data()
    }

    // -- fatal-path plumbing ------------------------------------------------

    /// Run an operation; on error send the mapped fatal alert, zero keys,
    /// close down, and surface the failure.
    fn run<T>(
        &mut self,
        op: impl FnOnce(&mut Self) -> Result<T, TlsError>,
    ) -> Result<T, TlsError> {
        match op(self) {
            Ok(value) => Ok(value),
            Err(err) => Err(self.fail(err)),
        }
    }

    fn fail(&mut self, err: TlsError) -> TlsError {
        if !self.terminated {
            // No alert when the peer is already gone or sent one itself
            let peer_gone = matches!(
                err,
                TlsError::IoError(_) | TlsError::ConnectionClosed | TlsError::AlertReceived(_)
            );
            if !peer_gone {
                let _ = self.send_alert(AlertLevel::Fatal, alert_for_error(&err));
                let _ = self.stream.flush();
            }
            self.teardown();
        }
        err
    }

    fn teardown(&mut self) {
        self.record_layer.clear();
        self.pending_read_keys = None;
        self.hs_buffer.reset();
        for mut block in self.queued_app_data.drain(..) {
            block.zeroize();
        }
        self.queued_len = 0;
        self.terminated = true;
        self.state = ConnectionState::Closed;
    }

    // -- record I/O ---------------------------------------------------------

    fn fill_buf(&mut self, min: usize) -> Result<(), TlsError> {
        while self.read_buf.len() < min {
            let mut tmp = [0u8; 16 * 1024];
            let n = self.stream.read(&mut tmp)?;
            if n == 0 {
                // Truncation without close_notify is fatal
                return Err(TlsError::ConnectionClosed);
            }
            self.read_buf.extend_from_slice(&tmp[..n]);
        }
        Ok(())
    }

    fn read_record(&mut self) -> Result<(ContentType, Vec<u8>), TlsError> {
        self.fill_buf(RECORD_HEADER_LEN)?;
        let length = u16::from_be_bytes([self.read_buf[3], self.read_buf[4]]) as usize;
        if length > MAX_CIPHERTEXT_LENGTH {
            return Err(TlsError::RecordOverflow);
        }
        self.fill_buf(RECORD_HEADER_LEN + length)?;
        let (content_type, plaintext, consumed) = self.record_layer.open_record(&self.read_buf)?;
        self.read_buf.drain(..consumed);
        Ok((content_type, plaintext))
    }

    fn send_record(&mut self, content_type: ContentType, payload: &[u8]) -> Result<(), TlsError> {
        let wire = self.record_layer.seal_record(content_type, payload)?;
        self.stream.write_all(&wire)?;
        Ok(())
    }

    fn send_alert(
        &mut self,
        level: AlertLevel,
        description: AlertDescription,
    ) -> Result<(), TlsError> {
        let alert = Alert { level, description };
        self.send_record(ContentType::Alert, &alert.to_bytes())
    }

    // -- handshake driving --------------------------------------------------

    /// HelloRequest handling per engine state: surfaced while idle (to
    /// trigger renegotiation), dropped while the server flight is being
    /// collected, surfaced (and therefore fatal) between ChangeCipherSpec
    /// and Finished.
    fn hello_request_policy(&self) -> HelloRequestPolicy {
        match self.hs.state() {
            ClientHandshakeState::Idle | ClientHandshakeState::Connected => {
                HelloRequestPolicy::Include
            }
            ClientHandshakeState::WaitServerHello
            | ClientHandshakeState::WaitCertificate
            | ClientHandshakeState::WaitServerKeyExchange
            | ClientHandshakeState::WaitServerHelloDone => {
                if self.hs.is_renegotiation() {
                    HelloRequestPolicy::IgnoreUntilFinished
                } else {
                    HelloRequestPolicy::Ignore
                }
            }
            ClientHandshakeState::WaitChangeCipherSpec | ClientHandshakeState::WaitFinished => {
                HelloRequestPolicy::Include
            }
        }
    }

    /// Drive the handshake until the engine is connected, or, when false
    /// start applies, until our flight is on the wire.
    fn drive_handshake(&mut self, allow_false_start: bool) -> Result<(), TlsError> {
        loop {
            if self.hs.state() == ClientHandshakeState::Connected {
                break;
            }
            if allow_false_start
                && self.finished_pending
                && self.config.enable_false_start
                && self.hs.forward_secrecy()
            {
                // Application data may flow; read() completes the handshake
                return Ok(());
            }
            let (content_type, payload) = self.read_record()?;
            match content_type {
                ContentType::Handshake => self.feed_handshake(&payload)?,
                ContentType::ChangeCipherSpec => self.process_change_cipher_spec(&payload)?,
                ContentType::Alert => match self.handle_alert(&payload)? {
                    AlertOutcome::CloseNotify => return Err(TlsError::ConnectionClosed),
                    AlertOutcome::Ignored => {}
                },
                ContentType::ApplicationData => self.queue_app_data(payload)?,
            }
        }
        self.note_established();
        Ok(())
    }

    fn note_established(&mut self) {
        if self.hs.state() == ClientHandshakeState::Connected {
            self.state = ConnectionState::Connected;
            self.finished_pending = false;
            self.read_authenticated = true;
        }
    }

    fn feed_handshake(&mut self, fragment: &[u8]) -> Result<(), TlsError> {
        let policy = self.hello_request_policy();
        self.hs_buffer.push_fragment(fragment, policy)?;
        while let Some(msg) = self.hs_buffer.pop_message() {
            if msg.msg_type == HandshakeType::HelloRequest
                && self.hs.state() == ClientHandshakeState::Connected
            {
                self.begin_renegotiation(true)?;
                continue;
            }
            if let Some(flight) = self.hs.process_message(&msg)? {
                self.send_client_flight(flight)?;
            }
        }
        self.note_established();
        Ok(())
    }

    fn send_client_flight(&mut self, flight: ClientFlight) -> Result<(), TlsError> {
        if let Some(ref cert) = flight.client_certificate {
            self.send_record(ContentType::Handshake, cert)?;
        }
        self.send_record(ContentType::Handshake, &flight.client_key_exchange)?;
        if let Some(ref verify) = flight.certificate_verify {
            self.send_record(ContentType::Handshake, verify)?;
        }

        self.send_record(ContentType::ChangeCipherSpec, &[0x01])?;

        // The write direction switches at our ChangeCipherSpec; the read
        // direction is parked until the server's arrives
        let keys = &flight.keys;
        if keys.is_cbc {
            self.record_layer.activate_write_cbc(
                keys.client_write_key.clone(),
                keys.client_write_mac_key.clone(),
                keys.mac_len,
            );
        } else {
            self.record_layer
                .activate_write_gcm(&keys.client_write_key, keys.client_write_iv.clone())?;
        }
        self.pending_read_keys = Some(PendingReadKeys {
            is_cbc: keys.is_cbc,
            mac_len: keys.mac_len,
            key: keys.server_write_key.clone(),
            mac_key: keys.server_write_mac_key.clone(),
            iv: keys.server_write_iv.clone(),
        });

        self.send_record(ContentType::Handshake, &flight.finished)?;
        self.stream.flush()?;
        self.finished_pending = true;
        Ok(())
    }

    fn process_change_cipher_spec(&mut self, payload: &[u8]) -> Result<(), TlsError> {
        if payload != [0x01] {
            return Err(TlsError::IllegalParameter(
                "ChangeCipherSpec payload must be 0x01".into(),
            ));
        }
        if self.hs_buffer.has_partial() || self.hs_buffer.queued_len() > 0 {
            return Err(TlsError::UnexpectedMessage(
                "handshake data pending at ChangeCipherSpec".into(),
            ));
        }
        let keys = self.pending_read_keys.take().ok_or_else(|| {
            TlsError::UnexpectedMessage("ChangeCipherSpec without a pending cipher state".into())
        })?;
        self.hs.process_change_cipher_spec()?;

        if keys.is_cbc {
            self.record_layer
                .activate_read_cbc(keys.key.clone(), keys.mac_key.clone(), keys.mac_len);
        } else {
            self.record_layer
                .activate_read_gcm(&keys.key, keys.iv.clone())?;
        }
        Ok(())
    }

    fn begin_renegotiation(&mut self, server_initiated: bool) -> Result<(), TlsError> {
        if server_initiated && !self.config.allow_renegotiation {
            // Decline politely; the connection continues
            self.send_alert(AlertLevel::Warning, AlertDescription::NoRenegotiation)?;
            self.stream.flush()?;
            return Ok(());
        }
        if !self.hs.secure_renegotiation() {
            return Err(TlsError::HandshakeFailed(
                "peer did not negotiate secure renegotiation".into(),
            ));
        }
        self.hs.reset_for_renegotiation();
        let hello = self.hs.build_client_hello()?;
        self.send_record(ContentType::Handshake, &hello)?;
        self.stream.flush()?;
        self.state = ConnectionState::Renegotiating;
        Ok(())
    }

    // -- application data paths ----------------------------------------------

    /// Application data is deliverable only under an authenticated read
    /// cipher with no Finished pending on the read side.
    fn app_data_acceptable(&self) -> bool {
        self.record_layer.is_read_protected()
            && self.read_authenticated
            && self.hs.state() != ClientHandshakeState::WaitFinished
    }

    fn queue_app_data(&mut self, payload: Vec<u8>) -> Result<(), TlsError> {
        if !self.app_data_acceptable() {
            return Err(TlsError::UnexpectedMessage(
                "application data during handshake".into(),
            ));
        }
        if payload.is_empty() {
            return Ok(());
        }
        self.queued_len += payload.len();
        if self.queued_len > MAX_BUFFERED_APP_DATA {
            return Err(TlsError::UnexpectedMessage(
                "buffered application data limit exceeded".into(),
            ));
        }
        self.queued_app_data.push_back(payload);
        Ok(())
    }

    fn serve_buffered(&mut self, buf: &mut [u8]) -> Option<usize> {
        if !self.plain_buf.is_empty() {
            let n = self.plain_buf.len().min(buf.len());
            buf[..n].copy_from_slice(&self.plain_buf[..n]);
            self.plain_buf.drain(..n);
            return Some(n);
        }
        if let Some(block) = self.queued_app_data.pop_front() {
            self.queued_len -= block.len();
            return Some(self.deliver(block, buf));
        }
        None
    }

    fn deliver(&mut self, data: Vec<u8>, buf: &mut [u8]) -> usize {
        let n = data.len().min(buf.len());
        buf[..n].copy_from_slice(&data[..n]);
        if n < data.len() {
            self.plain_buf = data[n..].to_vec();
        }
        n
    }

    fn read_loop(&mut self, buf: &mut [u8]) -> Result<usize, TlsError> {
        loop {
            let (content_type, payload) = self.read_record()?;
            match content_type {
                ContentType::ApplicationData => {
                    if !self.app_data_acceptable() {
                        return Err(TlsError::UnexpectedMessage(
                            "application data before Finished".into(),
                        ));
                    }
                    if payload.is_empty() {
                        continue;
                    }
                    return Ok(self.deliver(payload, buf));
                }
                ContentType::Handshake => {
                    self.feed_handshake(&payload)?;
                }
                ContentType::ChangeCipherSpec => {
                    self.process_change_cipher_spec(&payload)?;
                }
                ContentType::Alert => match self.handle_alert(&payload)? {
                    AlertOutcome::CloseNotify => return Ok(0),
                    AlertOutcome::Ignored => {}
                },
            }
        }
    }

    fn handle_alert(&mut self, payload: &[u8]) -> Result<AlertOutcome, TlsError> {
        let (level, description) = Alert::parse(payload)?;
        if description == AlertDescription::CloseNotify as u8 {
            self.received_close_notify = true;
            if !self.sent_close_notify {
                self.sent_close_notify = true;
                let _ = self.send_alert(AlertLevel::Warning, AlertDescription::CloseNotify);
                let _ = self.stream.flush();
                let _ = self.stream.read(&mut []);
            }
            self.teardown();
            return Ok(AlertOutcome::CloseNotify);
        }
        if level == AlertLevel::Fatal {
            self.teardown();
            return Err(TlsError::AlertReceived(description));
        }
        // Warning-level alerts other than close_notify carry no obligations
        Ok(AlertOutcome::Ignored)
    }

    /// Writes need an established connection; the exceptions and blockers:
    /// false start permits writing before the server Finished on
    /// forward-secret suites, and a server-initiated renegotiation blocks
    /// writes until it completes.
    fn ensure_writable(&mut self) -> Result<(), TlsError> {
        if self.state == ConnectionState::Renegotiating {
            // A mid-stream handshake blocks writes until it completes;
            // some peers reject interleaved application data
            return self.drive_handshake(false);
        }
        if self.state == ConnectionState::Connected {
            return Ok(());
        }
        if self.finished_pending && self.config.enable_false_start && self.hs.forward_secrecy() {
            return Ok(());
        }
        if self.finished_pending {
            // Static key exchange: block until the server Finished verifies
            return self.drive_handshake(false);
        }
        Err(TlsError::HandshakeFailed(
            "connection is not established".into(),
        ))
    }
}
