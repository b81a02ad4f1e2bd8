//! A single tunneling/device-management connection: sequence windows,
//! heartbeat bookkeeping, and the blocking-send machinery. Mutable state
//! lives behind one `Mutex` per connection, mirroring the teacher's
//! `Arc<Mutex<HashMap<...>>>` device table narrowed to a single peer;
//! `Condvar` parks callers of `send` until their ack (and, for
//! `WaitForCon`, the mirroring `L_Data.con`) arrives.

use crate::cemi::CemiFrame;
use crate::codec::header::Header;
use crate::codec::service::{ConnHeader, ServiceBody};
use crate::codec::structures::ConnectionType;
use crate::connection::state::{BlockingMode, CloseReason, ConnectionState};
use crate::error::{Error, Result};
use crate::interfaces::{Listener, Transport};
use std::net::SocketAddrV4;
use std::sync::{Condvar, Mutex, Weak};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

const ACK_TIMEOUT: Duration = Duration::from_secs(1);

#[derive(Debug, Clone)]
struct PendingAck {
    seq: u8,
    mode: BlockingMode,
    ack_ok: Option<bool>,
    con_seen: bool,
}

struct ConnectionInner {
    state: ConnectionState,
    send_seq: u8,
    recv_seq: u8,
    last_heartbeat: Instant,
    last_heartbeat_attempt: Instant,
    heartbeat_retries: u8,
    pending_ack: Option<PendingAck>,
    in_listener_callback: bool,
}

pub struct Connection {
    pub channel_id: u8,
    pub conn_type: ConnectionType,
    pub ctrl_endpoint: SocketAddrV4,
    pub data_endpoint: SocketAddrV4,
    transport: Weak<dyn Transport>,
    inner: Mutex<ConnectionInner>,
    condvar: Condvar,
}

impl Connection {
    pub(crate) fn new(
        channel_id: u8,
        conn_type: ConnectionType,
        ctrl_endpoint: SocketAddrV4,
        data_endpoint: SocketAddrV4,
        transport: Weak<dyn Transport>,
        now: Instant,
    ) -> Connection {
        Connection {
            channel_id,
            conn_type,
            ctrl_endpoint,
            data_endpoint,
            transport,
            inner: Mutex::new(ConnectionInner {
                state: ConnectionState::Open,
                send_seq: 0,
                recv_seq: 0,
                last_heartbeat: now,
                last_heartbeat_attempt: now,
                heartbeat_retries: 0,
                pending_ack: None,
                in_listener_callback: false,
            }),
            condvar: Condvar::new(),
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.inner.lock().unwrap().state
    }

    pub fn last_heartbeat(&self) -> Instant {
        self.inner.lock().unwrap().last_heartbeat
    }

    /// Time the most recent `Connectionstate.req` was sent (whether or not
    /// it has been answered yet) — distinct from `last_heartbeat`, which
    /// only moves on a successful `Connectionstate.res`.
    pub(crate) fn last_heartbeat_attempt(&self) -> Instant {
        self.inner.lock().unwrap().last_heartbeat_attempt
    }

    pub(crate) fn touch_heartbeat(&self, now: Instant) {
        let mut inner = self.inner.lock().unwrap();
        inner.last_heartbeat = now;
        inner.last_heartbeat_attempt = now;
        inner.heartbeat_retries = 0;
    }

    pub(crate) fn heartbeat_retries(&self) -> u8 {
        self.inner.lock().unwrap().heartbeat_retries
    }

    /// Records that a `Connectionstate.req` was just sent at `now` and
    /// returns the updated retry count.
    pub(crate) fn bump_heartbeat_retry(&self, now: Instant) -> u8 {
        let mut inner = self.inner.lock().unwrap();
        inner.last_heartbeat_attempt = now;
        inner.heartbeat_retries += 1;
        inner.heartbeat_retries
    }

    fn frame_bytes(&self, service_type: u16, body: &ServiceBody) -> Vec<u8> {
        let mut body_bytes = Vec::new();
        body.write_to(&mut body_bytes);
        let mut out = Header::new(service_type, body_bytes.len()).pack();
        out.extend_from_slice(&body_bytes);
        out
    }

    fn transport(&self) -> Result<std::sync::Arc<dyn Transport>> {
        self.transport.upgrade().ok_or(Error::ConnectionClosed)
    }

    /// Sends a cEMI frame as `Tunneling.req`. `NonBlocking` returns as soon
    /// as the datagram is handed to the transport; `WaitForAck`/`WaitForCon`
    /// park the caller until the matching response arrives, re-sending once
    /// on a 1 s timeout before closing with `Timeout`.
    pub fn send(&self, cemi: &CemiFrame, mode: BlockingMode, listener: &dyn Listener) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        if inner.state != ConnectionState::Open {
            return Err(Error::ConnectionClosed);
        }
        if inner.in_listener_callback {
            return Err(Error::IllegalState(
                "blocking send invoked re-entrantly from a Listener callback",
            ));
        }
        let seq = inner.send_seq;
        let transport = self.transport()?;
        let payload = cemi.pack();
        let header = ConnHeader { channel_id: self.channel_id, seq };
        let body = ServiceBody::TunnelingRequest { header, cemi: payload };
        let bytes = self.frame_bytes(crate::codec::service::service_type::TUNNELING_REQUEST, &body);

        if mode == BlockingMode::NonBlocking {
            transport.send(&bytes, self.data_endpoint)?;
            return Ok(());
        }

        inner.pending_ack = Some(PendingAck { seq, mode, ack_ok: None, con_seen: false });
        drop(inner);
        transport.send(&bytes, self.data_endpoint)?;

        let mut guard = self.inner.lock().unwrap();
        for attempt in 0..2 {
            let (g, timeout_result) = self
                .condvar
                .wait_timeout_while(guard, ACK_TIMEOUT, |i| {
                    matches!(&i.pending_ack, Some(p) if p.seq == seq && !Self::satisfied(p, mode))
                })
                .unwrap();
            guard = g;

            if !timeout_result.timed_out() {
                if guard.pending_ack.is_none() {
                    // Woken by `close()` clearing the pending ack out from under us.
                    return Err(Error::ConnectionClosed);
                }
                let resolved = match &guard.pending_ack {
                    None => true,
                    Some(p) => Self::satisfied(p, mode),
                };
                if resolved {
                    let ack_ok = guard.pending_ack.as_ref().map(|p| p.ack_ok == Some(true)).unwrap_or(true);
                    guard.pending_ack = None;
                    if ack_ok {
                        guard.send_seq = guard.send_seq.wrapping_add(1);
                        return Ok(());
                    }
                    return Err(Error::IllegalState("peer returned a non-zero Tunneling.ack status"));
                }
            }

            if attempt == 0 {
                drop(guard);
                transport.send(&bytes, self.data_endpoint)?;
                guard = self.inner.lock().unwrap();
                continue;
            }
        }

        guard.pending_ack = None;
        guard.state = ConnectionState::Closing;
        drop(guard);
        warn!(channel_id = self.channel_id, seq, "Tunneling.ack timed out twice, closing connection");
        listener.on_state_change(ConnectionState::Closed, CloseReason::Timeout);
        let mut guard = self.inner.lock().unwrap();
        guard.state = ConnectionState::Closed;
        Err(Error::Timeout("Tunneling.ack"))
    }

    fn satisfied(p: &PendingAck, mode: BlockingMode) -> bool {
        match mode {
            BlockingMode::NonBlocking => true,
            BlockingMode::WaitForAck => p.ack_ok.is_some(),
            BlockingMode::WaitForCon => p.ack_ok.is_some() && p.con_seen,
        }
    }

    /// Resolves a pending `send` waiting for `Tunneling.ack`.
    pub(crate) fn on_tunneling_ack(&self, header: &ConnHeader, status_ok: bool) {
        let mut inner = self.inner.lock().unwrap();
        if let Some(p) = inner.pending_ack.as_mut() {
            if p.seq == header.seq {
                p.ack_ok = Some(status_ok);
                self.condvar.notify_all();
                return;
            }
        }
        // An ack with no matching pending send, or a mismatched seq while one
        // is outstanding, indicates protocol divergence.
        if inner.pending_ack.is_some() {
            warn!(channel_id = self.channel_id, got = header.seq, "Tunneling.ack seq mismatch, closing");
            inner.state = ConnectionState::Closing;
        }
    }

    /// Resolves the `L_Data.con` half of a `WaitForCon` send.
    pub(crate) fn on_local_confirmation(&self) {
        let mut inner = self.inner.lock().unwrap();
        if let Some(p) = inner.pending_ack.as_mut() {
            p.con_seen = true;
            self.condvar.notify_all();
        }
    }

    /// Handles an inbound `Tunneling.req`: acks, advances `recv_seq`, and
    /// reports whether the payload should be delivered to the listener
    /// (`false` for an accepted duplicate re-ack).
    pub(crate) fn on_tunneling_req(&self, header: &ConnHeader) -> Result<bool> {
        let mut inner = self.inner.lock().unwrap();
        if header.seq == inner.recv_seq {
            inner.recv_seq = inner.recv_seq.wrapping_add(1);
            Ok(true)
        } else if header.seq == inner.recv_seq.wrapping_sub(1) {
            debug!(channel_id = self.channel_id, seq = header.seq, "duplicate Tunneling.req, re-acking without delivery");
            Ok(false)
        } else {
            inner.state = ConnectionState::Closing;
            warn!(channel_id = self.channel_id, expected = inner.recv_seq, actual = header.seq, "Tunneling.req sequence violation");
            Err(Error::SequenceNumber { expected: inner.recv_seq, actual: header.seq })
        }
    }

    pub(crate) fn ack_body(&self) -> ServiceBody {
        let seq = self.inner.lock().unwrap().recv_seq.wrapping_sub(1);
        ServiceBody::TunnelingAck {
            header: ConnHeader { channel_id: self.channel_id, seq },
            status: crate::codec::service::Status::NO_ERROR,
        }
    }

    pub(crate) fn set_guard(&self, active: bool) {
        self.inner.lock().unwrap().in_listener_callback = active;
    }

    pub(crate) fn close(&self, reason: CloseReason, listener: &dyn Listener) {
        let mut inner = self.inner.lock().unwrap();
        if inner.state == ConnectionState::Closed {
            return;
        }
        inner.state = ConnectionState::Closed;
        inner.pending_ack = None;
        drop(inner);
        debug!(channel_id = self.channel_id, ?reason, "connection closed");
        self.condvar.notify_all();
        listener.on_state_change(ConnectionState::Closed, reason);
    }
}
