//! Owns the set of live connections keyed by channel id, exactly as the
//! teacher's `Manager` owns `Arc<Mutex<HashMap<u64, Bulb>>>` keyed by bulb
//! target address — generalized from a table of discovered devices to a
//! table of connections, and from a background receive thread to an
//! embedder-driven `on_packet` entry point (the core never touches
//! `std::net` itself).

use crate::cemi::CemiFrame;
use crate::codec::header::Header;
use crate::codec::service::{service_type, ConnHeader, ConnectResponse, ServiceBody, Status};
use crate::codec::structures::{ConnectionType, Cri, HostProtocol, Hpai, TunnelingLayer};
use crate::connection::connection::Connection;
use crate::connection::state::{BlockingMode, CloseReason, ConnectionState};
use crate::error::{Error, Result};
use crate::interfaces::{Clock, Listener, Transport};
use std::collections::HashMap;
use std::net::SocketAddrV4;
use std::sync::{Arc, Condvar, Mutex};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(60);
const HEARTBEAT_TIMEOUT: Duration = Duration::from_secs(10);
const HEARTBEAT_MAX_RETRIES: u8 = 4;

struct PendingConnect {
    result: Option<Result<u8>>,
}

struct ManagerInner {
    connections: HashMap<u8, Arc<Connection>>,
    pending_connects: HashMap<SocketAddrV4, PendingConnect>,
}

pub struct ConnectionManager {
    transport: Arc<dyn Transport>,
    clock: Arc<dyn Clock>,
    listener: Arc<dyn Listener>,
    inner: Mutex<ManagerInner>,
    condvar: Condvar,
}

impl ConnectionManager {
    pub fn new(transport: Arc<dyn Transport>, clock: Arc<dyn Clock>, listener: Arc<dyn Listener>) -> Arc<ConnectionManager> {
        Arc::new(ConnectionManager {
            transport,
            clock,
            listener,
            inner: Mutex::new(ManagerInner {
                connections: HashMap::new(),
                pending_connects: HashMap::new(),
            }),
            condvar: Condvar::new(),
        })
    }

    fn frame_bytes(service_type: u16, body: &ServiceBody) -> Vec<u8> {
        let mut body_bytes = Vec::new();
        body.write_to(&mut body_bytes);
        let mut out = Header::new(service_type, body_bytes.len()).pack();
        out.extend_from_slice(&body_bytes);
        out
    }

    /// Sends `Connect.req` to `server` and blocks the caller until
    /// `Connect.res` arrives (routed back in through `on_packet`) or
    /// `CONNECT_TIMEOUT` elapses.
    pub fn connect(self: &Arc<Self>, server: SocketAddrV4, layer: TunnelingLayer) -> Result<u8> {
        let control_hpai = Hpai::use_transport_source(HostProtocol::Udp);
        let data_hpai = control_hpai;
        let body = ServiceBody::ConnectRequest {
            control: control_hpai,
            data: data_hpai,
            cri: Cri::Tunnel { layer },
        };
        let bytes = Self::frame_bytes(service_type::CONNECT_REQUEST, &body);

        let mut inner = self.inner.lock().unwrap();
        inner.pending_connects.insert(server, PendingConnect { result: None });
        drop(inner);

        self.transport.send(&bytes, server)?;

        let mut inner = self.inner.lock().unwrap();
        loop {
            if let Some(p) = inner.pending_connects.get(&server) {
                if p.result.is_some() {
                    break;
                }
            } else {
                break;
            }
            let (guard, timeout_result) = self.condvar.wait_timeout(inner, CONNECT_TIMEOUT).unwrap();
            inner = guard;
            if timeout_result.timed_out() {
                break;
            }
        }

        let pending = inner.pending_connects.remove(&server);
        match pending.and_then(|p| p.result) {
            Some(result) => result,
            None => Err(Error::Timeout("Connect.res")),
        }
    }

    /// Feeds one received datagram into the state machine. Malformed
    /// frames are dropped without affecting any open connection.
    pub fn on_packet(self: &Arc<Self>, bytes: &[u8], source: SocketAddrV4) {
        let header = match Header::unpack(bytes) {
            Ok(h) => h,
            Err(e) => {
                debug!(error = %e, "dropping malformed datagram");
                return;
            }
        };
        let body = match ServiceBody::parse(header.service_type, &bytes[6..header.total_length as usize]) {
            Ok(b) => b,
            Err(e) => {
                debug!(error = %e, service_type = header.service_type, "dropping unparsable body");
                return;
            }
        };

        match body {
            ServiceBody::ConnectResponse(resp) => self.handle_connect_response(source, resp),
            ServiceBody::TunnelingAck { header, status } => self.handle_tunneling_ack(&header, status),
            ServiceBody::TunnelingRequest { header, cemi } => self.handle_tunneling_req(&header, &cemi),
            ServiceBody::ConnectionstateResponse { channel_id, status } => {
                self.handle_connectionstate_response(channel_id, status)
            }
            ServiceBody::DisconnectRequest { channel_id, .. } => self.handle_disconnect_request(channel_id),
            _ => {}
        }
    }

    fn handle_connect_response(&self, source: SocketAddrV4, resp: ConnectResponse) {
        let mut inner = self.inner.lock().unwrap();
        if !inner.pending_connects.contains_key(&source) {
            return;
        }
        let result = match resp {
            ConnectResponse::Ok { channel_id, data_endpoint, .. } => {
                let connection = Arc::new(Connection::new(
                    channel_id,
                    ConnectionType::Tunnel,
                    source,
                    data_endpoint.addr,
                    Arc::downgrade(&self.transport),
                    self.clock.now(),
                ));
                inner.connections.insert(channel_id, connection);
                Ok(channel_id)
            }
            ConnectResponse::Err { status } => Err(Error::UnsupportedConnectionType(status.0)),
        };
        inner.pending_connects.get_mut(&source).unwrap().result = Some(result);
        self.condvar.notify_all();
    }

    fn connection(&self, channel_id: u8) -> Option<Arc<Connection>> {
        self.inner.lock().unwrap().connections.get(&channel_id).cloned()
    }

    fn handle_tunneling_ack(&self, header: &ConnHeader, status: Status) {
        if let Some(conn) = self.connection(header.channel_id) {
            conn.on_tunneling_ack(header, status.is_ok());
        }
    }

    fn handle_tunneling_req(&self, header: &ConnHeader, cemi: &[u8]) {
        let conn = match self.connection(header.channel_id) {
            Some(c) => c,
            None => return,
        };
        let deliver = match conn.on_tunneling_req(header) {
            Ok(d) => d,
            Err(_) => {
                self.close(header.channel_id, CloseReason::ProtocolError);
                return;
            }
        };

        let ack_body = conn.ack_body();
        let bytes = Self::frame_bytes(service_type::TUNNELING_ACK, &ack_body);
        let _ = self.transport.send(&bytes, conn.ctrl_endpoint);

        if !deliver {
            return;
        }
        if let Ok(frame) = CemiFrame::unpack(cemi) {
            if matches!(frame, CemiFrame::LData(ref d) if d.message_code == crate::cemi::MessageCode::LDataCon) {
                conn.on_local_confirmation();
            }
            conn.set_guard(true);
            self.listener.on_frame(&frame);
            conn.set_guard(false);
        }
    }

    fn handle_connectionstate_response(&self, channel_id: u8, status: Status) {
        if let Some(conn) = self.connection(channel_id) {
            if status.is_ok() {
                conn.touch_heartbeat(self.clock.now());
            }
        }
    }

    fn handle_disconnect_request(&self, channel_id: u8) {
        if let Some(conn) = self.connection(channel_id) {
            let body = ServiceBody::DisconnectResponse { channel_id, status: Status::NO_ERROR };
            let bytes = Self::frame_bytes(service_type::DISCONNECT_RESPONSE, &body);
            let _ = self.transport.send(&bytes, conn.ctrl_endpoint);
            conn.close(CloseReason::RemoteInitiated, self.listener.as_ref());
            self.inner.lock().unwrap().connections.remove(&channel_id);
        }
    }

    /// Sends a cEMI frame on an open connection.
    pub fn send(&self, channel_id: u8, cemi: &CemiFrame, mode: BlockingMode) -> Result<()> {
        let conn = self.connection(channel_id).ok_or(Error::ConnectionClosed)?;
        conn.send(cemi, mode, self.listener.as_ref())
    }

    pub fn state(&self, channel_id: u8) -> ConnectionState {
        self.connection(channel_id).map(|c| c.state()).unwrap_or(ConnectionState::Closed)
    }

    /// Sends `Disconnect.req` and removes the connection once acked (or
    /// immediately if the peer never replies — the caller already
    /// considers the channel gone).
    pub fn disconnect(&self, channel_id: u8) {
        if let Some(conn) = self.connection(channel_id) {
            let body = ServiceBody::DisconnectRequest {
                channel_id,
                control: Hpai::use_transport_source(HostProtocol::Udp),
            };
            let bytes = Self::frame_bytes(service_type::DISCONNECT_REQUEST, &body);
            let _ = self.transport.send(&bytes, conn.ctrl_endpoint);
            conn.close(CloseReason::Normal, self.listener.as_ref());
            self.inner.lock().unwrap().connections.remove(&channel_id);
        }
    }

    fn close(&self, channel_id: u8, reason: CloseReason) {
        if let Some(conn) = self.inner.lock().unwrap().connections.remove(&channel_id) {
            conn.close(reason, self.listener.as_ref());
        }
    }

    /// Drives heartbeats for every open connection; call this periodically
    /// from the embedder's timer loop (or let `Clock::schedule` drive it).
    /// The first `Connectionstate.req` fires `HEARTBEAT_INTERVAL` after the
    /// last confirmed-alive moment; each subsequent retry (while awaiting a
    /// response) is gated `HEARTBEAT_TIMEOUT` apart, so back-to-back calls
    /// to this method at the same clock reading only ever act once per
    /// connection.
    pub fn tick_heartbeats(self: &Arc<Self>) {
        let now = self.clock.now();
        let due: Vec<Arc<Connection>> = {
            let inner = self.inner.lock().unwrap();
            inner
                .connections
                .values()
                .filter(|c| {
                    let gate = if c.heartbeat_retries() == 0 { HEARTBEAT_INTERVAL } else { HEARTBEAT_TIMEOUT };
                    now.duration_since(c.last_heartbeat_attempt()) >= gate
                })
                .cloned()
                .collect()
        };
        for conn in due {
            self.send_heartbeat(&conn, now);
        }
    }

    fn send_heartbeat(&self, conn: &Arc<Connection>, now: Instant) {
        if conn.heartbeat_retries() >= HEARTBEAT_MAX_RETRIES {
            warn!(channel_id = conn.channel_id, retries = conn.heartbeat_retries(), "heartbeat exhausted retries, closing");
            let body = ServiceBody::DisconnectRequest {
                channel_id: conn.channel_id,
                control: Hpai::use_transport_source(HostProtocol::Udp),
            };
            let bytes = Self::frame_bytes(service_type::DISCONNECT_REQUEST, &body);
            let _ = self.transport.send(&bytes, conn.ctrl_endpoint);
            self.close(conn.channel_id, CloseReason::HeartbeatLost);
            return;
        }
        let body = ServiceBody::ConnectionstateRequest {
            channel_id: conn.channel_id,
            control: Hpai::use_transport_source(HostProtocol::Udp),
        };
        let bytes = Self::frame_bytes(service_type::CONNECTIONSTATE_REQUEST, &body);
        if self.transport.send(&bytes, conn.ctrl_endpoint).is_err() {
            self.close(conn.channel_id, CloseReason::TransportError);
            return;
        }
        conn.bump_heartbeat_retry(now);
    }

    pub fn heartbeat_timeout() -> Duration {
        HEARTBEAT_TIMEOUT
    }
}
