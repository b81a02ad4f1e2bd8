//! End-to-end drives of the connection lifecycle against fake
//! `Transport`/`Clock`/`Listener` collaborators: connect, tunneled
//! send/receive, sequence-violation close, and heartbeat-loss close.

use knx_ip_core::cemi::{Apci, CemiFrame, ControlField1, ControlField2, Destination, LData, MessageCode, Npdu, Priority, Tpci};
use knx_ip_core::codec::header::Header;
use knx_ip_core::codec::service::{ConnHeader, ConnectResponse, ServiceBody, Status};
use knx_ip_core::codec::structures::{Crd, Hpai, HostProtocol, TunnelingLayer};
use knx_ip_core::connection::{BlockingMode, CloseReason, ConnectionManager, ConnectionState};
use knx_ip_core::interfaces::{Clock, Listener, TimerHandle, Transport};
use knx_ip_core::Result;
use std::net::{Ipv4Addr, SocketAddrV4};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

struct RecordingTransport {
    sent: Mutex<Vec<(Vec<u8>, SocketAddrV4)>>,
}

impl Transport for RecordingTransport {
    fn send(&self, bytes: &[u8], destination: SocketAddrV4) -> Result<()> {
        self.sent.lock().unwrap().push((bytes.to_vec(), destination));
        Ok(())
    }
    fn local_endpoint(&self) -> SocketAddrV4 {
        SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, 0)
    }
}

struct SettableClock {
    now: Mutex<Instant>,
}

impl Clock for SettableClock {
    fn now(&self) -> Instant {
        *self.now.lock().unwrap()
    }
    fn schedule(&self, _after: Duration, _callback: Box<dyn FnOnce() + Send>) -> Box<dyn TimerHandle> {
        struct NoopHandle;
        impl TimerHandle for NoopHandle {
            fn cancel(&self) {}
        }
        Box::new(NoopHandle)
    }
}

impl SettableClock {
    fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap();
        *now += by;
    }
}

struct RecordingListener {
    frames: AtomicU32,
    close_events: Mutex<Vec<CloseReason>>,
}

impl Listener for RecordingListener {
    fn on_frame(&self, _cemi: &CemiFrame) {
        self.frames.fetch_add(1, Ordering::SeqCst);
    }
    fn on_state_change(&self, state: ConnectionState, reason: CloseReason) {
        if state == ConnectionState::Closed {
            self.close_events.lock().unwrap().push(reason);
        }
    }
    fn on_lost_messages(&self, _count: u16, _device_state: u8) {}
}

fn sample_group_write() -> CemiFrame {
    CemiFrame::LData(LData {
        message_code: MessageCode::LDataReq,
        additional_info: Vec::new(),
        ctrl1: ControlField1 {
            standard_frame: true,
            do_not_repeat: true,
            system_broadcast: false,
            priority: Priority::Low,
            ack_requested: false,
            error: false,
        },
        ctrl2: ControlField2 { group_address: true, hop_count: 6, extended_format: 0 },
        source: 0x1101,
        destination: Destination::Group(0x0901),
        npdu: Npdu { tpci: Tpci::UnnumberedData, apci: Apci::GroupValueWrite, packed_value: Some(0x01), extra: Vec::new() },
    })
}

fn frame_bytes(service_type: u16, body: &ServiceBody) -> Vec<u8> {
    let mut body_bytes = Vec::new();
    body.write_to(&mut body_bytes);
    let mut out = Header::new(service_type, body_bytes.len()).pack();
    out.extend_from_slice(&body_bytes);
    out
}

fn connect_success_bytes(channel_id: u8, data_endpoint: SocketAddrV4) -> Vec<u8> {
    let body = ServiceBody::ConnectResponse(ConnectResponse::Ok {
        channel_id,
        data_endpoint: Hpai::new(HostProtocol::Udp, data_endpoint),
        crd: Crd::Tunnel { individual_address: 0x1101 },
    });
    frame_bytes(knx_ip_core::codec::service::service_type::CONNECT_RESPONSE, &body)
}

#[test]
fn connect_then_tunneling_round_trip() {
    let transport = Arc::new(RecordingTransport { sent: Mutex::new(Vec::new()) });
    let clock = Arc::new(SettableClock { now: Mutex::new(Instant::now()) });
    let listener = Arc::new(RecordingListener { frames: AtomicU32::new(0), close_events: Mutex::new(Vec::new()) });
    let manager = ConnectionManager::new(transport.clone(), clock, listener.clone());

    let server = SocketAddrV4::new(Ipv4Addr::new(10, 0, 0, 2), 3671);
    let data_endpoint = SocketAddrV4::new(Ipv4Addr::new(10, 0, 0, 2), 3672);

    let manager_bg = manager.clone();
    let responder = std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(20));
        manager_bg.on_packet(&connect_success_bytes(7, data_endpoint), server);
    });

    let channel_id = manager.connect(server, TunnelingLayer::LinkLayer).unwrap();
    responder.join().unwrap();
    assert_eq!(channel_id, 7);
    assert_eq!(manager.state(channel_id), ConnectionState::Open);

    manager.send(channel_id, &sample_group_write(), BlockingMode::NonBlocking).unwrap();
    let sent = transport.sent.lock().unwrap();
    let last = &sent.last().unwrap().0;
    let header = Header::unpack(last).unwrap();
    assert_eq!(header.service_type, knx_ip_core::codec::service::service_type::TUNNELING_REQUEST);
}

#[test]
fn inbound_tunneling_req_acks_and_delivers() {
    let transport = Arc::new(RecordingTransport { sent: Mutex::new(Vec::new()) });
    let clock = Arc::new(SettableClock { now: Mutex::new(Instant::now()) });
    let listener = Arc::new(RecordingListener { frames: AtomicU32::new(0), close_events: Mutex::new(Vec::new()) });
    let manager = ConnectionManager::new(transport.clone(), clock.clone(), listener.clone());

    let server = SocketAddrV4::new(Ipv4Addr::new(10, 0, 0, 2), 3671);
    let data_endpoint = SocketAddrV4::new(Ipv4Addr::new(10, 0, 0, 2), 3672);
    let manager_bg = manager.clone();
    let responder = std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(20));
        manager_bg.on_packet(&connect_success_bytes(3, data_endpoint), server);
    });
    let channel_id = manager.connect(server, TunnelingLayer::LinkLayer).unwrap();
    responder.join().unwrap();

    let req_body = ServiceBody::TunnelingRequest {
        header: ConnHeader { channel_id, seq: 0 },
        cemi: sample_group_write().pack(),
    };
    let bytes = frame_bytes(knx_ip_core::codec::service::service_type::TUNNELING_REQUEST, &req_body);
    manager.on_packet(&bytes, data_endpoint);

    assert_eq!(listener.frames.load(Ordering::SeqCst), 1);
    let sent = transport.sent.lock().unwrap();
    let ack_bytes = &sent.last().unwrap().0;
    let header = Header::unpack(ack_bytes).unwrap();
    assert_eq!(header.service_type, knx_ip_core::codec::service::service_type::TUNNELING_ACK);
}

#[test]
fn inbound_tunneling_req_sequence_violation_closes_connection() {
    let transport = Arc::new(RecordingTransport { sent: Mutex::new(Vec::new()) });
    let clock = Arc::new(SettableClock { now: Mutex::new(Instant::now()) });
    let listener = Arc::new(RecordingListener { frames: AtomicU32::new(0), close_events: Mutex::new(Vec::new()) });
    let manager = ConnectionManager::new(transport.clone(), clock.clone(), listener.clone());

    let server = SocketAddrV4::new(Ipv4Addr::new(10, 0, 0, 2), 3671);
    let data_endpoint = SocketAddrV4::new(Ipv4Addr::new(10, 0, 0, 2), 3672);
    let manager_bg = manager.clone();
    let responder = std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(20));
        manager_bg.on_packet(&connect_success_bytes(9, data_endpoint), server);
    });
    let channel_id = manager.connect(server, TunnelingLayer::LinkLayer).unwrap();
    responder.join().unwrap();

    // recv_seq starts at 0; a frame claiming seq 5 is out of window.
    let req_body = ServiceBody::TunnelingRequest {
        header: ConnHeader { channel_id, seq: 5 },
        cemi: sample_group_write().pack(),
    };
    let bytes = frame_bytes(knx_ip_core::codec::service::service_type::TUNNELING_REQUEST, &req_body);
    manager.on_packet(&bytes, data_endpoint);

    assert_eq!(manager.state(channel_id), ConnectionState::Closed);
    assert_eq!(listener.close_events.lock().unwrap().as_slice(), &[CloseReason::ProtocolError]);
}

#[test]
fn heartbeat_exhausts_retries_and_closes() {
    let transport = Arc::new(RecordingTransport { sent: Mutex::new(Vec::new()) });
    let clock = Arc::new(SettableClock { now: Mutex::new(Instant::now()) });
    let listener = Arc::new(RecordingListener { frames: AtomicU32::new(0), close_events: Mutex::new(Vec::new()) });
    let manager = ConnectionManager::new(transport.clone(), clock.clone(), listener.clone());

    let server = SocketAddrV4::new(Ipv4Addr::new(10, 0, 0, 2), 3671);
    let data_endpoint = SocketAddrV4::new(Ipv4Addr::new(10, 0, 0, 2), 3672);
    let manager_bg = manager.clone();
    let responder = std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(20));
        manager_bg.on_packet(&connect_success_bytes(1, data_endpoint), server);
    });
    let channel_id = manager.connect(server, TunnelingLayer::LinkLayer).unwrap();
    responder.join().unwrap();

    // First attempt fires once HEARTBEAT_INTERVAL (60s) has elapsed; each
    // subsequent retry is gated 10s apart (scenario: 60s, 70s, 80s, 90s,
    // then close at 100s with no reply).
    clock.advance(Duration::from_secs(61));
    for _ in 0..5 {
        manager.tick_heartbeats();
        clock.advance(Duration::from_secs(10));
    }

    assert_eq!(manager.state(channel_id), ConnectionState::Closed);
    assert_eq!(listener.close_events.lock().unwrap().as_slice(), &[CloseReason::HeartbeatLost]);
}

#[test]
fn heartbeat_success_resets_retry_counter() {
    let transport = Arc::new(RecordingTransport { sent: Mutex::new(Vec::new()) });
    let clock = Arc::new(SettableClock { now: Mutex::new(Instant::now()) });
    let listener = Arc::new(RecordingListener { frames: AtomicU32::new(0), close_events: Mutex::new(Vec::new()) });
    let manager = ConnectionManager::new(transport.clone(), clock.clone(), listener.clone());

    let server = SocketAddrV4::new(Ipv4Addr::new(10, 0, 0, 2), 3671);
    let data_endpoint = SocketAddrV4::new(Ipv4Addr::new(10, 0, 0, 2), 3672);
    let manager_bg = manager.clone();
    let responder = std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(20));
        manager_bg.on_packet(&connect_success_bytes(2, data_endpoint), server);
    });
    let channel_id = manager.connect(server, TunnelingLayer::LinkLayer).unwrap();
    responder.join().unwrap();

    clock.advance(Duration::from_secs(61));
    manager.tick_heartbeats();

    let response_body = ServiceBody::ConnectionstateResponse { channel_id, status: Status::NO_ERROR };
    let bytes = frame_bytes(knx_ip_core::codec::service::service_type::CONNECTIONSTATE_RESPONSE, &response_body);
    manager.on_packet(&bytes, server);

    assert_eq!(manager.state(channel_id), ConnectionState::Open);
    assert!(listener.close_events.lock().unwrap().is_empty());
}
