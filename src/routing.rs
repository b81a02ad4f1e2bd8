//! Multicast routing (C8): unacked `Routing.ind` delivery plus the
//! Routing-busy congestion window. No connection state here — the table
//! this module owns is a single congestion counter, not a per-peer map,
//! so it needs none of `connection::Connection`'s sequence bookkeeping.

use crate::cemi::CemiFrame;
use crate::codec::header::Header;
use crate::codec::service::{service_type, ServiceBody};
use crate::error::Result;
use crate::error::Error;
use crate::interfaces::{Clock, Listener, Transport};
use std::net::{Ipv4Addr, SocketAddrV4};
use std::sync::{Arc, Mutex, Weak};
use std::time::{Duration, Instant};
use tracing::debug;

/// Standard KNXnet/IP routing multicast group.
pub const DEFAULT_MULTICAST_ADDR: SocketAddrV4 = SocketAddrV4::new(Ipv4Addr::new(224, 0, 23, 12), 3671);

struct RoutingInner {
    /// Count of `Routing-busy.ind` seen inside the current 10 ms window.
    busy_count: u32,
    blocked_until: Option<Instant>,
}

/// Sends and receives `Routing.ind` over multicast, applying the
/// Routing-busy backoff on the send path.
pub struct RoutingEngine {
    transport: Arc<dyn Transport>,
    clock: Arc<dyn Clock>,
    listener: Arc<dyn Listener>,
    multicast_addr: SocketAddrV4,
    inner: Mutex<RoutingInner>,
}

impl RoutingEngine {
    pub fn new(
        transport: Arc<dyn Transport>,
        clock: Arc<dyn Clock>,
        listener: Arc<dyn Listener>,
        multicast_addr: SocketAddrV4,
    ) -> Arc<RoutingEngine> {
        Arc::new(RoutingEngine {
            transport,
            clock,
            listener,
            multicast_addr,
            inner: Mutex::new(RoutingInner { busy_count: 0, blocked_until: None }),
        })
    }

    fn frame_bytes(service_type: u16, body: &ServiceBody) -> Vec<u8> {
        let mut body_bytes = Vec::new();
        body.write_to(&mut body_bytes);
        let mut out = Header::new(service_type, body_bytes.len()).pack();
        out.extend_from_slice(&body_bytes);
        out
    }

    /// Wraps `cemi` in `Routing.ind` and hands it to the multicast
    /// transport. Rejected with `IllegalState` while inside a
    /// Routing-busy backoff window.
    pub fn send(&self, cemi: &CemiFrame) -> Result<()> {
        {
            let inner = self.inner.lock().unwrap();
            if let Some(until) = inner.blocked_until {
                if self.clock.now() < until {
                    return Err(Error::IllegalState("blocked by Routing-busy backpressure"));
                }
            }
        }
        let body = ServiceBody::RoutingIndication { cemi: cemi.pack() };
        let bytes = Self::frame_bytes(service_type::ROUTING_INDICATION, &body);
        self.transport.send(&bytes, self.multicast_addr)
    }

    /// Feeds one received multicast datagram into the engine.
    pub fn on_packet(self: &Arc<Self>, bytes: &[u8], source: SocketAddrV4) {
        let _ = source;
        let header = match Header::unpack(bytes) {
            Ok(h) => h,
            Err(_) => return,
        };
        let body = match ServiceBody::parse(header.service_type, &bytes[6..header.total_length as usize]) {
            Ok(b) => b,
            Err(_) => return,
        };
        match body {
            ServiceBody::RoutingIndication { cemi } | ServiceBody::RoutingSystemBroadcast { cemi } => {
                if let Ok(frame) = CemiFrame::unpack(&cemi) {
                    self.listener.on_frame(&frame);
                }
            }
            ServiceBody::RoutingLostMessage { device_state, lost_count } => {
                self.listener.on_lost_messages(lost_count, device_state);
            }
            ServiceBody::RoutingBusyIndication { wait_millis, .. } => self.on_busy(wait_millis),
            _ => {}
        }
    }

    /// Opens a backoff window sized `wait_millis + rand(0,1) * N * 50 ms`,
    /// where `N` is the number of busy indications seen in the trailing
    /// 10 ms window, and schedules `N`'s decay once that window's
    /// `N * 100 ms` slow-duration has elapsed.
    fn on_busy(self: &Arc<Self>, wait_millis: u16) {
        let n = {
            let mut inner = self.inner.lock().unwrap();
            inner.busy_count += 1;
            let n = inner.busy_count;
            let jitter: f64 = rand::random();
            let backoff = Duration::from_millis(wait_millis as u64) + Duration::from_secs_f64(jitter * n as f64 * 0.05);
            inner.blocked_until = Some(self.clock.now() + backoff);
            debug!(wait_millis, busy_count = n, "Routing-busy received, backing off");
            n
        };

        let weak: Weak<RoutingEngine> = Arc::downgrade(self);
        let slow_duration = Duration::from_millis(n as u64 * 100);
        self.clock.schedule(
            slow_duration,
            Box::new(move || {
                if let Some(engine) = weak.upgrade() {
                    let mut inner = engine.inner.lock().unwrap();
                    inner.busy_count = inner.busy_count.saturating_sub(1);
                }
            }),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::{CloseReason, ConnectionState};
    use crate::interfaces::TimerHandle;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex as StdMutex;

    struct FakeTransport {
        sent: StdMutex<Vec<(Vec<u8>, SocketAddrV4)>>,
    }

    impl Transport for FakeTransport {
        fn send(&self, bytes: &[u8], destination: SocketAddrV4) -> Result<()> {
            self.sent.lock().unwrap().push((bytes.to_vec(), destination));
            Ok(())
        }
        fn local_endpoint(&self) -> SocketAddrV4 {
            SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, 0)
        }
    }

    struct FakeClock {
        now: StdMutex<Instant>,
    }

    impl Clock for FakeClock {
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

    struct CountingListener {
        frames: AtomicU32,
        lost: AtomicU32,
    }

    impl Listener for CountingListener {
        fn on_frame(&self, _cemi: &CemiFrame) {
            self.frames.fetch_add(1, Ordering::SeqCst);
        }
        fn on_state_change(&self, _state: ConnectionState, _reason: CloseReason) {}
        fn on_lost_messages(&self, _count: u16, _device_state: u8) {
            self.lost.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn harness() -> (Arc<RoutingEngine>, Arc<FakeTransport>, Arc<CountingListener>) {
        let transport = Arc::new(FakeTransport { sent: StdMutex::new(Vec::new()) });
        let clock = Arc::new(FakeClock { now: StdMutex::new(Instant::now()) });
        let listener = Arc::new(CountingListener { frames: AtomicU32::new(0), lost: AtomicU32::new(0) });
        let engine = RoutingEngine::new(transport.clone(), clock, listener.clone(), DEFAULT_MULTICAST_ADDR);
        (engine, transport, listener)
    }

    #[test]
    fn send_wraps_cemi_in_routing_indication() {
        let (engine, transport, _listener) = harness();
        let cemi = CemiFrame::Opaque { message_code: 0x2B, data: vec![0x01] };
        engine.send(&cemi).unwrap();
        let sent = transport.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].1, DEFAULT_MULTICAST_ADDR);
        let header = Header::unpack(&sent[0].0).unwrap();
        assert_eq!(header.service_type, service_type::ROUTING_INDICATION);
    }

    #[test]
    fn busy_indication_blocks_send_until_window_elapses() {
        let (engine, _transport, _listener) = harness();
        engine.on_busy(20);
        assert!(matches!(
            engine.send(&CemiFrame::Opaque { message_code: 0x2B, data: vec![] }),
            Err(Error::IllegalState(_))
        ));
    }

    #[test]
    fn inbound_routing_indication_reaches_listener() {
        let (engine, _transport, listener) = harness();
        let cemi = CemiFrame::Opaque { message_code: 0x2B, data: vec![0xAA] };
        let body = ServiceBody::RoutingIndication { cemi: cemi.pack() };
        let bytes = RoutingEngine::frame_bytes(service_type::ROUTING_INDICATION, &body);
        engine.on_packet(&bytes, SocketAddrV4::new(Ipv4Addr::new(10, 0, 0, 5), 3671));
        assert_eq!(listener.frames.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn inbound_routing_lost_message_reaches_listener() {
        let (engine, _transport, listener) = harness();
        let body = ServiceBody::RoutingLostMessage { device_state: 0x01, lost_count: 3 };
        let bytes = RoutingEngine::frame_bytes(service_type::ROUTING_LOST_MESSAGE, &body);
        engine.on_packet(&bytes, SocketAddrV4::new(Ipv4Addr::new(10, 0, 0, 5), 3671));
        assert_eq!(listener.lost.load(Ordering::SeqCst), 1);
    }
}
