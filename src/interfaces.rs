//! Collaborator traits the core depends on but never implements itself.
//! The core never touches `std::net` or a wall clock directly — an embedder
//! supplies a `Transport` and a `Clock`, and registers a `Listener` to learn
//! about inbound frames and connection-lifecycle events.

use crate::cemi::CemiFrame;
use crate::connection::{CloseReason, ConnectionState};
use crate::error::Result;
use std::net::SocketAddrV4;
use std::time::{Duration, Instant};

/// Sends raw KNXnet/IP datagrams and reports the local endpoint used for
/// HPAI construction. Implemented by the embedder over a real UDP socket
/// (or an in-memory fake in tests).
pub trait Transport: Send + Sync {
    fn send(&self, bytes: &[u8], destination: SocketAddrV4) -> Result<()>;
    fn local_endpoint(&self) -> SocketAddrV4;
}

/// A handle to a scheduled callback; dropping it does not cancel the
/// timer — call `cancel` explicitly.
pub trait TimerHandle: Send {
    fn cancel(&self);
}

/// Time source and timer scheduler, injected so the state machine's retry
/// and heartbeat logic can be driven deterministically in tests.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
    fn schedule(&self, after: Duration, callback: Box<dyn FnOnce() + Send>) -> Box<dyn TimerHandle>;
}

/// Notified of inbound application data and connection-lifecycle events.
/// Callbacks run on whatever thread drives `ConnectionManager::on_packet`
/// and must return quickly; they must not issue a blocking `send` on the
/// same connection (that is rejected with `Error::IllegalState`).
pub trait Listener: Send + Sync {
    fn on_frame(&self, cemi: &CemiFrame);
    fn on_state_change(&self, state: ConnectionState, reason: CloseReason);
    fn on_lost_messages(&self, count: u16, device_state: u8);
}

/// Seam for an embedder to plug in KNXnet/IP Secure wrapping. No
/// cryptography happens in this crate; `SecureSessionRequest` is framed but
/// never interpreted here.
pub trait SecureSession: Send + Sync {
    fn wrap(&self, bytes: &[u8]) -> Result<Vec<u8>>;
    fn unwrap(&self, bytes: &[u8]) -> Result<Vec<u8>>;
}
