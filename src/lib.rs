//! Core KNXnet/IP protocol stack: the service-type wire codec, the cEMI
//! frame layer it carries, the datapoint-type translators that give
//! group-address payloads meaning, and the tunneling/routing connection
//! lifecycle.
//!
//! This is a low-level library: it never touches `std::net` or a wall
//! clock itself. An embedder supplies a [`interfaces::Transport`] and a
//! [`interfaces::Clock`], drives [`connection::ConnectionManager`] /
//! [`routing::RoutingEngine`] with received datagrams, and registers a
//! [`interfaces::Listener`] to learn about inbound frames and
//! connection-lifecycle events.
//!
//! # Layering
//!
//! - [`codec`] — header, service-type tagged union, and the small
//!   structures (HPAI, CRI/CRD, DIB, SRP) those services are built from.
//! - [`cemi`] — the Common External Message Interface frame carried
//!   inside `Tunneling.req`, `Device-configuration.req` and
//!   `Routing.ind` bodies.
//! - [`dpt`] — datapoint-type translators between group-address payload
//!   bytes and textual/strongly-typed values.
//! - [`connection`] — per-channel sequence/heartbeat state and the
//!   table of live tunneling/device-management connections.
//! - [`routing`] — connectionless multicast delivery and Routing-busy
//!   backpressure.

pub mod cemi;
pub mod codec;
pub mod connection;
pub mod dpt;
pub mod error;
pub mod interfaces;
pub mod routing;

pub use cemi::{Apci, CemiFrame, ControlField1, ControlField2, LData, MessageCode, Npdu, PropertyAccess, Tpci};
pub use codec::header::Header;
pub use codec::service::{CemiPayload, ConnHeader, ConnectResponse, FeatureId, ServiceBody, Status};
pub use codec::structures::{ConnectionType, Cri, Crd, DibSet, Hpai, HostProtocol, Srp, TunnelingLayer};
pub use connection::{BlockingMode, CloseReason, Connection, ConnectionManager, ConnectionState};
pub use dpt::DptXlator;
pub use error::{Error, Result};
pub use interfaces::{Clock, Listener, SecureSession, TimerHandle, Transport};
pub use routing::RoutingEngine;
