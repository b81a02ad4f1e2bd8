//! Connection lifecycle: per-channel sequence/heartbeat state
//! ([`Connection`]) and the table of live channels dispatched by
//! [`ConnectionManager::on_packet`].

mod connection;
mod manager;
mod state;

pub use connection::Connection;
pub use manager::ConnectionManager;
pub use state::{BlockingMode, CloseReason, ConnectionState};
