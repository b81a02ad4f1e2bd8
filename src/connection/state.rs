//! Connection lifecycle states and the reasons a connection closes.

/// `Closed -> Connecting -> Open -> Closing -> Closed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionState {
    Closed,
    Connecting,
    Open,
    Closing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CloseReason {
    /// A clean `Disconnect.req`/`Disconnect.res` exchange initiated locally.
    Normal,
    /// The peer sent `Disconnect.req`.
    RemoteInitiated,
    /// The heartbeat exhausted its retries.
    HeartbeatLost,
    /// An ack/connect/heartbeat timer elapsed without recovery.
    Timeout,
    /// `Transport::send` failed.
    TransportError,
    /// A received frame violated the protocol (bad seq, malformed body).
    ProtocolError,
}

/// How `Connection::send` should behave once the frame is on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockingMode {
    /// Return as soon as the frame is handed to the transport.
    NonBlocking,
    /// Block until the matching `Tunneling.ack` arrives.
    WaitForAck,
    /// Block until the matching `Tunneling.ack` AND the mirroring
    /// `L_Data.con` have both been observed.
    WaitForCon,
}
