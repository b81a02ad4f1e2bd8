use std::io;
use thiserror::Error;

/// Crate-wide error type covering codec failures, connection-state-machine
/// faults, and API misuse.
#[derive(Error, Debug)]
pub enum Error {
	/// A frame failed structural validation (bad header, truncated body,
	/// duplicate DIB, out-of-range field). The receive path should drop the
	/// frame and keep receiving; this must never tear down a connection.
	#[error("malformed frame: {0}")]
	MalformedFrame(String),

	/// Header `version` was not `0x10`.
	#[error("unsupported protocol version: {0:#04x}")]
	UnsupportedVersion(u8),

	/// Header `total_length` disagreed with the bytes actually available.
	#[error("length mismatch: header declared {declared}, buffer had {available}")]
	LengthMismatch { declared: usize, available: usize },

	/// Header `service_type` did not match any known service.
	#[error("unsupported service type: {0:#06x}")]
	UnsupportedServiceType(u16),

	/// A CRI/CRD connection type this crate does not implement.
	#[error("unsupported connection type: {0:#04x}")]
	UnsupportedConnectionType(u8),

	/// A received sequence number fell outside the expected window.
	#[error("sequence number error: expected {expected}, got {actual}")]
	SequenceNumber { expected: u8, actual: u8 },

	/// A connect/heartbeat/ack timer elapsed without a matching response.
	#[error("timed out waiting for {0}")]
	Timeout(&'static str),

	/// Operation attempted on a connection that is already closed.
	#[error("connection closed")]
	ConnectionClosed,

	/// API misuse: a value was out of its legal range at construction time.
	#[error("illegal argument: {0}")]
	IllegalArgument(String),

	/// A DPT translator's `set_data`/`get_data` buffer did not match the
	/// size implied by its item count and type size.
	#[error("illegal buffer size: expected {expected}, got {actual}")]
	IllegalBufferSize { expected: usize, actual: usize },

	/// A DPT translator was given bytes that are not valid text in its
	/// declared encoding.
	#[error("malformed text: {0}")]
	MalformedText(String),

	/// A blocking send was attempted re-entrantly from within a `Listener`
	/// callback on the same connection.
	#[error("illegal state: {0}")]
	IllegalState(&'static str),

	/// The injected `Transport` failed to send.
	#[error("transport error: {0}")]
	TransportError(String),

	#[error("i/o error")]
	Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
