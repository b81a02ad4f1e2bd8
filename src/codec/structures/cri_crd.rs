//! CRI/CRD — Connection Request/Response Information. Variable-length,
//! keyed by a connection type byte; only TUNNEL and DEVICE_MGMT carry
//! type-specific payload we interpret, the remaining types round-trip as
//! opaque bytes.

use crate::codec::primitive::{BigEndianReader, BigEndianWriter};
use crate::error::Error;
use std::io::Cursor;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionType {
	DeviceMgmt = 0x03,
	Tunnel = 0x04,
	RemLog = 0x06,
	RemConf = 0x07,
	ObjSvr = 0x08,
}

impl TryFrom<u8> for ConnectionType {
	type Error = Error;
	fn try_from(v: u8) -> Result<ConnectionType, Error> {
		match v {
			0x03 => Ok(ConnectionType::DeviceMgmt),
			0x04 => Ok(ConnectionType::Tunnel),
			0x06 => Ok(ConnectionType::RemLog),
			0x07 => Ok(ConnectionType::RemConf),
			0x08 => Ok(ConnectionType::ObjSvr),
			x => Err(Error::UnsupportedConnectionType(x)),
		}
	}
}

/// KNX tunneling layer, carried in the reserved byte of a tunneling CRI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TunnelingLayer {
	LinkLayer = 0x02,
	Raw = 0x04,
	Busmonitor = 0x80,
}

impl TryFrom<u8> for TunnelingLayer {
	type Error = Error;
	fn try_from(v: u8) -> Result<TunnelingLayer, Error> {
		match v {
			0x02 => Ok(TunnelingLayer::LinkLayer),
			0x04 => Ok(TunnelingLayer::Raw),
			0x80 => Ok(TunnelingLayer::Busmonitor),
			x => Err(Error::MalformedFrame(format!(
				"unknown tunneling layer {:#04x}",
				x
			))),
		}
	}
}

/// Connection Request Information.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cri {
	Tunnel { layer: TunnelingLayer },
	DeviceMgmt,
	Opaque { conn_type: u8, data: Vec<u8> },
}

impl Cri {
	pub fn wire_len(&self) -> usize {
		match self {
			Cri::Tunnel { .. } => 4,
			Cri::DeviceMgmt => 2,
			Cri::Opaque { data, .. } => 2 + data.len(),
		}
	}

	pub fn pack(&self, out: &mut Vec<u8>) {
		out.write_val(self.wire_len() as u8).unwrap();
		match self {
			Cri::Tunnel { layer } => {
				out.write_val(ConnectionType::Tunnel as u8).unwrap();
				out.write_val(*layer as u8).unwrap();
				out.write_val(0u8).unwrap();
			}
			Cri::DeviceMgmt => {
				out.write_val(ConnectionType::DeviceMgmt as u8).unwrap();
			}
			Cri::Opaque { conn_type, data } => {
				out.write_val(*conn_type).unwrap();
				out.extend_from_slice(data);
			}
		}
	}

	pub fn unpack(buf: &[u8]) -> Result<Cri, Error> {
		if buf.len() < 2 {
			return Err(Error::LengthMismatch {
				declared: 2,
				available: buf.len(),
			});
		}
		let mut c = Cursor::new(buf);
		let struct_len: u8 = c.read_val()?;
		if struct_len as usize > buf.len() {
			return Err(Error::LengthMismatch {
				declared: struct_len as usize,
				available: buf.len(),
			});
		}
		let conn_type: u8 = c.read_val()?;
		let rest = &buf[2..struct_len as usize];
		match conn_type {
			0x04 => {
				if rest.is_empty() {
					return Err(Error::MalformedFrame("tunneling CRI missing layer".into()));
				}
				let layer = TunnelingLayer::try_from(rest[0])?;
				Ok(Cri::Tunnel { layer })
			}
			0x03 => Ok(Cri::DeviceMgmt),
			_ => Ok(Cri::Opaque {
				conn_type,
				data: rest.to_vec(),
			}),
		}
	}
}

/// Connection Response Data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Crd {
	Tunnel { individual_address: u16 },
	DeviceMgmt,
	Opaque { conn_type: u8, data: Vec<u8> },
}

impl Crd {
	pub fn wire_len(&self) -> usize {
		match self {
			Crd::Tunnel { .. } => 4,
			Crd::DeviceMgmt => 2,
			Crd::Opaque { data, .. } => 2 + data.len(),
		}
	}

	pub fn pack(&self, out: &mut Vec<u8>) {
		out.write_val(self.wire_len() as u8).unwrap();
		match self {
			Crd::Tunnel { individual_address } => {
				out.write_val(ConnectionType::Tunnel as u8).unwrap();
				out.write_val(*individual_address).unwrap();
			}
			Crd::DeviceMgmt => {
				out.write_val(ConnectionType::DeviceMgmt as u8).unwrap();
			}
			Crd::Opaque { conn_type, data } => {
				out.write_val(*conn_type).unwrap();
				out.extend_from_slice(data);
			}
		}
	}

	pub fn unpack(buf: &[u8]) -> Result<Crd, Error> {
		if buf.len() < 2 {
			return Err(Error::LengthMismatch {
				declared: 2,
				available: buf.len(),
			});
		}
		let mut c = Cursor::new(buf);
		let struct_len: u8 = c.read_val()?;
		if struct_len as usize > buf.len() {
			return Err(Error::LengthMismatch {
				declared: struct_len as usize,
				available: buf.len(),
			});
		}
		let conn_type: u8 = c.read_val()?;
		let rest = &buf[2..struct_len as usize];
		match conn_type {
			0x04 => {
				if rest.len() < 2 {
					return Err(Error::MalformedFrame("tunneling CRD missing address".into()));
				}
				let mut rc = Cursor::new(rest);
				let individual_address: u16 = rc.read_val()?;
				Ok(Crd::Tunnel { individual_address })
			}
			0x03 => Ok(Crd::DeviceMgmt),
			_ => Ok(Crd::Opaque {
				conn_type,
				data: rest.to_vec(),
			}),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn tunnel_cri_round_trip() {
		let cri = Cri::Tunnel {
			layer: TunnelingLayer::LinkLayer,
		};
		let mut v = Vec::new();
		cri.pack(&mut v);
		assert_eq!(v, vec![0x04, 0x04, 0x02, 0x00]);
		assert_eq!(Cri::unpack(&v).unwrap(), cri);
	}

	#[test]
	fn tunnel_crd_round_trip_scenario_b() {
		let crd = Crd::unpack(&[0x04, 0x04, 0x02, 0x00]).unwrap();
		assert_eq!(
			crd,
			Crd::Tunnel {
				individual_address: 0x0200
			}
		);
		let mut v = Vec::new();
		crd.pack(&mut v);
		assert_eq!(v, vec![0x04, 0x04, 0x02, 0x00]);
	}
}
