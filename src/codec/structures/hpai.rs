//! HPAI — Host Protocol Address Information: an 8-byte `struct_len(1) +
//! host_protocol(1) + ipv4(4) + port(2)` tuple carried by nearly every
//! service body in this protocol.

use crate::codec::primitive::{BigEndianReader, BigEndianWriter};
use crate::error::Error;
use std::io::Cursor;
use std::net::{Ipv4Addr, SocketAddrV4};

pub const HPAI_LEN: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostProtocol {
	Udp = 0x01,
	Tcp = 0x02,
}

impl TryFrom<u8> for HostProtocol {
	type Error = Error;
	fn try_from(v: u8) -> Result<HostProtocol, Error> {
		match v {
			0x01 => Ok(HostProtocol::Udp),
			0x02 => Ok(HostProtocol::Tcp),
			x => Err(Error::MalformedFrame(format!(
				"unknown host protocol {:#04x}",
				x
			))),
		}
	}
}

/// Host Protocol Address Information.
///
/// `0.0.0.0:0` is the NAT-traversal sentinel meaning "use the transport's
/// observed source address instead of this field".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hpai {
	pub host_protocol: HostProtocol,
	pub addr: SocketAddrV4,
}

impl Hpai {
	pub fn new(host_protocol: HostProtocol, addr: SocketAddrV4) -> Hpai {
		Hpai { host_protocol, addr }
	}

	/// The NAT-traversal sentinel: "use the transport source address".
	pub fn use_transport_source(host_protocol: HostProtocol) -> Hpai {
		Hpai {
			host_protocol,
			addr: SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, 0),
		}
	}

	pub fn wire_len(&self) -> usize {
		HPAI_LEN
	}

	pub fn pack(&self, out: &mut Vec<u8>) {
		out.write_val(HPAI_LEN as u8).unwrap();
		out.write_val(self.host_protocol as u8).unwrap();
		out.extend_from_slice(&self.addr.ip().octets());
		out.write_val(self.addr.port()).unwrap();
	}

	pub fn unpack(buf: &[u8]) -> Result<Hpai, Error> {
		if buf.len() < HPAI_LEN {
			return Err(Error::LengthMismatch {
				declared: HPAI_LEN,
				available: buf.len(),
			});
		}
		let mut c = Cursor::new(buf);
		let struct_len: u8 = c.read_val()?;
		if struct_len as usize != HPAI_LEN {
			return Err(Error::MalformedFrame(format!(
				"HPAI struct_len {} != {}",
				struct_len, HPAI_LEN
			)));
		}
		let host_protocol: u8 = c.read_val()?;
		let host_protocol = HostProtocol::try_from(host_protocol)?;
		let a: u8 = c.read_val()?;
		let b: u8 = c.read_val()?;
		let cc: u8 = c.read_val()?;
		let d: u8 = c.read_val()?;
		let port: u16 = c.read_val()?;
		Ok(Hpai {
			host_protocol,
			addr: SocketAddrV4::new(Ipv4Addr::new(a, b, cc, d), port),
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn round_trip_scenario_a() {
		let hpai = Hpai::unpack(&[0x08, 0x01, 0xC0, 0xA8, 0x01, 0x02, 0x0E, 0x57]).unwrap();
		assert_eq!(hpai.host_protocol, HostProtocol::Udp);
		assert_eq!(hpai.addr, "192.168.1.2:3671".parse().unwrap());
		let mut out = Vec::new();
		hpai.pack(&mut out);
		assert_eq!(out, vec![0x08, 0x01, 0xC0, 0xA8, 0x01, 0x02, 0x0E, 0x57]);
	}

	#[test]
	fn nat_sentinel() {
		let hpai = Hpai::use_transport_source(HostProtocol::Udp);
		assert_eq!(hpai.addr.ip(), &Ipv4Addr::UNSPECIFIED);
		assert_eq!(hpai.addr.port(), 0);
	}

	#[test]
	fn rejects_bad_struct_len() {
		let bytes = [0x09, 0x01, 0, 0, 0, 0, 0, 0];
		assert!(Hpai::unpack(&bytes).is_err());
	}
}
