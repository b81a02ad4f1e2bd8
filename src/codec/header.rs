//! KNXnet/IP header: the 6-byte prefix on every frame.
//!
//! `06 10 SS SS LL LL` — header size, protocol version, service type, total
//! length (including this header).

use crate::codec::primitive::{BigEndianReader, BigEndianWriter};
use crate::error::Error;
use std::io::Cursor;

pub const HEADER_SIZE: usize = 6;
pub const PROTOCOL_VERSION: u8 = 0x10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
	pub service_type: u16,
	pub total_length: u16,
}

impl Header {
	pub fn new(service_type: u16, body_len: usize) -> Header {
		Header {
			service_type,
			total_length: (HEADER_SIZE + body_len) as u16,
		}
	}

	pub fn pack(&self) -> Vec<u8> {
		let mut v = Vec::with_capacity(HEADER_SIZE);
		v.write_val(HEADER_SIZE as u8).unwrap();
		v.write_val(PROTOCOL_VERSION).unwrap();
		v.write_val(self.service_type).unwrap();
		v.write_val(self.total_length).unwrap();
		v
	}

	/// Parses the header from the front of `buf`. Does not consume `buf`;
	/// callers index past `HEADER_SIZE` for the body.
	pub fn unpack(buf: &[u8]) -> Result<Header, Error> {
		if buf.len() < HEADER_SIZE {
			return Err(Error::LengthMismatch {
				declared: HEADER_SIZE,
				available: buf.len(),
			});
		}
		let mut c = Cursor::new(buf);
		let size: u8 = c.read_val()?;
		if size as usize != HEADER_SIZE {
			return Err(Error::MalformedFrame(format!(
				"header size {} != {}",
				size, HEADER_SIZE
			)));
		}
		let version: u8 = c.read_val()?;
		if version != PROTOCOL_VERSION {
			return Err(Error::UnsupportedVersion(version));
		}
		let service_type: u16 = c.read_val()?;
		let total_length: u16 = c.read_val()?;
		if (total_length as usize) < HEADER_SIZE {
			return Err(Error::MalformedFrame(format!(
				"total_length {} smaller than header size",
				total_length
			)));
		}
		if total_length as usize > buf.len() {
			return Err(Error::LengthMismatch {
				declared: total_length as usize,
				available: buf.len(),
			});
		}
		Ok(Header {
			service_type,
			total_length,
		})
	}

	pub fn body_len(&self) -> usize {
		self.total_length as usize - HEADER_SIZE
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn round_trip() {
		let h = Header::new(0x0201, 8);
		let bytes = h.pack();
		assert_eq!(bytes, vec![0x06, 0x10, 0x02, 0x01, 0x00, 0x0E]);
		let parsed = Header::unpack(&bytes).unwrap();
		assert_eq!(parsed, h);
	}

	#[test]
	fn rejects_bad_version() {
		let bytes = vec![0x06, 0x11, 0x02, 0x01, 0x00, 0x0E];
		assert!(matches!(
			Header::unpack(&bytes),
			Err(Error::UnsupportedVersion(0x11))
		));
	}

	#[test]
	fn rejects_length_mismatch() {
		let bytes = vec![0x06, 0x10, 0x02, 0x01, 0x00, 0x20];
		assert!(matches!(
			Header::unpack(&bytes),
			Err(Error::LengthMismatch { .. })
		));
	}

	#[test]
	fn rejects_bad_header_size() {
		let bytes = vec![0x07, 0x10, 0x02, 0x01, 0x00, 0x0E, 0x00];
		assert!(matches!(
			Header::unpack(&bytes),
			Err(Error::MalformedFrame(_))
		));
	}
}
