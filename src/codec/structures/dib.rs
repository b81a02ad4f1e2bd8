//! DIB — Description Information Block. A `struct_len(1) + dib_type(1) +
//! payload` TLV. `DescriptionResponse` carries a set of these keyed by
//! type; each type may appear at most once.

use crate::codec::primitive::{BigEndianReader, BigEndianWriter};
use crate::error::Error;
use std::io::Cursor;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DibType {
	DeviceInfo = 0x01,
	SuppSvcFamilies = 0x02,
	IpConfig = 0x03,
	IpCurrentConfig = 0x04,
	KnxAddresses = 0x05,
	SecureServiceFamilies = 0x06,
	TunnelingInfo = 0x07,
	AdditionalDeviceInfo = 0x08,
	MfrData = 0xFE,
}

impl DibType {
	fn from_u8(v: u8) -> Option<DibType> {
		Some(match v {
			0x01 => DibType::DeviceInfo,
			0x02 => DibType::SuppSvcFamilies,
			0x03 => DibType::IpConfig,
			0x04 => DibType::IpCurrentConfig,
			0x05 => DibType::KnxAddresses,
			0x06 => DibType::SecureServiceFamilies,
			0x07 => DibType::TunnelingInfo,
			0x08 => DibType::AdditionalDeviceInfo,
			0xFE => DibType::MfrData,
			_ => return None,
		})
	}
}

/// A service family entry inside `SuppSvcFamilies`: family id + version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceFamily {
	pub id: u8,
	pub version: u8,
}

/// A single Description Information Block.
///
/// `Unknown` preserves the raw bytes of a DIB type this crate does not
/// interpret, so a `DescriptionResponse` can still be re-serialized
/// byte-exact (forward compatibility, §4.2).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dib {
	DeviceInfo {
		knx_medium: u8,
		device_status: u8,
		individual_address: u16,
		project_install_id: u16,
		serial_number: [u8; 6],
		multicast_address: [u8; 4],
		mac_address: [u8; 6],
		friendly_name: [u8; 30],
	},
	SuppSvcFamilies {
		families: Vec<ServiceFamily>,
	},
	Unknown {
		dib_type: u8,
		data: Vec<u8>,
	},
}

impl Dib {
	pub fn dib_type(&self) -> u8 {
		match self {
			Dib::DeviceInfo { .. } => DibType::DeviceInfo as u8,
			Dib::SuppSvcFamilies { .. } => DibType::SuppSvcFamilies as u8,
			Dib::Unknown { dib_type, .. } => *dib_type,
		}
	}

	pub fn wire_len(&self) -> usize {
		match self {
			Dib::DeviceInfo { .. } => 54,
			Dib::SuppSvcFamilies { families } => 2 + families.len() * 2,
			Dib::Unknown { data, .. } => 2 + data.len(),
		}
	}

	pub fn pack(&self, out: &mut Vec<u8>) {
		out.write_val(self.wire_len() as u8).unwrap();
		out.write_val(self.dib_type()).unwrap();
		match self {
			Dib::DeviceInfo {
				knx_medium,
				device_status,
				individual_address,
				project_install_id,
				serial_number,
				multicast_address,
				mac_address,
				friendly_name,
			} => {
				out.write_val(*knx_medium).unwrap();
				out.write_val(*device_status).unwrap();
				out.write_val(*individual_address).unwrap();
				out.write_val(*project_install_id).unwrap();
				out.extend_from_slice(serial_number);
				out.extend_from_slice(multicast_address);
				out.extend_from_slice(mac_address);
				out.extend_from_slice(friendly_name);
			}
			Dib::SuppSvcFamilies { families } => {
				for f in families {
					out.write_val(f.id).unwrap();
					out.write_val(f.version).unwrap();
				}
			}
			Dib::Unknown { data, .. } => out.extend_from_slice(data),
		}
	}

	/// Parses one DIB from the front of `buf`, returning it and the number
	/// of bytes consumed.
	pub fn unpack(buf: &[u8]) -> Result<(Dib, usize), Error> {
		if buf.len() < 2 {
			return Err(Error::LengthMismatch {
				declared: 2,
				available: buf.len(),
			});
		}
		let struct_len = buf[0] as usize;
		if struct_len < 2 || struct_len > buf.len() {
			return Err(Error::LengthMismatch {
				declared: struct_len,
				available: buf.len(),
			});
		}
		let dib_type = buf[1];
		let body = &buf[2..struct_len];
		let dib = match DibType::from_u8(dib_type) {
			Some(DibType::DeviceInfo) => {
				if body.len() != 52 {
					return Err(Error::MalformedFrame(format!(
						"DeviceInfo DIB body len {} != 52",
						body.len()
					)));
				}
				let mut c = Cursor::new(body);
				let knx_medium: u8 = c.read_val()?;
				let device_status: u8 = c.read_val()?;
				let individual_address: u16 = c.read_val()?;
				let project_install_id: u16 = c.read_val()?;
				let mut serial_number = [0u8; 6];
				serial_number.copy_from_slice(&body[6..12]);
				let mut multicast_address = [0u8; 4];
				multicast_address.copy_from_slice(&body[12..16]);
				let mut mac_address = [0u8; 6];
				mac_address.copy_from_slice(&body[16..22]);
				let mut friendly_name = [0u8; 30];
				friendly_name.copy_from_slice(&body[22..52]);
				Dib::DeviceInfo {
					knx_medium,
					device_status,
					individual_address,
					project_install_id,
					serial_number,
					multicast_address,
					mac_address,
					friendly_name,
				}
			}
			Some(DibType::SuppSvcFamilies) => {
				if body.len() % 2 != 0 {
					return Err(Error::MalformedFrame(
						"SuppSvcFamilies DIB body length not a multiple of 2".into(),
					));
				}
				let families = body
					.chunks_exact(2)
					.map(|c| ServiceFamily {
						id: c[0],
						version: c[1],
					})
					.collect();
				Dib::SuppSvcFamilies { families }
			}
			_ => Dib::Unknown {
				dib_type,
				data: body.to_vec(),
			},
		};
		Ok((dib, struct_len))
	}
}

/// The set of DIBs carried in a `Description.res`. Enforces "each type
/// appears at most once" at construction and parse time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DibSet {
	dibs: Vec<Dib>,
}

impl DibSet {
	pub fn new(dibs: Vec<Dib>) -> Result<DibSet, Error> {
		let mut seen = std::collections::HashSet::new();
		for d in &dibs {
			if !seen.insert(d.dib_type()) {
				return Err(Error::MalformedFrame(format!(
					"duplicate DIB type {:#04x}",
					d.dib_type()
				)));
			}
		}
		Ok(DibSet { dibs })
	}

	pub fn iter(&self) -> impl Iterator<Item = &Dib> {
		self.dibs.iter()
	}

	pub fn get(&self, dib_type: u8) -> Option<&Dib> {
		self.dibs.iter().find(|d| d.dib_type() == dib_type)
	}

	pub fn has_device_info(&self) -> bool {
		self.dibs.iter().any(|d| matches!(d, Dib::DeviceInfo { .. }))
	}

	pub fn has_supp_svc_families(&self) -> bool {
		self.dibs
			.iter()
			.any(|d| matches!(d, Dib::SuppSvcFamilies { .. }))
	}

	pub fn wire_len(&self) -> usize {
		self.dibs.iter().map(|d| d.wire_len()).sum()
	}

	pub fn pack(&self, out: &mut Vec<u8>) {
		for d in &self.dibs {
			d.pack(out);
		}
	}

	pub fn unpack(mut buf: &[u8]) -> Result<DibSet, Error> {
		let mut dibs = Vec::new();
		let mut seen = std::collections::HashSet::new();
		while !buf.is_empty() {
			let (dib, consumed) = Dib::unpack(buf)?;
			if !matches!(dib, Dib::Unknown { .. }) && !seen.insert(dib.dib_type()) {
				return Err(Error::MalformedFrame(format!(
					"duplicate DIB type {:#04x}",
					dib.dib_type()
				)));
			}
			if matches!(dib, Dib::Unknown { .. }) {
				tracing::debug!(dib_type = dib.dib_type(), "skipping unknown DIB type");
			}
			dibs.push(dib);
			buf = &buf[consumed..];
		}
		Ok(DibSet { dibs })
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn rejects_duplicate_dib_type() {
		let families = Dib::SuppSvcFamilies {
			families: vec![ServiceFamily { id: 2, version: 1 }],
		};
		let dup = families.clone();
		assert!(DibSet::new(vec![families, dup]).is_err());
	}

	#[test]
	fn supp_svc_families_round_trip() {
		let dib = Dib::SuppSvcFamilies {
			families: vec![
				ServiceFamily { id: 2, version: 1 },
				ServiceFamily { id: 3, version: 2 },
			],
		};
		let mut out = Vec::new();
		dib.pack(&mut out);
		let (parsed, consumed) = Dib::unpack(&out).unwrap();
		assert_eq!(consumed, out.len());
		assert_eq!(parsed, dib);
	}

	#[test]
	fn unknown_dib_skipped_but_preserved() {
		let raw = [0x04u8, 0xFE, 0xAB, 0xCD];
		let (dib, consumed) = Dib::unpack(&raw).unwrap();
		assert_eq!(consumed, 4);
		match dib {
			Dib::Unknown { dib_type, data } => {
				assert_eq!(dib_type, 0xFE);
				assert_eq!(data, vec![0xAB, 0xCD]);
			}
			_ => panic!("expected Unknown"),
		}
	}
}
