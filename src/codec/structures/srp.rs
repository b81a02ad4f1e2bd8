//! SRP — Search Request Parameter, a small TLV used by extended (v2)
//! search requests to filter responses.

use crate::error::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SrpType {
	SelectByProgrammingMode = 0x01,
	SelectByMacAddress = 0x02,
	SelectByService = 0x03,
	RequestDibs = 0x04,
}

impl SrpType {
	fn from_u8(v: u8) -> Option<SrpType> {
		Some(match v {
			0x01 => SrpType::SelectByProgrammingMode,
			0x02 => SrpType::SelectByMacAddress,
			0x03 => SrpType::SelectByService,
			0x04 => SrpType::RequestDibs,
			_ => return None,
		})
	}
}

/// Search Request Parameter. The top bit of the type byte is the
/// `mandatory` flag: a server that doesn't understand a mandatory SRP must
/// not respond at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Srp {
	pub mandatory: bool,
	pub srp_type: u8,
	pub data: Vec<u8>,
}

impl Srp {
	pub fn wire_len(&self) -> usize {
		2 + self.data.len()
	}

	pub fn pack(&self, out: &mut Vec<u8>) {
		let len = self.wire_len();
		out.push(len as u8);
		let tag = self.srp_type | if self.mandatory { 0x80 } else { 0 };
		out.push(tag);
		out.extend_from_slice(&self.data);
	}

	pub fn unpack(buf: &[u8]) -> Result<(Srp, usize), Error> {
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
		let tag = buf[1];
		let mandatory = tag & 0x80 != 0;
		let srp_type = tag & 0x7F;
		let data = buf[2..struct_len].to_vec();
		Ok((
			Srp {
				mandatory,
				srp_type,
				data,
			},
			struct_len,
		))
	}

	pub fn typed(&self) -> Option<SrpType> {
		SrpType::from_u8(self.srp_type)
	}
}

pub fn pack_all(srps: &[Srp], out: &mut Vec<u8>) {
	for s in srps {
		s.pack(out);
	}
}

pub fn unpack_all(mut buf: &[u8]) -> Result<Vec<Srp>, Error> {
	let mut out = Vec::new();
	while !buf.is_empty() {
		let (srp, consumed) = Srp::unpack(buf)?;
		out.push(srp);
		buf = &buf[consumed..];
	}
	Ok(out)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn round_trip_mandatory() {
		let srp = Srp {
			mandatory: true,
			srp_type: SrpType::SelectByProgrammingMode as u8,
			data: vec![],
		};
		let mut out = Vec::new();
		srp.pack(&mut out);
		assert_eq!(out, vec![0x02, 0x81]);
		let (parsed, consumed) = Srp::unpack(&out).unwrap();
		assert_eq!(consumed, 2);
		assert_eq!(parsed, srp);
		assert_eq!(parsed.typed(), Some(SrpType::SelectByProgrammingMode));
	}
}
