//! Big-endian primitive reader/writer, generalized the way the LIFX codec
//! generalizes `byteorder` over a little-endian wire: one trait per
//! direction, implemented once via a macro over the integer widths the wire
//! format actually uses.

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use std::io;

pub trait BigEndianReader<T> {
	fn read_val(&mut self) -> io::Result<T>;
}

impl<R: ReadBytesExt> BigEndianReader<u8> for R {
	fn read_val(&mut self) -> io::Result<u8> {
		self.read_u8()
	}
}

impl<R: ReadBytesExt> BigEndianReader<i8> for R {
	fn read_val(&mut self) -> io::Result<i8> {
		self.read_i8()
	}
}

macro_rules! derive_reader {
	{ $( $m:ident: $t:ty ),* } => {
		$(
			impl<T: ReadBytesExt> BigEndianReader<$t> for T {
				fn read_val(&mut self) -> io::Result<$t> {
					self.$m::<BigEndian>()
				}
			}
		)*
	}
}
derive_reader! { read_u16: u16, read_i16: i16, read_u32: u32, read_i32: i32, read_u64: u64, read_i64: i64, read_f32: f32 }

pub trait BigEndianWriter<T>: WriteBytesExt {
	fn write_val(&mut self, v: T) -> io::Result<()>;
}

impl<T: WriteBytesExt> BigEndianWriter<u8> for T {
	fn write_val(&mut self, v: u8) -> io::Result<()> {
		self.write_u8(v)
	}
}

impl<T: WriteBytesExt> BigEndianWriter<i8> for T {
	fn write_val(&mut self, v: i8) -> io::Result<()> {
		self.write_i8(v)
	}
}

macro_rules! derive_writer {
	{ $( $m:ident: $t:ty ),* } => {
		$(
			impl<T: WriteBytesExt> BigEndianWriter<$t> for T {
				fn write_val(&mut self, v: $t) -> io::Result<()> {
					self.$m::<BigEndian>(v)
				}
			}
		)*
	}
}
derive_writer! { write_u16: u16, write_i16: i16, write_u32: u32, write_i32: i32, write_u64: u64, write_i64: i64, write_f32: f32 }

/// Reads exactly `N` bytes into an array, for fixed-size blocks (IPv4
/// addresses, ECDH keys, ...).
pub fn read_exact<const N: usize>(buf: &[u8]) -> io::Result<[u8; N]> {
	if buf.len() < N {
		return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "short buffer"));
	}
	let mut out = [0u8; N];
	out.copy_from_slice(&buf[..N]);
	Ok(out)
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::io::Cursor;

	#[test]
	fn round_trip_u16() {
		let mut v = Vec::new();
		v.write_val(0x1234u16).unwrap();
		assert_eq!(v, vec![0x12, 0x34]);
		let mut c = Cursor::new(&v);
		let got: u16 = c.read_val().unwrap();
		assert_eq!(got, 0x1234);
	}

	#[test]
	fn round_trip_i16() {
		let mut v = Vec::new();
		v.write_val(-1i16).unwrap();
		assert_eq!(v, vec![0xFF, 0xFF]);
	}
}
