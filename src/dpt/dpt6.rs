//! DPT 6.xxx — 8-bit signed, plus the Status-Mode3 subtype (6.020) which
//! overlays 5 status bits and a 2-bit mode selector (modes 0..2 only) on
//! the same byte.

use crate::dpt::translator::{check_buffer_size, DptXlator, SubType};
use crate::error::{Error, Result};

const SUB_TYPES: &[SubType] = &[
    SubType { id: "6.001", name: "Percent (-128..127)" },
    SubType { id: "6.020", name: "Status with Mode" },
];

#[derive(Debug, Clone, Default)]
pub struct Dpt6Xlator {
    data: Vec<u8>,
}

impl Dpt6Xlator {
    pub fn new(item_count: usize) -> Dpt6Xlator {
        Dpt6Xlator {
            data: vec![0u8; item_count],
        }
    }

    pub fn value(&self, item: usize) -> Result<i8> {
        self.data
            .get(item)
            .map(|b| *b as i8)
            .ok_or_else(|| Error::IllegalArgument(format!("item {} out of range", item)))
    }
}

impl DptXlator for Dpt6Xlator {
    fn set_values(&mut self, text: &[&str]) -> Result<()> {
        let mut out = Vec::with_capacity(text.len());
        for t in text {
            let v = t
                .trim()
                .parse::<i8>()
                .map_err(|_| Error::IllegalArgument(format!("not an 8-bit signed value: {}", t)))?;
            out.push(v as u8);
        }
        self.data = out;
        Ok(())
    }

    fn get_all_values(&self) -> Result<Vec<String>> {
        Ok(self.data.iter().map(|b| (*b as i8).to_string()).collect())
    }

    fn set_data(&mut self, data: &[u8]) -> Result<()> {
        check_buffer_size(data, self.item_count(), 1)?;
        self.data = data.to_vec();
        Ok(())
    }

    fn get_data(&self) -> &[u8] {
        &self.data
    }

    fn item_count(&self) -> usize {
        self.data.len()
    }

    fn type_size(&self) -> usize {
        1
    }

    fn numeric_value(&self, item: usize) -> Result<f64> {
        Ok(self.value(item)? as f64)
    }

    fn sub_types(&self) -> &'static [SubType] {
        SUB_TYPES
    }
}

/// The 6.020 "Status with Mode" overlay: 5 status bits (each a flag) plus a
/// 2-bit mode selector restricted to modes 0..2.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusMode3 {
    pub status: [bool; 5],
    pub mode: u8,
}

impl StatusMode3 {
    pub fn from_byte(byte: u8) -> Result<StatusMode3> {
        let mode = byte & 0x03;
        if mode > 2 {
            return Err(Error::IllegalArgument(format!("mode {} not in 0..2", mode)));
        }
        let mut status = [false; 5];
        for (i, s) in status.iter_mut().enumerate() {
            *s = byte & (0x80 >> i) != 0;
        }
        Ok(StatusMode3 { status, mode })
    }

    pub fn to_byte(self) -> u8 {
        let mut byte = self.mode & 0x03;
        for (i, s) in self.status.iter().enumerate() {
            if *s {
                byte |= 0x80 >> i;
            }
        }
        byte
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_signed() {
        let mut x = Dpt6Xlator::new(1);
        x.set_value("-5").unwrap();
        assert_eq!(x.get_data(), &[0xFBu8]);
        assert_eq!(x.value(0).unwrap(), -5);
    }

    #[test]
    fn status_mode3_round_trip() {
        let sm = StatusMode3 { status: [true, false, true, false, false], mode: 1 };
        let byte = sm.to_byte();
        assert_eq!(StatusMode3::from_byte(byte).unwrap(), sm);
    }

    #[test]
    fn status_mode3_rejects_mode3() {
        assert!(StatusMode3::from_byte(0x03).is_err());
    }
}
