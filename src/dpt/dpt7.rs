//! DPT 7.xxx — 2-byte unsigned, including x10ms/x100ms scaled-time
//! subtypes. Scaled subtypes round numeric input to the nearest
//! representable step (ties round half up); the round-trip through the
//! wire is then exact.

use crate::dpt::translator::{check_buffer_size, DptXlator, SubType};
use crate::error::{Error, Result};
use std::io::Cursor;
use crate::codec::primitive::{BigEndianReader, BigEndianWriter};

const SUB_TYPES: &[SubType] = &[
    SubType { id: "7.001", name: "Unsigned count" },
    SubType { id: "7.005", name: "Time period (seconds)" },
    SubType { id: "7.006", name: "Time period (x10 ms)" },
    SubType { id: "7.007", name: "Time period (x100 ms)" },
];

/// Scaling applied to the raw 16-bit value for time-period subtypes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scale {
    Unscaled,
    Times10Ms,
    Times100Ms,
}

impl Scale {
    fn factor(self) -> f64 {
        match self {
            Scale::Unscaled => 1.0,
            Scale::Times10Ms => 10.0,
            Scale::Times100Ms => 100.0,
        }
    }

    fn round_half_up(raw_units: f64) -> u16 {
        raw_units.floor() as u16 + if raw_units.fract() >= 0.5 { 1 } else { 0 }
    }
}

#[derive(Debug, Clone)]
pub struct Dpt7Xlator {
    data: Vec<u8>,
    scale: Scale,
}

impl Dpt7Xlator {
    pub fn new(item_count: usize, scale: Scale) -> Dpt7Xlator {
        Dpt7Xlator {
            data: vec![0u8; item_count * 2],
            scale,
        }
    }

    pub fn value(&self, item: usize) -> Result<u16> {
        let off = item * 2;
        let bytes = self
            .data
            .get(off..off + 2)
            .ok_or_else(|| Error::IllegalArgument(format!("item {} out of range", item)))?;
        let mut c = Cursor::new(bytes);
        Ok(c.read_val()?)
    }

    fn scaled_value(&self, item: usize) -> Result<f64> {
        Ok(self.value(item)? as f64 * self.scale.factor())
    }
}

impl DptXlator for Dpt7Xlator {
    fn set_values(&mut self, text: &[&str]) -> Result<()> {
        let mut out = Vec::with_capacity(text.len() * 2);
        for t in text {
            let v: f64 = t
                .trim()
                .parse()
                .map_err(|_| Error::IllegalArgument(format!("not a numeric value: {}", t)))?;
            let raw_units = v / self.scale.factor();
            if !(0.0..=65535.0).contains(&raw_units) {
                return Err(Error::IllegalArgument(format!("value {} out of range", v)));
            }
            let raw = Scale::round_half_up(raw_units);
            out.write_val(raw).unwrap();
        }
        self.data = out;
        Ok(())
    }

    fn get_all_values(&self) -> Result<Vec<String>> {
        (0..self.item_count()).map(|i| Ok(format!("{}", self.scaled_value(i)?))).collect()
    }

    fn set_data(&mut self, data: &[u8]) -> Result<()> {
        check_buffer_size(data, self.item_count(), 2)?;
        self.data = data.to_vec();
        Ok(())
    }

    fn get_data(&self) -> &[u8] {
        &self.data
    }

    fn item_count(&self) -> usize {
        self.data.len() / 2
    }

    fn type_size(&self) -> usize {
        2
    }

    fn numeric_value(&self, item: usize) -> Result<f64> {
        self.scaled_value(item)
    }

    fn sub_types(&self) -> &'static [SubType] {
        SUB_TYPES
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unscaled_round_trip() {
        let mut x = Dpt7Xlator::new(1, Scale::Unscaled);
        x.set_value("1234").unwrap();
        assert_eq!(x.value(0).unwrap(), 1234);
    }

    #[test]
    fn scaled_rounds_half_up() {
        let mut x = Dpt7Xlator::new(1, Scale::Times10Ms);
        // 125 ms / 10 = 12.5 raw units -> rounds up to 13 -> 130 ms on the wire
        x.set_value("125").unwrap();
        assert_eq!(x.value(0).unwrap(), 13);
        assert_eq!(x.numeric_value(0).unwrap(), 130.0);
    }
}
