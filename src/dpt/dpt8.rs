//! DPT 8.xxx — 2-byte signed, including the same x10ms/x100ms scaled-time
//! subtypes as DPT 7.xxx.

use crate::dpt::translator::{check_buffer_size, DptXlator, SubType};
use crate::error::{Error, Result};
use std::io::Cursor;
use crate::codec::primitive::{BigEndianReader, BigEndianWriter};

const SUB_TYPES: &[SubType] = &[
    SubType { id: "8.001", name: "Signed count" },
    SubType { id: "8.002", name: "Delta time (ms)" },
    SubType { id: "8.010", name: "Percent (-327.68..327.67%)" },
];

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

    fn round_half_up(raw_units: f64) -> i16 {
        let sign = if raw_units < 0.0 { -1.0 } else { 1.0 };
        let magnitude = raw_units.abs();
        let rounded = magnitude.floor() + if magnitude.fract() >= 0.5 { 1.0 } else { 0.0 };
        (sign * rounded) as i16
    }
}

#[derive(Debug, Clone)]
pub struct Dpt8Xlator {
    data: Vec<u8>,
    scale: Scale,
}

impl Dpt8Xlator {
    pub fn new(item_count: usize, scale: Scale) -> Dpt8Xlator {
        Dpt8Xlator {
            data: vec![0u8; item_count * 2],
            scale,
        }
    }

    pub fn value(&self, item: usize) -> Result<i16> {
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

impl DptXlator for Dpt8Xlator {
    fn set_values(&mut self, text: &[&str]) -> Result<()> {
        let mut out = Vec::with_capacity(text.len() * 2);
        for t in text {
            let v: f64 = t
                .trim()
                .parse()
                .map_err(|_| Error::IllegalArgument(format!("not a numeric value: {}", t)))?;
            let raw_units = v / self.scale.factor();
            if !(-32768.0..=32767.0).contains(&raw_units) {
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
    fn negative_round_trip() {
        let mut x = Dpt8Xlator::new(1, Scale::Unscaled);
        x.set_value("-42").unwrap();
        assert_eq!(x.value(0).unwrap(), -42);
    }

    #[test]
    fn scaled_rounds_half_up_negative() {
        let mut x = Dpt8Xlator::new(1, Scale::Times10Ms);
        x.set_value("-125").unwrap();
        assert_eq!(x.value(0).unwrap(), -13);
    }
}
