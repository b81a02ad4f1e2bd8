//! DPT 9.xxx — 2-byte float. Layout: 1 sign bit, 4-bit exponent, 11-bit
//! two's-complement mantissa; `value = 0.01 * M * 2^E`. Encoding picks the
//! smallest exponent that keeps the mantissa in range, rounding to even on
//! ties so repeated re-encodes of the decoded value are stable.

use crate::dpt::translator::{check_buffer_size, DptXlator, SubType};
use crate::error::{Error, Result};

const SUB_TYPES: &[SubType] = &[
    SubType { id: "9.001", name: "Temperature (C)" },
    SubType { id: "9.004", name: "Illumination (lux)" },
    SubType { id: "9.005", name: "Wind speed (m/s)" },
    SubType { id: "9.007", name: "Humidity (%)" },
];

const MANTISSA_MIN: i32 = -2048;
const MANTISSA_MAX: i32 = 2047;

fn decode(hi: u8, lo: u8) -> f64 {
    let sign = (hi & 0x80) != 0;
    let exponent = (hi >> 3) & 0x0F;
    let mantissa_raw = (((hi & 0x07) as u16) << 8) | lo as u16;
    let mantissa = if sign {
        (mantissa_raw as i32) - 0x0800
    } else {
        mantissa_raw as i32
    };
    0.01 * mantissa as f64 * 2f64.powi(exponent as i32)
}

fn encode(value: f64) -> Result<(u8, u8)> {
    if value.is_nan() {
        return Err(Error::IllegalArgument("NaN is not representable".into()));
    }
    let mut exponent: i32 = 0;
    loop {
        let scaled = value * 100.0 / 2f64.powi(exponent);
        let rounded = round_half_to_even(scaled);
        if (MANTISSA_MIN..=MANTISSA_MAX).contains(&rounded) {
            let mantissa = rounded;
            if exponent > 15 {
                return Err(Error::IllegalArgument(format!("value {} out of range", value)));
            }
            let mantissa_bits = (mantissa & 0x0FFF) as u16;
            let hi = ((mantissa < 0) as u8) << 7 | ((exponent as u8) << 3) | ((mantissa_bits >> 8) as u8 & 0x07);
            let lo = (mantissa_bits & 0xFF) as u8;
            return Ok((hi, lo));
        }
        exponent += 1;
        if exponent > 15 {
            return Err(Error::IllegalArgument(format!("value {} out of range", value)));
        }
    }
}

fn round_half_to_even(v: f64) -> i32 {
    let floor = v.floor();
    let diff = v - floor;
    let floor_i = floor as i32;
    if diff < 0.5 {
        floor_i
    } else if diff > 0.5 {
        floor_i + 1
    } else if floor_i % 2 == 0 {
        floor_i
    } else {
        floor_i + 1
    }
}

#[derive(Debug, Clone, Default)]
pub struct Dpt9Xlator {
    data: Vec<u8>,
}

impl Dpt9Xlator {
    pub fn new(item_count: usize) -> Dpt9Xlator {
        Dpt9Xlator {
            data: vec![0u8; item_count * 2],
        }
    }

    pub fn value(&self, item: usize) -> Result<f64> {
        let off = item * 2;
        let bytes = self
            .data
            .get(off..off + 2)
            .ok_or_else(|| Error::IllegalArgument(format!("item {} out of range", item)))?;
        Ok(decode(bytes[0], bytes[1]))
    }
}

impl DptXlator for Dpt9Xlator {
    fn set_values(&mut self, text: &[&str]) -> Result<()> {
        let mut out = Vec::with_capacity(text.len() * 2);
        for t in text {
            let v: f64 = t
                .trim()
                .parse()
                .map_err(|_| Error::IllegalArgument(format!("not a numeric value: {}", t)))?;
            let (hi, lo) = encode(v)?;
            out.push(hi);
            out.push(lo);
        }
        self.data = out;
        Ok(())
    }

    fn get_all_values(&self) -> Result<Vec<String>> {
        (0..self.item_count()).map(|i| Ok(format!("{}", self.value(i)?))).collect()
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
        self.value(item)
    }

    fn sub_types(&self) -> &'static [SubType] {
        SUB_TYPES
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_round_trips() {
        let mut x = Dpt9Xlator::new(1);
        x.set_value("0").unwrap();
        assert_eq!(x.value(0).unwrap(), 0.0);
    }

    #[test]
    fn negative_temperature_round_trips() {
        let mut x = Dpt9Xlator::new(1);
        x.set_value("-30.0").unwrap();
        assert!((x.value(0).unwrap() - (-30.0)).abs() < 0.01);
    }

    #[test]
    fn known_encoding() {
        // 20.0 = 0.01 * 2000 * 2^0, mantissa 2000 fits exponent 0 directly.
        let mut x = Dpt9Xlator::new(1);
        x.set_value("20.0").unwrap();
        assert_eq!(x.get_data(), &[0x07, 0xD0]);
    }
}
