//! DPT 13.xxx — 4-byte signed.

use crate::dpt::translator::{check_buffer_size, DptXlator, SubType};
use crate::error::{Error, Result};
use std::io::Cursor;
use crate::codec::primitive::{BigEndianReader, BigEndianWriter};

const SUB_TYPES: &[SubType] = &[
    SubType { id: "13.001", name: "Signed count (4 byte)" },
    SubType { id: "13.010", name: "Active energy (Wh)" },
];

#[derive(Debug, Clone, Default)]
pub struct Dpt13Xlator {
    data: Vec<u8>,
}

impl Dpt13Xlator {
    pub fn new(item_count: usize) -> Dpt13Xlator {
        Dpt13Xlator {
            data: vec![0u8; item_count * 4],
        }
    }

    pub fn value(&self, item: usize) -> Result<i32> {
        let off = item * 4;
        let b = self
            .data
            .get(off..off + 4)
            .ok_or_else(|| Error::IllegalArgument(format!("item {} out of range", item)))?;
        let mut c = Cursor::new(b);
        Ok(c.read_val()?)
    }
}

impl DptXlator for Dpt13Xlator {
    fn set_values(&mut self, text: &[&str]) -> Result<()> {
        let mut out = Vec::with_capacity(text.len() * 4);
        for t in text {
            let v: i32 = t
                .trim()
                .parse()
                .map_err(|_| Error::IllegalArgument(format!("not a 32-bit signed value: {}", t)))?;
            out.write_val(v).unwrap();
        }
        self.data = out;
        Ok(())
    }

    fn get_all_values(&self) -> Result<Vec<String>> {
        (0..self.item_count()).map(|i| Ok(self.value(i)?.to_string())).collect()
    }

    fn set_data(&mut self, data: &[u8]) -> Result<()> {
        check_buffer_size(data, self.item_count(), 4)?;
        self.data = data.to_vec();
        Ok(())
    }

    fn get_data(&self) -> &[u8] {
        &self.data
    }

    fn item_count(&self) -> usize {
        self.data.len() / 4
    }

    fn type_size(&self) -> usize {
        4
    }

    fn numeric_value(&self, item: usize) -> Result<f64> {
        Ok(self.value(item)? as f64)
    }

    fn sub_types(&self) -> &'static [SubType] {
        SUB_TYPES
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_negative() {
        let mut x = Dpt13Xlator::new(1);
        x.set_value("-123456789").unwrap();
        assert_eq!(x.value(0).unwrap(), -123456789);
    }
}
