//! DPT 29.xxx — 8-byte signed (e.g. active energy accumulation).

use crate::dpt::translator::{check_buffer_size, DptXlator, SubType};
use crate::error::{Error, Result};
use std::io::Cursor;
use crate::codec::primitive::{BigEndianReader, BigEndianWriter};

const SUB_TYPES: &[SubType] = &[
    SubType { id: "29.010", name: "Active energy (Wh, 8 byte)" },
    SubType { id: "29.011", name: "Apparent energy (VAh, 8 byte)" },
];

#[derive(Debug, Clone, Default)]
pub struct Dpt29Xlator {
    data: Vec<u8>,
}

impl Dpt29Xlator {
    pub fn new(item_count: usize) -> Dpt29Xlator {
        Dpt29Xlator {
            data: vec![0u8; item_count * 8],
        }
    }

    pub fn value(&self, item: usize) -> Result<i64> {
        let off = item * 8;
        let b = self
            .data
            .get(off..off + 8)
            .ok_or_else(|| Error::IllegalArgument(format!("item {} out of range", item)))?;
        let mut c = Cursor::new(b);
        Ok(c.read_val()?)
    }
}

impl DptXlator for Dpt29Xlator {
    fn set_values(&mut self, text: &[&str]) -> Result<()> {
        let mut out = Vec::with_capacity(text.len() * 8);
        for t in text {
            let v: i64 = t
                .trim()
                .parse()
                .map_err(|_| Error::IllegalArgument(format!("not a 64-bit signed value: {}", t)))?;
            out.write_val(v).unwrap();
        }
        self.data = out;
        Ok(())
    }

    fn get_all_values(&self) -> Result<Vec<String>> {
        (0..self.item_count()).map(|i| Ok(self.value(i)?.to_string())).collect()
    }

    fn set_data(&mut self, data: &[u8]) -> Result<()> {
        check_buffer_size(data, self.item_count(), 8)?;
        self.data = data.to_vec();
        Ok(())
    }

    fn get_data(&self) -> &[u8] {
        &self.data
    }

    fn item_count(&self) -> usize {
        self.data.len() / 8
    }

    fn type_size(&self) -> usize {
        8
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
    fn round_trip() {
        let mut x = Dpt29Xlator::new(1);
        x.set_value("-9000000000").unwrap();
        assert_eq!(x.value(0).unwrap(), -9_000_000_000);
    }
}
