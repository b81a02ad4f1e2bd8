//! DPT 5.xxx — 8-bit unsigned, one raw byte per item. Subtypes only change
//! the human-readable unit, not the wire encoding, so a single translator
//! covers all of them.

use crate::dpt::translator::{check_buffer_size, DptXlator, SubType};
use crate::error::{Error, Result};

const SUB_TYPES: &[SubType] = &[
    SubType { id: "5.001", name: "Scaling (0..100%)" },
    SubType { id: "5.003", name: "Angle (0..360deg)" },
    SubType { id: "5.010", name: "Counter pulses" },
];

#[derive(Debug, Clone, Default)]
pub struct Dpt5Xlator {
    data: Vec<u8>,
}

impl Dpt5Xlator {
    pub fn new(item_count: usize) -> Dpt5Xlator {
        Dpt5Xlator {
            data: vec![0u8; item_count],
        }
    }

    pub fn value(&self, item: usize) -> Result<u8> {
        self.data
            .get(item)
            .copied()
            .ok_or_else(|| Error::IllegalArgument(format!("item {} out of range", item)))
    }
}

impl DptXlator for Dpt5Xlator {
    fn set_values(&mut self, text: &[&str]) -> Result<()> {
        let mut out = Vec::with_capacity(text.len());
        for t in text {
            out.push(
                t.trim()
                    .parse::<u8>()
                    .map_err(|_| Error::IllegalArgument(format!("not an 8-bit unsigned value: {}", t)))?,
            );
        }
        self.data = out;
        Ok(())
    }

    fn get_all_values(&self) -> Result<Vec<String>> {
        Ok(self.data.iter().map(|b| b.to_string()).collect())
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip() {
        let mut x = Dpt5Xlator::new(1);
        x.set_value("200").unwrap();
        assert_eq!(x.get_data(), &[200]);
        assert_eq!(x.get_value(0).unwrap(), "200");
    }
}
