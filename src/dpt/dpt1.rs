//! DPT 1.xxx — boolean, 1 bit per item, packed one item per byte (bit 0).

use crate::dpt::translator::{check_buffer_size, DptXlator, SubType};
use crate::error::{Error, Result};

const SUB_TYPES: &[SubType] = &[
    SubType { id: "1.001", name: "Switch" },
    SubType { id: "1.002", name: "Boolean" },
    SubType { id: "1.009", name: "OpenClose" },
];

#[derive(Debug, Clone, Default)]
pub struct Dpt1Xlator {
    data: Vec<u8>,
}

impl Dpt1Xlator {
    pub fn new(item_count: usize) -> Dpt1Xlator {
        Dpt1Xlator {
            data: vec![0u8; item_count],
        }
    }

    pub fn value(&self, item: usize) -> Result<bool> {
        self.data
            .get(item)
            .map(|b| *b & 0x01 != 0)
            .ok_or_else(|| Error::IllegalArgument(format!("item {} out of range", item)))
    }

    pub fn set(&mut self, item: usize, value: bool) -> Result<()> {
        let slot = self
            .data
            .get_mut(item)
            .ok_or_else(|| Error::IllegalArgument(format!("item {} out of range", item)))?;
        *slot = if value { 0x01 } else { 0x00 };
        Ok(())
    }
}

fn parse_bool(text: &str) -> Result<bool> {
    match text.trim() {
        "1" | "true" | "on" | "True" | "On" => Ok(true),
        "0" | "false" | "off" | "False" | "Off" => Ok(false),
        other => Err(Error::IllegalArgument(format!("not a boolean: {}", other))),
    }
}

impl DptXlator for Dpt1Xlator {
    fn set_values(&mut self, text: &[&str]) -> Result<()> {
        let mut parsed = Vec::with_capacity(text.len());
        for t in text {
            parsed.push(parse_bool(t)?);
        }
        self.data = parsed.iter().map(|b| if *b { 0x01 } else { 0x00 }).collect();
        Ok(())
    }

    fn get_all_values(&self) -> Result<Vec<String>> {
        Ok(self
            .data
            .iter()
            .map(|b| if *b & 0x01 != 0 { "1".to_string() } else { "0".to_string() })
            .collect())
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
        Ok(if self.value(item)? { 1.0 } else { 0.0 })
    }

    fn sub_types(&self) -> &'static [SubType] {
        SUB_TYPES
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_batch() {
        let mut x = Dpt1Xlator::new(3);
        x.set_values(&["1", "0", "on"]).unwrap();
        assert_eq!(x.get_data(), &[0x01, 0x00, 0x01]);
        assert_eq!(x.get_all_values().unwrap(), vec!["1", "0", "1"]);
    }

    #[test]
    fn rejects_garbage() {
        let mut x = Dpt1Xlator::new(1);
        assert!(x.set_value("maybe").is_err());
    }
}
