//! DPT 17.xxx — scene number: a plain 6-bit scene index, no control flag.

use crate::dpt::translator::{check_buffer_size, DptXlator, SubType};
use crate::error::{Error, Result};

const SUB_TYPES: &[SubType] = &[SubType {
    id: "17.001",
    name: "Scene number",
}];

#[derive(Debug, Clone, Default)]
pub struct Dpt17Xlator {
    data: Vec<u8>,
}

impl Dpt17Xlator {
    pub fn new(item_count: usize) -> Dpt17Xlator {
        Dpt17Xlator {
            data: vec![0u8; item_count],
        }
    }

    pub fn value(&self, item: usize) -> Result<u8> {
        self.data
            .get(item)
            .map(|b| b & 0x3F)
            .ok_or_else(|| Error::IllegalArgument(format!("item {} out of range", item)))
    }
}

impl DptXlator for Dpt17Xlator {
    fn set_values(&mut self, text: &[&str]) -> Result<()> {
        let mut out = Vec::with_capacity(text.len());
        for t in text {
            let v: u8 = t
                .trim()
                .parse()
                .map_err(|_| Error::IllegalArgument(format!("not a scene number: {}", t)))?;
            if v > 63 {
                return Err(Error::IllegalArgument(format!("scene number {} not in 0..63", v)));
            }
            out.push(v);
        }
        self.data = out;
        Ok(())
    }

    fn get_all_values(&self) -> Result<Vec<String>> {
        (0..self.item_count()).map(|i| Ok(self.value(i)?.to_string())).collect()
    }

    fn set_data(&mut self, data: &[u8]) -> Result<()> {
        check_buffer_size(data, self.item_count(), 1)?;
        if data.iter().any(|b| b & 0xC0 != 0) {
            return Err(Error::IllegalArgument("reserved bits set in scene number byte".into()));
        }
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
        let mut x = Dpt17Xlator::new(1);
        x.set_value("42").unwrap();
        assert_eq!(x.value(0).unwrap(), 42);
    }

    #[test]
    fn rejects_out_of_range() {
        let mut x = Dpt17Xlator::new(1);
        assert!(x.set_value("64").is_err());
    }
}
