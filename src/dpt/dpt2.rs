//! DPT 2.xxx — 1-bit controlled: control bit + value bit packed into bits
//! 1 and 0 of a single byte per item.

use crate::dpt::translator::{check_buffer_size, DptXlator, SubType};
use crate::error::{Error, Result};

const SUB_TYPES: &[SubType] = &[SubType {
    id: "2.001",
    name: "Switch Control",
}];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Controlled1Bit {
    pub control: bool,
    pub value: bool,
}

#[derive(Debug, Clone, Default)]
pub struct Dpt2Xlator {
    data: Vec<u8>,
}

impl Dpt2Xlator {
    pub fn new(item_count: usize) -> Dpt2Xlator {
        Dpt2Xlator {
            data: vec![0u8; item_count],
        }
    }

    pub fn value(&self, item: usize) -> Result<Controlled1Bit> {
        let byte = *self
            .data
            .get(item)
            .ok_or_else(|| Error::IllegalArgument(format!("item {} out of range", item)))?;
        Ok(Controlled1Bit {
            control: byte & 0x02 != 0,
            value: byte & 0x01 != 0,
        })
    }
}

fn parse(text: &str) -> Result<Controlled1Bit> {
    let parts: Vec<&str> = text.split_whitespace().collect();
    if parts.len() != 2 {
        return Err(Error::IllegalArgument(
            "expected \"<control 0|1> <value 0|1>\"".into(),
        ));
    }
    let control = parts[0] == "1";
    let value = parts[1] == "1";
    Ok(Controlled1Bit { control, value })
}

impl DptXlator for Dpt2Xlator {
    fn set_values(&mut self, text: &[&str]) -> Result<()> {
        let mut out = Vec::with_capacity(text.len());
        for t in text {
            let cv = parse(t)?;
            out.push((cv.control as u8) << 1 | cv.value as u8);
        }
        self.data = out;
        Ok(())
    }

    fn get_all_values(&self) -> Result<Vec<String>> {
        (0..self.item_count())
            .map(|i| {
                let cv = self.value(i)?;
                Ok(format!("{} {}", cv.control as u8, cv.value as u8))
            })
            .collect()
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
        Ok(self.value(item)?.value as u8 as f64)
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
        let mut x = Dpt2Xlator::new(1);
        x.set_value("1 0").unwrap();
        assert_eq!(x.get_data(), &[0x02]);
        assert_eq!(x.value(0).unwrap(), Controlled1Bit { control: true, value: false });
    }
}
