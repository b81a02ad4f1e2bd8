//! DPT 22.xxx — 16-bit named bitset. `set_value` accepts a hex literal
//! (`0x0A3F`), whitespace-separated `0`/`1` per flag (MSB first), or a
//! comma-separated list of set flag names.

use crate::dpt::translator::{check_buffer_size, DptXlator, SubType};
use crate::error::{Error, Result};
use std::io::Cursor;
use crate::codec::primitive::{BigEndianReader, BigEndianWriter};

const SUB_TYPES: &[SubType] = &[SubType {
    id: "22.101",
    name: "HVAC status word",
}];

#[derive(Debug, Clone, Copy)]
pub struct BitDef {
    pub bit: u8,
    pub name: &'static str,
}

pub const HVAC_STATUS: &[BitDef] = &[
    BitDef { bit: 0, name: "Fault" },
    BitDef { bit: 1, name: "StatusEcoMode" },
    BitDef { bit: 2, name: "TemperatureFlowLimit" },
    BitDef { bit: 3, name: "TemperatureReturnLimit" },
    BitDef { bit: 4, name: "StatusMorningBoost" },
    BitDef { bit: 5, name: "StatusStartOptimization" },
    BitDef { bit: 6, name: "StatusStopOptimization" },
    BitDef { bit: 7, name: "HeatCoolSwitch" },
];

fn by_name<'a>(flags: &'a [BitDef], name: &str) -> Option<&'a BitDef> {
    flags.iter().find(|f| f.name.eq_ignore_ascii_case(name))
}

#[derive(Debug, Clone)]
pub struct Dpt22Xlator {
    data: Vec<u8>,
    flags: &'static [BitDef],
}

impl Dpt22Xlator {
    pub fn new(item_count: usize, flags: &'static [BitDef]) -> Dpt22Xlator {
        Dpt22Xlator {
            data: vec![0u8; item_count * 2],
            flags,
        }
    }

    pub fn raw(&self, item: usize) -> Result<u16> {
        let off = item * 2;
        let b = self
            .data
            .get(off..off + 2)
            .ok_or_else(|| Error::IllegalArgument(format!("item {} out of range", item)))?;
        let mut c = Cursor::new(b);
        Ok(c.read_val()?)
    }

    pub fn is_set(&self, item: usize, bit: u8) -> Result<bool> {
        Ok(self.raw(item)? & (1 << bit) != 0)
    }

    fn parse(&self, text: &str) -> Result<u16> {
        let text = text.trim();
        if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
            return u16::from_str_radix(hex, 16)
                .map_err(|_| Error::IllegalArgument(format!("not a hex literal: {}", text)));
        }
        if text.contains(',') {
            let mut raw = 0u16;
            for name in text.split(',') {
                let name = name.trim();
                let f = by_name(self.flags, name)
                    .ok_or_else(|| Error::IllegalArgument(format!("unknown flag: {}", name)))?;
                raw |= 1 << f.bit;
            }
            return Ok(raw);
        }
        let bits: Vec<&str> = text.split_whitespace().collect();
        if bits.len() == 16 && bits.iter().all(|b| *b == "0" || *b == "1") {
            let mut raw = 0u16;
            for (i, b) in bits.iter().enumerate() {
                if *b == "1" {
                    raw |= 1 << (15 - i);
                }
            }
            return Ok(raw);
        }
        Err(Error::IllegalArgument(format!(
            "expected a hex literal, 16 space-separated bits, or comma-separated flag names: {}",
            text
        )))
    }
}

impl DptXlator for Dpt22Xlator {
    fn set_values(&mut self, text: &[&str]) -> Result<()> {
        let mut out = Vec::with_capacity(text.len() * 2);
        for t in text {
            let raw = self.parse(t)?;
            out.write_val(raw).unwrap();
        }
        self.data = out;
        Ok(())
    }

    fn get_all_values(&self) -> Result<Vec<String>> {
        (0..self.item_count())
            .map(|i| {
                let raw = self.raw(i)?;
                let names: Vec<&str> = self
                    .flags
                    .iter()
                    .filter(|f| raw & (1 << f.bit) != 0)
                    .map(|f| f.name)
                    .collect();
                Ok(names.join(","))
            })
            .collect()
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
        Ok(self.raw(item)? as f64)
    }

    fn sub_types(&self) -> &'static [SubType] {
        SUB_TYPES
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_hex() {
        let mut x = Dpt22Xlator::new(1, HVAC_STATUS);
        x.set_value("0x0003").unwrap();
        assert!(x.is_set(0, 0).unwrap());
        assert!(x.is_set(0, 1).unwrap());
        assert!(!x.is_set(0, 2).unwrap());
    }

    #[test]
    fn accepts_flag_names() {
        let mut x = Dpt22Xlator::new(1, HVAC_STATUS);
        x.set_value("Fault,HeatCoolSwitch").unwrap();
        assert_eq!(x.raw(0).unwrap(), 0x81);
    }
}
