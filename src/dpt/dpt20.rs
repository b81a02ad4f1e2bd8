//! DPT 20.xxx — 8-bit enumeration. `set_value` accepts either the raw
//! ordinal, or a friendly CamelCase identifier looked up against the
//! enumeration's registered members.

use crate::dpt::translator::{check_buffer_size, DptXlator, SubType};
use crate::error::{Error, Result};

const SUB_TYPES: &[SubType] = &[
    SubType { id: "20.102", name: "HVAC mode" },
    SubType { id: "20.105", name: "HVAC control mode" },
];

/// One named member of an 8-bit enumeration, e.g. `(1, "Comfort")`.
#[derive(Debug, Clone, Copy)]
pub struct EnumMember {
    pub ordinal: u8,
    pub name: &'static str,
}

#[derive(Debug, Clone, Copy)]
pub struct EnumDef {
    pub members: &'static [EnumMember],
}

impl EnumDef {
    fn by_ordinal(&self, ordinal: u8) -> Option<&'static EnumMember> {
        self.members.iter().find(|m| m.ordinal == ordinal)
    }

    fn by_name(&self, name: &str) -> Option<&'static EnumMember> {
        self.members.iter().find(|m| m.name.eq_ignore_ascii_case(name))
    }
}

pub const HVAC_MODE: EnumDef = EnumDef {
    members: &[
        EnumMember { ordinal: 0, name: "Auto" },
        EnumMember { ordinal: 1, name: "Comfort" },
        EnumMember { ordinal: 2, name: "Standby" },
        EnumMember { ordinal: 3, name: "Economy" },
        EnumMember { ordinal: 4, name: "BuildingProtection" },
    ],
};

#[derive(Debug, Clone)]
pub struct Dpt20Xlator {
    data: Vec<u8>,
    def: EnumDef,
}

impl Dpt20Xlator {
    pub fn new(item_count: usize, def: EnumDef) -> Dpt20Xlator {
        Dpt20Xlator {
            data: vec![0u8; item_count],
            def,
        }
    }

    pub fn ordinal(&self, item: usize) -> Result<u8> {
        self.data
            .get(item)
            .copied()
            .ok_or_else(|| Error::IllegalArgument(format!("item {} out of range", item)))
    }

    pub fn name(&self, item: usize) -> Result<&'static str> {
        let ordinal = self.ordinal(item)?;
        self.def
            .by_ordinal(ordinal)
            .map(|m| m.name)
            .ok_or_else(|| Error::IllegalArgument(format!("ordinal {} is not a registered member", ordinal)))
    }
}

impl DptXlator for Dpt20Xlator {
    fn set_values(&mut self, text: &[&str]) -> Result<()> {
        let mut out = Vec::with_capacity(text.len());
        for t in text {
            let t = t.trim();
            let ordinal = if let Ok(n) = t.parse::<u8>() {
                if self.def.by_ordinal(n).is_none() {
                    return Err(Error::IllegalArgument(format!("ordinal {} is not a registered member", n)));
                }
                n
            } else {
                self.def
                    .by_name(t)
                    .map(|m| m.ordinal)
                    .ok_or_else(|| Error::IllegalArgument(format!("unknown enumeration member: {}", t)))?
            };
            out.push(ordinal);
        }
        self.data = out;
        Ok(())
    }

    fn get_all_values(&self) -> Result<Vec<String>> {
        (0..self.item_count()).map(|i| Ok(self.name(i)?.to_string())).collect()
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
        Ok(self.ordinal(item)? as f64)
    }

    fn sub_types(&self) -> &'static [SubType] {
        SUB_TYPES
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_ordinal() {
        let mut x = Dpt20Xlator::new(1, HVAC_MODE);
        x.set_value("1").unwrap();
        assert_eq!(x.name(0).unwrap(), "Comfort");
    }

    #[test]
    fn accepts_name_case_insensitive() {
        let mut x = Dpt20Xlator::new(1, HVAC_MODE);
        x.set_value("standby").unwrap();
        assert_eq!(x.ordinal(0).unwrap(), 2);
    }

    #[test]
    fn rejects_unknown_member() {
        let mut x = Dpt20Xlator::new(1, HVAC_MODE);
        assert!(x.set_value("Frobnicate").is_err());
    }
}
