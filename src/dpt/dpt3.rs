//! DPT 3.xxx — 3-bit controlled (dimming, blinds): 1 control bit + 3-bit
//! step code, `0 = break`, else `step = 2^(code-1)` intervals.

use crate::dpt::translator::{check_buffer_size, DptXlator, SubType};
use crate::error::{Error, Result};

const SUB_TYPES: &[SubType] = &[
    SubType { id: "3.007", name: "Dimming" },
    SubType { id: "3.008", name: "Blinds" },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlledStep {
    pub control: bool,
    /// `None` for "break" (step code 0).
    pub step_interval: Option<u8>,
}

impl ControlledStep {
    fn code(self) -> u8 {
        match self.step_interval {
            None => 0,
            Some(v) => {
                debug_assert!(v.is_power_of_two() && v <= 64);
                v.trailing_zeros() as u8 + 1
            }
        }
    }

    fn from_code(control: bool, code: u8) -> ControlledStep {
        ControlledStep {
            control,
            step_interval: if code == 0 { None } else { Some(1u8 << (code - 1)) },
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Dpt3Xlator {
    data: Vec<u8>,
}

impl Dpt3Xlator {
    pub fn new(item_count: usize) -> Dpt3Xlator {
        Dpt3Xlator {
            data: vec![0u8; item_count],
        }
    }

    pub fn value(&self, item: usize) -> Result<ControlledStep> {
        let byte = *self
            .data
            .get(item)
            .ok_or_else(|| Error::IllegalArgument(format!("item {} out of range", item)))?;
        Ok(ControlledStep::from_code(byte & 0x08 != 0, byte & 0x07))
    }

    pub fn set(&mut self, item: usize, v: ControlledStep) -> Result<()> {
        let slot = self
            .data
            .get_mut(item)
            .ok_or_else(|| Error::IllegalArgument(format!("item {} out of range", item)))?;
        *slot = ((v.control as u8) << 3) | (v.code() & 0x07);
        Ok(())
    }
}

fn parse(text: &str) -> Result<ControlledStep> {
    let parts: Vec<&str> = text.split_whitespace().collect();
    if parts.is_empty() || parts.len() > 2 {
        return Err(Error::IllegalArgument(
            "expected \"<control 0|1> [step_interval]\"".into(),
        ));
    }
    let control = parts[0] == "1";
    let step_interval = match parts.get(1) {
        None | Some(&"break") => None,
        Some(s) => {
            let v: u8 = s
                .parse()
                .map_err(|_| Error::IllegalArgument(format!("not a step interval: {}", s)))?;
            if !v.is_power_of_two() || v > 64 {
                return Err(Error::IllegalArgument(format!(
                    "step interval {} is not a power of two in [1,64]",
                    v
                )));
            }
            Some(v)
        }
    };
    Ok(ControlledStep { control, step_interval })
}

impl DptXlator for Dpt3Xlator {
    fn set_values(&mut self, text: &[&str]) -> Result<()> {
        let mut out = Vec::with_capacity(text.len());
        for t in text {
            let v = parse(t)?;
            out.push(((v.control as u8) << 3) | (v.code() & 0x07));
        }
        self.data = out;
        Ok(())
    }

    fn get_all_values(&self) -> Result<Vec<String>> {
        (0..self.item_count())
            .map(|i| {
                let v = self.value(i)?;
                Ok(match v.step_interval {
                    None => format!("{} break", v.control as u8),
                    Some(step) => format!("{} {}", v.control as u8, step),
                })
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
        Ok(self.value(item)?.step_interval.unwrap_or(0) as f64)
    }

    fn sub_types(&self) -> &'static [SubType] {
        SUB_TYPES
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn break_round_trips() {
        let mut x = Dpt3Xlator::new(1);
        x.set_value("0 break").unwrap();
        assert_eq!(x.get_data(), &[0x00]);
    }

    #[test]
    fn step_round_trips() {
        let mut x = Dpt3Xlator::new(1);
        x.set_value("1 8").unwrap();
        // control=1, step=8=2^3 -> code=4
        assert_eq!(x.get_data(), &[0b1100]);
        assert_eq!(
            x.value(0).unwrap(),
            ControlledStep { control: true, step_interval: Some(8) }
        );
    }

    #[test]
    fn rejects_non_power_of_two() {
        let mut x = Dpt3Xlator::new(1);
        assert!(x.set_value("1 5").is_err());
    }
}
