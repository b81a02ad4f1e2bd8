//! Composite step-control / colour transition datapoints (DPT 249.600):
//! two independently-valid `StepControl` components (colour-temperature
//! step, brightness step) packed one byte each, mirroring DPT 3.xxx's
//! direction + 3-bit step-code nibble with an extra validity bit.

use crate::dpt::translator::{check_buffer_size, DptXlator, SubType};
use crate::error::{Error, Result};

const SUB_TYPES: &[SubType] = &[SubType { id: "249.600", name: "Brightness/colour-temperature transition" }];

/// `step_code` is 0..=7; `0` means "break" (stop stepping), matching
/// DPT 3.xxx's convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepControl {
    pub direction: bool,
    pub step_code: u8,
}

impl StepControl {
    fn to_byte(self) -> u8 {
        0x10 | ((self.direction as u8) << 3) | (self.step_code & 0x07)
    }

    fn from_byte(b: u8) -> Option<StepControl> {
        if b & 0x10 == 0 {
            None
        } else {
            Some(StepControl { direction: b & 0x08 != 0, step_code: b & 0x07 })
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ColourTransition {
    pub colour_temp_step: Option<StepControl>,
    pub brightness_step: Option<StepControl>,
}

#[derive(Debug, Clone, Default)]
pub struct Dpt249Xlator {
    data: Vec<u8>,
}

impl Dpt249Xlator {
    pub fn new(item_count: usize) -> Dpt249Xlator {
        Dpt249Xlator { data: vec![0u8; item_count * 2] }
    }

    pub fn value(&self, item: usize) -> Result<ColourTransition> {
        let off = item * 2;
        let b = self
            .data
            .get(off..off + 2)
            .ok_or_else(|| Error::IllegalArgument(format!("item {} out of range", item)))?;
        Ok(ColourTransition {
            colour_temp_step: StepControl::from_byte(b[0]),
            brightness_step: StepControl::from_byte(b[1]),
        })
    }

    pub fn set(&mut self, item: usize, v: ColourTransition) -> Result<()> {
        let off = item * 2;
        let colour = v.colour_temp_step.map(StepControl::to_byte).unwrap_or(0);
        let brightness = v.brightness_step.map(StepControl::to_byte).unwrap_or(0);
        self.data
            .get_mut(off..off + 2)
            .ok_or_else(|| Error::IllegalArgument(format!("item {} out of range", item)))?
            .copy_from_slice(&[colour, brightness]);
        Ok(())
    }
}

fn format_step(s: Option<StepControl>) -> String {
    match s {
        None => "invalid".into(),
        Some(StepControl { direction, step_code: 0 }) => format!("{} break", direction as u8),
        Some(StepControl { direction, step_code }) => format!("{} {}", direction as u8, step_code),
    }
}

impl DptXlator for Dpt249Xlator {
    fn set_values(&mut self, _text: &[&str]) -> Result<()> {
        Err(Error::IllegalArgument(
            "colour-transition values are set structurally via `set`, not free text".into(),
        ))
    }

    fn get_all_values(&self) -> Result<Vec<String>> {
        (0..self.item_count())
            .map(|i| {
                let v = self.value(i)?;
                Ok(format!("{},{}", format_step(v.colour_temp_step), format_step(v.brightness_step)))
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

    fn numeric_value(&self, _item: usize) -> Result<f64> {
        Err(Error::IllegalArgument("colour transition has no single numeric representation".into()))
    }

    fn sub_types(&self) -> &'static [SubType] {
        SUB_TYPES
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn both_components_round_trip() {
        let mut x = Dpt249Xlator::new(1);
        let v = ColourTransition {
            colour_temp_step: Some(StepControl { direction: true, step_code: 3 }),
            brightness_step: Some(StepControl { direction: false, step_code: 0 }),
        };
        x.set(0, v).unwrap();
        assert_eq!(x.value(0).unwrap(), v);
    }

    #[test]
    fn not_valid_component_round_trips_to_none() {
        let mut x = Dpt249Xlator::new(1);
        let v = ColourTransition { colour_temp_step: None, brightness_step: Some(StepControl { direction: true, step_code: 5 }) };
        x.set(0, v).unwrap();
        assert_eq!(x.value(0).unwrap(), v);
    }

    #[test]
    fn set_data_checks_item_count() {
        let mut x = Dpt249Xlator::new(2);
        assert!(x.set_data(&[0x10]).is_err());
    }
}
