//! DPT 18.xxx — scene control: 6-bit scene number (0..63) plus an
//! activate/learn flag in bit 7 (0 = activate, 1 = learn).

use crate::dpt::translator::{check_buffer_size, DptXlator, SubType};
use crate::error::{Error, Result};

const SUB_TYPES: &[SubType] = &[SubType {
    id: "18.001",
    name: "Scene control",
}];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SceneControl {
    pub learn: bool,
    pub scene: u8,
}

impl SceneControl {
    fn from_byte(byte: u8) -> SceneControl {
        SceneControl { learn: byte & 0x80 != 0, scene: byte & 0x3F }
    }

    fn to_byte(self) -> u8 {
        ((self.learn as u8) << 7) | (self.scene & 0x3F)
    }
}

fn parse(text: &str) -> Result<SceneControl> {
    let parts: Vec<&str> = text.split_whitespace().collect();
    if parts.len() != 2 {
        return Err(Error::IllegalArgument("expected \"<activate|learn> <scene>\"".into()));
    }
    let learn = match parts[0] {
        "activate" => false,
        "learn" => true,
        other => return Err(Error::IllegalArgument(format!("expected activate|learn, got {}", other))),
    };
    let scene: u8 = parts[1]
        .parse()
        .map_err(|_| Error::IllegalArgument(format!("not a scene number: {}", parts[1])))?;
    if scene > 63 {
        return Err(Error::IllegalArgument(format!("scene number {} not in 0..63", scene)));
    }
    Ok(SceneControl { learn, scene })
}

#[derive(Debug, Clone, Default)]
pub struct Dpt18Xlator {
    data: Vec<u8>,
}

impl Dpt18Xlator {
    pub fn new(item_count: usize) -> Dpt18Xlator {
        Dpt18Xlator {
            data: vec![0u8; item_count],
        }
    }

    pub fn value(&self, item: usize) -> Result<SceneControl> {
        self.data
            .get(item)
            .map(|b| SceneControl::from_byte(*b))
            .ok_or_else(|| Error::IllegalArgument(format!("item {} out of range", item)))
    }
}

impl DptXlator for Dpt18Xlator {
    fn set_values(&mut self, text: &[&str]) -> Result<()> {
        let mut out = Vec::with_capacity(text.len());
        for t in text {
            out.push(parse(t)?.to_byte());
        }
        self.data = out;
        Ok(())
    }

    fn get_all_values(&self) -> Result<Vec<String>> {
        (0..self.item_count())
            .map(|i| {
                let sc = self.value(i)?;
                Ok(format!("{} {}", if sc.learn { "learn" } else { "activate" }, sc.scene))
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
        Ok(self.value(item)?.scene as f64)
    }

    fn sub_types(&self) -> &'static [SubType] {
        SUB_TYPES
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_activate() {
        let mut x = Dpt18Xlator::new(1);
        x.set_value("activate 5").unwrap();
        assert_eq!(x.value(0).unwrap(), SceneControl { learn: false, scene: 5 });
    }

    #[test]
    fn round_trip_learn() {
        let mut x = Dpt18Xlator::new(1);
        x.set_value("learn 10").unwrap();
        assert_eq!(x.get_data(), &[0x8A]);
    }
}
