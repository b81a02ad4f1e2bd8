//! Shared contract every datapoint translator implements, so upper layers
//! can hold `Box<dyn DptXlator>` without knowing the concrete DPT family.

use crate::error::{Error, Result};

/// A concrete KNX DPT subtype a translator recognizes (e.g. `9.001`,
/// "Temperature").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubType {
    pub id: &'static str,
    pub name: &'static str,
}

pub trait DptXlator {
    fn set_value(&mut self, text: &str) -> Result<()> {
        self.set_values(&[text])
    }

    fn get_value(&self, item: usize) -> Result<String> {
        let mut all = self.get_all_values()?;
        if item >= all.len() {
            return Err(Error::IllegalArgument(format!("item {} out of range", item)));
        }
        Ok(all.swap_remove(item))
    }

    fn set_values(&mut self, text: &[&str]) -> Result<()>;
    fn get_all_values(&self) -> Result<Vec<String>>;

    fn set_data(&mut self, data: &[u8]) -> Result<()>;
    fn get_data(&self) -> &[u8];

    fn item_count(&self) -> usize;
    fn type_size(&self) -> usize;

    fn numeric_value(&self, item: usize) -> Result<f64>;

    fn sub_types(&self) -> &'static [SubType];
}

/// Checks `data.len() == item_count * type_size`, the size invariant every
/// translator's `set_data` enforces before accepting a buffer.
pub(crate) fn check_buffer_size(data: &[u8], item_count: usize, type_size: usize) -> Result<()> {
    let expected = item_count * type_size;
    if data.len() != expected {
        return Err(Error::IllegalBufferSize {
            expected,
            actual: data.len(),
        });
    }
    Ok(())
}
