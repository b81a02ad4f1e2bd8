//! DPT 28.xxx — variable-length UTF-8. Each item is NUL-terminated;
//! `set_data` rejects a buffer whose bytes between terminators are not
//! valid UTF-8.

use crate::dpt::translator::DptXlator;
use crate::dpt::translator::SubType;
use crate::error::{Error, Result};

const SUB_TYPES: &[SubType] = &[SubType {
    id: "28.001",
    name: "UTF-8 string",
}];

#[derive(Debug, Clone, Default)]
pub struct Dpt28Xlator {
    data: Vec<u8>,
}

impl Dpt28Xlator {
    pub fn new() -> Dpt28Xlator {
        Dpt28Xlator { data: Vec::new() }
    }

    fn segments(&self) -> Vec<&[u8]> {
        if self.data.is_empty() {
            return Vec::new();
        }
        self.data.split(|&b| b == 0).filter(|s| !s.is_empty() || self.data.len() == 1).collect()
    }
}

impl DptXlator for Dpt28Xlator {
    fn set_values(&mut self, text: &[&str]) -> Result<()> {
        let mut out = Vec::new();
        for t in text {
            out.extend_from_slice(t.as_bytes());
            out.push(0);
        }
        self.data = out;
        Ok(())
    }

    fn get_all_values(&self) -> Result<Vec<String>> {
        self.segments()
            .into_iter()
            .map(|seg| {
                std::str::from_utf8(seg)
                    .map(|s| s.to_string())
                    .map_err(|_| Error::MalformedText("invalid UTF-8 sequence".into()))
            })
            .collect()
    }

    fn set_data(&mut self, data: &[u8]) -> Result<()> {
        for seg in data.split(|&b| b == 0) {
            std::str::from_utf8(seg).map_err(|_| Error::MalformedText("invalid UTF-8 sequence".into()))?;
        }
        self.data = data.to_vec();
        Ok(())
    }

    fn get_data(&self) -> &[u8] {
        &self.data
    }

    fn item_count(&self) -> usize {
        self.segments().len()
    }

    fn type_size(&self) -> usize {
        0
    }

    fn numeric_value(&self, _item: usize) -> Result<f64> {
        Err(Error::IllegalArgument("DPT 28 has no numeric representation".into()))
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
        let mut x = Dpt28Xlator::new();
        x.set_values(&["hello", "\u{4e16}\u{754c}"]).unwrap();
        let values = x.get_all_values().unwrap();
        assert_eq!(values, vec!["hello", "\u{4e16}\u{754c}"]);
    }

    #[test]
    fn rejects_invalid_utf8() {
        let mut x = Dpt28Xlator::new();
        assert!(x.set_data(&[0xFF, 0xFE, 0x00]).is_err());
    }
}
