//! DPT 16.xxx — fixed 14-byte null-padded string. The ASCII subtype
//! (16.000) replaces any non-ASCII character with `?` on encode; the
//! Latin-1 subtype (16.001) preserves bytes 0x00..0xFF as-is. Input longer
//! than 14 characters is rejected rather than silently truncated.

use crate::dpt::translator::{check_buffer_size, DptXlator, SubType};
use crate::error::{Error, Result};

const SUB_TYPES: &[SubType] = &[
    SubType { id: "16.000", name: "ASCII string" },
    SubType { id: "16.001", name: "Latin-1 string" },
];

const LEN: usize = 14;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Charset {
    Ascii,
    Latin1,
}

#[derive(Debug, Clone)]
pub struct Dpt16Xlator {
    data: Vec<u8>,
    charset: Charset,
}

impl Dpt16Xlator {
    pub fn new(item_count: usize, charset: Charset) -> Dpt16Xlator {
        Dpt16Xlator {
            data: vec![0u8; item_count * LEN],
            charset,
        }
    }

    fn decode_one(&self, bytes: &[u8]) -> String {
        let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
        match self.charset {
            Charset::Ascii => bytes[..end].iter().map(|&b| b as char).collect(),
            Charset::Latin1 => bytes[..end].iter().map(|&b| b as char).collect(),
        }
    }

    fn encode_one(&self, text: &str) -> Result<[u8; LEN]> {
        if text.chars().count() > LEN {
            return Err(Error::IllegalArgument(format!(
                "\"{}\" exceeds the 14-character field limit",
                text
            )));
        }
        let mut out = [0u8; LEN];
        for (i, ch) in text.chars().enumerate() {
            let code = ch as u32;
            out[i] = match self.charset {
                Charset::Ascii if code < 0x80 => code as u8,
                Charset::Ascii => b'?',
                Charset::Latin1 if code < 0x100 => code as u8,
                Charset::Latin1 => b'?',
            };
        }
        Ok(out)
    }
}

impl DptXlator for Dpt16Xlator {
    fn set_values(&mut self, text: &[&str]) -> Result<()> {
        let mut out = Vec::with_capacity(text.len() * LEN);
        for t in text {
            out.extend_from_slice(&self.encode_one(t)?);
        }
        self.data = out;
        Ok(())
    }

    fn get_all_values(&self) -> Result<Vec<String>> {
        Ok(self.data.chunks(LEN).map(|c| self.decode_one(c)).collect())
    }

    fn set_data(&mut self, data: &[u8]) -> Result<()> {
        check_buffer_size(data, self.item_count(), LEN)?;
        self.data = data.to_vec();
        Ok(())
    }

    fn get_data(&self) -> &[u8] {
        &self.data
    }

    fn item_count(&self) -> usize {
        self.data.len() / LEN
    }

    fn type_size(&self) -> usize {
        LEN
    }

    fn numeric_value(&self, _item: usize) -> Result<f64> {
        Err(Error::IllegalArgument("DPT 16 has no numeric representation".into()))
    }

    fn sub_types(&self) -> &'static [SubType] {
        SUB_TYPES
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_ascii() {
        let mut x = Dpt16Xlator::new(1, Charset::Ascii);
        x.set_value("hello").unwrap();
        assert_eq!(x.get_value(0).unwrap(), "hello");
    }

    #[test]
    fn ascii_replaces_non_ascii() {
        let mut x = Dpt16Xlator::new(1, Charset::Ascii);
        x.set_value("caf\u{e9}").unwrap();
        assert_eq!(x.get_value(0).unwrap(), "caf?");
    }

    #[test]
    fn latin1_preserves_high_bytes() {
        let mut x = Dpt16Xlator::new(1, Charset::Latin1);
        x.set_value("caf\u{e9}").unwrap();
        assert_eq!(x.get_value(0).unwrap(), "caf\u{e9}");
    }

    #[test]
    fn rejects_overlong_input() {
        let mut x = Dpt16Xlator::new(1, Charset::Ascii);
        assert!(x.set_value("this string is far too long").is_err());
    }
}
