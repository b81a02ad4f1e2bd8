//! DPT 10.xxx — time of day. 3 bytes: `dow<<5 | hour`, `minute`, `second`.
//! `dow` 0 means "no day", 1..7 are Monday..Sunday. `24:00:00` is accepted
//! on input as a midnight-rollover synonym; any other value with hour 24 is
//! rejected.

use crate::dpt::translator::{check_buffer_size, DptXlator, SubType};
use crate::error::{Error, Result};

const SUB_TYPES: &[SubType] = &[SubType {
    id: "10.001",
    name: "Time of day",
}];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeOfDay {
    /// 0 = no day, 1..=7 = Monday..Sunday.
    pub day_of_week: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

impl TimeOfDay {
    fn from_bytes(b0: u8, b1: u8, b2: u8) -> Result<TimeOfDay> {
        let day_of_week = (b0 >> 5) & 0x07;
        let hour = b0 & 0x1F;
        let minute = b1 & 0x3F;
        let second = b2 & 0x3F;
        let t = TimeOfDay { day_of_week, hour, minute, second };
        t.validate()?;
        Ok(t)
    }

    fn validate(self) -> Result<()> {
        if self.day_of_week > 7 {
            return Err(Error::IllegalArgument(format!("day_of_week {} not in 0..7", self.day_of_week)));
        }
        if self.hour == 24 {
            if self.minute != 0 || self.second != 0 {
                return Err(Error::IllegalArgument(
                    "24:00:00 is the only valid value with hour 24".into(),
                ));
            }
        } else if self.hour > 23 {
            return Err(Error::IllegalArgument(format!("hour {} not in 0..24", self.hour)));
        }
        if self.minute > 59 {
            return Err(Error::IllegalArgument(format!("minute {} not in 0..59", self.minute)));
        }
        if self.second > 59 {
            return Err(Error::IllegalArgument(format!("second {} not in 0..59", self.second)));
        }
        Ok(())
    }

    fn to_bytes(self) -> Result<[u8; 3]> {
        self.validate()?;
        Ok([(self.day_of_week << 5) | self.hour, self.minute, self.second])
    }
}

fn parse(text: &str) -> Result<TimeOfDay> {
    let parts: Vec<&str> = text.split_whitespace().collect();
    let (dow_str, time_str) = match parts.as_slice() {
        [time] => ("0", *time),
        [dow, time] => (*dow, *time),
        _ => return Err(Error::IllegalArgument("expected \"[dow] HH:MM:SS\"".into())),
    };
    let day_of_week: u8 = dow_str
        .parse()
        .map_err(|_| Error::IllegalArgument(format!("not a day-of-week: {}", dow_str)))?;
    let fields: Vec<&str> = time_str.split(':').collect();
    if fields.len() != 3 {
        return Err(Error::IllegalArgument("expected \"HH:MM:SS\"".into()));
    }
    let hour: u8 = fields[0].parse().map_err(|_| Error::IllegalArgument("bad hour".into()))?;
    let minute: u8 = fields[1].parse().map_err(|_| Error::IllegalArgument("bad minute".into()))?;
    let second: u8 = fields[2].parse().map_err(|_| Error::IllegalArgument("bad second".into()))?;
    TimeOfDay { day_of_week, hour, minute, second }.validate()?;
    Ok(TimeOfDay { day_of_week, hour, minute, second })
}

#[derive(Debug, Clone, Default)]
pub struct Dpt10Xlator {
    data: Vec<u8>,
}

impl Dpt10Xlator {
    pub fn new(item_count: usize) -> Dpt10Xlator {
        Dpt10Xlator {
            data: vec![0u8; item_count * 3],
        }
    }

    pub fn value(&self, item: usize) -> Result<TimeOfDay> {
        let off = item * 3;
        let b = self
            .data
            .get(off..off + 3)
            .ok_or_else(|| Error::IllegalArgument(format!("item {} out of range", item)))?;
        TimeOfDay::from_bytes(b[0], b[1], b[2])
    }
}

impl DptXlator for Dpt10Xlator {
    fn set_values(&mut self, text: &[&str]) -> Result<()> {
        let mut out = Vec::with_capacity(text.len() * 3);
        for t in text {
            out.extend_from_slice(&parse(t)?.to_bytes()?);
        }
        self.data = out;
        Ok(())
    }

    fn get_all_values(&self) -> Result<Vec<String>> {
        (0..self.item_count())
            .map(|i| {
                let t = self.value(i)?;
                Ok(format!("{} {:02}:{:02}:{:02}", t.day_of_week, t.hour, t.minute, t.second))
            })
            .collect()
    }

    fn set_data(&mut self, data: &[u8]) -> Result<()> {
        check_buffer_size(data, self.item_count(), 3)?;
        for chunk in data.chunks(3) {
            TimeOfDay::from_bytes(chunk[0], chunk[1], chunk[2])?;
        }
        self.data = data.to_vec();
        Ok(())
    }

    fn get_data(&self) -> &[u8] {
        &self.data
    }

    fn item_count(&self) -> usize {
        self.data.len() / 3
    }

    fn type_size(&self) -> usize {
        3
    }

    fn numeric_value(&self, item: usize) -> Result<f64> {
        let t = self.value(item)?;
        Ok((t.hour as f64 * 3600.0) + (t.minute as f64 * 60.0) + t.second as f64)
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
        let mut x = Dpt10Xlator::new(1);
        x.set_value("3 14:30:05").unwrap();
        assert_eq!(
            x.value(0).unwrap(),
            TimeOfDay { day_of_week: 3, hour: 14, minute: 30, second: 5 }
        );
    }

    #[test]
    fn accepts_midnight_rollover() {
        let mut x = Dpt10Xlator::new(1);
        x.set_value("0 24:00:00").unwrap();
        assert_eq!(x.value(0).unwrap().hour, 24);
    }

    #[test]
    fn rejects_24_00_01() {
        let mut x = Dpt10Xlator::new(1);
        assert!(x.set_value("0 24:00:01").is_err());
    }
}
