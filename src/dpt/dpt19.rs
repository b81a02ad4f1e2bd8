//! DPT 19.xxx — date and time: 8 bytes carrying year/month/day,
//! day-of-week + time, and a byte of independent validity/quality flags.
//! Each validity flag (year/date/day-of-week/time) can be cleared on its
//! own; whether the overall value makes sense is a separate question
//! answered by `validate`, not something `set_data`/`set_value` enforce —
//! a gateway forwarding a partially-valid frame from the bus should not
//! have that frame rejected just because `set_data` was stricter than the
//! wire format itself.

use crate::dpt::translator::{check_buffer_size, DptXlator, SubType};
use crate::error::{Error, Result};
use chrono::NaiveDate;

const SUB_TYPES: &[SubType] = &[SubType {
    id: "19.001",
    name: "Date and time",
}];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateTime {
    pub year: u16,
    pub month: u8,
    pub day: u8,
    /// 0 = no day, 1..=7 = Monday..Sunday.
    pub day_of_week: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    pub fault: bool,
    pub working_day: bool,
    pub year_valid: bool,
    pub date_valid: bool,
    pub day_of_week_valid: bool,
    pub time_valid: bool,
    pub dst: bool,
    pub sync_quality: bool,
}

impl DateTime {
    fn from_bytes(b: &[u8; 8]) -> DateTime {
        DateTime {
            year: 1900 + b[0] as u16,
            month: b[1] & 0x0F,
            day: b[2] & 0x1F,
            day_of_week: (b[3] >> 5) & 0x07,
            hour: b[3] & 0x1F,
            minute: b[4] & 0x3F,
            second: b[5] & 0x3F,
            fault: b[6] & 0x80 != 0,
            working_day: b[6] & 0x40 != 0,
            year_valid: b[6] & 0x10 == 0,
            date_valid: b[6] & 0x08 == 0,
            day_of_week_valid: b[6] & 0x04 == 0,
            time_valid: b[6] & 0x02 == 0,
            dst: b[6] & 0x01 != 0,
            sync_quality: b[7] & 0x80 != 0,
        }
    }

    fn to_bytes(self) -> Result<[u8; 8]> {
        if self.year < 1900 || self.year > 2155 {
            return Err(Error::IllegalArgument(format!("year {} outside 1900..2155", self.year)));
        }
        let mut flags = 0u8;
        if self.fault {
            flags |= 0x80;
        }
        if self.working_day {
            flags |= 0x40;
        }
        if !self.year_valid {
            flags |= 0x10;
        }
        if !self.date_valid {
            flags |= 0x08;
        }
        if !self.day_of_week_valid {
            flags |= 0x04;
        }
        if !self.time_valid {
            flags |= 0x02;
        }
        if self.dst {
            flags |= 0x01;
        }
        Ok([
            (self.year - 1900) as u8,
            self.month & 0x0F,
            self.day & 0x1F,
            (self.day_of_week << 5) | (self.hour & 0x1F),
            self.minute & 0x3F,
            self.second & 0x3F,
            flags,
            if self.sync_quality { 0x80 } else { 0 },
        ])
    }

    /// Checks that fields declared valid are internally consistent
    /// (in-range, a real calendar date). Fields flagged invalid are not
    /// examined.
    pub fn validate(&self) -> Result<()> {
        if self.date_valid
            && NaiveDate::from_ymd_opt(self.year as i32, self.month as u32, self.day as u32).is_none()
        {
            return Err(Error::IllegalArgument(format!(
                "{:04}-{:02}-{:02} is not a valid calendar date",
                self.year, self.month, self.day
            )));
        }
        if self.time_valid && (self.hour > 23 || self.minute > 59 || self.second > 59) {
            return Err(Error::IllegalArgument("time field out of range".into()));
        }
        if self.day_of_week_valid && self.day_of_week > 7 {
            return Err(Error::IllegalArgument(format!(
                "day_of_week {} not in 0..7",
                self.day_of_week
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct Dpt19Xlator {
    data: Vec<u8>,
}

impl Dpt19Xlator {
    pub fn new(item_count: usize) -> Dpt19Xlator {
        Dpt19Xlator {
            data: vec![0u8; item_count * 8],
        }
    }

    pub fn value(&self, item: usize) -> Result<DateTime> {
        let off = item * 8;
        let b = self
            .data
            .get(off..off + 8)
            .ok_or_else(|| Error::IllegalArgument(format!("item {} out of range", item)))?;
        let arr: [u8; 8] = b.try_into().unwrap();
        Ok(DateTime::from_bytes(&arr))
    }

    pub fn set(&mut self, item: usize, v: DateTime) -> Result<()> {
        let bytes = v.to_bytes()?;
        let off = item * 8;
        self.data
            .get_mut(off..off + 8)
            .ok_or_else(|| Error::IllegalArgument(format!("item {} out of range", item)))?
            .copy_from_slice(&bytes);
        Ok(())
    }
}

impl DptXlator for Dpt19Xlator {
    fn set_values(&mut self, _text: &[&str]) -> Result<()> {
        Err(Error::IllegalArgument(
            "DPT 19 values are set structurally via `set`, not free text".into(),
        ))
    }

    fn get_all_values(&self) -> Result<Vec<String>> {
        (0..self.item_count())
            .map(|i| {
                let d = self.value(i)?;
                Ok(format!(
                    "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
                    d.year, d.month, d.day, d.hour, d.minute, d.second
                ))
            })
            .collect()
    }

    fn set_data(&mut self, data: &[u8]) -> Result<()> {
        check_buffer_size(data, self.item_count(), 8)?;
        self.data = data.to_vec();
        Ok(())
    }

    fn get_data(&self) -> &[u8] {
        &self.data
    }

    fn item_count(&self) -> usize {
        self.data.len() / 8
    }

    fn type_size(&self) -> usize {
        8
    }

    fn numeric_value(&self, item: usize) -> Result<f64> {
        let d = self.value(item)?;
        Ok((d.hour as f64 * 3600.0) + (d.minute as f64 * 60.0) + d.second as f64)
    }

    fn sub_types(&self) -> &'static [SubType] {
        SUB_TYPES
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_valid(year: u16, month: u8, day: u8, hour: u8, minute: u8, second: u8) -> DateTime {
        DateTime {
            year,
            month,
            day,
            day_of_week: 0,
            hour,
            minute,
            second,
            fault: false,
            working_day: false,
            year_valid: true,
            date_valid: true,
            day_of_week_valid: false,
            time_valid: true,
            dst: false,
            sync_quality: false,
        }
    }

    #[test]
    fn round_trip() {
        let mut x = Dpt19Xlator::new(1);
        let dt = full_valid(2024, 6, 1, 12, 30, 0);
        x.set(0, dt).unwrap();
        assert_eq!(x.value(0).unwrap(), dt);
    }

    #[test]
    fn set_data_allows_invalid_date_when_flagged_invalid() {
        let mut x = Dpt19Xlator::new(1);
        // date_valid flag cleared (0x08 set) even though month/day are garbage.
        x.set_data(&[124, 0x0F, 0x1F, 0x00, 0x00, 0x00, 0x08, 0x00]).unwrap();
        let v = x.value(0).unwrap();
        assert!(!v.date_valid);
        assert!(v.validate().is_ok());
    }

    #[test]
    fn validate_rejects_inconsistent_valid_date() {
        let dt = full_valid(2024, 2, 30, 0, 0, 0);
        assert!(dt.validate().is_err());
    }
}
