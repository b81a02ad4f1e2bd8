//! DPT 11.xxx — date. 3 bytes: day, month, year-offset (0..99). KNX's
//! two-digit year rule: 0..89 maps to 2000..2089, 90..99 maps to 1990..1999.
//! Calendar validity (including leap years) is checked via `chrono`.

use crate::dpt::translator::{check_buffer_size, DptXlator, SubType};
use crate::error::{Error, Result};
use chrono::{Datelike, NaiveDate};

const SUB_TYPES: &[SubType] = &[SubType {
    id: "11.001",
    name: "Date",
}];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Date {
    pub day: u8,
    pub month: u8,
    pub year: u16,
}

fn knx_year(offset: u8) -> u16 {
    if offset < 90 {
        2000 + offset as u16
    } else {
        1900 + offset as u16
    }
}

fn year_offset(year: u16) -> Result<u8> {
    match year {
        2000..=2089 => Ok((year - 2000) as u8),
        1990..=1999 => Ok((year - 1900) as u8),
        _ => Err(Error::IllegalArgument(format!("year {} outside 1990..2089", year))),
    }
}

impl Date {
    fn from_bytes(day: u8, month: u8, year_byte: u8) -> Result<Date> {
        let d = Date { day, month, year: knx_year(year_byte & 0x7F) };
        d.validate()?;
        Ok(d)
    }

    fn validate(self) -> Result<()> {
        NaiveDate::from_ymd_opt(self.year as i32, self.month as u32, self.day as u32)
            .ok_or_else(|| {
                Error::IllegalArgument(format!(
                    "{:04}-{:02}-{:02} is not a valid calendar date",
                    self.year, self.month, self.day
                ))
            })?;
        Ok(())
    }

    fn to_bytes(self) -> Result<[u8; 3]> {
        self.validate()?;
        Ok([self.day, self.month, year_offset(self.year)?])
    }
}

fn parse(text: &str) -> Result<Date> {
    let fields: Vec<&str> = text.trim().split('-').collect();
    if fields.len() != 3 {
        return Err(Error::IllegalArgument("expected \"YYYY-MM-DD\"".into()));
    }
    let year: u16 = fields[0].parse().map_err(|_| Error::IllegalArgument("bad year".into()))?;
    let month: u8 = fields[1].parse().map_err(|_| Error::IllegalArgument("bad month".into()))?;
    let day: u8 = fields[2].parse().map_err(|_| Error::IllegalArgument("bad day".into()))?;
    let d = Date { day, month, year };
    d.validate()?;
    Ok(d)
}

#[derive(Debug, Clone, Default)]
pub struct Dpt11Xlator {
    data: Vec<u8>,
}

impl Dpt11Xlator {
    pub fn new(item_count: usize) -> Dpt11Xlator {
        Dpt11Xlator {
            data: vec![0u8; item_count * 3],
        }
    }

    pub fn value(&self, item: usize) -> Result<Date> {
        let off = item * 3;
        let b = self
            .data
            .get(off..off + 3)
            .ok_or_else(|| Error::IllegalArgument(format!("item {} out of range", item)))?;
        Date::from_bytes(b[0], b[1], b[2])
    }
}

impl DptXlator for Dpt11Xlator {
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
                let d = self.value(i)?;
                Ok(format!("{:04}-{:02}-{:02}", d.year, d.month, d.day))
            })
            .collect()
    }

    fn set_data(&mut self, data: &[u8]) -> Result<()> {
        check_buffer_size(data, self.item_count(), 3)?;
        for chunk in data.chunks(3) {
            Date::from_bytes(chunk[0], chunk[1], chunk[2])?;
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
        let d = self.value(item)?;
        Ok(NaiveDate::from_ymd_opt(d.year as i32, d.month as u32, d.day as u32)
            .unwrap()
            .num_days_from_ce() as f64)
    }

    fn sub_types(&self) -> &'static [SubType] {
        SUB_TYPES
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_2000s() {
        let mut x = Dpt11Xlator::new(1);
        x.set_value("2024-03-15").unwrap();
        assert_eq!(x.value(0).unwrap(), Date { day: 15, month: 3, year: 2024 });
    }

    #[test]
    fn round_trip_1990s() {
        let mut x = Dpt11Xlator::new(1);
        x.set_value("1995-07-04").unwrap();
        assert_eq!(x.get_data(), &[4, 7, 95]);
    }

    #[test]
    fn rejects_non_leap_feb_29() {
        let mut x = Dpt11Xlator::new(1);
        assert!(x.set_value("2007-02-29").is_err());
    }

    #[test]
    fn accepts_leap_feb_29() {
        let mut x = Dpt11Xlator::new(1);
        assert!(x.set_value("2008-02-29").is_ok());
    }
}
