//! Common External Message Interface (cEMI): the payload carried inside
//! `Tunneling.req`, `Device-configuration.req` and `Routing.ind` bodies.
//!
//! Parsing is strict about buffer bounds but otherwise thin: a frame is a
//! message code plus a variable body whose shape depends on that code.
//! `L_Data` frames additionally decode the NPCI/TPCI/APCI chain down to a
//! typed [`Apci`] and the raw application data bytes.

use crate::codec::primitive::{BigEndianReader, BigEndianWriter};
use crate::error::Error;
use std::io::Cursor;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageCode {
    LDataReq,
    LDataCon,
    LDataInd,
    MPropReadReq,
    MPropReadCon,
    MPropWriteReq,
    MPropWriteCon,
}

impl MessageCode {
    pub fn to_u8(self) -> u8 {
        match self {
            MessageCode::LDataReq => 0x11,
            MessageCode::LDataCon => 0x2E,
            MessageCode::LDataInd => 0x29,
            MessageCode::MPropReadReq => 0xFC,
            MessageCode::MPropReadCon => 0xFB,
            MessageCode::MPropWriteReq => 0xF6,
            MessageCode::MPropWriteCon => 0xF5,
        }
    }

    pub fn from_u8(v: u8) -> Option<MessageCode> {
        Some(match v {
            0x11 => MessageCode::LDataReq,
            0x2E => MessageCode::LDataCon,
            0x29 => MessageCode::LDataInd,
            0xFC => MessageCode::MPropReadReq,
            0xFB => MessageCode::MPropReadCon,
            0xF6 => MessageCode::MPropWriteReq,
            0xF5 => MessageCode::MPropWriteCon,
            _ => return None,
        })
    }
}

/// KNX destination address: either an individual (point-to-point) address
/// or a group address. Both are plain u16s on the wire; which one a frame
/// carries is signalled by [`ControlField2::is_group_address`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Destination {
    Individual(u16),
    Group(u16),
}

impl Destination {
    pub fn raw(self) -> u16 {
        match self {
            Destination::Individual(a) | Destination::Group(a) => a,
        }
    }
}

/// Priority field of Control Field 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Priority {
    System,
    Normal,
    Urgent,
    Low,
}

impl Priority {
    fn from_bits(b: u8) -> Priority {
        match b & 0x03 {
            0b00 => Priority::System,
            0b01 => Priority::Normal,
            0b10 => Priority::Urgent,
            _ => Priority::Low,
        }
    }

    fn to_bits(self) -> u8 {
        match self {
            Priority::System => 0b00,
            Priority::Normal => 0b01,
            Priority::Urgent => 0b10,
            Priority::Low => 0b11,
        }
    }
}

/// Control Field 1: frame type, repeat, system broadcast, priority, ack
/// request, confirm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlField1 {
    pub standard_frame: bool,
    pub do_not_repeat: bool,
    pub system_broadcast: bool,
    pub priority: Priority,
    pub ack_requested: bool,
    pub error: bool,
}

impl ControlField1 {
    pub fn from_byte(raw: u8) -> ControlField1 {
        ControlField1 {
            standard_frame: raw & 0x80 != 0,
            do_not_repeat: raw & 0x20 != 0,
            system_broadcast: raw & 0x10 != 0,
            priority: Priority::from_bits(raw >> 2),
            ack_requested: raw & 0x02 != 0,
            error: raw & 0x01 != 0,
        }
    }

    pub fn to_byte(self) -> u8 {
        let mut raw = 0x40u8; // bit 6 reserved, always 1 on the wire
        if self.standard_frame {
            raw |= 0x80;
        }
        if self.do_not_repeat {
            raw |= 0x20;
        }
        if self.system_broadcast {
            raw |= 0x10;
        }
        raw |= self.priority.to_bits() << 2;
        if self.ack_requested {
            raw |= 0x02;
        }
        if self.error {
            raw |= 0x01;
        }
        raw
    }
}

/// Control Field 2: destination address type, hop count, extended frame
/// format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlField2 {
    pub group_address: bool,
    pub hop_count: u8,
    pub extended_format: u8,
}

impl ControlField2 {
    pub fn from_byte(raw: u8) -> ControlField2 {
        ControlField2 {
            group_address: raw & 0x80 != 0,
            hop_count: (raw >> 4) & 0x07,
            extended_format: raw & 0x0F,
        }
    }

    pub fn to_byte(self) -> u8 {
        let mut raw = 0u8;
        if self.group_address {
            raw |= 0x80;
        }
        raw |= (self.hop_count & 0x07) << 4;
        raw |= self.extended_format & 0x0F;
        raw
    }
}

/// Transport-layer protocol control information, carried in the top two
/// bits of the first NPDU octet (absent when the NPDU is a single byte —
/// see [`Apci::from_npdu`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tpci {
    UnnumberedData,
    NumberedData { sequence: u8 },
    UnnumberedControl,
    NumberedControl { sequence: u8 },
}

impl Tpci {
    fn from_byte(byte: u8) -> Tpci {
        match (byte >> 6) & 0x03 {
            0b00 => Tpci::UnnumberedData,
            0b01 => Tpci::NumberedData {
                sequence: (byte >> 2) & 0x0F,
            },
            0b10 => Tpci::UnnumberedControl,
            _ => Tpci::NumberedControl {
                sequence: (byte >> 2) & 0x0F,
            },
        }
    }

    fn to_byte(self) -> u8 {
        match self {
            Tpci::UnnumberedData => 0b00 << 6,
            Tpci::NumberedData { sequence } => (0b01 << 6) | ((sequence & 0x0F) << 2),
            Tpci::UnnumberedControl => 0b10 << 6,
            Tpci::NumberedControl { sequence } => (0b11 << 6) | ((sequence & 0x0F) << 2),
        }
    }

    fn is_data(self) -> bool {
        matches!(self, Tpci::UnnumberedData | Tpci::NumberedData { .. })
    }
}

/// Application-layer protocol control information: the command carried by
/// a data NPDU, decoded from the 10-bit field split across the TPCI byte's
/// low 2 bits and the following byte's high 2 bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Apci {
    GroupValueRead,
    GroupValueResponse,
    GroupValueWrite,
    IndividualAddressWrite,
    IndividualAddressRead,
    IndividualAddressResponse,
    Unknown(u16),
}

impl Apci {
    fn from_code(code: u16) -> Apci {
        match code {
            0x000 => Apci::GroupValueRead,
            0x040 => Apci::GroupValueResponse,
            0x080 => Apci::GroupValueWrite,
            0x0C0 => Apci::IndividualAddressWrite,
            0x100 => Apci::IndividualAddressRead,
            0x140 => Apci::IndividualAddressResponse,
            other => Apci::Unknown(other),
        }
    }

    fn to_code(self) -> u16 {
        match self {
            Apci::GroupValueRead => 0x000,
            Apci::GroupValueResponse => 0x040,
            Apci::GroupValueWrite => 0x080,
            Apci::IndividualAddressWrite => 0x0C0,
            Apci::IndividualAddressRead => 0x100,
            Apci::IndividualAddressResponse => 0x140,
            Apci::Unknown(code) => code,
        }
    }
}

/// The Transport/Application PDU of an `L_Data` frame: the decoded command
/// plus whatever data travels with it.
///
/// KNX packs short (<=6 bit) values directly into the APCI byte. When the
/// NPDU is a single octet the TPCI byte is considered implicitly zero
/// (`UnnumberedData`, APCI high bits 0) and that single byte supplies both
/// the APCI low bits and the packed data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Npdu {
    pub tpci: Tpci,
    pub apci: Apci,
    /// Value packed into the APCI byte's low 6 bits, when present.
    pub packed_value: Option<u8>,
    /// Extra application data bytes beyond the TPCI/APCI pair.
    pub extra: Vec<u8>,
}

impl Npdu {
    /// `npdu_length` is the wire value: total TPDU octets minus one.
    /// `tail` is the buffer remaining after the `npdu_length` byte.
    fn parse(npdu_length: u8, tail: &[u8]) -> Result<Npdu, Error> {
        let tpdu_len = npdu_length as usize + 1;
        if tail.len() != tpdu_len {
            return Err(Error::LengthMismatch {
                declared: tpdu_len,
                available: tail.len(),
            });
        }
        if tpdu_len == 1 {
            let byte = tail[0];
            let apci = Apci::from_code((byte & 0xC0) as u16);
            return Ok(Npdu {
                tpci: Tpci::UnnumberedData,
                apci,
                packed_value: Some(byte & 0x3F),
                extra: Vec::new(),
            });
        }
        let tpci_byte = tail[0];
        let apci_byte = tail[1];
        let tpci = Tpci::from_byte(tpci_byte);
        if !tpci.is_data() {
            return Ok(Npdu {
                tpci,
                apci: Apci::Unknown(0),
                packed_value: None,
                extra: tail[1..].to_vec(),
            });
        }
        let code = ((tpci_byte as u16 & 0x03) << 8) | (apci_byte as u16 & 0xC0);
        let apci = Apci::from_code(code);
        let (packed_value, extra) = if tail.len() == 2 {
            (Some(apci_byte & 0x3F), Vec::new())
        } else {
            (None, tail[2..].to_vec())
        };
        Ok(Npdu {
            tpci,
            apci,
            packed_value,
            extra,
        })
    }

    fn is_compact(&self) -> bool {
        self.packed_value.is_some() && matches!(self.tpci, Tpci::UnnumberedData) && self.extra.is_empty()
    }

    fn npdu_length(&self) -> u8 {
        let len = if self.is_compact() { 1 } else { 2 + self.extra.len() };
        (len - 1) as u8
    }

    fn pack(&self, out: &mut Vec<u8>) {
        out.push(self.npdu_length());
        if self.is_compact() {
            let v = self.packed_value.unwrap();
            out.push((self.apci.to_code() as u8 & 0xC0) | (v & 0x3F));
            return;
        }
        match self.packed_value {
            Some(v) => {
                let code = self.apci.to_code();
                out.push(self.tpci.to_byte() | ((code >> 8) as u8 & 0x03));
                out.push(((code as u8) & 0xC0) | (v & 0x3F));
                out.extend_from_slice(&self.extra);
            }
            None => {
                let code = self.apci.to_code();
                out.push(self.tpci.to_byte() | ((code >> 8) as u8 & 0x03));
                out.push((code as u8) & 0xC0);
                out.extend_from_slice(&self.extra);
            }
        }
    }
}

/// An `L_Data.req` / `.con` / `.ind` frame: the only cEMI shape this crate
/// interprets beyond the message code and the device-management envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LData {
    pub message_code: MessageCode,
    pub additional_info: Vec<u8>,
    pub ctrl1: ControlField1,
    pub ctrl2: ControlField2,
    pub source: u16,
    pub destination: Destination,
    pub npdu: Npdu,
}

impl LData {
    pub fn is_system_broadcast(&self) -> bool {
        self.message_code == MessageCode::LDataInd
            && matches!(self.destination, Destination::Group(0))
            && self.ctrl1.system_broadcast
    }

    pub fn pack(&self) -> Vec<u8> {
        let mut out = Vec::new();
        out.push(self.message_code.to_u8());
        out.push(self.additional_info.len() as u8);
        out.extend_from_slice(&self.additional_info);
        out.push(self.ctrl1.to_byte());
        out.push(self.ctrl2.to_byte());
        out.write_val(self.source).unwrap();
        out.write_val(self.destination.raw()).unwrap();
        self.npdu.pack(&mut out);
        out
    }

    pub fn unpack(buf: &[u8]) -> Result<LData, Error> {
        if buf.len() < 2 {
            return Err(Error::LengthMismatch {
                declared: 2,
                available: buf.len(),
            });
        }
        let message_code = MessageCode::from_u8(buf[0])
            .filter(|mc| {
                matches!(
                    mc,
                    MessageCode::LDataReq | MessageCode::LDataCon | MessageCode::LDataInd
                )
            })
            .ok_or(Error::MalformedFrame(format!(
                "not an L_Data message code: {:#04x}",
                buf[0]
            )))?;
        let add_info_len = buf[1] as usize;
        if buf.len() < 2 + add_info_len + 6 {
            return Err(Error::LengthMismatch {
                declared: 2 + add_info_len + 6,
                available: buf.len(),
            });
        }
        let additional_info = buf[2..2 + add_info_len].to_vec();
        let body = &buf[2 + add_info_len..];
        let ctrl1 = ControlField1::from_byte(body[0]);
        let ctrl2 = ControlField2::from_byte(body[1]);
        let mut c = Cursor::new(&body[2..6]);
        let source: u16 = c.read_val()?;
        let dest_raw: u16 = c.read_val()?;
        let destination = if ctrl2.group_address {
            Destination::Group(dest_raw)
        } else {
            Destination::Individual(dest_raw)
        };
        if body.len() < 7 {
            return Err(Error::LengthMismatch {
                declared: 7,
                available: body.len(),
            });
        }
        let npdu_length = body[6];
        let npdu = Npdu::parse(npdu_length, &body[7..])?;
        Ok(LData {
            message_code,
            additional_info,
            ctrl1,
            ctrl2,
            source,
            destination,
            npdu,
        })
    }
}

/// A parsed device-management property-access envelope
/// (`M_PropRead.req/con`, `M_PropWrite.req/con`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyAccess {
    pub message_code: MessageCode,
    pub object_type: u16,
    pub object_instance: u8,
    pub property_id: u8,
    pub number_of_elements: u8,
    pub start_index: u16,
    pub data: Vec<u8>,
}

impl PropertyAccess {
    pub fn pack(&self) -> Vec<u8> {
        let mut out = Vec::new();
        out.push(self.message_code.to_u8());
        out.push(0); // no additional info on device-management frames
        out.write_val(self.object_type).unwrap();
        out.write_val(self.object_instance).unwrap();
        out.write_val(self.property_id).unwrap();
        let nr_and_start = ((self.number_of_elements as u16 & 0x0F) << 12) | (self.start_index & 0x0FFF);
        out.write_val(nr_and_start).unwrap();
        out.extend_from_slice(&self.data);
        out
    }

    pub fn unpack(buf: &[u8]) -> Result<PropertyAccess, Error> {
        if buf.len() < 2 {
            return Err(Error::LengthMismatch {
                declared: 2,
                available: buf.len(),
            });
        }
        let message_code = MessageCode::from_u8(buf[0])
            .filter(|mc| {
                matches!(
                    mc,
                    MessageCode::MPropReadReq
                        | MessageCode::MPropReadCon
                        | MessageCode::MPropWriteReq
                        | MessageCode::MPropWriteCon
                )
            })
            .ok_or(Error::MalformedFrame(format!(
                "not a property-access message code: {:#04x}",
                buf[0]
            )))?;
        let add_info_len = buf[1] as usize;
        let body = &buf[2 + add_info_len..];
        if body.len() < 6 {
            return Err(Error::LengthMismatch {
                declared: 6,
                available: body.len(),
            });
        }
        let mut c = Cursor::new(&body[0..6]);
        let object_type: u16 = c.read_val()?;
        let object_instance: u8 = c.read_val()?;
        let property_id: u8 = c.read_val()?;
        let nr_and_start: u16 = c.read_val()?;
        let number_of_elements = ((nr_and_start >> 12) & 0x0F) as u8;
        let start_index = nr_and_start & 0x0FFF;
        let data = body[6..].to_vec();
        Ok(PropertyAccess {
            message_code,
            object_type,
            object_instance,
            property_id,
            number_of_elements,
            start_index,
            data,
        })
    }
}

/// Any cEMI frame this crate can interpret; message codes outside this set
/// are surfaced to callers as `Opaque` so a frame can still be forwarded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CemiFrame {
    LData(LData),
    PropertyAccess(PropertyAccess),
    Opaque { message_code: u8, data: Vec<u8> },
}

impl CemiFrame {
    pub fn unpack(buf: &[u8]) -> Result<CemiFrame, Error> {
        if buf.is_empty() {
            return Err(Error::LengthMismatch {
                declared: 1,
                available: 0,
            });
        }
        match MessageCode::from_u8(buf[0]) {
            Some(MessageCode::LDataReq) | Some(MessageCode::LDataCon) | Some(MessageCode::LDataInd) => {
                Ok(CemiFrame::LData(LData::unpack(buf)?))
            }
            Some(MessageCode::MPropReadReq)
            | Some(MessageCode::MPropReadCon)
            | Some(MessageCode::MPropWriteReq)
            | Some(MessageCode::MPropWriteCon) => {
                Ok(CemiFrame::PropertyAccess(PropertyAccess::unpack(buf)?))
            }
            None => Ok(CemiFrame::Opaque {
                message_code: buf[0],
                data: buf[1..].to_vec(),
            }),
        }
    }

    pub fn pack(&self) -> Vec<u8> {
        match self {
            CemiFrame::LData(f) => f.pack(),
            CemiFrame::PropertyAccess(f) => f.pack(),
            CemiFrame::Opaque { message_code, data } => {
                let mut out = Vec::with_capacity(1 + data.len());
                out.push(*message_code);
                out.extend_from_slice(data);
                out
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scenario_d_group_value_write() {
        let raw = [0x11, 0x00, 0xBC, 0xE0, 0x11, 0x01, 0x00, 0x01, 0x00, 0x81];
        let cemi = CemiFrame::unpack(&raw).unwrap();
        let ldata = match cemi {
            CemiFrame::LData(f) => f,
            _ => panic!("expected LData"),
        };
        assert_eq!(ldata.message_code, MessageCode::LDataReq);
        assert_eq!(ldata.source, 0x1101);
        assert_eq!(ldata.destination, Destination::Group(0x0001));
        assert_eq!(ldata.npdu.apci, Apci::GroupValueWrite);
        assert_eq!(ldata.npdu.packed_value, Some(1));

        let packed = ldata.pack();
        assert_eq!(packed, raw);
    }

    #[test]
    fn control_field_round_trip() {
        let ctrl1 = ControlField1::from_byte(0xBC);
        assert!(ctrl1.standard_frame);
        assert!(ctrl1.do_not_repeat);
        assert!(!ctrl1.system_broadcast);
        assert_eq!(ctrl1.priority, Priority::Low);
        assert_eq!(ctrl1.to_byte(), 0xBC);

        let ctrl2 = ControlField2::from_byte(0xE0);
        assert!(ctrl2.group_address);
        assert_eq!(ctrl2.hop_count, 6);
        assert_eq!(ctrl2.extended_format, 0);
        assert_eq!(ctrl2.to_byte(), 0xE0);
    }

    #[test]
    fn rejects_non_ldata_message_code_for_ldata_unpack() {
        let raw = [0xFC, 0x00, 0, 0, 0, 0, 0, 0];
        assert!(LData::unpack(&raw).is_err());
    }

    #[test]
    fn property_access_round_trip() {
        let pa = PropertyAccess {
            message_code: MessageCode::MPropWriteReq,
            object_type: 0,
            object_instance: 1,
            property_id: 0x0C,
            number_of_elements: 1,
            start_index: 1,
            data: vec![0x11],
        };
        let packed = pa.pack();
        let parsed = PropertyAccess::unpack(&packed).unwrap();
        assert_eq!(parsed, pa);
    }

    #[test]
    fn opaque_message_code_roundtrips_unchanged() {
        let raw = [0x2B, 0xAA, 0xBB];
        let cemi = CemiFrame::unpack(&raw).unwrap();
        assert!(matches!(cemi, CemiFrame::Opaque { message_code: 0x2B, .. }));
        assert_eq!(cemi.pack(), raw);
    }
}
