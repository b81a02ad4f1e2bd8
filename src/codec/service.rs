//! Service-type codec: the tagged union over every KNXnet/IP service body,
//! dispatched by the `service_type` field of the header (C3).

use crate::codec::primitive::{BigEndianReader, BigEndianWriter};
use crate::codec::structures::{Cri, Crd, DibSet, Hpai, Srp};
use crate::error::Error;
use std::io::Cursor;

pub mod service_type {
    pub const SEARCH_REQUEST: u16 = 0x0201;
    pub const SEARCH_RESPONSE: u16 = 0x0202;
    pub const DESCRIPTION_REQUEST: u16 = 0x0203;
    pub const DESCRIPTION_RESPONSE: u16 = 0x0204;
    pub const CONNECT_REQUEST: u16 = 0x0205;
    pub const CONNECT_RESPONSE: u16 = 0x0206;
    pub const CONNECTIONSTATE_REQUEST: u16 = 0x0207;
    pub const CONNECTIONSTATE_RESPONSE: u16 = 0x0208;
    pub const DISCONNECT_REQUEST: u16 = 0x0209;
    pub const DISCONNECT_RESPONSE: u16 = 0x020A;
    pub const SEARCH_REQUEST_EXTENDED: u16 = 0x020B;
    pub const SEARCH_RESPONSE_EXTENDED: u16 = 0x020C;
    pub const DEVICE_CONFIGURATION_REQUEST: u16 = 0x0310;
    pub const DEVICE_CONFIGURATION_ACK: u16 = 0x0311;
    pub const TUNNELING_REQUEST: u16 = 0x0420;
    pub const TUNNELING_ACK: u16 = 0x0421;
    pub const TUNNELING_FEATURE_GET: u16 = 0x0422;
    pub const TUNNELING_FEATURE_RESPONSE: u16 = 0x0423;
    pub const TUNNELING_FEATURE_SET: u16 = 0x0424;
    pub const TUNNELING_FEATURE_INFO: u16 = 0x0425;
    pub const ROUTING_INDICATION: u16 = 0x0530;
    pub const ROUTING_LOST_MESSAGE: u16 = 0x0531;
    pub const ROUTING_BUSY_INDICATION: u16 = 0x0532;
    pub const ROUTING_SYSTEM_BROADCAST: u16 = 0x0533;
    pub const SECURE_SESSION_REQUEST: u16 = 0x0951;
}
use service_type::*;

/// `ConnectResponse.status` and the other connection-lifecycle status
/// codes that appear on `.res`/`.ack` bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Status(pub u8);

impl Status {
    pub const NO_ERROR: Status = Status(0x00);
    pub const HOST_PROTOCOL_TYPE: Status = Status(0x01);
    pub const VERSION_NOT_SUPPORTED: Status = Status(0x02);
    pub const SEQUENCE_NUMBER: Status = Status(0x04);
    pub const CONNECTION_ID: Status = Status(0x21);
    pub const CONNECTION_TYPE: Status = Status(0x22);
    pub const CONNECTION_OPTION: Status = Status(0x23);
    pub const NO_MORE_CONNECTIONS: Status = Status(0x24);
    pub const DATA_CONNECTION: Status = Status(0x26);
    pub const KNX_CONNECTION: Status = Status(0x27);
    pub const TUNNELING_LAYER: Status = Status(0x29);

    pub fn is_ok(self) -> bool {
        self.0 == Self::NO_ERROR.0
    }
}

/// `Connect.res` (0x0206): success carries the assigned data endpoint and
/// CRD, failure carries only a status code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectResponse {
    Ok {
        channel_id: u8,
        data_endpoint: Hpai,
        crd: Crd,
    },
    Err {
        status: Status,
    },
}

impl ConnectResponse {
    fn wire_len(&self) -> usize {
        match self {
            ConnectResponse::Ok { data_endpoint, crd, .. } => {
                2 + data_endpoint.wire_len() + crd.wire_len()
            }
            ConnectResponse::Err { .. } => 2,
        }
    }

    fn write_to(&self, out: &mut Vec<u8>) {
        match self {
            ConnectResponse::Ok {
                channel_id,
                data_endpoint,
                crd,
            } => {
                out.write_val(*channel_id).unwrap();
                out.write_val(Status::NO_ERROR.0).unwrap();
                data_endpoint.pack(out);
                crd.pack(out);
            }
            ConnectResponse::Err { status } => {
                out.write_val(0u8).unwrap();
                out.write_val(status.0).unwrap();
            }
        }
    }

    fn parse(body: &[u8]) -> Result<ConnectResponse, Error> {
        if body.len() < 2 {
            return Err(Error::LengthMismatch {
                declared: 2,
                available: body.len(),
            });
        }
        let channel_id = body[0];
        let status = Status(body[1]);
        if status.is_ok() {
            let (data_endpoint, consumed) = consumed_hpai(&body[2..])?;
            let crd = Crd::unpack(&body[2 + consumed..])?;
            Ok(ConnectResponse::Ok {
                channel_id,
                data_endpoint,
                crd,
            })
        } else {
            Ok(ConnectResponse::Err { status })
        }
    }
}

fn consumed_hpai(buf: &[u8]) -> Result<(Hpai, usize), Error> {
    let hpai = Hpai::unpack(buf)?;
    Ok((hpai, hpai.wire_len()))
}

/// `{struct_len=4, channel_id, seq, reserved(0)}`, shared by
/// `Tunneling.req/ack` and `Device-configuration.req/ack`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnHeader {
    pub channel_id: u8,
    pub seq: u8,
}

impl ConnHeader {
    const LEN: usize = 4;

    fn write_to(&self, out: &mut Vec<u8>) {
        out.write_val(Self::LEN as u8).unwrap();
        out.write_val(self.channel_id).unwrap();
        out.write_val(self.seq).unwrap();
        out.write_val(0u8).unwrap();
    }

    fn parse(buf: &[u8]) -> Result<ConnHeader, Error> {
        if buf.len() < Self::LEN {
            return Err(Error::LengthMismatch {
                declared: Self::LEN,
                available: buf.len(),
            });
        }
        let struct_len = buf[0] as usize;
        if struct_len != Self::LEN {
            return Err(Error::MalformedFrame(format!(
                "connection header struct_len {} != {}",
                struct_len,
                Self::LEN
            )));
        }
        Ok(ConnHeader {
            channel_id: buf[1],
            seq: buf[2],
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureId {
    SupportedEmiTypes,
    DeviceDescriptorType0,
    ConnectionStatus,
    Manufacturer,
    ActiveEmiType,
    IndividualAddress,
    MaxApduLength,
    EnableFeatureInfoService,
}

impl FeatureId {
    fn to_u8(self) -> u8 {
        match self {
            FeatureId::SupportedEmiTypes => 0x01,
            FeatureId::DeviceDescriptorType0 => 0x02,
            FeatureId::ConnectionStatus => 0x03,
            FeatureId::Manufacturer => 0x04,
            FeatureId::ActiveEmiType => 0x05,
            FeatureId::IndividualAddress => 0x06,
            FeatureId::MaxApduLength => 0x07,
            FeatureId::EnableFeatureInfoService => 0x08,
        }
    }

    fn from_u8(v: u8) -> Result<FeatureId, Error> {
        Ok(match v {
            0x01 => FeatureId::SupportedEmiTypes,
            0x02 => FeatureId::DeviceDescriptorType0,
            0x03 => FeatureId::ConnectionStatus,
            0x04 => FeatureId::Manufacturer,
            0x05 => FeatureId::ActiveEmiType,
            0x06 => FeatureId::IndividualAddress,
            0x07 => FeatureId::MaxApduLength,
            0x08 => FeatureId::EnableFeatureInfoService,
            x => return Err(Error::MalformedFrame(format!("unknown feature id {:#04x}", x))),
        })
    }

    /// The fixed value length this feature carries, per §4.2's table.
    fn value_len(self) -> usize {
        match self {
            FeatureId::SupportedEmiTypes
            | FeatureId::DeviceDescriptorType0
            | FeatureId::Manufacturer
            | FeatureId::IndividualAddress
            | FeatureId::MaxApduLength => 2,
            FeatureId::ConnectionStatus
            | FeatureId::ActiveEmiType
            | FeatureId::EnableFeatureInfoService => 1,
        }
    }
}

/// A `cEMI` payload carried inside a service body. This codec treats it as
/// opaque bytes — interpreting it is `cemi::CemiFrame`'s job, kept out of
/// this layer so the service-type dispatch stays a thin framing step.
pub type CemiPayload = Vec<u8>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceBody {
    SearchRequest {
        discovery: Hpai,
    },
    SearchResponse {
        control: Hpai,
        dibs: DibSet,
    },
    SearchRequestExtended {
        discovery: Hpai,
        srps: Vec<Srp>,
    },
    SearchResponseExtended {
        control: Hpai,
        dibs: DibSet,
    },
    DescriptionRequest {
        control: Hpai,
    },
    DescriptionResponse {
        dibs: DibSet,
    },
    ConnectRequest {
        control: Hpai,
        data: Hpai,
        cri: Cri,
    },
    ConnectResponse(ConnectResponse),
    ConnectionstateRequest {
        channel_id: u8,
        control: Hpai,
    },
    ConnectionstateResponse {
        channel_id: u8,
        status: Status,
    },
    DisconnectRequest {
        channel_id: u8,
        control: Hpai,
    },
    DisconnectResponse {
        channel_id: u8,
        status: Status,
    },
    RoutingIndication {
        cemi: CemiPayload,
    },
    RoutingLostMessage {
        device_state: u8,
        lost_count: u16,
    },
    RoutingBusyIndication {
        device_state: u8,
        wait_millis: u16,
        ctrl: u16,
    },
    RoutingSystemBroadcast {
        cemi: CemiPayload,
    },
    TunnelingRequest {
        header: ConnHeader,
        cemi: CemiPayload,
    },
    TunnelingAck {
        header: ConnHeader,
        status: Status,
    },
    DeviceConfigurationRequest {
        header: ConnHeader,
        cemi: CemiPayload,
    },
    DeviceConfigurationAck {
        header: ConnHeader,
        status: Status,
    },
    TunnelingFeatureGet {
        header: ConnHeader,
        feature_id: FeatureId,
    },
    TunnelingFeatureResponse {
        header: ConnHeader,
        feature_id: FeatureId,
        result_code: u8,
        value: Vec<u8>,
    },
    TunnelingFeatureSet {
        header: ConnHeader,
        feature_id: FeatureId,
        value: Vec<u8>,
    },
    TunnelingFeatureInfo {
        header: ConnHeader,
        feature_id: FeatureId,
        value: Vec<u8>,
    },
    SecureSessionRequest {
        control: Hpai,
        client_public_key: [u8; 32],
    },
}

impl ServiceBody {
    pub fn service_type(&self) -> u16 {
        match self {
            ServiceBody::SearchRequest { .. } => SEARCH_REQUEST,
            ServiceBody::SearchResponse { .. } => SEARCH_RESPONSE,
            ServiceBody::SearchRequestExtended { .. } => SEARCH_REQUEST_EXTENDED,
            ServiceBody::SearchResponseExtended { .. } => SEARCH_RESPONSE_EXTENDED,
            ServiceBody::DescriptionRequest { .. } => DESCRIPTION_REQUEST,
            ServiceBody::DescriptionResponse { .. } => DESCRIPTION_RESPONSE,
            ServiceBody::ConnectRequest { .. } => CONNECT_REQUEST,
            ServiceBody::ConnectResponse(_) => CONNECT_RESPONSE,
            ServiceBody::ConnectionstateRequest { .. } => CONNECTIONSTATE_REQUEST,
            ServiceBody::ConnectionstateResponse { .. } => CONNECTIONSTATE_RESPONSE,
            ServiceBody::DisconnectRequest { .. } => DISCONNECT_REQUEST,
            ServiceBody::DisconnectResponse { .. } => DISCONNECT_RESPONSE,
            ServiceBody::RoutingIndication { .. } => ROUTING_INDICATION,
            ServiceBody::RoutingLostMessage { .. } => ROUTING_LOST_MESSAGE,
            ServiceBody::RoutingBusyIndication { .. } => ROUTING_BUSY_INDICATION,
            ServiceBody::RoutingSystemBroadcast { .. } => ROUTING_SYSTEM_BROADCAST,
            ServiceBody::TunnelingRequest { .. } => TUNNELING_REQUEST,
            ServiceBody::TunnelingAck { .. } => TUNNELING_ACK,
            ServiceBody::DeviceConfigurationRequest { .. } => DEVICE_CONFIGURATION_REQUEST,
            ServiceBody::DeviceConfigurationAck { .. } => DEVICE_CONFIGURATION_ACK,
            ServiceBody::TunnelingFeatureGet { .. } => TUNNELING_FEATURE_GET,
            ServiceBody::TunnelingFeatureResponse { .. } => TUNNELING_FEATURE_RESPONSE,
            ServiceBody::TunnelingFeatureSet { .. } => TUNNELING_FEATURE_SET,
            ServiceBody::TunnelingFeatureInfo { .. } => TUNNELING_FEATURE_INFO,
            ServiceBody::SecureSessionRequest { .. } => SECURE_SESSION_REQUEST,
        }
    }

    pub fn write_to(&self, out: &mut Vec<u8>) {
        match self {
            ServiceBody::SearchRequest { discovery } => discovery.pack(out),
            ServiceBody::SearchResponse { control, dibs } | ServiceBody::SearchResponseExtended { control, dibs } => {
                control.pack(out);
                dibs.pack(out);
            }
            ServiceBody::SearchRequestExtended { discovery, srps } => {
                discovery.pack(out);
                crate::codec::structures::srp::pack_all(srps, out);
            }
            ServiceBody::DescriptionRequest { control } => control.pack(out),
            ServiceBody::DescriptionResponse { dibs } => dibs.pack(out),
            ServiceBody::ConnectRequest { control, data, cri } => {
                control.pack(out);
                data.pack(out);
                cri.pack(out);
            }
            ServiceBody::ConnectResponse(r) => r.write_to(out),
            ServiceBody::ConnectionstateRequest { channel_id, control } => {
                out.write_val(*channel_id).unwrap();
                out.write_val(0u8).unwrap();
                control.pack(out);
            }
            ServiceBody::ConnectionstateResponse { channel_id, status } => {
                out.write_val(*channel_id).unwrap();
                out.write_val(status.0).unwrap();
            }
            ServiceBody::DisconnectRequest { channel_id, control } => {
                out.write_val(*channel_id).unwrap();
                out.write_val(0u8).unwrap();
                control.pack(out);
            }
            ServiceBody::DisconnectResponse { channel_id, status } => {
                out.write_val(*channel_id).unwrap();
                out.write_val(status.0).unwrap();
            }
            ServiceBody::RoutingIndication { cemi } | ServiceBody::RoutingSystemBroadcast { cemi } => {
                out.extend_from_slice(cemi);
            }
            ServiceBody::RoutingLostMessage { device_state, lost_count } => {
                out.write_val(4u8).unwrap();
                out.write_val(*device_state).unwrap();
                out.write_val(*lost_count).unwrap();
            }
            ServiceBody::RoutingBusyIndication {
                device_state,
                wait_millis,
                ctrl,
            } => {
                out.write_val(6u8).unwrap();
                out.write_val(*device_state).unwrap();
                out.write_val(*wait_millis).unwrap();
                out.write_val(*ctrl).unwrap();
            }
            ServiceBody::TunnelingRequest { header, cemi } | ServiceBody::DeviceConfigurationRequest { header, cemi } => {
                header.write_to(out);
                out.extend_from_slice(cemi);
            }
            ServiceBody::TunnelingAck { header, status } | ServiceBody::DeviceConfigurationAck { header, status } => {
                header.write_to(out);
                out.write_val(status.0).unwrap();
            }
            ServiceBody::TunnelingFeatureGet { header, feature_id } => {
                header.write_to(out);
                out.write_val(feature_id.to_u8()).unwrap();
            }
            ServiceBody::TunnelingFeatureResponse {
                header,
                feature_id,
                result_code,
                value,
            } => {
                header.write_to(out);
                out.write_val(feature_id.to_u8()).unwrap();
                out.write_val(*result_code).unwrap();
                out.extend_from_slice(value);
            }
            ServiceBody::TunnelingFeatureSet { header, feature_id, value }
            | ServiceBody::TunnelingFeatureInfo { header, feature_id, value } => {
                header.write_to(out);
                out.write_val(feature_id.to_u8()).unwrap();
                out.extend_from_slice(value);
            }
            ServiceBody::SecureSessionRequest {
                control,
                client_public_key,
            } => {
                control.pack(out);
                out.extend_from_slice(client_public_key);
            }
        }
    }

    pub fn wire_len(&self) -> usize {
        let mut buf = Vec::new();
        self.write_to(&mut buf);
        buf.len()
    }

    pub fn parse(service_type: u16, body: &[u8]) -> Result<ServiceBody, Error> {
        match service_type {
            SEARCH_REQUEST => Ok(ServiceBody::SearchRequest {
                discovery: Hpai::unpack(body)?,
            }),
            SEARCH_RESPONSE => {
                let discovery = Hpai::unpack(body)?;
                let dibs = DibSet::unpack(&body[discovery.wire_len()..])?;
                Ok(ServiceBody::SearchResponse {
                    control: discovery,
                    dibs,
                })
            }
            SEARCH_REQUEST_EXTENDED => {
                let discovery = Hpai::unpack(body)?;
                let srps = crate::codec::structures::srp::unpack_all(&body[discovery.wire_len()..])?;
                Ok(ServiceBody::SearchRequestExtended { discovery, srps })
            }
            SEARCH_RESPONSE_EXTENDED => {
                let control = Hpai::unpack(body)?;
                let dibs = DibSet::unpack(&body[control.wire_len()..])?;
                Ok(ServiceBody::SearchResponseExtended { control, dibs })
            }
            DESCRIPTION_REQUEST => Ok(ServiceBody::DescriptionRequest {
                control: Hpai::unpack(body)?,
            }),
            DESCRIPTION_RESPONSE => Ok(ServiceBody::DescriptionResponse {
                dibs: DibSet::unpack(body)?,
            }),
            CONNECT_REQUEST => {
                let control = Hpai::unpack(body)?;
                let data = Hpai::unpack(&body[control.wire_len()..])?;
                let cri = Cri::unpack(&body[control.wire_len() + data.wire_len()..])?;
                Ok(ServiceBody::ConnectRequest { control, data, cri })
            }
            CONNECT_RESPONSE => Ok(ServiceBody::ConnectResponse(ConnectResponse::parse(body)?)),
            CONNECTIONSTATE_REQUEST => {
                require_len(body, 2)?;
                Ok(ServiceBody::ConnectionstateRequest {
                    channel_id: body[0],
                    control: Hpai::unpack(&body[2..])?,
                })
            }
            CONNECTIONSTATE_RESPONSE => {
                require_len(body, 2)?;
                Ok(ServiceBody::ConnectionstateResponse {
                    channel_id: body[0],
                    status: Status(body[1]),
                })
            }
            DISCONNECT_REQUEST => {
                require_len(body, 2)?;
                Ok(ServiceBody::DisconnectRequest {
                    channel_id: body[0],
                    control: Hpai::unpack(&body[2..])?,
                })
            }
            DISCONNECT_RESPONSE => {
                require_len(body, 2)?;
                Ok(ServiceBody::DisconnectResponse {
                    channel_id: body[0],
                    status: Status(body[1]),
                })
            }
            ROUTING_INDICATION => Ok(ServiceBody::RoutingIndication { cemi: body.to_vec() }),
            ROUTING_LOST_MESSAGE => {
                require_len(body, 4)?;
                let mut c = Cursor::new(&body[1..4]);
                let device_state: u8 = c.read_val()?;
                let lost_count: u16 = c.read_val()?;
                Ok(ServiceBody::RoutingLostMessage { device_state, lost_count })
            }
            ROUTING_BUSY_INDICATION => {
                require_len(body, 6)?;
                let mut c = Cursor::new(&body[1..6]);
                let device_state: u8 = c.read_val()?;
                let wait_millis: u16 = c.read_val()?;
                let ctrl: u16 = c.read_val()?;
                if !(20..=100).contains(&wait_millis) {
                    return Err(Error::IllegalArgument(format!(
                        "Routing-busy waitMillis {} out of [20,100]",
                        wait_millis
                    )));
                }
                Ok(ServiceBody::RoutingBusyIndication {
                    device_state,
                    wait_millis,
                    ctrl,
                })
            }
            ROUTING_SYSTEM_BROADCAST => Ok(ServiceBody::RoutingSystemBroadcast { cemi: body.to_vec() }),
            TUNNELING_REQUEST => {
                let header = ConnHeader::parse(body)?;
                Ok(ServiceBody::TunnelingRequest {
                    header,
                    cemi: body[ConnHeader::LEN..].to_vec(),
                })
            }
            TUNNELING_ACK => {
                let header = ConnHeader::parse(body)?;
                require_len(body, ConnHeader::LEN + 1)?;
                Ok(ServiceBody::TunnelingAck {
                    header,
                    status: Status(body[ConnHeader::LEN]),
                })
            }
            DEVICE_CONFIGURATION_REQUEST => {
                let header = ConnHeader::parse(body)?;
                Ok(ServiceBody::DeviceConfigurationRequest {
                    header,
                    cemi: body[ConnHeader::LEN..].to_vec(),
                })
            }
            DEVICE_CONFIGURATION_ACK => {
                let header = ConnHeader::parse(body)?;
                require_len(body, ConnHeader::LEN + 1)?;
                Ok(ServiceBody::DeviceConfigurationAck {
                    header,
                    status: Status(body[ConnHeader::LEN]),
                })
            }
            TUNNELING_FEATURE_GET => {
                let header = ConnHeader::parse(body)?;
                require_len(body, ConnHeader::LEN + 1)?;
                let feature_id = FeatureId::from_u8(body[ConnHeader::LEN])?;
                Ok(ServiceBody::TunnelingFeatureGet { header, feature_id })
            }
            TUNNELING_FEATURE_RESPONSE => {
                let header = ConnHeader::parse(body)?;
                require_len(body, ConnHeader::LEN + 2)?;
                let feature_id = FeatureId::from_u8(body[ConnHeader::LEN])?;
                let result_code = body[ConnHeader::LEN + 1];
                let value = body[ConnHeader::LEN + 2..].to_vec();
                if result_code > 0x7F && !value.is_empty() {
                    return Err(Error::MalformedFrame(
                        "TunnelingFeatureResponse error result carries a value".into(),
                    ));
                }
                if result_code <= 0x7F && value.len() != feature_id.value_len() {
                    return Err(Error::MalformedFrame(format!(
                        "feature {:?} value length {} != {}",
                        feature_id,
                        value.len(),
                        feature_id.value_len()
                    )));
                }
                Ok(ServiceBody::TunnelingFeatureResponse {
                    header,
                    feature_id,
                    result_code,
                    value,
                })
            }
            TUNNELING_FEATURE_SET => {
                let header = ConnHeader::parse(body)?;
                require_len(body, ConnHeader::LEN + 1)?;
                let feature_id = FeatureId::from_u8(body[ConnHeader::LEN])?;
                let value = body[ConnHeader::LEN + 1..].to_vec();
                if value.len() != feature_id.value_len() {
                    return Err(Error::MalformedFrame(format!(
                        "feature {:?} value length {} != {}",
                        feature_id,
                        value.len(),
                        feature_id.value_len()
                    )));
                }
                Ok(ServiceBody::TunnelingFeatureSet { header, feature_id, value })
            }
            TUNNELING_FEATURE_INFO => {
                let header = ConnHeader::parse(body)?;
                require_len(body, ConnHeader::LEN + 1)?;
                let feature_id = FeatureId::from_u8(body[ConnHeader::LEN])?;
                let value = body[ConnHeader::LEN + 1..].to_vec();
                if value.len() != feature_id.value_len() {
                    return Err(Error::MalformedFrame(format!(
                        "feature {:?} value length {} != {}",
                        feature_id,
                        value.len(),
                        feature_id.value_len()
                    )));
                }
                Ok(ServiceBody::TunnelingFeatureInfo { header, feature_id, value })
            }
            SECURE_SESSION_REQUEST => {
                let control = Hpai::unpack(body)?;
                let key_bytes = &body[control.wire_len()..];
                if key_bytes.len() != 32 {
                    return Err(Error::LengthMismatch {
                        declared: 32,
                        available: key_bytes.len(),
                    });
                }
                let mut client_public_key = [0u8; 32];
                client_public_key.copy_from_slice(key_bytes);
                Ok(ServiceBody::SecureSessionRequest {
                    control,
                    client_public_key,
                })
            }
            other => Err(Error::UnsupportedServiceType(other)),
        }
    }
}

fn require_len(buf: &[u8], min: usize) -> Result<(), Error> {
    if buf.len() < min {
        Err(Error::LengthMismatch {
            declared: min,
            available: buf.len(),
        })
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::structures::{HostProtocol, TunnelingLayer};
    use std::net::{Ipv4Addr, SocketAddrV4};

    #[test]
    fn scenario_b_connect_response_ok() {
        let body = [
            0x07, 0x00, 0x08, 0x01, 0x0A, 0x00, 0x00, 0x01, 0x0E, 0x57, 0x04, 0x04, 0x02, 0x00,
        ];
        let resp = ConnectResponse::parse(&body).unwrap();
        match resp {
            ConnectResponse::Ok {
                channel_id,
                data_endpoint,
                crd,
            } => {
                assert_eq!(channel_id, 7);
                assert_eq!(data_endpoint.host_protocol, HostProtocol::Udp);
                assert_eq!(data_endpoint.addr, SocketAddrV4::new(Ipv4Addr::new(10, 0, 0, 1), 3671));
                assert_eq!(crd, Crd::Tunnel { individual_address: 0x0200 });
            }
            ConnectResponse::Err { .. } => panic!("expected Ok"),
        }
    }

    #[test]
    fn scenario_c_connect_response_err() {
        let body = [0x00, 0x24];
        let resp = ConnectResponse::parse(&body).unwrap();
        assert_eq!(resp, ConnectResponse::Err { status: Status::NO_MORE_CONNECTIONS });
        let mut out = Vec::new();
        resp.write_to(&mut out);
        assert_eq!(out, body);
    }

    #[test]
    fn tunneling_request_round_trip() {
        let body = ServiceBody::TunnelingRequest {
            header: ConnHeader { channel_id: 7, seq: 5 },
            cemi: vec![0x11, 0x00, 0xBC, 0xE0, 0x11, 0x01, 0x00, 0x01, 0x00, 0x81],
        };
        let mut out = Vec::new();
        body.write_to(&mut out);
        let parsed = ServiceBody::parse(TUNNELING_REQUEST, &out).unwrap();
        assert_eq!(parsed, body);
    }

    #[test]
    fn routing_busy_rejects_out_of_range_wait() {
        let body = [0x06, 0x00, 0x00, 0x0A, 0x00, 0x00];
        assert!(matches!(
            ServiceBody::parse(ROUTING_BUSY_INDICATION, &body),
            Err(Error::IllegalArgument(_))
        ));
    }

    #[test]
    fn tunneling_feature_get_then_response() {
        let header = ConnHeader { channel_id: 1, seq: 0 };
        let get = ServiceBody::TunnelingFeatureGet {
            header,
            feature_id: FeatureId::IndividualAddress,
        };
        let mut out = Vec::new();
        get.write_to(&mut out);
        assert_eq!(ServiceBody::parse(TUNNELING_FEATURE_GET, &out).unwrap(), get);

        let resp = ServiceBody::TunnelingFeatureResponse {
            header,
            feature_id: FeatureId::IndividualAddress,
            result_code: 0x00,
            value: vec![0x11, 0x01],
        };
        let mut out = Vec::new();
        resp.write_to(&mut out);
        assert_eq!(ServiceBody::parse(TUNNELING_FEATURE_RESPONSE, &out).unwrap(), resp);
    }

    #[test]
    fn tunneling_feature_response_rejects_mismatched_value_len() {
        let header = ConnHeader { channel_id: 1, seq: 0 };
        let mut body = Vec::new();
        header.write_to(&mut body);
        body.push(FeatureId::IndividualAddress.to_u8());
        body.push(0x00);
        body.push(0x11); // only 1 byte, feature expects 2
        assert!(matches!(
            ServiceBody::parse(TUNNELING_FEATURE_RESPONSE, &body),
            Err(Error::MalformedFrame(_))
        ));
    }
}
