//! Wire codec: the KNXnet/IP header, the service-type tagged union, and the
//! small structures (HPAI, CRI/CRD, DIB, SRP) those services are built from.

pub mod header;
pub mod primitive;
pub mod service;
pub mod structures;

pub use header::Header;
pub use service::ServiceBody;
