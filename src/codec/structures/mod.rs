pub mod cri_crd;
pub mod dib;
pub mod hpai;
pub mod srp;

pub use cri_crd::{ConnectionType, Cri, Crd, TunnelingLayer};
pub use dib::{Dib, DibSet, DibType, ServiceFamily};
pub use hpai::{HostProtocol, Hpai, HPAI_LEN};
pub use srp::{Srp, SrpType};
